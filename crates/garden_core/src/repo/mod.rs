//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for plants and care.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Plant writes enforce `Plant::validate()` before persistence.
//! - Repository APIs return semantic errors (`PlantNotFound`,
//!   `CareNotFound`) in addition to DB transport errors.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::care::CareId;
use crate::model::plant::{PlantId, PlantValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod care_repo;
pub mod plant_repo;

pub type RepoResult<T> = Result<T, RepoError>;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Repository error shared by plant and care persistence.
#[derive(Debug)]
pub enum RepoError {
    InvalidPlant(PlantValidationError),
    Db(DbError),
    PlantNotFound(PlantId),
    CareNotFound(CareId),
    /// Connection was not migrated before the repository was built.
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPlant(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::PlantNotFound(id) => write!(f, "plant not found: {id}"),
            Self::CareNotFound(id) => write!(f, "care event not found: {id}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "garden repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted garden data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPlant(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::PlantNotFound(_) => None,
            Self::CareNotFound(_) => None,
            Self::MissingRequiredTable(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<PlantValidationError> for RepoError {
    fn from(value: PlantValidationError) -> Self {
        Self::InvalidPlant(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for &table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str, column: &'static str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}

fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn parse_timestamp(value: i64, column: &'static str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid timestamp `{value}` in {column}")))
}

/// Escapes `%`, `_` and `\` so user text matches literally inside `LIKE`.
fn like_contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
