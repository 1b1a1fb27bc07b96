//! Care event repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, filtered listing and grouped counts over `care_events`.
//! - Join the owning plant's name into every read.
//!
//! # Invariants
//! - `plant_uuid` and `created_at` are written once by `create_care` and
//!   never touched by `update_care`.
//! - Date-ordered listings sort by `performed_on DESC, created_at DESC,
//!   uuid ASC`.
//! - Date filters are inclusive on both ends.

use super::{
    date_to_db, ensure_tables, parse_date, parse_timestamp, parse_uuid, RepoError, RepoResult,
};
use crate::model::care::{CareEvent, CareId, CareKind};
use crate::model::plant::PlantId;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::{Deserialize, Serialize};

const CARE_SELECT_SQL: &str = "SELECT
    c.uuid,
    c.plant_uuid,
    p.name AS plant_name,
    c.performed_on,
    c.kind,
    c.notes,
    c.performed_by,
    c.created_at
FROM care_events c
INNER JOIN plants p ON p.uuid = c.plant_uuid";

/// Stored care event joined with its plant's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareEntry {
    #[serde(flatten)]
    pub event: CareEvent,
    pub plant_name: String,
}

/// Sort order for care listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CareOrder {
    /// Newest performed date first.
    #[default]
    PerformedDesc,
    /// Most recently inserted first.
    CreatedDesc,
}

/// Filter options for listing care events. Empty filters list everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CareListQuery {
    pub plant_uuid: Option<PlantId>,
    pub kind: Option<CareKind>,
    /// Exact responsible-actor match.
    pub performed_by: Option<String>,
    /// Performed on or after this date.
    pub from: Option<NaiveDate>,
    /// Performed on or before this date.
    pub to: Option<NaiveDate>,
    pub order: CareOrder,
    pub limit: Option<u32>,
}

/// Care count for one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCount {
    pub kind: CareKind,
    pub count: u32,
}

/// Care count for one plant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantCareCount {
    pub plant_uuid: PlantId,
    pub plant_name: String,
    pub count: u32,
}

/// Care count for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCount {
    pub year: i32,
    pub month: u32,
    pub count: u32,
}

/// Repository interface for care event persistence.
pub trait CareRepository {
    fn create_care(&self, care: &CareEvent) -> RepoResult<CareId>;
    /// Replaces date, kind, notes and actor of an existing event.
    fn update_care(&self, care: &CareEvent) -> RepoResult<()>;
    fn delete_care(&self, id: CareId) -> RepoResult<()>;
    fn get_care(&self, id: CareId) -> RepoResult<Option<CareEntry>>;
    fn list_care(&self, query: &CareListQuery) -> RepoResult<Vec<CareEntry>>;
    fn care_exists_on(&self, plant_uuid: PlantId, kind: CareKind, date: NaiveDate)
        -> RepoResult<bool>;
    /// Counts per kind, largest first.
    fn count_by_kind(&self) -> RepoResult<Vec<KindCount>>;
    /// Counts per plant, largest first.
    fn count_by_plant(&self) -> RepoResult<Vec<PlantCareCount>>;
    /// Counts per calendar month, newest month first.
    fn count_by_month(&self) -> RepoResult<Vec<MonthCount>>;
}

/// SQLite-backed care event repository.
pub struct SqliteCareRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCareRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["plants", "care_events"])?;
        Ok(Self { conn })
    }
}

impl CareRepository for SqliteCareRepository<'_> {
    fn create_care(&self, care: &CareEvent) -> RepoResult<CareId> {
        self.conn.execute(
            "INSERT INTO care_events (
                uuid,
                plant_uuid,
                performed_on,
                kind,
                notes,
                performed_by,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                care.uuid.to_string(),
                care.plant_uuid.to_string(),
                date_to_db(care.performed_on),
                care.kind.as_str(),
                care.notes.as_deref(),
                care.performed_by.as_deref(),
                care.created_at.timestamp_millis(),
            ],
        )?;

        Ok(care.uuid)
    }

    fn update_care(&self, care: &CareEvent) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE care_events
             SET
                performed_on = ?1,
                kind = ?2,
                notes = ?3,
                performed_by = ?4
             WHERE uuid = ?5;",
            params![
                date_to_db(care.performed_on),
                care.kind.as_str(),
                care.notes.as_deref(),
                care.performed_by.as_deref(),
                care.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::CareNotFound(care.uuid));
        }

        Ok(())
    }

    fn delete_care(&self, id: CareId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM care_events WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::CareNotFound(id));
        }
        Ok(())
    }

    fn get_care(&self, id: CareId) -> RepoResult<Option<CareEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CARE_SELECT_SQL} WHERE c.uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_care_row(row)?));
        }

        Ok(None)
    }

    fn list_care(&self, query: &CareListQuery) -> RepoResult<Vec<CareEntry>> {
        let mut sql = format!("{CARE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(plant_uuid) = query.plant_uuid {
            sql.push_str(" AND c.plant_uuid = ?");
            bind_values.push(Value::Text(plant_uuid.to_string()));
        }
        if let Some(kind) = query.kind {
            sql.push_str(" AND c.kind = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }
        if let Some(actor) = query.performed_by.as_ref() {
            sql.push_str(" AND c.performed_by = ?");
            bind_values.push(Value::Text(actor.clone()));
        }
        if let Some(from) = query.from {
            sql.push_str(" AND c.performed_on >= ?");
            bind_values.push(Value::Text(date_to_db(from)));
        }
        if let Some(to) = query.to {
            sql.push_str(" AND c.performed_on <= ?");
            bind_values.push(Value::Text(date_to_db(to)));
        }

        match query.order {
            CareOrder::PerformedDesc => {
                sql.push_str(" ORDER BY c.performed_on DESC, c.created_at DESC, c.uuid ASC")
            }
            CareOrder::CreatedDesc => sql.push_str(" ORDER BY c.created_at DESC, c.uuid ASC"),
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_care_row(row)?);
        }

        Ok(entries)
    }

    fn care_exists_on(
        &self,
        plant_uuid: PlantId,
        kind: CareKind,
        date: NaiveDate,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM care_events
                WHERE plant_uuid = ?1
                  AND kind = ?2
                  AND performed_on = ?3
            );",
            params![plant_uuid.to_string(), kind.as_str(), date_to_db(date)],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn count_by_kind(&self) -> RepoResult<Vec<KindCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, COUNT(*) AS total
             FROM care_events
             GROUP BY kind
             ORDER BY total DESC, kind ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut counts = Vec::new();
        while let Some(row) = rows.next()? {
            let kind_text: String = row.get("kind")?;
            counts.push(KindCount {
                kind: parse_kind(&kind_text)?,
                count: row.get("total")?,
            });
        }
        Ok(counts)
    }

    fn count_by_plant(&self) -> RepoResult<Vec<PlantCareCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.plant_uuid, p.name AS plant_name, COUNT(*) AS total
             FROM care_events c
             INNER JOIN plants p ON p.uuid = c.plant_uuid
             GROUP BY c.plant_uuid, p.name
             ORDER BY total DESC, p.name ASC, c.plant_uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut counts = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get("plant_uuid")?;
            counts.push(PlantCareCount {
                plant_uuid: parse_uuid(&uuid_text, "care_events.plant_uuid")?,
                plant_name: row.get("plant_name")?,
                count: row.get("total")?,
            });
        }
        Ok(counts)
    }

    fn count_by_month(&self) -> RepoResult<Vec<MonthCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                CAST(substr(performed_on, 1, 4) AS INTEGER) AS year,
                CAST(substr(performed_on, 6, 2) AS INTEGER) AS month,
                COUNT(*) AS total
             FROM care_events
             GROUP BY year, month
             ORDER BY year DESC, month DESC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut counts = Vec::new();
        while let Some(row) = rows.next()? {
            counts.push(MonthCount {
                year: row.get("year")?,
                month: row.get("month")?,
                count: row.get("total")?,
            });
        }
        Ok(counts)
    }
}

fn parse_care_row(row: &Row<'_>) -> RepoResult<CareEntry> {
    let uuid_text: String = row.get("uuid")?;
    let plant_text: String = row.get("plant_uuid")?;
    let performed_text: String = row.get("performed_on")?;
    let kind_text: String = row.get("kind")?;

    Ok(CareEntry {
        event: CareEvent {
            uuid: parse_uuid(&uuid_text, "care_events.uuid")?,
            plant_uuid: parse_uuid(&plant_text, "care_events.plant_uuid")?,
            performed_on: parse_date(&performed_text, "care_events.performed_on")?,
            kind: parse_kind(&kind_text)?,
            notes: row.get("notes")?,
            performed_by: row.get("performed_by")?,
            created_at: parse_timestamp(row.get("created_at")?, "care_events.created_at")?,
        },
        plant_name: row.get("plant_name")?,
    })
}

fn parse_kind(value: &str) -> RepoResult<CareKind> {
    value.parse::<CareKind>().map_err(|_| {
        RepoError::InvalidData(format!("invalid care kind `{value}` in care_events.kind"))
    })
}
