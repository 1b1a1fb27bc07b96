//! Plant repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and filtered listing over the `plants` table.
//! - Own the explicit cascade from a plant to its care events.
//!
//! # Invariants
//! - Write paths call `Plant::validate()` before SQL mutations.
//! - Listing order is `planted_on DESC, name ASC, uuid ASC`.
//! - `delete_plant` removes the plant and its care events in one transaction.

use super::{
    date_to_db, ensure_tables, like_contains_pattern, parse_date, parse_uuid, RepoError,
    RepoResult,
};
use crate::model::plant::{Plant, PlantId};
use chrono::NaiveDate;
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::{Deserialize, Serialize};

const PLANT_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    plant_type,
    planted_on,
    cycle_days,
    region,
    description,
    watering_interval_days,
    pruning_interval_days
FROM plants";

/// Filter options for listing plants. Empty filters list everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlantListQuery {
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
    /// Case-insensitive exact name.
    pub name: Option<String>,
    /// Case-insensitive exact type.
    pub plant_type: Option<String>,
    /// Case-insensitive exact region.
    pub region: Option<String>,
    /// Planted on or after this date.
    pub planted_since: Option<NaiveDate>,
}

/// Number of plants sharing one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub plant_type: String,
    pub count: u32,
}

/// Repository interface for plant persistence.
pub trait PlantRepository {
    fn create_plant(&self, plant: &Plant) -> RepoResult<PlantId>;
    /// Replaces every stored field of an existing plant.
    fn update_plant(&self, plant: &Plant) -> RepoResult<()>;
    /// Deletes a plant and all of its care events.
    fn delete_plant(&self, id: PlantId) -> RepoResult<()>;
    fn get_plant(&self, id: PlantId) -> RepoResult<Option<Plant>>;
    fn plant_exists(&self, id: PlantId) -> RepoResult<bool>;
    fn list_plants(&self, query: &PlantListQuery) -> RepoResult<Vec<Plant>>;
    /// Number of care events owned by one plant.
    fn count_care_events(&self, id: PlantId) -> RepoResult<u32>;
    /// Plant counts grouped by type ignoring case, largest group first.
    fn count_by_type(&self) -> RepoResult<Vec<TypeCount>>;
}

/// SQLite-backed plant repository.
pub struct SqlitePlantRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePlantRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["plants", "care_events"])?;
        Ok(Self { conn })
    }
}

impl PlantRepository for SqlitePlantRepository<'_> {
    fn create_plant(&self, plant: &Plant) -> RepoResult<PlantId> {
        plant.validate()?;

        self.conn.execute(
            "INSERT INTO plants (
                uuid,
                name,
                plant_type,
                planted_on,
                cycle_days,
                region,
                description,
                watering_interval_days,
                pruning_interval_days
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                plant.uuid.to_string(),
                plant.name.as_str(),
                plant.plant_type.as_str(),
                date_to_db(plant.planted_on),
                plant.cycle_days,
                plant.region.as_deref(),
                plant.description.as_deref(),
                plant.watering_interval_days,
                plant.pruning_interval_days,
            ],
        )?;

        Ok(plant.uuid)
    }

    fn update_plant(&self, plant: &Plant) -> RepoResult<()> {
        plant.validate()?;

        let changed = self.conn.execute(
            "UPDATE plants
             SET
                name = ?1,
                plant_type = ?2,
                planted_on = ?3,
                cycle_days = ?4,
                region = ?5,
                description = ?6,
                watering_interval_days = ?7,
                pruning_interval_days = ?8
             WHERE uuid = ?9;",
            params![
                plant.name.as_str(),
                plant.plant_type.as_str(),
                date_to_db(plant.planted_on),
                plant.cycle_days,
                plant.region.as_deref(),
                plant.description.as_deref(),
                plant.watering_interval_days,
                plant.pruning_interval_days,
                plant.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::PlantNotFound(plant.uuid));
        }

        Ok(())
    }

    fn delete_plant(&self, id: PlantId) -> RepoResult<()> {
        let uuid = id.to_string();
        let tx = self.conn.unchecked_transaction()?;
        let removed_care = tx.execute(
            "DELETE FROM care_events WHERE plant_uuid = ?1;",
            [uuid.as_str()],
        )?;
        let changed = tx.execute("DELETE FROM plants WHERE uuid = ?1;", [uuid.as_str()])?;
        if changed == 0 {
            return Err(RepoError::PlantNotFound(id));
        }
        tx.commit()?;

        info!(
            "event=plant_delete module=repo status=ok plant={} care_removed={}",
            id, removed_care
        );
        Ok(())
    }

    fn get_plant(&self, id: PlantId) -> RepoResult<Option<Plant>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PLANT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_plant_row(row)?));
        }

        Ok(None)
    }

    fn plant_exists(&self, id: PlantId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM plants WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_plants(&self, query: &PlantListQuery) -> RepoResult<Vec<Plant>> {
        let mut sql = format!("{PLANT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(fragment) = query.name_contains.as_ref() {
            sql.push_str(" AND name LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(like_contains_pattern(fragment)));
        }
        if let Some(name) = query.name.as_ref() {
            sql.push_str(" AND name = ? COLLATE NOCASE");
            bind_values.push(Value::Text(name.trim().to_string()));
        }
        if let Some(plant_type) = query.plant_type.as_ref() {
            sql.push_str(" AND plant_type = ? COLLATE NOCASE");
            bind_values.push(Value::Text(plant_type.trim().to_string()));
        }
        if let Some(region) = query.region.as_ref() {
            sql.push_str(" AND region = ? COLLATE NOCASE");
            bind_values.push(Value::Text(region.trim().to_string()));
        }
        if let Some(since) = query.planted_since {
            sql.push_str(" AND planted_on >= ?");
            bind_values.push(Value::Text(date_to_db(since)));
        }

        sql.push_str(" ORDER BY planted_on DESC, name COLLATE NOCASE ASC, uuid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut plants = Vec::new();
        while let Some(row) = rows.next()? {
            plants.push(parse_plant_row(row)?);
        }

        Ok(plants)
    }

    fn count_care_events(&self, id: PlantId) -> RepoResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM care_events WHERE plant_uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn count_by_type(&self) -> RepoResult<Vec<TypeCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT MIN(plant_type) AS type_label, COUNT(*) AS total
             FROM plants
             GROUP BY plant_type COLLATE NOCASE
             ORDER BY total DESC, type_label COLLATE NOCASE ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut counts = Vec::new();
        while let Some(row) = rows.next()? {
            counts.push(TypeCount {
                plant_type: row.get("type_label")?,
                count: row.get("total")?,
            });
        }
        Ok(counts)
    }
}

fn parse_plant_row(row: &Row<'_>) -> RepoResult<Plant> {
    let uuid_text: String = row.get("uuid")?;
    let planted_text: String = row.get("planted_on")?;

    let plant = Plant {
        uuid: parse_uuid(&uuid_text, "plants.uuid")?,
        name: row.get("name")?,
        plant_type: row.get("plant_type")?,
        planted_on: parse_date(&planted_text, "plants.planted_on")?,
        cycle_days: row.get("cycle_days")?,
        region: row.get("region")?,
        description: row.get("description")?,
        watering_interval_days: row.get("watering_interval_days")?,
        pruning_interval_days: row.get("pruning_interval_days")?,
    };
    plant
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("plant {}: {err}", plant.uuid)))?;
    Ok(plant)
}
