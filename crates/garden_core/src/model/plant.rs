//! Plant domain model.
//!
//! # Responsibility
//! - Define the canonical persisted plant record.
//! - Turn caller input into a validated record with interval defaults applied.
//!
//! # Invariants
//! - `name` and `plant_type` are never blank.
//! - `planted_on` is never after "today" at write time.
//! - `cycle_days`, `watering_interval_days` and `pruning_interval_days` are
//!   positive when present.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a plant.
pub type PlantId = Uuid;

/// Watering interval applied when the caller leaves it empty.
pub const DEFAULT_WATERING_INTERVAL_DAYS: u32 = 3;
/// Pruning interval applied when the caller leaves it empty.
pub const DEFAULT_PRUNING_INTERVAL_DAYS: u32 = 30;

/// Persisted plant record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plant {
    pub uuid: PlantId,
    pub name: String,
    /// Free-text category such as "vegetable" or "herb".
    #[serde(rename = "type")]
    pub plant_type: String,
    pub planted_on: NaiveDate,
    /// Days from planting to expected harvest.
    pub cycle_days: Option<u32>,
    pub region: Option<String>,
    pub description: Option<String>,
    pub watering_interval_days: u32,
    pub pruning_interval_days: u32,
}

impl Plant {
    /// Checks the storage-independent invariants of a record.
    ///
    /// The "not in the future" rule needs a clock and lives in
    /// [`PlantInput::into_plant`].
    pub fn validate(&self) -> Result<(), PlantValidationError> {
        if self.name.trim().is_empty() {
            return Err(PlantValidationError::BlankName);
        }
        if self.plant_type.trim().is_empty() {
            return Err(PlantValidationError::BlankType);
        }
        if self.cycle_days == Some(0) {
            return Err(PlantValidationError::NonPositiveCycle(0));
        }
        if self.watering_interval_days == 0 {
            return Err(PlantValidationError::NonPositiveInterval {
                field: "watering_interval_days",
                value: 0,
            });
        }
        if self.pruning_interval_days == 0 {
            return Err(PlantValidationError::NonPositiveInterval {
                field: "pruning_interval_days",
                value: 0,
            });
        }
        Ok(())
    }
}

/// Caller-supplied plant fields for create and full-replace update.
///
/// Numeric fields are signed so out-of-range input reaches validation instead
/// of failing at deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantInput {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub plant_type: String,
    pub planted_on: Option<NaiveDate>,
    pub cycle_days: Option<i64>,
    pub region: Option<String>,
    pub description: Option<String>,
    pub watering_interval_days: Option<i64>,
    pub pruning_interval_days: Option<i64>,
}

impl PlantInput {
    /// Convenience constructor for the three required fields.
    pub fn new(
        name: impl Into<String>,
        plant_type: impl Into<String>,
        planted_on: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            plant_type: plant_type.into(),
            planted_on: Some(planted_on),
            ..Self::default()
        }
    }

    /// Validates input against `today` and builds the record for `uuid`.
    ///
    /// # Contract
    /// - Name and type are trimmed; blank optional text becomes `None`.
    /// - Missing intervals fall back to 3 (watering) and 30 (pruning).
    pub fn into_plant(self, uuid: PlantId, today: NaiveDate) -> Result<Plant, PlantValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(PlantValidationError::BlankName);
        }
        let plant_type = self.plant_type.trim().to_string();
        if plant_type.is_empty() {
            return Err(PlantValidationError::BlankType);
        }
        let planted_on = self
            .planted_on
            .ok_or(PlantValidationError::MissingPlantingDate)?;
        if planted_on > today {
            return Err(PlantValidationError::PlantingDateInFuture { planted_on, today });
        }

        let cycle_days = self
            .cycle_days
            .map(|value| {
                day_count("cycle_days", value, PlantValidationError::NonPositiveCycle(value))
            })
            .transpose()?;
        let watering_interval_days = interval_or_default(
            "watering_interval_days",
            self.watering_interval_days,
            DEFAULT_WATERING_INTERVAL_DAYS,
        )?;
        let pruning_interval_days = interval_or_default(
            "pruning_interval_days",
            self.pruning_interval_days,
            DEFAULT_PRUNING_INTERVAL_DAYS,
        )?;

        Ok(Plant {
            uuid,
            name,
            plant_type,
            planted_on,
            cycle_days,
            region: non_blank(self.region),
            description: non_blank(self.description),
            watering_interval_days,
            pruning_interval_days,
        })
    }
}

impl From<&Plant> for PlantInput {
    fn from(plant: &Plant) -> Self {
        Self {
            name: plant.name.clone(),
            plant_type: plant.plant_type.clone(),
            planted_on: Some(plant.planted_on),
            cycle_days: plant.cycle_days.map(i64::from),
            region: plant.region.clone(),
            description: plant.description.clone(),
            watering_interval_days: Some(i64::from(plant.watering_interval_days)),
            pruning_interval_days: Some(i64::from(plant.pruning_interval_days)),
        }
    }
}

/// Rejected plant input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlantValidationError {
    BlankName,
    BlankType,
    MissingPlantingDate,
    PlantingDateInFuture {
        planted_on: NaiveDate,
        today: NaiveDate,
    },
    NonPositiveCycle(i64),
    NonPositiveInterval {
        field: &'static str,
        value: i64,
    },
    /// Positive, but larger than any storable day count.
    DaysOutOfRange {
        field: &'static str,
        value: i64,
    },
}

impl Display for PlantValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "plant name is required"),
            Self::BlankType => write!(f, "plant type is required"),
            Self::MissingPlantingDate => write!(f, "planting date is required"),
            Self::PlantingDateInFuture { planted_on, today } => write!(
                f,
                "planting date {planted_on} cannot be after today ({today})"
            ),
            Self::NonPositiveCycle(value) => {
                write!(f, "cycle_days must be positive, got {value}")
            }
            Self::NonPositiveInterval { field, value } => {
                write!(f, "{field} must be positive, got {value}")
            }
            Self::DaysOutOfRange { field, value } => {
                write!(f, "{field} must be at most {}, got {value}", u32::MAX)
            }
        }
    }
}

impl Error for PlantValidationError {}

fn day_count(
    field: &'static str,
    value: i64,
    non_positive: PlantValidationError,
) -> Result<u32, PlantValidationError> {
    if value <= 0 {
        return Err(non_positive);
    }
    u32::try_from(value).map_err(|_| PlantValidationError::DaysOutOfRange { field, value })
}

fn interval_or_default(
    field: &'static str,
    value: Option<i64>,
    default: u32,
) -> Result<u32, PlantValidationError> {
    match value {
        Some(raw) => day_count(
            field,
            raw,
            PlantValidationError::NonPositiveInterval { field, value: raw },
        ),
        None => Ok(default),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
