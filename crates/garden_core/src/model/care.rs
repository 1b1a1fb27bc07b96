//! Care event domain model.
//!
//! # Responsibility
//! - Define the closed set of care kinds and the persisted care record.
//! - Validate caller input for registration and update.
//!
//! # Invariants
//! - `plant_uuid` is fixed at creation and never rewritten.
//! - `performed_on` is never after "today" at write time.
//! - `created_at` is assigned once, at insertion.

use crate::model::plant::PlantId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of a care event.
pub type CareId = Uuid;

/// Kind of care performed on a plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareKind {
    Watering,
    Pruning,
    Harvest,
    Fertilizing,
    Transplanting,
    Treatment,
    Other,
}

impl CareKind {
    /// Every kind, in declaration order.
    pub const ALL: [CareKind; 7] = [
        Self::Watering,
        Self::Pruning,
        Self::Harvest,
        Self::Fertilizing,
        Self::Transplanting,
        Self::Treatment,
        Self::Other,
    ];

    /// Stable storage/wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Watering => "watering",
            Self::Pruning => "pruning",
            Self::Harvest => "harvest",
            Self::Fertilizing => "fertilizing",
            Self::Transplanting => "transplanting",
            Self::Treatment => "treatment",
            Self::Other => "other",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Watering => "Watering",
            Self::Pruning => "Pruning",
            Self::Harvest => "Harvest",
            Self::Fertilizing => "Fertilizing",
            Self::Transplanting => "Transplanting",
            Self::Treatment => "Treatment",
            Self::Other => "Other",
        }
    }
}

impl Display for CareKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CareKind {
    type Err = UnknownCareKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| UnknownCareKind(value.to_string()))
    }
}

/// Input string does not name a [`CareKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCareKind(pub String);

impl Display for UnknownCareKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown care kind `{}`; expected watering|pruning|harvest|fertilizing|transplanting|treatment|other",
            self.0
        )
    }
}

impl Error for UnknownCareKind {}

/// Persisted care event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareEvent {
    pub uuid: CareId,
    pub plant_uuid: PlantId,
    pub performed_on: NaiveDate,
    pub kind: CareKind,
    pub notes: Option<String>,
    /// Name of whoever performed the care.
    pub performed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied care fields for registration and update.
///
/// On update a missing `plant_uuid` is filled from the stored event and a
/// different one is ignored: a care event never moves to another plant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareInput {
    pub plant_uuid: Option<PlantId>,
    pub performed_on: Option<NaiveDate>,
    pub kind: Option<CareKind>,
    pub notes: Option<String>,
    pub performed_by: Option<String>,
}

/// Input after validation, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCare {
    pub plant_uuid: PlantId,
    pub performed_on: NaiveDate,
    pub kind: CareKind,
    pub notes: Option<String>,
    pub performed_by: Option<String>,
}

impl CareInput {
    /// Input for a care event of `kind` performed on `performed_on`.
    pub fn new(plant_uuid: PlantId, performed_on: NaiveDate, kind: CareKind) -> Self {
        Self {
            plant_uuid: Some(plant_uuid),
            performed_on: Some(performed_on),
            kind: Some(kind),
            notes: None,
            performed_by: None,
        }
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_performed_by(mut self, performed_by: Option<String>) -> Self {
        self.performed_by = performed_by;
        self
    }

    /// Checks required fields and the future-date rule against `today`.
    pub fn validate(self, today: NaiveDate) -> Result<ValidCare, CareValidationError> {
        let plant_uuid = self.plant_uuid.ok_or(CareValidationError::MissingPlant)?;
        let performed_on = self.performed_on.ok_or(CareValidationError::MissingDate)?;
        let kind = self.kind.ok_or(CareValidationError::MissingKind)?;
        if performed_on > today {
            return Err(CareValidationError::DateInFuture {
                performed_on,
                today,
            });
        }

        Ok(ValidCare {
            plant_uuid,
            performed_on,
            kind,
            notes: non_blank(self.notes),
            performed_by: non_blank(self.performed_by),
        })
    }
}

/// Rejected care input or query arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CareValidationError {
    MissingPlant,
    MissingDate,
    MissingKind,
    DateInFuture {
        performed_on: NaiveDate,
        today: NaiveDate,
    },
    InvertedRange {
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl Display for CareValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPlant => write!(f, "plant id is required"),
            Self::MissingDate => write!(f, "care date is required"),
            Self::MissingKind => write!(f, "care kind is required"),
            Self::DateInFuture {
                performed_on,
                today,
            } => write!(
                f,
                "care date {performed_on} cannot be after today ({today})"
            ),
            Self::InvertedRange { start, end } => {
                write!(f, "range start {start} is after range end {end}")
            }
        }
    }
}

impl Error for CareValidationError {}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
