//! Scheduled garden alerts.
//!
//! # Responsibility
//! - Turn due/ready plant queries into alert batches for an [`AlertSink`].
//! - Describe when each job fires ([`schedule`]) and run it ([`runner`]).
//!
//! # Invariants
//! - A failing check never prevents other checks from running.
//! - Empty result sets produce no delivery.

use crate::model::plant::PlantId;
use crate::repo::plant_repo::TypeCount;
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod runner;
pub mod schedule;

pub use runner::{AlertRunner, CheckOutcome};
pub use schedule::{next_job_after, AlertJob};

/// Which plant condition an alert batch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Watering,
    Pruning,
    Harvest,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Watering => "watering",
            Self::Pruning => "pruning",
            Self::Harvest => "harvest",
        }
    }
}

impl Display for AlertKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One plant inside an alert batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantAlert {
    pub plant_uuid: PlantId,
    pub name: String,
    pub planted_on: NaiveDate,
    /// Only carried by harvest alerts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_days: Option<u32>,
}

/// All plants matching one check on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertBatch {
    pub kind: AlertKind,
    pub today: NaiveDate,
    pub plants: Vec<PlantAlert>,
}

/// Weekly garden overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub today: NaiveDate,
    pub total_plants: usize,
    /// Plants planted within the trailing summary window.
    pub planted_last_week: usize,
    pub by_type: Vec<TypeCount>,
}

/// Delivery failure reported by a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkError(pub String);

impl Display for SinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "alert delivery failed: {}", self.0)
    }
}

impl Error for SinkError {}

/// Destination for alert payloads.
pub trait AlertSink {
    fn deliver(&self, batch: &AlertBatch) -> Result<(), SinkError>;
    fn deliver_summary(&self, summary: &WeeklySummary) -> Result<(), SinkError>;
}

impl<S: AlertSink + ?Sized> AlertSink for &S {
    fn deliver(&self, batch: &AlertBatch) -> Result<(), SinkError> {
        (**self).deliver(batch)
    }

    fn deliver_summary(&self, summary: &WeeklySummary) -> Result<(), SinkError> {
        (**self).deliver_summary(summary)
    }
}

/// Sink that writes one log line per batch and per plant.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn deliver(&self, batch: &AlertBatch) -> Result<(), SinkError> {
        info!(
            "event=alert_batch module=alert status=ok kind={} today={} plants={}",
            batch.kind,
            batch.today,
            batch.plants.len()
        );
        for plant in &batch.plants {
            match plant.cycle_days {
                Some(cycle) => info!(
                    "event=alert_plant module=alert kind={} plant={} name={:?} planted_on={} cycle_days={}",
                    batch.kind, plant.plant_uuid, plant.name, plant.planted_on, cycle
                ),
                None => info!(
                    "event=alert_plant module=alert kind={} plant={} name={:?} planted_on={}",
                    batch.kind, plant.plant_uuid, plant.name, plant.planted_on
                ),
            }
        }
        Ok(())
    }

    fn deliver_summary(&self, summary: &WeeklySummary) -> Result<(), SinkError> {
        let by_type = summary
            .by_type
            .iter()
            .map(|entry| format!("{}:{}", entry.plant_type, entry.count))
            .collect::<Vec<_>>()
            .join(",");
        info!(
            "event=alert_weekly_summary module=alert status=ok today={} total={} planted_last_week={} by_type={}",
            summary.today, summary.total_plants, summary.planted_last_week, by_type
        );
        Ok(())
    }
}
