//! Alert checks over the plant service.
//!
//! # Responsibility
//! - Evaluate each scheduled check as of the service clock's today.
//! - Contain query and delivery failures inside the check that raised them.
//!
//! # Invariants
//! - Checks never return `Err`; failures surface as [`CheckOutcome::Failed`].
//! - A check with nothing to report does not call the sink.

use super::schedule::AlertJob;
use super::{AlertBatch, AlertKind, AlertSink, PlantAlert, WeeklySummary};
use crate::clock::Clock;
use crate::repo::plant_repo::PlantRepository;
use crate::service::plant_service::{PlantRecord, PlantService, PlantServiceResult};
use log::{error, info};
use serde::Serialize;
use std::fmt::Display;

/// Trailing window, in days, counted as "planted this week".
pub const WEEKLY_SUMMARY_WINDOW_DAYS: u32 = 7;

/// Result of one check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Payload handed to the sink; carries the number of plants reported.
    Delivered(usize),
    /// Nothing matched; the sink was not called.
    NothingDue,
    /// Job has no work defined.
    Skipped,
    /// Query or delivery failed; carries the error message.
    Failed(String),
}

impl CheckOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Runs alert checks against plant data and hands results to a sink.
pub struct AlertRunner<R: PlantRepository, C: Clock, S: AlertSink> {
    plants: PlantService<R, C>,
    sink: S,
}

impl<R: PlantRepository, C: Clock, S: AlertSink> AlertRunner<R, C, S> {
    pub fn new(plants: PlantService<R, C>, sink: S) -> Self {
        Self { plants, sink }
    }

    /// Plants whose watering date has been reached.
    pub fn check_watering(&self) -> CheckOutcome {
        let today = self.plants.today();
        self.check_kind(AlertKind::Watering, self.plants.find_due_for_watering(today))
    }

    /// Plants whose pruning date has been reached.
    pub fn check_pruning(&self) -> CheckOutcome {
        let today = self.plants.today();
        self.check_kind(AlertKind::Pruning, self.plants.find_due_for_pruning(today))
    }

    /// Plants ready for harvest.
    pub fn check_harvest(&self) -> CheckOutcome {
        let today = self.plants.today();
        self.check_kind(AlertKind::Harvest, self.plants.find_ready_for_harvest(today))
    }

    /// Totals, recent plantings and per-type counts.
    pub fn weekly_summary(&self) -> CheckOutcome {
        let summary = match self.build_summary() {
            Ok(summary) => summary,
            Err(err) => return failed(AlertJob::WeeklySummary, err),
        };
        if let Err(err) = self.sink.deliver_summary(&summary) {
            return failed(AlertJob::WeeklySummary, err);
        }
        info!(
            "event=alert_check module=alert status=ok job={} total={}",
            AlertJob::WeeklySummary,
            summary.total_plants
        );
        CheckOutcome::Delivered(summary.total_plants)
    }

    /// Reserved maintenance slot; nothing is removed.
    pub fn cleanup(&self) -> CheckOutcome {
        info!(
            "event=alert_check module=alert status=skipped job={}",
            AlertJob::Cleanup
        );
        CheckOutcome::Skipped
    }

    /// Runs the watering, pruning and harvest checks in order.
    pub fn test_all(&self) -> Vec<(AlertJob, CheckOutcome)> {
        [AlertJob::Watering, AlertJob::Pruning, AlertJob::Harvest]
            .into_iter()
            .map(|job| (job, self.run(job)))
            .collect()
    }

    /// Dispatches one scheduled job.
    pub fn run(&self, job: AlertJob) -> CheckOutcome {
        match job {
            AlertJob::Watering => self.check_watering(),
            AlertJob::Pruning => self.check_pruning(),
            AlertJob::Harvest => self.check_harvest(),
            AlertJob::WeeklySummary => self.weekly_summary(),
            AlertJob::Cleanup => self.cleanup(),
        }
    }

    fn build_summary(&self) -> PlantServiceResult<WeeklySummary> {
        Ok(WeeklySummary {
            today: self.plants.today(),
            total_plants: self.plants.list_all()?.len(),
            planted_last_week: self
                .plants
                .find_planted_within_last_days(WEEKLY_SUMMARY_WINDOW_DAYS)?
                .len(),
            by_type: self.plants.stats_by_type()?,
        })
    }

    fn check_kind(
        &self,
        kind: AlertKind,
        found: PlantServiceResult<Vec<PlantRecord>>,
    ) -> CheckOutcome {
        let job = job_for(kind);
        let records = match found {
            Ok(records) => records,
            Err(err) => return failed(job, err),
        };
        if records.is_empty() {
            info!("event=alert_check module=alert status=ok job={job} plants=0");
            return CheckOutcome::NothingDue;
        }

        let batch = AlertBatch {
            kind,
            today: self.plants.today(),
            plants: records
                .into_iter()
                .map(|record| PlantAlert {
                    plant_uuid: record.plant.uuid,
                    name: record.plant.name,
                    planted_on: record.plant.planted_on,
                    cycle_days: match kind {
                        AlertKind::Harvest => record.plant.cycle_days,
                        _ => None,
                    },
                })
                .collect(),
        };
        if let Err(err) = self.sink.deliver(&batch) {
            return failed(job, err);
        }
        info!(
            "event=alert_check module=alert status=ok job={} plants={}",
            job,
            batch.plants.len()
        );
        CheckOutcome::Delivered(batch.plants.len())
    }
}

fn job_for(kind: AlertKind) -> AlertJob {
    match kind {
        AlertKind::Watering => AlertJob::Watering,
        AlertKind::Pruning => AlertJob::Pruning,
        AlertKind::Harvest => AlertJob::Harvest,
    }
}

fn failed(job: AlertJob, err: impl Display) -> CheckOutcome {
    error!("event=alert_check module=alert status=error job={job} error={err}");
    CheckOutcome::Failed(err.to_string())
}
