//! Plant lifecycle calculator.
//!
//! # Responsibility
//! - Derive harvest, watering and pruning dates from stored plant fields.
//! - Decide "due", "ready" and "recent" against a caller-supplied `today`.
//!
//! # Invariants
//! - Every function is pure; nothing here reads the wall clock.
//! - All comparisons are inclusive: a plant is due on its due date.
//! - Results are recomputed on every read and never persisted.

use crate::model::plant::Plant;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Trailing window, in days, that counts a care event as recent.
pub const RECENT_WINDOW_DAYS: u64 = 7;

/// Expected harvest date, or `None` when the plant has no cycle length.
pub fn harvest_date(planted_on: NaiveDate, cycle_days: Option<u32>) -> Option<NaiveDate> {
    cycle_days.map(|days| add_days(planted_on, days))
}

/// First watering date after planting.
pub fn next_watering(planted_on: NaiveDate, watering_interval_days: u32) -> NaiveDate {
    add_days(planted_on, watering_interval_days)
}

/// First pruning date after planting.
pub fn next_pruning(planted_on: NaiveDate, pruning_interval_days: u32) -> NaiveDate {
    add_days(planted_on, pruning_interval_days)
}

/// Whether `today` has reached `due_on`.
pub fn is_due(due_on: NaiveDate, today: NaiveDate) -> bool {
    today >= due_on
}

/// Whether a plant with this harvest date can be harvested `today`.
pub fn is_ready_for_harvest(harvest_on: Option<NaiveDate>, today: NaiveDate) -> bool {
    harvest_on.is_some_and(|date| is_due(date, today))
}

/// Oldest date still inside the recent window ending at `today`.
pub fn recent_window_start(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_days(Days::new(RECENT_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MIN)
}

/// Whether care performed on `performed_on` counts as recent on `today`.
pub fn is_recent(performed_on: NaiveDate, today: NaiveDate) -> bool {
    performed_on >= recent_window_start(today)
}

/// All derived lifecycle values for one plant on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub harvest_date: Option<NaiveDate>,
    pub next_watering: NaiveDate,
    pub next_pruning: NaiveDate,
    pub ready_for_harvest: bool,
    pub due_for_watering: bool,
    pub due_for_pruning: bool,
}

impl Lifecycle {
    /// Computes every derived value for `plant` as of `today`.
    pub fn of(plant: &Plant, today: NaiveDate) -> Self {
        let harvest_date = harvest_date(plant.planted_on, plant.cycle_days);
        let next_watering = next_watering(plant.planted_on, plant.watering_interval_days);
        let next_pruning = next_pruning(plant.planted_on, plant.pruning_interval_days);
        Self {
            harvest_date,
            next_watering,
            next_pruning,
            ready_for_harvest: is_ready_for_harvest(harvest_date, today),
            due_for_watering: is_due(next_watering, today),
            due_for_pruning: is_due(next_pruning, today),
        }
    }
}

// Saturates at the calendar limit; a plant that far out is never due.
fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}
