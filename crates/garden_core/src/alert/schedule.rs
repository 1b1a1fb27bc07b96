//! Fire times of the scheduled alert jobs.
//!
//! Times are wall-clock local times; callers pass `Local::now().naive_local()`
//! in production and fixed values in tests.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

// Longest gap between two firings of any job is one calendar month.
const SEARCH_HORIZON_DAYS: u64 = 62;

/// A scheduled alert job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertJob {
    /// Daily at 08:00.
    Watering,
    /// Mondays at 09:00.
    Pruning,
    /// Daily at 18:00.
    Harvest,
    /// Sundays at 20:00.
    WeeklySummary,
    /// First day of the month at 02:00.
    Cleanup,
}

#[derive(Debug, Clone, Copy)]
enum Cadence {
    Daily,
    Weekly(Weekday),
    Monthly(u32),
}

impl AlertJob {
    pub const ALL: [AlertJob; 5] = [
        Self::Watering,
        Self::Pruning,
        Self::Harvest,
        Self::WeeklySummary,
        Self::Cleanup,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Watering => "watering",
            Self::Pruning => "pruning",
            Self::Harvest => "harvest",
            Self::WeeklySummary => "summary",
            Self::Cleanup => "cleanup",
        }
    }

    /// Local time of day the job fires at.
    pub fn fire_time(self) -> NaiveTime {
        let (hour, minute) = match self {
            Self::Watering => (8, 0),
            Self::Pruning => (9, 0),
            Self::Harvest => (18, 0),
            Self::WeeklySummary => (20, 0),
            Self::Cleanup => (2, 0),
        };
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
    }

    fn cadence(self) -> Cadence {
        match self {
            Self::Watering | Self::Harvest => Cadence::Daily,
            Self::Pruning => Cadence::Weekly(Weekday::Mon),
            Self::WeeklySummary => Cadence::Weekly(Weekday::Sun),
            Self::Cleanup => Cadence::Monthly(1),
        }
    }

    fn fires_on(self, date: NaiveDate) -> bool {
        match self.cadence() {
            Cadence::Daily => true,
            Cadence::Weekly(weekday) => date.weekday() == weekday,
            Cadence::Monthly(day) => date.day() == day,
        }
    }

    /// First firing strictly after `now`.
    pub fn next_fire_after(self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let time = self.fire_time();
        (0..=SEARCH_HORIZON_DAYS)
            .filter_map(|offset| now.date().checked_add_days(Days::new(offset)))
            .filter(|date| self.fires_on(*date))
            .map(|date| date.and_time(time))
            .find(|candidate| *candidate > now)
    }
}

impl Display for AlertJob {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input string does not name an [`AlertJob`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAlertJob(pub String);

impl Display for UnknownAlertJob {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown alert job `{}`; expected watering|pruning|harvest|summary|cleanup",
            self.0
        )
    }
}

impl std::error::Error for UnknownAlertJob {}

impl FromStr for AlertJob {
    type Err = UnknownAlertJob;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|job| job.as_str() == normalized)
            .ok_or_else(|| UnknownAlertJob(value.to_string()))
    }
}

/// The job that fires first after `now`, with its fire time.
///
/// Jobs sharing a fire time resolve in [`AlertJob::ALL`] order.
pub fn next_job_after(now: NaiveDateTime) -> Option<(AlertJob, NaiveDateTime)> {
    AlertJob::ALL
        .into_iter()
        .filter_map(|job| job.next_fire_after(now).map(|at| (job, at)))
        .min_by_key(|(_, at)| *at)
}
