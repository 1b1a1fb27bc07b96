//! Injected time source.
//!
//! Business rules compare against "today" and stamp care rows with "now";
//! services take a [`Clock`] so those values are supplied from outside and
//! tests can pin them.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};

/// Source of the current date and instant.
pub trait Clock {
    /// Current instant, used for creation timestamps.
    fn now(&self) -> DateTime<Utc>;
    /// Current calendar date, used for every date rule.
    fn today(&self) -> NaiveDate;
}

/// Wall-clock time. `today` follows the local calendar of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    today: NaiveDate,
    now: DateTime<Utc>,
}

impl FixedClock {
    /// Pins `today` and sets `now` to noon UTC on that date.
    pub fn on(today: NaiveDate) -> Self {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default();
        Self {
            today,
            now: today.and_time(noon).and_utc(),
        }
    }

    /// Pins `now` and derives `today` from its UTC date.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            today: now.date_naive(),
            now,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}
