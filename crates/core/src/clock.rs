//! Clock abstraction
//!
//! Engines never call `Utc::now()` directly; they take a [`Clock`] so that
//! maturity checks, daily-uniqueness windows and rate-limit TTLs are
//! deterministic under test.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use std::sync::Mutex;

/// Fixed UTC+8 offset used for the platform's business-day boundary.
const BUSINESS_OFFSET_SECS: i32 = 8 * 3600;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date at the platform's fixed UTC+8 offset.
    ///
    /// Daily request-uniqueness checks compare business days, not UTC days.
    fn business_day(&self, ts: DateTime<Utc>) -> NaiveDate {
        let offset = FixedOffset::east_opt(BUSINESS_OFFSET_SECS).expect("valid fixed offset");
        ts.with_timezone(&offset).date_naive()
    }

    /// Business day of the current instant.
    fn today(&self) -> NaiveDate {
        self.business_day(self.now())
    }

    /// UTC half-open range `[start, end)` covering the business day that
    /// contains `ts`. Used to scope same-day uniqueness queries.
    fn business_day_bounds(&self, ts: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let offset = FixedOffset::east_opt(BUSINESS_OFFSET_SECS).expect("valid fixed offset");
        let midnight = self
            .business_day(ts)
            .and_hms_opt(0, 0, 0)
            .expect("midnight exists")
            .and_local_timezone(offset)
            .single()
            .expect("fixed offset has no gaps");
        let start = midnight.with_timezone(&Utc);
        (start, start + Duration::days(1))
    }
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now = to;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}
