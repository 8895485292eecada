//! Time and timestamp helpers.
//!
//! Execution timestamps are stored as epoch milliseconds; wall-clock
//! conditions work on the local time zone.

use chrono::{DateTime, Local, NaiveDate, Timelike};

/// Local wall-clock instant used as "now" during evaluation.
pub type Timestamp = DateTime<Local>;

/// Milliseconds in one minute.
pub const MILLIS_PER_MINUTE: i64 = 60_000;

/// Return the current local time.
#[must_use]
pub fn now() -> Timestamp {
    Local::now()
}

/// Return the current time as epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    Local::now().timestamp_millis()
}

/// Minutes elapsed since local midnight for `ts`.
#[must_use]
pub fn minute_of_day(ts: &Timestamp) -> u32 {
    ts.hour() * 60 + ts.minute()
}

/// Parse an `HH:MM` clock value into minutes since midnight.
///
/// Returns `None` for anything outside `00:00..=23:59`.
#[must_use]
pub fn parse_clock(value: &str) -> Option<u32> {
    let (hours, minutes) = value.trim().split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    (hours < 24 && minutes < 60).then_some(hours * 60 + minutes)
}

/// Parse and normalise a `YYYY-MM-DD` date so it compares lexicographically.
#[must_use]
pub fn parse_iso_date(value: &str) -> Option<String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}
