//! Calendar breakdown of songplay start times
//!
//! Mirrors the columns of `dim_time`. Every field is a pure function of the
//! timestamp (UTC), so the same start time always yields the same row.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};

/// Derived calendar fields for one start time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeParts {
    pub start_time: NaiveDateTime,
    pub hour: u32,
    pub day: u32,
    /// ISO 8601 week number
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// 0 = Sunday ... 6 = Saturday
    pub weekday: u32,
}

impl TimeParts {
    pub fn from_start_time(start_time: NaiveDateTime) -> Self {
        Self {
            start_time,
            hour: start_time.hour(),
            day: start_time.day(),
            week: start_time.iso_week().week(),
            month: start_time.month(),
            year: start_time.year(),
            weekday: start_time.weekday().num_days_from_sunday(),
        }
    }

    /// Breakdown of an event `ts` (epoch milliseconds)
    ///
    /// Returns `None` when the value is outside the representable range.
    pub fn from_epoch_millis(ts: i64) -> Option<Self> {
        start_time_from_epoch_millis(ts).map(Self::from_start_time)
    }
}

/// Convert epoch milliseconds to a UTC timestamp, milliseconds kept
pub fn start_time_from_epoch_millis(ts: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(ts).map(|dt| dt.naive_utc())
}
