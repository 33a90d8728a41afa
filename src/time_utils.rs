// SPDX-License-Identifier: MIT

//! Shared helpers for date/time formatting and day-key bucketing.
//!
//! All ledger bucketing happens in a fixed reference time zone (a UTC offset
//! from config), regardless of the server host zone.

use chrono::{DateTime, Datelike, FixedOffset, Months, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Resolve a wall-clock instant to a calendar day in the given UTC offset.
pub fn day_in_offset(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// Format a calendar day as a ledger key (`YYYY-MM-DD`).
pub fn day_key(day: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", day.year(), day.month(), day.day())
}

/// Parse a ledger key back into a calendar day.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

/// Compute the retention cutoff: `today` minus `months` calendar months.
///
/// Day-of-month is clamped by chrono when the target month is shorter
/// (e.g. Aug 31 minus 6 months yields Feb 28/29).
pub fn retention_cutoff(today: NaiveDate, months: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}
