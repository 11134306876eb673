//! Date parsing for request bodies and query strings
//!
//! Clients send either full RFC 3339 timestamps or bare `YYYY-MM-DD` dates.
//! All instants are UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::CoreError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const NAIVE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse a timestamp; a bare date means midnight UTC
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, CoreError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, NAIVE_DATETIME_FORMAT) {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return Ok(day_bounds(date).0);
    }

    Err(CoreError::Validation(format!("Invalid date '{}'", value)))
}

/// Parse the upper bound of an inclusive range; a bare date covers the whole day
pub fn parse_range_end(value: &str) -> Result<DateTime<Utc>, CoreError> {
    match NaiveDate::parse_from_str(value.trim(), DATE_FORMAT) {
        Ok(date) => Ok(day_bounds(date).1),
        Err(_) => parse_instant(value),
    }
}

/// Parse a calendar day from a bare date or the date part of a timestamp
pub fn parse_day(value: &str) -> Result<NaiveDate, CoreError> {
    match NaiveDate::parse_from_str(value.trim(), DATE_FORMAT) {
        Ok(date) => Ok(date),
        Err(_) => parse_instant(value).map(|dt| dt.date_naive()),
    }
}

/// First and last millisecond of a calendar day, inclusive
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    let end = start + chrono::Duration::days(1) - chrono::Duration::milliseconds(1);
    (start, end)
}
