//! Conversion helpers between domain types and their TEXT column forms.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings so that
//! lexicographic comparison in SQL matches chronological order; decimals
//! are stored as their exact string representation.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Formats a timestamp for storage. Fixed width, UTC, `Z` suffix.
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored timestamp, falling back to the epoch on malformed data.
pub fn parse_datetime(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

pub fn format_date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub fn parse_date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap_or_default()
}

pub fn format_decimal(value: Decimal) -> String {
    value.to_string()
}

pub fn parse_decimal(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap_or_default()
}
