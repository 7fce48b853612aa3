//! Calendar-day keys and day arithmetic.
//!
//! All scheduling math in this crate runs on local-calendar days addressed by
//! a canonical `YYYY-MM-DD` key, with no time or zone component. Timestamps
//! only appear as audit fields (`created_at`, `completed_at`).

use chrono::{Datelike, NaiveDate, Utc};
use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar day in canonical `YYYY-MM-DD` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse a canonical `YYYY-MM-DD` key. Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Self)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The UTC calendar day containing a millisecond timestamp.
    ///
    /// Using UTC-normalized day keys on both sides of a subtraction avoids
    /// the local-midnight ambiguity called out in the recurrence rules.
    pub fn from_ms(ms: i64) -> Option<Self> {
        chrono::DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| Self(dt.date_naive()))
    }

    /// Today as a UTC calendar day.
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    /// Weekday index with Sunday = 0 through Saturday = 6.
    pub fn weekday_index(&self) -> u8 {
        self.0.weekday().num_days_from_sunday() as u8
    }

    /// Whole days from `anchor` to `self` (negative if `self` is earlier).
    pub fn days_since(&self, anchor: DateKey) -> i64 {
        self.0.signed_duration_since(anchor.0).num_days()
    }

    pub fn add_days(&self, days: i64) -> Option<Self> {
        self.0
            .checked_add_signed(chrono::Duration::days(days))
            .map(Self)
    }

    /// Inclusive window of `len` consecutive days starting at `self`.
    ///
    /// Window lengths are small (7/14/30 in practice); the expander iterates
    /// them one day at a time rather than doing closed-form recurrence math.
    pub fn window(&self, len: usize) -> Vec<DateKey> {
        (0..len as i64)
            .filter_map(|offset| self.add_days(offset))
            .collect()
    }

    pub fn inner(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl ToSql for DateKey {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for DateKey {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        DateKey::parse(s).ok_or(FromSqlError::InvalidType)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrips_canonical_form() {
        let d = DateKey::parse("2024-03-05").unwrap();
        assert_eq!(d.to_string(), "2024-03-05");
    }

    #[test]
    fn parse_rejects_non_canonical_input() {
        assert!(DateKey::parse("03/05/2024").is_none());
        assert!(DateKey::parse("2024-3-5T00:00:00Z").is_none());
        assert!(DateKey::parse("").is_none());
    }

    #[test]
    fn weekday_index_is_sunday_based() {
        // 2024-01-01 was a Monday
        let monday = DateKey::from_ymd(2024, 1, 1).unwrap();
        assert_eq!(monday.weekday_index(), 1);
        let sunday = DateKey::from_ymd(2024, 1, 7).unwrap();
        assert_eq!(sunday.weekday_index(), 0);
        let saturday = DateKey::from_ymd(2024, 1, 6).unwrap();
        assert_eq!(saturday.weekday_index(), 6);
    }

    #[test]
    fn days_since_is_signed() {
        let anchor = DateKey::from_ymd(2024, 1, 1).unwrap();
        let later = DateKey::from_ymd(2024, 1, 15).unwrap();
        assert_eq!(later.days_since(anchor), 14);
        assert_eq!(anchor.days_since(later), -14);
    }

    #[test]
    fn days_since_spans_month_and_leap_boundaries() {
        let anchor = DateKey::from_ymd(2024, 2, 27).unwrap();
        let after_leap = DateKey::from_ymd(2024, 3, 1).unwrap();
        assert_eq!(after_leap.days_since(anchor), 3);
    }

    #[test]
    fn window_is_inclusive_and_contiguous() {
        let start = DateKey::from_ymd(2024, 1, 30).unwrap();
        let window = start.window(4);
        let keys: Vec<String> = window.iter().map(|d| d.to_string()).collect();
        assert_eq!(keys, ["2024-01-30", "2024-01-31", "2024-02-01", "2024-02-02"]);
    }
}
