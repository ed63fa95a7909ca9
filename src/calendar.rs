//! Date keys and the clock that supplies them
//!
//! A [`DateKey`] is one local calendar day, written `YYYY-MM-DD` so that
//! string order matches chronological order.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

const KEY_FORMAT: &str = "%Y-%m-%d";

/// Identity of one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build from year/month/day, `None` if the date does not exist
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The day `days` before this one, `None` past the start of the calendar
    pub fn minus_days(&self, days: u32) -> Option<Self> {
        self.0.checked_sub_days(Days::new(u64::from(days))).map(Self)
    }

    /// Human label for the header, e.g. `Fri, Oct 16`
    pub fn label(&self) -> String {
        self.0.format("%a, %b %-d").to_string()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, KEY_FORMAT).map(Self)
    }
}

/// Source of "today"
///
/// Every date in a session must come from the same clock so that the notion
/// of a day stays consistent.
pub trait Clock {
    fn today(&self) -> DateKey;
}

/// Local wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> DateKey {
        DateKey(Local::now().date_naive())
    }
}

/// A clock pinned to one day (tests, `--date` on the CLI)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateKey);

impl Clock for FixedClock {
    fn today(&self) -> DateKey {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn today(&self) -> DateKey {
        (**self).today()
    }
}

impl<C: Clock + Copy> Clock for std::cell::Cell<C> {
    fn today(&self) -> DateKey {
        self.get().today()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_round_trip_format() {
        let k = key("2026-10-16");
        assert_eq!(k.to_string(), "2026-10-16");
        assert_eq!(DateKey::from_ymd(2026, 10, 16), Some(k));
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!("2026-13-01".parse::<DateKey>().is_err());
        assert!("yesterday".parse::<DateKey>().is_err());
        assert!(DateKey::from_ymd(2026, 2, 30).is_none());
    }

    #[test]
    fn test_minus_days_crosses_month_and_year() {
        assert_eq!(key("2026-03-01").minus_days(1), Some(key("2026-02-28")));
        assert_eq!(key("2024-03-01").minus_days(1), Some(key("2024-02-29")));
        assert_eq!(key("2026-01-03").minus_days(5), Some(key("2025-12-29")));
        assert_eq!(key("2026-01-03").minus_days(0), Some(key("2026-01-03")));
    }

    #[test]
    fn test_minus_days_stops_at_calendar_start() {
        let first = DateKey::new(NaiveDate::MIN);
        assert_eq!(first.minus_days(1), None);
        assert_eq!(first.minus_days(0), Some(first));
    }

    #[test]
    fn test_string_order_matches_date_order() {
        let a = key("2025-12-31");
        let b = key("2026-01-01");
        assert!(a < b);
        assert!(a.to_string() < b.to_string());
    }

    #[test]
    fn test_label() {
        assert_eq!(key("2026-10-16").label(), "Fri, Oct 16");
        assert_eq!(key("2026-10-04").label(), "Sun, Oct 4");
    }

    #[test]
    fn test_cell_clock_can_advance() {
        let clock = std::cell::Cell::new(FixedClock(key("2026-10-16")));
        assert_eq!(clock.today(), key("2026-10-16"));
        clock.set(FixedClock(key("2026-10-17")));
        assert_eq!(clock.today(), key("2026-10-17"));
    }
}
