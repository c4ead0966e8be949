//! Calendar day keys
//!
//! Every per-day record (challenges, progress rows, streak dates) is keyed by
//! a `YYYY-MM-DD` string. `DayKey` is the validated form of that string.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// A calendar day, rendered as `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build a key from year, month and day. Returns `None` for impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse a strict `YYYY-MM-DD` key
    pub fn parse(s: &str) -> Option<Self> {
        // chrono accepts unpadded fields; keys must round-trip byte-for-byte
        if s.len() != 10 {
            return None;
        }
        NaiveDate::parse_from_str(s, DAY_KEY_FORMAT).ok().map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn previous(&self) -> Self {
        self.offset(-1)
    }

    pub fn next(&self) -> Self {
        self.offset(1)
    }

    /// Shift by a signed number of days
    pub fn offset(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Whole days from `earlier` to `self` (negative if `earlier` is later)
    pub fn days_since(&self, earlier: DayKey) -> i64 {
        (self.0 - earlier.0).num_days()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_KEY_FORMAT))
    }
}

impl std::str::FromStr for DayKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid day key (expected YYYY-MM-DD): {}", s))
    }
}

impl TryFrom<String> for DayKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayKey> for String {
    fn from(key: DayKey) -> Self {
        key.to_string()
    }
}
