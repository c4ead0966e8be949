//! Wall-clock access and day bucketing
//!
//! Day keys are computed from UTC shifted by one fixed, configured offset.
//! Operations read the clock once through [`Clock::as_of`] so a single
//! operation never straddles midnight.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::domain::DayKey;

/// Largest accepted offset from UTC (UTC+14 / UTC-14)
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// The instant an operation runs at, and the day it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsOf {
    pub now_ms: i64,
    pub today: DayKey,
}

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> i64;

    /// Offset applied before cutting days
    fn utc_offset_minutes(&self) -> i32 {
        0
    }

    fn as_of(&self) -> AsOf {
        let now_ms = self.now_ms();
        AsOf {
            now_ms,
            today: day_key_at(now_ms, self.utc_offset_minutes()),
        }
    }
}

/// Compute the day key for a Unix timestamp in milliseconds.
///
/// ```
/// use keyquest::clock::day_key_at;
///
/// // 2023-12-28 23:30 UTC is already the 29th at UTC+1
/// assert_eq!(day_key_at(1703806200000, 0).to_string(), "2023-12-28");
/// assert_eq!(day_key_at(1703806200000, 60).to_string(), "2023-12-29");
/// ```
pub fn day_key_at(timestamp_ms: i64, utc_offset_minutes: i32) -> DayKey {
    let dt = DateTime::from_timestamp_millis(timestamp_ms).unwrap_or_default();
    let shifted = dt + Duration::minutes(i64::from(utc_offset_minutes));
    DayKey::new(shifted.date_naive())
}

/// Milliseconds at which `day` starts under `utc_offset_minutes`
pub fn day_start_ms(day: DayKey, utc_offset_minutes: i32) -> i64 {
    let midnight = day
        .date()
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc().timestamp_millis())
        .unwrap_or(0);
    midnight - i64::from(utc_offset_minutes) * 60 * 1000
}

/// The real clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    utc_offset_minutes: i32,
}

impl SystemClock {
    pub fn new(utc_offset_minutes: i32) -> Self {
        Self {
            utc_offset_minutes: utc_offset_minutes.clamp(-MAX_UTC_OFFSET_MINUTES, MAX_UTC_OFFSET_MINUTES),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn utc_offset_minutes(&self) -> i32 {
        self.utc_offset_minutes
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now_ms: Mutex<i64>,
    utc_offset_minutes: i32,
}

impl ManualClock {
    pub fn at_ms(now_ms: i64) -> Self {
        Self {
            now_ms: Mutex::new(now_ms),
            utc_offset_minutes: 0,
        }
    }

    /// Noon UTC on `day`, far from either day boundary
    pub fn on_day(day: DayKey) -> Self {
        Self::at_ms(day_start_ms(day, 0) + DAY_MS / 2)
    }

    pub fn with_offset(mut self, utc_offset_minutes: i32) -> Self {
        self.utc_offset_minutes = utc_offset_minutes;
        self
    }

    pub fn set_ms(&self, now_ms: i64) {
        *self.now_ms.lock().expect("clock lock poisoned") = now_ms;
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        *self.now_ms.lock().expect("clock lock poisoned") += delta_ms;
    }

    pub fn advance_days(&self, days: i64) {
        self.advance_ms(days * DAY_MS);
    }

    /// Jump to noon UTC on `day`
    pub fn set_day(&self, day: DayKey) {
        self.set_ms(day_start_ms(day, 0) + DAY_MS / 2);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        *self.now_ms.lock().expect("clock lock poisoned")
    }

    fn utc_offset_minutes(&self) -> i32 {
        self.utc_offset_minutes
    }
}
