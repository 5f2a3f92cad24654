//! Signed time values with an hours/minutes/seconds presentation
//!
//! A [`TimeValue`] is a flat count of seconds relative to the zero point of an
//! event. Hours may be negative; minutes and seconds are always presented in
//! `[0, 60)`. Two values are equal when their flat seconds are equal, whatever
//! components they were built from.

use crate::types::{AnnotateError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_MINUTE: f64 = 60.0;

/// Timestamp or timer position, in seconds from the event's zero point
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeValue {
    seconds: f64,
}

impl TimeValue {
    /// The event's zero point
    pub const ZERO: TimeValue = TimeValue { seconds: 0.0 };

    /// Create a time value from a flat number of seconds
    ///
    /// `-0.0` becomes `0.0`, so the zero point has a single representation.
    pub fn from_seconds(seconds: f64) -> Self {
        Self {
            seconds: seconds + 0.0,
        }
    }

    /// Create a time value from components
    ///
    /// The components do not need to be normalized: `(0, 1, 24.0)` and
    /// `(0, 0, 84.0)` are the same time.
    pub fn from_hms(hours: i64, minutes: u32, seconds: f64) -> Self {
        Self::from_seconds(
            hours as f64 * SECONDS_PER_HOUR + minutes as f64 * SECONDS_PER_MINUTE + seconds,
        )
    }

    /// Flat number of seconds
    pub fn to_seconds(self) -> f64 {
        self.seconds
    }

    /// Canonical `(hours, minutes, seconds)` split
    ///
    /// Hours carry the sign; minutes and seconds are in `[0, 60)`.
    pub fn hms(self) -> (i64, u32, f64) {
        let total = self.seconds;

        let mut hours = (total / SECONDS_PER_HOUR).floor();
        let mut rest = total - hours * SECONDS_PER_HOUR;
        // Division rounding can put the remainder just outside [0, 3600)
        if rest < 0.0 {
            hours -= 1.0;
            rest += SECONDS_PER_HOUR;
        } else if rest >= SECONDS_PER_HOUR {
            hours += 1.0;
            rest -= SECONDS_PER_HOUR;
        }

        let mut minutes = (rest / SECONDS_PER_MINUTE).floor();
        let mut seconds = rest - minutes * SECONDS_PER_MINUTE;
        if seconds < 0.0 {
            minutes -= 1.0;
            seconds += SECONDS_PER_MINUTE;
        } else if seconds >= SECONDS_PER_MINUTE {
            minutes += 1.0;
            seconds -= SECONDS_PER_MINUTE;
        }
        if minutes >= SECONDS_PER_MINUTE {
            hours += 1.0;
            minutes -= SECONDS_PER_MINUTE;
        }

        (hours as i64, minutes as u32, seconds)
    }

    /// Time shifted by the given number of seconds (negative moves back)
    pub fn add_seconds(self, delta: f64) -> Self {
        Self::from_seconds(self.seconds + delta)
    }
}

impl PartialEq for TimeValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimeValue {}

impl PartialOrd for TimeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.seconds.total_cmp(&other.seconds)
    }
}

impl Add<f64> for TimeValue {
    type Output = TimeValue;

    fn add(self, delta: f64) -> TimeValue {
        self.add_seconds(delta)
    }
}

impl Sub for TimeValue {
    type Output = f64;

    /// Difference in seconds
    fn sub(self, other: TimeValue) -> f64 {
        self.seconds - other.seconds
    }
}

impl fmt::Display for TimeValue {
    /// `H:MM:SS.s`, e.g. `0:01:24.0` or `-1:59:49.5`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Round first so that 59.96 s shows as 0:01:00.0, not 0:00:60.0
        let rounded = TimeValue::from_seconds((self.seconds * 10.0).round() / 10.0);
        let (hours, minutes, seconds) = rounded.hms();
        write!(f, "{}:{:02}:{:04.1}", hours, minutes, seconds)
    }
}

impl FromStr for TimeValue {
    type Err = AnnotateError;

    /// Parse `S`, `M:S` or `H:M:S` (every part may have decimals)
    ///
    /// Parts add up with their own signs (`-1:59:55` is -5 s, the way
    /// `Display` writes it); a leading `-0` negates the whole value.
    fn from_str(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.trim().split(':').collect();
        if parts.len() > 3 {
            return Err(AnnotateError::InvalidInput(format!(
                "incorrect time format {:?} (use S, M:S or H:M:S)",
                text
            )));
        }

        let mut total = 0.0;
        let mut leading = 0.0;
        let units = [1.0, SECONDS_PER_MINUTE, SECONDS_PER_HOUR];
        for (part, unit) in parts.iter().rev().zip(units) {
            let value: f64 = part.trim().parse().map_err(|_| {
                AnnotateError::InvalidInput(format!(
                    "incorrect time format {:?} (use S, M:S or H:M:S)",
                    text
                ))
            })?;
            total += value * unit;
            leading = value;
        }
        // "-0:05" is five seconds before zero, not after
        if parts.len() > 1 && leading == 0.0 && leading.is_sign_negative() {
            total = -total;
        }
        if !total.is_finite() {
            return Err(AnnotateError::InvalidInput(format!(
                "time {:?} is not a finite number of seconds",
                text
            )));
        }

        Ok(TimeValue::from_seconds(total))
    }
}
