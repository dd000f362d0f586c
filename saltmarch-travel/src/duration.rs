//! Sparse game-time durations.
//!
//! A `Duration` only carries the components that are non-zero; the empty value
//! is the zero duration. Arithmetic always carries forward
//! (minutes → hours → days → weeks) and never borrows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

pub const MINUTES_PER_HOUR: u64 = 60;
pub const HOURS_PER_DAY: u64 = 24;
pub const DAYS_PER_WEEK: u64 = 7;
pub const MINUTES_PER_DAY: u64 = MINUTES_PER_HOUR * HOURS_PER_DAY;
pub const MINUTES_PER_WEEK: u64 = MINUTES_PER_DAY * DAYS_PER_WEEK;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Duration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weeks: Option<u32>,
}

const fn non_zero(value: u32) -> Option<u32> {
    if value == 0 { None } else { Some(value) }
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

impl Duration {
    pub const ZERO: Self = Self {
        minutes: None,
        hours: None,
        days: None,
        weeks: None,
    };

    #[must_use]
    pub const fn from_hours(hours: u32) -> Self {
        Self {
            hours: non_zero(hours),
            ..Self::ZERO
        }
    }

    #[must_use]
    pub const fn from_minutes_only(minutes: u32) -> Self {
        Self {
            minutes: non_zero(minutes),
            ..Self::ZERO
        }
    }

    /// Hours and minutes with a minute overflow carried into the hours; larger
    /// units are left untouched.
    #[must_use]
    pub fn from_hours_minutes(hours: u32, minutes: u32) -> Self {
        let carry = minutes / 60;
        Self {
            minutes: non_zero(minutes % 60),
            hours: non_zero(hours.saturating_add(carry)),
            ..Self::ZERO
        }
    }

    /// Fully normalised duration for a minute total.
    #[must_use]
    pub fn from_total_minutes(total: u64) -> Self {
        let weeks = total / MINUTES_PER_WEEK;
        let rest = total % MINUTES_PER_WEEK;
        let days = rest / MINUTES_PER_DAY;
        let rest = rest % MINUTES_PER_DAY;
        let hours = rest / MINUTES_PER_HOUR;
        let minutes = rest % MINUTES_PER_HOUR;
        Self {
            minutes: non_zero(clamp_u32(minutes)),
            hours: non_zero(clamp_u32(hours)),
            days: non_zero(clamp_u32(days)),
            weeks: non_zero(clamp_u32(weeks)),
        }
    }

    #[must_use]
    pub fn minutes(&self) -> u32 {
        self.minutes.unwrap_or(0)
    }

    #[must_use]
    pub fn hours(&self) -> u32 {
        self.hours.unwrap_or(0)
    }

    #[must_use]
    pub fn days(&self) -> u32 {
        self.days.unwrap_or(0)
    }

    #[must_use]
    pub fn weeks(&self) -> u32 {
        self.weeks.unwrap_or(0)
    }

    #[must_use]
    pub fn to_minutes(&self) -> u64 {
        u64::from(self.minutes())
            + u64::from(self.hours()) * MINUTES_PER_HOUR
            + u64::from(self.days()) * MINUTES_PER_DAY
            + u64::from(self.weeks()) * MINUTES_PER_WEEK
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.to_minutes() == 0
    }

    /// Carry overflowing components into the next larger unit.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let minutes = u64::from(self.minutes());
        let hours = u64::from(self.hours()) + minutes / MINUTES_PER_HOUR;
        let days = u64::from(self.days()) + hours / HOURS_PER_DAY;
        let weeks = u64::from(self.weeks()) + days / DAYS_PER_WEEK;
        Self {
            minutes: non_zero(clamp_u32(minutes % MINUTES_PER_HOUR)),
            hours: non_zero(clamp_u32(hours % HOURS_PER_DAY)),
            days: non_zero(clamp_u32(days % DAYS_PER_WEEK)),
            weeks: non_zero(clamp_u32(weeks)),
        }
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            minutes: non_zero(self.minutes().saturating_add(other.minutes())),
            hours: non_zero(self.hours().saturating_add(other.hours())),
            days: non_zero(self.days().saturating_add(other.days())),
            weeks: non_zero(self.weeks().saturating_add(other.weeks())),
        }
        .normalized()
    }
}

impl Sum for Duration {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0m");
        }
        let parts = [
            (self.weeks(), "w"),
            (self.days(), "d"),
            (self.hours(), "h"),
            (self.minutes(), "m"),
        ];
        let mut first = true;
        for (value, unit) in parts {
            if value == 0 {
                continue;
            }
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{value}{unit}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_the_empty_object() {
        assert_eq!(Duration::default(), Duration::ZERO);
        assert!(Duration::ZERO.is_zero());
        assert_eq!(serde_json::to_string(&Duration::ZERO).unwrap(), "{}");
    }

    #[test]
    fn sixty_minutes_carry_into_an_hour() {
        let d = Duration::from_hours_minutes(2, 60);
        assert_eq!(d.hours(), 3);
        assert_eq!(d.minutes, None);
    }

    #[test]
    fn addition_carries_all_the_way_to_weeks() {
        let a = Duration {
            minutes: Some(45),
            hours: Some(23),
            days: Some(6),
            weeks: None,
        };
        let b = Duration::from_minutes_only(15);
        let total = a + b;
        assert_eq!(total.weeks(), 1);
        assert_eq!(total.days(), 0);
        assert_eq!(total.hours(), 0);
        assert_eq!(total.minutes(), 0);
        assert_eq!(total.to_minutes(), a.to_minutes() + 15);
    }

    #[test]
    fn total_minutes_round_trip() {
        let d = Duration::from_total_minutes(10_000);
        assert_eq!(d.to_minutes(), 10_000);
        assert_eq!(d.weeks(), 0);
        assert_eq!(d.days(), 6);
        assert_eq!(d.hours(), 22);
        assert_eq!(d.minutes(), 40);
    }

    #[test]
    fn sum_of_segments() {
        let total: Duration = [Duration::from_hours(2), Duration::from_minutes_only(90)]
            .into_iter()
            .sum();
        assert_eq!(total.hours(), 3);
        assert_eq!(total.minutes(), 30);
    }

    #[test]
    fn display_lists_non_zero_units() {
        assert_eq!(Duration::from_total_minutes(1_505).to_string(), "1d 1h 5m");
        assert_eq!(Duration::ZERO.to_string(), "0m");
    }

    #[test]
    fn sparse_json_deserializes() {
        let d: Duration = serde_json::from_str(r#"{"hours":2}"#).unwrap();
        assert_eq!(d, Duration::from_hours(2));
    }
}
