//! Game-time values exchanged with the time port, and a reference clock.
//!
//! Real calendars (leap days, named months, custom weeks) live behind
//! [`TimeService`](crate::ports::TimeService). `SimpleClock` is a fixed
//! 12×30-day calendar used by tests and the tester harness.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::duration::{Duration, MINUTES_PER_DAY, MINUTES_PER_HOUR};
use crate::ports::TimeService;

/// Calendar position reported by the time port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameTime {
    pub year: u32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }
}

/// Why game time moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeChangeReason {
    Tick,
    Travel,
    Rest,
    Manual,
}

/// Before/after pair for a labelled calendar property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition<T> {
    pub previous: T,
    pub current: T,
}

/// Outcome of a single `TimeService::advance` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAdvanceResult {
    pub previous: GameTime,
    pub current: GameTime,
    pub day_changed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day_change: Option<Transition<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_change: Option<Transition<String>>,
}

const DAYS_PER_MONTH: u64 = 30;
const MONTHS_PER_YEAR: u64 = 12;
const MINUTES_PER_MONTH: u64 = MINUTES_PER_DAY * DAYS_PER_MONTH;
const MINUTES_PER_YEAR: u64 = MINUTES_PER_MONTH * MONTHS_PER_YEAR;

/// In-memory clock over a fixed 360-day year.
#[derive(Debug, Clone)]
pub struct SimpleClock {
    elapsed_minutes: u64,
    history: Vec<(Duration, TimeChangeReason)>,
}

impl Default for SimpleClock {
    fn default() -> Self {
        Self::starting_at(1, 1, 1, 8)
    }
}

impl SimpleClock {
    /// Clock positioned at the given calendar date and hour.
    #[must_use]
    pub fn starting_at(year: u32, month: u8, day: u8, hour: u8) -> Self {
        let year = u64::from(year.max(1) - 1);
        let month = u64::from(month.clamp(1, 12) - 1);
        let day = u64::from(day.clamp(1, 30) - 1);
        let hour = u64::from(hour.min(23));
        Self {
            elapsed_minutes: year * MINUTES_PER_YEAR
                + month * MINUTES_PER_MONTH
                + day * MINUTES_PER_DAY
                + hour * MINUTES_PER_HOUR,
            history: Vec::new(),
        }
    }

    /// Every advancement applied so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[(Duration, TimeChangeReason)] {
        &self.history
    }

    /// Sum of all minutes advanced for `reason`.
    #[must_use]
    pub fn minutes_advanced_for(&self, reason: TimeChangeReason) -> u64 {
        self.history
            .iter()
            .filter(|(_, r)| *r == reason)
            .map(|(d, _)| d.to_minutes())
            .sum()
    }

    fn time_at(minutes: u64) -> GameTime {
        let year = minutes / MINUTES_PER_YEAR;
        let rest = minutes % MINUTES_PER_YEAR;
        let month = rest / MINUTES_PER_MONTH;
        let rest = rest % MINUTES_PER_MONTH;
        let day = rest / MINUTES_PER_DAY;
        let rest = rest % MINUTES_PER_DAY;
        GameTime {
            year: u32::try_from(year + 1).unwrap_or(u32::MAX),
            month: narrow(month + 1),
            day: narrow(day + 1),
            hour: narrow(rest / MINUTES_PER_HOUR),
            minute: narrow(rest % MINUTES_PER_HOUR),
        }
    }
}

fn narrow(value: u64) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

/// Coarse time-of-day label for an hour.
#[must_use]
pub fn time_of_day(hour: u8) -> &'static str {
    match hour {
        5..=6 => "dawn",
        7..=11 => "morning",
        12..=16 => "afternoon",
        17..=19 => "dusk",
        _ => "night",
    }
}

/// Season label for a 1-based month.
#[must_use]
pub fn season(month: u8) -> &'static str {
    match month {
        3..=5 => "spring",
        6..=8 => "summer",
        9..=11 => "autumn",
        _ => "winter",
    }
}

fn transition(previous: &str, current: &str) -> Option<Transition<String>> {
    (previous != current).then(|| Transition {
        previous: previous.to_string(),
        current: current.to_string(),
    })
}

impl TimeService for SimpleClock {
    fn now(&self) -> GameTime {
        Self::time_at(self.elapsed_minutes)
    }

    fn advance(&mut self, duration: Duration, reason: TimeChangeReason) -> TimeAdvanceResult {
        let previous = self.now();
        self.elapsed_minutes = self.elapsed_minutes.saturating_add(duration.to_minutes());
        self.history.push((duration, reason));
        let current = self.now();
        TimeAdvanceResult {
            previous,
            current,
            day_changed: (previous.year, previous.month, previous.day)
                != (current.year, current.month, current.day),
            time_of_day_change: transition(time_of_day(previous.hour), time_of_day(current.hour)),
            season_change: transition(season(previous.month), season(current.month)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_clock_starts_on_day_one_morning() {
        let clock = SimpleClock::default();
        let now = clock.now();
        assert_eq!((now.year, now.month, now.day, now.hour), (1, 1, 1, 8));
        assert_eq!(now.to_string(), "0001-01-01 08:00");
    }

    #[test]
    fn advancing_past_midnight_flags_day_change() {
        let mut clock = SimpleClock::starting_at(1, 1, 30, 23);
        let result = clock.advance(Duration::from_hours(1), TimeChangeReason::Travel);
        assert!(result.day_changed);
        assert_eq!(result.current.month, 2);
        assert_eq!(result.current.day, 1);
        assert_eq!(result.current.hour, 0);
        assert!(result.time_of_day_change.is_none());
    }

    #[test]
    fn time_of_day_and_season_transitions_are_reported() {
        let mut clock = SimpleClock::starting_at(3, 2, 30, 16);
        let result = clock.advance(Duration::from_hours(8), TimeChangeReason::Rest);
        let tod = result.time_of_day_change.expect("afternoon to night");
        assert_eq!(tod.previous, "afternoon");
        assert_eq!(tod.current, "night");
        let season = result.season_change.expect("winter to spring");
        assert_eq!(season.current, "spring");
    }

    #[test]
    fn history_tracks_reasons() {
        let mut clock = SimpleClock::default();
        clock.advance(Duration::from_hours(1), TimeChangeReason::Travel);
        clock.advance(Duration::from_minutes_only(30), TimeChangeReason::Travel);
        clock.advance(Duration::from_hours(8), TimeChangeReason::Rest);
        assert_eq!(clock.minutes_advanced_for(TimeChangeReason::Travel), 90);
        assert_eq!(clock.history().len(), 3);
    }
}
