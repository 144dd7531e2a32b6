//! Cycle scheduling.
//!
//! All times are local wall-clock [`NaiveDateTime`]s so day-aligned
//! boundaries land on the hour an operator expects.

use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};

use crate::config::Cadence;

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// [`Clock`] backed by the host's local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Computes end-of-cycle deadlines. Stateless.
pub struct CycleClock;

impl CycleClock {
    /// Deadline of a cycle starting at `now`.
    ///
    /// Day-aligned cadences end at `midnight(now) + days + boundary_hour`.
    /// This is a fixed offset from the most recent midnight, not the next
    /// occurrence of the boundary hour, so with `days = 1` a cycle started
    /// at 09:00 ends at 08:00 the following morning.
    pub fn next_deadline(now: NaiveDateTime, cadence: Cadence) -> NaiveDateTime {
        match cadence {
            Cadence::Every(duration) => TimeDelta::from_std(duration)
                .ok()
                .and_then(|d| now.checked_add_signed(d))
                .unwrap_or(NaiveDateTime::MAX),
            Cadence::DayAligned {
                days,
                boundary_hour,
            } => {
                let midnight = now.date().and_time(NaiveTime::MIN);
                midnight
                    + TimeDelta::days(i64::from(days))
                    + TimeDelta::hours(i64::from(boundary_hour))
            }
        }
    }
}

/// The active monitoring period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl CycleWindow {
    /// Open a new window at `now`.
    pub fn open(now: NaiveDateTime, cadence: Cadence) -> Self {
        Self {
            start: now,
            end: CycleClock::next_deadline(now, cadence),
        }
    }

    /// Whether `now` has reached the end of the window.
    pub fn is_over(&self, now: NaiveDateTime) -> bool {
        now >= self.end
    }
}
