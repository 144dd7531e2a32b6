//! Running per-cycle minimum and maximum level.

use crate::sample::Sample;

/// Which extremum a capture artifact represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremumKind {
    Min,
    Max,
}

impl ExtremumKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

/// Outcome of feeding one sample into the tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtremumUpdate {
    pub new_min: bool,
    pub new_max: bool,
}

impl ExtremumUpdate {
    /// Extremum kinds that changed, minimum first.
    pub fn kinds(self) -> impl Iterator<Item = ExtremumKind> {
        [
            self.new_min.then_some(ExtremumKind::Min),
            self.new_max.then_some(ExtremumKind::Max),
        ]
        .into_iter()
        .flatten()
    }
}

/// Tracks the lowest and highest valid level seen in the current cycle.
///
/// Starts at `min = +inf`, `max = 0`. Comparisons are strict, so a level
/// equal to the current extremum is not reported as new. Failed
/// acquisitions are ignored.
#[derive(Debug, Clone)]
pub struct ExtremumTracker {
    min: f64,
    max: f64,
}

impl Default for ExtremumTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtremumTracker {
    pub fn new() -> Self {
        Self {
            min: f64::INFINITY,
            max: 0.0,
        }
    }

    pub fn update(&mut self, sample: &Sample) -> ExtremumUpdate {
        if sample.is_failure() {
            return ExtremumUpdate::default();
        }

        let mut update = ExtremumUpdate::default();
        if sample.level < self.min {
            self.min = sample.level;
            update.new_min = true;
        }
        if sample.level > self.max {
            self.max = sample.level;
            update.new_max = true;
        }
        update
    }

    /// Lowest valid level this cycle, if any sample was valid.
    pub fn min(&self) -> Option<f64> {
        self.min.is_finite().then_some(self.min)
    }

    /// Highest level this cycle (`0` until a positive level arrives).
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Back to the cycle-start state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn sample(level: f64) -> Sample {
        Sample::new(NaiveDateTime::default(), level)
    }

    #[test]
    fn tracks_the_documented_sequence() {
        let mut tracker = ExtremumTracker::new();
        let updates: Vec<_> = [5.0, 3.0, 3.0, 9.0, 1.0]
            .into_iter()
            .map(|level| tracker.update(&sample(level)))
            .collect();

        let mins: Vec<bool> = updates.iter().map(|u| u.new_min).collect();
        let maxs: Vec<bool> = updates.iter().map(|u| u.new_max).collect();
        assert_eq!(mins, [true, true, false, false, true]);
        assert_eq!(maxs, [true, false, false, true, false]);
        assert_eq!(tracker.min(), Some(1.0));
        assert_eq!(tracker.max(), 9.0);
    }

    #[test]
    fn failure_sentinel_is_ignored() {
        let mut tracker = ExtremumTracker::new();
        let update = tracker.update(&Sample::failed(NaiveDateTime::default()));
        assert_eq!(update, ExtremumUpdate::default());
        assert_eq!(tracker.min(), None);
        assert_eq!(tracker.max(), 0.0);
    }

    #[test]
    fn zero_level_is_a_minimum_but_not_a_maximum() {
        let mut tracker = ExtremumTracker::new();
        let update = tracker.update(&sample(0.0));
        assert!(update.new_min);
        assert!(!update.new_max);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut tracker = ExtremumTracker::new();
        tracker.update(&sample(42.0));
        tracker.reset();
        assert_eq!(tracker.min(), None);
        assert_eq!(tracker.max(), 0.0);
        assert!(tracker.update(&sample(42.0)).new_min);
    }

    #[test]
    fn update_kinds_lists_changes() {
        let both = ExtremumUpdate {
            new_min: true,
            new_max: true,
        };
        assert_eq!(
            both.kinds().collect::<Vec<_>>(),
            [ExtremumKind::Min, ExtremumKind::Max]
        );
        assert_eq!(ExtremumUpdate::default().kinds().count(), 0);
    }
}
