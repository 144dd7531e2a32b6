//! Per-condition notification cool-down.
//!
//! [`DebounceGate`] remembers when each [`ConditionKind`] was last notified
//! and suppresses repeats until the cool-down has elapsed. Kinds are
//! independent: an active alarm cool-down never suppresses a battery
//! warning. The state lives for the whole process and is not reset when a
//! cycle rolls over.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};

/// A notifiable abnormal condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    /// The signal source failed to produce a reading.
    AcquisitionFailure,
    /// The level dropped below the threshold: the equipment appears off.
    BelowThreshold,
    /// The host is running on battery.
    OnBattery,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 3] = [
        ConditionKind::AcquisitionFailure,
        ConditionKind::BelowThreshold,
        ConditionKind::OnBattery,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AcquisitionFailure => "acquisition_failure",
            Self::BelowThreshold => "below_threshold",
            Self::OnBattery => "on_battery",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum-interval gate, one slot per [`ConditionKind`].
#[derive(Debug)]
pub struct DebounceGate {
    cool_down: TimeDelta,
    last_notified: HashMap<ConditionKind, NaiveDateTime>,
}

impl DebounceGate {
    pub fn new(cool_down: Duration) -> Self {
        Self {
            cool_down: TimeDelta::from_std(cool_down).unwrap_or(TimeDelta::MAX),
            last_notified: HashMap::new(),
        }
    }

    /// `true` if `condition` was never notified, or its last notification
    /// is strictly more than the cool-down in the past.
    pub fn should_notify(&self, condition: ConditionKind, now: NaiveDateTime) -> bool {
        match self.last_notified.get(&condition) {
            None => true,
            Some(last) => now.signed_duration_since(*last) > self.cool_down,
        }
    }

    /// Record a notification attempt. Called whether or not delivery
    /// succeeds, so a dead mail channel cannot cause a notification storm.
    pub fn mark_notified(&mut self, condition: ConditionKind, now: NaiveDateTime) {
        self.last_notified.insert(condition, now);
    }

    /// [`should_notify`](Self::should_notify) followed by
    /// [`mark_notified`](Self::mark_notified) when it passes.
    pub fn try_acquire(&mut self, condition: ConditionKind, now: NaiveDateTime) -> bool {
        if !self.should_notify(condition, now) {
            return false;
        }
        self.mark_notified(condition, now);
        true
    }

    /// When `condition` was last notified, if ever.
    pub fn last_notified(&self, condition: ConditionKind) -> Option<NaiveDateTime> {
        self.last_notified.get(&condition).copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
