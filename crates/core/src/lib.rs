//! `soundwatch-core` -- pure domain logic of the sound monitor.
//!
//! Nothing in this crate performs I/O: acquisition, power status,
//! charting, and delivery are capabilities implemented by the agent and
//! events crates. Keeping the cycle math, debounce, and extremum logic
//! here lets them be tested in isolation.

pub mod clock;
pub mod config;
pub mod debounce;
pub mod error;
pub mod extremum;
pub mod naming;
pub mod notification;
pub mod sample;

pub use clock::{Clock, CycleClock, CycleWindow, SystemClock};
pub use config::{Cadence, MonitorConfig, MonitorSettings};
pub use debounce::{ConditionKind, DebounceGate};
pub use error::ConfigError;
pub use extremum::{ExtremumKind, ExtremumTracker, ExtremumUpdate};
pub use notification::{CycleSummary, Envelope, Notification, NotificationKind};
pub use sample::{CycleSeries, Sample, ACQUISITION_FAILED};
