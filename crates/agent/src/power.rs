//! Auxiliary power-source status.
//!
//! A laptop running the monitor keeps working through a mains outage,
//! but operators want to know. [`SysfsPowerStatus`] reads the Linux
//! power-supply uevent descriptor of the first battery.

use std::path::PathBuf;

/// Default sysfs directory holding power-supply descriptors.
pub const DEFAULT_POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";

/// Battery directories probed, in order.
const BATTERY_NAMES: [&str; 2] = ["BAT0", "BAT1"];

const STATUS_KEY: &str = "POWER_SUPPLY_STATUS";

/// Reports whether the host currently runs on battery.
pub trait PowerStatus: Send + Sync {
    fn on_battery(&self) -> bool;
}

/// [`PowerStatus`] backed by `/sys/class/power_supply/BAT*/uevent`.
///
/// A missing descriptor means "not on battery" and is not an error.
#[derive(Debug, Clone)]
pub struct SysfsPowerStatus {
    root: PathBuf,
}

impl Default for SysfsPowerStatus {
    fn default() -> Self {
        Self::new(DEFAULT_POWER_SUPPLY_ROOT)
    }
}

impl SysfsPowerStatus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn descriptor(&self) -> Option<PathBuf> {
        BATTERY_NAMES
            .iter()
            .map(|name| self.root.join(name).join("uevent"))
            .find(|path| path.exists())
    }
}

impl PowerStatus for SysfsPowerStatus {
    fn on_battery(&self) -> bool {
        let Some(path) = self.descriptor() else {
            tracing::debug!(root = %self.root.display(), "No battery found");
            return false;
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let discharging = is_discharging(&contents);
                tracing::debug!(path = %path.display(), discharging, "Battery status read");
                discharging
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Cannot read battery descriptor");
                false
            }
        }
    }
}

/// `true` if the uevent text has a status line containing "discharging".
pub fn is_discharging(uevent: &str) -> bool {
    uevent
        .lines()
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == STATUS_KEY)
        .is_some_and(|(_, value)| value.to_ascii_lowercase().contains("discharging"))
}
