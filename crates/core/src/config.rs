//! Monitor configuration model.
//!
//! [`MonitorSettings`] is the raw, unchecked form produced by the CLI /
//! environment layer. [`MonitorSettings::validate`] turns it into a
//! [`MonitorConfig`], the immutable configuration the monitor loop runs
//! with. Validation happens exactly once, at startup; a failure is fatal.

use std::ops::Deref;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Default sender identity for outgoing notifications.
pub const DEFAULT_SENDER: &str = "soundwatch@localhost";

/// Default hour at which day-aligned cycles end.
pub const DEFAULT_BOUNDARY_HOUR: u32 = 8;

// ---------------------------------------------------------------------------
// Cadence
// ---------------------------------------------------------------------------

/// How long a monitoring cycle lasts before the heartbeat is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Fixed duration measured from the cycle start.
    Every(Duration),
    /// Ends `days` days after the most recent midnight, at `boundary_hour`.
    DayAligned { days: u32, boundary_hour: u32 },
}

impl Cadence {
    /// Parse an `N<unit>` cadence spec: `m` for minutes, `d` for days.
    ///
    /// Day specs use `boundary_hour` as the cycle boundary.
    pub fn parse(spec: &str, boundary_hour: u32) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::Cadence {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let spec_trimmed = spec.trim();
        let Some(unit) = spec_trimmed.chars().last() else {
            return Err(invalid("empty"));
        };
        let count: u32 = spec_trimmed[..spec_trimmed.len() - unit.len_utf8()]
            .parse()
            .map_err(|_| invalid("expected a whole number followed by 'm' or 'd'"))?;
        if count == 0 {
            return Err(invalid("count must be at least 1"));
        }

        match unit {
            'm' => Ok(Self::Every(Duration::from_secs(u64::from(count) * 60))),
            'd' => {
                if boundary_hour > 23 {
                    return Err(ConfigError::BoundaryHour(boundary_hour));
                }
                Ok(Self::DayAligned {
                    days: count,
                    boundary_hour,
                })
            }
            _ => Err(invalid("unit must be 'm' (minutes) or 'd' (days)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Recipients
// ---------------------------------------------------------------------------

/// Normalise a recipient list: split comma-separated entries, trim, and
/// drop blanks. An all-blank input yields an empty list.
pub fn normalize_recipients<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .flat_map(|entry| {
            entry
                .as_ref()
                .split(',')
                .map(|s| s.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// MonitorSettings
// ---------------------------------------------------------------------------

/// Unvalidated monitor settings.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Alarm fires when `0 <= level < threshold`.
    pub threshold: f64,
    /// Audio sampling rate in Hz.
    pub sampling_rate: u32,
    /// Length of one sampling window in seconds.
    pub sample_window_secs: f64,
    /// Notification recipients. Empty means notifications are no-ops.
    pub recipients: Vec<String>,
    /// SMTP server the notifications are submitted to.
    pub smtp_server: String,
    /// Sender identity of outgoing notifications.
    pub sender: String,
    /// Minimum interval between two notifications of the same condition.
    pub cool_down: Duration,
    /// Heartbeat / cycle cadence spec, e.g. `1d` or `30m`.
    pub cadence_spec: String,
    /// Hour of day at which day-aligned cycles end.
    pub boundary_hour: u32,
    /// Directory for the transient capture buffer (e.g. a ramdisk).
    pub tmp_dir: PathBuf,
    /// Directory for charts, extremum captures, and series exports.
    pub artifact_dir: PathBuf,
    /// Attach the cycle series as CSV alongside the chart.
    pub attach_series: bool,
    /// Render a PNG chart for attachments.
    pub chart_enabled: bool,
    /// Capacity of the bounded notification dispatch queue.
    pub queue_capacity: usize,
    /// Upper bound for delivering a single notification.
    pub delivery_timeout: Duration,
    /// Extra time allowed for the capture tool beyond the sample window.
    pub capture_slack: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            threshold: 1000.0,
            sampling_rate: 48_000,
            sample_window_secs: 1.0,
            recipients: Vec::new(),
            smtp_server: "localhost".to_string(),
            sender: DEFAULT_SENDER.to_string(),
            cool_down: Duration::from_secs(1800),
            cadence_spec: "1d".to_string(),
            boundary_hour: DEFAULT_BOUNDARY_HOUR,
            tmp_dir: PathBuf::from("/tmp"),
            artifact_dir: PathBuf::from("."),
            attach_series: false,
            chart_enabled: true,
            queue_capacity: 32,
            delivery_timeout: Duration::from_secs(60),
            capture_slack: Duration::from_secs(10),
        }
    }
}

impl MonitorSettings {
    /// Check every invariant and produce the immutable [`MonitorConfig`].
    pub fn validate(self) -> Result<MonitorConfig, ConfigError> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(ConfigError::Threshold(self.threshold));
        }
        if !self.sample_window_secs.is_finite() || self.sample_window_secs <= 0.0 {
            return Err(ConfigError::SampleWindow(self.sample_window_secs));
        }
        if self.sampling_rate == 0 {
            return Err(ConfigError::SamplingRate);
        }
        let frames = f64::from(self.sampling_rate) * self.sample_window_secs;
        let bounded = Duration::try_from_secs_f64(self.sample_window_secs)
            .ok()
            .and_then(|window| window.checked_add(self.capture_slack))
            .is_some();
        if !bounded || frames.round() >= u64::MAX as f64 {
            return Err(ConfigError::SampleWindowTooLong(self.sample_window_secs));
        }
        if self.boundary_hour > 23 {
            return Err(ConfigError::BoundaryHour(self.boundary_hour));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::QueueCapacity);
        }
        let cadence = Cadence::parse(&self.cadence_spec, self.boundary_hour)?;
        let recipients = normalize_recipients(&self.recipients);

        Ok(MonitorConfig {
            settings: MonitorSettings { recipients, ..self },
            cadence,
        })
    }
}

// ---------------------------------------------------------------------------
// MonitorConfig
// ---------------------------------------------------------------------------

/// Validated, immutable monitor configuration.
///
/// Only obtainable through [`MonitorSettings::validate`]; dereferences to
/// the underlying settings for field access.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    settings: MonitorSettings,
    cadence: Cadence,
}

impl MonitorConfig {
    /// The parsed cycle cadence.
    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Number of audio frames in one sampling window.
    pub fn samples_per_window(&self) -> u64 {
        (f64::from(self.settings.sampling_rate) * self.settings.sample_window_secs)
            .round()
            .max(1.0) as u64
    }

    /// Upper bound on a single acquisition.
    pub fn capture_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.settings.sample_window_secs)
            .unwrap_or(Duration::MAX)
            .saturating_add(self.settings.capture_slack)
    }
}

impl Deref for MonitorConfig {
    type Target = MonitorSettings;

    fn deref(&self) -> &Self::Target {
        &self.settings
    }
}

impl FromStr for Cadence {
    type Err = ConfigError;

    /// Parse with the default boundary hour.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, DEFAULT_BOUNDARY_HOUR)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn defaults_validate() {
        let config = MonitorSettings::default().validate().expect("defaults are valid");
        assert_eq!(
            config.cadence(),
            Cadence::DayAligned {
                days: 1,
                boundary_hour: 8
            }
        );
        assert_eq!(config.threshold, 1000.0);
        assert_eq!(config.samples_per_window(), 48_000);
    }

    #[test]
    fn parses_minute_cadence() {
        assert_eq!(
            Cadence::parse("30m", 8).unwrap(),
            Cadence::Every(Duration::from_secs(1800))
        );
    }

    #[test]
    fn parses_multi_day_cadence_with_boundary_hour() {
        assert_eq!(
            Cadence::parse("2d", 6).unwrap(),
            Cadence::DayAligned {
                days: 2,
                boundary_hour: 6
            }
        );
        assert_eq!(
            "1d".parse::<Cadence>().unwrap(),
            Cadence::DayAligned {
                days: 1,
                boundary_hour: DEFAULT_BOUNDARY_HOUR
            }
        );
    }

    #[test]
    fn rejects_malformed_cadence() {
        for spec in ["", "d", "10", "5x", "-1d", "0m", "1.5d"] {
            assert_matches!(
                Cadence::parse(spec, 8),
                Err(ConfigError::Cadence { .. }),
                "spec {spec:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_non_positive_threshold() {
        for threshold in [0.0, -5.0, f64::NAN] {
            let settings = MonitorSettings {
                threshold,
                ..Default::default()
            };
            assert_matches!(settings.validate(), Err(ConfigError::Threshold(_)));
        }
    }

    #[test]
    fn rejects_non_positive_window() {
        let settings = MonitorSettings {
            sample_window_secs: 0.0,
            ..Default::default()
        };
        assert_matches!(settings.validate(), Err(ConfigError::SampleWindow(_)));
    }

    #[test]
    fn rejects_window_too_long_to_record() {
        for sample_window_secs in [1e20, f64::MAX] {
            let settings = MonitorSettings {
                sample_window_secs,
                ..Default::default()
            };
            assert_matches!(
                settings.validate(),
                Err(ConfigError::SampleWindowTooLong(w)) if w == sample_window_secs
            );
        }
    }

    #[test]
    fn long_but_recordable_window_is_accepted() {
        let config = MonitorSettings {
            sample_window_secs: 86_400.0,
            ..Default::default()
        }
        .validate()
        .expect("a day-long window is valid");
        assert_eq!(config.samples_per_window(), 48_000 * 86_400);
        assert_eq!(config.capture_timeout(), Duration::from_secs(86_400 + 10));
    }

    #[test]
    fn rejects_zero_rate_and_bad_hour() {
        let settings = MonitorSettings {
            sampling_rate: 0,
            ..Default::default()
        };
        assert_matches!(settings.validate(), Err(ConfigError::SamplingRate));

        let settings = MonitorSettings {
            boundary_hour: 24,
            ..Default::default()
        };
        assert_matches!(settings.validate(), Err(ConfigError::BoundaryHour(24)));
    }

    #[test]
    fn recipients_are_normalised() {
        let settings = MonitorSettings {
            recipients: vec![
                "a@example.org, b@example.org".to_string(),
                " ".to_string(),
                "c@example.org".to_string(),
            ],
            ..Default::default()
        };
        let config = settings.validate().unwrap();
        assert_eq!(
            config.recipients,
            vec!["a@example.org", "b@example.org", "c@example.org"]
        );
    }

    #[test]
    fn sole_empty_recipient_becomes_empty_list() {
        assert!(normalize_recipients([""]).is_empty());
    }

    #[test]
    fn capture_timeout_adds_slack() {
        let config = MonitorSettings {
            sample_window_secs: 1.5,
            capture_slack: Duration::from_secs(10),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(config.capture_timeout(), Duration::from_millis(11_500));
    }
}
