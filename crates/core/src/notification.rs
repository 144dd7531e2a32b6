//! Notification model and message texts.
//!
//! A [`Notification`] is built transiently per event and handed by value to
//! the delivery layer. [`Envelope`] carries the addressing fields shared by
//! every message and provides one constructor per event type.

use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::config::MonitorConfig;
use crate::debounce::ConditionKind;
use crate::naming::iso_timestamp;

/// What a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Started,
    Warning,
    Alarm,
    PowerWarning,
    Heartbeat,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Warning => "warning",
            Self::Alarm => "alarm",
            Self::PowerWarning => "power_warning",
            Self::Heartbeat => "heartbeat",
        }
    }
}

impl From<ConditionKind> for NotificationKind {
    fn from(condition: ConditionKind) -> Self {
        match condition {
            ConditionKind::AcquisitionFailure => Self::Warning,
            ConditionKind::BelowThreshold => Self::Alarm,
            ConditionKind::OnBattery => Self::PowerWarning,
        }
    }
}

/// A message ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub sender: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
    /// Files attached in order, named by their base name.
    pub attachments: Vec<PathBuf>,
    /// SMTP server the message is submitted to.
    pub server: String,
}

impl Notification {
    /// No recipients, or a single blank one, means nothing is sent.
    pub fn has_recipients(&self) -> bool {
        self.recipients.iter().any(|r| !r.trim().is_empty())
    }
}

/// Per-cycle figures quoted in the heartbeat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleSummary {
    pub samples: usize,
    pub failures: usize,
    pub min_level: Option<f64>,
    pub max_level: f64,
}

/// Addressing shared by every notification of one monitor.
#[derive(Debug, Clone)]
pub struct Envelope {
    sender: String,
    recipients: Vec<String>,
    server: String,
}

impl Envelope {
    pub fn new(sender: impl Into<String>, recipients: Vec<String>, server: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            recipients,
            server: server.into(),
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            config.sender.clone(),
            config.recipients.clone(),
            config.smtp_server.clone(),
        )
    }

    fn build(
        &self,
        kind: NotificationKind,
        subject: &str,
        body: String,
        attachments: Vec<PathBuf>,
    ) -> Notification {
        Notification {
            kind,
            sender: self.sender.clone(),
            recipients: self.recipients.clone(),
            subject: subject.to_string(),
            body,
            attachments,
            server: self.server.clone(),
        }
    }

    /// One-time message sent before the loop starts. Never has attachments.
    pub fn started(&self, now: NaiveDateTime) -> Notification {
        self.build(
            NotificationKind::Started,
            "Sound monitor started",
            format!("The sound monitor was started at {}", iso_timestamp(now)),
            Vec::new(),
        )
    }

    pub fn acquisition_failed(&self, now: NaiveDateTime, attachments: Vec<PathBuf>) -> Notification {
        self.build(
            NotificationKind::Warning,
            "Sound monitor warning",
            format!("Warning: recording failed at {}", iso_timestamp(now)),
            attachments,
        )
    }

    pub fn below_threshold(
        &self,
        now: NaiveDateTime,
        level: f64,
        threshold: f64,
        attachments: Vec<PathBuf>,
    ) -> Notification {
        self.build(
            NotificationKind::Alarm,
            "*** COMPRESSOR ALARM ***",
            format!(
                "ALARM! Sound level below threshold at {}\n\nMeasured level: {level:.1}\nThreshold: {threshold}",
                iso_timestamp(now)
            ),
            attachments,
        )
    }

    pub fn on_battery(&self, now: NaiveDateTime, attachments: Vec<PathBuf>) -> Notification {
        self.build(
            NotificationKind::PowerWarning,
            "Warning: Sound monitor on battery",
            format!("Sound monitor runs on battery at {}", iso_timestamp(now)),
            attachments,
        )
    }

    pub fn heartbeat(&self, summary: CycleSummary, attachments: Vec<PathBuf>) -> Notification {
        let min = summary
            .min_level
            .map(|m| format!("{m:.1}"))
            .unwrap_or_else(|| "n/a".to_string());
        self.build(
            NotificationKind::Heartbeat,
            "Sound monitor daily message",
            format!(
                "Sound monitor daily message: all in best order, have fun!\n\n\
                 Samples: {}\nFailed acquisitions: {}\nMinimum level: {min}\nMaximum level: {:.1}",
                summary.samples, summary.failures, summary.max_level
            ),
            attachments,
        )
    }
}
