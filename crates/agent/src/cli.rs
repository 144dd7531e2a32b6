//! Command line of the `soundwatch` daemon.
//!
//! Every flag falls back to an environment variable, so the daemon can be
//! configured from a `.env` file alone.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use soundwatch_core::config::normalize_recipients;
use soundwatch_core::MonitorSettings;
use soundwatch_events::EmailConfig;

#[derive(Debug, Parser)]
#[command(name = "soundwatch")]
#[command(about = "Watches a microphone and emails an alarm when the sound level drops", long_about = None)]
pub struct Cli {
    /// Alarm when the measured level is below this value
    #[arg(long, default_value_t = 1000.0, env = "SOUNDWATCH_THRESHOLD")]
    pub threshold: f64,

    /// Audio sampling rate in Hz
    #[arg(long, default_value_t = 48_000, env = "SOUNDWATCH_RATE")]
    pub rate: u32,

    /// Length of one sampling window in seconds
    #[arg(long, default_value_t = 1.0, env = "SOUNDWATCH_SECONDS")]
    pub seconds: f64,

    /// Notification recipient; repeat the flag or pass a comma separated list
    #[arg(long, value_delimiter = ',', env = "SOUNDWATCH_EMAILTO")]
    pub emailto: Vec<String>,

    /// SMTP server notifications are submitted to
    #[arg(long, default_value = "localhost", env = "SMTP_HOST")]
    pub server: String,

    /// SMTP port
    #[arg(long, default_value_t = 25, env = "SMTP_PORT")]
    pub smtp_port: u16,

    /// Use a STARTTLS relay instead of plain SMTP
    #[arg(long, env = "SMTP_STARTTLS")]
    pub starttls: bool,

    /// Sender address of outgoing notifications
    #[arg(long, default_value = soundwatch_core::config::DEFAULT_SENDER, env = "SMTP_FROM")]
    pub sender: String,

    /// Minimum seconds between two notifications of the same condition
    #[arg(long, default_value_t = 1800, env = "SOUNDWATCH_WARNPERIOD")]
    pub warnperiod: u64,

    /// Heartbeat cadence: a count followed by `m` (minutes) or `d` (days)
    #[arg(long, default_value = "1d", env = "SOUNDWATCH_ALIVEPERIOD")]
    pub aliveperiod: String,

    /// Hour of day at which day-aligned cycles end
    #[arg(long, default_value_t = soundwatch_core::config::DEFAULT_BOUNDARY_HOUR, env = "SOUNDWATCH_BOUNDARY_HOUR")]
    pub boundary_hour: u32,

    /// Directory for the transient capture buffer
    #[arg(long, default_value = "/tmp", env = "SOUNDWATCH_TMPDIR")]
    pub tmpdir: PathBuf,

    /// Directory for charts, extremum captures and series exports
    #[arg(long, default_value = ".", env = "SOUNDWATCH_ARTIFACT_DIR")]
    pub artifact_dir: PathBuf,

    /// Also attach the cycle series as CSV
    #[arg(long, env = "SOUNDWATCH_ATTACH_SERIES")]
    pub attach_series: bool,

    /// Do not render PNG charts
    #[arg(long, env = "SOUNDWATCH_NO_CHART")]
    pub no_chart: bool,

    /// Capacity of the notification dispatch queue
    #[arg(long, default_value_t = 32, env = "SOUNDWATCH_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Seconds allowed for delivering one notification
    #[arg(long, default_value_t = 60, env = "SOUNDWATCH_DELIVERY_TIMEOUT")]
    pub delivery_timeout: u64,

    /// Seconds the capture tool may overrun the sampling window
    #[arg(long, default_value_t = 10, env = "SOUNDWATCH_CAPTURE_SLACK")]
    pub capture_slack: u64,
}

impl Cli {
    /// Unvalidated monitor settings described by the command line.
    pub fn settings(&self) -> MonitorSettings {
        MonitorSettings {
            threshold: self.threshold,
            sampling_rate: self.rate,
            sample_window_secs: self.seconds,
            recipients: normalize_recipients(&self.emailto),
            smtp_server: self.server.clone(),
            sender: self.sender.clone(),
            cool_down: Duration::from_secs(self.warnperiod),
            cadence_spec: self.aliveperiod.clone(),
            boundary_hour: self.boundary_hour,
            tmp_dir: self.tmpdir.clone(),
            artifact_dir: self.artifact_dir.clone(),
            attach_series: self.attach_series,
            chart_enabled: !self.no_chart,
            queue_capacity: self.queue_capacity,
            delivery_timeout: Duration::from_secs(self.delivery_timeout),
            capture_slack: Duration::from_secs(self.capture_slack),
        }
    }

    /// SMTP transport settings; credentials come from `SMTP_USER` and
    /// `SMTP_PASSWORD`.
    pub fn email_config(&self) -> EmailConfig {
        EmailConfig::with_env_credentials(self.smtp_port, self.starttls)
    }
}
