/// Reasons a [`MonitorConfig`](crate::config::MonitorConfig) is rejected at startup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Threshold must be a positive number, got {0}")]
    Threshold(f64),

    #[error("Sample window must be a positive number of seconds, got {0}")]
    SampleWindow(f64),

    #[error("Sample window of {0} seconds is too long to record")]
    SampleWindowTooLong(f64),

    #[error("Sampling rate must be at least 1 Hz")]
    SamplingRate,

    #[error("Invalid heartbeat cadence '{spec}': {reason}")]
    Cadence { spec: String, reason: String },

    #[error("Boundary hour must be between 0 and 23, got {0}")]
    BoundaryHour(u32),

    #[error("Dispatch queue capacity must be at least 1")]
    QueueCapacity,
}
