//! Signal acquisition.
//!
//! [`SignalSource`] produces one level reading per call. [`ArecordSource`]
//! records a window of mono S16_LE audio with ALSA's `arecord` into a
//! transient buffer and reduces it to its mean absolute amplitude.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use soundwatch_core::sample::mean_abs_level;
use soundwatch_core::MonitorConfig;
use tokio::process::Command;

/// File name of the transient capture buffer inside the tmp directory.
pub const CAPTURE_FILE_NAME: &str = "capture.raw";

/// Errors from a single acquisition attempt. All are recoverable: the
/// monitor records a failure sample and carries on.
#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("Failed to start capture tool '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Capture tool exited with code {code}: {stderr}")]
    Exit { code: i32, stderr: String },

    #[error("Capture did not finish within {secs:.1}s")]
    Timeout { secs: f64 },

    #[error("Cannot read capture buffer {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Capture buffer {0} holds no samples")]
    Empty(PathBuf),
}

/// A successful acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    /// Mean absolute amplitude of the window.
    pub level: f64,
    /// Raw buffer the level was computed from, if one was kept on disk.
    pub raw_path: Option<PathBuf>,
}

/// Produces one level reading per invocation.
pub trait SignalSource: Send {
    fn capture(&mut self) -> impl Future<Output = Result<Capture, AcquisitionError>> + Send;
}

// ---------------------------------------------------------------------------
// ArecordSource
// ---------------------------------------------------------------------------

/// Captures from the default ALSA device via `arecord`.
#[derive(Debug, Clone)]
pub struct ArecordSource {
    program: String,
    rate: u32,
    frames: u64,
    output: PathBuf,
    timeout: Duration,
}

impl ArecordSource {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            program: "arecord".to_string(),
            rate: config.sampling_rate,
            frames: config.samples_per_window(),
            output: config.tmp_dir.join(CAPTURE_FILE_NAME),
            timeout: config.capture_timeout(),
        }
    }

    /// Use a different executable with the `arecord` command line.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-q", "-t", "raw", "-f", "S16_LE", "-c", "1"])
            .arg("-r")
            .arg(self.rate.to_string())
            .arg("-s")
            .arg(self.frames.to_string())
            .arg(&self.output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl SignalSource for ArecordSource {
    async fn capture(&mut self) -> Result<Capture, AcquisitionError> {
        let child = self
            .command()
            .spawn()
            .map_err(|source| AcquisitionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // On timeout the child is dropped and killed (`kill_on_drop`).
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(AcquisitionError::Spawn {
                    program: self.program.clone(),
                    source,
                })
            }
            Err(_elapsed) => {
                return Err(AcquisitionError::Timeout {
                    secs: self.timeout.as_secs_f64(),
                })
            }
        };

        if !output.status.success() {
            return Err(AcquisitionError::Exit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let raw = tokio::fs::read(&self.output)
            .await
            .map_err(|source| AcquisitionError::Read {
                path: self.output.clone(),
                source,
            })?;
        let level =
            mean_abs_level(&raw).ok_or_else(|| AcquisitionError::Empty(self.output.clone()))?;

        tracing::debug!(level, bytes = raw.len(), "Captured sound level");
        Ok(Capture {
            level,
            raw_path: Some(self.output.clone()),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
