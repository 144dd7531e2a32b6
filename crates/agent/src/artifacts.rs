//! Persisted artifacts: extremum captures, charts, and series exports.
//!
//! Artifact failures never stop the monitor. Extremum copy errors are
//! returned to the caller for logging; attachment production logs and
//! skips whatever could not be written, so a notification still goes out.
//!
//! Every notification gets its own attachment files. They are read later
//! by the dispatcher, so a file is never rewritten once handed over.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use soundwatch_core::naming::{chart_file_name, extremum_file_name, iso_timestamp, series_file_name};
use soundwatch_core::{CycleSeries, ExtremumKind, MonitorConfig, NotificationKind, Sample};

use crate::chart::{ChartRenderer, PngChart};

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Series export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Artifact task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Serialize)]
struct SeriesRow {
    timestamp: String,
    level: f64,
}

/// Writes artifacts below a single directory.
pub struct ArtifactStore {
    dir: PathBuf,
    chart: Option<Arc<dyn ChartRenderer>>,
    attach_series: bool,
    next_seq: u64,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            chart: None,
            attach_series: false,
            next_seq: 0,
        }
    }

    /// Store configured from the monitor settings, rendering PNG charts
    /// unless disabled.
    pub fn from_config(config: &MonitorConfig) -> Self {
        let store = Self::new(config.artifact_dir.clone()).with_series_export(config.attach_series);
        if config.chart_enabled {
            store.with_chart(PngChart::default())
        } else {
            store
        }
    }

    pub fn with_chart(mut self, chart: impl ChartRenderer + 'static) -> Self {
        self.chart = Some(Arc::new(chart));
        self
    }

    pub fn with_series_export(mut self, enabled: bool) -> Self {
        self.attach_series = enabled;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the artifact directory if needed.
    pub async fn prepare(&self) -> Result<(), ArtifactError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ArtifactError::Io {
                path: self.dir.clone(),
                source,
            })
    }

    /// Keep a copy of the raw capture that produced a new extremum.
    pub async fn save_extremum(
        &self,
        raw: &Path,
        kind: ExtremumKind,
        at: NaiveDateTime,
    ) -> Result<PathBuf, ArtifactError> {
        let target = self.dir.join(extremum_file_name(at, kind));
        tokio::fs::copy(raw, &target)
            .await
            .map_err(|source| ArtifactError::Io {
                path: target.clone(),
                source,
            })?;
        Ok(target)
    }

    /// Files to attach to a `kind` notification sent at `at`.
    ///
    /// Rendering and export run on the blocking pool.
    pub async fn attachments(
        &mut self,
        series: &CycleSeries,
        threshold: f64,
        kind: NotificationKind,
        at: NaiveDateTime,
    ) -> Vec<PathBuf> {
        let mut files = Vec::new();
        if series.is_empty() {
            return files;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let samples: Arc<[Sample]> = series.samples().into();

        if let Some(chart) = &self.chart {
            let path = self.dir.join(chart_file_name(at, kind, seq));
            let chart = Arc::clone(chart);
            let (samples, target) = (Arc::clone(&samples), path.clone());
            let rendered = tokio::task::spawn_blocking(move || {
                chart.render(&samples, threshold, &target)
            })
            .await;
            match rendered {
                Ok(Ok(())) => files.push(path),
                Ok(Err(e)) => {
                    tracing::warn!(path = %path.display(), error = %e, "Chart rendering failed");
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Chart rendering task failed");
                }
            }
        }

        if self.attach_series {
            let path = self.dir.join(series_file_name(at, kind, seq));
            let target = path.clone();
            let written = tokio::task::spawn_blocking(move || write_series(&samples, &target))
                .await
                .map_err(ArtifactError::from)
                .and_then(|r| r);
            match written {
                Ok(()) => files.push(path),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Series export failed");
                }
            }
        }

        files
    }
}

/// Write `timestamp,level` rows for every sample.
pub fn write_series(samples: &[Sample], path: &Path) -> Result<(), ArtifactError> {
    let mut writer = csv::Writer::from_path(path)?;
    for sample in samples {
        writer.serialize(SeriesRow {
            timestamp: iso_timestamp(sample.timestamp),
            level: sample.level,
        })?;
    }
    writer.flush().map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}
