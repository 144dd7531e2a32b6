//! The sampling / evaluation / notification loop.
//!
//! Each tick acquires one sample, records it in the cycle series and the
//! extremum tracker, and raises debounced notifications for failed
//! acquisitions, sub-threshold levels, and battery operation. When the
//! cycle deadline passes a heartbeat is sent unconditionally and per-cycle
//! state is reset. Debounce state survives cycle rollover.
//!
//! Notifications are handed to the dispatch queue by value, so delivery
//! never blocks sampling. Cancellation is checked right after each
//! acquisition and after each cycle close; an in-flight capture is
//! abandoned (and its child process killed) when cancellation fires.

use chrono::NaiveDateTime;
use soundwatch_core::{
    Clock, ConditionKind, CycleSeries, CycleSummary, CycleWindow, DebounceGate, Envelope,
    ExtremumTracker, MonitorConfig, Notification, NotificationKind, Sample,
};
use soundwatch_events::DispatchQueue;
use tokio_util::sync::CancellationToken;

use crate::artifacts::ArtifactStore;
use crate::power::PowerStatus;
use crate::source::{AcquisitionError, Capture, SignalSource};

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorReport {
    /// Samples taken, failed acquisitions included.
    pub ticks: u64,
    /// Cycles closed with a heartbeat.
    pub cycles: u64,
    /// Notifications handed to the dispatch queue, startup included.
    pub notifications: u64,
}

/// Orchestrates acquisition, evaluation, and notification.
pub struct MonitorLoop<S, P, K> {
    config: MonitorConfig,
    source: S,
    power: P,
    clock: K,
    artifacts: ArtifactStore,
    queue: DispatchQueue,
    envelope: Envelope,
    gate: DebounceGate,
    extrema: ExtremumTracker,
    series: CycleSeries,
    report: MonitorReport,
}

impl<S, P, K> MonitorLoop<S, P, K>
where
    S: SignalSource,
    P: PowerStatus,
    K: Clock,
{
    pub fn new(
        config: MonitorConfig,
        source: S,
        power: P,
        clock: K,
        artifacts: ArtifactStore,
        queue: DispatchQueue,
    ) -> Self {
        Self {
            envelope: Envelope::from_config(&config),
            gate: DebounceGate::new(config.cool_down),
            extrema: ExtremumTracker::new(),
            series: CycleSeries::new(),
            report: MonitorReport::default(),
            config,
            source,
            power,
            clock,
            artifacts,
            queue,
        }
    }

    /// Run until `cancel` fires.
    ///
    /// Consumes the loop; dropping it closes this producer's side of the
    /// dispatch queue so the dispatcher can drain and exit.
    pub async fn run(mut self, cancel: CancellationToken) -> MonitorReport {
        let started = self.envelope.started(self.clock.now());
        self.dispatch(started);

        let mut window = CycleWindow::open(self.clock.now(), self.config.cadence());
        tracing::info!(
            start = %window.start,
            end = %window.end,
            "Monitoring cycle started"
        );

        loop {
            let now = self.clock.now();
            if window.is_over(now) {
                self.close_cycle(now).await;
                if cancel.is_cancelled() {
                    break;
                }
                window = CycleWindow::open(now, self.config.cadence());
                tracing::info!(
                    start = %window.start,
                    end = %window.end,
                    "Monitoring cycle started"
                );
            }

            let capture = tokio::select! {
                _ = cancel.cancelled() => break,
                capture = self.source.capture() => capture,
            };
            if cancel.is_cancelled() {
                break;
            }

            self.tick(capture).await;
        }

        tracing::info!(
            ticks = self.report.ticks,
            cycles = self.report.cycles,
            notifications = self.report.notifications,
            "Monitor stopped"
        );
        self.report
    }

    /// Record one acquisition, then evaluate it.
    async fn tick(&mut self, capture: Result<Capture, AcquisitionError>) {
        let now = self.clock.now();
        self.report.ticks += 1;

        let (sample, raw_path) = match capture {
            Ok(capture) => (Sample::new(now, capture.level), capture.raw_path),
            Err(e) => {
                tracing::warn!(error = %e, "Acquisition failed");
                (Sample::failed(now), None)
            }
        };
        self.series.push(sample);
        tracing::debug!(level = sample.level, "Sample recorded");

        let update = self.extrema.update(&sample);
        if let Some(raw) = raw_path {
            for kind in update.kinds() {
                match self.artifacts.save_extremum(&raw, kind, now).await {
                    Ok(path) => tracing::info!(
                        kind = kind.as_str(),
                        level = sample.level,
                        path = %path.display(),
                        "New extremum captured"
                    ),
                    Err(e) => tracing::warn!(
                        kind = kind.as_str(),
                        error = %e,
                        "Failed to save extremum capture"
                    ),
                }
            }
        }

        if sample.is_failure() {
            self.raise(ConditionKind::AcquisitionFailure, &sample).await;
        } else if sample.is_below(self.config.threshold) {
            self.raise(ConditionKind::BelowThreshold, &sample).await;
        }
        if self.power.on_battery() {
            self.raise(ConditionKind::OnBattery, &sample).await;
        }
    }

    /// Notify `condition` unless it is cooling down. The gate is marked on
    /// hand-off, whatever becomes of the delivery.
    async fn raise(&mut self, condition: ConditionKind, sample: &Sample) {
        let now = sample.timestamp;
        if !self.gate.should_notify(condition, now) {
            tracing::debug!(
                condition = %condition,
                last = ?self.gate.last_notified(condition),
                "Notification suppressed during cool-down"
            );
            return;
        }

        let attachments = self
            .artifacts
            .attachments(&self.series, self.config.threshold, condition.into(), now)
            .await;
        let notification = match condition {
            ConditionKind::AcquisitionFailure => {
                self.envelope.acquisition_failed(now, attachments)
            }
            ConditionKind::BelowThreshold => self.envelope.below_threshold(
                now,
                sample.level,
                self.config.threshold,
                attachments,
            ),
            ConditionKind::OnBattery => self.envelope.on_battery(now, attachments),
        };

        self.gate.mark_notified(condition, now);
        tracing::warn!(
            condition = %condition,
            level = sample.level,
            threshold = self.config.threshold,
            "Condition raised"
        );
        self.dispatch(notification);
    }

    /// Send the heartbeat and reset per-cycle state.
    async fn close_cycle(&mut self, now: NaiveDateTime) {
        let summary = CycleSummary {
            samples: self.series.len(),
            failures: self.series.failure_count(),
            min_level: self.extrema.min(),
            max_level: self.extrema.max(),
        };
        let attachments = self
            .artifacts
            .attachments(
                &self.series,
                self.config.threshold,
                NotificationKind::Heartbeat,
                now,
            )
            .await;
        let heartbeat = self.envelope.heartbeat(summary, attachments);
        self.dispatch(heartbeat);

        self.report.cycles += 1;
        tracing::info!(
            samples = summary.samples,
            failures = summary.failures,
            min_level = ?summary.min_level,
            max_level = summary.max_level,
            "Monitoring cycle closed"
        );

        self.series.clear();
        self.extrema.reset();
    }

    fn dispatch(&mut self, notification: Notification) {
        self.report.notifications += 1;
        self.queue.enqueue(notification);
    }
}
