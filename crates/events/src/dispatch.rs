//! Asynchronous notification dispatch.
//!
//! The monitor loop hands each [`Notification`] by value to a bounded
//! [`DispatchQueue`]; a single [`Dispatcher`] task drains it and delivers
//! sequentially through a [`Notifier`], so a slow or dead mail server never
//! delays acquisition. A full queue drops the message rather than block
//! the producer.
//!
//! The dispatcher exits once every [`DispatchQueue`] handle is dropped and
//! the backlog is drained.

use std::time::Duration;

use soundwatch_core::Notification;
use tokio::sync::mpsc;

use crate::delivery::{DeliveryError, Notifier};

/// Create a connected queue / dispatcher pair.
pub fn channel<N: Notifier>(
    notifier: N,
    capacity: usize,
    delivery_timeout: Duration,
) -> (DispatchQueue, Dispatcher<N>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        DispatchQueue { tx },
        Dispatcher {
            rx,
            notifier,
            delivery_timeout,
        },
    )
}

// ---------------------------------------------------------------------------
// DispatchQueue
// ---------------------------------------------------------------------------

/// Producer side of the dispatch queue.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    tx: mpsc::Sender<Notification>,
}

impl DispatchQueue {
    /// Hand a notification to the dispatcher without waiting.
    ///
    /// Returns `false` if the queue is full or the dispatcher is gone; the
    /// notification is dropped in that case.
    pub fn enqueue(&self, notification: Notification) -> bool {
        let kind = notification.kind.as_str();
        match self.tx.try_send(notification) {
            Ok(()) => {
                tracing::debug!(kind, "Notification queued");
                true
            }
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                tracing::error!(
                    kind,
                    subject = %dropped.subject,
                    "Dispatch queue full, notification dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                tracing::error!(
                    kind,
                    subject = %dropped.subject,
                    "Dispatcher stopped, notification dropped"
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Outcome counters reported when the dispatcher exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: usize,
    pub failed: usize,
}

/// Consumer side of the dispatch queue.
pub struct Dispatcher<N> {
    rx: mpsc::Receiver<Notification>,
    notifier: N,
    delivery_timeout: Duration,
}

impl<N: Notifier> Dispatcher<N> {
    /// Deliver queued notifications until every producer is dropped.
    ///
    /// Failures are logged and counted, never retried.
    pub async fn run(mut self) -> DispatchStats {
        let mut stats = DispatchStats::default();

        while let Some(notification) = self.rx.recv().await {
            match self.deliver(&notification).await {
                Ok(()) => stats.delivered += 1,
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!(
                        kind = notification.kind.as_str(),
                        subject = %notification.subject,
                        error = %e,
                        "Notification delivery failed"
                    );
                }
            }
        }

        tracing::info!(
            delivered = stats.delivered,
            failed = stats.failed,
            "Dispatcher drained, stopping"
        );
        stats
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        match tokio::time::timeout(self.delivery_timeout, self.notifier.send(notification)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(DeliveryError::Timeout {
                secs: self.delivery_timeout.as_secs(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use soundwatch_core::{Envelope, NotificationKind};

    use super::*;

    /// Records every notification; fails those whose subject contains "fail".
    #[derive(Clone, Default)]
    struct Recorder {
        seen: Arc<Mutex<Vec<Notification>>>,
    }

    impl Notifier for Recorder {
        async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
            self.seen.lock().unwrap().push(notification.clone());
            if notification.subject.contains("fail") {
                return Err(DeliveryError::Other("refused".to_string()));
            }
            Ok(())
        }
    }

    struct Stalled;

    impl Notifier for Stalled {
        async fn send(&self, _notification: &Notification) -> Result<(), DeliveryError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn started() -> Notification {
        Envelope::new("a@example.org", vec!["b@example.org".into()], "localhost")
            .started(chrono::NaiveDateTime::default())
    }

    #[tokio::test]
    async fn delivers_in_order_and_stops_when_queue_dropped() {
        let recorder = Recorder::default();
        let (queue, dispatcher) = channel(recorder.clone(), 8, Duration::from_secs(5));
        let handle = tokio::spawn(dispatcher.run());

        let mut second = started();
        second.kind = NotificationKind::Heartbeat;
        assert!(queue.enqueue(started()));
        assert!(queue.enqueue(second));
        drop(queue);

        let stats = handle.await.expect("dispatcher task");
        assert_eq!(stats, DispatchStats { delivered: 2, failed: 0 });
        let kinds: Vec<_> = recorder.seen.lock().unwrap().iter().map(|n| n.kind).collect();
        assert_eq!(kinds, [NotificationKind::Started, NotificationKind::Heartbeat]);
    }

    #[tokio::test]
    async fn failures_are_counted_not_retried() {
        let recorder = Recorder::default();
        let (queue, dispatcher) = channel(recorder.clone(), 8, Duration::from_secs(5));

        let mut failing = started();
        failing.subject = "please fail".to_string();
        queue.enqueue(failing);
        queue.enqueue(started());
        drop(queue);

        let stats = dispatcher.run().await;
        assert_eq!(stats, DispatchStats { delivered: 1, failed: 1 });
        assert_eq!(recorder.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let (queue, _dispatcher) = channel(Recorder::default(), 1, Duration::from_secs(5));
        assert!(queue.enqueue(started()));
        assert!(!queue.enqueue(started()));
    }

    #[tokio::test]
    async fn closed_queue_rejects() {
        let (queue, dispatcher) = channel(Recorder::default(), 4, Duration::from_secs(5));
        drop(dispatcher);
        assert!(!queue.enqueue(started()));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_delivery_times_out() {
        let (queue, dispatcher) = channel(Stalled, 4, Duration::from_secs(30));
        queue.enqueue(started());
        drop(queue);

        let stats = dispatcher.run().await;
        assert_eq!(stats, DispatchStats { delivered: 0, failed: 1 });
    }
}
