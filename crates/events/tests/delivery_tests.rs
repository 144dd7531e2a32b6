//! Integration tests for SMTP delivery and the dispatch queue.
//!
//! None of these reach a mail server: each case fails, or short-circuits,
//! before a connection is opened.

use std::path::PathBuf;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveDateTime};
use soundwatch_core::{Envelope, Notification};
use soundwatch_events::{dispatch, DeliveryError, EmailConfig, EmailError, Notifier, SmtpNotifier};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 5, 20)
        .unwrap()
        .and_hms_opt(6, 15, 0)
        .unwrap()
}

fn envelope(sender: &str, recipients: &[&str]) -> Envelope {
    Envelope::new(
        sender,
        recipients.iter().map(|r| r.to_string()).collect(),
        "smtp.invalid",
    )
}

fn alarm(envelope: &Envelope, attachments: Vec<PathBuf>) -> Notification {
    envelope.below_threshold(now(), 312.0, 1000.0, attachments)
}

// ---------------------------------------------------------------------------
// Test: SmtpNotifier
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_recipients_is_a_silent_success() {
    let notifier = SmtpNotifier::new(EmailConfig::default());
    for recipients in [&[][..], &[""][..], &["  "][..]] {
        let notification = alarm(&envelope("soundwatch@localhost", recipients), Vec::new());
        notifier
            .send(&notification)
            .await
            .expect("nothing to send is not an error");
    }
}

#[tokio::test]
async fn unreadable_attachment_fails_before_connecting() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("2026-05-20T06:15:00_sound.png");
    let notification = alarm(
        &envelope("soundwatch@localhost", &["ops@example.com"]),
        vec![missing.clone()],
    );

    let err = SmtpNotifier::new(EmailConfig::default())
        .send(&notification)
        .await
        .unwrap_err();

    assert_matches!(
        err,
        DeliveryError::Email(EmailError::Attachment { ref path, .. }) if *path == missing
    );
}

#[tokio::test]
async fn malformed_sender_is_an_address_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let chart = dir.path().join("chart.png");
    std::fs::write(&chart, b"\x89PNG\r\n\x1a\n").unwrap();
    let notification = alarm(&envelope("not an address", &["ops@example.com"]), vec![chart]);

    let err = SmtpNotifier::new(EmailConfig::default())
        .send(&notification)
        .await
        .unwrap_err();

    assert_matches!(err, DeliveryError::Email(EmailError::Address(_)));
}

// ---------------------------------------------------------------------------
// Test: dispatch through SmtpNotifier
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dispatcher_counts_deliveries_and_failures() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (queue, dispatcher) = dispatch::channel(
        SmtpNotifier::new(EmailConfig::default()),
        4,
        Duration::from_secs(5),
    );

    let silent = envelope("soundwatch@localhost", &[]);
    let addressed = envelope("soundwatch@localhost", &["ops@example.com"]);
    assert!(queue.enqueue(silent.started(now())));
    assert!(queue.enqueue(alarm(&addressed, vec![dir.path().join("absent.png")])));
    drop(queue);

    let stats = dispatcher.run().await;
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.failed, 1);
}
