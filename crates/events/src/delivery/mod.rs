//! External delivery channels for monitor notifications.
//!
//! [`Notifier`] is the capability the monitor depends on; [`email`]
//! provides the SMTP implementation used in production.

use std::future::Future;

use soundwatch_core::Notification;

pub mod email;

use email::EmailError;

/// Error type for a failed delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The SMTP channel rejected or could not assemble the message.
    #[error(transparent)]
    Email(#[from] EmailError),

    /// Delivery did not complete within the configured bound.
    #[error("Delivery timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Any other channel-specific failure.
    #[error("Delivery failed: {0}")]
    Other(String),
}

/// Delivers a [`Notification`] to its recipients.
///
/// A notification without recipients (or with a single blank one) must be
/// treated as a successful no-op by every implementation.
pub trait Notifier: Send + Sync {
    fn send(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}
