//! Notification delivery for the sound monitor.
//!
//! - [`Notifier`] -- the delivery capability the monitor depends on.
//! - [`SmtpNotifier`] -- SMTP implementation backed by `lettre`.
//! - [`dispatch`] -- bounded queue and background dispatcher that decouple
//!   delivery from acquisition.

pub mod delivery;
pub mod dispatch;

pub use delivery::email::{EmailConfig, EmailError, SmtpNotifier};
pub use delivery::{DeliveryError, Notifier};
pub use dispatch::{DispatchQueue, DispatchStats, Dispatcher};
