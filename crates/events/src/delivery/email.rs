//! Email notification delivery via SMTP.
//!
//! [`SmtpNotifier`] wraps the `lettre` async SMTP transport. Messages with
//! attachments are sent as `multipart/mixed`, each file base64-encoded and
//! named after its base name. The target server comes from the
//! notification itself; port, STARTTLS, and credentials from
//! [`EmailConfig`].

use std::path::{Path, PathBuf};

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use soundwatch_core::Notification;

use super::{DeliveryError, Notifier};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// An attachment could not be read from disk.
    #[error("Cannot read attachment {path}: {source}")]
    Attachment {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (plain submission to a local relay).
const DEFAULT_SMTP_PORT: u16 = 25;

/// Transport settings for the SMTP notifier.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server port (defaults to 25).
    pub smtp_port: u16,
    /// Upgrade the connection with STARTTLS.
    pub starttls: bool,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_port: DEFAULT_SMTP_PORT,
            starttls: false,
            smtp_user: None,
            smtp_password: None,
        }
    }
}

impl EmailConfig {
    /// Load credentials from the environment on top of explicit transport
    /// settings.
    ///
    /// | Variable        | Required | Default |
    /// |-----------------|----------|---------|
    /// | `SMTP_USER`     | no       | --      |
    /// | `SMTP_PASSWORD` | no       | --      |
    pub fn with_env_credentials(smtp_port: u16, starttls: bool) -> Self {
        Self {
            smtp_port,
            starttls,
            smtp_user: std::env::var("SMTP_USER").ok().filter(|s| !s.is_empty()),
            smtp_password: std::env::var("SMTP_PASSWORD").ok().filter(|s| !s.is_empty()),
        }
    }
}

// ---------------------------------------------------------------------------
// SmtpNotifier
// ---------------------------------------------------------------------------

/// Sends monitor notifications via SMTP.
pub struct SmtpNotifier {
    config: EmailConfig,
}

impl SmtpNotifier {
    /// Create a new notifier with the given transport configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), EmailError> {
        let mut files = Vec::with_capacity(notification.attachments.len());
        for path in &notification.attachments {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| EmailError::Attachment {
                    path: path.clone(),
                    source,
                })?;
            files.push((attachment_name(path), bytes));
        }

        let email = build_message(notification, files)?;

        let transport_builder = if self.config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&notification.server)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&notification.server)
        };
        let mut transport_builder = transport_builder.port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(
            to = %notification.recipients.join(", "),
            subject = %notification.subject,
            attachments = notification.attachments.len(),
            "Notification email sent"
        );
        Ok(())
    }
}

impl Notifier for SmtpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        if !notification.has_recipients() {
            tracing::info!(
                subject = %notification.subject,
                "No recipient, notification not sent"
            );
            return Ok(());
        }
        self.deliver(notification).await.map_err(DeliveryError::from)
    }
}

/// File name used for an attachment: the base name of its path.
fn attachment_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string())
}

/// Assemble the MIME message. Plain text without attachments,
/// `multipart/mixed` with them.
fn build_message(
    notification: &Notification,
    attachments: Vec<(String, Vec<u8>)>,
) -> Result<Message, EmailError> {
    let mut builder = Message::builder()
        .from(notification.sender.parse::<Mailbox>()?)
        .subject(notification.subject.clone());

    for recipient in notification
        .recipients
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
    {
        builder = builder.to(recipient.parse::<Mailbox>()?);
    }

    if attachments.is_empty() {
        return builder
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|e| EmailError::Build(e.to_string()));
    }

    let octet_stream = ContentType::parse("application/octet-stream")
        .map_err(|e| EmailError::Build(e.to_string()))?;

    let mut multipart = MultiPart::mixed().singlepart(SinglePart::plain(notification.body.clone()));
    for (name, bytes) in attachments {
        multipart = multipart.singlepart(Attachment::new(name).body(bytes, octet_stream.clone()));
    }

    builder
        .multipart(multipart)
        .map_err(|e| EmailError::Build(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
