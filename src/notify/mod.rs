//! Outbound email notifications.
//!
//! The meeting service only sees the [`Notifier`] trait. `SmtpNotifier`
//! delivers through an SMTP relay, `LogNotifier` writes to the log when email
//! is switched off.

pub mod messages;

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use thiserror::Error;
use tracing::info;

use crate::config::EmailConfig;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Invalid email address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("No recipients")]
    NoRecipients,
    #[error("Failed to build email: {0}")]
    Build(String),
    #[error("SMTP transport error: {0}")]
    Transport(String),
}

/// An email ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    recipients: Vec<String>,
}

impl Notification {
    /// Recipients are kept in order with duplicates dropped.
    pub fn new<I, S>(subject: impl Into<String>, body: impl Into<String>, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for recipient in recipients {
            let recipient = recipient.into();
            if !unique.contains(&recipient) {
                unique.push(recipient);
            }
        }

        Self {
            subject: subject.into(),
            body: body.into(),
            recipients: unique,
        }
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

/// Build the notifier described by the email config.
pub fn from_config(config: &EmailConfig) -> Arc<dyn Notifier> {
    if config.enabled {
        Arc::new(SmtpNotifier::new(config.clone()))
    } else {
        Arc::new(LogNotifier)
    }
}

pub struct SmtpNotifier {
    config: EmailConfig,
}

impl SmtpNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, notification: &Notification) -> Result<Message, DeliveryError> {
        if notification.recipients.is_empty() {
            return Err(DeliveryError::NoRecipients);
        }

        let mut builder = Message::builder()
            .from(parse_mailbox(&self.config.from_address)?)
            .subject(notification.subject.as_str())
            .header(ContentType::TEXT_PLAIN);
        for recipient in &notification.recipients {
            builder = builder.to(parse_mailbox(recipient)?);
        }

        builder
            .body(notification.body.clone())
            .map_err(|e| DeliveryError::Build(e.to_string()))
    }

    fn transport(&self) -> Result<SmtpTransport, DeliveryError> {
        let builder = match (&self.config.username, &self.config.password) {
            (Some(user), Some(pass)) => SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| DeliveryError::Transport(e.to_string()))?
                .credentials(Credentials::new(user.clone(), pass.clone())),
            _ => SmtpTransport::builder_dangerous(&self.config.smtp_host),
        };

        Ok(builder.port(self.config.smtp_port).build())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| DeliveryError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let message = self.build_message(notification)?;
        let mailer = self.transport()?;

        tokio::task::spawn_blocking(move || mailer.send(&message))
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        info!(
            "Email \"{}\" sent to {} recipient(s)",
            notification.subject,
            notification.recipients.len()
        );
        Ok(())
    }
}

/// Logs notifications instead of sending them.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        info!(
            "Email delivery disabled, would send \"{}\" to {}",
            notification.subject,
            notification.recipients.join(", ")
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every notification; optionally fails each send after recording.
    #[derive(Clone, Default)]
    pub struct RecordingNotifier {
        sent: Arc<Mutex<Vec<Notification>>>,
        fail: bool,
    }

    impl RecordingNotifier {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(notification.clone());
            if self.fail {
                return Err(DeliveryError::Transport("connection refused".to_string()));
            }
            Ok(())
        }
    }
}
