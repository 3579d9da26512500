//! Outbound mail for OTP and password reset messages.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use thiserror::Error;
use tracing::info;

use crate::shared::config::environment::MailConfig;

pub mod templates;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        credentials: Option<(String, String)>,
        from_address: &str,
    ) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.port(port);
        if let Some((username, password)) = credentials {
            builder = builder.credentials(Credentials::new(username, password));
        }

        let from = from_address
            .parse()
            .map_err(|_| MailError::InvalidAddress(from_address.to_string()))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|_| MailError::InvalidAddress(message.to.clone()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&message.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html.clone()),
                    ),
            )?;

        self.transport.send(email).await?;
        info!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}

/// Used when no SMTP host is configured: the message is logged instead.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        info!(to = %message.to, subject = %message.subject, body = %message.text, "Email (not sent, SMTP disabled)");
        Ok(())
    }
}

pub fn from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match &config.smtp {
        Some(smtp) => {
            let credentials = match (&smtp.username, &smtp.password) {
                (Some(u), Some(p)) => Some((u.clone(), p.clone())),
                _ => None,
            };
            let mailer = SmtpMailer::new(&smtp.host, smtp.port, credentials, &config.from_address)?;
            Ok(Arc::new(mailer))
        }
        None => Ok(Arc::new(LogMailer)),
    }
}

/// Sends on a background task; delivery failures are logged and never reach the caller.
pub fn dispatch(mailer: Arc<dyn Mailer>, message: MailMessage) {
    tokio::spawn(async move {
        let to = message.to.clone();
        if let Err(err) = mailer.send(message).await {
            tracing::warn!(to = %to, error = %err, "mail delivery failed");
        }
    });
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::environment::SmtpConfig;

    #[test]
    fn invalid_sender_address_is_rejected() {
        let result = SmtpMailer::new("localhost", 587, None, "not an address");
        assert!(matches!(result, Err(MailError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn missing_smtp_host_falls_back_to_logging() {
        let mailer = from_config(&MailConfig {
            from_address: "Shop <shop@example.com>".to_string(),
            smtp: None,
        })
        .unwrap();
        let msg = templates::otp("a@b.io", "123456");
        assert!(mailer.send(msg).await.is_ok());
    }

    #[tokio::test]
    async fn smtp_config_builds_a_transport() {
        let mailer = from_config(&MailConfig {
            from_address: "Shop <shop@example.com>".to_string(),
            smtp: Some(SmtpConfig {
                host: "smtp.example.com".to_string(),
                port: 2525,
                username: Some("user".to_string()),
                password: Some("pass".to_string()),
            }),
        });
        assert!(mailer.is_ok());
    }
}
