use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;

use crate::config::{EmailConfig, MailTransportKind, SmtpSecurity};
use crate::error::MailError;

/// A fully rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub plain_body: String,
    pub html_body: String,
}

/// Delivers reminder emails.
///
/// The `Display` text of a returned error is stored verbatim in the reminder
/// log, so implementations should keep it human-readable.
#[async_trait]
pub trait Mailer: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .trim()
        .parse()
        .map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
            address: address.to_string(),
            message: e.to_string(),
        })
}

/// Build the lettre message for `email`. Split out so address handling is
/// testable without a relay.
pub fn build_message(email: &OutboundEmail) -> Result<Message, MailError> {
    if email.to.is_empty() {
        return Err(MailError::Build("no recipients".to_string()));
    }
    let mut builder = Message::builder()
        .from(parse_mailbox(&email.from)?)
        .subject(email.subject.as_str());
    for recipient in &email.to {
        builder = builder.to(parse_mailbox(recipient)?);
    }
    builder
        .multipart(MultiPart::alternative_plain_html(
            email.plain_body.clone(),
            email.html_body.clone(),
        ))
        .map_err(|e| MailError::Build(e.to_string()))
}

/// SMTP delivery through a pooled lettre transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl SmtpMailer {
    pub fn from_config(config: &EmailConfig) -> Result<Self, MailError> {
        let host = config
            .smtp_host
            .clone()
            .ok_or_else(|| MailError::Transport("SMTP_HOST is not configured".to_string()))?;

        let mut builder = match config.smtp_security {
            SmtpSecurity::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
                .map_err(|e| {
                    MailError::Transport(format!("invalid SMTP relay host {host}: {e}"))
                })?,
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&host).map_err(
                |e| MailError::Transport(format!("invalid SMTP relay host {host}: {e}")),
            )?,
            SmtpSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&host),
        }
        .port(config.smtp_port);

        if let Some(username) = config.smtp_username.as_deref() {
            let password = config
                .smtp_password
                .as_ref()
                .map(|secret| secret.expose_secret().to_string())
                .unwrap_or_default();
            builder = builder.credentials(Credentials::new(username.to_string(), password));
        }

        Ok(Self {
            transport: builder.build(),
            host,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        let message = build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        tracing::debug!(host = %self.host, to = ?email.to, "email delivered");
        Ok(())
    }
}

/// Development transport: logs the message and reports success.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        build_message(email)?;
        tracing::info!(
            from = %email.from,
            to = ?email.to,
            subject = %email.subject,
            "email (placeholder): {}",
            email.plain_body
        );
        Ok(())
    }
}

/// Pick the transport named by the config.
pub fn mailer_from_config(config: &EmailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    let mailer: Arc<dyn Mailer> = match config.transport {
        MailTransportKind::Smtp => Arc::new(SmtpMailer::from_config(config)?),
        MailTransportKind::Log => Arc::new(LogMailer),
    };
    tracing::debug!(transport = mailer.name(), "mail transport ready");
    Ok(mailer)
}
