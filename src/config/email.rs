use secrecy::SecretString;

use crate::config::helpers::{
    EnvLookup, optional_env, parse_env, parse_optional_env, parse_string_env,
};
use crate::error::ConfigError;
use crate::settings::Settings;

/// Which mail transport the dispatcher uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTransportKind {
    Smtp,
    /// Logs the rendered message instead of sending it.
    Log,
}

impl MailTransportKind {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "smtp" => Ok(Self::Smtp),
            "log" | "console" => Ok(Self::Log),
            other => Err(ConfigError::InvalidValue {
                key: "MAIL_TRANSPORT".to_string(),
                message: format!("unsupported transport '{other}'"),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smtp => "smtp",
            Self::Log => "log",
        }
    }
}

/// Connection security for the SMTP relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    StartTls,
    /// Implicit TLS, usually port 465.
    Tls,
    /// Plaintext, for local relays only.
    None,
}

impl SmtpSecurity {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "starttls" => Ok(Self::StartTls),
            "tls" | "ssl" => Ok(Self::Tls),
            "none" | "plain" => Ok(Self::None),
            other => Err(ConfigError::InvalidValue {
                key: "SMTP_SECURITY".to_string(),
                message: format!("unsupported security mode '{other}'"),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartTls => "starttls",
            Self::Tls => "tls",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub transport: MailTransportKind,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<SecretString>,
    pub smtp_security: SmtpSecurity,
    pub from_address: String,
}

impl EmailConfig {
    pub(crate) fn resolve(settings: &Settings, env: EnvLookup<'_>) -> Result<Self, ConfigError> {
        let smtp_host = parse_optional_env(env, "SMTP_HOST", settings.email.smtp_host.clone());
        let transport = match optional_env(env, "MAIL_TRANSPORT")
            .or_else(|| settings.email.transport.clone())
        {
            Some(raw) => MailTransportKind::from_str(raw.trim())?,
            None if smtp_host.is_some() => MailTransportKind::Smtp,
            None => MailTransportKind::Log,
        };
        if transport == MailTransportKind::Smtp && smtp_host.is_none() {
            return Err(ConfigError::InvalidValue {
                key: "SMTP_HOST".to_string(),
                message: "smtp transport requires a host".to_string(),
            });
        }

        let security_raw =
            parse_string_env(env, "SMTP_SECURITY", settings.email.smtp_security.clone());
        let from_address = parse_string_env(
            env,
            "DEFAULT_FROM_EMAIL",
            settings.email.from_address.clone(),
        );
        if from_address.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "DEFAULT_FROM_EMAIL".to_string(),
                message: "sender address must not be empty".to_string(),
            });
        }

        Ok(Self {
            transport,
            smtp_host,
            smtp_port: parse_env(env, "SMTP_PORT", settings.email.smtp_port)?,
            smtp_username: parse_optional_env(
                env,
                "SMTP_USERNAME",
                settings.email.smtp_username.clone(),
            ),
            smtp_password: parse_optional_env(
                env,
                "SMTP_PASSWORD",
                settings.email.smtp_password.clone(),
            )
            .map(SecretString::from),
            smtp_security: SmtpSecurity::from_str(security_raw.trim())?,
            from_address: from_address.trim().to_string(),
        })
    }
}
