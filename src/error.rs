//! Error types for the deadline tracker.

use thiserror::Error;

/// Persistence failures surfaced by the store traits.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("connection error: {0}")]
    Pool(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("migration error: {0}")]
    Migration(String),
}

impl From<libsql::Error> for DatabaseError {
    fn from(err: libsql::Error) -> Self {
        let message = err.to_string();
        if message.contains("constraint failed") {
            Self::Constraint(message)
        } else {
            Self::Query(message)
        }
    }
}

/// Configuration resolution failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {key}: {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("failed to parse settings file {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Outbound email failures. The display text is what lands in the reminder log.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address '{address}': {message}")]
    InvalidAddress { address: String, message: String },

    #[error("failed to build email: {0}")]
    Build(String),

    #[error("failed to render email: {0}")]
    Render(String),

    #[error("email send failed: {0}")]
    Transport(String),
}

/// Failures talking to the Asana REST API.
#[derive(Debug, Error)]
pub enum AsanaError {
    #[error("ASANA_ACCESS_TOKEN is not set. Add it to your .env file.")]
    MissingToken,

    #[error("asana request failed: {0}")]
    Http(String),

    #[error("asana returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode asana response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for AsanaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

/// Run-level failures of the Asana sync job.
///
/// Per-matter API errors never show up here; they are logged and counted.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Precondition(#[from] AsanaError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
