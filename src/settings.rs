//! On-disk settings file.
//!
//! `settings.toml` is optional. Every field has a default, and environment
//! variables override whatever the file says (see [`crate::config`]).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const APP_DIR: &str = "deadline-tracker";
pub const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub email: EmailSettings,
    pub asana: AsanaSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Falls back to `<data_dir>/deadline-tracker/deadlines.db`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    /// `smtp` or `log`. Unset picks `smtp` when a host is configured.
    pub transport: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    #[serde(skip_serializing)]
    pub smtp_password: Option<String>,
    pub smtp_security: String,
    pub from_address: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            transport: None,
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_security: "starttls".to_string(),
            from_address: "noreply@localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AsanaSettings {
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for AsanaSettings {
    fn default() -> Self {
        Self {
            access_token: None,
            base_url: "https://app.asana.com/api/1.0".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Settings {
    /// `<config_dir>/deadline-tracker/settings.toml`, when a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Load settings from an explicit path (which must exist) or from the
    /// default location (which may be absent).
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = toml::from_str(&raw).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded settings file");
        Ok(settings)
    }
}
