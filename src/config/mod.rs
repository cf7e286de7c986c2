//! Resolved runtime configuration.
//!
//! Precedence, lowest first: compiled defaults, the optional `settings.toml`,
//! then environment variables (a `.env` file is loaded by the binary before
//! resolution).

mod asana;
mod email;
pub(crate) mod helpers;

use std::path::{Path, PathBuf};

pub use self::asana::AsanaConfig;
pub use self::email::{EmailConfig, MailTransportKind, SmtpSecurity};
pub use self::helpers::{EnvLookup, process_env};

use crate::config::helpers::optional_env;
use crate::error::ConfigError;
use crate::settings::{APP_DIR, Settings};

const DEFAULT_DB_FILE: &str = "deadlines.db";

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl DatabaseConfig {
    pub(crate) fn resolve(settings: &Settings, env: EnvLookup<'_>) -> Result<Self, ConfigError> {
        let path = match optional_env(env, "DATABASE_PATH") {
            Some(raw) => PathBuf::from(raw),
            None => match settings.database.path.clone() {
                Some(path) => path,
                None => default_database_path()?,
            },
        };
        if path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_PATH".to_string(),
                message: "database path must not be empty".to_string(),
            });
        }
        Ok(Self { path })
    }
}

fn default_database_path() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR).join(DEFAULT_DB_FILE))
        .ok_or_else(|| ConfigError::MissingRequired {
            key: "DATABASE_PATH".to_string(),
            hint: "no platform data directory; set DATABASE_PATH".to_string(),
        })
}

/// Settings plus the database location. The email and Asana sections are
/// resolved on demand so each job validates only what it uses.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub database: DatabaseConfig,
}

impl Config {
    /// Load the settings file (explicit or default location) and resolve it
    /// against the process environment.
    pub fn load(settings_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(settings_path, &process_env)
    }

    pub fn load_with(settings_path: Option<&Path>, env: EnvLookup<'_>) -> Result<Self, ConfigError> {
        let settings = Settings::load(settings_path)?;
        Self::resolve_with(settings, env)
    }

    pub fn resolve_with(settings: Settings, env: EnvLookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            database: DatabaseConfig::resolve(&settings, env)?,
            settings,
        })
    }

    pub fn email(&self, env: EnvLookup<'_>) -> Result<EmailConfig, ConfigError> {
        EmailConfig::resolve(&self.settings, env)
    }

    pub fn asana(&self, env: EnvLookup<'_>) -> Result<AsanaConfig, ConfigError> {
        AsanaConfig::resolve(&self.settings, env)
    }
}
