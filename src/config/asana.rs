use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::config::helpers::{EnvLookup, parse_env, parse_optional_env, parse_string_env};
use crate::error::ConfigError;
use crate::settings::Settings;

/// Asana REST API access.
#[derive(Debug, Clone)]
pub struct AsanaConfig {
    /// Optional here; the sync job fails fast when it is missing.
    pub access_token: Option<SecretString>,
    pub base_url: Url,
    pub timeout: Duration,
}

fn validate_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidValue {
        key: "ASANA_BASE_URL".to_string(),
        message: format!("'{raw}': {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            key: "ASANA_BASE_URL".to_string(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

impl AsanaConfig {
    pub(crate) fn resolve(settings: &Settings, env: EnvLookup<'_>) -> Result<Self, ConfigError> {
        let base_raw = parse_string_env(env, "ASANA_BASE_URL", settings.asana.base_url.clone());
        let timeout_secs = parse_env(env, "ASANA_TIMEOUT_SECS", settings.asana.timeout_secs)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ASANA_TIMEOUT_SECS".to_string(),
                message: "timeout must be at least one second".to_string(),
            });
        }

        Ok(Self {
            access_token: parse_optional_env(
                env,
                "ASANA_ACCESS_TOKEN",
                settings.asana.access_token.clone(),
            )
            .map(SecretString::from),
            base_url: validate_base_url(&base_raw)?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
