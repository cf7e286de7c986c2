//! Environment override helpers shared by the config sections.
//!
//! Every helper reads through an [`EnvLookup`] so resolution can be tested
//! without touching the process environment.

use std::str::FromStr;

use crate::error::ConfigError;

/// Source of environment values.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Reads the real process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Trimmed value of `key`, with blank treated as unset.
pub(crate) fn optional_env(env: EnvLookup<'_>, key: &str) -> Option<String> {
    env(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn parse_string_env(env: EnvLookup<'_>, key: &str, default: String) -> String {
    optional_env(env, key).unwrap_or(default)
}

pub(crate) fn parse_optional_env(
    env: EnvLookup<'_>,
    key: &str,
    default: Option<String>,
) -> Option<String> {
    optional_env(env, key).or_else(|| default.filter(|value| !value.trim().is_empty()))
}

pub(crate) fn parse_env<T>(env: EnvLookup<'_>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(env, key) {
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}': {e}"),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(key: &str) -> Option<String> {
        match key {
            "BLANK" => Some("   ".to_string()),
            "PORT" => Some(" 2525 ".to_string()),
            "BAD_PORT" => Some("twenty".to_string()),
            _ => None,
        }
    }

    #[test]
    fn blank_values_fall_back_to_default() {
        assert_eq!(optional_env(&lookup, "BLANK"), None);
        assert_eq!(
            parse_string_env(&lookup, "BLANK", "fallback".to_string()),
            "fallback"
        );
    }

    #[test]
    fn numeric_values_are_parsed_and_validated() {
        assert_eq!(parse_env::<u16>(&lookup, "PORT", 587).expect("port"), 2525);
        assert_eq!(parse_env::<u16>(&lookup, "UNSET", 587).expect("default"), 587);

        let err = parse_env::<u16>(&lookup, "BAD_PORT", 587).expect_err("invalid");
        let ConfigError::InvalidValue { key, message } = err else {
            panic!("expected InvalidValue");
        };
        assert_eq!(key, "BAD_PORT");
        assert!(message.contains("twenty"), "unexpected message: {message}");
    }
}
