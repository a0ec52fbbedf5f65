//! Mapper configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::error::ConfigError;

pub const DEFAULT_FALLBACK_ERROR_STATUS: u16 = 500;
pub const DEFAULT_ACCEPT_ENCODED_RULES: bool = true;

const ACCEPT_ENCODED_RULES_VAR: &str = "MAPPER_ACCEPT_ENCODED_RULES";
const FALLBACK_ERROR_STATUS_VAR: &str = "MAPPER_FALLBACK_ERROR_STATUS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapperConfig {
    /// Accept `errorResponseCodes` delivered as a JSON string instead of an array.
    pub accept_encoded_rules: bool,
    /// Status used for failures that no rule maps.
    pub fallback_error_status: u16,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            accept_encoded_rules: DEFAULT_ACCEPT_ENCODED_RULES,
            fallback_error_status: DEFAULT_FALLBACK_ERROR_STATUS,
        }
    }
}

impl MapperConfig {
    /// Build typed mapper config from environment variables.
    ///
    /// Optional:
    /// - `MAPPER_ACCEPT_ENCODED_RULES`: `true` (default) / `false` / `1` / `0`
    /// - `MAPPER_FALLBACK_ERROR_STATUS`: HTTP status in `100..=599`, default 500
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable is set to an
    /// unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let accept_encoded_rules = parse_flag(
            ACCEPT_ENCODED_RULES_VAR,
            std::env::var(ACCEPT_ENCODED_RULES_VAR).ok().as_deref(),
            DEFAULT_ACCEPT_ENCODED_RULES,
        )?;
        let fallback_error_status = parse_status(
            FALLBACK_ERROR_STATUS_VAR,
            std::env::var(FALLBACK_ERROR_STATUS_VAR).ok().as_deref(),
            DEFAULT_FALLBACK_ERROR_STATUS,
        )?;
        Ok(Self { accept_encoded_rules, fallback_error_status })
    }
}

fn parse_flag(var: &'static str, raw: Option<&str>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid { var, value: raw.to_owned() }),
    }
}

fn parse_status(var: &'static str, raw: Option<&str>, default: u16) -> Result<u16, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    if raw.trim().is_empty() {
        return Ok(default);
    }
    raw.trim()
        .parse::<u16>()
        .ok()
        .filter(|code| (100..=599).contains(code))
        .ok_or_else(|| ConfigError::Invalid { var, value: raw.to_owned() })
}
