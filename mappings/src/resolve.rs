//! Runtime response-code selection from a saved mapping.
//!
//! The editor stores rules as a step property; at runtime the API provider
//! reads that property back and picks the HTTP status for each exchange:
//! the configured code on success, the first rule listing the failure's
//! error category on failure, and the fallback status otherwise.

#[cfg(test)]
#[path = "resolve_test.rs"]
mod resolve_test;

use std::collections::BTreeMap;

use crate::config::MapperConfig;
use crate::error::MapperError;
use crate::model::{Configuration, Rule};

/// How an exchange finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome<'a> {
    Success,
    /// Failed; `category` is the standardized error name when the failure
    /// carried one.
    Failure { category: Option<&'a str> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseCodePolicy {
    success_code: Option<u16>,
    mappings: Vec<(u16, Vec<String>)>,
    fallback: u16,
}

impl ResponseCodePolicy {
    /// Build a policy from an editor configuration.
    ///
    /// Rules whose status is not a valid HTTP status are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::InvalidStatus`] when the primary code is not a
    /// valid HTTP status.
    pub fn from_configuration(configuration: &Configuration, config: &MapperConfig) -> Result<Self, MapperError> {
        let success_code = u16::try_from(configuration.primary_code)
            .ok()
            .filter(is_http_status)
            .ok_or_else(|| MapperError::InvalidStatus(configuration.primary_code.to_string()))?;
        let mappings = valid_mappings(
            configuration
                .rules
                .iter()
                .map(|rule| (rule.discriminant.as_str(), rule.tag_slice().to_vec())),
        );
        Ok(Self { success_code: Some(success_code), mappings, fallback: config.fallback_error_status })
    }

    /// Build a policy from stored step properties: `httpResponseCode` and the
    /// encoded `errorResponseCodes` map.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::InvalidStatus`] when a non-blank response code is
    /// not a valid HTTP status. A malformed mapping property is logged and
    /// treated as empty.
    pub fn from_properties(
        http_response_code: Option<&str>,
        error_response_codes: Option<&str>,
        config: &MapperConfig,
    ) -> Result<Self, MapperError> {
        let success_code = match http_response_code.map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_status(raw).ok_or_else(|| MapperError::InvalidStatus(raw.to_owned()))?),
        };
        let decoded = error_response_codes.map(decode_mappings).unwrap_or_default();
        let mappings = valid_mappings(decoded.iter().map(|(status, tags)| (status.as_str(), tags.clone())));
        Ok(Self { success_code, mappings, fallback: config.fallback_error_status })
    }

    /// Status to set on the response, or `None` to leave it untouched.
    #[must_use]
    pub fn resolve(&self, outcome: Outcome<'_>) -> Option<u16> {
        match outcome {
            Outcome::Success => self.success_code,
            Outcome::Failure { category } => Some(
                category
                    .and_then(|category| {
                        self.mappings
                            .iter()
                            .find(|(_, tags)| tags.iter().any(|tag| tag == category))
                            .map(|(status, _)| *status)
                    })
                    .unwrap_or(self.fallback),
            ),
        }
    }

    #[must_use]
    pub fn success_code(&self) -> Option<u16> {
        self.success_code
    }

    #[must_use]
    pub fn fallback(&self) -> u16 {
        self.fallback
    }
}

/// Encode rules into the stored property form, `{"404": ["NOT_FOUND"], ...}`.
/// Rules sharing a status are merged.
#[must_use]
pub fn encode_mappings(rules: &[Rule]) -> String {
    let mut merged: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for rule in rules {
        let tags = merged.entry(rule.discriminant.as_str()).or_default();
        for tag in rule.tag_slice() {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
    }
    serde_json::json!(merged).to_string()
}

/// Decode the stored property form. Blank input is empty; malformed input is
/// logged and treated as empty.
#[must_use]
pub fn decode_mappings(property: &str) -> Vec<(String, Vec<String>)> {
    if property.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<BTreeMap<String, Vec<String>>>(property) {
        Ok(map) => map.into_iter().collect(),
        Err(e) => {
            log::warn!("failed to read error code mapping property {property}: {e}");
            Vec::new()
        }
    }
}

fn valid_mappings<'a>(entries: impl Iterator<Item = (&'a str, Vec<String>)>) -> Vec<(u16, Vec<String>)> {
    entries
        .filter_map(|(status, tags)| match parse_status(status) {
            Some(code) => Some((code, tags)),
            None => {
                log::warn!("skipping error mapping with invalid status {status:?}");
                None
            }
        })
        .collect()
}

fn parse_status(raw: &str) -> Option<u16> {
    raw.trim().parse::<u16>().ok().filter(is_http_status)
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_http_status(code: &u16) -> bool {
    (100..=599).contains(code)
}
