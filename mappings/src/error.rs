//! Error types for the mapping model and synchronizer.
//!
//! ERROR HANDLING
//! ==============
//! Validation failures are not errors: they surface as `ValidityChanged(false)`
//! events. Errors here cover programming mistakes (bad paths, bad indices) and
//! malformed external input that callers may choose to recover from.

/// Error returned by synchronizer, form, and resolution operations.
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    /// An operation that needs form state ran before `load`.
    #[error("form state has not been loaded")]
    NotLoaded,
    /// The primary response code control does not hold an integer.
    #[error("primary response code is not an integer: {0:?}")]
    InvalidPrimaryCode(String),
    /// A status string or number is not a valid HTTP status code.
    #[error("invalid response status: {0:?}")]
    InvalidStatus(String),
    /// A rule index outside the current rule list.
    #[error("rule index {index} out of range for {len} rules")]
    RuleIndexOutOfRange { index: usize, len: usize },
    /// The JSON-encoded rule list could not be decoded.
    #[error("failed to decode encoded rules: {0}")]
    RulesDecode(#[from] serde_json::Error),
    /// Rules arrived JSON-encoded while the compatibility path is disabled.
    #[error("encoded rules are not accepted by configuration")]
    EncodedRulesRejected,
    /// A form path did not resolve to a node.
    #[error("form path not found: {0}")]
    PathNotFound(String),
    /// A form path resolved to a group or list where a control was expected.
    #[error("form path is not a control: {0}")]
    NotAControl(String),
}

/// Error returned by [`crate::MapperConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
