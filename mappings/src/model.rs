//! Configuration and flow-step shapes shared with the host page.
//!
//! DESIGN
//! ======
//! Field names mirror the step's configured-property JSON (`httpResponseCode`,
//! `errorResponseCodes`, `status`, `errors`) so serde round-trips against the
//! backend stay lossless. Inbound data is modelled separately from outbound
//! data: [`RawConfiguration`] tolerates the shapes hosts actually send, while
//! [`Configuration`] is what the editor emits once the form is valid.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// A validated response-code mapping as emitted by the editor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Status returned when the flow completes without error.
    #[serde(rename = "httpResponseCode")]
    pub primary_code: i64,
    /// Error-category mappings, in display order.
    #[serde(rename = "errorResponseCodes", default)]
    pub rules: Vec<Rule>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            primary_code: 200,
            rules: vec![
                Rule::new("404", ["NOT_FOUND"]),
                Rule::new("500", ["INTERNAL_SERVER_ERROR"]),
            ],
        }
    }
}

/// One mapping from a response status to the error categories that produce it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Response status, kept as text because it is edited as text.
    #[serde(rename = "status", default, deserialize_with = "deserialize_status")]
    pub discriminant: String,
    /// Assigned error category names. `None` when the host sent no list.
    #[serde(rename = "errors", default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Rule {
    pub fn new<I, S>(discriminant: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            discriminant: discriminant.into(),
            tags: Some(tags.into_iter().map(Into::into).collect()),
        }
    }

    /// Assigned tags, treating an unset list as empty.
    #[must_use]
    pub fn tag_slice(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }
}

/// Configuration as handed over by the host page, before normalization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConfiguration {
    #[serde(
        rename = "httpResponseCode",
        default,
        deserialize_with = "deserialize_optional_code",
        skip_serializing_if = "Option::is_none"
    )]
    pub primary_code: Option<i64>,
    #[serde(rename = "errorResponseCodes", default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<RulesInput>,
}

impl From<Configuration> for RawConfiguration {
    fn from(value: Configuration) -> Self {
        Self {
            primary_code: Some(value.primary_code),
            rules: Some(RulesInput::Structured(value.rules)),
        }
    }
}

/// Rule list as delivered: either structured, or JSON-encoded into a string
/// by an upstream property bag that stringifies nested values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RulesInput {
    Structured(Vec<Rule>),
    Encoded(String),
}

/// A named error category an endpoint action can raise.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StandardizedError {
    pub name: String,
    #[serde(rename = "displayName", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl StandardizedError {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), display_name: None }
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Human label, falling back to the category name.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Kind of a step within an integration flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepKind {
    Endpoint,
    Mapper,
    RuleFilter,
    ExpressionFilter,
    Extension,
    Split,
    Aggregate,
    Log,
    Headers,
    Template,
    Choice,
    #[serde(other)]
    Other,
}

/// A step in the flow being edited. Only the fields the editor reads are modelled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "stepKind", default, skip_serializing_if = "Option::is_none")]
    pub step_kind: Option<StepKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<ActionDescriptor>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    #[serde(rename = "standardizedErrors", default, skip_serializing_if = "Option::is_none")]
    pub standardized_errors: Option<Vec<StandardizedError>>,
}

impl Step {
    /// Error categories this step can raise, if it is an endpoint whose action
    /// descriptor declares them.
    #[must_use]
    pub fn standardized_errors(&self) -> Option<&[StandardizedError]> {
        if self.step_kind != Some(StepKind::Endpoint) {
            return None;
        }
        self.action
            .as_ref()?
            .descriptor
            .as_ref()?
            .standardized_errors
            .as_deref()
    }
}

fn deserialize_status<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(String::new()),
        serde_json::Value::String(text) => Ok(text),
        serde_json::Value::Number(number) => Ok(number.to_string()),
        _ => Err(D::Error::custom("expected status string or number")),
    }
}

fn deserialize_optional_code<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(number) => number
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom("expected integer response code")),
        serde_json::Value::String(text) if text.trim().is_empty() => Ok(None),
        serde_json::Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("response code {text:?} is not an integer"))),
        _ => Err(D::Error::custom("expected response code number or string")),
    }
}
