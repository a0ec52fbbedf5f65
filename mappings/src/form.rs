//! Schema-driven form tree with per-control validation.
//!
//! DESIGN
//! ======
//! Forms are built from a tagged [`FieldSpec`] tree by [`build_form`], so the
//! shape of every form is known statically instead of being sniffed from
//! arbitrary data at runtime. Writes go through [`Form::set_value`], which is
//! the only mutation path and therefore the only place change listeners fire.

#[cfg(test)]
#[path = "form_test.rs"]
mod form_test;

use std::fmt;

use crate::error::MapperError;
use crate::notify::{Notifier, Subscription};

/// Value held by a single form control.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FieldValue {
    /// Nothing was ever assigned.
    #[default]
    Unset,
    Text(String),
    Integer(i64),
    List(Vec<String>),
}

impl FieldValue {
    /// Interpret raw text typed into an input: integers become
    /// [`FieldValue::Integer`], everything else stays text.
    #[must_use]
    pub fn from_input(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Text(String::new());
        }
        match trimmed.parse::<i64>() {
            Ok(n) => Self::Integer(n),
            Err(_) => Self::Text(raw.to_owned()),
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Text shown in an input bound to this value.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Unset => String::new(),
            Self::Text(text) => text.clone(),
            Self::Integer(n) => n.to_string(),
            Self::List(items) => items.join(", "),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Unset => serde_json::Value::Null,
            Self::Text(text) => serde_json::Value::String(text.clone()),
            Self::Integer(n) => serde_json::json!(n),
            Self::List(items) => serde_json::json!(items),
        }
    }
}

/// Validation rule attached to a control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Validator {
    /// Rejects unset values, empty text and empty lists.
    Required,
    /// Rejects text that is not an integer. Empty values pass; pair with
    /// [`Validator::Required`] to reject them.
    Integer,
}

impl Validator {
    #[must_use]
    pub fn accepts(self, value: &FieldValue) -> bool {
        match self {
            Self::Required => match value {
                FieldValue::Unset => false,
                FieldValue::Text(text) => !text.is_empty(),
                FieldValue::Integer(_) => true,
                FieldValue::List(items) => !items.is_empty(),
            },
            Self::Integer => match value {
                FieldValue::Unset | FieldValue::Integer(_) => true,
                FieldValue::Text(text) => text.is_empty() || text.trim().parse::<i64>().is_ok(),
                FieldValue::List(_) => false,
            },
        }
    }
}

/// Declarative description of a form tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldSpec {
    Scalar { value: FieldValue, validators: Vec<Validator> },
    Group(Vec<(String, FieldSpec)>),
    List(Vec<FieldSpec>),
}

impl FieldSpec {
    #[must_use]
    pub fn scalar(value: FieldValue) -> Self {
        Self::Scalar { value, validators: Vec::new() }
    }

    #[must_use]
    pub fn validated(value: FieldValue, validators: impl IntoIterator<Item = Validator>) -> Self {
        Self::Scalar { value, validators: validators.into_iter().collect() }
    }

    pub fn group<K: Into<String>>(fields: impl IntoIterator<Item = (K, FieldSpec)>) -> Self {
        Self::Group(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// One step of a path into a form tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for Segment<'a> {
    fn from(value: &'a str) -> Self {
        Self::Key(value)
    }
}

impl From<usize> for Segment<'_> {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

fn path_string(path: &[Segment<'_>]) -> String {
    path.iter().map(ToString::to_string).collect::<Vec<_>>().join(".")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormControl {
    value: FieldValue,
    validators: Vec<Validator>,
}

impl FormControl {
    #[must_use]
    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    #[must_use]
    pub fn valid(&self) -> bool {
        self.validators.iter().all(|v| v.accepts(&self.value))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormNode {
    Control(FormControl),
    Group(Vec<(String, FormNode)>),
    Array(Vec<FormNode>),
}

impl FormNode {
    fn from_spec(spec: FieldSpec) -> Self {
        match spec {
            FieldSpec::Scalar { value, validators } => Self::Control(FormControl { value, validators }),
            FieldSpec::Group(fields) => {
                Self::Group(fields.into_iter().map(|(k, v)| (k, Self::from_spec(v))).collect())
            }
            FieldSpec::List(items) => Self::Array(items.into_iter().map(Self::from_spec).collect()),
        }
    }

    /// True when every control below this node passes its validators.
    #[must_use]
    pub fn valid(&self) -> bool {
        match self {
            Self::Control(control) => control.valid(),
            Self::Group(fields) => fields.iter().all(|(_, node)| node.valid()),
            Self::Array(items) => items.iter().all(Self::valid),
        }
    }

    /// JSON projection of the subtree: groups become objects, arrays become
    /// arrays, unset controls become `null`.
    #[must_use]
    pub fn value(&self) -> serde_json::Value {
        match self {
            Self::Control(control) => control.value.to_json(),
            Self::Group(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, node)| (k.clone(), node.value()))
                    .collect(),
            ),
            Self::Array(items) => serde_json::Value::Array(items.iter().map(Self::value).collect()),
        }
    }

    /// Resolve `path` relative to this node.
    #[must_use]
    pub fn get(&self, path: &[Segment<'_>]) -> Option<&FormNode> {
        path.iter().try_fold(self, |node, segment| node.child(*segment))
    }

    #[must_use]
    pub fn as_control(&self) -> Option<&FormControl> {
        match self {
            Self::Control(control) => Some(control),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[FormNode]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    fn child(&self, segment: Segment<'_>) -> Option<&FormNode> {
        match (self, segment) {
            (Self::Group(fields), Segment::Key(key)) => fields.iter().find(|(k, _)| k == key).map(|(_, node)| node),
            (Self::Array(items), Segment::Index(index)) => items.get(index),
            _ => None,
        }
    }

    fn child_mut(&mut self, segment: Segment<'_>) -> Option<&mut FormNode> {
        match (self, segment) {
            (Self::Group(fields), Segment::Key(key)) => {
                fields.iter_mut().find(|(k, _)| k == key).map(|(_, node)| node)
            }
            (Self::Array(items), Segment::Index(index)) => items.get_mut(index),
            _ => None,
        }
    }
}

/// Notification delivered to form listeners after every write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormChange {
    /// Dotted path of the control that was written.
    pub path: String,
    /// Overall form validity after the write.
    pub valid: bool,
}

/// A built form: the node tree plus its change listeners.
#[derive(Debug)]
pub struct Form {
    root: FormNode,
    changes: Notifier<FormChange>,
}

/// Build a live form from its schema.
#[must_use]
pub fn build_form(spec: FieldSpec) -> Form {
    Form {
        root: FormNode::from_spec(spec),
        changes: Notifier::new(),
    }
}

impl Form {
    #[must_use]
    pub fn root(&self) -> &FormNode {
        &self.root
    }

    #[must_use]
    pub fn valid(&self) -> bool {
        self.root.valid()
    }

    #[must_use]
    pub fn value(&self) -> serde_json::Value {
        self.root.value()
    }

    #[must_use]
    pub fn get(&self, path: &[Segment<'_>]) -> Option<&FormNode> {
        self.root.get(path)
    }

    #[must_use]
    pub fn control(&self, path: &[Segment<'_>]) -> Option<&FormControl> {
        self.get(path).and_then(FormNode::as_control)
    }

    /// Replace the value of the control at `path` and notify listeners.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::PathNotFound`] when the path does not resolve and
    /// [`MapperError::NotAControl`] when it resolves to a group or list.
    pub fn set_value(&mut self, path: &[Segment<'_>], value: FieldValue) -> Result<(), MapperError> {
        let mut node = &mut self.root;
        for segment in path {
            node = node
                .child_mut(*segment)
                .ok_or_else(|| MapperError::PathNotFound(path_string(path)))?;
        }
        let FormNode::Control(control) = node else {
            return Err(MapperError::NotAControl(path_string(path)));
        };
        control.value = value;

        let change = FormChange { path: path_string(path), valid: self.root.valid() };
        self.changes.notify(&change);
        Ok(())
    }

    /// Register a listener fired after every successful [`Form::set_value`].
    pub fn subscribe(&self, listener: impl Fn(&FormChange) + 'static) -> Subscription {
        self.changes.subscribe(listener)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.changes.listener_count()
    }
}
