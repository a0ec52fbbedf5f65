//! Read-only view of the flow the mapped step lives in.
//!
//! SYSTEM CONTEXT
//! ==============
//! The editor needs two things from the surrounding flow: the step it is
//! configuring, and the error categories every upstream endpoint can raise.
//! Hosts pass a [`FlowContext`] in at construction instead of the editor
//! reaching for a shared session object.

#[cfg(test)]
#[path = "flow_test.rs"]
mod flow_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{StandardizedError, Step};

/// Source of flow steps for the editor. The editor only reads.
pub trait FlowContext {
    /// Step at `position`, if any.
    fn step_at(&self, position: usize) -> Option<&Step>;

    /// All steps in flow order.
    fn all_steps(&self) -> &[Step];

    /// Steps between the flow's start and `position`, both exclusive. Without
    /// a position, the middle steps (start and end excluded).
    fn upstream_steps(&self, position: Option<usize>) -> &[Step] {
        let steps = self.all_steps();
        let end = position.unwrap_or(steps.len().saturating_sub(1)).min(steps.len());
        steps.get(1..end).unwrap_or_default()
    }
}

impl<T: FlowContext + ?Sized> FlowContext for &T {
    fn step_at(&self, position: usize) -> Option<&Step> {
        (**self).step_at(position)
    }

    fn all_steps(&self) -> &[Step] {
        (**self).all_steps()
    }
}

/// Owned list of flow steps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowSteps(pub Vec<Step>);

impl FlowContext for FlowSteps {
    fn step_at(&self, position: usize) -> Option<&Step> {
        self.0.get(position)
    }

    fn all_steps(&self) -> &[Step] {
        &self.0
    }
}

impl From<Vec<Step>> for FlowSteps {
    fn from(value: Vec<Step>) -> Self {
        Self(value)
    }
}

/// Union of the error categories raised by endpoint steps, keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KnownErrors {
    by_name: BTreeMap<String, StandardizedError>,
}

impl KnownErrors {
    /// Collect errors from every endpoint step whose action descriptor lists
    /// standardized errors. The first occurrence of a name wins.
    pub fn from_steps<'a>(steps: impl IntoIterator<Item = &'a Step>) -> Self {
        let mut by_name = BTreeMap::new();
        for error in steps.into_iter().filter_map(Step::standardized_errors).flatten() {
            by_name.entry(error.name.clone()).or_insert_with(|| error.clone());
        }
        Self { by_name }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StandardizedError> {
        self.by_name.get(name)
    }

    /// Errors in name order.
    pub fn iter(&self) -> impl Iterator<Item = &StandardizedError> {
        self.by_name.values()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<StandardizedError> {
        self.iter().cloned().collect()
    }
}
