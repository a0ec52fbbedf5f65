//! Render snapshot of the response-code mapper.

#[cfg(test)]
#[path = "mapper_test.rs"]
mod mapper_test;

use mappings::{FlowContext, Phase, ResponseCodeMapper, StandardizedError};

/// Everything the mapper view renders, captured after each synchronizer call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapperView {
    pub phase: Phase,
    pub valid: bool,
    /// Text for the primary response code input.
    pub primary_code: String,
    pub rules: Vec<RuleRow>,
    /// Error categories offered for mapping, in name order.
    pub known_errors: Vec<StandardizedError>,
}

/// One editable rule row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleRow {
    pub index: usize,
    pub status: String,
    pub tags: Vec<String>,
}

/// A toggleable error category rendered inside a rule row.
#[derive(Clone, Debug, PartialEq)]
pub struct Chip {
    pub error: StandardizedError,
    pub assigned: bool,
}

impl MapperView {
    #[must_use]
    pub fn capture<C: FlowContext>(mapper: &ResponseCodeMapper<C>) -> Self {
        let rules = mapper
            .current_rules()
            .into_iter()
            .enumerate()
            .map(|(index, rule)| RuleRow {
                index,
                tags: rule.tag_slice().to_vec(),
                status: rule.discriminant,
            })
            .collect();
        Self {
            phase: mapper.phase(),
            valid: mapper.is_valid(),
            primary_code: mapper.primary_code_input(),
            rules,
            known_errors: mapper.known_errors().to_vec(),
        }
    }

    /// True until the first load completes, and while reloading.
    #[must_use]
    pub fn loading(&self) -> bool {
        matches!(self.phase, Phase::Uninitialized | Phase::Loading)
    }
}

impl RuleRow {
    #[must_use]
    pub fn is_assigned(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag == name)
    }

    /// Chips for every offered error, followed by assigned tags no upstream
    /// step offers so they can still be unassigned.
    #[must_use]
    pub fn chips(&self, offered: &[StandardizedError]) -> Vec<Chip> {
        let mut chips: Vec<Chip> = offered
            .iter()
            .map(|error| Chip { assigned: self.is_assigned(&error.name), error: error.clone() })
            .collect();
        for tag in &self.tags {
            if !offered.iter().any(|error| error.name == *tag) && !chips.iter().any(|c| c.error.name == *tag) {
                chips.push(Chip { error: StandardizedError::new(tag.clone()), assigned: true });
            }
        }
        chips
    }
}
