//! Filtering of offered error categories for the chip picker.

#[cfg(test)]
#[path = "error_filter_test.rs"]
mod error_filter_test;

use mappings::StandardizedError;

/// Errors whose name or label contains `query`, ignoring case, ordered by
/// label. A blank query keeps everything.
#[must_use]
pub fn filter_errors(errors: &[StandardizedError], query: &str) -> Vec<StandardizedError> {
    let needle = query.trim().to_lowercase();
    let mut matched: Vec<StandardizedError> = errors
        .iter()
        .filter(|error| {
            needle.is_empty()
                || error.name.to_lowercase().contains(&needle)
                || error.label().to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();
    matched.sort_by(|a, b| a.label().cmp(b.label()).then_with(|| a.name.cmp(&b.name)));
    matched
}
