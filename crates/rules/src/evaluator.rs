//! Field-level rule evaluation.

use crate::schema::{Rule, Transform, ValidationVerdict};

/// Evaluates an ordered rule list against a single transform.
///
/// Pure: no I/O, no shared state, safe to call concurrently.
pub struct RuleEngine;

impl RuleEngine {
    /// Check every rule in declared order, stopping at the first violation.
    ///
    /// A rule is violated when the transform lacks the field or its value
    /// differs from the expected one. An empty rule list always passes.
    pub fn evaluate(node: &Transform, rules: &[Rule]) -> ValidationVerdict {
        rules
            .iter()
            .find(|rule| node.field(&rule.field) != Some(&*rule.expected))
            .map(|rule| ValidationVerdict::failed(rule.failure))
            .unwrap_or_else(ValidationVerdict::passed)
    }
}
