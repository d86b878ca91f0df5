//! Whole-pipeline validation over a parsed definition.

use tracing::{debug, warn};

use crate::evaluator::RuleEngine;
use crate::schema::{PipelineDefinition, RuleSet, ValidationVerdict};

/// Locates the producer-output transform(s) of a definition and runs the
/// rule set over them.
///
/// Fetching and parsing the raw definition is the caller's job; this is a
/// pure transform over already-parsed input.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineValidator {
    rule_set: RuleSet,
}

impl PipelineValidator {
    pub fn new(rule_set: RuleSet) -> Self {
        Self { rule_set }
    }

    pub fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }

    /// Validate a definition.
    ///
    /// - A qualifying transform with a blank identifying field returns
    ///   immediately with the blank-identifier code.
    /// - Otherwise each qualifying transform is evaluated in document order
    ///   and the last evaluation is the verdict.
    /// - No qualifying transform at all yields the missing-transform code.
    pub fn validate(&self, definition: &PipelineDefinition) -> ValidationVerdict {
        let set = &self.rule_set;
        let mut verdict = None;
        let mut seen = 0usize;

        for transform in definition.transforms_of(set.transform_type) {
            seen += 1;

            let identifier = transform.field(set.identifying_field).unwrap_or("");
            if identifier.trim().is_empty() {
                debug!(
                    transform_type = set.transform_type,
                    field = set.identifying_field,
                    "identifying field is blank"
                );
                return ValidationVerdict::failed(set.blank_identifier);
            }

            verdict = Some(RuleEngine::evaluate(transform, set.rules));
        }

        if seen > 1 {
            warn!(
                transform_type = set.transform_type,
                count = seen,
                "multiple qualifying transforms; the last one determines the verdict"
            );
        }

        verdict.unwrap_or_else(|| ValidationVerdict::failed(set.missing))
    }
}
