//! Pipeline validation rule engine.
//!
//! This crate provides:
//! - A data-driven rule table per producer-output transform type
//! - [`RuleEngine`]: short-circuiting field-level rule evaluation
//! - [`PipelineValidator`]: locates qualifying transforms and drives the engine
//! - `.hpl` pipeline definition parsing into a [`PipelineDefinition`] tree

pub mod error;
pub mod evaluator;
pub mod parser;
pub mod schema;
pub mod validation;

pub use error::RuleError;
pub use evaluator::RuleEngine;
pub use parser::{parse_definition, parse_definition_str};
pub use schema::{PipelineDefinition, Rule, RuleSet, Transform, ValidationCode, ValidationVerdict};
pub use validation::PipelineValidator;
