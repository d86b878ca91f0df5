//! Rule and pipeline-definition types.
//!
//! - `ValidationCode`: closed set of machine-readable verdict codes
//! - `Rule` / `RuleSet`: the producer-output rule table
//! - `Transform` / `PipelineDefinition`: the parsed definition tree

mod code;
mod rule;
mod transform;

pub use code::*;
pub use rule::*;
pub use transform::*;
