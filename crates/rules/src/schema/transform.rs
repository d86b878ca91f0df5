//! Parsed pipeline definition tree.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One processing step of a pipeline, identified by its `type` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(rename = "type")]
    pub kind: String,
    /// Field name → text value, in document order. Absent key = missing field.
    pub fields: IndexMap<String, String>,
}

impl Transform {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field insertion (mostly for fixtures).
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Ordered list of transforms parsed from a pipeline document.
///
/// Read-only input to validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub transforms: Vec<Transform>,
}

impl PipelineDefinition {
    pub fn new(transforms: Vec<Transform>) -> Self {
        Self { transforms }
    }

    /// Transforms of the given type, in document order.
    pub fn transforms_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Transform> + 'a {
        self.transforms.iter().filter(move |t| t.kind == kind)
    }
}
