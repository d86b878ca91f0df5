//! `.hpl` pipeline document parsing.
//!
//! Every `<transform>` element, at any depth and in document order, becomes
//! a [`Transform`]. Its `<type>` child is the type tag; every other leaf
//! child element becomes a named field holding the element text (empty
//! string for an empty element). Container children such as `<fields>` are
//! not flattened. When a child element repeats, the first occurrence wins.

use crate::error::Result;
use crate::schema::{PipelineDefinition, Transform};

const TRANSFORM_TAG: &str = "transform";
const TYPE_TAG: &str = "type";

/// Parse raw definition bytes.
pub fn parse_definition(bytes: &[u8]) -> Result<PipelineDefinition> {
    let text = std::str::from_utf8(bytes)?;
    parse_definition_str(text)
}

/// Parse a definition that is already text.
pub fn parse_definition_str(text: &str) -> Result<PipelineDefinition> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(text, options)?;

    let transforms = doc
        .descendants()
        .filter(|n| n.has_tag_name(TRANSFORM_TAG))
        .map(read_transform)
        .collect();

    Ok(PipelineDefinition::new(transforms))
}

fn read_transform(node: roxmltree::Node<'_, '_>) -> Transform {
    let mut transform = Transform::default();
    let mut seen_type = false;

    for child in node.children().filter(|c| c.is_element()) {
        let name = child.tag_name().name();
        let value = child.text().unwrap_or("");

        if name == TYPE_TAG {
            if !seen_type {
                transform.kind = value.to_string();
                seen_type = true;
            }
        } else if !child.children().any(|c| c.is_element()) {
            transform
                .fields
                .entry(name.to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    transform
}
