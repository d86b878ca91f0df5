//! Error types for pipeline definition parsing.

/// Errors that can occur while reading a pipeline definition.
///
/// Rule violations are never errors; they are reported as a
/// [`ValidationVerdict`](crate::ValidationVerdict).
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The definition bytes are not valid UTF-8.
    #[error("definition is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// XML parse error.
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Result alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;
