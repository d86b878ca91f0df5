//! Validation result codes and the verdict type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Machine-readable outcome of validating a pipeline.
///
/// Rendered as the bare variant name (e.g. `"InvalidFilenameExtension"`) so
/// collaborators can explain exactly which rule failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationCode {
    ValidPipeline,
    MissingParquetTransform,
    InvalidFilenameBase,
    InvalidFilenameExtension,
    InvalidFilenameIncludeCopy,
    InvalidFilenameIncludeDate,
    InvalidFilenameIncludeDatetime,
    InvalidFilenameIncludeSplit,
    InvalidFilenameIncludeTime,
}

impl ValidationCode {
    pub const ALL: [ValidationCode; 9] = [
        ValidationCode::ValidPipeline,
        ValidationCode::MissingParquetTransform,
        ValidationCode::InvalidFilenameBase,
        ValidationCode::InvalidFilenameExtension,
        ValidationCode::InvalidFilenameIncludeCopy,
        ValidationCode::InvalidFilenameIncludeDate,
        ValidationCode::InvalidFilenameIncludeDatetime,
        ValidationCode::InvalidFilenameIncludeSplit,
        ValidationCode::InvalidFilenameIncludeTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::ValidPipeline => "ValidPipeline",
            ValidationCode::MissingParquetTransform => "MissingParquetTransform",
            ValidationCode::InvalidFilenameBase => "InvalidFilenameBase",
            ValidationCode::InvalidFilenameExtension => "InvalidFilenameExtension",
            ValidationCode::InvalidFilenameIncludeCopy => "InvalidFilenameIncludeCopy",
            ValidationCode::InvalidFilenameIncludeDate => "InvalidFilenameIncludeDate",
            ValidationCode::InvalidFilenameIncludeDatetime => "InvalidFilenameIncludeDatetime",
            ValidationCode::InvalidFilenameIncludeSplit => "InvalidFilenameIncludeSplit",
            ValidationCode::InvalidFilenameIncludeTime => "InvalidFilenameIncludeTime",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationCode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ValidationCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| format!("unknown validation code: '{}'", s))
    }
}

/// Overall pass/fail verdict with the code explaining it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub valid: bool,
    pub code: ValidationCode,
}

impl ValidationVerdict {
    pub fn passed() -> Self {
        Self {
            valid: true,
            code: ValidationCode::ValidPipeline,
        }
    }

    pub fn failed(code: ValidationCode) -> Self {
        Self { valid: false, code }
    }
}
