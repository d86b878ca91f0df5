//! Field-level rules and the producer-output rule table.

use std::borrow::Cow;

use super::ValidationCode;

/// A single field-level expectation on a transform.
///
/// The field must be present and equal `expected` exactly; otherwise
/// evaluation stops with `failure`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub field: Cow<'static, str>,
    pub expected: Cow<'static, str>,
    pub failure: ValidationCode,
}

impl Rule {
    pub const fn new(field: &'static str, expected: &'static str, failure: ValidationCode) -> Self {
        Self {
            field: Cow::Borrowed(field),
            expected: Cow::Borrowed(expected),
            failure,
        }
    }
}

static PARQUET_FILE_OUTPUT_RULES: [Rule; 6] = [
    Rule::new("filename_ext", "parquet", ValidationCode::InvalidFilenameExtension),
    Rule::new("filename_include_copy", "N", ValidationCode::InvalidFilenameIncludeCopy),
    Rule::new("filename_include_date", "N", ValidationCode::InvalidFilenameIncludeDate),
    Rule::new("filename_include_datetime", "N", ValidationCode::InvalidFilenameIncludeDatetime),
    Rule::new("filename_include_split", "N", ValidationCode::InvalidFilenameIncludeSplit),
    Rule::new("filename_include_time", "N", ValidationCode::InvalidFilenameIncludeTime),
];

/// Rules attached to one producer-output transform type.
///
/// `identifying_field` is checked before any rule: a blank or missing value
/// yields `blank_identifier`. A definition with no transform of
/// `transform_type` yields `missing`.
#[derive(Debug, Clone, Copy)]
pub struct RuleSet {
    pub transform_type: &'static str,
    pub identifying_field: &'static str,
    pub missing: ValidationCode,
    pub blank_identifier: ValidationCode,
    pub rules: &'static [Rule],
}

impl RuleSet {
    /// Rules for Hop's `ParquetFileOutput` transform. The file name must be
    /// a stable `<base>.parquet` so downstream ingestion can find it.
    pub fn parquet_file_output() -> Self {
        Self {
            transform_type: "ParquetFileOutput",
            identifying_field: "filename_base",
            missing: ValidationCode::MissingParquetTransform,
            blank_identifier: ValidationCode::InvalidFilenameBase,
            rules: &PARQUET_FILE_OUTPUT_RULES,
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::parquet_file_output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parquet_rules_declared_order() {
        let set = RuleSet::parquet_file_output();
        let fields: Vec<&str> = set.rules.iter().map(|r| &*r.field).collect();
        assert_eq!(
            fields,
            [
                "filename_ext",
                "filename_include_copy",
                "filename_include_date",
                "filename_include_datetime",
                "filename_include_split",
                "filename_include_time",
            ]
        );
        assert_eq!(set.rules[0].expected, "parquet");
        assert!(set.rules[1..].iter().all(|r| r.expected == "N"));
    }
}
