//! Error types for reading input files and normalizing field values.
//!
//! [`LoadError`] covers failures that stop a whole input file from being read.
//! [`ValueError`] covers a single malformed or unmapped value inside one record;
//! the pipeline turns those into a failed record rather than a failed run.

use thiserror::Error;

/// Failures while reading or decoding an input file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Unexpected input shape: {0}")]
    UnexpectedShape(String),
}

impl From<quick_xml::Error> for LoadError {
    fn from(err: quick_xml::Error) -> Self {
        LoadError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for LoadError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        LoadError::Xml(err.to_string())
    }
}

/// A single field value that could not be normalized or mapped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("Malformed ISBN: {0}")]
    MalformedIsbn(String),

    #[error("Malformed ISSN: {0}")]
    MalformedIssn(String),

    #[error("Unrecognised {field}: {value}")]
    UnmappedCode { field: &'static str, value: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid number in {field}: {value}")]
    InvalidNumber { field: String, value: String },
}

impl ValueError {
    pub(crate) fn unmapped(field: &'static str, value: impl Into<String>) -> Self {
        ValueError::UnmappedCode {
            field,
            value: value.into(),
        }
    }

    pub(crate) fn invalid_number(field: impl Into<String>, value: impl Into<String>) -> Self {
        ValueError::InvalidNumber {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ValueError::unmapped("license", "cc-0").to_string(),
            "Unrecognised license: cc-0"
        );
        assert_eq!(
            ValueError::MalformedIssn("123".into()).to_string(),
            "Malformed ISSN: 123"
        );
        let err = LoadError::Xml("bad tag".into());
        assert_eq!(err.to_string(), "XML error: bad tag");
    }
}
