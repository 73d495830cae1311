use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for labelwire operations.
#[derive(Debug, Error)]
pub enum LabelwireError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid annotation: {field}: {reason}")]
    InvalidAnnotation { field: &'static str, reason: String },

    #[error("malformed record {uuid}: {reason}")]
    MalformedRecord { uuid: String, reason: String },

    #[error("Failed to parse NDJSON line {line}: {source}")]
    NdjsonParse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write NDJSON to {path}: {source}")]
    NdjsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("annotations cannot be empty")]
    EmptyImport,

    #[error("upload failed: {message}")]
    Upload { message: String },

    #[error("import did not reach a terminal state within {waited:?}")]
    ProcessingWaitTimeout { waited: Duration },

    #[error("import failed: {message}")]
    ImportFailed { message: String },

    #[error("artifact URL expired: {url}")]
    ArtifactExpired { url: String },

    #[error("API error: {message}")]
    Api { message: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl LabelwireError {
    /// Builds an `InvalidAnnotation` error naming the offending field.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        LabelwireError::InvalidAnnotation {
            field,
            reason: reason.into(),
        }
    }

    /// Builds a `MalformedRecord` error, citing the record uuid when known.
    pub fn malformed(uuid: Option<&str>, reason: impl Into<String>) -> Self {
        LabelwireError::MalformedRecord {
            uuid: uuid.unwrap_or("<no uuid>").to_string(),
            reason: reason.into(),
        }
    }
}
