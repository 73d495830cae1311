//! Validation report types for structured error reporting.
//!
//! This module provides rich, structured validation results that can be
//! displayed to users, written to files, or processed programmatically.

use std::fmt;

/// The result of validating a record sequence.
///
/// Contains all issues found during validation, categorized by severity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    /// All issues found during validation.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Adds an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Returns the number of errors in the report.
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Returns the number of warnings in the report.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single validation issue (error or warning).
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationIssue {
    /// The severity of the issue.
    pub severity: Severity,

    /// A stable code for the issue type.
    pub code: IssueCode,

    /// A human-readable description of the issue.
    pub message: String,

    /// Context about where the issue occurred.
    pub context: IssueContext,
}

impl ValidationIssue {
    /// Creates a new validation issue.
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    /// Creates a new error.
    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    /// Creates a new warning.
    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

/// The severity of a validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// A warning that does not block upload but may indicate problems.
    Warning,
    /// An error the remote service would reject.
    Error,
}

/// A stable code identifying the type of validation issue.
///
/// These codes can be used for filtering, ignoring specific issues,
/// or programmatic handling of validation results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueCode {
    // Data-row identification
    /// A record's dataRow carries neither an id nor a global key.
    MissingDataRowRef,
    /// A record's dataRow carries both an id and a global key.
    AmbiguousDataRowRef,
    /// A record's dataRow reference is an empty string.
    EmptyDataRowRef,

    // Feature reference
    /// A record carries neither a name nor a schemaId.
    MissingFeatureRef,

    // Payload shape
    /// A record carries no payload key.
    MissingPayload,
    /// A record carries more than one payload key.
    AmbiguousPayload,

    // Limits and duplicates
    /// A label group reached the configured annotation ceiling.
    TooManyAnnotations,
    /// Two records share a uuid.
    DuplicateUuid,

    // Geometry
    /// A bbox has a negative or non-finite extent.
    InvalidBBoxExtent,
    /// A bbox has zero area.
    ZeroAreaBBox,
    /// A polygon or line has too few vertices.
    BadVertexCount,

    // Masks
    /// A mask does not carry exactly one payload form.
    MaskVariantConflict,
    /// Two instance masks in one label group share a color.
    DuplicateMaskColor,

    // Spans and pages
    /// A character span is empty or inverted.
    InvalidSpan,
    /// A page or frame index is 0; both are 1-indexed.
    InvalidPage,

    // Video
    /// A segments payload is empty or contains an empty segment.
    EmptySegments,

    // Message tools
    /// Ranking orders are not a permutation of 1..=N.
    BadRankingOrder,
    /// A message task is missing its format-specific data.
    BadMessageTask,

    // Classification
    /// A confidence value lies outside [0, 1].
    ConfidenceOutOfRange,
    /// A checklist answer repeats a feature.
    DuplicateChecklistAnswer,
}

/// Context about where a validation issue occurred.
#[derive(Clone, Debug, PartialEq)]
pub enum IssueContext {
    /// Issue with the payload as a whole.
    Payload,
    /// Issue with a specific record, by input index.
    Record { index: usize, uuid: Option<String> },
    /// Issue with a label group.
    Group {
        row: String,
        label_id: Option<String>,
    },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Payload => write!(f, "payload"),
            IssueContext::Record { index, uuid } => match uuid {
                Some(uuid) => write!(f, "record {} (uuid {})", index, uuid),
                None => write!(f, "record {}", index),
            },
            IssueContext::Group { row, label_id } => match label_id {
                Some(label_id) => write!(f, "label {} on row {}", label_id, row),
                None => write!(f, "row {}", row),
            },
        }
    }
}
