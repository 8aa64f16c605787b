//! Shared types and errors for the meetlint issue validation pipeline.
//!
//! This crate provides the foundational types used across the other meetlint crates:
//! - `MeetlintError` - unified error taxonomy
//! - `LintError` / `LintIssue` - structured, aggregatable validation failures
//! - `MeetupIssue` - the record under validation and its derived outputs

use std::fmt;

use serde::{Deserialize, Serialize};

mod issue;

pub use issue::{
    BodyField, Derived, Entity, FieldValue, IssueFields, MeetupIssue, StoredIssue,
};

/// Unified error type for all meetlint subsystems.
#[derive(Debug, thiserror::Error)]
pub enum MeetlintError {
    // === Validation ===
    #[error(transparent)]
    Lint(#[from] LintError),

    // === Scheduling ===
    #[error("Duplicate lint rule '{name}'")]
    DuplicateRule { name: String },

    #[error("Lint rule '{rule}' depends on unknown rule '{dependency}'")]
    UnknownDependency { rule: String, dependency: String },

    #[error("Circular dependency detected at rule '{rule}': {}", cycle.join(" -> "))]
    CircularDependency { rule: String, cycle: Vec<String> },

    #[error("Some lint rules were not processed: {}", names.join(", "))]
    UnprocessedRules { names: Vec<String> },

    // === Rule contract ===
    #[error("{field} is required by lint rule '{rule}'")]
    MissingField { rule: String, field: String },

    #[error("Issue body has no \"### {field}\" section")]
    MissingBodySection { field: String },

    // === Collaborators ===
    #[error("Issue store error: {0}")]
    Store(String),

    #[error("Drive provisioning error: {0}")]
    Provisioning(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl MeetlintError {
    /// Returns `true` if the error aborts a run instead of being aggregated
    /// with other rule failures.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MeetlintError::Lint(_))
    }

    /// The structured validation failure carried by this error, if any.
    pub fn lint_error(&self) -> Option<&LintError> {
        match self {
            MeetlintError::Lint(err) => Some(err),
            _ => None,
        }
    }
}

/// A convenience alias for `Result<T, MeetlintError>`.
pub type Result<T> = std::result::Result<T, MeetlintError>;

// ---------------------------------------------------------------------------
// FieldPath
// ---------------------------------------------------------------------------

/// Location of an offending value inside a [`MeetupIssue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum FieldPath {
    Title,
    Labels,
    Field(BodyField),
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Title => f.write_str("title"),
            FieldPath::Labels => f.write_str("labels"),
            FieldPath::Field(field) => write!(f, "fields.{}", field.key()),
        }
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl TryFrom<String> for FieldPath {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "title" => Ok(FieldPath::Title),
            "labels" => Ok(FieldPath::Labels),
            other => other
                .strip_prefix("fields.")
                .and_then(BodyField::from_key)
                .map(FieldPath::Field)
                .ok_or_else(|| format!("unknown field path '{other}'")),
        }
    }
}

impl From<BodyField> for FieldPath {
    fn from(field: BodyField) -> Self {
        FieldPath::Field(field)
    }
}

// ---------------------------------------------------------------------------
// LintIssue / LintError
// ---------------------------------------------------------------------------

/// A single validation problem found by a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LintIssue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    pub message: String,
}

impl LintIssue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            value: None,
            message: message.into(),
        }
    }

    pub fn for_field(
        field: impl Into<FieldPath>,
        value: Option<serde_json::Value>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: Some(field.into()),
            value,
            message: message.into(),
        }
    }
}

impl From<&str> for LintIssue {
    fn from(message: &str) -> Self {
        LintIssue::new(message)
    }
}

impl From<String> for LintIssue {
    fn from(message: String) -> Self {
        LintIssue::new(message)
    }
}

/// Structured validation failure: an ordered list of issues.
///
/// Its display message is the issue messages joined with `"; "`.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct LintError {
    issues: Vec<LintIssue>,
    message: String,
}

impl LintError {
    pub fn new<I, T>(issues: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<LintIssue>,
    {
        let issues: Vec<LintIssue> = issues.into_iter().map(Into::into).collect();
        let message = join_messages(&issues);
        Self { issues, message }
    }

    pub fn issues(&self) -> &[LintIssue] {
        &self.issues
    }

    pub fn messages(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.message.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// New error holding this error's issues followed by `other`'s.
    pub fn merge(mut self, other: &LintError) -> Self {
        self.issues.extend(other.issues.iter().cloned());
        self.message = join_messages(&self.issues);
        self
    }
}

fn join_messages(issues: &[LintIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_duplicate_rule() {
        let err = MeetlintError::DuplicateRule {
            name: "HosterRule".into(),
        };
        assert_eq!(err.to_string(), "Duplicate lint rule 'HosterRule'");
    }

    #[test]
    fn error_display_unknown_dependency() {
        let err = MeetlintError::UnknownDependency {
            rule: "TitleRule".into(),
            dependency: "NopeRule".into(),
        };
        assert_eq!(
            err.to_string(),
            "Lint rule 'TitleRule' depends on unknown rule 'NopeRule'"
        );
    }

    #[test]
    fn error_display_circular_dependency_names_cycle() {
        let err = MeetlintError::CircularDependency {
            rule: "A".into(),
            cycle: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(
            err.to_string(),
            "Circular dependency detected at rule 'A': A -> B -> A"
        );
    }

    #[test]
    fn error_display_unprocessed_rules() {
        let err = MeetlintError::UnprocessedRules {
            names: vec!["A".into(), "B".into()],
        };
        assert_eq!(err.to_string(), "Some lint rules were not processed: A, B");
    }

    #[test]
    fn error_display_missing_field() {
        let err = MeetlintError::MissingField {
            rule: "TitleRule".into(),
            field: "Event Date".into(),
        };
        assert_eq!(
            err.to_string(),
            "Event Date is required by lint rule 'TitleRule'"
        );
    }

    #[test]
    fn lint_error_is_not_fatal() {
        let err: MeetlintError = LintError::new(["Hoster: Required"]).into();
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "Hoster: Required");
        assert!(err.lint_error().is_some());
    }

    #[test]
    fn other_errors_are_fatal() {
        assert!(MeetlintError::Store("down".into()).is_fatal());
        assert!(MeetlintError::Other("x".into()).is_fatal());
        assert!(MeetlintError::Other("x".into()).lint_error().is_none());
    }

    #[test]
    fn lint_error_message_joins_issues() {
        let err = LintError::new(["a", "b", "c"]);
        assert_eq!(err.to_string(), "a; b; c");
        assert_eq!(err.messages(), vec!["a", "b", "c"]);
    }

    #[test]
    fn lint_error_merge_preserves_order() {
        let first = LintError::new(["a"]);
        let merged = first
            .clone()
            .merge(&LintError::new(["b", "c"]))
            .merge(&LintError::new(["d"]));
        assert_eq!(merged.messages(), vec!["a", "b", "c", "d"]);
        assert_eq!(merged.to_string(), "a; b; c; d");
        assert_eq!(first.messages(), vec!["a"]);
    }

    #[test]
    fn empty_lint_error() {
        let err = LintError::new(Vec::<LintIssue>::new());
        assert!(err.is_empty());
        assert_eq!(err.to_string(), "");
    }

    #[test]
    fn field_path_display_and_parse() {
        let path = FieldPath::Field(BodyField::EventDate);
        assert_eq!(path.to_string(), "fields.event_date");
        assert_eq!(FieldPath::try_from("fields.event_date".to_string()), Ok(path));
        assert_eq!(FieldPath::try_from("labels".to_string()), Ok(FieldPath::Labels));
        assert!(FieldPath::try_from("fields.nope".to_string()).is_err());
    }

    #[test]
    fn lint_issue_serializes_field_path_as_string() {
        let issue = LintIssue::for_field(
            BodyField::Hoster,
            Some(serde_json::json!(["X"])),
            "Hoster: Required",
        );
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["field"], "fields.hoster");
        assert_eq!(json["value"], serde_json::json!(["X"]));

        let plain = serde_json::to_value(LintIssue::new("msg")).unwrap();
        assert!(plain.get("field").is_none());
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MeetlintError = io_err.into();
        assert!(matches!(err, MeetlintError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: MeetlintError = json_err.into();
        assert!(matches!(err, MeetlintError::Json(_)));
    }
}
