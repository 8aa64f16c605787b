//! Downstream payload describing the valid parts of a linted issue.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use meetlint_types::{Entity, FieldPath, IssueFields, LintIssue, MeetupIssue};

/// Issue data safe to hand to consumers: every attribute or field named by a
/// lint issue is left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidIssueOutput {
    pub number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(rename = "parsed-body")]
    pub parsed_body: IssueFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hoster: Option<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speakers: Option<Vec<Entity>>,
    #[serde(
        rename = "drive-files",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub drive_files: Option<BTreeMap<String, String>>,
}

impl ValidIssueOutput {
    pub fn build(issue: &MeetupIssue, lint_issues: &[LintIssue]) -> Self {
        let mut output = Self {
            number: issue.number,
            title: issue.title.clone(),
            labels: Some(issue.labels.clone()),
            parsed_body: issue.fields.clone(),
            hoster: issue.derived.hoster.clone(),
            speakers: issue.derived.speakers.clone(),
            drive_files: issue.derived.drive_files.clone(),
        };

        for path in lint_issues.iter().filter_map(|i| i.field) {
            match path {
                FieldPath::Title => output.title = None,
                FieldPath::Labels => output.labels = None,
                FieldPath::Field(field) => {
                    output.parsed_body.remove(&field);
                }
            }
        }

        output
    }
}
