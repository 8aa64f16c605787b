use async_trait::async_trait;

use meetlint_types::{BodyField, FieldPath, LintError, LintIssue, MeetupIssue, Result};

use crate::rule::LintRule;

const LABEL_MEETUP: &str = "meetup";
const LABEL_HOSTER_NEEDED: &str = "hoster:needed";
const LABEL_HOSTER_CONFIRMED: &str = "hoster:confirmed";
const LABEL_SPEAKERS_NEEDED: &str = "speakers:needed";
const LABEL_SPEAKERS_CONFIRMED: &str = "speakers:confirmed";

const ALLOWED_LABELS: [&str; 5] = [
    LABEL_MEETUP,
    LABEL_HOSTER_NEEDED,
    LABEL_HOSTER_CONFIRMED,
    LABEL_SPEAKERS_NEEDED,
    LABEL_SPEAKERS_CONFIRMED,
];

/// Issue labels reflecting the hoster and speaker status.
pub struct LabelsRule;

impl LabelsRule {
    pub const NAME: &'static str = "LabelsRule";

    pub fn expected_labels(issue: &MeetupIssue) -> Vec<String> {
        let mut expected = vec![LABEL_MEETUP.to_string()];

        let hoster_needed = issue
            .list(BodyField::Hoster)
            .is_some_and(|hosters| hosters.is_empty());
        expected.push(if hoster_needed {
            LABEL_HOSTER_NEEDED.to_string()
        } else {
            LABEL_HOSTER_CONFIRMED.to_string()
        });

        if issue.text(BodyField::Agenda).is_some_and(str::is_empty) {
            expected.push(LABEL_SPEAKERS_NEEDED.to_string());
        }

        expected
    }
}

#[async_trait]
impl LintRule for LabelsRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn lint(&self, mut issue: MeetupIssue, should_fix: bool) -> Result<MeetupIssue> {
        let expected = Self::expected_labels(&issue);

        let missing: Vec<&str> = expected
            .iter()
            .filter(|label| !issue.labels.contains(*label))
            .map(String::as_str)
            .collect();
        let extra: Vec<&str> = issue
            .labels
            .iter()
            .filter(|label| !ALLOWED_LABELS.contains(&label.as_str()))
            .map(String::as_str)
            .collect();

        if missing.is_empty() && extra.is_empty() {
            return Ok(issue);
        }

        if should_fix {
            issue.labels = expected;
            return Ok(issue);
        }

        let value = Some(serde_json::json!(issue.labels));
        let mut problems = Vec::new();
        if !missing.is_empty() {
            problems.push(LintIssue::for_field(
                FieldPath::Labels,
                value.clone(),
                format!("Labels: Missing label(s) \"{}\"", missing.join(", ")),
            ));
        }
        if !extra.is_empty() {
            problems.push(LintIssue::for_field(
                FieldPath::Labels,
                value,
                format!("Labels: Extra label(s) \"{}\"", extra.join(", ")),
            ));
        }
        Err(LintError::new(problems).into())
    }
}
