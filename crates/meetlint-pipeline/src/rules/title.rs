use async_trait::async_trait;

use meetlint_types::{
    BodyField, FieldPath, LintError, LintIssue, MeetlintError, MeetupIssue, Result,
};

use super::fields::{EventDateRule, EventTitleRule};
use crate::rule::LintRule;

const TITLE_TEMPLATE: &str = "[Meetup] - <date> - <title>";

/// Issue title derived from the event date and event title fields.
pub struct TitleRule;

impl TitleRule {
    pub const NAME: &'static str = "TitleRule";

    fn source<'a>(issue: &'a MeetupIssue, field: BodyField) -> Result<&'a str> {
        match issue.text(field) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(MeetlintError::MissingField {
                rule: Self::NAME.to_string(),
                field: field.label().to_string(),
            }),
        }
    }

    pub fn expected_title(issue: &MeetupIssue) -> Result<String> {
        let date = Self::source(issue, BodyField::EventDate)?;
        let title = Self::source(issue, BodyField::EventTitle)?;
        Ok(TITLE_TEMPLATE
            .replace("<date>", date)
            .replace("<title>", title))
    }
}

#[async_trait]
impl LintRule for TitleRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn dependencies(&self) -> Vec<String> {
        vec![EventTitleRule::NAME.into(), EventDateRule::NAME.into()]
    }

    async fn lint(&self, mut issue: MeetupIssue, should_fix: bool) -> Result<MeetupIssue> {
        let expected = Self::expected_title(&issue)?;

        if issue.title.as_deref() == Some(expected.as_str()) {
            return Ok(issue);
        }

        if should_fix {
            issue.title = Some(expected);
            return Ok(issue);
        }

        Err(LintError::new([LintIssue::for_field(
            FieldPath::Title,
            issue.title.clone().map(serde_json::Value::String),
            format!("Title: Invalid, expected \"{expected}\""),
        )])
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn titled(title: &str) -> MeetupIssue {
        let mut issue = issue_with(BodyField::EventDate, "2021-12-31");
        issue.set_field(BodyField::EventTitle, "Meetup");
        issue.title = Some(title.to_string());
        issue
    }

    #[tokio::test]
    async fn fixes_empty_title() {
        let out = TitleRule.lint(titled(""), true).await.unwrap();
        assert_eq!(out.title.as_deref(), Some("[Meetup] - 2021-12-31 - Meetup"));
    }

    #[tokio::test]
    async fn accepts_expected_title() {
        let issue = titled("[Meetup] - 2021-12-31 - Meetup");
        let out = TitleRule.lint(issue.clone(), false).await.unwrap();
        assert_eq!(out, issue);
    }

    #[tokio::test]
    async fn reports_wrong_title() {
        let result = TitleRule.lint(titled("Something else"), false).await;
        match result {
            Err(MeetlintError::Lint(err)) => {
                assert_eq!(
                    err.messages(),
                    vec!["Title: Invalid, expected \"[Meetup] - 2021-12-31 - Meetup\""]
                );
                assert_eq!(err.issues()[0].field, Some(FieldPath::Title));
                assert_eq!(
                    err.issues()[0].value,
                    Some(serde_json::json!("Something else"))
                );
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_source_field_is_fatal() {
        let mut issue = titled("");
        issue.fields.remove(&BodyField::EventDate);

        let err = TitleRule.lint(issue, true).await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(
            err.to_string(),
            "Event Date is required by lint rule 'TitleRule'"
        );
    }

    #[test]
    fn depends_on_title_and_date() {
        assert_eq!(
            TitleRule.dependencies(),
            vec!["EventTitleRule", "EventDateRule"]
        );
    }
}
