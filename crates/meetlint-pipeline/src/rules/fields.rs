//! Plain text field rules.

use async_trait::async_trait;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use meetlint_types::{BodyField, MeetupIssue, Result};

use super::{field_error, non_empty_text, required_text};
use crate::rule::LintRule;

lazy_static! {
    static ref ISO_DATE_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex");
}

/// `event_date` must be a `YYYY-MM-DD` calendar date.
pub struct EventDateRule;

impl EventDateRule {
    pub const NAME: &'static str = "EventDateRule";
}

/// Parse an ISO calendar date, rejecting non-canonical forms such as `2021-1-5`.
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    if !ISO_DATE_RE.is_match(text) {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

#[async_trait]
impl LintRule for EventDateRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn lint(&self, issue: MeetupIssue, _should_fix: bool) -> Result<MeetupIssue> {
        let date = required_text(&issue, BodyField::EventDate)?;
        if parse_iso_date(date).is_none() {
            return Err(field_error(&issue, BodyField::EventDate, "Invalid ISO date"));
        }
        Ok(issue)
    }
}

pub struct EventTitleRule;

impl EventTitleRule {
    pub const NAME: &'static str = "EventTitleRule";
}

#[async_trait]
impl LintRule for EventTitleRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn lint(&self, issue: MeetupIssue, _should_fix: bool) -> Result<MeetupIssue> {
        non_empty_text(&issue, BodyField::EventTitle)?;
        Ok(issue)
    }
}

pub struct EventDescriptionRule;

impl EventDescriptionRule {
    pub const NAME: &'static str = "EventDescriptionRule";
}

#[async_trait]
impl LintRule for EventDescriptionRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn lint(&self, issue: MeetupIssue, _should_fix: bool) -> Result<MeetupIssue> {
        non_empty_text(&issue, BodyField::EventDescription)?;
        Ok(issue)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn iso_date_parsing() {
        assert!(parse_iso_date("2021-12-31").is_some());
        assert!(parse_iso_date("2024-02-29").is_some());
        assert!(parse_iso_date("2023-02-29").is_none());
        assert!(parse_iso_date("2021-1-5").is_none());
        assert!(parse_iso_date("31/12/2021").is_none());
    }

    #[tokio::test]
    async fn event_date_valid() {
        let issue = issue_with(BodyField::EventDate, "2021-12-31");
        let out = EventDateRule.lint(issue.clone(), false).await.unwrap();
        assert_eq!(out, issue);
    }

    #[tokio::test]
    async fn event_date_invalid() {
        let issue = issue_with(BodyField::EventDate, "2021-13-01");
        assert_eq!(
            messages(EventDateRule.lint(issue, true).await),
            vec!["Event Date: Invalid ISO date"]
        );
    }

    #[tokio::test]
    async fn event_date_missing() {
        assert_eq!(
            messages(EventDateRule.lint(issue(), false).await),
            vec!["Event Date: Required"]
        );
    }

    #[tokio::test]
    async fn event_title_must_not_be_empty() {
        let issue = issue_with(BodyField::EventTitle, "");
        assert_eq!(
            messages(EventTitleRule.lint(issue, false).await),
            vec!["Event Title: Must not be empty"]
        );
    }

    #[tokio::test]
    async fn event_description_valid() {
        let issue = issue_with(BodyField::EventDescription, "A meetup");
        assert!(EventDescriptionRule.lint(issue, false).await.is_ok());
    }

    #[tokio::test]
    async fn event_description_missing() {
        assert_eq!(
            messages(EventDescriptionRule.lint(issue(), false).await),
            vec!["Event Description: Required"]
        );
    }
}
