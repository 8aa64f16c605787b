use async_trait::async_trait;

use meetlint_types::{BodyField, FieldValue, MeetupIssue, Result};

use super::entity::{extract_entity_name, has_link, EntityCatalog};
use super::{field_error, update_field};
use crate::rule::LintRule;

/// The single hosting entity of the meetup, linked to its canonical url.
pub struct HosterRule {
    hosters: EntityCatalog,
}

impl HosterRule {
    pub const NAME: &'static str = "HosterRule";

    pub fn new(hosters: EntityCatalog) -> Self {
        Self { hosters }
    }
}

#[async_trait]
impl LintRule for HosterRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn lint(&self, mut issue: MeetupIssue, should_fix: bool) -> Result<MeetupIssue> {
        let field = BodyField::Hoster;

        let entries = match issue.field(field) {
            None => return Err(field_error(&issue, field, "Required")),
            Some(FieldValue::Text(_)) => {
                return Err(field_error(&issue, field, "Expected array, received string"))
            }
            Some(FieldValue::List(entries)) => entries.clone(),
        };

        match entries.len() {
            0 => return Err(field_error(&issue, field, "Must not be empty")),
            1 => {}
            _ => return Err(field_error(&issue, field, "Must have exactly one entry")),
        }

        let current = &entries[0];
        let name = extract_entity_name(current);
        let Some(hoster) = self.hosters.resolve(&name).cloned() else {
            return Err(field_error(
                &issue,
                field,
                format!("\"{name}\" is not an existing hoster"),
            ));
        };

        if should_fix {
            let expected = self.hosters.format_with_link(&name);
            if update_field(&mut issue, field, vec![expected])? {
                tracing::debug!(issue = issue.number, hoster = %name, "Hoster canonicalized");
            }
        } else if !has_link(current) {
            // The body is re-rendered only when fixes are committed.
            issue.set_field(field, vec![self.hosters.format_with_link(&name)]);
        }

        issue.derived.hoster = Some(hoster);
        Ok(issue)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use meetlint_types::{Entity, MeetlintError};

    fn rule() -> HosterRule {
        HosterRule::new(EntityCatalog::new("hosters", hosters()).unwrap())
    }

    fn with_hoster(entries: &[&str]) -> MeetupIssue {
        issue_with(
            BodyField::Hoster,
            entries.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn two_hosters_fail() {
        assert_eq!(
            messages(rule().lint(with_hoster(&["X", "Y"]), false).await),
            vec!["Hoster: Must have exactly one entry"]
        );
    }

    #[tokio::test]
    async fn no_hoster_fails() {
        assert_eq!(
            messages(rule().lint(with_hoster(&[]), false).await),
            vec!["Hoster: Must not be empty"]
        );
    }

    #[tokio::test]
    async fn unknown_hoster_fails() {
        assert_eq!(
            messages(rule().lint(with_hoster(&["Initech"]), true).await),
            vec!["Hoster: \"Initech\" is not an existing hoster"]
        );
    }

    #[tokio::test]
    async fn text_value_fails() {
        let issue = issue_with(BodyField::Hoster, "Acme");
        assert_eq!(
            messages(rule().lint(issue, false).await),
            vec!["Hoster: Expected array, received string"]
        );
    }

    #[tokio::test]
    async fn bare_name_is_linked_even_without_fix() {
        let out = rule().lint(with_hoster(&["Acme"]), false).await.unwrap();

        assert_eq!(
            out.list(BodyField::Hoster),
            Some(&["[Acme](https://acme.example)".to_string()][..])
        );
        assert_eq!(out.body, BODY);
        assert_eq!(
            out.derived.hoster,
            Some(Entity::new("Acme", "https://acme.example"))
        );

        let out = rule().lint(with_hoster(&["Acme"]), true).await.unwrap();
        assert!(out
            .body
            .contains("### Hoster\n\n[Acme](https://acme.example)\n\n### Event Description"));
    }

    #[tokio::test]
    async fn missing_body_section_only_matters_when_fixing() {
        let mut issue = with_hoster(&["Acme"]);
        issue.body = "### Event Title\n\nMeetup\n".to_string();

        let out = rule().lint(issue.clone(), false).await.unwrap();
        assert_eq!(out.body, "### Event Title\n\nMeetup\n");
        assert_eq!(
            out.derived.hoster,
            Some(Entity::new("Acme", "https://acme.example"))
        );

        let err = rule().lint(issue, true).await.unwrap_err();
        assert!(matches!(err, MeetlintError::MissingBodySection { .. }));
    }

    #[tokio::test]
    async fn stale_link_is_kept_without_fix_and_rewritten_with_fix() {
        let issue = with_hoster(&["[Acme](https://old.example)"]);

        let out = rule().lint(issue.clone(), false).await.unwrap();
        assert_eq!(
            out.list(BodyField::Hoster),
            Some(&["[Acme](https://old.example)".to_string()][..])
        );

        let out = rule().lint(issue, true).await.unwrap();
        assert_eq!(
            out.list(BodyField::Hoster),
            Some(&["[Acme](https://acme.example)".to_string()][..])
        );
    }

    #[tokio::test]
    async fn canonicalization_is_idempotent() {
        let once = rule().lint(with_hoster(&["Globex"]), true).await.unwrap();
        let twice = rule().lint(once.clone(), true).await.unwrap();
        assert_eq!(once, twice);
    }
}
