//! Built-in meetup issue rules and the default rule set.

pub mod agenda;
pub mod drive_link;
pub mod entity;
pub mod fields;
pub mod hoster;
pub mod labels;
pub mod links;
pub mod title;

use std::sync::Arc;

use meetlint_types::{
    BodyField, Entity, FieldValue, LintError, LintIssue, MeetlintError, MeetupIssue, Result,
};

use crate::body::render_body_field;
use crate::provisioning::DriveProvisioner;
use crate::rule::RuleSet;

pub use agenda::AgendaRule;
pub use drive_link::DriveLinkRule;
pub use entity::EntityCatalog;
pub use fields::{EventDateRule, EventDescriptionRule, EventTitleRule};
pub use hoster::HosterRule;
pub use labels::LabelsRule;
pub use links::{CncfLinkRule, MeetupLinkRule};
pub use title::TitleRule;

/// Inputs of the built-in rules.
#[derive(Clone, Default)]
pub struct RuleConfig {
    pub hosters: Vec<Entity>,
    pub speakers: Vec<Entity>,
    /// Enables [`DriveLinkRule`] when set.
    pub drive: Option<Arc<dyn DriveProvisioner>>,
}

/// The built-in rules in their canonical registration order.
pub fn default_rules(config: &RuleConfig) -> Result<RuleSet> {
    let hosters = EntityCatalog::new("hosters", config.hosters.clone())?;
    let speakers = EntityCatalog::new("speakers", config.speakers.clone())?;

    let mut rules = RuleSet::new()
        .with(EventDateRule)
        .with(EventTitleRule)
        .with(TitleRule)
        .with(HosterRule::new(hosters))
        .with(EventDescriptionRule)
        .with(AgendaRule::new(speakers))
        .with(MeetupLinkRule)
        .with(CncfLinkRule);

    if let Some(drive) = &config.drive {
        rules.register(DriveLinkRule::new(Arc::clone(drive)));
    }

    rules.register(LabelsRule);
    Ok(rules)
}

// ---------------------------------------------------------------------------
// Helpers shared by the rules
// ---------------------------------------------------------------------------

/// `"<label>: <message>"`.
pub(crate) fn field_message(field: BodyField, message: impl AsRef<str>) -> String {
    format!("{}: {}", field.label(), message.as_ref().trim())
}

/// Structured failure on `field`, carrying the field's current value.
pub(crate) fn field_issue(
    issue: &MeetupIssue,
    field: BodyField,
    message: impl AsRef<str>,
) -> LintIssue {
    LintIssue::for_field(
        field,
        issue.field(field).map(FieldValue::to_json),
        field_message(field, message),
    )
}

pub(crate) fn field_error(
    issue: &MeetupIssue,
    field: BodyField,
    message: impl AsRef<str>,
) -> MeetlintError {
    LintError::new([field_issue(issue, field, message)]).into()
}

/// Text value of a required field.
pub(crate) fn required_text(issue: &MeetupIssue, field: BodyField) -> Result<&str> {
    match issue.field(field) {
        None => Err(field_error(issue, field, "Required")),
        Some(FieldValue::List(_)) => {
            Err(field_error(issue, field, "Expected string, received array"))
        }
        Some(FieldValue::Text(text)) => Ok(text),
    }
}

/// Text value of a required field that must not be empty.
pub(crate) fn non_empty_text(issue: &MeetupIssue, field: BodyField) -> Result<&str> {
    let text = required_text(issue, field)?;
    if text.is_empty() {
        return Err(field_error(issue, field, "Must not be empty"));
    }
    Ok(text)
}

/// Set `field` to `value` and re-render its body section. Returns whether the
/// value changed.
pub(crate) fn update_field(
    issue: &mut MeetupIssue,
    field: BodyField,
    value: impl Into<FieldValue>,
) -> Result<bool> {
    let value = value.into();
    if issue.field(field) == Some(&value) {
        return Ok(false);
    }
    issue.set_field(field, value);
    render_body_field(issue, field)?;
    Ok(true)
}
