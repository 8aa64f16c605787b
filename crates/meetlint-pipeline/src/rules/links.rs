//! Community link fields: absolute urls matching a per-field pattern.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use meetlint_types::{BodyField, MeetupIssue, Result};

use super::{field_error, required_text, update_field};
use crate::rule::LintRule;

lazy_static! {
    static ref URL_RE: Regex =
        Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://[^\s/?#]+\S*$").expect("valid url regex");
    static ref MEETUP_LINK_RE: Regex =
        Regex::new(r"^https://www\.meetup\.com/cloud-native-aix-marseille/events/[0-9]+/?$")
            .expect("valid meetup link regex");
    static ref CNCF_LINK_RE: Regex = Regex::new(
        r"^https://community\.cncf\.io/events/details/cncf-cloud-native-aix-marseille-presents-[0-9a-z-]+/?$"
    )
    .expect("valid cncf link regex");
    static ref DRIVE_LINK_RE: Regex =
        Regex::new(r"^https://drive\.google\.com/drive/folders/[a-zA-Z0-9\-_]+/?$")
            .expect("valid drive link regex");
}

/// Shape a link field must have.
pub(crate) struct LinkPattern {
    pub field: BodyField,
    pub pattern: &'static Regex,
    pub example: &'static str,
}

pub(crate) fn meetup_link() -> LinkPattern {
    LinkPattern {
        field: BodyField::MeetupLink,
        pattern: &MEETUP_LINK_RE,
        example: "Must be a valid Meetup link, e.g. https://www.meetup.com/cloud-native-aix-marseille/events/123456789",
    }
}

pub(crate) fn cncf_link() -> LinkPattern {
    LinkPattern {
        field: BodyField::CncfLink,
        pattern: &CNCF_LINK_RE,
        example: "Must be a valid CNCF link, e.g. https://community.cncf.io/events/details/cncf-cloud-native-aix-marseille-presents-test-meetup-event",
    }
}

pub(crate) fn drive_link() -> LinkPattern {
    LinkPattern {
        field: BodyField::DriveLink,
        pattern: &DRIVE_LINK_RE,
        example: "Must be a valid Drive Link, e.g. https://drive.google.com/drive/folders/1a2b3c4d5e6f7g8h9i0j",
    }
}

/// Validate the link field described by `link`; in fix mode strip a trailing
/// slash. All failures of the value are reported as one issue.
pub(crate) fn lint_link(
    mut issue: MeetupIssue,
    link: &LinkPattern,
    should_fix: bool,
) -> Result<MeetupIssue> {
    let url = required_text(&issue, link.field)?;

    let mut failures = Vec::new();
    if !URL_RE.is_match(url) {
        failures.push("Invalid url");
    }
    if !link.pattern.is_match(url) {
        failures.push(link.example);
    }
    if !failures.is_empty() {
        return Err(field_error(&issue, link.field, failures.join("; ")));
    }

    if should_fix {
        let trimmed = url.strip_suffix('/').unwrap_or(url).to_string();
        update_field(&mut issue, link.field, trimmed)?;
    }
    Ok(issue)
}

pub struct MeetupLinkRule;

impl MeetupLinkRule {
    pub const NAME: &'static str = "MeetupLinkRule";
}

#[async_trait]
impl LintRule for MeetupLinkRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn lint(&self, issue: MeetupIssue, should_fix: bool) -> Result<MeetupIssue> {
        lint_link(issue, &meetup_link(), should_fix)
    }
}

pub struct CncfLinkRule;

impl CncfLinkRule {
    pub const NAME: &'static str = "CncfLinkRule";
}

#[async_trait]
impl LintRule for CncfLinkRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn lint(&self, issue: MeetupIssue, should_fix: bool) -> Result<MeetupIssue> {
        lint_link(issue, &cncf_link(), should_fix)
    }
}
