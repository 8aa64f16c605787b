//! Agenda entries: one `- <speaker(s)>: <talk description>` per line.
//!
//! The first `": "` separates speakers from the description, so a description
//! that starts with its own `"label: "` prefix is read as part of the speakers.

use std::collections::HashSet;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use meetlint_types::{BodyField, Entity, LintError, LintIssue, MeetupIssue, Result};

use super::entity::{extract_entity_names, EntityCatalog};
use super::{field_error, field_message, non_empty_text, update_field};
use crate::rule::LintRule;

lazy_static! {
    static ref AGENDA_LINE_RE: Regex = Regex::new(r"^- (.+?): (.+)$").expect("valid agenda regex");
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AgendaEntry {
    speakers: Vec<String>,
    talk_description: String,
}

pub struct AgendaRule {
    speakers: EntityCatalog,
}

impl AgendaRule {
    pub const NAME: &'static str = "AgendaRule";

    pub fn new(speakers: EntityCatalog) -> Self {
        Self { speakers }
    }

    /// Parse one line. Blank lines yield `Ok(None)`; the first problem found on
    /// the line is returned as its issue.
    fn lint_line(&self, line: &str) -> std::result::Result<Option<AgendaEntry>, LintIssue> {
        if line.trim().is_empty() {
            return Ok(None);
        }

        let line_issue = |value: &str, message: String| {
            LintIssue::for_field(
                BodyField::Agenda,
                Some(serde_json::Value::String(value.to_string())),
                field_message(BodyField::Agenda, message),
            )
        };

        let Some(caps) = AGENDA_LINE_RE.captures(line) else {
            return Err(line_issue(
                line,
                format!(
                    "Entry \"{line}\" must follow the format: \"- <speaker(s)>: <talk_description>\""
                ),
            ));
        };

        let speakers = extract_entity_names(&caps[1]);
        for speaker in &speakers {
            if speaker.is_empty() {
                return Err(line_issue(line, "Speaker must not be empty".to_string()));
            }
            if !self.speakers.contains(speaker) {
                return Err(line_issue(
                    speaker,
                    format!("Speaker \"{speaker}\" is not in the list of speakers"),
                ));
            }
        }

        Ok(Some(AgendaEntry {
            speakers,
            talk_description: caps[2].trim().to_string(),
        }))
    }

    fn format_agenda(&self, entries: &[AgendaEntry]) -> String {
        entries
            .iter()
            .map(|entry| {
                let speakers: Vec<String> = entry
                    .speakers
                    .iter()
                    .map(|s| self.speakers.format_with_link(s))
                    .collect();
                format!("- {}: {}", speakers.join(", "), entry.talk_description)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Resolved speakers, de-duplicated in first-seen order.
    fn resolve_speakers(&self, entries: &[AgendaEntry]) -> Vec<Entity> {
        let mut seen = HashSet::new();
        entries
            .iter()
            .flat_map(|entry| entry.speakers.iter())
            .filter(|name| seen.insert(name.as_str()))
            .filter_map(|name| self.speakers.resolve(name).cloned())
            .collect()
    }
}

#[async_trait]
impl LintRule for AgendaRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn lint(&self, mut issue: MeetupIssue, should_fix: bool) -> Result<MeetupIssue> {
        let agenda = non_empty_text(&issue, BodyField::Agenda)?.to_string();

        let mut entries = Vec::new();
        let mut problems = Vec::new();
        for line in agenda.split('\n') {
            match self.lint_line(line) {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(problem) => problems.push(problem),
            }
        }

        if !problems.is_empty() {
            return Err(LintError::new(problems).into());
        }

        if entries.is_empty() {
            return Err(field_error(
                &issue,
                BodyField::Agenda,
                "Must contain at least one entry",
            ));
        }

        issue.derived.speakers = Some(self.resolve_speakers(&entries));

        if should_fix {
            update_field(&mut issue, BodyField::Agenda, self.format_agenda(&entries))?;
        }

        Ok(issue)
    }
}
