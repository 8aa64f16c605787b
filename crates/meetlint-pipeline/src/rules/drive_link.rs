//! Drive folder of the meetup and the files copied into it from templates.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use meetlint_types::{BodyField, MeetlintError, MeetupIssue, Result};

use super::entity::extract_entity_name;
use super::fields::{parse_iso_date, EventDateRule};
use super::hoster::HosterRule;
use super::links::{drive_link, lint_link};
use super::{field_error, update_field};
use crate::provisioning::{DriveFolder, DriveProvisioner};
use crate::rule::LintRule;

const EVENT_DATE_PLACEHOLDER: &str = "[EVENT_DATE:YYYY-MM-DD]";

pub struct DriveLinkRule {
    drive: Arc<dyn DriveProvisioner>,
}

/// Outcome of checking the drive against the issue.
struct DriveCheck {
    files: BTreeMap<String, String>,
    created_folder_url: Option<String>,
}

fn problem(message: impl Into<String>) -> MeetlintError {
    MeetlintError::Provisioning(message.into())
}

/// `<date> - <Month> - <hoster>`.
pub fn folder_name(event_date: &str, hoster: &str) -> Result<String> {
    let date = event_date.trim();
    let hoster = hoster.trim();
    if hoster.is_empty() {
        return Err(problem("Hosting name is required"));
    }
    let parsed = parse_iso_date(date).ok_or_else(|| problem("Event date is required"))?;
    Ok(format!("{date} - {} - {hoster}", parsed.format("%B")))
}

impl DriveLinkRule {
    pub const NAME: &'static str = "DriveLinkRule";

    pub fn new(drive: Arc<dyn DriveProvisioner>) -> Self {
        Self { drive }
    }

    async fn check(&self, issue: &MeetupIssue, should_fix: bool) -> Result<DriveCheck> {
        let event_date = issue
            .text(BodyField::EventDate)
            .ok_or_else(|| problem("Cannot auto-create folder - Event Date is required"))?;

        let hoster = match &issue.derived.hoster {
            Some(entity) => entity.name.clone(),
            None => issue
                .list(BodyField::Hoster)
                .and_then(|entries| entries.first())
                .map(|entry| extract_entity_name(entry))
                .ok_or_else(|| problem("Cannot auto-create folder - Hoster is required"))?,
        };

        let expected_name = folder_name(event_date, &hoster)?;
        let (folder, created_folder_url) = self
            .check_folder(issue.number, &expected_name, should_fix)
            .await?;
        let files = self.check_files(&folder, event_date, should_fix).await?;

        Ok(DriveCheck {
            files,
            created_folder_url,
        })
    }

    async fn check_folder(
        &self,
        issue_number: u64,
        expected_name: &str,
        should_fix: bool,
    ) -> Result<(DriveFolder, Option<String>)> {
        let Some(folder) = self.drive.get_folder(issue_number).await? else {
            if !should_fix {
                return Err(problem(format!(
                    "Folder does not exist on Google Drive for meetup issue #{issue_number}"
                )));
            }
            let folder = self.drive.create_folder(issue_number, expected_name).await?;
            let url = folder.url.clone();
            return Ok((folder, Some(url)));
        };

        if folder.name == expected_name {
            return Ok((folder, None));
        }
        if !should_fix {
            return Err(problem(format!(
                "Folder name mismatch. Expected: \"{expected_name}\", Found: \"{}\"",
                folder.name
            )));
        }
        let folder = self.drive.rename_folder(&folder.id, expected_name).await?;
        Ok((folder, None))
    }

    async fn check_files(
        &self,
        folder: &DriveFolder,
        event_date: &str,
        should_fix: bool,
    ) -> Result<BTreeMap<String, String>> {
        let templates = self.drive.template_files().await?;
        if templates.is_empty() {
            return Err(problem("No template files found for drive folder linting."));
        }

        let mut files = BTreeMap::new();
        for template in &templates {
            let expected_name = template.name.replace(EVENT_DATE_PLACEHOLDER, event_date);

            let file = match self.drive.find_by_template(&folder.id, template).await? {
                Some(mut file) => {
                    if file.template_kind.as_deref() != Some(template.template_kind.as_str()) {
                        if !should_fix {
                            return Err(problem(format!(
                                "Template kind mismatch for template ID {}. Expected: \"{}\", Found: \"{}\"",
                                template.id,
                                template.template_kind,
                                file.template_kind.as_deref().unwrap_or("none")
                            )));
                        }
                        file = self.drive.set_template_kind(&file, template).await?;
                    }

                    if file.name != expected_name {
                        if !should_fix {
                            return Err(problem(format!(
                                "File name mismatch for template ID {}. Expected: \"{expected_name}\", Found: \"{}\"",
                                template.id, file.name
                            )));
                        }
                        file = self.drive.rename_file(&file, &expected_name).await?;
                    }
                    file
                }
                None => {
                    if !should_fix {
                        return Err(problem(format!(
                            "Missing file for template ID {} in folder \"{}\"",
                            template.id, folder.name
                        )));
                    }
                    self.drive
                        .copy_template(template, &folder.id, &expected_name)
                        .await?
                }
            };

            if let Some(url) = file.url {
                files.insert(format!("{}-link", template.template_kind), url);
            }
        }

        Ok(files)
    }
}

#[async_trait]
impl LintRule for DriveLinkRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn dependencies(&self) -> Vec<String> {
        vec![EventDateRule::NAME.into(), HosterRule::NAME.into()]
    }

    async fn lint(&self, issue: MeetupIssue, should_fix: bool) -> Result<MeetupIssue> {
        let mut issue = lint_link(issue, &drive_link(), should_fix)?;

        let check = match self.check(&issue, should_fix).await {
            Ok(check) => check,
            Err(err) => {
                let message = match err {
                    MeetlintError::Provisioning(message) => message,
                    other => other.to_string(),
                };
                tracing::debug!(issue = issue.number, error = %message, "Drive check failed");
                return Err(field_error(&issue, BodyField::DriveLink, message));
            }
        };

        if let Some(url) = check.created_folder_url {
            update_field(&mut issue, BodyField::DriveLink, url)?;
        }
        issue.derived.drive_files = Some(check.files);
        Ok(issue)
    }
}
