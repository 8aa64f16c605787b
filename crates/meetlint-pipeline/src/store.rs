//! Backing record store for meetup issues.
//!
//! The linter only ever sends sparse patches of top-level attributes; field
//! edits reach the store through the re-rendered body.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use meetlint_types::{MeetlintError, Result, StoredIssue};

// ---------------------------------------------------------------------------
// IssuePatch
// ---------------------------------------------------------------------------

/// Changed top-level attributes of an issue. Unchanged attributes are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl IssuePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.labels.is_none() && self.body.is_none()
    }

    pub fn apply(&self, issue: &mut StoredIssue) {
        if let Some(title) = &self.title {
            issue.title = Some(title.clone());
        }
        if let Some(labels) = &self.labels {
            issue.labels = labels.clone();
        }
        if let Some(body) = &self.body {
            issue.body = body.clone();
        }
    }
}

// ---------------------------------------------------------------------------
// IssueStore trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait IssueStore: Send + Sync {
    async fn fetch_issue(&self, number: u64) -> Result<StoredIssue>;

    async fn update_issue(&self, number: u64, patch: &IssuePatch) -> Result<()>;
}

// ---------------------------------------------------------------------------
// MemoryIssueStore
// ---------------------------------------------------------------------------

/// In-memory store that records every patch it receives.
#[derive(Default)]
pub struct MemoryIssueStore {
    issues: RwLock<Vec<StoredIssue>>,
    patches: RwLock<Vec<(u64, IssuePatch)>>,
}

impl MemoryIssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issue(issue: StoredIssue) -> Self {
        Self {
            issues: RwLock::new(vec![issue]),
            patches: RwLock::new(Vec::new()),
        }
    }

    pub async fn insert(&self, issue: StoredIssue) {
        let mut issues = self.issues.write().await;
        issues.retain(|i| i.number != issue.number);
        issues.push(issue);
    }

    /// Patches received so far, in order.
    pub async fn patches(&self) -> Vec<(u64, IssuePatch)> {
        self.patches.read().await.clone()
    }
}

#[async_trait]
impl IssueStore for MemoryIssueStore {
    async fn fetch_issue(&self, number: u64) -> Result<StoredIssue> {
        self.issues
            .read()
            .await
            .iter()
            .find(|i| i.number == number)
            .cloned()
            .ok_or_else(|| MeetlintError::Store(format!("issue #{number} not found")))
    }

    async fn update_issue(&self, number: u64, patch: &IssuePatch) -> Result<()> {
        {
            let mut issues = self.issues.write().await;
            let issue = issues
                .iter_mut()
                .find(|i| i.number == number)
                .ok_or_else(|| MeetlintError::Store(format!("issue #{number} not found")))?;
            patch.apply(issue);
        }
        self.patches.write().await.push((number, patch.clone()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonFileIssueStore
// ---------------------------------------------------------------------------

/// Store backed by a single JSON issue file, rewritten in place on update.
pub struct JsonFileIssueStore {
    path: PathBuf,
}

impl JsonFileIssueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Issue currently held by the file, whatever its number.
    pub async fn load(&self) -> Result<StoredIssue> {
        let json = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[async_trait]
impl IssueStore for JsonFileIssueStore {
    async fn fetch_issue(&self, number: u64) -> Result<StoredIssue> {
        let issue = self.load().await?;
        if issue.number != number {
            return Err(MeetlintError::Store(format!(
                "{} holds issue #{}, not #{number}",
                self.path.display(),
                issue.number
            )));
        }
        Ok(issue)
    }

    async fn update_issue(&self, number: u64, patch: &IssuePatch) -> Result<()> {
        let mut issue = self.fetch_issue(number).await?;
        patch.apply(&mut issue);
        let json = serde_json::to_string_pretty(&issue)?;
        tokio::fs::write(&self.path, json).await?;
        tracing::debug!(path = %self.path.display(), issue = number, "Issue file updated");
        Ok(())
    }
}
