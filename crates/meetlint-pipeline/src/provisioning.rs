//! Shared-drive provisioning for meetup assets.
//!
//! Each meetup issue owns one folder, found by issue number. The folder holds
//! one copy of every template file, found by the id of the template it was
//! copied from.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use meetlint_types::{MeetlintError, Result};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveFolder {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// A file inside a meetup folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub template_kind: Option<String>,
    pub url: Option<String>,
}

/// A file of the template folder. Its kind names the derived output key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFile {
    pub id: String,
    pub name: String,
    pub template_kind: String,
}

// ---------------------------------------------------------------------------
// DriveProvisioner trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait DriveProvisioner: Send + Sync {
    async fn get_folder(&self, issue_number: u64) -> Result<Option<DriveFolder>>;

    async fn create_folder(&self, issue_number: u64, name: &str) -> Result<DriveFolder>;

    async fn rename_folder(&self, folder_id: &str, name: &str) -> Result<DriveFolder>;

    async fn template_files(&self) -> Result<Vec<TemplateFile>>;

    /// The copy of `template` inside the folder, if any.
    async fn find_by_template(
        &self,
        folder_id: &str,
        template: &TemplateFile,
    ) -> Result<Option<DriveFile>>;

    async fn set_template_kind(&self, file: &DriveFile, template: &TemplateFile)
        -> Result<DriveFile>;

    async fn rename_file(&self, file: &DriveFile, name: &str) -> Result<DriveFile>;

    async fn copy_template(
        &self,
        template: &TemplateFile,
        folder_id: &str,
        name: &str,
    ) -> Result<DriveFile>;
}

// ---------------------------------------------------------------------------
// FsDriveProvisioner
// ---------------------------------------------------------------------------

pub const DEFAULT_URL_BASE: &str = "https://drive.google.com/drive/folders";

const MANIFEST_FILE: &str = "drive.json";
const TEMPLATES_FILE: &str = "templates.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    #[serde(default)]
    folders: Vec<FolderEntry>,
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FolderEntry {
    id: String,
    issue_number: u64,
    name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileEntry {
    id: String,
    folder_id: String,
    name: String,
    template_id: String,
    template_kind: Option<String>,
}

/// Drive mirror on the local filesystem.
///
/// `root` holds one directory per folder plus a `drive.json` manifest with the
/// folder and file metadata. `templates` holds the template files and a
/// `templates.json` listing `{id, name, template_kind}` where `id` is the file
/// name inside `templates`.
pub struct FsDriveProvisioner {
    root: PathBuf,
    templates: PathBuf,
    url_base: String,
    manifest_lock: Mutex<()>,
}

impl FsDriveProvisioner {
    pub fn new(root: impl Into<PathBuf>, templates: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            templates: templates.into(),
            url_base: DEFAULT_URL_BASE.to_string(),
            manifest_lock: Mutex::new(()),
        }
    }

    pub fn with_url_base(mut self, url_base: impl Into<String>) -> Self {
        self.url_base = url_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn folder_url(&self, folder_id: &str) -> String {
        format!("{}/{folder_id}", self.url_base)
    }

    fn file_url(&self, entry: &FileEntry) -> String {
        format!("{}/{}/{}", self.url_base, entry.folder_id, entry.id)
    }

    fn to_folder(&self, entry: &FolderEntry) -> DriveFolder {
        DriveFolder {
            id: entry.id.clone(),
            name: entry.name.clone(),
            url: self.folder_url(&entry.id),
        }
    }

    fn to_file(&self, entry: &FileEntry) -> DriveFile {
        DriveFile {
            id: entry.id.clone(),
            name: entry.name.clone(),
            template_kind: entry.template_kind.clone(),
            url: Some(self.file_url(entry)),
        }
    }

    async fn load_manifest(&self) -> Result<Manifest> {
        let path = self.root.join(MANIFEST_FILE);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(Manifest::default());
        }
        let json = tokio::fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&json)?)
    }

    async fn save_manifest(&self, manifest: &Manifest) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let json = serde_json::to_string_pretty(manifest)?;
        tokio::fs::write(self.root.join(MANIFEST_FILE), json).await?;
        Ok(())
    }
}

fn missing(what: &str, id: &str) -> MeetlintError {
    MeetlintError::Provisioning(format!("{what} '{id}' not found"))
}

#[async_trait]
impl DriveProvisioner for FsDriveProvisioner {
    async fn get_folder(&self, issue_number: u64) -> Result<Option<DriveFolder>> {
        let manifest = self.load_manifest().await?;
        Ok(manifest
            .folders
            .iter()
            .find(|f| f.issue_number == issue_number)
            .map(|f| self.to_folder(f)))
    }

    async fn create_folder(&self, issue_number: u64, name: &str) -> Result<DriveFolder> {
        let _guard = self.manifest_lock.lock().await;
        let mut manifest = self.load_manifest().await?;

        if manifest.folders.iter().any(|f| f.issue_number == issue_number) {
            return Err(MeetlintError::Provisioning(format!(
                "folder for issue #{issue_number} already exists"
            )));
        }

        let entry = FolderEntry {
            id: format!("issue-{issue_number}"),
            issue_number,
            name: name.to_string(),
        };
        tokio::fs::create_dir_all(self.root.join(&entry.id)).await?;
        let folder = self.to_folder(&entry);
        manifest.folders.push(entry);
        self.save_manifest(&manifest).await?;

        tracing::info!(folder = %folder.id, name = %folder.name, "Drive folder created");
        Ok(folder)
    }

    async fn rename_folder(&self, folder_id: &str, name: &str) -> Result<DriveFolder> {
        let _guard = self.manifest_lock.lock().await;
        let mut manifest = self.load_manifest().await?;

        let entry = manifest
            .folders
            .iter_mut()
            .find(|f| f.id == folder_id)
            .ok_or_else(|| missing("folder", folder_id))?;
        entry.name = name.to_string();
        let folder = self.to_folder(entry);
        self.save_manifest(&manifest).await?;

        Ok(folder)
    }

    async fn template_files(&self) -> Result<Vec<TemplateFile>> {
        let path = self.templates.join(TEMPLATES_FILE);
        let json = tokio::fs::read_to_string(&path).await.map_err(|e| {
            MeetlintError::Provisioning(format!(
                "failed to read templates from {}: {e}",
                path.display()
            ))
        })?;
        let templates: Vec<TemplateFile> = serde_json::from_str(&json)?;

        if let Some(bad) = templates.iter().find(|t| t.template_kind.trim().is_empty()) {
            return Err(MeetlintError::Provisioning(format!(
                "template kind is missing for file {}",
                bad.id
            )));
        }
        Ok(templates)
    }

    async fn find_by_template(
        &self,
        folder_id: &str,
        template: &TemplateFile,
    ) -> Result<Option<DriveFile>> {
        let manifest = self.load_manifest().await?;
        Ok(manifest
            .files
            .iter()
            .find(|f| f.folder_id == folder_id && f.template_id == template.id)
            .map(|f| self.to_file(f)))
    }

    async fn set_template_kind(
        &self,
        file: &DriveFile,
        template: &TemplateFile,
    ) -> Result<DriveFile> {
        let _guard = self.manifest_lock.lock().await;
        let mut manifest = self.load_manifest().await?;

        let entry = manifest
            .files
            .iter_mut()
            .find(|f| f.id == file.id)
            .ok_or_else(|| missing("file", &file.id))?;
        entry.template_id = template.id.clone();
        entry.template_kind = Some(template.template_kind.clone());
        let updated = self.to_file(entry);
        self.save_manifest(&manifest).await?;

        Ok(updated)
    }

    async fn rename_file(&self, file: &DriveFile, name: &str) -> Result<DriveFile> {
        let _guard = self.manifest_lock.lock().await;
        let mut manifest = self.load_manifest().await?;

        let entry = manifest
            .files
            .iter_mut()
            .find(|f| f.id == file.id)
            .ok_or_else(|| missing("file", &file.id))?;

        let folder = self.root.join(&entry.folder_id);
        let from = folder.join(&entry.name);
        if tokio::fs::try_exists(&from).await? {
            tokio::fs::rename(&from, folder.join(name)).await?;
        }
        entry.name = name.to_string();
        let updated = self.to_file(entry);
        self.save_manifest(&manifest).await?;

        Ok(updated)
    }

    async fn copy_template(
        &self,
        template: &TemplateFile,
        folder_id: &str,
        name: &str,
    ) -> Result<DriveFile> {
        let _guard = self.manifest_lock.lock().await;
        let mut manifest = self.load_manifest().await?;

        if !manifest.folders.iter().any(|f| f.id == folder_id) {
            return Err(missing("folder", folder_id));
        }

        let source = self.templates.join(&template.id);
        let target = self.root.join(folder_id).join(name);
        tokio::fs::copy(&source, &target).await.map_err(|e| {
            MeetlintError::Provisioning(format!(
                "failed to copy template file '{name}': {e}"
            ))
        })?;

        let entry = FileEntry {
            id: format!("file-{}", manifest.files.len() + 1),
            folder_id: folder_id.to_string(),
            name: name.to_string(),
            template_id: template.id.clone(),
            template_kind: Some(template.template_kind.clone()),
        };
        let file = self.to_file(&entry);
        manifest.files.push(entry);
        self.save_manifest(&manifest).await?;

        tracing::debug!(file = %file.id, name = %file.name, "Template copied");
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (tempfile::TempDir, FsDriveProvisioner) {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        tokio::fs::create_dir_all(&templates).await.unwrap();
        tokio::fs::write(templates.join("slides.txt"), "slides")
            .await
            .unwrap();
        tokio::fs::write(
            templates.join(TEMPLATES_FILE),
            serde_json::to_string(&serde_json::json!([
                { "id": "slides.txt", "name": "[EVENT_DATE:YYYY-MM-DD] - Slides", "template_kind": "slides" }
            ]))
            .unwrap(),
        )
        .await
        .unwrap();

        let provisioner = FsDriveProvisioner::new(dir.path().join("drive"), templates);
        (dir, provisioner)
    }

    #[tokio::test]
    async fn folder_lifecycle() {
        let (_dir, drive) = setup().await;

        assert!(drive.get_folder(12).await.unwrap().is_none());

        let created = drive.create_folder(12, "old name").await.unwrap();
        assert_eq!(created.id, "issue-12");
        assert_eq!(created.url, format!("{DEFAULT_URL_BASE}/issue-12"));

        let renamed = drive.rename_folder(&created.id, "new name").await.unwrap();
        assert_eq!(renamed.name, "new name");

        let found = drive.get_folder(12).await.unwrap().unwrap();
        assert_eq!(found, renamed);
    }

    #[tokio::test]
    async fn creating_a_folder_twice_fails() {
        let (_dir, drive) = setup().await;
        drive.create_folder(1, "a").await.unwrap();
        let err = drive.create_folder(1, "a").await.unwrap_err();
        assert!(matches!(err, MeetlintError::Provisioning(_)));
    }

    #[tokio::test]
    async fn template_copy_and_lookup() {
        let (_dir, drive) = setup().await;
        let folder = drive.create_folder(3, "folder").await.unwrap();
        let templates = drive.template_files().await.unwrap();
        assert_eq!(templates.len(), 1);
        let template = &templates[0];

        assert!(drive
            .find_by_template(&folder.id, template)
            .await
            .unwrap()
            .is_none());

        let copied = drive
            .copy_template(template, &folder.id, "2021-12-31 - Slides")
            .await
            .unwrap();
        assert_eq!(copied.template_kind.as_deref(), Some("slides"));
        assert!(drive.root().join("issue-3/2021-12-31 - Slides").exists());

        let found = drive
            .find_by_template(&folder.id, template)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, copied);

        let renamed = drive.rename_file(&found, "renamed").await.unwrap();
        assert_eq!(renamed.name, "renamed");
        assert!(drive.root().join("issue-3/renamed").exists());
    }

    #[tokio::test]
    async fn missing_templates_manifest_is_a_provisioning_error() {
        let dir = tempfile::tempdir().unwrap();
        let drive = FsDriveProvisioner::new(dir.path().join("drive"), dir.path().join("none"));
        let err = drive.template_files().await.unwrap_err();
        assert!(matches!(err, MeetlintError::Provisioning(_)));
    }

    #[test]
    fn url_base_is_normalized() {
        let drive = FsDriveProvisioner::new("/tmp/a", "/tmp/b").with_url_base("https://x.example/");
        assert_eq!(drive.folder_url("f"), "https://x.example/f");
    }
}
