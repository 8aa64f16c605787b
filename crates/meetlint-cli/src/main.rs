//! CLI binary for linting and fixing meetup issues.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use meetlint_pipeline::{
    default_rules, DriveProvisioner, FsDriveProvisioner, IssueLinter, JsonFileIssueStore, RuleConfig,
    ValidIssueOutput,
};
use meetlint_types::{BodyField, Entity, FieldValue, IssueFields, MeetlintError, MeetupIssue};

#[derive(Parser)]
#[command(name = "meetlint", version, about = "Validate and fix meetup issues")]
struct Cli {
    /// Path to the issue JSON file (number, title, labels, body); rewritten on fix
    #[arg(long)]
    issue: PathBuf,

    /// Path to the parsed body fields JSON object
    #[arg(long)]
    fields: PathBuf,

    /// Path to the hosters JSON array of {name, url}
    #[arg(long)]
    hosters: PathBuf,

    /// Path to the speakers JSON array of {name, url}
    #[arg(long)]
    speakers: PathBuf,

    /// Fix what can be fixed and commit it to the issue file
    #[arg(long, env = "MEETLINT_SHOULD_FIX")]
    fix: bool,

    /// Exit with status 1 when lint issues remain
    #[arg(long, env = "MEETLINT_FAIL_ON_ERROR")]
    fail_on_error: bool,

    /// Drive root directory; enables the drive link rule
    #[arg(long, requires = "drive_templates")]
    drive_root: Option<PathBuf>,

    /// Directory holding templates.json and the template files
    #[arg(long, requires = "drive_root")]
    drive_templates: Option<PathBuf>,

    /// Write the valid parts of the issue as JSON to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing; stdout is reserved for lint issues
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let failed = cmd_lint(&cli).await?;
    if failed && cli.fail_on_error {
        std::process::exit(1);
    }
    Ok(())
}

/// Lint the issue; returns whether lint issues were reported.
async fn cmd_lint(cli: &Cli) -> anyhow::Result<bool> {
    let config = RuleConfig {
        hosters: load_entities(&cli.hosters, "hosters")?,
        speakers: load_entities(&cli.speakers, "speakers")?,
        drive: match (&cli.drive_root, &cli.drive_templates) {
            (Some(root), Some(templates)) => {
                let drive = FsDriveProvisioner::new(root.clone(), templates.clone());
                Some(Arc::new(drive) as Arc<dyn DriveProvisioner>)
            }
            _ => None,
        },
    };
    let rules = default_rules(&config)?;

    let store = Arc::new(JsonFileIssueStore::new(&cli.issue));
    let stored = store
        .load()
        .await
        .with_context(|| format!("Failed to read issue {}", cli.issue.display()))?;
    let fields = load_fields(&cli.fields)?;
    let issue = MeetupIssue::from_stored(stored, fields);

    tracing::info!(
        issue = issue.number,
        rules = rules.len(),
        fix = cli.fix,
        "Linting meetup issue"
    );

    let linter = IssueLinter::new(rules, store);
    let outcome = linter.run(&issue, cli.fix).await?;

    if let Some(patch) = &outcome.committed {
        tracing::info!(
            path = %cli.issue.display(),
            title = patch.title.is_some(),
            labels = patch.labels.is_some(),
            body = patch.body.is_some(),
            "Issue updated"
        );
    }

    let lint_issues = outcome
        .error
        .as_ref()
        .map(|err| err.issues().to_vec())
        .unwrap_or_default();
    for lint_issue in &lint_issues {
        println!("{}", lint_issue.message);
    }

    if let Some(path) = &cli.output {
        let output = ValidIssueOutput::build(&outcome.issue, &lint_issues);
        let json = serde_json::to_string_pretty(&output)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write output {}", path.display()))?;
    }

    if lint_issues.is_empty() {
        tracing::info!(issue = outcome.issue.number, "Issue is valid");
    }
    Ok(!lint_issues.is_empty())
}

/// Read a non-empty JSON array of `{name, url}` entities.
fn load_entities(path: &Path, kind: &str) -> anyhow::Result<Vec<Entity>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {kind} {}", path.display()))?;
    Ok(parse_entities(&source, kind)?)
}

fn parse_entities(source: &str, kind: &str) -> Result<Vec<Entity>, MeetlintError> {
    let entities: Vec<Entity> = serde_json::from_str(source).map_err(|e| {
        MeetlintError::InvalidInput(format!(
            "{kind} must be an array of objects with string name and url: {e}"
        ))
    })?;
    if entities.is_empty() {
        return Err(MeetlintError::InvalidInput(format!(
            "{kind} must not be empty"
        )));
    }
    Ok(entities)
}

fn load_fields(path: &Path) -> anyhow::Result<IssueFields> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fields {}", path.display()))?;
    Ok(parse_fields(&source)?)
}

/// Parse a JSON object of body fields. Unknown keys are ignored; values must
/// be strings or arrays of strings.
fn parse_fields(source: &str) -> Result<IssueFields, MeetlintError> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(source)
        .map_err(|e| MeetlintError::InvalidInput(format!("fields must be a JSON object: {e}")))?;

    let mut fields = IssueFields::new();
    for (key, value) in object {
        let Some(field) = BodyField::from_key(&key) else {
            tracing::debug!(key = %key, "Ignoring unknown body field");
            continue;
        };
        let value: FieldValue = serde_json::from_value(value).map_err(|_| {
            MeetlintError::InvalidInput(format!(
                "field '{key}' must be a string or an array of strings"
            ))
        })?;
        fields.insert(field, value);
    }
    Ok(fields)
}
