//! Lint rule scheduling and execution for meetup issues.
//!
//! This crate implements the meetup issue linter: the rule contract, the
//! dependency-ordered rule queue, the orchestrator that runs every rule once
//! and commits fixes, issue body rendering, the issue store and drive
//! provisioning collaborators, and the built-in rule set.

pub mod body;
pub mod engine;
pub mod events;
pub mod output;
pub mod provisioning;
pub mod rule;
pub mod rules;
pub mod scheduler;
pub mod store;

pub use body::render_body_field;
pub use engine::{diff_issue, IssueLinter, LintOutcome, RuleResult, RuleStatus};
pub use events::{EventEmitter, LintEvent};
pub use output::ValidIssueOutput;
pub use provisioning::{
    DriveFile, DriveFolder, DriveProvisioner, FsDriveProvisioner, TemplateFile,
};
pub use rule::{LintRule, RuleSet};
pub use rules::{default_rules, EntityCatalog, RuleConfig};
pub use scheduler::{RuleQueue, SkippedRule};
pub use store::{IssuePatch, IssueStore, JsonFileIssueStore, MemoryIssueStore};
