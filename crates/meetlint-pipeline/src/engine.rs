//! Issue linter: runs every rule once in dependency order, aggregates
//! validation failures, and commits fixes to the issue store.

use std::sync::Arc;
use std::time::Instant;

use meetlint_types::{BodyField, LintError, MeetlintError, MeetupIssue, Result};

use crate::body::render_body_field;
use crate::events::{EventEmitter, LintEvent};
use crate::rule::RuleSet;
use crate::scheduler::RuleQueue;
use crate::store::{IssuePatch, IssueStore};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Drives a [`RuleSet`] over one issue per run.
pub struct IssueLinter {
    rules: RuleSet,
    store: Arc<dyn IssueStore>,
    events: Option<EventEmitter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleStatus {
    Succeeded,
    Failed,
    /// Resolved as failed because a dependency failed; never invoked.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleResult {
    pub rule: String,
    pub status: RuleStatus,
}

/// Everything a run produced, including the aggregate validation failure.
#[derive(Debug)]
pub struct LintOutcome {
    /// The working issue after every successful rule.
    pub issue: MeetupIssue,
    pub error: Option<LintError>,
    /// Rules in completion order.
    pub rule_results: Vec<RuleResult>,
    /// Patch sent to the store, when fixing changed anything.
    pub committed: Option<IssuePatch>,
}

impl LintOutcome {
    /// The linted issue, or the aggregate validation failure.
    pub fn into_result(self) -> Result<MeetupIssue> {
        match self.error {
            Some(err) => Err(err.into()),
            None => Ok(self.issue),
        }
    }
}

// ---------------------------------------------------------------------------
// IssueLinter
// ---------------------------------------------------------------------------

impl IssueLinter {
    pub fn new(rules: RuleSet, store: Arc<dyn IssueStore>) -> Self {
        Self {
            rules,
            store,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventEmitter) -> Self {
        self.events = Some(events);
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    fn emit(&self, event: LintEvent) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }

    /// Lint `issue`, returning the fixed issue or the aggregate validation
    /// failure as `MeetlintError::Lint`.
    pub async fn lint(&self, issue: &MeetupIssue, should_fix: bool) -> Result<MeetupIssue> {
        self.run(issue, should_fix).await?.into_result()
    }

    /// Run every rule once over a copy of `issue`.
    ///
    /// Rule validation failures are collected in [`LintOutcome::error`]; any
    /// other rule error aborts the run before anything is committed. In fix
    /// mode the changes made by successful rules are committed even when
    /// other rules failed.
    pub async fn run(&self, issue: &MeetupIssue, should_fix: bool) -> Result<LintOutcome> {
        let started = Instant::now();
        let mut working = issue.clone();
        let mut aggregate: Option<LintError> = None;
        let mut rule_results: Vec<RuleResult> = Vec::new();

        let mut queue = RuleQueue::new(self.rules.as_slice())?;

        self.emit(LintEvent::RunStarted {
            issue_number: issue.number,
            rule_count: self.rules.len(),
            should_fix,
        });

        loop {
            let next = queue.dequeue();
            self.record_skipped(&mut queue, &mut rule_results);
            let Some(rule) = next? else {
                break;
            };
            let name = rule.name().to_string();

            tracing::debug!(rule = %name, issue = issue.number, "Running lint rule");
            self.emit(LintEvent::RuleStarted { rule: name.clone() });
            let rule_started = Instant::now();

            // A failing rule's partial changes are dropped with its copy.
            match rule.lint(working.clone(), should_fix).await {
                Ok(linted) => {
                    working = linted;
                    queue.set_completed_rule(&name, true);
                    tracing::debug!(rule = %name, "Lint rule succeeded");
                    self.emit(LintEvent::RuleSucceeded {
                        rule: name.clone(),
                        duration_ms: rule_started.elapsed().as_millis() as u64,
                    });
                    rule_results.push(RuleResult {
                        rule: name,
                        status: RuleStatus::Succeeded,
                    });
                }
                Err(MeetlintError::Lint(err)) => {
                    queue.set_completed_rule(&name, false);
                    tracing::debug!(rule = %name, error = %err, "Lint rule failed");
                    self.emit(LintEvent::RuleFailed {
                        rule: name.clone(),
                        messages: err.messages().into_iter().map(String::from).collect(),
                    });
                    rule_results.push(RuleResult {
                        rule: name,
                        status: RuleStatus::Failed,
                    });
                    aggregate = Some(match aggregate.take() {
                        Some(agg) => agg.merge(&err),
                        None => err,
                    });
                }
                Err(fatal) => {
                    tracing::error!(rule = %name, error = %fatal, "Lint rule aborted the run");
                    return Err(fatal);
                }
            }
        }

        let completed = queue.completed_rules();
        if completed.len() != self.rules.len() {
            let names = self
                .rules
                .names()
                .into_iter()
                .filter(|n| !completed.contains_key(n))
                .collect();
            return Err(MeetlintError::UnprocessedRules { names });
        }

        let committed = if should_fix {
            self.commit(issue, &mut working).await?
        } else {
            None
        };

        self.emit(LintEvent::RunCompleted {
            issue_number: issue.number,
            completed_rules: rule_results.iter().map(|r| r.rule.clone()).collect(),
            failed: aggregate.is_some(),
            duration_ms: started.elapsed().as_millis() as u64,
        });

        Ok(LintOutcome {
            issue: working,
            error: aggregate,
            rule_results,
            committed,
        })
    }

    fn record_skipped(&self, queue: &mut RuleQueue<'_>, results: &mut Vec<RuleResult>) {
        for skipped in queue.take_skipped() {
            self.emit(LintEvent::RuleSkipped {
                rule: skipped.rule.clone(),
                failed_dependency: skipped.failed_dependency,
            });
            results.push(RuleResult {
                rule: skipped.rule,
                status: RuleStatus::Skipped,
            });
        }
    }

    /// Persist the attributes of `working` that differ from `original`.
    async fn commit(
        &self,
        original: &MeetupIssue,
        working: &mut MeetupIssue,
    ) -> Result<Option<IssuePatch>> {
        for field in changed_fields(original, working) {
            tracing::debug!(
                issue = original.number,
                field = field.key(),
                "Updating issue body field"
            );
            render_body_field(working, field)?;
        }

        let patch = diff_issue(original, working);
        if patch.is_empty() {
            tracing::debug!(issue = original.number, "Nothing to commit");
            return Ok(None);
        }

        self.store.update_issue(original.number, &patch).await?;
        tracing::info!(
            issue = original.number,
            title = patch.title.is_some(),
            labels = patch.labels.is_some(),
            body = patch.body.is_some(),
            "Committed issue fixes"
        );
        self.emit(LintEvent::FieldsCommitted {
            issue_number: original.number,
            title: patch.title.is_some(),
            labels: patch.labels.is_some(),
            body: patch.body.is_some(),
        });
        Ok(Some(patch))
    }
}

// ---------------------------------------------------------------------------
// Diffing
// ---------------------------------------------------------------------------

/// Fields of `working` whose value differs from `original`.
fn changed_fields(original: &MeetupIssue, working: &MeetupIssue) -> Vec<BodyField> {
    working
        .fields
        .iter()
        .filter(|(field, value)| original.field(**field) != Some(*value))
        .map(|(field, _)| *field)
        .collect()
}

/// Sparse patch of the top-level attributes that changed. Labels are compared
/// as sets.
pub fn diff_issue(original: &MeetupIssue, working: &MeetupIssue) -> IssuePatch {
    let mut patch = IssuePatch::default();

    if working.title != original.title {
        patch.title = working.title.clone();
    }

    let mut before = original.labels.clone();
    let mut after = working.labels.clone();
    before.sort();
    after.sort();
    if before != after {
        patch.labels = Some(working.labels.clone());
    }

    if working.body != original.body {
        patch.body = Some(working.body.clone());
    }

    patch
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
