//! Lint rule trait and the ordered rule registry.

use async_trait::async_trait;

use meetlint_types::{MeetupIssue, Result};

// ---------------------------------------------------------------------------
// LintRule trait
// ---------------------------------------------------------------------------

/// A unit of validation-and-fix work over a [`MeetupIssue`].
///
/// A rule returns the (possibly fixed) issue on success. Validation failures
/// are returned as `MeetlintError::Lint` and aggregated by the linter; any
/// other error aborts the run.
#[async_trait]
pub trait LintRule: Send + Sync {
    /// Unique name of the rule, used for dependency declarations.
    ///
    /// Defaults to the unqualified type name.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Names of the rules that must succeed before this one runs.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    async fn lint(&self, issue: MeetupIssue, should_fix: bool) -> Result<MeetupIssue>;
}

// ---------------------------------------------------------------------------
// RuleSet
// ---------------------------------------------------------------------------

/// Rules in registration order. Registration order is the scheduling
/// tie-breaker, so the set is kept as a vector rather than a map.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn LintRule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Duplicate names are reported when a run is scheduled.
    pub fn register(&mut self, rule: impl LintRule + 'static) {
        self.rules.push(Box::new(rule));
    }

    pub fn register_boxed(&mut self, rule: Box<dyn LintRule>) {
        self.rules.push(rule);
    }

    pub fn with(mut self, rule: impl LintRule + 'static) -> Self {
        self.register(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.name().to_string()).collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn LintRule> {
        self.rules
            .iter()
            .find(|r| r.name() == name)
            .map(|r| r.as_ref())
    }

    pub fn as_slice(&self) -> &[Box<dyn LintRule>] {
        &self.rules
    }
}
