//! Dependency-ordered rule queue.
//!
//! [`RuleQueue`] hands out rules one at a time, in registration order, as soon
//! as every rule they depend on has reached a terminal state. Rules whose
//! dependency failed are resolved as failed without being handed out.

use std::collections::{HashMap, HashSet};

use meetlint_types::{MeetlintError, Result};

use crate::rule::LintRule;

/// A rule resolved as failed without being invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRule {
    pub rule: String,
    pub failed_dependency: String,
}

pub struct RuleQueue<'a> {
    rules: &'a [Box<dyn LintRule>],
    /// Indices into `rules` not yet handed out nor resolved.
    pending: Vec<usize>,
    in_flight: HashSet<String>,
    completed: HashMap<String, bool>,
    skipped: Vec<SkippedRule>,
}

impl<'a> RuleQueue<'a> {
    /// Build a queue over `rules`.
    ///
    /// Fails when two rules share a name or when a rule depends on a name that
    /// is not registered.
    pub fn new(rules: &'a [Box<dyn LintRule>]) -> Result<Self> {
        let mut names = HashSet::new();
        for rule in rules {
            if !names.insert(rule.name()) {
                return Err(MeetlintError::DuplicateRule {
                    name: rule.name().to_string(),
                });
            }
        }

        for rule in rules {
            if let Some(dependency) = rule
                .dependencies()
                .into_iter()
                .find(|d| !names.contains(d.as_str()))
            {
                return Err(MeetlintError::UnknownDependency {
                    rule: rule.name().to_string(),
                    dependency,
                });
            }
        }

        Ok(Self {
            rules,
            pending: (0..rules.len()).collect(),
            in_flight: HashSet::new(),
            completed: HashMap::new(),
            skipped: Vec::new(),
        })
    }

    /// Next rule ready to run, or `None` when the queue is drained or every
    /// remaining rule waits on a rule still in flight.
    ///
    /// Returns `CircularDependency` when rules remain, none is in flight, and
    /// none can become ready.
    pub fn dequeue(&mut self) -> Result<Option<&'a dyn LintRule>> {
        let rules = self.rules;
        let mut i = 0;

        while i < self.pending.len() {
            let rule = rules[self.pending[i]].as_ref();
            let name = rule.name();

            if self.completed.contains_key(name) {
                self.pending.remove(i);
                continue;
            }

            let dependencies = rule.dependencies();
            if !dependencies.iter().all(|d| self.completed.contains_key(d)) {
                i += 1;
                continue;
            }

            self.pending.remove(i);

            if let Some(failed) = dependencies.iter().find(|d| !self.completed[d.as_str()]) {
                tracing::warn!(rule = %name, dependency = %failed, "Skipping rule: dependency failed");
                self.completed.insert(name.to_string(), false);
                self.skipped.push(SkippedRule {
                    rule: name.to_string(),
                    failed_dependency: failed.clone(),
                });
                // Earlier candidates may depend on the rule just skipped.
                i = 0;
                continue;
            }

            self.in_flight.insert(name.to_string());
            return Ok(Some(rule));
        }

        if self.pending.is_empty() || !self.in_flight.is_empty() {
            return Ok(None);
        }

        let cycle = self.find_cycle();
        Err(MeetlintError::CircularDependency {
            rule: cycle.first().cloned().unwrap_or_default(),
            cycle,
        })
    }

    /// Record the terminal state of a rule.
    pub fn set_completed_rule(&mut self, name: &str, success: bool) {
        self.in_flight.remove(name);
        self.completed.insert(name.to_string(), success);
    }

    /// Completion map: rule name to success.
    pub fn completed_rules(&self) -> &HashMap<String, bool> {
        &self.completed
    }

    /// Rules skipped since the last call, in the order they were skipped.
    pub fn take_skipped(&mut self) -> Vec<SkippedRule> {
        std::mem::take(&mut self.skipped)
    }

    /// Walk unresolved dependencies from the first pending rule until a name
    /// repeats. Every pending rule has an unresolved pending dependency here,
    /// so the walk always closes a loop.
    fn find_cycle(&self) -> Vec<String> {
        let by_name: HashMap<&str, &dyn LintRule> = self
            .pending
            .iter()
            .map(|&i| (self.rules[i].name(), self.rules[i].as_ref()))
            .collect();

        let Some(&start) = self.pending.first() else {
            return Vec::new();
        };

        let mut path: Vec<String> = Vec::new();
        let mut current = self.rules[start].as_ref();

        loop {
            let name = current.name().to_string();
            if let Some(pos) = path.iter().position(|n| *n == name) {
                let mut cycle = path.split_off(pos);
                cycle.push(name);
                return cycle;
            }
            path.push(name);

            let next = current
                .dependencies()
                .into_iter()
                .find_map(|d| by_name.get(d.as_str()).copied());

            match next {
                Some(rule) => current = rule,
                None => return path,
            }
        }
    }
}
