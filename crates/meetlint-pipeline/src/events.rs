//! Lint run event system for observability.
//!
//! Emits [`LintEvent`]s via a [`tokio::sync::broadcast`] channel so that
//! external observers can follow a run without coupling to the linter
//! internals.

use serde::{Deserialize, Serialize};

/// Events emitted during a lint run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LintEvent {
    RunStarted {
        issue_number: u64,
        rule_count: usize,
        should_fix: bool,
    },
    RuleStarted {
        rule: String,
    },
    RuleSucceeded {
        rule: String,
        duration_ms: u64,
    },
    RuleFailed {
        rule: String,
        messages: Vec<String>,
    },
    RuleSkipped {
        rule: String,
        failed_dependency: String,
    },
    FieldsCommitted {
        issue_number: u64,
        title: bool,
        labels: bool,
        body: bool,
    },
    RunCompleted {
        issue_number: u64,
        completed_rules: Vec<String>,
        failed: bool,
        duration_ms: u64,
    },
}

/// Event emitter wrapping a broadcast sender.
#[derive(Clone)]
pub struct EventEmitter {
    sender: tokio::sync::broadcast::Sender<LintEvent>,
}

impl EventEmitter {
    /// Create a new emitter with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all current subscribers.
    ///
    /// If there are no active receivers the event is silently dropped.
    pub fn emit(&self, event: LintEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<LintEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emitter_sends_and_receives() {
        let emitter = EventEmitter::new(16);
        let mut rx = emitter.subscribe();

        emitter.emit(LintEvent::RunStarted {
            issue_number: 12,
            rule_count: 3,
            should_fix: true,
        });

        match rx.recv().await.unwrap() {
            LintEvent::RunStarted {
                issue_number,
                rule_count,
                should_fix,
            } => {
                assert_eq!(issue_number, 12);
                assert_eq!(rule_count, 3);
                assert!(should_fix);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let emitter = EventEmitter::new(16);
        let mut rx1 = emitter.subscribe();
        let mut rx2 = emitter.subscribe();

        emitter.emit(LintEvent::RuleSkipped {
            rule: "TitleRule".into(),
            failed_dependency: "EventDateRule".into(),
        });

        let json1 = serde_json::to_string(&rx1.recv().await.unwrap()).unwrap();
        let json2 = serde_json::to_string(&rx2.recv().await.unwrap()).unwrap();
        assert_eq!(json1, json2);
    }

    #[test]
    fn emit_with_no_subscribers_does_not_panic() {
        let emitter = EventEmitter::new(16);
        emitter.emit(LintEvent::RuleFailed {
            rule: "HosterRule".into(),
            messages: vec!["Hoster: Required".into()],
        });
    }
}
