//! Execution trace recording (spec.md §4.6's optional trace, §5).
//!
//! Disabled by default. When [`crate::engine::EngineConfig::trace`] is set,
//! the engine records one entry per firing: the rule's name, a timestamp,
//! a snapshot of the matched facts' payloads at fire time, and the
//! payloads of any facts added during the action.

use crate::value::Payload;
use chrono::{DateTime, Utc};

/// One rule firing, captured for inspection after [`crate::engine::Engine::run`].
#[derive(Debug, Clone)]
pub struct TraceEntry {
    pub(crate) rule_name: String,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) facts: Vec<Payload>,
    pub(crate) facts_added: Vec<Payload>,
}

impl TraceEntry {
    /// The name of the rule that fired.
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    /// When the firing happened.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Deep-cloned snapshots of the matched facts' payloads, taken at fire
    /// time. These do not track later mutation of the underlying facts.
    pub fn facts(&self) -> &[Payload] {
        &self.facts
    }

    /// Payloads of facts added to working memory during the action.
    pub fn facts_added(&self) -> &[Payload] {
        &self.facts_added
    }
}
