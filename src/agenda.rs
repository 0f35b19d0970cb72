//! Agenda construction and the default conflict resolver (spec.md §3,
//! §4.6).

use crate::bindings::PartialMatch;
use std::collections::HashSet;

/// A candidate (rule, match) pair for a single cycle.
#[derive(Clone)]
pub struct AgendaEntry {
    pub(crate) rule_index: usize,
    pub(crate) rule_name: String,
    pub(crate) rule_match: PartialMatch,
    pub(crate) signature: String,
    pub(crate) salience: i64,
    pub(crate) match_recency: u64,
}

impl AgendaEntry {
    pub(crate) fn new(rule_index: usize, rule_name: &str, rule_match: PartialMatch) -> Self {
        let mut ids: Vec<u64> = rule_match.facts.iter().map(|f| f.id()).collect();
        ids.sort_unstable();
        let signature = format!(
            "{}::{}",
            rule_name,
            ids.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(",")
        );
        let match_recency = rule_match.recency();
        AgendaEntry {
            rule_index,
            rule_name: rule_name.to_string(),
            rule_match,
            signature,
            salience: 0,
            match_recency,
        }
    }

    /// The rule's name for this entry.
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    /// This entry's refraction signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// This entry's salience (copied from the rule that produced it).
    pub fn salience(&self) -> i64 {
        self.salience
    }

    /// This entry's match recency.
    pub fn match_recency(&self) -> u64 {
        self.match_recency
    }
}

/// Drop already-fired signatures, then sort by salience descending,
/// match recency descending, signature ascending (spec.md §4.6).
pub(crate) fn default_conflict_resolver(
    agenda: &[AgendaEntry],
    fired_history: &HashSet<String>,
) -> Vec<AgendaEntry> {
    let mut resolved: Vec<AgendaEntry> = agenda
        .iter()
        .filter(|e| !fired_history.contains(&e.signature))
        .cloned()
        .collect();
    resolved.sort_by(|a, b| {
        b.salience
            .cmp(&a.salience)
            .then_with(|| b.match_recency.cmp(&a.match_recency))
            .then_with(|| a.signature.cmp(&b.signature))
    });
    resolved
}
