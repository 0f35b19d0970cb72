//! Typed working memory: owns all facts, indexes by type, tracks dirty
//! types across cycles (spec.md §4.1).

use crate::errors::{Result, RuleEngineError};
use crate::fact::{Fact, FactRef};
use crate::value::{Payload, Value};
use std::collections::{HashMap, HashSet};

/// Owned store of facts, indexed by type, with recency and dirty-type
/// bookkeeping so stable rules can skip re-evaluation.
#[derive(Debug, Default)]
pub struct WorkingMemory {
    buckets: HashMap<String, Vec<FactRef>>,
    by_id: HashMap<u64, FactRef>,
    next_id: u64,
    version_counter: u64,
    dirty_current: HashSet<String>,
    dirty_next: HashSet<String>,
}

impl WorkingMemory {
    /// An empty working memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new fact of `type_name` with the given payload.
    ///
    /// Assigns a fresh, monotonically increasing `recency` and marks
    /// `type_name` dirty for the next cycle.
    pub fn insert(&mut self, type_name: impl Into<String>, payload: Payload) -> FactRef {
        let type_name = type_name.into();
        self.next_id += 1;
        self.version_counter += 1;
        let fact = Fact::new(self.next_id, type_name.clone(), payload, self.version_counter);
        self.buckets.entry(type_name.clone()).or_default().push(fact.clone());
        self.by_id.insert(fact.id(), fact.clone());
        self.dirty_next.insert(type_name);
        log::trace!("wm: inserted fact {} ({})", fact.id(), fact.type_name());
        fact
    }

    /// Merge `updates` into the fact with the given id.
    ///
    /// Rejects an attempt to change `type` via a `"type"` key in `updates`
    /// whose value differs from the fact's current type (spec.md §4.1).
    pub fn update(&mut self, id: u64, updates: Payload) -> Result<FactRef> {
        let fact = self.by_id.get(&id).cloned().ok_or(RuleEngineError::NotFound(id))?;
        if let Some(Value::Str(new_type)) = updates.get("type") {
            if new_type != fact.type_name() {
                return Err(RuleEngineError::TypeImmutable {
                    id,
                    current: fact.type_name().to_string(),
                    attempted: new_type.clone(),
                });
            }
        }
        self.version_counter += 1;
        fact.merge_payload(updates, self.version_counter);
        self.dirty_next.insert(fact.type_name().to_string());
        log::trace!("wm: updated fact {}", id);
        Ok(fact)
    }

    /// Remove the fact with the given id.
    pub fn remove(&mut self, id: u64) -> Result<FactRef> {
        let fact = self.by_id.remove(&id).ok_or(RuleEngineError::NotFound(id))?;
        if let Some(bucket) = self.buckets.get_mut(fact.type_name()) {
            bucket.retain(|f| f.id() != id);
            if bucket.is_empty() {
                self.buckets.remove(fact.type_name());
            }
        }
        self.dirty_next.insert(fact.type_name().to_string());
        log::trace!("wm: removed fact {}", id);
        Ok(fact)
    }

    /// Snapshot of all facts of the given type.
    pub fn by_type(&self, type_name: &str) -> Vec<FactRef> {
        self.buckets.get(type_name).cloned().unwrap_or_default()
    }

    /// Snapshot of every fact across all types.
    pub fn all(&self) -> Vec<FactRef> {
        self.buckets.values().flatten().cloned().collect()
    }

    /// `dirtyCurrent ← dirtyCurrent ∪ dirtyNext; dirtyNext ← ∅`.
    pub fn promote_next_dirty(&mut self) {
        self.dirty_current.extend(self.dirty_next.drain());
    }

    /// `dirtyCurrent ← ∅`.
    pub fn clear_current_dirty(&mut self) {
        self.dirty_current.clear();
    }

    /// Whether `t` is dirty in either the current or pending set.
    pub fn is_type_dirty(&self, t: &str) -> bool {
        self.dirty_current.contains(t) || self.dirty_next.contains(t)
    }

    /// The set of types dirty in the current cycle.
    pub fn dirty_current_types(&self) -> HashSet<String> {
        self.dirty_current.clone()
    }
}
