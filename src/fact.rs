//! Facts: identity-tagged, typed payloads held in working memory.

use crate::value::{Payload, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// An immutable-identity, mutable-payload fact.
///
/// `id` and `type_name` never change after construction; `payload` and
/// `recency` are mutated in place by [`crate::working_memory::WorkingMemory`]
/// so that existing [`FactRef`] clones observe updates (spec.md's "Fact
/// aliasing" design note — matches reference identity, not value).
#[derive(Debug)]
pub struct Fact {
    id: u64,
    type_name: String,
    payload: RwLock<Payload>,
    recency: AtomicU64,
}

/// A shared, non-owning reference to a fact. Cheap to clone; identity is
/// the wrapped fact's `id`.
pub type FactRef = Arc<Fact>;

impl Fact {
    pub(crate) fn new(id: u64, type_name: String, payload: Payload, recency: u64) -> FactRef {
        Arc::new(Fact {
            id,
            type_name,
            payload: RwLock::new(payload),
            recency: AtomicU64::new(recency),
        })
    }

    /// Process-unique, monotonically allocated identity.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The fact's type, fixed at insertion.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// A snapshot of the current payload.
    pub fn payload(&self) -> Payload {
        self.payload.read().unwrap().clone()
    }

    /// Read a single payload field.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.payload.read().unwrap().get(key).cloned()
    }

    /// The recency stamp assigned at the most recent insert/update.
    pub fn recency(&self) -> u64 {
        self.recency.load(Ordering::SeqCst)
    }

    pub(crate) fn merge_payload(&self, updates: Payload, recency: u64) {
        let mut p = self.payload.write().unwrap();
        for (k, v) in updates {
            p.insert(k, v);
        }
        self.recency.store(recency, Ordering::SeqCst);
    }
}

impl PartialEq for Fact {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Fact {}

impl std::hash::Hash for Fact {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
