//! Variable bindings and partial matches flowing through the node network.

use crate::fact::FactRef;
use crate::value::Value;
use std::collections::HashMap;

/// What a bound variable name maps to: most conditions bind a variable to
/// the fact that satisfied them, but an accumulator binds its variable to
/// the aggregate's result instead (spec.md §4.5).
#[derive(Debug, Clone)]
pub enum Bound {
    /// The variable is bound to a matched fact.
    Fact(FactRef),
    /// The variable is bound to a computed value (an accumulator result).
    Value(Value),
}

impl Bound {
    /// The fact this binding points to, if it is a fact binding.
    pub fn as_fact(&self) -> Option<&FactRef> {
        match self {
            Bound::Fact(f) => Some(f),
            Bound::Value(_) => None,
        }
    }

    /// The value this binding carries, if it is a value binding.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Bound::Value(v) => Some(v),
            Bound::Fact(_) => None,
        }
    }

    fn identity_eq(&self, other: &Bound) -> bool {
        match (self, other) {
            (Bound::Fact(a), Bound::Fact(b)) => a.id() == b.id(),
            (Bound::Value(a), Bound::Value(b)) => a == b,
            _ => false,
        }
    }
}

/// A mapping from variable name to what it's bound to.
pub type Bindings = HashMap<String, Bound>;

/// A candidate `(facts, bindings)` flowing through the node network.
///
/// `facts` is ordered by the network's left-to-right traversal; equality
/// for signature purposes uses the *set* of fact ids, not this order
/// (spec.md §3).
#[derive(Debug, Clone, Default)]
pub struct PartialMatch {
    /// The facts contributing to this match, in network traversal order.
    pub facts: Vec<FactRef>,
    /// Bindings accumulated for this match.
    pub bindings: Bindings,
}

impl PartialMatch {
    /// The empty match `{[], {}}` produced by `Unit` and by failed
    /// negation/existence checks.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `max(fact.recency for fact in facts)`, or 0 when `facts` is empty.
    pub fn recency(&self) -> u64 {
        self.facts.iter().map(|f| f.recency()).max().unwrap_or(0)
    }
}

/// Join two partial matches, unifying their bindings.
///
/// Starts from `a.bindings`; for each key in `b.bindings`, inserts it if
/// absent, keeps it if it agrees with `a`'s binding, and fails the whole
/// join if it conflicts (spec.md §4.4). On success, `facts` is the
/// concatenation `a.facts ++ b.facts`.
pub fn unify(a: &PartialMatch, b: &PartialMatch) -> Option<PartialMatch> {
    let mut bindings = a.bindings.clone();
    for (k, v) in &b.bindings {
        match bindings.get(k) {
            None => {
                bindings.insert(k.clone(), v.clone());
            }
            Some(existing) if existing.identity_eq(v) => {}
            Some(_) => return None,
        }
    }
    let mut facts = a.facts.clone();
    facts.extend(b.facts.iter().cloned());
    Some(PartialMatch { facts, bindings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::working_memory::WorkingMemory;

    #[test]
    fn unify_merges_disjoint_bindings() {
        let mut wm = WorkingMemory::new();
        let f1 = wm.insert("A", Default::default());
        let f2 = wm.insert("B", Default::default());
        let a = PartialMatch { facts: vec![f1.clone()], bindings: [("x".into(), Bound::Fact(f1.clone()))].into() };
        let b = PartialMatch { facts: vec![f2.clone()], bindings: [("y".into(), Bound::Fact(f2.clone()))].into() };
        let joined = unify(&a, &b).unwrap();
        assert_eq!(joined.facts.len(), 2);
        assert!(joined.bindings.contains_key("x"));
        assert!(joined.bindings.contains_key("y"));
    }

    #[test]
    fn unify_rejects_conflicting_binding_to_distinct_facts() {
        let mut wm = WorkingMemory::new();
        let f1 = wm.insert("A", Default::default());
        let f2 = wm.insert("A", Default::default());
        let a = PartialMatch { facts: vec![f1.clone()], bindings: [("x".into(), Bound::Fact(f1))].into() };
        let b = PartialMatch { facts: vec![f2.clone()], bindings: [("x".into(), Bound::Fact(f2))].into() };
        assert!(unify(&a, &b).is_none());
    }

    #[test]
    fn unify_accepts_same_fact_bound_twice() {
        let mut wm = WorkingMemory::new();
        let f1 = wm.insert("A", Default::default());
        let a = PartialMatch { facts: vec![f1.clone()], bindings: [("x".into(), Bound::Fact(f1.clone()))].into() };
        let b = PartialMatch { facts: vec![f1.clone()], bindings: [("x".into(), Bound::Fact(f1))].into() };
        assert!(unify(&a, &b).is_some());
    }
}
