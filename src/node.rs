//! The compiled node network (spec.md §3, §4.4): the evaluable form of a
//! rule's condition tree.

use crate::aggregate::AccumulateSpec;
use crate::bindings::{unify, Bindings, Bound, PartialMatch};
use crate::condition::{BetaPredicate, PayloadTest};
use crate::fact::FactRef;
use crate::value::Value;
use crate::working_memory::WorkingMemory;
use std::cell::RefCell;
use std::collections::HashMap;

struct AlphaCache {
    matches: Vec<PartialMatch>,
}

struct AccumulatorRuntime {
    state: Value,
    reduced: HashMap<u64, FactRef>,
}

/// One of the eight evaluable node shapes spec.md §3/§4.4 describes.
///
/// Every variant exposes [`Node::evaluate`]. Caches and accumulator state
/// are transient, node-owned evaluation state (spec.md §3's "Node"
/// definition): an `Alpha` node may reuse its last result when its type
/// isn't dirty, and an `Accumulator` node threads reduce/retract state
/// across evaluations.
pub(crate) enum Node {
    Alpha {
        type_name: String,
        test: Option<PayloadTest>,
        var: Option<String>,
        cache: RefCell<Option<AlphaCache>>,
    },
    BetaTest {
        child: Box<Node>,
        test: BetaPredicate,
    },
    LogicalAll {
        children: Vec<Node>,
    },
    LogicalAny {
        children: Vec<Node>,
    },
    LogicalNot {
        child: Box<Node>,
    },
    LogicalExists {
        child: Box<Node>,
    },
    Accumulator {
        child: Box<Node>,
        spec: AccumulateSpec,
        var: Option<String>,
        runtime: RefCell<Option<AccumulatorRuntime>>,
    },
    Unit,
}

impl Node {
    pub(crate) fn alpha(type_name: String, test: Option<PayloadTest>, var: Option<String>) -> Self {
        Node::Alpha { type_name, test, var, cache: RefCell::new(None) }
    }

    pub(crate) fn accumulator(child: Node, spec: AccumulateSpec, var: Option<String>) -> Self {
        Node::Accumulator { child: Box::new(child), spec, var, runtime: RefCell::new(None) }
    }

    /// Produce every partial match this node's subtree yields against the
    /// current contents of `wm`.
    pub(crate) fn evaluate(&self, wm: &WorkingMemory) -> Vec<PartialMatch> {
        match self {
            Node::Unit => vec![PartialMatch::empty()],

            Node::Alpha { type_name, test, var, cache } => {
                if !wm.is_type_dirty(type_name) {
                    if let Some(c) = cache.borrow().as_ref() {
                        return c.matches.clone();
                    }
                }
                let matches: Vec<PartialMatch> = wm
                    .by_type(type_name)
                    .into_iter()
                    .filter(|f| test.as_ref().map(|t| t(&f.payload())).unwrap_or(true))
                    .map(|f| {
                        let mut bindings = Bindings::new();
                        if let Some(v) = var {
                            bindings.insert(v.clone(), Bound::Fact(f.clone()));
                        }
                        PartialMatch { facts: vec![f], bindings }
                    })
                    .collect();
                *cache.borrow_mut() = Some(AlphaCache { matches: matches.clone() });
                matches
            }

            Node::BetaTest { child, test } => child
                .evaluate(wm)
                .into_iter()
                .filter(|m| test(&m.facts, &m.bindings))
                .collect(),

            Node::LogicalAll { children } => {
                let mut results = vec![PartialMatch::empty()];
                for child in children {
                    let child_matches = child.evaluate(wm);
                    let mut next = Vec::new();
                    for a in &results {
                        for b in &child_matches {
                            if let Some(joined) = unify(a, b) {
                                next.push(joined);
                            }
                        }
                    }
                    results = next;
                    if results.is_empty() {
                        break;
                    }
                }
                results
            }

            Node::LogicalAny { children } => {
                children.iter().flat_map(|c| c.evaluate(wm)).collect()
            }

            Node::LogicalNot { child } => {
                if child.evaluate(wm).is_empty() {
                    vec![PartialMatch::empty()]
                } else {
                    vec![]
                }
            }

            Node::LogicalExists { child } => {
                if child.evaluate(wm).is_empty() {
                    vec![]
                } else {
                    vec![PartialMatch::empty()]
                }
            }

            Node::Accumulator { child, spec, var, runtime } => {
                let child_matches = child.evaluate(wm);
                let facts: Vec<FactRef> =
                    child_matches.into_iter().flat_map(|m| m.facts).collect();
                match spec {
                    AccumulateSpec::Simple(simple) => {
                        let value = (simple.aggregator)(&facts);
                        if (simple.test)(&value) {
                            bound_match(facts, var, value)
                        } else {
                            vec![]
                        }
                    }
                    AccumulateSpec::Incremental(inc) => {
                        let mut rt_slot = runtime.borrow_mut();
                        let rt = rt_slot.get_or_insert_with(|| AccumulatorRuntime {
                            state: (inc.initial)(),
                            reduced: HashMap::new(),
                        });

                        let current_ids: std::collections::HashSet<u64> =
                            facts.iter().map(|f| f.id()).collect();
                        let add_set: Vec<FactRef> = facts
                            .iter()
                            .filter(|f| !rt.reduced.contains_key(&f.id()))
                            .cloned()
                            .collect();
                        let remove_set: Vec<(u64, FactRef)> = rt
                            .reduced
                            .iter()
                            .filter(|(id, _)| !current_ids.contains(id))
                            .map(|(id, f)| (*id, f.clone()))
                            .collect();

                        let mut full_reset = false;
                        if !remove_set.is_empty() {
                            if let Some(retract) = &inc.retract {
                                for (id, f) in &remove_set {
                                    rt.state = retract(std::mem::replace(&mut rt.state, Value::Null), f);
                                    rt.reduced.remove(id);
                                }
                            } else {
                                rt.state = (inc.initial)();
                                rt.reduced.clear();
                                for f in &facts {
                                    rt.state =
                                        (inc.reduce)(std::mem::replace(&mut rt.state, Value::Null), f);
                                    rt.reduced.insert(f.id(), f.clone());
                                }
                                full_reset = true;
                            }
                        }
                        if !full_reset {
                            for f in &add_set {
                                rt.state = (inc.reduce)(std::mem::replace(&mut rt.state, Value::Null), f);
                                rt.reduced.insert(f.id(), f.clone());
                            }
                        }

                        let value = match &inc.convert {
                            Some(convert) => convert(&rt.state),
                            None => rt.state.clone(),
                        };
                        if (inc.test)(&value) {
                            bound_match(facts, var, value)
                        } else {
                            vec![]
                        }
                    }
                }
            }
        }
    }
}

fn bound_match(facts: Vec<FactRef>, var: &Option<String>, value: Value) -> Vec<PartialMatch> {
    let mut bindings = Bindings::new();
    if let Some(v) = var {
        bindings.insert(v.clone(), Bound::Value(value));
    }
    vec![PartialMatch { facts, bindings }]
}
