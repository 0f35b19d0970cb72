//! Accumulator contracts and the built-in aggregator library (spec.md
//! §4.5, §4.8).
//!
//! Grounded on the teacher crate's `rete::accumulate` module (its
//! `AccumulateFunction`/`AccumulateState` traits over `sum`/`count`/
//! `average`/`min`/`max`): this module keeps that library's built-ins but
//! reshapes the contract to the two accumulator forms spec.md actually
//! asks for — a stateless `(aggregator, test)` pair, and a stateful
//! `(initial, reduce, retract?, convert?, test)` tuple with incremental
//! reduce/retract semantics the teacher's trait-object accumulators don't
//! attempt.

use crate::fact::FactRef;
use crate::value::Value;
use std::sync::Arc;

/// Produces the accumulator's initial state.
pub type InitialFn = Arc<dyn Fn() -> Value + Send + Sync>;
/// Folds one more fact into the accumulator's state.
pub type ReduceFn = Arc<dyn Fn(Value, &FactRef) -> Value + Send + Sync>;
/// Maps accumulator state to the bound value.
pub type ConvertFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;
/// Tests the (converted) accumulator value.
pub type TestFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
/// Computes a scalar directly from the full fact set (the "simple" form).
pub type AggregatorFn = Arc<dyn Fn(&[FactRef]) -> Value + Send + Sync>;

/// `{ aggregator: facts -> value, test: value -> bool }` (spec.md §4.5).
///
/// Recomputed in full on every evaluation; no state carried between
/// cycles.
#[derive(Clone)]
pub struct SimpleAccumulate {
    pub aggregator: AggregatorFn,
    pub test: TestFn,
}

/// `{ initial, reduce, retract?, convert?, test }` (spec.md §4.5).
///
/// State persists across evaluations, keyed (per spec.md §9's documented
/// limitation) by a single slot rather than by outer bindings — correct
/// for accumulators at the top level or under constant parent bindings.
#[derive(Clone)]
pub struct IncrementalAccumulate {
    pub initial: InitialFn,
    pub reduce: ReduceFn,
    pub retract: Option<ReduceFn>,
    pub convert: Option<ConvertFn>,
    pub test: TestFn,
}

/// The two accumulator shapes the compiler can wrap around an atomic
/// condition's `accumulate` field.
#[derive(Clone)]
pub enum AccumulateSpec {
    /// The simple, stateless form.
    Simple(SimpleAccumulate),
    /// The incremental, stateful form.
    Incremental(IncrementalAccumulate),
}

/// A test that always accepts — useful when an accumulator exists purely
/// to bind a value (spec.md scenario S4's running total).
pub fn always() -> TestFn {
    Arc::new(|_| true)
}

fn numeric_field(fact: &FactRef, field: &str) -> f64 {
    fact.get(field).and_then(|v| v.to_number()).unwrap_or(0.0)
}

/// `count` — number of facts reaching the accumulator.
pub fn count(test: TestFn) -> AccumulateSpec {
    AccumulateSpec::Incremental(IncrementalAccumulate {
        initial: Arc::new(|| Value::Int(0)),
        reduce: Arc::new(|state, _fact| Value::Int(state.to_number().unwrap_or(0.0) as i64 + 1)),
        retract: Some(Arc::new(|state, _fact| {
            Value::Int(state.to_number().unwrap_or(0.0) as i64 - 1)
        })),
        convert: None,
        test,
    })
}

/// `sum` of a numeric payload field across all accumulated facts.
pub fn sum_of(field: impl Into<String>, test: TestFn) -> AccumulateSpec {
    let field = field.into();
    let add_field = field.clone();
    let sub_field = field.clone();
    AccumulateSpec::Incremental(IncrementalAccumulate {
        initial: Arc::new(|| Value::Number(0.0)),
        reduce: Arc::new(move |state, fact| {
            Value::Number(state.to_number().unwrap_or(0.0) + numeric_field(fact, &add_field))
        }),
        retract: Some(Arc::new(move |state, fact| {
            Value::Number(state.to_number().unwrap_or(0.0) - numeric_field(fact, &sub_field))
        })),
        convert: None,
        test,
    })
}

/// `max` of a numeric payload field. No `retract` is provided: removing
/// the current maximum can't be repaired incrementally, so per spec.md
/// §4.5 the node falls back to a full reset-and-recompute whenever a fact
/// drops out.
pub fn max_of(field: impl Into<String>, test: TestFn) -> AccumulateSpec {
    let field = field.into();
    AccumulateSpec::Incremental(IncrementalAccumulate {
        initial: Arc::new(|| Value::Null),
        reduce: Arc::new(move |state, fact| {
            let n = numeric_field(fact, &field);
            match state.to_number() {
                Some(current) => Value::Number(current.max(n)),
                None => Value::Number(n),
            }
        }),
        retract: None,
        convert: None,
        test,
    })
}

/// `min` of a numeric payload field. Symmetric with [`max_of`]: no
/// `retract`, same full-reset fallback.
pub fn min_of(field: impl Into<String>, test: TestFn) -> AccumulateSpec {
    let field = field.into();
    AccumulateSpec::Incremental(IncrementalAccumulate {
        initial: Arc::new(|| Value::Null),
        reduce: Arc::new(move |state, fact| {
            let n = numeric_field(fact, &field);
            match state.to_number() {
                Some(current) => Value::Number(current.min(n)),
                None => Value::Number(n),
            }
        }),
        retract: None,
        convert: None,
        test,
    })
}

/// `collect-all` — binds the underlying fact sequence itself as the value.
pub fn collect_all(test: TestFn) -> AccumulateSpec {
    AccumulateSpec::Incremental(IncrementalAccumulate {
        initial: Arc::new(|| Value::FactList(Vec::new())),
        reduce: Arc::new(|state, fact| {
            let mut facts = match state {
                Value::FactList(fs) => fs,
                _ => Vec::new(),
            };
            facts.push(fact.clone());
            Value::FactList(facts)
        }),
        retract: Some(Arc::new(|state, fact| {
            let mut facts = match state {
                Value::FactList(fs) => fs,
                _ => Vec::new(),
            };
            facts.retain(|f| f.id() != fact.id());
            Value::FactList(facts)
        })),
        convert: None,
        test,
    })
}
