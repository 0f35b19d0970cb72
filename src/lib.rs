//! # Forward Rule Engine
//!
//! A forward-chaining production-rule engine: conditions compile into an
//! evaluable node network, facts live in typed working memory, and an
//! engine runs a match-resolve-act cycle to a fixed point.
//!
//! ## Quick start
//!
//! ```rust
//! use forward_rule_engine::*;
//! use std::sync::Arc;
//!
//! let mut engine = Engine::new(EngineConfig::default());
//!
//! engine
//!     .add_rule(RuleDef::new(
//!         "adult",
//!         Cond::atom("Person").with_test(|p| {
//!             p.get("age").and_then(|v| v.to_number()).unwrap_or(0.0) >= 18.0
//!         }),
//!         Arc::new(|facts, engine, _bindings| {
//!             let id = facts[0].id();
//!             engine.update_fact(id, [("is_adult".to_string(), Value::Bool(true))].into()).unwrap();
//!         }),
//!     ))
//!     .unwrap();
//!
//! engine.add_fact("Person", [("age".to_string(), Value::Int(30))].into()).unwrap();
//! engine.run().unwrap();
//! ```
//!
//! ## Core components
//!
//! - [`Value`]/[`Payload`]: the data model facts carry.
//! - [`Fact`]/[`FactRef`]: identity-tagged, typed, mutable-payload facts.
//! - [`Engine`]/[`EngineConfig`]: owns working memory and rules, runs cycles.
//! - [`Cond`]: the embedded condition DSL rules are built from.
//! - [`RuleDef`]/[`Rule`]: a named, salient, compiled condition plus an action.
//! - [`Query`]: a fluent filter/limit reader over working memory.
//! - aggregate builtins ([`count`], [`sum_of`], [`max_of`], [`min_of`], [`collect_all`]).

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Agenda entries and the default conflict resolver.
pub mod agenda;
/// Accumulator contracts and built-in aggregators.
pub mod aggregate;
/// Variable bindings and partial matches.
pub mod bindings;
/// The embedded condition DSL.
pub mod condition;
/// Compiles conditions into node networks.
mod compiler;
/// The engine: working memory, rules, and the match-resolve-act cycle.
pub mod engine;
/// Error types and result handling.
pub mod errors;
/// Facts: identity-tagged, typed, mutable payloads.
pub mod fact;
/// The compiled, evaluable node network.
mod node;
/// Fluent queries over working memory.
pub mod query;
/// Rule definitions and their compiled form.
pub mod rule;
/// Execution trace recording.
pub mod trace;
/// The data model facts and bindings carry.
pub mod value;
/// Typed working memory.
pub mod working_memory;

pub use agenda::AgendaEntry;
pub use aggregate::{always, collect_all, count, max_of, min_of, sum_of, AccumulateSpec};
pub use bindings::{Bindings, Bound, PartialMatch};
pub use condition::Cond;
pub use engine::{Engine, EngineConfig};
pub use errors::{Result, RuleEngineError};
pub use fact::{Fact, FactRef};
pub use query::Query;
pub use rule::{Action, Rule, RuleDef};
pub use trace::TraceEntry;
pub use value::{Payload, Value};
