//! Rules: a name, a salience, a compiled condition network, and an
//! action (spec.md §3, §4.6).

use crate::bindings::Bindings;
use crate::compiler::{compile, CompiledCondition};
use crate::condition::Cond;
use crate::engine::Engine;
use crate::errors::Result;
use crate::fact::FactRef;
use crate::node::Node;
use std::collections::HashSet;
use std::sync::Arc;

/// A rule's action: receives the matched facts, a mutable handle to the
/// engine (so it can add/update/remove facts or issue queries), and the
/// match's bindings.
pub type Action = Arc<dyn Fn(&[FactRef], &mut Engine, &Bindings) + Send + Sync>;

/// User-facing definition passed to [`Engine::add_rule`].
pub struct RuleDef {
    /// The rule's name. Uniqueness is the caller's responsibility.
    pub name: String,
    /// Conflict-resolution priority; higher fires first. Default 0.
    pub salience: i64,
    /// The condition tree to compile.
    pub conditions: Cond,
    /// The action to fire for each resolved match.
    pub action: Action,
}

impl RuleDef {
    /// A new rule definition with salience 0.
    pub fn new(name: impl Into<String>, conditions: Cond, action: Action) -> Self {
        Self { name: name.into(), salience: 0, conditions, action }
    }

    /// Set the rule's salience.
    pub fn with_salience(mut self, salience: i64) -> Self {
        self.salience = salience;
        self
    }
}

/// A compiled rule living inside an [`Engine`] for its lifetime.
pub struct Rule {
    pub(crate) name: String,
    pub(crate) salience: i64,
    pub(crate) root: Node,
    pub(crate) referenced_types: HashSet<String>,
    pub(crate) has_negation: bool,
    pub(crate) action: Action,
}

impl Rule {
    pub(crate) fn compile(def: RuleDef) -> Result<Rule> {
        let CompiledCondition { node, referenced_types, has_negation } = compile(&def.conditions)?;
        Ok(Rule {
            name: def.name,
            salience: def.salience,
            root: node,
            referenced_types,
            has_negation,
            action: def.action,
        })
    }

    /// The rule's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The rule's salience.
    pub fn salience(&self) -> i64 {
        self.salience
    }
}
