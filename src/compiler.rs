//! Compiles a [`Cond`] tree into an evaluable [`Node`] network (spec.md
//! §4.3), validating the DSL's mutually-exclusive shapes along the way
//! and collecting the scheduling hints (`referenced_types`,
//! `has_negation`) attached to the resulting rule.

use crate::condition::Cond;
use crate::errors::{Result, RuleEngineError};
use crate::node::Node;
use std::collections::HashSet;

/// The compiled form of a rule's condition tree, plus the bookkeeping
/// the engine's agenda construction needs (spec.md §4.3, §4.6).
pub(crate) struct CompiledCondition {
    pub node: Node,
    pub referenced_types: HashSet<String>,
    pub has_negation: bool,
}

fn invalid(message: impl Into<String>) -> RuleEngineError {
    RuleEngineError::InvalidDsl { message: message.into() }
}

enum LogicalKind {
    All,
    Any,
}

/// Compile a condition tree into its node network.
pub(crate) fn compile(cond: &Cond) -> Result<CompiledCondition> {
    let mut referenced_types = HashSet::new();
    let mut has_negation = false;
    let node = compile_node(cond, &mut referenced_types, &mut has_negation)?;
    Ok(CompiledCondition { node, referenced_types, has_negation })
}

fn is_composite(cond: &Cond) -> bool {
    cond.all.is_some() || cond.any.is_some() || cond.not.is_some() || cond.exists.is_some()
}

fn is_bare_beta_test(cond: &Cond) -> bool {
    cond.beta_test.is_some() && cond.type_name.is_none() && !is_composite(cond)
}

fn validate_shape(cond: &Cond) -> Result<()> {
    let composite_count = [cond.all.is_some(), cond.any.is_some(), cond.not.is_some(), cond.exists.is_some()]
        .iter()
        .filter(|b| **b)
        .count();
    let has_composite = composite_count > 0;

    if composite_count > 1 {
        return Err(invalid("condition sets more than one of `all`/`any`/`not`/`exists`"));
    }
    if cond.type_name.is_some() && has_composite {
        return Err(invalid("condition has `type` together with a composite key"));
    }
    if (cond.test.is_some() || cond.beta_test.is_some()) && has_composite {
        return Err(invalid("condition has `test` together with a composite key"));
    }
    if cond.accumulate.is_some() && cond.type_name.is_none() {
        return Err(invalid("`accumulate` requires an atomic `type`"));
    }
    if cond.var.is_some() && cond.type_name.is_none() {
        return Err(invalid("`var` requires an atomic `type`"));
    }
    if cond.test.is_some() && cond.type_name.is_none() && cond.beta_test.is_none() {
        return Err(invalid(
            "a payload `test` requires an atomic `type`; use `Cond::beta` for a bare beta test",
        ));
    }
    if !has_composite && cond.type_name.is_none() && cond.beta_test.is_none() {
        return Err(invalid("condition has neither `type`, a composite key, nor a beta test"));
    }
    Ok(())
}

fn compile_node(
    cond: &Cond,
    referenced_types: &mut HashSet<String>,
    has_negation: &mut bool,
) -> Result<Node> {
    validate_shape(cond)?;

    if let Some(children) = &cond.all {
        return compile_logical(children, LogicalKind::All, referenced_types, has_negation);
    }
    if let Some(children) = &cond.any {
        return compile_logical(children, LogicalKind::Any, referenced_types, has_negation);
    }
    if let Some(child) = &cond.not {
        *has_negation = true;
        let inner = compile_node(child, referenced_types, has_negation)?;
        return Ok(Node::LogicalNot { child: Box::new(inner) });
    }
    if let Some(child) = &cond.exists {
        let inner = compile_node(child, referenced_types, has_negation)?;
        return Ok(Node::LogicalExists { child: Box::new(inner) });
    }

    if let Some(type_name) = &cond.type_name {
        referenced_types.insert(type_name.clone());
        let alpha = Node::alpha(type_name.clone(), cond.test.clone(), cond.var.clone());
        return Ok(match &cond.accumulate {
            Some(spec) => Node::accumulator(alpha, spec.clone(), cond.var.clone()),
            None => alpha,
        });
    }

    // Bare beta-test shape: `{ test }` with no `type` and no composite.
    let test = cond.beta_test.clone().expect("validate_shape guarantees one of the shapes");
    Ok(Node::BetaTest { child: Box::new(Node::Unit), test })
}

/// `all`/`any`: partition children into alpha/composite children (joined
/// or concatenated into the base node) and embedded bare beta-tests,
/// which stack as `BetaTest` wrappers around that base, in order
/// (spec.md §4.3).
fn compile_logical(
    children: &[Cond],
    kind: LogicalKind,
    referenced_types: &mut HashSet<String>,
    has_negation: &mut bool,
) -> Result<Node> {
    let mut base_children = Vec::new();
    let mut beta_tests = Vec::new();

    for child in children {
        validate_shape(child)?;
        if is_bare_beta_test(child) {
            beta_tests.push(child.beta_test.clone().unwrap());
        } else {
            base_children.push(compile_node(child, referenced_types, has_negation)?);
        }
    }

    let mut base = match base_children.len() {
        0 => Node::Unit,
        1 => base_children.into_iter().next().unwrap(),
        _ => match kind {
            LogicalKind::All => Node::LogicalAll { children: base_children },
            LogicalKind::Any => Node::LogicalAny { children: base_children },
        },
    };

    for test in beta_tests {
        base = Node::BetaTest { child: Box::new(base), test };
    }
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{always, count};

    #[test]
    fn type_with_composite_is_invalid() {
        let cond = Cond::atom("Person").with_all(vec![Cond::atom("Event")]);
        assert!(matches!(compile(&cond), Err(RuleEngineError::InvalidDsl { .. })));
    }

    #[test]
    fn test_with_composite_is_invalid() {
        let cond = Cond::beta(|_, _| true).with_any(vec![Cond::atom("Event")]);
        assert!(matches!(compile(&cond), Err(RuleEngineError::InvalidDsl { .. })));
    }

    #[test]
    fn multiple_composite_keys_is_invalid() {
        let cond = Cond::default()
            .with_all(vec![Cond::atom("A")])
            .with_any(vec![Cond::atom("B")]);
        assert!(matches!(compile(&cond), Err(RuleEngineError::InvalidDsl { .. })));
    }

    #[test]
    fn accumulate_without_type_is_invalid() {
        let cond = Cond::default().with_accumulate(count(always()));
        assert!(matches!(compile(&cond), Err(RuleEngineError::InvalidDsl { .. })));
    }

    #[test]
    fn plain_atom_compiles_and_tracks_referenced_type() {
        let cond = Cond::atom("Person");
        let compiled = compile(&cond).unwrap();
        assert!(compiled.referenced_types.contains("Person"));
        assert!(!compiled.has_negation);
    }

    #[test]
    fn not_subtree_sets_has_negation_even_nested() {
        let cond = Cond::all(vec![Cond::atom("Person"), Cond::not(Cond::atom("Flag"))]);
        let compiled = compile(&cond).unwrap();
        assert!(compiled.has_negation);
        assert!(compiled.referenced_types.contains("Flag"));
    }

    #[test]
    fn single_child_all_passes_through_without_wrapping() {
        let cond = Cond::all(vec![Cond::atom("Person")]);
        let compiled = compile(&cond).unwrap();
        assert!(matches!(compiled.node, Node::Alpha { .. }));
    }
}
