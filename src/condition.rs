//! The embedded condition DSL (spec.md §4.3).
//!
//! `Cond` mirrors the wire shape spec.md describes — a record with
//! optional `type`/`test`/`var`/`accumulate` fields plus mutually
//! exclusive `all`/`any`/`not`/`exists`/bare-beta-test shapes — rather
//! than a Rust enum that would make illegal combinations unrepresentable.
//! That's deliberate: spec.md requires the *compiler* to reject
//! ill-formed trees with `InvalidDsl`, so the builder needs to be able to
//! represent them in the first place. High-level constructors
//! (`Cond::atom`, `Cond::all`, ...) only ever produce well-formed shapes;
//! the low-level `with_*` setters are what let a caller (or a test)
//! assemble an invalid one.

use crate::aggregate::AccumulateSpec;
use crate::bindings::Bindings;
use crate::fact::FactRef;
use crate::value::Payload;
use std::sync::Arc;

/// A predicate over a matched fact's payload.
pub type PayloadTest = Arc<dyn Fn(&Payload) -> bool + Send + Sync>;
/// A predicate over an already-joined partial match (spec.md's beta test).
pub type BetaPredicate = Arc<dyn Fn(&[FactRef], &Bindings) -> bool + Send + Sync>;

/// A node in the condition DSL tree.
#[derive(Clone, Default)]
pub struct Cond {
    pub(crate) type_name: Option<String>,
    pub(crate) test: Option<PayloadTest>,
    pub(crate) var: Option<String>,
    pub(crate) accumulate: Option<AccumulateSpec>,
    pub(crate) all: Option<Vec<Cond>>,
    pub(crate) any: Option<Vec<Cond>>,
    pub(crate) not: Option<Box<Cond>>,
    pub(crate) exists: Option<Box<Cond>>,
    pub(crate) beta_test: Option<BetaPredicate>,
}

impl Cond {
    // --- low-level setters: can assemble invalid shapes on purpose ---

    /// Set the atomic `type` field.
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Set the atomic payload `test` predicate.
    pub fn with_test(mut self, f: impl Fn(&Payload) -> bool + Send + Sync + 'static) -> Self {
        self.test = Some(Arc::new(f));
        self
    }

    /// Bind the matched fact under `name`.
    pub fn with_var(mut self, name: impl Into<String>) -> Self {
        self.var = Some(name.into());
        self
    }

    /// Attach an accumulator to an atomic condition.
    pub fn with_accumulate(mut self, spec: AccumulateSpec) -> Self {
        self.accumulate = Some(spec);
        self
    }

    /// Set the `all` composite key.
    pub fn with_all(mut self, children: Vec<Cond>) -> Self {
        self.all = Some(children);
        self
    }

    /// Set the `any` composite key.
    pub fn with_any(mut self, children: Vec<Cond>) -> Self {
        self.any = Some(children);
        self
    }

    /// Set the `not` composite key.
    pub fn with_not(mut self, child: Cond) -> Self {
        self.not = Some(Box::new(child));
        self
    }

    /// Set the `exists` composite key.
    pub fn with_exists(mut self, child: Cond) -> Self {
        self.exists = Some(Box::new(child));
        self
    }

    /// Set the bare beta-test form: `{ test: (facts, bindings) -> bool }`
    /// with no `type` and no composite key.
    pub fn with_beta_test(
        mut self,
        f: impl Fn(&[FactRef], &Bindings) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.beta_test = Some(Arc::new(f));
        self
    }

    // --- high-level constructors: always well-formed ---

    /// An atomic condition: facts of `type_name` whose payload satisfies
    /// whatever `test`/`var`/`accumulate` are chained on afterward.
    pub fn atom(type_name: impl Into<String>) -> Self {
        Cond::default().with_type(type_name)
    }

    /// `all: [..]` — every child must match, with consistent bindings.
    pub fn all(children: Vec<Cond>) -> Self {
        Cond::default().with_all(children)
    }

    /// `any: [..]` — any child matching is enough.
    pub fn any(children: Vec<Cond>) -> Self {
        Cond::default().with_any(children)
    }

    /// `not: X` — succeeds (with no bindings) only when `X` has no
    /// matches.
    pub fn not(child: Cond) -> Self {
        Cond::default().with_not(child)
    }

    /// `exists: X` — succeeds (with no bindings) when `X` has at least
    /// one match.
    pub fn exists(child: Cond) -> Self {
        Cond::default().with_exists(child)
    }

    /// A standalone beta test with no `type` and no composite key.
    pub fn beta(f: impl Fn(&[FactRef], &Bindings) -> bool + Send + Sync + 'static) -> Self {
        Cond::default().with_beta_test(f)
    }
}
