//! Fluent filter/limit query over working memory (spec.md §4.7).
//!
//! Not part of the core match-resolve-act cycle — actions call it, so it
//! ships alongside the engine, but it carries none of the node-network
//! machinery.

use crate::fact::FactRef;
use crate::value::Payload;
use std::sync::Arc;

type FilterFn = Arc<dyn Fn(&Payload) -> bool + Send + Sync>;

/// A fluent `where`/`limit` builder over a snapshot of working memory.
pub struct Query {
    facts: Vec<FactRef>,
    filter: Option<FilterFn>,
    limit: Option<usize>,
}

impl Query {
    pub(crate) fn new(facts: Vec<FactRef>) -> Self {
        Query { facts, filter: None, limit: None }
    }

    /// Keep only facts whose payload satisfies `pred`.
    pub fn filter(mut self, pred: impl Fn(&Payload) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(pred));
        self
    }

    /// Take at most the first `n` results (after filtering), in working
    /// memory iteration order.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Run the query.
    pub fn execute(self) -> Vec<FactRef> {
        let mut results: Vec<FactRef> = match &self.filter {
            Some(pred) => self.facts.into_iter().filter(|f| pred(&f.payload())).collect(),
            None => self.facts,
        };
        if let Some(n) = self.limit {
            results.truncate(n);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use crate::working_memory::WorkingMemory;

    #[test]
    fn filter_and_limit_compose() {
        let mut wm = WorkingMemory::new();
        for age in [15, 20, 25, 30] {
            wm.insert("Person", [("age".to_string(), Value::Int(age))].into());
        }
        let results = Query::new(wm.by_type("Person"))
            .filter(|p| p.get("age").and_then(|v| v.to_number()).unwrap_or(0.0) >= 20.0)
            .limit(2)
            .execute();
        assert_eq!(results.len(), 2);
    }
}
