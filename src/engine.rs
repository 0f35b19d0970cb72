//! The engine: owns working memory and the compiled rule set, and runs
//! the match-resolve-act cycle (spec.md §4.6).

use crate::agenda::{default_conflict_resolver, AgendaEntry};
use crate::bindings::Bindings;
use crate::errors::{Result, RuleEngineError};
use crate::fact::FactRef;
use crate::query::Query;
use crate::rule::{Rule, RuleDef};
use crate::trace::TraceEntry;
use crate::value::Payload;
use crate::working_memory::WorkingMemory;
use chrono::Utc;
use std::sync::Arc;

type ConflictResolver = Arc<dyn Fn(&[AgendaEntry]) -> Vec<AgendaEntry> + Send + Sync>;

/// Engine tuning knobs (spec.md §5, §6).
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Upper bound on match-resolve-act cycles per [`Engine::run`] call.
    /// Exceeding it without reaching a fixed point is a [`RuleEngineError::MaxCyclesExceeded`].
    pub max_cycles: u32,
    /// Whether to record an execution trace while running.
    pub trace: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { max_cycles: 100, trace: false }
    }
}

/// The forward-chaining engine: working memory, compiled rules, and the
/// cycle loop that drives them (spec.md §1, §4.6).
pub struct Engine {
    wm: WorkingMemory,
    rules: Vec<Rule>,
    config: EngineConfig,
    conflict_resolver: Option<ConflictResolver>,
    fired_history: std::collections::HashSet<String>,
    execution_trace: Vec<TraceEntry>,
    cycle_count: u32,
    recording: Option<Vec<Payload>>,
}

impl Engine {
    /// A fresh engine with empty working memory and no rules.
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            wm: WorkingMemory::new(),
            rules: Vec::new(),
            config,
            conflict_resolver: None,
            fired_history: std::collections::HashSet::new(),
            execution_trace: Vec::new(),
            cycle_count: 0,
            recording: None,
        }
    }

    /// Compile and add a rule. Rules are compiled once, at registration
    /// time; later calls evaluate the same compiled network.
    pub fn add_rule(&mut self, def: RuleDef) -> Result<&Rule> {
        let rule = Rule::compile(def)?;
        self.rules.push(rule);
        Ok(self.rules.last().expect("just pushed"))
    }

    /// Insert a new fact of the given type. `type_name` must be non-empty.
    pub fn add_fact(&mut self, type_name: impl Into<String>, payload: Payload) -> Result<FactRef> {
        let type_name = type_name.into();
        if type_name.is_empty() {
            return Err(RuleEngineError::MissingType);
        }
        let fact = self.wm.insert(type_name, payload);
        if let Some(recorder) = &mut self.recording {
            recorder.push(fact.payload());
        }
        Ok(fact)
    }

    /// Merge `updates` into an existing fact's payload. Rejects an update
    /// that tries to change the fact's type.
    pub fn update_fact(&mut self, id: u64, updates: Payload) -> Result<FactRef> {
        self.wm.update(id, updates)
    }

    /// Remove a fact from working memory.
    pub fn remove_fact(&mut self, id: u64) -> Result<FactRef> {
        self.wm.remove(id)
    }

    /// Start a query over working memory, optionally restricted to one type.
    pub fn query(&self, type_name: Option<&str>) -> Query {
        let facts = match type_name {
            Some(t) => self.wm.by_type(t),
            None => self.wm.all(),
        };
        Query::new(facts)
    }

    /// Replace the default salience/recency/signature conflict resolver.
    /// The engine still records fired signatures into refraction history
    /// regardless of which resolver chose them.
    pub fn set_conflict_resolver(
        &mut self,
        f: impl Fn(&[AgendaEntry]) -> Vec<AgendaEntry> + Send + Sync + 'static,
    ) {
        self.conflict_resolver = Some(Arc::new(f));
    }

    /// The trace recorded by the most recent [`Engine::run`], if tracing
    /// was enabled.
    pub fn execution_trace(&self) -> &[TraceEntry] {
        &self.execution_trace
    }

    /// Discard the recorded trace.
    pub fn clear_execution_trace(&mut self) {
        self.execution_trace.clear();
    }

    /// The number of cycles the most recent [`Engine::run`] call ran.
    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    /// Run the match-resolve-act cycle to a fixed point, or until
    /// `max_cycles` is exhausted.
    ///
    /// Each cycle: promote newly-dirty types into the current generation,
    /// build the agenda (skipping rules whose referenced types are none of
    /// them dirty, unless the rule contains a negation), resolve conflicts,
    /// fire the resolved matches in order, and clear the current dirty set.
    /// The loop stops when a cycle builds an empty agenda or fires nothing.
    pub fn run(&mut self) -> Result<()> {
        self.cycle_count = 0;
        self.execution_trace.clear();

        while self.cycle_count < self.config.max_cycles {
            self.wm.promote_next_dirty();
            let agenda = self.build_agenda();
            if agenda.is_empty() {
                log::debug!("agenda empty after {} cycles, stable", self.cycle_count);
                return Ok(());
            }

            self.cycle_count += 1;
            let resolved = match &self.conflict_resolver {
                Some(f) => f(&agenda),
                None => default_conflict_resolver(&agenda, &self.fired_history),
            };
            log::debug!(
                "cycle {}: {} candidate(s), {} resolved",
                self.cycle_count,
                agenda.len(),
                resolved.len()
            );

            if resolved.is_empty() {
                return Ok(());
            }
            for entry in resolved {
                self.fire(entry);
            }
            self.wm.clear_current_dirty();
        }

        Err(RuleEngineError::MaxCyclesExceeded(self.config.max_cycles))
    }

    fn build_agenda(&self) -> Vec<AgendaEntry> {
        let mut agenda = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            let should_evaluate = rule.referenced_types.is_empty()
                || rule.has_negation
                || rule.referenced_types.iter().any(|t| self.wm.is_type_dirty(t));
            if !should_evaluate {
                continue;
            }
            for rule_match in rule.root.evaluate(&self.wm) {
                let mut entry = AgendaEntry::new(index, &rule.name, rule_match);
                entry.salience = rule.salience;
                agenda.push(entry);
            }
        }
        agenda
    }

    fn fire(&mut self, entry: AgendaEntry) {
        let AgendaEntry { rule_index, rule_name, rule_match, signature, .. } = entry;
        let action = self.rules[rule_index].action.clone();
        let bindings: Bindings = rule_match.bindings.clone();

        if self.config.trace {
            self.recording = Some(Vec::new());
        }
        action(&rule_match.facts, self, &bindings);
        if self.config.trace {
            let facts_added = self.recording.take().unwrap_or_default();
            self.execution_trace.push(TraceEntry {
                rule_name: rule_name.clone(),
                timestamp: Utc::now(),
                facts: rule_match.facts.iter().map(|f| f.payload()).collect(),
                facts_added,
            });
        }

        log::debug!("fired {} ({})", rule_name, signature);
        self.fired_history.insert(signature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Cond;
    use crate::rule::RuleDef;
    use crate::value::Value;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn fires_a_matching_rule_once() {
        let mut engine = Engine::new(EngineConfig::default());
        let fire_count = Arc::new(AtomicU32::new(0));
        let counter = fire_count.clone();
        engine
            .add_rule(RuleDef::new(
                "adult",
                Cond::atom("Person").with_test(|p| {
                    p.get("age").and_then(|v| v.to_number()).unwrap_or(0.0) >= 18.0
                }),
                Arc::new(move |_facts, _engine, _bindings| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            ))
            .unwrap();

        engine.add_fact("Person", [("age".to_string(), Value::Int(30))].into()).unwrap();
        engine.run().unwrap();

        assert_eq!(fire_count.load(Ordering::SeqCst), 1);
        // refraction: a second run with no new facts must not refire it.
        engine.run().unwrap();
        assert_eq!(fire_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn max_cycles_exceeded_when_a_rule_keeps_spawning_new_matches() {
        let mut engine = Engine::new(EngineConfig { max_cycles: 3, trace: false });
        engine
            .add_rule(RuleDef::new(
                "spawn",
                Cond::atom("Seed"),
                Arc::new(|_facts, engine, _bindings| {
                    engine.add_fact("Seed", Payload::new()).unwrap();
                }),
            ))
            .unwrap();
        engine.add_fact("Seed", Payload::new()).unwrap();

        let result = engine.run();
        assert!(matches!(result, Err(RuleEngineError::MaxCyclesExceeded(3))));
    }

    #[test]
    fn trace_records_firings_and_added_facts() {
        let mut engine = Engine::new(EngineConfig { max_cycles: 10, trace: true });
        engine
            .add_rule(RuleDef::new(
                "spawn",
                Cond::atom("Seed"),
                Arc::new(|_facts, engine, _bindings| {
                    engine.add_fact("Spawned", Payload::new()).unwrap();
                }),
            ))
            .unwrap();
        engine.add_fact("Seed", Payload::new()).unwrap();
        engine.run().unwrap();

        let trace = engine.execution_trace();
        assert_eq!(trace.len(), 1);
        assert_eq!(trace[0].rule_name(), "spawn");
        assert_eq!(trace[0].facts_added().len(), 1);
    }
}
