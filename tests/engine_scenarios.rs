//! End-to-end match-resolve-act scenarios, exercised through the public API.

use forward_rule_engine::{Cond, Engine, EngineConfig, Payload, RuleDef, RuleEngineError, Value};
use std::sync::{Arc, Mutex};

fn payload(pairs: &[(&str, Value)]) -> Payload {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[test]
fn adult_birthday_fires_once_with_consistent_bindings() {
    let mut engine = Engine::new(EngineConfig::default());
    let fired: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let log = fired.clone();

    engine
        .add_rule(RuleDef::new(
            "adult_birthday",
            Cond::all(vec![
                Cond::atom("Person")
                    .with_var("p")
                    .with_test(|p| p.get("age").and_then(|v| v.to_number()).unwrap_or(0.0) >= 18.0),
                Cond::atom("Event")
                    .with_var("e")
                    .with_test(|p| p.get("category").and_then(|v| v.as_str().map(str::to_string)) == Some("Birthday".into())),
                Cond::beta(|_facts, bindings| {
                    let p = bindings["p"].as_fact().unwrap();
                    let e = bindings["e"].as_fact().unwrap();
                    e.get("personName") == p.get("name")
                }),
            ]),
            Arc::new(move |_facts, _engine, bindings| {
                let p = bindings["p"].as_fact().unwrap().get("name").unwrap();
                let e = bindings["e"].as_fact().unwrap().get("personName").unwrap();
                log.lock().unwrap().push((format!("{:?}", p), format!("{:?}", e)));
            }),
        ))
        .unwrap();

    engine
        .add_fact("Person", payload(&[("name", "Alice".into()), ("age", Value::Int(30))]))
        .unwrap();
    engine
        .add_fact(
            "Event",
            payload(&[("category", "Birthday".into()), ("personName", "Alice".into())]),
        )
        .unwrap();

    engine.run().unwrap();

    let fires = fired.lock().unwrap();
    assert_eq!(fires.len(), 1);
    assert_eq!(fires[0].0, fires[0].1);
}

#[test]
fn any_fires_once_per_matching_fact_and_refracts() {
    let mut engine = Engine::new(EngineConfig::default());
    let count = Arc::new(std::sync::atomic::AtomicU32::new(0));
    let counter = count.clone();

    engine
        .add_rule(RuleDef::new(
            "cat_horse_or_dog",
            Cond::any(vec![
                Cond::atom("Animal").with_test(|p| p.get("species").and_then(Value::as_str).map(|s| s.to_string()) == Some("cat".into())),
                Cond::atom("Animal").with_test(|p| p.get("species").and_then(Value::as_str).map(|s| s.to_string()) == Some("horse".into())),
                Cond::atom("Animal").with_test(|p| p.get("species").and_then(Value::as_str).map(|s| s.to_string()) == Some("dog".into())),
            ]),
            Arc::new(move |_facts, _engine, _bindings| {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }),
        ))
        .unwrap();

    engine.add_fact("Animal", payload(&[("species", "cat".into())])).unwrap();
    engine.add_fact("Animal", payload(&[("species", "dog".into())])).unwrap();

    engine.run().unwrap();
    assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 2);

    engine.run().unwrap();
    assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 2, "refracted on rerun");
}

#[test]
fn not_with_existing_fact_fails_only_the_not_branch() {
    let mut engine = Engine::new(EngineConfig::default());
    let count = Arc::new(std::sync::atomic::AtomicU32::new(0));
    let counter = count.clone();

    let is_status = |status: &'static str| {
        move |p: &Payload| p.get("status").and_then(Value::as_str).map(|s| s.to_string()) == Some(status.to_string())
    };

    engine
        .add_rule(RuleDef::new(
            "expired_or_active",
            Cond::any(vec![
                Cond::not(Cond::atom("Entity").with_test(is_status("Expired"))),
                Cond::atom("Entity").with_test(is_status("Active")),
            ]),
            Arc::new(move |_facts, _engine, _bindings| {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }),
        ))
        .unwrap();

    engine.add_fact("Entity", payload(&[("status", "Expired".into())])).unwrap();
    engine.add_fact("Entity", payload(&[("status", "Active".into())])).unwrap();

    engine.run().unwrap();
    assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[test]
fn incremental_sum_tracks_chained_inserts_across_cycles() {
    let mut engine = Engine::new(EngineConfig { max_cycles: 10, trace: false });
    let totals: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
    let totals_log = totals.clone();
    let doubled = Arc::new(std::sync::atomic::AtomicU32::new(0));
    let doubled_counter = doubled.clone();

    engine
        .add_rule(
            RuleDef::new(
                "double_unprocessed",
                Cond::atom("Product").with_var("p").with_test(|p| !p.contains_key("processed")),
                Arc::new(move |facts, engine, _bindings| {
                    let price = facts[0].get("price").and_then(|v| v.to_number()).unwrap_or(0.0);
                    engine
                        .add_fact(
                            "Product",
                            payload(&[("price", Value::Number(price * 2.0)), ("processed", Value::Bool(true))]),
                        )
                        .unwrap();
                    doubled_counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                }),
            )
            .with_salience(10),
        )
        .unwrap();

    engine
        .add_rule(RuleDef::new(
            "running_total",
            Cond::atom("Product")
                .with_var("total")
                .with_accumulate(forward_rule_engine::sum_of("price", forward_rule_engine::always())),
            Arc::new(move |_facts, _engine, bindings| {
                let total = bindings["total"].as_value().unwrap().to_number().unwrap();
                totals_log.lock().unwrap().push(total);
            }),
        ))
        .unwrap();

    engine.add_fact("Product", payload(&[("price", Value::Number(10.0))])).unwrap();
    engine.add_fact("Product", payload(&[("price", Value::Number(20.0))])).unwrap();

    engine.run().unwrap();

    assert_eq!(doubled.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(*totals.lock().unwrap(), vec![30.0, 90.0]);
}

#[test]
fn max_cycles_exceeded_when_rule_keeps_creating_fresh_matches() {
    let mut engine = Engine::new(EngineConfig { max_cycles: 5, trace: false });
    engine
        .add_rule(RuleDef::new(
            "age_up",
            Cond::atom("Person").with_test(|p| p.get("age").and_then(|v| v.to_number()).unwrap_or(0.0) > 18.0),
            Arc::new(|_facts, engine, _bindings| {
                engine.add_fact("Person", payload(&[("age", Value::Int(19))])).unwrap();
            }),
        ))
        .unwrap();

    engine.add_fact("Person", payload(&[("age", Value::Int(20))])).unwrap();

    let result = engine.run();
    assert!(matches!(result, Err(RuleEngineError::MaxCyclesExceeded(5))));
}

#[test]
fn recency_tie_break_orders_by_match_recency_then_signature() {
    let mut engine = Engine::new(EngineConfig::default());
    let order: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));

    let condition = || {
        Cond::atom("Person")
            .with_var("p")
            .with_test(|p| p.get("age").and_then(|v| v.to_number()).unwrap_or(0.0) > 18.0)
    };

    for rule_name in ["age_rule_a", "age_rule_b"] {
        let log = order.clone();
        let name = rule_name.to_string();
        engine
            .add_rule(RuleDef::new(
                rule_name,
                condition(),
                Arc::new(move |facts, _engine, _bindings| {
                    let who = facts[0].get("name").and_then(|v| v.as_str().map(str::to_string)).unwrap();
                    log.lock().unwrap().push((name.clone(), who));
                }),
            ))
            .unwrap();
    }

    let alice = engine
        .add_fact("Person", payload(&[("name", "Alice".into()), ("age", Value::Int(20))]))
        .unwrap();
    let bob = engine
        .add_fact("Person", payload(&[("name", "Bob".into()), ("age", Value::Int(22))]))
        .unwrap();
    engine.update_fact(bob.id(), payload(&[("age", Value::Int(22))])).unwrap();
    let _ = alice;

    engine.run().unwrap();

    let fired = order.lock().unwrap().clone();
    assert_eq!(
        fired,
        vec![
            ("age_rule_a".to_string(), "Bob".to_string()),
            ("age_rule_b".to_string(), "Bob".to_string()),
            ("age_rule_a".to_string(), "Alice".to_string()),
            ("age_rule_b".to_string(), "Alice".to_string()),
        ]
    );
}

#[test]
fn query_filters_and_limits_working_memory() {
    let mut engine = Engine::new(EngineConfig::default());
    for age in [15, 20, 25, 30] {
        engine.add_fact("Person", payload(&[("age", Value::Int(age))])).unwrap();
    }
    let adults: Vec<_> = engine
        .query(Some("Person"))
        .filter(|p| p.get("age").and_then(|v| v.to_number()).unwrap_or(0.0) >= 20.0)
        .limit(2)
        .execute();
    assert_eq!(adults.len(), 2);
}
