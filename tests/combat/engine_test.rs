//! Integration tests for the combat engine.

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use eqlog_tracker::combat::{Category, CombatEngine, CombatEvent};
use eqlog_tracker::config::TrackerConfig;
use eqlog_tracker::reporter::{CloseReason, RemovalPolicy};

fn at(secs: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(21, 0, 0)
        .unwrap()
        + TimeDelta::seconds(secs)
}

#[test]
fn engine_from_config_applies_settings() {
    let config: TrackerConfig = toml::from_str(
        r#"
        [window]
        span_secs = 10

        [battle]
        timeout_secs = 5
        removal = "matched"
        "#,
    )
    .unwrap();
    let mut engine = CombatEngine::from_config("Shin", &config);
    assert_eq!(engine.window().span(), TimeDelta::seconds(10));
    assert_eq!(engine.reporter().removal_policy(), RemovalPolicy::Matched);

    engine.process(at(0), "You pierce an orc pawn for 10 points of damage.");
    engine.process(at(11), "You pierce an orc pawn for 20 points of damage.");
    assert_eq!(engine.window().totals()["Shin"].total, 20);
    assert_eq!(engine.reporter().finished().len(), 1);
    assert_eq!(
        engine.reporter().finished()[0].close_reason,
        Some(CloseReason::Timeout)
    );
}

#[test]
fn engine_dispatches_events_and_currency_in_log_order() {
    let mut engine = CombatEngine::new("Shin");
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    engine.subscribe_to_combat_event(move |e: &CombatEvent| {
        sink.lock().unwrap().push(format!("event:{}", e.category));
    });
    let sink = Arc::clone(&seen);
    engine.subscribe_to_currency(move |g| {
        sink.lock().unwrap().push(format!("coin:{}", g.coins.total_copper()));
    });

    engine.process(at(0), "You pierce an orc pawn for 10 points of damage.");
    engine.process(at(1), "You receive 5 copper from the corpse.");
    engine.process(at(2), "An orc pawn hits YOU for 3 points of damage.");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert!(seen[0].starts_with("event:"));
    assert_eq!(seen[1], "coin:5");
    assert!(seen[2].starts_with("event:"));
    assert_eq!(engine.stats().events, 2);
    assert_eq!(engine.stats().currency, 1);
}

#[test]
fn engine_set_player_rekeys_perspective() {
    let mut engine = CombatEngine::new("Shin");
    engine.set_player("Bob");
    assert_eq!(engine.player(), "Bob");
    assert_eq!(engine.classifier().player(), "Bob");

    let result = engine.process(at(0), "You slash an orc pawn for 7 points of damage.");
    assert!(result.is_some());
    assert_eq!(engine.window().event_count("Bob"), 1);
    assert_eq!(engine.window().event_count("Shin"), 0);
}

#[test]
fn engine_incoming_damage_is_windowed_by_attacker() {
    let mut engine = CombatEngine::new("Shin");
    engine.process(at(0), "An orc pawn hits YOU for 3 points of damage.");
    engine.process(
        at(1),
        "Alice has healed Shin for 100 points of damage. (Healing)",
    );
    assert_eq!(engine.window().sources(), vec!["An orc pawn"]);
    assert_eq!(
        engine.window().events("An orc pawn").next().map(|e| e.category),
        Some(Category::MeleeHitIn)
    );
}
