//! Integration tests for battle grouping.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use eqlog_tracker::reporter::{
    Attack, AttackResult, BattleReporter, BattleState, CastResult, CloseReason, RemovalPolicy,
    ReportError,
};

fn at(secs: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(22, 0, 0)
        .unwrap()
        + TimeDelta::seconds(secs)
}

fn swing(secs: i64, value: u32, is_crit: bool) -> Attack {
    Attack {
        timestamp: at(secs),
        hit_name: "pierces".to_string(),
        result: if value > 0 {
            AttackResult::Success
        } else {
            AttackResult::Dodge
        },
        value,
        is_crit,
    }
}

#[test]
fn reporter_full_fight_summary() {
    let mut reporter = BattleReporter::default();
    reporter.on_attack("Shin", "an orc pawn", swing(0, 20, false)).unwrap();
    reporter.on_attack("Shin", "an orc pawn", swing(2, 0, false)).unwrap();
    reporter.on_attack("Bob", "an orc pawn", swing(3, 45, true)).unwrap();
    reporter
        .on_cast("Bob", "Ice Comet", CastResult::Success, 150, false, at(4))
        .unwrap();
    reporter.on_death("an orc pawn", "Shin", at(5)).unwrap();

    assert!(reporter.ongoing().iter().all(|b| b.target.name != "an orc pawn"));
    let battle = reporter
        .finished()
        .iter()
        .find(|b| b.target.name == "an orc pawn")
        .unwrap();
    assert_eq!(battle.state(), BattleState::Closed);
    assert_eq!(battle.close_reason, Some(CloseReason::Death));
    assert_eq!(battle.duration(), TimeDelta::seconds(5));

    let summaries = battle.summaries();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].source_name, "Shin");
    assert_eq!(summaries[0].total_hits, 1);
    assert_eq!(summaries[0].total_damage, 20);
    assert_eq!(summaries[1].source_name, "Bob");
    assert_eq!(summaries[1].total_crits, 1);
}

#[test]
fn reporter_matched_policy_keeps_unrelated_battles() {
    let mut reporter = BattleReporter::new(60, RemovalPolicy::Matched);
    reporter.on_attack("Shin", "an orc pawn", swing(0, 10, false)).unwrap();
    reporter.on_attack("Shin", "a bat", swing(1, 10, false)).unwrap();
    reporter.on_death("a bat", "Shin", at(2)).unwrap();

    assert_eq!(reporter.ongoing().len(), 1);
    assert_eq!(reporter.ongoing()[0].target.name, "an orc pawn");
    assert_eq!(reporter.finished()[0].target.name, "a bat");
}

#[test]
fn reporter_oldest_policy_evicts_first_battle() {
    let mut reporter = BattleReporter::new(60, RemovalPolicy::Oldest);
    reporter.on_attack("Shin", "an orc pawn", swing(0, 10, false)).unwrap();
    reporter.on_attack("Shin", "a bat", swing(1, 10, false)).unwrap();
    reporter.on_death("a bat", "Shin", at(2)).unwrap();

    assert_eq!(reporter.ongoing().len(), 1);
    assert_eq!(reporter.ongoing()[0].target.name, "a bat");
}

#[test]
fn reporter_rejects_empty_names() {
    let mut reporter = BattleReporter::default();
    assert!(matches!(
        reporter.on_attack("", "an orc pawn", swing(0, 1, false)),
        Err(ReportError::EmptyName(_))
    ));
    assert!(matches!(
        reporter.on_death("", "Shin", at(0)),
        Err(ReportError::EmptyName(_))
    ));
    assert!(reporter.ongoing().is_empty());
}
