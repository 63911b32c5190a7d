//! Combat module tests.

mod classifier_test;
mod engine_test;

/// Verify the public combat types are exported from the library.
#[test]
fn test_all_combat_types_exported() {
    use eqlog_tracker::combat::{
        Amount, Category, Classification, Classifier, CombatEngine, CorrelationState, Direction,
        EngineStats, MissOutcome, Origin, ParseSkip, PendingKind, RuleKind, ATTACK_VERBS,
    };

    let _ = Classifier::new("Bob");
    let _ = CombatEngine::new("Bob");
    let _ = CorrelationState::new();
    let _ = EngineStats::default();
    assert!(ATTACK_VERBS.contains(&"slash"));

    let _ = Amount::Value(1);
    let _ = Amount::Outcome(MissOutcome::Riposte);
    let _ = Origin::Dot;
    let _ = PendingKind::SpellCrit;
    let _: fn() -> ParseSkip = || ParseSkip::Unmatched;
    let _: fn(String) -> Classification = Classification::CastBegun;
    assert_eq!(Category::MeleeHitOut.direction(), Direction::Out);
    assert_eq!(RuleKind::MeleeHit.as_str(), "melee_hit");
}
