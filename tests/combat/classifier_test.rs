//! Integration tests for the classifier.

use chrono::{NaiveDate, NaiveDateTime};
use eqlog_tracker::combat::{
    Amount, Category, Classification, Classifier, MissOutcome, ParseSkip, PendingKind, RuleKind,
};
use eqlog_tracker::loot::CurrencySource;

fn at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(21, 0, 0)
        .unwrap()
}

#[test]
fn classifier_player_perspective_rewrites() {
    let mut classifier = Classifier::new("Shin");

    let Ok(Classification::Event(out)) =
        classifier.classify("You pierce an orc pawn for 18 points of damage.", at())
    else {
        panic!("expected event");
    };
    assert_eq!(out.source, "Shin");
    assert_eq!(out.category, Category::MeleeHitOut);

    let Ok(Classification::Event(incoming)) =
        classifier.classify("An orc pawn hits YOU for 9 points of damage.", at())
    else {
        panic!("expected event");
    };
    assert_eq!(incoming.target, "Shin");
    assert_eq!(incoming.category, Category::MeleeHitIn);
}

#[test]
fn classifier_miss_outcomes() {
    let cases = [
        ("You try to bash an orc pawn, but an orc pawn blocks!", MissOutcome::Block),
        ("You try to bash an orc pawn, but miss!", MissOutcome::Other("miss".to_string())),
        ("You try to bash an orc pawn, but an orc pawn ripostes!", MissOutcome::Riposte),
    ];
    for (line, outcome) in cases {
        let mut classifier = Classifier::new("Shin");
        match classifier.classify(line, at()) {
            Ok(Classification::Event(event)) => {
                assert_eq!(event.category, Category::MeleeMissOut, "{line}");
                assert_eq!(event.amount, Amount::Outcome(outcome), "{line}");
            }
            other => panic!("unexpected {other:?} for {line}"),
        }
    }

    let mut classifier = Classifier::new("Shin");
    match classifier.classify("An orc pawn tries to hit Alice, but misses!", at()) {
        Ok(Classification::Event(event)) => {
            assert_eq!(event.source, "An orc pawn");
            assert_eq!(event.target, "Alice");
            assert_eq!(event.category, Category::MeleeMissIn);
            assert_eq!(event.amount, Amount::Outcome(MissOutcome::Miss));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn classifier_crit_announcement_then_hit() {
    let mut classifier = Classifier::new("Shin");
    assert_eq!(
        classifier.classify("Shin scores a critical hit! (88)", at()),
        Ok(Classification::Armed(PendingKind::MeleeCrit))
    );
    match classifier.classify("You pierce an orc pawn for 88 points of damage.", at()) {
        Ok(Classification::Event(event)) => assert_eq!(event.category, Category::MeleeCritOut),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(classifier.state().melee_crit(), None);
}

#[test]
fn classifier_set_player_clears_pending_state() {
    let mut classifier = Classifier::new("Shin");
    classifier
        .classify("You deliver a critical blast! (300) (Lightning Bolt)", at())
        .unwrap();
    assert!(classifier.state().spell_crit().is_some());

    classifier.set_player("Bob");
    assert_eq!(classifier.player(), "Bob");
    assert!(classifier.state().spell_crit().is_none());
}

#[test]
fn classifier_currency_lines() {
    let mut classifier = Classifier::new("Shin");

    match classifier.classify(
        "You receive 1 platinum, 2 gold and 3 copper from the corpse.",
        at(),
    ) {
        Ok(Classification::Currency(gain)) => {
            assert_eq!(gain.source, CurrencySource::Corpse);
            assert_eq!(gain.coins.total_copper(), 1203);
        }
        other => panic!("unexpected {other:?}"),
    }

    match classifier.classify(
        "You receive 4 silver from Merchant Ilya for the Rusty Dagger.",
        at(),
    ) {
        Ok(Classification::Currency(gain)) => {
            assert_eq!(
                gain.source,
                CurrencySource::Merchant {
                    merchant: "Merchant Ilya".to_string(),
                    item: "the Rusty Dagger".to_string(),
                }
            );
            assert_eq!(gain.coins.silver, 4);
        }
        other => panic!("unexpected {other:?}"),
    }

    match classifier.classify("You have received 250 favor for your tribute!", at()) {
        Ok(Classification::Currency(gain)) => {
            assert_eq!(gain.source, CurrencySource::Tribute);
            assert_eq!(gain.coins.favor, 250);
            assert_eq!(gain.coins.total_copper(), 0);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn classifier_deaths() {
    let mut classifier = Classifier::new("Shin");
    match classifier.classify("You have slain an orc pawn!", at()) {
        Ok(Classification::Death(death)) => {
            assert_eq!(death.target, "an orc pawn");
            assert_eq!(death.killer, "Shin");
        }
        other => panic!("unexpected {other:?}"),
    }
    match classifier.classify("You have been slain by an orc centurion!", at()) {
        Ok(Classification::Death(death)) => {
            assert_eq!(death.target, "Shin");
            assert_eq!(death.killer, "an orc centurion");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn classifier_skips_chatter() {
    let mut classifier = Classifier::new("Shin");
    for line in [
        "Shin says, 'hail'",
        "You feel yourself starting to levitate.",
        "Welcome to EverQuest!",
    ] {
        assert_eq!(classifier.classify(line, at()), Err(ParseSkip::Unmatched), "{line}");
    }
}

#[test]
fn classifier_custom_rule_table() {
    let rules: Vec<_> = Classifier::default_rules()
        .into_iter()
        .filter(|r| r.kind() != RuleKind::Heal)
        .collect();
    let mut classifier = Classifier::with_rules("Shin", rules);
    let line = "Alice has healed Shin for 100 points of damage.";
    assert_eq!(classifier.matching_rules(line), vec![RuleKind::MeleeHit]);
    assert!(matches!(
        classifier.classify(line, at()),
        Err(ParseSkip::UnknownVerb { .. })
    ));
}
