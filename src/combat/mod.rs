//! Combat log classification.
//!
//! Turns log messages into [`CombatEvent`]s using an ordered rule table and
//! a small amount of correlation state for crit announcements, then fans the
//! result out through a [`CombatEngine`].

mod classifier;
mod engine;
mod error;
mod event;
mod state;

pub use classifier::{
    Classification, Classifier, Death, FailedCast, PendingKind, Rule, RuleKind, ATTACK_VERBS,
};
pub use engine::{CombatEngine, CurrencySubscriber, EngineStats, EventSubscriber};
pub use error::ParseSkip;
pub use event::{Amount, Category, CombatEvent, Direction, MissOutcome, Origin};
pub use state::{CorrelationState, PendingHealerCrit, PendingSpellCrit};
