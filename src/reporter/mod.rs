//! Battle reporter.
//!
//! Groups attacks, casts and deaths by target into battles with a roster of
//! participating mobs, for kill and death reporting.

mod battle;
mod error;
mod ledger;

pub use battle::{
    ActorId, Attack, AttackResult, AttackSummary, Battle, BattleState, Cast, CastResult,
    CloseReason, Mob,
};
pub use error::ReportError;
pub use ledger::{BattleReporter, RemovalPolicy, DEFAULT_BATTLE_TIMEOUT_SECS};
