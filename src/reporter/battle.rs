//! Battle, mob, cast and attack records.

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;

use crate::combat::MissOutcome;

/// Result of an attempted cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CastResult {
    Success,
    Resist,
    Immune,
    Interrupted,
    Fizzle,
}

/// Result of an attempted melee attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackResult {
    Success,
    Miss,
    Parry,
    Dodge,
    Block,
    Immune,
    Riposte,
    Absorb,
    ShieldBlock,
}

impl From<&MissOutcome> for AttackResult {
    fn from(outcome: &MissOutcome) -> Self {
        match outcome {
            MissOutcome::Parry => Self::Parry,
            MissOutcome::Dodge => Self::Dodge,
            MissOutcome::Block => Self::Block,
            MissOutcome::ShieldBlock => Self::ShieldBlock,
            MissOutcome::Riposte => Self::Riposte,
            MissOutcome::Rune => Self::Absorb,
            MissOutcome::Miss | MissOutcome::Other(_) => Self::Miss,
        }
    }
}

/// An attempted cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cast {
    pub timestamp: NaiveDateTime,
    pub spell_name: String,
    pub result: CastResult,
    pub value: u32,
    pub is_crit: bool,
}

/// An attempted attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attack {
    pub timestamp: NaiveDateTime,
    pub hit_name: String,
    pub result: AttackResult,
    pub value: u32,
    pub is_crit: bool,
}

/// Identity of a battle target or participant: a name plus an optional numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ActorId {
    pub name: String,
    pub id: Option<u32>,
}

impl ActorId {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
        }
    }

    /// Whether `other` refers to the same actor. A known id must agree;
    /// names must always agree.
    #[must_use]
    pub fn matches(&self, other: &ActorId) -> bool {
        if let Some(id) = self.id {
            if other.id != Some(id) {
                return false;
            }
        }
        self.name == other.name
    }
}

/// A player or NPC that interacted with a battle target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mob {
    pub name: String,
    pub id: Option<u32>,
    pub casts: Vec<Cast>,
    pub attacks: Vec<Attack>,
}

impl Mob {
    fn new(actor: &ActorId) -> Self {
        Self {
            name: actor.name.clone(),
            id: actor.id,
            casts: Vec::new(),
            attacks: Vec::new(),
        }
    }

    fn matches(&self, actor: &ActorId) -> bool {
        ActorId {
            name: self.name.clone(),
            id: self.id,
        }
        .matches(actor)
    }

    /// Hit, crit and damage totals for this mob.
    #[must_use]
    pub fn summary(&self) -> AttackSummary {
        let mut summary = AttackSummary {
            source_name: self.name.clone(),
            ..AttackSummary::default()
        };
        let landed_attacks = self
            .attacks
            .iter()
            .filter(|a| a.result == AttackResult::Success)
            .map(|a| (a.value, a.is_crit));
        let landed_casts = self
            .casts
            .iter()
            .filter(|c| c.result == CastResult::Success)
            .map(|c| (c.value, c.is_crit));
        for (value, is_crit) in landed_attacks.chain(landed_casts) {
            summary.total_hits += 1;
            if is_crit {
                summary.total_crits += 1;
            }
            summary.total_damage += u64::from(value);
        }
        summary
    }
}

/// Per-source totals within one battle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttackSummary {
    pub source_name: String,
    pub total_hits: u32,
    pub total_crits: u32,
    pub total_damage: u64,
}

/// Why a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    Death,
    Timeout,
}

/// Lifecycle state of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleState {
    /// Opened, no cast or attack recorded yet.
    Open,
    Ongoing,
    /// Terminal.
    Closed,
}

/// All activity directed at one target between its first reference and
/// its death or inactivity timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Battle {
    pub target: ActorId,
    pub mobs: Vec<Mob>,
    pub killer: Option<ActorId>,
    pub start: NaiveDateTime,
    pub last_event: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub close_reason: Option<CloseReason>,
}

impl Battle {
    pub(crate) fn open(target: ActorId, at: NaiveDateTime) -> Self {
        Self {
            target,
            mobs: Vec::new(),
            killer: None,
            start: at,
            last_event: at,
            end: None,
            close_reason: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> BattleState {
        if self.close_reason.is_some() {
            BattleState::Closed
        } else if self.mobs.is_empty() {
            BattleState::Open
        } else {
            BattleState::Ongoing
        }
    }

    /// Time between the first and the last (or closing) event.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end.unwrap_or(self.last_event) - self.start
    }

    /// Find the mob entry for `actor`, creating it on first reference.
    pub(crate) fn mob_mut(&mut self, actor: &ActorId) -> &mut Mob {
        let index = match self.mobs.iter().position(|m| m.matches(actor)) {
            Some(index) => index,
            None => {
                self.mobs.push(Mob::new(actor));
                self.mobs.len() - 1
            }
        };
        &mut self.mobs[index]
    }

    #[must_use]
    pub fn mob(&self, name: &str) -> Option<&Mob> {
        self.mobs.iter().find(|m| m.name == name)
    }

    pub(crate) fn close_by_timeout(&mut self) {
        self.end = Some(self.last_event);
        self.close_reason = Some(CloseReason::Timeout);
    }

    pub(crate) fn close_by_death(&mut self, killer: ActorId, at: NaiveDateTime) {
        self.killer = Some(killer);
        self.last_event = at;
        self.end = Some(at);
        self.close_reason = Some(CloseReason::Death);
    }

    /// Per-source totals, in order of first appearance.
    #[must_use]
    pub fn summaries(&self) -> Vec<AttackSummary> {
        self.mobs.iter().map(Mob::summary).collect()
    }

    /// Sum of landed damage from every participant.
    #[must_use]
    pub fn total_damage(&self) -> u64 {
        self.mobs.iter().map(|m| m.summary().total_damage).sum()
    }
}
