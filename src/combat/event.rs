//! Combat event data model.
//!
//! A [`CombatEvent`] is the unit emitted to subscribers for every classified
//! hit, miss, heal or rune line.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Which way an event points relative to the tracked player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Caused by the player (or by someone else onto someone other than the player).
    Out,
    /// Landed on the player.
    In,
}

/// Closed set of event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    MeleeCritOut,
    MeleeHitOut,
    MeleeMissOut,
    MeleeCritIn,
    MeleeHitIn,
    MeleeMissIn,

    SpellCritOut,
    SpellHitOut,
    SpellMissOut,
    SpellCritIn,
    SpellHitIn,
    SpellMissIn,

    HealCritOut,
    HealHitOut,
    HealCritIn,
    HealHitIn,

    RuneHitOut,
    RuneHitIn,

    TotalDamageOut,
    TotalDamageIn,
    TotalHealOut,
    TotalHealIn,
}

impl Category {
    /// Direction of the category.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::MeleeCritOut
            | Self::MeleeHitOut
            | Self::MeleeMissOut
            | Self::SpellCritOut
            | Self::SpellHitOut
            | Self::SpellMissOut
            | Self::HealCritOut
            | Self::HealHitOut
            | Self::RuneHitOut
            | Self::TotalDamageOut
            | Self::TotalHealOut => Direction::Out,
            Self::MeleeCritIn
            | Self::MeleeHitIn
            | Self::MeleeMissIn
            | Self::SpellCritIn
            | Self::SpellHitIn
            | Self::SpellMissIn
            | Self::HealCritIn
            | Self::HealHitIn
            | Self::RuneHitIn
            | Self::TotalDamageIn
            | Self::TotalHealIn => Direction::In,
        }
    }

    #[must_use]
    pub const fn is_crit(self) -> bool {
        matches!(
            self,
            Self::MeleeCritOut
                | Self::MeleeCritIn
                | Self::SpellCritOut
                | Self::SpellCritIn
                | Self::HealCritOut
                | Self::HealCritIn
        )
    }

    #[must_use]
    pub const fn is_miss(self) -> bool {
        matches!(
            self,
            Self::MeleeMissOut | Self::MeleeMissIn | Self::SpellMissOut | Self::SpellMissIn
        )
    }

    /// Melee or spell damage (hits and crits), excluding roll-ups.
    #[must_use]
    pub const fn is_damage(self) -> bool {
        matches!(
            self,
            Self::MeleeCritOut
                | Self::MeleeHitOut
                | Self::MeleeCritIn
                | Self::MeleeHitIn
                | Self::SpellCritOut
                | Self::SpellHitOut
                | Self::SpellCritIn
                | Self::SpellHitIn
        )
    }

    /// The same category flipped to `direction`.
    #[must_use]
    pub const fn with_direction(self, direction: Direction) -> Self {
        use Direction::{In, Out};
        match (self, direction) {
            (Self::MeleeCritOut | Self::MeleeCritIn, Out) => Self::MeleeCritOut,
            (Self::MeleeCritOut | Self::MeleeCritIn, In) => Self::MeleeCritIn,
            (Self::MeleeHitOut | Self::MeleeHitIn, Out) => Self::MeleeHitOut,
            (Self::MeleeHitOut | Self::MeleeHitIn, In) => Self::MeleeHitIn,
            (Self::MeleeMissOut | Self::MeleeMissIn, Out) => Self::MeleeMissOut,
            (Self::MeleeMissOut | Self::MeleeMissIn, In) => Self::MeleeMissIn,
            (Self::SpellCritOut | Self::SpellCritIn, Out) => Self::SpellCritOut,
            (Self::SpellCritOut | Self::SpellCritIn, In) => Self::SpellCritIn,
            (Self::SpellHitOut | Self::SpellHitIn, Out) => Self::SpellHitOut,
            (Self::SpellHitOut | Self::SpellHitIn, In) => Self::SpellHitIn,
            (Self::SpellMissOut | Self::SpellMissIn, Out) => Self::SpellMissOut,
            (Self::SpellMissOut | Self::SpellMissIn, In) => Self::SpellMissIn,
            (Self::HealCritOut | Self::HealCritIn, Out) => Self::HealCritOut,
            (Self::HealCritOut | Self::HealCritIn, In) => Self::HealCritIn,
            (Self::HealHitOut | Self::HealHitIn, Out) => Self::HealHitOut,
            (Self::HealHitOut | Self::HealHitIn, In) => Self::HealHitIn,
            (Self::RuneHitOut | Self::RuneHitIn, Out) => Self::RuneHitOut,
            (Self::RuneHitOut | Self::RuneHitIn, In) => Self::RuneHitIn,
            (Self::TotalDamageOut | Self::TotalDamageIn, Out) => Self::TotalDamageOut,
            (Self::TotalDamageOut | Self::TotalDamageIn, In) => Self::TotalDamageIn,
            (Self::TotalHealOut | Self::TotalHealIn, Out) => Self::TotalHealOut,
            (Self::TotalHealOut | Self::TotalHealIn, In) => Self::TotalHealIn,
        }
    }

    /// Upgrade a hit category to its crit counterpart. Other categories are
    /// returned unchanged (runes have no crit form).
    #[must_use]
    pub const fn to_crit(self) -> Self {
        match self {
            Self::MeleeHitOut => Self::MeleeCritOut,
            Self::MeleeHitIn => Self::MeleeCritIn,
            Self::SpellHitOut => Self::SpellCritOut,
            Self::SpellHitIn => Self::SpellCritIn,
            Self::HealHitOut => Self::HealCritOut,
            Self::HealHitIn => Self::HealCritIn,
            other => other,
        }
    }

    /// Roll-up bucket this category contributes to, if any.
    ///
    /// Spell misses count toward damage totals and runes toward heal totals.
    #[must_use]
    pub const fn total(self) -> Option<Self> {
        match self {
            Self::MeleeCritOut
            | Self::MeleeHitOut
            | Self::SpellCritOut
            | Self::SpellHitOut
            | Self::SpellMissOut => Some(Self::TotalDamageOut),
            Self::MeleeCritIn
            | Self::MeleeHitIn
            | Self::SpellCritIn
            | Self::SpellHitIn
            | Self::SpellMissIn => Some(Self::TotalDamageIn),
            Self::HealCritOut | Self::HealHitOut | Self::RuneHitOut => Some(Self::TotalHealOut),
            Self::HealCritIn | Self::HealHitIn | Self::RuneHitIn => Some(Self::TotalHealIn),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MeleeCritOut => "Melee Crit Out",
            Self::MeleeHitOut => "Melee Hit Out",
            Self::MeleeMissOut => "Melee Miss Out",
            Self::MeleeCritIn => "Melee Crit In",
            Self::MeleeHitIn => "Melee Hit In",
            Self::MeleeMissIn => "Melee Miss In",
            Self::SpellCritOut => "Spell Crit Out",
            Self::SpellHitOut => "Spell Hit Out",
            Self::SpellMissOut => "Spell Miss Out",
            Self::SpellCritIn => "Spell Crit In",
            Self::SpellHitIn => "Spell Hit In",
            Self::SpellMissIn => "Spell Miss In",
            Self::HealCritOut => "Heal Crit Out",
            Self::HealHitOut => "Heal Hit Out",
            Self::HealCritIn => "Heal Crit In",
            Self::HealHitIn => "Heal Hit In",
            Self::RuneHitOut => "Rune Hit Out",
            Self::RuneHitIn => "Rune Hit In",
            Self::TotalDamageOut => "Total Damage Out",
            Self::TotalDamageIn => "Total Damage In",
            Self::TotalHealOut => "Total Heal Out",
            Self::TotalHealIn => "Total Heal In",
        };
        f.write_str(name)
    }
}

/// Symbolic outcome of an attack that did no damage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissOutcome {
    Miss,
    Parry,
    Dodge,
    Block,
    ShieldBlock,
    Riposte,
    Rune,
    /// Unrecognised trailing text, passed through verbatim.
    Other(String),
}

impl MissOutcome {
    /// Classify the trailing text of a miss line (`"misses"`, `"YOU parry"`, ...).
    ///
    /// `"shield block"` is checked before `"block"` so it is reachable.
    #[must_use]
    pub fn classify(text: &str) -> Self {
        let text = text.trim();
        if text == "misses" {
            return Self::Miss;
        }
        let lower = text.to_ascii_lowercase();
        if lower.contains("parry") {
            Self::Parry
        } else if lower.contains("dodge") {
            Self::Dodge
        } else if lower.contains("shield block") {
            Self::ShieldBlock
        } else if lower.contains("block") {
            Self::Block
        } else if lower.contains("riposte") {
            Self::Riposte
        } else if lower.contains("absorb") {
            Self::Rune
        } else {
            Self::Other(text.replace("YOU ", ""))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Miss => "miss",
            Self::Parry => "parry",
            Self::Dodge => "dodge",
            Self::Block => "block",
            Self::ShieldBlock => "shield block",
            Self::Riposte => "riposte",
            Self::Rune => "rune",
            Self::Other(text) => text,
        }
    }
}

impl fmt::Display for MissOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Magnitude of an event: a number, or a symbolic miss outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Amount {
    Value(u32),
    Outcome(MissOutcome),
}

impl Amount {
    #[must_use]
    pub fn value(&self) -> Option<u32> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Outcome(_) => None,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Outcome(outcome) => write!(f, "{outcome}"),
        }
    }
}

/// Where the damage or healing came from. Decides the aggregation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Melee,
    Spell,
    Heal,
    Direct,
    Dot,
}

/// One classified combat log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatEvent {
    pub category: Category,
    pub source: String,
    pub target: String,
    pub spell_name: Option<String>,
    /// Verb or kind of the hit (`"slashes"`, `"frenzy"`, `"hit"`, `"heal"`).
    pub verb: String,
    pub amount: Amount,
    pub origin: Origin,
    /// Time embedded in the log line.
    pub timestamp: NaiveDateTime,
}

impl CombatEvent {
    /// Numeric magnitude, if the event carries one.
    #[must_use]
    pub fn value(&self) -> Option<u32> {
        self.amount.value()
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.category.direction()
    }

    /// Whether the event belongs in the decay window: numeric melee or spell damage.
    #[must_use]
    pub fn is_windowed(&self) -> bool {
        self.category.is_damage() && self.value().is_some()
    }
}

impl fmt::Display for CombatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} -> {} {} {}",
            self.category, self.source, self.target, self.verb, self.amount
        )?;
        if let Some(spell) = &self.spell_name {
            write!(f, " ({spell})")?;
        }
        Ok(())
    }
}
