//! Classification skip reasons.

use super::classifier::RuleKind;

/// Why a line produced nothing.
///
/// These are never fatal; the engine logs them and moves on to the next line.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseSkip {
    /// No rule in the cascade matched the line.
    #[error("No pattern matched")]
    Unmatched,

    /// A numeric field could not be parsed.
    #[error("Invalid amount {value:?} for {rule}")]
    InvalidAmount { rule: RuleKind, value: String },

    /// A damage/miss chunk contained no known attack verb.
    #[error("No attack verb in {chunk:?} for {rule}")]
    UnknownVerb { rule: RuleKind, chunk: String },

    /// Source or target came out empty.
    #[error("Empty actor name for {rule}")]
    EmptyActor { rule: RuleKind },

    /// A crit announcement for someone other than the tracked player.
    #[error("Announcement by {actor:?} is not for the tracked player ({rule})")]
    NotPlayer { rule: RuleKind, actor: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_display() {
        assert_eq!(ParseSkip::Unmatched.to_string(), "No pattern matched");
    }

    #[test]
    fn test_invalid_amount_display() {
        let skip = ParseSkip::InvalidAmount {
            rule: RuleKind::MeleeHit,
            value: "abc".to_string(),
        };
        assert_eq!(skip.to_string(), "Invalid amount \"abc\" for melee_hit");
    }

    #[test]
    fn test_not_player_display() {
        let skip = ParseSkip::NotPlayer {
            rule: RuleKind::MeleeCritAnnounce,
            actor: "Alice".to_string(),
        };
        assert!(skip.to_string().contains("\"Alice\""));
        assert!(skip.to_string().contains("melee_crit_announce"));
    }
}
