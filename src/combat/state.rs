//! Pending critical-hit correlation slots.
//!
//! Crit announcements arrive on their own line just before the numeric hit
//! line. Each kind gets a single slot; a newer announcement of the same kind
//! overwrites an unconsumed older one.

use serde::Serialize;

/// A spell crit announcement: amount plus the spell that critted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingSpellCrit {
    pub amount: u32,
    pub spell_name: String,
}

/// Another player's exceptional heal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingHealerCrit {
    pub healer: String,
    pub amount: u32,
}

/// Correlation state owned by one classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorrelationState {
    melee_crit: Option<u32>,
    spell_crit: Option<PendingSpellCrit>,
    heal_crit: Option<u32>,
    cast_spell: Option<String>,
    other_healer_crit: Option<PendingHealerCrit>,
}

impl CorrelationState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn overwrite<T: std::fmt::Debug>(slot: &mut Option<T>, value: T, kind: &'static str) {
        if let Some(previous) = slot.as_ref() {
            tracing::debug!(kind, ?previous, replacement = ?value, "Overwriting unconsumed pending crit");
        }
        *slot = Some(value);
    }

    pub fn arm_melee_crit(&mut self, amount: u32) {
        Self::overwrite(&mut self.melee_crit, amount, "melee");
    }

    pub fn arm_spell_crit(&mut self, amount: u32, spell_name: impl Into<String>) {
        let pending = PendingSpellCrit {
            amount,
            spell_name: spell_name.into(),
        };
        Self::overwrite(&mut self.spell_crit, pending, "spell");
    }

    pub fn arm_heal_crit(&mut self, amount: u32) {
        Self::overwrite(&mut self.heal_crit, amount, "heal");
    }

    pub fn arm_other_healer_crit(&mut self, healer: impl Into<String>, amount: u32) {
        let pending = PendingHealerCrit {
            healer: healer.into(),
            amount,
        };
        Self::overwrite(&mut self.other_healer_crit, pending, "other_heal");
    }

    pub fn begin_cast(&mut self, spell_name: impl Into<String>) {
        self.cast_spell = Some(spell_name.into());
    }

    /// Consume the pending melee crit if `amount` is at least the announced value.
    pub fn take_melee_crit_at_least(&mut self, amount: u32) -> bool {
        match self.melee_crit {
            Some(pending) if pending > 0 && amount >= pending => {
                self.melee_crit = None;
                true
            }
            _ => false,
        }
    }

    /// Consume the pending melee crit if `amount` equals the announced value.
    pub fn take_melee_crit_exact(&mut self, amount: u32) -> bool {
        match self.melee_crit {
            Some(pending) if pending > 0 && amount == pending => {
                self.melee_crit = None;
                true
            }
            _ => false,
        }
    }

    /// Consume the pending spell crit if `amount` equals the announced value.
    pub fn take_spell_crit(&mut self, amount: u32) -> bool {
        if self.spell_crit.as_ref().is_some_and(|p| p.amount == amount) {
            self.spell_crit = None;
            true
        } else {
            false
        }
    }

    /// Consume the pending heal crit if `amount` equals the announced value.
    pub fn take_heal_crit(&mut self, amount: u32) -> bool {
        match self.heal_crit {
            Some(pending) if pending > 0 && amount == pending => {
                self.heal_crit = None;
                true
            }
            _ => false,
        }
    }

    /// Consume another healer's crit if both the healer and the amount match.
    pub fn take_other_healer_crit(&mut self, healer: &str, amount: u32) -> bool {
        if self
            .other_healer_crit
            .as_ref()
            .is_some_and(|p| p.healer == healer && p.amount == amount)
        {
            self.other_healer_crit = None;
            true
        } else {
            false
        }
    }

    /// Take the spell currently being cast, leaving the slot empty.
    pub fn take_cast(&mut self) -> Option<String> {
        self.cast_spell.take()
    }

    #[must_use]
    pub fn melee_crit(&self) -> Option<u32> {
        self.melee_crit
    }

    #[must_use]
    pub fn spell_crit(&self) -> Option<&PendingSpellCrit> {
        self.spell_crit.as_ref()
    }

    #[must_use]
    pub fn heal_crit(&self) -> Option<u32> {
        self.heal_crit
    }

    #[must_use]
    pub fn cast_spell(&self) -> Option<&str> {
        self.cast_spell.as_deref()
    }

    #[must_use]
    pub fn other_healer_crit(&self) -> Option<&PendingHealerCrit> {
        self.other_healer_crit.as_ref()
    }

    /// Clear every slot.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
