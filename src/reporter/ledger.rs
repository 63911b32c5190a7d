//! Battle lifecycle bookkeeping.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use super::battle::{ActorId, Attack, Battle, Cast, CastResult};
use super::error::ReportError;

/// Inactivity after which a battle is closed on its next reference.
pub const DEFAULT_BATTLE_TIMEOUT_SECS: u64 = 60;

/// Which ongoing battle is removed when one is closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    /// Drop the oldest ongoing battle, whichever target it belongs to.
    /// Reproduces the historical behaviour; a stale battle for one target can
    /// evict a live battle for another.
    #[default]
    Oldest,
    /// Drop the battle that was actually closed.
    Matched,
}

/// Groups attacks, casts and deaths into battles per target.
#[derive(Debug, Clone)]
pub struct BattleReporter {
    ongoing: Vec<Battle>,
    finished: Vec<Battle>,
    timeout: TimeDelta,
    removal: RemovalPolicy,
}

impl Default for BattleReporter {
    fn default() -> Self {
        Self::new(DEFAULT_BATTLE_TIMEOUT_SECS, RemovalPolicy::default())
    }
}

impl BattleReporter {
    #[must_use]
    pub fn new(timeout_secs: u64, removal: RemovalPolicy) -> Self {
        let timeout = i64::try_from(timeout_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        Self {
            ongoing: Vec::new(),
            finished: Vec::new(),
            timeout,
            removal,
        }
    }

    #[must_use]
    pub fn ongoing(&self) -> &[Battle] {
        &self.ongoing
    }

    #[must_use]
    pub fn finished(&self) -> &[Battle] {
        &self.finished
    }

    #[must_use]
    pub fn removal_policy(&self) -> RemovalPolicy {
        self.removal
    }

    /// Record a cast by `source`.
    ///
    /// Casts carry no target, so the battle is keyed by the caster.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::EmptyName` if `source` is empty.
    pub fn on_cast(
        &mut self,
        source: &str,
        spell_name: &str,
        result: CastResult,
        value: u32,
        is_crit: bool,
        at: NaiveDateTime,
    ) -> Result<(), ReportError> {
        if source.is_empty() {
            return Err(ReportError::EmptyName("source"));
        }
        let actor = ActorId::named(source);
        let index = self.find_or_open(&actor, at);
        let battle = &mut self.ongoing[index];
        battle.last_event = at;
        battle.mob_mut(&actor).casts.push(Cast {
            timestamp: at,
            spell_name: spell_name.to_string(),
            result,
            value,
            is_crit,
        });
        Ok(())
    }

    /// Record an attack by `source` on `target`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::EmptyName` if either name is empty.
    pub fn on_attack(
        &mut self,
        source: &str,
        target: &str,
        attack: Attack,
    ) -> Result<(), ReportError> {
        if source.is_empty() {
            return Err(ReportError::EmptyName("source"));
        }
        if target.is_empty() {
            return Err(ReportError::EmptyName("target"));
        }
        let index = self.find_or_open(&ActorId::named(target), attack.timestamp);
        let battle = &mut self.ongoing[index];
        battle.last_event = attack.timestamp;
        battle.mob_mut(&ActorId::named(source)).attacks.push(attack);
        Ok(())
    }

    /// Record the death of `target` and close its battle.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::EmptyName` if `target` is empty.
    pub fn on_death(
        &mut self,
        target: &str,
        killer: &str,
        at: NaiveDateTime,
    ) -> Result<(), ReportError> {
        if target.is_empty() {
            return Err(ReportError::EmptyName("target"));
        }
        let index = self.find_or_open(&ActorId::named(target), at);
        let battle = &mut self.ongoing[index];
        battle.close_by_death(ActorId::named(killer), at);
        tracing::debug!(
            target = %battle.target.name,
            killer = %killer,
            mobs = battle.mobs.len(),
            "Battle closed by death"
        );
        self.finished.push(battle.clone());
        self.remove_ongoing(index);
        Ok(())
    }

    /// Find the live battle for `target`, closing stale matches on the way,
    /// or open a new one. Returns its index in the ongoing list.
    fn find_or_open(&mut self, target: &ActorId, at: NaiveDateTime) -> usize {
        let mut index = 0;
        while index < self.ongoing.len() {
            let battle = &self.ongoing[index];
            if !battle.target.matches(target) {
                index += 1;
                continue;
            }
            if at - battle.last_event <= self.timeout {
                return index;
            }

            let mut closed = battle.clone();
            closed.close_by_timeout();
            tracing::debug!(
                target = %closed.target.name,
                idle_secs = (at - closed.last_event).num_seconds(),
                "Battle closed by inactivity"
            );
            self.finished.push(closed);
            // Either the matched battle or one before it was removed, so the
            // next candidate now sits at `index`.
            self.remove_ongoing(index);
        }

        self.ongoing.push(Battle::open(target.clone(), at));
        self.ongoing.len() - 1
    }

    fn remove_ongoing(&mut self, matched: usize) {
        let index = match self.removal {
            RemovalPolicy::Oldest => 0,
            RemovalPolicy::Matched => matched,
        };
        let removed = self.ongoing.remove(index);
        if index != matched {
            tracing::debug!(
                evicted = %removed.target.name,
                closed = %self.ongoing[matched - 1].target.name,
                "Evicted oldest ongoing battle"
            );
        }
    }
}
