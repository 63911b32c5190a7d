//! Per-line dispatch: classify, fan out, aggregate, report.
//!
//! Subscribers are invoked synchronously, in registration order, on the
//! thread that calls [`CombatEngine::process`]. A slow subscriber delays
//! ingestion; consumers that must not block use [`crate::queue`].

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::TrackerConfig;
use crate::dps::WindowAggregator;
use crate::loot::CurrencyEvent;
use crate::reporter::{Attack, AttackResult, BattleReporter, CastResult};

use super::classifier::{Classification, Classifier};
use super::error::ParseSkip;
use super::event::{Amount, Category, CombatEvent};

/// Callback receiving every classified combat event.
pub type EventSubscriber = Box<dyn FnMut(&CombatEvent) + Send>;

/// Callback receiving every currency gain.
pub type CurrencySubscriber = Box<dyn FnMut(&CurrencyEvent) + Send>;

/// Counters over everything the engine has processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub lines: u64,
    pub events: u64,
    pub armed: u64,
    pub skipped: u64,
    pub deaths: u64,
    pub currency: u64,
}

/// Owns the classifier and every built-in consumer of its output.
pub struct CombatEngine {
    classifier: Classifier,
    window: WindowAggregator,
    reporter: BattleReporter,
    event_subscribers: Vec<EventSubscriber>,
    currency_subscribers: Vec<CurrencySubscriber>,
    stats: EngineStats,
}

impl fmt::Debug for CombatEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombatEngine")
            .field("player", &self.classifier.player())
            .field("event_subscribers", &self.event_subscribers.len())
            .field("currency_subscribers", &self.currency_subscribers.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl CombatEngine {
    /// Engine for `player` with default window and battle settings.
    #[must_use]
    pub fn new(player: impl Into<String>) -> Self {
        Self::with_parts(
            Classifier::new(player),
            WindowAggregator::default(),
            BattleReporter::default(),
        )
    }

    #[must_use]
    pub fn from_config(player: impl Into<String>, config: &TrackerConfig) -> Self {
        Self::with_parts(
            Classifier::new(player),
            config.window.aggregator(),
            config.battle.reporter(),
        )
    }

    #[must_use]
    pub fn with_parts(
        classifier: Classifier,
        window: WindowAggregator,
        reporter: BattleReporter,
    ) -> Self {
        Self {
            classifier,
            window,
            reporter,
            event_subscribers: Vec::new(),
            currency_subscribers: Vec::new(),
            stats: EngineStats::default(),
        }
    }

    pub fn subscribe_to_combat_event<F>(&mut self, subscriber: F)
    where
        F: FnMut(&CombatEvent) + Send + 'static,
    {
        self.event_subscribers.push(Box::new(subscriber));
    }

    pub fn subscribe_to_currency<F>(&mut self, subscriber: F)
    where
        F: FnMut(&CurrencyEvent) + Send + 'static,
    {
        self.currency_subscribers.push(Box::new(subscriber));
    }

    /// Process one log message stamped `at`.
    ///
    /// Returns the classification, or `None` if the line was skipped. Skips
    /// are logged, never propagated.
    pub fn process(&mut self, at: NaiveDateTime, message: &str) -> Option<Classification> {
        self.stats.lines += 1;
        let outcome = match self.classifier.classify(message, at) {
            Ok(classification) => {
                self.dispatch(&classification);
                Some(classification)
            }
            Err(skip) => {
                self.stats.skipped += 1;
                Self::log_skip(&skip, message);
                None
            }
        };
        self.window.advance(at);
        outcome
    }

    /// Record a zone change and re-run the window purge.
    pub fn on_zone(&mut self, at: NaiveDateTime, zone: &str) {
        self.window.set_zone(zone);
        self.window.advance(at);
    }

    fn log_skip(skip: &ParseSkip, message: &str) {
        match skip {
            ParseSkip::InvalidAmount { .. } => {
                tracing::debug!(line = %message, reason = %skip, "Skipping line");
            }
            _ => tracing::trace!(line = %message, reason = %skip, "Skipping line"),
        }
    }

    fn dispatch(&mut self, classification: &Classification) {
        match classification {
            Classification::Event(event) => {
                self.stats.events += 1;
                for subscriber in &mut self.event_subscribers {
                    subscriber(event);
                }
                self.window.record(event);
                self.report(event);
            }
            Classification::Armed(kind) => {
                self.stats.armed += 1;
                tracing::trace!(?kind, "Pending crit armed");
            }
            Classification::CastBegun(spell) => {
                tracing::trace!(spell = %spell, "Cast begun");
            }
            Classification::CastFailed(failed) => {
                let spell = failed.spell_name.as_deref().unwrap_or_default();
                if let Err(e) = self.reporter.on_cast(
                    &failed.caster,
                    spell,
                    failed.result,
                    0,
                    false,
                    failed.timestamp,
                ) {
                    tracing::debug!(error = %e, "Failed cast not reported");
                }
            }
            Classification::Death(death) => {
                self.stats.deaths += 1;
                if let Err(e) = self
                    .reporter
                    .on_death(&death.target, &death.killer, death.timestamp)
                {
                    tracing::debug!(error = %e, "Death not reported");
                }
            }
            Classification::Currency(gain) => {
                self.stats.currency += 1;
                for subscriber in &mut self.currency_subscribers {
                    subscriber(gain);
                }
            }
        }
    }

    /// Forward melee attacks and landed spells to the battle reporter.
    fn report(&mut self, event: &CombatEvent) {
        let is_crit = event.category.is_crit();
        let result = match event.category {
            Category::MeleeHitOut
            | Category::MeleeHitIn
            | Category::MeleeCritOut
            | Category::MeleeCritIn
            | Category::MeleeMissOut
            | Category::MeleeMissIn => {
                let result = match &event.amount {
                    Amount::Value(_) => AttackResult::Success,
                    Amount::Outcome(outcome) => AttackResult::from(outcome),
                };
                let attack = Attack {
                    timestamp: event.timestamp,
                    hit_name: event.verb.clone(),
                    result,
                    value: event.value().unwrap_or_default(),
                    is_crit,
                };
                self.reporter.on_attack(&event.source, &event.target, attack)
            }
            Category::SpellHitOut
            | Category::SpellHitIn
            | Category::SpellCritOut
            | Category::SpellCritIn => {
                let spell = event.spell_name.as_deref().unwrap_or(event.verb.as_str());
                self.reporter.on_cast(
                    &event.source,
                    spell,
                    CastResult::Success,
                    event.value().unwrap_or_default(),
                    is_crit,
                    event.timestamp,
                )
            }
            _ => return,
        };
        if let Err(e) = result {
            tracing::debug!(error = %e, event = %event, "Event not reported");
        }
    }

    #[must_use]
    pub fn player(&self) -> &str {
        self.classifier.player()
    }

    pub fn set_player(&mut self, player: impl Into<String>) {
        self.classifier.set_player(player);
    }

    #[must_use]
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    #[must_use]
    pub fn window(&self) -> &WindowAggregator {
        &self.window
    }

    #[must_use]
    pub fn reporter(&self) -> &BattleReporter {
        &self.reporter
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.stats
    }
}
