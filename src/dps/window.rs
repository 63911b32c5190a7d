//! Per-source decay window.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;

use crate::combat::{CombatEvent, Origin};

/// Retention span of the window.
pub const DEFAULT_SPAN_SECS: u64 = 60;

/// Zone in which the roll-up is suppressed.
pub const DEFAULT_SUPPRESSED_ZONE: &str = "The Bazaar";

/// Per-source history cap while the purge is suppressed.
pub const DEFAULT_MAX_EVENTS_PER_SOURCE: usize = 10_000;

/// Roll-up for one source over the current window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceTotals {
    pub total: u64,
    pub max_melee: u32,
    pub max_spell: u32,
    pub hits: usize,
}

impl SourceTotals {
    /// Average damage per second over `span`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn per_second(&self, span: TimeDelta) -> f64 {
        let secs = span.num_seconds();
        if secs <= 0 {
            return 0.0;
        }
        self.total as f64 / secs as f64
    }
}

/// Rolling damage history keyed by source name.
#[derive(Debug, Clone)]
pub struct WindowAggregator {
    span: TimeDelta,
    suppressed_zone: String,
    max_events_per_source: usize,
    zone: Option<String>,
    windows: HashMap<String, VecDeque<CombatEvent>>,
    totals: BTreeMap<String, SourceTotals>,
}

impl Default for WindowAggregator {
    fn default() -> Self {
        Self::new(
            DEFAULT_SPAN_SECS,
            DEFAULT_SUPPRESSED_ZONE,
            DEFAULT_MAX_EVENTS_PER_SOURCE,
        )
    }
}

impl WindowAggregator {
    #[must_use]
    pub fn new(
        span_secs: u64,
        suppressed_zone: impl Into<String>,
        max_events_per_source: usize,
    ) -> Self {
        let span = i64::try_from(span_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        Self {
            span,
            suppressed_zone: suppressed_zone.into(),
            max_events_per_source: max_events_per_source.max(1),
            zone: None,
            windows: HashMap::new(),
            totals: BTreeMap::new(),
        }
    }

    /// Append `event` to its source's history.
    ///
    /// Only numeric melee and spell damage is admitted. Returns whether the
    /// event was kept.
    pub fn record(&mut self, event: &CombatEvent) -> bool {
        if !event.is_windowed() {
            return false;
        }
        let history = self.windows.entry(event.source.clone()).or_default();
        history.push_back(event.clone());
        if history.len() > self.max_events_per_source {
            history.pop_front();
            tracing::debug!(
                source = %event.source,
                cap = self.max_events_per_source,
                "Window history at capacity, dropped oldest event"
            );
        }
        true
    }

    /// Purge events older than the span relative to `now` and recompute totals.
    ///
    /// Does nothing while in the suppressed zone.
    pub fn advance(&mut self, now: NaiveDateTime) {
        if self.is_suppressed() {
            tracing::trace!(zone = ?self.zone, "Window roll-up suppressed");
            return;
        }

        let span = self.span;
        for history in self.windows.values_mut() {
            history.retain(|e| now - e.timestamp <= span);
        }
        self.windows.retain(|_, history| !history.is_empty());

        self.totals = self
            .windows
            .iter()
            .map(|(source, history)| (source.clone(), Self::roll_up(history)))
            .collect();
    }

    fn roll_up(history: &VecDeque<CombatEvent>) -> SourceTotals {
        let mut totals = SourceTotals::default();
        for event in history {
            let Some(value) = event.value() else {
                continue;
            };
            totals.total += u64::from(value);
            totals.hits += 1;
            if event.origin == Origin::Melee {
                totals.max_melee = totals.max_melee.max(value);
            } else {
                totals.max_spell = totals.max_spell.max(value);
            }
        }
        totals
    }

    pub fn set_zone(&mut self, zone: impl Into<String>) {
        self.zone = Some(zone.into());
    }

    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    /// Whether the current zone disables the roll-up.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.zone
            .as_deref()
            .is_some_and(|z| z.eq_ignore_ascii_case(&self.suppressed_zone))
    }

    #[must_use]
    pub fn span(&self) -> TimeDelta {
        self.span
    }

    /// Events currently held for `source`, oldest first.
    pub fn events(&self, source: &str) -> impl Iterator<Item = &CombatEvent> {
        self.windows.get(source).into_iter().flatten()
    }

    #[must_use]
    pub fn event_count(&self, source: &str) -> usize {
        self.windows.get(source).map_or(0, VecDeque::len)
    }

    /// Sources with at least one event in the window.
    #[must_use]
    pub fn sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = self.windows.keys().map(String::as_str).collect();
        sources.sort_unstable();
        sources
    }

    /// Totals as of the last [`advance`](Self::advance), keyed by source.
    #[must_use]
    pub fn totals(&self) -> &BTreeMap<String, SourceTotals> {
        &self.totals
    }
}
