//! Configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dps::{
    WindowAggregator, DEFAULT_MAX_EVENTS_PER_SOURCE, DEFAULT_SPAN_SECS, DEFAULT_SUPPRESSED_ZONE,
};
use crate::queue::{OverflowPolicy, DEFAULT_CAPACITY, DEFAULT_DRAIN_PER_TICK};
use crate::reporter::{BattleReporter, RemovalPolicy, DEFAULT_BATTLE_TIMEOUT_SECS};

/// Top-level tracker configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub tail: TailConfig,
    pub window: WindowConfig,
    pub battle: BattleConfig,
    pub queue: QueueConfig,
}

/// Log tailing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailConfig {
    /// Delay between polls of the log file.
    pub poll_interval_ms: u64,
    /// Read the whole file instead of seeking to its end on attach.
    pub from_start: bool,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 250,
            from_start: false,
        }
    }
}

impl TailConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Decay window settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub span_secs: u64,
    /// Zone in which the roll-up is skipped.
    pub suppressed_zone: String,
    pub max_events_per_source: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            span_secs: DEFAULT_SPAN_SECS,
            suppressed_zone: DEFAULT_SUPPRESSED_ZONE.to_string(),
            max_events_per_source: DEFAULT_MAX_EVENTS_PER_SOURCE,
        }
    }
}

impl WindowConfig {
    #[must_use]
    pub fn aggregator(&self) -> WindowAggregator {
        WindowAggregator::new(
            self.span_secs,
            self.suppressed_zone.clone(),
            self.max_events_per_source,
        )
    }
}

/// Battle grouping settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Inactivity after which a battle closes.
    pub timeout_secs: u64,
    pub removal: RemovalPolicy,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_BATTLE_TIMEOUT_SECS,
            removal: RemovalPolicy::default(),
        }
    }
}

impl BattleConfig {
    #[must_use]
    pub fn reporter(&self) -> BattleReporter {
        BattleReporter::new(self.timeout_secs, self.removal)
    }
}

/// Consumer queue settings for the `watch` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub capacity: usize,
    /// Most items drained per tick.
    pub drain_per_tick: usize,
    pub tick_ms: u64,
    pub overflow: OverflowPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            drain_per_tick: DEFAULT_DRAIN_PER_TICK,
            tick_ms: 16,
            overflow: OverflowPolicy::default(),
        }
    }
}

impl QueueConfig {
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.tail.poll_interval(), Duration::from_millis(250));
        assert!(!config.tail.from_start);
        assert_eq!(config.window.span_secs, 60);
        assert_eq!(config.window.suppressed_zone, "The Bazaar");
        assert_eq!(config.battle.timeout_secs, 60);
        assert_eq!(config.battle.removal, RemovalPolicy::Oldest);
        assert_eq!(config.queue.capacity, 10_000);
        assert_eq!(config.queue.drain_per_tick, 60);
        assert_eq!(config.queue.overflow, OverflowPolicy::Block);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_str = r#"
            [battle]
            removal = "matched"

            [queue]
            overflow = "drop_oldest"
            capacity = 500
        "#;

        let config: TrackerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.battle.removal, RemovalPolicy::Matched);
        assert_eq!(config.battle.timeout_secs, 60);
        assert_eq!(config.queue.overflow, OverflowPolicy::DropOldest);
        assert_eq!(config.queue.capacity, 500);
        assert_eq!(config.queue.drain_per_tick, 60);
        assert_eq!(config.tail, TailConfig::default());
    }

    #[test]
    fn test_zero_intervals_clamped() {
        let tail = TailConfig {
            poll_interval_ms: 0,
            from_start: true,
        };
        assert_eq!(tail.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_builders_use_settings() {
        let config: TrackerConfig = toml::from_str(
            r#"
            [window]
            suppressed_zone = "Plane of Knowledge"

            [battle]
            removal = "matched"
            "#,
        )
        .unwrap();
        let mut window = config.window.aggregator();
        window.set_zone("Plane of Knowledge");
        assert!(window.is_suppressed());
        assert_eq!(
            config.battle.reporter().removal_policy(),
            RemovalPolicy::Matched
        );
    }
}
