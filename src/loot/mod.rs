//! Currency gains parsed from loot, split, merchant and tribute lines.
//!
//! Only the numbers are extracted here; how coins are shown is up to the
//! subscriber.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Where the currency came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencySource {
    Corpse,
    Split,
    Merchant { merchant: String, item: String },
    Tribute,
}

/// Coin and favor amounts from one line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coins {
    pub platinum: u32,
    pub gold: u32,
    pub silver: u32,
    pub copper: u32,
    pub favor: u32,
}

impl Coins {
    /// Value of the coins in copper pieces. Favor is not money and is excluded.
    #[must_use]
    pub fn total_copper(&self) -> u64 {
        u64::from(self.platinum) * 1000
            + u64::from(self.gold) * 100
            + u64::from(self.silver) * 10
            + u64::from(self.copper)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Parse a coin list such as `"2 platinum, 5 gold, 1 silver and 9 copper"`.
    ///
    /// Returns `None` when no known denomination was found.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut coins = Self::default();
        let mut value = 0_u32;
        for token in text.split_whitespace() {
            if let Ok(n) = token.parse::<u32>() {
                value = n;
                continue;
            }
            let word = token.trim_matches(|c: char| c == ',' || c == '.');
            let slot = match word {
                "" | "and" => continue,
                "platinum" => &mut coins.platinum,
                "gold" => &mut coins.gold,
                "silver" => &mut coins.silver,
                "copper" => &mut coins.copper,
                "favor" => &mut coins.favor,
                other => {
                    tracing::debug!(denomination = %other, "Unknown money type");
                    continue;
                }
            };
            *slot = slot.saturating_add(value);
            value = 0;
        }
        (!coins.is_empty()).then_some(coins)
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            (self.platinum, "pp"),
            (self.gold, "gp"),
            (self.silver, "sp"),
            (self.copper, "cp"),
            (self.favor, "favor"),
        ]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{n}{unit}"))
        .collect();
        f.write_str(&parts.join(" "))
    }
}

/// A currency gain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyEvent {
    pub source: CurrencySource,
    pub coins: Coins,
    pub timestamp: NaiveDateTime,
}
