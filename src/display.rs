//! Colored CLI display utilities for tracker output.
//!
//! Every `print_*` function has a `json` switch: colored text for humans or
//! one JSON object per line for piping.

use std::io::{self, Write};

use chrono::NaiveDateTime;
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::combat::{Category, CombatEvent, Direction};
use crate::dps::WindowAggregator;
use crate::loot::CurrencyEvent;
use crate::reporter::{Battle, BattleReporter, CloseReason};
use crate::watcher::ReplayStats;

/// Maximum length for actor names in text output.
const MAX_NAME_LEN: usize = 32;

/// Truncate a string to `max_len` characters, adding an ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

fn clock(at: NaiveDateTime) -> String {
    at.format("%H:%M:%S").to_string()
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "Failed to serialize output"),
    }
    let _ = io::stdout().flush();
}

/// Short tag for an event category.
#[must_use]
pub fn category_tag(category: Category) -> &'static str {
    match category {
        Category::MeleeCritOut
        | Category::MeleeCritIn
        | Category::SpellCritOut
        | Category::SpellCritIn => "[CRIT]",
        Category::HealCritOut | Category::HealCritIn => "[HEAL CRIT]",
        Category::MeleeHitOut | Category::MeleeHitIn => "[MELEE]",
        Category::SpellHitOut | Category::SpellHitIn => "[SPELL]",
        Category::MeleeMissOut
        | Category::MeleeMissIn
        | Category::SpellMissOut
        | Category::SpellMissIn => "[MISS]",
        Category::HealHitOut | Category::HealHitIn => "[HEAL]",
        Category::RuneHitOut | Category::RuneHitIn => "[RUNE]",
        Category::TotalDamageOut
        | Category::TotalDamageIn
        | Category::TotalHealOut
        | Category::TotalHealIn => "[TOTAL]",
    }
}

/// Plain-text body of an event line, without tag or colors.
#[must_use]
pub fn format_event(event: &CombatEvent) -> String {
    let mut line = format!(
        "{} {} {} {}",
        truncate(&event.source, MAX_NAME_LEN),
        event.verb,
        truncate(&event.target, MAX_NAME_LEN),
        event.amount
    );
    if let Some(spell) = &event.spell_name {
        line.push_str(&format!(" ({spell})"));
    }
    line
}

/// Print one combat event.
pub fn print_event(event: &CombatEvent, json: bool) {
    if json {
        print_json(event);
        return;
    }

    let tag = category_tag(event.category);
    let tag = match event.category {
        c if c.is_crit() => tag.red().bold().to_string(),
        c if c.is_miss() => tag.dimmed().to_string(),
        Category::HealHitOut | Category::HealHitIn | Category::RuneHitOut | Category::RuneHitIn => {
            tag.green().bold().to_string()
        }
        _ if event.direction() == Direction::In => tag.yellow().bold().to_string(),
        _ => tag.blue().bold().to_string(),
    };
    println!(
        "{} {} {}",
        clock(event.timestamp).dimmed(),
        tag,
        format_event(event)
    );
    let _ = io::stdout().flush();
}

/// Print a currency gain.
pub fn print_currency(gain: &CurrencyEvent, json: bool) {
    if json {
        print_json(gain);
        return;
    }
    println!(
        "{} {} {}",
        clock(gain.timestamp).dimmed(),
        "[LOOT]".yellow().bold(),
        gain.coins.to_string().yellow()
    );
    let _ = io::stdout().flush();
}

/// Print a zone change.
pub fn print_zone(at: NaiveDateTime, zone: &str, json: bool) {
    if json {
        print_json(&serde_json::json!({ "timestamp": at, "zone": zone }));
        return;
    }
    println!(
        "{} {} {}",
        clock(at).dimmed(),
        "[ZONE]".magenta().bold(),
        zone.cyan()
    );
    let _ = io::stdout().flush();
}

/// One-line summary of a battle, without colors.
#[must_use]
pub fn format_battle(battle: &Battle) -> String {
    let outcome = match (battle.close_reason, &battle.killer) {
        (Some(CloseReason::Death), Some(killer)) => format!("killed by {}", killer.name),
        (Some(CloseReason::Death), None) => "died".to_string(),
        (Some(CloseReason::Timeout), _) => "timed out".to_string(),
        (None, _) => "ongoing".to_string(),
    };
    format!(
        "{} {}s {} damage={}",
        truncate(&battle.target.name, MAX_NAME_LEN),
        battle.duration().num_seconds(),
        outcome,
        battle.total_damage()
    )
}

fn print_battle(battle: &Battle) {
    let tag = if battle.close_reason.is_some() {
        "[BATTLE]".green().bold().to_string()
    } else {
        "[BATTLE]".yellow().bold().to_string()
    };
    println!("{} {}", tag, format_battle(battle));
    for summary in battle.summaries() {
        println!(
            "    {} hits={} crits={} damage={}",
            truncate(&summary.source_name, MAX_NAME_LEN).cyan(),
            summary.total_hits,
            summary.total_crits,
            summary.total_damage
        );
    }
}

#[derive(Serialize)]
struct Report<'a> {
    finished: &'a [Battle],
    ongoing: &'a [Battle],
    totals: &'a std::collections::BTreeMap<String, crate::dps::SourceTotals>,
}

/// Print finished and ongoing battles followed by the current DPS roll-up.
pub fn print_report(reporter: &BattleReporter, window: &WindowAggregator, json: bool) {
    if json {
        print_json(&Report {
            finished: reporter.finished(),
            ongoing: reporter.ongoing(),
            totals: window.totals(),
        });
        return;
    }

    for battle in reporter.finished().iter().chain(reporter.ongoing()) {
        print_battle(battle);
    }
    for (source, totals) in window.totals() {
        println!(
            "{} {} total={} dps={:.1} max_melee={} max_spell={}",
            "[DPS]".blue().bold(),
            truncate(source, MAX_NAME_LEN).cyan(),
            totals.total,
            totals.per_second(window.span()),
            totals.max_melee,
            totals.max_spell
        );
    }
    let _ = io::stdout().flush();
}

/// Print replay counters.
pub fn print_replay_stats(stats: &ReplayStats, json: bool) {
    if json {
        print_json(stats);
        return;
    }
    println!(
        "{} lines={} stamped={} zones={}",
        "[REPLAY]".blue().bold(),
        stats.lines,
        stats.stamped,
        stats.zones
    );
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message.red());
}
