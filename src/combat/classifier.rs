//! Ordered rule cascade for combat log messages.
//!
//! Every message is matched against the rule table top to bottom and the
//! first rule whose pattern matches decides the outcome, even if its handler
//! then skips the line. Specific shapes therefore sit above generic ones:
//! crit announcements and frenzy before plain melee damage, heals before the
//! catch-all `"... for N points of damage."` rule.

use std::fmt;

use chrono::NaiveDateTime;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::loot::{Coins, CurrencyEvent, CurrencySource};
use crate::reporter::CastResult;

use super::error::ParseSkip;
use super::event::{Amount, Category, CombatEvent, Direction, MissOutcome, Origin};
use super::state::CorrelationState;

/// Verbs that separate attacker from defender in melee lines.
pub const ATTACK_VERBS: &[&str] = &[
    "mauls", "maul", "bites", "bite", "claws", "claw", "gores", "gore", "stings", "slices",
    "slice", "sting", "smashes", "smash", "rend", "rends", "slash", "slashes", "punch",
    "punches", "hit", "hits", "crush", "crushes", "pierce", "pierces", "kick", "kicks",
    "strike", "strikes", "backstab", "backstabs", "bash", "bashes",
];

/// Identifies one entry of the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    SpellCritAnnounce,
    HealCritAnnounce,
    OtherHealCritAnnounce,
    MeleeCritAnnounce,
    HolyBladeAnnounce,
    CleavingBlowAnnounce,
    Frenzy,
    SpellHit,
    DotSelf,
    DotOther,
    Heal,
    Rune,
    MeleeHit,
    MyMeleeMiss,
    MeleeMiss,
    CastBegin,
    CastInterrupted,
    CastFizzle,
    Death,
    SlainBy,
    Slain,
    LootCorpse,
    LootSplit,
    LootMerchant,
    Tribute,
}

impl RuleKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SpellCritAnnounce => "spell_crit_announce",
            Self::HealCritAnnounce => "heal_crit_announce",
            Self::OtherHealCritAnnounce => "other_heal_crit_announce",
            Self::MeleeCritAnnounce => "melee_crit_announce",
            Self::HolyBladeAnnounce => "holy_blade_announce",
            Self::CleavingBlowAnnounce => "cleaving_blow_announce",
            Self::Frenzy => "frenzy",
            Self::SpellHit => "spell_hit",
            Self::DotSelf => "dot_self",
            Self::DotOther => "dot_other",
            Self::Heal => "heal",
            Self::Rune => "rune",
            Self::MeleeHit => "melee_hit",
            Self::MyMeleeMiss => "my_melee_miss",
            Self::MeleeMiss => "melee_miss",
            Self::CastBegin => "cast_begin",
            Self::CastInterrupted => "cast_interrupted",
            Self::CastFizzle => "cast_fizzle",
            Self::Death => "death",
            Self::SlainBy => "slain_by",
            Self::Slain => "slain",
            Self::LootCorpse => "loot_corpse",
            Self::LootSplit => "loot_split",
            Self::LootMerchant => "loot_merchant",
            Self::Tribute => "tribute",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which correlation slot an announcement armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingKind {
    MeleeCrit,
    SpellCrit,
    HealCrit,
    OtherHealerCrit,
}

/// A death line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Death {
    pub target: String,
    pub killer: String,
    pub timestamp: NaiveDateTime,
}

/// A cast by the player that did not land.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCast {
    pub caster: String,
    pub spell_name: Option<String>,
    pub result: CastResult,
    pub timestamp: NaiveDateTime,
}

/// What a matched message turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Event(CombatEvent),
    /// A crit announcement was stored for correlation.
    Armed(PendingKind),
    CastBegun(String),
    CastFailed(FailedCast),
    Death(Death),
    Currency(CurrencyEvent),
}

pub(crate) type Handler =
    fn(&mut Context, &Captures<'_>, NaiveDateTime) -> Result<Classification, ParseSkip>;

/// One `{pattern, handler}` entry of the cascade.
#[derive(Clone)]
pub struct Rule {
    kind: RuleKind,
    pattern: Regex,
    handler: Handler,
}

impl Rule {
    /// Create a rule.
    ///
    /// # Errors
    ///
    /// Returns the regex error if `pattern` does not compile.
    pub(crate) fn new(
        kind: RuleKind,
        pattern: &str,
        handler: Handler,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            kind,
            pattern: Regex::new(pattern)?,
            handler,
        })
    }

    #[must_use]
    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    #[must_use]
    pub fn matches(&self, message: &str) -> bool {
        self.pattern.is_match(message)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("kind", &self.kind)
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// Player identity plus correlation slots, handed to every handler.
#[derive(Debug, Clone)]
pub(crate) struct Context {
    player: String,
    state: CorrelationState,
}

impl Context {
    fn is_you(name: &str) -> bool {
        name.eq_ignore_ascii_case("you") || name.eq_ignore_ascii_case("yourself")
    }

    fn is_reflexive(name: &str) -> bool {
        ["itself", "himself", "herself"]
            .iter()
            .any(|r| name.eq_ignore_ascii_case(r))
    }

    /// Map second-person pronouns to the player name.
    fn normalize(&self, name: &str) -> String {
        if Self::is_you(name) {
            self.player.clone()
        } else {
            name.to_string()
        }
    }

    fn is_player(&self, name: &str) -> bool {
        name == self.player || Self::is_you(name)
    }
}

fn cap<'h>(caps: &Captures<'h>, index: usize) -> &'h str {
    caps.get(index).map_or("", |m| m.as_str().trim())
}

fn opt_cap(caps: &Captures<'_>, index: usize) -> Option<String> {
    caps.get(index)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn amount(rule: RuleKind, caps: &Captures<'_>, index: usize) -> Result<u32, ParseSkip> {
    let raw = cap(caps, index);
    raw.parse::<u32>().map_err(|_| ParseSkip::InvalidAmount {
        rule,
        value: raw.to_string(),
    })
}

fn require(rule: RuleKind, name: &str) -> Result<(), ParseSkip> {
    if name.is_empty() {
        Err(ParseSkip::EmptyActor { rule })
    } else {
        Ok(())
    }
}

/// Split `"<source> <verb> <target>"` on the first known attack verb.
fn split_on_verb(chunk: &str) -> Option<(String, &str, String)> {
    let words: Vec<&str> = chunk.split(' ').collect();
    let index = words.iter().position(|w| ATTACK_VERBS.contains(w))?;
    let source = words[..index].join(" ").trim().to_string();
    let target = words[index + 1..].join(" ").trim().to_string();
    Some((source, words[index], target))
}

// --- crit announcements -------------------------------------------------

fn on_spell_crit(
    ctx: &mut Context,
    caps: &Captures<'_>,
    _at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    let value = amount(RuleKind::SpellCritAnnounce, caps, 1)?;
    ctx.state
        .arm_spell_crit(value, opt_cap(caps, 2).unwrap_or_default());
    Ok(Classification::Armed(PendingKind::SpellCrit))
}

fn on_heal_crit(
    ctx: &mut Context,
    caps: &Captures<'_>,
    _at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    let value = amount(RuleKind::HealCritAnnounce, caps, 1)?;
    ctx.state.arm_heal_crit(value);
    Ok(Classification::Armed(PendingKind::HealCrit))
}

fn on_other_heal_crit(
    ctx: &mut Context,
    caps: &Captures<'_>,
    _at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    let healer = cap(caps, 1);
    let value = amount(RuleKind::OtherHealCritAnnounce, caps, 2)?;
    if ctx.is_player(healer) {
        ctx.state.arm_heal_crit(value);
        Ok(Classification::Armed(PendingKind::HealCrit))
    } else {
        ctx.state.arm_other_healer_crit(healer, value);
        Ok(Classification::Armed(PendingKind::OtherHealerCrit))
    }
}

fn arm_player_melee_crit(
    rule: RuleKind,
    ctx: &mut Context,
    caps: &Captures<'_>,
) -> Result<Classification, ParseSkip> {
    let actor = cap(caps, 1);
    let value = amount(rule, caps, 2)?;
    if !ctx.is_player(actor) {
        return Err(ParseSkip::NotPlayer {
            rule,
            actor: actor.to_string(),
        });
    }
    ctx.state.arm_melee_crit(value);
    Ok(Classification::Armed(PendingKind::MeleeCrit))
}

fn on_melee_crit(
    ctx: &mut Context,
    caps: &Captures<'_>,
    _at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    arm_player_melee_crit(RuleKind::MeleeCritAnnounce, ctx, caps)
}

fn on_holy_blade(
    ctx: &mut Context,
    caps: &Captures<'_>,
    _at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    arm_player_melee_crit(RuleKind::HolyBladeAnnounce, ctx, caps)
}

fn on_cleaving_blow(
    ctx: &mut Context,
    caps: &Captures<'_>,
    _at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    arm_player_melee_crit(RuleKind::CleavingBlowAnnounce, ctx, caps)
}

// --- damage -------------------------------------------------------------

fn on_frenzy(
    ctx: &mut Context,
    caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    let target = ctx.normalize(cap(caps, 1));
    require(RuleKind::Frenzy, &target)?;
    let value = amount(RuleKind::Frenzy, caps, 2)?;

    let mut category = Category::MeleeHitOut;
    if ctx.state.take_melee_crit_exact(value) {
        category = Category::MeleeCritOut;
    }

    Ok(Classification::Event(CombatEvent {
        category,
        source: ctx.player.clone(),
        target,
        spell_name: None,
        verb: "frenzy".to_string(),
        amount: Amount::Value(value),
        origin: Origin::Melee,
        timestamp: at,
    }))
}

fn on_spell_hit(
    ctx: &mut Context,
    caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    let source = ctx.normalize(cap(caps, 1));
    let target = ctx.normalize(cap(caps, 2));
    require(RuleKind::SpellHit, &source)?;
    require(RuleKind::SpellHit, &target)?;
    let value = amount(RuleKind::SpellHit, caps, 3)?;

    // Evaluation order matters: source first, then the target check may
    // override whatever the source check decided.
    let mut category = Category::SpellHitOut;
    if source == ctx.player && ctx.state.take_spell_crit(value) {
        category = Category::SpellCritOut;
    }
    if target == ctx.player {
        category = Category::SpellHitIn;
    }

    Ok(Classification::Event(CombatEvent {
        category,
        source,
        target,
        spell_name: opt_cap(caps, 4),
        verb: "hit".to_string(),
        amount: Amount::Value(value),
        origin: Origin::Direct,
        timestamp: at,
    }))
}

fn dot_event(
    ctx: &Context,
    source: String,
    target: String,
    value: u32,
    spell_name: Option<String>,
    at: NaiveDateTime,
) -> Classification {
    let direction = if target == ctx.player {
        Direction::In
    } else {
        Direction::Out
    };
    Classification::Event(CombatEvent {
        category: Category::SpellHitOut.with_direction(direction),
        source,
        target,
        spell_name,
        verb: "dot".to_string(),
        amount: Amount::Value(value),
        origin: Origin::Dot,
        timestamp: at,
    })
}

fn on_dot_self(
    ctx: &mut Context,
    caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    let target = ctx.normalize(cap(caps, 1));
    require(RuleKind::DotSelf, &target)?;
    let value = amount(RuleKind::DotSelf, caps, 2)?;
    Ok(dot_event(
        ctx,
        ctx.player.clone(),
        target,
        value,
        opt_cap(caps, 3),
        at,
    ))
}

fn on_dot_other(
    ctx: &mut Context,
    caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    let target = ctx.normalize(cap(caps, 1));
    let source = ctx.normalize(cap(caps, 4));
    require(RuleKind::DotOther, &source)?;
    require(RuleKind::DotOther, &target)?;
    let value = amount(RuleKind::DotOther, caps, 2)?;
    Ok(dot_event(ctx, source, target, value, opt_cap(caps, 3), at))
}

fn on_melee_hit(
    ctx: &mut Context,
    caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    let rule = RuleKind::MeleeHit;
    let chunk = cap(caps, 1);
    let Some((mut source, verb, mut target)) = split_on_verb(chunk) else {
        return Err(ParseSkip::UnknownVerb {
            rule,
            chunk: chunk.to_string(),
        });
    };
    require(rule, &source)?;
    require(rule, &target)?;

    let mut category = Category::MeleeHitOut;
    if Context::is_you(&target) {
        target = ctx.player.clone();
        category = Category::MeleeHitIn;
    }
    if Context::is_you(&source) {
        source = ctx.player.clone();
        category = Category::MeleeHitOut;
    }

    let value = amount(rule, caps, 2)?;
    if source == ctx.player && ctx.state.take_melee_crit_at_least(value) {
        category = Category::MeleeCritOut;
    }

    Ok(Classification::Event(CombatEvent {
        category,
        source,
        target,
        spell_name: None,
        verb: verb.to_string(),
        amount: Amount::Value(value),
        origin: Origin::Melee,
        timestamp: at,
    }))
}

fn on_my_melee_miss(
    ctx: &mut Context,
    caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    let rule = RuleKind::MyMeleeMiss;
    let action = cap(caps, 1);
    let Some((_, verb, mut target)) = split_on_verb(action) else {
        return Err(ParseSkip::UnknownVerb {
            rule,
            chunk: action.to_string(),
        });
    };
    require(rule, &target)?;

    // "You try to slash a gnoll, but a gnoll dodges!"
    let outcome = MissOutcome::classify(&cap(caps, 2).replace(&target, ""));

    let mut category = Category::MeleeMissOut;
    if Context::is_you(&target) {
        target = ctx.player.clone();
        category = Category::MeleeMissIn;
    }

    Ok(Classification::Event(CombatEvent {
        category,
        source: ctx.player.clone(),
        target,
        spell_name: None,
        verb: verb.to_string(),
        amount: Amount::Outcome(outcome),
        origin: Origin::Melee,
        timestamp: at,
    }))
}

fn on_melee_miss(
    ctx: &mut Context,
    caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    let rule = RuleKind::MeleeMiss;
    let mut source = cap(caps, 1).to_string();
    let action = cap(caps, 2);
    let Some((_, verb, mut target)) = split_on_verb(action) else {
        return Err(ParseSkip::UnknownVerb {
            rule,
            chunk: action.to_string(),
        });
    };
    require(rule, &source)?;
    require(rule, &target)?;
    let outcome = MissOutcome::classify(cap(caps, 3));

    // Only a second-person source makes the miss outgoing.
    let mut category = Category::MeleeMissIn;
    if Context::is_you(&target) {
        target = ctx.player.clone();
    }
    if Context::is_you(&source) {
        source = ctx.player.clone();
        category = Category::MeleeMissOut;
    }

    Ok(Classification::Event(CombatEvent {
        category,
        source,
        target,
        spell_name: None,
        verb: verb.to_string(),
        amount: Amount::Outcome(outcome),
        origin: Origin::Melee,
        timestamp: at,
    }))
}

// --- heals and runes ----------------------------------------------------

fn on_heal(
    ctx: &mut Context,
    caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    let raw_source = cap(caps, 1);
    let mut raw_target = cap(caps, 2);
    let value = amount(RuleKind::Heal, caps, 3)?;

    let mut category = Category::HealHitOut;
    if Context::is_reflexive(raw_target) {
        raw_target = raw_source;
        category = Category::HealHitIn;
    }
    let source = ctx.normalize(raw_source);
    let target = ctx.normalize(raw_target);
    require(RuleKind::Heal, &source)?;
    require(RuleKind::Heal, &target)?;

    let crit = if source == ctx.player {
        ctx.state.take_heal_crit(value)
    } else {
        ctx.state.take_other_healer_crit(&source, value)
    };
    if crit {
        category = category.to_crit();
    }

    Ok(Classification::Event(CombatEvent {
        category,
        source,
        target,
        spell_name: opt_cap(caps, 4),
        verb: "heal".to_string(),
        amount: Amount::Value(value),
        origin: Origin::Heal,
        timestamp: at,
    }))
}

fn on_rune(
    ctx: &mut Context,
    caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    let value = amount(RuleKind::Rune, caps, 3)?;

    let mut source = cap(caps, 1).to_string();
    if source == "you" {
        source.clone_from(&ctx.player);
    }

    let mut category = Category::RuneHitOut;
    let mut target = cap(caps, 2).to_string();
    if Context::is_reflexive(&target) {
        target.clone_from(&source);
        category = Category::RuneHitIn;
    } else if Context::is_you(&target) {
        target.clone_from(&ctx.player);
    }
    require(RuleKind::Rune, &source)?;
    require(RuleKind::Rune, &target)?;

    Ok(Classification::Event(CombatEvent {
        category,
        source,
        target,
        spell_name: opt_cap(caps, 4),
        verb: "rune".to_string(),
        amount: Amount::Value(value),
        origin: Origin::Heal,
        timestamp: at,
    }))
}

// --- casting ------------------------------------------------------------

fn on_cast_begin(
    ctx: &mut Context,
    caps: &Captures<'_>,
    _at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    let spell = cap(caps, 1).to_string();
    ctx.state.begin_cast(spell.clone());
    Ok(Classification::CastBegun(spell))
}

fn failed_cast(ctx: &mut Context, result: CastResult, at: NaiveDateTime) -> Classification {
    Classification::CastFailed(FailedCast {
        caster: ctx.player.clone(),
        spell_name: ctx.state.take_cast(),
        result,
        timestamp: at,
    })
}

fn on_cast_interrupted(
    ctx: &mut Context,
    _caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    Ok(failed_cast(ctx, CastResult::Interrupted, at))
}

fn on_cast_fizzle(
    ctx: &mut Context,
    _caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    Ok(failed_cast(ctx, CastResult::Fizzle, at))
}

// --- deaths -------------------------------------------------------------

fn death(target: String, killer: String, at: NaiveDateTime) -> Classification {
    Classification::Death(Death {
        target,
        killer,
        timestamp: at,
    })
}

fn on_death(
    ctx: &mut Context,
    caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    Ok(death(
        ctx.normalize(cap(caps, 1)),
        ctx.normalize(cap(caps, 2)),
        at,
    ))
}

fn on_slain_by(
    ctx: &mut Context,
    caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    Ok(death(ctx.player.clone(), cap(caps, 1).to_string(), at))
}

fn on_slain(
    ctx: &mut Context,
    caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    Ok(death(cap(caps, 1).to_string(), ctx.player.clone(), at))
}

// --- currency -----------------------------------------------------------

fn currency(
    rule: RuleKind,
    text: &str,
    source: CurrencySource,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    let coins = Coins::parse(text).ok_or_else(|| ParseSkip::InvalidAmount {
        rule,
        value: text.to_string(),
    })?;
    Ok(Classification::Currency(CurrencyEvent {
        source,
        coins,
        timestamp: at,
    }))
}

fn on_loot_corpse(
    _ctx: &mut Context,
    caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    currency(RuleKind::LootCorpse, cap(caps, 1), CurrencySource::Corpse, at)
}

fn on_loot_split(
    _ctx: &mut Context,
    caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    currency(RuleKind::LootSplit, cap(caps, 1), CurrencySource::Split, at)
}

fn on_loot_merchant(
    _ctx: &mut Context,
    caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    let source = CurrencySource::Merchant {
        merchant: cap(caps, 2).to_string(),
        item: cap(caps, 3).to_string(),
    };
    currency(RuleKind::LootMerchant, cap(caps, 1), source, at)
}

fn on_tribute(
    _ctx: &mut Context,
    caps: &Captures<'_>,
    at: NaiveDateTime,
) -> Result<Classification, ParseSkip> {
    let favor = amount(RuleKind::Tribute, caps, 1)?;
    Ok(Classification::Currency(CurrencyEvent {
        source: CurrencySource::Tribute,
        coins: Coins {
            favor,
            ..Coins::default()
        },
        timestamp: at,
    }))
}

/// The cascade, highest priority first.
const RULE_TABLE: &[(RuleKind, &str, Handler)] = &[
    (
        RuleKind::SpellCritAnnounce,
        r"^You deliver a critical blast! \((.+?)\)(?: \((.+)\))?$",
        on_spell_crit,
    ),
    (
        RuleKind::HealCritAnnounce,
        r"^You perform an exceptional heal! \((.+?)\)$",
        on_heal_crit,
    ),
    (
        RuleKind::OtherHealCritAnnounce,
        r"^(.+) performs an exceptional heal! \((.+?)\)$",
        on_other_heal_crit,
    ),
    (
        RuleKind::MeleeCritAnnounce,
        r"^(.+) scores? a critical hit! \((.+?)\)$",
        on_melee_crit,
    ),
    (
        RuleKind::HolyBladeAnnounce,
        r"^(.+?)(?:'s)? holy blade cleanses (?:his|her|its|their|your) target!\s*\((.+?)\)$",
        on_holy_blade,
    ),
    (
        RuleKind::CleavingBlowAnnounce,
        r"^(.+) lands? a Cleaving Blow! \((.+?)\)$",
        on_cleaving_blow,
    ),
    (
        RuleKind::Frenzy,
        r"^You frenzy on (.+) for (\S+) points? of damage\.$",
        on_frenzy,
    ),
    (
        RuleKind::SpellHit,
        r"^(.+?) hit (.+) for (\S+) points? of non-melee damage\.(?: \((.+)\))?$",
        on_spell_hit,
    ),
    (
        RuleKind::DotSelf,
        r"^(.+) (?:has|have) taken (\S+) damage from your (.+)\.$",
        on_dot_self,
    ),
    (
        RuleKind::DotOther,
        r"^(.+) (?:has|have) taken (\S+) damage from (.+) by (.+)\.$",
        on_dot_other,
    ),
    (
        RuleKind::Heal,
        r"^(.+) has healed (.+) for (\S+) points? of damage\.(?: \((.+)\))?$",
        on_heal,
    ),
    (
        RuleKind::Rune,
        r"^(.+) has shielded (.+) from (\S+) points? of damage\.(?: \((.+)\))?$",
        on_rune,
    ),
    (
        RuleKind::MeleeHit,
        r"^(.+) for (\S+) points? of damage\.",
        on_melee_hit,
    ),
    (
        RuleKind::MyMeleeMiss,
        r"^You try to (.+), but (.+)!$",
        on_my_melee_miss,
    ),
    (
        RuleKind::MeleeMiss,
        r"^(.+?) tries to (.+), but (.+)!$",
        on_melee_miss,
    ),
    (
        RuleKind::CastBegin,
        r"^You begin to cast (.+)\.$",
        on_cast_begin,
    ),
    (
        RuleKind::CastInterrupted,
        r"^Your spell is interrupted\.$",
        on_cast_interrupted,
    ),
    (
        RuleKind::CastFizzle,
        r"^Your spell fizzles!$",
        on_cast_fizzle,
    ),
    (
        RuleKind::Death,
        r"^(.+) (?:has|have) been killed by (.+)!$",
        on_death,
    ),
    (
        RuleKind::SlainBy,
        r"^You have been slain by (.+)!$",
        on_slain_by,
    ),
    (RuleKind::Slain, r"^You have slain (.+)!$", on_slain),
    (
        RuleKind::LootCorpse,
        r"^You receive (.+) from the corpse\.$",
        on_loot_corpse,
    ),
    (
        RuleKind::LootSplit,
        r"^You receive (.+) as your split\.$",
        on_loot_split,
    ),
    (
        RuleKind::LootMerchant,
        r"^You receive (.+) from (.+) for (.+)\.$",
        on_loot_merchant,
    ),
    (
        RuleKind::Tribute,
        r"^You have received (\S+) favor for your tribute!$",
        on_tribute,
    ),
];

/// Turns log messages into classifications, one at a time.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
    ctx: Context,
}

impl Classifier {
    /// Create a classifier for `player` with the default rule table.
    #[must_use]
    pub fn new(player: impl Into<String>) -> Self {
        Self::with_rules(player, Self::default_rules())
    }

    /// Create a classifier with a custom rule table, evaluated in order.
    #[must_use]
    pub fn with_rules(player: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            rules,
            ctx: Context {
                player: player.into(),
                state: CorrelationState::new(),
            },
        }
    }

    /// Compile the default rule table.
    #[must_use]
    pub fn default_rules() -> Vec<Rule> {
        RULE_TABLE
            .iter()
            .filter_map(|(kind, pattern, handler)| match Rule::new(*kind, pattern, *handler) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    tracing::warn!(rule = %kind, error = %e, "Failed to compile classifier rule");
                    None
                }
            })
            .collect()
    }

    /// Classify one message (the log line with its `[timestamp] ` prefix removed).
    ///
    /// # Errors
    ///
    /// Returns a [`ParseSkip`] when the line yields nothing: no rule matched,
    /// or the first matching rule rejected it.
    pub fn classify(
        &mut self,
        message: &str,
        at: NaiveDateTime,
    ) -> Result<Classification, ParseSkip> {
        let message = message.trim_end();
        for rule in &self.rules {
            if let Some(caps) = rule.pattern.captures(message) {
                return (rule.handler)(&mut self.ctx, &caps, at);
            }
        }
        Err(ParseSkip::Unmatched)
    }

    /// Every rule whose pattern matches `message`, in priority order.
    #[must_use]
    pub fn matching_rules(&self, message: &str) -> Vec<RuleKind> {
        self.rules
            .iter()
            .filter(|r| r.matches(message))
            .map(Rule::kind)
            .collect()
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn player(&self) -> &str {
        &self.ctx.player
    }

    /// Switch the tracked player. Pending correlation is dropped since it
    /// belonged to the previous character.
    pub fn set_player(&mut self, player: impl Into<String>) {
        self.ctx.player = player.into();
        self.ctx.state.reset();
    }

    #[must_use]
    pub fn state(&self) -> &CorrelationState {
        &self.ctx.state
    }
}
