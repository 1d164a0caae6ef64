//! Single-exchange combat resolution.
//!
//! One call resolves one attack. The roll order is part of the contract so
//! scripted random sources can steer every decision:
//!
//! 1. crit roll (always drawn, independent of hit/dodge/block)
//! 2. block roll, only when the defender has a non-zero block bonus
//! 3. one hit roll, bucketed into hit / dodged / missed
//!
//! Block pre-empts dodge; a crit multiplies damage before mitigation and
//! applies even to blocked hits; dodged and missed are both complete misses
//! distinguished only by how far the single roll overshot the hit chance.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actor::Actor;
use crate::rng::RandomSource;
use crate::stats::{self, Stat};

/// Width of the band above the hit chance that reads as a dodge rather
/// than a miss. Cosmetic bucketing of one roll, not a second mechanic.
pub const DODGE_BAND: f32 = 0.15;

/// Weight of the attacker's rating in the block contest.
pub const BLOCK_CONTEST_FACTOR: f32 = 0.7;

/// How an attack resolved, for messages and projectile bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeTag {
    /// The attack landed.
    Hit,
    /// The defender's shield caught it.
    Blocked,
    /// The defender evaded (roll within the dodge band).
    Dodged,
    /// The attack went wide.
    Missed,
}

impl OutcomeTag {
    /// All outcome tags.
    pub const ALL: [Self; 4] = [Self::Hit, Self::Blocked, Self::Dodged, Self::Missed];

    /// Tag as a lowercase string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Blocked => "blocked",
            Self::Dodged => "dodged",
            Self::Missed => "missed",
        }
    }
}

impl fmt::Display for OutcomeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single attack exchange.
///
/// `hit`, `dodged`, and `blocked` are mutually exclusive; `critical` can
/// accompany `hit` or `blocked` but never a pure miss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// The attack landed.
    pub hit: bool,
    /// The defender evaded.
    pub dodged: bool,
    /// The defender blocked.
    pub blocked: bool,
    /// The crit roll succeeded and damage was dealt.
    pub critical: bool,
    /// Damage applied to the defender after mitigation.
    pub damage: u32,
    /// The attacker's effective attack rating.
    pub attack_rating: u32,
    /// The defender died from this exchange.
    pub lethal: bool,
    /// Outcome tag for rendering and ammo bookkeeping.
    pub tag: OutcomeTag,
}

/// Resolves a single attack exchange and applies the damage.
///
/// `base_damage` is the attacker's pre-bonus damage (base + weapon
/// modifier); the role-appropriate stat bonus is added here.
pub fn resolve_attack(
    attacker: &mut Actor,
    defender: &mut Actor,
    base_damage: u32,
    rng: &mut dyn RandomSource,
) -> AttackOutcome {
    let attack_rating = stats::attack_rating(
        attacker.stats(),
        attacker.level(),
        attacker.derived.weapon_accuracy,
    );

    let (stat_bonus, used_stat) = if attacker.derived.ranged {
        (attacker.derived.ranged_bonus, Stat::Precision)
    } else {
        (attacker.derived.melee_bonus, Stat::Strength)
    };
    let mut damage = base_damage + stat_bonus;

    // Roll 1: crit, independent of everything that follows. A crit that
    // ends up dodged or missed deals nothing and is not reported as one.
    let crit = rng.roll(attacker.derived.crit_chance);
    if crit {
        damage = (f64::from(damage) * f64::from(attacker.derived.crit_multiplier)) as u32;
    }

    // Roll 2: the shield contest, only when a shield is equipped. A block
    // pre-empts the dodge roll entirely.
    if defender.derived.shield_block_bonus > 0 {
        let block_rating = stats::block_rating(
            defender.stats(),
            defender.level(),
            defender.derived.shield_block_bonus,
        );
        let block_chance =
            block_rating as f32 / (block_rating as f32 + attack_rating as f32 * BLOCK_CONTEST_FACTOR);
        if rng.roll(block_chance) {
            let reduction =
                stats::block_damage_reduction(defender.stats(), defender.derived.shield_armor);
            let dealt = damage.saturating_sub(reduction).max(1);
            defender.apply_damage(dealt);
            defender.note_usage(Stat::Strength);
            return AttackOutcome {
                hit: false,
                dodged: false,
                blocked: true,
                critical: crit,
                damage: dealt,
                attack_rating,
                lethal: defender.is_dead(),
                tag: OutcomeTag::Blocked,
            };
        }
    }

    // Roll 3: one roll decides hit vs dodge vs miss. The level factor is
    // symmetric: both sides see the other's level.
    let dodge_rating = stats::dodge_rating(
        defender.stats(),
        defender.level(),
        defender.derived.armor_penalty,
    );
    let level_factor = 2.0 * attacker.level() as f32
        / (attacker.level() as f32 + defender.level() as f32);
    let hit_chance =
        attack_rating as f32 / (attack_rating as f32 + dodge_rating as f32) * level_factor;

    let roll = rng.next_f32();
    if roll < hit_chance {
        let dealt = damage.saturating_sub(defender.derived.armor).max(1);
        defender.apply_damage(dealt);
        attacker.note_usage(used_stat);
        AttackOutcome {
            hit: true,
            dodged: false,
            blocked: false,
            critical: crit,
            damage: dealt,
            attack_rating,
            lethal: defender.is_dead(),
            tag: OutcomeTag::Hit,
        }
    } else if roll - hit_chance <= DODGE_BAND {
        defender.note_usage(Stat::Agility);
        AttackOutcome {
            hit: false,
            dodged: true,
            blocked: false,
            critical: false,
            damage: 0,
            attack_rating,
            lethal: false,
            tag: OutcomeTag::Dodged,
        }
    } else {
        AttackOutcome {
            hit: false,
            dodged: false,
            blocked: false,
            critical: false,
            damage: 0,
            attack_rating,
            lethal: false,
            tag: OutcomeTag::Missed,
        }
    }
}
