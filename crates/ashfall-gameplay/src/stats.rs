//! Core attribute system and derived combat ratings.
//!
//! This module provides:
//! - The seven core attributes and their usage counters
//! - Pure rating functions (attack/dodge/block) over an attribute vector
//! - Capped derived percentages (crit, loot bonus, hunger resistance)
//!
//! Core attributes are the single source of truth; every rating here is a
//! pure function of attributes, level, and equipment modifiers, recomputed
//! rather than stored. All caps are hard ceilings and all multiplicative
//! terms truncate toward zero.

use serde::{Deserialize, Serialize};

/// Hard ceiling for critical hit chance.
pub const CRIT_CHANCE_CAP: f32 = 0.30;

/// Hard ceiling for hunger-decay resistance.
pub const HUNGER_RESIST_CAP: f32 = 0.50;

/// The seven core attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    /// Max health and physical resilience.
    Vitality,
    /// Melee damage and carry capacity.
    Strength,
    /// Evasion and damage synergy.
    Agility,
    /// Accuracy and ranged damage.
    Precision,
    /// Hunger resistance.
    Endurance,
    /// Reserved for the surrounding application.
    Arcane,
    /// Criticals, evasion, and loot.
    Luck,
}

impl Stat {
    /// All attributes, in canonical order.
    pub const ALL: [Self; 7] = [
        Self::Vitality,
        Self::Strength,
        Self::Agility,
        Self::Precision,
        Self::Endurance,
        Self::Arcane,
        Self::Luck,
    ];
}

/// A vector of the seven core attribute values.
///
/// Attributes only grow over a character's lifetime; nothing in the engine
/// decrements them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Vitality value.
    pub vitality: u32,
    /// Strength value.
    pub strength: u32,
    /// Agility value.
    pub agility: u32,
    /// Precision value.
    pub precision: u32,
    /// Endurance value.
    pub endurance: u32,
    /// Arcane value.
    pub arcane: u32,
    /// Luck value.
    pub luck: u32,
}

impl Stats {
    /// Creates an all-zero attribute vector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of an attribute.
    #[must_use]
    pub const fn get(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Vitality => self.vitality,
            Stat::Strength => self.strength,
            Stat::Agility => self.agility,
            Stat::Precision => self.precision,
            Stat::Endurance => self.endurance,
            Stat::Arcane => self.arcane,
            Stat::Luck => self.luck,
        }
    }

    /// Adds points to an attribute.
    pub fn add(&mut self, stat: Stat, amount: u32) {
        let slot = match stat {
            Stat::Vitality => &mut self.vitality,
            Stat::Strength => &mut self.strength,
            Stat::Agility => &mut self.agility,
            Stat::Precision => &mut self.precision,
            Stat::Endurance => &mut self.endurance,
            Stat::Arcane => &mut self.arcane,
            Stat::Luck => &mut self.luck,
        };
        *slot += amount;
    }
}

/// Per-attribute usage counters.
///
/// Incremented whenever an action leans on an attribute; consumed only as a
/// weighting signal by automatic stat allocation, never by combat math.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatUsage {
    counts: [u32; 7],
}

impl StatUsage {
    /// Creates zeroed usage counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one use of an attribute.
    pub fn note(&mut self, stat: Stat) {
        let idx = Stat::ALL.iter().position(|s| *s == stat).unwrap_or(0);
        self.counts[idx] += 1;
    }

    /// Returns the usage count for an attribute.
    #[must_use]
    pub fn count(&self, stat: Stat) -> u32 {
        let idx = Stat::ALL.iter().position(|s| *s == stat).unwrap_or(0);
        self.counts[idx]
    }

    /// Total uses recorded since the last reset.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Resets all counters to zero.
    pub fn reset(&mut self) {
        self.counts = [0; 7];
    }
}

/// Attack rating: precision×5 + agility×3 + level×2 + weapon accuracy + 10.
#[must_use]
pub fn attack_rating(stats: &Stats, level: u32, weapon_accuracy: u32) -> u32 {
    stats.precision * 5 + stats.agility * 3 + level * 2 + weapon_accuracy + 10
}

/// Dodge rating: max(0, agility×5 + luck×2 + level×2 + 10 − armor penalty).
#[must_use]
pub fn dodge_rating(stats: &Stats, level: u32, armor_penalty: u32) -> u32 {
    let base = i64::from(stats.agility) * 5
        + i64::from(stats.luck) * 2
        + i64::from(level) * 2
        + 10
        - i64::from(armor_penalty);
    base.max(0) as u32
}

/// Block rating: zero without a shield bonus, otherwise
/// strength×3 + agility×2 + level×2 + shield block bonus.
#[must_use]
pub fn block_rating(stats: &Stats, level: u32, shield_block_bonus: u32) -> u32 {
    if shield_block_bonus == 0 {
        return 0;
    }
    stats.strength * 3 + stats.agility * 2 + level * 2 + shield_block_bonus
}

/// Flat damage subtracted from a blocked hit: strength×2 + shield armor.
#[must_use]
pub fn block_damage_reduction(stats: &Stats, shield_armor: u32) -> u32 {
    stats.strength * 2 + shield_armor
}

/// Damage bonus with agility synergy: base + floor(base × agility × 0.05).
///
/// `base_stat` is strength for melee and precision for ranged attacks.
#[must_use]
pub fn damage_bonus(base_stat: u32, agility: u32) -> u32 {
    let synergy = (f64::from(base_stat) * f64::from(agility) * 0.05) as u32;
    base_stat + synergy
}

/// Critical hit chance: luck×0.015 + precision×0.005, capped at 0.30.
#[must_use]
pub fn crit_chance(stats: &Stats) -> f32 {
    (stats.luck as f32 * 0.015 + stats.precision as f32 * 0.005).min(CRIT_CHANCE_CAP)
}

/// Critical hit damage multiplier: 1.5 + luck×0.02 (uncapped).
#[must_use]
pub fn crit_multiplier(stats: &Stats) -> f32 {
    1.5 + stats.luck as f32 * 0.02
}

/// Loot bonus fraction: luck×0.05 (uncapped).
#[must_use]
pub fn loot_bonus(stats: &Stats) -> f32 {
    stats.luck as f32 * 0.05
}

/// Hunger-decay resistance: endurance×0.01, capped at 0.50.
#[must_use]
pub fn hunger_resistance(stats: &Stats) -> f32 {
    (stats.endurance as f32 * 0.01).min(HUNGER_RESIST_CAP)
}

/// Max-health contribution from vitality.
#[must_use]
pub fn health_bonus(stats: &Stats) -> u32 {
    stats.vitality * 5
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stats(v: u32, s: u32, a: u32, p: u32, e: u32, arc: u32, l: u32) -> Stats {
        Stats {
            vitality: v,
            strength: s,
            agility: a,
            precision: p,
            endurance: e,
            arcane: arc,
            luck: l,
        }
    }

    #[test]
    fn test_attack_rating_formula() {
        // precision=5, agility=5, level=1, no weapon accuracy:
        // 5*5 + 5*3 + 1*2 + 0 + 10 = 52
        let s = stats(0, 0, 5, 5, 0, 0, 0);
        assert_eq!(attack_rating(&s, 1, 0), 52);
    }

    #[test]
    fn test_dodge_rating_formula() {
        // All dodge-relevant stats zero, level 1: 0 + 0 + 2 + 10 = 12
        let s = Stats::new();
        assert_eq!(dodge_rating(&s, 1, 0), 12);
    }

    #[test]
    fn test_dodge_rating_floors_at_zero() {
        let s = Stats::new();
        assert_eq!(dodge_rating(&s, 1, 1000), 0);
    }

    #[test]
    fn test_block_rating_requires_shield() {
        let s = stats(0, 10, 4, 0, 0, 0, 0);
        assert_eq!(block_rating(&s, 3, 0), 0);
        // 10*3 + 4*2 + 3*2 + 15 = 59
        assert_eq!(block_rating(&s, 3, 15), 59);
    }

    #[test]
    fn test_block_damage_reduction() {
        let s = stats(0, 7, 0, 0, 0, 0, 0);
        assert_eq!(block_damage_reduction(&s, 6), 20);
    }

    #[test]
    fn test_damage_bonus_truncates() {
        // 10 + floor(10 * 3 * 0.05) = 10 + floor(1.5) = 11
        assert_eq!(damage_bonus(10, 3), 11);
        // 10 + floor(10 * 4 * 0.05) = 12
        assert_eq!(damage_bonus(10, 4), 12);
        assert_eq!(damage_bonus(0, 100), 0);
    }

    #[test]
    fn test_crit_chance_capped() {
        let s = stats(0, 0, 0, 4, 0, 0, 10);
        assert!((crit_chance(&s) - 0.17).abs() < 1e-6);

        let huge = stats(0, 0, 0, 1000, 0, 0, 1000);
        assert!((crit_chance(&huge) - CRIT_CHANCE_CAP).abs() < f32::EPSILON);
    }

    #[test]
    fn test_crit_multiplier() {
        let s = stats(0, 0, 0, 0, 0, 0, 5);
        assert!((crit_multiplier(&s) - 1.6).abs() < 1e-6);
    }

    #[test]
    fn test_hunger_resistance_capped() {
        let s = stats(0, 0, 0, 0, 20, 0, 0);
        assert!((hunger_resistance(&s) - 0.2).abs() < 1e-6);

        let huge = stats(0, 0, 0, 0, 500, 0, 0);
        assert!((hunger_resistance(&huge) - HUNGER_RESIST_CAP).abs() < f32::EPSILON);
    }

    #[test]
    fn test_stat_usage_note_and_reset() {
        let mut usage = StatUsage::new();
        usage.note(Stat::Strength);
        usage.note(Stat::Strength);
        usage.note(Stat::Luck);

        assert_eq!(usage.count(Stat::Strength), 2);
        assert_eq!(usage.count(Stat::Luck), 1);
        assert_eq!(usage.total(), 3);

        usage.reset();
        assert_eq!(usage.total(), 0);
    }

    #[test]
    fn test_stats_get_add() {
        let mut s = Stats::new();
        s.add(Stat::Agility, 4);
        s.add(Stat::Agility, 1);
        assert_eq!(s.get(Stat::Agility), 5);
        assert_eq!(s.get(Stat::Vitality), 0);
    }

    proptest! {
        #[test]
        fn prop_caps_never_exceeded(
            luck in 0u32..10_000,
            precision in 0u32..10_000,
            endurance in 0u32..10_000,
        ) {
            let s = stats(0, 0, 0, precision, endurance, 0, luck);
            prop_assert!(crit_chance(&s) <= CRIT_CHANCE_CAP);
            prop_assert!(hunger_resistance(&s) <= HUNGER_RESIST_CAP);
        }

        #[test]
        fn prop_ratings_non_negative(
            agility in 0u32..1_000,
            luck in 0u32..1_000,
            level in 1u32..200,
            penalty in 0u32..20_000,
        ) {
            let s = stats(0, 0, agility, 0, 0, 0, luck);
            // u32 return type already guarantees >= 0; the interesting
            // property is that a huge penalty saturates instead of wrapping.
            let dr = dodge_rating(&s, level, penalty);
            prop_assert!(dr <= agility * 5 + luck * 2 + level * 2 + 10);
        }
    }
}
