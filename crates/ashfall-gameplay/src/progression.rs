//! Character level progression, stat allocation, and loot rolls.
//!
//! The character level curve (100 × level^1.5) is independent of the skill
//! curve in `skills`; the two must not be conflated.

use ashfall_common::ItemId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::content::LootEntry;
use crate::rng::RandomSource;
use crate::stats::{Stat, StatUsage, Stats};

/// Base XP cost of a character level.
pub const CHARACTER_XP_BASE: f64 = 100.0;

/// Exponent of the character level cost curve.
pub const CHARACTER_XP_EXPONENT: f64 = 1.5;

/// Free stat points awarded per character level.
pub const FREE_POINTS_PER_LEVEL: u32 = 3;

/// Max-health gained per character level.
pub const HEALTH_PER_LEVEL: u32 = 5;

/// Probability that an automatic allocation ignores usage weighting in
/// favor of a uniform random stat. Intentional unpredictability, not a
/// defect; do not "fix" to pure weighting.
pub const UNIFORM_ALLOCATION_CHANCE: f32 = 0.3;

/// Progression error types.
#[derive(Debug, Clone, Error)]
pub enum ProgressionError {
    /// No free stat points remain
    #[error("No free stat points available")]
    NoFreePoints,
}

/// Result type for progression operations.
pub type ProgressionResult<T> = Result<T, ProgressionError>;

/// XP required to advance a character from `level` to `level + 1`.
///
/// Distinct from the skill curve in [`crate::skills::xp_to_next_level`].
#[must_use]
pub fn character_xp_to_next_level(level: u32) -> u64 {
    let level = level.max(1);
    (CHARACTER_XP_BASE * f64::from(level).powf(CHARACTER_XP_EXPONENT)).floor() as u64
}

/// Rewards accumulated across the level-ups of one XP grant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpReward {
    /// Levels gained.
    pub levels_gained: u32,
    /// Free stat points awarded.
    pub free_points: u32,
    /// Max-health increase.
    pub health_gain: u32,
}

/// A character's level, XP, and allocatable attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    /// Current level (≥ 1).
    pub level: u32,
    /// XP accumulated toward the next level.
    pub xp: u64,
    /// Unspent stat points.
    pub free_stat_points: u32,
    /// Core attributes.
    pub stats: Stats,
    /// Usage counters feeding automatic allocation.
    pub stat_usage: StatUsage,
}

impl Default for LevelInfo {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            free_stat_points: 0,
            stats: Stats::new(),
            stat_usage: StatUsage::new(),
        }
    }
}

impl LevelInfo {
    /// Creates level-1 progression with the given starting attributes.
    #[must_use]
    pub fn new(stats: Stats) -> Self {
        Self {
            stats,
            ..Self::default()
        }
    }

    /// XP still required to reach the next level.
    #[must_use]
    pub fn xp_to_next(&self) -> u64 {
        character_xp_to_next_level(self.level)
    }

    /// Grants XP, looping through any level-ups it pays for.
    ///
    /// Each level awards its free stat points immediately; the returned
    /// reward also reports the max-health gain the caller applies through
    /// derived-stat recalculation.
    pub fn add_experience(&mut self, amount: u64) -> LevelUpReward {
        self.xp += amount;

        let mut reward = LevelUpReward::default();
        while self.xp >= self.xp_to_next() {
            self.xp -= self.xp_to_next();
            self.level += 1;
            self.free_stat_points += FREE_POINTS_PER_LEVEL;
            reward.levels_gained += 1;
            reward.free_points += FREE_POINTS_PER_LEVEL;
            reward.health_gain += HEALTH_PER_LEVEL;
        }
        if reward.levels_gained > 0 {
            debug!(
                level = self.level,
                gained = reward.levels_gained,
                "character level up"
            );
        }
        reward
    }

    /// Spends one free point on an attribute; fails without mutating when
    /// none remain.
    pub fn allocate_stat_point(&mut self, stat: Stat) -> ProgressionResult<()> {
        if self.free_stat_points == 0 {
            return Err(ProgressionError::NoFreePoints);
        }
        self.free_stat_points -= 1;
        self.stats.add(stat, 1);
        Ok(())
    }

    /// Spends all free points automatically and returns the allocations.
    ///
    /// Each point goes to a usage-weighted random attribute, except that
    /// with a flat 30% chance the weighting is ignored for a uniform pick.
    /// Usage counters reset once every point is spent. One RNG draw decides
    /// weighted-vs-uniform, one more picks the stat.
    pub fn auto_allocate(&mut self, rng: &mut dyn RandomSource) -> Vec<Stat> {
        let mut spent = Vec::new();
        while self.free_stat_points > 0 {
            let stat = if rng.roll(UNIFORM_ALLOCATION_CHANCE) || self.stat_usage.total() == 0 {
                Self::uniform_stat(rng)
            } else {
                self.weighted_stat(rng)
            };
            self.free_stat_points -= 1;
            self.stats.add(stat, 1);
            spent.push(stat);
        }
        if !spent.is_empty() {
            self.stat_usage.reset();
            debug!(allocated = spent.len(), "auto-assigned stat points");
        }
        spent
    }

    fn uniform_stat(rng: &mut dyn RandomSource) -> Stat {
        let idx = rng.range_u32(0, (Stat::ALL.len() - 1) as u32) as usize;
        Stat::ALL[idx]
    }

    fn weighted_stat(&self, rng: &mut dyn RandomSource) -> Stat {
        let total = self.stat_usage.total();
        let mut pick = rng.range_u32(0, total.saturating_sub(1));
        for stat in Stat::ALL {
            let weight = self.stat_usage.count(stat);
            if pick < weight {
                return stat;
            }
            pick -= weight;
        }
        // Unreachable while total > 0; fall back to the last stat.
        Stat::Luck
    }
}

/// Rolls an enemy loot table.
///
/// Each entry rolls independently: one draw against
/// `chance × (1 + loot_bonus)` (clamped to 1), then one draw for the
/// quantity in [min, max].
#[must_use]
pub fn roll_loot(
    loot: &[LootEntry],
    loot_bonus: f32,
    rng: &mut dyn RandomSource,
) -> Vec<(ItemId, u32)> {
    let mut drops = Vec::new();
    for entry in loot {
        let chance = (entry.chance * (1.0 + loot_bonus)).min(1.0);
        if rng.roll(chance) {
            let quantity = rng.range_u32(entry.min_quantity, entry.max_quantity);
            if quantity > 0 {
                drops.push((entry.item.clone(), quantity));
            }
        }
    }
    drops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{GameRng, SequenceRng};
    use proptest::prelude::*;

    #[test]
    fn test_xp_curve_values() {
        // floor(100 * 1^1.5) = 100
        assert_eq!(character_xp_to_next_level(1), 100);
        // floor(100 * 2^1.5) = floor(282.84...) = 282
        assert_eq!(character_xp_to_next_level(2), 282);
        for level in 1..100 {
            assert!(character_xp_to_next_level(level + 1) > character_xp_to_next_level(level));
        }
    }

    #[test]
    fn test_add_experience_multi_level() {
        let mut info = LevelInfo::default();
        // 100 (1->2) + 282 (2->3) = 382; grant 400.
        let reward = info.add_experience(400);

        assert_eq!(reward.levels_gained, 2);
        assert_eq!(reward.free_points, 2 * FREE_POINTS_PER_LEVEL);
        assert_eq!(reward.health_gain, 2 * HEALTH_PER_LEVEL);
        assert_eq!(info.level, 3);
        assert_eq!(info.xp, 18);
        assert_eq!(info.free_stat_points, 6);
        // Invariant restored: xp below the next threshold.
        assert!(info.xp < info.xp_to_next());
    }

    #[test]
    fn test_allocate_without_points_fails() {
        let mut info = LevelInfo::default();
        assert!(matches!(
            info.allocate_stat_point(Stat::Strength),
            Err(ProgressionError::NoFreePoints)
        ));
        assert_eq!(info.stats.strength, 0);
    }

    #[test]
    fn test_allocate_spends_point() {
        let mut info = LevelInfo::default();
        info.free_stat_points = 2;

        info.allocate_stat_point(Stat::Luck).expect("has points");
        assert_eq!(info.stats.luck, 1);
        assert_eq!(info.free_stat_points, 1);
    }

    #[test]
    fn test_auto_allocate_weighted() {
        let mut info = LevelInfo::default();
        info.free_stat_points = 1;
        info.stat_usage.note(Stat::Strength);
        info.stat_usage.note(Stat::Strength);
        info.stat_usage.note(Stat::Strength);

        // Draw 1 (0.9): not the 30% uniform path. Draw 2 picks within the
        // usage total of 3, which is all strength.
        let mut rng = SequenceRng::new(vec![0.9, 0.0]);
        let spent = info.auto_allocate(&mut rng);

        assert_eq!(spent, vec![Stat::Strength]);
        assert_eq!(info.stats.strength, 1);
        // Counters reset after assignment.
        assert_eq!(info.stat_usage.total(), 0);
    }

    #[test]
    fn test_auto_allocate_uniform_override() {
        let mut info = LevelInfo::default();
        info.free_stat_points = 1;
        info.stat_usage.note(Stat::Strength);

        // Draw 1 (0.1): takes the 30% uniform path despite the usage data.
        // Draw 2 (0.0): picks the first stat, vitality.
        let mut rng = SequenceRng::new(vec![0.1, 0.0]);
        let spent = info.auto_allocate(&mut rng);

        assert_eq!(spent, vec![Stat::Vitality]);
    }

    #[test]
    fn test_auto_allocate_no_usage_falls_back_to_uniform() {
        let mut info = LevelInfo::default();
        info.free_stat_points = 3;

        let mut rng = GameRng::new(7);
        let spent = info.auto_allocate(&mut rng);

        assert_eq!(spent.len(), 3);
        assert_eq!(info.free_stat_points, 0);
        let allocated: u32 = Stat::ALL.iter().map(|&s| info.stats.get(s)).sum();
        assert_eq!(allocated, 3);
    }

    #[test]
    fn test_roll_loot_chance_and_quantity() {
        let loot = vec![
            LootEntry::new("pelt", 0.5, 1, 3),
            LootEntry::new("fang", 0.1, 1, 1),
        ];

        // Pelt: chance roll 0.4 < 0.5 -> drop; quantity roll 0.5 -> 2.
        // Fang: chance roll 0.5 >= 0.1 -> no drop.
        let mut rng = SequenceRng::new(vec![0.4, 0.5, 0.5]);
        let drops = roll_loot(&loot, 0.0, &mut rng);

        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].0.as_str(), "pelt");
        assert_eq!(drops[0].1, 2);
    }

    #[test]
    fn test_roll_loot_luck_scaling() {
        let loot = vec![LootEntry::new("pelt", 0.5, 1, 1)];

        // 0.6 fails the base 0.5 chance but passes 0.5 * (1 + 0.5) = 0.75.
        let mut rng = SequenceRng::new(vec![0.6, 0.0]);
        assert!(roll_loot(&loot, 0.0, &mut rng.clone()).is_empty());
        assert_eq!(roll_loot(&loot, 0.5, &mut rng).len(), 1);
    }

    proptest! {
        #[test]
        fn prop_xp_idempotent_in_total(total in 0u64..200_000, split in 1u64..50) {
            let mut at_once = LevelInfo::default();
            at_once.add_experience(total);

            let mut piecewise = LevelInfo::default();
            let chunk = (total / split).max(1);
            let mut remaining = total;
            while remaining > 0 {
                let grant = chunk.min(remaining);
                piecewise.add_experience(grant);
                remaining -= grant;
            }

            prop_assert_eq!(at_once.level, piecewise.level);
            prop_assert_eq!(at_once.xp, piecewise.xp);
            prop_assert_eq!(at_once.free_stat_points, piecewise.free_stat_points);
        }

        #[test]
        fn prop_auto_allocate_conserves_points(points in 0u32..30, seed in 0u64..1000) {
            let mut info = LevelInfo::default();
            info.free_stat_points = points;
            info.stat_usage.note(Stat::Agility);
            info.stat_usage.note(Stat::Luck);

            let before: u32 = Stat::ALL.iter().map(|&s| info.stats.get(s)).sum();
            let mut rng = GameRng::new(seed);
            let spent = info.auto_allocate(&mut rng);
            let after: u32 = Stat::ALL.iter().map(|&s| info.stats.get(s)).sum();

            prop_assert_eq!(spent.len() as u32, points);
            prop_assert_eq!(after - before, points);
            prop_assert_eq!(info.free_stat_points, 0);
        }
    }
}
