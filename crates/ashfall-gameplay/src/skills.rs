//! Skill progression and effect curves.
//!
//! This module provides:
//! - Per-skill experience tracking with a power-curve level cost
//! - Diminishing-returns effect curves (failure chance, yield bonus)
//! - The five-tier quality roll for crafted items
//!
//! The skill curve (50 × level^1.3) is independent of the character level
//! curve (100 × level^1.5) in `progression`; the two must not be conflated.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Base XP cost of a skill level.
pub const SKILL_XP_BASE: f64 = 50.0;

/// Exponent of the skill level cost curve.
pub const SKILL_XP_EXPONENT: f64 = 1.3;

/// A trainable skill discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillType {
    /// Swords, knives, and daggers.
    Blades,
    /// Hatchets and battle axes.
    Axes,
    /// Clubs and hammers.
    Clubs,
    /// Bows.
    Archery,
    /// Thrown rocks and spears.
    Throwing,
    /// Blocking with an off-hand shield.
    Shield,
    /// Crafting items at camp.
    Crafting,
    /// Gathering plants and loose materials.
    Foraging,
    /// Felling trees.
    Woodcutting,
    /// Breaking rock and ore.
    Mining,
}

impl SkillType {
    /// All skill disciplines, in canonical order.
    pub const ALL: [Self; 10] = [
        Self::Blades,
        Self::Axes,
        Self::Clubs,
        Self::Archery,
        Self::Throwing,
        Self::Shield,
        Self::Crafting,
        Self::Foraging,
        Self::Woodcutting,
        Self::Mining,
    ];

    /// Returns whether this is a weapon family.
    #[must_use]
    pub const fn is_weapon(self) -> bool {
        matches!(
            self,
            Self::Blades | Self::Axes | Self::Clubs | Self::Archery | Self::Throwing
        )
    }

    /// Returns whether this is a harvesting discipline.
    #[must_use]
    pub const fn is_harvesting(self) -> bool {
        matches!(self, Self::Foraging | Self::Woodcutting | Self::Mining)
    }
}

/// Quality tier of a crafted item.
///
/// Rolled once at craft time and immutable thereafter; scales the item's
/// combat contribution through a fixed per-tier multiplier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ItemQuality {
    /// Below-par workmanship.
    Poor,
    /// Standard workmanship.
    #[default]
    Normal,
    /// Above-par workmanship.
    Good,
    /// Exceptional workmanship.
    Excellent,
    /// The best a craft can produce.
    Masterwork,
}

impl ItemQuality {
    /// All tiers, worst to best.
    pub const ALL: [Self; 5] = [
        Self::Poor,
        Self::Normal,
        Self::Good,
        Self::Excellent,
        Self::Masterwork,
    ];

    /// Effect multiplier applied to the item's combat contribution.
    #[must_use]
    pub const fn multiplier(self) -> f32 {
        match self {
            Self::Poor => 0.75,
            Self::Normal => 1.0,
            Self::Good => 1.15,
            Self::Excellent => 1.3,
            Self::Masterwork => 1.5,
        }
    }
}

/// XP required to advance a skill from `level` to `level + 1`.
///
/// A level-0 skill pays the level-1 threshold, so the cost is always
/// positive and the add-XP loop terminates.
#[must_use]
pub fn xp_to_next_level(level: u32) -> u64 {
    let level = level.max(1);
    (SKILL_XP_BASE * f64::from(level).powf(SKILL_XP_EXPONENT)).floor() as u64
}

/// Failure chance after skill mitigation: base / (1 + level/50).
///
/// Approaches but never reaches zero, so no floor is needed.
#[must_use]
pub fn failure_chance(base: f32, level: u32) -> f32 {
    base / (1.0 + level as f32 / 50.0)
}

/// Interpolation factor for yield and quality: level / (level + 100).
///
/// Approaches but never reaches 1.
#[must_use]
pub fn progress_factor(level: u32) -> f32 {
    level as f32 / (level as f32 + 100.0)
}

/// Cumulative quality thresholds (poor, normal, good, excellent) at skill
/// zero and at the asymptote, as percentages of the [0, 100) roll space.
const QUALITY_START: [f32; 4] = [50.0, 85.0, 95.0, 99.0];
const QUALITY_END: [f32; 4] = [5.0, 25.0, 60.0, 90.0];

/// Cumulative quality thresholds for a skill level.
#[must_use]
pub fn quality_thresholds(level: u32) -> [f32; 4] {
    let t = progress_factor(level);
    let mut out = [0.0; 4];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = QUALITY_START[i] + (QUALITY_END[i] - QUALITY_START[i]) * t;
    }
    out
}

/// Maps a uniform roll in [0, 100) to a quality tier for a skill level.
///
/// The distribution shifts continuously from mostly-poor at skill zero
/// toward mostly-good/excellent as the skill grows; masterwork is the
/// catch-all above the top threshold.
#[must_use]
pub fn quality_for_roll(level: u32, roll: f32) -> ItemQuality {
    let thresholds = quality_thresholds(level);
    if roll < thresholds[0] {
        ItemQuality::Poor
    } else if roll < thresholds[1] {
        ItemQuality::Normal
    } else if roll < thresholds[2] {
        ItemQuality::Good
    } else if roll < thresholds[3] {
        ItemQuality::Excellent
    } else {
        ItemQuality::Masterwork
    }
}

/// A single skill's progression state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Current level (uncapped).
    pub level: u32,
    /// XP accumulated toward the next level.
    pub xp: u64,
    /// Turn number XP was last granted, or `None` for never.
    pub last_gained_at: Option<u64>,
}

impl Skill {
    /// Creates a fresh level-0 skill.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// XP still required to reach the next level.
    #[must_use]
    pub fn xp_to_next(&self) -> u64 {
        xp_to_next_level(self.level)
    }

    /// Rating bonus contributed by familiarity with this skill.
    ///
    /// Feeds weapon accuracy (weapon families) or block rating (shield).
    #[must_use]
    pub fn rating_bonus(&self) -> u32 {
        self.level * 2
    }

    /// Grants XP, looping through any level-ups it pays for.
    ///
    /// Returns the number of levels gained. `turn` stamps
    /// `last_gained_at`.
    pub fn add_experience(&mut self, amount: u64, turn: u64) -> u32 {
        self.xp += amount;
        self.last_gained_at = Some(turn);

        let mut gained = 0;
        while self.xp >= self.xp_to_next() {
            self.xp -= self.xp_to_next();
            self.level += 1;
            gained += 1;
        }
        if gained > 0 {
            debug!(level = self.level, gained, "skill level up");
        }
        gained
    }
}

/// All of an actor's skills.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    skills: HashMap<SkillType, Skill>,
}

impl Skills {
    /// Creates an empty skill collection; absent skills read as level 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the level of a skill (0 if never trained).
    #[must_use]
    pub fn level(&self, skill: SkillType) -> u32 {
        self.skills.get(&skill).map_or(0, |s| s.level)
    }

    /// Returns a skill's state, if it has ever been trained.
    #[must_use]
    pub fn get(&self, skill: SkillType) -> Option<&Skill> {
        self.skills.get(&skill)
    }

    /// Grants XP to a skill, creating it on first use.
    ///
    /// Returns the number of levels gained.
    pub fn add_experience(&mut self, skill: SkillType, amount: u64, turn: u64) -> u32 {
        self.skills
            .entry(skill)
            .or_default()
            .add_experience(amount, turn)
    }

    /// Rating bonus for a skill (see [`Skill::rating_bonus`]).
    #[must_use]
    pub fn rating_bonus(&self, skill: SkillType) -> u32 {
        self.skills.get(&skill).map_or(0, Skill::rating_bonus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_xp_curve_values() {
        // floor(50 * 1^1.3) = 50
        assert_eq!(xp_to_next_level(0), 50);
        assert_eq!(xp_to_next_level(1), 50);
        // floor(50 * 2^1.3) = floor(123.11...) = 123
        assert_eq!(xp_to_next_level(2), 123);
        // Strictly increasing from level 1 on.
        for level in 1..100 {
            assert!(xp_to_next_level(level + 1) > xp_to_next_level(level));
        }
    }

    #[test]
    fn test_add_experience_single_level() {
        let mut skill = Skill::new();
        let gained = skill.add_experience(60, 5);

        assert_eq!(gained, 1);
        assert_eq!(skill.level, 1);
        assert_eq!(skill.xp, 10);
        assert_eq!(skill.last_gained_at, Some(5));
    }

    #[test]
    fn test_add_experience_multi_level() {
        let mut skill = Skill::new();
        // 50 (0->1) + 50 (1->2) + 123 (2->3) = 223; grant 230.
        let gained = skill.add_experience(230, 1);

        assert_eq!(gained, 3);
        assert_eq!(skill.level, 3);
        assert_eq!(skill.xp, 7);
    }

    #[test]
    fn test_failure_chance_curve() {
        // base 0.25 at level 0 is exactly 0.25
        assert!((failure_chance(0.25, 0) - 0.25).abs() < f32::EPSILON);
        // at level 50: 0.25 / 2 = 0.125
        assert!((failure_chance(0.25, 50) - 0.125).abs() < 1e-6);
        // never reaches zero
        assert!(failure_chance(0.25, 100_000) > 0.0);
    }

    #[test]
    fn test_progress_factor_asymptote() {
        assert_eq!(progress_factor(0), 0.0);
        assert!((progress_factor(100) - 0.5).abs() < 1e-6);
        assert!(progress_factor(1_000_000) < 1.0);
    }

    #[test]
    fn test_quality_distribution_shifts() {
        // Skill 0: a mid roll is poor, masterwork needs 99+.
        assert_eq!(quality_for_roll(0, 25.0), ItemQuality::Poor);
        assert_eq!(quality_for_roll(0, 60.0), ItemQuality::Normal);
        assert_eq!(quality_for_roll(0, 99.5), ItemQuality::Masterwork);

        // Skill 100 (t = 0.5): thresholds (27.5, 55, 77.5, 94.5).
        assert_eq!(quality_for_roll(100, 25.0), ItemQuality::Poor);
        assert_eq!(quality_for_roll(100, 60.0), ItemQuality::Good);
        assert_eq!(quality_for_roll(100, 95.0), ItemQuality::Masterwork);
    }

    #[test]
    fn test_quality_multipliers_ordered() {
        let mut previous = 0.0;
        for tier in ItemQuality::ALL {
            assert!(tier.multiplier() > previous);
            previous = tier.multiplier();
        }
    }

    #[test]
    fn test_skill_rating_bonus() {
        let mut skills = Skills::new();
        assert_eq!(skills.rating_bonus(SkillType::Blades), 0);

        skills.add_experience(SkillType::Blades, 250, 1);
        let level = skills.level(SkillType::Blades);
        assert!(level >= 2);
        assert_eq!(skills.rating_bonus(SkillType::Blades), level * 2);
    }

    #[test]
    fn test_skills_untrained_reads_zero() {
        let skills = Skills::new();
        assert_eq!(skills.level(SkillType::Mining), 0);
        assert!(skills.get(SkillType::Mining).is_none());
    }

    #[test]
    fn test_skill_type_classification() {
        assert!(SkillType::Blades.is_weapon());
        assert!(SkillType::Throwing.is_weapon());
        assert!(!SkillType::Shield.is_weapon());
        assert!(SkillType::Mining.is_harvesting());
        assert!(!SkillType::Crafting.is_harvesting());
    }

    proptest! {
        #[test]
        fn prop_xp_grant_idempotent_in_total(total in 0u64..50_000, split in 1u64..100) {
            // Granting X at once or in N pieces lands on the same state.
            let mut at_once = Skill::new();
            at_once.add_experience(total, 0);

            let mut piecewise = Skill::new();
            let chunk = (total / split).max(1);
            let mut remaining = total;
            while remaining > 0 {
                let grant = chunk.min(remaining);
                piecewise.add_experience(grant, 0);
                remaining -= grant;
            }

            prop_assert_eq!(at_once.level, piecewise.level);
            prop_assert_eq!(at_once.xp, piecewise.xp);
        }

        #[test]
        fn prop_quality_thresholds_ordered(level in 0u32..1_000_000) {
            let t = quality_thresholds(level);
            prop_assert!(t[0] < t[1]);
            prop_assert!(t[1] < t[2]);
            prop_assert!(t[2] < t[3]);
            prop_assert!(t[3] < 100.0);
            prop_assert!(t[0] > 0.0);
        }
    }
}
