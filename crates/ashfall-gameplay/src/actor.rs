//! Actor model: the mutable entity for the player and enemies.
//!
//! This module provides:
//! - The tick budget (action-economy resource) with all-or-nothing spends
//! - Health and saturation with clamped mutators
//! - Inventory and equipment operations with carry-capacity checks
//! - Derived-stat recalculation from attributes, equipment, and skills
//!
//! Derived combat bonuses are cached on the actor and must be recomputed
//! after every stat allocation, level-up, or equipment change; every
//! mutator here that changes one of those inputs ends by calling
//! [`Actor::recalculate_derived`].

use ashfall_common::{ActorId, ItemId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::content::{ContentRegistry, EquipSlot};
use crate::equipment::{EquipError, Equipment};
use crate::inventory::{Inventory, InventoryError};
use crate::progression::{LevelInfo, LevelUpReward, ProgressionError, HEALTH_PER_LEVEL};
use crate::rng::RandomSource;
use crate::skills::{ItemQuality, SkillType, Skills};
use crate::stats::{self, Stat, Stats};

/// Actor error types.
#[derive(Debug, Clone, Error)]
pub enum ActorError {
    /// Not enough ticks for the action
    #[error("Not enough ticks: need {needed}, have {available}")]
    InsufficientTicks {
        /// Ticks the action costs
        needed: u32,
        /// Ticks available
        available: u32,
    },
    /// Adding the items would exceed carry capacity
    #[error("Over carry capacity: {weight} of {capacity}")]
    OverCapacity {
        /// Resulting carry weight
        weight: u32,
        /// Carry capacity
        capacity: u32,
    },
    /// Item id has no definition
    #[error("Unknown item: {0}")]
    UnknownItem(ItemId),
    /// Item is not carried
    #[error("Not carrying {0}")]
    NotCarried(ItemId),
    /// Item has no nutrition value
    #[error("{0} is not edible")]
    NotEdible(ItemId),
    /// Inventory error
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),
    /// Equipment error
    #[error("Equipment error: {0}")]
    Equip(#[from] EquipError),
    /// Progression error
    #[error("Progression error: {0}")]
    Progression(#[from] ProgressionError),
}

/// Result type for actor operations.
pub type ActorResult<T> = Result<T, ActorError>;

/// Resource configuration for creating an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Tick budget ceiling.
    pub max_ticks: u32,
    /// Health before vitality and level bonuses.
    pub base_health: u32,
    /// Saturation ceiling.
    pub max_saturation: u32,
    /// Carry capacity before the strength bonus.
    pub base_carry_capacity: u32,
    /// Action speed.
    pub speed: u32,
    /// Damage dealt before weapon and stat bonuses.
    pub base_damage: u32,
    /// Starting attributes.
    pub stats: Stats,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            max_ticks: 1000,
            base_health: 50,
            max_saturation: 100,
            base_carry_capacity: 50,
            speed: 100,
            base_damage: 2,
            stats: Stats::new(),
        }
    }
}

/// Cached combat bonuses, derived from attributes + equipment + skills.
///
/// Never mutated directly; always rebuilt by
/// [`Actor::recalculate_derived`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    /// Melee damage bonus (strength with agility synergy).
    pub melee_bonus: u32,
    /// Ranged damage bonus (precision with agility synergy).
    pub ranged_bonus: u32,
    /// Critical hit chance (capped).
    pub crit_chance: f32,
    /// Critical hit damage multiplier.
    pub crit_multiplier: f32,
    /// Loot bonus fraction.
    pub loot_bonus: f32,
    /// Hunger-decay resistance (capped).
    pub hunger_resistance: f32,
    /// Weapon damage modifier (quality-scaled).
    pub weapon_damage: u32,
    /// Weapon accuracy (quality-scaled item modifier + skill familiarity).
    pub weapon_accuracy: u32,
    /// Weapon family of the equipped weapon.
    pub weapon_skill: Option<SkillType>,
    /// Whether the equipped weapon is ranged.
    pub ranged: bool,
    /// Total worn armor (quality-scaled; includes the shield).
    pub armor: u32,
    /// Total dodge penalty from worn armor.
    pub armor_penalty: u32,
    /// Shield block modifier (quality-scaled + shield familiarity).
    pub shield_block_bonus: u32,
    /// The shield's own armor, for block damage reduction.
    pub shield_armor: u32,
    /// Carry capacity (base + strength bonus).
    pub carry_capacity: u32,
}

/// The mutable entity representing the player or an enemy.
///
/// An actor owns all of its resources by value; no aliasing exists between
/// two actors' inventories or attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// Unique identity.
    pub id: ActorId,
    /// Display name.
    pub name: String,
    /// Current tick balance.
    ticks: u32,
    /// Tick ceiling.
    max_ticks: u32,
    /// Current health.
    health: u32,
    /// Health ceiling (derived; see `recalculate_derived`).
    max_health: u32,
    /// Current saturation.
    saturation: u32,
    /// Saturation ceiling.
    max_saturation: u32,
    /// Health before vitality and level bonuses.
    base_health: u32,
    /// Carry capacity before the strength bonus.
    base_carry_capacity: u32,
    /// Action speed.
    pub speed: u32,
    /// Damage before weapon and stat bonuses.
    pub base_damage: u32,
    /// Carried items.
    pub inventory: Inventory,
    /// Equipped items.
    pub equipment: Equipment,
    /// Level, XP, and attributes.
    pub level_info: LevelInfo,
    /// Trained skills.
    pub skills: Skills,
    /// Cached derived bonuses.
    pub derived: DerivedStats,
}

impl Actor {
    /// Creates an actor from a resource configuration.
    #[must_use]
    pub fn new(name: impl Into<String>, config: ActorConfig) -> Self {
        let mut actor = Self {
            id: ActorId::new(),
            name: name.into(),
            ticks: config.max_ticks,
            max_ticks: config.max_ticks,
            health: 0,
            max_health: 0,
            saturation: config.max_saturation,
            max_saturation: config.max_saturation,
            base_health: config.base_health,
            base_carry_capacity: config.base_carry_capacity,
            speed: config.speed,
            base_damage: config.base_damage,
            inventory: Inventory::new(),
            equipment: Equipment::new(),
            level_info: LevelInfo::new(config.stats),
            skills: Skills::new(),
            derived: DerivedStats::default(),
        };
        actor.recalculate_derived(&ContentRegistry::new());
        actor.health = actor.max_health;
        actor
    }

    /// Creates an enemy actor from a template at the given level.
    #[must_use]
    pub fn from_template(template: &crate::content::EnemyTemplate, level: u32) -> Self {
        let level = level.max(1);
        let mut stats = template.base_stats;
        for stat in Stat::ALL {
            stats.add(stat, template.stat_growth.get(stat) * (level - 1));
        }

        let mut actor = Self::new(
            template.name.clone(),
            ActorConfig {
                base_health: template.base_health + template.health_growth * (level - 1),
                speed: template.speed,
                base_damage: template.base_damage,
                stats,
                ..ActorConfig::default()
            },
        );
        actor.level_info.level = level;
        actor.recalculate_derived(&ContentRegistry::new());
        actor.health = actor.max_health;
        actor
    }

    // --- resource queries -------------------------------------------------

    /// Current tick balance.
    #[must_use]
    pub const fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Tick ceiling.
    #[must_use]
    pub const fn max_ticks(&self) -> u32 {
        self.max_ticks
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Health ceiling.
    #[must_use]
    pub const fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Current saturation.
    #[must_use]
    pub const fn saturation(&self) -> u32 {
        self.saturation
    }

    /// Whether the actor is dead.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Health as a fraction of the ceiling (0.0 to 1.0).
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            0.0
        } else {
            self.health as f32 / self.max_health as f32
        }
    }

    /// Whether saturation has run out (starvation damage is applied by the
    /// caller per turn).
    #[must_use]
    pub const fn is_starving(&self) -> bool {
        self.saturation == 0
    }

    /// Character level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level_info.level
    }

    /// Attributes.
    #[must_use]
    pub const fn stats(&self) -> &Stats {
        &self.level_info.stats
    }

    /// Damage before the resolver's stat bonus: base + weapon modifier.
    #[must_use]
    pub const fn attack_power(&self) -> u32 {
        self.base_damage + self.derived.weapon_damage
    }

    // --- tick economy -----------------------------------------------------

    /// Spends ticks; fails without mutating when the balance is short.
    pub fn try_spend_ticks(&mut self, amount: u32) -> ActorResult<()> {
        if self.ticks < amount {
            return Err(ActorError::InsufficientTicks {
                needed: amount,
                available: self.ticks,
            });
        }
        self.ticks -= amount;
        Ok(())
    }

    /// Grants ticks, clamped to the ceiling.
    pub fn grant_ticks(&mut self, amount: u32) {
        self.ticks = (self.ticks + amount).min(self.max_ticks);
    }

    // --- health and saturation --------------------------------------------

    /// Applies damage, clamped at zero. Returns the damage actually taken.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.health);
        self.health -= taken;
        if self.is_dead() {
            debug!(actor = %self.name, "actor died");
        }
        taken
    }

    /// Heals, clamped to the ceiling.
    pub fn heal(&mut self, amount: u32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Drains saturation, scaled down by hunger resistance (truncating).
    pub fn drain_saturation(&mut self, amount: u32) {
        let scaled =
            (f64::from(amount) * f64::from(1.0 - self.derived.hunger_resistance)) as u32;
        self.saturation = self.saturation.saturating_sub(scaled);
    }

    /// Restores saturation, clamped to the ceiling.
    pub fn restore_saturation(&mut self, amount: u32) {
        self.saturation = (self.saturation + amount).min(self.max_saturation);
    }

    /// Eats one unit of an item, restoring its nutrition value.
    pub fn eat(&mut self, registry: &ContentRegistry, item: &str) -> ActorResult<()> {
        let nutrition = registry
            .item(item)
            .ok_or_else(|| ActorError::UnknownItem(ItemId::new(item)))?
            .nutrition;
        if nutrition == 0 {
            return Err(ActorError::NotEdible(ItemId::new(item)));
        }
        self.inventory.remove(item, 1)?;
        self.restore_saturation(nutrition);
        Ok(())
    }

    // --- inventory and equipment -------------------------------------------

    /// Adds items, checking carry capacity first. Unknown ids weigh zero.
    pub fn add_item(
        &mut self,
        registry: &ContentRegistry,
        item: impl Into<ItemId>,
        amount: u32,
    ) -> ActorResult<()> {
        let item = item.into();
        let added_weight = registry.item_weight(item.as_str()) * amount;
        let weight = self.inventory.total_weight(registry) + added_weight;
        if weight > self.derived.carry_capacity {
            return Err(ActorError::OverCapacity {
                weight,
                capacity: self.derived.carry_capacity,
            });
        }
        self.inventory.add(item, amount);
        Ok(())
    }

    /// Removes items; fails without mutating when the count is short.
    pub fn remove_item(&mut self, item: impl Into<ItemId>, amount: u32) -> ActorResult<()> {
        self.inventory.remove(item, amount)?;
        Ok(())
    }

    /// Equips a carried item at normal quality.
    pub fn equip(&mut self, registry: &ContentRegistry, item: &str) -> ActorResult<()> {
        self.equip_with_quality(registry, item, ItemQuality::Normal)
    }

    /// Equips a carried item with a rolled quality tier.
    ///
    /// Displaced items return to the inventory. The quality travels with
    /// the equipment instance, not the fungible inventory count.
    pub fn equip_with_quality(
        &mut self,
        registry: &ContentRegistry,
        item: &str,
        quality: ItemQuality,
    ) -> ActorResult<()> {
        let definition = registry
            .item(item)
            .ok_or_else(|| ActorError::UnknownItem(ItemId::new(item)))?;
        if definition.slot.is_none() {
            return Err(EquipError::NotEquippable(definition.id.clone()).into());
        }
        if !self.inventory.has(item, 1) {
            return Err(ActorError::NotCarried(ItemId::new(item)));
        }

        self.inventory.remove(item, 1)?;
        let displaced = self.equipment.equip(definition, quality)?;
        for instance in displaced {
            self.inventory.add(instance.item, 1);
        }
        self.recalculate_derived(registry);
        Ok(())
    }

    /// Unequips a slot, returning the item to the inventory.
    pub fn unequip(&mut self, registry: &ContentRegistry, slot: EquipSlot) -> ActorResult<()> {
        let instance = self.equipment.unequip(slot)?;
        self.inventory.add(instance.item, 1);
        self.recalculate_derived(registry);
        Ok(())
    }

    // --- progression -------------------------------------------------------

    /// Grants character XP and applies level rewards.
    pub fn add_experience(&mut self, registry: &ContentRegistry, amount: u64) -> LevelUpReward {
        let reward = self.level_info.add_experience(amount);
        if reward.levels_gained > 0 {
            self.recalculate_derived(registry);
            // New levels raise the ceiling; the gain arrives as fresh health.
            self.heal(reward.health_gain);
        }
        reward
    }

    /// Spends one free stat point on an attribute.
    pub fn allocate_stat_point(
        &mut self,
        registry: &ContentRegistry,
        stat: Stat,
    ) -> ActorResult<()> {
        self.level_info.allocate_stat_point(stat)?;
        self.recalculate_derived(registry);
        Ok(())
    }

    /// Auto-assigns all free stat points (usage-weighted with the flat
    /// uniform override) and returns the allocations.
    pub fn auto_allocate(
        &mut self,
        registry: &ContentRegistry,
        rng: &mut dyn RandomSource,
    ) -> Vec<Stat> {
        let spent = self.level_info.auto_allocate(rng);
        if !spent.is_empty() {
            self.recalculate_derived(registry);
        }
        spent
    }

    /// Records one use of an attribute for allocation weighting.
    pub fn note_usage(&mut self, stat: Stat) {
        self.level_info.stat_usage.note(stat);
    }

    // --- derived stats -----------------------------------------------------

    /// Rebuilds all cached combat bonuses from attributes, equipment, and
    /// skills.
    ///
    /// Must be invoked after every stat allocation, level-up, or equipment
    /// change; the mutators on this type do so themselves.
    pub fn recalculate_derived(&mut self, registry: &ContentRegistry) {
        let stats = self.level_info.stats;
        let mut derived = DerivedStats {
            melee_bonus: stats::damage_bonus(stats.strength, stats.agility),
            ranged_bonus: stats::damage_bonus(stats.precision, stats.agility),
            crit_chance: stats::crit_chance(&stats),
            crit_multiplier: stats::crit_multiplier(&stats),
            loot_bonus: stats::loot_bonus(&stats),
            hunger_resistance: stats::hunger_resistance(&stats),
            carry_capacity: self.base_carry_capacity + stats.strength * 5,
            ..DerivedStats::default()
        };

        for (slot, instance) in self.equipment.pieces() {
            let Some(definition) = registry.item(instance.item.as_str()) else {
                // Content was removed out from under a live actor; the
                // instance contributes nothing rather than aborting.
                continue;
            };

            if slot == EquipSlot::MainHand {
                derived.weapon_damage = instance.scaled(definition.damage);
                derived.weapon_skill = definition.weapon_skill;
                derived.ranged = definition.is_ranged();
                let familiarity = definition
                    .weapon_skill
                    .map_or(0, |skill| self.skills.rating_bonus(skill));
                derived.weapon_accuracy = instance.scaled(definition.accuracy) + familiarity;
            }

            derived.armor += instance.scaled(definition.armor);
            derived.armor_penalty += definition.armor_penalty;

            if definition.block_bonus > 0 {
                derived.shield_block_bonus = instance.scaled(definition.block_bonus)
                    + self.skills.rating_bonus(SkillType::Shield);
                derived.shield_armor = instance.scaled(definition.armor);
            }
        }

        self.derived = derived;
        self.max_health = self.base_health
            + stats::health_bonus(&stats)
            + (self.level_info.level - 1) * HEALTH_PER_LEVEL;
        self.health = self.health.min(self.max_health);
    }
}
