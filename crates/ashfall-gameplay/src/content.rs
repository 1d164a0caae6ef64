//! Content-table boundary types and the injected registry.
//!
//! The engine consumes, but does not author, the static content tables:
//! item, recipe, enemy, resource-node, and location definitions, each keyed
//! by a stable string id. The surrounding application builds a
//! [`ContentRegistry`] at startup (or loads one from RON) and passes it by
//! reference into the engine. Lookups return `Option`; an unknown id
//! degrades to "absent / zero contribution" rather than aborting a turn.

use ahash::AHashMap;
use ashfall_common::{AshfallError, AshfallResult, EnemyId, ItemId, LocationId, NodeId, RecipeId};
use serde::{Deserialize, Serialize};

use crate::skills::SkillType;
use crate::stats::Stats;

/// Equipment slot an item can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    /// Weapon hand.
    MainHand,
    /// Shield/off-hand.
    OffHand,
    /// Head armor.
    Head,
    /// Body armor.
    Body,
    /// Leg armor.
    Legs,
    /// Foot armor.
    Feet,
}

impl EquipSlot {
    /// All slots, in canonical order.
    pub const ALL: [Self; 6] = [
        Self::MainHand,
        Self::OffHand,
        Self::Head,
        Self::Body,
        Self::Legs,
        Self::Feet,
    ];
}

/// Ammunition family for projectile bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmmoKind {
    /// Thrown rocks; nearly always recoverable.
    Rock,
    /// Arrows; fragile and lost with a fled target.
    Arrow,
}

/// Static definition of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    /// Stable identifier.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Carry weight per unit.
    pub weight: u32,
    /// Slot the item equips into, if any.
    #[serde(default)]
    pub slot: Option<EquipSlot>,
    /// Whether the item occupies both hand slots.
    #[serde(default)]
    pub two_handed: bool,
    /// Weapon damage modifier.
    #[serde(default)]
    pub damage: u32,
    /// Armor modifier (worn) or shield armor (off-hand).
    #[serde(default)]
    pub armor: u32,
    /// Weapon accuracy modifier.
    #[serde(default)]
    pub accuracy: u32,
    /// Dodge penalty while worn.
    #[serde(default)]
    pub armor_penalty: u32,
    /// Shield block modifier; non-zero only for shields.
    #[serde(default)]
    pub block_bonus: u32,
    /// Saturation restored when eaten.
    #[serde(default)]
    pub nutrition: u32,
    /// Whether crafting rolls a quality tier for this item.
    #[serde(default)]
    pub quality_eligible: bool,
    /// Ammunition family, for throwable/shootable items.
    #[serde(default)]
    pub ammo: Option<AmmoKind>,
    /// Weapon family the item trains and draws accuracy from.
    #[serde(default)]
    pub weapon_skill: Option<SkillType>,
}

impl ItemDefinition {
    /// Creates a plain, non-equippable item definition.
    #[must_use]
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, weight: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            weight,
            slot: None,
            two_handed: false,
            damage: 0,
            armor: 0,
            accuracy: 0,
            armor_penalty: 0,
            block_bonus: 0,
            nutrition: 0,
            quality_eligible: false,
            ammo: None,
            weapon_skill: None,
        }
    }

    /// Makes the item equip into a slot.
    #[must_use]
    pub fn with_slot(mut self, slot: EquipSlot) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Marks the item as occupying both hand slots.
    #[must_use]
    pub fn two_handed(mut self) -> Self {
        self.two_handed = true;
        self
    }

    /// Sets the weapon damage and family.
    #[must_use]
    pub fn with_damage(mut self, damage: u32, skill: SkillType) -> Self {
        self.damage = damage;
        self.weapon_skill = Some(skill);
        self
    }

    /// Sets the accuracy modifier.
    #[must_use]
    pub fn with_accuracy(mut self, accuracy: u32) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Sets armor and its dodge penalty.
    #[must_use]
    pub fn with_armor(mut self, armor: u32, penalty: u32) -> Self {
        self.armor = armor;
        self.armor_penalty = penalty;
        self
    }

    /// Sets the shield block modifier.
    #[must_use]
    pub fn with_block_bonus(mut self, bonus: u32) -> Self {
        self.block_bonus = bonus;
        self
    }

    /// Sets the nutrition value.
    #[must_use]
    pub fn with_nutrition(mut self, nutrition: u32) -> Self {
        self.nutrition = nutrition;
        self
    }

    /// Enables quality rolls when crafted.
    #[must_use]
    pub fn quality_eligible(mut self) -> Self {
        self.quality_eligible = true;
        self
    }

    /// Sets the ammunition family.
    #[must_use]
    pub fn with_ammo(mut self, ammo: AmmoKind) -> Self {
        self.ammo = Some(ammo);
        self
    }

    /// Returns whether the item is a ranged weapon or projectile.
    #[must_use]
    pub fn is_ranged(&self) -> bool {
        matches!(
            self.weapon_skill,
            Some(SkillType::Archery | SkillType::Throwing)
        )
    }
}

/// An ingredient of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Item required.
    pub item: ItemId,
    /// Quantity required.
    pub quantity: u32,
}

impl Ingredient {
    /// Creates an ingredient requirement.
    #[must_use]
    pub fn new(item: impl Into<ItemId>, quantity: u32) -> Self {
        Self {
            item: item.into(),
            quantity,
        }
    }
}

/// Static definition of a crafting recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDefinition {
    /// Stable identifier.
    pub id: RecipeId,
    /// Display name.
    pub name: String,
    /// Consumed inputs.
    pub inputs: Vec<Ingredient>,
    /// Produced item.
    pub output: ItemId,
    /// Produced quantity.
    pub output_quantity: u32,
    /// Tick cost of the attempt.
    pub tick_cost: u32,
    /// Whether a lit campfire is required.
    #[serde(default)]
    pub requires_campfire: bool,
    /// Base failure chance before skill mitigation.
    #[serde(default = "default_failure_base")]
    pub failure_base: f32,
    /// Crafting XP granted on success (halved on failure).
    pub skill_xp: u64,
}

fn default_failure_base() -> f32 {
    0.25
}

impl RecipeDefinition {
    /// Creates a recipe builder.
    #[must_use]
    pub fn builder(id: impl Into<RecipeId>, name: impl Into<String>) -> RecipeBuilder {
        RecipeBuilder {
            id: id.into(),
            name: name.into(),
            inputs: Vec::new(),
            output: None,
            output_quantity: 1,
            tick_cost: 10,
            requires_campfire: false,
            failure_base: default_failure_base(),
            skill_xp: 10,
        }
    }
}

/// Builder for recipe definitions.
#[derive(Debug)]
pub struct RecipeBuilder {
    id: RecipeId,
    name: String,
    inputs: Vec<Ingredient>,
    output: Option<ItemId>,
    output_quantity: u32,
    tick_cost: u32,
    requires_campfire: bool,
    failure_base: f32,
    skill_xp: u64,
}

impl RecipeBuilder {
    /// Adds a consumed input.
    #[must_use]
    pub fn input(mut self, item: impl Into<ItemId>, quantity: u32) -> Self {
        self.inputs.push(Ingredient::new(item, quantity));
        self
    }

    /// Sets the output item and quantity.
    #[must_use]
    pub fn output(mut self, item: impl Into<ItemId>, quantity: u32) -> Self {
        self.output = Some(item.into());
        self.output_quantity = quantity;
        self
    }

    /// Sets the tick cost.
    #[must_use]
    pub const fn tick_cost(mut self, ticks: u32) -> Self {
        self.tick_cost = ticks;
        self
    }

    /// Requires a lit campfire.
    #[must_use]
    pub const fn requires_campfire(mut self) -> Self {
        self.requires_campfire = true;
        self
    }

    /// Sets the base failure chance.
    #[must_use]
    pub const fn failure_base(mut self, chance: f32) -> Self {
        self.failure_base = chance;
        self
    }

    /// Sets the crafting XP granted on success.
    #[must_use]
    pub const fn skill_xp(mut self, xp: u64) -> Self {
        self.skill_xp = xp;
        self
    }

    /// Builds the recipe.
    ///
    /// # Panics
    /// Panics if no output item was set.
    #[must_use]
    pub fn build(self) -> RecipeDefinition {
        RecipeDefinition {
            id: self.id,
            name: self.name,
            inputs: self.inputs,
            output: self.output.expect("Recipe must have an output item"),
            output_quantity: self.output_quantity,
            tick_cost: self.tick_cost,
            requires_campfire: self.requires_campfire,
            failure_base: self.failure_base,
            skill_xp: self.skill_xp,
        }
    }
}

/// One entry of an enemy's loot table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootEntry {
    /// Dropped item.
    pub item: ItemId,
    /// Base drop chance in [0, 1], scaled by the player's loot bonus.
    pub chance: f32,
    /// Minimum dropped quantity.
    pub min_quantity: u32,
    /// Maximum dropped quantity.
    pub max_quantity: u32,
}

impl LootEntry {
    /// Creates a loot entry.
    #[must_use]
    pub fn new(item: impl Into<ItemId>, chance: f32, min_quantity: u32, max_quantity: u32) -> Self {
        Self {
            item: item.into(),
            chance,
            min_quantity,
            max_quantity,
        }
    }
}

/// Static definition of an enemy archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    /// Stable identifier.
    pub id: EnemyId,
    /// Display name.
    pub name: String,
    /// Health at level 1.
    pub base_health: u32,
    /// Base damage per attack.
    pub base_damage: u32,
    /// Action speed; drives the encounter tick accumulator.
    pub speed: u32,
    /// Health fraction at or below which the enemy considers fleeing.
    pub flee_threshold: f32,
    /// Baseline aggressiveness in [0, 1]; drifts within an encounter.
    pub aggressiveness: f32,
    /// Attribute growth applied per level above 1.
    #[serde(default)]
    pub stat_growth: Stats,
    /// Attributes at level 1.
    #[serde(default)]
    pub base_stats: Stats,
    /// Extra health per level above 1.
    #[serde(default)]
    pub health_growth: u32,
    /// Character XP awarded on victory.
    pub xp_reward: u64,
    /// Loot table rolled on victory.
    #[serde(default)]
    pub loot: Vec<LootEntry>,
}

impl EnemyTemplate {
    /// Creates a template with neutral defaults.
    #[must_use]
    pub fn new(id: impl Into<EnemyId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_health: 30,
            base_damage: 5,
            speed: 100,
            flee_threshold: 0.25,
            aggressiveness: 0.5,
            stat_growth: Stats::new(),
            base_stats: Stats::new(),
            health_growth: 5,
            xp_reward: 25,
            loot: Vec::new(),
        }
    }

    /// Sets base health and per-level growth.
    #[must_use]
    pub const fn with_health(mut self, base: u32, growth: u32) -> Self {
        self.base_health = base;
        self.health_growth = growth;
        self
    }

    /// Sets base damage.
    #[must_use]
    pub const fn with_damage(mut self, damage: u32) -> Self {
        self.base_damage = damage;
        self
    }

    /// Sets the action speed.
    #[must_use]
    pub const fn with_speed(mut self, speed: u32) -> Self {
        self.speed = speed;
        self
    }

    /// Sets temperament: baseline aggressiveness and flee threshold.
    #[must_use]
    pub fn with_temperament(mut self, aggressiveness: f32, flee_threshold: f32) -> Self {
        self.aggressiveness = aggressiveness.clamp(0.0, 1.0);
        self.flee_threshold = flee_threshold.clamp(0.0, 1.0);
        self
    }

    /// Sets level-1 attributes and per-level growth.
    #[must_use]
    pub const fn with_stats(mut self, base: Stats, growth: Stats) -> Self {
        self.base_stats = base;
        self.stat_growth = growth;
        self
    }

    /// Sets the XP reward.
    #[must_use]
    pub const fn with_xp_reward(mut self, xp: u64) -> Self {
        self.xp_reward = xp;
        self
    }

    /// Adds a loot table entry.
    #[must_use]
    pub fn with_loot(mut self, entry: LootEntry) -> Self {
        self.loot.push(entry);
        self
    }
}

/// Static definition of a harvestable resource node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNodeDefinition {
    /// Stable identifier.
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Chance of finding the resource on an attempt.
    pub discovery_chance: f32,
    /// Chance the node depletes after a successful harvest.
    pub depletion_chance: f32,
    /// Harvested item.
    pub yield_item: ItemId,
    /// Base yield per successful harvest.
    pub base_yield: u32,
    /// Harvesting discipline the node trains.
    pub skill: SkillType,
    /// Tick cost of the attempt.
    pub tick_cost: u32,
    /// Skill XP granted on success (halved on failure or a miss).
    pub skill_xp: u64,
}

impl ResourceNodeDefinition {
    /// Creates a node definition.
    #[must_use]
    pub fn new(
        id: impl Into<NodeId>,
        name: impl Into<String>,
        yield_item: impl Into<ItemId>,
        skill: SkillType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            discovery_chance: 0.8,
            depletion_chance: 0.1,
            yield_item: yield_item.into(),
            base_yield: 1,
            skill,
            tick_cost: 10,
            skill_xp: 8,
        }
    }

    /// Sets discovery and depletion chances.
    #[must_use]
    pub fn with_chances(mut self, discovery: f32, depletion: f32) -> Self {
        self.discovery_chance = discovery.clamp(0.0, 1.0);
        self.depletion_chance = depletion.clamp(0.0, 1.0);
        self
    }

    /// Sets the base yield.
    #[must_use]
    pub const fn with_yield(mut self, base_yield: u32) -> Self {
        self.base_yield = base_yield;
        self
    }

    /// Sets tick cost and XP.
    #[must_use]
    pub const fn with_costs(mut self, tick_cost: u32, skill_xp: u64) -> Self {
        self.tick_cost = tick_cost;
        self.skill_xp = skill_xp;
        self
    }
}

/// Static definition of a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDefinition {
    /// Stable identifier.
    pub id: LocationId,
    /// Display name.
    pub name: String,
    /// Enclosing location, if nested.
    #[serde(default)]
    pub parent: Option<LocationId>,
    /// Chance of discovering this location while exploring its parent.
    pub discovery_chance: f32,
    /// Enemy archetypes that can spawn here.
    #[serde(default)]
    pub enemies: Vec<EnemyId>,
    /// Resource nodes present here.
    #[serde(default)]
    pub nodes: Vec<NodeId>,
}

impl LocationDefinition {
    /// Creates a location definition.
    #[must_use]
    pub fn new(id: impl Into<LocationId>, name: impl Into<String>, discovery_chance: f32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent: None,
            discovery_chance,
            enemies: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Nests this location under a parent.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<LocationId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Adds an enemy archetype.
    #[must_use]
    pub fn with_enemy(mut self, enemy: impl Into<EnemyId>) -> Self {
        self.enemies.push(enemy.into());
        self
    }

    /// Adds a resource node.
    #[must_use]
    pub fn with_node(mut self, node: impl Into<NodeId>) -> Self {
        self.nodes.push(node.into());
        self
    }
}

/// Serialized shape of a complete content set (for RON authoring).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentSet {
    /// Item definitions.
    #[serde(default)]
    pub items: Vec<ItemDefinition>,
    /// Recipe definitions.
    #[serde(default)]
    pub recipes: Vec<RecipeDefinition>,
    /// Enemy templates.
    #[serde(default)]
    pub enemies: Vec<EnemyTemplate>,
    /// Resource-node definitions.
    #[serde(default)]
    pub nodes: Vec<ResourceNodeDefinition>,
    /// Location definitions.
    #[serde(default)]
    pub locations: Vec<LocationDefinition>,
}

/// Immutable lookup structure over all content tables.
///
/// Built once at startup and passed by reference into the engine; never an
/// ambient global, so tests can fabricate arbitrary content sets.
#[derive(Debug, Default)]
pub struct ContentRegistry {
    items: AHashMap<ItemId, ItemDefinition>,
    recipes: AHashMap<RecipeId, RecipeDefinition>,
    enemies: AHashMap<EnemyId, EnemyTemplate>,
    nodes: AHashMap<NodeId, ResourceNodeDefinition>,
    locations: AHashMap<LocationId, LocationDefinition>,
}

impl ContentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a content set.
    #[must_use]
    pub fn from_set(set: ContentSet) -> Self {
        let mut registry = Self::new();
        for item in set.items {
            registry.register_item(item);
        }
        for recipe in set.recipes {
            registry.register_recipe(recipe);
        }
        for enemy in set.enemies {
            registry.register_enemy(enemy);
        }
        for node in set.nodes {
            registry.register_node(node);
        }
        for location in set.locations {
            registry.register_location(location);
        }
        registry
    }

    /// Parses a RON-encoded content set into a registry.
    pub fn from_ron(source: &str) -> AshfallResult<Self> {
        let set: ContentSet =
            ron::from_str(source).map_err(|e| AshfallError::Serialization(e.to_string()))?;
        Ok(Self::from_set(set))
    }

    /// Registers an item definition.
    pub fn register_item(&mut self, item: ItemDefinition) {
        self.items.insert(item.id.clone(), item);
    }

    /// Registers a recipe definition.
    pub fn register_recipe(&mut self, recipe: RecipeDefinition) {
        self.recipes.insert(recipe.id.clone(), recipe);
    }

    /// Registers an enemy template.
    pub fn register_enemy(&mut self, enemy: EnemyTemplate) {
        self.enemies.insert(enemy.id.clone(), enemy);
    }

    /// Registers a resource-node definition.
    pub fn register_node(&mut self, node: ResourceNodeDefinition) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Registers a location definition.
    pub fn register_location(&mut self, location: LocationDefinition) {
        self.locations.insert(location.id.clone(), location);
    }

    /// Looks up an item definition.
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&ItemDefinition> {
        self.items.get(id)
    }

    /// Looks up a recipe definition.
    #[must_use]
    pub fn recipe(&self, id: &str) -> Option<&RecipeDefinition> {
        self.recipes.get(id)
    }

    /// Looks up an enemy template.
    #[must_use]
    pub fn enemy(&self, id: &str) -> Option<&EnemyTemplate> {
        self.enemies.get(id)
    }

    /// Looks up a resource-node definition.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&ResourceNodeDefinition> {
        self.nodes.get(id)
    }

    /// Looks up a location definition.
    #[must_use]
    pub fn location(&self, id: &str) -> Option<&LocationDefinition> {
        self.locations.get(id)
    }

    /// Item weight with an unknown id degrading to zero.
    #[must_use]
    pub fn item_weight(&self, id: &str) -> u32 {
        self.item(id).map_or(0, |item| item.weight)
    }

    /// Iterates all item definitions.
    pub fn items(&self) -> impl Iterator<Item = &ItemDefinition> {
        self.items.values()
    }

    /// Iterates all recipe definitions.
    pub fn recipes(&self) -> impl Iterator<Item = &RecipeDefinition> {
        self.recipes.values()
    }
}
