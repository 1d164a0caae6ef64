//! Crafting pipeline.
//!
//! An attempt proceeds: resolve recipe, check campfire and materials
//! (typed failure, nothing mutated), spend ticks, then the attempt is
//! committed — inputs are consumed even when the failure roll lands.
//! A failed craft grants half skill XP and produces nothing ("failed but
//! learned something, lost materials" is a policy outcome, not an error).
//! Roll order: failure roll, then the quality roll on success only.

use ashfall_common::{ItemId, RecipeId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::actor::{Actor, ActorError};
use crate::content::{ContentRegistry, Ingredient};
use crate::inventory::InventoryError;
use crate::rng::RandomSource;
use crate::skills::{failure_chance, quality_for_roll, ItemQuality, SkillType};

/// Crafting error types.
#[derive(Debug, Clone, Error)]
pub enum CraftingError {
    /// Recipe not found
    #[error("Recipe not found: {0}")]
    RecipeNotFound(RecipeId),
    /// Recipe needs a lit campfire
    #[error("Recipe requires a lit campfire")]
    CampfireRequired,
    /// Missing specific ingredient
    #[error("Missing ingredient: {item}, need {needed}, have {have}")]
    MissingIngredient {
        /// Item that's missing
        item: ItemId,
        /// Amount needed
        needed: u32,
        /// Amount available
        have: u32,
    },
    /// Actor error (ticks)
    #[error("Actor error: {0}")]
    Actor(#[from] ActorError),
    /// Inventory error
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),
}

/// Result type for crafting operations.
pub type CraftingResult<T> = Result<T, CraftingError>;

/// Structured outcome of a committed craft attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraftOutcome {
    /// Recipe attempted.
    pub recipe: RecipeId,
    /// Whether the craft produced its output.
    pub success: bool,
    /// Quality rolled for the output, when it is quality-eligible.
    pub quality: Option<ItemQuality>,
    /// Item and quantity produced on success.
    pub produced: Option<(ItemId, u32)>,
    /// Inputs consumed (also on failure).
    pub consumed: Vec<Ingredient>,
    /// Crafting XP granted.
    pub xp_gained: u64,
    /// Crafting levels gained by the grant.
    pub levels_gained: u32,
}

/// Attempts a craft.
///
/// `campfire_lit` reports whether the required structure is present;
/// `turn` stamps the skill's last-trained turn.
pub fn craft(
    player: &mut Actor,
    registry: &ContentRegistry,
    recipe_id: &str,
    campfire_lit: bool,
    turn: u64,
    rng: &mut dyn RandomSource,
) -> CraftingResult<CraftOutcome> {
    let recipe = registry
        .recipe(recipe_id)
        .ok_or_else(|| CraftingError::RecipeNotFound(RecipeId::new(recipe_id)))?;

    if recipe.requires_campfire && !campfire_lit {
        return Err(CraftingError::CampfireRequired);
    }
    for ingredient in &recipe.inputs {
        let have = player.inventory.count(ingredient.item.as_str());
        if have < ingredient.quantity {
            return Err(CraftingError::MissingIngredient {
                item: ingredient.item.clone(),
                needed: ingredient.quantity,
                have,
            });
        }
    }

    player.try_spend_ticks(recipe.tick_cost)?;

    // Committed: inputs are gone whatever the rolls say.
    for ingredient in &recipe.inputs {
        player
            .inventory
            .remove(ingredient.item.clone(), ingredient.quantity)?;
    }

    let level = player.skills.level(SkillType::Crafting);
    let fail = rng.roll(failure_chance(recipe.failure_base, level));
    if fail {
        let xp = recipe.skill_xp / 2;
        let levels = player.skills.add_experience(SkillType::Crafting, xp, turn);
        debug!(recipe = %recipe.id, "craft failed, materials lost");
        return Ok(CraftOutcome {
            recipe: recipe.id.clone(),
            success: false,
            quality: None,
            produced: None,
            consumed: recipe.inputs.clone(),
            xp_gained: xp,
            levels_gained: levels,
        });
    }

    let quality = registry
        .item(recipe.output.as_str())
        .filter(|definition| definition.quality_eligible)
        .map(|_| quality_for_roll(level, rng.range(0.0, 100.0)));

    player
        .inventory
        .add(recipe.output.clone(), recipe.output_quantity);
    let levels = player
        .skills
        .add_experience(SkillType::Crafting, recipe.skill_xp, turn);

    debug!(recipe = %recipe.id, ?quality, "craft succeeded");
    Ok(CraftOutcome {
        recipe: recipe.id.clone(),
        success: true,
        quality,
        produced: Some((recipe.output.clone(), recipe.output_quantity)),
        consumed: recipe.inputs.clone(),
        xp_gained: recipe.skill_xp,
        levels_gained: levels,
    })
}
