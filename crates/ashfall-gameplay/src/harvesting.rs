//! Harvesting pipeline.
//!
//! An attempt spends ticks, then rolls in order: discovery (did the node
//! turn anything up), failure (skill-mitigated), and depletion (did the
//! node run dry). A miss or a botched attempt still grants half skill XP;
//! the ticks are spent either way.

use ashfall_common::{ItemId, NodeId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::actor::{Actor, ActorError};
use crate::content::ContentRegistry;
use crate::rng::RandomSource;
use crate::skills::{failure_chance, progress_factor};

/// Base harvest failure chance before skill mitigation.
pub const HARVEST_FAILURE_BASE: f32 = 0.2;

/// Harvesting error types.
#[derive(Debug, Clone, Error)]
pub enum HarvestError {
    /// Node not found
    #[error("Resource node not found: {0}")]
    NodeNotFound(NodeId),
    /// Actor error (ticks)
    #[error("Actor error: {0}")]
    Actor(#[from] ActorError),
}

/// Result type for harvesting operations.
pub type HarvestResult<T> = Result<T, HarvestError>;

/// Structured outcome of a committed harvest attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestOutcome {
    /// Node attempted.
    pub node: NodeId,
    /// Whether the resource was found at all.
    pub found: bool,
    /// Whether the harvest succeeded.
    pub success: bool,
    /// Item and quantity gathered on success.
    pub yielded: Option<(ItemId, u32)>,
    /// Whether the node depleted after this harvest.
    pub depleted: bool,
    /// Skill XP granted.
    pub xp_gained: u64,
    /// Skill levels gained by the grant.
    pub levels_gained: u32,
}

/// Attempts to harvest a resource node.
pub fn harvest(
    player: &mut Actor,
    registry: &ContentRegistry,
    node_id: &str,
    turn: u64,
    rng: &mut dyn RandomSource,
) -> HarvestResult<HarvestOutcome> {
    let node = registry
        .node(node_id)
        .ok_or_else(|| HarvestError::NodeNotFound(NodeId::new(node_id)))?;

    player.try_spend_ticks(node.tick_cost)?;

    let level = player.skills.level(node.skill);
    let half_xp = node.skill_xp / 2;

    // Roll 1: discovery. A miss is an outcome, not an error.
    if !rng.roll(node.discovery_chance) {
        let levels = player.skills.add_experience(node.skill, half_xp, turn);
        return Ok(HarvestOutcome {
            node: node.id.clone(),
            found: false,
            success: false,
            yielded: None,
            depleted: false,
            xp_gained: half_xp,
            levels_gained: levels,
        });
    }

    // Roll 2: skill-mitigated failure.
    if rng.roll(failure_chance(HARVEST_FAILURE_BASE, level)) {
        let levels = player.skills.add_experience(node.skill, half_xp, turn);
        debug!(node = %node.id, "harvest botched");
        return Ok(HarvestOutcome {
            node: node.id.clone(),
            found: true,
            success: false,
            yielded: None,
            depleted: false,
            xp_gained: half_xp,
            levels_gained: levels,
        });
    }

    // Yield bonus is a diminishing-returns fraction of the base yield.
    let bonus = (f64::from(node.base_yield) * f64::from(progress_factor(level))) as u32;
    let quantity = node.base_yield + bonus;
    player.inventory.add(node.yield_item.clone(), quantity);

    // Roll 3: depletion.
    let depleted = rng.roll(node.depletion_chance);
    let levels = player.skills.add_experience(node.skill, node.skill_xp, turn);

    debug!(node = %node.id, quantity, depleted, "harvest succeeded");
    Ok(HarvestOutcome {
        node: node.id.clone(),
        found: true,
        success: true,
        yielded: Some((node.yield_item.clone(), quantity)),
        depleted,
        xp_gained: node.skill_xp,
        levels_gained: levels,
    })
}
