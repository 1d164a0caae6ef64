//! # Ashfall Gameplay
//!
//! Simulation systems for Ashfall, a tick-driven survival RPG.
//!
//! This crate provides the discrete-turn simulation core:
//! - Core attributes and derived combat ratings
//! - Skill progression with diminishing-returns effect curves
//! - The actor model (ticks, health, saturation, inventory, equipment)
//! - Single-exchange combat resolution
//! - The encounter state machine with projectile recovery
//! - Character progression, stat allocation, and loot
//! - Crafting and harvesting pipelines
//! - Content-table boundary types and the injected registry
//!
//! The crate renders nothing, persists nothing, and owns no event loop;
//! the surrounding application spends ticks through the actor model and
//! forwards player intent into the combat, crafting, and harvesting
//! entry points. All randomness flows through the injectable
//! [`rng::RandomSource`] so tests can script every roll.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod actor;
pub mod combat;
pub mod content;
pub mod crafting;
pub mod encounter;
pub mod equipment;
pub mod harvesting;
pub mod inventory;
pub mod progression;
pub mod rng;
pub mod skills;
pub mod stats;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::actor::*;
    pub use crate::combat::*;
    pub use crate::content::*;
    pub use crate::crafting::*;
    pub use crate::encounter::*;
    pub use crate::equipment::*;
    pub use crate::harvesting::*;
    pub use crate::inventory::*;
    pub use crate::progression::*;
    pub use crate::rng::*;
    pub use crate::skills::*;
    pub use crate::stats::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use ashfall_common::ItemId;

    fn registry() -> ContentRegistry {
        let mut registry = ContentRegistry::new();
        registry.register_item(
            ItemDefinition::new("flint_knife", "Flint Knife", 2)
                .with_slot(EquipSlot::MainHand)
                .with_damage(5, SkillType::Blades)
                .with_accuracy(3)
                .quality_eligible(),
        );
        registry.register_item(ItemDefinition::new("flint", "Flint", 1));
        registry.register_item(ItemDefinition::new("branch", "Branch", 1));
        registry.register_item(
            ItemDefinition::new("dried_meat", "Dried Meat", 1).with_nutrition(25),
        );
        registry.register_recipe(
            RecipeDefinition::builder("flint_knife", "Flint Knife")
                .input("flint", 2)
                .input("branch", 1)
                .output("flint_knife", 1)
                .tick_cost(20)
                .skill_xp(10)
                .build(),
        );
        registry.register_enemy(
            EnemyTemplate::new("boar", "Boar")
                .with_health(25, 5)
                .with_damage(4)
                .with_speed(100)
                .with_temperament(0.6, 0.25)
                .with_xp_reward(60)
                .with_loot(LootEntry::new("raw_meat", 0.9, 1, 2)),
        );
        registry
    }

    /// Craft a weapon, equip it, fight an enemy to the death, collect the
    /// spoils. The whole loop runs on one seeded generator.
    #[test]
    fn test_full_survival_loop() {
        let registry = registry();
        let mut rng = GameRng::new(1234);
        let mut player = Actor::new(
            "Wanderer",
            ActorConfig {
                stats: Stats {
                    strength: 3,
                    agility: 4,
                    precision: 4,
                    vitality: 2,
                    ..Stats::new()
                },
                ..ActorConfig::default()
            },
        );
        player.add_item(&registry, "flint", 2).expect("light");
        player.add_item(&registry, "branch", 1).expect("light");

        // Craft until the knife exists (failure loses materials, so top
        // the inputs back up when the roll goes badly).
        let mut outcome = craft(&mut player, &registry, "flint_knife", false, 0, &mut rng)
            .expect("materials present");
        while !outcome.success {
            player.add_item(&registry, "flint", 2).expect("light");
            player.add_item(&registry, "branch", 1).expect("light");
            player.grant_ticks(20);
            outcome = craft(&mut player, &registry, "flint_knife", false, 0, &mut rng)
                .expect("materials present");
        }
        let quality = outcome.quality.expect("knife is quality-eligible");

        player
            .equip_with_quality(&registry, "flint_knife", quality)
            .expect("crafted and carried");
        assert!(player.derived.weapon_damage > 0);

        let template = registry.enemy("boar").expect("registered").clone();
        let mut encounter = Encounter::start(&template, 1);

        let mut turns = 0;
        while !encounter.is_over() {
            turns += 1;
            assert!(turns < 500, "encounter failed to converge");

            player.try_spend_ticks(10).expect("regenerated below");
            if encounter
                .player_attack(&mut player, &registry, &mut rng)
                .is_err()
            {
                break;
            }
            if encounter.is_over() {
                break;
            }
            let _ = encounter.process_enemy_turn(&mut player, &mut rng);
            player.grant_ticks(20);
        }

        let result = encounter.result().expect("loop ended");
        let summary = encounter
            .finish(&mut player, &registry, &mut rng)
            .expect("over");
        assert_eq!(summary.result, result);
        if result == EncounterResult::Victory {
            assert_eq!(summary.xp_gained, 60);
            assert!(player.level_info.xp > 0 || player.level() > 1);
        }
    }

    /// Starvation flow: drained saturation flags the actor; the caller
    /// applies the damage and feeds the actor to recover.
    #[test]
    fn test_hunger_cycle() {
        let registry = registry();
        let mut player = Actor::new("Hungry", ActorConfig::default());
        player.add_item(&registry, "dried_meat", 1).expect("light");

        player.drain_saturation(10_000);
        assert!(player.is_starving());

        // Starvation damage is the caller's job, observed via state.
        player.apply_damage(5);
        assert_eq!(player.health(), player.max_health() - 5);

        player.eat(&registry, "dried_meat").expect("edible");
        assert!(!player.is_starving());
        assert_eq!(player.saturation(), 25);
    }

    /// Structured results serialize for the caller's rendering layer.
    #[test]
    fn test_outcomes_serialize() {
        let registry = registry();
        let mut player = Actor::new("Wanderer", ActorConfig::default());
        let template = registry.enemy("boar").expect("registered").clone();
        let mut encounter = Encounter::start(&template, 1);

        let mut rng = SequenceRng::new(vec![0.99, 0.0]);
        let outcome = encounter
            .player_attack(&mut player, &registry, &mut rng)
            .expect("active");

        let json = serde_json::to_string(&outcome).expect("serializes");
        let back: AttackOutcome = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back.tag, outcome.tag);

        let turn = encounter
            .process_enemy_turn(&mut player, &mut SequenceRng::new(vec![0.99, 0.99]))
            .expect("active");
        let json = serde_json::to_string(&turn).expect("serializes");
        assert!(json.contains("Attacked") || json.contains("Waited"));
    }

    /// The same seed drives the same story, end to end.
    #[test]
    fn test_determinism_across_runs() {
        let run = || {
            let registry = registry();
            let mut rng = GameRng::new(77);
            let mut player = Actor::new(
                "Wanderer",
                ActorConfig {
                    stats: Stats {
                        agility: 3,
                        precision: 3,
                        ..Stats::new()
                    },
                    ..ActorConfig::default()
                },
            );
            let template = registry.enemy("boar").expect("registered").clone();
            let mut encounter = Encounter::start(&template, 1);

            let mut log = Vec::new();
            for _ in 0..50 {
                if encounter.is_over() {
                    break;
                }
                if let Ok(outcome) = encounter.player_attack(&mut player, &registry, &mut rng) {
                    log.push(outcome.tag);
                }
                if encounter.is_over() {
                    break;
                }
                let _ = encounter.process_enemy_turn(&mut player, &mut rng);
            }
            (log, encounter.result(), player.health())
        };

        assert_eq!(run(), run());
    }

    /// Loot scaled by luck flows into the inventory on victory.
    #[test]
    fn test_victory_loot_lands_in_inventory() {
        let registry = registry();
        let mut player = Actor::new(
            "Lucky",
            ActorConfig {
                stats: Stats {
                    luck: 4,
                    ..Stats::new()
                },
                ..ActorConfig::default()
            },
        );
        player.base_damage = 10_000;
        let template = registry.enemy("boar").expect("registered").clone();
        let mut encounter = Encounter::start(&template, 1);

        let mut rng = SequenceRng::new(vec![0.99, 0.0]);
        encounter
            .player_attack(&mut player, &registry, &mut rng)
            .expect("active");

        // Loot chance 0.9 * (1 + 0.2) clamps to 1.0; 0.99 still drops.
        // Quantity draw 0.5 in [1, 2] picks 2.
        let mut rng = SequenceRng::new(vec![0.99, 0.5]);
        let summary = encounter
            .finish(&mut player, &registry, &mut rng)
            .expect("over");

        assert_eq!(summary.loot, vec![(ItemId::new("raw_meat"), 2)]);
        assert_eq!(player.inventory.count("raw_meat"), 2);
    }
}
