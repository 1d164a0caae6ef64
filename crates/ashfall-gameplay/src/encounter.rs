//! Encounter state machine.
//!
//! This module provides:
//! - Per-encounter enemy state (aggressiveness drift, flee flags, pacing)
//! - The enemy decision policy: attack, flee, chase, or wait
//! - Projectile bookkeeping and post-encounter ammo recovery
//!
//! The encounter is an explicit state object passed by reference through
//! each turn call, never recomputed from scratch: aggressiveness drifts
//! with player behavior and the enemy acts only once per accumulated tick
//! threshold, so both have to live somewhere between calls. Encounters are
//! discarded at fight end, not archived.

use ashfall_common::ItemId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::actor::Actor;
use crate::combat::{resolve_attack, AttackOutcome, OutcomeTag};
use crate::content::{AmmoKind, ContentRegistry, EnemyTemplate, LootEntry};
use crate::progression::{roll_loot, LevelUpReward};
use crate::rng::RandomSource;
use crate::skills::SkillType;

/// Ticks the enemy must accumulate before it may act.
pub const ENEMY_ACT_THRESHOLD: u32 = 200;

/// Aggressiveness gained when the player attacks.
pub const AGGRO_ON_ATTACK: f32 = 0.3;

/// Aggressiveness lost when the player idles.
pub const AGGRO_ON_IDLE: f32 = 0.1;

/// Below this aggressiveness an enemy is passive: it neither attacks nor
/// chases.
pub const PASSIVE_THRESHOLD: f32 = 0.2;

/// Weapon-skill XP granted per landed player hit.
pub const WEAPON_XP_PER_HIT: u64 = 5;

/// Base recovery fraction for thrown rocks.
pub const ROCK_RECOVERY_BASE: f32 = 0.95;

/// Base recovery fraction for arrows.
pub const ARROW_RECOVERY_BASE: f32 = 0.60;

/// Extra arrow-recovery factor when the enemy escaped with them.
pub const ESCAPED_ARROW_FACTOR: f32 = 0.25;

/// Encounter error types.
#[derive(Debug, Clone, Error)]
pub enum EncounterError {
    /// The encounter has already ended
    #[error("Encounter is already over: {0:?}")]
    AlreadyOver(EncounterResult),
    /// The encounter has not ended yet
    #[error("Encounter is still active")]
    StillActive,
    /// No ammunition for the equipped ranged weapon
    #[error("No {0:?} ammunition")]
    NoAmmo(AmmoKind),
}

/// Result type for encounter operations.
pub type TurnResult<T> = Result<T, EncounterError>;

/// Terminal outcome of an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterResult {
    /// The enemy died.
    Victory,
    /// The player died.
    Defeat,
    /// The player disengaged successfully.
    PlayerEscaped,
    /// The enemy disengaged successfully.
    EnemyEscaped,
}

/// Current state of the encounter machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterState {
    /// Both sides committed to the fight.
    Engaged,
    /// The player is attempting to disengage.
    PlayerFleeing,
    /// The enemy is attempting to disengage.
    EnemyFleeing,
    /// The fight is over.
    Ended(EncounterResult),
}

/// What the enemy did with its turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnemyTurn {
    /// Still accumulating ticks; no action this turn.
    Waited,
    /// Passive temperament; took no action.
    Passive,
    /// Attacked the player.
    Attacked(AttackOutcome),
    /// Dropped to its flee threshold and started running.
    StartedFleeing,
    /// Escaped; the encounter is over.
    Escaped,
    /// Failed to escape and was forced back into the fight this turn.
    FleeFailed(AttackOutcome),
    /// Declined to chase the fleeing player; the player escaped.
    LetPlayerGo,
    /// Chased the fleeing player but lost them; the player escaped.
    ChaseFailed,
    /// Chased the fleeing player and caught them; re-engaged.
    CaughtPlayer,
}

/// One aggregated projectile record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TallyEntry {
    item: ItemId,
    kind: AmmoKind,
    outcome: OutcomeTag,
    count: u32,
}

/// Per-encounter projectile bookkeeping, bucketed by ammo type and by
/// exchange outcome. Consulted only at encounter end.
///
/// Entries keep insertion order so the recovery draws stay deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectileTally {
    entries: Vec<TallyEntry>,
}

impl ProjectileTally {
    /// Records one fired projectile.
    pub fn record(&mut self, item: ItemId, kind: AmmoKind, outcome: OutcomeTag) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.item == item && e.outcome == outcome)
        {
            entry.count += 1;
        } else {
            self.entries.push(TallyEntry {
                item,
                kind,
                outcome,
                count: 1,
            });
        }
    }

    /// Total projectiles fired.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Projectiles fired of one ammo kind.
    #[must_use]
    pub fn fired(&self, kind: AmmoKind) -> u32 {
        self.entries
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.count)
            .sum()
    }

    /// Rolls recovery for every projectile individually.
    ///
    /// Each projectile is an independent Bernoulli draw against
    /// base(kind) × outcome multiplier (× 0.25 for arrows the enemy
    /// escaped with), preserving integer counts and variance. Zero shots
    /// make zero draws.
    #[must_use]
    pub fn roll_recovery(&self, enemy_escaped: bool, rng: &mut dyn RandomSource) -> AmmoRecovery {
        let mut recovery = AmmoRecovery::default();
        for entry in &self.entries {
            let base = match entry.kind {
                AmmoKind::Rock => ROCK_RECOVERY_BASE,
                AmmoKind::Arrow => ARROW_RECOVERY_BASE,
            };
            let outcome_factor = match entry.outcome {
                OutcomeTag::Hit => 1.0,
                OutcomeTag::Blocked => 0.9,
                OutcomeTag::Dodged => 0.7,
                OutcomeTag::Missed => 0.6,
            };
            let escape_factor = if enemy_escaped && entry.kind == AmmoKind::Arrow {
                ESCAPED_ARROW_FACTOR
            } else {
                1.0
            };
            let chance = base * outcome_factor * escape_factor;

            let mut recovered = 0;
            for _ in 0..entry.count {
                if rng.roll(chance) {
                    recovered += 1;
                }
            }
            if recovered > 0 {
                match entry.kind {
                    AmmoKind::Rock => recovery.rocks += recovered,
                    AmmoKind::Arrow => recovery.arrows += recovered,
                }
                recovery.push_item(entry.item.clone(), recovered);
            }
        }
        recovery
    }
}

/// Recovered ammunition, by kind and by item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoRecovery {
    /// Rocks recovered.
    pub rocks: u32,
    /// Arrows recovered.
    pub arrows: u32,
    /// Recovered items and counts, in tally order.
    pub items: Vec<(ItemId, u32)>,
}

impl AmmoRecovery {
    fn push_item(&mut self, item: ItemId, count: u32) {
        if let Some(existing) = self.items.iter_mut().find(|(id, _)| *id == item) {
            existing.1 += count;
        } else {
            self.items.push((item, count));
        }
    }
}

/// Structured summary returned when an encounter is finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterSummary {
    /// Terminal result.
    pub result: EncounterResult,
    /// Character XP granted (victory only).
    pub xp_gained: u64,
    /// Level-ups applied by the XP grant.
    pub level_up: LevelUpReward,
    /// Loot added to the player's inventory (victory only).
    pub loot: Vec<(ItemId, u32)>,
    /// Ammunition recovered from the field.
    pub recovered: AmmoRecovery,
}

/// An active fight between the player and one enemy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encounter {
    /// The opposing actor, owned for the encounter's lifetime.
    pub enemy: Actor,
    flee_threshold: f32,
    aggressiveness: f32,
    player_fleeing: bool,
    enemy_fleeing: bool,
    enemy_ticks: u32,
    turn: u64,
    result: Option<EncounterResult>,
    tally: ProjectileTally,
    xp_reward: u64,
    loot: Vec<LootEntry>,
}

impl Encounter {
    /// Starts an encounter against a templated enemy at the given level.
    #[must_use]
    pub fn start(template: &EnemyTemplate, level: u32) -> Self {
        let enemy = Actor::from_template(template, level);
        debug!(enemy = %enemy.name, level, "encounter started");
        Self {
            enemy,
            flee_threshold: template.flee_threshold,
            aggressiveness: template.aggressiveness.clamp(0.0, 1.0),
            player_fleeing: false,
            enemy_fleeing: false,
            enemy_ticks: 0,
            turn: 0,
            result: None,
            tally: ProjectileTally::default(),
            xp_reward: template.xp_reward,
            loot: template.loot.clone(),
        }
    }

    /// Current encounter state.
    #[must_use]
    pub fn state(&self) -> EncounterState {
        match self.result {
            Some(result) => EncounterState::Ended(result),
            None if self.player_fleeing => EncounterState::PlayerFleeing,
            None if self.enemy_fleeing => EncounterState::EnemyFleeing,
            None => EncounterState::Engaged,
        }
    }

    /// Terminal result, if the encounter has ended.
    #[must_use]
    pub const fn result(&self) -> Option<EncounterResult> {
        self.result
    }

    /// Whether the encounter has ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.result.is_some()
    }

    /// Current (drifted) aggressiveness.
    #[must_use]
    pub const fn aggressiveness(&self) -> f32 {
        self.aggressiveness
    }

    /// Turns processed so far.
    #[must_use]
    pub const fn turn(&self) -> u64 {
        self.turn
    }

    /// Projectiles fired so far.
    #[must_use]
    pub const fn tally(&self) -> &ProjectileTally {
        &self.tally
    }

    fn ensure_active(&self) -> TurnResult<()> {
        match self.result {
            Some(result) => Err(EncounterError::AlreadyOver(result)),
            None => Ok(()),
        }
    }

    /// Resolves the enemy-fleeing precedence rule after a player action
    /// that was not a chase.
    fn auto_resolve_fleeing_enemy(&mut self) {
        if self.result.is_none() && self.enemy_fleeing {
            self.result = Some(EncounterResult::EnemyEscaped);
            debug!("fleeing enemy slipped away");
        }
    }

    /// The player attacks the enemy.
    ///
    /// Raises aggressiveness by 0.3 and clears the player's flee flag. A
    /// ranged weapon consumes one unit of matching ammunition from the
    /// player's inventory and records it for post-encounter recovery. If
    /// the enemy was already fleeing and survives the exchange, it escapes.
    pub fn player_attack(
        &mut self,
        player: &mut Actor,
        registry: &ContentRegistry,
        rng: &mut dyn RandomSource,
    ) -> TurnResult<AttackOutcome> {
        self.ensure_active()?;
        self.aggressiveness = (self.aggressiveness + AGGRO_ON_ATTACK).min(1.0);
        self.player_fleeing = false;

        let ammo = if player.derived.ranged {
            Some(self.take_ammo(player, registry)?)
        } else {
            None
        };

        let power = player.attack_power();
        let outcome = resolve_attack(player, &mut self.enemy, power, rng);

        if let Some((item, kind)) = ammo {
            self.tally.record(item, kind, outcome.tag);
        }
        if outcome.hit {
            if let Some(skill) = player.derived.weapon_skill {
                if player.skills.add_experience(skill, WEAPON_XP_PER_HIT, self.turn) > 0 {
                    player.recalculate_derived(registry);
                }
            }
        }

        if self.enemy.is_dead() {
            self.result = Some(EncounterResult::Victory);
        } else {
            self.auto_resolve_fleeing_enemy();
        }
        Ok(outcome)
    }

    /// Finds and consumes one unit of ammunition for the equipped weapon.
    fn take_ammo(
        &mut self,
        player: &mut Actor,
        registry: &ContentRegistry,
    ) -> TurnResult<(ItemId, AmmoKind)> {
        let kind = match player.derived.weapon_skill {
            Some(SkillType::Throwing) => AmmoKind::Rock,
            _ => AmmoKind::Arrow,
        };
        let Some(item) = player
            .inventory
            .find_by(registry, |def| def.ammo == Some(kind))
            .cloned()
        else {
            return Err(EncounterError::NoAmmo(kind));
        };
        // The item was just found in the inventory; removal cannot fail.
        let _ = player.inventory.remove(item.clone(), 1);
        Ok((item, kind))
    }

    /// The player attempts to disengage.
    ///
    /// A fleeing enemy escapes immediately (the flee was not a chase);
    /// otherwise the enemy's next turn makes the chase decision.
    pub fn player_flee(&mut self) -> TurnResult<()> {
        self.ensure_active()?;
        self.auto_resolve_fleeing_enemy();
        if self.result.is_none() {
            self.player_fleeing = true;
        }
        Ok(())
    }

    /// The player pursues a fleeing enemy, keeping the fight alive.
    pub fn player_chase(&mut self) -> TurnResult<()> {
        self.ensure_active()?;
        self.player_fleeing = false;
        Ok(())
    }

    /// The player spends the turn on something other than fighting.
    ///
    /// Lowers aggressiveness by 0.1; a fleeing enemy uses the opening to
    /// escape.
    pub fn player_idle(&mut self) -> TurnResult<()> {
        self.ensure_active()?;
        self.aggressiveness = (self.aggressiveness - AGGRO_ON_IDLE).max(0.0);
        self.auto_resolve_fleeing_enemy();
        Ok(())
    }

    /// Processes one enemy turn.
    ///
    /// The enemy first gains ticks proportional to 2×speed and only acts
    /// once 200 have accumulated, so faster enemies act more often. Roll
    /// order within an acting turn: chase roll then catch roll (player
    /// fleeing), escape roll (enemy fleeing), flee roll (at or below the
    /// flee threshold), then the attack exchange of `resolve_attack`.
    pub fn process_enemy_turn(
        &mut self,
        player: &mut Actor,
        rng: &mut dyn RandomSource,
    ) -> TurnResult<EnemyTurn> {
        self.ensure_active()?;
        self.turn += 1;

        self.enemy_ticks += 2 * self.enemy.speed;
        if self.enemy_ticks < ENEMY_ACT_THRESHOLD {
            return Ok(EnemyTurn::Waited);
        }
        self.enemy_ticks -= ENEMY_ACT_THRESHOLD;

        if self.player_fleeing {
            return Ok(self.chase_decision(player, rng));
        }

        if self.enemy_fleeing {
            let speed_ratio = self.enemy.speed as f32 / player.speed.max(1) as f32;
            let escape_chance = (0.4 * speed_ratio).min(0.9);
            if rng.roll(escape_chance) {
                self.result = Some(EncounterResult::EnemyEscaped);
                debug!(enemy = %self.enemy.name, "enemy escaped");
                return Ok(EnemyTurn::Escaped);
            }
            // Forced back into combat this same turn.
            self.enemy_fleeing = false;
            let outcome = self.enemy_attack(player, rng);
            return Ok(EnemyTurn::FleeFailed(outcome));
        }

        if self.aggressiveness < PASSIVE_THRESHOLD {
            return Ok(EnemyTurn::Passive);
        }

        if self.enemy.health_fraction() <= self.flee_threshold {
            let flee_chance =
                (1.0 - self.aggressiveness) * (1.0 - player.health_fraction() * 0.5);
            if rng.roll(flee_chance) {
                self.enemy_fleeing = true;
                debug!(enemy = %self.enemy.name, "enemy started fleeing");
                return Ok(EnemyTurn::StartedFleeing);
            }
        }

        let outcome = self.enemy_attack(player, rng);
        Ok(EnemyTurn::Attacked(outcome))
    }

    /// Chase decision against a fleeing player.
    fn chase_decision(&mut self, player: &mut Actor, rng: &mut dyn RandomSource) -> EnemyTurn {
        if self.aggressiveness < PASSIVE_THRESHOLD {
            self.result = Some(EncounterResult::PlayerEscaped);
            return EnemyTurn::LetPlayerGo;
        }

        let chase_chance = self.aggressiveness + (1.0 - player.health_fraction()) * 0.3;
        if !rng.roll(chase_chance) {
            self.result = Some(EncounterResult::PlayerEscaped);
            return EnemyTurn::LetPlayerGo;
        }

        let speed_ratio = self.enemy.speed as f32 / player.speed.max(1) as f32;
        let catch_chance = (0.5 * speed_ratio).min(0.9);
        if rng.roll(catch_chance) {
            self.player_fleeing = false;
            debug!(enemy = %self.enemy.name, "fleeing player caught");
            EnemyTurn::CaughtPlayer
        } else {
            self.result = Some(EncounterResult::PlayerEscaped);
            EnemyTurn::ChaseFailed
        }
    }

    fn enemy_attack(&mut self, player: &mut Actor, rng: &mut dyn RandomSource) -> AttackOutcome {
        let power = self.enemy.attack_power();
        let outcome = resolve_attack(&mut self.enemy, player, power, rng);
        if player.is_dead() {
            self.result = Some(EncounterResult::Defeat);
        }
        outcome
    }

    /// Finishes an ended encounter: awards XP and loot on victory, rolls
    /// projectile recovery, and returns the structured summary.
    ///
    /// Draw order: loot entries in template order, then recovery in tally
    /// order. Consumes the encounter; it is discarded, not archived.
    pub fn finish(
        self,
        player: &mut Actor,
        registry: &ContentRegistry,
        rng: &mut dyn RandomSource,
    ) -> TurnResult<EncounterSummary> {
        let result = self.result.ok_or(EncounterError::StillActive)?;

        let mut xp_gained = 0;
        let mut level_up = LevelUpReward::default();
        let mut loot = Vec::new();
        if result == EncounterResult::Victory {
            xp_gained = self.xp_reward;
            level_up = player.add_experience(registry, xp_gained);
            loot = roll_loot(&self.loot, player.derived.loot_bonus, rng);
            for (item, count) in &loot {
                player.inventory.add(item.clone(), *count);
            }
        }

        let recovered = self
            .tally
            .roll_recovery(result == EncounterResult::EnemyEscaped, rng);
        for (item, count) in &recovered.items {
            player.inventory.add(item.clone(), *count);
        }

        debug!(?result, xp_gained, "encounter finished");
        Ok(EncounterSummary {
            result,
            xp_gained,
            level_up,
            loot,
            recovered,
        })
    }
}
