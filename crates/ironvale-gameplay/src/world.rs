//! The simulation world.
//!
//! This module provides:
//! - `WorldConfig`, every tunable a level run needs
//! - `World`, owning the player, enemies, projectiles, and level walls
//! - `World::tick`, the fixed per-frame order:
//!   spawns, player, enemy AI (with wall correction), projectiles, hits,
//!   removals
//!
//! Events are collected into a `TickReport` instead of being pushed to
//! listeners; callers drain them once per tick.

use crate::animation::{FrameSetArena, ResourceProvider};
use crate::boss::BossPhase;
use crate::catalog::Catalog;
use crate::combat::{ActorKind, Damageable};
use crate::damage::{DamagePacket, DamageResult, RandomSource};
use crate::enemy::{Enemy, EnemyContext};
use crate::events::{CombatEvent, HitSource};
use crate::geometry::{Aabb, CollisionSegment, LevelGeometry, SegmentResolver, DEFAULT_MAX_PASSES};
use crate::hit_pipeline::{resolve_area_hits, resolve_projectile_hits, ContactGate, DEFAULT_CONTACT_COOLDOWN};
use crate::player::{Player, PlayerAction, PlayerIntent, PlayerTuning};
use crate::projectile::{Projectile, Team};
use crate::spawn::{SpawnEntry, SpawnRequest, SpawnScheduler, DEFAULT_WARNING_LEAD};
use crate::status::EffectEvent;
use crate::steering::{Neighbor, SteeringConfig};
use crate::stats::DamageType;
use glam::Vec2;
use ironvale_common::{ConfigError, ConfigResult, EntityId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

// ============================================================================
// Configuration
// ============================================================================

/// World tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Enemy steering
    pub steering: SteeringConfig,
    /// Wall resolver pass cap
    pub collision_passes: usize,
    /// Seconds between contact hits on the player
    pub contact_cooldown: f32,
    /// Enemy hurt-stun length
    pub enemy_hurt_duration: f32,
    /// Packet used for enemy body contact
    pub contact_packet: DamagePacket,
    /// Player movement and attacks
    pub player: PlayerTuning,
    /// Seconds a spawn warning precedes its spawn
    pub warning_lead: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            steering: SteeringConfig::default(),
            collision_passes: DEFAULT_MAX_PASSES,
            contact_cooldown: DEFAULT_CONTACT_COOLDOWN,
            enemy_hurt_duration: 0.25,
            contact_packet: DamagePacket::new(0.0, DamageType::Physical).with_attack_scaling(1.0),
            player: PlayerTuning::default(),
            warning_lead: DEFAULT_WARNING_LEAD,
        }
    }
}

impl WorldConfig {
    /// Clamp values into usable ranges.
    pub fn validate(&mut self) {
        self.collision_passes = self.collision_passes.clamp(1, 32);
        self.contact_cooldown = self.contact_cooldown.max(0.0);
        self.enemy_hurt_duration = self.enemy_hurt_duration.max(0.0);
        self.warning_lead = self.warning_lead.max(0.0);
        self.steering.friction = self.steering.friction.clamp(0.0, 1.0);
        self.steering.max_patrol_dt = self.steering.max_patrol_dt.max(0.001);
        self.player.shoot_cooldown = self.player.shoot_cooldown.max(0.0);
        self.player.hurt_duration = self.player.hurt_duration.max(0.0);
    }
}

/// Everything one tick produced.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Observable events, in the order they happened
    pub events: Vec<CombatEvent>,
    /// Spawns that could not be resolved against the catalog
    pub spawn_errors: Vec<ConfigError>,
}

impl TickReport {
    /// Number of events of a given name.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.events.iter().filter(|e| e.name() == name).count()
    }
}

// ============================================================================
// World
// ============================================================================

/// A running level.
pub struct World {
    config: WorldConfig,
    catalog: Arc<Catalog>,
    resources: Box<dyn ResourceProvider>,
    arena: FrameSetArena,
    level: LevelGeometry,
    resolver: SegmentResolver,
    player: Player,
    enemies: Vec<Enemy>,
    player_projectiles: Vec<Projectile>,
    enemy_projectiles: Vec<Projectile>,
    contact: ContactGate,
    spawner: SpawnScheduler,
    time: f32,
    ticks: u64,
}

impl World {
    /// Create a world with the player placed at `player_pos`.
    pub fn new(
        catalog: Arc<Catalog>,
        mut config: WorldConfig,
        player_archetype: &str,
        player_pos: Vec2,
        resources: Box<dyn ResourceProvider>,
    ) -> ConfigResult<Self> {
        config.validate();
        let player = Player::from_catalog(&catalog, player_archetype, player_pos, config.player)?;
        info!(
            player = player_archetype,
            enemy_types = catalog.enemy_count(),
            "World created"
        );
        Ok(Self {
            resolver: SegmentResolver::new(config.collision_passes),
            contact: ContactGate::new(config.contact_cooldown),
            config,
            catalog,
            resources,
            arena: FrameSetArena::new(),
            level: LevelGeometry::new(),
            player,
            enemies: Vec::new(),
            player_projectiles: Vec::new(),
            enemy_projectiles: Vec::new(),
            spawner: SpawnScheduler::default(),
            time: 0.0,
            ticks: 0,
        })
    }

    /// Replace the spawn schedule (builder pattern).
    #[must_use]
    pub fn with_spawns(mut self, entries: Vec<SpawnEntry>) -> Self {
        self.spawner = SpawnScheduler::with_warning_lead(entries, self.config.warning_lead);
        self
    }

    /// Replace both wall sets.
    pub fn set_level_geometry(&mut self, level: LevelGeometry) {
        debug!(
            segments = level.segments.len(),
            rects = level.rects.len(),
            "level geometry set"
        );
        self.level = level;
    }

    /// Replace the wall segments.
    pub fn set_collision_segments(&mut self, segments: Vec<CollisionSegment>) {
        self.level.segments = segments;
    }

    /// Replace the fallback wall rects.
    pub fn set_collision_rects(&mut self, rects: Vec<Aabb>) {
        self.level.rects = rects;
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Shared catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Loaded frame sets.
    #[must_use]
    pub fn arena(&self) -> &FrameSetArena {
        &self.arena
    }

    /// Level walls.
    #[must_use]
    pub fn level(&self) -> &LevelGeometry {
        &self.level
    }

    /// The player.
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// The player, mutably.
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Every enemy, including dying ones.
    #[must_use]
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    /// Enemy by id.
    #[must_use]
    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id() == id)
    }

    /// Enemies not yet dead.
    #[must_use]
    pub fn living_enemies(&self) -> usize {
        self.enemies.iter().filter(|e| !e.is_dead()).count()
    }

    /// Every live projectile, player shots first.
    pub fn projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.player_projectiles.iter().chain(&self.enemy_projectiles)
    }

    /// Seconds simulated.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Ticks simulated.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Whether every scheduled spawn has been released.
    #[must_use]
    pub fn spawns_finished(&self) -> bool {
        self.spawner.is_finished()
    }

    /// Spawn an enemy now.
    pub fn spawn_enemy(&mut self, enemy_type: &str, position: Vec2) -> ConfigResult<EntityId> {
        let archetype = self.catalog.enemy(enemy_type)?;
        let sprite = self
            .arena
            .register(archetype.sprite(), archetype.boss.is_some(), &*self.resources);
        let enemy = Enemy::spawn(archetype, position, sprite, &self.arena);
        let id = enemy.id();
        debug!(%id, enemy_type, x = position.x, y = position.y, "enemy spawned");
        self.enemies.push(enemy);
        Ok(id)
    }

    /// Apply a catalog effect to the player or an enemy.
    ///
    /// Returns `Ok(false)` when no actor has that id.
    pub fn apply_effect(&mut self, target: EntityId, effect_id: &str, refresh: bool) -> ConfigResult<bool> {
        let effect = self.catalog.effect(effect_id)?;
        if self.player.id() == target {
            self.player.status.add(effect, refresh);
            return Ok(true);
        }
        match self.enemies.iter_mut().find(|e| e.id() == target) {
            Some(enemy) => {
                enemy.status.add(effect, refresh);
                Ok(true)
            },
            None => Ok(false),
        }
    }

    /// Advance the world by `dt` seconds.
    pub fn tick<R>(&mut self, dt: f32, intent: &PlayerIntent, rng: &mut R) -> TickReport
    where
        R: RandomSource,
    {
        let dt = dt.max(0.0);
        let mut report = TickReport::default();

        self.run_spawns(dt, &mut report);
        self.update_player(dt, intent, rng, &mut report.events);
        self.update_enemies(dt, rng, &mut report.events);
        self.advance_projectiles(dt);
        self.resolve_hits(dt, rng, &mut report.events);
        self.remove_finished(&mut report.events);

        self.time += dt;
        self.ticks += 1;
        report
    }

    fn run_spawns(&mut self, dt: f32, report: &mut TickReport) {
        for request in self.spawner.update(dt) {
            match request {
                SpawnRequest::Warning { enemy_type, position } => {
                    report.events.push(CombatEvent::SpawnWarning { enemy_type, position });
                },
                SpawnRequest::Enemy { enemy_type, position } => match self.spawn_enemy(&enemy_type, position) {
                    Ok(enemy) => report.events.push(CombatEvent::EnemySpawned {
                        enemy,
                        enemy_type,
                        position,
                    }),
                    Err(err) => {
                        error!(enemy_type = %enemy_type, "spawn failed: {err}");
                        report.spawn_errors.push(err);
                    },
                },
            }
        }
    }

    fn update_player<R>(&mut self, dt: f32, intent: &PlayerIntent, rng: &mut R, events: &mut Vec<CombatEvent>)
    where
        R: RandomSource,
    {
        let was_dead = self.player.is_dead();
        let effects = self.player.advance_status(dt);
        push_effect_events(events, self.player.id(), effects);
        if !was_dead && self.player.is_dead() {
            events.push(died(&self.player, 0));
        }

        let Some(action) = self.player.update(dt, intent, &self.level, &self.resolver) else {
            return;
        };
        match action {
            PlayerAction::Shoot(projectile) => {
                events.push(CombatEvent::ProjectileFired {
                    projectile: projectile.id,
                    team: projectile.team,
                    position: projectile.pos,
                });
                self.player_projectiles.push(projectile);
            },
            PlayerAction::Melee(strike) => {
                let hits = resolve_area_hits(&strike.area, &mut self.enemies, |enemy| {
                    let result = enemy.take_hit(&strike.attacker, strike.packet.clone(), &mut *rng);
                    let xp = enemy.xp_reward;
                    push_hit(events, &*enemy, HitSource::Melee, result, xp);
                });
                events.push(CombatEvent::MeleeSwing { area: strike.area, hits });
            },
        }
    }

    fn update_enemies<R>(&mut self, dt: f32, rng: &mut R, events: &mut Vec<CombatEvent>)
    where
        R: RandomSource,
    {
        let neighbors: Vec<Neighbor> = self.enemies.iter().map(Enemy::as_neighbor).collect();
        let ctx = EnemyContext {
            player_pos: (!self.player.is_dead()).then_some(self.player.pos),
            neighbors: &neighbors,
            segments: &self.level.segments,
            resolver: &self.resolver,
            steering: &self.config.steering,
            hurt_duration: self.config.enemy_hurt_duration,
        };

        for enemy in &mut self.enemies {
            let was_dead = enemy.is_dead();
            let effects = enemy.advance_status(dt);
            push_effect_events(events, enemy.id(), effects);
            if !was_dead && enemy.is_dead() {
                events.push(died(&*enemy, enemy.xp_reward));
            }

            let Some(tick) = enemy.update(dt, &ctx, rng) else {
                continue;
            };
            if let Some((_, BossPhase::Charge)) = tick.transition {
                if let Some(target) = enemy.brain().and_then(|b| b.locked_target()) {
                    events.push(CombatEvent::BossCharging {
                        boss: enemy.id(),
                        target,
                    });
                }
            }
            let Some(strike) = tick.strike else {
                continue;
            };
            let Some(config) = enemy.brain().map(|b| *b.config()) else {
                continue;
            };
            let packet = enemy.outgoing(
                DamagePacket::new(0.0, DamageType::Physical).with_attack_scaling(config.damage_multiplier),
            );
            for rock in &strike.rocks {
                self.enemy_projectiles.push(
                    Projectile::hazard(Team::Enemy, *rock, config.rock_radius, packet.clone(), enemy.stats.clone())
                        .with_arm_delay(config.rock_fall_time)
                        .with_lifetime(config.rock_fall_time + config.rock_linger),
                );
            }
            debug!(boss = %enemy.id(), rocks = strike.rocks.len(), "boss strike released");
            events.push(CombatEvent::BossStrike {
                boss: enemy.id(),
                center: strike.center,
                rocks: strike.rocks.len(),
            });
        }
    }

    fn advance_projectiles(&mut self, dt: f32) {
        let enemy_targets: Vec<Vec2> = self
            .enemies
            .iter()
            .filter(|e| !e.is_dead())
            .map(Enemy::pos)
            .collect();
        let player_target: Vec<Vec2> = if self.player.is_dead() {
            Vec::new()
        } else {
            vec![self.player.pos]
        };

        for projectile in &mut self.player_projectiles {
            projectile.advance(dt, &enemy_targets);
        }
        for projectile in &mut self.enemy_projectiles {
            projectile.advance(dt, &player_target);
        }
    }

    fn resolve_hits<R>(&mut self, dt: f32, rng: &mut R, events: &mut Vec<CombatEvent>)
    where
        R: RandomSource,
    {
        resolve_projectile_hits(&mut self.player_projectiles, &mut self.enemies, |projectile, enemy| {
            let result = enemy.take_hit(&projectile.source_stats, projectile.packet.clone(), &mut *rng);
            let xp = enemy.xp_reward;
            push_hit(events, &*enemy, HitSource::Projectile, result, xp);
        });

        resolve_projectile_hits(
            &mut self.enemy_projectiles,
            std::slice::from_mut(&mut self.player),
            |projectile, player| {
                let result = player.take_hit(&projectile.source_stats, projectile.packet.clone(), &mut *rng);
                push_hit(events, &*player, HitSource::Projectile, result, 0);
            },
        );

        self.contact.tick(dt);
        let contact_packet = self.config.contact_packet.clone();
        self.contact.resolve(&self.enemies, &mut self.player, |enemy, player| {
            let result = player.take_hit(enemy.stats(), enemy.outgoing(contact_packet), &mut *rng);
            push_hit(events, &*player, HitSource::Contact, result, 0);
        });
    }

    fn remove_finished(&mut self, events: &mut Vec<CombatEvent>) {
        self.enemies.retain(|enemy| {
            if enemy.death_finished() {
                events.push(CombatEvent::Removed { target: enemy.id() });
                false
            } else {
                true
            }
        });
        self.player_projectiles.retain(|p| p.alive);
        self.enemy_projectiles.retain(|p| p.alive);
    }
}

fn died<T: Damageable>(target: &T, xp_reward: u32) -> CombatEvent {
    CombatEvent::Died {
        target: target.id(),
        kind: target.kind(),
        position: target.hurt_box().center(),
        xp_reward: if target.kind() == ActorKind::Player { 0 } else { xp_reward },
    }
}

fn push_hit<T: Damageable>(
    events: &mut Vec<CombatEvent>,
    target: &T,
    source: HitSource,
    result: DamageResult,
    xp_reward: u32,
) {
    events.push(CombatEvent::Damaged {
        target: target.id(),
        kind: target.kind(),
        position: target.hurt_box().center(),
        source,
        result,
    });
    if result.killed {
        events.push(died(target, xp_reward));
    }
}

fn push_effect_events(events: &mut Vec<CombatEvent>, target: EntityId, effects: Vec<(EffectEvent, i32)>) {
    for (event, hp_delta) in effects {
        events.push(match event {
            EffectEvent::Applied { id, .. } => CombatEvent::EffectApplied { target, effect: id },
            EffectEvent::Ticked { id, .. } => CombatEvent::EffectTicked {
                target,
                effect: id,
                hp_delta,
            },
            EffectEvent::Removed { id, .. } => CombatEvent::EffectRemoved { target, effect: id },
        });
    }
}
