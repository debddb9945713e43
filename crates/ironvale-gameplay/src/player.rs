//! Player actor.
//!
//! This module provides:
//! - `PlayerIntent`, the per-tick input the simulation consumes
//! - Movement against segments, or against rects when a level has none
//! - Bow shots and melee swings, gated by a shared cooldown
//! - Hit handling with hurt-stun and death

use crate::animation::{AnimState, Facing};
use crate::catalog::{Catalog, PlayerArchetype};
use crate::combat::{ActorKind, Damageable, HurtBox};
use crate::damage::{compute_damage, DamagePacket, DamageResult, RandomSource};
use crate::geometry::{move_and_collide_rects, Aabb, LevelGeometry, SegmentResolver};
use crate::projectile::{Homing, Projectile, Team};
use crate::stats::{DamageType, Stats};
use crate::status::{dispatch_effect_event, EffectEvent, StatusEffectManager};
use glam::Vec2;
use ironvale_common::{ConfigResult, EntityId};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// Weapons and Tuning
// ============================================================================

/// Main-hand weapon class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    /// Bare hands
    #[default]
    Unarmed,
    /// Basic sword
    Sword,
    /// Power bow
    Bow,
}

impl WeaponKind {
    /// Base damage put into outgoing packets.
    #[must_use]
    pub const fn base_damage(self) -> f32 {
        match self {
            Self::Unarmed => 10.0,
            Self::Sword => 15.0,
            Self::Bow => 35.0,
        }
    }

    /// Whether attacks fire projectiles instead of swinging.
    #[must_use]
    pub const fn is_ranged(self) -> bool {
        matches!(self, Self::Bow)
    }
}

/// Player combat and movement tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Seconds between attacks
    pub shoot_cooldown: f32,
    /// Hurt-stun length
    pub hurt_duration: f32,
    /// Arrow speed
    pub arrow_speed: f32,
    /// Arrow lifetime
    pub arrow_lifetime: f32,
    /// Arrow attack scaling
    pub arrow_scaling: f32,
    /// Arrow hit radius
    pub arrow_radius: f32,
    /// Optional arrow lock-on
    pub arrow_homing: Option<Homing>,
    /// Melee reach in front of the body
    pub melee_reach: f32,
    /// Seconds the attack pose is held after a shot
    pub attack_pose: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            shoot_cooldown: 0.5,
            hurt_duration: 0.25,
            arrow_speed: 450.0,
            arrow_lifetime: 1.5,
            arrow_scaling: 0.8,
            arrow_radius: 8.0,
            arrow_homing: None,
            melee_reach: 48.0,
            attack_pose: 0.3,
        }
    }
}

/// Input for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerIntent {
    /// Desired move direction (length capped at 1)
    pub movement: Vec2,
    /// Attack this tick if the cooldown allows
    pub attack: bool,
    /// World point to aim at; defaults to facing
    pub aim: Option<Vec2>,
}

/// A melee swing, resolved against enemies by the world.
#[derive(Debug, Clone, PartialEq)]
pub struct MeleeStrike {
    /// Area that hits
    pub area: Aabb,
    /// Damage description
    pub packet: DamagePacket,
    /// Attacker stats
    pub attacker: Stats,
}

/// Attack produced by an update.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerAction {
    /// Fired a projectile
    Shoot(Projectile),
    /// Swung a melee weapon
    Melee(MeleeStrike),
}

// ============================================================================
// Player
// ============================================================================

/// The controlled character.
#[derive(Debug, Clone)]
pub struct Player {
    id: EntityId,
    archetype: String,
    /// Body center
    pub pos: Vec2,
    /// Body radius
    pub radius: f32,
    /// Current velocity
    pub velocity: Vec2,
    /// Base move speed
    pub move_speed: f32,
    /// Combat stats
    pub stats: Stats,
    /// Active status effects
    pub status: StatusEffectManager,
    /// Equipped weapon
    pub weapon: WeaponKind,
    facing: Vec2,
    hurt_timer: f32,
    shoot_timer: f32,
    attack_timer: f32,
    dead: bool,
    tuning: PlayerTuning,
}

impl Player {
    /// Create a player from an archetype.
    #[must_use]
    pub fn spawn(archetype: &PlayerArchetype, pos: Vec2, tuning: PlayerTuning) -> Self {
        Self {
            id: EntityId::new(),
            archetype: archetype.id.clone(),
            pos,
            radius: archetype.radius,
            velocity: Vec2::ZERO,
            move_speed: archetype.speed,
            stats: archetype.stats.restored(),
            status: StatusEffectManager::new(),
            weapon: archetype.weapon,
            facing: Vec2::Y,
            hurt_timer: 0.0,
            shoot_timer: 0.0,
            attack_timer: 0.0,
            dead: false,
            tuning,
        }
    }

    /// Create a player from a catalog id.
    pub fn from_catalog(catalog: &Catalog, archetype: &str, pos: Vec2, tuning: PlayerTuning) -> ConfigResult<Self> {
        Ok(Self::spawn(catalog.player(archetype)?, pos, tuning))
    }

    /// Archetype id.
    #[must_use]
    pub fn archetype(&self) -> &str {
        &self.archetype
    }

    /// Axis-aligned body used for contact and rect movement.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, self.radius, self.radius)
    }

    /// Unit facing direction.
    #[must_use]
    pub fn facing(&self) -> Vec2 {
        self.facing
    }

    /// Seconds of hurt-stun left.
    #[must_use]
    pub fn hurt_remaining(&self) -> f32 {
        self.hurt_timer
    }

    /// Seconds until the next attack is allowed.
    #[must_use]
    pub fn attack_cooldown(&self) -> f32 {
        self.shoot_timer
    }

    /// Move speed after status modifiers.
    #[must_use]
    pub fn effective_speed(&self) -> f32 {
        (self.move_speed * self.status.get_multiplier("move_speed") + self.status.get_additive("move_speed")).max(0.0)
    }

    /// Scale an outgoing packet by this player's damage-dealt modifiers.
    #[must_use]
    pub fn outgoing(&self, mut packet: DamagePacket) -> DamagePacket {
        packet.scale(self.status.get_multiplier("damage_dealt"));
        packet.flat_bonus += self.status.get_additive("damage_dealt");
        packet
    }

    /// Advance status effects and apply their ticks.
    ///
    /// Returns the events paired with the hp change each caused.
    pub fn advance_status(&mut self, dt: f32) -> Vec<(EffectEvent, i32)> {
        self.status.update(dt);
        let events: Vec<(EffectEvent, i32)> = self
            .status
            .drain_events()
            .into_iter()
            .map(|event| {
                let delta = if self.dead { 0 } else { dispatch_effect_event(&event, &mut self.stats) };
                (event, delta)
            })
            .collect();
        if !self.dead && self.stats.is_dead() {
            self.die();
        }
        events
    }

    /// Advance one tick: timers, movement, attack.
    pub fn update(
        &mut self,
        dt: f32,
        intent: &PlayerIntent,
        level: &LevelGeometry,
        resolver: &SegmentResolver,
    ) -> Option<PlayerAction> {
        self.hurt_timer = (self.hurt_timer - dt).max(0.0);
        self.shoot_timer = (self.shoot_timer - dt).max(0.0);
        self.attack_timer = (self.attack_timer - dt).max(0.0);

        if self.dead {
            self.velocity = Vec2::ZERO;
            return None;
        }

        if let Some(dir) = intent.movement.try_normalize() {
            self.facing = dir;
        }

        if self.hurt_timer > 0.0 {
            self.velocity = Vec2::ZERO;
        } else {
            self.velocity = intent.movement.clamp_length_max(1.0) * self.effective_speed();
            self.move_by(self.velocity * dt, level, resolver);
        }

        if intent.attack && self.shoot_timer <= 0.0 {
            let aim = intent
                .aim
                .and_then(|target| (target - self.pos).try_normalize())
                .unwrap_or(self.facing);
            self.facing = aim;
            return Some(self.attack(aim));
        }
        None
    }

    fn move_by(&mut self, delta: Vec2, level: &LevelGeometry, resolver: &SegmentResolver) {
        if delta == Vec2::ZERO {
            return;
        }
        if !level.segments.is_empty() {
            self.pos = resolver.resolve(self.pos + delta, self.radius, &level.segments);
        } else if !level.rects.is_empty() {
            self.pos = move_and_collide_rects(self.bounds(), delta, &level.rects).center();
        } else {
            self.pos += delta;
        }
    }

    fn attack(&mut self, aim: Vec2) -> PlayerAction {
        self.shoot_timer = self.tuning.shoot_cooldown;
        self.attack_timer = self.tuning.attack_pose;

        if self.weapon.is_ranged() {
            let packet = self.outgoing(
                DamagePacket::new(self.weapon.base_damage(), DamageType::Physical)
                    .with_attack_scaling(self.tuning.arrow_scaling),
            );
            let mut arrow = Projectile::new(Team::Player, self.pos, aim, self.tuning.arrow_speed, packet, self.stats.clone())
                .with_lifetime(self.tuning.arrow_lifetime)
                .with_radius(self.tuning.arrow_radius);
            if let Some(homing) = self.tuning.arrow_homing {
                arrow = arrow.with_homing(homing);
            }
            debug!(x = self.pos.x, y = self.pos.y, "player fired arrow");
            return PlayerAction::Shoot(arrow);
        }

        let cardinal = Facing::from_vector(aim).unwrap_or(Facing::Down).unit();
        let reach = self.tuning.melee_reach;
        let center = self.pos + cardinal * (self.radius + reach / 2.0);
        let half = reach / 2.0 + 5.0;
        let packet =
            self.outgoing(DamagePacket::new(self.weapon.base_damage(), DamageType::Physical).with_attack_scaling(1.0));
        debug!(x = center.x, y = center.y, "player melee swing");
        PlayerAction::Melee(MeleeStrike {
            area: Aabb::from_center(center, half, half),
            packet,
            attacker: self.stats.clone(),
        })
    }

    fn die(&mut self) {
        self.dead = true;
        self.hurt_timer = 0.0;
        self.velocity = Vec2::ZERO;
        debug!(id = %self.id, "player died");
    }

    /// Current animation state (dead > hurt > attack > walk > idle).
    #[must_use]
    pub fn anim_state(&self) -> AnimState {
        if self.dead {
            AnimState::Dead
        } else if self.hurt_timer > 0.0 {
            AnimState::Hurt
        } else if self.attack_timer > 0.0 {
            AnimState::Attack
        } else if self.velocity.length_squared() > 0.0 {
            AnimState::Walk
        } else {
            AnimState::Idle
        }
    }
}

impl Damageable for Player {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Player
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn hurt_box(&self) -> HurtBox {
        HurtBox::Rect(self.bounds())
    }

    fn take_hit(&mut self, attacker: &Stats, mut packet: DamagePacket, rng: &mut dyn RandomSource) -> DamageResult {
        packet.scale(self.status.get_multiplier("damage_taken"));
        let result = compute_damage(attacker, &mut self.stats, &packet, rng);
        if self.dead {
            return result;
        }
        if result.killed {
            self.die();
        } else {
            self.hurt_timer = self.tuning.hurt_duration;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::FixedRoll;
    use crate::geometry::CollisionSegment;
    use crate::status::StatusEffect;

    fn knight_at(x: f32, y: f32) -> Player {
        let catalog = Catalog::with_defaults();
        Player::from_catalog(&catalog, "knight", Vec2::new(x, y), PlayerTuning::default()).expect("knight")
    }

    fn walk_right() -> PlayerIntent {
        PlayerIntent {
            movement: Vec2::X,
            ..PlayerIntent::default()
        }
    }

    #[test]
    fn test_unknown_archetype_is_error() {
        let catalog = Catalog::with_defaults();
        assert!(Player::from_catalog(&catalog, "bard", Vec2::ZERO, PlayerTuning::default()).is_err());
    }

    #[test]
    fn test_moves_freely_without_walls() {
        let mut player = knight_at(0.0, 0.0);
        player.update(0.1, &walk_right(), &LevelGeometry::new(), &SegmentResolver::default());
        // 250 * 0.1
        assert!((player.pos.x - 25.0).abs() < 1e-3);
        assert_eq!(player.anim_state(), AnimState::Walk);
    }

    #[test]
    fn test_segment_wall_stops_player() {
        let wall = CollisionSegment::new(Vec2::new(40.0, -100.0), Vec2::new(40.0, 100.0));
        let level = LevelGeometry::from_segments(vec![wall]);
        let mut player = knight_at(0.0, 0.0);

        for _ in 0..20 {
            player.update(0.05, &walk_right(), &level, &SegmentResolver::default());
        }
        assert!(player.pos.x <= 40.0 - 16.0 + 1e-3);
    }

    #[test]
    fn test_rect_wall_used_when_no_segments() {
        let level = LevelGeometry::from_rects(vec![Aabb::from_origin_size(40.0, -100.0, 32.0, 200.0)]);
        let mut player = knight_at(0.0, 0.0);

        for _ in 0..20 {
            player.update(0.05, &walk_right(), &level, &SegmentResolver::default());
        }
        assert!((player.bounds().max_x - 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_haste_modifier_speeds_up() {
        let mut player = knight_at(0.0, 0.0);
        player
            .status
            .add(StatusEffect::new("haste", 5.0).with_modifier("move_speed_add", 50.0), false);
        assert!((player.effective_speed() - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_sword_swing_in_front_and_cooldown() {
        let mut player = knight_at(0.0, 0.0);
        let intent = PlayerIntent {
            attack: true,
            aim: Some(Vec2::new(100.0, 0.0)),
            ..PlayerIntent::default()
        };

        let action = player.update(0.016, &intent, &LevelGeometry::new(), &SegmentResolver::default());
        let Some(PlayerAction::Melee(strike)) = action else {
            panic!("expected a melee strike");
        };
        assert!(strike.area.min_x > 0.0);
        assert!((strike.packet.base - 15.0).abs() < f32::EPSILON);

        let again = player.update(0.016, &intent, &LevelGeometry::new(), &SegmentResolver::default());
        assert!(again.is_none());
    }

    #[test]
    fn test_bow_fires_arrow_toward_aim() {
        let catalog = Catalog::with_defaults();
        let mut player = Player::from_catalog(&catalog, "wizard", Vec2::ZERO, PlayerTuning::default()).expect("wizard");
        let intent = PlayerIntent {
            attack: true,
            aim: Some(Vec2::new(0.0, -50.0)),
            ..PlayerIntent::default()
        };

        let action = player.update(0.016, &intent, &LevelGeometry::new(), &SegmentResolver::default());
        let Some(PlayerAction::Shoot(arrow)) = action else {
            panic!("expected an arrow");
        };
        assert_eq!(arrow.team, Team::Player);
        assert!(arrow.direction.y < -0.99);
        assert!((arrow.packet.scaling_attack - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_damage_taken_modifier_and_hurt_stun() {
        let mut player = knight_at(0.0, 0.0);
        player
            .status
            .add(StatusEffect::new("iron_skin", 5.0).with_modifier("damage_taken", 0.5), false);
        let attacker = Stats::new(100).with_attack(0).with_crit(0.0, 1.5);

        let result = player.take_hit(&attacker, DamagePacket::new(30.0, DamageType::Fire), &mut FixedRoll(0.5));

        // 30 * 0.5 = 15, * 100 / 105 = 14.3
        assert_eq!(result.final_damage, 14);
        assert_eq!(player.anim_state(), AnimState::Hurt);

        player.update(0.1, &walk_right(), &LevelGeometry::new(), &SegmentResolver::default());
        assert_eq!(player.pos, Vec2::ZERO);
    }

    #[test]
    fn test_lethal_hit_stops_player() {
        let mut player = knight_at(0.0, 0.0);
        let attacker = Stats::new(100).with_attack(500).with_crit(0.0, 1.5);

        let packet = DamagePacket::new(0.0, DamageType::Physical).with_attack_scaling(1.0);
        let result = player.take_hit(&attacker, packet, &mut FixedRoll(0.5));

        assert!(result.killed);
        assert!(player.is_dead());
        assert!(player.update(0.1, &walk_right(), &LevelGeometry::new(), &SegmentResolver::default()).is_none());
        assert_eq!(player.anim_state(), AnimState::Dead);
    }

    #[test]
    fn test_poison_ticks_hurt_player() {
        let catalog = Catalog::with_defaults();
        let mut player = knight_at(0.0, 0.0);
        player.status.add(catalog.effect("poison").expect("poison"), false);

        let events = player.advance_status(1.0);
        let total: i32 = events.iter().map(|(_, delta)| *delta).sum();
        assert_eq!(total, -3);
        assert_eq!(player.stats.hp, 97);
    }
}
