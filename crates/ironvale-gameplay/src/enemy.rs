//! Enemy actor.
//!
//! This module provides:
//! - `Enemy`, a steered body with stats, status effects, and an optional
//!   boss attack machine
//! - Per-tick AI: aggro check, chase or patrol, collision correction
//! - Death countdown driven by the sprite's death animation length

use crate::animation::{AnimState, Facing, FrameSetArena};
use crate::boss::{BossBrain, BossPhase, BossTick};
use crate::catalog::EnemyArchetype;
use crate::combat::{ActorKind, Damageable, HurtBox};
use crate::damage::{compute_damage, DamagePacket, DamageResult, RandomSource};
use crate::geometry::{CollisionSegment, SegmentResolver};
use crate::status::{dispatch_effect_event, EffectEvent, StatusEffectManager};
use crate::steering::{Kinematics, Neighbor, Patrol, SteeringConfig};
use crate::stats::Stats;
use glam::Vec2;
use ironvale_common::{EntityId, SpriteTypeId};
use tracing::debug;

/// Read-only world state an enemy consults while thinking.
#[derive(Debug, Clone, Copy)]
pub struct EnemyContext<'a> {
    /// Player position, `None` when the player is dead or absent
    pub player_pos: Option<Vec2>,
    /// Snapshot of every enemy body taken before this tick's updates
    pub neighbors: &'a [Neighbor],
    /// Level walls
    pub segments: &'a [CollisionSegment],
    /// Wall resolver
    pub resolver: &'a SegmentResolver,
    /// Steering tunables
    pub steering: &'a SteeringConfig,
    /// Hurt-stun length
    pub hurt_duration: f32,
}

/// A live (or dying) enemy.
#[derive(Debug, Clone)]
pub struct Enemy {
    id: EntityId,
    archetype: String,
    kind: ActorKind,
    sprite: SpriteTypeId,
    /// Steered body
    pub body: Kinematics,
    /// Patrol used while unaggroed
    pub patrol: Patrol,
    /// Base max speed
    pub speed: f32,
    /// Chase threshold
    pub aggro_radius: f32,
    /// Combat stats
    pub stats: Stats,
    /// Active status effects
    pub status: StatusEffectManager,
    /// Experience granted on kill
    pub xp_reward: u32,
    facing: Facing,
    hurt_timer: f32,
    hurt_duration: f32,
    dead: bool,
    death_timer: f32,
    death_durations: [f32; 4],
    brain: Option<BossBrain>,
}

impl Enemy {
    /// Spawn from an archetype whose sprite is already registered in `arena`.
    #[must_use]
    pub fn spawn(archetype: &EnemyArchetype, pos: Vec2, sprite: SpriteTypeId, arena: &FrameSetArena) -> Self {
        let brain = archetype.boss.map(|config| {
            let clock = arena.frame_set(sprite, AnimState::Attack, Facing::Down).player(false);
            BossBrain::new(config, clock)
        });
        let death_durations = Facing::ALL.map(|facing| arena.death_duration(sprite, facing));

        Self {
            id: EntityId::new(),
            archetype: archetype.id.clone(),
            kind: if brain.is_some() { ActorKind::Boss } else { ActorKind::Enemy },
            sprite,
            body: Kinematics::new(pos, archetype.radius, archetype.speed, archetype.force_cap()),
            patrol: Patrol::new(pos.x, archetype.move_range),
            speed: archetype.speed,
            aggro_radius: archetype.aggro_radius,
            stats: archetype.stats.restored(),
            status: StatusEffectManager::new(),
            xp_reward: archetype.xp_reward,
            facing: Facing::Down,
            hurt_timer: 0.0,
            hurt_duration: 0.25,
            dead: false,
            death_timer: 0.0,
            death_durations,
            brain,
        }
    }

    /// Archetype id.
    #[must_use]
    pub fn archetype(&self) -> &str {
        &self.archetype
    }

    /// Sprite type.
    #[must_use]
    pub fn sprite(&self) -> SpriteTypeId {
        self.sprite
    }

    /// Body center.
    #[must_use]
    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    /// Current facing.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Boss machine, if this is a boss.
    #[must_use]
    pub fn brain(&self) -> Option<&BossBrain> {
        self.brain.as_ref()
    }

    /// Seconds of hurt-stun left.
    #[must_use]
    pub fn hurt_remaining(&self) -> f32 {
        self.hurt_timer
    }

    /// Whether the death animation has played out.
    #[must_use]
    pub fn death_finished(&self) -> bool {
        self.dead && self.death_timer <= 0.0
    }

    /// Separation snapshot of this body.
    #[must_use]
    pub fn as_neighbor(&self) -> Neighbor {
        Neighbor {
            pos: self.body.pos,
            alive: !self.dead,
        }
    }

    /// Scale an outgoing packet by this enemy's damage-dealt modifiers.
    #[must_use]
    pub fn outgoing(&self, mut packet: DamagePacket) -> DamagePacket {
        packet.scale(self.status.get_multiplier("damage_dealt"));
        packet.flat_bonus += self.status.get_additive("damage_dealt");
        packet
    }

    /// Max speed after status modifiers.
    #[must_use]
    pub fn effective_speed(&self) -> f32 {
        (self.speed * self.status.get_multiplier("move_speed") + self.status.get_additive("move_speed")).max(0.0)
    }

    /// Advance status effects and apply their ticks.
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

    /// Think and move for one tick.
    ///
    /// Returns the boss machine's output when this enemy is a boss.
    pub fn update<R>(&mut self, dt: f32, ctx: &EnemyContext<'_>, rng: &mut R) -> Option<BossTick>
    where
        R: RandomSource + ?Sized,
    {
        self.hurt_duration = ctx.hurt_duration;
        if self.dead {
            self.death_timer = (self.death_timer - dt).max(0.0);
            self.body.halt();
            return None;
        }
        self.hurt_timer = (self.hurt_timer - dt).max(0.0);

        let in_aggro = ctx
            .player_pos
            .is_some_and(|p| self.body.pos.distance_squared(p) <= self.aggro_radius * self.aggro_radius);

        let pos = self.body.pos;
        let tick = self
            .brain
            .as_mut()
            .map(|brain| brain.update(pos, ctx.player_pos, in_aggro, dt, rng));
        let brain_allows = tick.as_ref().map_or(true, |t| t.movement);

        if self.hurt_timer > 0.0 || !brain_allows {
            self.body.halt();
        } else {
            self.body.max_speed = self.effective_speed();
            let proposed = match ctx.player_pos {
                Some(target) if in_aggro => {
                    self.body
                        .steer_toward(target, ctx.neighbors.iter().copied(), ctx.steering, dt)
                },
                _ => {
                    let speed = self.body.max_speed;
                    self.patrol.step(&mut self.body, speed, dt, ctx.steering)
                },
            };
            self.body.pos = ctx.resolver.resolve(proposed, self.body.radius, ctx.segments);
        }

        if let Some(facing) = tick.as_ref().and_then(|t| t.facing) {
            self.facing = facing;
        } else if let Some(facing) = Facing::from_vector(self.body.velocity) {
            self.facing = facing;
        }
        tick
    }

    fn die(&mut self) {
        self.dead = true;
        self.hurt_timer = 0.0;
        self.body.halt();
        self.death_timer = self.death_durations[facing_index(self.facing)];
        debug!(id = %self.id, archetype = %self.archetype, "enemy died");
    }

    /// Current animation state (dead > hurt > charge/attack > walk > idle).
    #[must_use]
    pub fn anim_state(&self) -> AnimState {
        if self.dead {
            return AnimState::Dead;
        }
        if self.hurt_timer > 0.0 {
            return AnimState::Hurt;
        }
        match self.brain.as_ref().map(BossBrain::phase) {
            Some(BossPhase::Charge) => AnimState::Charge,
            Some(BossPhase::Attack) => AnimState::Attack,
            _ if self.body.velocity.length_squared() > 1.0 => AnimState::Walk,
            _ => AnimState::Idle,
        }
    }
}

fn facing_index(facing: Facing) -> usize {
    Facing::ALL.iter().position(|f| *f == facing).unwrap_or(0)
}

impl Damageable for Enemy {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> ActorKind {
        self.kind
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn hurt_box(&self) -> HurtBox {
        HurtBox::Circle {
            center: self.body.pos,
            radius: self.body.radius,
        }
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
            self.hurt_timer = self.hurt_duration;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::ImageManifest;
    use crate::catalog::Catalog;
    use crate::damage::FixedRoll;
    use crate::stats::DamageType;

    const DT: f32 = 1.0 / 60.0;

    fn spawn(id: &str, pos: Vec2) -> (Enemy, FrameSetArena) {
        let catalog = Catalog::with_defaults();
        let archetype = catalog.enemy(id).expect("archetype");
        let mut arena = FrameSetArena::new();
        let manifest = ImageManifest::new().with_all_facings(archetype.sprite(), AnimState::Dead, 4);
        let sprite = arena.register(archetype.sprite(), archetype.boss.is_some(), &manifest);
        (Enemy::spawn(archetype, pos, sprite, &arena), arena)
    }

    fn ctx<'a>(
        player: Option<Vec2>,
        neighbors: &'a [Neighbor],
        steering: &'a SteeringConfig,
        resolver: &'a SegmentResolver,
    ) -> EnemyContext<'a> {
        EnemyContext {
            player_pos: player,
            neighbors,
            segments: &[],
            resolver,
            steering,
            hurt_duration: 0.25,
        }
    }

    fn lethal() -> Stats {
        Stats::new(100).with_attack(10_000).with_crit(0.0, 1.5)
    }

    fn lethal_packet() -> DamagePacket {
        DamagePacket::default().with_attack_scaling(1.0)
    }

    #[test]
    fn test_spawn_uses_archetype() {
        let (goblin, _) = spawn("goblin", Vec2::new(5.0, 6.0));
        assert_eq!(goblin.stats.hp, 40);
        assert_eq!(goblin.kind(), ActorKind::Enemy);
        assert!(goblin.brain().is_none());

        let (boss, _) = spawn("boss_orc", Vec2::ZERO);
        assert_eq!(boss.kind(), ActorKind::Boss);
        assert!(boss.brain().is_some());
    }

    #[test]
    fn test_chases_player_inside_aggro() {
        let (mut goblin, _) = spawn("goblin", Vec2::ZERO);
        let steering = SteeringConfig::default();
        let resolver = SegmentResolver::default();
        let context = ctx(Some(Vec2::new(300.0, 0.0)), &[], &steering, &resolver);

        for _ in 0..60 {
            goblin.update(DT, &context, &mut FixedRoll(0.5));
        }
        assert!(goblin.pos().x > 20.0);
        assert_eq!(goblin.facing(), Facing::Right);
        assert_eq!(goblin.anim_state(), AnimState::Walk);
    }

    #[test]
    fn test_patrols_outside_aggro() {
        let (mut goblin, _) = spawn("goblin", Vec2::ZERO);
        let steering = SteeringConfig::default();
        let resolver = SegmentResolver::default();
        let context = ctx(Some(Vec2::new(5_000.0, 5_000.0)), &[], &steering, &resolver);

        goblin.update(0.05, &context, &mut FixedRoll(0.5));
        // 90 * 0.05
        assert!((goblin.pos().x - 4.5).abs() < 1e-3);
        assert!(goblin.pos().y.abs() < f32::EPSILON);
    }

    #[test]
    fn test_lost_aggro_far_from_origin_walks_home() {
        let (mut goblin, _) = spawn("goblin", Vec2::ZERO);
        // Left 900 units out by a chase, well past its 280 patrol range
        goblin.body.pos = Vec2::new(900.0, 0.0);
        let steering = SteeringConfig::default();
        let resolver = SegmentResolver::default();
        let context = ctx(Some(Vec2::new(5_000.0, 5_000.0)), &[], &steering, &resolver);

        let mut last = goblin.pos().x;
        for _ in 0..60 {
            goblin.update(1.0 / 60.0, &context, &mut FixedRoll(0.5));
            let x = goblin.pos().x;
            assert!(last - x > 0.0 && last - x < 1.6);
            last = x;
        }
        assert!((last - 810.0).abs() < 0.1);
    }

    #[test]
    fn test_hurt_stun_halts_movement() {
        let (mut goblin, _) = spawn("goblin", Vec2::ZERO);
        let attacker = Stats::new(100).with_attack(1).with_crit(0.0, 1.5);
        let result = goblin.take_hit(&attacker, DamagePacket::new(10.0, DamageType::Physical), &mut FixedRoll(0.5));
        assert!(!result.killed);
        assert_eq!(goblin.anim_state(), AnimState::Hurt);

        let steering = SteeringConfig::default();
        let resolver = SegmentResolver::default();
        let context = ctx(Some(Vec2::new(100.0, 0.0)), &[], &steering, &resolver);
        goblin.update(0.1, &context, &mut FixedRoll(0.5));
        assert_eq!(goblin.pos(), Vec2::ZERO);

        goblin.update(0.2, &context, &mut FixedRoll(0.5));
        assert!(goblin.pos().x > 0.0);
    }

    #[test]
    fn test_death_countdown_matches_death_frames() {
        let (mut goblin, _) = spawn("goblin", Vec2::ZERO);
        let result = goblin.take_hit(&lethal(), lethal_packet(), &mut FixedRoll(0.5));
        assert!(result.killed);
        assert!(goblin.is_dead());
        assert!(!goblin.death_finished());

        let steering = SteeringConfig::default();
        let resolver = SegmentResolver::default();
        let context = ctx(None, &[], &steering, &resolver);
        // 4 dead frames * 0.15 s
        goblin.update(0.5, &context, &mut FixedRoll(0.5));
        assert!(!goblin.death_finished());
        goblin.update(0.11, &context, &mut FixedRoll(0.5));
        assert!(goblin.death_finished());
    }

    #[test]
    fn test_hitting_corpse_keeps_death_timer() {
        let (mut goblin, _) = spawn("goblin", Vec2::ZERO);
        goblin.take_hit(&lethal(), lethal_packet(), &mut FixedRoll(0.5));

        let steering = SteeringConfig::default();
        let resolver = SegmentResolver::default();
        let context = ctx(None, &[], &steering, &resolver);
        goblin.update(0.5, &context, &mut FixedRoll(0.5));

        let again = goblin.take_hit(&lethal(), lethal_packet(), &mut FixedRoll(0.5));
        assert_eq!(goblin.stats.hp, 0);
        assert!(again.killed);
        goblin.update(0.11, &context, &mut FixedRoll(0.5));
        assert!(goblin.death_finished());
    }

    #[test]
    fn test_boss_freezes_while_charging() {
        let (mut boss, _) = spawn("boss_orc", Vec2::ZERO);
        let steering = SteeringConfig::default();
        let resolver = SegmentResolver::default();
        let context = ctx(Some(Vec2::new(200.0, 0.0)), &[], &steering, &resolver);

        let tick = boss.update(DT, &context, &mut FixedRoll(0.5)).expect("boss tick");
        assert_eq!(tick.transition, Some((BossPhase::Idle, BossPhase::Charge)));
        assert_eq!(boss.pos(), Vec2::ZERO);
        assert_eq!(boss.anim_state(), AnimState::Charge);
        assert_eq!(boss.facing(), Facing::Right);
    }

    #[test]
    fn test_poison_can_kill() {
        let (mut goblin, _) = spawn("goblin", Vec2::ZERO);
        goblin.stats.hp = 2;
        goblin
            .status
            .add(Catalog::with_defaults().effect("poison").expect("poison"), false);

        goblin.advance_status(1.0);
        assert!(goblin.is_dead());
    }

    #[test]
    fn test_slow_modifier_caps_speed() {
        let (mut goblin, _) = spawn("goblin", Vec2::ZERO);
        goblin.status.add(
            crate::status::StatusEffect::new("slow", 2.0).with_modifier("move_speed", 0.5),
            false,
        );
        assert!((goblin.effective_speed() - 45.0).abs() < 1e-3);
    }
}
