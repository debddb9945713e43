//! Projectiles and area hazards.
//!
//! Arrows, boss rocks, and anything else that travels or lingers and hits
//! on overlap. A projectile snapshots its owner's stats at fire time so
//! damage does not change if the owner dies or is buffed afterwards.

use crate::damage::DamagePacket;
use crate::stats::Stats;
use glam::Vec2;
use ironvale_common::EntityId;
use serde::{Deserialize, Serialize};

/// Which side fired a projectile; it only hits the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// Fired by the player, hits enemies
    Player,
    /// Fired by enemies, hits the player
    Enemy,
}

/// Lock-on steering for a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Homing {
    /// Seconds of straight flight before lock-on
    pub delay: f32,
    /// How fast the direction turns toward the target
    pub turn_rate: f32,
    /// Targets farther than this are ignored
    pub acquire_radius: f32,
}

impl Default for Homing {
    fn default() -> Self {
        Self {
            delay: 0.15,
            turn_rate: 4.0,
            acquire_radius: 600.0,
        }
    }
}

/// A live projectile.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    /// Unique id
    pub id: EntityId,
    /// Firing side
    pub team: Team,
    /// Center position
    pub pos: Vec2,
    /// Unit travel direction
    pub direction: Vec2,
    /// Units per second
    pub speed: f32,
    /// Hit radius
    pub radius: f32,
    /// Damage description
    pub packet: DamagePacket,
    /// Owner stats at fire time
    pub source_stats: Stats,
    /// Seconds before despawn
    pub lifetime: f32,
    /// Seconds since spawn
    pub age: f32,
    /// Seconds before the projectile can hit
    pub arm_delay: f32,
    /// Keep flying after a hit
    pub pierce: bool,
    /// Optional lock-on
    pub homing: Option<Homing>,
    /// Cleared when the projectile expires or is consumed
    pub alive: bool,
    hits: Vec<EntityId>,
}

impl Projectile {
    /// Create a moving projectile. A zero direction fires along +x.
    #[must_use]
    pub fn new(team: Team, pos: Vec2, direction: Vec2, speed: f32, packet: DamagePacket, source_stats: Stats) -> Self {
        Self {
            id: EntityId::new(),
            team,
            pos,
            direction: direction.try_normalize().unwrap_or(Vec2::X),
            speed,
            radius: 8.0,
            packet,
            source_stats,
            lifetime: 1.5,
            age: 0.0,
            arm_delay: 0.0,
            pierce: false,
            homing: None,
            alive: true,
            hits: Vec::new(),
        }
    }

    /// Create a stationary hazard that lands after `arm_delay`.
    #[must_use]
    pub fn hazard(team: Team, pos: Vec2, radius: f32, packet: DamagePacket, source_stats: Stats) -> Self {
        Self {
            speed: 0.0,
            radius,
            ..Self::new(team, pos, Vec2::X, 0.0, packet, source_stats)
        }
    }

    /// Set lifetime (builder pattern).
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: f32) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Set hit radius (builder pattern).
    #[must_use]
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Set arm delay (builder pattern).
    #[must_use]
    pub fn with_arm_delay(mut self, delay: f32) -> Self {
        self.arm_delay = delay;
        self
    }

    /// Make the projectile pierce (builder pattern).
    #[must_use]
    pub fn with_pierce(mut self, pierce: bool) -> Self {
        self.pierce = pierce;
        self
    }

    /// Enable homing (builder pattern).
    #[must_use]
    pub fn with_homing(mut self, homing: Homing) -> Self {
        self.homing = Some(homing);
        self
    }

    /// Whether the projectile can hit this tick.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.alive && self.age >= self.arm_delay
    }

    /// Whether this projectile already hit `target`.
    #[must_use]
    pub fn has_hit(&self, target: EntityId) -> bool {
        self.hits.contains(&target)
    }

    /// Record a hit on `target`.
    pub fn record_hit(&mut self, target: EntityId) {
        if !self.hits.contains(&target) {
            self.hits.push(target);
        }
    }

    /// Number of distinct targets hit.
    #[must_use]
    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }

    /// Advance by `dt`, steering toward the nearest of `targets` if homing.
    pub fn advance(&mut self, dt: f32, targets: &[Vec2]) {
        if !self.alive {
            return;
        }
        self.age += dt;
        if self.age >= self.lifetime {
            self.alive = false;
            return;
        }

        if let Some(homing) = self.homing {
            if self.age >= homing.delay {
                self.steer_toward_nearest(&homing, dt, targets);
            }
        }
        self.pos += self.direction * self.speed * dt;
    }

    fn steer_toward_nearest(&mut self, homing: &Homing, dt: f32, targets: &[Vec2]) {
        let reach_sq = homing.acquire_radius * homing.acquire_radius;
        let nearest = targets
            .iter()
            .map(|t| (*t, t.distance_squared(self.pos)))
            .filter(|(_, d)| *d <= reach_sq)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let Some((target, _)) = nearest else {
            return;
        };
        let Some(wanted) = (target - self.pos).try_normalize() else {
            return;
        };
        let blend = (homing.turn_rate * dt * 5.0).min(1.0);
        self.direction = self.direction.lerp(wanted, blend).try_normalize().unwrap_or(wanted);
    }
}
