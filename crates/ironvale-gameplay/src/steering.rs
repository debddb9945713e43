//! Force-based enemy steering.
//!
//! This module provides:
//! - `Kinematics`, the point-mass state every mobile enemy carries
//! - Seek and separation forces with a per-force cap
//! - Friction and velocity-clamped integration
//! - `Patrol`, a horizontal back-and-forth walk for unaggroed enemies

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Tunables shared by every steered enemy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Fraction of velocity retained per second, applied before forces.
    pub friction: f32,
    /// Seek produces no force inside this distance.
    pub arrival_distance: f32,
    /// Neighbours within `separation_factor * radius` push away.
    pub separation_factor: f32,
    /// Weight of the separation force relative to seek.
    pub separation_weight: f32,
    /// Largest step patrol will integrate at once.
    pub max_patrol_dt: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            friction: 0.9,
            arrival_distance: 4.0,
            separation_factor: 2.2,
            separation_weight: 1.5,
            max_patrol_dt: 0.05,
        }
    }
}

/// Position of another actor considered for separation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Neighbour center
    pub pos: Vec2,
    /// Dead neighbours are ignored
    pub alive: bool,
}

/// Point-mass state driven by steering forces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    /// Center position
    pub pos: Vec2,
    /// Velocity in units per second
    pub velocity: Vec2,
    /// Accumulated force for this tick
    pub acceleration: Vec2,
    /// Body radius
    pub radius: f32,
    /// Speed cap
    pub max_speed: f32,
    /// Per-force cap
    pub max_force: f32,
}

impl Kinematics {
    /// Create a body at rest.
    #[must_use]
    pub fn new(pos: Vec2, radius: f32, max_speed: f32, max_force: f32) -> Self {
        Self {
            pos,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            radius,
            max_speed,
            max_force,
        }
    }

    /// Force toward `target`, zero inside the arrival distance.
    #[must_use]
    pub fn seek(&self, target: Vec2, config: &SteeringConfig) -> Vec2 {
        let offset = target - self.pos;
        let distance = offset.length();
        if distance < config.arrival_distance || distance == 0.0 {
            return Vec2::ZERO;
        }
        let desired = offset / distance * self.max_speed;
        (desired - self.velocity).clamp_length_max(self.max_force)
    }

    /// Force away from crowded neighbours.
    ///
    /// Each live neighbour inside the separation radius contributes a unit
    /// vector pointing away, weighted by inverse distance. Coincident
    /// neighbours (and the body itself) are skipped.
    #[must_use]
    pub fn separate<I>(&self, neighbors: I, config: &SteeringConfig) -> Vec2
    where
        I: IntoIterator<Item = Neighbor>,
    {
        let reach = config.separation_factor * self.radius;
        let mut sum = Vec2::ZERO;
        let mut count = 0u32;

        for neighbor in neighbors {
            if !neighbor.alive {
                continue;
            }
            let away = self.pos - neighbor.pos;
            let distance = away.length();
            if distance <= 0.0 || distance >= reach {
                continue;
            }
            sum += away / distance / distance;
            count += 1;
        }

        if count == 0 {
            return Vec2::ZERO;
        }
        let average = sum / count as f32;
        if average.length_squared() == 0.0 {
            return Vec2::ZERO;
        }
        let desired = average.normalize() * self.max_speed;
        (desired - self.velocity).clamp_length_max(self.max_force)
    }

    /// Add a force for this tick.
    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force;
    }

    /// Damp velocity by `friction` per second over a `dt` step.
    pub fn apply_friction(&mut self, friction: f32, dt: f32) {
        self.velocity *= friction.clamp(0.0, 1.0).powf(dt.max(0.0));
    }

    /// Integrate accumulated force into velocity and return the proposed
    /// next position. Clears the accumulator; `pos` is not committed.
    #[must_use]
    pub fn integrate(&mut self, dt: f32) -> Vec2 {
        self.velocity = (self.velocity + self.acceleration * dt).clamp_length_max(self.max_speed);
        self.acceleration = Vec2::ZERO;
        self.pos + self.velocity * dt
    }

    /// Full seek-and-separate step: friction, forces, integration.
    #[must_use]
    pub fn steer_toward<I>(&mut self, target: Vec2, neighbors: I, config: &SteeringConfig, dt: f32) -> Vec2
    where
        I: IntoIterator<Item = Neighbor>,
    {
        self.apply_friction(config.friction, dt);
        let seek = self.seek(target, config);
        let separation = self.separate(neighbors, config) * config.separation_weight;
        self.apply_force(seek);
        self.apply_force(separation);
        self.integrate(dt)
    }

    /// Zero velocity and pending force.
    pub fn halt(&mut self) {
        self.velocity = Vec2::ZERO;
        self.acceleration = Vec2::ZERO;
    }
}

/// Horizontal back-and-forth walk around a fixed origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Patrol {
    /// X coordinate the patrol is centered on
    pub origin_x: f32,
    /// Maximum distance from the origin
    pub range: f32,
    /// Current direction (+1 or -1)
    pub direction: f32,
}

impl Patrol {
    /// Start a patrol heading right.
    #[must_use]
    pub fn new(origin_x: f32, range: f32) -> Self {
        Self {
            origin_x,
            range: range.max(0.0),
            direction: 1.0,
        }
    }

    /// Advance a patrol step and return the proposed next position.
    ///
    /// Bypasses forces and friction entirely. The body's velocity is set to
    /// the patrol velocity so facing follows it. A body left outside the
    /// range (after a chase) walks back toward the origin at patrol speed.
    #[must_use]
    pub fn step(&mut self, body: &mut Kinematics, speed: f32, dt: f32, config: &SteeringConfig) -> Vec2 {
        let dt = dt.min(config.max_patrol_dt).max(0.0);
        let offset = body.pos.x - self.origin_x;
        if offset >= self.range && self.direction > 0.0 {
            self.direction = -1.0;
        } else if offset <= -self.range && self.direction < 0.0 {
            self.direction = 1.0;
        }

        let mut next = body.pos;
        next.x += self.direction * speed * dt;

        // Only a step that starts inside the range is clamped at a bound
        if offset.abs() <= self.range {
            let next_offset = next.x - self.origin_x;
            if next_offset > self.range {
                next.x = self.origin_x + self.range;
                self.direction = -1.0;
            } else if next_offset < -self.range {
                next.x = self.origin_x - self.range;
                self.direction = 1.0;
            }
        }

        body.acceleration = Vec2::ZERO;
        body.velocity = Vec2::new(self.direction * speed, 0.0);
        next
    }
}
