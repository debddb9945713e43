//! Shared combat capabilities.
//!
//! The hit pipeline only needs to know where a target can be hit and how
//! it takes damage. Players and enemies both expose that through
//! [`Damageable`].

use crate::damage::{DamagePacket, DamageResult, RandomSource};
use crate::geometry::Aabb;
use crate::stats::Stats;
use glam::Vec2;
use ironvale_common::EntityId;
use serde::{Deserialize, Serialize};

/// Which side of a fight an actor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    /// The controlled character
    Player,
    /// A regular enemy
    Enemy,
    /// An elite enemy with an attack state machine
    Boss,
}

impl ActorKind {
    /// Whether the actor fights against the player.
    #[must_use]
    pub fn is_hostile(self) -> bool {
        matches!(self, Self::Enemy | Self::Boss)
    }
}

/// Region in which an actor can be hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HurtBox {
    /// Circle body
    Circle {
        /// Circle center
        center: Vec2,
        /// Circle radius
        radius: f32,
    },
    /// Axis-aligned body
    Rect(Aabb),
}

impl HurtBox {
    /// Center of the region.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        match self {
            Self::Circle { center, .. } => *center,
            Self::Rect(rect) => rect.center(),
        }
    }

    /// Whether a circle overlaps this region.
    #[must_use]
    pub fn intersects_circle(&self, point: Vec2, radius: f32) -> bool {
        match self {
            Self::Circle { center, radius: own } => {
                let reach = own + radius;
                center.distance_squared(point) < reach * reach
            },
            Self::Rect(rect) => rect.intersects_circle(point, radius),
        }
    }

    /// Whether a rect overlaps this region.
    #[must_use]
    pub fn intersects_rect(&self, area: &Aabb) -> bool {
        match self {
            Self::Circle { center, radius } => area.intersects_circle(*center, *radius),
            Self::Rect(rect) => rect.overlaps(area),
        }
    }

    /// Whether two regions overlap.
    #[must_use]
    pub fn intersects(&self, other: &HurtBox) -> bool {
        match other {
            Self::Circle { center, radius } => self.intersects_circle(*center, *radius),
            Self::Rect(rect) => self.intersects_rect(rect),
        }
    }
}

/// Anything the hit pipeline can damage.
pub trait Damageable {
    /// Stable id used to de-duplicate hits.
    fn id(&self) -> EntityId;

    /// Which side the actor is on.
    fn kind(&self) -> ActorKind;

    /// Current stats (the attacker side of contact damage reads these).
    fn stats(&self) -> &Stats;

    /// Whether the actor is dead (dead actors are skipped by every pass).
    fn is_dead(&self) -> bool;

    /// Hp fraction for UI.
    fn hp_ratio(&self) -> f32 {
        self.stats().hp_ratio()
    }

    /// Where the actor can be hit.
    fn hurt_box(&self) -> HurtBox;

    /// Resolve an incoming hit.
    fn take_hit(&mut self, attacker: &Stats, packet: DamagePacket, rng: &mut dyn RandomSource) -> DamageResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_hurt_box_overlap() {
        let body = HurtBox::Circle {
            center: Vec2::ZERO,
            radius: 10.0,
        };
        assert!(body.intersects_circle(Vec2::new(15.0, 0.0), 6.0));
        assert!(!body.intersects_circle(Vec2::new(16.0, 0.0), 6.0));
    }

    #[test]
    fn test_rect_vs_circle_both_ways() {
        let rect = HurtBox::Rect(Aabb::from_center(Vec2::ZERO, 16.0, 16.0));
        let circle = HurtBox::Circle {
            center: Vec2::new(20.0, 0.0),
            radius: 5.0,
        };
        assert!(rect.intersects(&circle));
        assert!(circle.intersects(&rect));
    }

    #[test]
    fn test_hostility() {
        assert!(ActorKind::Boss.is_hostile());
        assert!(!ActorKind::Player.is_hostile());
    }
}
