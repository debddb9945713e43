//! Per-tick hit detection.
//!
//! This module provides:
//! - Projectile vs target passes with per-pair de-duplication
//! - Area (melee rect) passes
//! - `ContactGate`, the cooldown-gated body-contact pass
//!
//! Passes only pair attackers with targets and call back. The callback
//! decides how damage is applied, so the same pass serves the player's
//! arrows, boss rocks, and melee swings.

use crate::combat::Damageable;
use crate::geometry::Aabb;
use crate::projectile::Projectile;
use serde::{Deserialize, Serialize};

/// Default seconds between contact hits.
pub const DEFAULT_CONTACT_COOLDOWN: f32 = 0.5;

/// Pair every armed projectile with every live target it overlaps.
///
/// Each (projectile, target) pair resolves at most once across the
/// projectile's lifetime. Non-piercing projectiles are consumed by their
/// first hit. Returns the number of hits.
pub fn resolve_projectile_hits<T, F>(projectiles: &mut [Projectile], targets: &mut [T], mut on_hit: F) -> usize
where
    T: Damageable,
    F: FnMut(&Projectile, &mut T),
{
    let mut hits = 0;
    for projectile in projectiles.iter_mut() {
        if !projectile.is_armed() {
            continue;
        }
        for target in targets.iter_mut() {
            if target.is_dead() || projectile.has_hit(target.id()) {
                continue;
            }
            if !target.hurt_box().intersects_circle(projectile.pos, projectile.radius) {
                continue;
            }
            projectile.record_hit(target.id());
            on_hit(projectile, target);
            hits += 1;
            if !projectile.pierce {
                projectile.alive = false;
                break;
            }
        }
    }
    hits
}

/// Hit every live target overlapping `area` once. Returns the hit count.
pub fn resolve_area_hits<T, F>(area: &Aabb, targets: &mut [T], mut on_hit: F) -> usize
where
    T: Damageable,
    F: FnMut(&mut T),
{
    let mut hits = 0;
    for target in targets.iter_mut() {
        if target.is_dead() || !target.hurt_box().intersects_rect(area) {
            continue;
        }
        on_hit(target);
        hits += 1;
    }
    hits
}

/// Cooldown gate for body-contact damage against one target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactGate {
    /// Seconds the gate stays closed after a hit
    pub cooldown: f32,
    timer: f32,
}

impl Default for ContactGate {
    fn default() -> Self {
        Self::new(DEFAULT_CONTACT_COOLDOWN)
    }
}

impl ContactGate {
    /// Create an open gate.
    #[must_use]
    pub fn new(cooldown: f32) -> Self {
        Self {
            cooldown: cooldown.max(0.0),
            timer: 0.0,
        }
    }

    /// Count the cooldown down.
    pub fn tick(&mut self, dt: f32) {
        self.timer = (self.timer - dt).max(0.0);
    }

    /// Whether contact damage may apply now.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.timer <= 0.0
    }

    /// Seconds until the gate reopens.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.timer
    }

    /// Apply contact from the first live attacker touching `target`.
    ///
    /// Only one attacker deals damage per open window, however many overlap.
    /// Returns the index of the attacker that hit.
    pub fn resolve<A, T, F>(&mut self, attackers: &[A], target: &mut T, on_contact: F) -> Option<usize>
    where
        A: Damageable,
        T: Damageable,
        F: FnOnce(&A, &mut T),
    {
        if !self.is_open() || target.is_dead() {
            return None;
        }
        let body = target.hurt_box();
        let index = attackers
            .iter()
            .position(|a| !a.is_dead() && a.hurt_box().intersects(&body))?;

        on_contact(&attackers[index], target);
        self.timer = self.cooldown;
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{ActorKind, HurtBox};
    use crate::damage::{compute_damage, DamagePacket, DamageResult, RandomSource};
    use crate::projectile::Team;
    use crate::stats::{DamageType, Stats};
    use glam::Vec2;
    use ironvale_common::EntityId;

    struct Dummy {
        id: EntityId,
        pos: Vec2,
        stats: Stats,
        hits_taken: u32,
    }

    impl Dummy {
        fn at(x: f32, y: f32) -> Self {
            Self {
                id: EntityId::new(),
                pos: Vec2::new(x, y),
                stats: Stats::new(100).with_attack(10),
                hits_taken: 0,
            }
        }
    }

    impl Damageable for Dummy {
        fn id(&self) -> EntityId {
            self.id
        }

        fn kind(&self) -> ActorKind {
            ActorKind::Enemy
        }

        fn stats(&self) -> &Stats {
            &self.stats
        }

        fn is_dead(&self) -> bool {
            self.stats.is_dead()
        }

        fn hurt_box(&self) -> HurtBox {
            HurtBox::Circle {
                center: self.pos,
                radius: 10.0,
            }
        }

        fn take_hit(&mut self, attacker: &Stats, packet: DamagePacket, rng: &mut dyn RandomSource) -> DamageResult {
            self.hits_taken += 1;
            compute_damage(attacker, &mut self.stats, &packet, rng)
        }
    }

    fn arrow_at(x: f32) -> Projectile {
        Projectile::new(
            Team::Player,
            Vec2::new(x, 0.0),
            Vec2::X,
            0.0,
            DamagePacket::new(5.0, DamageType::Physical),
            Stats::new(100).with_attack(0),
        )
    }

    #[test]
    fn test_non_piercing_projectile_hits_one_target() {
        let mut targets = vec![Dummy::at(0.0, 0.0), Dummy::at(2.0, 0.0)];
        let mut projectiles = vec![arrow_at(1.0)];

        let hits = resolve_projectile_hits(&mut projectiles, &mut targets, |_, t| t.hits_taken += 1);

        assert_eq!(hits, 1);
        assert!(!projectiles[0].alive);
        assert_eq!(targets[0].hits_taken + targets[1].hits_taken, 1);
    }

    #[test]
    fn test_piercing_projectile_hits_each_target_once() {
        let mut targets = vec![Dummy::at(0.0, 0.0), Dummy::at(2.0, 0.0)];
        let mut projectiles = vec![arrow_at(1.0).with_pierce(true)];

        for _ in 0..3 {
            resolve_projectile_hits(&mut projectiles, &mut targets, |_, t| t.hits_taken += 1);
        }

        assert!(projectiles[0].alive);
        assert_eq!(targets[0].hits_taken, 1);
        assert_eq!(targets[1].hits_taken, 1);
    }

    #[test]
    fn test_unarmed_and_dead_are_skipped() {
        let mut dead = Dummy::at(0.0, 0.0);
        dead.stats.hp = 0;
        let mut targets = vec![dead];
        let mut projectiles = vec![arrow_at(0.0), arrow_at(0.0).with_arm_delay(1.0)];

        let hits = resolve_projectile_hits(&mut projectiles, &mut targets, |_, t| t.hits_taken += 1);

        assert_eq!(hits, 0);
        assert_eq!(targets[0].hits_taken, 0);
    }

    #[test]
    fn test_area_hits_all_overlapping() {
        let mut targets = vec![Dummy::at(0.0, 0.0), Dummy::at(30.0, 0.0), Dummy::at(300.0, 0.0)];
        let area = Aabb::from_center(Vec2::new(15.0, 0.0), 24.0, 24.0);

        let hits = resolve_area_hits(&area, &mut targets, |t| t.hits_taken += 1);

        assert_eq!(hits, 2);
        assert_eq!(targets[2].hits_taken, 0);
    }

    #[test]
    fn test_contact_gate_one_attacker_per_window() {
        let attackers = vec![Dummy::at(0.0, 0.0), Dummy::at(1.0, 0.0)];
        let mut player = Dummy::at(5.0, 0.0);
        let mut gate = ContactGate::default();
        let mut rng = crate::damage::FixedRoll(0.99);

        let first = gate.resolve(&attackers, &mut player, |a, p| {
            p.take_hit(a.stats(), DamagePacket::new(0.0, DamageType::Physical), &mut rng);
        });
        assert_eq!(first, Some(0));
        assert_eq!(player.hits_taken, 1);
        assert!(!gate.is_open());

        // still closed
        gate.tick(0.2);
        let blocked = gate.resolve(&attackers, &mut player, |_, p| p.hits_taken += 1);
        assert_eq!(blocked, None);

        gate.tick(0.35);
        assert!(gate.is_open());
        let again = gate.resolve(&attackers, &mut player, |_, p| p.hits_taken += 1);
        assert_eq!(again, Some(0));
        assert_eq!(player.hits_taken, 2);
    }

    #[test]
    fn test_contact_gate_skips_dead_attackers() {
        let mut first = Dummy::at(0.0, 0.0);
        first.stats.hp = 0;
        let attackers = vec![first, Dummy::at(2.0, 0.0)];
        let mut player = Dummy::at(5.0, 0.0);
        let mut gate = ContactGate::new(0.5);

        let hit = gate.resolve(&attackers, &mut player, |_, p| p.hits_taken += 1);
        assert_eq!(hit, Some(1));
    }
}
