//! Boss attack state machine.
//!
//! Elite enemies run this machine on top of normal steering:
//!
//! ```text
//! idle/chase --(cooldown done, player in range)--> charge
//! charge     --(charge timer elapsed)------------> attack   (rocks spawned once)
//! attack     --(attack animation finished)-------> cooldown (timer reset)
//! cooldown   --(recovery window elapsed)---------> idle/chase
//! ```
//!
//! While charging, attacking, or recovering the boss does not move.

use crate::animation::{AnimationPlayer, Facing};
use crate::damage::RandomSource;
use glam::Vec2;
use ironvale_common::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use tracing::debug;

/// Vertical squash applied to area scatter, `sin(25°)`.
pub const ISO_SQUASH: f32 = 0.422_618_27;

/// Attack tunables for one boss archetype.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossAttackConfig {
    /// Distance at which the boss starts a charge.
    pub range: f32,
    /// Seconds between attacks.
    pub cooldown: f32,
    /// Wind-up before the strike.
    pub charge_time: f32,
    /// Radius of the rock scatter around the locked target.
    pub damage_radius: f32,
    /// Attack-stat scaling of each rock.
    pub damage_multiplier: f32,
    /// Rocks per strike.
    pub rock_count: usize,
    /// Rock hit radius.
    pub rock_radius: f32,
    /// Seconds before a rock lands and can hit.
    pub rock_fall_time: f32,
    /// Seconds a landed rock stays dangerous.
    pub rock_linger: f32,
    /// Seconds of forced idle at the start of cooldown.
    pub recovery_window: f32,
}

impl Default for BossAttackConfig {
    fn default() -> Self {
        Self {
            range: 350.0,
            cooldown: 3.0,
            charge_time: 1.0,
            damage_radius: 150.0,
            damage_multiplier: 1.5,
            rock_count: 6,
            rock_radius: 36.0,
            rock_fall_time: 0.6,
            rock_linger: 0.1,
            recovery_window: 1.0,
        }
    }
}

impl BossAttackConfig {
    /// Reject timings the state machine cannot honor. `owner` names the
    /// archetype in the error.
    pub fn validate(&self, owner: &str) -> ConfigResult<()> {
        let timers = [self.cooldown, self.charge_time, self.rock_fall_time, self.rock_linger];
        if timers.iter().any(|t| *t < 0.0) || self.range < 0.0 || self.damage_radius < 0.0 {
            return Err(ConfigError::Validation(format!(
                "boss {owner} has a negative timer, range, or radius"
            )));
        }
        if !(0.0..=self.cooldown).contains(&self.recovery_window) {
            return Err(ConfigError::Validation(format!(
                "boss {owner} recovery_window {} must be within 0..={}",
                self.recovery_window, self.cooldown
            )));
        }
        Ok(())
    }
}

/// Current phase of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossPhase {
    /// Player outside aggro; patrols.
    Idle,
    /// Player inside aggro; steers toward them.
    Chase,
    /// Winding up, frozen.
    Charge,
    /// Strike animation playing, frozen.
    Attack,
    /// Recovery window after a strike, frozen.
    Cooldown,
}

impl BossPhase {
    /// Whether the boss may move in this phase.
    #[must_use]
    pub fn allows_movement(self) -> bool {
        matches!(self, Self::Idle | Self::Chase)
    }
}

/// What the machine wants from the owner this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct BossTick {
    /// Whether normal movement (steering or patrol) runs
    pub movement: bool,
    /// Facing override while locked on a target
    pub facing: Option<Facing>,
    /// Phase change that happened this tick, if any
    pub transition: Option<(BossPhase, BossPhase)>,
    /// Strike released this tick
    pub strike: Option<BossStrike>,
}

/// One released area attack.
#[derive(Debug, Clone, PartialEq)]
pub struct BossStrike {
    /// Locked target position
    pub center: Vec2,
    /// Rock landing points
    pub rocks: Vec<Vec2>,
}

/// Timers and phase for one boss.
#[derive(Debug, Clone, PartialEq)]
pub struct BossBrain {
    config: BossAttackConfig,
    phase: BossPhase,
    cooldown_timer: f32,
    charge_timer: f32,
    target: Option<Vec2>,
    attack_clock: AnimationPlayer,
}

impl BossBrain {
    /// Create a brain; `attack_clock` plays the strike animation.
    #[must_use]
    pub fn new(config: BossAttackConfig, attack_clock: AnimationPlayer) -> Self {
        Self {
            config,
            phase: BossPhase::Idle,
            cooldown_timer: 0.0,
            charge_timer: 0.0,
            target: None,
            attack_clock,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> BossPhase {
        self.phase
    }

    /// Seconds until the next attack is allowed.
    #[must_use]
    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_timer
    }

    /// Override the cooldown timer.
    pub fn set_cooldown(&mut self, seconds: f32) {
        self.cooldown_timer = seconds.max(0.0);
    }

    /// Attack tunables.
    #[must_use]
    pub fn config(&self) -> &BossAttackConfig {
        &self.config
    }

    /// Target locked at charge start.
    #[must_use]
    pub fn locked_target(&self) -> Option<Vec2> {
        self.target
    }

    /// Advance the machine by one tick.
    pub fn update<R>(
        &mut self,
        boss_pos: Vec2,
        player_pos: Option<Vec2>,
        in_aggro: bool,
        dt: f32,
        rng: &mut R,
    ) -> BossTick
    where
        R: RandomSource + ?Sized,
    {
        if self.cooldown_timer > 0.0 {
            self.cooldown_timer = (self.cooldown_timer - dt).max(0.0);
        }

        let before = self.phase;
        let mut strike = None;

        match self.phase {
            BossPhase::Idle | BossPhase::Chase => {
                self.phase = if in_aggro { BossPhase::Chase } else { BossPhase::Idle };
                if let Some(player) = player_pos {
                    let in_range = boss_pos.distance_squared(player) <= self.config.range * self.config.range;
                    if self.cooldown_timer <= 0.0 && in_range {
                        self.phase = BossPhase::Charge;
                        self.charge_timer = self.config.charge_time;
                        self.target = Some(player);
                    }
                }
            },
            BossPhase::Charge => {
                self.charge_timer -= dt;
                if self.charge_timer <= 0.0 {
                    self.phase = BossPhase::Attack;
                    self.attack_clock.reset();
                    let center = self.target.unwrap_or(boss_pos);
                    strike = Some(BossStrike {
                        center,
                        rocks: self.scatter(center, rng),
                    });
                }
            },
            BossPhase::Attack => {
                self.attack_clock.advance(dt);
                if self.attack_clock.is_finished() {
                    self.phase = BossPhase::Cooldown;
                    self.cooldown_timer = self.config.cooldown;
                }
            },
            BossPhase::Cooldown => {
                let recovered = self.cooldown_timer <= 0.0
                    || self.cooldown_timer <= self.config.cooldown - self.config.recovery_window;
                if recovered {
                    self.phase = if in_aggro { BossPhase::Chase } else { BossPhase::Idle };
                    self.target = None;
                }
            },
        }

        let transition = (before != self.phase).then_some((before, self.phase));
        if let Some((from, to)) = transition {
            debug!(?from, ?to, cooldown = self.cooldown_timer, "boss phase change");
        }

        let facing = match self.phase {
            BossPhase::Charge | BossPhase::Attack => self.target.and_then(|t| Facing::from_vector(t - boss_pos)),
            _ => None,
        };

        BossTick {
            movement: self.phase.allows_movement(),
            facing,
            transition,
            strike,
        }
    }

    /// Landing points spread uniformly over a squashed disc around `center`.
    fn scatter<R>(&self, center: Vec2, rng: &mut R) -> Vec<Vec2>
    where
        R: RandomSource + ?Sized,
    {
        (0..self.config.rock_count)
            .map(|_| {
                let angle = rng.next_unit() * TAU;
                let radius = rng.next_unit().sqrt() * self.config.damage_radius;
                center + Vec2::new(angle.cos() * radius, angle.sin() * radius * ISO_SQUASH)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::{FixedRoll, RollSequence};

    const DT: f32 = 1.0 / 60.0;

    fn brain() -> BossBrain {
        BossBrain::new(BossAttackConfig::default(), AnimationPlayer::new(4, 0.15, false))
    }

    fn run_until<F>(brain: &mut BossBrain, mut stop: F, max_ticks: usize) -> Vec<BossTick>
    where
        F: FnMut(&BossBrain) -> bool,
    {
        let mut ticks = Vec::new();
        let mut rng = FixedRoll(0.5);
        for _ in 0..max_ticks {
            ticks.push(brain.update(Vec2::ZERO, Some(Vec2::new(200.0, 0.0)), true, DT, &mut rng));
            if stop(brain) {
                break;
            }
        }
        ticks
    }

    #[test]
    fn test_idle_with_player_in_range_charges_immediately() {
        let mut brain = brain();
        brain.set_cooldown(0.0);
        let tick = brain.update(Vec2::ZERO, Some(Vec2::new(100.0, 0.0)), true, DT, &mut FixedRoll(0.0));

        assert_eq!(brain.phase(), BossPhase::Charge);
        assert!(!tick.movement);
        assert_eq!(tick.transition, Some((BossPhase::Idle, BossPhase::Charge)));
        assert_eq!(tick.facing, Some(Facing::Right));
        assert_eq!(brain.locked_target(), Some(Vec2::new(100.0, 0.0)));
    }

    #[test]
    fn test_out_of_range_keeps_chasing() {
        let mut brain = brain();
        let tick = brain.update(Vec2::ZERO, Some(Vec2::new(500.0, 0.0)), true, DT, &mut FixedRoll(0.0));
        assert_eq!(brain.phase(), BossPhase::Chase);
        assert!(tick.movement);
    }

    #[test]
    fn test_no_aggro_stays_idle() {
        let mut brain = brain();
        brain.update(Vec2::ZERO, None, false, DT, &mut FixedRoll(0.0));
        assert_eq!(brain.phase(), BossPhase::Idle);
    }

    #[test]
    fn test_rocks_spawn_exactly_once() {
        let mut brain = brain();
        let ticks = run_until(&mut brain, |b| b.phase() == BossPhase::Cooldown, 600);

        let strikes: Vec<&BossStrike> = ticks.iter().filter_map(|t| t.strike.as_ref()).collect();
        assert_eq!(strikes.len(), 1);
        assert_eq!(strikes[0].rocks.len(), 6);
        assert_eq!(brain.phase(), BossPhase::Cooldown);
        assert!((brain.cooldown_remaining() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_charge_lasts_charge_time() {
        let mut brain = brain();
        let ticks = run_until(&mut brain, |b| b.phase() == BossPhase::Attack, 600);
        // one tick to enter charge plus ~60 ticks of wind-up
        assert!(ticks.len() >= 60 && ticks.len() <= 63);
    }

    #[test]
    fn test_recovery_window_freezes_then_releases() {
        let mut brain = brain();
        run_until(&mut brain, |b| b.phase() == BossPhase::Cooldown, 600);

        let mut frozen_ticks = 0;
        let mut rng = FixedRoll(0.5);
        loop {
            let tick = brain.update(Vec2::ZERO, Some(Vec2::new(200.0, 0.0)), true, DT, &mut rng);
            if tick.movement {
                break;
            }
            frozen_ticks += 1;
            assert!(frozen_ticks < 200);
        }
        // 1.0 s recovery at 60 Hz
        assert!((58..=61).contains(&frozen_ticks));
        assert_eq!(brain.phase(), BossPhase::Chase);
        assert!(brain.cooldown_remaining() > 0.0);
    }

    #[test]
    fn test_recovery_longer_than_cooldown_still_releases() {
        let config = BossAttackConfig {
            cooldown: 1.0,
            recovery_window: 2.0,
            ..BossAttackConfig::default()
        };
        let mut brain = BossBrain::new(config, AnimationPlayer::new(4, 0.15, false));
        run_until(&mut brain, |b| b.phase() == BossPhase::Cooldown, 600);

        let ticks = run_until(&mut brain, |b| b.phase() != BossPhase::Cooldown, 600);
        assert_ne!(brain.phase(), BossPhase::Cooldown);
        // released once the 1.0 s cooldown runs out
        assert!((59..=62).contains(&ticks.len()));
    }

    #[test]
    fn test_validate_rejects_inconsistent_timings() {
        assert!(BossAttackConfig::default().validate("boss_orc").is_ok());

        let long_recovery = BossAttackConfig {
            cooldown: 1.0,
            recovery_window: 2.0,
            ..BossAttackConfig::default()
        };
        assert!(matches!(long_recovery.validate("x"), Err(ConfigError::Validation(_))));

        let negative_charge = BossAttackConfig {
            charge_time: -0.5,
            ..BossAttackConfig::default()
        };
        assert!(matches!(negative_charge.validate("x"), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_no_second_charge_until_cooldown_elapses() {
        let mut brain = brain();
        run_until(&mut brain, |b| b.phase() == BossPhase::Cooldown, 600);

        let mut rng = FixedRoll(0.5);
        let mut ticks = 0;
        while brain.phase() != BossPhase::Charge {
            brain.update(Vec2::ZERO, Some(Vec2::new(200.0, 0.0)), true, DT, &mut rng);
            ticks += 1;
            assert!(ticks < 400);
        }
        // full 3 s cooldown before the next charge
        assert!(ticks >= 179);
    }

    #[test]
    fn test_scatter_within_squashed_radius() {
        let brain = brain();
        let mut rng = RollSequence::new(vec![0.25, 1.0, 0.75, 1.0, 0.0, 0.0]);
        let center = Vec2::new(10.0, 20.0);
        let rocks = brain.scatter(center, &mut rng);

        // angle 90 deg, full radius => straight down, squashed
        assert!((rocks[0].x - 10.0).abs() < 1e-3);
        assert!((rocks[0].y - (20.0 + 150.0 * ISO_SQUASH)).abs() < 1e-2);
        for rock in &rocks {
            let offset = *rock - center;
            assert!(offset.x.abs() <= 150.0 + 1e-3);
            assert!(offset.y.abs() <= 150.0 * ISO_SQUASH + 1e-3);
        }
    }
}
