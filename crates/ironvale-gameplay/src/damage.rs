//! Damage resolution.
//!
//! This module provides:
//! - `DamagePacket` describing one attack (builder style)
//! - `DamageResult` reporting what happened to the defender
//! - `compute_damage`, the single formula every hit goes through
//! - `RandomSource` so the crit roll can be supplied by the caller

use crate::stats::{DamageType, Stats};
use serde::{Deserialize, Serialize};
use tracing::trace;

// ============================================================================
// Random Source
// ============================================================================

/// Supplier of uniform values in `[0, 1)`.
pub trait RandomSource {
    /// Next uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f32;
}

impl RandomSource for fastrand::Rng {
    fn next_unit(&mut self) -> f32 {
        self.f32()
    }
}

/// Always returns the same roll. Useful for forcing or suppressing crits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRoll(pub f32);

impl RandomSource for FixedRoll {
    fn next_unit(&mut self) -> f32 {
        self.0
    }
}

/// Cycles through a fixed list of rolls.
#[derive(Debug, Clone, PartialEq)]
pub struct RollSequence {
    rolls: Vec<f32>,
    cursor: usize,
}

impl RollSequence {
    /// Create a sequence. An empty list always rolls 0.
    #[must_use]
    pub fn new(rolls: Vec<f32>) -> Self {
        Self { rolls, cursor: 0 }
    }
}

impl RandomSource for RollSequence {
    fn next_unit(&mut self) -> f32 {
        if self.rolls.is_empty() {
            return 0.0;
        }
        let roll = self.rolls[self.cursor % self.rolls.len()];
        self.cursor = self.cursor.wrapping_add(1);
        roll
    }
}

// ============================================================================
// Packets and Results
// ============================================================================

/// One attack's damage description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamagePacket {
    /// Flat base damage (weapon damage).
    pub base: f32,
    /// Damage type used for resistance lookup.
    pub damage_type: DamageType,
    /// Fraction of the attacker's attack stat added.
    pub scaling_attack: f32,
    /// Fraction of the attacker's magic stat added.
    pub scaling_magic: f32,
    /// Flat bonus added after scaling.
    pub flat_bonus: f32,
    /// Armor ignored by this packet.
    pub armor_pen: f32,
    /// Multiplier from buffs and the defender's damage-taken modifier.
    pub attacker_multiplier: f32,
}

impl Default for DamagePacket {
    fn default() -> Self {
        Self {
            base: 0.0,
            damage_type: DamageType::Physical,
            scaling_attack: 0.0,
            scaling_magic: 0.0,
            flat_bonus: 0.0,
            armor_pen: 0.0,
            attacker_multiplier: 1.0,
        }
    }
}

impl DamagePacket {
    /// Create a packet with the given base damage and type.
    #[must_use]
    pub fn new(base: f32, damage_type: DamageType) -> Self {
        Self {
            base,
            damage_type,
            ..Self::default()
        }
    }

    /// Set attack scaling (builder pattern).
    #[must_use]
    pub fn with_attack_scaling(mut self, scaling: f32) -> Self {
        self.scaling_attack = scaling;
        self
    }

    /// Set magic scaling (builder pattern).
    #[must_use]
    pub fn with_magic_scaling(mut self, scaling: f32) -> Self {
        self.scaling_magic = scaling;
        self
    }

    /// Set flat bonus (builder pattern).
    #[must_use]
    pub fn with_flat_bonus(mut self, bonus: f32) -> Self {
        self.flat_bonus = bonus;
        self
    }

    /// Set armor penetration (builder pattern).
    #[must_use]
    pub fn with_armor_pen(mut self, armor_pen: f32) -> Self {
        self.armor_pen = armor_pen;
        self
    }

    /// Set the attacker multiplier (builder pattern).
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f32) -> Self {
        self.attacker_multiplier = multiplier;
        self
    }

    /// Multiply the attacker multiplier in place.
    pub fn scale(&mut self, factor: f32) {
        self.attacker_multiplier *= factor;
    }
}

/// Outcome of one resolved hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageResult {
    /// Damage before armor and resistance.
    pub raw: f32,
    /// Damage after armor.
    pub after_armor: f32,
    /// Damage after resistance, before the crit.
    pub after_resist: f32,
    /// Integer damage subtracted from hp.
    pub final_damage: i32,
    /// Whether the hit was critical.
    pub is_crit: bool,
    /// Whether the defender's hp is now zero.
    pub killed: bool,
    /// Type the packet carried.
    pub damage_type: DamageType,
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve one packet against a defender, mutating the defender's hp.
///
/// Armor mitigates on a soft curve, `raw * 100 / (100 + armor)`, after
/// penetration is subtracted. The crit roll is only drawn when
/// post-resistance damage is positive.
pub fn compute_damage<R>(
    attacker: &Stats,
    defender: &mut Stats,
    packet: &DamagePacket,
    rng: &mut R,
) -> DamageResult
where
    R: RandomSource + ?Sized,
{
    let raw = (packet.base
        + attacker.attack as f32 * packet.scaling_attack
        + attacker.magic as f32 * packet.scaling_magic
        + packet.flat_bonus)
        * packet.attacker_multiplier;
    let raw = raw.max(0.0);

    let effective_armor = (defender.armor as f32 - packet.armor_pen).max(0.0);
    let after_armor = if effective_armor > 0.0 {
        raw * (100.0 / (100.0 + effective_armor))
    } else {
        raw
    };
    let resist = defender.resistance(packet.damage_type);
    let after_resist = after_armor * (1.0 - resist);

    let mut is_crit = false;
    let mut dealt = after_resist;
    if dealt > 0.0 && rng.next_unit() < attacker.crit_chance {
        dealt *= attacker.crit_multiplier;
        is_crit = true;
    }

    let final_damage = dealt.round().max(0.0) as i32;
    defender.lose_hp(final_damage);

    trace!(
        raw,
        after_armor,
        after_resist,
        final_damage,
        is_crit,
        hp = defender.hp,
        "damage resolved"
    );

    DamageResult {
        raw,
        after_armor,
        after_resist,
        final_damage,
        is_crit,
        killed: defender.is_dead(),
        damage_type: packet.damage_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn goblin() -> Stats {
        Stats::new(40)
            .with_attack(10)
            .with_armor(3)
            .with_resistance(DamageType::Fire, 0.1)
    }

    fn knight() -> Stats {
        Stats::new(100)
            .with_attack(20)
            .with_magic(5)
            .with_armor(5)
            .with_crit(0.1, 1.7)
    }

    #[test]
    fn test_fire_packet_against_goblin() {
        let attacker = Stats::new(100).with_attack(20).with_crit(0.0, 1.5);
        let mut defender = goblin();
        let packet = DamagePacket::new(10.0, DamageType::Fire).with_attack_scaling(0.8);

        let result = compute_damage(&attacker, &mut defender, &packet, &mut FixedRoll(0.99));

        // 10 + 20 * 0.8 = 26, 26 * 100 / 103 = 25.24, * 0.9 = 22.72
        assert!((result.raw - 26.0).abs() < 1e-4);
        assert!((result.after_armor - 2600.0 / 103.0).abs() < 1e-3);
        assert!((result.after_resist - 2340.0 / 103.0).abs() < 1e-3);
        assert_eq!(result.final_damage, 23);
        assert_eq!(defender.hp, 17);
        assert_eq!(result.damage_type, DamageType::Fire);
        assert!(!result.is_crit);
        assert!(!result.killed);
    }

    #[test]
    fn test_soft_armor_curve() {
        let attacker = Stats::new(100).with_attack(20).with_crit(0.05, 1.5);
        let mut defender = Stats::new(100).with_armor(5);
        let packet = DamagePacket::new(10.0, DamageType::Physical).with_attack_scaling(0.8);

        let result = compute_damage(&attacker, &mut defender, &packet, &mut FixedRoll(0.5));

        assert!((result.raw - 26.0).abs() < 1e-4);
        assert!((result.after_armor - 24.7619).abs() < 1e-3);
        assert!((result.after_resist - result.after_armor).abs() < 1e-6);
        assert_eq!(result.final_damage, 25);
        assert_eq!(defender.hp, 75);
    }

    #[test]
    fn test_armor_pen_removes_mitigation() {
        let attacker = Stats::new(100).with_attack(0).with_crit(0.0, 1.5);
        let mut defender = Stats::new(100).with_armor(5);
        let packet = DamagePacket::new(30.0, DamageType::Physical).with_armor_pen(10.0);

        let result = compute_damage(&attacker, &mut defender, &packet, &mut FixedRoll(0.5));

        assert!((result.after_armor - 30.0).abs() < 1e-4);
        assert_eq!(result.final_damage, 30);
    }

    #[test]
    fn test_guaranteed_crit_multiplies() {
        let attacker = knight();
        let mut defender = goblin();
        let packet = DamagePacket::new(10.0, DamageType::Physical).with_attack_scaling(1.0);

        let result = compute_damage(&attacker, &mut defender, &packet, &mut FixedRoll(0.0));

        // 30 * 100 / 103 = 29.13, * 1.7 = 49.51
        assert!(result.is_crit);
        assert!((result.after_resist - result.after_armor).abs() < 1e-4);
        assert!((result.after_resist - 3000.0 / 103.0).abs() < 1e-3);
        assert_eq!(result.final_damage, 50);
        assert_eq!(defender.hp, 0);
        assert!(result.killed);
    }

    #[test]
    fn test_crit_leaves_after_resist_uncritted() {
        let attacker = Stats::new(100).with_attack(0).with_crit(1.0, 2.0);
        let mut defender = Stats::new(100).with_resistance(DamageType::Fire, 0.5);
        let packet = DamagePacket::new(10.0, DamageType::Fire);

        let result = compute_damage(&attacker, &mut defender, &packet, &mut FixedRoll(0.0));

        assert!(result.is_crit);
        assert!((result.after_armor - 10.0).abs() < 1e-4);
        assert!((result.after_resist - 5.0).abs() < 1e-4);
        assert_eq!(result.final_damage, 10);
        assert_eq!(defender.hp, 90);
    }

    #[test]
    fn test_default_packet_has_no_attack_scaling() {
        let packet = DamagePacket::new(12.0, DamageType::Physical);
        assert!(packet.scaling_attack.abs() < f32::EPSILON);

        let parsed: DamagePacket = toml::from_str("base = 12.0").expect("packet");
        assert_eq!(parsed, packet);

        let attacker = Stats::new(100).with_attack(50).with_crit(0.0, 1.5);
        let mut defender = Stats::new(100);
        let result = compute_damage(&attacker, &mut defender, &packet, &mut FixedRoll(0.5));
        assert_eq!(result.final_damage, 12);
    }

    #[test]
    fn test_negative_raw_deals_nothing_and_skips_roll() {
        let attacker = Stats::new(10).with_attack(1).with_crit(1.0, 3.0);
        let mut defender = Stats::new(50).with_armor(10);
        let packet = DamagePacket::new(-5.0, DamageType::Physical);

        let mut rolls = RollSequence::new(vec![0.0, 0.5]);
        let result = compute_damage(&attacker, &mut defender, &packet, &mut rolls);

        assert!(result.raw.abs() < f32::EPSILON);
        assert_eq!(result.final_damage, 0);
        assert!(!result.is_crit);
        assert_eq!(defender.hp, 50);
        // No roll consumed: the next draw is still the first one.
        assert!(rolls.next_unit().abs() < f32::EPSILON);
    }

    #[test]
    fn test_resist_above_cap_still_lets_ten_percent_through() {
        let attacker = Stats::new(10).with_attack(0).with_crit(0.0, 1.5);
        let mut defender = Stats::new(100).with_resistance(DamageType::Dark, 5.0);
        let packet = DamagePacket::new(100.0, DamageType::Dark);

        let result = compute_damage(&attacker, &mut defender, &packet, &mut FixedRoll(0.5));

        assert_eq!(result.final_damage, 10);
        assert_eq!(defender.hp, 90);
    }

    #[test]
    fn test_full_resist_behaves_like_cap() {
        let attacker = Stats::new(10).with_attack(7).with_crit(0.0, 1.5);
        let packet = DamagePacket::new(33.0, DamageType::Holy);
        let mut capped = Stats::new(100).with_armor(4).with_resistance(DamageType::Holy, 0.9);
        let mut full = Stats::new(100).with_armor(4).with_resistance(DamageType::Holy, 1.0);

        let a = compute_damage(&attacker, &mut capped, &packet, &mut FixedRoll(0.5));
        let b = compute_damage(&attacker, &mut full, &packet, &mut FixedRoll(0.5));

        assert_eq!(a, b);
        assert_eq!(capped.hp, full.hp);
    }

    #[test]
    fn test_negative_resistance_is_treated_as_zero() {
        let attacker = Stats::new(10).with_attack(0).with_crit(0.0, 1.5);
        let mut defender = Stats::new(100).with_resistance(DamageType::Ice, -1.0);
        let packet = DamagePacket::new(30.0, DamageType::Ice);

        let result = compute_damage(&attacker, &mut defender, &packet, &mut FixedRoll(0.5));
        assert_eq!(result.final_damage, 30);
    }

    #[test]
    fn test_multiplier_and_magic_scaling() {
        let attacker = Stats::new(80).with_attack(10).with_magic(25).with_crit(0.0, 2.0);
        let mut defender = Stats::new(100);
        let packet = DamagePacket::new(4.0, DamageType::Fire)
            .with_attack_scaling(0.0)
            .with_magic_scaling(1.0)
            .with_flat_bonus(1.0)
            .with_multiplier(2.0);

        let result = compute_damage(&attacker, &mut defender, &packet, &mut FixedRoll(0.9));

        // (4 + 25 + 1) * 2 = 60
        assert_eq!(result.final_damage, 60);
        assert_eq!(defender.hp, 40);
    }

    #[test]
    fn test_overkill_floors_hp_at_zero() {
        let attacker = knight().with_crit(0.0, 1.5);
        let mut defender = Stats::new(5);
        let packet = DamagePacket::new(100.0, DamageType::Physical);

        let result = compute_damage(&attacker, &mut defender, &packet, &mut FixedRoll(0.9));
        assert_eq!(defender.hp, 0);
        assert!(result.killed);
    }

    #[test]
    fn test_hits_on_dead_defender_stay_at_zero() {
        let attacker = knight().with_crit(0.0, 1.5);
        let mut defender = Stats::new(5);
        let packet = DamagePacket::new(20.0, DamageType::Physical);

        for _ in 0..3 {
            let result = compute_damage(&attacker, &mut defender, &packet, &mut FixedRoll(0.9));
            assert!(result.killed);
            assert_eq!(defender.hp, 0);
        }
    }

    proptest! {
        #[test]
        fn prop_hp_stays_in_bounds(
            base in -50.0f32..500.0,
            attack in 0i32..200,
            armor in 0i32..100,
            resist in -2.0f32..2.0,
            roll in 0.0f32..1.0,
            hp in 0i32..300,
        ) {
            let attacker = Stats::new(100).with_attack(attack).with_crit(0.3, 2.0);
            let mut defender = Stats::new(300)
                .with_armor(armor)
                .with_resistance(DamageType::Poison, resist);
            defender.hp = hp;
            let packet = DamagePacket::new(base, DamageType::Poison);

            let result = compute_damage(&attacker, &mut defender, &packet, &mut FixedRoll(roll));

            prop_assert!(result.final_damage >= 0);
            prop_assert!(defender.hp >= 0 && defender.hp <= defender.max_hp);
            prop_assert!(result.after_armor >= 0.0);
            prop_assert!(result.after_armor <= result.raw + 1e-3);
            prop_assert_eq!(result.killed, defender.hp <= 0);
        }
    }
}
