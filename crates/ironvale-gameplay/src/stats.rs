//! Combat stat records.
//!
//! This module provides:
//! - Damage types shared by packets, resistances, and damage-over-time effects
//! - The flat `Stats` record carried by every actor
//! - Archetype templates restored to full health on spawn

use ironvale_common::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Highest resistance that is honoured when damage is resolved.
pub const MAX_RESISTANCE: f32 = 0.9;

// ============================================================================
// Damage Types
// ============================================================================

/// Types of damage that can be dealt.
///
/// Serialized as lowercase names so catalogs can key resistance tables by
/// `"fire"`, `"physical"`, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DamageType {
    /// Physical damage.
    Physical,
    /// Fire damage.
    Fire,
    /// Ice/frost damage.
    Ice,
    /// Lightning damage.
    Lightning,
    /// Poison damage.
    Poison,
    /// Holy damage.
    Holy,
    /// Dark/shadow damage.
    Dark,
}

impl DamageType {
    /// All damage types in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Physical,
        Self::Fire,
        Self::Ice,
        Self::Lightning,
        Self::Poison,
        Self::Holy,
        Self::Dark,
    ];

    /// Lowercase name used in data files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Fire => "fire",
            Self::Ice => "ice",
            Self::Lightning => "lightning",
            Self::Poison => "poison",
            Self::Holy => "holy",
            Self::Dark => "dark",
        }
    }
}

impl Default for DamageType {
    fn default() -> Self {
        Self::Physical
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DamageType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownDamageType(s.to_string()))
    }
}

impl TryFrom<String> for DamageType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DamageType> for String {
    fn from(value: DamageType) -> Self {
        value.name().to_string()
    }
}

// ============================================================================
// Stats
// ============================================================================

fn default_crit_chance() -> f32 {
    0.05
}

fn default_crit_multiplier() -> f32 {
    1.5
}

/// Flat combat stats for one actor.
///
/// `hp` is kept within `[0, max_hp]` by every mutator in this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Maximum hit points.
    pub max_hp: i32,
    /// Current hit points.
    #[serde(default)]
    pub hp: i32,
    /// Physical attack power.
    #[serde(default)]
    pub attack: i32,
    /// Magic attack power.
    #[serde(default)]
    pub magic: i32,
    /// Flat damage reduction.
    #[serde(default)]
    pub armor: i32,
    /// Fractional resistance per damage type (clamped to `[0, 0.9]` on use).
    #[serde(default)]
    pub resistances: HashMap<DamageType, f32>,
    /// Probability of a critical hit in `[0, 1]`.
    #[serde(default = "default_crit_chance")]
    pub crit_chance: f32,
    /// Damage multiplier applied on a critical hit.
    #[serde(default = "default_crit_multiplier")]
    pub crit_multiplier: f32,
    /// Fractional hp change from effect ticks not yet applied.
    #[serde(skip)]
    pub effect_carry: f32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            max_hp: 100,
            hp: 100,
            attack: 10,
            magic: 0,
            armor: 0,
            resistances: HashMap::new(),
            crit_chance: default_crit_chance(),
            crit_multiplier: default_crit_multiplier(),
            effect_carry: 0.0,
        }
    }
}

impl Stats {
    /// Create stats with the given maximum hp at full health.
    #[must_use]
    pub fn new(max_hp: i32) -> Self {
        Self {
            max_hp,
            hp: max_hp,
            ..Self::default()
        }
    }

    /// Set attack (builder pattern).
    #[must_use]
    pub fn with_attack(mut self, attack: i32) -> Self {
        self.attack = attack;
        self
    }

    /// Set magic (builder pattern).
    #[must_use]
    pub fn with_magic(mut self, magic: i32) -> Self {
        self.magic = magic;
        self
    }

    /// Set armor (builder pattern).
    #[must_use]
    pub fn with_armor(mut self, armor: i32) -> Self {
        self.armor = armor;
        self
    }

    /// Set a resistance (builder pattern).
    #[must_use]
    pub fn with_resistance(mut self, damage_type: DamageType, value: f32) -> Self {
        self.resistances.insert(damage_type, value);
        self
    }

    /// Set crit chance and multiplier (builder pattern).
    #[must_use]
    pub fn with_crit(mut self, chance: f32, multiplier: f32) -> Self {
        self.crit_chance = chance;
        self.crit_multiplier = multiplier;
        self
    }

    /// Copy of these stats at full health.
    ///
    /// Archetype templates are stored with whatever `hp` the data file had;
    /// every spawned actor starts from `restored()`.
    #[must_use]
    pub fn restored(&self) -> Self {
        let mut stats = self.clone();
        stats.hp = stats.max_hp.max(0);
        stats
    }

    /// Resistance to a damage type, clamped to `[0, 0.9]`.
    #[must_use]
    pub fn resistance(&self, damage_type: DamageType) -> f32 {
        self.resistances
            .get(&damage_type)
            .copied()
            .unwrap_or(0.0)
            .clamp(0.0, MAX_RESISTANCE)
    }

    /// Whether hp has reached zero.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    /// Current hp as a fraction of max hp (0 when max hp is not positive).
    #[must_use]
    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        (self.hp as f32 / self.max_hp as f32).clamp(0.0, 1.0)
    }

    /// Restore hp, never exceeding max hp. Returns the amount actually healed.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if amount <= 0 || self.is_dead() {
            return 0;
        }
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
        self.hp - before
    }

    /// Subtract hp, flooring at zero. Returns the hp actually lost.
    pub fn lose_hp(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let before = self.hp;
        self.hp = self.hp.saturating_sub(amount).clamp(0, self.max_hp.max(0));
        before - self.hp
    }
}
