//! Content catalog.
//!
//! This module provides:
//! - Enemy, player, and status-effect archetypes
//! - Built-in defaults for the stock content set
//! - TOML loading with validation (`[[enemies]]`, `[[players]]`, `[[effects]]`)
//!
//! A `Catalog` is built once and shared read-only (usually behind an
//! `Arc`). Unknown ids are reported as `ConfigError`s.

use crate::boss::BossAttackConfig;
use crate::player::WeaponKind;
use crate::stats::{DamageType, Stats};
use crate::status::{EffectKind, StatusEffect};
use ironvale_common::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

fn default_enemy_radius() -> f32 {
    18.0
}

fn default_player_radius() -> f32 {
    16.0
}

fn default_scale() -> f32 {
    0.25
}

fn default_xp_reward() -> u32 {
    10
}

// ============================================================================
// Archetypes
// ============================================================================

/// Template for one enemy type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyArchetype {
    /// Catalog id (`"goblin"`)
    pub id: String,
    /// Sprite folder name, defaults to the id
    #[serde(default)]
    pub sprite_id: Option<String>,
    /// Draw scale
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Base stats (restored to full hp on spawn)
    pub stats: Stats,
    /// Max speed in units per second
    pub speed: f32,
    /// Patrol half-width around the spawn point
    pub move_range: f32,
    /// Chase threshold distance
    pub aggro_radius: f32,
    /// Body radius
    #[serde(default = "default_enemy_radius")]
    pub radius: f32,
    /// Steering force cap, defaults to `speed`
    #[serde(default)]
    pub max_force: Option<f32>,
    /// Experience granted on kill
    #[serde(default = "default_xp_reward")]
    pub xp_reward: u32,
    /// Present on elite enemies
    #[serde(default)]
    pub boss: Option<BossAttackConfig>,
}

impl EnemyArchetype {
    /// Sprite folder name.
    #[must_use]
    pub fn sprite(&self) -> &str {
        self.sprite_id.as_deref().unwrap_or(&self.id)
    }

    /// Effective steering force cap.
    #[must_use]
    pub fn force_cap(&self) -> f32 {
        self.max_force.unwrap_or(self.speed)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.stats.max_hp <= 0 {
            return Err(ConfigError::Validation(format!("enemy {} has max_hp <= 0", self.id)));
        }
        if self.speed < 0.0 || self.move_range < 0.0 || self.aggro_radius < 0.0 || self.radius <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "enemy {} has a negative speed, range, or radius",
                self.id
            )));
        }
        if let Some(boss) = &self.boss {
            boss.validate(&self.id)?;
        }
        Ok(())
    }
}

/// Template for one playable class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerArchetype {
    /// Catalog id (`"knight"`)
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Move speed in units per second
    pub speed: f32,
    /// Base stats
    pub stats: Stats,
    /// Body radius
    #[serde(default = "default_player_radius")]
    pub radius: f32,
    /// Starting weapon
    #[serde(default)]
    pub weapon: WeaponKind,
}

impl PlayerArchetype {
    fn validate(&self) -> ConfigResult<()> {
        if self.stats.max_hp <= 0 || self.speed < 0.0 || self.radius <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "player {} needs positive max_hp and radius",
                self.id
            )));
        }
        Ok(())
    }
}

/// On-disk catalog layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    /// Enemy entries
    pub enemies: Vec<EnemyArchetype>,
    /// Player entries
    pub players: Vec<PlayerArchetype>,
    /// Status effect entries
    pub effects: Vec<StatusEffect>,
}

// ============================================================================
// Catalog
// ============================================================================

/// All archetypes, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    enemies: HashMap<String, EnemyArchetype>,
    players: HashMap<String, PlayerArchetype>,
    effects: HashMap<String, StatusEffect>,
}

impl Catalog {
    /// Empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the stock enemies, classes, and effects.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        for enemy in default_enemies() {
            catalog.enemies.insert(enemy.id.clone(), enemy);
        }
        for player in default_players() {
            catalog.players.insert(player.id.clone(), player);
        }
        for effect in default_effects() {
            catalog.effects.insert(effect.id.clone(), effect);
        }
        catalog
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let file: CatalogFile = toml::from_str(text)?;
        let mut catalog = Self::new();
        catalog.merge(file)?;
        Ok(catalog)
    }

    /// Read and parse a catalog file.
    pub fn load_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let catalog = Self::from_toml_str(&text)?;
        info!(
            "Loaded catalog from {} ({} enemies, {} players, {} effects)",
            path.display(),
            catalog.enemies.len(),
            catalog.players.len(),
            catalog.effects.len()
        );
        Ok(catalog)
    }

    /// Add every entry of `file`, rejecting ids already present.
    pub fn merge(&mut self, file: CatalogFile) -> ConfigResult<()> {
        for enemy in file.enemies {
            enemy.validate()?;
            if self.enemies.contains_key(&enemy.id) {
                return Err(ConfigError::DuplicateId {
                    kind: "enemy",
                    id: enemy.id,
                });
            }
            self.enemies.insert(enemy.id.clone(), enemy);
        }
        for player in file.players {
            player.validate()?;
            if self.players.contains_key(&player.id) {
                return Err(ConfigError::DuplicateId {
                    kind: "player",
                    id: player.id,
                });
            }
            self.players.insert(player.id.clone(), player);
        }
        for effect in file.effects {
            if self.effects.contains_key(&effect.id) {
                return Err(ConfigError::DuplicateId {
                    kind: "effect",
                    id: effect.id,
                });
            }
            self.effects.insert(effect.id.clone(), effect);
        }
        Ok(())
    }

    /// Enemy archetype by id.
    pub fn enemy(&self, id: &str) -> ConfigResult<&EnemyArchetype> {
        self.enemies
            .get(id)
            .ok_or_else(|| ConfigError::UnknownEnemy(id.to_string()))
    }

    /// Player archetype by id.
    pub fn player(&self, id: &str) -> ConfigResult<&PlayerArchetype> {
        self.players
            .get(id)
            .ok_or_else(|| ConfigError::UnknownPlayer(id.to_string()))
    }

    /// Fresh instance of a status effect by id.
    pub fn effect(&self, id: &str) -> ConfigResult<StatusEffect> {
        self.effects
            .get(id)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownEffect(id.to_string()))
    }

    /// Sorted enemy ids.
    #[must_use]
    pub fn enemy_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.enemies.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of enemy archetypes.
    #[must_use]
    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }
}

// ============================================================================
// Stock Content
// ============================================================================

fn enemy(id: &str, hp: i32, attack: i32, fire_resist: f32, speed: f32, move_range: f32, aggro: f32) -> EnemyArchetype {
    EnemyArchetype {
        id: id.to_string(),
        sprite_id: None,
        scale: default_scale(),
        stats: Stats::new(hp)
            .with_attack(attack)
            .with_armor(3)
            .with_resistance(DamageType::Fire, fire_resist),
        speed,
        move_range,
        aggro_radius: aggro,
        radius: default_enemy_radius(),
        max_force: None,
        xp_reward: default_xp_reward(),
        boss: None,
    }
}

fn default_enemies() -> Vec<EnemyArchetype> {
    let mut goblin = enemy("goblin", 40, 10, 0.1, 90.0, 280.0, 700.0);
    goblin.scale = 0.35;

    let mut boss_orc = enemy("boss_orc", 1000, 35, 0.2, 90.0, 800.0, 660.0);
    boss_orc.scale = 0.5;
    boss_orc.radius = 40.0;
    boss_orc.boss = Some(BossAttackConfig::default());

    let mut undead = enemy("undead", 300, 40, 0.4, 100.0, 800.0, 660.0);
    undead.scale = 0.2;
    let mut green = enemy("green", 100, 10, 0.4, 80.0, 600.0, 560.0);
    green.scale = 0.2;

    vec![
        goblin,
        enemy("slime_green", 50, 10, 0.1, 120.0, 800.0, 600.0),
        enemy("orc", 60, 15, 0.2, 110.0, 800.0, 660.0),
        boss_orc,
        enemy("troll", 200, 40, 0.4, 90.0, 800.0, 660.0),
        undead,
        enemy("demona", 200, 30, 0.4, 100.0, 700.0, 660.0),
        green,
        enemy("spider", 40, 10, 0.4, 150.0, 700.0, 660.0),
    ]
}

fn default_players() -> Vec<PlayerArchetype> {
    vec![
        PlayerArchetype {
            id: "knight".to_string(),
            name: "Knight".to_string(),
            speed: 250.0,
            stats: Stats::new(100)
                .with_attack(20)
                .with_magic(5)
                .with_armor(5)
                .with_resistance(DamageType::Physical, 0.1)
                .with_crit(0.1, 1.7),
            radius: default_player_radius(),
            weapon: WeaponKind::Sword,
        },
        PlayerArchetype {
            id: "wizard".to_string(),
            name: "Wizard".to_string(),
            speed: 300.0,
            stats: Stats::new(80)
                .with_attack(10)
                .with_magic(25)
                .with_armor(2)
                .with_resistance(DamageType::Fire, 0.2)
                .with_crit(0.15, 2.0),
            radius: default_player_radius(),
            weapon: WeaponKind::Bow,
        },
        PlayerArchetype {
            id: "default".to_string(),
            name: "Adventurer".to_string(),
            speed: 220.0,
            stats: Stats::new(100)
                .with_attack(20)
                .with_magic(5)
                .with_armor(5)
                .with_crit(0.1, 1.5),
            radius: default_player_radius(),
            weapon: WeaponKind::Unarmed,
        },
    ]
}

fn default_effects() -> Vec<StatusEffect> {
    vec![
        StatusEffect::new("haste", 5.0).with_modifier("move_speed", 1.3),
        StatusEffect::new("iron_skin", 5.0).with_modifier("damage_taken", 0.5),
        StatusEffect::new("berserk", 6.0)
            .with_modifier("damage_dealt", 1.5)
            .with_modifier("damage_taken", 1.25),
        StatusEffect::new("poison", 5.0)
            .with_tick_interval(1.0)
            .with_kind(EffectKind::DamageOverTime {
                amount: 3.0,
                damage_type: DamageType::Poison,
            }),
        StatusEffect::new("regeneration", 5.0)
            .with_tick_interval(1.0)
            .with_kind(EffectKind::Regeneration { amount: 5.0 }),
    ]
}
