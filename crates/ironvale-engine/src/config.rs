//! Harness configuration.
//!
//! Provides the parameters of one headless run: tick rate, duration, arena,
//! spawn schedule, and the world tunables. Configuration can be loaded from
//! and saved to a TOML file.

use glam::Vec2;
use ironvale_gameplay::{SpawnEntry, WorldConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "ironvale.toml";

/// Parameters of one simulated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Timing ===
    /// Fixed ticks per simulated second
    pub tick_rate: u32,
    /// Simulated seconds to run
    pub duration_secs: f32,
    /// Pace ticks against the wall clock instead of running flat out
    pub realtime: bool,
    /// RNG seed (None = random)
    pub seed: Option<u64>,

    // === Content ===
    /// Player class id
    pub player_archetype: String,
    /// Catalog file replacing the built-in content
    pub catalog_path: Option<PathBuf>,

    // === Arena ===
    /// Arena size in tiles (width, height), walls included
    pub arena_tiles: (usize, usize),
    /// Tile edge length in world units
    pub tile_size: f32,

    // === Output ===
    /// Write a JSON run summary here
    pub report_path: Option<PathBuf>,

    // === Simulation ===
    /// World tunables
    pub world: WorldConfig,
    /// Timed spawns
    pub spawns: Vec<SpawnEntry>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            duration_secs: 30.0,
            realtime: false,
            seed: None,
            player_archetype: "knight".to_string(),
            catalog_path: None,
            arena_tiles: (40, 24),
            tile_size: 32.0,
            report_path: None,
            world: WorldConfig::default(),
            spawns: default_spawns(),
        }
    }
}

fn default_spawns() -> Vec<SpawnEntry> {
    vec![
        SpawnEntry::new("goblin", Vec2::new(900.0, 200.0), 0.0),
        SpawnEntry::new("goblin", Vec2::new(960.0, 560.0), 0.0),
        SpawnEntry::new("slime_green", Vec2::new(300.0, 600.0), 2.0),
        SpawnEntry::new("orc", Vec2::new(1100.0, 380.0), 5.0),
        SpawnEntry::new("spider", Vec2::new(200.0, 160.0), 8.0),
        SpawnEntry::new("boss_orc", Vec2::new(1000.0, 400.0), 12.0),
    ]
}

impl SimConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.tick_rate = self.tick_rate.clamp(10, 240);
        self.duration_secs = self.duration_secs.clamp(0.1, 3600.0);

        self.arena_tiles.0 = self.arena_tiles.0.clamp(4, 512);
        self.arena_tiles.1 = self.arena_tiles.1.clamp(4, 512);
        self.tile_size = self.tile_size.clamp(8.0, 128.0);

        self.world.validate();
    }

    /// Seconds per tick.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Number of ticks the run lasts.
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        (self.duration_secs * self.tick_rate as f32).ceil() as u64
    }

    /// Arena size in world units.
    #[must_use]
    pub fn arena_size(&self) -> Vec2 {
        Vec2::new(
            self.arena_tiles.0 as f32 * self.tile_size,
            self.arena_tiles.1 as f32 * self.tile_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.player_archetype, "knight");
        assert_eq!(config.total_ticks(), 1800);
        assert!(config.spawns.iter().any(|s| s.enemy_type == "boss_orc"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimConfig::default();

        config.tick_rate = 1;
        config.arena_tiles = (1, 10_000);
        config.world.collision_passes = 0;

        config.validate();

        assert_eq!(config.tick_rate, 10);
        assert_eq!(config.arena_tiles, (4, 512));
        assert_eq!(config.world.collision_passes, 1);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("sim.toml");

        let mut config = SimConfig::default();
        config.tick_rate = 120;
        config.seed = Some(12345);
        config.player_archetype = "wizard".to_string();
        config.world.steering.separation_weight = 2.0;

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = SimConfig::load_from(&config_path);
        assert_eq!(loaded.tick_rate, 120);
        assert_eq!(loaded.seed, Some(12345));
        assert_eq!(loaded.player_archetype, "wizard");
        assert!((loaded.world.steering.separation_weight - 2.0).abs() < f32::EPSILON);
        assert_eq!(loaded.spawns, config.spawns);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = SimConfig::load_from("/nonexistent/path/ironvale.toml");
        assert_eq!(config.tick_rate, 60);
    }

    #[test]
    fn test_config_load_malformed_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "tick_rate = [").expect("write");

        let config = SimConfig::load_from(&config_path);
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(&config_path, "duration_secs = 5.0\n[world]\ncontact_cooldown = 1.0\n").expect("write");

        let config = SimConfig::load_from(&config_path);
        assert!((config.duration_secs - 5.0).abs() < f32::EPSILON);
        assert!((config.world.contact_cooldown - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.world.collision_passes, 4);
        assert_eq!(config.tick_rate, 60);
    }
}
