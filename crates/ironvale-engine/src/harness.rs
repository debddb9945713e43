//! Scripted headless run.
//!
//! Builds a walled arena, feeds the world an autopilot intent every tick,
//! and folds the reported events into a `RunSummary`.

use crate::config::SimConfig;
use crate::timing::FixedStep;
use anyhow::{Context, Result};
use glam::Vec2;
use ironvale_common::IronvaleResult;
use ironvale_gameplay::{
    ActorKind, Catalog, CombatEvent, Damageable, ImageManifest, LevelGeometry, PlayerIntent, TickReport, World,
};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Distance the autopilot tries to keep from its target.
const PREFERRED_RANGE: (f32, f32) = (70.0, 160.0);

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Ticks simulated
    pub ticks: u64,
    /// Seconds simulated
    pub sim_seconds: f32,
    /// Seed the RNG was built from
    pub seed: u64,
    /// Enemies that entered the world
    pub enemies_spawned: u32,
    /// Enemies killed
    pub enemies_killed: u32,
    /// Bosses killed
    pub bosses_killed: u32,
    /// Experience earned
    pub xp_earned: u32,
    /// Damage the player dealt
    pub damage_dealt: i64,
    /// Damage the player took
    pub damage_taken: i64,
    /// Hp lost to damage-over-time effects (all actors)
    pub effect_damage: i64,
    /// Critical hits landed by either side
    pub crits: u32,
    /// Projectiles fired by the player
    pub shots_fired: u32,
    /// Boss area strikes released
    pub boss_strikes: u32,
    /// Spawns rejected by the catalog
    pub spawn_errors: u32,
    /// Whether the player survived
    pub player_alive: bool,
    /// Player hp at the end
    pub player_hp: i32,
}

impl RunSummary {
    /// Fold one tick's report into the totals.
    pub fn record(&mut self, report: &TickReport) {
        self.spawn_errors += report.spawn_errors.len() as u32;
        for event in &report.events {
            match event {
                CombatEvent::Damaged { kind, result, .. } => {
                    let amount = i64::from(result.final_damage);
                    if *kind == ActorKind::Player {
                        self.damage_taken += amount;
                    } else {
                        self.damage_dealt += amount;
                    }
                    if result.is_crit {
                        self.crits += 1;
                    }
                },
                CombatEvent::Died { kind, xp_reward, .. } => match kind {
                    ActorKind::Player => {},
                    ActorKind::Enemy => {
                        self.enemies_killed += 1;
                        self.xp_earned += xp_reward;
                    },
                    ActorKind::Boss => {
                        self.enemies_killed += 1;
                        self.bosses_killed += 1;
                        self.xp_earned += xp_reward;
                    },
                },
                CombatEvent::EffectTicked { hp_delta, .. } if *hp_delta < 0 => {
                    self.effect_damage += i64::from(-hp_delta);
                },
                CombatEvent::ProjectileFired { .. } => self.shots_fired += 1,
                CombatEvent::BossStrike { .. } => self.boss_strikes += 1,
                CombatEvent::EnemySpawned { .. } => self.enemies_spawned += 1,
                _ => {},
            }
        }
    }

    /// Write the summary as pretty JSON.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing run summary to {}", path.display()))?;
        info!("Wrote run summary to {}", path.display());
        Ok(())
    }
}

/// Collision grid with a one-tile solid border.
#[must_use]
pub fn arena_grid(width: usize, height: usize) -> Vec<Vec<u8>> {
    (0..height)
        .map(|row| {
            (0..width)
                .map(|col| u8::from(row == 0 || col == 0 || row + 1 == height || col + 1 == width))
                .collect()
        })
        .collect()
}

/// Load the catalog named by the config, or the built-in one.
pub fn load_catalog(config: &SimConfig) -> IronvaleResult<Catalog> {
    match &config.catalog_path {
        Some(path) => Ok(Catalog::load_file(path)?),
        None => Ok(Catalog::with_defaults()),
    }
}

/// Build the world for a run.
pub fn build_world(config: &SimConfig, catalog: Arc<Catalog>) -> Result<World> {
    let center = config.arena_size() / 2.0;
    let mut world = World::new(
        catalog,
        config.world.clone(),
        &config.player_archetype,
        center,
        Box::new(ImageManifest::new()),
    )
    .with_context(|| format!("creating player {}", config.player_archetype))?
    .with_spawns(config.spawns.clone());

    let grid = arena_grid(config.arena_tiles.0, config.arena_tiles.1);
    world.set_level_geometry(LevelGeometry::from_collision_grid(&grid, config.tile_size));
    Ok(world)
}

/// Intent that keeps the player at range from the nearest enemy and attacks.
#[must_use]
pub fn autopilot(world: &World) -> PlayerIntent {
    let player = world.player();
    let nearest = world
        .enemies()
        .iter()
        .filter(|e| !e.is_dead())
        .map(|e| (e.pos(), e.pos().distance_squared(player.pos)))
        .min_by(|a, b| a.1.total_cmp(&b.1));

    let Some((target, distance_sq)) = nearest else {
        return PlayerIntent::default();
    };
    let offset = target - player.pos;
    let distance = distance_sq.sqrt();
    let toward = offset.try_normalize().unwrap_or(Vec2::X);

    let movement = if distance > PREFERRED_RANGE.1 {
        toward
    } else if distance < PREFERRED_RANGE.0 {
        -toward
    } else {
        toward.perp()
    };

    let reach = if player.weapon.is_ranged() {
        world.config().player.arrow_speed * world.config().player.arrow_lifetime
    } else {
        player.radius + world.config().player.melee_reach + 24.0
    };

    PlayerIntent {
        movement,
        attack: distance <= reach,
        aim: Some(target),
    }
}

/// Run the world to completion and return the summary.
pub fn run(config: &SimConfig) -> Result<RunSummary> {
    let catalog = Arc::new(load_catalog(config).context("loading catalog")?);
    let mut world = build_world(config, catalog)?;

    let seed = config.seed.unwrap_or_else(|| fastrand::u64(..));
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut summary = RunSummary {
        seed,
        ..RunSummary::default()
    };

    info!(
        seed,
        ticks = config.total_ticks(),
        player = %config.player_archetype,
        "Starting headless run"
    );

    let total = config.total_ticks();
    let dt = config.fixed_dt();
    let mut clock = FixedStep::new(config.tick_rate);

    while world.ticks() < total {
        let due = if config.realtime {
            let frame = clock.frame_delta();
            let due = clock.accumulate(frame);
            if due == 0 {
                clock.sleep_until_next();
            }
            due
        } else {
            1
        };

        for _ in 0..due {
            let intent = autopilot(&world);
            let report = world.tick(dt, &intent, &mut rng);
            summary.record(&report);
            if world.ticks() % u64::from(config.tick_rate) == 0 {
                debug!(
                    t = world.time(),
                    enemies = world.living_enemies(),
                    hp = world.player().stats.hp,
                    "tick"
                );
            }
            if world.ticks() >= total {
                break;
            }
        }

        if world.player().is_dead() {
            warn!(t = world.time(), "player died, ending run");
            break;
        }
    }

    summary.ticks = world.ticks();
    summary.sim_seconds = world.time();
    summary.player_alive = !world.player().is_dead();
    summary.player_hp = world.player().stats.hp;
    if clock.dropped_frames() > 0 {
        warn!(dropped = clock.dropped_frames(), "realtime pacing fell behind");
    }

    info!(
        ticks = summary.ticks,
        kills = summary.enemies_killed,
        bosses = summary.bosses_killed,
        dealt = summary.damage_dealt,
        taken = summary.damage_taken,
        alive = summary.player_alive,
        "Run complete"
    );

    if let Some(path) = &config.report_path {
        summary.write_json(path)?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironvale_gameplay::SpawnEntry;
    use tempfile::TempDir;

    fn short_config() -> SimConfig {
        SimConfig {
            duration_secs: 3.0,
            seed: Some(99),
            arena_tiles: (20, 14),
            spawns: vec![SpawnEntry::new("goblin", Vec2::new(420.0, 224.0), 0.0)],
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_arena_grid_border() {
        let grid = arena_grid(5, 4);
        assert_eq!(grid.len(), 4);
        assert_eq!(grid[0], vec![1, 1, 1, 1, 1]);
        assert_eq!(grid[1], vec![1, 0, 0, 0, 1]);
        assert_eq!(grid[3], vec![1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_autopilot_idles_without_enemies() {
        let config = SimConfig {
            spawns: Vec::new(),
            ..short_config()
        };
        let world = build_world(&config, Arc::new(Catalog::with_defaults())).expect("world");
        assert_eq!(autopilot(&world), PlayerIntent::default());
    }

    #[test]
    fn test_autopilot_closes_distance_and_aims() {
        let config = short_config();
        let mut world = build_world(&config, Arc::new(Catalog::with_defaults())).expect("world");
        let target = world.player().pos + Vec2::new(300.0, 0.0);
        world.spawn_enemy("goblin", target).expect("goblin");

        let intent = autopilot(&world);
        assert!(intent.movement.x > 0.99);
        assert_eq!(intent.aim, Some(target));
        assert!(!intent.attack);
    }

    #[test]
    fn test_short_run_is_deterministic() {
        let config = short_config();
        let first = run(&config).expect("run");
        let second = run(&config).expect("run");

        assert_eq!(first, second);
        assert_eq!(first.enemies_spawned, 1);
        assert_eq!(first.seed, 99);
        assert!(first.ticks <= config.total_ticks());
    }

    #[test]
    fn test_summary_written_as_json() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let report = temp_dir.path().join("out").join("summary.json");
        let config = SimConfig {
            report_path: Some(report.clone()),
            ..short_config()
        };

        let summary = run(&config).expect("run");
        let text = fs::read_to_string(&report).expect("read summary");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["ticks"], serde_json::json!(summary.ticks));
        assert_eq!(value["seed"], serde_json::json!(99));
    }

    #[test]
    fn test_unknown_player_fails_run() {
        let config = SimConfig {
            player_archetype: "bard".to_string(),
            ..short_config()
        };
        assert!(run(&config).is_err());
    }

    #[test]
    fn test_catalog_file_replaces_builtins() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("catalog.toml");
        fs::write(&path, include_str!("../../../data/catalog.toml")).expect("write catalog");

        let config = SimConfig {
            catalog_path: Some(path),
            ..short_config()
        };
        let catalog = load_catalog(&config).expect("catalog");
        assert!(catalog.enemy("bat").is_ok());
        assert!(catalog.player("knight").is_ok());
    }
}
