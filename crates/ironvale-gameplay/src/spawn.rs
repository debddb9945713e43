//! Timed enemy spawns.
//!
//! A level lists `(enemy_type, position, spawn_time)` entries. Each
//! delayed entry is preceded by a warning, fired `warning_lead` seconds
//! early, so an announcement effect can play before the enemy appears.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Seconds between a spawn warning and the spawn.
pub const DEFAULT_WARNING_LEAD: f32 = 1.5;

/// One scheduled spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnEntry {
    /// Catalog id of the enemy
    pub enemy_type: String,
    /// World position
    pub position: Vec2,
    /// Seconds after level start; zero spawns on the first tick
    #[serde(default)]
    pub spawn_time: f32,
}

impl SpawnEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(enemy_type: impl Into<String>, position: Vec2, spawn_time: f32) -> Self {
        Self {
            enemy_type: enemy_type.into(),
            position,
            spawn_time: spawn_time.max(0.0),
        }
    }
}

/// Something the world has to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnRequest {
    /// An enemy will appear here soon
    Warning {
        /// Catalog id of the enemy
        enemy_type: String,
        /// World position
        position: Vec2,
    },
    /// Spawn an enemy now
    Enemy {
        /// Catalog id of the enemy
        enemy_type: String,
        /// World position
        position: Vec2,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Scheduled {
    at: f32,
    request: SpawnRequest,
}

/// Releases spawn requests as level time passes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpawnScheduler {
    queue: Vec<Scheduled>,
    cursor: usize,
    elapsed: f32,
}

impl SpawnScheduler {
    /// Build a schedule with the default warning lead.
    #[must_use]
    pub fn new(entries: Vec<SpawnEntry>) -> Self {
        Self::with_warning_lead(entries, DEFAULT_WARNING_LEAD)
    }

    /// Build a schedule with a custom warning lead.
    #[must_use]
    pub fn with_warning_lead(entries: Vec<SpawnEntry>, lead: f32) -> Self {
        let mut queue = Vec::with_capacity(entries.len() * 2);
        for entry in entries {
            if entry.spawn_time > 0.0 {
                queue.push(Scheduled {
                    at: (entry.spawn_time - lead).max(0.0),
                    request: SpawnRequest::Warning {
                        enemy_type: entry.enemy_type.clone(),
                        position: entry.position,
                    },
                });
            }
            queue.push(Scheduled {
                at: entry.spawn_time,
                request: SpawnRequest::Enemy {
                    enemy_type: entry.enemy_type,
                    position: entry.position,
                },
            });
        }
        // stable: warnings stay ahead of spawns sharing a timestamp
        queue.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self {
            queue,
            cursor: 0,
            elapsed: 0.0,
        }
    }

    /// Advance level time and return every request now due, in order.
    pub fn update(&mut self, dt: f32) -> Vec<SpawnRequest> {
        self.elapsed += dt.max(0.0);
        let start = self.cursor;
        while self.cursor < self.queue.len() && self.queue[self.cursor].at <= self.elapsed {
            self.cursor += 1;
        }
        self.queue[start..self.cursor]
            .iter()
            .map(|s| s.request.clone())
            .collect()
    }

    /// Rewind to level start.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.elapsed = 0.0;
    }

    /// Level time seen so far.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Requests not yet released.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len() - self.cursor
    }

    /// Whether every request has been released.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.queue.len()
    }
}
