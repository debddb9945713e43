//! Timed status effects.
//!
//! This module provides:
//! - `StatusEffect` with duration, periodic ticks, and named modifiers
//! - `EffectKind` describing what an effect does when it ticks
//! - `StatusEffectManager`, the per-actor ledger of active effects
//! - `EffectEvent` lifecycle notifications, drained by the owner
//!
//! Modifier keys ending in `_add` are additive; every other key is a
//! multiplier. Queries are pulled by the owner (`get_multiplier("damage_taken")`),
//! lifecycle transitions are pushed as events.

use crate::stats::{DamageType, Stats};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Suffix that marks a modifier key as additive.
pub const ADDITIVE_SUFFIX: &str = "_add";

// ============================================================================
// Effects
// ============================================================================

/// What an effect does on apply, on each tick, and on removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    /// Only contributes modifiers.
    Modifier,
    /// Deals damage on every tick.
    DamageOverTime {
        /// Damage per tick before resistance.
        amount: f32,
        /// Damage type used for resistance.
        damage_type: DamageType,
    },
    /// Heals on every tick.
    Regeneration {
        /// Hp restored per tick.
        amount: f32,
    },
}

impl Default for EffectKind {
    fn default() -> Self {
        Self::Modifier
    }
}

/// A single active status effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Effect identifier (one live instance per id).
    pub id: String,
    /// Duration in seconds; zero or negative means infinite.
    pub duration: f32,
    /// Named modifiers (`"damage_taken"`, `"move_speed_add"`, ...).
    #[serde(default)]
    pub modifiers: HashMap<String, f32>,
    /// Seconds between ticks, if the effect ticks.
    #[serde(default)]
    pub tick_interval: Option<f32>,
    /// Behaviour on tick.
    #[serde(default)]
    pub kind: EffectKind,
    /// Seconds since the effect was applied.
    #[serde(skip)]
    pub elapsed: f32,
    /// Time accumulated toward the next tick.
    #[serde(skip)]
    pub tick_accumulator: f32,
}

impl StatusEffect {
    /// Create an effect with the given id and duration.
    #[must_use]
    pub fn new(id: impl Into<String>, duration: f32) -> Self {
        Self {
            id: id.into(),
            duration,
            modifiers: HashMap::new(),
            tick_interval: None,
            kind: EffectKind::Modifier,
            elapsed: 0.0,
            tick_accumulator: 0.0,
        }
    }

    /// Add a modifier (builder pattern).
    #[must_use]
    pub fn with_modifier(mut self, key: impl Into<String>, value: f32) -> Self {
        self.modifiers.insert(key.into(), value);
        self
    }

    /// Set the tick interval (builder pattern).
    #[must_use]
    pub fn with_tick_interval(mut self, interval: f32) -> Self {
        self.tick_interval = Some(interval);
        self
    }

    /// Set the effect kind (builder pattern).
    #[must_use]
    pub fn with_kind(mut self, kind: EffectKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether the effect never expires.
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        self.duration <= 0.0
    }

    /// Whether the effect has run its full duration.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        !self.is_infinite() && self.elapsed >= self.duration
    }

    /// Seconds left, or `None` for infinite effects.
    #[must_use]
    pub fn remaining(&self) -> Option<f32> {
        if self.is_infinite() {
            None
        } else {
            Some((self.duration - self.elapsed).max(0.0))
        }
    }

    fn ticks_per_interval(&self) -> Option<f32> {
        self.tick_interval.filter(|interval| *interval > 0.0)
    }
}

/// Lifecycle notification produced by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectEvent {
    /// Effect was inserted.
    Applied {
        /// Effect id
        id: String,
        /// Effect behaviour
        kind: EffectKind,
    },
    /// Effect ticked once.
    Ticked {
        /// Effect id
        id: String,
        /// Effect behaviour
        kind: EffectKind,
    },
    /// Effect left the ledger.
    Removed {
        /// Effect id
        id: String,
        /// Effect behaviour
        kind: EffectKind,
    },
}

impl EffectEvent {
    /// The id of the effect this event is about.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Applied { id, .. } | Self::Ticked { id, .. } | Self::Removed { id, .. } => id,
        }
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Per-actor collection of active effects, one instance per id.
///
/// Effects are kept in insertion order so events come out in a stable
/// order within a tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusEffectManager {
    effects: Vec<StatusEffect>,
    events: Vec<EffectEvent>,
}

impl StatusEffectManager {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an effect.
    ///
    /// With `refresh` set and an effect of the same id present, only the
    /// existing effect's timers are reset; its modifiers and duration are
    /// kept and no event fires. Otherwise the effect is inserted
    /// (replacing any same-id effect in place) and `Applied` fires.
    pub fn add(&mut self, effect: StatusEffect, refresh: bool) {
        if let Some(index) = self.position(&effect.id) {
            if refresh {
                let existing = &mut self.effects[index];
                existing.elapsed = 0.0;
                existing.tick_accumulator = 0.0;
                debug!(id = %effect.id, "status effect refreshed");
                return;
            }
            self.push_event_applied(&effect);
            self.effects[index] = Self::fresh(effect);
            return;
        }
        self.push_event_applied(&effect);
        self.effects.push(Self::fresh(effect));
    }

    /// Remove an effect by id. Missing ids are ignored.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(index) => {
                let effect = self.effects.remove(index);
                self.push_removed(effect);
                true
            },
            None => false,
        }
    }

    /// Remove every effect, emitting `Removed` for each.
    pub fn clear(&mut self) {
        let effects = std::mem::take(&mut self.effects);
        for effect in effects {
            self.push_removed(effect);
        }
    }

    /// Advance every effect by `dt` seconds.
    ///
    /// A large `dt` fires as many ticks as whole intervals fit. Expired
    /// effects are removed after the whole pass.
    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }

        let mut expired = Vec::new();
        for (index, effect) in self.effects.iter_mut().enumerate() {
            effect.elapsed += dt;

            if let Some(interval) = effect.ticks_per_interval() {
                effect.tick_accumulator += dt;
                while effect.tick_accumulator >= interval {
                    effect.tick_accumulator -= interval;
                    self.events.push(EffectEvent::Ticked {
                        id: effect.id.clone(),
                        kind: effect.kind.clone(),
                    });
                }
            }

            if effect.is_expired() {
                expired.push(index);
            }
        }

        for index in expired.into_iter().rev() {
            let effect = self.effects.remove(index);
            debug!(id = %effect.id, "status effect expired");
            self.events.push(EffectEvent::Removed {
                id: effect.id,
                kind: effect.kind,
            });
        }
    }

    /// Product of every active effect's value for `key` (1.0 when none).
    #[must_use]
    pub fn get_multiplier(&self, key: &str) -> f32 {
        self.effects
            .iter()
            .filter_map(|e| e.modifiers.get(key))
            .product()
    }

    /// Sum of every active effect's value for `key + "_add"` (0.0 when none).
    #[must_use]
    pub fn get_additive(&self, key: &str) -> f32 {
        let additive_key = format!("{key}{ADDITIVE_SUFFIX}");
        self.effects
            .iter()
            .filter_map(|e| e.modifiers.get(&additive_key))
            .sum()
    }

    /// Whether an effect with this id is active.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Active effect by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.id == id)
    }

    /// Seconds left on an effect (`None` if absent or infinite).
    #[must_use]
    pub fn remaining(&self, id: &str) -> Option<f32> {
        self.get(id).and_then(StatusEffect::remaining)
    }

    /// Iterate active effects in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    /// Number of active effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether no effects are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Take every pending lifecycle event, oldest first.
    pub fn drain_events(&mut self) -> Vec<EffectEvent> {
        std::mem::take(&mut self.events)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.effects.iter().position(|e| e.id == id)
    }

    fn fresh(mut effect: StatusEffect) -> StatusEffect {
        effect.elapsed = 0.0;
        effect.tick_accumulator = 0.0;
        effect
    }

    fn push_event_applied(&mut self, effect: &StatusEffect) {
        debug!(id = %effect.id, duration = effect.duration, "status effect applied");
        self.events.push(EffectEvent::Applied {
            id: effect.id.clone(),
            kind: effect.kind.clone(),
        });
    }

    fn push_removed(&mut self, effect: StatusEffect) {
        debug!(id = %effect.id, "status effect removed");
        self.events.push(EffectEvent::Removed {
            id: effect.id,
            kind: effect.kind,
        });
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Apply an effect event to its owner's stats.
///
/// Tick amounts are exact; the fractional part is carried on the stats and
/// applied once it adds up to a whole hit point. Returns the signed hp
/// change (negative for damage).
pub fn dispatch_effect_event(event: &EffectEvent, stats: &mut Stats) -> i32 {
    let EffectEvent::Ticked { kind, .. } = event else {
        return 0;
    };

    match kind {
        EffectKind::Modifier => return 0,
        EffectKind::DamageOverTime {
            amount,
            damage_type,
        } => stats.effect_carry -= (amount * (1.0 - stats.resistance(*damage_type))).max(0.0),
        EffectKind::Regeneration { amount } => stats.effect_carry += amount.max(0.0),
    }

    let whole = stats.effect_carry.trunc();
    stats.effect_carry -= whole;
    let whole = whole as i32;
    if whole < 0 {
        -stats.lose_hp(-whole)
    } else {
        stats.heal(whole)
    }
}
