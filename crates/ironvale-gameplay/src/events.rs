//! Events reported by a world tick.
//!
//! Audio, VFX, and UI consume these; the simulation itself never reads
//! them back.

use crate::combat::ActorKind;
use crate::damage::DamageResult;
use crate::geometry::Aabb;
use crate::projectile::Team;
use glam::Vec2;
use ironvale_common::EntityId;

/// What dealt a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitSource {
    /// A projectile or hazard
    Projectile,
    /// A melee swing
    Melee,
    /// Body contact
    Contact,
}

/// One observable thing that happened during a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum CombatEvent {
    /// A hit was resolved
    Damaged {
        /// Who was hit
        target: EntityId,
        /// Target side
        kind: ActorKind,
        /// Target position (for damage numbers)
        position: Vec2,
        /// What hit
        source: HitSource,
        /// Resolution details
        result: DamageResult,
    },
    /// An actor's hp reached zero
    Died {
        /// Who died
        target: EntityId,
        /// Target side
        kind: ActorKind,
        /// Where
        position: Vec2,
        /// Experience granted (zero for the player)
        xp_reward: u32,
    },
    /// A dead enemy finished its death animation and left the world
    Removed {
        /// Who was removed
        target: EntityId,
    },
    /// A projectile entered the world
    ProjectileFired {
        /// Projectile id
        projectile: EntityId,
        /// Firing side
        team: Team,
        /// Spawn position
        position: Vec2,
    },
    /// The player swung a melee weapon
    MeleeSwing {
        /// Area that was checked
        area: Aabb,
        /// Number of enemies hit
        hits: usize,
    },
    /// A boss locked a target and began winding up
    BossCharging {
        /// Boss id
        boss: EntityId,
        /// Locked target
        target: Vec2,
    },
    /// A boss released its area strike
    BossStrike {
        /// Boss id
        boss: EntityId,
        /// Strike center
        center: Vec2,
        /// Rocks dropped
        rocks: usize,
    },
    /// A status effect was applied
    EffectApplied {
        /// Affected actor
        target: EntityId,
        /// Effect id
        effect: String,
    },
    /// A ticking status effect fired
    EffectTicked {
        /// Affected actor
        target: EntityId,
        /// Effect id
        effect: String,
        /// Signed hp change
        hp_delta: i32,
    },
    /// A status effect ended
    EffectRemoved {
        /// Affected actor
        target: EntityId,
        /// Effect id
        effect: String,
    },
    /// An enemy spawn was announced
    SpawnWarning {
        /// Catalog id
        enemy_type: String,
        /// Where it will appear
        position: Vec2,
    },
    /// An enemy entered the world
    EnemySpawned {
        /// New enemy id
        enemy: EntityId,
        /// Catalog id
        enemy_type: String,
        /// Spawn position
        position: Vec2,
    },
}

impl CombatEvent {
    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Damaged { .. } => "damaged",
            Self::Died { .. } => "died",
            Self::Removed { .. } => "removed",
            Self::ProjectileFired { .. } => "projectile_fired",
            Self::MeleeSwing { .. } => "melee_swing",
            Self::BossCharging { .. } => "boss_charging",
            Self::BossStrike { .. } => "boss_strike",
            Self::EffectApplied { .. } => "effect_applied",
            Self::EffectTicked { .. } => "effect_ticked",
            Self::EffectRemoved { .. } => "effect_removed",
            Self::SpawnWarning { .. } => "spawn_warning",
            Self::EnemySpawned { .. } => "enemy_spawned",
        }
    }
}
