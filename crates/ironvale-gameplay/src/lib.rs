//! # Ironvale Gameplay
//!
//! Simulation core for Ironvale.
//!
//! This crate provides every system that runs inside a world tick:
//! - Stats and the damage resolver
//! - Status effect ledger (timed modifiers, ticking effects)
//! - Circle-vs-segment collision with iterative correction
//! - Force-based steering (seek, separation, patrol)
//! - Boss attack state machine
//! - Projectile, melee, and contact hit passes
//! - Content catalog, spawn scheduling, and the `World` that ties them up

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod animation;
pub mod boss;
pub mod catalog;
pub mod combat;
pub mod damage;
pub mod enemy;
pub mod events;
pub mod geometry;
pub mod hit_pipeline;
pub mod player;
pub mod projectile;
pub mod spawn;
pub mod stats;
pub mod status;
pub mod steering;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::animation::*;
    pub use crate::boss::*;
    pub use crate::catalog::*;
    pub use crate::combat::*;
    pub use crate::damage::*;
    pub use crate::enemy::*;
    pub use crate::events::*;
    pub use crate::geometry::*;
    pub use crate::hit_pipeline::*;
    pub use crate::player::*;
    pub use crate::projectile::*;
    pub use crate::spawn::*;
    pub use crate::stats::*;
    pub use crate::status::*;
    pub use crate::steering::*;
    pub use crate::world::*;
}

pub use prelude::*;
