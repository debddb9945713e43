//! # Ironvale Common
//!
//! Shared abstractions for the Ironvale simulation core.
//!
//! This crate provides the types every other Ironvale crate agrees on:
//! - ID types (EntityId, SpriteTypeId)
//! - Error taxonomy for configuration and resource lookups
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation() {
        let id1 = EntityId::new();
        let id2 = EntityId::new();
        assert_ne!(id1, id2);
        assert!(id1.is_valid());
        assert!(!EntityId::NULL.is_valid());
    }

    #[test]
    fn test_config_error_wraps_into_umbrella() {
        let err: IronvaleError = ConfigError::UnknownEnemy("wyrm".to_string()).into();
        assert_eq!(err.to_string(), "Config error: unknown enemy type: wyrm");
    }
}
