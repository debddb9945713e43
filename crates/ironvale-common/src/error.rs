//! Error types for Ironvale.

use thiserror::Error;

/// Top-level error type for Ironvale operations.
#[derive(Debug, Error)]
pub enum IronvaleError {
    /// Catalog and config errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Asset lookup errors
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading catalogs or resolving catalog ids.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Enemy type id not present in the catalog
    #[error("unknown enemy type: {0}")]
    UnknownEnemy(String),

    /// Player archetype id not present in the catalog
    #[error("unknown player archetype: {0}")]
    UnknownPlayer(String),

    /// Status effect id not present in the catalog
    #[error("unknown status effect: {0}")]
    UnknownEffect(String),

    /// Unrecognized damage type name
    #[error("unknown damage type: {0}")]
    UnknownDamageType(String),

    /// Two catalog entries share the same id
    #[error("duplicate {kind} id: {id}")]
    DuplicateId {
        /// Entry kind ("enemy", "player", "effect")
        kind: &'static str,
        /// The repeated id
        id: String,
    },

    /// TOML parse error
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// File read error
    #[error("failed to read file: {0}")]
    Read(#[from] std::io::Error),

    /// Semantic validation error
    #[error("validation error: {0}")]
    Validation(String),
}

/// Errors raised by resource providers.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Image not available at the given path
    #[error("image not found: {0}")]
    ImageNotFound(String),

    /// Image failed to decode
    #[error("failed to decode image {path}: {reason}")]
    Decode {
        /// Path of the image
        path: String,
        /// Decoder message
        reason: String,
    },
}

/// Result type alias for Ironvale operations.
pub type IronvaleResult<T> = Result<T, IronvaleError>;

/// Result type alias for catalog and config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
