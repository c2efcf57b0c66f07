//! Error types for the generator binary.
//!
//! [`GenError`] wraps every failure mode so that `main` can propagate with `?`.

/// Top-level error for the generator binary.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: township_world::ConfigError,
    },

    /// World generation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: township_world::WorldError,
    },

    /// The seed override is not an unsigned integer.
    #[error("TOWNSHIP_SEED must be an unsigned integer, got {value:?}: {source}")]
    InvalidSeed {
        /// The rejected value.
        value: String,
        /// The parse failure.
        source: std::num::ParseIntError,
    },

    /// Writing the map to stdout failed.
    #[error("output error: {source}")]
    Output {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
