//! Error types for the `township-world` crate.
//!
//! Only genuine configuration errors are represented here. Unreachable
//! destinations, unmatched queries, and exhausted placement retries are
//! normal outcomes and surface as sentinels or `None` instead.

use township_types::LocationId;

/// Fatal errors raised while generating or mutating the map.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The configuration asks for a world with no locations.
    #[error("world must contain at least one location")]
    EmptyWorld,

    /// A configuration value is out of range.
    #[error("invalid generation config: {0}")]
    InvalidConfig(String),

    /// A runtime place request did not name an archetype key.
    #[error("place spec is missing its archetype key")]
    MissingPlaceKey,

    /// A replayed placement refers to a location that does not exist.
    #[error("location not found: {0}")]
    UnknownLocation(LocationId),

    /// No strategy produced a location able to hold an NPC's home.
    #[error("no location can hold a home for {resident}")]
    NoHomeLocation {
        /// The resident the home was requested for.
        resident: String,
    },

    /// The place registry can never be satisfied by this map.
    #[error("archetype {key} is unsatisfiable: {reason}")]
    UnsatisfiableArchetype {
        /// The offending archetype key.
        key: String,
        /// Why it cannot be placed.
        reason: String,
    },

    /// The map was generated from an injected random stream or custom
    /// registries, so its config alone cannot rebuild it.
    #[error("map was not generated from its config seed and cannot be saved")]
    NotReproducible,

    /// A replayed save produced a different world than the one recorded.
    #[error("replay diverged at placement {index}: {reason}")]
    ReplayDiverged {
        /// Position of the placement in the save log.
        index: usize,
        /// What differed.
        reason: String,
    },
}
