//! Shared type definitions for the Township map generator.
//!
//! This crate is the data model consumed by every collaborator of the map:
//! the world generator writes it, the schedule and dialogue engines read it.
//!
//! # Modules
//!
//! - [`ids`] -- Dense arena indices for locations, places, and streets
//! - [`enums`] -- Tag enumerations (district tags, place categories)
//! - [`structs`] -- Locations, streets, places, opening hours, query results

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{DistrictTag, PlaceCategory};
pub use ids::{LocationId, PlaceId, StreetId};
pub use structs::{
    Location, OpeningHours, Place, PlaceMatch, PlaceProps, PlaceSpec, Point, Street, TravelPath,
};
