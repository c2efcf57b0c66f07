//! Procedural town generation and routing for the Township simulation.
//!
//! A town is a planar street graph whose nodes are districts ("locations")
//! holding points of interest ("places"). Generation is a single-pass,
//! seed-deterministic pipeline; afterwards the map answers routing and
//! place-matching queries for the schedule and dialogue engines.
//!
//! # Modules
//!
//! - [`allocation`] -- Staged, capacity-aware distribution of place archetypes.
//! - [`config`] -- [`GenerationConfig`] and its YAML loader.
//! - [`district`] -- District archetypes and weighted district selection.
//! - [`error`] -- Fatal configuration errors.
//! - [`geometry`] -- Orientation and segment-crossing predicates.
//! - [`layout`] -- Jittered grid placement of location coordinates.
//! - [`place_registry`] -- Place archetypes and their naming functions.
//! - [`planar`] -- Minimum spanning tree plus non-crossing local streets.
//! - [`route`] -- Dijkstra travel times, paths, and hop distances.
//! - [`sampling`] -- Weighted roulette selection.
//! - [`save`] -- Config plus replay log of runtime placements.
//! - [`street_names`] -- Grouping streets into named runs.
//! - [`world_map`] -- The generated map and its query surface.

pub mod allocation;
pub mod config;
pub mod district;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod place_registry;
pub mod planar;
pub mod route;
pub mod sampling;
pub mod save;
pub mod street_names;
pub mod world_map;

// Re-export primary types at crate root.
pub use config::{ConfigError, GenerationConfig};
pub use error::WorldError;
pub use place_registry::{BUS_STOP_KEY, NameContext, PlaceArchetype, STANDARD_PLACES};
pub use route::{RouteIndex, UNREACHABLE};
pub use save::{PlacementRecord, WorldSave};
pub use world_map::{HOME_KEY, Registries, WorldMap, WorldSnapshot};
