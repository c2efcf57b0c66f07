//! Enumeration types for the Township map.
//!
//! Tags are closed enumerations rather than free-form strings so that a
//! misspelled tag in a registry table is a compile error, not a silently
//! ineligible archetype.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// District tags
// ---------------------------------------------------------------------------

/// A characteristic of a district (location) in the map.
///
/// District archetypes carry a set of these; place archetypes and street
/// names list the tags they are eligible for or favour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistrictTag {
    /// The town centre.
    Downtown,
    /// Shops and offices.
    Commercial,
    /// Houses and apartment blocks.
    Residential,
    /// Low-density housing at the edge of town.
    Suburban,
    /// Factories, depots, and yards.
    Industrial,
    /// Old streets and listed buildings.
    Historic,
    /// Riverside or harbour frontage.
    Waterfront,
    /// Campus and student housing.
    University,
    /// Green space.
    Park,
    /// Bars and clubs.
    Nightlife,
    /// Farmland and open country.
    Rural,
    /// Rail and bus interchange.
    Transit,
}

impl DistrictTag {
    /// Every district tag, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Downtown,
        Self::Commercial,
        Self::Residential,
        Self::Suburban,
        Self::Industrial,
        Self::Historic,
        Self::Waterfront,
        Self::University,
        Self::Park,
        Self::Nightlife,
        Self::Rural,
        Self::Transit,
    ];
}

// ---------------------------------------------------------------------------
// Place categories
// ---------------------------------------------------------------------------

/// What a place is for.
///
/// A place carries one or more categories. Collaborators query the map by
/// category (e.g. "nearest open `Food` place") rather than by archetype key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    /// Bus stops and stations.
    Transit,
    /// Town hall, police.
    Civic,
    /// Hospitals, clinics, pharmacies.
    Health,
    /// Schools, libraries, campuses.
    Education,
    /// Retail.
    Shop,
    /// Somewhere to eat.
    Food,
    /// Bars and clubs.
    Nightlife,
    /// Cinemas, gyms, museums.
    Leisure,
    /// Parks and open spaces.
    Nature,
    /// Workplaces.
    Work,
    /// Churches and cemeteries.
    Worship,
    /// An NPC's residence.
    Home,
}
