//! Core entity structs for the Township map.
//!
//! The map is an arena: [`Location`]s, [`Place`]s, and street segments are
//! stored in dense vectors by the world map and refer to each other only by
//! identifier. A location owns its outgoing [`Street`] records and the ids of
//! the places it holds.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::enums::{DistrictTag, PlaceCategory};
use crate::ids::{LocationId, PlaceId, StreetId};

/// Minutes in one day; the exclusive upper bound for opening-hour values.
const MINUTES_PER_DAY: u16 = 1440;

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// A position on the map canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate, `0..map_width`.
    pub x: f64,
    /// Vertical coordinate, `0..map_height`.
    pub y: f64,
}

impl Point {
    /// Create a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

// ---------------------------------------------------------------------------
// Street
// ---------------------------------------------------------------------------

/// A directed street record: the way out of `from` towards `to`.
///
/// Every undirected connection is backed by two records (`a -> b` and
/// `b -> a`) that share the same [`StreetId`], name, and travel time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Street {
    /// The undirected segment this record belongs to.
    pub id: StreetId,
    /// Origin location.
    pub from: LocationId,
    /// Destination location.
    pub to: LocationId,
    /// Travel time in minutes, fixed at generation.
    pub minutes: u32,
    /// Street name, assigned after the graph is finalised.
    pub name: String,
}

impl Street {
    /// Return the same segment seen from the other end.
    pub fn reversed(&self) -> Self {
        Self {
            id: self.id,
            from: self.to,
            to: self.from,
            minutes: self.minutes,
            name: self.name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A district-level node of the map graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Stable identifier (position in the world's location arena).
    pub id: LocationId,
    /// Display name, e.g. "Residential B".
    pub name: String,
    /// Key of the district archetype this location was generated from.
    pub archetype: String,
    /// Position on the map canvas.
    pub position: Point,
    /// District tags inherited from the archetype.
    pub tags: BTreeSet<DistrictTag>,
    /// Places held here, in creation order.
    pub places: Vec<PlaceId>,
    /// Outgoing streets keyed by neighbouring location.
    pub streets: BTreeMap<LocationId, Street>,
}

impl Location {
    /// Create a location with no places and no streets.
    pub fn new(
        id: LocationId,
        name: String,
        archetype: String,
        position: Point,
        tags: BTreeSet<DistrictTag>,
    ) -> Self {
        Self {
            id,
            name,
            archetype,
            position,
            tags,
            places: Vec::new(),
            streets: BTreeMap::new(),
        }
    }

    /// Whether this location carries the given tag.
    pub fn has_tag(&self, tag: DistrictTag) -> bool {
        self.tags.contains(&tag)
    }

    /// Whether this location carries at least one of the given tags.
    pub fn has_any_tag(&self, tags: &[DistrictTag]) -> bool {
        tags.iter().any(|t| self.tags.contains(t))
    }

    /// Whether this location carries every one of the given tags.
    pub fn has_all_tags(&self, tags: &[DistrictTag]) -> bool {
        tags.iter().all(|t| self.tags.contains(t))
    }

    /// Number of streets leaving this location.
    pub fn degree(&self) -> usize {
        self.streets.len()
    }

    /// Identifiers of directly connected locations, ascending.
    pub fn neighbors(&self) -> impl Iterator<Item = LocationId> + '_ {
        self.streets.keys().copied()
    }

    /// The street leading to `to`, if the two are directly connected.
    pub fn street_to(&self, to: LocationId) -> Option<&Street> {
        self.streets.get(&to)
    }

    /// Number of places held here.
    pub fn place_count(&self) -> usize {
        self.places.len()
    }
}

// ---------------------------------------------------------------------------
// Opening hours
// ---------------------------------------------------------------------------

/// A weekly opening schedule.
///
/// Times are minutes from midnight. When `closes <= opens` the span runs
/// overnight and the part after midnight belongs to the previous day, so a
/// bar open Friday 18:00 to 02:00 is still open early on Saturday even if it
/// is closed on Saturdays. `opens == closes` means open around the clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    /// Opening time, minutes from midnight.
    pub opens: u16,
    /// Closing time, minutes from midnight (`1440` for midnight).
    pub closes: u16,
    /// Days on which the place does not open.
    #[serde(default)]
    pub closed_on: Vec<Weekday>,
}

impl OpeningHours {
    /// Open every day between two whole hours (`close_hour` may be `24`).
    pub fn daily(open_hour: u16, close_hour: u16) -> Self {
        Self {
            opens: open_hour.saturating_mul(60).min(MINUTES_PER_DAY),
            closes: close_hour.saturating_mul(60).min(MINUTES_PER_DAY),
            closed_on: Vec::new(),
        }
    }

    /// Open Monday to Friday between two whole hours.
    pub fn weekdays(open_hour: u16, close_hour: u16) -> Self {
        Self::daily(open_hour, close_hour).closed_on(&[Weekday::Sat, Weekday::Sun])
    }

    /// Add closing days to this schedule.
    #[must_use]
    pub fn closed_on(mut self, days: &[Weekday]) -> Self {
        for day in days {
            if !self.closed_on.contains(day) {
                self.closed_on.push(*day);
            }
        }
        self
    }

    fn opens_on(&self, day: Weekday) -> bool {
        !self.closed_on.contains(&day)
    }

    /// Whether the schedule is open at the given moment.
    pub fn is_open_at(&self, at: NaiveDateTime) -> bool {
        let minute = u16::try_from(at.time().num_seconds_from_midnight() / 60).unwrap_or(0);
        let day = at.weekday();

        if self.opens == self.closes || (self.opens == 0 && self.closes >= MINUTES_PER_DAY) {
            return self.opens_on(day);
        }
        if self.opens < self.closes {
            return self.opens_on(day) && minute >= self.opens && minute < self.closes;
        }
        // Overnight span.
        (minute >= self.opens && self.opens_on(day))
            || (minute < self.closes && self.opens_on(day.pred()))
    }
}

// ---------------------------------------------------------------------------
// Place
// ---------------------------------------------------------------------------

/// Property bag of a place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaceProps {
    /// One or more categories, in registry order.
    pub categories: Vec<PlaceCategory>,
    /// Opening schedule; `None` means always open.
    pub hours: Option<OpeningHours>,
}

/// A point-of-interest instance owned by exactly one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    /// Stable identifier (position in the world's place arena).
    pub id: PlaceId,
    /// Archetype key, e.g. `bus_stop`.
    pub key: String,
    /// Display name, unique within its archetype key.
    pub name: String,
    /// The owning location.
    pub location: LocationId,
    /// Categories and opening hours.
    pub props: PlaceProps,
}

impl Place {
    /// Whether the place carries the given category.
    pub fn has_category(&self, category: PlaceCategory) -> bool {
        self.props.categories.contains(&category)
    }

    /// Whether the place is open at the given moment.
    pub fn is_open_at(&self, at: NaiveDateTime) -> bool {
        self.props.hours.as_ref().is_none_or(|h| h.is_open_at(at))
    }
}

/// Request to create a place at runtime (e.g. an NPC's home).
///
/// Only `key` is required. Missing name, categories, or hours are filled in
/// from the registry archetype with the same key when one exists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaceSpec {
    /// Archetype key.
    pub key: String,
    /// Display name; disambiguated with a numeric suffix if already taken.
    #[serde(default)]
    pub name: Option<String>,
    /// Categories; single values and lists are both accepted by callers and
    /// normalised to this list.
    #[serde(default)]
    pub categories: Vec<PlaceCategory>,
    /// Opening hours.
    #[serde(default)]
    pub hours: Option<OpeningHours>,
}

impl PlaceSpec {
    /// A spec with only a key.
    pub fn keyed(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// A shortest path through the street graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelPath {
    /// Visited locations, origin first and destination last.
    pub locations: Vec<LocationId>,
    /// Streets traversed, oriented along the path.
    pub streets: Vec<Street>,
    /// Total travel time.
    pub minutes: u32,
}

/// A place found by a matching query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceMatch {
    /// Location holding the place.
    pub location: LocationId,
    /// The matched place.
    pub place: PlaceId,
}
