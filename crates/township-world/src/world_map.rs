//! The generated town: locations as nodes, streets as weighted edges.
//!
//! [`WorldMap`] runs the generation pipeline once (districts, layout, street
//! graph, street names, places) and then serves read-only queries to the
//! schedule and dialogue engines. The only mutation after generation is
//! [`WorldMap::create_place_at`], which appends a place to one location and
//! records the request in the replay log.
//!
//! Storage is an arena: locations, places, and canonical street records sit
//! in dense vectors indexed by their ids.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use township_types::{
    DistrictTag, Location, LocationId, Place, PlaceCategory, PlaceId, PlaceMatch, PlaceProps,
    PlaceSpec, Street, StreetId, TravelPath,
};
use tracing::{debug, info};

use crate::allocation::{PlaceAllocator, validate_registry};
use crate::config::GenerationConfig;
use crate::district::{DistrictArchetype, STANDARD_DISTRICTS, name_districts, select_districts};
use crate::error::WorldError;
use crate::layout::grid_layout;
use crate::place_registry::{NameContext, PlaceArchetype, STANDARD_PLACES, find_archetype};
use crate::planar::build_planar_graph;
use crate::route::{RouteIndex, UNREACHABLE};
use crate::sampling::weighted_choice;
use crate::save::{PlacementRecord, WorldSave};
use crate::street_names::{STANDARD_STREET_NAMES, StreetName, name_streets};

/// Archetype key of NPC homes.
pub const HOME_KEY: &str = "home";

/// Time spent at the origin before staying there starts to lose appeal.
const STAY_GRACE_MINUTES: f64 = 30.0;
/// Minutes over which the stay penalty falls by [`STAY_PENALTY_DROP`].
const STAY_FADE_MINUTES: f64 = 90.0;
const STAY_PENALTY_DROP: f64 = 0.7;
const STAY_PENALTY_FLOOR: f64 = 0.1;

/// The three registries a town is generated from.
#[derive(Debug, Clone, Copy)]
pub struct Registries<'r> {
    /// District archetypes.
    pub districts: &'r [DistrictArchetype],
    /// Street names.
    pub streets: &'r [StreetName],
    /// Place archetypes.
    pub places: &'r [PlaceArchetype],
}

impl Registries<'static> {
    /// The built-in registries.
    pub const STANDARD: Self = Self {
        districts: STANDARD_DISTRICTS,
        streets: STANDARD_STREET_NAMES,
        places: STANDARD_PLACES,
    };
}

/// Serializable view of a generated map.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot<'a> {
    /// The config the map was generated from.
    pub config: &'a GenerationConfig,
    /// All locations with their outgoing streets and place ids.
    pub locations: &'a [Location],
    /// One record per undirected street.
    pub streets: &'a [Street],
    /// All places.
    pub places: &'a [Place],
}

/// A generated town map.
#[derive(Debug, Clone)]
pub struct WorldMap {
    config: GenerationConfig,
    locations: Vec<Location>,
    streets: Vec<Street>,
    places: Vec<Place>,
    routes: RouteIndex,
    place_registry: Vec<PlaceArchetype>,
    names_in_use: BTreeSet<(String, String)>,
    placements: Vec<PlacementRecord>,
    /// Whether the map came from [`WorldMap::generate`] and can be rebuilt
    /// from its config alone.
    seeded: bool,
}

impl WorldMap {
    // -------------------------------------------------------------------
    // Generation
    // -------------------------------------------------------------------

    /// Generate a town from `config`, seeding a `ChaCha8` stream from its seed.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EmptyWorld`] or [`WorldError::InvalidConfig`] for
    /// a bad config and [`WorldError::UnsatisfiableArchetype`] when the place
    /// registry cannot be satisfied.
    pub fn generate(config: &GenerationConfig) -> Result<Self, WorldError> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut map = Self::generate_with_rng(config, &mut rng)?;
        map.seeded = true;
        Ok(map)
    }

    /// Generate a town from an injected random stream.
    ///
    /// `config.seed` is ignored; the stream alone determines the result, so
    /// the map cannot be saved with [`WorldMap::save_state`].
    pub fn generate_with_rng(
        config: &GenerationConfig,
        rng: &mut impl Rng,
    ) -> Result<Self, WorldError> {
        Self::generate_with_registries(config, Registries::STANDARD, rng)
    }

    /// Generate a town from custom registries.
    pub fn generate_with_registries(
        config: &GenerationConfig,
        registries: Registries<'_>,
        rng: &mut impl Rng,
    ) -> Result<Self, WorldError> {
        config.validate()?;
        let count = config.resolved_location_count();
        let capacity = config.location_capacity;
        validate_registry(registries.places, registries.districts, count, capacity)?;

        let picks = select_districts(registries.districts, count, rng);
        let districts = name_districts(registries.districts, &picks);
        if districts.is_empty() {
            return Err(WorldError::InvalidConfig(
                "district registry is empty".to_string(),
            ));
        }
        info!(seed = config.seed, locations = districts.len(), "districts selected");

        let positions = grid_layout(districts.len(), config.map_width, config.map_height, rng);
        let graph = build_planar_graph(positions, config.density, rng);
        info!(segments = graph.segments().len(), "street graph built");

        let tags: Vec<BTreeSet<DistrictTag>> = districts.iter().map(|d| d.tags.clone()).collect();
        let street_names = name_streets(&graph, &tags, registries.streets, config.density, rng);

        let mut locations = Vec::with_capacity(districts.len());
        for (index, district) in districts.into_iter().enumerate() {
            let (Some(id), Some(position)) = (LocationId::from_index(index), graph.position(index))
            else {
                continue;
            };
            locations.push(Location::new(
                id,
                district.name,
                district.key.to_string(),
                position,
                district.tags,
            ));
        }

        let mut streets = Vec::with_capacity(graph.segments().len());
        for (index, segment) in graph.segments().iter().enumerate() {
            let (Some(id), Some(from), Some(to)) = (
                StreetId::from_index(index),
                LocationId::from_index(segment.a),
                LocationId::from_index(segment.b),
            ) else {
                continue;
            };
            let street = Street {
                id,
                from,
                to,
                minutes: segment.minutes,
                name: street_names.get(index).cloned().unwrap_or_default(),
            };
            if let Some(loc) = locations.get_mut(segment.b) {
                loc.streets.insert(from, street.reversed());
            }
            if let Some(loc) = locations.get_mut(segment.a) {
                loc.streets.insert(to, street.clone());
            }
            streets.push(street);
        }
        let distinct_names = street_names.iter().collect::<BTreeSet<_>>().len();
        info!(street_names = distinct_names, "streets named");

        let routes = RouteIndex::from_graph(&graph);
        let allocation = PlaceAllocator::new(
            registries.places,
            &tags,
            &routes,
            config.density,
            capacity,
        )?
        .allocate(rng);

        let mut map = Self {
            config: config.clone(),
            locations,
            streets,
            places: Vec::with_capacity(allocation.len()),
            routes,
            place_registry: registries.places.to_vec(),
            names_in_use: BTreeSet::new(),
            placements: Vec::new(),
            seeded: false,
        };

        let mut instances: BTreeMap<&str, u32> = BTreeMap::new();
        for placement in allocation {
            let Some(archetype) = registries.places.get(placement.archetype) else {
                continue;
            };
            let Some(location) = map.locations.get(placement.node) else {
                continue;
            };
            let index = instances.entry(archetype.key).or_insert(0);
            let ctx = NameContext {
                location_name: &location.name,
                tags: &location.tags,
                index: *index,
            };
            let name = (archetype.name_fn)(&ctx, rng);
            *index = index.saturating_add(1);
            let location = location.id;
            map.push_place(archetype.key, name, location, archetype.props());
        }

        info!(
            seed = config.seed,
            locations = map.locations.len(),
            streets = map.streets.len(),
            places = map.places.len(),
            "world generated"
        );
        Ok(map)
    }

    /// Regenerate a saved world and replay its runtime placements.
    ///
    /// # Errors
    ///
    /// Returns any generation error, [`WorldError::UnknownLocation`] for a
    /// record pointing outside the map, and [`WorldError::ReplayDiverged`]
    /// when a replayed placement fails or receives a different id.
    pub fn restore(save: &WorldSave) -> Result<Self, WorldError> {
        let mut map = Self::generate(&save.config)?;
        map.replay(&save.placements)?;
        Ok(map)
    }

    /// Apply recorded runtime placements to a freshly generated map.
    pub fn replay(&mut self, placements: &[PlacementRecord]) -> Result<(), WorldError> {
        for (index, record) in placements.iter().enumerate() {
            if self.get_location(record.location).is_none() {
                return Err(WorldError::UnknownLocation(record.location));
            }
            let Some(place) = self.create_place_at(&record.spec, record.location)? else {
                return Err(WorldError::ReplayDiverged {
                    index,
                    reason: format!("location {} is full", record.location),
                });
            };
            if place.id != record.place {
                return Err(WorldError::ReplayDiverged {
                    index,
                    reason: format!("expected place {}, got {}", record.place, place.id),
                });
            }
        }
        Ok(())
    }

    /// The config plus the replay log, ready to be persisted.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NotReproducible`] for a map generated from an
    /// injected random stream or custom registries, which
    /// [`WorldMap::restore`] could not rebuild.
    pub fn save_state(&self) -> Result<WorldSave, WorldError> {
        if !self.seeded {
            return Err(WorldError::NotReproducible);
        }
        Ok(WorldSave {
            config: self.config.clone(),
            placements: self.placements.clone(),
        })
    }

    /// Runtime placements made since generation, in order.
    pub fn placement_log(&self) -> &[PlacementRecord] {
        &self.placements
    }

    /// A serializable view of the whole map.
    pub fn snapshot(&self) -> WorldSnapshot<'_> {
        WorldSnapshot {
            config: &self.config,
            locations: &self.locations,
            streets: &self.streets,
            places: &self.places,
        }
    }

    /// The config this map was generated from.
    pub const fn config(&self) -> &GenerationConfig {
        &self.config
    }

    // -------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------

    /// Look up a location.
    pub fn get_location(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(id.index())
    }

    /// All locations, by id.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Number of locations.
    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    /// One record per undirected street, by id.
    pub fn streets(&self) -> &[Street] {
        &self.streets
    }

    /// Look up a street.
    pub fn get_street(&self, id: StreetId) -> Option<&Street> {
        self.streets.get(id.index())
    }

    /// Every distinct street name.
    pub fn street_names(&self) -> BTreeSet<&str> {
        self.streets.iter().map(|s| s.name.as_str()).collect()
    }

    /// All places, by id.
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// Look up a place.
    pub fn get_place(&self, id: PlaceId) -> Option<&Place> {
        self.places.get(id.index())
    }

    /// Whether every location can reach every other.
    pub fn is_connected(&self) -> bool {
        self.routes.is_connected()
    }

    // -------------------------------------------------------------------
    // Routing
    // -------------------------------------------------------------------

    /// Shortest travel time between two locations, or [`UNREACHABLE`].
    pub fn travel_minutes(&self, from: LocationId, to: LocationId) -> u32 {
        self.routes.travel_minutes(from.index(), to.index())
    }

    /// The shortest route between two locations, streets oriented along it.
    pub fn travel_path(&self, from: LocationId, to: LocationId) -> Option<TravelPath> {
        let path = self.routes.travel_path(from.index(), to.index())?;
        let locations: Vec<LocationId> = path
            .nodes
            .iter()
            .filter_map(|&n| LocationId::from_index(n))
            .collect();
        let streets = locations
            .windows(2)
            .filter_map(|pair| match pair {
                [a, b] => self.get_location(*a)?.street_to(*b).cloned(),
                _ => None,
            })
            .collect();
        Some(TravelPath {
            locations,
            streets,
            minutes: path.minutes,
        })
    }

    /// The closest place satisfying `predicate`.
    ///
    /// With `respect_hours`, places closed at `at` are skipped. Ties go to the
    /// lower place id.
    pub fn nearest_matching_place(
        &self,
        predicate: impl Fn(&Place) -> bool,
        origin: LocationId,
        at: NaiveDateTime,
        respect_hours: bool,
    ) -> Option<PlaceMatch> {
        self.reachable_matches(&predicate, origin, at, respect_hours)
            .into_iter()
            .min_by_key(|(place, minutes)| (*minutes, place.id))
            .map(|(place, _)| PlaceMatch {
                location: place.location,
                place: place.id,
            })
    }

    /// A random place satisfying `predicate`, favouring closer ones.
    ///
    /// Each candidate is weighted by `1 / (1 + 0.2 * minutes)`. Candidates at
    /// the origin are further discounted the longer the caller has already
    /// been there, as long as anything elsewhere matches.
    pub fn random_matching_place(
        &self,
        predicate: impl Fn(&Place) -> bool,
        origin: LocationId,
        at: NaiveDateTime,
        respect_hours: bool,
        minutes_at_origin: u32,
        rng: &mut impl Rng,
    ) -> Option<PlaceMatch> {
        let matches = self.reachable_matches(&predicate, origin, at, respect_hours);
        let elsewhere = matches.iter().any(|(place, _)| place.location != origin);
        let stay = stay_penalty(minutes_at_origin);
        let weights: Vec<f64> = matches
            .iter()
            .map(|(place, minutes)| {
                let weight = 1.0 / 0.2_f64.mul_add(f64::from(*minutes), 1.0);
                if elsewhere && place.location == origin {
                    weight * stay
                } else {
                    weight
                }
            })
            .collect();
        let (place, _) = matches.get(weighted_choice(&weights, rng)?)?;
        Some(PlaceMatch {
            location: place.location,
            place: place.id,
        })
    }

    fn reachable_matches(
        &self,
        predicate: &impl Fn(&Place) -> bool,
        origin: LocationId,
        at: NaiveDateTime,
        respect_hours: bool,
    ) -> Vec<(&Place, u32)> {
        let distances = self.routes.distances_from(origin.index());
        self.places
            .iter()
            .filter(|place| predicate(place))
            .filter(|place| !respect_hours || place.is_open_at(at))
            .filter_map(|place| {
                let minutes = distances.get(place.location.index()).copied()?;
                (minutes != UNREACHABLE).then_some((place, minutes))
            })
            .collect()
    }

    // -------------------------------------------------------------------
    // Tag and category lookups
    // -------------------------------------------------------------------

    /// Locations carrying `tag`.
    pub fn find_locations_with_tag(&self, tag: DistrictTag) -> Vec<LocationId> {
        self.find_locations(|loc| loc.has_tag(tag))
    }

    /// Locations carrying at least one of `tags`.
    pub fn find_locations_with_any_tags(&self, tags: &[DistrictTag]) -> Vec<LocationId> {
        self.find_locations(|loc| loc.has_any_tag(tags))
    }

    /// Locations carrying all of `tags`.
    pub fn find_locations_with_all_tags(&self, tags: &[DistrictTag]) -> Vec<LocationId> {
        self.find_locations(|loc| loc.has_all_tags(tags))
    }

    /// Locations holding at least one place of `category`.
    pub fn find_locations_with_place_category(&self, category: PlaceCategory) -> Vec<LocationId> {
        self.find_locations(|loc| {
            loc.places
                .iter()
                .filter_map(|&id| self.get_place(id))
                .any(|place| place.has_category(category))
        })
    }

    fn find_locations(&self, keep: impl Fn(&Location) -> bool) -> Vec<LocationId> {
        self.locations
            .iter()
            .filter(|loc| keep(loc))
            .map(|loc| loc.id)
            .collect()
    }

    // -------------------------------------------------------------------
    // Runtime placement
    // -------------------------------------------------------------------

    /// Create a place at a location after generation.
    ///
    /// Missing name, categories, and hours are taken from the registry
    /// archetype with the same key, if there is one. Returns `Ok(None)`
    /// without touching the map when the location does not exist or is
    /// already at capacity.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MissingPlaceKey`] when `spec.key` is empty.
    pub fn create_place_at(
        &mut self,
        spec: &PlaceSpec,
        location: LocationId,
    ) -> Result<Option<Place>, WorldError> {
        if spec.key.trim().is_empty() {
            return Err(WorldError::MissingPlaceKey);
        }
        let Some(target) = self.get_location(location) else {
            debug!(%location, key = %spec.key, "place requested at unknown location");
            return Ok(None);
        };
        if !self.has_room(target) {
            debug!(%location, key = %spec.key, "place requested at full location");
            return Ok(None);
        }

        let archetype = find_archetype(&self.place_registry, &spec.key);
        let name = spec
            .name
            .clone()
            .or_else(|| archetype.map(|a| a.label.to_string()))
            .unwrap_or_else(|| spec.key.clone());
        let mut props = archetype.map(PlaceArchetype::props).unwrap_or_default();
        if !spec.categories.is_empty() {
            props.categories.clone_from(&spec.categories);
        }
        if spec.hours.is_some() {
            props.hours.clone_from(&spec.hours);
        }

        let Some(id) = self.push_place(&spec.key, name, location, props) else {
            return Ok(None);
        };
        self.placements.push(PlacementRecord {
            location,
            spec: spec.clone(),
            place: id,
        });
        Ok(self.get_place(id).cloned())
    }

    /// Create a home for `resident`.
    ///
    /// Prefers residential and suburban locations with free capacity, then
    /// any location with free capacity; among those, locations with more
    /// room are more likely.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NoHomeLocation`] when no location has room.
    pub fn place_home(&mut self, resident: &str, rng: &mut impl Rng) -> Result<Place, WorldError> {
        let residential = [DistrictTag::Residential, DistrictTag::Suburban];
        let mut candidates: Vec<&Location> = self
            .locations
            .iter()
            .filter(|loc| loc.has_any_tag(&residential) && self.has_room(loc))
            .collect();
        if candidates.is_empty() {
            candidates = self.locations.iter().filter(|loc| self.has_room(loc)).collect();
        }
        let weights: Vec<f64> = candidates
            .iter()
            .map(|loc| f64::from(self.room_left(loc)))
            .collect();
        let no_home = || WorldError::NoHomeLocation {
            resident: resident.to_string(),
        };
        let location = weighted_choice(&weights, rng)
            .and_then(|i| candidates.get(i))
            .map(|loc| loc.id)
            .ok_or_else(no_home)?;

        let spec = PlaceSpec {
            key: HOME_KEY.to_string(),
            name: Some(format!("{resident}'s Home")),
            categories: vec![PlaceCategory::Home],
            hours: None,
        };
        self.create_place_at(&spec, location)?.ok_or_else(no_home)
    }

    fn has_room(&self, location: &Location) -> bool {
        self.room_left(location) > 0
    }

    fn room_left(&self, location: &Location) -> u32 {
        let used = u32::try_from(location.place_count()).unwrap_or(u32::MAX);
        self.config.location_capacity.saturating_sub(used)
    }

    /// Append a place, making its name unique within its key.
    fn push_place(
        &mut self,
        key: &str,
        base_name: String,
        location: LocationId,
        props: PlaceProps,
    ) -> Option<PlaceId> {
        let id = PlaceId::from_index(self.places.len())?;
        let mut name = base_name.clone();
        let mut suffix = 2_u32;
        while self.names_in_use.contains(&(key.to_string(), name.clone())) {
            name = format!("{base_name} #{suffix}");
            suffix = suffix.saturating_add(1);
        }
        let holder = self.locations.get_mut(location.index())?;
        holder.places.push(id);
        self.names_in_use.insert((key.to_string(), name.clone()));
        self.places.push(Place {
            id,
            key: key.to_string(),
            name,
            location,
            props,
        });
        Some(id)
    }
}

/// Multiplier applied to staying put after `minutes` at the origin.
fn stay_penalty(minutes: u32) -> f64 {
    let minutes = f64::from(minutes);
    if minutes <= STAY_GRACE_MINUTES {
        return 1.0;
    }
    let faded = STAY_PENALTY_DROP * (minutes - STAY_GRACE_MINUTES) / STAY_FADE_MINUTES;
    (1.0 - faded).max(STAY_PENALTY_FLOOR)
}
