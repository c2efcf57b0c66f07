//! Integration tests for place allocation and the runtime placement surface.
//!
//! Covers capacity and archetype bounds over a seed sweep, bus stop
//! separation under a custom registry, opening-hour aware matching,
//! `create_place_at` edge cases, NPC homes, and save/replay.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::missing_panics_doc
)]

use std::collections::{BTreeSet, VecDeque};

use chrono::{NaiveDate, NaiveDateTime};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use township_types::{DistrictTag, LocationId, PlaceCategory, PlaceSpec};
use township_world::allocation::soft_target;
use township_world::district::STANDARD_DISTRICTS;
use township_world::street_names::STANDARD_STREET_NAMES;
use township_world::{
    BUS_STOP_KEY, GenerationConfig, NameContext, PlaceArchetype, Registries, STANDARD_PLACES,
    WorldError, WorldMap, WorldSave,
};

fn config(seed: u64, density: f64) -> GenerationConfig {
    GenerationConfig {
        density,
        ..GenerationConfig::with_seed(seed)
    }
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    // 2024-01-01 is a Monday.
    NaiveDate::from_ymd_opt(2024, 1, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .unwrap()
}

fn count_key(map: &WorldMap, key: &str) -> u32 {
    map.places().iter().filter(|p| p.key == key).count() as u32
}

/// Street hops between two locations, by breadth-first search.
fn hops_between(map: &WorldMap, from: LocationId, to: LocationId) -> Option<usize> {
    let mut seen = BTreeSet::from([from]);
    let mut queue = VecDeque::from([(from, 0_usize)]);
    while let Some((current, hops)) = queue.pop_front() {
        if current == to {
            return Some(hops);
        }
        for &next in map.get_location(current)?.streets.keys() {
            if seen.insert(next) {
                queue.push_back((next, hops + 1));
            }
        }
    }
    None
}

fn free_slots(map: &WorldMap) -> usize {
    let cap = map.config().location_capacity as usize;
    map.locations().iter().map(|l| cap - l.place_count()).sum()
}

#[test]
fn capacity_is_never_exceeded() {
    for seed in 0..12 {
        for density in [0.0, 0.5, 1.0] {
            let map = WorldMap::generate(&config(seed, density)).unwrap();
            let cap = map.config().location_capacity as usize;
            for location in map.locations() {
                assert!(location.place_count() <= cap, "{} over capacity", location.name);
            }
        }
    }
}

#[test]
fn archetype_bounds_hold() {
    for seed in 0..12 {
        for density in [0.0, 0.5, 1.0] {
            let map = WorldMap::generate(&config(seed, density)).unwrap();
            for archetype in STANDARD_PLACES {
                let n = count_key(&map, archetype.key);
                assert!(n >= archetype.min, "{} below min (seed {seed})", archetype.key);
                if let Some(max) = archetype.max {
                    assert!(n <= max, "{} above max (seed {seed})", archetype.key);
                }
            }
        }
    }
}

#[test]
fn places_respect_district_eligibility() {
    for seed in 0..6 {
        let map = WorldMap::generate(&config(seed, 0.5)).unwrap();
        for place in map.places() {
            let archetype = STANDARD_PLACES.iter().find(|a| a.key == place.key).unwrap();
            let location = map.get_location(place.location).unwrap();
            assert!(archetype.is_eligible(&location.tags), "{} misplaced", place.name);
        }
    }
}

#[test]
fn every_location_gets_a_place() {
    for seed in 0..12 {
        let map = WorldMap::generate(&config(seed, 0.5)).unwrap();
        assert!(map.locations().iter().all(|l| l.place_count() > 0));
    }
}

#[test]
fn place_names_are_unique_per_key() {
    for seed in 0..6 {
        let map = WorldMap::generate(&config(seed, 1.0)).unwrap();
        let names: BTreeSet<(&str, &str)> = map
            .places()
            .iter()
            .map(|p| (p.key.as_str(), p.name.as_str()))
            .collect();
        assert_eq!(names.len(), map.places().len());
        assert!(map.places().iter().all(|p| !p.name.is_empty()));
    }
}

fn stop_name(ctx: &NameContext<'_>, _rng: &mut dyn rand::RngCore) -> String {
    format!("{} Stop", ctx.location_name)
}

fn kiosk_name(_ctx: &NameContext<'_>, _rng: &mut dyn rand::RngCore) -> String {
    "Kiosk".to_string()
}

const SPREAD_OUT_STOPS: &[PlaceArchetype] = &[
    PlaceArchetype {
        key: BUS_STOP_KEY,
        label: "Bus Stop",
        categories: &[PlaceCategory::Transit],
        eligible: &[],
        weight: 1,
        min: 2,
        max: None,
        min_distance: Some(2),
        schedule: None,
        name_fn: stop_name,
    },
    PlaceArchetype {
        key: "kiosk",
        label: "Kiosk",
        categories: &[PlaceCategory::Shop],
        eligible: &[],
        weight: 1,
        min: 0,
        max: None,
        min_distance: None,
        schedule: None,
        name_fn: kiosk_name,
    },
];

/// `min_distance: 2` allows two stops exactly two hops apart.
#[test]
fn bus_stops_are_at_least_two_hops_apart() {
    let registries = Registries {
        districts: STANDARD_DISTRICTS,
        streets: STANDARD_STREET_NAMES,
        places: SPREAD_OUT_STOPS,
    };
    for seed in 0..10 {
        let cfg = config(seed, 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let map = WorldMap::generate_with_registries(&cfg, registries, &mut rng).unwrap();
        let stops: Vec<LocationId> = map
            .places()
            .iter()
            .filter(|p| p.key == BUS_STOP_KEY)
            .map(|p| p.location)
            .collect();
        assert!(stops.len() >= 2);
        for (i, a) in stops.iter().enumerate() {
            for b in stops.iter().skip(i + 1) {
                let hops = hops_between(&map, *a, *b).unwrap();
                assert!(hops >= 2, "stops at {a} and {b} are {hops} hops apart");
            }
        }
    }
}

#[test]
fn unsatisfiable_registry_is_fatal() {
    const PIER_ONLY: &[PlaceArchetype] = &[PlaceArchetype {
        key: "pier",
        label: "Pier",
        categories: &[PlaceCategory::Leisure],
        eligible: &[DistrictTag::Waterfront],
        weight: 1,
        min: 1,
        max: Some(1),
        min_distance: None,
        schedule: None,
        name_fn: kiosk_name,
    }];
    let inland: &[township_world::district::DistrictArchetype] = &STANDARD_DISTRICTS[..2];
    let registries = Registries {
        districts: inland,
        streets: STANDARD_STREET_NAMES,
        places: PIER_ONLY,
    };
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let result = WorldMap::generate_with_registries(&config(0, 0.5), registries, &mut rng);
    assert!(matches!(result, Err(WorldError::UnsatisfiableArchetype { .. })));
}

fn civic_name(_ctx: &NameContext<'_>, _rng: &mut dyn rand::RngCore) -> String {
    "Civic Hall".to_string()
}

const fn downtown_singleton(key: &'static str) -> PlaceArchetype {
    PlaceArchetype {
        key,
        label: key,
        categories: &[PlaceCategory::Civic],
        eligible: &[DistrictTag::Downtown],
        weight: 1,
        min: 1,
        max: Some(1),
        min_distance: None,
        schedule: None,
        name_fn: civic_name,
    }
}

#[test]
fn too_many_singletons_for_one_downtown_is_fatal() {
    const CROWDED: &[PlaceArchetype] = &[
        downtown_singleton("town_hall"),
        downtown_singleton("court"),
        downtown_singleton("bank"),
        downtown_singleton("post_office"),
        downtown_singleton("archive"),
        downtown_singleton("mint"),
        downtown_singleton("registry"),
    ];
    let registries = Registries {
        districts: STANDARD_DISTRICTS,
        streets: STANDARD_STREET_NAMES,
        places: CROWDED,
    };
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let result = WorldMap::generate_with_registries(&config(0, 0.5), registries, &mut rng);
    assert!(matches!(result, Err(WorldError::UnsatisfiableArchetype { .. })));

    let fitting = Registries {
        places: &CROWDED[..6],
        ..registries
    };
    let map = WorldMap::generate_with_registries(&config(0, 0.5), fitting, &mut rng).unwrap();
    assert!(matches!(map.save_state(), Err(WorldError::NotReproducible)));
}

#[test]
fn generated_towns_leave_room_for_homes() {
    for seed in 0..10 {
        for density in [0.0, 0.5, 1.0] {
            let mut map = WorldMap::generate(&config(seed, density)).unwrap();
            let n = map.location_count();
            assert!(free_slots(&map) >= n, "seed {seed} density {density} is nearly full");

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for resident in ["Ada", "Bo", "Cy", "Dee", "Eve"] {
                let home = map.place_home(resident, &mut rng).unwrap();
                let holder = map.get_location(home.location).unwrap();
                assert!(holder.place_count() <= map.config().location_capacity as usize);
            }
        }
    }
}

#[test]
fn places_stay_close_to_soft_targets() {
    for seed in 0..10 {
        for density in [0.0, 0.5, 1.0] {
            let map = WorldMap::generate(&config(seed, density)).unwrap();
            let cap = map.config().location_capacity;
            let soft_total: usize = map
                .locations()
                .iter()
                .map(|l| soft_target(l.streets.len(), density, cap) as usize)
                .sum();
            let n = map.location_count();
            // Bus stops and minimums come first, and empty locations get one
            // place afterwards; only the extension stage obeys the targets.
            let bound = soft_total + n + 4;
            assert!(
                map.places().len() <= bound,
                "seed {seed} density {density}: {} places, bound {bound}",
                map.places().len()
            );
        }
    }
}

#[test]
fn tag_and_category_lookups_agree_with_locations() {
    let map = WorldMap::generate(&config(21, 0.5)).unwrap();

    let downtown = map.find_locations_with_tag(DistrictTag::Downtown);
    assert_eq!(downtown.len(), 1);

    let both = map.find_locations_with_all_tags(&[DistrictTag::Downtown, DistrictTag::Commercial]);
    assert_eq!(both, downtown);

    let any = map.find_locations_with_any_tags(&[DistrictTag::Residential, DistrictTag::Suburban]);
    for id in &any {
        let loc = map.get_location(*id).unwrap();
        assert!(loc.has_tag(DistrictTag::Residential) || loc.has_tag(DistrictTag::Suburban));
    }
    assert!(any.len() >= 3);

    let transit = map.find_locations_with_place_category(PlaceCategory::Transit);
    let expected: Vec<LocationId> = map
        .places()
        .iter()
        .filter(|p| p.has_category(PlaceCategory::Transit))
        .map(|p| p.location)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    assert_eq!(transit, expected);
}

#[test]
fn matching_respects_opening_hours() {
    let map = WorldMap::generate(&config(4, 0.5)).unwrap();
    let origin = LocationId::new(0);
    let town_hall = |p: &township_types::Place| p.key == "town_hall";

    // Wednesday 03:00: the town hall keeps office hours.
    assert_eq!(map.nearest_matching_place(town_hall, origin, at(3, 3), true), None);
    assert!(map.nearest_matching_place(town_hall, origin, at(3, 3), false).is_some());
    assert!(map.nearest_matching_place(town_hall, origin, at(3, 11), true).is_some());
    // Saturday midday: closed.
    assert_eq!(map.nearest_matching_place(town_hall, origin, at(6, 11), true), None);
}

#[test]
fn random_matching_prefers_leaving_after_a_long_stay() {
    let map = WorldMap::generate(&config(12, 0.5)).unwrap();
    let origin = map
        .locations()
        .iter()
        .find(|l| {
            l.places
                .iter()
                .any(|&id| map.get_place(id).is_some_and(|p| p.key == BUS_STOP_KEY))
        })
        .map(|l| l.id)
        .unwrap();
    let is_stop = |p: &township_types::Place| p.key == BUS_STOP_KEY;

    let stayed = |minutes_at_origin| {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        (0..400)
            .filter_map(|_| {
                let when = at(2, 12);
                map.random_matching_place(is_stop, origin, when, true, minutes_at_origin, &mut rng)
            })
            .filter(|m| m.location == origin)
            .count()
    };
    assert!(stayed(240) < stayed(0));
}

#[test]
fn create_place_at_unknown_location_changes_nothing() {
    let mut map = WorldMap::generate(&config(8, 0.5)).unwrap();
    let before: Vec<Vec<township_types::PlaceId>> =
        map.locations().iter().map(|l| l.places.clone()).collect();
    let place_count = map.places().len();

    let result = map.create_place_at(&PlaceSpec::keyed("cafe"), LocationId::new(5_000));
    assert!(matches!(result, Ok(None)));

    let after: Vec<Vec<township_types::PlaceId>> =
        map.locations().iter().map(|l| l.places.clone()).collect();
    assert_eq!(before, after);
    assert_eq!(map.places().len(), place_count);
    assert!(map.placement_log().is_empty());
}

#[test]
fn create_place_at_requires_a_key() {
    let mut map = WorldMap::generate(&config(8, 0.5)).unwrap();
    let spec = PlaceSpec {
        name: Some("Nameless".to_string()),
        ..PlaceSpec::default()
    };
    let result = map.create_place_at(&spec, LocationId::new(0));
    assert!(matches!(result, Err(WorldError::MissingPlaceKey)));
}

#[test]
fn created_places_are_found_by_queries() {
    let mut map = WorldMap::generate(&config(30, 0.0)).unwrap();
    let target = map
        .locations()
        .iter()
        .find(|l| l.place_count() < 6)
        .map(|l| l.id)
        .unwrap();
    let spec = PlaceSpec {
        key: "shrine".to_string(),
        name: Some("Wayside Shrine".to_string()),
        categories: vec![PlaceCategory::Worship],
        hours: None,
    };
    let place = map.create_place_at(&spec, target).unwrap().unwrap();
    let found = map
        .nearest_matching_place(|p| p.key == "shrine", target, at(1, 12), true)
        .unwrap();
    assert_eq!(found.place, place.id);
    assert_eq!(found.location, target);
    assert!(map
        .find_locations_with_place_category(PlaceCategory::Worship)
        .contains(&target));
}

#[test]
fn save_and_restore_reproduces_runtime_places() {
    let mut map = WorldMap::generate(&config(13, 0.5)).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    for resident in ["Ada", "Bo", "Cy", "Dee"] {
        map.place_home(resident, &mut rng).unwrap();
    }
    let save = map.save_state().unwrap();
    assert_eq!(save.placements.len(), 4);

    let json = serde_json::to_string(&save).unwrap();
    let loaded: WorldSave = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded, save);

    let restored = WorldMap::restore(&loaded).unwrap();
    assert_eq!(restored.places(), map.places());
    assert_eq!(restored.locations(), map.locations());
    assert_eq!(restored.save_state().unwrap(), save);
}

#[test]
fn replay_into_a_different_town_diverges() {
    let mut map = WorldMap::generate(&config(14, 0.5)).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    map.place_home("Ada", &mut rng).unwrap();
    let mut save = map.save_state().unwrap();
    save.placements[0].place = township_types::PlaceId::new(u32::MAX);
    assert!(matches!(
        WorldMap::restore(&save),
        Err(WorldError::ReplayDiverged { index: 0, .. })
    ));

    save.placements[0].location = LocationId::new(9_999);
    assert!(matches!(
        WorldMap::restore(&save),
        Err(WorldError::UnknownLocation(_))
    ));
}
