//! Integration tests for the generated street graph.
//!
//! Every property is checked over a sweep of seeds and densities: the graph
//! is connected and planar, routing behaves like a metric, street names form
//! contiguous runs, and identical configs reproduce identical towns.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::missing_panics_doc,
    clippy::cast_possible_truncation
)]

use std::collections::{BTreeMap, BTreeSet};

use township_types::LocationId;
use township_world::geometry::segments_cross;
use township_world::{GenerationConfig, RouteIndex, UNREACHABLE, WorldError, WorldMap};

const DENSITIES: [f64; 3] = [0.0, 0.5, 1.0];

fn config(seed: u64, density: f64) -> GenerationConfig {
    GenerationConfig {
        density,
        ..GenerationConfig::with_seed(seed)
    }
}

fn sweep() -> impl Iterator<Item = WorldMap> {
    (0..8_u64).flat_map(|seed| {
        DENSITIES
            .into_iter()
            .map(move |density| WorldMap::generate(&config(seed, density)).unwrap())
    })
}

fn ids(map: &WorldMap) -> Vec<LocationId> {
    map.locations().iter().map(|l| l.id).collect()
}

#[test]
fn every_town_is_connected() {
    for map in sweep() {
        assert!(map.is_connected(), "seed {} disconnected", map.config().seed);
        let origin = LocationId::new(0);
        for id in ids(&map) {
            assert_ne!(map.travel_minutes(origin, id), UNREACHABLE);
        }
    }
}

#[test]
fn no_two_streets_cross() {
    for map in sweep() {
        let position = |id: LocationId| map.get_location(id).unwrap().position;
        let streets = map.streets();
        for (i, a) in streets.iter().enumerate() {
            for b in streets.iter().skip(i + 1) {
                let shared = [a.from, a.to].iter().any(|e| *e == b.from || *e == b.to);
                if shared {
                    continue;
                }
                let crossed = segments_cross(
                    position(a.from),
                    position(a.to),
                    position(b.from),
                    position(b.to),
                );
                assert!(
                    !crossed,
                    "streets {} and {} cross",
                    a.id,
                    b.id
                );
            }
        }
    }
}

#[test]
fn no_duplicate_connections() {
    for map in sweep() {
        let pairs: BTreeSet<(LocationId, LocationId)> = map
            .streets()
            .iter()
            .map(|s| (s.from.min(s.to), s.from.max(s.to)))
            .collect();
        assert_eq!(pairs.len(), map.streets().len());
        assert!(map.streets().iter().all(|s| s.from != s.to));
        assert!(map.streets().iter().all(|s| (1..=5).contains(&s.minutes)));
    }
}

#[test]
fn routing_is_a_metric() {
    for map in sweep().step_by(4) {
        let all = ids(&map);
        let n = all.len();
        let mut dist = vec![vec![0_u32; n]; n];
        for &a in &all {
            for &b in &all {
                dist[a.index()][b.index()] = map.travel_minutes(a, b);
            }
        }
        for a in 0..n {
            assert_eq!(dist[a][a], 0);
            for b in 0..n {
                assert_eq!(dist[a][b], dist[b][a]);
                for c in 0..n {
                    assert!(dist[a][c] <= dist[a][b] + dist[b][c]);
                }
            }
        }
    }
}

#[test]
fn every_street_is_named_in_contiguous_runs() {
    for map in sweep() {
        let mut by_name: BTreeMap<&str, Vec<(LocationId, LocationId)>> = BTreeMap::new();
        for street in map.streets() {
            assert!(!street.name.is_empty());
            by_name
                .entry(street.name.as_str())
                .or_default()
                .push((street.from, street.to));
        }
        for (name, edges) in by_name {
            // Grow a component from the first edge; it must swallow them all.
            let mut reached: BTreeSet<LocationId> = BTreeSet::from([edges[0].0, edges[0].1]);
            let mut grew = true;
            while grew {
                grew = false;
                for (a, b) in &edges {
                    if reached.contains(a) != reached.contains(b) {
                        reached.insert(*a);
                        reached.insert(*b);
                        grew = true;
                    }
                }
            }
            assert!(
                edges.iter().all(|(a, _)| reached.contains(a)),
                "{name} is split into separate runs"
            );
        }
    }
}

#[test]
fn both_directions_share_one_name() {
    for map in sweep().take(6) {
        for street in map.streets() {
            let back = map
                .get_location(street.to)
                .and_then(|l| l.street_to(street.from))
                .unwrap();
            assert_eq!(back.name, street.name);
            assert_eq!(back.minutes, street.minutes);
            assert_eq!(back.id, street.id);
        }
    }
}

#[test]
fn same_config_same_town() {
    for density in DENSITIES {
        let a = WorldMap::generate(&config(77, density)).unwrap();
        let b = WorldMap::generate(&config(77, density)).unwrap();
        let json_a = serde_json::to_string(&a.snapshot()).unwrap();
        let json_b = serde_json::to_string(&b.snapshot()).unwrap();
        assert_eq!(json_a, json_b);
    }
    let a = WorldMap::generate(&config(1, 0.5)).unwrap();
    let b = WorldMap::generate(&config(2, 0.5)).unwrap();
    assert_ne!(
        serde_json::to_string(&a.snapshot()).unwrap(),
        serde_json::to_string(&b.snapshot()).unwrap()
    );
}

#[test]
fn two_location_town_has_one_street() {
    for seed in 0..5 {
        let cfg = GenerationConfig {
            location_count: Some(2),
            ..GenerationConfig::with_seed(seed)
        };
        let map = WorldMap::generate(&cfg).unwrap();
        assert_eq!(map.streets().len(), 1);
        assert!(map.is_connected());
        let street = &map.streets()[0];
        let back = map
            .get_location(street.to)
            .and_then(|l| l.street_to(street.from))
            .unwrap();
        assert_eq!(back.name, street.name);
        assert!(!street.name.is_empty());
    }
}

#[test]
fn single_location_town() {
    let cfg = GenerationConfig {
        location_count: Some(1),
        ..GenerationConfig::with_seed(3)
    };
    let map = WorldMap::generate(&cfg).unwrap();
    assert_eq!(map.location_count(), 1);
    assert!(map.streets().is_empty());
    assert!(map.is_connected());
    assert!(!map.places().is_empty());
    assert_eq!(map.travel_minutes(LocationId::new(0), LocationId::new(0)), 0);
}

#[test]
fn zero_locations_is_fatal() {
    let cfg = GenerationConfig {
        location_count: Some(0),
        ..GenerationConfig::default()
    };
    assert!(matches!(WorldMap::generate(&cfg), Err(WorldError::EmptyWorld)));
}

#[test]
fn out_of_range_density_is_fatal() {
    let cfg = config(1, 1.5);
    assert!(matches!(WorldMap::generate(&cfg), Err(WorldError::InvalidConfig(_))));
}

#[test]
fn disconnected_index_reports_unreachable() {
    let mut routes = RouteIndex::new(4);
    routes.add_street(0, 1, 3);
    routes.add_street(2, 3, 2);
    assert_eq!(routes.travel_minutes(0, 1), 3);
    assert_eq!(routes.travel_minutes(1, 2), UNREACHABLE);
    assert_eq!(routes.travel_path(0, 3), None);
    assert!(routes.travel_path(2, 3).is_some());
    assert!(!routes.is_connected());
}

#[test]
fn unknown_locations_are_unreachable() {
    let map = WorldMap::generate(&config(5, 0.5)).unwrap();
    let ghost = LocationId::new(10_000);
    assert_eq!(map.travel_minutes(LocationId::new(0), ghost), UNREACHABLE);
    assert_eq!(map.travel_path(ghost, LocationId::new(0)), None);
    assert!(map.get_location(ghost).is_none());
}

#[test]
fn default_location_count_follows_density() {
    let sparse = WorldMap::generate(&config(9, 0.0)).unwrap();
    let dense = WorldMap::generate(&config(9, 1.0)).unwrap();
    assert_eq!(sparse.location_count(), 14);
    assert_eq!(dense.location_count(), 24);
}
