//! Street naming over a finished street graph.
//!
//! Segments are grouped into contiguous runs and each run gets one name.
//! Runs start at dead ends where possible, grow from the lower-degree end
//! along the straightest unassigned continuation, and may stop at an
//! intersection once they are long enough. Denser towns get longer runs.
//!
//! Names come from a tag-weighted registry and are never reused by a second
//! run. A run that ends up as an isolated single segment borrows the name of
//! an adjacent, already-named segment instead, so short spurs read as part
//! of the street they hang off. When the registry runs dry, runs are named
//! "Road 1", "Road 2", and so on.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use township_types::DistrictTag;

use crate::planar::RoadGraph;
use crate::sampling::weighted_choice;

/// Runs shorter than this never stop early at an intersection.
const MIN_RUN: usize = 2;

/// A registry entry for a street name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreetName {
    /// Stable key; a key is used by at most one run.
    pub key: &'static str,
    /// The name itself.
    pub name: &'static str,
    /// District tags this name suits.
    pub tags: &'static [DistrictTag],
    /// Base sampling weight.
    pub weight: u32,
}

macro_rules! street {
    ($key:literal, $name:literal, [$($tag:ident),*], $weight:literal) => {
        StreetName {
            key: $key,
            name: $name,
            tags: &[$(DistrictTag::$tag),*],
            weight: $weight,
        }
    };
}

/// Street names for a standard town.
pub const STANDARD_STREET_NAMES: &[StreetName] = &[
    street!("high_street", "High Street", [Downtown, Commercial], 3),
    street!("market_street", "Market Street", [Commercial, Downtown], 3),
    street!("king_street", "King Street", [Downtown, Historic], 2),
    street!("queen_street", "Queen Street", [Downtown, Historic], 2),
    street!("station_road", "Station Road", [Transit, Commercial], 3),
    street!("church_lane", "Church Lane", [Historic, Residential], 2),
    street!("abbey_row", "Abbey Row", [Historic], 1),
    street!("castle_hill", "Castle Hill", [Historic], 1),
    street!("cobbler_lane", "Cobbler Lane", [Historic, Commercial], 1),
    street!("maple_avenue", "Maple Avenue", [Residential, Suburban], 3),
    street!("oak_drive", "Oak Drive", [Suburban], 2),
    street!("birch_close", "Birch Close", [Suburban, Residential], 2),
    street!("willow_crescent", "Willow Crescent", [Suburban], 2),
    street!("rose_gardens", "Rose Gardens", [Residential, Park], 2),
    street!("primrose_way", "Primrose Way", [Residential], 2),
    street!("elm_grove", "Elm Grove", [Residential, Park], 2),
    street!("cedar_road", "Cedar Road", [Residential], 2),
    street!("hawthorn_walk", "Hawthorn Walk", [Park, Residential], 1),
    street!("foundry_road", "Foundry Road", [Industrial], 3),
    street!("mill_lane", "Mill Lane", [Industrial, Rural], 2),
    street!("canal_street", "Canal Street", [Industrial, Waterfront], 2),
    street!("depot_way", "Depot Way", [Industrial, Transit], 2),
    street!("works_road", "Works Road", [Industrial], 1),
    street!("harbour_road", "Harbour Road", [Waterfront], 3),
    street!("quay_street", "Quay Street", [Waterfront, Commercial], 2),
    street!("riverside_walk", "Riverside Walk", [Waterfront, Park], 2),
    street!("ferry_lane", "Ferry Lane", [Waterfront], 1),
    street!("college_road", "College Road", [University], 3),
    street!("scholars_walk", "Scholars Walk", [University, Historic], 2),
    street!("library_lane", "Library Lane", [University, Downtown], 1),
    street!("park_avenue", "Park Avenue", [Park, Downtown], 2),
    street!("meadow_lane", "Meadow Lane", [Park, Rural], 2),
    street!("green_lane", "Green Lane", [Park, Suburban], 2),
    street!("lantern_street", "Lantern Street", [Nightlife], 2),
    street!("neon_row", "Neon Row", [Nightlife, Commercial], 1),
    street!("theatre_street", "Theatre Street", [Nightlife, Downtown], 2),
    street!("farm_road", "Farm Road", [Rural], 2),
    street!("orchard_lane", "Orchard Lane", [Rural, Suburban], 2),
    street!("barley_row", "Barley Row", [Rural], 1),
    street!("windmill_hill", "Windmill Hill", [Rural], 1),
    street!("platform_street", "Platform Street", [Transit], 1),
    street!("coach_road", "Coach Road", [Transit, Historic], 1),
    street!("union_street", "Union Street", [], 2),
    street!("north_road", "North Road", [], 1),
    street!("south_road", "South Road", [], 1),
    street!("bridge_street", "Bridge Street", [], 2),
    street!("victoria_road", "Victoria Road", [], 2),
    street!("albert_road", "Albert Road", [], 2),
];

/// Assign a name to every segment of `graph`.
///
/// `tags` holds the district tags of each node, by node index. Returns one
/// name per segment, by segment index; every name is non-empty.
pub fn name_streets(
    graph: &RoadGraph,
    tags: &[BTreeSet<DistrictTag>],
    registry: &[StreetName],
    density: f64,
    rng: &mut impl Rng,
) -> Vec<String> {
    let mut namer = StreetNamer::new(graph, tags, registry, density);
    while let Some(first) = namer.next_run_start() {
        let (start, run) = namer.trace_run(first, rng);
        let name = namer.name_for_run(start, &run, rng);
        tracing::debug!(start, segments = run.len(), %name, "street run named");
        for segment in run {
            if let Some(slot) = namer.names.get_mut(segment) {
                *slot = Some(name.clone());
            }
        }
    }
    namer
        .names
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect()
}

struct StreetNamer<'a> {
    graph: &'a RoadGraph,
    tags: &'a [BTreeSet<DistrictTag>],
    registry: &'a [StreetName],
    unassigned: BTreeSet<usize>,
    used_keys: BTreeSet<&'static str>,
    names: Vec<Option<String>>,
    next_road_number: u32,
    stop_chance: f64,
    max_run: usize,
}

impl<'a> StreetNamer<'a> {
    fn new(
        graph: &'a RoadGraph,
        tags: &'a [BTreeSet<DistrictTag>],
        registry: &'a [StreetName],
        density: f64,
    ) -> Self {
        let density = density.clamp(0.0, 1.0);
        let segment_count = graph.segments().len();
        Self {
            graph,
            tags,
            registry,
            unassigned: (0..segment_count).collect(),
            used_keys: BTreeSet::new(),
            names: vec![None; segment_count],
            next_road_number: 1,
            stop_chance: 0.4_f64.mul_add(-density, 0.6),
            max_run: 3_usize.saturating_add((density * 4.0).round() as usize),
        }
    }

    fn endpoints(&self, segment: usize) -> Option<(usize, usize)> {
        self.graph.segment(segment).map(|s| (s.a, s.b))
    }

    fn other_end(&self, segment: usize, node: usize) -> Option<usize> {
        self.graph.segment(segment).and_then(|s| s.other_end(node))
    }

    /// Lowest unassigned segment touching a node of degree <= 2, else the
    /// lowest unassigned segment.
    fn next_run_start(&self) -> Option<usize> {
        self.unassigned
            .iter()
            .copied()
            .find(|&s| {
                self.endpoints(s).is_some_and(|(a, b)| {
                    self.graph.degree(a) <= 2 || self.graph.degree(b) <= 2
                })
            })
            .or_else(|| self.unassigned.first().copied())
    }

    fn unassigned_at(&self, node: usize) -> Vec<usize> {
        self.graph
            .incident(node)
            .iter()
            .copied()
            .filter(|s| self.unassigned.contains(s))
            .collect()
    }

    /// The option whose direction deviates least from `prev -> current`.
    fn straightest(&self, prev: usize, current: usize, options: &[usize]) -> Option<usize> {
        let (Some(p), Some(c)) = (self.graph.position(prev), self.graph.position(current)) else {
            return options.first().copied();
        };
        let (hx, hy) = (c.x - p.x, c.y - p.y);
        let heading_len = hx.hypot(hy);
        let mut best: Option<(f64, usize)> = None;
        for &segment in options {
            let Some(next) = self.other_end(segment, current).and_then(|n| self.graph.position(n))
            else {
                continue;
            };
            let (dx, dy) = (next.x - c.x, next.y - c.y);
            let len = heading_len * dx.hypot(dy);
            let cosine = if len > 0.0 { hx.mul_add(dx, hy * dy) / len } else { 0.0 };
            if best.is_none_or(|(b, _)| cosine > b) {
                best = Some((cosine, segment));
            }
        }
        best.map(|(_, s)| s)
    }

    /// Grow a run from `first`; returns the run's start node and segments.
    fn trace_run(&mut self, first: usize, rng: &mut impl Rng) -> (usize, Vec<usize>) {
        let Some((a, b)) = self.endpoints(first) else {
            self.unassigned.remove(&first);
            return (0, vec![first]);
        };
        let (start, mut current) = if self.graph.degree(a) <= self.graph.degree(b) {
            (a, b)
        } else {
            (b, a)
        };
        self.unassigned.remove(&first);
        let mut run = vec![first];
        let mut prev = start;

        while run.len() < self.max_run {
            let options = self.unassigned_at(current);
            if options.is_empty() {
                break;
            }
            if self.graph.degree(current) >= 3
                && run.len() >= MIN_RUN
                && rng.random_bool(self.stop_chance)
            {
                break;
            }
            let forward: Vec<usize> = options
                .iter()
                .copied()
                .filter(|&s| self.other_end(s, current) != Some(prev))
                .collect();
            let pool = if forward.is_empty() { options } else { forward };
            let Some(next) = self.straightest(prev, current, &pool) else {
                break;
            };
            let Some(next_node) = self.other_end(next, current) else {
                break;
            };
            self.unassigned.remove(&next);
            run.push(next);
            prev = current;
            current = next_node;
        }

        if run.len() == 1 {
            let extension = self
                .unassigned_at(current)
                .first()
                .copied()
                .or_else(|| self.unassigned_at(start).first().copied());
            if let Some(extra) = extension {
                self.unassigned.remove(&extra);
                run.push(extra);
            }
        }

        (start, run)
    }

    /// Name of the lowest-indexed named segment sharing an endpoint with `segment`.
    fn neighbouring_name(&self, segment: usize) -> Option<String> {
        let (a, b) = self.endpoints(segment)?;
        let mut adjacent: Vec<usize> = self
            .graph
            .incident(a)
            .iter()
            .chain(self.graph.incident(b))
            .copied()
            .filter(|&s| s != segment)
            .collect();
        adjacent.sort_unstable();
        adjacent
            .into_iter()
            .find_map(|s| self.names.get(s).and_then(Clone::clone))
    }

    fn name_for_run(&mut self, start: usize, run: &[usize], rng: &mut impl Rng) -> String {
        if let [only] = run {
            if let Some(name) = self.neighbouring_name(*only) {
                return name;
            }
        }

        let registry = self.registry;
        let start_tags = self.tags.get(start);
        let candidates: Vec<&StreetName> = registry
            .iter()
            .filter(|entry| !self.used_keys.contains(entry.key))
            .collect();
        let weights: Vec<f64> = candidates
            .iter()
            .map(|entry| {
                let overlap = start_tags.map_or(0, |tags| {
                    entry.tags.iter().filter(|t| tags.contains(t)).count()
                });
                f64::from(entry.weight) * (1.0 + 2.0 * overlap as f64)
            })
            .collect();

        if let Some(entry) = weighted_choice(&weights, rng).and_then(|i| candidates.get(i)) {
            self.used_keys.insert(entry.key);
            return entry.name.to_string();
        }

        let name = format!("Road {}", self.next_road_number);
        self.next_road_number = self.next_road_number.saturating_add(1);
        name
    }
}

/// Group segment indices by street name.
pub fn runs_by_name(names: &[String]) -> BTreeMap<&str, Vec<usize>> {
    let mut runs: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (segment, name) in names.iter().enumerate() {
        runs.entry(name.as_str()).or_default().push(segment);
    }
    runs
}
