//! Capacity- and tag-aware distribution of place archetypes over locations.
//!
//! Allocation runs in fixed stages so that rare and constrained archetypes are
//! seated before common ones:
//!
//! 0. greedy bus-stop pass (separation only, ignores capacity and targets)
//! 1. singletons and rare-pool archetypes up to their minimum
//! 1b. the bus-stop minimum, if the greedy pass fell short
//! 1c. every other archetype minimum
//! 2. density-driven extension towards each archetype's maximum, respecting
//!    per-location soft targets
//! 3. one place for every location still empty
//!
//! Nothing here touches names or ids. The result is an ordered list of
//! [`Placement`]s that the world map turns into places.

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::SliceRandom;
use township_types::DistrictTag;
use tracing::{debug, warn};

use crate::district::DistrictArchetype;
use crate::error::WorldError;
use crate::place_registry::{BUS_STOP_KEY, PlaceArchetype};
use crate::route::{RouteIndex, UNREACHABLE};
use crate::sampling::weighted_choice;

/// Attempts allowed per candidate location before an archetype gives up.
const ATTEMPTS_PER_CANDIDATE: usize = 15;

/// Weight divisor for locations already at or over their soft target.
const OVER_TARGET_PENALTY: f64 = 10.0;

/// Pools at most this share of all locations count as rare.
const RARE_POOL_SHARE: f64 = 0.25;

/// Uncapped archetypes extend by at most one instance per this many
/// eligible locations.
const UNCAPPED_SPREAD: usize = 4;

/// One archetype instance assigned to one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Index into the place registry.
    pub archetype: usize,
    /// Location index.
    pub node: usize,
}

/// Reject registries that no map built from `districts` could satisfy.
///
/// # Errors
///
/// Returns [`WorldError::UnsatisfiableArchetype`] when an archetype with a
/// minimum is eligible in no district archetype, when minimums sharing a pool
/// of districts need more slots than those districts can hold, or when the
/// summed minimums exceed the total capacity of the map.
pub fn validate_registry(
    places: &[PlaceArchetype],
    districts: &[DistrictArchetype],
    location_count: usize,
    capacity: u32,
) -> Result<(), WorldError> {
    for archetype in places.iter().filter(|a| a.min > 0) {
        let reachable = archetype.eligible.is_empty()
            || districts
                .iter()
                .any(|d| d.tags.iter().any(|t| archetype.eligible.contains(t)));
        if !reachable {
            return Err(WorldError::UnsatisfiableArchetype {
                key: archetype.key.to_string(),
                reason: "no district archetype carries an eligible tag".to_string(),
            });
        }
    }

    // Pools here are sets of district archetypes; each contributes at most
    // its maximum number of locations.
    let pools: Vec<BTreeSet<usize>> = places
        .iter()
        .map(|archetype| {
            districts
                .iter()
                .enumerate()
                .filter(|(_, d)| {
                    archetype.eligible.is_empty()
                        || d.tags.iter().any(|t| archetype.eligible.contains(t))
                })
                .map(|(i, _)| i)
                .collect()
        })
        .collect();
    check_shared_pools(places, &pools, |pool| {
        let locations: usize = pool
            .iter()
            .filter_map(|&i| districts.get(i))
            .map(|d| d.max.map_or(location_count, |max| max as usize))
            .fold(0, usize::saturating_add);
        (locations.min(location_count) as u64).saturating_mul(u64::from(capacity))
    })?;

    let required: u64 = places.iter().map(|a| u64::from(a.min)).sum();
    let available = (location_count as u64).saturating_mul(u64::from(capacity));
    if required > available {
        let key = places
            .iter()
            .filter(|a| a.min > 0)
            .map(|a| a.key)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(WorldError::UnsatisfiableArchetype {
            key,
            reason: format!("{required} required places exceed capacity {available}"),
        });
    }
    Ok(())
}

/// Compare the minimums competing for each pool with the slots it holds.
///
/// For every archetype with a minimum, the minimums of all archetypes whose
/// pools lie inside its own pool must fit into `slots(pool)`.
fn check_shared_pools(
    places: &[PlaceArchetype],
    pools: &[BTreeSet<usize>],
    slots: impl Fn(&BTreeSet<usize>) -> u64,
) -> Result<(), WorldError> {
    for (archetype, pool) in places.iter().zip(pools) {
        if archetype.min == 0 {
            continue;
        }
        if let Some(max) = archetype.max.filter(|max| archetype.min > *max) {
            return Err(WorldError::UnsatisfiableArchetype {
                key: archetype.key.to_string(),
                reason: format!("minimum {} exceeds maximum {max}", archetype.min),
            });
        }
        let competing: Vec<&PlaceArchetype> = places
            .iter()
            .zip(pools)
            .filter(|(other, other_pool)| other.min > 0 && other_pool.is_subset(pool))
            .map(|(other, _)| other)
            .collect();
        let required: u64 = competing.iter().map(|a| u64::from(a.min)).sum();
        let available = slots(pool);
        if required > available {
            let key = competing
                .iter()
                .map(|a| a.key)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(WorldError::UnsatisfiableArchetype {
                key,
                reason: format!("{required} required places share {available} eligible slots"),
            });
        }
    }
    Ok(())
}

/// Desired number of places for a location of the given degree.
///
/// Dead ends want one or two places, through-roads two or three, and
/// intersections between three and `capacity` depending on density.
pub fn soft_target(degree: usize, density: f64, capacity: u32) -> u32 {
    let density = density.clamp(0.0, 1.0);
    let bonus = density.round() as u32;
    let target = match degree {
        0 | 1 => 1_u32.saturating_add(bonus),
        2 => 2_u32.saturating_add(bonus),
        _ => {
            let room = f64::from(capacity.saturating_sub(3));
            3_u32.saturating_add((density * room).round() as u32)
        }
    };
    target.min(capacity)
}

/// Per-generation allocation state.
#[derive(Debug)]
pub struct PlaceAllocator<'a> {
    registry: &'a [PlaceArchetype],
    tags: &'a [BTreeSet<DistrictTag>],
    density: f64,
    capacity: u32,
    hops: Vec<Vec<u32>>,
    pools: Vec<Vec<usize>>,
    soft_targets: Vec<u32>,
    usage: Vec<u32>,
    counts: Vec<u32>,
    sites: Vec<Vec<usize>>,
    placements: Vec<Placement>,
}

impl<'a> PlaceAllocator<'a> {
    /// Prepare allocation over the locations of `routes`.
    ///
    /// `tags` holds the district tags of every location, by index.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnsatisfiableArchetype`] when an archetype with a
    /// minimum has no eligible location on this map, or when minimums sharing
    /// eligible locations need more room than those locations have.
    pub fn new(
        registry: &'a [PlaceArchetype],
        tags: &'a [BTreeSet<DistrictTag>],
        routes: &RouteIndex,
        density: f64,
        capacity: u32,
    ) -> Result<Self, WorldError> {
        let node_count = tags.len();
        let pools: Vec<Vec<usize>> = registry
            .iter()
            .map(|archetype| {
                tags.iter()
                    .enumerate()
                    .filter(|(_, t)| archetype.is_eligible(t))
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();

        for (archetype, pool) in registry.iter().zip(&pools) {
            if archetype.min > 0 && pool.is_empty() {
                return Err(WorldError::UnsatisfiableArchetype {
                    key: archetype.key.to_string(),
                    reason: "no location on this map is eligible".to_string(),
                });
            }
        }
        let pool_sets: Vec<BTreeSet<usize>> =
            pools.iter().map(|pool| pool.iter().copied().collect()).collect();
        check_shared_pools(registry, &pool_sets, |pool| {
            (pool.len() as u64).saturating_mul(u64::from(capacity))
        })?;

        Ok(Self {
            registry,
            tags,
            density,
            capacity,
            hops: (0..node_count).map(|n| routes.hop_distances(n)).collect(),
            pools,
            soft_targets: (0..node_count)
                .map(|n| soft_target(routes.edges(n).len(), density, capacity))
                .collect(),
            usage: vec![0; node_count],
            counts: vec![0; registry.len()],
            sites: vec![Vec::new(); registry.len()],
            placements: Vec::new(),
        })
    }

    /// Run every stage and return the placements in commit order.
    pub fn allocate(mut self, rng: &mut impl Rng) -> Vec<Placement> {
        let bus_stop = self.registry.iter().position(|a| a.key == BUS_STOP_KEY);

        if let Some(bus) = bus_stop {
            self.greedy_bus_stops(bus, rng);
        }
        self.log_stage("0");

        let (rare, common) = self.minimum_groups(bus_stop);
        for &archetype in &rare {
            self.fill_minimum(archetype, rng);
        }
        self.log_stage("1");

        if let Some(bus) = bus_stop {
            self.fill_minimum(bus, rng);
        }
        self.log_stage("1b");

        for &archetype in &common {
            self.fill_minimum(archetype, rng);
        }
        self.log_stage("1c");

        self.extend_by_density(rng);
        self.log_stage("2");

        self.fill_empty_nodes(bus_stop, rng);
        self.log_stage("3");

        self.warn_unmet_minimums();
        self.placements
    }

    /// Stage 0: walk a shuffled node list once, seating a bus stop wherever
    /// separation and the maximum allow.
    fn greedy_bus_stops(&mut self, bus: usize, rng: &mut impl Rng) {
        let mut candidates = self.pools.get(bus).cloned().unwrap_or_default();
        candidates.shuffle(rng);
        for node in candidates {
            if self.below_max(bus) && self.separation_ok(bus, node) {
                self.commit(bus, node);
            }
        }
    }

    /// Split archetypes with a minimum into the rare group (stage 1) and the
    /// rest (stage 1c), each sorted by pool size ascending.
    fn minimum_groups(&self, bus_stop: Option<usize>) -> (Vec<usize>, Vec<usize>) {
        let rare_limit = (self.tags.len() as f64 * RARE_POOL_SHARE).floor() as usize;
        let mut rare = Vec::new();
        let mut common = Vec::new();
        for (index, archetype) in self.registry.iter().enumerate() {
            if Some(index) == bus_stop || archetype.min == 0 {
                continue;
            }
            let pool = self.pool_len(index);
            if archetype.is_singleton() || pool <= rare_limit {
                rare.push(index);
            } else {
                common.push(index);
            }
        }
        rare.sort_by_key(|&i| self.pool_len(i));
        common.sort_by_key(|&i| self.pool_len(i));
        (rare, common)
    }

    /// Place instances of `archetype` until its minimum is met, ignoring soft
    /// targets.
    fn fill_minimum(&mut self, archetype: usize, rng: &mut impl Rng) {
        let min = self.registry.get(archetype).map_or(0, |a| a.min);
        let mut budget = self.attempt_budget(archetype);
        while self.count(archetype) < min {
            if !self.place_one(archetype, false, &mut budget, rng) {
                break;
            }
        }
    }

    /// Stage 2: round-robin over archetypes, one instance each per round,
    /// until every archetype reaches its density-scaled goal or gives up.
    ///
    /// The stage also ends once the map holds as many places as the soft
    /// targets add up to, which leaves capacity above the targets free.
    fn extend_by_density(&mut self, rng: &mut impl Rng) {
        let soft_budget = self
            .soft_targets
            .iter()
            .fold(0_usize, |sum, t| sum.saturating_add(*t as usize));
        let goals: Vec<u32> = (0..self.registry.len()).map(|i| self.density_goal(i)).collect();
        let mut budgets: Vec<usize> = (0..self.registry.len())
            .map(|i| self.attempt_budget(i))
            .collect();
        let mut active: Vec<bool> = goals
            .iter()
            .enumerate()
            .map(|(i, goal)| self.count(i) < *goal)
            .collect();

        while active.iter().any(|a| *a) {
            for archetype in 0..self.registry.len() {
                if self.placements.len() >= soft_budget {
                    return;
                }
                if !active.get(archetype).copied().unwrap_or(false) {
                    continue;
                }
                let Some(budget) = budgets.get_mut(archetype) else {
                    continue;
                };
                let placed = self.place_one(archetype, true, budget, rng);
                let goal = goals.get(archetype).copied().unwrap_or(0);
                if !placed || self.count(archetype) >= goal {
                    if let Some(flag) = active.get_mut(archetype) {
                        *flag = false;
                    }
                }
            }
        }
    }

    /// Stage 3: give every node still without a place one instance, trying a
    /// bus stop first and then a weighted eligible archetype (one retry).
    fn fill_empty_nodes(&mut self, bus_stop: Option<usize>, rng: &mut impl Rng) {
        for node in 0..self.tags.len() {
            if self.usage_of(node) > 0 {
                continue;
            }
            if let Some(bus) = bus_stop {
                if self.can_place(bus, node) {
                    self.commit(bus, node);
                    continue;
                }
            }

            let options: Vec<usize> = (0..self.registry.len())
                .filter(|&i| Some(i) != bus_stop && self.eligible_at(i, node) && self.below_max(i))
                .collect();
            let weights: Vec<f64> = options
                .iter()
                .map(|&i| self.registry.get(i).map_or(0.0, |a| f64::from(a.weight)))
                .collect();

            let mut seated = false;
            for _ in 0..2 {
                let picked = weighted_choice(&weights, rng).and_then(|s| options.get(s));
                let Some(choice) = picked else {
                    break;
                };
                if self.can_place(*choice, node) {
                    self.commit(*choice, node);
                    seated = true;
                    break;
                }
            }
            if !seated {
                warn!(node, "location left without a place");
            }
        }
    }

    /// Try to seat one instance of `archetype` by capacity-weighted roulette.
    ///
    /// Each draw spends one unit of `budget`. Returns `false` once the budget
    /// runs out, the archetype is at its maximum, or no candidate has room.
    fn place_one(
        &mut self,
        archetype: usize,
        soft: bool,
        budget: &mut usize,
        rng: &mut impl Rng,
    ) -> bool {
        if !self.below_max(archetype) {
            return false;
        }
        let candidates = self.pools.get(archetype).cloned().unwrap_or_default();
        while *budget > 0 {
            *budget -= 1;
            let weights: Vec<f64> = candidates
                .iter()
                .map(|&node| self.roulette_weight(node, soft))
                .collect();
            let Some(node) = weighted_choice(&weights, rng).and_then(|s| candidates.get(s).copied())
            else {
                return false;
            };
            if self.can_place(archetype, node) {
                self.commit(archetype, node);
                return true;
            }
        }
        false
    }

    fn roulette_weight(&self, node: usize, soft: bool) -> f64 {
        let used = self.usage_of(node);
        let left = f64::from(self.capacity.saturating_sub(used));
        let weight = left * left;
        let target = self.soft_targets.get(node).copied().unwrap_or(self.capacity);
        if soft && used >= target {
            weight / OVER_TARGET_PENALTY
        } else {
            weight
        }
    }

    fn can_place(&self, archetype: usize, node: usize) -> bool {
        self.eligible_at(archetype, node)
            && self.below_max(archetype)
            && self.usage_of(node) < self.capacity
            && self.separation_ok(archetype, node)
    }

    fn eligible_at(&self, archetype: usize, node: usize) -> bool {
        match (self.registry.get(archetype), self.tags.get(node)) {
            (Some(a), Some(tags)) => a.is_eligible(tags),
            _ => false,
        }
    }

    fn below_max(&self, archetype: usize) -> bool {
        self.registry
            .get(archetype)
            .and_then(|a| a.max)
            .is_none_or(|max| self.count(archetype) < max)
    }

    /// Whether every existing instance of `archetype` is at least
    /// `min_distance` hops from `node`.
    fn separation_ok(&self, archetype: usize, node: usize) -> bool {
        let Some(min_distance) = self.registry.get(archetype).and_then(|a| a.min_distance) else {
            return true;
        };
        let Some(row) = self.hops.get(node) else {
            return false;
        };
        self.sites.get(archetype).is_none_or(|sites| {
            sites.iter().all(|&site| {
                let hops = row.get(site).copied().unwrap_or(UNREACHABLE);
                hops >= min_distance
            })
        })
    }

    /// `min + round((max - min) * density)`. Uncapped archetypes take one
    /// instance per [`UNCAPPED_SPREAD`] eligible locations as their headroom.
    fn density_goal(&self, archetype: usize) -> u32 {
        let Some(a) = self.registry.get(archetype) else {
            return 0;
        };
        let spread = self.pool_len(archetype).div_ceil(UNCAPPED_SPREAD);
        let headroom = u32::try_from(spread).unwrap_or(u32::MAX);
        let max = a.max.unwrap_or_else(|| a.min.saturating_add(headroom)).max(a.min);
        let extra = (f64::from(max.saturating_sub(a.min)) * self.density).round() as u32;
        a.min.saturating_add(extra).min(max)
    }

    fn attempt_budget(&self, archetype: usize) -> usize {
        self.pool_len(archetype).saturating_mul(ATTEMPTS_PER_CANDIDATE)
    }

    fn commit(&mut self, archetype: usize, node: usize) {
        if let Some(used) = self.usage.get_mut(node) {
            *used = used.saturating_add(1);
        }
        if let Some(count) = self.counts.get_mut(archetype) {
            *count = count.saturating_add(1);
        }
        if let Some(sites) = self.sites.get_mut(archetype) {
            sites.push(node);
        }
        self.placements.push(Placement { archetype, node });
    }

    fn count(&self, archetype: usize) -> u32 {
        self.counts.get(archetype).copied().unwrap_or(0)
    }

    fn usage_of(&self, node: usize) -> u32 {
        self.usage.get(node).copied().unwrap_or(0)
    }

    fn pool_len(&self, archetype: usize) -> usize {
        self.pools.get(archetype).map_or(0, Vec::len)
    }

    fn warn_unmet_minimums(&self) {
        for (index, archetype) in self.registry.iter().enumerate() {
            let placed = self.count(index);
            if placed < archetype.min {
                warn!(
                    archetype = archetype.key,
                    placed,
                    min = archetype.min,
                    "archetype minimum not met"
                );
            }
        }
    }

    fn log_stage(&self, stage: &str) {
        debug!(stage, placed = self.placements.len(), "allocation stage complete");
    }
}
