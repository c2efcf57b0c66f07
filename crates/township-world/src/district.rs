//! District archetypes and the selector that assigns them to locations.
//!
//! Selection runs in two passes. First every archetype's minimum is seated
//! in registry order (stopping early once the requested count is reached).
//! The remaining slots are then filled by weighted sampling over archetypes
//! that are still below their maximum, falling back to the whole registry
//! once everything is capped. The result is shuffled so that mandatory
//! districts do not cluster in the first grid cells.

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::SliceRandom;
use township_types::DistrictTag;

use crate::sampling::weighted_choice;

/// A registry entry describing a kind of district.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistrictArchetype {
    /// Stable key, e.g. `residential`.
    pub key: &'static str,
    /// Display label; non-unique archetypes get a letter suffix.
    pub label: &'static str,
    /// Tags every location of this archetype carries.
    pub tags: &'static [DistrictTag],
    /// Relative sampling weight for the fill pass.
    pub weight: u32,
    /// Minimum number of occurrences.
    pub min: u32,
    /// Maximum number of occurrences, if bounded.
    pub max: Option<u32>,
}

impl DistrictArchetype {
    /// Whether at most one location of this archetype can exist.
    pub const fn is_unique(&self) -> bool {
        matches!(self.max, Some(1))
    }
}

/// The district archetypes used for a standard town.
pub const STANDARD_DISTRICTS: &[DistrictArchetype] = &[
    DistrictArchetype {
        key: "downtown",
        label: "Downtown",
        tags: &[DistrictTag::Downtown, DistrictTag::Commercial],
        weight: 1,
        min: 1,
        max: Some(1),
    },
    DistrictArchetype {
        key: "residential",
        label: "Residential",
        tags: &[DistrictTag::Residential],
        weight: 6,
        min: 2,
        max: None,
    },
    DistrictArchetype {
        key: "suburbs",
        label: "Suburbs",
        tags: &[DistrictTag::Suburban, DistrictTag::Residential],
        weight: 4,
        min: 1,
        max: None,
    },
    DistrictArchetype {
        key: "commercial",
        label: "Market Quarter",
        tags: &[DistrictTag::Commercial],
        weight: 3,
        min: 1,
        max: Some(3),
    },
    DistrictArchetype {
        key: "industrial",
        label: "Industrial Estate",
        tags: &[DistrictTag::Industrial],
        weight: 2,
        min: 1,
        max: Some(2),
    },
    DistrictArchetype {
        key: "old_town",
        label: "Old Town",
        tags: &[DistrictTag::Historic, DistrictTag::Residential],
        weight: 2,
        min: 0,
        max: Some(1),
    },
    DistrictArchetype {
        key: "waterfront",
        label: "Waterfront",
        tags: &[DistrictTag::Waterfront],
        weight: 2,
        min: 0,
        max: Some(1),
    },
    DistrictArchetype {
        key: "campus",
        label: "University Quarter",
        tags: &[DistrictTag::University, DistrictTag::Residential],
        weight: 1,
        min: 0,
        max: Some(1),
    },
    DistrictArchetype {
        key: "green",
        label: "Green",
        tags: &[DistrictTag::Park],
        weight: 2,
        min: 0,
        max: Some(2),
    },
    DistrictArchetype {
        key: "nightlife",
        label: "Entertainment District",
        tags: &[DistrictTag::Nightlife, DistrictTag::Commercial],
        weight: 1,
        min: 0,
        max: Some(1),
    },
    DistrictArchetype {
        key: "station",
        label: "Station Quarter",
        tags: &[DistrictTag::Transit, DistrictTag::Commercial],
        weight: 1,
        min: 0,
        max: Some(1),
    },
    DistrictArchetype {
        key: "outskirts",
        label: "Outskirts",
        tags: &[DistrictTag::Rural],
        weight: 2,
        min: 0,
        max: Some(3),
    },
];

/// One selected district, ready to become a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistrictAssignment {
    /// Index of the archetype in the registry.
    pub archetype: usize,
    /// Archetype key.
    pub key: &'static str,
    /// Display name, suffixed for non-unique archetypes.
    pub name: String,
    /// Tags copied from the archetype.
    pub tags: BTreeSet<DistrictTag>,
}

/// Choose `count` districts from `registry`.
///
/// Returns an empty list for an empty registry.
pub fn select_districts(
    registry: &[DistrictArchetype],
    count: usize,
    rng: &mut impl Rng,
) -> Vec<usize> {
    if registry.is_empty() {
        return Vec::new();
    }

    let mut counts = vec![0_u32; registry.len()];
    let mut picks: Vec<usize> = Vec::with_capacity(count);

    'minimums: for (index, archetype) in registry.iter().enumerate() {
        for _ in 0..archetype.min {
            if picks.len() >= count {
                break 'minimums;
            }
            picks.push(index);
            if let Some(c) = counts.get_mut(index) {
                *c = c.saturating_add(1);
            }
        }
    }

    while picks.len() < count {
        let open: Vec<usize> = registry
            .iter()
            .enumerate()
            .filter(|(i, a)| {
                a.max
                    .is_none_or(|max| counts.get(*i).copied().unwrap_or(0) < max)
            })
            .map(|(i, _)| i)
            .collect();
        let pool: Vec<usize> = if open.is_empty() {
            (0..registry.len()).collect()
        } else {
            open
        };
        let weights: Vec<f64> = pool
            .iter()
            .map(|i| registry.get(*i).map_or(0.0, |a| f64::from(a.weight)))
            .collect();
        // Zero total weight degrades to the first pool entry.
        let chosen = weighted_choice(&weights, rng)
            .and_then(|slot| pool.get(slot).copied())
            .or_else(|| pool.first().copied())
            .unwrap_or(0);
        picks.push(chosen);
        if let Some(c) = counts.get_mut(chosen) {
            *c = c.saturating_add(1);
        }
    }

    picks.shuffle(rng);
    picks
}

/// Turn selected archetype indices into named assignments.
///
/// Unique archetypes keep their label; every other archetype gets a letter
/// suffix by occurrence, in selection order ("Residential A", "Residential B").
pub fn name_districts(registry: &[DistrictArchetype], picks: &[usize]) -> Vec<DistrictAssignment> {
    let mut seen = vec![0_usize; registry.len()];
    picks
        .iter()
        .filter_map(|&index| {
            let archetype = registry.get(index)?;
            let occurrence = seen.get_mut(index)?;
            let name = if archetype.is_unique() {
                archetype.label.to_string()
            } else {
                format!("{} {}", archetype.label, letter_suffix(*occurrence))
            };
            *occurrence = occurrence.saturating_add(1);
            Some(DistrictAssignment {
                archetype: index,
                key: archetype.key,
                name,
                tags: archetype.tags.iter().copied().collect(),
            })
        })
        .collect()
}

/// Spreadsheet-style letters: 0 -> "A", 25 -> "Z", 26 -> "AA".
pub fn letter_suffix(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index;
    loop {
        let rem = u8::try_from(n % 26).unwrap_or(0);
        letters.push(char::from(b'A'.saturating_add(rem)));
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}
