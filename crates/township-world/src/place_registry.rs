//! Place archetypes: the registry of point-of-interest templates.
//!
//! Each [`PlaceArchetype`] is immutable configuration: which districts it may
//! appear in, how common it is, how many instances may exist, how far apart
//! instances must be, when it is open, and how instances are named. Naming is
//! a plain function over a [`NameContext`] and the generator's random stream,
//! so names can be produced without access to any generation state.

use std::collections::BTreeSet;

use chrono::Weekday;
use rand::RngCore;
use rand::seq::IndexedRandom;
use township_types::{DistrictTag, OpeningHours, PlaceCategory, PlaceProps};

/// Key of the bus stop archetype, which gets its own allocation stages.
pub const BUS_STOP_KEY: &str = "bus_stop";

/// Everything a naming function may look at.
#[derive(Debug, Clone, Copy)]
pub struct NameContext<'a> {
    /// Display name of the location receiving the place.
    pub location_name: &'a str,
    /// District tags of that location.
    pub tags: &'a BTreeSet<DistrictTag>,
    /// Zero-based instance number of this archetype.
    pub index: u32,
}

/// Produces a display name for a new place instance.
pub type NameFn = fn(&NameContext<'_>, &mut dyn RngCore) -> String;

/// A const-friendly weekly schedule, converted to [`OpeningHours`] on use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Opening hour.
    pub opens: u16,
    /// Closing hour (`24` for midnight; smaller than `opens` for overnight).
    pub closes: u16,
    /// Days the place stays shut.
    pub closed_on: &'static [Weekday],
}

impl Schedule {
    /// Convert to the runtime representation.
    pub fn to_hours(self) -> OpeningHours {
        OpeningHours::daily(self.opens, self.closes).closed_on(self.closed_on)
    }
}

const WEEKEND: &[Weekday] = &[Weekday::Sat, Weekday::Sun];

/// A registry entry describing a kind of place.
#[derive(Debug, Clone, Copy)]
pub struct PlaceArchetype {
    /// Stable key, e.g. `corner_store`.
    pub key: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Categories every instance carries.
    pub categories: &'static [PlaceCategory],
    /// District tags the archetype may be placed in; empty means anywhere.
    pub eligible: &'static [DistrictTag],
    /// Relative weight when an archetype is picked at random.
    pub weight: u32,
    /// Instances that must exist.
    pub min: u32,
    /// Instances that may exist, if bounded.
    pub max: Option<u32>,
    /// Minimum graph distance (hops) between two instances.
    pub min_distance: Option<u32>,
    /// Opening schedule; `None` means always open.
    pub schedule: Option<Schedule>,
    /// Instance naming.
    pub name_fn: NameFn,
}

impl PlaceArchetype {
    /// Whether a location with these tags may hold this archetype.
    pub fn is_eligible(&self, tags: &BTreeSet<DistrictTag>) -> bool {
        self.eligible.is_empty() || self.eligible.iter().any(|t| tags.contains(t))
    }

    /// Whether at most one instance may exist.
    pub const fn is_singleton(&self) -> bool {
        matches!(self.max, Some(1))
    }

    /// Property bag for a new instance.
    pub fn props(&self) -> PlaceProps {
        PlaceProps {
            categories: self.categories.to_vec(),
            hours: self.schedule.map(Schedule::to_hours),
        }
    }
}

/// Look up an archetype by key.
pub fn find_archetype<'r>(registry: &'r [PlaceArchetype], key: &str) -> Option<&'r PlaceArchetype> {
    registry.iter().find(|a| a.key == key)
}

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

const SURNAMES: &[&str] = &[
    "Abbott", "Baker", "Carver", "Doyle", "Ellis", "Fletcher", "Grant", "Hughes", "Irwin",
    "Jensen", "Keller", "Lowe", "Moreno", "Nash", "Okafor", "Patel", "Quinn", "Reyes",
    "Sato", "Turner", "Vance", "Walsh",
];

const ADJECTIVES: &[&str] = &[
    "Blue", "Golden", "Little", "Crooked", "Copper", "Silver", "Red", "Quiet", "Lucky",
    "Humble", "Jolly", "Velvet",
];

const NOUNS: &[&str] = &[
    "Kettle", "Lantern", "Fox", "Anchor", "Crown", "Sparrow", "Oak", "Bell", "Compass",
    "Heron", "Spoon", "Thistle",
];

const SAINTS: &[&str] = &["St. Mary's", "St. Luke's", "St. Anne's", "St. Peter's", "All Saints"];

const BRANDS: &[&str] = &[
    "FreshWay",
    "Greenleaf Market",
    "ValuMart",
    "Harvest Foods",
    "Daily Basket",
];

fn pick(words: &[&'static str], rng: &mut dyn RngCore) -> &'static str {
    words.choose(rng).copied().unwrap_or("Town")
}

fn bus_stop_name(ctx: &NameContext<'_>, _rng: &mut dyn RngCore) -> String {
    format!("{} Stop", ctx.location_name)
}

fn town_hall_name(_ctx: &NameContext<'_>, _rng: &mut dyn RngCore) -> String {
    "Town Hall".to_string()
}

fn hospital_name(_ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    format!("{} Hospital", pick(SAINTS, rng))
}

fn police_name(ctx: &NameContext<'_>, _rng: &mut dyn RngCore) -> String {
    format!("{} Police Station", ctx.location_name)
}

fn supermarket_name(_ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    pick(BRANDS, rng).to_string()
}

fn station_name(_ctx: &NameContext<'_>, _rng: &mut dyn RngCore) -> String {
    "Central Station".to_string()
}

fn high_school_name(ctx: &NameContext<'_>, _rng: &mut dyn RngCore) -> String {
    format!("{} High School", ctx.location_name)
}

fn primary_school_name(_ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    format!("{} Primary School", pick(NOUNS, rng))
}

fn university_name(_ctx: &NameContext<'_>, _rng: &mut dyn RngCore) -> String {
    "Township University".to_string()
}

fn library_name(ctx: &NameContext<'_>, _rng: &mut dyn RngCore) -> String {
    if ctx.index == 0 {
        "Public Library".to_string()
    } else {
        format!("{} Library", ctx.location_name)
    }
}

fn clinic_name(_ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    format!("Dr. {}'s Clinic", pick(SURNAMES, rng))
}

fn pharmacy_name(_ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    format!("{} Pharmacy", pick(SURNAMES, rng))
}

fn corner_store_name(_ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    format!("{}'s Corner Shop", pick(SURNAMES, rng))
}

fn cafe_name(_ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    let adjective = pick(ADJECTIVES, rng);
    format!("{adjective} {} Cafe", pick(NOUNS, rng))
}

fn restaurant_name(ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    if ctx.tags.contains(&DistrictTag::Waterfront) {
        return format!("The {} Anchor", pick(ADJECTIVES, rng));
    }
    format!("{}'s Kitchen", pick(SURNAMES, rng))
}

fn pub_name(_ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    let first = pick(NOUNS, rng);
    format!("The {first} & {}", pick(NOUNS, rng))
}

fn nightclub_name(_ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    format!("Club {}", pick(NOUNS, rng))
}

fn park_name(ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    if ctx.tags.contains(&DistrictTag::Park) {
        format!("{} Common", ctx.location_name)
    } else {
        format!("{} Park", pick(NOUNS, rng))
    }
}

fn gym_name(_ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    format!("{} Fitness", pick(ADJECTIVES, rng))
}

fn office_name(_ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    format!("{} & {} Offices", pick(SURNAMES, rng), pick(SURNAMES, rng))
}

fn factory_name(_ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    format!("{} Works", pick(SURNAMES, rng))
}

fn warehouse_name(ctx: &NameContext<'_>, _rng: &mut dyn RngCore) -> String {
    format!("{} Depot {}", ctx.location_name, ctx.index.saturating_add(1))
}

fn church_name(_ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    format!("{} Church", pick(SAINTS, rng))
}

fn cemetery_name(_ctx: &NameContext<'_>, _rng: &mut dyn RngCore) -> String {
    "Old Cemetery".to_string()
}

fn harbour_name(_ctx: &NameContext<'_>, _rng: &mut dyn RngCore) -> String {
    "The Harbour".to_string()
}

fn museum_name(ctx: &NameContext<'_>, _rng: &mut dyn RngCore) -> String {
    if ctx.tags.contains(&DistrictTag::Historic) {
        "Heritage Museum".to_string()
    } else {
        "Museum of Modern Art".to_string()
    }
}

fn cinema_name(_ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    format!("The {} Picturehouse", pick(ADJECTIVES, rng))
}

fn farm_name(_ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    format!("{} Farm", pick(SURNAMES, rng))
}

fn mall_name(ctx: &NameContext<'_>, _rng: &mut dyn RngCore) -> String {
    format!("{} Shopping Centre", ctx.location_name)
}

fn laundromat_name(_ctx: &NameContext<'_>, rng: &mut dyn RngCore) -> String {
    format!("{} Suds Laundrette", pick(ADJECTIVES, rng))
}

fn fire_station_name(ctx: &NameContext<'_>, _rng: &mut dyn RngCore) -> String {
    format!("{} Fire Station", ctx.location_name)
}

// ---------------------------------------------------------------------------
// Standard registry
// ---------------------------------------------------------------------------

/// Place archetypes for a standard town.
///
/// Minimums sum to six, so even a single-location town with the default
/// capacity can seat every required archetype.
pub const STANDARD_PLACES: &[PlaceArchetype] = &[
    PlaceArchetype {
        key: BUS_STOP_KEY,
        label: "Bus Stop",
        categories: &[PlaceCategory::Transit],
        eligible: &[],
        weight: 3,
        min: 2,
        max: Some(12),
        min_distance: Some(2),
        schedule: None,
        name_fn: bus_stop_name,
    },
    PlaceArchetype {
        key: "town_hall",
        label: "Town Hall",
        categories: &[PlaceCategory::Civic],
        eligible: &[DistrictTag::Downtown, DistrictTag::Historic],
        weight: 1,
        min: 1,
        max: Some(1),
        min_distance: None,
        schedule: Some(Schedule { opens: 9, closes: 17, closed_on: WEEKEND }),
        name_fn: town_hall_name,
    },
    PlaceArchetype {
        key: "hospital",
        label: "Hospital",
        categories: &[PlaceCategory::Health],
        eligible: &[
            DistrictTag::Downtown,
            DistrictTag::Residential,
            DistrictTag::University,
            DistrictTag::Suburban,
        ],
        weight: 1,
        min: 1,
        max: Some(1),
        min_distance: None,
        schedule: None,
        name_fn: hospital_name,
    },
    PlaceArchetype {
        key: "police_station",
        label: "Police Station",
        categories: &[PlaceCategory::Civic],
        eligible: &[],
        weight: 1,
        min: 1,
        max: Some(1),
        min_distance: None,
        schedule: None,
        name_fn: police_name,
    },
    PlaceArchetype {
        key: "supermarket",
        label: "Supermarket",
        categories: &[PlaceCategory::Shop, PlaceCategory::Food],
        eligible: &[
            DistrictTag::Commercial,
            DistrictTag::Residential,
            DistrictTag::Suburban,
            DistrictTag::Downtown,
        ],
        weight: 3,
        min: 1,
        max: Some(4),
        min_distance: Some(2),
        schedule: Some(Schedule { opens: 7, closes: 22, closed_on: &[] }),
        name_fn: supermarket_name,
    },
    PlaceArchetype {
        key: "train_station",
        label: "Train Station",
        categories: &[PlaceCategory::Transit],
        eligible: &[DistrictTag::Transit, DistrictTag::Downtown, DistrictTag::Industrial],
        weight: 1,
        min: 0,
        max: Some(1),
        min_distance: None,
        schedule: Some(Schedule { opens: 5, closes: 24, closed_on: &[] }),
        name_fn: station_name,
    },
    PlaceArchetype {
        key: "high_school",
        label: "High School",
        categories: &[PlaceCategory::Education],
        eligible: &[DistrictTag::Residential, DistrictTag::Suburban],
        weight: 1,
        min: 0,
        max: Some(1),
        min_distance: None,
        schedule: Some(Schedule { opens: 8, closes: 16, closed_on: WEEKEND }),
        name_fn: high_school_name,
    },
    PlaceArchetype {
        key: "primary_school",
        label: "Primary School",
        categories: &[PlaceCategory::Education],
        eligible: &[DistrictTag::Residential, DistrictTag::Suburban],
        weight: 2,
        min: 0,
        max: Some(3),
        min_distance: Some(2),
        schedule: Some(Schedule { opens: 8, closes: 15, closed_on: WEEKEND }),
        name_fn: primary_school_name,
    },
    PlaceArchetype {
        key: "university",
        label: "University",
        categories: &[PlaceCategory::Education],
        eligible: &[DistrictTag::University],
        weight: 1,
        min: 0,
        max: Some(1),
        min_distance: None,
        schedule: Some(Schedule { opens: 7, closes: 22, closed_on: &[] }),
        name_fn: university_name,
    },
    PlaceArchetype {
        key: "library",
        label: "Library",
        categories: &[PlaceCategory::Education, PlaceCategory::Leisure],
        eligible: &[
            DistrictTag::Downtown,
            DistrictTag::Historic,
            DistrictTag::University,
            DistrictTag::Residential,
        ],
        weight: 1,
        min: 0,
        max: Some(2),
        min_distance: Some(2),
        schedule: Some(Schedule { opens: 9, closes: 20, closed_on: &[Weekday::Sun] }),
        name_fn: library_name,
    },
    PlaceArchetype {
        key: "clinic",
        label: "Clinic",
        categories: &[PlaceCategory::Health],
        eligible: &[DistrictTag::Residential, DistrictTag::Suburban, DistrictTag::Commercial],
        weight: 1,
        min: 0,
        max: Some(3),
        min_distance: None,
        schedule: Some(Schedule { opens: 8, closes: 18, closed_on: WEEKEND }),
        name_fn: clinic_name,
    },
    PlaceArchetype {
        key: "pharmacy",
        label: "Pharmacy",
        categories: &[PlaceCategory::Shop, PlaceCategory::Health],
        eligible: &[DistrictTag::Commercial, DistrictTag::Downtown, DistrictTag::Residential],
        weight: 2,
        min: 0,
        max: Some(4),
        min_distance: None,
        schedule: Some(Schedule { opens: 8, closes: 21, closed_on: &[] }),
        name_fn: pharmacy_name,
    },
    PlaceArchetype {
        key: "corner_store",
        label: "Corner Shop",
        categories: &[PlaceCategory::Shop, PlaceCategory::Food],
        eligible: &[],
        weight: 6,
        min: 0,
        max: None,
        min_distance: None,
        schedule: Some(Schedule { opens: 6, closes: 24, closed_on: &[] }),
        name_fn: corner_store_name,
    },
    PlaceArchetype {
        key: "cafe",
        label: "Cafe",
        categories: &[PlaceCategory::Food, PlaceCategory::Leisure],
        eligible: &[
            DistrictTag::Downtown,
            DistrictTag::Commercial,
            DistrictTag::University,
            DistrictTag::Historic,
            DistrictTag::Residential,
            DistrictTag::Waterfront,
        ],
        weight: 5,
        min: 0,
        max: None,
        min_distance: None,
        schedule: Some(Schedule { opens: 7, closes: 18, closed_on: &[] }),
        name_fn: cafe_name,
    },
    PlaceArchetype {
        key: "restaurant",
        label: "Restaurant",
        categories: &[PlaceCategory::Food],
        eligible: &[
            DistrictTag::Downtown,
            DistrictTag::Commercial,
            DistrictTag::Waterfront,
            DistrictTag::Historic,
            DistrictTag::Nightlife,
        ],
        weight: 4,
        min: 0,
        max: None,
        min_distance: None,
        schedule: Some(Schedule { opens: 11, closes: 23, closed_on: &[] }),
        name_fn: restaurant_name,
    },
    PlaceArchetype {
        key: "pub",
        label: "Pub",
        categories: &[PlaceCategory::Food, PlaceCategory::Nightlife],
        eligible: &[
            DistrictTag::Downtown,
            DistrictTag::Historic,
            DistrictTag::Residential,
            DistrictTag::Waterfront,
            DistrictTag::Industrial,
            DistrictTag::Rural,
        ],
        weight: 3,
        min: 0,
        max: None,
        min_distance: None,
        schedule: Some(Schedule { opens: 16, closes: 1, closed_on: &[] }),
        name_fn: pub_name,
    },
    PlaceArchetype {
        key: "nightclub",
        label: "Nightclub",
        categories: &[PlaceCategory::Nightlife],
        eligible: &[DistrictTag::Nightlife, DistrictTag::Downtown],
        weight: 2,
        min: 0,
        max: Some(2),
        min_distance: None,
        schedule: Some(Schedule {
            opens: 22,
            closes: 4,
            closed_on: &[Weekday::Mon, Weekday::Tue],
        }),
        name_fn: nightclub_name,
    },
    PlaceArchetype {
        key: "park",
        label: "Park",
        categories: &[PlaceCategory::Nature, PlaceCategory::Leisure],
        eligible: &[
            DistrictTag::Residential,
            DistrictTag::Suburban,
            DistrictTag::Park,
            DistrictTag::Waterfront,
            DistrictTag::University,
        ],
        weight: 4,
        min: 0,
        max: None,
        min_distance: None,
        schedule: None,
        name_fn: park_name,
    },
    PlaceArchetype {
        key: "gym",
        label: "Gym",
        categories: &[PlaceCategory::Leisure],
        eligible: &[
            DistrictTag::Commercial,
            DistrictTag::Downtown,
            DistrictTag::Residential,
            DistrictTag::University,
        ],
        weight: 2,
        min: 0,
        max: Some(3),
        min_distance: None,
        schedule: Some(Schedule { opens: 6, closes: 22, closed_on: &[] }),
        name_fn: gym_name,
    },
    PlaceArchetype {
        key: "office",
        label: "Office Block",
        categories: &[PlaceCategory::Work],
        eligible: &[DistrictTag::Downtown, DistrictTag::Commercial],
        weight: 3,
        min: 0,
        max: None,
        min_distance: None,
        schedule: Some(Schedule { opens: 8, closes: 18, closed_on: WEEKEND }),
        name_fn: office_name,
    },
    PlaceArchetype {
        key: "factory",
        label: "Factory",
        categories: &[PlaceCategory::Work],
        eligible: &[DistrictTag::Industrial],
        weight: 3,
        min: 0,
        max: None,
        min_distance: None,
        schedule: Some(Schedule { opens: 6, closes: 22, closed_on: WEEKEND }),
        name_fn: factory_name,
    },
    PlaceArchetype {
        key: "warehouse",
        label: "Warehouse",
        categories: &[PlaceCategory::Work],
        eligible: &[DistrictTag::Industrial, DistrictTag::Waterfront, DistrictTag::Transit],
        weight: 2,
        min: 0,
        max: Some(4),
        min_distance: None,
        schedule: Some(Schedule { opens: 6, closes: 20, closed_on: &[Weekday::Sun] }),
        name_fn: warehouse_name,
    },
    PlaceArchetype {
        key: "church",
        label: "Church",
        categories: &[PlaceCategory::Worship],
        eligible: &[
            DistrictTag::Residential,
            DistrictTag::Historic,
            DistrictTag::Suburban,
            DistrictTag::Rural,
        ],
        weight: 1,
        min: 0,
        max: Some(3),
        min_distance: Some(3),
        schedule: Some(Schedule { opens: 8, closes: 19, closed_on: &[] }),
        name_fn: church_name,
    },
    PlaceArchetype {
        key: "cemetery",
        label: "Cemetery",
        categories: &[PlaceCategory::Worship, PlaceCategory::Nature],
        eligible: &[DistrictTag::Historic, DistrictTag::Rural, DistrictTag::Suburban],
        weight: 1,
        min: 0,
        max: Some(1),
        min_distance: None,
        schedule: None,
        name_fn: cemetery_name,
    },
    PlaceArchetype {
        key: "harbour",
        label: "Harbour",
        categories: &[PlaceCategory::Work, PlaceCategory::Leisure],
        eligible: &[DistrictTag::Waterfront],
        weight: 1,
        min: 0,
        max: Some(1),
        min_distance: None,
        schedule: None,
        name_fn: harbour_name,
    },
    PlaceArchetype {
        key: "museum",
        label: "Museum",
        categories: &[PlaceCategory::Leisure, PlaceCategory::Education],
        eligible: &[DistrictTag::Historic, DistrictTag::Downtown, DistrictTag::University],
        weight: 1,
        min: 0,
        max: Some(2),
        min_distance: None,
        schedule: Some(Schedule { opens: 10, closes: 17, closed_on: &[Weekday::Mon] }),
        name_fn: museum_name,
    },
    PlaceArchetype {
        key: "cinema",
        label: "Cinema",
        categories: &[PlaceCategory::Leisure],
        eligible: &[DistrictTag::Downtown, DistrictTag::Commercial, DistrictTag::Nightlife],
        weight: 1,
        min: 0,
        max: Some(2),
        min_distance: None,
        schedule: Some(Schedule { opens: 12, closes: 24, closed_on: &[] }),
        name_fn: cinema_name,
    },
    PlaceArchetype {
        key: "farm",
        label: "Farm",
        categories: &[PlaceCategory::Work, PlaceCategory::Nature],
        eligible: &[DistrictTag::Rural],
        weight: 3,
        min: 0,
        max: Some(4),
        min_distance: None,
        schedule: None,
        name_fn: farm_name,
    },
    PlaceArchetype {
        key: "mall",
        label: "Shopping Centre",
        categories: &[PlaceCategory::Shop],
        eligible: &[DistrictTag::Commercial, DistrictTag::Suburban],
        weight: 1,
        min: 0,
        max: Some(1),
        min_distance: None,
        schedule: Some(Schedule { opens: 9, closes: 21, closed_on: &[] }),
        name_fn: mall_name,
    },
    PlaceArchetype {
        key: "laundromat",
        label: "Laundrette",
        categories: &[PlaceCategory::Shop],
        eligible: &[DistrictTag::Residential, DistrictTag::University],
        weight: 1,
        min: 0,
        max: Some(3),
        min_distance: None,
        schedule: Some(Schedule { opens: 7, closes: 22, closed_on: &[] }),
        name_fn: laundromat_name,
    },
    PlaceArchetype {
        key: "fire_station",
        label: "Fire Station",
        categories: &[PlaceCategory::Civic],
        eligible: &[],
        weight: 1,
        min: 0,
        max: Some(2),
        min_distance: Some(3),
        schedule: None,
        name_fn: fire_station_name,
    },
];
