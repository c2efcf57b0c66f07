//! Type-safe identifier wrappers around dense arena indices.
//!
//! Locations, places, and streets live in contiguous vectors owned by the
//! world map. Each identifier is the position of its entity in that vector,
//! so lookups are plain index operations and the graph carries no
//! ownership cycles.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around a `u32` arena index with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Create an identifier from a raw index value.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Create an identifier from a vector position.
            ///
            /// Returns `None` if the position does not fit in a `u32`.
            pub fn from_index(index: usize) -> Option<Self> {
                u32::try_from(index).ok().map(Self)
            }

            /// Return the vector position this identifier refers to.
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Return the inner raw value.
            pub const fn into_inner(self) -> u32 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier for a location (node in the map graph).
    LocationId
}

define_id! {
    /// Identifier for a place (point of interest owned by a location).
    PlaceId
}

define_id! {
    /// Identifier for an undirected street segment (edge in the map graph).
    ///
    /// Both directed [`Street`](crate::Street) records backing a segment
    /// carry the same `StreetId`.
    StreetId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trip() {
        let id = LocationId::from_index(7);
        assert_eq!(id, Some(LocationId::new(7)));
        assert_eq!(id.map(LocationId::index), Some(7));
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&PlaceId::new(12)).unwrap_or_default();
        assert_eq!(json, "12");
    }

    #[test]
    fn display_shows_raw_value() {
        assert_eq!(StreetId::new(3).to_string(), "3");
    }
}
