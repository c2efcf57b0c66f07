//! Save format: generation config plus a replay log of runtime placements.
//!
//! A generated map is never serialized directly. Loading regenerates it from
//! the recorded [`GenerationConfig`] and then replays every runtime
//! `create_place_at` call in order, which reproduces identical place ids.

use serde::{Deserialize, Serialize};
use township_types::{LocationId, PlaceId, PlaceSpec};

use crate::config::{ConfigError, GenerationConfig};

/// One successful runtime placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    /// Where the place was created.
    pub location: LocationId,
    /// The request as it was made.
    pub spec: PlaceSpec,
    /// The id the place received.
    pub place: PlaceId,
}

/// Everything needed to rebuild a world.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldSave {
    /// The generation config.
    pub config: GenerationConfig,
    /// Runtime placements, in the order they happened.
    #[serde(default)]
    pub placements: Vec<PlacementRecord>,
}

impl WorldSave {
    /// Render as YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yml::to_string(self)?)
    }

    /// Parse from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use township_types::PlaceCategory;

    use super::*;

    #[test]
    fn yaml_keeps_the_log_in_order() {
        let save = WorldSave {
            config: GenerationConfig::with_seed(9),
            placements: vec![
                PlacementRecord {
                    location: LocationId::new(3),
                    spec: PlaceSpec {
                        key: "home".to_string(),
                        name: Some("Ada's Home".to_string()),
                        categories: vec![PlaceCategory::Home],
                        hours: None,
                    },
                    place: PlaceId::new(40),
                },
                PlacementRecord {
                    location: LocationId::new(1),
                    spec: PlaceSpec::keyed("kiosk"),
                    place: PlaceId::new(41),
                },
            ],
        };
        let yaml = save.to_yaml().unwrap();
        assert_eq!(WorldSave::from_yaml(&yaml).unwrap(), save);
    }

    #[test]
    fn missing_log_means_no_placements() {
        let save = WorldSave::from_yaml("config:\n  seed: 5\n").unwrap();
        assert_eq!(save.config.seed, 5);
        assert!(save.placements.is_empty());
    }
}
