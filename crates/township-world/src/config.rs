//! Generation configuration and its YAML loader.
//!
//! A [`GenerationConfig`] fully determines a generated map: the same config
//! always reproduces the same locations, streets, and places. Every field has
//! a default, so an empty YAML document is a valid config.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Options controlling map generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Seed for the generator's random stream.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Overall density in `[0, 1]`.
    ///
    /// Governs how many places each location aims for, how aggressively
    /// supplementary streets are added, and how long street runs grow.
    #[serde(default = "default_density")]
    pub density: f64,

    /// Width of the layout canvas.
    #[serde(default = "default_map_width")]
    pub map_width: f64,

    /// Height of the layout canvas.
    #[serde(default = "default_map_height")]
    pub map_height: f64,

    /// Number of locations; derived from `density` when absent.
    #[serde(default)]
    pub location_count: Option<usize>,

    /// Maximum number of places a single location may hold.
    #[serde(default = "default_location_capacity")]
    pub location_capacity: u32,
}

impl GenerationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// A default config with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// The number of locations to generate.
    pub fn resolved_location_count(&self) -> usize {
        self.location_count.unwrap_or_else(|| {
            let extra = (self.density.clamp(0.0, 1.0) * 10.0).round() as usize;
            14_usize.saturating_add(extra)
        })
    }

    /// Check that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EmptyWorld`] for a zero location count and
    /// [`WorldError::InvalidConfig`] for any other out-of-range value.
    pub fn validate(&self) -> Result<(), WorldError> {
        if !(0.0..=1.0).contains(&self.density) {
            return Err(WorldError::InvalidConfig(format!(
                "density must be within [0, 1], got {}",
                self.density
            )));
        }
        if !self.map_width.is_finite() || self.map_width <= 0.0 {
            return Err(WorldError::InvalidConfig(format!(
                "map_width must be positive, got {}",
                self.map_width
            )));
        }
        if !self.map_height.is_finite() || self.map_height <= 0.0 {
            return Err(WorldError::InvalidConfig(format!(
                "map_height must be positive, got {}",
                self.map_height
            )));
        }
        if self.location_capacity == 0 {
            return Err(WorldError::InvalidConfig(
                "location_capacity must be at least 1".to_string(),
            ));
        }
        if self.resolved_location_count() == 0 {
            return Err(WorldError::EmptyWorld);
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            density: default_density(),
            map_width: default_map_width(),
            map_height: default_map_height(),
            location_count: None,
            location_capacity: default_location_capacity(),
        }
    }
}

const fn default_seed() -> u64 {
    42
}

const fn default_density() -> f64 {
    0.5
}

const fn default_map_width() -> f64 {
    1000.0
}

const fn default_map_height() -> f64 {
    800.0
}

const fn default_location_capacity() -> u32 {
    6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = GenerationConfig::parse("").ok();
        assert_eq!(config, Some(GenerationConfig::default()));
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = GenerationConfig::parse("seed: 7\ndensity: 0.25\n").ok();
        assert!(config.is_some());
        let config = config.unwrap_or_default();
        assert_eq!(config.seed, 7);
        assert!((config.density - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.location_capacity, 6);
        assert_eq!(config.location_count, None);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let result = GenerationConfig::parse("seed: [not a number");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn location_count_derives_from_density() {
        let mut config = GenerationConfig::default();
        config.density = 0.0;
        assert_eq!(config.resolved_location_count(), 14);
        config.density = 1.0;
        assert_eq!(config.resolved_location_count(), 24);
        config.location_count = Some(3);
        assert_eq!(config.resolved_location_count(), 3);
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let mut config = GenerationConfig::default();
        assert!(config.validate().is_ok());

        config.density = 1.5;
        assert!(matches!(config.validate(), Err(WorldError::InvalidConfig(_))));

        config.density = 0.5;
        config.map_width = 0.0;
        assert!(matches!(config.validate(), Err(WorldError::InvalidConfig(_))));

        config.map_width = 100.0;
        config.location_capacity = 0;
        assert!(matches!(config.validate(), Err(WorldError::InvalidConfig(_))));

        config.location_capacity = 4;
        config.location_count = Some(0);
        assert!(matches!(config.validate(), Err(WorldError::EmptyWorld)));
    }
}
