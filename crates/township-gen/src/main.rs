//! Township map generator.
//!
//! Generates one town and writes it to stdout as JSON. Logs go to stderr.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from the first argument, else `township-config.yaml`,
//!    else defaults
//! 3. Apply the `TOWNSHIP_SEED` override
//! 4. Generate the map and write it out

mod error;

use std::io::Write;
use std::path::{Path, PathBuf};

use township_world::{GenerationConfig, WorldMap};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::GenError;

/// Default config file, looked up in the working directory.
const DEFAULT_CONFIG_PATH: &str = "township-config.yaml";

fn main() -> Result<(), GenError> {
    init_tracing();
    info!("township-gen starting");

    let mut config = load_config(std::env::args_os().nth(1).map(PathBuf::from))?;
    if let Ok(raw) = std::env::var("TOWNSHIP_SEED") {
        config.seed = raw
            .trim()
            .parse()
            .map_err(|source| GenError::InvalidSeed {
                value: raw.clone(),
                source,
            })?;
    }
    info!(
        seed = config.seed,
        density = config.density,
        locations = config.resolved_location_count(),
        "Configuration loaded"
    );

    let map = WorldMap::generate(&config)?;
    info!(
        locations = map.location_count(),
        streets = map.streets().len(),
        street_names = map.street_names().len(),
        places = map.places().len(),
        connected = map.is_connected(),
        "Map generated"
    );

    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &map.snapshot())?;
    writeln!(out).map_err(serde_json::Error::io)?;
    Ok(())
}

/// Install the fmt subscriber; `TOWNSHIP_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if std::env::var("TOWNSHIP_LOG_JSON").is_ok_and(|v| v == "1") {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load the generation config.
///
/// An explicit path must exist; the default path is optional.
fn load_config(explicit: Option<PathBuf>) -> Result<GenerationConfig, GenError> {
    if let Some(path) = explicit {
        return Ok(GenerationConfig::from_file(&path)?);
    }
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        Ok(GenerationConfig::from_file(default_path)?)
    } else {
        info!("Config file not found, using defaults");
        Ok(GenerationConfig::default())
    }
}
