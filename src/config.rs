use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Result, ScheduleError};
use crate::models::RawSchedule;

/// Files picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["rotation.yaml", "rotation.yml"];

/// Load schedule settings from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RawSchedule> {
    let path = path.as_ref();
    info!("Loading schedule configuration from: {}", path.display());

    let contents = fs::read_to_string(path).map_err(|source| ScheduleError::ConfigRead {
        path: path.display().to_string(),
        source,
    })?;

    // An empty file means "all defaults"
    if contents.trim().is_empty() {
        return Ok(RawSchedule::default());
    }

    serde_yaml::from_str(&contents).map_err(|source| ScheduleError::ConfigParse {
        path: path.display().to_string(),
        source,
    })
}

/// Load schedule settings with fallback options.
///
/// An explicit path must load. Otherwise `CONFIG_PATH` and then the default
/// file names are tried; failures there are logged and skipped. `Ok(None)`
/// means no file was found and built-in defaults apply.
pub fn load_config_with_fallback(explicit: Option<&Path>) -> Result<Option<RawSchedule>> {
    let candidates: Vec<PathBuf> = DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from).collect();
    load_first(explicit, std::env::var("CONFIG_PATH").ok(), &candidates)
}

fn load_first(
    explicit: Option<&Path>,
    env_path: Option<String>,
    candidates: &[PathBuf],
) -> Result<Option<RawSchedule>> {
    if let Some(path) = explicit {
        return load_config(path).map(Some);
    }

    if let Some(config_path) = env_path {
        match load_config(&config_path) {
            Ok(config) => return Ok(Some(config)),
            Err(e) => warn!("Failed to load config from CONFIG_PATH ({}): {}", config_path, e),
        }
    }

    for path in candidates {
        if path.exists() {
            match load_config(path) {
                Ok(config) => return Ok(Some(config)),
                Err(e) => warn!("Failed to load config from '{}': {}", path.display(), e),
            }
        }
    }

    info!("No schedule configuration file found, using flags and built-in defaults");
    Ok(None)
}
