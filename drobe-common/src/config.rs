//! Configuration file resolution and loading
//!
//! Config file resolution follows a fixed priority order:
//! 1. Explicit path argument (highest priority)
//! 2. `DROBE_CONFIG` environment variable
//! 3. Platform config dir (`~/.config/drobe/config.toml` on Linux)
//!
//! Callers deserialize the resolved file into their own section structs;
//! a missing file is not an error, it means compiled defaults apply.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Environment variable naming an explicit config file path
pub const CONFIG_ENV_VAR: &str = "DROBE_CONFIG";

/// Resolve the configuration file path, if any exists.
///
/// Returns `None` when no config file is present anywhere in the priority
/// chain; callers fall back to compiled defaults in that case.
pub fn resolve_config_file(explicit: Option<&str>) -> Option<PathBuf> {
    // Priority 1: explicit path from the caller
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    // Priority 2: environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: platform config directory
    let candidate = dirs::config_dir().map(|d| d.join("drobe").join("config.toml"))?;
    if candidate.exists() {
        Some(candidate)
    } else {
        None
    }
}

/// Load and deserialize a TOML config file into `T`.
///
/// Returns `Ok(None)` when `path` is `None` (no file found, use defaults).
pub fn load_toml<T: DeserializeOwned>(path: Option<PathBuf>) -> Result<Option<T>> {
    let Some(path) = path else {
        return Ok(None);
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    let parsed = toml::from_str::<T>(&content)
        .map_err(|e| Error::Config(format!("Cannot parse {}: {}", path.display(), e)))?;

    tracing::debug!(path = %path.display(), "Loaded configuration file");

    Ok(Some(parsed))
}

/// Platform data directory for drobe (suggestion database, caches).
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("drobe"))
        .unwrap_or_else(|| PathBuf::from("./drobe_data"))
}
