//! Loading [`CacheConfig`] from an INI file.
//!
//! Only the `[map_cache]` section is read; other sections belong to the host
//! application and are ignored.
//!
//! ```ini
//! [map_cache]
//! tile_zoom = 16
//! max_tiles = 64
//! initial_capacity = 50000
//! ```

use ini::Ini;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use super::CacheConfig;

/// Section name read by [`CacheConfig::load_from`].
pub const SECTION: &str = "map_cache";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl CacheConfig {
    /// Load configuration from an INI file.
    ///
    /// If the file doesn't exist, returns defaults. Keys missing from the
    /// section keep their default value.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(content).map_err(ini::Error::Parse)?;
        parse_ini(&ini)
    }
}

/// Starts from `CacheConfig::default()` and overlays any values found in the INI.
fn parse_ini(ini: &Ini) -> Result<CacheConfig, ConfigFileError> {
    let mut config = CacheConfig::default();

    if let Some(section) = ini.section(Some(SECTION)) {
        if let Some(v) = section.get("tile_zoom") {
            config.tile_zoom = parse_value(v, "tile_zoom", "expected a zoom level like 16")?;
        }
        if let Some(v) = section.get("max_tiles") {
            config.max_tiles = parse_value(v, "max_tiles", "expected a positive tile count")?;
        }
        if let Some(v) = section.get("initial_capacity") {
            config.initial_capacity =
                parse_value(v, "initial_capacity", "expected an entry count")?;
        }
    }

    config
        .validate()
        .map_err(|e| ConfigFileError::InvalidValue {
            section: SECTION.to_string(),
            key: "*".to_string(),
            value: format!(
                "tile_zoom={} max_tiles={}",
                config.tile_zoom, config.max_tiles
            ),
            reason: e.to_string(),
        })?;

    Ok(config)
}

fn parse_value<T: FromStr>(value: &str, key: &str, reason: &str) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigFileError::InvalidValue {
            section: SECTION.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        })
}
