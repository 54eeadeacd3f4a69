//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the cycle-config.toml file.
//! It provides a centralized way to configure the CityBikes API endpoint, search defaults,
//! input validation rules, and an optional fixed "current location".

use crate::ranking::DEFAULT_MAX_RESULTS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "cycle-config.toml";

/// Application configuration loaded from cycle-config.toml
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// CityBikes API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Defaults applied to a new search
    #[serde(default)]
    pub search: SearchConfig,
    /// Coordinate text input rules
    #[serde(default)]
    pub input: InputConfig,
    /// Fixed position used by "use current location"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationConfig>,
}

/// CityBikes API configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API root, without a trailing slash
    pub base_url: String,
    /// How long the provider list stays valid on disk
    pub provider_cache_ttl_minutes: u64,
    /// Where the provider list is cached
    pub cache_path: String,
}

/// Search defaults
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Provider selected at startup, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
    pub max_results: usize,
    pub min_free_bikes: u32,
}

/// Coordinate input rules
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    /// Maximum decimal places accepted in a coordinate box
    pub decimal_places: usize,
    /// Restrict longitude to ±90 and two integer digits, as the first
    /// release of the web form did. Off by default since real longitudes
    /// reach ±180.
    pub legacy_longitude_bounds: bool,
}

/// A fixed position standing in for device geolocation
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: "http://api.citybik.es/v2".to_string(),
            provider_cache_ttl_minutes: 60,
            cache_path: "/tmp/cycle_providers.json".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            default_provider: None,
            max_results: DEFAULT_MAX_RESULTS,
            min_free_bikes: 0,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            decimal_places: 8,
            legacy_longitude_bounds: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig::default(),
            search: SearchConfig::default(),
            input: InputConfig::default(),
            location: None,
        }
    }
}

impl Config {
    /// Load configuration from cycle-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), api = %config.api.base_url, "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save current configuration to cycle-config.toml
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(CONFIG_FILE)
    }

    /// Save current configuration to the given path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}
