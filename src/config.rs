//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! alarm-config.toml file. It provides a centralized way to configure the
//! location subscription, alarm defaults, storage, geocoding, and the route
//! simulator used in development mode.

use crate::provider::SubscriptionOptions;
use crate::units::Meters;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "alarm-config.toml";

/// Application configuration loaded from alarm-config.toml
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Location subscription debouncing
    pub tracking: TrackingConfig,
    /// Alarm defaults
    pub alarm: AlarmConfig,
    /// Where saved places are kept
    pub storage: StorageConfig,
    /// Reverse geocoding service
    pub geocoding: GeocodingConfig,
    /// Route replay settings for development mode
    pub simulation: SimulationConfig,
}

/// Location subscription configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Minimum time between position updates in milliseconds
    pub min_interval_ms: u64,
    /// Minimum movement between position updates in meters
    pub min_displacement_m: f64,
}

/// Alarm configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct AlarmConfig {
    /// Radius used when a zone is added without one, in meters
    pub default_radius_m: f64,
}

/// Persistence configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON file per stored key
    pub dir: String,
}

/// Reverse geocoding configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Look up an address for arrivals and the final position
    pub enabled: bool,
    /// Nominatim-compatible reverse endpoint
    pub endpoint: String,
    /// User-Agent sent with every lookup
    pub user_agent: String,
}

/// Route simulator configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Delay between replayed route points in milliseconds
    pub step_ms: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        TrackingConfig {
            min_interval_ms: 5000,
            min_displacement_m: 10.0,
        }
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        AlarmConfig {
            default_radius_m: 500.0,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            dir: "alarm-data".to_string(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        GeocodingConfig {
            enabled: false,
            endpoint: "https://nominatim.openstreetmap.org/reverse".to_string(),
            user_agent: concat!("arrival-alarm/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig { step_ms: 250 }
    }
}

impl Config {
    /// Load configuration from alarm-config.toml
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
                    info!(path = %path.display(), "loaded configuration");
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

    /// Save current configuration to the given path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }

    /// Subscription parameters for the tracking session
    pub fn subscription_options(&self) -> SubscriptionOptions {
        SubscriptionOptions {
            min_interval: Duration::from_millis(self.tracking.min_interval_ms),
            min_displacement: Meters(self.tracking.min_displacement_m),
        }
    }

    pub fn default_radius(&self) -> Meters {
        Meters(self.alarm.default_radius_m)
    }

    pub fn simulation_step(&self) -> Duration {
        Duration::from_millis(self.simulation.step_ms)
    }
}
