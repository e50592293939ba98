//! Layered configuration for the reminder core.
//!
//! Sources in priority order (highest wins):
//! 1. Environment variables (`GEOREMIND_*`, `__` separates nested keys, so
//!    `GEOREMIND_GEOFENCE__RADIUS_METERS` maps to `geofence.radius_meters`)
//! 2. An optional TOML file supplied by the caller
//! 3. Built-in defaults
//!
//! # Invariants
//! - Loading never touches the database or the logger.
//! - Geofence settings are validated when converted into a policy.

use crate::logging::default_log_level;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const ENV_PREFIX: &str = "GEOREMIND_";
const DEFAULT_DB_FILE_NAME: &str = "georemind.sqlite3";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Extract(#[from] Box<figment::Error>),
    #[error("invalid geofence configuration: {0}")]
    InvalidGeofence(String),
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Extract(Box::new(value))
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CoreConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub geofence: GeofenceConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files. Logging stays off when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

/// Raw geofence policy knobs; see `GeofencePolicy` for the validated form.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeofenceConfig {
    pub radius_meters: f64,
    pub loitering_delay_secs: u64,
    /// Also report exit transitions. The pipeline ignores them today.
    pub include_exit: bool,
    /// Region lifetime in hours; unset means regions never expire.
    pub expiry_hours: Option<u64>,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            radius_meters: 100.0,
            loitering_delay_secs: 30,
            include_exit: false,
            expiry_hours: None,
        }
    }
}

impl CoreConfig {
    /// Loads configuration from defaults, an optional TOML file, and env.
    ///
    /// A missing file is skipped rather than treated as an error.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(Self::figment(file).extract()?)
    }

    /// Builds the provider chain. Public so callers can layer more sources.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
