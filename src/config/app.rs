//! Main application configuration
//!
//! This module defines the configuration structures for the ranker, including
//! TOML file and environment variable loading and validation.

use crate::matchmaking::MatchmakingConfig;
use crate::rating::EloSettings;
use crate::store::DEFAULT_SNAPSHOT_PATH;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub store: StoreSettings,
    pub rating: EloSettings,
    pub matchmaking: MatchmakingSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Snapshot persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Path of the JSON snapshot
    pub snapshot_path: PathBuf,
}

/// Pair selection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingSettings {
    /// Proximity threshold and exploration rate, read from the same table
    #[serde(flatten)]
    pub pairing: MatchmakingConfig,
    /// Fixed RNG seed for reproducible sessions
    pub seed: Option<u64>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "pokemon-ranker".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("Invalid {} value: {}", name, value)),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate TOML configuration text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(path) = env::var("SNAPSHOT_PATH") {
            self.store.snapshot_path = PathBuf::from(path);
        }
        if let Some(k_factor) = parse_var("K_FACTOR")? {
            self.rating.k_factor = k_factor;
        }
        if let Some(initial_rating) = parse_var("INITIAL_RATING")? {
            self.rating.initial_rating = initial_rating;
        }
        if let Some(threshold) = parse_var("PROXIMITY_THRESHOLD")? {
            self.matchmaking.pairing.proximity_threshold = threshold;
        }
        if let Some(rate) = parse_var("EXPLORATION_RATE")? {
            self.matchmaking.pairing.exploration_rate = rate;
        }
        if let Some(seed) = parse_var("MATCHMAKING_SEED")? {
            self.matchmaking.seed = Some(seed);
        }
        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.store.snapshot_path.as_os_str().is_empty() {
        return Err(anyhow!("Snapshot path cannot be empty"));
    }

    config.rating.validate()?;
    config.matchmaking.pairing.validate()?;

    Ok(())
}
