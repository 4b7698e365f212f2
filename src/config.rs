//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.recogate/config.toml` (user)
//! 3. `/etc/recogate/config.toml` (system)
//!
//! When no file exists at the implicit locations the built-in defaults are
//! used. An explicit path that does not exist is an error.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::TierPolicy;
use crate::providers::jikan::DEFAULT_BASE_URL;
use crate::{GatewayError, Result};

/// Gateway configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Upstream API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the Jikan API (default: the public v4 endpoint).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 10).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    10
}

/// Shared store settings. Without `redis_url` an in-process store is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Entry cap for the in-process store.
    #[serde(default)]
    pub max_entries: Option<u64>,
}

/// Cache timing and tier thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_hotness_window")]
    pub hotness_window_secs: u64,
    #[serde(default = "default_lookup_ttl")]
    pub lookup_ttl_secs: u64,
    #[serde(default)]
    pub tiers: TierPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            hotness_window_secs: default_hotness_window(),
            lookup_ttl_secs: default_lookup_ttl(),
            tiers: TierPolicy::default(),
        }
    }
}

fn default_hotness_window() -> u64 {
    60
}

fn default_lookup_ttl() -> u64 {
    10_000
}

impl Config {
    /// Load configuration from the standard locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| GatewayError::Configuration(format!("Failed to parse config: {e}")))
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GatewayError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            GatewayError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path, `None` when no implicit file exists.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(GatewayError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".recogate").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/recogate/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}
