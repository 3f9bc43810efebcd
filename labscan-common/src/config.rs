//! Configuration loading and defaults
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! The CLI/environment overlay happens in each binary's `main`; this module
//! owns the TOML layer and the defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for labscan services
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub resolver: ResolverConfig,
    pub scan: ScanConfig,
}

/// HTTP server bind settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5750,
        }
    }
}

/// Upstream location resolver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Base URL of the resolver service; the validation path is fixed
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Scan pipeline timing settings, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Debounce window between accepted scans
    pub cooldown_ms: u64,
    /// Delay before a successful validation clears the bound input
    pub success_clear_ms: u64,
    /// Delay before a debounce warning banner clears itself
    pub warning_clear_ms: u64,
    /// Inter-keystroke gap at or below which input is classified as scanner-origin
    pub burst_gap_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 500,
            success_clear_ms: 2000,
            warning_clear_ms: 3000,
            burst_gap_ms: 50,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// An explicitly given path must exist; the default path is optional and
    /// falls back to compiled defaults when absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_config_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Default configuration file path for the platform
fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("labscan").join("labscan.toml"))
        .unwrap_or_else(|| PathBuf::from("labscan.toml"))
}
