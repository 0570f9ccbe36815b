//! Configuration loading for Lockbox.
//!
//! # Usage
//!
//! ```rust,no_run
//! use lockconf::LockConfig;
//!
//! let (config, sources) = LockConfig::load_with_sources().expect("Failed to load config");
//!
//! println!("Storage dir: {}", config.paths.storage_dir.display());
//! println!("Session TTL: {}s", config.auth.session_ttl_secs);
//! for file in &sources.files {
//!     println!("Loaded {}", file.display());
//! }
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/lockbox/config.toml` (system)
//! 2. `~/.config/lockbox/config.toml` (user)
//! 3. `./lockbox.toml` (local override, or an explicit path)
//! 4. Environment variables (`LOCKBOX_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! storage_dir = "~/.lockbox/artifacts"
//!
//! [auth]
//! session_ttl_secs = 86400
//! pbkdf2_iterations = 100000
//!
//! [store]
//! fsync = true
//!
//! [telemetry]
//! log_level = "info"
//!
//! [sweep]
//! interval_secs = 300
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use sections::{AuthConfig, PathsConfig, StoreConfig, SweepConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key} in {origin}: {message}")]
    Invalid {
        origin: String,
        key: String,
        message: String,
    },

    #[error("Failed to serialize config: {message}")]
    Serialize { message: String },
}

/// Complete Lockbox configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LockConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub sweep: SweepConfig,
}

impl LockConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/lockbox/config.toml`
    /// 3. `~/.config/lockbox/config.toml`
    /// 4. `./lockbox.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with an explicit file in place of `./lockbox.toml`.
    /// System and user configs still load first.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and return information about sources.
    pub fn load_with_sources() -> Result<(Self, ConfigSources), ConfigError> {
        Self::load_with_sources_from(None)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = LockConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::apply_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources)?;

        Ok((config, sources))
    }

    /// Session lifetime as a `Duration`.
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.auth.session_ttl_secs)
    }

    /// Sweep period, or `None` when the sweeper is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep.interval_secs > 0).then(|| Duration::from_secs(self.sweep.interval_secs))
    }

    /// Serialize config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let body = toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            message: e.to_string(),
        })?;
        Ok(format!("# Lockbox Configuration\n\n{body}"))
    }
}
