//! Config sections, one struct per TOML table.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filesystem paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the artifact store (`objects/` and `staging/` live under it).
    /// Default: ~/.lockbox/artifacts
    #[serde(default = "PathsConfig::default_storage_dir")]
    pub storage_dir: PathBuf,
}

impl PathsConfig {
    fn default_storage_dir() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".lockbox/artifacts"))
            .unwrap_or_else(|| PathBuf::from(".lockbox/artifacts"))
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            storage_dir: Self::default_storage_dir(),
        }
    }
}

/// Credentials and sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session lifetime in seconds.
    /// Default: 86400 (24 hours)
    #[serde(default = "AuthConfig::default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// PBKDF2 iteration count for new password hashes.
    /// Default: 100000
    #[serde(default = "AuthConfig::default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,
}

impl AuthConfig {
    fn default_session_ttl_secs() -> u64 {
        24 * 60 * 60
    }

    fn default_pbkdf2_iterations() -> u32 {
        100_000
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: Self::default_session_ttl_secs(),
            pbkdf2_iterations: Self::default_pbkdf2_iterations(),
        }
    }
}

/// Artifact store behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Fsync each upload before sealing it.
    /// Default: true
    #[serde(default = "StoreConfig::default_fsync")]
    pub fsync: bool,
}

impl StoreConfig {
    fn default_fsync() -> bool {
        true
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            fsync: Self::default_fsync(),
        }
    }
}

/// Logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` string).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

/// Background session sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Seconds between sweeps. 0 disables the sweeper.
    /// Default: 300
    #[serde(default = "SweepConfig::default_interval_secs")]
    pub interval_secs: u64,
}

impl SweepConfig {
    fn default_interval_secs() -> u64 {
        300
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: Self::default_interval_secs(),
        }
    }
}
