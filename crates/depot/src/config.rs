//! Content store configuration.
//!
//! Environment variables:
//! - `LOCKBOX_STORAGE_DIR`: Root directory for artifact bytes
//! - `LOCKBOX_FSYNC`: `0`, `false`, `no` or `off` skips fsync before sealing;
//!   `1`, `true`, `yes` or `on` keeps it. Anything else is ignored with a warning.
//!
//! Default root: `~/.lockbox/artifacts`

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::warn;

/// Configuration for the artifact content store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepotConfig {
    /// Root directory. Sealed bytes go in `{root}/objects/`, in-flight
    /// uploads in `{root}/staging/`.
    pub root: PathBuf,

    /// Whether to fsync each upload before it is sealed.
    /// Tests turn this off for speed.
    #[serde(default = "default_true")]
    pub fsync: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DepotConfig {
    fn default() -> Self {
        Self {
            root: default_storage_dir(),
            fsync: true,
        }
    }
}

/// Get the default storage root (~/.lockbox/artifacts).
fn default_storage_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".lockbox").join("artifacts"))
        .unwrap_or_else(|| PathBuf::from(".lockbox/artifacts"))
}

impl DepotConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let root = env::var("LOCKBOX_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_storage_dir());

        let fsync = match env::var("LOCKBOX_FSYNC") {
            Ok(value) => parse_flag(&value).unwrap_or_else(|| {
                warn!(value = %value, "LOCKBOX_FSYNC is not a boolean, keeping fsync on");
                true
            }),
            Err(_) => true,
        };

        Self { root, fsync }
    }

    /// Create a config with a specific root directory.
    pub fn with_root(path: impl Into<PathBuf>) -> Self {
        Self {
            root: path.into(),
            fsync: true,
        }
    }

    /// Builder: toggle fsync.
    pub fn fsync(mut self, enabled: bool) -> Self {
        self.fsync = enabled;
        self
    }

    /// Get the objects directory path.
    pub fn objects_dir(&self) -> PathBuf {
        self.root.join("objects")
    }

    /// Get the staging directory path.
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join("staging")
    }
}

/// Boolean flag spellings; `lockconf` accepts the same set for `LOCKBOX_*` flags.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
