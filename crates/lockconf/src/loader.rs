//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, LockConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/lockbox/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("lockbox/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("lockbox.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a TOML file and apply the keys it sets on top of `config`.
pub fn apply_file(config: &mut LockConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, &path.display().to_string())
}

/// Apply a TOML document on top of `config`.
///
/// Only keys present in the document change; everything else keeps the
/// value from earlier layers. Unknown tables and keys are ignored.
pub(crate) fn apply_toml(
    config: &mut LockConfig,
    contents: &str,
    origin: &str,
) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: PathBuf::from(origin),
        message: e.to_string(),
    })?;

    if let Some(paths) = Section::get(&table, "paths", origin) {
        if let Some(v) = paths.string("storage_dir")? {
            config.paths.storage_dir = expand_path(v);
        }
    }

    if let Some(auth) = Section::get(&table, "auth", origin) {
        if let Some(v) = auth.integer("session_ttl_secs")? {
            config.auth.session_ttl_secs = v;
        }
        if let Some(v) = auth.integer("pbkdf2_iterations")? {
            config.auth.pbkdf2_iterations = v;
        }
    }

    if let Some(store) = Section::get(&table, "store", origin) {
        if let Some(v) = store.boolean("fsync")? {
            config.store.fsync = v;
        }
    }

    if let Some(telemetry) = Section::get(&table, "telemetry", origin) {
        if let Some(v) = telemetry.string("log_level")? {
            config.telemetry.log_level = v.to_string();
        }
    }

    if let Some(sweep) = Section::get(&table, "sweep", origin) {
        if let Some(v) = sweep.integer("interval_secs")? {
            config.sweep.interval_secs = v;
        }
    }

    Ok(())
}

/// Typed access to one TOML table, reporting bad values with their key.
struct Section<'a> {
    name: &'static str,
    table: &'a toml::Table,
    origin: &'a str,
}

impl<'a> Section<'a> {
    fn get(root: &'a toml::Table, name: &'static str, origin: &'a str) -> Option<Self> {
        root.get(name)
            .and_then(|v| v.as_table())
            .map(|table| Self {
                name,
                table,
                origin,
            })
    }

    fn invalid(&self, key: &str, message: impl Into<String>) -> ConfigError {
        ConfigError::Invalid {
            origin: self.origin.to_string(),
            key: format!("{}.{}", self.name, key),
            message: message.into(),
        }
    }

    fn string(&self, key: &str) -> Result<Option<&'a str>, ConfigError> {
        match self.table.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(Some)
                .ok_or_else(|| self.invalid(key, "expected a string")),
        }
    }

    fn integer<T: TryFrom<i64>>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.table.get(key) {
            None => Ok(None),
            Some(v) => {
                let n = v
                    .as_integer()
                    .ok_or_else(|| self.invalid(key, "expected an integer"))?;
                T::try_from(n)
                    .map(Some)
                    .map_err(|_| self.invalid(key, format!("{n} is out of range")))
            }
        }
    }

    fn boolean(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.table.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_bool()
                .map(Some)
                .ok_or_else(|| self.invalid(key, "expected true or false")),
        }
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(
    config: &mut LockConfig,
    sources: &mut ConfigSources,
) -> Result<(), ConfigError> {
    apply_overrides_with(config, sources, |key| env::var(key).ok())
}

/// Apply overrides read through `lookup`. `apply_env_overrides` passes the
/// process environment.
pub(crate) fn apply_overrides_with(
    config: &mut LockConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(v) = lookup("LOCKBOX_STORAGE_DIR") {
        config.paths.storage_dir = expand_path(&v);
        sources.env_overrides.push("LOCKBOX_STORAGE_DIR".to_string());
    }

    if let Some(v) = lookup("LOCKBOX_SESSION_TTL_SECS") {
        config.auth.session_ttl_secs = parse_env("LOCKBOX_SESSION_TTL_SECS", &v)?;
        sources.env_overrides.push("LOCKBOX_SESSION_TTL_SECS".to_string());
    }
    if let Some(v) = lookup("LOCKBOX_PBKDF2_ITERATIONS") {
        config.auth.pbkdf2_iterations = parse_env("LOCKBOX_PBKDF2_ITERATIONS", &v)?;
        sources.env_overrides.push("LOCKBOX_PBKDF2_ITERATIONS".to_string());
    }

    if let Some(v) = lookup("LOCKBOX_FSYNC") {
        config.store.fsync = parse_flag("LOCKBOX_FSYNC", &v)?;
        sources.env_overrides.push("LOCKBOX_FSYNC".to_string());
    }

    if let Some(v) = lookup("LOCKBOX_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("LOCKBOX_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    if let Some(v) = lookup("LOCKBOX_SWEEP_INTERVAL_SECS") {
        config.sweep.interval_secs = parse_env("LOCKBOX_SWEEP_INTERVAL_SECS", &v)?;
        sources.env_overrides.push("LOCKBOX_SWEEP_INTERVAL_SECS".to_string());
    }

    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        origin: "environment".to_string(),
        key: key.to_string(),
        message: format!("cannot parse {value:?}"),
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            origin: "environment".to_string(),
            key: key.to_string(),
            message: format!("expected a boolean, got {value:?}"),
        }),
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}
