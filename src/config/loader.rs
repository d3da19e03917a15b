//! Configuration file loading with precedence handling.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file path contains invalid UTF-8 or cannot be resolved.
    #[error("Invalid config path: {0}")]
    InvalidPath(String),

    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/cmv/config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Directory the capture process writes `.eml` files into.
    #[serde(default)]
    pub spool_dir: Option<PathBuf>,

    /// Scratch directory for rendered HTML artifacts.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Whether arrival notifications are shown.
    #[serde(default)]
    pub notifications: Option<bool>,

    /// Filesystem watch debounce in milliseconds.
    #[serde(default)]
    pub watch_debounce_ms: Option<u64>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Spool directory to watch.
    pub spool_dir: PathBuf,
    /// Scratch directory for rendered artifacts.
    pub scratch_dir: PathBuf,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
    /// Arrival notifications enabled.
    pub notifications: bool,
    /// Watch debounce in milliseconds.
    pub watch_debounce_ms: u64,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            spool_dir: default_spool_dir(),
            scratch_dir: default_scratch_dir(),
            log_file_path: default_log_path(),
            notifications: true,
            watch_debounce_ms: 200,
        }
    }
}

/// Resolve the default spool directory.
///
/// Returns `~/.local/share/cmv/spool` on Unix-like systems, the
/// platform-appropriate data directory elsewhere. Falls back to a relative
/// `spool` directory when no data directory can be determined.
pub fn default_spool_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("cmv").join("spool")
    } else {
        PathBuf::from("spool")
    }
}

/// Resolve the default scratch directory for rendered artifacts.
///
/// Artifacts are regenerated on every render, so a cache directory is the
/// right home. Falls back to the OS temp directory.
pub fn default_scratch_dir() -> PathBuf {
    if let Some(cache_dir) = dirs::cache_dir() {
        cache_dir.join("cmv").join("render")
    } else {
        std::env::temp_dir().join("cmv_render")
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/cmv/cmv.log` on Unix-like systems, or the
/// appropriate platform path elsewhere. If the state directory cannot be
/// determined, falls back to the current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("cmv").join("cmv.log")
    } else {
        PathBuf::from("cmv.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if the file doesn't exist (not an error - use
/// defaults). Returns `Err` if the file exists but cannot be read or parsed.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    // Missing file is not an error - use defaults
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/cmv/config.toml` on Unix, appropriate path on other
/// platforms. Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cmv").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (like CLI `--config`)
/// 2. `CMV_CONFIG` environment variable
/// 3. Default path `~/.config/cmv/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    // 1. Explicit path (like CLI --config)
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    // 2. CMV_CONFIG environment variable
    if let Ok(env_path) = std::env::var("CMV_CONFIG") {
        return load_config_file(PathBuf::from(env_path));
    }

    // 3. Default path
    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use
/// the default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        spool_dir: config.spool_dir.unwrap_or(defaults.spool_dir),
        scratch_dir: config.scratch_dir.unwrap_or(defaults.scratch_dir),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
        notifications: config.notifications.unwrap_or(defaults.notifications),
        watch_debounce_ms: config
            .watch_debounce_ms
            .unwrap_or(defaults.watch_debounce_ms),
    }
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `CMV_SPOOL_DIR`: Override spool directory
/// - `CMV_SCRATCH_DIR`: Override scratch directory
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(spool) = std::env::var("CMV_SPOOL_DIR") {
        config.spool_dir = PathBuf::from(spool);
    }

    if let Ok(scratch) = std::env::var("CMV_SCRATCH_DIR") {
        config.scratch_dir = PathBuf::from(scratch);
    }

    config
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only applies overrides for flags that were explicitly set by the user.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    spool_override: Option<PathBuf>,
    scratch_override: Option<PathBuf>,
    notifications_override: Option<bool>,
) -> ResolvedConfig {
    if let Some(spool) = spool_override {
        config.spool_dir = spool;
    }

    if let Some(scratch) = scratch_override {
        config.scratch_dir = scratch;
    }

    if let Some(notifications) = notifications_override {
        config.notifications = notifications;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
