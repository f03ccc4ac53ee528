//! Configuration loading for the mastery tracker.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.mastery/config.toml`)
//! 3. User config (`~/.mastery/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. The defaults reproduce the stock behavior:
//! a 30 day retention horizon and a 1000 event history.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FailOpen, Result, TrackerError};

/// Default retention horizon in days.
pub const RETENTION_DAYS: u32 = 30;

/// Default maximum number of failure events kept in history.
pub const MAX_RECORDS: usize = 1000;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Retention and eviction limits.
    pub retention: RetentionConfig,
    /// Background persistence behavior.
    pub persistence: PersistenceConfig,
    /// "Needs attention" view parameters.
    pub attention: AttentionConfig,
}

/// Retention and eviction limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetentionConfig {
    /// Events and records older than this many days are purged.
    pub retention_days: u32,
    /// Maximum number of failure events kept; the oldest is evicted first.
    pub max_records: usize,
}

impl RetentionConfig {
    /// Retention days must be at least one.
    pub fn is_valid_retention_days(value: u32) -> bool {
        value >= 1
    }

    /// The history must hold at least one event.
    pub fn is_valid_max_records(value: usize) -> bool {
        value >= 1
    }

    /// Retention horizon as a duration.
    pub fn horizon(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            retention_days: RETENTION_DAYS,
            max_records: MAX_RECORDS,
        }
    }
}

/// Background persistence behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Quiet period after the last mutation before state is written.
    pub debounce_ms: u64,
    /// Longest a change may wait for a write while mutations keep arriving.
    pub max_wait_ms: u64,
}

impl PersistenceConfig {
    /// Debounce window as a std duration.
    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.debounce_ms)
    }

    /// Upper bound on how long a pending change waits, never below the debounce window.
    pub fn max_wait(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.max_wait_ms.max(self.debounce_ms))
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            max_wait_ms: 1000,
        }
    }
}

/// Parameters for the "needs attention" view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AttentionConfig {
    /// Minimum failure count before an item needs attention.
    pub min_failures: u32,
    /// Only items that failed within this many days are considered.
    pub window_days: u32,
    /// Default number of items shown.
    pub limit: usize,
}

impl AttentionConfig {
    /// Attention window as a duration.
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.window_days))
    }
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            min_failures: 3,
            window_days: 7,
            limit: 10,
        }
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// Falls back to user config and env overrides when the current
    /// directory is unavailable.
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Load user config from `~/.mastery/config.toml`.
    fn load_user_config() -> Option<Config> {
        let home = mastery_home()?;
        Self::load_optional(&home.join("config.toml"))
    }

    /// Load project config from `.mastery/config.toml` in the given directory.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        Self::load_optional(&cwd.join(".mastery").join("config.toml"))
    }

    /// Load a config file if it exists, warning when it is present but invalid.
    fn load_optional(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        Self::load_from_file(path)
            .map(Some)
            .fail_open_with("loading config file", None)
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| TrackerError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| TrackerError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // MASTERY_RETENTION_DAYS
        if let Ok(val) = env::var("MASTERY_RETENTION_DAYS") {
            match val.parse::<u32>() {
                Ok(n) if RetentionConfig::is_valid_retention_days(n) => {
                    self.retention.retention_days = n;
                }
                _ => tracing::warn!(
                    "Invalid MASTERY_RETENTION_DAYS value '{}'. \
                    Expected a positive integer. Using '{}'.",
                    val,
                    self.retention.retention_days
                ),
            }
        }

        // MASTERY_MAX_RECORDS
        if let Ok(val) = env::var("MASTERY_MAX_RECORDS") {
            match val.parse::<usize>() {
                Ok(n) if RetentionConfig::is_valid_max_records(n) => {
                    self.retention.max_records = n;
                }
                _ => tracing::warn!(
                    "Invalid MASTERY_MAX_RECORDS value '{}'. \
                    Expected a positive integer. Using '{}'.",
                    val,
                    self.retention.max_records
                ),
            }
        }

        // MASTERY_DEBOUNCE_MS
        if let Ok(val) = env::var("MASTERY_DEBOUNCE_MS") {
            match val.parse::<u64>() {
                Ok(n) => self.persistence.debounce_ms = n,
                Err(_) => tracing::warn!(
                    "Invalid MASTERY_DEBOUNCE_MS value '{}'. \
                    Expected a non-negative integer. Using '{}'.",
                    val,
                    self.persistence.debounce_ms
                ),
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// Field-by-field: every non-default value in `other` wins. A layer cannot
    /// set a value back to its default to undo a lower layer's override.
    fn merge(mut self, other: Config) -> Self {
        let default_retention = RetentionConfig::default();
        if other.retention.retention_days != default_retention.retention_days
            && RetentionConfig::is_valid_retention_days(other.retention.retention_days)
        {
            self.retention.retention_days = other.retention.retention_days;
        }
        if other.retention.max_records != default_retention.max_records
            && RetentionConfig::is_valid_max_records(other.retention.max_records)
        {
            self.retention.max_records = other.retention.max_records;
        }

        let default_persistence = PersistenceConfig::default();
        if other.persistence.debounce_ms != default_persistence.debounce_ms {
            self.persistence.debounce_ms = other.persistence.debounce_ms;
        }
        if other.persistence.max_wait_ms != default_persistence.max_wait_ms {
            self.persistence.max_wait_ms = other.persistence.max_wait_ms;
        }

        let default_attention = AttentionConfig::default();
        if other.attention.min_failures != default_attention.min_failures {
            self.attention.min_failures = other.attention.min_failures;
        }
        if other.attention.window_days != default_attention.window_days {
            self.attention.window_days = other.attention.window_days;
        }
        if other.attention.limit != default_attention.limit {
            self.attention.limit = other.attention.limit;
        }

        self
    }
}

/// Get the tracker home directory.
///
/// `$MASTERY_HOME` if set and non-empty, otherwise `~/.mastery`, otherwise a
/// directory under the system temp dir.
pub fn mastery_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("MASTERY_HOME") {
        if home.is_empty() {
            tracing::warn!("MASTERY_HOME is empty, using default");
        } else {
            return Some(PathBuf::from(home));
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".mastery"));
    }

    let fallback = env::temp_dir().join("mastery");
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback.display()
    );
    Some(fallback)
}

/// Get the directory holding persisted tracker state.
///
/// Returns `<mastery_home>/state/`.
pub fn state_dir() -> Option<PathBuf> {
    mastery_home().map(|h| h.join("state"))
}
