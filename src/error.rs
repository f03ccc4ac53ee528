//! Error types for the mastery tracker with fail-open handling.
//!
//! The tracker sits behind every exercise screen, so none of its failures may
//! interrupt a learning session. Persistence and configuration problems are
//! logged and replaced with safe defaults instead of being propagated to the
//! exercise engines.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for tracker operations.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// I/O errors from state file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// A persisted document exists but cannot be decoded.
    #[error("corrupt state in '{key}': {message}")]
    CorruptState { key: String, message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// The background persistence worker is unavailable.
    #[error("persistence worker error: {message}")]
    Worker { message: String },
}

/// A specialized Result type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Coarse classification of errors, used when deciding how to recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Stored state is missing, unreadable or malformed. Treated as "no prior state".
    PersistenceRead,
    /// Saving state failed. In-memory state stays authoritative.
    PersistenceWrite,
    /// Configuration could not be loaded. Defaults apply.
    Configuration,
}

impl TrackerError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a corrupt state error for a persisted document.
    pub fn corrupt_state(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptState {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a worker error.
    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }

    /// Map this error onto the recovery taxonomy.
    ///
    /// Storage and serialization errors are read-side by default; callers on
    /// the save path classify their own failures as writes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage { .. } | Self::Serde { .. } | Self::CorruptState { .. } => {
                ErrorKind::PersistenceRead
            }
            Self::Worker { .. } => ErrorKind::PersistenceWrite,
            Self::Config { .. } => ErrorKind::Configuration,
        }
    }
}

impl From<io::Error> for TrackerError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Log the error and hand back a safe value so the caller can keep going.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Exit codes for the `mastery` binary.
pub mod exit_codes {
    /// Command completed, or failed in a way that was logged and skipped.
    pub const SUCCESS: i32 = 0;

    /// Command could not do what was asked (bad input, unknown item).
    pub const ERROR: i32 = 1;

    /// Panic (fail-open, caller should carry on).
    pub const CRASH: i32 = 3;
}
