//! File-based state storage.
//!
//! Each document is stored as `<dir>/<key>.json`. Atomic writes are achieved
//! via temp file + rename.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::state_dir;
use crate::error::{Result, TrackerError};
use crate::storage::StateStore;

/// File-based state storage.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    /// Directory where documents are stored.
    dir: PathBuf,
}

impl FileStateStore {
    /// Create a store in the default state directory.
    ///
    /// Uses `~/.mastery/state/` or `$MASTERY_HOME/state/`.
    pub fn new() -> Result<Self> {
        let dir = state_dir().ok_or_else(|| {
            TrackerError::config("Could not determine state directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a store in a custom directory, creating it if needed.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();

        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| TrackerError::storage(&dir, e))?;
        }

        Ok(Self { dir })
    }

    /// Directory backing this store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the path for a document.
    fn document_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Get the path for a temp file used during atomic writes.
    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{}.json.tmp", key))
    }
}

impl StateStore for FileStateStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.document_path(key);

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| TrackerError::storage(&path, e))?;
        Ok(Some(content))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let final_path = self.document_path(key);
        let temp_path = self.temp_path(key);

        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| TrackerError::storage(&temp_path, e))?;
            file.write_all(value.as_bytes())
                .map_err(|e| TrackerError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| TrackerError::storage(&temp_path, e))?;
        }

        // Atomic on POSIX
        fs::rename(&temp_path, &final_path).map_err(|e| TrackerError::storage(&final_path, e))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.document_path(key);

        if path.exists() {
            fs::remove_file(&path).map_err(|e| TrackerError::storage(&path, e))?;
        }

        let temp_path = self.temp_path(key);
        if temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }

        Ok(())
    }
}
