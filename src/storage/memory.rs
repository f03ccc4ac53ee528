//! In-memory state storage for testing.
//!
//! Thread-safe implementation of the StateStore trait, used in unit tests and
//! wherever state should not outlive the process.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::{Result, TrackerError};
use crate::storage::StateStore;

/// In-memory state store.
///
/// Documents are lost when the store is dropped. Writes can be made to fail
/// on demand to exercise the tracker's write-error path.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    /// Document storage.
    documents: RwLock<HashMap<String, String>>,
    /// When set, every write fails.
    fail_writes: RwLock<bool>,
    /// Number of successful writes.
    writes: RwLock<usize>,
}

impl MemoryStateStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of documents in the store.
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        *self.writes.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        *self
            .fail_writes
            .write()
            .unwrap_or_else(PoisonError::into_inner) = fail;
    }
}

impl StateStore for MemoryStateStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        Ok(documents.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        if *self
            .fail_writes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
        {
            return Err(TrackerError::storage(
                key,
                std::io::Error::other("writes disabled"),
            ));
        }
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        documents.insert(key.to_string(), value.to_string());
        *self.writes.write().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        documents.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::test_state_store_crud;

    #[test]
    fn test_memory_store_crud() {
        let store = MemoryStateStore::new();
        test_state_store_crud(&store);
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = MemoryStateStore::new();
        assert!(store.is_empty());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_failing_writes() {
        let store = MemoryStateStore::new();
        store.set_fail_writes(true);
        assert!(store.write("k", "v").is_err());
        assert!(store.is_empty());

        store.set_fail_writes(false);
        store.write("k", "v").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MemoryStateStore::new());
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let key = format!("k{}", i);
                    store.write(&key, "v").unwrap();
                    store.read(&key).unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 10);
    }
}
