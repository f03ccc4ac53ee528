//! Storage traits for the mastery tracker.
//!
//! This module defines the `StateStore` trait, the key-value gateway the
//! tracker loads from and saves to.

use std::sync::Arc;

use crate::error::Result;

/// Trait for key-value state storage backends.
///
/// Values are whole serialized documents. Each write replaces the previous
/// value for that key.
pub trait StateStore: Send + Sync {
    /// Read the document stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the document stored under `key`.
    ///
    /// Returns `Ok(())` even if the key doesn't exist.
    fn remove(&self, key: &str) -> Result<()>;

    /// Check if a document exists.
    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.read(key)?.is_some())
    }
}

/// Blanket implementation of StateStore for Arc-wrapped stores.
///
/// Lets a test keep a handle to the same store it hands to the tracker.
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// Test utilities for StateStore implementations.
#[cfg(test)]
pub mod tests {
    use super::*;

    /// Test helper to verify StateStore implementations.
    pub fn test_state_store_crud<S: StateStore>(store: &S) {
        let key = "failure_records";

        // Initially should not exist
        assert!(!store.exists(key).unwrap());
        assert!(store.read(key).unwrap().is_none());

        store.write(key, "[]").unwrap();
        assert!(store.exists(key).unwrap());
        assert_eq!(store.read(key).unwrap().as_deref(), Some("[]"));

        // Overwrite replaces the whole document
        store.write(key, "[1,2]").unwrap();
        assert_eq!(store.read(key).unwrap().as_deref(), Some("[1,2]"));

        // Other keys are independent
        assert!(store.read("difficulty_words").unwrap().is_none());

        store.remove(key).unwrap();
        assert!(!store.exists(key).unwrap());

        // Remove again should succeed
        store.remove(key).unwrap();
    }
}
