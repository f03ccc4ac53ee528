//! Serialized tracker state.
//!
//! State is persisted as two documents that are rewritten in full on every
//! save:
//! - `failure_records`: ordered list of failure events, oldest first
//! - `difficulty_words`: map of item id to difficulty record

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use crate::core::{DifficultyRecord, FailureEvent};
use crate::error::{Result, TrackerError};
use crate::storage::StateStore;

/// Key of the event history document.
pub const FAILURE_RECORDS_KEY: &str = "failure_records";

/// Key of the per-item record document.
pub const DIFFICULTY_WORDS_KEY: &str = "difficulty_words";

/// A point-in-time copy of everything the tracker persists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    /// Failure events, oldest first.
    pub events: Vec<FailureEvent>,
    /// Difficulty records keyed by item id.
    pub records: BTreeMap<String, DifficultyRecord>,
}

impl PersistedState {
    /// Whether there is nothing to persist.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.records.is_empty()
    }

    /// Load both documents from `store`.
    ///
    /// A missing document counts as empty. A document that exists but does
    /// not decode is reported as [`TrackerError::CorruptState`], as is a
    /// record that claims zero failures: a record only exists once its item
    /// has failed.
    pub fn load_from(store: &dyn StateStore) -> Result<Self> {
        let events = read_document(store, FAILURE_RECORDS_KEY)?.unwrap_or_default();
        let records = read_document(store, DIFFICULTY_WORDS_KEY)?.unwrap_or_default();
        validate_records(&records)?;
        Ok(Self { events, records })
    }

    /// Write both documents to `store`.
    pub fn save_to(&self, store: &dyn StateStore) -> Result<()> {
        let events = serde_json::to_string(&self.events)?;
        let records = serde_json::to_string(&self.records)?;
        store.write(FAILURE_RECORDS_KEY, &events)?;
        store.write(DIFFICULTY_WORDS_KEY, &records)?;
        Ok(())
    }
}

fn read_document<T: DeserializeOwned>(store: &dyn StateStore, key: &str) -> Result<Option<T>> {
    match store.read(key)? {
        None => Ok(None),
        Some(content) => serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| TrackerError::corrupt_state(key, e.to_string())),
    }
}

fn validate_records(records: &BTreeMap<String, DifficultyRecord>) -> Result<()> {
    match records.values().find(|r| r.failure_count == 0) {
        Some(record) => Err(TrackerError::corrupt_state(
            DIFFICULTY_WORDS_KEY,
            format!("record '{}' has no failures", record.item_id),
        )),
        None => Ok(()),
    }
}
