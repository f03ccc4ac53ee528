//! State storage for the mastery tracker.
//!
//! This module provides the key-value persistence gateway, file-based and
//! in-memory backends, the serialized state layout, and the background
//! writer that coalesces saves.

pub mod file;
pub mod memory;
pub mod snapshot;
pub mod traits;
pub mod writer;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;
pub use snapshot::{PersistedState, DIFFICULTY_WORDS_KEY, FAILURE_RECORDS_KEY};
pub use traits::StateStore;
pub use writer::{PersistenceWorker, SnapshotSource};
