//! Mastery Tracker - failure and mastery tracking for vocabulary practice
//!
//! Exercise engines report every answer to a [`FailureTracker`]. The tracker
//! keeps a bounded history of failures and a difficulty record per item,
//! classifies each item's mastery level, and ranks items for review. State
//! is persisted in the background and never blocks or fails a caller.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod tracking;

pub use config::Config;
pub use core::{
    classify, Clock, DifficultyRecord, FailureDetails, FailureEvent, FailureType, LearningMode,
    ManualClock, MasteryLevel, StudyItem, SystemClock,
};
pub use error::{FailOpen, Result, TrackerError};
pub use storage::{FileStateStore, MemoryStateStore, StateStore};
pub use tracking::{
    FailureStats, FailureTracker, MasteryDistribution, PurgeSummary, ScoredRecord, SessionStats,
};

// CLI commands
pub use cli::{
    ClearCommand, ProblemsCommand, ProblemsQuery, PruneCommand, RecordCommand, StatsCommand,
    TrendsCommand,
};
