//! CLI commands for the mastery tracker.
//!
//! This module provides the commands behind the `mastery` binary, organized into:
//! - **Record commands**: fail, succeed (exercise engine interaction)
//! - **Query commands**: problems, by-type, by-category, attention, trends, stats
//! - **Maintenance commands**: clear, reset, prune

// Record commands
pub mod record;

// Query commands
pub mod problems;
pub mod stats;
pub mod trends;

// Maintenance commands
pub mod clear;
pub mod prune;

pub use clear::ClearCommand;
pub use problems::{ProblemsCommand, ProblemsQuery};
pub use prune::PruneCommand;
pub use record::RecordCommand;
pub use stats::StatsCommand;
pub use trends::TrendsCommand;
