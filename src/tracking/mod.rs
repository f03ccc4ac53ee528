//! Failure tracking for the mastery tracker.
//!
//! The [`FailureTracker`] records failures and successes reported by exercise
//! engines. It keeps a bounded event history (`failure_records`) and one
//! difficulty record per item (`difficulty_words`), and answers ranking and
//! statistics queries over them.

pub mod history;
pub mod queries;
pub mod retention;
pub mod session;
pub mod tracker;

pub use history::EventHistory;
pub use queries::{
    attention_priority, failure_stats, improvement_trends, mastery_distribution, needs_attention,
    problem_words, problem_words_by_category, weights, words_by_failure_type,
    words_needing_attention, FailureStats, MasteryDistribution, RecordMap, ScoredRecord, UNTAGGED,
};
pub use retention::{
    evaluate as evaluate_retention, purge_events, purge_records, run_retention, PurgeSummary,
    RetentionResult,
};
pub use session::SessionStats;
pub use tracker::FailureTracker;
