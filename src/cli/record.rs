//! Record commands: fail and succeed.
//!
//! Exercise engines that shell out report answers through these commands.

use serde::{Deserialize, Serialize};

use crate::cli::problems::WordInfo;
use crate::core::{FailureDetails, FailureType, LearningMode, StudyItem};
use crate::tracking::FailureTracker;

/// Options for the record commands.
#[derive(Debug, Clone, Default)]
pub struct RecordOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output of the record commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordOutput {
    /// Whether the answer was recorded.
    pub success: bool,
    /// The item the answer was for.
    pub item_id: String,
    /// "failure" or "success".
    pub outcome: String,
    /// The item's record after the update, if it is tracked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<WordInfo>,
}

/// The record command implementation.
pub struct RecordCommand<'a> {
    tracker: &'a FailureTracker,
}

impl<'a> RecordCommand<'a> {
    /// Create a new command over `tracker`.
    pub fn new(tracker: &'a FailureTracker) -> Self {
        Self { tracker }
    }

    /// Record an incorrect answer.
    pub fn fail(
        &self,
        item: &StudyItem,
        failure_type: FailureType,
        mode: LearningMode,
        details: FailureDetails,
    ) -> RecordOutput {
        self.tracker
            .record_failure(item, failure_type, mode, details);
        self.output(&item.item_id, "failure")
    }

    /// Record a correct answer. Items that never failed are left untracked.
    pub fn succeed(&self, item_id: &str, mode: LearningMode, response_time_ms: u64) -> RecordOutput {
        let item = StudyItem::new(item_id, "", "", "");
        self.tracker.record_success(&item, mode, response_time_ms);
        self.output(item_id, "success")
    }

    fn output(&self, item_id: &str, outcome: &str) -> RecordOutput {
        RecordOutput {
            success: true,
            item_id: item_id.to_string(),
            outcome: outcome.to_string(),
            record: self.tracker.get_record(item_id).as_ref().map(WordInfo::from),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &RecordOutput, options: &RecordOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        match &output.record {
            Some(record) => format!(
                "Recorded {} for '{}': {} (failures: {}, streak: {})",
                output.outcome,
                output.item_id,
                record.mastery_level,
                record.failure_count,
                record.improvement_streak
            ),
            None => format!("'{}' is not tracked; nothing to record.", output.item_id),
        }
    }
}
