//! Clear commands: forget one item, or reset everything.

use serde::{Deserialize, Serialize};

use crate::tracking::FailureTracker;

/// Options for the clear commands.
#[derive(Debug, Clone, Default)]
pub struct ClearOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output of the clear commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearOutput {
    /// Whether the clear ran.
    pub success: bool,
    /// Item that was cleared; `None` for a full reset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    /// Whether anything was removed.
    pub removed: bool,
    /// Records left afterwards.
    pub records_remaining: usize,
    /// Events left afterwards.
    pub events_remaining: usize,
}

/// The clear command implementation.
pub struct ClearCommand<'a> {
    tracker: &'a FailureTracker,
}

impl<'a> ClearCommand<'a> {
    /// Create a new command over `tracker`.
    pub fn new(tracker: &'a FailureTracker) -> Self {
        Self { tracker }
    }

    /// Forget one item's record and events.
    pub fn clear_item(&self, item_id: &str) -> ClearOutput {
        let removed = self.tracker.get_record(item_id).is_some()
            || !self.tracker.get_improvement_trends(item_id).is_empty();
        self.tracker.clear_failures_for_item(item_id);
        self.output(Some(item_id.to_string()), removed)
    }

    /// Forget everything and start a new session.
    pub fn reset(&self) -> ClearOutput {
        let removed = !self.tracker.is_empty() || self.tracker.history_len() > 0;
        self.tracker.reset_all();
        self.output(None, removed)
    }

    fn output(&self, item_id: Option<String>, removed: bool) -> ClearOutput {
        ClearOutput {
            success: true,
            item_id,
            removed,
            records_remaining: self.tracker.len(),
            events_remaining: self.tracker.history_len(),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ClearOutput, options: &ClearOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        match (&output.item_id, output.removed) {
            (Some(id), true) => format!("Cleared '{}'.", id),
            (Some(id), false) => format!("'{}' was not tracked.", id),
            (None, _) => "Reset all failure tracking.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::{FailureDetails, FailureType, LearningMode, ManualClock, StudyItem};
    use crate::storage::MemoryStateStore;
    use std::sync::Arc;

    fn tracker() -> FailureTracker {
        let tracker = FailureTracker::with_clock(
            Arc::new(MemoryStateStore::new()),
            Config::default(),
            Arc::new(ManualClock::default()),
        );
        for id in ["mbuku", "ngombe"] {
            tracker.record_failure(
                &StudyItem::new(id, "en", id, "cat"),
                FailureType::RecallError,
                LearningMode::Flashcard,
                FailureDetails::default(),
            );
        }
        tracker
    }

    #[test]
    fn test_clear_item() {
        let tracker = tracker();
        let cmd = ClearCommand::new(&tracker);

        let output = cmd.clear_item("mbuku");
        assert!(output.removed);
        assert_eq!(output.records_remaining, 1);
        assert_eq!(output.events_remaining, 1);
        assert_eq!(
            cmd.format_output(&output, &ClearOptions::default()),
            "Cleared 'mbuku'."
        );

        let again = cmd.clear_item("mbuku");
        assert!(!again.removed);
    }

    #[test]
    fn test_reset() {
        let tracker = tracker();
        let cmd = ClearCommand::new(&tracker);

        let output = cmd.reset();
        assert!(output.removed);
        assert!(output.item_id.is_none());
        assert_eq!(output.records_remaining, 0);
        assert_eq!(output.events_remaining, 0);
    }
}
