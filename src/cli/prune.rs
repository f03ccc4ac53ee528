//! Prune command: drop entries past the retention horizon now.

use serde::{Deserialize, Serialize};

use crate::tracking::FailureTracker;

/// Options for the prune command.
#[derive(Debug, Clone, Default)]
pub struct PruneOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output of the prune command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneOutput {
    /// Whether the pass ran.
    pub success: bool,
    /// Horizon applied, in days.
    pub retention_days: u32,
    /// Events removed.
    pub events_removed: usize,
    /// Records removed.
    pub records_removed: usize,
    /// Records left afterwards.
    pub records_remaining: usize,
}

/// The prune command implementation.
pub struct PruneCommand<'a> {
    tracker: &'a FailureTracker,
}

impl<'a> PruneCommand<'a> {
    /// Create a new command over `tracker`.
    pub fn new(tracker: &'a FailureTracker) -> Self {
        Self { tracker }
    }

    /// Run a retention pass.
    pub fn run(&self) -> PruneOutput {
        let summary = self.tracker.purge_expired();
        PruneOutput {
            success: true,
            retention_days: self.tracker.config().retention.retention_days,
            events_removed: summary.events_removed,
            records_removed: summary.records_removed,
            records_remaining: self.tracker.len(),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &PruneOutput, options: &PruneOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if output.events_removed == 0 && output.records_removed == 0 {
            return format!(
                "Nothing older than {} days. {} records tracked.",
                output.retention_days, output.records_remaining
            );
        }

        format!(
            "Pruned {} events and {} records older than {} days. {} records remain.",
            output.events_removed,
            output.records_removed,
            output.retention_days,
            output.records_remaining
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::{FailureDetails, FailureType, LearningMode, ManualClock, StudyItem};
    use crate::storage::MemoryStateStore;
    use chrono::Duration;
    use std::sync::Arc;

    #[test]
    fn test_prune_removes_old_entries() {
        let clock = Arc::new(ManualClock::default());
        let tracker = FailureTracker::with_clock(
            Arc::new(MemoryStateStore::new()),
            Config::default(),
            clock.clone(),
        );
        tracker.record_failure(
            &StudyItem::new("old", "en", "ki", "cat"),
            FailureType::RecallError,
            LearningMode::Flashcard,
            FailureDetails::default(),
        );
        clock.advance(Duration::days(40));
        tracker.record_failure(
            &StudyItem::new("new", "en", "ki", "cat"),
            FailureType::RecallError,
            LearningMode::Flashcard,
            FailureDetails::default(),
        );

        let cmd = PruneCommand::new(&tracker);
        let output = cmd.run();
        assert_eq!(output.events_removed, 1);
        assert_eq!(output.records_removed, 1);
        assert_eq!(output.records_remaining, 1);
        assert_eq!(
            cmd.format_output(&output, &PruneOptions::default()),
            "Pruned 1 events and 1 records older than 30 days. 1 records remain."
        );

        let again = cmd.run();
        assert!(cmd
            .format_output(&again, &PruneOptions::default())
            .starts_with("Nothing older than 30 days"));
    }
}
