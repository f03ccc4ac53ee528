//! Stats command for the mastery tracker.
//!
//! Displays failure statistics, the mastery distribution, and the current
//! session's counters.

use serde::Serialize;

use crate::core::{FailureType, LearningMode, MasteryLevel};
use crate::tracking::{FailureStats, FailureTracker, MasteryDistribution, SessionStats};

/// Options for the stats command.
#[derive(Debug, Clone, Default)]
pub struct StatsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Show per-type, per-mode, and per-difficulty breakdowns.
    pub detailed: bool,
}

/// Output format for the stats command.
#[derive(Debug, Clone, Serialize)]
pub struct StatsOutput {
    /// Whether stats were computed.
    pub success: bool,
    /// Statistics over the failure history.
    pub failures: FailureStats,
    /// Records per mastery level.
    pub mastery: MasteryDistribution,
    /// The current session.
    pub session: SessionStats,
}

/// The stats command implementation.
pub struct StatsCommand<'a> {
    tracker: &'a FailureTracker,
}

impl<'a> StatsCommand<'a> {
    /// Create a new stats command.
    pub fn new(tracker: &'a FailureTracker) -> Self {
        Self { tracker }
    }

    /// Run the stats command.
    pub fn run(&self) -> StatsOutput {
        StatsOutput {
            success: true,
            failures: self.tracker.get_failure_stats(),
            mastery: self.tracker.mastery_distribution(),
            session: self.tracker.current_session(),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &StatsOutput, options: &StatsOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output, options)
        }
    }

    /// Format output as human-readable text.
    fn format_human_readable(&self, output: &StatsOutput, options: &StatsOptions) -> String {
        let failures = &output.failures;
        let mut lines = Vec::new();
        lines.push("=== Mastery Dashboard ===\n".to_string());

        lines.push("Failures".to_string());
        lines.push(format!(
            "   Total: {} | Last 24h: {} | Last 7d: {}",
            failures.total_failures, failures.failures_last_24h, failures.failures_last_7d
        ));
        lines.push(format!(
            "   Problem words: {}",
            failures.unique_problem_words
        ));
        lines.push(format!(
            "   Most common type: {}",
            failures
                .most_common_failure_type
                .map_or("none", |t| t.as_str())
        ));
        lines.push(format!(
            "   Most challenging mode: {}\n",
            failures
                .most_challenging_mode
                .map_or("none", |m| m.as_str())
        ));

        lines.push("Mastery".to_string());
        for level in MasteryLevel::ALL {
            lines.push(format!(
                "   {:<12} {}",
                level.as_str(),
                output.mastery.get(level)
            ));
        }
        lines.push(String::new());

        let session = &output.session;
        lines.push("Session".to_string());
        lines.push(format!(
            "   Attempts: {} | Failures: {} | Accuracy: {}",
            session.total_attempts,
            session.total_failures,
            session
                .accuracy()
                .map_or_else(|| "n/a".to_string(), |a| format!("{:.1}%", a * 100.0))
        ));
        lines.push(format!(
            "   New problem words: {} | Improved: {}\n",
            session.new_problem_words.len(),
            session.improved_words.len()
        ));

        if options.detailed {
            lines.push("By failure type".to_string());
            for (failure_type, count) in failures.by_type.iter().filter(|(_, c)| *c > 0) {
                lines.push(format!("   {:<20} {}", failure_type.as_str(), count));
            }
            lines.push("By learning mode".to_string());
            for (mode, count) in failures.by_mode.iter().filter(|(_, c)| *c > 0) {
                lines.push(format!("   {:<20} {}", mode.as_str(), count));
            }
            lines.push("By difficulty".to_string());
            for (tag, count) in &failures.by_difficulty {
                lines.push(format!("   {:<20} {}", tag, count));
            }
        }

        lines.join("\n")
    }
}
