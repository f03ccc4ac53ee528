//! Trends command: the failure timeline for one item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{FailureEvent, FailureType, LearningMode};
use crate::tracking::FailureTracker;

/// Options for the trends command.
#[derive(Debug, Clone, Default)]
pub struct TrendsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// One failure in the timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendEvent {
    pub timestamp: DateTime<Utc>,
    pub failure_type: FailureType,
    pub learning_mode: LearningMode,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub user_answer: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub correct_answer: String,
    pub response_time_ms: u64,
}

impl From<&FailureEvent> for TrendEvent {
    fn from(event: &FailureEvent) -> Self {
        Self {
            timestamp: event.timestamp,
            failure_type: event.failure_type,
            learning_mode: event.learning_mode,
            user_answer: event.user_answer.clone(),
            correct_answer: event.correct_answer.clone(),
            response_time_ms: event.response_time_ms,
        }
    }
}

/// Output of the trends command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendsOutput {
    /// Whether the query ran.
    pub success: bool,
    /// The item.
    pub item_id: String,
    /// Failures oldest first.
    pub events: Vec<TrendEvent>,
}

/// The trends command implementation.
pub struct TrendsCommand<'a> {
    tracker: &'a FailureTracker,
}

impl<'a> TrendsCommand<'a> {
    /// Create a new command over `tracker`.
    pub fn new(tracker: &'a FailureTracker) -> Self {
        Self { tracker }
    }

    /// Collect the timeline for `item_id`.
    pub fn run(&self, item_id: &str) -> TrendsOutput {
        TrendsOutput {
            success: true,
            item_id: item_id.to_string(),
            events: self
                .tracker
                .get_improvement_trends(item_id)
                .iter()
                .map(TrendEvent::from)
                .collect(),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &TrendsOutput, options: &TrendsOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if output.events.is_empty() {
            return format!("No failures recorded for '{}'.", output.item_id);
        }

        let mut lines = vec![format!(
            "Failures for '{}' ({}):",
            output.item_id,
            output.events.len()
        )];
        for event in &output.events {
            let mut line = format!(
                "  {}  {:<20} {:<16} {}ms",
                event.timestamp.format("%Y-%m-%d %H:%M"),
                event.failure_type.as_str(),
                event.learning_mode.as_str(),
                event.response_time_ms
            );
            if !event.user_answer.is_empty() {
                line.push_str(&format!(
                    "  '{}' (expected '{}')",
                    event.user_answer, event.correct_answer
                ));
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}
