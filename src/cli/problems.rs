//! Problem-word commands: problems, by-type, by-category, attention.
//!
//! All four views list difficulty records; they differ only in which records
//! are selected and how they are ordered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{DifficultyRecord, FailureType, MasteryLevel};
use crate::tracking::FailureTracker;

/// Which problem view to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemsQuery {
    /// Most-failed items.
    Top { limit: usize },
    /// Items that have failed with one type.
    ByType(FailureType),
    /// Items in one category.
    ByCategory(String),
    /// Items needing attention, with priorities.
    Attention { limit: usize },
}

impl ProblemsQuery {
    fn label(&self) -> String {
        match self {
            Self::Top { .. } => "problem words".to_string(),
            Self::ByType(failure_type) => format!("failure type {}", failure_type),
            Self::ByCategory(category) => format!("category '{}'", category),
            Self::Attention { .. } => "needs attention".to_string(),
        }
    }
}

/// Options for the problem-word commands.
#[derive(Debug, Clone, Default)]
pub struct ProblemsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// One listed item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordInfo {
    /// Item id.
    pub item_id: String,
    /// English text.
    pub english_text: String,
    /// Kikuyu text.
    pub kikuyu_text: String,
    /// Category.
    pub category: String,
    /// Lifetime failures within retention.
    pub failure_count: u32,
    /// Consecutive successes since the last failure.
    pub improvement_streak: u32,
    /// Current mastery level.
    pub mastery_level: MasteryLevel,
    /// When the item last failed.
    pub last_failure: DateTime<Utc>,
    /// Attention priority, only set for the attention view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

impl From<&DifficultyRecord> for WordInfo {
    fn from(record: &DifficultyRecord) -> Self {
        Self {
            item_id: record.item_id.clone(),
            english_text: record.english_text.clone(),
            kikuyu_text: record.kikuyu_text.clone(),
            category: record.category.clone(),
            failure_count: record.failure_count,
            improvement_streak: record.improvement_streak,
            mastery_level: record.mastery_level,
            last_failure: record.last_failure_timestamp,
            priority: None,
        }
    }
}

/// Output of the problem-word commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemsOutput {
    /// Whether the query ran.
    pub success: bool,
    /// Human-readable name of the view.
    pub query: String,
    /// Matching items, in view order.
    pub words: Vec<WordInfo>,
}

/// The problem-word command implementation.
pub struct ProblemsCommand<'a> {
    tracker: &'a FailureTracker,
}

impl<'a> ProblemsCommand<'a> {
    /// Create a new command over `tracker`.
    pub fn new(tracker: &'a FailureTracker) -> Self {
        Self { tracker }
    }

    /// Run `query`.
    pub fn run(&self, query: &ProblemsQuery) -> ProblemsOutput {
        let words = match query {
            ProblemsQuery::Top { limit } => to_infos(&self.tracker.get_problem_words(*limit)),
            ProblemsQuery::ByType(failure_type) => {
                to_infos(&self.tracker.get_words_by_failure_type(*failure_type))
            }
            ProblemsQuery::ByCategory(category) => {
                to_infos(&self.tracker.get_problem_words_by_category(category))
            }
            ProblemsQuery::Attention { limit } => self
                .tracker
                .get_scored_words_needing_attention(*limit)
                .iter()
                .map(|scored| WordInfo {
                    priority: Some(scored.priority),
                    ..WordInfo::from(&scored.record)
                })
                .collect(),
        };

        ProblemsOutput {
            success: true,
            query: query.label(),
            words,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ProblemsOutput, options: &ProblemsOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            format_human_readable(output)
        }
    }
}

fn to_infos(records: &[DifficultyRecord]) -> Vec<WordInfo> {
    records.iter().map(WordInfo::from).collect()
}

fn format_human_readable(output: &ProblemsOutput) -> String {
    if output.words.is_empty() {
        return format!("No items for {}.", output.query);
    }

    let mut lines = vec![format!("{} ({}):", capitalize(&output.query), output.words.len())];
    for word in &output.words {
        let mut line = format!(
            "  {:<16} {:<14} failures: {:<3} streak: {:<2} {}",
            word.item_id, word.kikuyu_text, word.failure_count, word.improvement_streak,
            word.mastery_level
        );
        if let Some(priority) = word.priority {
            line.push_str(&format!("  priority: {}", priority));
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
