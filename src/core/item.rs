//! Study items and the failure events recorded against them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::kinds::{FailureType, LearningMode};

/// Normalized item descriptor sent by every exercise engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyItem {
    /// Stable identifier shared by the item's record and events.
    pub item_id: String,
    /// English prompt or gloss.
    pub english_text: String,
    /// Kikuyu word or phrase.
    pub kikuyu_text: String,
    /// Content category (e.g. "animals", "greetings").
    pub category: String,
}

impl StudyItem {
    /// Create a new item descriptor.
    pub fn new(
        item_id: impl Into<String>,
        english_text: impl Into<String>,
        kikuyu_text: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            english_text: english_text.into(),
            kikuyu_text: kikuyu_text.into(),
            category: category.into(),
        }
    }
}

/// Answer-level details accompanying a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureDetails {
    /// What the learner answered.
    pub user_answer: String,
    /// The expected answer.
    pub correct_answer: String,
    /// Free-form difficulty tag from the content pack ("easy", "hard", ...).
    pub difficulty_tag: String,
    /// Time taken to answer.
    pub response_time_ms: u64,
}

impl FailureDetails {
    /// Details with only a response time.
    pub fn with_response_time(response_time_ms: u64) -> Self {
        Self {
            response_time_ms,
            ..Self::default()
        }
    }
}

/// One incorrect answer. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureEvent {
    pub item_id: String,
    pub english_text: String,
    pub kikuyu_text: String,
    pub category: String,
    pub failure_type: FailureType,
    pub learning_mode: LearningMode,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub user_answer: String,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default)]
    pub difficulty_tag: String,
    #[serde(default)]
    pub response_time_ms: u64,
}

impl FailureEvent {
    /// Build an event for `item` at `timestamp`.
    pub fn new(
        item: &StudyItem,
        failure_type: FailureType,
        learning_mode: LearningMode,
        details: FailureDetails,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            item_id: item.item_id.clone(),
            english_text: item.english_text.clone(),
            kikuyu_text: item.kikuyu_text.clone(),
            category: item.category.clone(),
            failure_type,
            learning_mode,
            timestamp,
            user_answer: details.user_answer,
            correct_answer: details.correct_answer,
            difficulty_tag: details.difficulty_tag,
            response_time_ms: details.response_time_ms,
        }
    }
}
