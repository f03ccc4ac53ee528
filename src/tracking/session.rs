//! Ephemeral per-session counters.
//!
//! Exactly one session is active at a time. Counters reset whenever a new
//! session starts and are never persisted.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core::{FailureType, FailureTypeTally, LearningMode, LearningModeTally};

/// Counters for the active practice session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub total_attempts: u32,
    pub total_failures: u32,
    pub failures_by_type: FailureTypeTally,
    pub failures_by_mode: LearningModeTally,
    /// Items that had a tracked success this session.
    pub improved_words: BTreeSet<String>,
    /// Items whose first-ever failure happened this session.
    pub new_problem_words: BTreeSet<String>,
}

impl SessionStats {
    /// Start a fresh session at `now` with a new random id.
    pub fn start(now: DateTime<Utc>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            start_time: now,
            end_time: None,
            total_attempts: 0,
            total_failures: 0,
            failures_by_type: FailureTypeTally::new(),
            failures_by_mode: LearningModeTally::new(),
            improved_words: BTreeSet::new(),
            new_problem_words: BTreeSet::new(),
        }
    }

    /// Whether the session has not been ended.
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    /// Count a failed attempt.
    pub fn record_failure(
        &mut self,
        item_id: &str,
        failure_type: FailureType,
        mode: LearningMode,
        first_ever: bool,
    ) {
        self.total_attempts += 1;
        self.total_failures += 1;
        self.failures_by_type.increment(failure_type);
        self.failures_by_mode.increment(mode);
        if first_ever {
            self.new_problem_words.insert(item_id.to_string());
        }
    }

    /// Count a successful attempt on a tracked item.
    pub fn record_success(&mut self, item_id: &str) {
        self.total_attempts += 1;
        self.improved_words.insert(item_id.to_string());
    }

    /// Stamp the end time. Ending twice keeps the first end time.
    pub fn end(&mut self, now: DateTime<Utc>) {
        if self.end_time.is_none() {
            self.end_time = Some(now);
        }
    }

    /// Share of attempts answered correctly, or `None` before any attempt.
    pub fn accuracy(&self) -> Option<f64> {
        if self.total_attempts == 0 {
            return None;
        }
        let correct = self.total_attempts.saturating_sub(self.total_failures);
        Some(f64::from(correct) / f64::from(self.total_attempts))
    }
}
