//! Per-item difficulty records.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::item::StudyItem;
use super::kinds::FailureType;
use super::mastery::{classify, MasteryLevel};

/// Durable aggregate of the failure and success signal for one item.
///
/// Created on the item's first failure. `failure_count` only ever grows and
/// `improvement_streak` counts successes since the most recent failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyRecord {
    pub item_id: String,
    pub english_text: String,
    pub kikuyu_text: String,
    pub category: String,
    pub failure_count: u32,
    pub last_failure_timestamp: DateTime<Utc>,
    pub improvement_streak: u32,
    pub mastery_level: MasteryLevel,
    #[serde(default)]
    pub observed_failure_types: BTreeSet<FailureType>,
    #[serde(default)]
    pub average_response_time_ms: f64,
}

impl DifficultyRecord {
    /// Create the record for an item's first failure.
    pub fn first_failure(
        item: &StudyItem,
        failure_type: FailureType,
        response_time_ms: u64,
        now: DateTime<Utc>,
    ) -> Self {
        let mut record = Self {
            item_id: item.item_id.clone(),
            english_text: item.english_text.clone(),
            kikuyu_text: item.kikuyu_text.clone(),
            category: item.category.clone(),
            failure_count: 0,
            last_failure_timestamp: now,
            improvement_streak: 0,
            mastery_level: MasteryLevel::Struggling,
            observed_failure_types: BTreeSet::new(),
            average_response_time_ms: 0.0,
        };
        record.register_failure(failure_type, response_time_ms, now);
        record
    }

    /// Apply a failure.
    ///
    /// Resets the streak and forces Struggling regardless of the rule table.
    pub fn register_failure(
        &mut self,
        failure_type: FailureType,
        response_time_ms: u64,
        now: DateTime<Utc>,
    ) {
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure_timestamp = now;
        self.improvement_streak = 0;
        self.observed_failure_types.insert(failure_type);
        self.update_response_time(response_time_ms);
        self.mastery_level = MasteryLevel::Struggling;
    }

    /// Apply a success and reclassify.
    pub fn register_success(&mut self, response_time_ms: u64, now: DateTime<Utc>) {
        self.improvement_streak = self.improvement_streak.saturating_add(1);
        self.update_response_time(response_time_ms);
        self.refresh_mastery(now);
    }

    /// Recompute `mastery_level` from the rule table.
    pub fn refresh_mastery(&mut self, now: DateTime<Utc>) {
        self.mastery_level = classify(self, now);
    }

    /// Whole days elapsed since the last failure (truncated).
    pub fn days_since_last_failure(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_failure_timestamp).num_days()
    }

    /// Whether the last failure happened within `window` of `now`.
    pub fn failed_within(&self, window: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_failure_timestamp <= window
    }

    /// Two-point running average: the first sample is taken as-is, later
    /// samples are averaged with the prior value.
    fn update_response_time(&mut self, response_time_ms: u64) {
        let sample = response_time_ms as f64;
        self.average_response_time_ms = if self.average_response_time_ms == 0.0 {
            sample
        } else {
            (self.average_response_time_ms + sample) / 2.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> StudyItem {
        StudyItem::new("ngombe", "cow", "ng'ombe", "animals")
    }

    #[test]
    fn test_first_failure() {
        let now = Utc::now();
        let record = DifficultyRecord::first_failure(&item(), FailureType::RecallError, 4000, now);

        assert_eq!(record.failure_count, 1);
        assert_eq!(record.improvement_streak, 0);
        assert_eq!(record.mastery_level, MasteryLevel::Struggling);
        assert_eq!(record.last_failure_timestamp, now);
        assert_eq!(record.average_response_time_ms, 4000.0);
        assert!(record
            .observed_failure_types
            .contains(&FailureType::RecallError));
    }

    #[test]
    fn test_failure_resets_streak_and_forces_struggling() {
        let now = Utc::now();
        let mut record =
            DifficultyRecord::first_failure(&item(), FailureType::RecallError, 1000, now);
        record.improvement_streak = 6;
        record.mastery_level = MasteryLevel::Mastered;

        record.register_failure(FailureType::SpellingError, 1000, now + Duration::days(20));

        assert_eq!(record.failure_count, 2);
        assert_eq!(record.improvement_streak, 0);
        assert_eq!(record.mastery_level, MasteryLevel::Struggling);
        assert_eq!(record.observed_failure_types.len(), 2);
    }

    #[test]
    fn test_failure_types_are_a_set() {
        let now = Utc::now();
        let mut record =
            DifficultyRecord::first_failure(&item(), FailureType::RecallError, 1000, now);
        record.register_failure(FailureType::RecallError, 1000, now);
        assert_eq!(record.observed_failure_types.len(), 1);
    }

    #[test]
    fn test_running_average() {
        let now = Utc::now();
        let mut record = DifficultyRecord::first_failure(&item(), FailureType::RecallError, 0, now);
        assert_eq!(record.average_response_time_ms, 0.0);

        record.register_success(2000, now);
        assert_eq!(record.average_response_time_ms, 2000.0);

        record.register_success(1000, now);
        assert_eq!(record.average_response_time_ms, 1500.0);

        record.register_failure(FailureType::TimeoutError, 3500, now);
        assert_eq!(record.average_response_time_ms, 2500.0);
    }

    #[test]
    fn test_success_reclassifies() {
        let start = Utc::now();
        let mut record =
            DifficultyRecord::first_failure(&item(), FailureType::RecallError, 1000, start);

        record.register_success(1000, start + Duration::days(2));
        assert_eq!(record.improvement_streak, 1);
        assert_eq!(record.mastery_level, MasteryLevel::Learning);
    }

    #[test]
    fn test_failed_within_is_inclusive() {
        let now = Utc::now();
        let record = DifficultyRecord::first_failure(
            &item(),
            FailureType::RecallError,
            1000,
            now - Duration::days(7),
        );
        assert!(record.failed_within(Duration::days(7), now));
        assert!(!record.failed_within(Duration::days(6), now));
        assert_eq!(record.days_since_last_failure(now), 7);
    }
}
