//! Read-only ranking views over difficulty records and failure events.
//!
//! Every function here is pure: callers pass a consistent snapshot of the
//! records and history plus the current time.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::AttentionConfig;
use crate::core::{
    DifficultyRecord, FailureEvent, FailureType, FailureTypeTally, LearningMode,
    LearningModeTally, MasteryLevel,
};
use crate::tracking::EventHistory;

/// Priority weights for the "needs attention" view.
pub mod weights {
    /// Failure counts above this stop adding priority.
    pub const FAILURE_CAP: u32 = 10;
    /// Bonus for a failure inside the attention window.
    pub const RECENCY_BONUS: u32 = 10;
}

/// Group key for events without a difficulty tag.
pub const UNTAGGED: &str = "untagged";

/// Records keyed by item id.
pub type RecordMap = BTreeMap<String, DifficultyRecord>;

/// Sort by failure count, highest first. Stable, so ties keep item id order.
fn by_failures_desc(records: &mut [DifficultyRecord]) {
    records.sort_by(|a, b| b.failure_count.cmp(&a.failure_count));
}

/// Items with the most failures.
///
/// Ordered by failure count descending, then by last failure ascending so
/// that, among equals, the longest-standing problem surfaces first.
pub fn problem_words(records: &RecordMap, limit: usize) -> Vec<DifficultyRecord> {
    let mut ranked: Vec<DifficultyRecord> = records.values().cloned().collect();
    ranked.sort_by(|a, b| {
        b.failure_count
            .cmp(&a.failure_count)
            .then_with(|| a.last_failure_timestamp.cmp(&b.last_failure_timestamp))
    });
    ranked.truncate(limit);
    ranked
}

/// Items that have failed with `failure_type` at least once.
pub fn words_by_failure_type(records: &RecordMap, failure_type: FailureType) -> Vec<DifficultyRecord> {
    let mut matching: Vec<DifficultyRecord> = records
        .values()
        .filter(|r| r.observed_failure_types.contains(&failure_type))
        .cloned()
        .collect();
    by_failures_desc(&mut matching);
    matching
}

/// Items in `category`.
pub fn problem_words_by_category(records: &RecordMap, category: &str) -> Vec<DifficultyRecord> {
    let mut matching: Vec<DifficultyRecord> = records
        .values()
        .filter(|r| r.category == category)
        .cloned()
        .collect();
    by_failures_desc(&mut matching);
    matching
}

/// A record with its attention priority.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    /// The record.
    pub record: DifficultyRecord,
    /// Higher means more urgent.
    pub priority: u32,
}

/// Attention priority for `record`.
///
/// `min(failures, 10)` plus a bonus of 10 when the last failure falls inside
/// the attention window.
pub fn attention_priority(
    record: &DifficultyRecord,
    config: &AttentionConfig,
    now: DateTime<Utc>,
) -> u32 {
    let recent = record.failed_within(config.window(), now);
    record.failure_count.min(weights::FAILURE_CAP) + if recent { weights::RECENCY_BONUS } else { 0 }
}

/// Whether `record` belongs in the attention view at all.
pub fn needs_attention(record: &DifficultyRecord, config: &AttentionConfig, now: DateTime<Utc>) -> bool {
    record.failure_count >= config.min_failures
        && record.failed_within(config.window(), now)
        && record.mastery_level != MasteryLevel::Mastered
}

/// Items that failed repeatedly and recently and are not yet mastered.
///
/// Sorted by priority descending, then by mastery level with the worst first.
pub fn words_needing_attention(
    records: &RecordMap,
    config: &AttentionConfig,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<ScoredRecord> {
    let mut scored: Vec<ScoredRecord> = records
        .values()
        .filter(|r| needs_attention(r, config, now))
        .map(|r| ScoredRecord {
            priority: attention_priority(r, config, now),
            record: r.clone(),
        })
        .collect();

    scored.sort_by(|a, b| match b.priority.cmp(&a.priority) {
        Ordering::Equal => a.record.mastery_level.cmp(&b.record.mastery_level),
        other => other,
    });
    scored.truncate(limit);
    scored
}

/// Every failure event for one item, oldest first.
pub fn improvement_trends(history: &EventHistory, item_id: &str) -> Vec<FailureEvent> {
    history.for_item(item_id)
}

/// Summary statistics over the failure history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureStats {
    /// Events in history.
    pub total_failures: usize,
    /// Events in the last 24 hours.
    pub failures_last_24h: usize,
    /// Events in the last 7 days.
    pub failures_last_7d: usize,
    /// Items with a difficulty record.
    pub unique_problem_words: usize,
    /// Events per failure type.
    pub by_type: FailureTypeTally,
    /// Events per learning mode.
    pub by_mode: LearningModeTally,
    /// Events per difficulty tag.
    pub by_difficulty: BTreeMap<String, u32>,
    /// Failure type with the most events; ties go to the earlier-declared type.
    pub most_common_failure_type: Option<FailureType>,
    /// Mode with the most events; ties go to the earlier-declared mode.
    pub most_challenging_mode: Option<LearningMode>,
}

/// Compute [`FailureStats`].
pub fn failure_stats(history: &EventHistory, records: &RecordMap, now: DateTime<Utc>) -> FailureStats {
    let day = Duration::hours(24);
    let week = Duration::days(7);

    let mut by_type = FailureTypeTally::new();
    let mut by_mode = LearningModeTally::new();
    let mut by_difficulty: BTreeMap<String, u32> = BTreeMap::new();
    let mut last_24h = 0;
    let mut last_7d = 0;

    for event in history.iter() {
        let age = now - event.timestamp;
        if age <= day {
            last_24h += 1;
        }
        if age <= week {
            last_7d += 1;
        }
        by_type.increment(event.failure_type);
        by_mode.increment(event.learning_mode);
        let tag = if event.difficulty_tag.is_empty() {
            UNTAGGED
        } else {
            event.difficulty_tag.as_str()
        };
        *by_difficulty.entry(tag.to_string()).or_insert(0) += 1;
    }

    FailureStats {
        total_failures: history.len(),
        failures_last_24h: last_24h,
        failures_last_7d: last_7d,
        unique_problem_words: records.len(),
        most_common_failure_type: by_type.argmax(),
        most_challenging_mode: by_mode.argmax(),
        by_type,
        by_mode,
        by_difficulty,
    }
}

/// Number of records at each mastery level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MasteryDistribution {
    pub struggling: usize,
    pub challenging: usize,
    pub learning: usize,
    pub mastered: usize,
}

impl MasteryDistribution {
    /// Count for one level.
    pub fn get(&self, level: MasteryLevel) -> usize {
        match level {
            MasteryLevel::Struggling => self.struggling,
            MasteryLevel::Challenging => self.challenging,
            MasteryLevel::Learning => self.learning,
            MasteryLevel::Mastered => self.mastered,
        }
    }

    /// Total records counted.
    pub fn total(&self) -> usize {
        self.struggling + self.challenging + self.learning + self.mastered
    }
}

/// Tally records by their stored mastery level.
pub fn mastery_distribution(records: &RecordMap) -> MasteryDistribution {
    let mut dist = MasteryDistribution::default();
    for record in records.values() {
        match record.mastery_level {
            MasteryLevel::Struggling => dist.struggling += 1,
            MasteryLevel::Challenging => dist.challenging += 1,
            MasteryLevel::Learning => dist.learning += 1,
            MasteryLevel::Mastered => dist.mastered += 1,
        }
    }
    dist
}
