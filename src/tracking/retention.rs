//! Age-based retention for failure events and difficulty records.
//!
//! Retention logic:
//! 1. An event expires when `now - timestamp > horizon`
//! 2. A record expires when `now - last_failure_timestamp > horizon`
//! 3. Expired entries are removed; records and events are pruned
//!    independently since they are linked only by item id
//!
//! Capacity-based eviction lives in [`EventHistory::push`].

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::RetentionConfig;
use crate::core::DifficultyRecord;
use crate::tracking::EventHistory;

/// Result of evaluating retention for a single timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionResult {
    /// Still inside the retention horizon.
    Fresh,
    /// Older than the horizon; should be purged.
    Expired,
}

impl RetentionResult {
    /// Whether this result means the entry should be purged.
    pub fn should_purge(&self) -> bool {
        matches!(self, Self::Expired)
    }
}

/// Evaluate retention for an entry last touched at `timestamp`.
pub fn evaluate(timestamp: DateTime<Utc>, horizon: Duration, now: DateTime<Utc>) -> RetentionResult {
    if now - timestamp > horizon {
        RetentionResult::Expired
    } else {
        RetentionResult::Fresh
    }
}

/// What a retention pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeSummary {
    /// Number of failure events removed.
    pub events_removed: usize,
    /// Number of difficulty records removed.
    pub records_removed: usize,
}

impl PurgeSummary {
    /// Whether anything was removed.
    pub fn is_empty(&self) -> bool {
        self.events_removed == 0 && self.records_removed == 0
    }
}

/// Remove expired events from `history`.
pub fn purge_events(history: &mut EventHistory, horizon: Duration, now: DateTime<Utc>) -> usize {
    history.retain(|e| !evaluate(e.timestamp, horizon, now).should_purge())
}

/// Remove expired records from `records`.
pub fn purge_records(
    records: &mut BTreeMap<String, DifficultyRecord>,
    horizon: Duration,
    now: DateTime<Utc>,
) -> usize {
    let before = records.len();
    records.retain(|_, r| !evaluate(r.last_failure_timestamp, horizon, now).should_purge());
    before - records.len()
}

/// Run a full retention pass over both stores.
pub fn run_retention(
    records: &mut BTreeMap<String, DifficultyRecord>,
    history: &mut EventHistory,
    config: &RetentionConfig,
    now: DateTime<Utc>,
) -> PurgeSummary {
    let horizon = config.horizon();
    let summary = PurgeSummary {
        events_removed: purge_events(history, horizon, now),
        records_removed: purge_records(records, horizon, now),
    };

    if !summary.is_empty() {
        tracing::info!(
            events = summary.events_removed,
            records = summary.records_removed,
            "purged entries past the retention horizon"
        );
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FailureDetails, FailureEvent, FailureType, LearningMode, StudyItem};

    fn item(id: &str) -> StudyItem {
        StudyItem::new(id, "en", "ki", "cat")
    }

    fn event_at(id: &str, ts: DateTime<Utc>) -> FailureEvent {
        FailureEvent::new(
            &item(id),
            FailureType::RecallError,
            LearningMode::Flashcard,
            FailureDetails::default(),
            ts,
        )
    }

    #[test]
    fn test_evaluate_boundary() {
        let now = Utc::now();
        let horizon = Duration::days(30);
        assert_eq!(
            evaluate(now - Duration::days(30), horizon, now),
            RetentionResult::Fresh
        );
        assert_eq!(
            evaluate(now - Duration::days(30) - Duration::seconds(1), horizon, now),
            RetentionResult::Expired
        );
        assert!(!evaluate(now, horizon, now).should_purge());
    }

    #[test]
    fn test_purge_events() {
        let now = Utc::now();
        let mut history = EventHistory::new(10);
        history.push(event_at("old", now - Duration::days(45)));
        history.push(event_at("new", now - Duration::days(2)));

        let removed = purge_events(&mut history, Duration::days(30), now);
        assert_eq!(removed, 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.iter().next().unwrap().item_id, "new");
    }

    #[test]
    fn test_purge_records() {
        let now = Utc::now();
        let mut records = BTreeMap::new();
        for (id, days) in [("old", 31), ("new", 29)] {
            let r = DifficultyRecord::first_failure(
                &item(id),
                FailureType::RecallError,
                100,
                now - Duration::days(days),
            );
            records.insert(id.to_string(), r);
        }

        assert_eq!(purge_records(&mut records, Duration::days(30), now), 1);
        assert!(records.contains_key("new"));
        assert!(!records.contains_key("old"));
    }

    #[test]
    fn test_run_retention_summary() {
        let now = Utc::now();
        let mut records = BTreeMap::new();
        let mut history = EventHistory::new(10);
        let old = now - Duration::days(60);
        records.insert(
            "old".to_string(),
            DifficultyRecord::first_failure(&item("old"), FailureType::RecallError, 100, old),
        );
        history.push(event_at("old", old));
        history.push(event_at("old", old));

        let summary = run_retention(&mut records, &mut history, &RetentionConfig::default(), now);
        assert_eq!(
            summary,
            PurgeSummary {
                events_removed: 2,
                records_removed: 1
            }
        );
        assert!(records.is_empty());
        assert!(history.is_empty());

        let again = run_retention(&mut records, &mut history, &RetentionConfig::default(), now);
        assert!(again.is_empty());
    }
}
