//! The failure tracker: entry point for exercise engines.
//!
//! Exercise engines report each answer here. The tracker updates per-item
//! difficulty records and the bounded event history under a single lock,
//! updates the active session, and signals the background writer, which
//! snapshots the state on its own thread. Nothing in this module returns an error to an exercise engine:
//! storage problems are logged and the in-memory state stays authoritative.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::core::{
    Clock, DifficultyRecord, FailureDetails, FailureEvent, FailureType, LearningMode, StudyItem,
    SystemClock,
};
use crate::error::{FailOpen, Result};
use crate::storage::{PersistedState, PersistenceWorker, SnapshotSource, StateStore};
use crate::tracking::queries::{self, FailureStats, MasteryDistribution, RecordMap, ScoredRecord};
use crate::tracking::retention::{self, PurgeSummary};
use crate::tracking::{EventHistory, SessionStats};

/// Mutable tracker state, always accessed under the tracker's lock.
#[derive(Debug)]
struct TrackerState {
    records: RecordMap,
    history: EventHistory,
    session: SessionStats,
}

impl TrackerState {
    fn snapshot(&self) -> PersistedState {
        PersistedState {
            events: self.history.to_vec(),
            records: self.records.clone(),
        }
    }
}

/// Tracks failures and successes per item and classifies mastery.
///
/// Mutations are serialized by an internal mutex, so a tracker can be shared
/// across threads behind an `Arc`. Queries take the same lock and work on a
/// consistent view of the state.
pub struct FailureTracker {
    state: Arc<Mutex<TrackerState>>,
    store: Arc<dyn StateStore>,
    worker: Option<PersistenceWorker>,
    clock: Arc<dyn Clock>,
    config: Config,
}

impl FailureTracker {
    /// Create a tracker using wall-clock time.
    ///
    /// Blocks while prior state is loaded from `store`.
    pub fn new(store: Arc<dyn StateStore>, config: Config) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Create a tracker reading time from `clock`.
    pub fn with_clock(store: Arc<dyn StateStore>, config: Config, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();

        let loaded = PersistedState::load_from(&*store)
            .fail_open_default("loading tracker state (starting empty)");

        let mut records = loaded.records;
        let mut history = EventHistory::from_events(loaded.events, config.retention.max_records);
        let purged = retention::run_retention(&mut records, &mut history, &config.retention, now);

        tracing::info!(
            records = records.len(),
            events = history.len(),
            "loaded tracker state"
        );

        let state = Arc::new(Mutex::new(TrackerState {
            records,
            history,
            session: SessionStats::start(now),
        }));

        let shared = Arc::clone(&state);
        let source: SnapshotSource = Box::new(move || {
            shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .snapshot()
        });
        let worker = PersistenceWorker::spawn(Arc::clone(&store), source, &config.persistence)
            .map(Some)
            .fail_open_with("starting persistence worker (saving synchronously)", None);

        let tracker = Self {
            state,
            store,
            worker,
            clock,
            config,
        };

        if !purged.is_empty() {
            let state = tracker.lock();
            tracker.persist(&state);
        }

        tracker
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Tell the writer that state changed. The writer snapshots the state
    /// itself, so nothing is cloned here. Without a writer the state is saved
    /// inline.
    fn persist(&self, state: &TrackerState) {
        match &self.worker {
            Some(worker) => worker.mark_dirty(),
            None => state
                .snapshot()
                .save_to(&*self.store)
                .fail_open_default("saving tracker state"),
        }
    }

    /// The configuration this tracker was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Recording
    // ---------------------------------------------------------------------

    /// Record an incorrect answer.
    ///
    /// Appends a failure event (evicting the oldest when the history is full),
    /// creates or updates the item's record, and forces it to Struggling with
    /// a zero streak.
    pub fn record_failure(
        &self,
        item: &StudyItem,
        failure_type: FailureType,
        mode: LearningMode,
        details: FailureDetails,
    ) {
        let now = self.now();
        let response_time_ms = details.response_time_ms;
        let mut state = self.lock();

        let event = FailureEvent::new(item, failure_type, mode, details, now);
        if let Some(evicted) = state.history.push(event) {
            tracing::debug!(item_id = %evicted.item_id, "evicted oldest failure event");
        }

        let first_ever = match state.records.get_mut(&item.item_id) {
            Some(record) => {
                record.register_failure(failure_type, response_time_ms, now);
                false
            }
            None => {
                let record =
                    DifficultyRecord::first_failure(item, failure_type, response_time_ms, now);
                state.records.insert(item.item_id.clone(), record);
                true
            }
        };

        state
            .session
            .record_failure(&item.item_id, failure_type, mode, first_ever);

        tracing::debug!(
            item_id = %item.item_id,
            failure_type = %failure_type,
            mode = %mode,
            "recorded failure"
        );

        self.persist(&state);
    }

    /// Record a correct answer.
    ///
    /// Items without a record (never failed) are not tracked; the call is a
    /// no-op for them.
    pub fn record_success(&self, item: &StudyItem, mode: LearningMode, response_time_ms: u64) {
        let now = self.now();
        let mut state = self.lock();

        let Some(record) = state.records.get_mut(&item.item_id) else {
            tracing::trace!(item_id = %item.item_id, "success on untracked item ignored");
            return;
        };

        let before = record.mastery_level;
        record.register_success(response_time_ms, now);
        let after = record.mastery_level;

        state.session.record_success(&item.item_id);

        tracing::debug!(
            item_id = %item.item_id,
            mode = %mode,
            from = %before,
            to = %after,
            "recorded success"
        );

        self.persist(&state);
    }

    /// Forget an item entirely: its record and all of its events.
    ///
    /// Used when a learner marks an item as known.
    pub fn clear_failures_for_item(&self, item_id: &str) {
        let mut state = self.lock();
        let had_record = state.records.remove(item_id).is_some();
        let events = state.history.remove_item(item_id);

        if !had_record && events == 0 {
            return;
        }

        tracing::info!(item_id, events, "cleared failures for item");
        self.persist(&state);
    }

    /// Clear all records and history, persist the empty state, and start a
    /// new session.
    pub fn reset_all(&self) {
        let now = self.now();
        let mut state = self.lock();
        state.records.clear();
        state.history.clear();
        state.session.end(now);
        state.session = SessionStats::start(now);

        tracing::info!("reset all failure tracking");
        self.persist(&state);
    }

    /// Run the retention pass now instead of waiting for the next load.
    pub fn purge_expired(&self) -> PurgeSummary {
        let now = self.now();
        let mut state = self.lock();
        let TrackerState {
            records, history, ..
        } = &mut *state;
        let summary = retention::run_retention(records, history, &self.config.retention, now);
        if !summary.is_empty() {
            self.persist(&state);
        }
        summary
    }

    // ---------------------------------------------------------------------
    // Sessions
    // ---------------------------------------------------------------------

    /// End the current session and start a new one. Returns the new session id.
    pub fn start_session(&self) -> String {
        let now = self.now();
        let mut state = self.lock();
        state.session.end(now);
        state.session = SessionStats::start(now);
        tracing::debug!(session_id = %state.session.session_id, "started session");
        state.session.session_id.clone()
    }

    /// Stamp the current session's end time and return its final counters.
    ///
    /// Later attempts still count toward this session until
    /// [`start_session`](Self::start_session) is called.
    pub fn end_session(&self) -> SessionStats {
        let now = self.now();
        let mut state = self.lock();
        state.session.end(now);
        state.session.clone()
    }

    /// Snapshot of the active session's counters.
    pub fn current_session(&self) -> SessionStats {
        self.lock().session.clone()
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Items with the most failures, up to `limit`.
    pub fn get_problem_words(&self, limit: usize) -> Vec<DifficultyRecord> {
        queries::problem_words(&self.lock().records, limit)
    }

    /// Items that have failed with `failure_type`.
    pub fn get_words_by_failure_type(&self, failure_type: FailureType) -> Vec<DifficultyRecord> {
        queries::words_by_failure_type(&self.lock().records, failure_type)
    }

    /// Items in `category`, most failures first.
    pub fn get_problem_words_by_category(&self, category: &str) -> Vec<DifficultyRecord> {
        queries::problem_words_by_category(&self.lock().records, category)
    }

    /// Items needing attention, most urgent first.
    pub fn get_words_needing_attention(&self, limit: usize) -> Vec<DifficultyRecord> {
        self.get_scored_words_needing_attention(limit)
            .into_iter()
            .map(|s| s.record)
            .collect()
    }

    /// Items needing attention with their priorities.
    pub fn get_scored_words_needing_attention(&self, limit: usize) -> Vec<ScoredRecord> {
        let now = self.now();
        queries::words_needing_attention(&self.lock().records, &self.config.attention, now, limit)
    }

    /// Failure events for one item, oldest first.
    pub fn get_improvement_trends(&self, item_id: &str) -> Vec<FailureEvent> {
        queries::improvement_trends(&self.lock().history, item_id)
    }

    /// Summary statistics over the failure history.
    pub fn get_failure_stats(&self) -> FailureStats {
        let now = self.now();
        let state = self.lock();
        queries::failure_stats(&state.history, &state.records, now)
    }

    /// Number of records at each mastery level.
    pub fn mastery_distribution(&self) -> MasteryDistribution {
        queries::mastery_distribution(&self.lock().records)
    }

    /// The record for one item, if it has ever failed.
    pub fn get_record(&self, item_id: &str) -> Option<DifficultyRecord> {
        self.lock().records.get(item_id).cloned()
    }

    /// Copy of every record, keyed by item id.
    pub fn records(&self) -> BTreeMap<String, DifficultyRecord> {
        self.lock().records.clone()
    }

    /// Copy of the event history, oldest first.
    pub fn events(&self) -> Vec<FailureEvent> {
        self.lock().history.to_vec()
    }

    /// Number of tracked items.
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Whether no item is tracked.
    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Number of events in history.
    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Block until pending state has been handed to the store.
    pub fn flush(&self) -> Result<()> {
        match &self.worker {
            Some(worker) => worker.flush(),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for FailureTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("FailureTracker")
            .field("records", &state.records.len())
            .field("events", &state.history.len())
            .field("session", &state.session.session_id)
            .field("worker", &self.worker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ManualClock, MasteryLevel};
    use crate::storage::{MemoryStateStore, DIFFICULTY_WORDS_KEY, FAILURE_RECORDS_KEY};
    use chrono::Duration;

    struct Harness {
        tracker: FailureTracker,
        store: Arc<MemoryStateStore>,
        clock: Arc<ManualClock>,
    }

    fn start_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn harness_with(store: Arc<MemoryStateStore>, clock: Arc<ManualClock>, config: Config) -> Harness {
        let tracker = FailureTracker::with_clock(store.clone(), config, clock.clone());
        Harness {
            tracker,
            store,
            clock,
        }
    }

    fn harness() -> Harness {
        harness_with(
            Arc::new(MemoryStateStore::new()),
            Arc::new(ManualClock::new(start_time())),
            Config::default(),
        )
    }

    fn mbuku() -> StudyItem {
        StudyItem::new("mbuku", "book", "mbuku", "school")
    }

    fn item(id: &str) -> StudyItem {
        StudyItem::new(id, "en", "ki", "general")
    }

    fn fail(tracker: &FailureTracker, item: &StudyItem) {
        tracker.record_failure(
            item,
            FailureType::RecallError,
            LearningMode::Flashcard,
            FailureDetails::with_response_time(1000),
        );
    }

    #[test]
    fn test_scenario_a_first_failure() {
        let h = harness();
        h.tracker.record_failure(
            &mbuku(),
            FailureType::RecallError,
            LearningMode::Flashcard,
            FailureDetails::with_response_time(4000),
        );

        let top = h.tracker.get_problem_words(1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].item_id, "mbuku");
        assert_eq!(top[0].failure_count, 1);
        assert_eq!(top[0].mastery_level, MasteryLevel::Struggling);
        assert_eq!(top[0].average_response_time_ms, 4000.0);
    }

    #[test]
    fn test_scenario_b_streak_reaches_mastered() {
        let h = harness();
        fail(&h.tracker, &mbuku());

        h.clock.advance(Duration::days(2));
        for _ in 0..5 {
            h.clock.advance(Duration::days(1));
            h.tracker
                .record_success(&mbuku(), LearningMode::Flashcard, 900);
        }

        let record = h.tracker.get_record("mbuku").unwrap();
        assert_eq!(record.improvement_streak, 5);
        assert_eq!(record.days_since_last_failure(h.clock.now()), 7);
        assert_eq!(record.mastery_level, MasteryLevel::Mastered);
        assert_eq!(record.failure_count, 1);
    }

    #[test]
    fn test_scenario_c_ten_failures() {
        let h = harness();
        for _ in 0..10 {
            fail(&h.tracker, &mbuku());
        }
        let record = h.tracker.get_record("mbuku").unwrap();
        assert_eq!(record.failure_count, 10);
        assert_eq!(record.mastery_level, MasteryLevel::Struggling);
        assert_eq!(
            crate::core::matching_rule(&record, h.clock.now()),
            crate::core::MasteryRule::FrequentOrRecent
        );
    }

    #[test]
    fn test_scenario_d_mastered_excluded_from_attention() {
        let h = harness();
        for _ in 0..3 {
            fail(&h.tracker, &mbuku());
        }
        fail(&h.tracker, &item("other"));
        fail(&h.tracker, &item("other"));
        fail(&h.tracker, &item("other"));

        // Five successes spread over exactly seven days
        h.clock.advance(Duration::days(3));
        for _ in 0..4 {
            h.tracker.record_success(&mbuku(), LearningMode::Flashcard, 500);
            h.clock.advance(Duration::days(1));
        }
        h.tracker.record_success(&mbuku(), LearningMode::Flashcard, 500);

        let record = h.tracker.get_record("mbuku").unwrap();
        assert_eq!(record.mastery_level, MasteryLevel::Mastered);
        assert!(record.failed_within(Duration::days(7), h.clock.now()));

        let ids: Vec<_> = h
            .tracker
            .get_words_needing_attention(10)
            .into_iter()
            .map(|r| r.item_id)
            .collect();
        assert_eq!(ids, vec!["other"]);
    }

    #[test]
    fn test_scenario_e_reset_all() {
        let h = harness();
        fail(&h.tracker, &mbuku());
        h.tracker.record_success(&mbuku(), LearningMode::Flashcard, 100);
        let old_session = h.tracker.current_session().session_id;

        h.tracker.reset_all();

        assert!(h.tracker.is_empty());
        assert_eq!(h.tracker.history_len(), 0);
        let session = h.tracker.current_session();
        assert_eq!(session.total_attempts, 0);
        assert_ne!(session.session_id, old_session);

        h.tracker.flush().unwrap();
        assert_eq!(
            h.store.read(FAILURE_RECORDS_KEY).unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(
            h.store.read(DIFFICULTY_WORDS_KEY).unwrap().as_deref(),
            Some("{}")
        );
    }

    #[test]
    fn test_scenario_f_eviction() {
        let h = harness();
        for i in 0..1001 {
            fail(&h.tracker, &item(&format!("w{i}")));
        }

        assert_eq!(h.tracker.history_len(), 1000);
        assert!(h.tracker.get_improvement_trends("w0").is_empty());
        assert_eq!(h.tracker.get_improvement_trends("w1").len(), 1);
        assert_eq!(h.tracker.get_improvement_trends("w1000").len(), 1);
        // Records are linked to events only by id and survive eviction
        assert!(h.tracker.get_record("w0").is_some());
    }

    #[test]
    fn test_history_length_is_min_of_calls_and_capacity() {
        let mut config = Config::default();
        config.retention.max_records = 5;
        let h = harness_with(
            Arc::new(MemoryStateStore::new()),
            Arc::new(ManualClock::new(start_time())),
            config,
        );
        for n in 1..=8 {
            fail(&h.tracker, &mbuku());
            assert_eq!(h.tracker.history_len(), n.min(5));
        }
    }

    #[test]
    fn test_failure_after_progress_resets() {
        let h = harness();
        fail(&h.tracker, &mbuku());
        h.clock.advance(Duration::days(4));
        for _ in 0..3 {
            h.tracker.record_success(&mbuku(), LearningMode::Flashcard, 100);
        }
        assert_eq!(
            h.tracker.get_record("mbuku").unwrap().mastery_level,
            MasteryLevel::Learning
        );

        fail(&h.tracker, &mbuku());
        let record = h.tracker.get_record("mbuku").unwrap();
        assert_eq!(record.mastery_level, MasteryLevel::Struggling);
        assert_eq!(record.improvement_streak, 0);
        assert_eq!(record.failure_count, 2);
    }

    #[test]
    fn test_success_on_untracked_item_is_noop() {
        let h = harness();
        h.tracker.record_success(&mbuku(), LearningMode::Flashcard, 100);

        assert!(h.tracker.is_empty());
        let session = h.tracker.current_session();
        assert_eq!(session.total_attempts, 0);
        assert!(session.improved_words.is_empty());
        h.tracker.flush().unwrap();
        assert_eq!(h.store.write_count(), 0);
    }

    #[test]
    fn test_session_counters() {
        let h = harness();
        fail(&h.tracker, &mbuku());
        fail(&h.tracker, &mbuku());
        h.tracker.record_failure(
            &item("ngombe"),
            FailureType::SpellingError,
            LearningMode::TypeInRecall,
            FailureDetails::default(),
        );
        h.tracker.record_success(&mbuku(), LearningMode::Flashcard, 100);

        let session = h.tracker.current_session();
        assert_eq!(session.total_attempts, 4);
        assert_eq!(session.total_failures, 3);
        assert_eq!(session.failures_by_type.get(FailureType::RecallError), 2);
        assert_eq!(session.failures_by_mode.get(LearningMode::TypeInRecall), 1);
        assert_eq!(session.new_problem_words.len(), 2);
        assert!(session.improved_words.contains("mbuku"));
    }

    #[test]
    fn test_start_session_resets_counters() {
        let h = harness();
        fail(&h.tracker, &mbuku());
        let first = h.tracker.current_session().session_id;

        let second = h.tracker.start_session();
        assert_ne!(first, second);
        let session = h.tracker.current_session();
        assert_eq!(session.total_attempts, 0);
        assert!(session.is_active());
        // Records are untouched by session changes
        assert_eq!(h.tracker.len(), 1);
    }

    #[test]
    fn test_end_session() {
        let h = harness();
        fail(&h.tracker, &mbuku());
        h.clock.advance(Duration::minutes(10));
        let ended = h.tracker.end_session();
        assert_eq!(ended.end_time, Some(h.clock.now()));
        assert_eq!(ended.total_failures, 1);
    }

    #[test]
    fn test_clear_failures_for_item() {
        let h = harness();
        fail(&h.tracker, &mbuku());
        fail(&h.tracker, &mbuku());
        fail(&h.tracker, &item("other"));

        h.tracker.clear_failures_for_item("mbuku");

        assert!(h.tracker.get_record("mbuku").is_none());
        assert!(h.tracker.get_improvement_trends("mbuku").is_empty());
        assert_eq!(h.tracker.history_len(), 1);
        assert!(h.tracker.get_record("other").is_some());

        // Unknown ids are ignored
        h.tracker.clear_failures_for_item("missing");
        assert_eq!(h.tracker.len(), 1);
    }

    #[test]
    fn test_round_trip_through_store() {
        let store = Arc::new(MemoryStateStore::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let h = harness_with(store.clone(), clock.clone(), Config::default());
        fail(&h.tracker, &mbuku());
        h.clock.advance(Duration::days(1));
        fail(&h.tracker, &item("ngombe"));
        h.tracker.record_success(&mbuku(), LearningMode::Flashcard, 300);
        h.tracker.flush().unwrap();

        let records = h.tracker.records();
        let events = h.tracker.events();
        drop(h);

        let reloaded = harness_with(store, clock, Config::default());
        assert_eq!(reloaded.tracker.records(), records);
        assert_eq!(reloaded.tracker.events(), events);
    }

    #[test]
    fn test_load_purges_expired_entries() {
        let store = Arc::new(MemoryStateStore::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let h = harness_with(store.clone(), clock.clone(), Config::default());
        fail(&h.tracker, &item("old"));
        h.clock.advance(Duration::days(20));
        fail(&h.tracker, &item("new"));
        h.tracker.flush().unwrap();
        drop(h);

        clock.advance(Duration::days(15));
        let reloaded = harness_with(store.clone(), clock, Config::default());

        assert!(reloaded.tracker.get_record("old").is_none());
        assert!(reloaded.tracker.get_record("new").is_some());
        assert_eq!(reloaded.tracker.history_len(), 1);

        // The purge is written back
        reloaded.tracker.flush().unwrap();
        let persisted = PersistedState::load_from(&*store).unwrap();
        assert!(!persisted.records.contains_key("old"));
    }

    #[test]
    fn test_purge_expired_on_demand() {
        let h = harness();
        fail(&h.tracker, &mbuku());
        h.clock.advance(Duration::days(31));

        let summary = h.tracker.purge_expired();
        assert_eq!(summary.events_removed, 1);
        assert_eq!(summary.records_removed, 1);
        assert!(h.tracker.is_empty());
    }

    #[test]
    fn test_corrupt_state_starts_empty() {
        let store = Arc::new(MemoryStateStore::new());
        store.write(DIFFICULTY_WORDS_KEY, "{{{{ definitely not json").unwrap();
        store.write(FAILURE_RECORDS_KEY, "[]").unwrap();

        let h = harness_with(
            store,
            Arc::new(ManualClock::new(start_time())),
            Config::default(),
        );
        assert!(h.tracker.is_empty());

        // Still fully usable
        fail(&h.tracker, &mbuku());
        assert_eq!(h.tracker.len(), 1);
    }

    #[test]
    fn test_zero_failure_record_is_rejected() {
        let store = Arc::new(MemoryStateStore::new());
        let mut record = DifficultyRecord::first_failure(
            &mbuku(),
            FailureType::RecallError,
            1000,
            start_time(),
        );
        record.failure_count = 0;
        record.mastery_level = MasteryLevel::Mastered;
        let records = BTreeMap::from([(record.item_id.clone(), record)]);
        store
            .write(DIFFICULTY_WORDS_KEY, &serde_json::to_string(&records).unwrap())
            .unwrap();
        store.write(FAILURE_RECORDS_KEY, "[]").unwrap();

        let h = harness_with(
            store,
            Arc::new(ManualClock::new(start_time())),
            Config::default(),
        );
        assert!(h.tracker.is_empty());
        assert!(h.tracker.get_record("mbuku").is_none());
        assert_eq!(h.tracker.mastery_distribution().mastered, 0);
    }

    #[test]
    fn test_write_failures_do_not_affect_memory() {
        let h = harness();
        h.store.set_fail_writes(true);

        fail(&h.tracker, &mbuku());
        h.tracker.flush().unwrap();

        assert_eq!(h.tracker.get_record("mbuku").unwrap().failure_count, 1);
        assert!(h.store.is_empty());
    }

    #[test]
    fn test_rapid_writes_are_coalesced() {
        let mut config = Config::default();
        config.persistence.debounce_ms = 60_000;
        config.persistence.max_wait_ms = 60_000;
        let h = harness_with(
            Arc::new(MemoryStateStore::new()),
            Arc::new(ManualClock::new(start_time())),
            config,
        );
        for _ in 0..50 {
            fail(&h.tracker, &mbuku());
        }
        h.tracker.flush().unwrap();

        // One save of two documents
        assert_eq!(h.store.write_count(), 2);
        let persisted = PersistedState::load_from(&*h.store).unwrap();
        assert_eq!(persisted.events.len(), 50);
        assert_eq!(persisted.records["mbuku"].failure_count, 50);
    }

    #[test]
    fn test_sustained_answers_are_saved_before_going_quiet() {
        let mut config = Config::default();
        config.persistence.debounce_ms = 250;
        config.persistence.max_wait_ms = 500;
        let h = harness_with(
            Arc::new(MemoryStateStore::new()),
            Arc::new(ManualClock::new(start_time())),
            config,
        );

        // Answers arrive faster than the debounce window for well past max wait
        for _ in 0..15 {
            fail(&h.tracker, &mbuku());
            std::thread::sleep(std::time::Duration::from_millis(80));
        }

        assert!(h.store.write_count() >= 2);
        let persisted = PersistedState::load_from(&*h.store).unwrap();
        assert!(persisted.records["mbuku"].failure_count >= 1);
    }

    #[test]
    fn test_failure_stats_and_distribution() {
        let h = harness();
        fail(&h.tracker, &mbuku());
        h.tracker.record_failure(
            &item("ngombe"),
            FailureType::VowelError,
            LearningMode::VowelHunt,
            FailureDetails {
                difficulty_tag: "hard".to_string(),
                ..FailureDetails::default()
            },
        );
        h.tracker.record_failure(
            &item("ngombe"),
            FailureType::VowelError,
            LearningMode::VowelHunt,
            FailureDetails::default(),
        );

        let stats = h.tracker.get_failure_stats();
        assert_eq!(stats.total_failures, 3);
        assert_eq!(stats.failures_last_24h, 3);
        assert_eq!(stats.unique_problem_words, 2);
        assert_eq!(stats.most_common_failure_type, Some(FailureType::VowelError));
        assert_eq!(stats.most_challenging_mode, Some(LearningMode::VowelHunt));

        let dist = h.tracker.mastery_distribution();
        assert_eq!(dist.get(MasteryLevel::Struggling), 2);
    }

    #[test]
    fn test_concurrent_failures_are_not_lost() {
        use std::thread;

        let h = harness();
        let tracker = Arc::new(h.tracker);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                thread::spawn(move || {
                    for _ in 0..25 {
                        fail(&tracker, &mbuku());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.get_record("mbuku").unwrap().failure_count, 200);
        assert_eq!(tracker.history_len(), 200);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Fail(u8),
            Succeed(u8),
            Advance(u8),
        }

        fn arb_op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u8..4).prop_map(Op::Fail),
                (0u8..4).prop_map(Op::Succeed),
                (0u8..48).prop_map(Op::Advance),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            // Property: every stored record has failed at least once, and a
            // failure always leaves the item Struggling with no streak
            #[test]
            fn prop_record_invariants(ops in prop::collection::vec(arb_op(), 1..60)) {
                let h = harness();
                for op in ops {
                    match op {
                        Op::Fail(i) => {
                            let it = item(&format!("w{i}"));
                            fail(&h.tracker, &it);
                            let r = h.tracker.get_record(&it.item_id).unwrap();
                            prop_assert_eq!(r.mastery_level, MasteryLevel::Struggling);
                            prop_assert_eq!(r.improvement_streak, 0);
                        }
                        Op::Succeed(i) => {
                            h.tracker.record_success(&item(&format!("w{i}")), LearningMode::Flashcard, 100);
                        }
                        Op::Advance(hours) => h.clock.advance(Duration::hours(i64::from(hours))),
                    }
                    for record in h.tracker.records().values() {
                        prop_assert!(record.failure_count >= 1);
                    }
                }
            }
        }
    }
}
