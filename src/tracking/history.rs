//! Bounded failure event history.
//!
//! Events are kept oldest first in a ring buffer. Appending past capacity
//! evicts the oldest event in O(1).

use std::collections::VecDeque;

use crate::core::FailureEvent;

/// FIFO-bounded log of failure events.
#[derive(Debug, Clone, PartialEq)]
pub struct EventHistory {
    events: VecDeque<FailureEvent>,
    capacity: usize,
}

impl EventHistory {
    /// Create an empty history holding at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Build a history from stored events (oldest first), keeping the newest
    /// `capacity` of them.
    pub fn from_events(events: Vec<FailureEvent>, capacity: usize) -> Self {
        let mut history = Self::new(capacity);
        let skip = events.len().saturating_sub(history.capacity);
        history.events.extend(events.into_iter().skip(skip));
        history
    }

    /// Maximum number of events retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of events currently held.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Append an event, returning the evicted oldest event if over capacity.
    pub fn push(&mut self, event: FailureEvent) -> Option<FailureEvent> {
        let evicted = if self.events.len() >= self.capacity {
            self.events.pop_front()
        } else {
            None
        };
        self.events.push_back(event);
        evicted
    }

    /// Iterate oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &FailureEvent> {
        self.events.iter()
    }

    /// All events for one item, in chronological order.
    pub fn for_item(&self, item_id: &str) -> Vec<FailureEvent> {
        let mut events: Vec<FailureEvent> = self
            .events
            .iter()
            .filter(|e| e.item_id == item_id)
            .cloned()
            .collect();
        // Insertion order is already chronological unless the clock went backwards
        events.sort_by_key(|e| e.timestamp);
        events
    }

    /// Drop every event for `item_id`. Returns how many were removed.
    pub fn remove_item(&mut self, item_id: &str) -> usize {
        let before = self.events.len();
        self.events.retain(|e| e.item_id != item_id);
        before - self.events.len()
    }

    /// Keep only events matching `keep`. Returns how many were removed.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&FailureEvent) -> bool,
    {
        let before = self.events.len();
        self.events.retain(keep);
        before - self.events.len()
    }

    /// Remove all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Copy the events out, oldest first.
    pub fn to_vec(&self) -> Vec<FailureEvent> {
        self.events.iter().cloned().collect()
    }
}
