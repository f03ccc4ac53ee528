//! Core types for the mastery tracker.
//!
//! Items, failure events, per-item difficulty records, the mastery rule
//! table, and the clock abstraction everything time-dependent reads from.

pub mod clock;
pub mod item;
pub mod kinds;
pub mod mastery;
pub mod record;

pub use clock::{Clock, ManualClock, SystemClock};
pub use item::{FailureDetails, FailureEvent, StudyItem};
pub use kinds::{
    FailureType, FailureTypeTally, LearningMode, LearningModeTally, ParseKindError, Tally,
    Tallied,
};
pub use mastery::{classify, matching_rule, thresholds, MasteryLevel, MasteryRule};
pub use record::DifficultyRecord;
