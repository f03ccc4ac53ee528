//! Mastery classification.
//!
//! A record's mastery level is a pure function of the record and the current
//! time, evaluated against a fixed rule table (first match wins):
//!
//! 1. streak >= 5 and >= 7 days since last failure: Mastered
//! 2. streak >= 3 and >= 3 days since last failure: Learning
//! 3. failures <= 3 and >= 1 day since last failure: Learning
//! 4. failures >= 10 or < 1 day since last failure: Struggling
//! 5. otherwise: Challenging
//!
//! Promotion needs both a streak and elapsed time. Demotion only needs a
//! recent failure. Recording a failure bypasses the table entirely and forces
//! Struggling (see [`DifficultyRecord::register_failure`]).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::kinds::ParseKindError;
use super::record::DifficultyRecord;

/// Thresholds used by the rule table.
pub mod thresholds {
    /// Streak required for Mastered.
    pub const MASTERED_STREAK: u32 = 5;
    /// Days without failure required for Mastered.
    pub const MASTERED_DAYS: i64 = 7;
    /// Streak required for streak-based Learning.
    pub const LEARNING_STREAK: u32 = 3;
    /// Days without failure required for streak-based Learning.
    pub const LEARNING_DAYS: i64 = 3;
    /// Failure count at or below which a quiet item counts as Learning.
    pub const FEW_FAILURES: u32 = 3;
    /// Days without failure required for the few-failures rule.
    pub const FEW_FAILURES_DAYS: i64 = 1;
    /// Failure count at or above which an item is Struggling.
    pub const MANY_FAILURES: u32 = 10;
    /// An item that failed within this many days is Struggling.
    pub const RECENT_FAILURE_DAYS: i64 = 1;
}

/// Coarse proficiency on an item, ordered worst to best.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MasteryLevel {
    #[default]
    Struggling,
    Challenging,
    Learning,
    Mastered,
}

impl MasteryLevel {
    /// All levels, worst first.
    pub const ALL: [MasteryLevel; 4] = [
        Self::Struggling,
        Self::Challenging,
        Self::Learning,
        Self::Mastered,
    ];

    /// Wire name, e.g. `STRUGGLING`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Struggling => "STRUGGLING",
            Self::Challenging => "CHALLENGING",
            Self::Learning => "LEARNING",
            Self::Mastered => "MASTERED",
        }
    }
}

impl fmt::Display for MasteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MasteryLevel {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| ParseKindError::new("mastery level", s))
    }
}

/// The rule that produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasteryRule {
    /// Rule 1: long streak, long quiet period.
    SustainedStreak,
    /// Rule 2: medium streak, medium quiet period.
    RecoveringStreak,
    /// Rule 3: few failures and at least a day quiet.
    FewFailures,
    /// Rule 4: many failures or a failure within the last day.
    FrequentOrRecent,
    /// Rule 5: nothing else matched.
    Fallback,
}

impl MasteryRule {
    /// Level assigned by this rule.
    pub fn level(&self) -> MasteryLevel {
        match self {
            Self::SustainedStreak => MasteryLevel::Mastered,
            Self::RecoveringStreak | Self::FewFailures => MasteryLevel::Learning,
            Self::FrequentOrRecent => MasteryLevel::Struggling,
            Self::Fallback => MasteryLevel::Challenging,
        }
    }
}

/// Find the first rule in the table that matches `record` at `now`.
pub fn matching_rule(record: &DifficultyRecord, now: DateTime<Utc>) -> MasteryRule {
    use thresholds::*;

    let days = record.days_since_last_failure(now);
    let streak = record.improvement_streak;
    let failures = record.failure_count;

    if streak >= MASTERED_STREAK && days >= MASTERED_DAYS {
        MasteryRule::SustainedStreak
    } else if streak >= LEARNING_STREAK && days >= LEARNING_DAYS {
        MasteryRule::RecoveringStreak
    } else if failures <= FEW_FAILURES && days >= FEW_FAILURES_DAYS {
        MasteryRule::FewFailures
    } else if failures >= MANY_FAILURES || days < RECENT_FAILURE_DAYS {
        MasteryRule::FrequentOrRecent
    } else {
        MasteryRule::Fallback
    }
}

/// Classify `record` at `now`.
pub fn classify(record: &DifficultyRecord, now: DateTime<Utc>) -> MasteryLevel {
    matching_rule(record, now).level()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FailureType, StudyItem};
    use chrono::Duration;

    fn record(failures: u32, streak: u32, days_ago: i64, now: DateTime<Utc>) -> DifficultyRecord {
        let item = StudyItem::new("mbuku", "book", "mbuku", "school");
        let mut record = DifficultyRecord::first_failure(
            &item,
            FailureType::RecallError,
            1000,
            now - Duration::days(days_ago),
        );
        record.failure_count = failures;
        record.improvement_streak = streak;
        record
    }

    #[test]
    fn test_levels_are_ordered_worst_first() {
        assert!(MasteryLevel::Struggling < MasteryLevel::Challenging);
        assert!(MasteryLevel::Challenging < MasteryLevel::Learning);
        assert!(MasteryLevel::Learning < MasteryLevel::Mastered);
    }

    #[test]
    fn test_rule_one_mastered() {
        let now = Utc::now();
        assert_eq!(classify(&record(4, 5, 7, now), now), MasteryLevel::Mastered);
        assert_eq!(
            matching_rule(&record(20, 9, 30, now), now),
            MasteryRule::SustainedStreak
        );
    }

    #[test]
    fn test_streak_without_time_is_not_mastered() {
        let now = Utc::now();
        // Rule 1 needs seven days; rule 2 catches it instead
        assert_eq!(classify(&record(4, 5, 6, now), now), MasteryLevel::Learning);
    }

    #[test]
    fn test_rule_two_recovering() {
        let now = Utc::now();
        assert_eq!(
            matching_rule(&record(8, 3, 3, now), now),
            MasteryRule::RecoveringStreak
        );
    }

    #[test]
    fn test_rule_three_few_failures() {
        let now = Utc::now();
        assert_eq!(
            matching_rule(&record(3, 0, 1, now), now),
            MasteryRule::FewFailures
        );
    }

    #[test]
    fn test_rule_four_recent_failure() {
        let now = Utc::now();
        assert_eq!(
            classify(&record(1, 0, 0, now), now),
            MasteryLevel::Struggling
        );
    }

    #[test]
    fn test_rule_four_many_failures() {
        let now = Utc::now();
        assert_eq!(
            matching_rule(&record(10, 0, 2, now), now),
            MasteryRule::FrequentOrRecent
        );
    }

    #[test]
    fn test_rule_five_fallback() {
        let now = Utc::now();
        assert_eq!(
            classify(&record(5, 1, 2, now), now),
            MasteryLevel::Challenging
        );
    }

    #[test]
    fn test_partial_days_truncate() {
        let now = Utc::now();
        let mut r = record(2, 0, 0, now);
        r.last_failure_timestamp = now - Duration::hours(23);
        assert_eq!(classify(&r, now), MasteryLevel::Struggling);
        r.last_failure_timestamp = now - Duration::hours(25);
        assert_eq!(classify(&r, now), MasteryLevel::Learning);
    }

    #[test]
    fn test_level_parse_and_display() {
        assert_eq!("mastered".parse::<MasteryLevel>().unwrap(), MasteryLevel::Mastered);
        assert_eq!(MasteryLevel::Challenging.to_string(), "CHALLENGING");
        assert!("expert".parse::<MasteryLevel>().is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Property: classification has no hidden state
            #[test]
            fn prop_classify_is_pure(
                failures in 1u32..50,
                streak in 0u32..20,
                minutes_ago in 0i64..(60 * 24 * 40),
            ) {
                let now = Utc::now();
                let mut r = record(failures, streak, 0, now);
                r.last_failure_timestamp = now - Duration::minutes(minutes_ago);
                let first = classify(&r, now);
                for _ in 0..3 {
                    prop_assert_eq!(classify(&r, now), first);
                }
            }

            // Property: mastery is never granted without the full streak and quiet period
            #[test]
            fn prop_mastered_requires_streak_and_time(
                failures in 1u32..50,
                streak in 0u32..20,
                days_ago in 0i64..40,
            ) {
                let now = Utc::now();
                let r = record(failures, streak, days_ago, now);
                if classify(&r, now) == MasteryLevel::Mastered {
                    prop_assert!(streak >= thresholds::MASTERED_STREAK);
                    prop_assert!(days_ago >= thresholds::MASTERED_DAYS);
                }
            }

            // Property: a failure within the last day never classifies above Struggling
            #[test]
            fn prop_recent_failure_is_struggling(
                failures in 1u32..50,
                streak in 0u32..20,
                minutes_ago in 0i64..(60 * 24),
            ) {
                let now = Utc::now();
                let mut r = record(failures, streak, 0, now);
                r.last_failure_timestamp = now - Duration::minutes(minutes_ago);
                prop_assert_eq!(classify(&r, now), MasteryLevel::Struggling);
            }
        }
    }
}
