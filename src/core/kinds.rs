//! Failure and learning-mode classifications reported by exercise engines.
//!
//! Both enums are also used as aggregation keys. Aggregates are stored in a
//! fixed-size [`Tally`] indexed through an exhaustive `match`, so adding a
//! variant fails to compile until every aggregate knows about it.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Error returned when parsing an unknown enum name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseKindError {
    kind: &'static str,
    value: String,
}

impl ParseKindError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Normalize user input so `recall-error`, `Recall_Error` and `RECALL_ERROR` match.
fn normalize(value: &str) -> String {
    value.trim().replace('-', "_").to_ascii_uppercase()
}

/// An enum that can key a fixed-size [`Tally`].
pub trait Tallied: Copy + Eq + fmt::Debug + 'static {
    /// Position of this variant in declaration order.
    fn ordinal(self) -> usize;
    /// All variants in declaration order.
    fn variants() -> &'static [Self];
    /// Stable wire name.
    fn name(self) -> &'static str;
}

/// How an answer went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureType {
    TranslationError,
    RecognitionError,
    RecallError,
    SpellingError,
    ConfusionError,
    TimeoutError,
    MultipleChoiceError,
    FillBlankError,
    ClozeError,
    CategoryError,
    SentenceStructureError,
    VowelError,
}

impl FailureType {
    /// All variants in declaration order.
    pub const ALL: &'static [FailureType] = &[
        Self::TranslationError,
        Self::RecognitionError,
        Self::RecallError,
        Self::SpellingError,
        Self::ConfusionError,
        Self::TimeoutError,
        Self::MultipleChoiceError,
        Self::FillBlankError,
        Self::ClozeError,
        Self::CategoryError,
        Self::SentenceStructureError,
        Self::VowelError,
    ];

    /// Number of variants.
    pub const COUNT: usize = Self::ALL.len();

    /// Wire name, e.g. `RECALL_ERROR`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TranslationError => "TRANSLATION_ERROR",
            Self::RecognitionError => "RECOGNITION_ERROR",
            Self::RecallError => "RECALL_ERROR",
            Self::SpellingError => "SPELLING_ERROR",
            Self::ConfusionError => "CONFUSION_ERROR",
            Self::TimeoutError => "TIMEOUT_ERROR",
            Self::MultipleChoiceError => "MULTIPLE_CHOICE_ERROR",
            Self::FillBlankError => "FILL_BLANK_ERROR",
            Self::ClozeError => "CLOZE_ERROR",
            Self::CategoryError => "CATEGORY_ERROR",
            Self::SentenceStructureError => "SENTENCE_STRUCTURE_ERROR",
            Self::VowelError => "VOWEL_ERROR",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::TranslationError => 0,
            Self::RecognitionError => 1,
            Self::RecallError => 2,
            Self::SpellingError => 3,
            Self::ConfusionError => 4,
            Self::TimeoutError => 5,
            Self::MultipleChoiceError => 6,
            Self::FillBlankError => 7,
            Self::ClozeError => 8,
            Self::CategoryError => 9,
            Self::SentenceStructureError => 10,
            Self::VowelError => 11,
        }
    }
}

impl Tallied for FailureType {
    fn ordinal(self) -> usize {
        self.index()
    }

    fn variants() -> &'static [Self] {
        Self::ALL
    }

    fn name(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureType {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| ParseKindError::new("failure type", s))
    }
}

/// The exercise mode that produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LearningMode {
    Flashcard,
    TypeInRecall,
    FillBlank,
    ClozeTest,
    SpeedMatch,
    MultipleAnswers,
    WordAssociation,
    BeatClock,
    StreakMaster,
    SentenceUnscramble,
    VowelHunt,
}

impl LearningMode {
    /// All variants in declaration order.
    pub const ALL: &'static [LearningMode] = &[
        Self::Flashcard,
        Self::TypeInRecall,
        Self::FillBlank,
        Self::ClozeTest,
        Self::SpeedMatch,
        Self::MultipleAnswers,
        Self::WordAssociation,
        Self::BeatClock,
        Self::StreakMaster,
        Self::SentenceUnscramble,
        Self::VowelHunt,
    ];

    /// Number of variants.
    pub const COUNT: usize = Self::ALL.len();

    /// Wire name, e.g. `FLASHCARD`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flashcard => "FLASHCARD",
            Self::TypeInRecall => "TYPE_IN_RECALL",
            Self::FillBlank => "FILL_BLANK",
            Self::ClozeTest => "CLOZE_TEST",
            Self::SpeedMatch => "SPEED_MATCH",
            Self::MultipleAnswers => "MULTIPLE_ANSWERS",
            Self::WordAssociation => "WORD_ASSOCIATION",
            Self::BeatClock => "BEAT_CLOCK",
            Self::StreakMaster => "STREAK_MASTER",
            Self::SentenceUnscramble => "SENTENCE_UNSCRAMBLE",
            Self::VowelHunt => "VOWEL_HUNT",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Flashcard => 0,
            Self::TypeInRecall => 1,
            Self::FillBlank => 2,
            Self::ClozeTest => 3,
            Self::SpeedMatch => 4,
            Self::MultipleAnswers => 5,
            Self::WordAssociation => 6,
            Self::BeatClock => 7,
            Self::StreakMaster => 8,
            Self::SentenceUnscramble => 9,
            Self::VowelHunt => 10,
        }
    }
}

impl Tallied for LearningMode {
    fn ordinal(self) -> usize {
        self.index()
    }

    fn variants() -> &'static [Self] {
        Self::ALL
    }

    fn name(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for LearningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LearningMode {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| ParseKindError::new("learning mode", s))
    }
}

/// Per-variant counters backed by a fixed-size array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally<E: Tallied, const N: usize> {
    counts: [u32; N],
    _marker: PhantomData<E>,
}

/// Failure counts keyed by [`FailureType`].
pub type FailureTypeTally = Tally<FailureType, { FailureType::COUNT }>;

/// Failure counts keyed by [`LearningMode`].
pub type LearningModeTally = Tally<LearningMode, { LearningMode::COUNT }>;

impl<E: Tallied, const N: usize> Default for Tally<E, N> {
    fn default() -> Self {
        Self {
            counts: [0; N],
            _marker: PhantomData,
        }
    }
}

impl<E: Tallied, const N: usize> Tally<E, N> {
    /// Create an all-zero tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one to the counter for `key`.
    pub fn increment(&mut self, key: E) {
        self.counts[key.ordinal()] += 1;
    }

    /// Current count for `key`.
    pub fn get(&self, key: E) -> u32 {
        self.counts[key.ordinal()]
    }

    /// Sum over all variants.
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Every variant with its count, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (E, u32)> + '_ {
        E::variants().iter().map(move |&k| (k, self.get(k)))
    }

    /// Variant with the highest count.
    ///
    /// Ties go to the variant declared first. Returns `None` when every count is zero.
    pub fn argmax(&self) -> Option<E> {
        let mut best: Option<(E, u32)> = None;
        for (key, count) in self.iter() {
            if count == 0 {
                continue;
            }
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((key, count));
            }
        }
        best.map(|(key, _)| key)
    }
}

impl<E: Tallied, const N: usize> Serialize for Tally<E, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nonzero: Vec<(E, u32)> = self.iter().filter(|(_, c)| *c > 0).collect();
        let mut map = serializer.serialize_map(Some(nonzero.len()))?;
        for (key, count) in nonzero {
            map.serialize_entry(key.name(), &count)?;
        }
        map.end()
    }
}
