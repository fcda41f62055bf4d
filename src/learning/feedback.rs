//! User corrections and their quality signal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tag::Tag;

/// Tri-state quality of a piece of feedback.
///
/// Built from any number: positive values are `Positive`, negative values are
/// `Negative`, zero and NaN are `Neutral`. Serialized as `1`, `0` or `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "f64", into = "i8")]
pub enum FeedbackQuality {
    Negative,
    Neutral,
    Positive,
}

impl FeedbackQuality {
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            Self::Positive
        } else if score < 0.0 {
            Self::Negative
        } else {
            // Zero, and NaN (all comparisons false).
            Self::Neutral
        }
    }

    pub fn as_score(self) -> i8 {
        match self {
            Self::Negative => -1,
            Self::Neutral => 0,
            Self::Positive => 1,
        }
    }

    /// Increment applied to the corrected tag's sender-preference weight.
    pub fn preference_increment(self) -> f64 {
        match self {
            Self::Positive => 1.5,
            Self::Neutral => 1.0,
            Self::Negative => 0.5,
        }
    }
}

impl From<f64> for FeedbackQuality {
    fn from(score: f64) -> Self {
        Self::from_score(score)
    }
}

impl From<FeedbackQuality> for i8 {
    fn from(q: FeedbackQuality) -> Self {
        q.as_score()
    }
}

impl std::fmt::Display for FeedbackQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Negative => write!(f, "negative"),
            Self::Neutral => write!(f, "neutral"),
            Self::Positive => write!(f, "positive"),
        }
    }
}

/// A user's statement that a message should carry `correct_tag`.
///
/// When `correct_tag == original_tag` this is a confirmation rather than a
/// correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub message_id: String,
    pub original_tag: Tag,
    pub correct_tag: Tag,
    pub sender: String,
    pub feedback_quality: FeedbackQuality,
    pub timestamp: DateTime<Utc>,
}

impl Correction {
    pub fn new(
        message_id: impl Into<String>,
        original_tag: Tag,
        correct_tag: Tag,
        sender: impl Into<String>,
        feedback_quality: FeedbackQuality,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            original_tag,
            correct_tag,
            sender: sender.into(),
            feedback_quality,
            timestamp: Utc::now(),
        }
    }

    pub fn is_confirmation(&self) -> bool {
        self.original_tag == self.correct_tag
    }
}

/// Append-only correction log.
pub type CorrectionLog = Vec<Correction>;

/// What processing a correction changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackOutcome {
    /// Sender's preferred tag after this correction.
    pub preferred_tag: Tag,
    /// New confidence, or `None` when the message id was never tagged.
    pub confidence: Option<f64>,
    /// All stores were written (or the engine is memory-only).
    pub persisted: bool,
}

impl FeedbackOutcome {
    /// The correction was fully applied and durably recorded.
    pub fn is_success(&self) -> bool {
        self.persisted && self.confidence.is_some()
    }
}
