//! Per-message tag confidence with asymmetric feedback adjustment.
//!
//! Corrections shrink confidence more when the feedback was negative;
//! confirmations grow it more when the feedback was positive. The result is
//! always clamped to `[MIN_CONFIDENCE, MAX_CONFIDENCE]`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tag::Tag;

use super::feedback::{Correction, FeedbackQuality};

pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 1.0;

const CORRECTION_NEGATIVE: f64 = 0.6;
const CORRECTION_OTHER: f64 = 0.7;
const CONFIRMATION_POSITIVE: f64 = 1.2;
const CONFIRMATION_OTHER: f64 = 1.1;

/// New confidence after feedback.
pub fn adjust_confidence(current: f64, is_correction: bool, quality: FeedbackQuality) -> f64 {
    let factor = match (is_correction, quality) {
        (true, FeedbackQuality::Negative) => CORRECTION_NEGATIVE,
        (true, _) => CORRECTION_OTHER,
        (false, FeedbackQuality::Positive) => CONFIRMATION_POSITIVE,
        (false, _) => CONFIRMATION_OTHER,
    };
    (current * factor).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceRecord {
    pub tag: Tag,
    pub confidence: f64,
    /// Set by the first correction and never cleared.
    #[serde(default)]
    pub corrected: bool,
    /// Tag named by the latest correction, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_tag: Option<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_feedback_quality: Option<FeedbackQuality>,
    pub tagged_at: DateTime<Utc>,
}

/// Message id → confidence record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfidenceTable {
    records: BTreeMap<String, ConfidenceRecord>,
}

impl ConfidenceTable {
    /// Create or overwrite the tag and confidence for a message.
    ///
    /// Feedback fields of an existing record are kept.
    pub fn record_tagging(&mut self, message_id: &str, tag: Tag, confidence: f64, now: DateTime<Utc>) {
        match self.records.get_mut(message_id) {
            Some(record) => {
                record.tag = tag;
                record.confidence = confidence;
                record.tagged_at = now;
            }
            None => {
                self.records.insert(
                    message_id.to_string(),
                    ConfidenceRecord {
                        tag,
                        confidence,
                        corrected: false,
                        correct_tag: None,
                        last_feedback_quality: None,
                        tagged_at: now,
                    },
                );
            }
        }
    }

    /// Apply a correction to its message's record.
    ///
    /// Returns the new confidence, or `None` when the message was never tagged.
    pub fn apply_correction(&mut self, correction: &Correction) -> Option<f64> {
        let record = self.records.get_mut(&correction.message_id)?;
        let is_correction = !correction.is_confirmation();
        record.confidence =
            adjust_confidence(record.confidence, is_correction, correction.feedback_quality);
        record.corrected |= is_correction;
        record.correct_tag = Some(correction.correct_tag);
        record.last_feedback_quality = Some(correction.feedback_quality);
        Some(record.confidence)
    }

    pub fn get(&self, message_id: &str) -> Option<&ConfidenceRecord> {
        self.records.get(message_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfidenceRecord)> {
        self.records.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &ConfidenceRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn average_confidence(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.records.values().map(|r| r.confidence).sum::<f64>() / self.records.len() as f64
    }
}
