//! Rule-based message tagging.
//!
//! # Pipeline
//!
//! 1. [`FeatureSet::extract`] lower-cases the message and collects pattern hits
//!    per tag, time urgency and the reduced-state flags.
//! 2. [`TagScorer::score`] turns hits into per-tag scores, applies the sender
//!    preference nudge, and selects a tag (or falls back to `GENERAL`).
//!
//! Both steps are pure. Recording the result is the engine's job.

pub mod features;
pub mod patterns;
pub mod scorer;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tag::Tag;

pub use features::{FeatureSet, TagMatches};
pub use scorer::TagScorer;

/// Summary of extracted features returned alongside a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturesDetected {
    pub time_urgency: f64,
    pub word_count: usize,
    pub has_attachments: bool,
}

/// Outcome of tagging one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagResult {
    pub tag: Tag,
    /// In `[0, 1]`.
    pub confidence: f64,
    /// Human-readable trace for the selected tag.
    pub reasoning: Vec<String>,
    /// Score of every scored tag (excludes `GENERAL`).
    pub all_scores: BTreeMap<Tag, f64>,
    pub features_detected: FeaturesDetected,
}
