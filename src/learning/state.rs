//! Reduced state projection used as the value-store key.
//!
//! Deliberately coarser than the tagging features: only the sender bucket and
//! three content flags take part, so feedback generalizes across messages from
//! the same sender with similar content.

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::tagging::FeatureSet;

/// Sender bucket used when the message has no sender.
pub const UNKNOWN_SENDER: &str = "unknown";

/// Senders without `@` are truncated to this many characters.
const SENDER_PREFIX_CHARS: usize = 10;

/// Canonical string key of a [`ReducedState`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(String);

impl StateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StateKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The four features the value store is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReducedState {
    pub sender_bucket: String,
    pub has_deadline: bool,
    pub has_emoji: bool,
    pub is_work_related: bool,
}

impl ReducedState {
    pub fn from_message(message: &Message) -> Self {
        Self::from_features(&FeatureSet::extract(message), &message.sender)
    }

    /// Build from already-extracted features plus the raw sender.
    pub fn from_features(features: &FeatureSet, sender: &str) -> Self {
        Self {
            sender_bucket: sender_bucket(sender),
            has_deadline: features.has_deadline,
            has_emoji: features.has_emoji,
            is_work_related: features.is_work_related,
        }
    }

    /// `{sender_bucket}_{has_deadline}_{has_emoji}_{is_work_related}`.
    ///
    /// Field order is fixed; changing it orphans every persisted value.
    pub fn canonical_key(&self) -> StateKey {
        StateKey(format!(
            "{}_{}_{}_{}",
            self.sender_bucket, self.has_deadline, self.has_emoji, self.is_work_related
        ))
    }
}

/// Local part of an address, else its first ten characters, else `unknown`.
///
/// Lower-cased and trimmed so the same sender always maps to one bucket.
pub fn sender_bucket(sender: &str) -> String {
    let sender = sender.trim().to_lowercase();
    if sender.is_empty() {
        return UNKNOWN_SENDER.to_string();
    }
    match sender.split_once('@') {
        Some((local, _)) if !local.is_empty() => local.to_string(),
        Some(_) => UNKNOWN_SENDER.to_string(),
        None => sender.chars().take(SENDER_PREFIX_CHARS).collect(),
    }
}
