//! Per-sender tag preference voting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tag::Tag;

use super::feedback::FeedbackQuality;

/// Canonical form of a sender address used as the preference key.
pub fn normalize_sender(sender: &str) -> String {
    sender.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagWeight {
    pub tag: Tag,
    pub weight: f64,
}

/// Accumulated votes for one sender, in first-vote order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderPreference {
    pub weights: Vec<TagWeight>,
    pub preferred: Tag,
}

impl SenderPreference {
    fn new(tag: Tag, weight: f64) -> Self {
        Self {
            weights: vec![TagWeight { tag, weight }],
            preferred: tag,
        }
    }

    fn add(&mut self, tag: Tag, weight: f64) {
        match self.weights.iter_mut().find(|w| w.tag == tag) {
            Some(entry) => entry.weight += weight,
            None => self.weights.push(TagWeight { tag, weight }),
        }
        self.preferred = self.arg_max();
    }

    /// Highest weight; the earliest-voted tag wins ties.
    fn arg_max(&self) -> Tag {
        let mut best = &self.weights[0];
        for w in &self.weights[1..] {
            if w.weight > best.weight {
                best = w;
            }
        }
        best.tag
    }

    pub fn weight_of(&self, tag: Tag) -> f64 {
        self.weights
            .iter()
            .find(|w| w.tag == tag)
            .map_or(0.0, |w| w.weight)
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().map(|w| w.weight).sum()
    }
}

/// Sender → preference table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderPreferences {
    senders: BTreeMap<String, SenderPreference>,
}

impl SenderPreferences {
    /// Vote for `tag` on behalf of `sender` and return the new preferred tag.
    pub fn record(&mut self, sender: &str, tag: Tag, quality: FeedbackQuality) -> Tag {
        let weight = quality.preference_increment();
        let key = normalize_sender(sender);
        match self.senders.get_mut(&key) {
            Some(pref) => {
                pref.add(tag, weight);
                pref.preferred
            }
            None => {
                self.senders.insert(key, SenderPreference::new(tag, weight));
                tag
            }
        }
    }

    pub fn preferred_tag(&self, sender: &str) -> Option<Tag> {
        self.senders
            .get(&normalize_sender(sender))
            .map(|p| p.preferred)
    }

    pub fn get(&self, sender: &str) -> Option<&SenderPreference> {
        self.senders.get(&normalize_sender(sender))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SenderPreference)> {
        self.senders.iter()
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}
