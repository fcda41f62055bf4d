//! Feature extraction: message → canonical `FeatureSet`.
//!
//! Pure and deterministic. Absent message fields behave as empty strings, so
//! an empty message yields an all-zero feature set.

use serde::Serialize;

use crate::message::{Message, sender_domain};
use crate::tag::Tag;

use super::patterns::{
    DEADLINE_WORDS, EMOJI_MARKERS, HIGH_URGENCY_BONUS, HIGH_URGENCY_WORDS, MAX_TIME_URGENCY,
    MEDIUM_URGENCY_BONUS, MEDIUM_URGENCY_WORDS, PROMO_WORDS, SUBJECT_REGEXES, TAG_PATTERNS,
    TIME_PATTERN_BONUS, TIME_PATTERNS, WORK_WORDS,
};

/// Pattern hits for one scored tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagMatches {
    pub tag: Tag,
    pub keywords: Vec<&'static str>,
    pub subject_patterns: Vec<&'static str>,
    pub sender_patterns: Vec<&'static str>,
}

/// Everything the scorer and the value-store featurizer read from a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSet {
    /// Lower-cased, trimmed sender address.
    pub sender: String,
    /// Part after `@`, empty when the sender has none.
    pub sender_domain: String,
    /// One entry per scored tag, in table order.
    pub matches: Vec<TagMatches>,
    /// Sum of time-pressure bonuses, capped at 5.0.
    pub time_urgency: f64,
    pub word_count: usize,
    pub has_attachments: bool,
    pub has_deadline: bool,
    pub is_work_related: bool,
    pub is_promotional: bool,
    pub has_emoji: bool,
}

impl FeatureSet {
    pub fn extract(message: &Message) -> Self {
        let subject = message.subject.to_lowercase();
        let body = message.body.to_lowercase();
        let sender = message.sender.trim().to_lowercase();
        let domain = if sender.contains('@') {
            sender_domain(&sender).to_string()
        } else {
            String::new()
        };
        let text = format!("{subject} {body}");

        let matches = TAG_PATTERNS
            .iter()
            .zip(SUBJECT_REGEXES.iter())
            .map(|(pattern, regexes)| TagMatches {
                tag: pattern.tag,
                keywords: pattern
                    .keywords
                    .iter()
                    .copied()
                    .filter(|kw| text.contains(kw))
                    .collect(),
                subject_patterns: pattern
                    .subject_patterns
                    .iter()
                    .zip(regexes)
                    .filter(|(_, re)| re.is_match(&subject))
                    .map(|(src, _)| *src)
                    .collect(),
                sender_patterns: pattern
                    .sender_patterns
                    .iter()
                    .copied()
                    .filter(|p| sender.contains(p) || domain.contains(p))
                    .collect(),
            })
            .collect();

        Self {
            matches,
            time_urgency: time_urgency(&text),
            word_count: text.split_whitespace().count(),
            has_attachments: body.contains("attachment")
                || body.contains("attached")
                || message.has_image_attachments,
            has_deadline: contains_any(&text, DEADLINE_WORDS),
            is_work_related: contains_any(&text, WORK_WORDS),
            is_promotional: contains_any(&text, PROMO_WORDS),
            has_emoji: text.chars().any(|c| EMOJI_MARKERS.contains(&c)),
            sender,
            sender_domain: domain,
        }
    }

    /// Hits for a scored tag; `None` for `GENERAL`.
    pub fn matches_for(&self, tag: Tag) -> Option<&TagMatches> {
        self.matches.iter().find(|m| m.tag == tag)
    }
}

/// Time-pressure score of lower-cased text, in `[0, 5]`.
///
/// Words are matched as substrings, so "now" also fires inside "know".
pub fn time_urgency(text: &str) -> f64 {
    let high = HIGH_URGENCY_WORDS.iter().filter(|w| text.contains(*w)).count() as f64;
    let medium = MEDIUM_URGENCY_WORDS.iter().filter(|w| text.contains(*w)).count() as f64;
    let timed = TIME_PATTERNS.iter().filter(|re| re.is_match(text)).count() as f64;

    let score =
        high * HIGH_URGENCY_BONUS + medium * MEDIUM_URGENCY_BONUS + timed * TIME_PATTERN_BONUS;
    score.min(MAX_TIME_URGENCY)
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}
