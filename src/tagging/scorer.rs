//! Rule-based tag scoring with a sender-preference nudge.

use std::collections::BTreeMap;

use crate::tag::Tag;

use super::features::{FeatureSet, TagMatches};
use super::patterns::{TAG_PATTERNS, TagPattern};
use super::{FeaturesDetected, TagResult};

const KEYWORD_FACTOR: f64 = 2.0;
const SUBJECT_FACTOR: f64 = 1.5;
const SENDER_FACTOR: f64 = 1.0;

/// Multiplier for the sender's preferred tag.
pub const PREFERRED_BOOST: f64 = 1.2;
/// Multiplier for every other tag when the sender has a preference.
pub const NON_PREFERRED_DAMPING: f64 = 0.8;

/// Confidence is the winning score divided by this, capped at 1.0.
const CONFIDENCE_SCALE: f64 = 10.0;

pub const NO_PATTERN_REASON: &str = "No strong patterns detected";

/// Scores every tag in the pattern table and picks the best.
#[derive(Debug, Clone)]
pub struct TagScorer {
    fallback_threshold: f64,
    fallback_confidence: f64,
}

impl Default for TagScorer {
    fn default() -> Self {
        Self::new(0.5, 0.3)
    }
}

impl TagScorer {
    pub fn new(fallback_threshold: f64, fallback_confidence: f64) -> Self {
        Self {
            fallback_threshold,
            fallback_confidence,
        }
    }

    /// Score one tag. Returns the score and its reasoning trace.
    ///
    /// `preferred` is the sender's learned tag, if any.
    pub fn score_tag(
        &self,
        pattern: &TagPattern,
        matches: &TagMatches,
        features: &FeatureSet,
        preferred: Option<Tag>,
    ) -> (f64, Vec<String>) {
        let mut reasoning = Vec::new();

        for kw in &matches.keywords {
            reasoning.push(format!("Keyword '{kw}' found"));
        }
        for pat in &matches.subject_patterns {
            reasoning.push(format!("Subject pattern '{pat}' matched"));
        }
        for pat in &matches.sender_patterns {
            reasoning.push(format!("Sender pattern '{pat}' matched"));
        }

        let combined = fraction(matches.keywords.len(), pattern.keywords.len()) * KEYWORD_FACTOR
            + fraction(matches.subject_patterns.len(), pattern.subject_patterns.len())
                * SUBJECT_FACTOR
            + fraction(matches.sender_patterns.len(), pattern.sender_patterns.len())
                * SENDER_FACTOR;
        let mut score = pattern.weight * combined;

        let urgency = if pattern.tag == Tag::Urgent && features.time_urgency > 0.0 {
            reasoning.push(format!(
                "Time urgency detected: {:.1}",
                features.time_urgency
            ));
            features.time_urgency
        } else {
            0.0
        };

        if let Some(preferred) = preferred {
            if preferred == pattern.tag {
                score *= PREFERRED_BOOST;
                reasoning.push(format!(
                    "User preference: {} usually tagged as {}",
                    features.sender, pattern.tag
                ));
            } else {
                score *= NON_PREFERRED_DAMPING;
            }
        }

        // Added after the preference multiplier so time pressure is never damped.
        score += urgency;

        (score, reasoning)
    }

    /// Score all tags and select one.
    ///
    /// The highest score wins; ties go to the earlier tag in table order. When
    /// the best score does not exceed the fallback threshold the result is
    /// `GENERAL` with the fallback confidence.
    pub fn score(&self, features: &FeatureSet, preferred: Option<Tag>) -> TagResult {
        let mut all_scores = BTreeMap::new();
        let mut best: Option<(Tag, f64, Vec<String>)> = None;

        for (pattern, matches) in TAG_PATTERNS.iter().zip(&features.matches) {
            let (score, reasoning) = self.score_tag(pattern, matches, features, preferred);
            all_scores.insert(pattern.tag, score);
            let better = match &best {
                Some((_, top, _)) => score > *top,
                None => true,
            };
            if better {
                best = Some((pattern.tag, score, reasoning));
            }
        }

        let detected = FeaturesDetected {
            time_urgency: features.time_urgency,
            word_count: features.word_count,
            has_attachments: features.has_attachments,
        };

        match best {
            Some((tag, score, reasoning)) if score > self.fallback_threshold => TagResult {
                tag,
                confidence: (score / CONFIDENCE_SCALE).min(1.0),
                reasoning,
                all_scores,
                features_detected: detected,
            },
            _ => TagResult {
                tag: Tag::General,
                confidence: self.fallback_confidence,
                reasoning: vec![NO_PATTERN_REASON.to_string()],
                all_scores,
                features_detected: detected,
            },
        }
    }
}

fn fraction(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    fn tag(subject: &str, body: &str, sender: &str, preferred: Option<Tag>) -> TagResult {
        let msg = Message::new("t", subject, body, sender);
        TagScorer::default().score(&FeatureSet::extract(&msg), preferred)
    }

    #[test]
    fn empty_message_falls_back_to_general() {
        let result = tag("", "", "", None);
        assert_eq!(result.tag, Tag::General);
        assert_eq!(result.confidence, 0.3);
        assert_eq!(result.reasoning, vec![NO_PATTERN_REASON.to_string()]);
        assert_eq!(result.all_scores.len(), 7);
        assert!(result.all_scores.values().all(|s| *s == 0.0));
    }

    #[test]
    fn invoice_is_financial() {
        let result = tag(
            "Invoice for order #1234",
            "Your payment receipt is attached",
            "billing@shop.com",
            None,
        );
        assert_eq!(result.tag, Tag::Financial);
        assert!(result.confidence > 0.3);
        assert!(result.reasoning.contains(&"Keyword 'invoice' found".to_string()));
        assert!(
            result
                .reasoning
                .contains(&"Subject pattern 'order #\\d+' matched".to_string())
        );
        assert!(result.features_detected.has_attachments);
    }

    #[test]
    fn financial_score_formula() {
        // Keywords: invoice (1/8). Subject: invoice (1/5). Sender: none.
        let result = tag("invoice", "", "", None);
        let expected = 4.5 * ((1.0 / 8.0) * 2.0 + (1.0 / 5.0) * 1.5);
        let got = result.all_scores[&Tag::Financial];
        assert!((got - expected).abs() < 1e-12, "{got} vs {expected}");
        assert_eq!(result.tag, Tag::Financial);
        assert!((result.confidence - expected / 10.0).abs() < 1e-12);
    }

    #[test]
    fn time_urgency_is_additive_for_urgent() {
        let plain = tag("urgent", "", "", None);
        let timed = tag("urgent", "reply by 5:30", "", None);
        let diff = timed.all_scores[&Tag::Urgent] - plain.all_scores[&Tag::Urgent];
        assert!((diff - 1.5).abs() < 1e-12);
        // "urgent" itself contributes 2.0 of time urgency.
        assert!(
            timed
                .reasoning
                .contains(&"Time urgency detected: 3.5".to_string())
        );
    }

    #[test]
    fn time_urgency_survives_damping() {
        let plain = tag("urgent", "reply by 5:30", "", None);
        let damped = tag("urgent", "reply by 5:30", "", Some(Tag::Meeting));
        let base = plain.all_scores[&Tag::Urgent] - 3.5;
        let expected = base * NON_PREFERRED_DAMPING + 3.5;
        assert!((damped.all_scores[&Tag::Urgent] - expected).abs() < 1e-12);
    }

    #[test]
    fn urgency_line_precedes_preference_line() {
        let result = tag("urgent", "reply today", "pat@x.com", Some(Tag::Urgent));
        let urgency = result
            .reasoning
            .iter()
            .position(|r| r.starts_with("Time urgency detected"))
            .unwrap();
        let preference = result
            .reasoning
            .iter()
            .position(|r| r.starts_with("User preference"))
            .unwrap();
        assert!(urgency < preference);
        assert_eq!(preference, result.reasoning.len() - 1);
    }

    #[test]
    fn preference_boosts_and_damps() {
        let neutral = tag("meeting invoice", "", "pat@x.com", None);
        let prefers = tag("meeting invoice", "", "pat@x.com", Some(Tag::Meeting));
        assert!(
            (prefers.all_scores[&Tag::Meeting] - neutral.all_scores[&Tag::Meeting] * 1.2).abs()
                < 1e-12
        );
        assert!(
            (prefers.all_scores[&Tag::Financial] - neutral.all_scores[&Tag::Financial] * 0.8)
                .abs()
                < 1e-12
        );
        assert_eq!(prefers.tag, Tag::Meeting);
        assert!(
            prefers
                .reasoning
                .contains(&"User preference: pat@x.com usually tagged as MEETING".to_string())
        );
    }

    #[test]
    fn confidence_capped_at_one() {
        let result = tag(
            "URGENT: critical emergency asap",
            "urgent, overdue, respond immediately, deadline today",
            "ceo@corp.com",
            None,
        );
        assert_eq!(result.tag, Tag::Urgent);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn threshold_is_tunable() {
        let scorer = TagScorer::new(100.0, 0.25);
        let msg = Message::new("t", "invoice", "", "");
        let result = scorer.score(&FeatureSet::extract(&msg), None);
        assert_eq!(result.tag, Tag::General);
        assert_eq!(result.confidence, 0.25);
        // Scores are still reported for inspection.
        assert!(result.all_scores[&Tag::Financial] > 0.0);
    }

    #[test]
    fn deterministic() {
        let a = tag("Team meeting tomorrow", "zoom link inside", "calendar@corp.com", None);
        let b = tag("Team meeting tomorrow", "zoom link inside", "calendar@corp.com", None);
        assert_eq!(a, b);
    }
}
