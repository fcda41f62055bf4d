//! Read-only reporting over the engine's tables.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::learning::{
    ConfidenceTable, Correction, FeedbackQuality, RewardHistory, RewardTrend, SenderPreferences,
    StateKey, ValueTable,
};
use crate::tag::Tag;
use crate::tagging::patterns::pattern_for;

/// Tags whose average confidence is below this are flagged.
const LOW_CONFIDENCE: f64 = 0.6;
/// More learned senders than this suggests sender-specific rules.
const MANY_SENDERS: usize = 5;
/// Overall-quality suggestions need more corrections than this.
const MIN_CORRECTIONS_FOR_VERDICT: usize = 10;
const POOR_QUALITY: f64 = 0.5;
const GOOD_QUALITY: f64 = 0.8;
const KEYWORD_HINTS: usize = 3;

/// Aggregate engine statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub total_states: usize,
    pub total_corrections: usize,
    pub average_confidence: f64,
    pub tag_distribution: BTreeMap<Tag, usize>,
    pub correction_rate: f64,
    pub recent_reward_trend: RewardTrend,
}

/// Tagging-side statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggingStats {
    pub total_tagged: usize,
    pub total_corrections: usize,
    pub average_confidence: f64,
    pub tag_distribution: BTreeMap<Tag, usize>,
    pub correction_rate: f64,
    pub learned_senders: usize,
}

/// Value-store and reward statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningStats {
    pub total_states: usize,
    pub total_episodes: usize,
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub average_reward: f64,
    pub recent_rewards: Vec<f64>,
    pub reward_trend: RewardTrend,
    pub average_value: f64,
    pub max_value: Option<f64>,
    pub min_value: Option<f64>,
}

/// Feedback patterns per sender and per tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderInsights {
    pub sender_preferences: BTreeMap<String, Tag>,
    /// Corrections counted by the originally assigned tag.
    pub most_corrected_tags: BTreeMap<Tag, usize>,
    pub confidence_by_tag: BTreeMap<Tag, f64>,
    pub feedback_quality_by_tag: BTreeMap<Tag, f64>,
    pub total_corrections: usize,
    pub positive_feedback_count: usize,
    pub negative_feedback_count: usize,
    pub neutral_feedback_count: usize,
    /// Share of positive feedback; 0.0 without feedback.
    pub overall_feedback_quality: f64,
}

pub fn tagging_stats(
    confidence: &ConfidenceTable,
    corrections: &[Correction],
    preferences: &SenderPreferences,
) -> TaggingStats {
    let total_tagged = confidence.len();
    TaggingStats {
        total_tagged,
        total_corrections: corrections.len(),
        average_confidence: confidence.average_confidence(),
        tag_distribution: tag_distribution(confidence),
        correction_rate: ratio(corrections.len(), total_tagged),
        learned_senders: preferences.len(),
    }
}

pub fn learning_stats(
    values: &ValueTable,
    history: &RewardHistory,
    learning_rate: f64,
    discount_factor: f64,
    recent_window: usize,
) -> LearningStats {
    let average_value = if values.is_empty() {
        0.0
    } else {
        values.values().sum::<f64>() / values.len() as f64
    };
    LearningStats {
        total_states: values.len(),
        total_episodes: history.len(),
        learning_rate,
        discount_factor,
        average_reward: history.average(),
        recent_rewards: history.recent(recent_window),
        reward_trend: history.trend(),
        average_value,
        max_value: values.values().copied().reduce(f64::max),
        min_value: values.values().copied().reduce(f64::min),
    }
}

pub fn engine_stats(
    values: &ValueTable,
    confidence: &ConfidenceTable,
    corrections: &[Correction],
    history: &RewardHistory,
) -> EngineStats {
    EngineStats {
        total_states: values.len(),
        total_corrections: corrections.len(),
        average_confidence: confidence.average_confidence(),
        tag_distribution: tag_distribution(confidence),
        correction_rate: ratio(corrections.len(), confidence.len()),
        recent_reward_trend: history.trend(),
    }
}

pub fn sender_insights(
    preferences: &SenderPreferences,
    confidence: &ConfidenceTable,
    corrections: &[Correction],
) -> SenderInsights {
    let mut most_corrected_tags = BTreeMap::new();
    let mut quality_sums: BTreeMap<Tag, (f64, usize)> = BTreeMap::new();
    let (mut positive, mut negative, mut neutral) = (0, 0, 0);

    for correction in corrections {
        *most_corrected_tags.entry(correction.original_tag).or_insert(0) += 1;
        match correction.feedback_quality {
            FeedbackQuality::Positive => positive += 1,
            FeedbackQuality::Negative => negative += 1,
            FeedbackQuality::Neutral => neutral += 1,
        }
        let slot = quality_sums.entry(correction.original_tag).or_insert((0.0, 0));
        slot.0 += f64::from(correction.feedback_quality.as_score());
        slot.1 += 1;
    }

    let mut confidence_sums: BTreeMap<Tag, (f64, usize)> = BTreeMap::new();
    for record in confidence.values() {
        let slot = confidence_sums.entry(record.tag).or_insert((0.0, 0));
        slot.0 += record.confidence;
        slot.1 += 1;
    }

    SenderInsights {
        sender_preferences: preferences
            .iter()
            .map(|(sender, pref)| (sender.clone(), pref.preferred))
            .collect(),
        most_corrected_tags,
        confidence_by_tag: averages(confidence_sums),
        feedback_quality_by_tag: averages(quality_sums),
        total_corrections: corrections.len(),
        positive_feedback_count: positive,
        negative_feedback_count: negative,
        neutral_feedback_count: neutral,
        overall_feedback_quality: ratio(positive, corrections.len()),
    }
}

/// Highest learned values first; equal values ordered by key.
pub fn top_learned_patterns(values: &ValueTable, limit: usize) -> Vec<(StateKey, f64)> {
    let mut entries: Vec<(StateKey, f64)> =
        values.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(limit);
    entries
}

// ── Suggestions ────────────────────────────────────────────────────────────

/// An actionable hint derived from feedback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    ReviewTagRules { tag: Tag, negative_feedback: bool },
    LowConfidence { tag: Tag, negative_feedback: bool },
    SenderSpecificRules { senders: usize },
    NeedsImprovement { positive_share: f64 },
    PerformingWell { positive_share: f64 },
    UpdateKeywords { tag: Tag, keywords: Vec<&'static str> },
}

impl std::fmt::Display for Suggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReviewTagRules {
                tag,
                negative_feedback: true,
            } => write!(
                f,
                "URGENT: review '{tag}' tag rules - frequently corrected with negative feedback"
            ),
            Self::ReviewTagRules { tag, .. } => {
                write!(f, "Consider reviewing '{tag}' tag rules - most frequently corrected")
            }
            Self::LowConfidence {
                tag,
                negative_feedback: true,
            } => write!(
                f,
                "'{tag}' tag has low confidence and negative feedback - priority for improvement"
            ),
            Self::LowConfidence { tag, .. } => {
                write!(f, "'{tag}' tag has low confidence - consider adding more keywords")
            }
            Self::SenderSpecificRules { senders } => write!(
                f,
                "Consider creating sender-specific rules for frequent contacts ({senders} learned senders)"
            ),
            Self::NeedsImprovement { positive_share } => write!(
                f,
                "Overall tagging needs improvement - {:.0}% positive feedback",
                positive_share * 100.0
            ),
            Self::PerformingWell { positive_share } => write!(
                f,
                "Tagging performing well - {:.0}% positive feedback",
                positive_share * 100.0
            ),
            Self::UpdateKeywords { tag, keywords } => write!(
                f,
                "For '{tag}' tag, consider updating these keywords: {}...",
                keywords.join(", ")
            ),
        }
    }
}

/// Derive improvement hints from insights.
pub fn suggest_improvements(insights: &SenderInsights) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();
    let quality_of = |tag: &Tag| {
        insights
            .feedback_quality_by_tag
            .get(tag)
            .copied()
            .unwrap_or(0.0)
    };

    if let Some(tag) = first_max_by(&insights.most_corrected_tags, |n| *n as f64) {
        suggestions.push(Suggestion::ReviewTagRules {
            tag,
            negative_feedback: quality_of(&tag) < 0.0,
        });
    }

    for (tag, conf) in &insights.confidence_by_tag {
        if *conf < LOW_CONFIDENCE {
            suggestions.push(Suggestion::LowConfidence {
                tag: *tag,
                negative_feedback: quality_of(tag) < 0.0,
            });
        }
    }

    if insights.sender_preferences.len() > MANY_SENDERS {
        suggestions.push(Suggestion::SenderSpecificRules {
            senders: insights.sender_preferences.len(),
        });
    }

    if insights.total_corrections > MIN_CORRECTIONS_FOR_VERDICT {
        let share = insights.overall_feedback_quality;
        if share < POOR_QUALITY {
            suggestions.push(Suggestion::NeedsImprovement {
                positive_share: share,
            });
        } else if share > GOOD_QUALITY {
            suggestions.push(Suggestion::PerformingWell {
                positive_share: share,
            });
        }
    }

    let worst = insights
        .feedback_quality_by_tag
        .iter()
        .filter(|(_, q)| **q < 0.0)
        .fold(None::<(Tag, f64)>, |acc, (tag, q)| match acc {
            Some((_, best)) if best <= *q => acc,
            _ => Some((*tag, *q)),
        });
    if let Some((tag, _)) = worst {
        if let Some(pattern) = pattern_for(tag) {
            suggestions.push(Suggestion::UpdateKeywords {
                tag,
                keywords: pattern.keywords.iter().take(KEYWORD_HINTS).copied().collect(),
            });
        }
    }

    suggestions
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn tag_distribution(confidence: &ConfidenceTable) -> BTreeMap<Tag, usize> {
    let mut distribution = BTreeMap::new();
    for record in confidence.values() {
        *distribution.entry(record.tag).or_insert(0) += 1;
    }
    distribution
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn averages(sums: BTreeMap<Tag, (f64, usize)>) -> BTreeMap<Tag, f64> {
    sums.into_iter()
        .map(|(tag, (sum, n))| (tag, sum / n as f64))
        .collect()
}

/// Key with the largest value; the first in key order wins ties.
fn first_max_by<V>(map: &BTreeMap<Tag, V>, value: impl Fn(&V) -> f64) -> Option<Tag> {
    let mut best: Option<(Tag, f64)> = None;
    for (tag, v) in map {
        let v = value(v);
        if best.is_none_or(|(_, top)| v > top) {
            best = Some((*tag, v));
        }
    }
    best.map(|(tag, _)| tag)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    use super::FeedbackQuality::{Negative, Neutral, Positive};

    fn correction(id: &str, original: Tag, correct: Tag, q: FeedbackQuality) -> Correction {
        Correction::new(id, original, correct, "s@x.com", q)
    }

    #[test]
    fn empty_tables() {
        let stats = engine_stats(
            &ValueTable::new(),
            &ConfidenceTable::default(),
            &[],
            &RewardHistory::default(),
        );
        assert_eq!(stats.total_states, 0);
        assert_eq!(stats.correction_rate, 0.0);
        assert_eq!(stats.average_confidence, 0.0);
        assert_eq!(stats.recent_reward_trend, RewardTrend::Stable);

        let learning = learning_stats(&ValueTable::new(), &RewardHistory::default(), 0.1, 0.9, 5);
        assert!(learning.max_value.is_none());
        assert_eq!(learning.discount_factor, 0.9);
    }

    #[test]
    fn distribution_and_rate() {
        let mut confidence = ConfidenceTable::default();
        confidence.record_tagging("a", Tag::Urgent, 0.9, Utc::now());
        confidence.record_tagging("b", Tag::Urgent, 0.7, Utc::now());
        confidence.record_tagging("c", Tag::General, 0.3, Utc::now());
        confidence.record_tagging("d", Tag::Meeting, 0.5, Utc::now());
        let corrections = vec![correction("c", Tag::General, Tag::Meeting, Neutral)];

        let stats = tagging_stats(&confidence, &corrections, &SenderPreferences::default());
        assert_eq!(stats.total_tagged, 4);
        assert_eq!(stats.tag_distribution[&Tag::Urgent], 2);
        assert_eq!(stats.correction_rate, 0.25);
        assert!((stats.average_confidence - 0.6).abs() < 1e-12);
    }

    #[test]
    fn value_extremes() {
        let mut values = ValueTable::new();
        values.insert(StateKey::from("a"), 0.5);
        values.insert(StateKey::from("b"), -0.25);
        values.insert(StateKey::from("c"), 0.5);
        let stats = learning_stats(&values, &RewardHistory::default(), 0.1, 0.9, 5);
        assert_eq!(stats.max_value, Some(0.5));
        assert_eq!(stats.min_value, Some(-0.25));
        assert!((stats.average_value - 0.25).abs() < 1e-12);

        let top = top_learned_patterns(&values, 2);
        assert_eq!(top[0].0.as_str(), "a");
        assert_eq!(top[1].0.as_str(), "c");
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn insights_count_feedback() {
        let corrections = vec![
            correction("1", Tag::Urgent, Tag::Meeting, Negative),
            correction("2", Tag::Urgent, Tag::Meeting, Negative),
            correction("3", Tag::Financial, Tag::Financial, Positive),
            correction("4", Tag::General, Tag::Meeting, Neutral),
        ];
        let mut prefs = SenderPreferences::default();
        prefs.record("s@x.com", Tag::Meeting, Neutral);
        let insights = sender_insights(&prefs, &ConfidenceTable::default(), &corrections);

        assert_eq!(insights.most_corrected_tags[&Tag::Urgent], 2);
        assert_eq!(insights.negative_feedback_count, 2);
        assert_eq!(insights.positive_feedback_count, 1);
        assert_eq!(insights.neutral_feedback_count, 1);
        assert_eq!(insights.overall_feedback_quality, 0.25);
        assert_eq!(insights.feedback_quality_by_tag[&Tag::Urgent], -1.0);
        assert_eq!(insights.sender_preferences["s@x.com"], Tag::Meeting);
    }

    #[test]
    fn suggestions_flag_negative_tag() {
        let corrections = vec![
            correction("1", Tag::Urgent, Tag::Meeting, Negative),
            correction("2", Tag::Urgent, Tag::Meeting, Negative),
        ];
        let mut confidence = ConfidenceTable::default();
        confidence.record_tagging("1", Tag::Urgent, 0.4, Utc::now());
        let insights = sender_insights(&SenderPreferences::default(), &confidence, &corrections);
        let suggestions = suggest_improvements(&insights);

        assert_eq!(
            suggestions[0],
            Suggestion::ReviewTagRules {
                tag: Tag::Urgent,
                negative_feedback: true
            }
        );
        assert!(suggestions.contains(&Suggestion::LowConfidence {
            tag: Tag::Urgent,
            negative_feedback: true
        }));
        assert!(suggestions.contains(&Suggestion::UpdateKeywords {
            tag: Tag::Urgent,
            keywords: vec!["urgent", "asap", "immediately"]
        }));
        assert!(suggestions[0].to_string().starts_with("URGENT: review 'URGENT'"));
    }

    #[test]
    fn verdict_needs_enough_corrections() {
        let few: Vec<_> = (0..10)
            .map(|i| correction(&i.to_string(), Tag::Meeting, Tag::Meeting, Positive))
            .collect();
        let insights = sender_insights(&SenderPreferences::default(), &ConfidenceTable::default(), &few);
        assert!(
            !suggest_improvements(&insights)
                .iter()
                .any(|s| matches!(s, Suggestion::PerformingWell { .. }))
        );

        let many: Vec<_> = (0..11)
            .map(|i| correction(&i.to_string(), Tag::Meeting, Tag::Meeting, Positive))
            .collect();
        let insights = sender_insights(&SenderPreferences::default(), &ConfidenceTable::default(), &many);
        assert!(
            suggest_improvements(&insights)
                .iter()
                .any(|s| matches!(s, Suggestion::PerformingWell { .. }))
        );
    }

    #[test]
    fn many_senders() {
        let mut prefs = SenderPreferences::default();
        for i in 0..6 {
            prefs.record(&format!("s{i}@x.com"), Tag::Meeting, Neutral);
        }
        let insights = sender_insights(&prefs, &ConfidenceTable::default(), &[]);
        assert_eq!(
            suggest_improvements(&insights),
            vec![Suggestion::SenderSpecificRules { senders: 6 }]
        );
    }
}
