//! Priority ranking: rule score plus learned adjustment.

use std::cmp::Ordering;

use serde::Serialize;

use crate::learning::{LearningStore, ReducedState, RewardLedger, StateKey};
use crate::message::Message;

/// Lowest final score any message can receive.
pub const SCORE_FLOOR: f64 = 0.1;

const CONFIDENCE_FACTOR: f64 = 2.0;
const DEADLINE_BONUS: f64 = 2.0;
const STRONG_NEGATIVE_SENTIMENT: f64 = -0.3;
const NEGATIVE_SENTIMENT: f64 = -0.1;

/// Components of the rule-based priority score.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PriorityBreakdown {
    pub tag_weight: f64,
    pub confidence_bonus: f64,
    pub urgency_bonus: f64,
    pub deadline_bonus: f64,
    pub intent_bonus: f64,
    pub sentiment_bonus: f64,
}

impl PriorityBreakdown {
    pub fn of(message: &Message) -> Self {
        let metrics = message.metrics.clone().unwrap_or_default();
        Self {
            tag_weight: message.effective_tag().rank_weight(),
            confidence_bonus: message.tag_confidence.unwrap_or(0.0) * CONFIDENCE_FACTOR,
            urgency_bonus: metrics.urgency.bonus(),
            deadline_bonus: if metrics.has_deadline { DEADLINE_BONUS } else { 0.0 },
            intent_bonus: metrics.intent.bonus(),
            sentiment_bonus: sentiment_bonus(message.sentiment_score),
        }
    }

    pub fn base(&self) -> f64 {
        self.tag_weight
            + self.confidence_bonus
            + self.urgency_bonus
            + self.deadline_bonus
            + self.intent_bonus
            + self.sentiment_bonus
    }
}

/// Negative sentiment raises priority.
fn sentiment_bonus(score: Option<f64>) -> f64 {
    match score {
        Some(s) if s < STRONG_NEGATIVE_SENTIMENT => 2.0,
        Some(s) if s < NEGATIVE_SENTIMENT => 1.0,
        _ => 0.0,
    }
}

/// A message with its computed priority.
#[derive(Debug, Clone, Serialize)]
pub struct RankedMessage<'a> {
    pub final_score: f64,
    pub base_score: f64,
    pub learned_adjustment: f64,
    pub state_key: StateKey,
    pub breakdown: PriorityBreakdown,
    pub message: &'a Message,
}

/// Score and order messages, highest first. Read-only.
///
/// `final = max(base + learned, 0.1)`. Equal scores keep input order.
pub fn rank<'a>(messages: &'a [Message], store: &dyn LearningStore) -> Vec<RankedMessage<'a>> {
    let mut ranked: Vec<RankedMessage<'a>> = messages
        .iter()
        .map(|message| {
            let breakdown = PriorityBreakdown::of(message);
            let state_key = ReducedState::from_message(message).canonical_key();
            let base_score = breakdown.base();
            let learned_adjustment = store.get(&state_key);
            RankedMessage {
                final_score: (base_score + learned_adjustment).max(SCORE_FLOOR),
                base_score,
                learned_adjustment,
                state_key,
                breakdown,
                message,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

/// Result of replaying ledger rewards onto a batch.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LearningPass {
    /// Value-store updates performed.
    pub updates: usize,
    /// Sum of the rewards applied.
    pub episode_reward: f64,
}

/// Update the value store from the summed ledger reward of each message.
///
/// Messages without an id or without ledger entries are skipped. A message
/// appearing twice in the batch is updated twice.
pub fn apply_feedback_from_history(
    messages: &[Message],
    ledger: &RewardLedger,
    store: &mut dyn LearningStore,
) -> LearningPass {
    let totals = ledger.totals();
    let mut pass = LearningPass::default();

    for message in messages {
        if message.id.is_empty() {
            continue;
        }
        let Some(&reward) = totals.get(message.id.as_str()) else {
            continue;
        };
        let key = ReducedState::from_message(message).canonical_key();
        let value = store.update(&key, reward);
        tracing::debug!(message_id = %message.id, state = %key, reward, value, "applied ledger reward");
        pass.updates += 1;
        pass.episode_reward += reward;
    }

    pass
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::learning::MemoryValueStore;
    use crate::message::{Intent, MessageMetrics, Urgency};
    use crate::tag::Tag;

    fn tagged(id: &str, tag: Tag, confidence: f64) -> Message {
        let mut msg = Message::new(id, "", "", format!("{id}@x.com"));
        msg.tag = Some(tag);
        msg.tag_confidence = Some(confidence);
        msg
    }

    #[test]
    fn breakdown_sums_all_components() {
        let msg = tagged("a", Tag::Urgent, 0.5)
            .with_metrics(MessageMetrics {
                urgency: Urgency::High,
                intent: Intent::Complaint,
                has_deadline: true,
            })
            .with_sentiment(-0.5);
        let b = PriorityBreakdown::of(&msg);
        // 10 + 1 + 3 + 2 + 2.5 + 2
        assert_eq!(b.base(), 20.5);
    }

    #[test]
    fn sentiment_thresholds() {
        assert_eq!(sentiment_bonus(Some(-0.31)), 2.0);
        assert_eq!(sentiment_bonus(Some(-0.3)), 1.0);
        assert_eq!(sentiment_bonus(Some(-0.1)), 0.0);
        assert_eq!(sentiment_bonus(Some(0.8)), 0.0);
        assert_eq!(sentiment_bonus(None), 0.0);
        assert_eq!(sentiment_bonus(Some(f64::NAN)), 0.0);
    }

    #[test]
    fn untagged_ranks_as_general() {
        let msg = Message::new("a", "", "", "");
        assert_eq!(PriorityBreakdown::of(&msg).base(), 3.0);
    }

    #[test]
    fn orders_by_score_descending() {
        let messages = vec![
            tagged("n", Tag::Newsletter, 0.5),
            tagged("u", Tag::Urgent, 0.5),
            tagged("m", Tag::Meeting, 0.5),
        ];
        let store = MemoryValueStore::new(0.1);
        let ids: Vec<&str> = rank(&messages, &store)
            .iter()
            .map(|r| r.message.id.as_str())
            .collect();
        assert_eq!(ids, vec!["u", "m", "n"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let messages = vec![
            tagged("first", Tag::Meeting, 0.5),
            tagged("second", Tag::Meeting, 0.5),
            tagged("third", Tag::Meeting, 0.5),
        ];
        let store = MemoryValueStore::new(0.1);
        let ids: Vec<&str> = rank(&messages, &store)
            .iter()
            .map(|r| r.message.id.as_str())
            .collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn learned_value_adjusts_and_floors() {
        let msg = tagged("a", Tag::Newsletter, 0.0);
        let key = ReducedState::from_message(&msg).canonical_key();
        let mut table = crate::learning::ValueTable::new();
        table.insert(key, -50.0);
        let store = MemoryValueStore::with_table(table, 0.1);
        let messages = vec![msg];
        let ranked = rank(&messages, &store);
        assert_eq!(ranked[0].learned_adjustment, -50.0);
        assert_eq!(ranked[0].final_score, SCORE_FLOOR);
    }

    #[test]
    fn rank_does_not_mutate_store() {
        let messages = vec![tagged("a", Tag::Urgent, 0.9)];
        let store = MemoryValueStore::new(0.1);
        let _ = rank(&messages, &store);
        assert!(store.is_empty());
    }

    #[test]
    fn learning_pass_uses_summed_rewards() {
        let messages = vec![
            tagged("a", Tag::Urgent, 0.5),
            tagged("b", Tag::Meeting, 0.5),
            Message::default(),
        ];
        let mut ledger = RewardLedger::default();
        ledger.record("a", 1.0, Utc::now());
        ledger.record("a", 1.0, Utc::now());
        ledger.record("z", 5.0, Utc::now());

        let mut store = MemoryValueStore::new(0.1);
        let pass = apply_feedback_from_history(&messages, &ledger, &mut store);
        assert_eq!(pass.updates, 1);
        assert_eq!(pass.episode_reward, 2.0);

        let key = ReducedState::from_message(&messages[0]).canonical_key();
        assert!((store.get(&key) - 0.2).abs() < 1e-12);
    }
}
