//! Priority ranking.
//!
//! Ranking is split in two: [`rank`] is a pure read of the value store, while
//! [`apply_feedback_from_history`] is the explicit learning side effect that
//! replays ledger rewards into it.

pub mod ranker;

pub use ranker::{
    LearningPass, PriorityBreakdown, RankedMessage, SCORE_FLOOR, apply_feedback_from_history, rank,
};
