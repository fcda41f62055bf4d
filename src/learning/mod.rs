//! Learning state: value store, sender preferences, confidence and rewards.
//!
//! Every table here is plain data plus its update rule. The engine owns the
//! tables, decides when they are persisted, and logs failures.

pub mod confidence;
pub mod feedback;
pub mod preferences;
pub mod rewards;
pub mod state;
pub mod value_store;

pub use confidence::{ConfidenceRecord, ConfidenceTable, adjust_confidence};
pub use feedback::{Correction, CorrectionLog, FeedbackOutcome, FeedbackQuality};
pub use preferences::{SenderPreference, SenderPreferences, normalize_sender};
pub use rewards::{Episode, RewardHistory, RewardLedger, RewardTrend};
pub use state::{ReducedState, StateKey};
pub use value_store::{JsonValueStore, LearningStore, MemoryValueStore, ValueTable, ema_update};
