//! Engine facade: owns every table and exposes the public API.
//!
//! Triage, feedback and ranking never return errors. Persistence failures are
//! logged and reported through return flags; state stays correct in memory.

use chrono::Utc;

use crate::config::EngineConfig;
use crate::error::{PriorityResult, StoreError};
use crate::learning::{
    ConfidenceTable, Correction, CorrectionLog, FeedbackOutcome, FeedbackQuality,
    JsonValueStore, LearningStore, ReducedState, RewardHistory, RewardLedger, SenderPreferences,
    StateKey,
};
use crate::message::Message;
use crate::ranking::{self, LearningPass, RankedMessage};
use crate::stats::{self, EngineStats, LearningStats, SenderInsights, Suggestion, TaggingStats};
use crate::store::{Storage, StoreFile};
use crate::tag::Tag;
use crate::tagging::{FeatureSet, TagResult, TagScorer};

/// The adaptive message priority engine.
pub struct PriorityEngine {
    config: EngineConfig,
    storage: Storage,
    scorer: TagScorer,
    values: Box<dyn LearningStore>,
    preferences: SenderPreferences,
    confidence: ConfidenceTable,
    corrections: CorrectionLog,
    history: RewardHistory,
    ledger: RewardLedger,
}

impl PriorityEngine {
    /// Create an engine with a JSON-file value store in `config.data_dir`,
    /// or fully in memory when no data directory is set.
    pub fn new(config: EngineConfig) -> PriorityResult<Self> {
        config.validate()?;
        let storage = match config.data_dir {
            Some(ref dir) => Storage::open(dir)?,
            None => Storage::memory(),
        };
        Ok(Self::with_json_store(config, storage))
    }

    /// Like [`PriorityEngine::new`], but fails with [`StoreError::Locked`]
    /// instead of falling back to read-only when another engine holds the
    /// data directory.
    pub fn new_exclusive(config: EngineConfig) -> PriorityResult<Self> {
        config.validate()?;
        let storage = match config.data_dir {
            Some(ref dir) => Storage::open_exclusive(dir)?,
            None => Storage::memory(),
        };
        Ok(Self::with_json_store(config, storage))
    }

    fn with_json_store(config: EngineConfig, storage: Storage) -> Self {
        let values = Box::new(JsonValueStore::open(storage.clone(), config.learning_rate));
        Self::assemble(config, storage, values)
    }

    /// Create an engine around a caller-supplied value store.
    ///
    /// The other tables still follow `config.data_dir`.
    pub fn with_store(
        config: EngineConfig,
        mut values: Box<dyn LearningStore>,
    ) -> PriorityResult<Self> {
        config.validate()?;
        let storage = match config.data_dir {
            Some(ref dir) => Storage::open(dir)?,
            None => Storage::memory(),
        };
        values.load();
        Ok(Self::assemble(config, storage, values))
    }

    fn assemble(config: EngineConfig, storage: Storage, values: Box<dyn LearningStore>) -> Self {
        let engine = Self {
            scorer: TagScorer::new(config.fallback_threshold, config.fallback_confidence),
            preferences: storage.load(StoreFile::SenderPreferences),
            confidence: storage.load(StoreFile::TagConfidence),
            corrections: storage.load(StoreFile::Corrections),
            history: storage.load(StoreFile::RewardHistory),
            ledger: storage.load(StoreFile::RewardLedger),
            values,
            storage,
            config,
        };
        tracing::info!(
            data_dir = ?engine.storage.root(),
            writable = engine.storage.is_writable(),
            states = engine.values.len(),
            senders = engine.preferences.len(),
            corrections = engine.corrections.len(),
            "initializing priority engine"
        );
        engine
    }

    // ── Tagging ────────────────────────────────────────────────────────────

    /// Tag a message and record the result under its id.
    ///
    /// Messages without an id are tagged but not recorded.
    pub fn tag_message(&mut self, message: &Message) -> TagResult {
        let result = self.score(message);
        if self.record_tagging(message, &result) {
            self.save_logged(StoreFile::TagConfidence, &self.confidence);
        }
        result
    }

    /// Tag many messages with a single flush.
    pub fn tag_batch(&mut self, messages: &[Message]) -> Vec<TagResult> {
        let mut recorded = false;
        let results = messages
            .iter()
            .map(|message| {
                let result = self.score(message);
                recorded |= self.record_tagging(message, &result);
                result
            })
            .collect();
        if recorded {
            self.save_logged(StoreFile::TagConfidence, &self.confidence);
        }
        results
    }

    fn score(&self, message: &Message) -> TagResult {
        let features = FeatureSet::extract(message);
        let preferred = self.preferences.preferred_tag(&message.sender);
        self.scorer.score(&features, preferred)
    }

    fn record_tagging(&mut self, message: &Message, result: &TagResult) -> bool {
        if message.id.is_empty() {
            tracing::debug!(tag = %result.tag, "message has no id, tag not recorded");
            return false;
        }
        self.confidence
            .record_tagging(&message.id, result.tag, result.confidence, Utc::now());
        true
    }

    // ── Ranking ────────────────────────────────────────────────────────────

    /// Order messages by priority, highest first. Does not learn.
    pub fn rank<'a>(&self, messages: &'a [Message]) -> Vec<RankedMessage<'a>> {
        ranking::rank(messages, self.values.as_ref())
    }

    /// Replay ledger rewards for these messages into the value store.
    ///
    /// When at least one message had rewards, the summed reward is appended
    /// to the reward history as one episode.
    pub fn apply_feedback_from_history(&mut self, messages: &[Message]) -> LearningPass {
        let pass = ranking::apply_feedback_from_history(messages, &self.ledger, self.values.as_mut());
        if pass.updates > 0 {
            self.history.push(pass.episode_reward, pass.updates, Utc::now());
            self.save_logged(StoreFile::RewardHistory, &self.history);
            tracing::info!(
                updates = pass.updates,
                episode_reward = pass.episode_reward,
                "appended learning episode"
            );
        }
        pass
    }

    /// Explicit reward for a message, consumed by later learning passes.
    ///
    /// Rejects empty ids and non-finite rewards.
    pub fn record_reward(&mut self, message_id: &str, reward: f64) -> bool {
        if message_id.is_empty() || !reward.is_finite() {
            tracing::warn!(message_id, reward, "rejected reward");
            return false;
        }
        self.ledger.record(message_id, reward, Utc::now());
        self.save_logged(StoreFile::RewardLedger, &self.ledger)
    }

    /// Apply a reward directly to the message's state and log it as an episode.
    ///
    /// Returns the new learned value.
    pub fn update_priority(&mut self, message: &Message, reward: f64) -> f64 {
        let key = ReducedState::from_message(message).canonical_key();
        if !reward.is_finite() {
            tracing::warn!(state = %key, reward, "rejected reward");
            return self.values.get(&key);
        }
        let value = self.values.update(&key, reward);
        self.history.push(reward, 1, Utc::now());
        self.save_logged(StoreFile::RewardHistory, &self.history);
        value
    }

    /// Learned adjustment currently applied to this message.
    pub fn learned_value(&self, message: &Message) -> f64 {
        self.values
            .get(&ReducedState::from_message(message).canonical_key())
    }

    // ── Feedback ───────────────────────────────────────────────────────────

    /// Record a correction and update preferences and confidence.
    ///
    /// An unknown message id still logs the correction and updates the
    /// sender's preference; only the confidence step is skipped.
    pub fn process_correction(&mut self, correction: Correction) -> FeedbackOutcome {
        let preferred_tag = self.preferences.record(
            &correction.sender,
            correction.correct_tag,
            correction.feedback_quality,
        );

        let confidence = self.confidence.apply_correction(&correction);
        if confidence.is_none() {
            tracing::warn!(
                message_id = %correction.message_id,
                "correction for untagged message, confidence unchanged"
            );
        }

        tracing::info!(
            message_id = %correction.message_id,
            original = %correction.original_tag,
            correct = %correction.correct_tag,
            quality = %correction.feedback_quality,
            preferred = %preferred_tag,
            "processed correction"
        );

        self.corrections.push(correction);

        let persisted = [
            self.save_logged(StoreFile::Corrections, &self.corrections),
            self.save_logged(StoreFile::SenderPreferences, &self.preferences),
            self.save_logged(StoreFile::TagConfidence, &self.confidence),
        ]
        .into_iter()
        .all(|ok| ok);

        FeedbackOutcome {
            preferred_tag,
            confidence,
            persisted,
        }
    }

    /// Convenience wrapper taking a raw quality score.
    pub fn correct(
        &mut self,
        message_id: &str,
        original_tag: Tag,
        correct_tag: Tag,
        sender: &str,
        quality: f64,
    ) -> FeedbackOutcome {
        self.process_correction(Correction::new(
            message_id,
            original_tag,
            correct_tag,
            sender,
            FeedbackQuality::from_score(quality),
        ))
    }

    // ── Reporting ──────────────────────────────────────────────────────────

    pub fn stats(&self) -> EngineStats {
        stats::engine_stats(
            self.values.entries(),
            &self.confidence,
            &self.corrections,
            &self.history,
        )
    }

    pub fn tagging_stats(&self) -> TaggingStats {
        stats::tagging_stats(&self.confidence, &self.corrections, &self.preferences)
    }

    pub fn learning_stats(&self) -> LearningStats {
        stats::learning_stats(
            self.values.entries(),
            &self.history,
            self.values.learning_rate(),
            self.config.discount_factor,
            self.config.recent_window,
        )
    }

    pub fn sender_insights(&self) -> SenderInsights {
        stats::sender_insights(&self.preferences, &self.confidence, &self.corrections)
    }

    pub fn suggest_tag_improvements(&self) -> Vec<Suggestion> {
        stats::suggest_improvements(&self.sender_insights())
    }

    pub fn top_learned_patterns(&self, limit: usize) -> Vec<(StateKey, f64)> {
        stats::top_learned_patterns(self.values.entries(), limit)
    }

    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            data_dir: self
                .storage
                .root()
                .map(|p| p.display().to_string()),
            writable: self.storage.is_writable(),
            states: self.values.len(),
            tagged_messages: self.confidence.len(),
            learned_senders: self.preferences.len(),
            corrections: self.corrections.len(),
            episodes: self.history.len(),
            ledger_entries: self.ledger.len(),
        }
    }

    // ── Maintenance ────────────────────────────────────────────────────────

    /// Forget all learned values and reward history.
    ///
    /// Preferences, confidence records and the correction log are kept.
    pub fn reset_learning(&mut self) -> bool {
        self.values.clear();
        self.history.clear();
        tracing::info!("learning data reset");
        let values_ok = match self.values.save() {
            Ok(()) => true,
            Err(e @ StoreError::ReadOnly { .. }) => {
                tracing::debug!(error = %e, "read-only, value table reset kept in memory");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to persist value table");
                false
            }
        };
        let history_ok = self.save_logged(StoreFile::RewardHistory, &self.history);
        values_ok && history_ok
    }

    /// Write every table, returning the first failure.
    pub fn persist(&self) -> PriorityResult<()> {
        self.values.save()?;
        self.storage
            .save(StoreFile::SenderPreferences, &self.preferences)?;
        self.storage.save(StoreFile::TagConfidence, &self.confidence)?;
        self.storage.save(StoreFile::Corrections, &self.corrections)?;
        self.storage.save(StoreFile::RewardHistory, &self.history)?;
        self.storage.save(StoreFile::RewardLedger, &self.ledger)?;
        Ok(())
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_read_only(&self) -> bool {
        !self.storage.is_writable()
    }

    pub fn preferences(&self) -> &SenderPreferences {
        &self.preferences
    }

    pub fn confidence(&self) -> &ConfidenceTable {
        &self.confidence
    }

    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    pub fn reward_history(&self) -> &RewardHistory {
        &self.history
    }

    pub fn value_store(&self) -> &dyn LearningStore {
        self.values.as_ref()
    }

    fn save_logged<T: serde::Serialize>(&self, file: StoreFile, value: &T) -> bool {
        match self.storage.save(file, value) {
            Ok(()) => true,
            Err(e @ StoreError::ReadOnly { .. }) => {
                tracing::debug!(error = %e, file = file.file_name(), "read-only, change kept in memory");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, file = file.file_name(), "failed to persist");
                false
            }
        }
    }
}

/// Summary of engine state.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EngineInfo {
    pub data_dir: Option<String>,
    pub writable: bool,
    pub states: usize,
    pub tagged_messages: usize,
    pub learned_senders: usize,
    pub corrections: usize,
    pub episodes: usize,
    pub ledger_entries: usize,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "inbox-priority engine info")?;
        writeln!(
            f,
            "  data dir:        {}",
            self.data_dir.as_deref().unwrap_or("(memory only)")
        )?;
        writeln!(f, "  writable:        {}", self.writable)?;
        writeln!(f, "  learned states:  {}", self.states)?;
        writeln!(f, "  tagged messages: {}", self.tagged_messages)?;
        writeln!(f, "  learned senders: {}", self.learned_senders)?;
        writeln!(f, "  corrections:     {}", self.corrections)?;
        writeln!(f, "  episodes:        {}", self.episodes)?;
        writeln!(f, "  ledger entries:  {}", self.ledger_entries)?;
        Ok(())
    }
}

impl std::fmt::Debug for PriorityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityEngine")
            .field("config", &self.config)
            .field("storage", &self.storage)
            .field("states", &self.values.len())
            .field("senders", &self.preferences.len())
            .finish()
    }
}
