//! Adaptive value store: state key → learned scalar, updated by EMA.
//!
//! `new = old + α·(reward − old)`, evaluated as `(1 − α)·old + α·reward` so the
//! result stays between `old` and `reward` even at the edges of the `f64` range.
//! Each update moves the value toward the reward (for α in (0, 1]), so repeated
//! identical rewards converge. Entries are created lazily at 0.0 and never
//! deleted except by `clear`.

use std::collections::BTreeMap;

use crate::error::{StoreError, StoreResult};
use crate::store::{Storage, StoreFile};

use super::state::StateKey;

/// Persisted form of the value store.
pub type ValueTable = BTreeMap<StateKey, f64>;

/// One EMA step.
pub fn ema_update(old: f64, reward: f64, learning_rate: f64) -> f64 {
    (1.0 - learning_rate) * old + learning_rate * reward
}

/// Backing store for learned values, injected into the engine.
pub trait LearningStore: std::fmt::Debug {
    /// Learned value for `key`; 0.0 when never updated. No side effects.
    fn get(&self, key: &StateKey) -> f64;

    /// Apply one EMA step toward `reward` and return the new value.
    ///
    /// Non-finite rewards are ignored and the current value is returned.
    fn update(&mut self, key: &StateKey, reward: f64) -> f64;

    /// Replace in-memory state with the persisted table.
    fn load(&mut self);

    /// Write the in-memory table to durable storage.
    fn save(&self) -> StoreResult<()>;

    fn entries(&self) -> &ValueTable;

    /// Drop every learned value.
    fn clear(&mut self);

    fn learning_rate(&self) -> f64;

    fn len(&self) -> usize {
        self.entries().len()
    }

    fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

fn apply_update(table: &mut ValueTable, key: &StateKey, reward: f64, learning_rate: f64) -> Option<f64> {
    if !reward.is_finite() {
        tracing::warn!(state = %key, reward, "ignoring non-finite reward");
        return None;
    }
    let old = table.get(key).copied().unwrap_or(0.0);
    let new = ema_update(old, reward, learning_rate);
    if !new.is_finite() {
        tracing::warn!(state = %key, reward, old, "update would leave the finite range, keeping old value");
        return None;
    }
    table.insert(key.clone(), new);
    Some(new)
}

// ── File-backed store ──────────────────────────────────────────────────────

/// Value store persisted to `value_table.json`, flushed after every update.
#[derive(Debug)]
pub struct JsonValueStore {
    storage: Storage,
    table: ValueTable,
    learning_rate: f64,
}

impl JsonValueStore {
    /// Open and load the persisted table.
    pub fn open(storage: Storage, learning_rate: f64) -> Self {
        let mut store = Self {
            storage,
            table: ValueTable::new(),
            learning_rate,
        };
        store.load();
        store
    }
}

impl LearningStore for JsonValueStore {
    fn get(&self, key: &StateKey) -> f64 {
        self.table.get(key).copied().unwrap_or(0.0)
    }

    fn update(&mut self, key: &StateKey, reward: f64) -> f64 {
        let Some(value) = apply_update(&mut self.table, key, reward, self.learning_rate) else {
            return self.get(key);
        };
        match self.save() {
            Ok(()) => {}
            Err(e @ StoreError::ReadOnly { .. }) => {
                tracing::debug!(error = %e, state = %key, "value table not persisted");
            }
            Err(e) => tracing::warn!(error = %e, state = %key, "failed to persist value table"),
        }
        value
    }

    fn load(&mut self) {
        self.table = self.storage.load(StoreFile::ValueTable);
        tracing::debug!(states = self.table.len(), "loaded value table");
    }

    fn save(&self) -> StoreResult<()> {
        self.storage.save(StoreFile::ValueTable, &self.table)
    }

    fn entries(&self) -> &ValueTable {
        &self.table
    }

    fn clear(&mut self) {
        self.table.clear();
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}

// ── In-memory store ────────────────────────────────────────────────────────

/// Value store that never touches disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryValueStore {
    table: ValueTable,
    learning_rate: f64,
}

impl MemoryValueStore {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            table: ValueTable::new(),
            learning_rate,
        }
    }

    /// Pre-seeded table, for tests and benchmarks.
    pub fn with_table(table: ValueTable, learning_rate: f64) -> Self {
        Self {
            table,
            learning_rate,
        }
    }
}

impl LearningStore for MemoryValueStore {
    fn get(&self, key: &StateKey) -> f64 {
        self.table.get(key).copied().unwrap_or(0.0)
    }

    fn update(&mut self, key: &StateKey, reward: f64) -> f64 {
        apply_update(&mut self.table, key, reward, self.learning_rate)
            .unwrap_or_else(|| self.get(key))
    }

    fn load(&mut self) {}

    fn save(&self) -> StoreResult<()> {
        Ok(())
    }

    fn entries(&self) -> &ValueTable {
        &self.table
    }

    fn clear(&mut self) {
        self.table.clear();
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> StateKey {
        StateKey::from(s)
    }

    #[test]
    fn get_absent_is_zero_without_insert() {
        let store = MemoryValueStore::new(0.1);
        assert_eq!(store.get(&key("a")), 0.0);
        assert!(store.is_empty());
    }

    #[test]
    fn single_update() {
        let mut store = MemoryValueStore::new(0.1);
        let v = store.update(&key("a"), 1.0);
        assert!((v - 0.1).abs() < 1e-12);
        assert_eq!(store.get(&key("a")), v);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn converges_under_repeated_reward() {
        let mut store = MemoryValueStore::new(0.1);
        let mut prev_gap = f64::INFINITY;
        for _ in 0..200 {
            let v = store.update(&key("a"), 1.0);
            let gap = (v - 1.0).abs();
            assert!(gap <= prev_gap);
            prev_gap = gap;
        }
        assert!(prev_gap < 1e-6);
    }

    #[test]
    fn non_finite_reward_is_ignored() {
        let mut store = MemoryValueStore::new(0.1);
        store.update(&key("a"), 1.0);
        let before = store.get(&key("a"));
        assert_eq!(store.update(&key("a"), f64::NAN), before);
        assert_eq!(store.update(&key("b"), f64::INFINITY), 0.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn extreme_rewards_stay_finite() {
        let mut store = MemoryValueStore::new(0.1);
        for _ in 0..400 {
            assert!(store.update(&key("a"), -1.7e308).is_finite());
        }
        let v = store.update(&key("a"), 1.7e308);
        assert!(v.is_finite());
        assert!(v > -1.7e308);
        let mut prev_gap = f64::INFINITY;
        for _ in 0..50 {
            let v = store.update(&key("a"), f64::MAX);
            assert!(v.is_finite());
            let gap = f64::MAX / 2.0 - v / 2.0;
            assert!(gap <= prev_gap);
            prev_gap = gap;
        }
        assert!(store.entries().values().all(|v| v.is_finite()));
    }

    #[test]
    fn learning_rate_one_jumps_to_reward() {
        assert_eq!(ema_update(-f64::MAX, f64::MAX, 1.0), f64::MAX);
        assert_eq!(ema_update(3.0, -2.0, 1.0), -2.0);
    }

    #[test]
    fn json_store_persists_each_update() {
        let dir = tempfile::TempDir::new().unwrap();
        {
            let storage = Storage::open(dir.path()).unwrap();
            let mut store = JsonValueStore::open(storage, 0.1);
            store.update(&key("bob_true_false_true"), 1.0);
            store.update(&key("bob_true_false_true"), 1.0);
        }
        let storage = Storage::open(dir.path()).unwrap();
        let store = JsonValueStore::open(storage, 0.1);
        assert!((store.get(&key("bob_true_false_true")) - 0.19).abs() < 1e-12);
    }

    #[test]
    fn json_store_recovers_from_corrupt_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("value_table.json"), "not json at all").unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let mut store = JsonValueStore::open(storage, 0.1);
        assert!(store.is_empty());
        store.update(&key("k"), -1.0);
        assert!((store.get(&key("k")) + 0.1).abs() < 1e-12);
    }

    #[test]
    fn clear_empties() {
        let mut store = MemoryValueStore::new(0.1);
        store.update(&key("a"), 1.0);
        store.clear();
        assert!(store.is_empty());
    }
}
