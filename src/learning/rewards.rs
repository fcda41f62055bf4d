//! Reward ledger (explicit per-message rewards) and episode history.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Episodes compared on each side when computing the trend.
pub const TREND_WINDOW: usize = 10;

/// One reward given for a message's priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardEntry {
    pub message_id: String,
    pub reward: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only log of rewards, consulted by the ranking learning pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardLedger {
    entries: Vec<RewardEntry>,
}

impl RewardLedger {
    pub fn record(&mut self, message_id: &str, reward: f64, now: DateTime<Utc>) {
        self.entries.push(RewardEntry {
            message_id: message_id.to_string(),
            reward,
            recorded_at: now,
        });
    }

    /// Summed reward per message id.
    pub fn totals(&self) -> HashMap<&str, f64> {
        let mut totals = HashMap::new();
        for entry in &self.entries {
            *totals.entry(entry.message_id.as_str()).or_insert(0.0) += entry.reward;
        }
        totals
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What a learning pass or direct update contributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub reward: f64,
    /// Value-store updates performed in the episode.
    pub updates: usize,
    pub timestamp: DateTime<Utc>,
}

/// Direction of recent rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardTrend {
    Improving,
    Declining,
    Stable,
}

impl std::fmt::Display for RewardTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Improving => write!(f, "improving"),
            Self::Declining => write!(f, "declining"),
            Self::Stable => write!(f, "stable"),
        }
    }
}

/// Append-only episode log. Only used for reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardHistory {
    episodes: Vec<Episode>,
}

impl RewardHistory {
    pub fn push(&mut self, reward: f64, updates: usize, now: DateTime<Utc>) {
        self.episodes.push(Episode {
            reward,
            updates,
            timestamp: now,
        });
    }

    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.episodes.clear();
    }

    pub fn average(&self) -> f64 {
        mean(self.episodes.iter().map(|e| e.reward))
    }

    /// Rewards of the last `n` episodes, oldest first.
    pub fn recent(&self, n: usize) -> Vec<f64> {
        let start = self.episodes.len().saturating_sub(n);
        self.episodes[start..].iter().map(|e| e.reward).collect()
    }

    /// Mean of the last [`TREND_WINDOW`] episodes against the window before.
    ///
    /// `Stable` until there are more than `TREND_WINDOW` episodes.
    pub fn trend(&self) -> RewardTrend {
        let n = self.episodes.len();
        if n <= TREND_WINDOW {
            return RewardTrend::Stable;
        }
        let split = n - TREND_WINDOW;
        let prev_start = split.saturating_sub(TREND_WINDOW);
        let last = mean(self.episodes[split..].iter().map(|e| e.reward));
        let prev = mean(self.episodes[prev_start..split].iter().map(|e| e.reward));
        if last > prev {
            RewardTrend::Improving
        } else if last < prev {
            RewardTrend::Declining
        } else {
            RewardTrend::Stable
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}
