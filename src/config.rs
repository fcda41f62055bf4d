//! Engine configuration, persisted as TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Configuration for the priority engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Data directory for persistence. `None` for memory-only mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// EMA step size for the value store.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Recorded and reported, never applied: updates are single-step.
    #[serde(default = "default_discount_factor")]
    pub discount_factor: f64,
    /// Best tag score must exceed this, otherwise the message is `GENERAL`.
    #[serde(default = "default_fallback_threshold")]
    pub fallback_threshold: f64,
    /// Confidence reported for the `GENERAL` fallback.
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,
    /// Number of trailing episodes reported as "recent" in statistics.
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
}

fn default_learning_rate() -> f64 {
    0.1
}
fn default_discount_factor() -> f64 {
    0.9
}
fn default_fallback_threshold() -> f64 {
    0.5
}
fn default_fallback_confidence() -> f64 {
    0.3
}
fn default_recent_window() -> usize {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            learning_rate: default_learning_rate(),
            discount_factor: default_discount_factor(),
            fallback_threshold: default_fallback_threshold(),
            fallback_confidence: default_fallback_confidence(),
            recent_window: default_recent_window(),
        }
    }
}

impl EngineConfig {
    /// Default config persisting under `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Default::default()
        }
    }

    /// Reject values the learning rules cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(invalid("learning_rate", "must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(invalid("discount_factor", "must be in [0, 1]"));
        }
        if !self.fallback_threshold.is_finite() || self.fallback_threshold < 0.0 {
            return Err(invalid("fallback_threshold", "must be a non-negative number"));
        }
        if !(0.0..=1.0).contains(&self.fallback_confidence) {
            return Err(invalid("fallback_confidence", "must be in [0, 1]"));
        }
        if self.recent_window == 0 {
            return Err(invalid("recent_window", "must be at least 1"));
        }
        Ok(())
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load from a TOML file, or defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.discount_factor, 0.9);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn rejects_zero_learning_rate() {
        let config = EngineConfig {
            learning_rate: 0.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "learning_rate"));
    }

    #[test]
    fn rejects_nan_threshold() {
        let config = EngineConfig {
            fallback_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str("learning_rate = 0.25\n").unwrap();
        assert_eq!(config.learning_rate, 0.25);
        assert_eq!(config.fallback_threshold, 0.5);
        assert_eq!(config.recent_window, 5);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = EngineConfig {
            data_dir: Some(dir.path().join("data")),
            fallback_confidence: 0.4,
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = EngineConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "learning_rate = [").unwrap();
        assert!(matches!(
            EngineConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
