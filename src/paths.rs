//! XDG-compliant path resolution for inbox-priority.
//!
//! `PriorityPaths` holds the global directories; the store file layout inside
//! the data directory lives in [`crate::store::StoreFile`].

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(priority::paths::no_home),
        help("Set the HOME environment variable or pass --data-dir explicitly.")
    )]
    NoHome,

    #[error("failed to create directory: {path}")]
    #[diagnostic(
        code(priority::paths::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

const APP_DIR: &str = "inbox-priority";

/// Global XDG-compliant directories for inbox-priority.
#[derive(Debug, Clone)]
pub struct PriorityPaths {
    /// `$XDG_CONFIG_HOME/inbox-priority/`
    pub config_dir: PathBuf,
    /// `$XDG_DATA_HOME/inbox-priority/`
    pub data_dir: PathBuf,
}

impl PriorityPaths {
    /// Resolve XDG directories from environment variables with standard fallbacks.
    pub fn resolve() -> PathResult<Self> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| PathError::NoHome)?;

        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".config"))
            .join(APP_DIR);

        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".local/share"))
            .join(APP_DIR);

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Rooted layout for a single directory, used when `--data-dir` is given.
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_dir: root.clone(),
            data_dir: root,
        }
    }

    /// Create all base directories. Idempotent.
    pub fn ensure_dirs(&self) -> PathResult<()> {
        for dir in [&self.config_dir, &self.data_dir] {
            std::fs::create_dir_all(dir).map_err(|e| PathError::CreateDir {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Path to the engine config file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_paths_use_app_dir() {
        // Env vars are not mutated here (unsafe in edition 2024).
        if std::env::var("HOME").is_err() {
            return;
        }
        let paths = PriorityPaths::resolve().unwrap();
        assert!(paths.config_dir.ends_with(APP_DIR));
        assert!(paths.data_dir.ends_with(APP_DIR));
    }

    #[test]
    fn rooted_layout_shares_one_dir() {
        let paths = PriorityPaths::rooted("/tmp/prio");
        assert_eq!(paths.data_dir, PathBuf::from("/tmp/prio"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/prio/config.toml"));
    }

    #[test]
    fn ensure_dirs_creates_tree() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = PriorityPaths {
            config_dir: dir.path().join("cfg"),
            data_dir: dir.path().join("data"),
        };
        paths.ensure_dirs().unwrap();
        assert!(paths.config_dir.is_dir());
        assert!(paths.data_dir.is_dir());
        // Idempotent.
        paths.ensure_dirs().unwrap();
    }
}
