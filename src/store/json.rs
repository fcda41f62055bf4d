//! JSON file load/save with explicit missing-vs-corrupt outcomes.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::error::{StoreError, StoreResult};

/// Why a state file could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// First run, or the file was removed. Not an error condition.
    #[error("no state file at {path}")]
    Missing { path: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read and parse a JSON file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LoadError::Missing {
                path: path.display().to_string(),
            });
        }
        Err(e) => {
            return Err(StoreError::Io {
                path: path.display().to_string(),
                source: e,
            }
            .into());
        }
    };

    serde_json::from_str(&data).map_err(|e| {
        StoreError::Corrupt {
            path: path.display().to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Load a JSON file, falling back to `T::default()`.
///
/// Missing files are silent (debug). Unreadable or corrupt files are logged at
/// `warn` and left untouched on disk until the next successful save.
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path) {
        Ok(value) => value,
        Err(LoadError::Missing { path }) => {
            tracing::debug!(%path, "state file missing, starting empty");
            T::default()
        }
        Err(LoadError::Store(e)) => {
            tracing::warn!(error = %e, "state file unusable, starting empty");
            T::default()
        }
    }
}

/// Serialize to pretty JSON and atomically replace `path`.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::Serialization {
        message: e.to_string(),
    })?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let io_err = |source| StoreError::Io {
        path: path.display().to_string(),
        source,
    };

    std::fs::create_dir_all(parent).map_err(io_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    tmp.write_all(json.as_bytes()).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
