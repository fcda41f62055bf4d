//! Rich diagnostic error types for the priority engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. Triage, feedback and ranking operations
//! never surface these to callers; they are logged and the engine degrades to
//! defaults. Construction, explicit persistence and configuration I/O do return
//! them.

use miette::Diagnostic;
use thiserror::Error;

use crate::paths::PathError;

/// Top-level error type for the priority engine.
#[derive(Debug, Error, Diagnostic)]
pub enum PriorityError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    #[diagnostic(
        code(priority::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt state file {path}: {message}")]
    #[diagnostic(
        code(priority::store::corrupt),
        help(
            "The file could not be parsed. The engine starts from an empty table \
             when this happens; move the file aside to keep a copy of the old state."
        )
    )]
    Corrupt { path: String, message: String },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(priority::store::serde),
        help("Failed to serialize in-memory state. This is a bug; please report it.")
    )]
    Serialization { message: String },

    #[error("data directory is locked by another process: {path}")]
    #[diagnostic(
        code(priority::store::locked),
        help(
            "Another engine instance holds the writer lock. Stop it, or run this \
             instance read-only. Remove the lock file only if no other process is running."
        )
    )]
    Locked { path: String },

    #[error("engine is read-only: writer lock not held for {path}")]
    #[diagnostic(
        code(priority::store::read_only),
        help("Changes were kept in memory but not written. Release the lock held by the other instance.")
    )]
    ReadOnly { path: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(priority::config::read),
        help("Check that the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(priority::config::parse),
        help("The config file must be valid TOML. Run `inbox-priority init` to write a fresh one.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(priority::config::write),
        help("Check that the config directory is writable.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config value for `{field}`: {message}")]
    #[diagnostic(
        code(priority::config::invalid),
        help("Fix the value in config.toml or remove the line to use the default.")
    )]
    Invalid { field: String, message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Convenience alias for engine-level results.
pub type PriorityResult<T> = std::result::Result<T, PriorityError>;
