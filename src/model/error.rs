//! Error taxonomy for the cmv core.
//!
//! Hierarchical `thiserror` enums composing via `From` and `?`. Failure
//! policy: nothing that happens inside the controller loop is fatal to the
//! process. Load failures become a recoverable `Failed` display state;
//! repository `NotFound` on delete triggers a full list resync; only startup
//! wiring (config, logging, initial spool scan) may abort through
//! [`AppError`].

use crate::model::entry::MessageToken;
use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a message repository.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The entry was already removed (by a concurrent delete or external
    /// eviction). Recovered locally by resyncing the list from `load_all`.
    #[error("message {token} not found in repository")]
    NotFound {
        /// Token of the missing entry.
        token: MessageToken,
    },

    /// Underlying I/O failure while scanning or deleting.
    #[error("repository I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by a content loader.
///
/// Both variants are recovered locally: the coordinator logs them, shows a
/// blank failed content state, and leaves the list and selection usable.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The entry has no backing file to read content from.
    #[error("message {token} has no backing file")]
    NoBackingFile {
        /// Token of the affected entry.
        token: MessageToken,
    },

    /// Reading the message content failed.
    #[error("failed to read message content at {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The content could not be parsed as a message.
    #[error("failed to parse message {token}")]
    Parse {
        /// Token of the affected entry.
        token: MessageToken,
    },
}

/// Top-level application error for startup and shutdown paths.
#[derive(Debug, Error)]
pub enum AppError {
    /// Repository failure during initial scan or watcher setup.
    #[error("repository error: {0}")]
    Repo(#[from] RepoError),

    /// Configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Tracing initialization failed.
    #[error("logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    /// Generic I/O error from process wiring.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
