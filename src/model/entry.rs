//! Message entry identity and metadata.
//!
//! A [`MessageEntry`] is a lightweight handle to one stored message: identity
//! token plus display metadata. Entries are immutable once created and
//! compare by identity token, never by content.

use chrono::{DateTime, Utc};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Stable, opaque identity token for a persisted message.
///
/// Tokens are assigned by the repository on ingest (for the spool repository
/// this is the file stem of the `.eml` file). The raw constructor is never
/// exported; use the smart constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageToken(String);

impl MessageToken {
    /// Smart constructor: validates a non-empty token.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidToken> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidToken::Empty);
        }
        Ok(Self(raw))
    }

    /// Borrow the raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned by the [`MessageToken`] smart constructor.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InvalidToken {
    /// Tokens must be non-empty.
    #[error("message token cannot be empty")]
    Empty,
}

/// Identity plus metadata for one stored message.
///
/// Immutable once created. Equality and hashing are by identity token only:
/// two entries with the same token are the same message regardless of
/// metadata, which is what the list dedup invariant relies on.
#[derive(Debug, Clone)]
pub struct MessageEntry {
    token: MessageToken,
    modified: DateTime<Utc>,
    size: u64,
    path: Option<PathBuf>,
}

impl MessageEntry {
    /// Create an entry without a backing file path.
    pub fn new(token: MessageToken, modified: DateTime<Utc>, size: u64) -> Self {
        Self {
            token,
            modified,
            size,
            path: None,
        }
    }

    /// Attach the backing file path (enables drag export).
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// The identity token.
    pub fn token(&self) -> &MessageToken {
        &self.token
    }

    /// Modification timestamp; the live list sort key.
    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    /// Stored size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Backing file path, if the message has one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl PartialEq for MessageEntry {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl Eq for MessageEntry {}

impl Hash for MessageEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.token.hash(state);
    }
}
