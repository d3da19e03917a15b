//! In-memory repository for tests and tooling.

use crate::model::{MessageEntry, MessageToken, RepoError};
use crate::repo::Repository;
use std::sync::Mutex;
use std::time::Duration;

/// Mutex-backed repository holding entries in memory.
///
/// Records every successful delete so tests can assert each captured entry
/// is deleted exactly once. An optional artificial delay on `delete` widens
/// race windows for the deletion-guard tests.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    entries: Mutex<Vec<MessageEntry>>,
    deletions: Mutex<Vec<MessageToken>>,
    delete_delay: Option<Duration>,
}

impl MemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository that sleeps for `delay` inside every `delete`.
    pub fn with_delete_delay(delay: Duration) -> Self {
        Self {
            delete_delay: Some(delay),
            ..Self::default()
        }
    }

    /// Ingest an entry. Replaces any existing entry with the same token.
    pub fn insert(&self, entry: MessageEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|e| e.token() != entry.token());
        entries.push(entry);
    }

    /// Tokens deleted so far, in deletion order.
    pub fn deletion_log(&self) -> Vec<MessageToken> {
        self.deletions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Repository for MemoryRepository {
    fn load_all(&self) -> Result<Vec<MessageEntry>, RepoError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    fn delete(&self, entry: &MessageEntry) -> Result<(), RepoError> {
        if let Some(delay) = self.delete_delay {
            std::thread::sleep(delay);
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|e| e.token() != entry.token());
        if entries.len() == before {
            return Err(RepoError::NotFound {
                token: entry.token().clone(),
            });
        }
        self.deletions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry.token().clone());
        Ok(())
    }
}
