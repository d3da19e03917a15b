//! Message repositories.
//!
//! A repository supplies and deletes message entries. The core talks to it
//! through the narrow [`Repository`] trait; repository-originated events
//! (`NewMessage`, `RefreshNeeded`) arrive from an arbitrary background
//! context and must be re-marshalled onto the controller channel before
//! they touch shared state.

use crate::model::{MessageEntry, RepoError};

pub mod memory;
pub mod spool;

pub use memory::MemoryRepository;
pub use spool::{SpoolRepository, SpoolWatcher};

/// Event raised by a repository from its background watcher.
#[derive(Debug, Clone)]
pub enum RepoEvent {
    /// A new message was ingested; carries its entry.
    NewMessage(MessageEntry),
    /// The repository changed in a way that requires a full rescan
    /// (deletion, truncation, bulk change).
    RefreshNeeded,
}

/// Narrow interface to the message store.
///
/// Implementations may be slow (filesystem, network); the controller only
/// calls them from its own thread or from inside the deletion guard's
/// critical section.
pub trait Repository: Send + Sync {
    /// Enumerate all stored entries, in no particular order.
    fn load_all(&self) -> Result<Vec<MessageEntry>, RepoError>;

    /// Delete one entry.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::NotFound`] if the entry was already removed.
    fn delete(&self, entry: &MessageEntry) -> Result<(), RepoError>;
}

impl<R: Repository + ?Sized> Repository for std::sync::Arc<R> {
    fn load_all(&self) -> Result<Vec<MessageEntry>, RepoError> {
        (**self).load_all()
    }

    fn delete(&self, entry: &MessageEntry) -> Result<(), RepoError> {
        (**self).delete(entry)
    }
}
