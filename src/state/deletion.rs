//! Serialized deletion of the selected entries.
//!
//! Rapid repeated delete actions (a key event and a click event firing in
//! quick succession, possibly from different contexts) must not both
//! observe the same selection and double-delete. The guard wraps the whole
//! capture-then-delete-then-resync sequence in one mutex-held critical
//! section: a second invocation waits for the first to finish and then
//! observes the post-deletion selection.
//!
//! The lock protects the compound sequence, not the list itself; the list
//! is confined to the controller thread and only passed in here.

use crate::model::{MessageEntry, MessageToken, RepoError};
use crate::repo::Repository;
use crate::state::live_list::{LiveList, SelectionChange};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// Outcome of one serialized delete operation.
#[derive(Debug)]
pub struct DeleteReport {
    /// Tokens actually deleted from the repository.
    pub deleted: Vec<MessageToken>,
    /// Whether a full resync from the repository was performed because an
    /// entry had already vanished.
    pub resynced: bool,
    /// Whether the effective selected entry changed.
    pub selection: SelectionChange,
}

/// Mutual exclusion for the delete-then-resync compound operation.
#[derive(Debug, Default)]
pub struct DeletionGuard {
    lock: Mutex<()>,
}

impl DeletionGuard {
    /// Create an unlocked guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete the currently selected entries.
    ///
    /// Captures the selection and its primary ordinal index before any
    /// removal, deletes each captured entry from the repository, removes
    /// them from the list, and re-derives the selection from the captured
    /// index. An entry the repository no longer knows
    /// ([`RepoError::NotFound`]) is recovered by resyncing the whole list
    /// from `load_all`; other repository failures propagate.
    pub fn delete_selected<R: Repository + ?Sized>(
        &self,
        list: &Mutex<LiveList>,
        repo: &R,
    ) -> Result<DeleteReport, RepoError> {
        let _serialized = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Capture before any removal.
        let (targets, anchor) = {
            let list = list.lock().unwrap_or_else(PoisonError::into_inner);
            let targets: Vec<MessageEntry> = list.selected_entry().cloned().into_iter().collect();
            (targets, list.selected_index())
        };
        if targets.is_empty() {
            debug!("delete requested with no selection, ignoring");
            return Ok(DeleteReport {
                deleted: Vec::new(),
                resynced: false,
                selection: SelectionChange::Unchanged,
            });
        }

        let mut deleted = Vec::new();
        let mut resync = false;
        for target in &targets {
            match repo.delete(target) {
                Ok(()) => {
                    info!(token = %target.token(), "deleted message");
                    deleted.push(target.token().clone());
                }
                Err(RepoError::NotFound { token }) => {
                    debug!(%token, "entry already gone, will resync list");
                    resync = true;
                }
                Err(other) => return Err(other),
            }
        }

        let selection = {
            let mut list = list.lock().unwrap_or_else(PoisonError::into_inner);
            let tokens: HashSet<MessageToken> =
                targets.iter().map(|e| e.token().clone()).collect();
            let removed = list.remove_with_anchor(&tokens, anchor);
            if resync {
                let all = repo.load_all()?;
                let reset = list.reset(all);
                if matches!(reset, SelectionChange::Changed) {
                    reset
                } else {
                    removed
                }
            } else {
                removed
            }
        };

        Ok(DeleteReport {
            deleted,
            resynced: resync,
            selection,
        })
    }
}

// ===== Tests =====

#[cfg(test)]
#[path = "deletion_tests.rs"]
mod tests;
