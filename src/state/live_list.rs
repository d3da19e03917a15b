//! The live, ordered list of message entries.
//!
//! Owns the visible sequence and the single selected position. Invariants:
//! no duplicate identity tokens, sorted by modification timestamp ascending
//! after every mutation, and the selected index (when present) is always a
//! valid index into the current sequence.
//!
//! Every mutation reports whether the *effective selected entry* changed so
//! the caller can trigger a display update only when it has to: an insert
//! above the selection shifts the index but keeps the entry, which is not a
//! selection change.

use crate::model::{MessageEntry, MessageToken};
use std::collections::HashSet;

/// Whether a mutation changed the effective selected entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    /// The selected entry (by token) is the same as before.
    Unchanged,
    /// A different entry (or no entry) is now selected.
    Changed,
}

/// Ordered, deduplicated sequence of entries with one nullable selection.
#[derive(Debug, Clone, Default)]
pub struct LiveList {
    entries: Vec<MessageEntry>,
    selected: Option<usize>,
}

impl LiveList {
    /// Create an empty list with no selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of visible entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The visible entries in display order.
    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    /// Entry at a display index.
    pub fn get(&self, index: usize) -> Option<&MessageEntry> {
        self.entries.get(index)
    }

    /// Current selected index, if any.
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Current selected entry, if any.
    pub fn selected_entry(&self) -> Option<&MessageEntry> {
        self.selected.and_then(|i| self.entries.get(i))
    }

    fn selected_token(&self) -> Option<MessageToken> {
        self.selected_entry().map(|e| e.token().clone())
    }

    fn change_since(&self, before: Option<MessageToken>) -> SelectionChange {
        if self.selected_token() == before {
            SelectionChange::Unchanged
        } else {
            SelectionChange::Changed
        }
    }

    /// Select by display index. Out-of-range indexes are ignored; `None`
    /// clears the selection.
    pub fn select_index(&mut self, index: Option<usize>) -> SelectionChange {
        let before = self.selected_token();
        match index {
            Some(i) if i < self.entries.len() => self.selected = Some(i),
            Some(_) => {}
            None => self.selected = None,
        }
        self.change_since(before)
    }

    /// Select the entry with the given token, if present.
    pub fn select_token(&mut self, token: &MessageToken) -> SelectionChange {
        let before = self.selected_token();
        if let Some(pos) = self.entries.iter().position(|e| e.token() == token) {
            self.selected = Some(pos);
        }
        self.change_since(before)
    }

    /// Replace the entire visible list.
    ///
    /// Entries are deduplicated by token (first occurrence wins) and
    /// re-sorted by modification timestamp ascending. Selection rule: keep
    /// the previous ordinal position when it is still in range, otherwise
    /// select the last element, otherwise nothing.
    pub fn reset(&mut self, entries: Vec<MessageEntry>) -> SelectionChange {
        let before = self.selected_token();
        let previous = self.selected;

        let mut seen = HashSet::new();
        let mut entries: Vec<MessageEntry> = entries
            .into_iter()
            .filter(|e| seen.insert(e.token().clone()))
            .collect();
        entries.sort_by_key(MessageEntry::modified);
        self.entries = entries;

        self.selected = match previous {
            Some(i) if i < self.entries.len() => Some(i),
            _ if !self.entries.is_empty() => Some(self.entries.len() - 1),
            _ => None,
        };
        self.change_since(before)
    }

    /// Add one entry in sorted position.
    ///
    /// Duplicate tokens are ignored. Selection tracks the entry, not the
    /// index: inserting above the selection shifts the index so the same
    /// entry stays selected. The effective selection therefore never
    /// changes on insert.
    pub fn insert(&mut self, entry: MessageEntry) -> SelectionChange {
        if self.entries.iter().any(|e| e.token() == entry.token()) {
            return SelectionChange::Unchanged;
        }
        // Stable tie policy: equal timestamps sort after existing entries,
        // so arrival order breaks ties.
        let pos = self
            .entries
            .partition_point(|e| e.modified() <= entry.modified());
        self.entries.insert(pos, entry);
        if let Some(sel) = self.selected {
            if pos <= sel {
                self.selected = Some(sel + 1);
            }
        }
        SelectionChange::Unchanged
    }

    /// Remove every entry whose token is in `tokens`.
    ///
    /// Selection is re-derived from the current selected ordinal index; see
    /// [`LiveList::remove_with_anchor`].
    pub fn remove(&mut self, tokens: &HashSet<MessageToken>) -> SelectionChange {
        let anchor = self.selected;
        self.remove_with_anchor(tokens, anchor)
    }

    /// Remove entries, re-deriving selection from a captured ordinal index.
    ///
    /// Rule: if `anchor` is still a valid index after removal, select the
    /// entry now at that index; else if the list is non-empty, select the
    /// last entry; else select nothing. When `anchor` is `None` the list
    /// stays unselected.
    ///
    /// The deletion guard captures the anchor before performing repository
    /// deletes, so the rule applies to the pre-delete ordinal position.
    pub fn remove_with_anchor(
        &mut self,
        tokens: &HashSet<MessageToken>,
        anchor: Option<usize>,
    ) -> SelectionChange {
        let before = self.selected_token();
        self.entries.retain(|e| !tokens.contains(e.token()));

        self.selected = match anchor {
            None => None,
            Some(i) if i < self.entries.len() => Some(i),
            Some(_) if !self.entries.is_empty() => Some(self.entries.len() - 1),
            Some(_) => None,
        };
        self.change_since(before)
    }
}

// ===== Tests =====

#[cfg(test)]
#[path = "live_list_tests.rs"]
mod tests;
