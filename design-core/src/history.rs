//! Linear undo/redo history of full snapshots.
//!
//! ```text
//! commit(A) commit(B) commit(C)      undo()          commit(D)
//! [init, A, B, C]                    [init, A, B, C]  [init, A, B, D]
//!                 ^                            ^                  ^
//! ```
//!
//! Committing while the cursor is not at the end discards everything after
//! the cursor first, so there is never a branching redo path.

use std::collections::VecDeque;

/// A snapshot log with a cursor.
///
/// Always holds at least one entry; the cursor always points at a valid entry.
#[derive(Debug, Clone, PartialEq)]
pub struct History<T> {
    entries: VecDeque<T>,
    index: usize,
    max_entries: Option<usize>,
}

impl<T: Clone> History<T> {
    /// Start a history whose only entry is `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        let mut entries = VecDeque::new();
        entries.push_back(initial);
        Self {
            entries,
            index: 0,
            max_entries: None,
        }
    }

    /// Start a history that keeps at most `max_entries` snapshots, dropping
    /// the oldest first. A limit below 1 is treated as 1.
    #[must_use]
    pub fn with_limit(initial: T, max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries.max(1)),
            ..Self::new(initial)
        }
    }

    /// Record `snapshot` as the newest entry and move the cursor onto it.
    pub fn commit(&mut self, snapshot: T) {
        self.entries.truncate(self.index + 1);
        self.entries.push_back(snapshot);
        if let Some(max) = self.max_entries {
            while self.entries.len() > max {
                self.entries.pop_front();
            }
        }
        self.index = self.entries.len() - 1;
    }

    /// Step back one entry. Returns the entry now under the cursor, or `None`
    /// if already at the oldest entry.
    pub fn undo(&mut self) -> Option<&T> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    /// Step forward one entry. Returns the entry now under the cursor, or
    /// `None` if already at the newest entry.
    pub fn redo(&mut self) -> Option<&T> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    /// Drop every entry and start over from `initial`.
    pub fn reset(&mut self, initial: T) {
        self.entries.clear();
        self.entries.push_back(initial);
        self.index = 0;
    }

    /// The entry under the cursor.
    #[must_use]
    pub fn current(&self) -> &T {
        // The log is never empty and the cursor never leaves it.
        &self.entries[self.index]
    }

    /// Cursor position.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; a history holds at least its initial entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether [`History::undo`] would move.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    /// Whether [`History::redo`] would move.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }
}
