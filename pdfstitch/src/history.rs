//! Snapshot-based undo/redo.
//!
//! Every mutating session operation saves a full copy of the page list before
//! it changes anything. Undo and redo swap the current list with a stored
//! snapshot, so each step is an exact inverse of the other.

use std::collections::VecDeque;

use tracing::debug;

use crate::model::PageRef;

/// A full copy of the page list.
pub type Snapshot = Vec<PageRef>;

/// Undo and redo stacks of page list snapshots.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    limit: Option<usize>,
}

impl History {
    /// Create an unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history that keeps at most `limit` undo steps.
    ///
    /// When full, saving evicts the oldest snapshot.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Record `current` as an undo step and clear the redo stack.
    pub fn save(&mut self, current: &[PageRef]) {
        self.push_undo(current.to_vec());
        self.redo.clear();
    }

    /// Record an already-taken snapshot as an undo step.
    ///
    /// Used when the state before a mutation was captured earlier, as with a
    /// drag that only commits once it ends.
    pub fn save_snapshot(&mut self, snapshot: Snapshot) {
        self.push_undo(snapshot);
        self.redo.clear();
    }

    /// Step back. Returns false and leaves `current` alone if there is
    /// nothing to undo.
    pub fn undo(&mut self, current: &mut Snapshot) -> bool {
        let Some(previous) = self.undo.pop_back() else {
            return false;
        };
        self.redo.push(std::mem::replace(current, previous));
        true
    }

    /// Step forward. Returns false and leaves `current` alone if there is
    /// nothing to redo.
    pub fn redo(&mut self, current: &mut Snapshot) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let previous = std::mem::replace(current, next);
        self.push_undo(previous);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Drop every stored snapshot.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    fn push_undo(&mut self, snapshot: Snapshot) {
        self.undo.push_back(snapshot);
        if let Some(limit) = self.limit {
            while self.undo.len() > limit {
                self.undo.pop_front();
                debug!(limit, "history limit reached, dropped oldest snapshot");
            }
        }
    }
}
