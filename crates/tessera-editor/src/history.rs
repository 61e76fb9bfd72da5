#![forbid(unsafe_code)]

//! Bounded snapshot history for undo/redo.
//!
//! Every committed edit pushes a full snapshot wrapped in an [`Arc`], so
//! undo and redo hand back shared pointers instead of cloning documents.
//!
//! ```text
//! push(s2)          undo()            push(s3)
//! undo: [s0 s1 s2]  undo: [s0 s1]     undo: [s0 s1 s3]
//! redo: []          redo: [s2]        redo: []
//! ```
//!
//! # Invariants
//!
//! 1. The back of the undo stack is the current snapshot.
//! 2. `undo_depth() <= max_depth` after every operation.
//! 3. A push clears the redo stack.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Snapshot stack with a depth limit; the oldest entries are evicted first.
pub struct SnapshotHistory<T> {
    undo_stack: VecDeque<Arc<T>>,
    redo_stack: VecDeque<Arc<T>>,
    max_depth: usize,
}

impl<T> fmt::Debug for SnapshotHistory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotHistory")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl<T> SnapshotHistory<T> {
    /// History seeded with `initial` as the current snapshot.
    ///
    /// `max_depth` counts the current snapshot and is raised to at least 1.
    #[must_use]
    pub fn new(initial: T, max_depth: usize) -> Self {
        let mut undo_stack = VecDeque::new();
        undo_stack.push_back(Arc::new(initial));
        Self {
            undo_stack,
            redo_stack: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record a new current snapshot, discarding anything undone.
    pub fn push(&mut self, state: T) {
        self.redo_stack.clear();
        self.undo_stack.push_back(Arc::new(state));
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Step back one snapshot. `None` when only the current one is left.
    pub fn undo(&mut self) -> Option<Arc<T>> {
        if self.undo_stack.len() < 2 {
            return None;
        }
        let current = self.undo_stack.pop_back()?;
        self.redo_stack.push_back(current);
        self.undo_stack.back().cloned()
    }

    /// Re-apply the most recently undone snapshot.
    pub fn redo(&mut self) -> Option<Arc<T>> {
        let snapshot = self.redo_stack.pop_back()?;
        self.undo_stack.push_back(snapshot);
        self.undo_stack.back().cloned()
    }

    #[must_use]
    pub fn current(&self) -> Option<&Arc<T>> {
        self.undo_stack.back()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() >= 2
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_current_only() {
        let history = SnapshotHistory::new(0, 10);
        assert_eq!(**history.current().unwrap(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_and_redo_walk_the_stack() {
        let mut history = SnapshotHistory::new(0, 10);
        history.push(1);
        history.push(2);
        assert_eq!(*history.undo().unwrap(), 1);
        assert_eq!(*history.undo().unwrap(), 0);
        assert!(history.undo().is_none());
        assert_eq!(*history.redo().unwrap(), 1);
        assert_eq!(**history.current().unwrap(), 1);
        assert_eq!(history.redo_depth(), 1);
    }

    #[test]
    fn push_clears_redo() {
        let mut history = SnapshotHistory::new(0, 10);
        history.push(1);
        let _ = history.undo();
        assert!(history.can_redo());
        history.push(5);
        assert!(!history.can_redo());
        assert!(history.redo().is_none());
        assert_eq!(**history.current().unwrap(), 5);
    }

    #[test]
    fn depth_limit_evicts_oldest() {
        let mut history = SnapshotHistory::new(0, 3);
        for n in 1..=5 {
            history.push(n);
        }
        assert_eq!(history.undo_depth(), 3);
        assert_eq!(*history.undo().unwrap(), 4);
        assert_eq!(*history.undo().unwrap(), 3);
        assert!(history.undo().is_none());
    }

    #[test]
    fn zero_depth_keeps_current() {
        let mut history = SnapshotHistory::new(0, 0);
        history.push(1);
        assert_eq!(history.max_depth(), 1);
        assert_eq!(**history.current().unwrap(), 1);
        assert!(!history.can_undo());
    }

    #[test]
    fn snapshots_are_shared() {
        let mut history = SnapshotHistory::new(String::from("a"), 4);
        history.push(String::from("b"));
        let previous = history.undo().unwrap();
        assert!(Arc::ptr_eq(&previous, history.current().unwrap()));
    }
}
