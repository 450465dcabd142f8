//! Snapshot-based undo/redo over the element list.

use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::element::{ElementList, empty_list, same_snapshot};
use std::collections::VecDeque;

/// Where an element-list write came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOrigin {
    /// A user action; recorded.
    User,
    /// An undo/redo restore; never recorded.
    History,
    /// A freshly opened document; becomes the new initial state.
    Load,
}

/// Undo/redo stacks of element-list snapshots.
#[derive(Debug, Clone)]
pub struct History {
    /// Oldest first. Never empty: the first entry is the initial state.
    past: Vec<ElementList>,
    /// Nearest undo first.
    future: VecDeque<ElementList>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(empty_list(), DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    /// Start a history whose initial state is `initial`. `limit` caps the
    /// number of snapshots kept in `past` (at least one).
    pub fn new(initial: ElementList, limit: usize) -> Self {
        Self {
            past: vec![initial],
            future: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Feed a state change. User edits are recorded, history restores are
    /// ignored, loads reset the stacks. Returns true if a snapshot was
    /// recorded.
    pub fn observe(&mut self, snapshot: &ElementList, origin: EditOrigin) -> bool {
        match origin {
            EditOrigin::User => self.record(snapshot),
            EditOrigin::History => false,
            EditOrigin::Load => {
                self.reset(snapshot.clone());
                false
            }
        }
    }

    /// Append a snapshot unless it is the one already on top. Clears the
    /// redo stack.
    pub fn record(&mut self, snapshot: &ElementList) -> bool {
        if self
            .past
            .last()
            .is_some_and(|last| same_snapshot(last, snapshot))
        {
            return false;
        }
        self.past.push(snapshot.clone());
        self.future.clear();

        if self.past.len() > self.limit {
            let excess = self.past.len() - self.limit;
            self.past.drain(..excess);
        }
        true
    }

    /// Step back. Returns the snapshot to restore, or `None` at the initial
    /// state.
    pub fn undo(&mut self) -> Option<ElementList> {
        if self.past.len() <= 1 {
            return None;
        }
        let undone = self.past.pop()?;
        self.future.push_front(undone);
        self.past.last().cloned()
    }

    /// Step forward. Returns the snapshot to restore, or `None` if nothing
    /// was undone.
    pub fn redo(&mut self) -> Option<ElementList> {
        let redone = self.future.pop_front()?;
        self.past.push(redone.clone());
        Some(redone)
    }

    /// Forget everything and start over from `initial`.
    pub fn reset(&mut self, initial: ElementList) {
        self.past.clear();
        self.past.push(initial);
        self.future.clear();
    }

    /// The snapshot the element list should currently be.
    pub fn current(&self) -> Option<&ElementList> {
        self.past.last()
    }

    pub fn can_undo(&self) -> bool {
        self.past.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, appended};
    use kurbo::Point;
    use proptest::prelude::*;

    fn edit(list: &ElementList, n: usize) -> ElementList {
        appended(list, Element::new(format!("e{n}"), "outlet-single", Point::ZERO))
    }

    #[test]
    fn test_record_skips_same_reference() {
        let initial = empty_list();
        let mut history = History::new(initial.clone(), 10);
        assert!(!history.record(&initial));
        let next = edit(&initial, 1);
        assert!(history.record(&next));
        assert!(!history.record(&next));
        assert_eq!(history.past_len(), 2);
    }

    #[test]
    fn test_undo_at_initial_is_noop() {
        let mut history = History::new(empty_list(), 10);
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_new_edit_discards_future() {
        let initial = empty_list();
        let mut history = History::new(initial.clone(), 100);
        let mut current = initial;
        for n in 0..3 {
            current = edit(&current, n);
            history.record(&current);
        }
        history.undo();
        let restored = history.undo().unwrap();
        assert_eq!(history.future_len(), 2);

        let branched = edit(&restored, 99);
        history.record(&branched);
        assert_eq!(history.future_len(), 0);
        assert_eq!(history.past_len(), 1 + 2);
        assert!(same_snapshot(history.current().unwrap(), &branched));
    }

    #[test]
    fn test_history_origin_is_ignored() {
        let initial = empty_list();
        let mut history = History::new(initial.clone(), 100);
        let first = edit(&initial, 1);
        history.observe(&first, EditOrigin::User);
        let restored = history.undo().unwrap();
        // The restore write comes back through observe and must not record.
        assert!(!history.observe(&restored, EditOrigin::History));
        assert!(history.can_redo());
    }

    #[test]
    fn test_load_resets() {
        let initial = empty_list();
        let mut history = History::new(initial.clone(), 100);
        history.observe(&edit(&initial, 1), EditOrigin::User);
        let loaded = edit(&initial, 7);
        history.observe(&loaded, EditOrigin::Load);
        assert_eq!(history.past_len(), 1);
        assert!(!history.can_undo());
        assert!(same_snapshot(history.current().unwrap(), &loaded));
    }

    #[test]
    fn test_limit_trims_oldest() {
        let initial = empty_list();
        let mut history = History::new(initial.clone(), 3);
        let mut current = initial;
        for n in 0..5 {
            current = edit(&current, n);
            history.record(&current);
        }
        assert_eq!(history.past_len(), 3);
        assert!(history.undo().is_some());
        assert!(history.undo().is_some());
        assert!(history.undo().is_none());
    }

    proptest! {
        #[test]
        fn prop_undo_redo_symmetry(edits in 1usize..30, extra_undos in 0usize..5) {
            let initial = empty_list();
            let mut history = History::new(initial.clone(), 1000);
            let mut current = initial.clone();
            for n in 0..edits {
                current = edit(&current, n);
                history.record(&current);
            }
            let last = current.clone();

            for _ in 0..edits {
                prop_assert!(history.undo().is_some());
            }
            for _ in 0..extra_undos {
                prop_assert!(history.undo().is_none());
            }
            prop_assert!(same_snapshot(history.current().unwrap(), &initial));

            let mut restored = None;
            for _ in 0..edits {
                restored = history.redo();
            }
            prop_assert!(same_snapshot(&restored.unwrap(), &last));
            prop_assert!(history.redo().is_none());
        }
    }
}
