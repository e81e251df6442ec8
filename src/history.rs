//! Bounded linear undo/redo log of full-state snapshots.

use std::collections::VecDeque;

/// Number of states an editable model keeps by default.
pub const MAX_ROLLBACK: usize = 50;

#[derive(Debug, Clone)]
pub struct History<T> {
    states: VecDeque<T>,
    current: Option<usize>,
    capacity: usize,
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self::with_capacity(MAX_ROLLBACK)
    }

    /// A capacity of 0 is raised to 1 so the current state can always be held.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            states: VecDeque::with_capacity(capacity),
            current: None,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Position of the current state, if any state was saved.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_state(&self) -> Option<&T> {
        self.states.get(self.current?)
    }

    pub fn undoable(&self) -> bool {
        matches!(self.current, Some(i) if i > 0)
    }

    pub fn redoable(&self) -> bool {
        matches!(self.current, Some(i) if i + 1 < self.states.len())
    }

    /// Makes `state` the current state. Redoable states are discarded. Once
    /// the capacity is reached the oldest state is dropped and the pointer
    /// stays where it is, which now is the new state.
    pub fn save_state(&mut self, state: T) {
        let keep = self.current.map_or(0, |i| i + 1);
        self.states.truncate(keep);
        self.states.push_back(state);
        if self.states.len() > self.capacity {
            self.states.pop_front();
            tracing::trace!(capacity = self.capacity, "oldest history state dropped");
        } else {
            self.current = Some(keep);
        }
    }

    /// Steps back and returns the state that is now current.
    pub fn undo(&mut self) -> Option<&T> {
        if !self.undoable() {
            return None;
        }
        let index = self.current? - 1;
        self.current = Some(index);
        self.states.get(index)
    }

    /// Steps forward and returns the state that is now current.
    pub fn redo(&mut self) -> Option<&T> {
        if !self.redoable() {
            return None;
        }
        let index = self.current? + 1;
        self.current = Some(index);
        self.states.get(index)
    }

    /// Retained states, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.states.iter()
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.current = None;
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}
