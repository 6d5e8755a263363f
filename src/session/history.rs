use std::collections::VecDeque;

/// Bounded snapshot history.
///
/// `record` stores the state *before* a change; `undo` and `redo` swap snapshots with the
/// caller's current state. Recording a new change discards the redo branch.
#[derive(Clone, Debug)]
pub(crate) struct History<T> {
    undo: VecDeque<T>,
    redo: Vec<T>,
    depth: usize,
}

impl<T> History<T> {
    pub(crate) fn new(depth: usize) -> Self {
        Self {
            undo: VecDeque::with_capacity(depth.min(64)),
            redo: Vec::new(),
            depth,
        }
    }

    pub(crate) fn record(&mut self, before: T) {
        self.redo.clear();
        if self.depth == 0 {
            return;
        }
        if self.undo.len() == self.depth {
            self.undo.pop_front();
        }
        self.undo.push_back(before);
    }

    pub(crate) fn undo(&mut self, current: T) -> Result<T, T> {
        match self.undo.pop_back() {
            Some(prev) => {
                self.redo.push(current);
                Ok(prev)
            }
            None => Err(current),
        }
    }

    pub(crate) fn redo(&mut self, current: T) -> Result<T, T> {
        match self.redo.pop() {
            Some(next) => {
                self.undo.push_back(current);
                if self.undo.len() > self.depth {
                    self.undo.pop_front();
                }
                Ok(next)
            }
            None => Err(current),
        }
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Apply `f` to every stored snapshot, for changes that are not user edits.
    pub(crate) fn for_each_mut(&mut self, f: impl FnMut(&mut T)) {
        self.iter_mut().for_each(f);
    }

    /// Stored snapshots, most recent undo state first, then the redo branch.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.undo.iter_mut().rev().chain(self.redo.iter_mut().rev())
    }

    pub(crate) fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/history.rs"]
mod tests;
