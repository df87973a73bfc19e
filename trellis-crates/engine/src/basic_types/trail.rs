use std::iter::Rev;
use std::vec::Drain;

/// The undo log of the search: entries are grouped by the checkpoint (search depth) at which
/// they were pushed, and backtracking hands back every entry above the target checkpoint.
#[derive(Clone, Debug)]
pub(crate) struct Trail<T> {
    /// For checkpoint `i + 1`, the length of `entries` when it was opened.
    checkpoint_starts: Vec<usize>,
    entries: Vec<T>,
}

// Implemented by hand so that `T` need not be `Default`.
impl<T> Default for Trail<T> {
    fn default() -> Self {
        Trail {
            checkpoint_starts: vec![],
            entries: vec![],
        }
    }
}

impl<T> Trail<T> {
    pub(crate) fn new_checkpoint(&mut self) {
        self.checkpoint_starts.push(self.entries.len());
    }

    /// The checkpoint new entries belong to; 0 is the root.
    pub(crate) fn get_checkpoint(&self) -> usize {
        self.checkpoint_starts.len()
    }

    /// Returns to `checkpoint`, yielding the entries pushed since, newest first. The entries
    /// are removed even if the iterator is not consumed.
    pub(crate) fn synchronise(&mut self, checkpoint: usize) -> Rev<Drain<'_, T>> {
        assert!(
            checkpoint < self.get_checkpoint(),
            "can only backtrack to an earlier checkpoint"
        );

        let start = self.checkpoint_starts[checkpoint];
        self.checkpoint_starts.truncate(checkpoint);
        self.entries.drain(start..).rev()
    }

    pub(crate) fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
