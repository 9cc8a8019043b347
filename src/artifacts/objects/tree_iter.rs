use crate::artifacts::objects::tree::Tree;
use crate::artifacts::objects::tree_entry::TreeEntry;
use crate::artifacts::objects::tree_error::TreeResult;
use std::iter::FusedIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IterState {
    Active(usize),
    Exhausted,
}

/// Forward iterator over the entries of a tree, in storage order
///
/// Each item is an independent copy. Once `None` is returned (or a copy
/// fails) the iterator stays exhausted.
#[derive(Debug, Clone)]
pub struct TreeIter {
    tree: Tree,
    state: IterState,
}

impl TreeIter {
    pub(crate) fn new(tree: Tree) -> Self {
        TreeIter {
            tree,
            state: IterState::Active(0),
        }
    }

    fn remaining(&self) -> usize {
        match self.state {
            IterState::Active(cursor) => self.tree.len().saturating_sub(cursor),
            IterState::Exhausted => 0,
        }
    }
}

impl Iterator for TreeIter {
    type Item = TreeResult<TreeEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let IterState::Active(cursor) = self.state else {
            return None;
        };

        let Some(entry) = self.tree.record().entry_by_index(cursor) else {
            self.state = IterState::Exhausted;
            return None;
        };

        match entry.try_duplicate() {
            Ok(entry) => {
                self.state = IterState::Active(cursor + 1);
                Some(Ok(TreeEntry::new(entry, self.tree.repository().cloned())))
            }
            Err(err) => {
                self.state = IterState::Exhausted;
                Some(Err(err.into()))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TreeIter {}

impl FusedIterator for TreeIter {}
