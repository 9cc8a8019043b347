//! File-level comparison of two trees
//!
//! Subtrees with identical IDs are skipped without being read; everything
//! else is compared entry by entry and recursed into, yielding one change
//! per file path.

use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::database::tree_record::TreeRecord;
use crate::artifacts::objects::object_id::ObjectId;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum TreeChangeType {
    Added(DatabaseEntry),
    Deleted(DatabaseEntry),
    Modified {
        old: DatabaseEntry,
        new: DatabaseEntry,
    },
}

impl TreeChangeType {
    pub fn from_entries(old: Option<DatabaseEntry>, new: Option<DatabaseEntry>) -> Option<Self> {
        match (old, new) {
            (None, Some(new)) => Some(TreeChangeType::Added(new)),
            (Some(old), None) => Some(TreeChangeType::Deleted(old)),
            (Some(old), Some(new)) if !same_entry(&old, &new) => {
                Some(TreeChangeType::Modified { old, new })
            }
            _ => None,
        }
    }

    pub fn old_entry(&self) -> Option<&DatabaseEntry> {
        match self {
            TreeChangeType::Deleted(entry) => Some(entry),
            TreeChangeType::Modified { old, .. } => Some(old),
            TreeChangeType::Added(_) => None,
        }
    }

    pub fn new_entry(&self) -> Option<&DatabaseEntry> {
        match self {
            TreeChangeType::Added(entry) => Some(entry),
            TreeChangeType::Modified { new, .. } => Some(new),
            TreeChangeType::Deleted(_) => None,
        }
    }
}

/// Same object under the same normalized mode
fn same_entry(a: &DatabaseEntry, b: &DatabaseEntry) -> bool {
    a.oid == b.oid && a.mode() == b.mode()
}

pub type ChangeSet = BTreeMap<PathBuf, TreeChangeType>;
type TreeEntryMap<'t> = BTreeMap<&'t [u8], &'t DatabaseEntry>;

#[derive(Debug)]
pub struct TreeDiff<'r> {
    database: &'r Database,
    change_set: ChangeSet,
}

impl<'r> TreeDiff<'r> {
    pub fn new(database: &'r Database) -> Self {
        TreeDiff {
            database,
            change_set: BTreeMap::new(),
        }
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.change_set
    }

    pub fn into_changes(self) -> ChangeSet {
        self.change_set
    }

    /// Compare two already loaded trees; `None` is the empty tree
    pub fn compare_records(
        &mut self,
        old: Option<&TreeRecord>,
        new: Option<&TreeRecord>,
        prefix: &Path,
    ) -> anyhow::Result<()> {
        let empty = TreeRecord::empty();
        let old = Self::entry_map(old.unwrap_or(&empty));
        let new = Self::entry_map(new.unwrap_or(&empty));

        self.detect_deletions(&old, &new, prefix)?;
        self.detect_additions(&old, &new, prefix)?;

        Ok(())
    }

    pub fn compare_oids(
        &mut self,
        old: Option<&ObjectId>,
        new: Option<&ObjectId>,
        prefix: &Path,
    ) -> anyhow::Result<()> {
        if old == new {
            return Ok(());
        }

        let old_tree = self.inflate(old)?;
        let new_tree = self.inflate(new)?;

        self.compare_records(old_tree.as_ref(), new_tree.as_ref(), prefix)
    }

    fn inflate(&self, oid: Option<&ObjectId>) -> anyhow::Result<Option<TreeRecord>> {
        match oid {
            None => Ok(None),
            Some(oid) => self
                .database
                .parse_object_as_tree(oid)?
                .map(Some)
                .ok_or_else(|| anyhow::anyhow!("Invalid tree object {}", oid)),
        }
    }

    fn entry_map(record: &TreeRecord) -> TreeEntryMap<'_> {
        record
            .entries()
            .iter()
            .map(|entry| (entry.name.as_slice(), entry))
            .collect()
    }

    fn detect_deletions(
        &mut self,
        old: &TreeEntryMap,
        new: &TreeEntryMap,
        prefix: &Path,
    ) -> anyhow::Result<()> {
        for (name, entry) in old {
            let path = prefix.join(OsStr::from_bytes(name));
            let other = new.get(name).copied();

            if let Some(other) = other
                && same_entry(other, entry)
            {
                continue;
            }

            let tree_a_oid = entry.is_tree().then_some(&entry.oid);
            let tree_b_oid = other.filter(|other| other.is_tree()).map(|other| &other.oid);

            self.compare_oids(tree_a_oid, tree_b_oid, &path)?;

            let blob_a = (!entry.is_tree()).then(|| (*entry).clone());
            let blob_b = other.filter(|other| !other.is_tree()).cloned();

            if let Some(change_type) = TreeChangeType::from_entries(blob_a, blob_b) {
                self.change_set.insert(path, change_type);
            }
        }

        Ok(())
    }

    fn detect_additions(
        &mut self,
        old: &TreeEntryMap,
        new: &TreeEntryMap,
        prefix: &Path,
    ) -> anyhow::Result<()> {
        for (name, entry) in new {
            if old.contains_key(name) {
                continue;
            }

            let path = prefix.join(OsStr::from_bytes(name));
            if entry.is_tree() {
                self.compare_oids(None, Some(&entry.oid), &path)?;
            } else {
                self.change_set
                    .insert(path, TreeChangeType::Added((*entry).clone()));
            }
        }

        Ok(())
    }
}
