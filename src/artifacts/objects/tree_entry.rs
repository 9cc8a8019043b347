//! Single entries of a tree
//!
//! A [`TreeEntry`] is an owned copy of one record of a tree, optionally tied
//! to the repository it was read from so that the object it names can be
//! resolved. Entries order the way Git sorts trees, with the object ID as a
//! tie-breaker.

use crate::areas::repository::Repository;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object::GitObject;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::{Tree, found, walk_path};
use crate::artifacts::objects::tree_error::{TreeError, TreeResult};
use crate::artifacts::objects::tree_key::TreeKey;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Clone)]
pub struct TreeEntry {
    entry: DatabaseEntry,
    repository: Option<Arc<Repository>>,
}

impl TreeEntry {
    pub(crate) fn new(entry: DatabaseEntry, repository: Option<Arc<Repository>>) -> Self {
        TreeEntry { entry, repository }
    }

    /// Normalized mode bits (`0o100644`, `0o100755`, `0o120000`, `0o040000`, `0o160000`)
    pub fn filemode(&self) -> u32 {
        self.entry.mode().as_u32()
    }

    /// Mode bits exactly as stored
    pub fn filemode_raw(&self) -> u32 {
        self.entry.raw_mode()
    }

    pub fn mode(&self) -> EntryMode {
        self.entry.mode()
    }

    /// Name decoded as UTF-8; invalid sequences are replaced
    pub fn name(&self) -> Cow<'_, str> {
        self.entry.name_lossy()
    }

    pub fn raw_name(&self) -> &[u8] {
        &self.entry.name
    }

    pub fn kind(&self) -> ObjectType {
        self.entry.object_type()
    }

    pub fn id(&self) -> &ObjectId {
        &self.entry.oid
    }

    pub fn hex(&self) -> String {
        self.entry.oid.to_hex()
    }

    #[deprecated(note = "use `id` instead")]
    pub fn oid(&self) -> &ObjectId {
        self.id()
    }

    pub fn repository(&self) -> Option<&Arc<Repository>> {
        self.repository.as_ref()
    }

    fn require_repository(&self) -> TreeResult<&Arc<Repository>> {
        self.repository.as_ref().ok_or(TreeError::MissingRepository)
    }

    fn expect_kind(&self, expected: ObjectType) -> TreeResult<()> {
        match self.kind() {
            actual if actual == expected => Ok(()),
            actual => Err(TreeError::TypeMismatch { expected, actual }),
        }
    }

    /// The tree this entry names
    pub fn resolve_subtree(&self) -> TreeResult<Tree> {
        self.expect_kind(ObjectType::Tree)?;
        self.require_repository()?.lookup_tree(self.id())
    }

    /// The object this entry names, wrapped to its concrete kind
    pub fn resolve_object(&self) -> TreeResult<GitObject> {
        self.require_repository()?.lookup_object(self.id())
    }

    pub fn resolve_blob(&self) -> TreeResult<Blob> {
        self.expect_kind(ObjectType::Blob)?;

        let object = self.resolve_object()?;
        let actual = object.object_type();
        object.into_blob().ok_or(TreeError::TypeMismatch {
            expected: ObjectType::Blob,
            actual,
        })
    }

    /// Whether `path` exists below this (tree) entry
    pub fn contains(&self, path: impl AsRef<[u8]>) -> TreeResult<bool> {
        let subtree = self.resolve_subtree()?;
        found(walk_path(subtree.record(), subtree.repository(), path.as_ref()))
    }

    /// Look up an entry of the subtree this entry names
    pub fn get(&self, key: impl Into<TreeKey>) -> TreeResult<TreeEntry> {
        let subtree = self.resolve_subtree()?;
        subtree.get(key)
    }

    pub fn divide_by(&self, path: impl AsRef<[u8]>) -> TreeResult<TreeEntry> {
        self.resolve_subtree()?.get_by_path(path)
    }
}

impl PartialEq for TreeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TreeEntry {}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.entry
            .sort_cmp(&other.entry)
            .then_with(|| self.entry.oid.cmp(&other.entry.oid))
    }
}

impl<P: AsRef<[u8]>> std::ops::Div<P> for &TreeEntry {
    type Output = TreeResult<TreeEntry>;

    fn div(self, path: P) -> Self::Output {
        self.divide_by(path)
    }
}

impl std::fmt::Display for TreeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TreeEntry('{}', {}, {})", self.name(), self.kind(), self.hex())
    }
}

impl std::fmt::Debug for TreeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeEntry")
            .field("name", &self.name())
            .field("mode", &format_args!("{:06o}", self.filemode_raw()))
            .field("id", self.id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::entry_mode::FileMode;
    use crate::artifacts::objects::hash_algorithm::HashAlgorithm;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn entry(name: &str, mode: EntryMode, content: &[u8]) -> TreeEntry {
        TreeEntry::new(
            DatabaseEntry::new(name, mode, HashAlgorithm::Sha1.hash(content)),
            None,
        )
    }

    #[rstest]
    fn exposes_record_attributes() {
        let raw = DatabaseEntry::from_raw(
            b"run.sh".to_vec(),
            0o100775,
            HashAlgorithm::Sha1.hash(b"blob 0\0"),
        );
        let entry = TreeEntry::new(raw, None);

        assert_eq!(entry.name(), "run.sh");
        assert_eq!(entry.filemode(), 0o100755);
        assert_eq!(entry.filemode_raw(), 0o100775);
        assert_eq!(entry.kind(), ObjectType::Blob);
        assert_eq!(entry.hex(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
        assert_eq!(
            entry.to_string(),
            "TreeEntry('run.sh', blob, e69de29bb2d1d6434b8b29ae775ad8c2e48c5391)"
        );
    }

    #[rstest]
    fn invalid_utf8_names_are_replaced() {
        let raw = DatabaseEntry::from_raw(
            b"caf\xe9".to_vec(),
            0o100644,
            HashAlgorithm::Sha1.hash(b"blob 0\0"),
        );
        let entry = TreeEntry::new(raw, None);

        assert_eq!(entry.name(), "caf\u{fffd}");
        assert_eq!(entry.raw_name(), b"caf\xe9");
    }

    #[rstest]
    fn orders_by_tree_sort_then_id() {
        let regular = EntryMode::File(FileMode::Regular);
        let foo_dir = entry("foo", EntryMode::Directory, b"1");
        let foo_txt = entry("foo.txt", regular, b"1");
        let foo_a = entry("foo", regular, b"a");
        let foo_b = entry("foo", regular, b"b");

        assert!(foo_txt < foo_dir);
        assert!(foo_a < foo_dir);
        assert_eq!(foo_a.cmp(&foo_b), foo_a.id().cmp(foo_b.id()));
        assert!(foo_a <= foo_a.clone());
        assert!(!(foo_a < foo_a.clone()));
        assert_eq!(foo_a, foo_a.clone());
    }

    #[rstest]
    fn resolution_requires_matching_kind_and_repository() {
        let blob = entry("a.txt", EntryMode::File(FileMode::Regular), b"x");
        let tree = entry("sub", EntryMode::Directory, b"y");

        assert!(matches!(
            blob.resolve_subtree(),
            Err(TreeError::TypeMismatch {
                expected: ObjectType::Tree,
                actual: ObjectType::Blob
            })
        ));
        assert!(matches!(
            tree.resolve_blob(),
            Err(TreeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            tree.resolve_subtree(),
            Err(TreeError::MissingRepository)
        ));
        assert!(matches!(blob.resolve_object(), Err(TreeError::MissingRepository)));
        assert!(matches!(tree.contains("x"), Err(TreeError::MissingRepository)));
        assert!(matches!(tree.get(0), Err(TreeError::MissingRepository)));
    }
}
