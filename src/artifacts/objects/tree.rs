//! Git tree object
//!
//! Trees represent directories in Git. Each entry carries a name, a mode and
//! the ID of a blob (file), another tree (subdirectory) or a commit
//! (submodule).
//!
//! A [`Tree`] is immutable once read. Entries are handed out as independent
//! [`TreeEntry`] copies, either by position or by `/`-separated path; path
//! lookups descend into subtrees, loading each one from the object database
//! only for the duration of the walk.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<raw-oid>`

use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::database::tree_record::TreeRecord;
use crate::artifacts::diff::diff_options::DiffOptions;
use crate::artifacts::diff::diff_result::Diff;
use crate::artifacts::diff::engine::DiffEngine;
use crate::artifacts::objects::hash_algorithm::HashAlgorithm;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree_entry::TreeEntry;
use crate::artifacts::objects::tree_error::{TreeError, TreeResult};
use crate::artifacts::objects::tree_iter::TreeIter;
use crate::artifacts::objects::tree_key::TreeKey;
use std::sync::Arc;

#[derive(Clone)]
pub struct Tree {
    id: ObjectId,
    record: Arc<TreeRecord>,
    repository: Option<Arc<Repository>>,
}

impl Tree {
    pub(crate) fn new(
        id: ObjectId,
        record: TreeRecord,
        repository: Option<Arc<Repository>>,
    ) -> Self {
        Tree {
            id,
            record: Arc::new(record),
            repository,
        }
    }

    /// Parse a raw tree payload (no `tree <size>\0` header)
    ///
    /// The result is not bound to any repository: entries can be listed and
    /// looked up by name, but subtrees cannot be entered and diffs cannot be
    /// computed.
    pub fn from_bytes(payload: &[u8], algorithm: HashAlgorithm) -> TreeResult<Self> {
        let record = TreeRecord::parse(payload, algorithm)?;

        let mut hasher = algorithm.hasher();
        hasher.update(format!("{} {}\0", ObjectType::Tree, payload.len()).as_bytes());
        hasher.update(payload);

        Ok(Tree::new(hasher.finish(), record, None))
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.record.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    pub fn repository(&self) -> Option<&Arc<Repository>> {
        self.repository.as_ref()
    }

    pub(crate) fn record(&self) -> &TreeRecord {
        &self.record
    }

    pub fn contains(&self, path: impl AsRef<[u8]>) -> TreeResult<bool> {
        found(walk_path(&self.record, self.repository.as_ref(), path.as_ref()))
    }

    /// Entry at `index`; negative values count back from the last entry
    pub fn get_by_index(&self, index: isize) -> TreeResult<TreeEntry> {
        let len = self.record.len() as isize;
        let position = if index < 0 { index + len } else { index };

        if !(0..len).contains(&position) {
            return Err(TreeError::IndexOutOfRange(index));
        }

        let entry = self
            .record
            .entry_by_index(position as usize)
            .ok_or(TreeError::IndexOutOfRange(index))?;

        Ok(TreeEntry::new(entry.try_duplicate()?, self.repository.clone()))
    }

    /// Entry at a `/`-separated path, descending into subtrees as needed
    ///
    /// A trailing `/` only matches trees.
    pub fn get_by_path(&self, path: impl AsRef<[u8]>) -> TreeResult<TreeEntry> {
        let entry = walk_path(&self.record, self.repository.as_ref(), path.as_ref())?;
        Ok(TreeEntry::new(entry, self.repository.clone()))
    }

    pub fn get(&self, key: impl Into<TreeKey>) -> TreeResult<TreeEntry> {
        match key.into() {
            TreeKey::Index(index) => self.get_by_index(index),
            TreeKey::Path(path) => self.get_by_path(path),
        }
    }

    /// Same as [`Tree::get_by_path`]; backs the `/` operator
    pub fn divide_by(&self, path: impl AsRef<[u8]>) -> TreeResult<TreeEntry> {
        self.get_by_path(path)
    }

    pub fn iter(&self) -> TreeIter {
        TreeIter::new(self.clone())
    }

    /// Changes turning this tree into `other`
    ///
    /// `None` stands for the empty tree. With `swap` the direction is
    /// reversed and the changes turn `other` into this tree.
    pub fn diff_to_tree(
        &self,
        other: Option<&Tree>,
        options: &DiffOptions,
        swap: bool,
    ) -> TreeResult<Diff> {
        let repository = self.require_repository()?;

        let (from, to) = match swap {
            true => (other, Some(self)),
            false => (Some(self), other),
        };

        Ok(DiffEngine::new(repository, options).tree_to_tree(from, to)?)
    }

    /// Changes between this tree and the staged content of `index`
    pub fn diff_to_index(&self, index: &Index, options: &DiffOptions) -> TreeResult<Diff> {
        let repository = self.require_repository()?;

        Ok(DiffEngine::new(repository, options).tree_to_index(Some(self), index)?)
    }

    /// Changes between this tree and the files in the working directory
    pub fn diff_to_workdir(&self, options: &DiffOptions) -> TreeResult<Diff> {
        let repository = self.require_repository()?;

        Ok(DiffEngine::new(repository, options).tree_to_workdir(Some(self))?)
    }

    fn require_repository(&self) -> TreeResult<&Arc<Repository>> {
        self.repository.as_ref().ok_or(TreeError::MissingRepository)
    }
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("id", &self.id)
            .field("entries", &self.record.len())
            .field("detached", &self.repository.is_none())
            .finish()
    }
}

impl<'a> IntoIterator for &'a Tree {
    type Item = TreeResult<TreeEntry>;
    type IntoIter = TreeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<P: AsRef<[u8]>> std::ops::Div<P> for &Tree {
    type Output = TreeResult<TreeEntry>;

    fn div(self, path: P) -> Self::Output {
        self.divide_by(path)
    }
}

/// `NotFound` means "no"; anything else is a real failure
pub(crate) fn found(lookup: TreeResult<DatabaseEntry>) -> TreeResult<bool> {
    match lookup {
        Ok(_) => Ok(true),
        Err(TreeError::NotFound { .. }) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Look up a `/`-separated path starting at `root`
///
/// Intermediate subtrees are read from the repository and dropped as soon
/// as the walk moves past them, on success and on error alike.
pub(crate) fn walk_path(
    root: &TreeRecord,
    repository: Option<&Arc<Repository>>,
    path: &[u8],
) -> TreeResult<DatabaseEntry> {
    if path.contains(&0) {
        return Err(TreeError::InvalidArgument(format!(
            "path contains a NUL byte: {:?}",
            String::from_utf8_lossy(path)
        )));
    }

    let (body, wants_tree) = match path.strip_suffix(b"/") {
        Some(body) => (body, true),
        None => (path, false),
    };
    if body.is_empty() {
        return Err(TreeError::not_found(path));
    }

    let mut segments = body.split(|byte| *byte == b'/').peekable();
    let mut subtree: Option<TreeRecord> = None;

    while let Some(segment) = segments.next() {
        if segment.is_empty() {
            return Err(TreeError::not_found(path));
        }

        let current = subtree.as_ref().unwrap_or(root);
        let entry = current
            .entry_by_name(segment)
            .ok_or_else(|| TreeError::not_found(path))?;

        if segments.peek().is_none() {
            if wants_tree && !entry.is_tree() {
                return Err(TreeError::not_found(path));
            }
            return Ok(entry.try_duplicate()?);
        }

        if !entry.is_tree() {
            return Err(TreeError::not_found(path));
        }

        let repository = repository.ok_or(TreeError::MissingRepository)?;
        let next = repository
            .database()
            .parse_object_as_tree(&entry.oid)?
            .ok_or_else(|| anyhow::anyhow!("object {} is not a tree", entry.oid))?;
        subtree = Some(next);
    }

    Err(TreeError::not_found(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::entry_mode::{EntryMode, FileMode};
    use crate::artifacts::objects::object::Packable;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    /// `a.txt` (blob) and `sub` (tree), parsed without a repository
    #[fixture]
    fn detached() -> Tree {
        let blob = HashAlgorithm::Sha1.hash(b"blob 0\0");
        let tree = HashAlgorithm::Sha1.hash(b"tree 0\0");
        let record = TreeRecord::new(vec![
            DatabaseEntry::new("a.txt", EntryMode::File(FileMode::Regular), blob),
            DatabaseEntry::new("sub", EntryMode::Directory, tree),
        ]);
        let bytes = record.serialize().unwrap();
        let payload = &bytes[bytes.iter().position(|b| *b == 0).unwrap() + 1..];

        Tree::from_bytes(payload, HashAlgorithm::Sha1).unwrap()
    }

    #[rstest]
    fn detached_tree_hashes_its_payload(detached: Tree) {
        let record = detached.record().clone();
        let bytes = record.serialize().unwrap();

        assert_eq!(detached.id(), &HashAlgorithm::Sha1.hash(&bytes));
        assert_eq!(detached.len(), 2);
        assert!(detached.repository().is_none());
    }

    #[rstest]
    #[case(0, "a.txt")]
    #[case(1, "sub")]
    #[case(-1, "sub")]
    #[case(-2, "a.txt")]
    fn indexes_from_both_ends(detached: Tree, #[case] index: isize, #[case] name: &str) {
        assert_eq!(detached.get_by_index(index).unwrap().name(), name);
    }

    #[rstest]
    #[case(2)]
    #[case(-3)]
    #[case(isize::MIN)]
    fn rejects_indices_out_of_range(detached: Tree, #[case] index: isize) {
        assert!(matches!(
            detached.get_by_index(index),
            Err(TreeError::IndexOutOfRange(i)) if i == index
        ));
    }

    #[rstest]
    #[case("a.txt", true)]
    #[case("sub", true)]
    #[case("sub/", true)]
    #[case("a.txt/", false)]
    #[case("missing", false)]
    #[case("", false)]
    #[case("/", false)]
    #[case("a.txt//", false)]
    fn top_level_membership(detached: Tree, #[case] path: &str, #[case] expected: bool) {
        assert_eq!(detached.contains(path).unwrap(), expected);
    }

    #[rstest]
    fn walking_below_the_top_level_needs_a_repository(detached: Tree) {
        assert!(matches!(
            detached.get_by_path("sub/x"),
            Err(TreeError::MissingRepository)
        ));
        assert!(matches!(
            detached.contains("sub/x"),
            Err(TreeError::MissingRepository)
        ));
        // through a blob is simply absent
        assert!(!detached.contains("a.txt/x").unwrap());
    }

    #[rstest]
    fn not_found_reports_the_requested_path(detached: Tree) {
        match detached.get("nope/deeper") {
            Err(TreeError::NotFound { path }) => assert_eq!(path, "nope/deeper"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[rstest]
    fn nul_in_path_is_invalid(detached: Tree) {
        assert!(matches!(
            detached.get("a.txt\0"),
            Err(TreeError::InvalidArgument(_))
        ));
    }

    #[rstest]
    fn slash_operator_matches_get(detached: Tree) {
        let by_operator = (&detached / "a.txt").unwrap();
        let by_get = detached.get("a.txt").unwrap();

        assert_eq!(by_operator, by_get);
        assert_eq!(by_operator, detached.get(0).unwrap());
    }

    #[rstest]
    fn diffing_a_detached_tree_fails(detached: Tree) {
        assert!(matches!(
            detached.diff_to_tree(None, &DiffOptions::default(), false),
            Err(TreeError::MissingRepository)
        ));
        assert!(matches!(
            detached.diff_to_workdir(&DiffOptions::default()),
            Err(TreeError::MissingRepository)
        ));
    }

    #[rstest]
    fn truncated_payload_is_a_repository_error() {
        assert!(matches!(
            Tree::from_bytes(b"100644 a\0\x01", HashAlgorithm::Sha1),
            Err(TreeError::Repository(_))
        ));
    }
}
