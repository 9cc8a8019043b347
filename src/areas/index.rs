//! Git index (staging area)
//!
//! The index tracks which files should be included in the next commit.
//! It maintains metadata about files including their mode, timestamps, and object IDs.
//!
//! ## Index File Format
//!
//! The index file contains:
//! - Header: Signature, version, and entry count
//! - Entries: Sorted list of tracked files with metadata
//! - Extensions: cached trees, resolve-undo data, etc. (skipped when reading)
//! - Checksum: hash of the entire index for integrity verification
//!
//! ## Data Structures
//!
//! - `entries`: Maps file paths to their resolved (stage 0) index entries
//! - `unmerged`: Conflict stages (1 to 3) of paths with an unresolved merge
//! - `children`: Maps directory paths to their children for conflict removal

use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::{ENTRY_BLOCK, EXTENSION_HEADER_SIZE, HEADER_SIZE, entry_min_size};
use crate::artifacts::objects::hash_algorithm::HashAlgorithm;
use crate::artifacts::objects::object::{Packable, Unpackable};
use anyhow::Context;
use byteorder::ByteOrder;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

/// Git index (staging area)
#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (typically `.git/index`)
    path: Box<Path>,
    algorithm: HashAlgorithm,
    entries: BTreeMap<Box<Path>, IndexEntry>,
    /// Conflict stages per path, ordered by stage
    unmerged: BTreeMap<Box<Path>, Vec<IndexEntry>>,
    /// Directory hierarchy for parent-child lookups
    children: BTreeMap<Box<Path>, BTreeSet<Box<Path>>>,
    header: IndexHeader,
    /// Whether the index has been modified since loading
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>, algorithm: HashAlgorithm) -> Self {
        Index {
            path,
            algorithm,
            entries: BTreeMap::new(),
            unmerged: BTreeMap::new(),
            children: BTreeMap::new(),
            header: IndexHeader::empty(),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// Paths with an unresolved merge, each with its stages in order
    pub fn unmerged(&self) -> impl Iterator<Item = (&Path, &[IndexEntry])> {
        self.unmerged
            .iter()
            .map(|(path, stages)| (path.as_ref(), stages.as_slice()))
    }

    pub fn has_conflicts(&self) -> bool {
        !self.unmerged.is_empty()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.unmerged.clear();
        self.children.clear();
        self.header = IndexHeader::empty();
        self.changed = false;
    }

    /// Load the index from disk
    ///
    /// A missing or empty index file is an empty index. Extensions are
    /// hashed but otherwise ignored.
    ///
    /// # Locking
    ///
    /// Acquires a shared lock on the index file during reading.
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        self.clear();

        if !self.path.exists() {
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new()
            .read(true)
            .open(&self.path)
            .with_context(|| format!("Unable to open index file {}", self.path.display()))?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;

        let file_size = lock.deref_mut().metadata()?.len();
        if file_size == 0 {
            return Ok(());
        }

        let mut reader = Checksum::new(lock, self.algorithm);
        let entries_count = self.parse_header(&mut reader)?;
        self.parse_entries(entries_count, &mut reader)?;
        self.skip_extensions(file_size, &mut reader)?;

        tracing::debug!(
            path = %self.path.display(),
            entries = entries_count,
            "loaded index"
        );

        reader.verify()
    }

    fn parse_header(&mut self, reader: &mut Checksum) -> anyhow::Result<u32> {
        let header_bytes = reader.read(HEADER_SIZE)?;
        self.header = IndexHeader::deserialize(&header_bytes[..])?;

        Ok(self.header.entries_count)
    }

    /// Parse all entries from the index file
    ///
    /// Reads each entry, handling variable-length paths with 8-byte alignment.
    fn parse_entries(&mut self, entries_count: u32, reader: &mut Checksum) -> anyhow::Result<()> {
        let min_size = entry_min_size(self.algorithm);

        for _ in 0..entries_count {
            let mut entry_bytes = reader.read(min_size)?.to_vec();

            while entry_bytes.last() != Some(&0) {
                entry_bytes.extend_from_slice(&reader.read(ENTRY_BLOCK)?);
            }

            let entry = IndexEntry::parse(&entry_bytes, self.algorithm)?;
            self.store_entry(entry);
        }

        Ok(())
    }

    fn skip_extensions(&self, file_size: u64, reader: &mut Checksum) -> anyhow::Result<()> {
        let trailer = self.algorithm.digest_size() as u64;

        while file_size.saturating_sub(reader.consumed()) > trailer {
            let header = reader.read(EXTENSION_HEADER_SIZE)?;
            let size = byteorder::NetworkEndian::read_u32(&header[4..8]) as usize;
            tracing::trace!(
                extension = %String::from_utf8_lossy(&header[..4]),
                size,
                "skipping index extension"
            );
            reader.read(size)?;
        }

        Ok(())
    }

    /// Remove entries that would clash with `entry`
    ///
    /// Parent directories stored as files, and children of a directory
    /// that is becoming a file.
    fn discard_conflicts(&mut self, entry: &IndexEntry) {
        for parent in entry.parent_dirs() {
            self.remove_entry(parent);
        }
        self.remove_children(&entry.name);
    }

    fn store_entry(&mut self, entry: IndexEntry) {
        if entry.is_unmerged() {
            self.store_stage(entry);
            return;
        }
        self.unmerged.remove(entry.name.as_path());

        for parent in entry.parent_dirs() {
            self.children
                .entry(parent.to_owned().into_boxed_path())
                .or_default()
                .insert(entry.name.clone().into_boxed_path());
        }

        self.entries
            .insert(entry.name.clone().into_boxed_path(), entry);
    }

    /// A conflict stage replaces the resolved entry and any earlier copy of the same stage
    fn store_stage(&mut self, entry: IndexEntry) {
        self.remove_entry(&entry.name);

        let stages = self
            .unmerged
            .entry(entry.name.clone().into_boxed_path())
            .or_default();
        stages.retain(|staged| staged.stage() != entry.stage());
        let at = stages.partition_point(|staged| staged.stage() < entry.stage());
        stages.insert(at, entry);
    }

    fn entries_count(&self) -> u32 {
        (self.entries.len() + self.unmerged.values().map(Vec::len).sum::<usize>()) as u32
    }

    fn remove_children(&mut self, path_name: &Path) {
        if let Some(children) = self.children.remove(path_name) {
            for child in children {
                self.remove_entry(&child);
            }
        }
    }

    fn remove_entry(&mut self, path_name: &Path) {
        if let Some(entry) = self.entries.remove(path_name) {
            for parent in entry.parent_dirs() {
                if let Some(children) = self.children.get_mut(parent) {
                    children.remove(path_name);
                    if children.is_empty() {
                        self.children.remove(parent);
                    }
                }
            }
        }
    }

    /// Stage `entry`; a stage 0 entry resolves any conflict on its path
    pub fn add(&mut self, entry: IndexEntry) {
        if !entry.is_unmerged() {
            self.discard_conflicts(&entry);
        }
        self.store_entry(entry);

        self.header.entries_count = self.entries_count();
        self.changed = true;
    }

    pub fn remove(&mut self, path: PathBuf) {
        self.remove_entry(&path);
        self.remove_children(&path);
        self.unmerged.remove(path.as_path());

        self.header.entries_count = self.entries_count();
        self.changed = true;
    }

    /// Persist the index (version 2, no extensions)
    ///
    /// # Locking
    ///
    /// Acquires an exclusive lock on the index file during writing.
    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        let mut index_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .with_context(|| format!("Unable to open index file {}", self.path.display()))?;
        let lock = file_guard::lock(&mut index_file, file_guard::Lock::Exclusive, 0, 1)?;

        let mut writer = Checksum::new(lock, self.algorithm);

        self.header = IndexHeader {
            entries_count: self.entries_count(),
            ..IndexHeader::empty()
        };
        writer.write(&self.header.serialize()?)?;

        let mut entries = self
            .entries
            .values()
            .chain(self.unmerged.values().flatten())
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| (a.path_bytes(), a.stage()).cmp(&(b.path_bytes(), b.stage())));
        for entry in entries {
            writer.write(&entry.serialize()?)?;
        }

        writer.write_checksum()?;
        self.changed = false;

        Ok(())
    }

    /// Resolved entries in path order
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::index_entry::EntryMetadata;
    use crate::artifacts::objects::entry_mode::{EntryMode, FileMode};
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    fn stage(path: &str, stage: u32, content: &str) -> IndexEntry {
        IndexEntry::new(
            PathBuf::from(path),
            HashAlgorithm::Sha1.hash(content.as_bytes()),
            EntryMetadata {
                flags: stage << 12,
                ..EntryMetadata::with_mode(EntryMode::File(FileMode::Regular))
            },
        )
    }

    fn entry(path: &str) -> IndexEntry {
        IndexEntry::new(
            PathBuf::from(path),
            HashAlgorithm::Sha1.hash(path.as_bytes()),
            EntryMetadata::with_mode(EntryMode::File(FileMode::Regular)),
        )
    }

    #[rstest]
    fn missing_index_is_empty(temp_dir: TempDir) {
        let mut index = Index::new(temp_dir.path().join("index").into(), HashAlgorithm::Sha1);

        index.rehydrate().unwrap();
        assert!(index.is_empty());
    }

    #[rstest]
    fn adding_a_file_replaces_its_parent_directory(temp_dir: TempDir) {
        let mut index = Index::new(temp_dir.path().join("index").into(), HashAlgorithm::Sha1);
        index.add(entry("a/b.txt"));
        index.add(entry("a/c.txt"));
        index.add(entry("a"));

        let paths = index.entries().map(|e| e.name.clone()).collect::<Vec<_>>();
        assert_eq!(paths, vec![PathBuf::from("a")]);
    }

    #[rstest]
    fn written_index_reloads_with_checksum(temp_dir: TempDir) {
        let path: Box<Path> = temp_dir.path().join("index").into();
        let mut index = Index::new(path.clone(), HashAlgorithm::Sha1);
        index.add(entry("b.txt"));
        index.add(entry("a/nested.txt"));
        index.write_updates().unwrap();

        let mut reloaded = Index::new(path, HashAlgorithm::Sha1);
        reloaded.rehydrate().unwrap();

        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.entry_by_path(Path::new("a/nested.txt")).is_some());
        assert!(!reloaded.is_changed());
    }

    #[rstest]
    fn extensions_are_skipped(temp_dir: TempDir) {
        let path = temp_dir.path().join("index");
        let mut index = Index::new(path.clone().into(), HashAlgorithm::Sha1);
        index.add(entry("file.txt"));
        index.write_updates().unwrap();

        // splice a TREE extension in front of a recomputed checksum
        let mut bytes = std::fs::read(&path).unwrap();
        bytes.truncate(bytes.len() - 20);
        bytes.extend_from_slice(b"TREE\0\0\0\x03abc");
        let digest = HashAlgorithm::Sha1.hash(&bytes);
        bytes.extend_from_slice(digest.as_bytes());
        std::fs::write(&path, bytes).unwrap();

        let mut reloaded = Index::new(path.into(), HashAlgorithm::Sha1);
        reloaded.rehydrate().unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    #[rstest]
    fn corrupted_checksum_is_rejected(temp_dir: TempDir) {
        let path = temp_dir.path().join("index");
        let mut index = Index::new(path.clone().into(), HashAlgorithm::Sha1);
        index.add(entry("file.txt"));
        index.write_updates().unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        std::fs::write(&path, bytes).unwrap();

        let mut reloaded = Index::new(path.into(), HashAlgorithm::Sha1);
        assert!(reloaded.rehydrate().is_err());
    }

    #[rstest]
    fn conflict_stages_are_kept_apart(temp_dir: TempDir) {
        let path: Box<Path> = temp_dir.path().join("index").into();
        let mut index = Index::new(path.clone(), HashAlgorithm::Sha1);
        index.add(entry("clean.txt"));
        index.add(entry("a.txt"));
        index.add(stage("a.txt", 3, "theirs"));
        index.add(stage("a.txt", 1, "base"));
        index.add(stage("a.txt", 2, "ours"));
        index.write_updates().unwrap();

        let mut reloaded = Index::new(path, HashAlgorithm::Sha1);
        reloaded.rehydrate().unwrap();

        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.entry_by_path(Path::new("a.txt")).is_none());
        let unmerged = reloaded.unmerged().collect::<Vec<_>>();
        assert_eq!(unmerged.len(), 1);
        let (conflicted, stages) = unmerged[0];
        assert_eq!(conflicted, Path::new("a.txt"));
        assert_eq!(stages.iter().map(IndexEntry::stage).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(stages[1].oid, HashAlgorithm::Sha1.hash(b"ours"));
    }

    #[rstest]
    fn staging_a_resolved_entry_clears_the_conflict(temp_dir: TempDir) {
        let mut index = Index::new(temp_dir.path().join("index").into(), HashAlgorithm::Sha1);
        index.add(stage("a.txt", 2, "ours"));
        index.add(stage("a.txt", 3, "theirs"));
        assert!(index.has_conflicts());

        index.add(entry("a.txt"));

        assert!(!index.has_conflicts());
        assert!(index.entry_by_path(Path::new("a.txt")).is_some());
    }
}
