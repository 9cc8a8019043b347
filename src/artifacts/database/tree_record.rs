//! Stored tree objects
//!
//! A tree object is a flat, sorted list of entries. This is its storage-level
//! form: the entries in the order they were read, plus the serialization
//! needed to write a tree back into the object database.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<raw-oid>`

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::hash_algorithm::HashAlgorithm;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeRecord {
    entries: Vec<DatabaseEntry>,
}

impl TreeRecord {
    /// Build a record from arbitrary entries, sorting them into tree order
    pub fn new(mut entries: Vec<DatabaseEntry>) -> Self {
        entries.sort_by(|a, b| a.sort_cmp(b));
        TreeRecord { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a tree payload (header already consumed)
    ///
    /// Entries keep their on-disk order.
    pub fn parse(reader: impl BufRead, algorithm: HashAlgorithm) -> anyhow::Result<Self> {
        let mut entries = Vec::new();
        let mut reader = reader;

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            // Read "mode " (space-delimited)
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(anyhow::anyhow!("unexpected EOF in mode"));
            }

            let mode_str = std::str::from_utf8(&mode_bytes)?;
            let raw_mode = u32::from_str_radix(mode_str, 8)
                .with_context(|| format!("Invalid entry mode {}", mode_str))?;

            // Read "name\0"
            name_bytes.clear();
            reader.read_until(b'\0', &mut name_bytes)?;
            if name_bytes.pop() != Some(b'\0') {
                return Err(anyhow::anyhow!("unexpected EOF in name"));
            }

            let oid = ObjectId::read_from(&mut reader, algorithm)
                .context("unexpected EOF in object id")?;

            entries.push(DatabaseEntry::from_raw(name_bytes.clone(), raw_mode, oid));
        }

        Ok(TreeRecord { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DatabaseEntry] {
        &self.entries
    }

    pub fn entry_by_index(&self, index: usize) -> Option<&DatabaseEntry> {
        self.entries.get(index)
    }

    /// Look up a direct child by its exact name
    pub fn entry_by_name(&self, name: &[u8]) -> Option<&DatabaseEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    fn payload(&self) -> anyhow::Result<Vec<u8>> {
        let mut content = Vec::new();
        for entry in &self.entries {
            write!(content, "{:o} ", entry.raw_mode())?;
            content.write_all(&entry.name)?;
            content.push(0);
            entry.oid.write_to(&mut content)?;
        }

        Ok(content)
    }
}

impl Packable for TreeRecord {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let content = self.payload()?;

        let mut tree_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content.len());
        tree_bytes.write_all(header.as_bytes())?;
        tree_bytes.write_all(&content)?;

        Ok(Bytes::from(tree_bytes))
    }
}

impl Object for TreeRecord {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.entries
            .iter()
            .map(|entry| {
                format!(
                    "{} {} {}\t{}",
                    entry.mode(),
                    entry.object_type(),
                    entry.oid,
                    entry.name_lossy()
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::entry_mode::{EntryMode, FileMode};
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn record() -> TreeRecord {
        let blob = ObjectId::try_parse("e69de29bb2d1d6434b8b29ae775ad8c2e48c5391").unwrap();
        let tree = ObjectId::try_parse("4b825dc642cb6eb9a060e54bf8d69288fbee4904").unwrap();

        TreeRecord::new(vec![
            DatabaseEntry::new("sub", EntryMode::Directory, tree),
            DatabaseEntry::new("a.txt", EntryMode::File(FileMode::Regular), blob),
        ])
    }

    #[rstest]
    fn new_sorts_entries(record: TreeRecord) {
        let names = record
            .entries()
            .iter()
            .map(|entry| entry.name_lossy().into_owned())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["a.txt", "sub"]);
    }

    #[rstest]
    fn hashes_like_git_mktree(record: TreeRecord) {
        // printf '100644 blob e69de...\ta.txt\n040000 tree 4b825...\tsub\n' | git mktree
        assert_eq!(
            record.object_id(HashAlgorithm::Sha1).unwrap().to_string(),
            "d0dd996edb77e29b73e5acb9cdd5a56410402f2e"
        );
    }

    #[rstest]
    fn parse_reads_back_serialized_entries(record: TreeRecord) {
        let bytes = record.serialize().unwrap();
        let mut reader = std::io::Cursor::new(bytes);
        ObjectType::parse_object_type(&mut reader).unwrap();

        let parsed = TreeRecord::parse(reader, HashAlgorithm::Sha1).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(parsed.entry_by_name(b"sub").map(|e| e.is_tree()), Some(true));
        assert!(parsed.entry_by_name(b"missing").is_none());
    }

    #[rstest]
    fn truncated_payload_is_rejected() {
        let payload = b"100644 a.txt\0\x01\x02";

        assert!(TreeRecord::parse(payload.as_slice(), HashAlgorithm::Sha1).is_err());
    }
}
