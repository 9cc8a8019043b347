//! Staged file entries
//!
//! An entry is ten big-endian stat words, the object ID (as wide as the
//! repository's hash), a flags word, an optional extended flags word (v3)
//! and the NUL-terminated path, padded to a multiple of eight bytes.

use crate::artifacts::index::{ENTRY_BLOCK, ENTRY_STAT_SIZE, entry_min_size};
use crate::artifacts::objects::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::hash_algorithm::HashAlgorithm;
use crate::artifacts::objects::object::Packable;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use byteorder::{ByteOrder, NetworkEndian, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use is_executable::IsExecutable;
use std::ffi::OsStr;
use std::fs::Metadata;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::prelude::MetadataExt;
use std::path::{Path, PathBuf};

const STAT_WORDS: usize = ENTRY_STAT_SIZE / 4;

/// Low bits of the flags word hold the path length, saturated at this value
const NAME_LENGTH_MASK: u32 = 0xfff;
/// Stage bits, kept as read
const STAGE_MASK: u32 = 0x3000;
/// A second flags word follows (index v3)
const EXTENDED_FLAG: u32 = 0x4000;

#[derive(Debug, Clone, new)]
pub struct IndexEntry {
    /// `/`-separated path relative to the working directory
    pub name: PathBuf,
    pub oid: ObjectId,
    pub metadata: EntryMetadata,
}

impl IndexEntry {
    pub fn path_bytes(&self) -> &[u8] {
        self.name.as_os_str().as_bytes()
    }

    pub fn mode(&self) -> EntryMode {
        self.metadata.mode
    }

    /// Merge stage: 0 when resolved, 1 (base), 2 (ours) or 3 (theirs) during a conflict
    pub fn stage(&self) -> u8 {
        ((self.metadata.flags & STAGE_MASK) >> 12) as u8
    }

    pub fn is_unmerged(&self) -> bool {
        self.stage() > 0
    }

    /// Enclosing directories, outermost first
    pub fn parent_dirs(&self) -> Vec<&Path> {
        let mut dirs = self
            .name
            .ancestors()
            .skip(1)
            .filter(|dir| !dir.as_os_str().is_empty())
            .collect::<Vec<_>>();
        dirs.reverse();
        dirs
    }

    /// Parse one padded entry
    pub fn parse(bytes: &[u8], algorithm: HashAlgorithm) -> anyhow::Result<Self> {
        if bytes.len() < entry_min_size(algorithm) {
            anyhow::bail!("Index entry is truncated ({} bytes)", bytes.len());
        }

        let mut words = [0u32; STAT_WORDS];
        NetworkEndian::read_u32_into(&bytes[..ENTRY_STAT_SIZE], &mut words);

        let oid_end = ENTRY_STAT_SIZE + algorithm.digest_size();
        let oid = ObjectId::from_bytes(&bytes[ENTRY_STAT_SIZE..oid_end])?;
        let flags = NetworkEndian::read_u16(&bytes[oid_end..oid_end + 2]) as u32;

        let name_start = match flags & EXTENDED_FLAG {
            0 => oid_end + 2,
            _ => oid_end + 4,
        };
        let rest = bytes.get(name_start..).unwrap_or_default();
        let name_length = rest
            .iter()
            .position(|&byte| byte == 0)
            .context("Index entry path is not NUL-terminated")?;
        let name = &rest[..name_length];

        Ok(IndexEntry {
            name: PathBuf::from(OsStr::from_bytes(name)),
            oid,
            metadata: EntryMetadata::from_words(words, flags),
        })
    }
}

impl PartialEq for IndexEntry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for IndexEntry {}

impl PartialOrd for IndexEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.path_bytes().cmp(other.path_bytes())
    }
}

/// Stat data cached for a staged file
///
/// Only `mode` takes part in diffs; the rest is carried so that an index
/// can be written back without losing information.
#[derive(Debug, Clone, Default)]
pub struct EntryMetadata {
    pub ctime: i64,
    pub ctime_nsec: i64,
    pub mtime: i64,
    pub mtime_nsec: i64,
    pub dev: u64,
    pub ino: u64,
    pub mode: EntryMode,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub flags: u32,
}

impl EntryMetadata {
    /// Metadata for an entry not backed by a file on disk
    pub fn with_mode(mode: EntryMode) -> Self {
        EntryMetadata {
            mode,
            ..Default::default()
        }
    }

    fn from_words(words: [u32; STAT_WORDS], flags: u32) -> Self {
        let [ctime, ctime_nsec, mtime, mtime_nsec, dev, ino, mode, uid, gid, size] = words;

        EntryMetadata {
            ctime: ctime as i64,
            ctime_nsec: ctime_nsec as i64,
            mtime: mtime as i64,
            mtime_nsec: mtime_nsec as i64,
            dev: dev as u64,
            ino: ino as u64,
            mode: mode.into(),
            uid,
            gid,
            size: size as u64,
            flags,
        }
    }

    /// On-disk stat words; wider values are truncated to 32 bits
    fn to_words(&self) -> [u32; STAT_WORDS] {
        [
            self.ctime as u32,
            self.ctime_nsec as u32,
            self.mtime as u32,
            self.mtime_nsec as u32,
            self.dev as u32,
            self.ino as u32,
            self.mode.as_u32(),
            self.uid,
            self.gid,
            self.size as u32,
        ]
    }
}

impl Packable for IndexEntry {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let name = self.path_bytes();
        // extended flags are never written
        let flags = (self.metadata.flags & STAGE_MASK) | (name.len() as u32).min(NAME_LENGTH_MASK);

        let mut bytes = vec![0u8; ENTRY_STAT_SIZE];
        NetworkEndian::write_u32_into(&self.metadata.to_words(), &mut bytes);
        self.oid.write_to(&mut bytes)?;
        bytes.write_u16::<NetworkEndian>(flags as u16)?;
        bytes.extend_from_slice(name);

        // at least one NUL, then pad to the block size
        let padded = (bytes.len() + 1).div_ceil(ENTRY_BLOCK) * ENTRY_BLOCK;
        bytes.resize(padded, 0);

        Ok(Bytes::from(bytes))
    }
}

impl TryFrom<(&Path, Metadata)> for EntryMetadata {
    type Error = anyhow::Error;

    fn try_from((file_path, metadata): (&Path, Metadata)) -> Result<Self, Self::Error> {
        let file_type = metadata.file_type();
        let mode = if file_type.is_dir() {
            EntryMode::Directory
        } else if file_type.is_symlink() {
            EntryMode::Symlink
        } else if file_path.is_executable() {
            EntryMode::File(FileMode::Executable)
        } else {
            EntryMode::File(FileMode::Regular)
        };

        Ok(EntryMetadata {
            ctime: metadata.ctime(),
            ctime_nsec: metadata.ctime_nsec(),
            mtime: metadata.mtime(),
            mtime_nsec: metadata.mtime_nsec(),
            dev: metadata.dev(),
            ino: metadata.ino(),
            mode,
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size(),
            flags: 0,
        })
    }
}
