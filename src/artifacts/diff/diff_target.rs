use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::workspace::Workspace;
use crate::artifacts::database::tree_record::TreeRecord;
use crate::artifacts::diff::delta::DiffFile;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::hash_algorithm::HashAlgorithm;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// What a path points at on one side of a diff
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct FileEntry {
    pub oid: ObjectId,
    pub mode: EntryMode,
}

impl FileEntry {
    /// Same object under the same normalized mode
    pub fn same_as(&self, other: &FileEntry) -> bool {
        self.oid == other.oid && self.mode == other.mode
    }
}

pub type FileMap = BTreeMap<PathBuf, FileEntry>;

/// Every non-tree entry below `record`, keyed by its full path
pub fn flatten_tree(
    database: &Database,
    record: &TreeRecord,
    prefix: &Path,
) -> anyhow::Result<FileMap> {
    let mut files = FileMap::new();
    collect_tree(database, record, prefix, &mut files)?;
    Ok(files)
}

fn collect_tree(
    database: &Database,
    record: &TreeRecord,
    prefix: &Path,
    files: &mut FileMap,
) -> anyhow::Result<()> {
    for entry in record.entries() {
        let path = prefix.join(OsStr::from_bytes(&entry.name));

        if entry.is_tree() {
            let subtree = database
                .parse_object_as_tree(&entry.oid)?
                .ok_or_else(|| anyhow::anyhow!("Invalid tree object {}", entry.oid))?;
            collect_tree(database, &subtree, &path, files)?;
        } else {
            files.insert(path, FileEntry::new(entry.oid.clone(), entry.mode()));
        }
    }

    Ok(())
}

/// Staged entries keyed by path
pub fn from_index(index: &Index) -> FileMap {
    index
        .entries()
        .map(|entry| (entry.name.clone(), FileEntry::new(entry.oid.clone(), entry.mode())))
        .collect()
}

/// One loaded side of a file-level change
#[derive(Debug, Clone, new)]
pub struct DiffTarget {
    pub(crate) file: PathBuf,
    pub(crate) oid: ObjectId,
    pub(crate) mode: Option<EntryMode>,
    pub(crate) data: Bytes,
}

impl DiffTarget {
    /// Content stored in the object database; submodule commits carry no content
    pub fn from_database(
        file: &Path,
        entry: &FileEntry,
        database: &Database,
    ) -> anyhow::Result<Self> {
        let data = match entry.mode {
            EntryMode::Gitlink => Bytes::new(),
            _ => database
                .parse_object_as_blob(&entry.oid)
                .with_context(|| format!("Unable to load {}", file.display()))?
                .ok_or_else(|| anyhow::anyhow!("Object {} is not a blob", entry.oid))?
                .content()
                .to_vec()
                .into(),
        };

        Ok(Self::new(file.to_path_buf(), entry.oid.clone(), Some(entry.mode), data))
    }

    pub fn from_workspace(
        file: &Path,
        entry: &FileEntry,
        workspace: &Workspace,
    ) -> anyhow::Result<Self> {
        let data = match entry.mode {
            EntryMode::Gitlink => Bytes::new(),
            _ => workspace.read_file(file)?,
        };

        Ok(Self::new(file.to_path_buf(), entry.oid.clone(), Some(entry.mode), data))
    }

    /// The absent side of an addition or deletion
    pub fn from_nothing(file: &Path, algorithm: HashAlgorithm) -> Self {
        Self::new(file.to_path_buf(), ObjectId::null(algorithm), None, Bytes::new())
    }

    pub fn exists(&self) -> bool {
        self.mode.is_some()
    }

    pub fn is_gitlink(&self) -> bool {
        self.mode == Some(EntryMode::Gitlink)
    }

    pub fn is_binary(&self) -> bool {
        Blob::new(self.data.clone()).is_binary()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    pub fn into_diff_file(self) -> DiffFile {
        DiffFile {
            path: self.file,
            id: self.oid,
            mode: self.mode,
        }
    }
}
