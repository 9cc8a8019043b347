use crate::artifacts::index::index_entry::EntryMetadata;
use crate::artifacts::objects::blob::Blob;
use anyhow::Context;
use bytes::Bytes;
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IGNORED_PATHS: [&str; 3] = [".git", ".", ".."];

/// The working directory of a non-bare repository
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Content of a workspace file as a blob
    pub fn parse_blob(&self, path: &Path) -> anyhow::Result<Blob> {
        let data = self.read_file(path)?;
        Ok(Blob::new(data))
    }

    /// Every file and symlink below the root, relative to it, in name order
    pub fn list_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.path)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !Self::is_ignored(entry.file_name()));

        for entry in walker {
            let entry = entry.with_context(|| {
                format!("Unable to list workspace {}", self.path.display())
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            if let Ok(relative) = entry.path().strip_prefix(self.path.as_ref()) {
                files.push(relative.to_path_buf());
            }
        }

        Ok(files)
    }

    fn is_ignored(name: &OsStr) -> bool {
        IGNORED_PATHS.contains(&name.to_string_lossy().as_ref())
    }

    /// Raw file content; for a symlink, the link target
    pub fn read_file(&self, file_path: &Path) -> anyhow::Result<Bytes> {
        let full_path = self.path.join(file_path);
        let metadata = std::fs::symlink_metadata(&full_path)
            .with_context(|| format!("Unable to stat {}", file_path.display()))?;

        if metadata.file_type().is_symlink() {
            let target = std::fs::read_link(&full_path)
                .with_context(|| format!("Unable to read link {}", file_path.display()))?;
            return Ok(Bytes::copy_from_slice(target.as_os_str().as_bytes()));
        }

        let content = std::fs::read(&full_path)
            .with_context(|| format!("Unable to read {}", file_path.display()))?;

        Ok(content.into())
    }

    /// Stat without following symlinks
    pub fn stat_file(&self, file_path: &Path) -> anyhow::Result<EntryMetadata> {
        let full_path = self.path.join(file_path);
        let metadata = std::fs::symlink_metadata(&full_path)
            .with_context(|| format!("Unable to stat {}", file_path.display()))?;

        (full_path.as_path(), metadata).try_into()
    }
}
