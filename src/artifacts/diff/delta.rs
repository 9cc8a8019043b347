//! Diff result building blocks
//!
//! A [`DiffDelta`] describes one changed path: both sides of the change
//! (either of which may be absent) and, for text content, its hunks.

use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeltaStatus {
    Added,
    Deleted,
    Modified,
    /// Present in the working directory only, never tracked
    Untracked,
    /// Unmerged in the index
    Conflicted,
}

impl DeltaStatus {
    pub fn status_char(&self) -> char {
        match self {
            DeltaStatus::Added => 'A',
            DeltaStatus::Deleted => 'D',
            DeltaStatus::Modified => 'M',
            DeltaStatus::Untracked => '?',
            DeltaStatus::Conflicted => 'U',
        }
    }

    fn reversed(self) -> Self {
        match self {
            DeltaStatus::Added => DeltaStatus::Deleted,
            DeltaStatus::Deleted => DeltaStatus::Added,
            other => other,
        }
    }
}

/// One side of a change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffFile {
    pub path: PathBuf,
    /// Null when the side is absent (or not hashed)
    pub id: ObjectId,
    /// `None` when the side is absent
    pub mode: Option<EntryMode>,
}

impl DiffFile {
    pub fn exists(&self) -> bool {
        self.mode.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOrigin {
    Context,
    Addition,
    Deletion,
}

impl LineOrigin {
    pub fn as_char(&self) -> char {
        match self {
            LineOrigin::Context => ' ',
            LineOrigin::Addition => '+',
            LineOrigin::Deletion => '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub origin: LineOrigin,
    /// Line text including its newline, if it had one
    pub content: String,
    pub old_lineno: Option<usize>,
    pub new_lineno: Option<usize>,
}

impl DiffLine {
    pub fn has_newline(&self) -> bool {
        self.content.ends_with('\n')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffHunk {
    pub old_start: usize,
    pub old_lines: usize,
    pub new_start: usize,
    pub new_lines: usize,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// `@@ -<old> +<new> @@`, omitting counts of one like Git does
    pub fn header(&self) -> String {
        fn range(start: usize, lines: usize) -> String {
            match lines {
                1 => format!("{}", start),
                _ => format!("{},{}", start, lines),
            }
        }

        format!(
            "@@ -{} +{} @@",
            range(self.old_start, self.old_lines),
            range(self.new_start, self.new_lines)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffDelta {
    pub status: DeltaStatus,
    pub old_file: DiffFile,
    pub new_file: DiffFile,
    /// Content was treated as binary, so there are no hunks
    pub binary: bool,
    pub hunks: Vec<DiffHunk>,
}

impl DiffDelta {
    /// Path of the side that exists (the new one when both do)
    pub fn path(&self) -> &Path {
        match self.new_file.exists() {
            true => &self.new_file.path,
            false => &self.old_file.path,
        }
    }

    pub(crate) fn path_bytes(&self) -> &[u8] {
        self.path().as_os_str().as_bytes()
    }

    pub fn is_mode_change(&self) -> bool {
        self.old_file.exists() && self.new_file.exists() && self.old_file.mode != self.new_file.mode
    }

    pub fn is_content_change(&self) -> bool {
        self.old_file.id != self.new_file.id
    }

    /// The same change seen from the other side
    pub(crate) fn reversed(self) -> Self {
        DiffDelta {
            status: self.status.reversed(),
            old_file: self.new_file,
            new_file: self.old_file,
            ..self
        }
    }
}
