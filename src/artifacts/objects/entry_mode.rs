//! Tree entry file modes
//!
//! Git stores a mode next to every tree entry. Only a handful of modes are
//! meaningful; anything else found on disk is normalized the way Git itself
//! reads it: any executable bit makes a regular file executable and unknown
//! types fall back to a regular file.

use crate::artifacts::objects::object_type::ObjectType;

const MODE_TYPE_MASK: u32 = 0o170000;
const MODE_TYPE_TREE: u32 = 0o040000;
const MODE_TYPE_LINK: u32 = 0o120000;
const MODE_TYPE_COMMIT: u32 = 0o160000;
const MODE_EXEC_BITS: u32 = 0o111;

#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd, Hash)]
pub enum FileMode {
    #[default]
    Regular,
    Executable,
}

#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd, Hash)]
pub enum EntryMode {
    File(FileMode),
    Symlink,
    #[default]
    Directory,
    Gitlink,
}

impl EntryMode {
    /// Mode as written inside tree objects (no leading zero for trees)
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryMode::File(FileMode::Regular) => "100644",
            EntryMode::File(FileMode::Executable) => "100755",
            EntryMode::Symlink => "120000",
            EntryMode::Directory => "40000",
            EntryMode::Gitlink => "160000",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::File(FileMode::Regular) => 0o100644,
            EntryMode::File(FileMode::Executable) => 0o100755,
            EntryMode::Symlink => 0o120000,
            EntryMode::Directory => 0o040000,
            EntryMode::Gitlink => 0o160000,
        }
    }

    /// Kind of object an entry with this mode points at
    pub fn object_type(&self) -> ObjectType {
        match self {
            EntryMode::Directory => ObjectType::Tree,
            EntryMode::Gitlink => ObjectType::Commit,
            EntryMode::File(_) | EntryMode::Symlink => ObjectType::Blob,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }

    pub fn from_octal_str(mode: &str) -> anyhow::Result<Self> {
        let bits = u32::from_str_radix(mode, 8)
            .map_err(|_| anyhow::anyhow!("Invalid entry mode: {}", mode))?;

        Ok(bits.into())
    }
}

impl From<u32> for EntryMode {
    fn from(mode: u32) -> Self {
        if mode & MODE_TYPE_MASK == MODE_TYPE_TREE {
            return EntryMode::Directory;
        }
        if mode & MODE_EXEC_BITS != 0 {
            return EntryMode::File(FileMode::Executable);
        }

        match mode & MODE_TYPE_MASK {
            MODE_TYPE_COMMIT => EntryMode::Gitlink,
            MODE_TYPE_LINK => EntryMode::Symlink,
            _ => EntryMode::File(FileMode::Regular),
        }
    }
}

impl From<EntryMode> for u32 {
    fn from(mode: EntryMode) -> Self {
        mode.as_u32()
    }
}

impl From<FileMode> for EntryMode {
    fn from(mode: FileMode) -> Self {
        EntryMode::File(mode)
    }
}

impl TryFrom<&str> for EntryMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        EntryMode::from_octal_str(value)
    }
}

/// Six-digit octal form used by `ls-tree` and patch headers
impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.as_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0o100644, EntryMode::File(FileMode::Regular))]
    #[case(0o100664, EntryMode::File(FileMode::Regular))]
    #[case(0o100755, EntryMode::File(FileMode::Executable))]
    #[case(0o100744, EntryMode::File(FileMode::Executable))]
    #[case(0o120000, EntryMode::Symlink)]
    #[case(0o040000, EntryMode::Directory)]
    #[case(0o040755, EntryMode::Directory)]
    #[case(0o160000, EntryMode::Gitlink)]
    fn normalizes_raw_modes(#[case] raw: u32, #[case] expected: EntryMode) {
        assert_eq!(EntryMode::from(raw), expected);
    }

    #[rstest]
    fn derives_object_kind_from_mode() {
        assert_eq!(EntryMode::Directory.object_type(), ObjectType::Tree);
        assert_eq!(EntryMode::Gitlink.object_type(), ObjectType::Commit);
        assert_eq!(EntryMode::Symlink.object_type(), ObjectType::Blob);
    }

    #[rstest]
    fn renders_storage_and_display_forms() {
        assert_eq!(EntryMode::Directory.as_str(), "40000");
        assert_eq!(EntryMode::Directory.to_string(), "040000");
        assert_eq!(EntryMode::from_octal_str("100755").unwrap().to_string(), "100755");
    }
}
