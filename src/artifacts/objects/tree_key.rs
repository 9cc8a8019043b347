use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// What `get` looks an entry up by: a position or a `/`-separated path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeKey {
    /// Zero-based position; negative values count from the end
    Index(isize),
    Path(Vec<u8>),
}

impl From<isize> for TreeKey {
    fn from(index: isize) -> Self {
        TreeKey::Index(index)
    }
}

impl From<i32> for TreeKey {
    fn from(index: i32) -> Self {
        TreeKey::Index(index as isize)
    }
}

impl From<&str> for TreeKey {
    fn from(path: &str) -> Self {
        TreeKey::Path(path.as_bytes().to_vec())
    }
}

impl From<String> for TreeKey {
    fn from(path: String) -> Self {
        TreeKey::Path(path.into_bytes())
    }
}

impl From<&[u8]> for TreeKey {
    fn from(path: &[u8]) -> Self {
        TreeKey::Path(path.to_vec())
    }
}

impl From<&Path> for TreeKey {
    fn from(path: &Path) -> Self {
        TreeKey::Path(path.as_os_str().as_bytes().to_vec())
    }
}
