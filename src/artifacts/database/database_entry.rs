use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::TryReserveError;

/// One `<mode> <name>\0<oid>` record of a stored tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatabaseEntry {
    pub name: Vec<u8>,
    pub oid: ObjectId,
    /// Mode bits exactly as found on disk
    raw_mode: u32,
}

impl DatabaseEntry {
    pub fn new(name: impl Into<Vec<u8>>, mode: EntryMode, oid: ObjectId) -> Self {
        DatabaseEntry {
            name: name.into(),
            oid,
            raw_mode: mode.as_u32(),
        }
    }

    pub fn from_raw(name: Vec<u8>, raw_mode: u32, oid: ObjectId) -> Self {
        DatabaseEntry {
            name,
            oid,
            raw_mode,
        }
    }

    pub fn mode(&self) -> EntryMode {
        self.raw_mode.into()
    }

    pub fn raw_mode(&self) -> u32 {
        self.raw_mode
    }

    pub fn object_type(&self) -> ObjectType {
        self.mode().object_type()
    }

    pub fn is_tree(&self) -> bool {
        self.mode().is_tree()
    }

    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Copy that reports allocation failure instead of aborting
    pub fn try_duplicate(&self) -> Result<Self, TryReserveError> {
        let mut name = Vec::new();
        name.try_reserve_exact(self.name.len())?;
        name.extend_from_slice(&self.name);

        Ok(DatabaseEntry {
            name,
            oid: self.oid.clone(),
            raw_mode: self.raw_mode,
        })
    }

    /// Canonical Git tree order
    ///
    /// Names compare byte-wise; when one name is a prefix of the other, the
    /// next character of a directory is taken to be `/` so `foo` (a tree)
    /// sorts after `foo.txt` but before `foo0`.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        path_cmp(&self.name, self.is_tree(), &other.name, other.is_tree())
    }
}

/// Compare two path segments the way trees are sorted on disk
pub fn path_cmp(a: &[u8], a_is_dir: bool, b: &[u8], b_is_dir: bool) -> Ordering {
    let common = a.len().min(b.len());
    match a[..common].cmp(&b[..common]) {
        Ordering::Equal => {}
        unequal => return unequal,
    }

    let terminator = |name: &[u8], is_dir: bool| match name.get(common) {
        Some(byte) => *byte,
        None if is_dir => b'/',
        None => 0,
    };

    terminator(a, a_is_dir).cmp(&terminator(b, b_is_dir))
}
