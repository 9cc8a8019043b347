//! Errors raised by the tree model

use crate::artifacts::objects::object_type::ObjectType;

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// A path (or one of its segments) does not name an entry
    #[error("the path '{path}' does not exist in the given tree")]
    NotFound { path: String },

    #[error("tree entry index out of range: {0}")]
    IndexOutOfRange(isize),

    /// An entry resolved to a different kind of object than requested
    #[error("the requested type does not match the type in the ODB: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: ObjectType,
        actual: ObjectType,
    },

    #[error("tree is not associated with a repository")]
    MissingRepository,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("out of memory while copying a tree entry")]
    OutOfMemory,

    /// Object database, index, workspace or diff failures
    #[error(transparent)]
    Repository(#[from] anyhow::Error),
}

impl TreeError {
    pub(crate) fn not_found(path: &[u8]) -> Self {
        TreeError::NotFound {
            path: String::from_utf8_lossy(path).into_owned(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TreeError::NotFound { .. })
    }
}

impl From<std::collections::TryReserveError> for TreeError {
    fn from(_: std::collections::TryReserveError) -> Self {
        TreeError::OutOfMemory
    }
}

pub type TreeResult<T> = Result<T, TreeError>;
