//! Git object types and operations
//!
//! Git stores all content as objects identified by a content hash (SHA-1, or
//! SHA-256 in newer repositories). There are three kinds handled here:
//!
//! - **Blob**: File content (raw bytes)
//! - **Tree**: Directory listing (names, modes, and object IDs)
//! - **Commit**: Snapshot with metadata (author, message, parent commits, tree)
//!
//! The tree model (`tree`, `tree_entry`, `tree_iter`) is read-only: trees are
//! obtained from a repository (or parsed from raw bytes) and never mutated.

pub mod blob;
pub mod commit;
pub mod entry_mode;
pub mod hash_algorithm;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;
pub mod tree_entry;
pub mod tree_error;
pub mod tree_iter;
pub mod tree_key;

/// Length of an abbreviated object ID
pub const SHORT_OID_LENGTH: usize = 7;
