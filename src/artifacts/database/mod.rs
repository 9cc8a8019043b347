//! Stored object records
//!
//! Storage-level shapes of tree objects as read from (or written to) the
//! object database. The user-facing tree model wraps these.

pub mod database_entry;
pub mod tree_record;
