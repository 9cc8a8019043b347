//! Plumbing commands
//!
//! Each command is an `impl Repository` block writing its output to the
//! given writer, so the binary and the tests share one code path.

pub mod diff_tree;
pub mod ls_tree;
pub mod show_entry;
