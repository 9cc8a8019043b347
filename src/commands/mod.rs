//! Command implementations
//!
//! Every command here is read-only plumbing over the tree model:
//!
//! - `ls-tree`: List the entries of a tree, optionally recursing
//! - `show-entry`: Describe a single entry looked up by path
//! - `diff-tree`, `diff-index`, `diff-files`: Compare a tree against another
//!   tree, the index or the working directory

pub mod plumbing;
