//! Git data structures and algorithms
//!
//! This module contains the core Git types and algorithms:
//!
//! - `database`: Database entry types and raw tree records
//! - `diff`: Tree diffing (tree, index and working directory) and patches
//! - `index`: Index/staging area data structures
//! - `objects`: Git object types (blob, tree, commit) and the tree model

pub mod database;
pub mod diff;
pub mod index;
pub mod objects;
