//! Core repository components
//!
//! This module contains the fundamental building blocks of a Git repository:
//!
//! - `database`: Object database for storing blobs, trees, and commits
//! - `index`: Staging area (index/cache) read by index diffs
//! - `refs`: Reference resolution (HEAD, branches, tags)
//! - `repository`: Repository discovery, object lookup and revision parsing
//! - `workspace`: Working directory file system operations

pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
