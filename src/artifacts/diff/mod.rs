//! Diff engine
//!
//! This module compares a tree against another tree, the index or the
//! working directory:
//!
//! - `diff_options`: Flags, context and interhunk settings
//! - `diff_algorithm`: Myers' diff for line-by-line comparison and hunk grouping
//! - `tree_diff`: Tree-level diffing for detecting file changes
//! - `diff_target`: Loaded sides of a change (database, index, workspace)
//! - `delta`: Per-path changes with their hunks
//! - `engine`: Drives the comparison and builds the deltas
//! - `diff_result`: The finished diff, rendered as name-status or patch text

pub mod delta;
pub mod diff_algorithm;
pub mod diff_options;
pub mod diff_result;
pub mod diff_target;
pub mod engine;
pub mod tree_diff;
