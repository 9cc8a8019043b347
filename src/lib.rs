//! Read-only access to Git tree objects
//!
//! Trees are looked up in a [`Repository`] (or parsed from raw bytes) and
//! expose their entries by position, by `/`-separated path and through
//! iteration. A tree can be diffed against another tree, the index or the
//! working directory.
//!
//! ```no_run
//! use gtree::{DiffOptions, Repository};
//!
//! # fn main() -> anyhow::Result<()> {
//! let repository = Repository::discover(std::path::Path::new("."))?;
//! let tree = repository.revparse_tree("HEAD")?;
//!
//! for entry in &tree {
//!     println!("{}", entry?);
//! }
//!
//! let readme = tree.get("docs/README.md")?;
//! let diff = tree.diff_to_workdir(&DiffOptions::default())?;
//! print!("{}", diff.patch());
//! # let _ = readme;
//! # Ok(())
//! # }
//! ```

pub mod areas;
pub mod artifacts;
pub mod commands;

pub use areas::index::Index;
pub use areas::repository::Repository;
pub use artifacts::diff::delta::{DeltaStatus, DiffDelta, DiffFile, DiffHunk, DiffLine, LineOrigin};
pub use artifacts::diff::diff_options::{DiffFlags, DiffOptions};
pub use artifacts::diff::diff_result::Diff;
pub use artifacts::objects::entry_mode::{EntryMode, FileMode};
pub use artifacts::objects::hash_algorithm::HashAlgorithm;
pub use artifacts::objects::object::GitObject;
pub use artifacts::objects::object_id::ObjectId;
pub use artifacts::objects::object_type::ObjectType;
pub use artifacts::objects::tree::Tree;
pub use artifacts::objects::tree_entry::TreeEntry;
pub use artifacts::objects::tree_error::{TreeError, TreeResult};
pub use artifacts::objects::tree_iter::TreeIter;
pub use artifacts::objects::tree_key::TreeKey;
