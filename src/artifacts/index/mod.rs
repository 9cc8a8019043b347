//! Git index file format
//!
//! The index (also called staging area or cache) stores information about the working tree.
//! It tracks which files should be included in the next commit.
//!
//! ## File Format (Version 2 and 3)
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "DIRC" (4 bytes)
//!   - Version: 2 or 3 (4 bytes)
//!   - Entry count (4 bytes)
//!
//! Entries (variable length):
//!   - Each entry padded to 8-byte alignment
//!   - Contains metadata, object ID and path
//!
//! Extensions (optional):
//!   - 4-byte signature, 4-byte size, payload
//!
//! Checksum (20 or 32 bytes):
//!   - hash of all preceding bytes, using the repository's algorithm
//! ```

use crate::artifacts::objects::hash_algorithm::HashAlgorithm;

pub mod checksum;
pub mod index_entry;
pub mod index_header;

/// Size of index header in bytes
pub const HEADER_SIZE: usize = 12;

/// Magic signature identifying index files
pub const SIGNATURE: &str = "DIRC";

/// Index file format version written by this crate
pub const VERSION: u32 = 2;

/// Versions that can be read
pub const SUPPORTED_VERSIONS: [u32; 2] = [2, 3];

/// Size of an extension header (signature + payload size)
pub const EXTENSION_HEADER_SIZE: usize = 8;

/// Block size for entry alignment (8 bytes)
pub const ENTRY_BLOCK: usize = 8;

/// Size of the fixed-width stat fields preceding the object ID
pub const ENTRY_STAT_SIZE: usize = 40;

/// Minimum size of an index entry: stat data, object ID, flags and one NUL
pub fn entry_min_size(algorithm: HashAlgorithm) -> usize {
    let unpadded = ENTRY_STAT_SIZE + algorithm.digest_size() + 2 + 1;
    unpadded.div_ceil(ENTRY_BLOCK) * ENTRY_BLOCK
}
