//! Git object identifier
//!
//! Object IDs are fixed-width content hashes: 20 bytes for SHA-1 repositories
//! and 32 bytes for SHA-256 ones. They uniquely identify all objects in Git
//! (blobs, trees, commits) and order byte-lexicographically, which is the same
//! order as their lowercase hex rendering.
//!
//! ## Format
//!
//! - Full: 40 (or 64) hex characters (e.g., "abc123...def")
//! - Short: First 7 characters (e.g., "abc123d")
//!
//! ## Storage
//!
//! Objects are stored in `.git/objects/<first-2-chars>/<remaining-chars>`

use crate::artifacts::objects::SHORT_OID_LENGTH;
use crate::artifacts::objects::hash_algorithm::HashAlgorithm;
use std::io;
use std::path::PathBuf;

/// Git object identifier (raw digest bytes)
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(Box<[u8]>);

impl ObjectId {
    /// Parse and validate an object ID from its hex form
    ///
    /// # Arguments
    ///
    /// * `id` - 40 or 64 character hexadecimal string
    ///
    /// # Returns
    ///
    /// Validated ObjectId or error if invalid length/characters
    pub fn try_parse(id: impl AsRef<str>) -> anyhow::Result<Self> {
        let id = id.as_ref();
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow::anyhow!("Invalid object ID characters: {}", id));
        }

        let bytes = hex::decode(id)
            .map_err(|_| anyhow::anyhow!("Invalid object ID length: {}", id.len()))?;
        Self::from_bytes(&bytes)
    }

    /// Build an object ID from a raw digest
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        match HashAlgorithm::from_digest_size(bytes.len()) {
            Some(_) => Ok(Self(bytes.into())),
            None => Err(anyhow::anyhow!("Invalid object ID length: {}", bytes.len())),
        }
    }

    pub(crate) fn from_digest(digest: Vec<u8>) -> Self {
        Self(digest.into_boxed_slice())
    }

    /// The all-zero ID used for "no object" (e.g. `/dev/null` in patches)
    pub fn null(algorithm: HashAlgorithm) -> Self {
        Self(vec![0; algorithm.digest_size()].into_boxed_slice())
    }

    pub fn is_null(&self) -> bool {
        self.0.iter().all(|byte| *byte == 0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::from_digest_size(self.0.len()).unwrap_or_default()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Write the object ID in binary format
    ///
    /// Used when serializing tree objects and index entries.
    pub fn write_to<W: io::Write + ?Sized>(&self, writer: &mut W) -> anyhow::Result<()> {
        writer.write_all(&self.0)?;
        Ok(())
    }

    /// Read a binary object ID of the algorithm's width
    ///
    /// Used when deserializing tree objects and index entries.
    pub fn read_from<R: io::Read + ?Sized>(
        reader: &mut R,
        algorithm: HashAlgorithm,
    ) -> anyhow::Result<Self> {
        let mut buffer = vec![0; algorithm.digest_size()];
        reader.read_exact(&mut buffer)?;

        Ok(Self(buffer.into_boxed_slice()))
    }

    /// Convert to file system path for object storage
    ///
    /// Splits the hash as `XX/YYYYYY...` where XX is the first 2 chars.
    /// For example, `abc123...` becomes `ab/c123...`
    pub fn to_path(&self) -> PathBuf {
        let hex = self.to_hex();
        let (dir, file) = hex.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// Get abbreviated form of the object ID
    ///
    /// # Returns
    ///
    /// First 7 characters of the hash (standard Git abbreviation)
    pub fn to_short_oid(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(SHORT_OID_LENGTH);
        hex
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}
