//! Object hashing algorithms
//!
//! Repositories hash their objects with either SHA-1 (the classic format) or
//! SHA-256 (`extensions.objectformat = sha256`). The algorithm fixes the width
//! of every object ID stored in trees, the index and ref files.

use crate::artifacts::objects::object_id::ObjectId;
use sha1::{Digest, Sha1};
use sha2::Sha256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// Width of a raw digest in bytes
    pub fn digest_size(&self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
        }
    }

    /// Width of a digest rendered as lowercase hex
    pub fn hex_size(&self) -> usize {
        self.digest_size() * 2
    }

    pub fn as_str(&self) -> &str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
        }
    }

    /// Infer the algorithm from the width of a raw digest
    pub fn from_digest_size(size: usize) -> Option<Self> {
        match size {
            20 => Some(HashAlgorithm::Sha1),
            32 => Some(HashAlgorithm::Sha256),
            _ => None,
        }
    }

    pub fn hasher(&self) -> Hasher {
        match self {
            HashAlgorithm::Sha1 => Hasher::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
        }
    }

    /// Hash a complete object (header included) into its ID
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finish()
    }
}

impl TryFrom<&str> for HashAlgorithm {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            other => Err(anyhow::anyhow!("Unsupported object format: {}", other)),
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Incremental hasher over either supported algorithm
#[derive(Debug, Clone)]
pub enum Hasher {
    Sha1(Sha1),
    Sha256(Sha256),
}

impl Hasher {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha1(hasher) => hasher.update(data),
            Hasher::Sha256(hasher) => hasher.update(data),
        }
    }

    pub fn finalize_bytes(self) -> Vec<u8> {
        match self {
            Hasher::Sha1(hasher) => hasher.finalize().to_vec(),
            Hasher::Sha256(hasher) => hasher.finalize().to_vec(),
        }
    }

    pub fn finish(self) -> ObjectId {
        ObjectId::from_digest(self.finalize_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(HashAlgorithm::Sha1, "4b825dc642cb6eb9a060e54bf8d69288fbee4904")]
    #[case(
        HashAlgorithm::Sha256,
        "6ef19b41225c5369f1c104d45d8d85efa9b057b53b14b4b9b939dd74decc5321"
    )]
    fn empty_tree_hashes_to_well_known_id(#[case] algorithm: HashAlgorithm, #[case] expected: &str) {
        let oid = algorithm.hash(b"tree 0\0");

        assert_eq!(oid.to_string(), expected);
        assert_eq!(oid.as_bytes().len(), algorithm.digest_size());
    }

    #[rstest]
    fn parses_object_format_case_insensitively() {
        assert_eq!(HashAlgorithm::try_from("SHA256").unwrap(), HashAlgorithm::Sha256);
        assert!(HashAlgorithm::try_from("md5").is_err());
    }
}
