//! File content objects, stored as `blob <size>\0<content>`

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use derive_new::new;
use std::borrow::Cow;
use std::io::BufRead;

/// Number of leading bytes inspected when sniffing for binary content
const BINARY_SNIFF_LENGTH: usize = 8000;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Blob {
    content: Bytes,
}

impl Blob {
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Content decoded as UTF-8, with invalid sequences replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Same heuristic as Git: a NUL byte near the start marks binary data
    pub fn is_binary(&self) -> bool {
        let sniffed = &self.content[..self.content.len().min(BINARY_SNIFF_LENGTH)];
        sniffed.contains(&0)
    }
}

impl Packable for Blob {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let header = format!("{} {}\0", self.object_type(), self.content.len());

        Ok(Bytes::from([header.as_bytes(), &self.content[..]].concat()))
    }
}

impl Unpackable for Blob {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        // the header has already been read
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;

        Ok(Self::new(content.into()))
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }

    fn display(&self) -> String {
        self.text().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::hash_algorithm::HashAlgorithm;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn hashes_like_git_hash_object() {
        let blob = Blob::new(Bytes::from_static(b"hello\n"));

        let oid = blob.object_id(HashAlgorithm::Sha1).unwrap();
        assert_eq!(oid.to_string(), "ce013625030ba8dba906f756967f9e9ca394464a");
    }

    #[rstest]
    #[case(b"plain text\n".as_slice(), false)]
    #[case(b"\x89PNG\r\n\x1a\n\0\0".as_slice(), true)]
    fn sniffs_binary_content(#[case] content: &'static [u8], #[case] binary: bool) {
        assert_eq!(Blob::new(Bytes::from_static(content)).is_binary(), binary);
    }
}
