use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, SUPPORTED_VERSIONS, VERSION};
use crate::artifacts::objects::object::{Packable, Unpackable};
use byteorder::{ByteOrder, NetworkEndian};
use bytes::Bytes;
use derive_new::new;
use std::io::BufRead;

/// `DIRC`, format version and entry count
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexHeader {
    pub(crate) version: u32,
    pub(crate) entries_count: u32,
}

impl IndexHeader {
    pub(crate) fn empty() -> Self {
        IndexHeader::new(VERSION, 0)
    }
}

impl Packable for IndexHeader {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[..4].copy_from_slice(SIGNATURE.as_bytes());
        NetworkEndian::write_u32_into(&[self.version, self.entries_count], &mut bytes[4..]);

        Ok(Bytes::copy_from_slice(&bytes))
    }
}

impl Unpackable for IndexHeader {
    /// Reject anything but a `DIRC` header of a readable version
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut bytes = [0u8; HEADER_SIZE];
        reader
            .read_exact(&mut bytes)
            .map_err(|_| anyhow::anyhow!("Index header is truncated"))?;

        if &bytes[..4] != SIGNATURE.as_bytes() {
            anyhow::bail!("Invalid index file signature");
        }

        let version = NetworkEndian::read_u32(&bytes[4..8]);
        if !SUPPORTED_VERSIONS.contains(&version) {
            anyhow::bail!("Unsupported index file version: {}", version);
        }

        Ok(IndexHeader::new(version, NetworkEndian::read_u32(&bytes[8..12])))
    }
}
