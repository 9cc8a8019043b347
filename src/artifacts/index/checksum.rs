use crate::artifacts::objects::hash_algorithm::{HashAlgorithm, Hasher};
use anyhow::anyhow;
use bytes::Bytes;
use file_guard::FileGuard;
use std::io::{Read, Write};
use std::ops::DerefMut;

/// Reader/writer over a locked index file that hashes everything passing through
#[derive(Debug)]
pub struct Checksum<'f> {
    file: FileGuard<&'f mut std::fs::File>,
    digest: Hasher,
    algorithm: HashAlgorithm,
    /// Bytes read or written so far
    consumed: u64,
}

impl<'f> Checksum<'f> {
    pub(crate) fn new(file: FileGuard<&'f mut std::fs::File>, algorithm: HashAlgorithm) -> Self {
        Checksum {
            file,
            digest: algorithm.hasher(),
            algorithm,
            consumed: 0,
        }
    }

    pub(crate) fn consumed(&self) -> u64 {
        self.consumed
    }

    pub(crate) fn read(&mut self, size: usize) -> anyhow::Result<Bytes> {
        let mut buffer = vec![0; size];
        self.file
            .deref_mut()
            .read_exact(&mut buffer)
            .map_err(|_| anyhow!("Unexpected end-of-file while reading index"))?;

        self.digest.update(&buffer);
        self.consumed += size as u64;
        Ok(Bytes::from(buffer))
    }

    pub(crate) fn write(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.file.deref_mut().write_all(data)?;
        self.digest.update(data);
        self.consumed += data.len() as u64;
        Ok(())
    }

    pub(crate) fn write_checksum(self) -> anyhow::Result<()> {
        let Checksum {
            mut file, digest, ..
        } = self;
        let checksum = digest.finalize_bytes();
        file.deref_mut()
            .write_all(&checksum)
            .map_err(|_| anyhow!("Failed to write checksum to index file"))?;

        Ok(())
    }

    pub(crate) fn verify(self) -> anyhow::Result<()> {
        let Checksum {
            mut file,
            digest,
            algorithm,
            ..
        } = self;

        let mut expected_checksum = vec![0u8; algorithm.digest_size()];
        file.deref_mut()
            .read_exact(&mut expected_checksum)
            .map_err(|_| anyhow!("Unexpected end-of-file while reading index checksum"))?;

        if expected_checksum != digest.finalize_bytes() {
            return Err(anyhow!("Checksum does not match value stored on disk"));
        }

        Ok(())
    }
}
