//! Loose object database
//!
//! Objects live under `.git/objects/<xx>/<rest-of-hex>`, zlib-compressed,
//! each one `<type> <size>\0<payload>`.

use crate::artifacts::database::tree_record::TreeRecord;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::hash_algorithm::HashAlgorithm;
use crate::artifacts::objects::object::{Object, ObjectBox, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

type ObjectReader = Cursor<Bytes>;

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
    algorithm: HashAlgorithm,
}

impl Database {
    pub fn new(path: Box<Path>, algorithm: HashAlgorithm) -> Self {
        Database { path, algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    fn object_path(&self, object_id: &ObjectId) -> PathBuf {
        self.path.join(object_id.to_path())
    }

    pub fn exists(&self, object_id: &ObjectId) -> bool {
        self.object_path(object_id).is_file()
    }

    /// Decompressed object bytes, header included
    pub fn load(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        let object_path = self.object_path(object_id);
        let compressed = std::fs::read(&object_path)
            .with_context(|| format!("Unable to read object {}", object_id))?;

        let mut content = Vec::new();
        ZlibDecoder::new(&compressed[..])
            .read_to_end(&mut content)
            .with_context(|| format!("Object {} is not valid zlib data", object_id))?;

        Ok(content.into())
    }

    /// Write an object unless it is already stored
    pub fn store(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        let content = object.serialize()?;
        let object_id = self.algorithm.hash(&content);
        let object_path = self.object_path(&object_id);

        if !object_path.exists() {
            self.write_object(&object_path, &content)?;
            tracing::trace!(oid = %object_id, kind = %object.object_type(), "stored object");
        }

        Ok(object_id)
    }

    /// Compress into a temp file next to the target, then rename over it
    fn write_object(&self, object_path: &Path, content: &[u8]) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .with_context(|| format!("Invalid object path {}", object_path.display()))?;
        std::fs::create_dir_all(object_dir)
            .with_context(|| format!("Unable to create {}", object_dir.display()))?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content)?;
        let compressed = encoder.finish().context("Unable to compress object")?;

        let temp_path = object_dir.join(format!("tmp-obj-{}", rand::random::<u32>()));
        std::fs::write(&temp_path, compressed)
            .with_context(|| format!("Unable to write {}", temp_path.display()))?;
        std::fs::rename(&temp_path, object_path)
            .with_context(|| format!("Unable to move object into {}", object_path.display()))?;

        Ok(())
    }

    /// Object type plus a reader positioned at the payload
    fn open(&self, object_id: &ObjectId) -> anyhow::Result<(ObjectType, ObjectReader)> {
        let mut reader = Cursor::new(self.load(object_id)?);
        let object_type = ObjectType::parse_object_type(&mut reader)
            .with_context(|| format!("Malformed object {}", object_id))?;
        tracing::trace!(oid = %object_id, kind = %object_type, "loaded object");

        Ok((object_type, reader))
    }

    /// Parse the object only when it has the `expected` type
    fn parse_if<T>(
        &self,
        object_id: &ObjectId,
        expected: ObjectType,
        parse: impl FnOnce(ObjectReader) -> anyhow::Result<T>,
    ) -> anyhow::Result<Option<T>> {
        match self.open(object_id)? {
            (object_type, reader) if object_type == expected => parse(reader).map(Some),
            _ => Ok(None),
        }
    }

    pub fn get_object_type(&self, object_id: &ObjectId) -> anyhow::Result<ObjectType> {
        self.open(object_id).map(|(object_type, _)| object_type)
    }

    pub fn parse_object(&self, object_id: &ObjectId) -> anyhow::Result<ObjectBox> {
        let (object_type, reader) = self.open(object_id)?;

        Ok(match object_type {
            ObjectType::Blob => ObjectBox::Blob(Box::new(Blob::deserialize(reader)?)),
            ObjectType::Tree => {
                ObjectBox::Tree(Box::new(TreeRecord::parse(reader, self.algorithm)?))
            }
            ObjectType::Commit => ObjectBox::Commit(Box::new(Commit::deserialize(reader)?)),
        })
    }

    pub fn parse_object_as_blob(&self, object_id: &ObjectId) -> anyhow::Result<Option<Blob>> {
        self.parse_if(object_id, ObjectType::Blob, Blob::deserialize)
    }

    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> anyhow::Result<Option<TreeRecord>> {
        self.parse_if(object_id, ObjectType::Tree, |reader| {
            TreeRecord::parse(reader, self.algorithm)
        })
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> anyhow::Result<Option<Commit>> {
        self.parse_if(object_id, ObjectType::Commit, Commit::deserialize)
    }

    /// Every stored object whose hex ID starts with `prefix` (at least two digits)
    pub fn find_objects_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        let Some((dir_name, rest)) = prefix.split_at_checked(2) else {
            anyhow::bail!("Object prefix '{}' is too short", prefix);
        };

        let dir_path = self.path.join(dir_name);
        if !dir_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for entry in std::fs::read_dir(&dir_path)? {
            let file_name = entry?.file_name();
            let file_name = file_name.to_string_lossy();

            if file_name.starts_with(rest)
                && let Ok(oid) = ObjectId::try_parse(&format!("{}{}", dir_name, file_name))
            {
                matches.push(oid);
            }
        }

        matches.sort();
        Ok(matches)
    }
}
