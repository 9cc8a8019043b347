use crate::artifacts::database::tree_record::TreeRecord;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::hash_algorithm::HashAlgorithm;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use anyhow::Result;
use bytes::Bytes;
use std::io::BufRead;

pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

pub trait Unpackable {
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    fn display(&self) -> String;

    fn object_id(&self, algorithm: HashAlgorithm) -> Result<ObjectId> {
        let content = self.serialize()?;
        Ok(algorithm.hash(&content))
    }
}

/// An object exactly as parsed from the object database
pub enum ObjectBox {
    Blob(Box<Blob>),
    Tree(Box<TreeRecord>),
    Commit(Box<Commit>),
}

impl ObjectBox {
    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectBox::Blob(_) => ObjectType::Blob,
            ObjectBox::Tree(_) => ObjectType::Tree,
            ObjectBox::Commit(_) => ObjectType::Commit,
        }
    }
}

/// A resolved object wrapped to its concrete kind
///
/// Trees come back as repository-bound [`Tree`] handles so that they can be
/// walked and diffed further.
#[derive(Debug, Clone)]
pub enum GitObject {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
}

impl GitObject {
    pub fn object_type(&self) -> ObjectType {
        match self {
            GitObject::Blob(_) => ObjectType::Blob,
            GitObject::Tree(_) => ObjectType::Tree,
            GitObject::Commit(_) => ObjectType::Commit,
        }
    }

    pub fn into_blob(self) -> Option<Blob> {
        match self {
            GitObject::Blob(blob) => Some(*blob),
            _ => None,
        }
    }

    pub fn into_tree(self) -> Option<Tree> {
        match self {
            GitObject::Tree(tree) => Some(*tree),
            _ => None,
        }
    }

    pub fn into_commit(self) -> Option<Commit> {
        match self {
            GitObject::Commit(commit) => Some(*commit),
            _ => None,
        }
    }
}
