//! Git commit object
//!
//! Commits are read so that a commit ID (or `HEAD`) can be peeled down to its
//! root tree, and written so that repositories can be set up programmatically.
//!
//! ```text
//! tree <tree-id>
//! parent <parent-id>         (zero or more)
//! author <signature>
//! committer <signature>
//!
//! <message>
//! ```

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use std::io::BufRead;

/// `Name <email> <unix-seconds> <+hhmm>`
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Signature {
    name: String,
    email: String,
    when: DateTime<FixedOffset>,
}

impl Signature {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        when: DateTime<FixedOffset>,
    ) -> Self {
        Signature {
            name: name.into(),
            email: email.into(),
            when,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn when(&self) -> DateTime<FixedOffset> {
        self.when
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.when.timestamp(),
            self.when.format("%z")
        )
    }
}

impl TryFrom<&str> for Signature {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let (identity, when) = value
            .rsplit_once('>')
            .with_context(|| format!("Malformed signature: {}", value))?;
        let (name, email) = identity
            .split_once('<')
            .with_context(|| format!("Malformed signature: {}", value))?;

        let (seconds, offset) = when
            .trim()
            .split_once(' ')
            .with_context(|| format!("Signature without a timestamp: {}", value))?;
        let seconds = seconds
            .parse::<i64>()
            .with_context(|| format!("Invalid timestamp: {}", seconds))?;
        let offset =
            parse_offset(offset).with_context(|| format!("Invalid timezone: {}", offset))?;
        let when = DateTime::from_timestamp(seconds, 0)
            .with_context(|| format!("Timestamp out of range: {}", seconds))?
            .with_timezone(&offset);

        Ok(Signature::new(name.trim(), email, when))
    }
}

fn parse_offset(offset: &str) -> Option<FixedOffset> {
    let (sign, digits) = match offset.split_at_checked(1)? {
        ("+", digits) => (1, digits),
        ("-", digits) => (-1, digits),
        _ => return None,
    };
    if digits.len() != 4 {
        return None;
    }

    let hours = digits[..2].parse::<i32>().ok()?;
    let minutes = digits[2..].parse::<i32>().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    tree_oid: ObjectId,
    parents: Vec<ObjectId>,
    author: Signature,
    committer: Signature,
    message: String,
}

impl Commit {
    /// A commit whose committer is its author
    pub fn new(
        parents: Vec<ObjectId>,
        tree_oid: ObjectId,
        author: Signature,
        message: String,
    ) -> Self {
        Commit {
            tree_oid,
            parents,
            committer: author.clone(),
            author,
            message,
        }
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn author(&self) -> &Signature {
        &self.author
    }

    pub fn committer(&self) -> &Signature {
        &self.committer
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn body(&self) -> String {
        let mut body = format!("tree {}\n", self.tree_oid);
        for parent in &self.parents {
            body.push_str(&format!("parent {}\n", parent));
        }
        body.push_str(&format!("author {}\n", self.author));
        body.push_str(&format!("committer {}\n", self.committer));
        body.push('\n');
        body.push_str(&self.message);
        body
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let body = self.body();
        let header = format!("{} {}\0", self.object_type().as_str(), body.len());

        Ok(Bytes::from([header.into_bytes(), body.into_bytes()].concat()))
    }
}

impl Unpackable for Commit {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;
        let content = String::from_utf8_lossy(&content);
        let (headers, message) = content
            .split_once("\n\n")
            .unwrap_or((content.as_ref(), ""));

        let mut tree_oid = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        // continuation lines (gpgsig, mergetag) start with a space
        for line in headers.lines().filter(|line| !line.starts_with(' ')) {
            match line.split_once(' ') {
                Some(("tree", value)) => tree_oid = Some(ObjectId::try_parse(value)?),
                Some(("parent", value)) => parents.push(ObjectId::try_parse(value)?),
                Some(("author", value)) => author = Some(Signature::try_from(value)?),
                Some(("committer", value)) => committer = Some(Signature::try_from(value)?),
                _ => {}
            }
        }

        let author = author.context("Commit has no author")?;
        Ok(Commit {
            tree_oid: tree_oid.context("Commit has no tree")?,
            parents,
            committer: committer.unwrap_or_else(|| author.clone()),
            author,
            message: message.to_string(),
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        self.body()
    }
}
