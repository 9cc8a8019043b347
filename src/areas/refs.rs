//! Git references (branches, HEAD, tags)
//!
//! References are human-readable names pointing to objects. They are only
//! read here, to turn names such as `HEAD` or `main` into the commit whose
//! tree gets listed or diffed.
//!
//! ## File Format
//!
//! Loose references are text files containing either:
//! - A full hex object ID (direct reference)
//! - `ref: <path>` for symbolic references
//!
//! Packed references live in `packed-refs`, one `<oid> <name>` per line.

use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use std::path::Path;

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

/// Symbolic links are followed at most this many times
const MAX_SYMREF_DEPTH: usize = 5;

/// Prefixes tried, in order, when resolving a short ref name
const REF_SEARCH_PREFIXES: [&str; 5] = ["", "refs/", "refs/tags/", "refs/heads/", "refs/remotes/"];

#[derive(Debug, new)]
pub struct Refs {
    /// Path to the git directory (typically `.git`)
    path: Box<Path>,
}

/// Content of a single reference
#[derive(Debug, Clone, PartialEq, Eq)]
enum SymRefOrOid {
    SymRef { sym_ref_name: String },
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn parse(content: &str) -> anyhow::Result<Option<SymRefOrOid>> {
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        let symref_match = regex::Regex::new(SYMREF_REGEX)?.captures(content);
        match symref_match {
            Some(symref_match) => Ok(Some(SymRefOrOid::SymRef {
                sym_ref_name: symref_match[1].to_string(),
            })),
            None => Ok(Some(SymRefOrOid::Oid(ObjectId::try_parse(content)?))),
        }
    }
}

impl Refs {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Object `HEAD` points at, `None` on an unborn branch
    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        self.read_ref(HEAD_REF_NAME)
    }

    /// Name of the reference `HEAD` ultimately points to (`HEAD` when detached)
    pub fn current_ref(&self) -> anyhow::Result<String> {
        let mut name = HEAD_REF_NAME.to_string();

        for _ in 0..MAX_SYMREF_DEPTH {
            match self.read_loose(&name)? {
                Some(SymRefOrOid::SymRef { sym_ref_name }) => name = sym_ref_name,
                _ => return Ok(name),
            }
        }

        Ok(name)
    }

    /// Resolve a reference name the way `git rev-parse` does
    ///
    /// The name is tried as given, then under `refs/`, `refs/tags/`,
    /// `refs/heads/` and `refs/remotes/`.
    pub fn read_ref(&self, name: &str) -> anyhow::Result<Option<ObjectId>> {
        if name.is_empty() || name.split('/').any(|part| part.is_empty() || part == "..") {
            return Ok(None);
        }

        for prefix in REF_SEARCH_PREFIXES {
            let full_name = format!("{}{}", prefix, name);
            if let Some(oid) = self.resolve(&full_name, 0)? {
                return Ok(Some(oid));
            }
        }

        Ok(None)
    }

    fn resolve(&self, full_name: &str, depth: usize) -> anyhow::Result<Option<ObjectId>> {
        if depth > MAX_SYMREF_DEPTH {
            return Err(anyhow::anyhow!("Too many levels of symbolic refs at {}", full_name));
        }

        match self.read_loose(full_name)? {
            Some(SymRefOrOid::SymRef { sym_ref_name }) => self.resolve(&sym_ref_name, depth + 1),
            Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
            None => self.read_packed(full_name),
        }
    }

    fn read_loose(&self, full_name: &str) -> anyhow::Result<Option<SymRefOrOid>> {
        let path = self.path.join(full_name);
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Unable to read reference {}", path.display()))?;
        SymRefOrOid::parse(&content)
    }

    fn read_packed(&self, full_name: &str) -> anyhow::Result<Option<ObjectId>> {
        let path = self.path.join("packed-refs");
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Unable to read {}", path.display()))?;

        for line in content.lines() {
            // comments and peeled tag lines
            if line.starts_with('#') || line.starts_with('^') {
                continue;
            }

            if let Some((oid, name)) = line.split_once(' ')
                && name.trim() == full_name
            {
                return Ok(Some(ObjectId::try_parse(oid)?));
            }
        }

        Ok(None)
    }
}
