//! Repository handle
//!
//! Ties together the object database, references, the working directory and
//! the index file of one repository. Handles are shared as `Arc<Repository>`:
//! every tree and entry read through a repository keeps it alive.

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::database::tree_record::TreeRecord;
use crate::artifacts::objects::hash_algorithm::HashAlgorithm;
use crate::artifacts::objects::object::{GitObject, Object, ObjectBox};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::artifacts::objects::tree_error::{TreeError, TreeResult};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const GIT_DIR_NAME: &str = ".git";
const DEFAULT_BRANCH: &str = "main";

/// Suffix peeling a revision down to its tree
const TREE_PEEL_SUFFIX: &str = "^{tree}";

/// Shortest abbreviated object ID accepted by `revparse`
const MIN_PREFIX_LENGTH: usize = 4;

#[derive(Debug)]
pub struct Repository {
    git_dir: Box<Path>,
    algorithm: HashAlgorithm,
    database: Database,
    refs: Refs,
    workspace: Option<Workspace>,
}

impl Repository {
    /// Create an empty repository with a `.git` directory under `path`
    pub fn init(path: &Path, algorithm: HashAlgorithm) -> anyhow::Result<Arc<Self>> {
        let git_dir = path.join(GIT_DIR_NAME);

        for dir in ["objects", "refs/heads", "refs/tags"] {
            std::fs::create_dir_all(git_dir.join(dir))
                .with_context(|| format!("Unable to create {}", git_dir.join(dir).display()))?;
        }

        std::fs::write(
            git_dir.join("HEAD"),
            format!("ref: refs/heads/{}\n", DEFAULT_BRANCH),
        )
        .context("Unable to write HEAD")?;
        std::fs::write(git_dir.join("config"), Self::initial_config(algorithm))
            .context("Unable to write config")?;

        tracing::debug!(path = %path.display(), %algorithm, "initialized repository");
        Self::open_with(&git_dir, Some(path))
    }

    /// Open a repository from its working directory or its git directory
    pub fn open(path: &Path) -> anyhow::Result<Arc<Self>> {
        let dot_git = path.join(GIT_DIR_NAME);
        if dot_git.is_dir() {
            return Self::open_with(&dot_git, Some(path));
        }

        if Self::looks_like_git_dir(path) {
            return Self::open_with(path, None);
        }

        Err(anyhow::anyhow!(
            "not a git repository: {}",
            path.display()
        ))
    }

    /// Open the repository containing `start`, searching parent directories
    pub fn discover(start: &Path) -> anyhow::Result<Arc<Self>> {
        let start = start
            .canonicalize()
            .with_context(|| format!("Unable to resolve {}", start.display()))?;

        for dir in start.ancestors() {
            if dir.join(GIT_DIR_NAME).is_dir() || Self::looks_like_git_dir(dir) {
                return Self::open(dir);
            }
        }

        Err(anyhow::anyhow!(
            "not a git repository (or any of the parent directories): {}",
            start.display()
        ))
    }

    /// Open with an explicit git directory and optional working directory
    pub fn open_with(git_dir: &Path, work_tree: Option<&Path>) -> anyhow::Result<Arc<Self>> {
        if !Self::looks_like_git_dir(git_dir) {
            return Err(anyhow::anyhow!(
                "not a git repository: {}",
                git_dir.display()
            ));
        }

        let algorithm = Self::read_object_format(git_dir)?;
        let database = Database::new(git_dir.join("objects").into_boxed_path(), algorithm);
        let refs = Refs::new(git_dir.into());
        let workspace = work_tree.map(|path| Workspace::new(path.into()));

        tracing::debug!(
            git_dir = %git_dir.display(),
            work_tree = ?work_tree,
            %algorithm,
            "opened repository"
        );

        Ok(Arc::new(Repository {
            git_dir: git_dir.into(),
            algorithm,
            database,
            refs,
            workspace,
        }))
    }

    fn looks_like_git_dir(path: &Path) -> bool {
        path.join("HEAD").is_file() && path.join("objects").is_dir()
    }

    fn initial_config(algorithm: HashAlgorithm) -> String {
        match algorithm {
            HashAlgorithm::Sha1 => "[core]\n\trepositoryformatversion = 0\n\tbare = false\n".into(),
            HashAlgorithm::Sha256 => format!(
                "[core]\n\trepositoryformatversion = 1\n\tbare = false\n[extensions]\n\tobjectformat = {}\n",
                algorithm
            ),
        }
    }

    /// `extensions.objectformat` from the repository config, SHA-1 if unset
    fn read_object_format(git_dir: &Path) -> anyhow::Result<HashAlgorithm> {
        let config_path = git_dir.join("config");
        if !config_path.is_file() {
            return Ok(HashAlgorithm::default());
        }

        let config = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Unable to read {}", config_path.display()))?;

        let mut section = String::new();
        for line in config.lines().map(str::trim) {
            if line.starts_with('#') || line.starts_with(';') || line.is_empty() {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = name.trim().to_ascii_lowercase();
                continue;
            }

            if section == "extensions"
                && let Some((key, value)) = line.split_once('=')
                && key.trim().eq_ignore_ascii_case("objectformat")
            {
                return HashAlgorithm::try_from(value);
            }
        }

        Ok(HashAlgorithm::default())
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn is_bare(&self) -> bool {
        self.workspace.is_none()
    }

    pub fn workspace(&self) -> anyhow::Result<&Workspace> {
        self.workspace
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("this operation must be run in a work tree"))
    }

    pub fn index_path(&self) -> PathBuf {
        self.git_dir.join("index")
    }

    /// Load the index file as it currently is on disk
    pub fn index(&self) -> anyhow::Result<Index> {
        let mut index = Index::new(self.index_path().into_boxed_path(), self.algorithm);
        index.rehydrate()?;
        Ok(index)
    }

    /// Tree with the given ID, bound to this repository
    pub fn lookup_tree(self: &Arc<Self>, id: &ObjectId) -> TreeResult<Tree> {
        match self.database.parse_object(id)? {
            ObjectBox::Tree(record) => Ok(Tree::new(id.clone(), *record, Some(Arc::clone(self)))),
            other => Err(TreeError::TypeMismatch {
                expected: ObjectType::Tree,
                actual: other.object_type(),
            }),
        }
    }

    /// Any object, wrapped into its concrete kind
    pub fn lookup_object(self: &Arc<Self>, id: &ObjectId) -> TreeResult<GitObject> {
        let object = match self.database.parse_object(id)? {
            ObjectBox::Blob(blob) => GitObject::Blob(blob),
            ObjectBox::Tree(record) => GitObject::Tree(Box::new(Tree::new(
                id.clone(),
                *record,
                Some(Arc::clone(self)),
            ))),
            ObjectBox::Commit(commit) => GitObject::Commit(commit),
        };

        Ok(object)
    }

    /// The tree with no entries, whether or not it is stored
    pub fn empty_tree(self: &Arc<Self>) -> TreeResult<Tree> {
        let record = TreeRecord::empty();
        let id = record.object_id(self.algorithm)?;

        Ok(Tree::new(id, record, Some(Arc::clone(self))))
    }

    /// Resolve a revision to an object ID
    ///
    /// Accepts `HEAD`, reference names, full and abbreviated object IDs,
    /// optionally followed by `^{tree}`.
    pub fn revparse(&self, revision: &str) -> anyhow::Result<ObjectId> {
        let name = revision.strip_suffix(TREE_PEEL_SUFFIX).unwrap_or(revision);

        if let Some(oid) = self.refs.read_ref(name)? {
            return Ok(oid);
        }

        let is_hex = name.chars().all(|c| c.is_ascii_hexdigit());
        if is_hex && name.len() == self.algorithm.hex_size() {
            return ObjectId::try_parse(name);
        }

        if is_hex && name.len() >= MIN_PREFIX_LENGTH {
            let mut candidates = self.database.find_objects_by_prefix(name)?;
            return match candidates.len() {
                0 => Err(anyhow::anyhow!("unknown revision: {}", revision)),
                1 => Ok(candidates.remove(0)),
                _ => Err(anyhow::anyhow!(
                    "short object ID {} is ambiguous ({} candidates)",
                    name,
                    candidates.len()
                )),
            };
        }

        Err(anyhow::anyhow!("unknown revision: {}", revision))
    }

    /// Resolve a revision and peel commits down to their root tree
    pub fn revparse_tree(self: &Arc<Self>, revision: &str) -> TreeResult<Tree> {
        let oid = self.revparse(revision)?;

        match self.database.get_object_type(&oid)? {
            ObjectType::Tree => self.lookup_tree(&oid),
            ObjectType::Commit => {
                let commit = self
                    .database
                    .parse_object_as_commit(&oid)?
                    .with_context(|| format!("{} is not a commit", oid))?;
                tracing::debug!(commit = %oid, tree = %commit.tree_oid(), "peeled commit to tree");
                self.lookup_tree(commit.tree_oid())
            }
            actual => Err(TreeError::TypeMismatch {
                expected: ObjectType::Tree,
                actual,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::database::database_entry::DatabaseEntry;
    use crate::artifacts::objects::blob::Blob;
    use crate::artifacts::objects::commit::{Commit, Signature};
    use crate::artifacts::objects::entry_mode::{EntryMode, FileMode};
    use assert_fs::TempDir;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    fn commit_tree(repository: &Repository) -> (ObjectId, ObjectId) {
        let blob = repository
            .database()
            .store(&Blob::new(Bytes::from_static(b"hello\n")))
            .unwrap();
        let tree = repository
            .database()
            .store(&TreeRecord::new(vec![DatabaseEntry::new(
                "hello.txt",
                EntryMode::File(FileMode::Regular),
                blob,
            )]))
            .unwrap();
        let author = Signature::try_from("A U Thor <author@example.com> 1700000000 +0000").unwrap();
        let commit = repository
            .database()
            .store(&Commit::new(vec![], tree.clone(), author, "init\n".into()))
            .unwrap();
        std::fs::write(
            repository.git_dir().join("refs/heads/main"),
            format!("{}\n", commit),
        )
        .unwrap();

        (commit, tree)
    }

    #[rstest]
    #[case(HashAlgorithm::Sha1)]
    #[case(HashAlgorithm::Sha256)]
    fn init_records_the_object_format(temp_dir: TempDir, #[case] algorithm: HashAlgorithm) {
        Repository::init(temp_dir.path(), algorithm).unwrap();

        let reopened = Repository::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.algorithm(), algorithm);
        assert!(!reopened.is_bare());
    }

    #[rstest]
    fn discovers_from_a_subdirectory(temp_dir: TempDir) {
        Repository::init(temp_dir.path(), HashAlgorithm::Sha1).unwrap();
        let nested = temp_dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let repository = Repository::discover(&nested).unwrap();
        assert!(repository.git_dir().ends_with(".git"));
    }

    #[rstest]
    fn bare_repository_has_no_workspace(temp_dir: TempDir) {
        let repository = Repository::init(temp_dir.path(), HashAlgorithm::Sha1).unwrap();
        let bare = Repository::open(repository.git_dir()).unwrap();

        assert!(bare.is_bare());
        assert!(bare.workspace().is_err());
    }

    #[rstest]
    fn revparse_peels_head_to_its_tree(temp_dir: TempDir) {
        let repository = Repository::init(temp_dir.path(), HashAlgorithm::Sha1).unwrap();
        let (commit, tree) = commit_tree(&repository);

        assert_eq!(repository.revparse_tree("HEAD").unwrap().id(), &tree);
        assert_eq!(repository.revparse_tree("main^{tree}").unwrap().id(), &tree);
        assert_eq!(
            repository.revparse_tree(&commit.to_short_oid()).unwrap().id(),
            &tree
        );
        assert!(repository.revparse_tree("nope").is_err());
    }

    #[rstest]
    fn lookup_tree_rejects_other_kinds(temp_dir: TempDir) {
        let repository = Repository::init(temp_dir.path(), HashAlgorithm::Sha1).unwrap();
        let (commit, _) = commit_tree(&repository);

        assert!(matches!(
            repository.lookup_tree(&commit),
            Err(TreeError::TypeMismatch {
                expected: ObjectType::Tree,
                actual: ObjectType::Commit
            })
        ));
    }

    #[rstest]
    fn empty_tree_has_the_well_known_id(temp_dir: TempDir) {
        let repository = Repository::init(temp_dir.path(), HashAlgorithm::Sha1).unwrap();
        let empty = repository.empty_tree().unwrap();

        assert_eq!(empty.id().to_string(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
        assert!(empty.is_empty());
    }
}
