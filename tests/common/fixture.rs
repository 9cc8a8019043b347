use assert_fs::TempDir;
use assert_fs::prelude::{FileWriteStr, PathChild};
use gtree::artifacts::database::database_entry::DatabaseEntry;
use gtree::artifacts::database::tree_record::TreeRecord;
use gtree::artifacts::objects::blob::Blob;
use gtree::artifacts::objects::commit::{Commit, Signature};
use gtree::{EntryMode, FileMode, HashAlgorithm, ObjectId, Repository, Tree};
use rstest::fixture;
use std::sync::Arc;

pub const A_TXT: &str = "hello\n";
pub const X_TXT: &str = "x marks the spot\n";
pub const Y_TXT: &str = "why\n";

/// A repository with its temp directory kept alive
pub struct TestRepository {
    pub dir: TempDir,
    pub repository: Arc<Repository>,
}

impl TestRepository {
    pub fn init(algorithm: HashAlgorithm) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let repository = Repository::init(dir.path(), algorithm).expect("Failed to init repository");

        TestRepository { dir, repository }
    }

    pub fn blob(&self, content: &str) -> ObjectId {
        self.repository
            .database()
            .store(&Blob::new(content.to_string().into()))
            .expect("Failed to store blob")
    }

    pub fn tree(&self, entries: Vec<DatabaseEntry>) -> ObjectId {
        self.repository
            .database()
            .store(&TreeRecord::new(entries))
            .expect("Failed to store tree")
    }

    pub fn file(&self, name: &str, content: &str) -> DatabaseEntry {
        DatabaseEntry::new(name, EntryMode::File(FileMode::Regular), self.blob(content))
    }

    pub fn dir_entry(&self, name: &str, entries: Vec<DatabaseEntry>) -> DatabaseEntry {
        DatabaseEntry::new(name, EntryMode::Directory, self.tree(entries))
    }

    pub fn lookup(&self, id: &ObjectId) -> Tree {
        self.repository.lookup_tree(id).expect("Failed to look up tree")
    }

    /// Commit `tree` on top of the current branch and move the branch
    pub fn commit(&self, tree: &ObjectId, message: &str) -> ObjectId {
        let author = Signature::try_from("Jane Doe <jane@example.com> 1700000000 +0000")
            .expect("Failed to parse signature");
        let parents = self
            .repository
            .refs()
            .read_head()
            .expect("Failed to read HEAD")
            .into_iter()
            .collect();

        let commit = Commit::new(parents, tree.clone(), author, format!("{}\n", message));
        let oid = self
            .repository
            .database()
            .store(&commit)
            .expect("Failed to store commit");

        self.dir
            .child(".git/refs/heads/main")
            .write_str(&format!("{}\n", oid))
            .expect("Failed to move branch");

        oid
    }

    /// Write a file into the working directory
    pub fn write(&self, path: &str, content: &str) {
        self.dir
            .child(path)
            .write_str(content)
            .expect("Failed to write workspace file");
    }

    /// `a.txt`, `sub/x.txt` and `sub/deeper/y.txt`
    pub fn basic_tree(&self) -> ObjectId {
        let deeper = self.dir_entry("deeper", vec![self.file("y.txt", Y_TXT)]);
        let sub = self.dir_entry("sub", vec![self.file("x.txt", X_TXT), deeper]);

        self.tree(vec![self.file("a.txt", A_TXT), sub])
    }

    /// Check out `basic_tree` into the working directory
    pub fn write_basic_workspace(&self) {
        self.write("a.txt", A_TXT);
        self.write("sub/x.txt", X_TXT);
        self.write("sub/deeper/y.txt", Y_TXT);
    }
}

#[fixture]
pub fn test_repository() -> TestRepository {
    TestRepository::init(HashAlgorithm::Sha1)
}

/// `basic_tree` committed on `main`, with a matching working directory
#[fixture]
pub fn committed(test_repository: TestRepository) -> (TestRepository, Tree) {
    let id = test_repository.basic_tree();
    test_repository.commit(&id, "Initial commit");
    test_repository.write_basic_workspace();

    let tree = test_repository.lookup(&id);
    (test_repository, tree)
}
