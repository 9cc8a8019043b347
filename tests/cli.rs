mod common;

use assert_cmd::Command;
use common::fixture::{TestRepository, committed};
use gtree::Tree;
use predicates::prelude::predicate;
use rstest::rstest;

fn run_gtree(repo: &TestRepository, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("gtree").expect("Failed to find gtree binary");
    cmd.current_dir(repo.dir.path())
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE")
        .args(args);
    cmd
}

#[rstest]
fn ls_tree_lists_top_level_entries(committed: (TestRepository, Tree)) {
    let (repo, tree) = committed;
    let a = tree.get("a.txt").unwrap();
    let sub = tree.get("sub").unwrap();

    run_gtree(&repo, &["ls-tree", "HEAD"])
        .assert()
        .success()
        .stdout(predicate::eq(format!(
            "100644 blob {}\ta.txt\n040000 tree {}\tsub\n",
            a.hex(),
            sub.hex()
        )));
}

#[rstest]
fn ls_tree_recurses_into_subtrees(committed: (TestRepository, Tree)) {
    let (repo, _tree) = committed;

    let output = run_gtree(&repo, &["ls-tree", "-r", "HEAD"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let paths = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| line.split('\t').nth(1).unwrap().to_string())
        .collect::<Vec<_>>();

    assert_eq!(paths, vec!["a.txt", "sub/deeper/y.txt", "sub/x.txt"]);
}

#[rstest]
fn ls_tree_with_trailing_slash_lists_the_subtree(committed: (TestRepository, Tree)) {
    let (repo, _tree) = committed;

    run_gtree(&repo, &["ls-tree", "HEAD", "sub/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\tsub/deeper\n"))
        .stdout(predicate::str::contains("\tsub/x.txt\n"));
}

#[rstest]
fn show_entry_describes_a_nested_entry(committed: (TestRepository, Tree)) {
    let (repo, tree) = committed;
    let entry = tree.get("sub/x.txt").unwrap();

    run_gtree(&repo, &["show-entry", "HEAD", "sub/x.txt"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!(
            "TreeEntry('x.txt', blob, {})\n",
            entry.hex()
        )))
        .stdout(predicate::str::contains("mode: 100644\n"));
}

#[rstest]
fn show_entry_reports_missing_paths(committed: (TestRepository, Tree)) {
    let (repo, _tree) = committed;

    run_gtree(&repo, &["show-entry", "HEAD", "sub/nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "the path 'sub/nope' does not exist in the given tree",
        ));
}

#[rstest]
fn diff_tree_against_the_empty_tree(committed: (TestRepository, Tree)) {
    let (repo, _tree) = committed;

    run_gtree(&repo, &["diff-tree", "HEAD", "--name-status"])
        .assert()
        .success()
        .stdout(predicate::eq("D\ta.txt\nD\tsub/deeper/y.txt\nD\tsub/x.txt\n"));

    run_gtree(&repo, &["diff-tree", "HEAD", "--swap", "--name-status"])
        .assert()
        .success()
        .stdout(predicate::eq("A\ta.txt\nA\tsub/deeper/y.txt\nA\tsub/x.txt\n"));
}

#[rstest]
fn diff_tree_between_two_trees(committed: (TestRepository, Tree)) {
    let (repo, tree) = committed;
    let changed = repo.tree(vec![repo.file("a.txt", "hello\nworld\n")]);

    run_gtree(&repo, &["diff-tree", &tree.id().to_hex(), &changed.to_hex()])
        .assert()
        .success()
        .stdout(predicate::str::contains("diff --git a/a.txt b/a.txt\n"))
        .stdout(predicate::str::contains("@@ -1 +1,2 @@\n hello\n+world\n"))
        .stdout(predicate::str::contains("deleted file mode 100644\n"));
}

#[rstest]
fn diff_files_reports_untracked_files_on_request(committed: (TestRepository, Tree)) {
    let (repo, _tree) = committed;
    repo.write("a.txt", "hello\nagain\n");
    repo.write("notes.txt", "scratch\n");

    run_gtree(&repo, &["diff-files", "HEAD", "--name-status"])
        .assert()
        .success()
        .stdout(predicate::eq("M\ta.txt\n"));

    run_gtree(&repo, &["diff-files", "HEAD", "--name-status", "--untracked"])
        .assert()
        .success()
        .stdout(predicate::eq("M\ta.txt\n?\tnotes.txt\n"));
}

#[rstest]
fn diff_files_honours_context_lines(committed: (TestRepository, Tree)) {
    let (repo, _tree) = committed;
    repo.write("a.txt", "hello\nagain\n");

    run_gtree(&repo, &["diff-files", "HEAD", "-U0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("@@ -1,0 +2 @@\n+again\n"));
}

#[rstest]
fn diff_index_without_an_index_deletes_everything(committed: (TestRepository, Tree)) {
    let (repo, _tree) = committed;

    run_gtree(&repo, &["diff-index", "HEAD", "--name-status"])
        .assert()
        .success()
        .stdout(predicate::eq("D\ta.txt\nD\tsub/deeper/y.txt\nD\tsub/x.txt\n"));
}

#[rstest]
fn explicit_git_dir_is_honoured(committed: (TestRepository, Tree)) {
    let (repo, _tree) = committed;
    let outside = assert_fs::TempDir::new().unwrap();
    let git_dir = repo.dir.path().join(".git");

    let mut cmd = Command::cargo_bin("gtree").unwrap();
    cmd.current_dir(outside.path())
        .env("GIT_DIR", &git_dir)
        .args(["ls-tree", "HEAD", "a.txt"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::ends_with("\ta.txt\n"));
}

#[rstest]
fn outside_a_repository_fails() {
    let outside = assert_fs::TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("gtree").unwrap();
    cmd.current_dir(outside.path())
        .env_remove("GIT_DIR")
        .args(["ls-tree", "HEAD"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not a git repository"));
}
