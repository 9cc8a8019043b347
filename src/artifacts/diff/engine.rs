//! Diff engine
//!
//! Finds the changed paths between a tree and another tree, the index or the
//! working directory, then loads both sides of every change and cuts their
//! line differences into hunks.

use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::delta::{DeltaStatus, DiffDelta, DiffHunk, DiffLine, LineOrigin};
use crate::artifacts::diff::diff_algorithm::{Edit, MyersDiff, hunks};
use crate::artifacts::diff::diff_options::DiffOptions;
use crate::artifacts::diff::diff_result::Diff;
use crate::artifacts::diff::diff_target::{self, DiffTarget, FileEntry, FileMap};
use crate::artifacts::diff::tree_diff::{TreeChangeType, TreeDiff};
use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the new side of a change is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Database,
    Workspace,
}

#[derive(Debug)]
struct Change {
    path: PathBuf,
    status: DeltaStatus,
    old: Option<FileEntry>,
    new: Option<FileEntry>,
    new_source: Source,
}

#[derive(Debug)]
pub struct DiffEngine<'r> {
    repository: &'r Arc<Repository>,
    options: &'r DiffOptions,
}

impl<'r> DiffEngine<'r> {
    pub fn new(repository: &'r Arc<Repository>, options: &'r DiffOptions) -> Self {
        DiffEngine {
            repository,
            options,
        }
    }

    /// `None` on either side is the empty tree
    pub fn tree_to_tree(&self, from: Option<&Tree>, to: Option<&Tree>) -> anyhow::Result<Diff> {
        let mut tree_diff = TreeDiff::new(self.repository.database());
        tree_diff.compare_records(
            from.map(|tree| tree.record()),
            to.map(|tree| tree.record()),
            Path::new(""),
        )?;

        let changes = tree_diff
            .into_changes()
            .into_iter()
            .map(|(path, change)| {
                let status = match change {
                    TreeChangeType::Added(_) => DeltaStatus::Added,
                    TreeChangeType::Deleted(_) => DeltaStatus::Deleted,
                    TreeChangeType::Modified { .. } => DeltaStatus::Modified,
                };
                let side = |entry: Option<&DatabaseEntry>| {
                    entry.map(|entry| FileEntry::new(entry.oid.clone(), entry.mode()))
                };

                Change {
                    status,
                    old: side(change.old_entry()),
                    new: side(change.new_entry()),
                    path,
                    new_source: Source::Database,
                }
            })
            .collect();

        self.finish(changes)
    }

    pub fn tree_to_index(&self, from: Option<&Tree>, index: &Index) -> anyhow::Result<Diff> {
        let old = self.flatten(from)?;
        let new = diff_target::from_index(index);

        let mut changes = Vec::new();
        let mut unmerged = BTreeSet::new();
        for (path, stages) in index.unmerged() {
            // ours, or whichever stage the conflict has
            let staged = stages
                .iter()
                .find(|staged| staged.stage() == 2)
                .or(stages.first())
                .map(|staged| FileEntry::new(staged.oid.clone(), staged.mode()));
            changes.push(Self::change(
                path,
                DeltaStatus::Conflicted,
                old.get(path),
                staged.as_ref(),
                Source::Database,
            ));
            unmerged.insert(path.to_path_buf());
        }

        for (path, entry) in &old {
            if unmerged.contains(path) {
                continue;
            }
            match new.get(path) {
                None => changes.push(Self::change(
                    path,
                    DeltaStatus::Deleted,
                    Some(entry),
                    None,
                    Source::Database,
                )),
                Some(staged) if !staged.same_as(entry) => changes.push(Self::change(
                    path,
                    DeltaStatus::Modified,
                    Some(entry),
                    Some(staged),
                    Source::Database,
                )),
                Some(_) => {}
            }
        }
        for (path, staged) in &new {
            if !old.contains_key(path) {
                changes.push(Self::change(
                    path,
                    DeltaStatus::Added,
                    None,
                    Some(staged),
                    Source::Database,
                ));
            }
        }

        self.finish(changes)
    }

    pub fn tree_to_workdir(&self, from: Option<&Tree>) -> anyhow::Result<Diff> {
        let workspace = self.repository.workspace()?;
        let old = self.flatten(from)?;
        let algorithm = self.repository.algorithm();

        let tracked_dirs = old
            .keys()
            .flat_map(|path| path.ancestors().skip(1))
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .collect::<BTreeSet<_>>();

        let mut changes = Vec::new();
        let mut seen = BTreeSet::new();
        let mut untracked_dirs = BTreeSet::new();

        for path in workspace.list_files()? {
            if Self::inside_gitlink(&old, &path) {
                continue;
            }

            let mode = workspace.stat_file(&path)?.mode;
            let Some(entry) = old.get(&path) else {
                if !self.options.include_untracked() {
                    continue;
                }

                let (path, mode) = match self.untracked_dir(&tracked_dirs, &path) {
                    Some(dir) if !untracked_dirs.insert(dir.clone()) => continue,
                    Some(dir) => (dir, EntryMode::Directory),
                    None => (path, mode),
                };
                let untracked = FileEntry::new(ObjectId::null(algorithm), mode);
                changes.push(Self::change(
                    &path,
                    DeltaStatus::Untracked,
                    None,
                    Some(&untracked),
                    Source::Workspace,
                ));
                continue;
            };

            let current = FileEntry::new(workspace.parse_blob(&path)?.object_id(algorithm)?, mode);
            if !entry.same_as(&current) {
                changes.push(Self::change(
                    &path,
                    DeltaStatus::Modified,
                    Some(entry),
                    Some(&current),
                    Source::Workspace,
                ));
            }

            seen.insert(path);
        }

        for (path, entry) in &old {
            if seen.contains(path) {
                continue;
            }
            // a checked out submodule is a directory; its content is not ours to compare
            if entry.mode == EntryMode::Gitlink && workspace.path().join(path).is_dir() {
                continue;
            }
            changes.push(Self::change(
                path,
                DeltaStatus::Deleted,
                Some(entry),
                None,
                Source::Workspace,
            ));
        }

        self.finish(changes)
    }

    fn flatten(&self, tree: Option<&Tree>) -> anyhow::Result<FileMap> {
        match tree {
            Some(tree) => {
                diff_target::flatten_tree(self.repository.database(), tree.record(), Path::new(""))
            }
            None => Ok(FileMap::new()),
        }
    }

    /// Outermost directory above an untracked `path` that holds no tracked file, as `dir/`
    fn untracked_dir(&self, tracked_dirs: &BTreeSet<PathBuf>, path: &Path) -> Option<PathBuf> {
        if self.options.recurse_untracked_dirs() {
            return None;
        }

        let mut dirs = path
            .ancestors()
            .skip(1)
            .filter(|dir| !dir.as_os_str().is_empty())
            .collect::<Vec<_>>();
        dirs.reverse();

        dirs.into_iter()
            .find(|dir| !tracked_dirs.contains(*dir))
            .map(|dir| {
                let mut name = dir.as_os_str().to_owned();
                name.push("/");
                PathBuf::from(name)
            })
    }

    fn inside_gitlink(files: &FileMap, path: &Path) -> bool {
        path.ancestors()
            .skip(1)
            .any(|dir| files.get(dir).is_some_and(|entry| entry.mode == EntryMode::Gitlink))
    }

    fn change(
        path: &Path,
        status: DeltaStatus,
        old: Option<&FileEntry>,
        new: Option<&FileEntry>,
        new_source: Source,
    ) -> Change {
        Change {
            path: path.to_path_buf(),
            status,
            old: old.cloned(),
            new: new.cloned(),
            new_source,
        }
    }

    fn finish(&self, changes: Vec<Change>) -> anyhow::Result<Diff> {
        let mut deltas = changes
            .into_iter()
            .map(|change| self.build_delta(change))
            .collect::<anyhow::Result<Vec<_>>>()?;
        deltas.sort_by(|a, b| a.path_bytes().cmp(b.path_bytes()));

        tracing::debug!(
            deltas = deltas.len(),
            hunks = deltas.iter().map(|delta| delta.hunks.len()).sum::<usize>(),
            reverse = self.options.reverse(),
            "diff computed"
        );

        Ok(Diff::new(deltas, self.options.clone(), Arc::clone(self.repository)))
    }

    fn load(
        &self,
        path: &Path,
        entry: Option<&FileEntry>,
        source: Source,
    ) -> anyhow::Result<DiffTarget> {
        let Some(entry) = entry else {
            return Ok(DiffTarget::from_nothing(path, self.repository.algorithm()));
        };

        match source {
            Source::Database => DiffTarget::from_database(path, entry, self.repository.database()),
            Source::Workspace => {
                DiffTarget::from_workspace(path, entry, self.repository.workspace()?)
            }
        }
    }

    fn build_delta(&self, change: Change) -> anyhow::Result<DiffDelta> {
        let mut old = self.load(&change.path, change.old.as_ref(), Source::Database)?;
        let mut new = match change.status {
            // untracked and unmerged content is never shown
            DeltaStatus::Untracked | DeltaStatus::Conflicted => {
                let mut target =
                    DiffTarget::from_nothing(&change.path, self.repository.algorithm());
                if let Some(entry) = &change.new {
                    target.oid = entry.oid.clone();
                    target.mode = Some(entry.mode);
                }
                target
            }
            _ => self.load(&change.path, change.new.as_ref(), change.new_source)?,
        };

        let mut delta = DiffDelta {
            status: change.status,
            old_file: old.clone().into_diff_file(),
            new_file: new.clone().into_diff_file(),
            binary: false,
            hunks: Vec::new(),
        };

        if self.options.reverse() {
            delta = delta.reversed();
            std::mem::swap(&mut old, &mut new);
        }

        let shown = !matches!(delta.status, DeltaStatus::Untracked | DeltaStatus::Conflicted);
        if !shown || old.is_gitlink() || new.is_gitlink() {
            return Ok(delta);
        }

        if !self.options.force_text() && (old.is_binary() || new.is_binary()) {
            delta.binary = true;
            return Ok(delta);
        }

        delta.hunks = self.diff_hunks(&old.text(), &new.text());
        Ok(delta)
    }

    fn diff_hunks(&self, old: &str, new: &str) -> Vec<DiffHunk> {
        let old_lines = old.split_inclusive('\n').collect::<Vec<_>>();
        let new_lines = new.split_inclusive('\n').collect::<Vec<_>>();
        let old_keys = old_lines
            .iter()
            .map(|line| self.options.normalize_line(line))
            .collect::<Vec<_>>();
        let new_keys = new_lines
            .iter()
            .map(|line| self.options.normalize_line(line))
            .collect::<Vec<_>>();

        let edits = MyersDiff::new(&old_keys, &new_keys).diff();
        let ranges = hunks(
            &edits,
            self.options.context_lines as usize,
            self.options.interhunk_lines as usize,
        );

        ranges
            .into_iter()
            .map(|range| DiffHunk {
                old_start: range.old_start,
                old_lines: range.old_lines,
                new_start: range.new_start,
                new_lines: range.new_lines,
                lines: edits[range.start..range.end]
                    .iter()
                    .map(|edit| match *edit {
                        Edit::Delete { old } => DiffLine {
                            origin: LineOrigin::Deletion,
                            content: old_lines[old].to_string(),
                            old_lineno: Some(old + 1),
                            new_lineno: None,
                        },
                        Edit::Insert { new } => DiffLine {
                            origin: LineOrigin::Addition,
                            content: new_lines[new].to_string(),
                            old_lineno: None,
                            new_lineno: Some(new + 1),
                        },
                        Edit::Equal { old, new } => DiffLine {
                            origin: LineOrigin::Context,
                            content: new_lines[new].to_string(),
                            old_lineno: Some(old + 1),
                            new_lineno: Some(new + 1),
                        },
                    })
                    .collect(),
            })
            .collect()
    }
}
