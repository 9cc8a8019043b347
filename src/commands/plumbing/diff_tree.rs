use crate::areas::repository::Repository;
use crate::artifacts::diff::diff_options::DiffOptions;
use crate::artifacts::diff::diff_result::Diff;
use std::io::Write;
use std::sync::Arc;

/// How a diff is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffFormat {
    #[default]
    Patch,
    NameStatus,
}

impl Repository {
    /// `diff-tree`: changes from one tree to another (or to the empty tree)
    #[allow(clippy::too_many_arguments)]
    pub fn diff_tree(
        self: &Arc<Self>,
        writer: &mut dyn Write,
        old: &str,
        new: Option<&str>,
        swap: bool,
        options: &DiffOptions,
        format: DiffFormat,
        color: bool,
    ) -> anyhow::Result<()> {
        let old = self.revparse_tree(old)?;
        let new = new.map(|revision| self.revparse_tree(revision)).transpose()?;

        let diff = old.diff_to_tree(new.as_ref(), options, swap)?;
        Self::write_diff(writer, &diff, format, color)
    }

    /// `diff-index`: changes from a tree to the staged content
    pub fn diff_index(
        self: &Arc<Self>,
        writer: &mut dyn Write,
        revision: &str,
        options: &DiffOptions,
        format: DiffFormat,
        color: bool,
    ) -> anyhow::Result<()> {
        let tree = self.revparse_tree(revision)?;
        let index = self.index()?;

        let diff = tree.diff_to_index(&index, options)?;
        Self::write_diff(writer, &diff, format, color)
    }

    /// `diff-files`: changes from a tree to the working directory
    pub fn diff_files(
        self: &Arc<Self>,
        writer: &mut dyn Write,
        revision: &str,
        options: &DiffOptions,
        format: DiffFormat,
        color: bool,
    ) -> anyhow::Result<()> {
        let tree = self.revparse_tree(revision)?;

        let diff = tree.diff_to_workdir(options)?;
        Self::write_diff(writer, &diff, format, color)
    }

    fn write_diff(
        writer: &mut dyn Write,
        diff: &Diff,
        format: DiffFormat,
        color: bool,
    ) -> anyhow::Result<()> {
        let output = match format {
            DiffFormat::Patch => diff.render_patch(color),
            DiffFormat::NameStatus => diff.name_status(),
        };

        writer.write_all(output.as_bytes())?;
        Ok(())
    }
}
