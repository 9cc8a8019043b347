//! Result of a diff request
//!
//! A [`Diff`] owns its deltas and keeps the repository they were computed in
//! alive. It renders as `--name-status` lines or as a unified patch.

use crate::areas::repository::Repository;
use crate::artifacts::diff::delta::{DeltaStatus, DiffDelta, DiffFile, LineOrigin};
use crate::artifacts::diff::diff_options::DiffOptions;
use colored::Colorize;
use std::fmt::Write;
use std::sync::Arc;

const NULL_PATH: &str = "/dev/null";

#[derive(Clone)]
pub struct Diff {
    deltas: Vec<DiffDelta>,
    options: DiffOptions,
    repository: Arc<Repository>,
}

impl Diff {
    pub(crate) fn new(
        deltas: Vec<DiffDelta>,
        options: DiffOptions,
        repository: Arc<Repository>,
    ) -> Self {
        Diff {
            deltas,
            options,
            repository,
        }
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiffDelta> {
        self.deltas.iter()
    }

    pub fn deltas(&self) -> &[DiffDelta] {
        &self.deltas
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    pub fn repository(&self) -> &Arc<Repository> {
        &self.repository
    }

    /// One `<status>\t<path>` line per delta
    pub fn name_status(&self) -> String {
        self.deltas
            .iter()
            .map(|delta| format!("{}\t{}\n", delta.status.status_char(), delta.path().display()))
            .collect()
    }

    /// Unified patch text, as `git diff` prints it
    pub fn patch(&self) -> String {
        self.render_patch(false)
    }

    pub fn render_patch(&self, color: bool) -> String {
        let mut patch = String::new();

        for delta in &self.deltas {
            match delta.status {
                DeltaStatus::Untracked => {}
                DeltaStatus::Conflicted => {
                    let _ = writeln!(patch, "* Unmerged path {}", delta.path().display());
                }
                _ => render_delta(&mut patch, delta, color),
            }
        }

        patch
    }
}

fn paint(text: &str, color: bool, style: fn(&str) -> colored::ColoredString) -> String {
    match color {
        true => style(text).to_string(),
        false => text.to_string(),
    }
}

fn side_path(file: &DiffFile, prefix: &str) -> String {
    match file.exists() {
        true => format!("{}{}", prefix, file.path.display()),
        false => NULL_PATH.to_string(),
    }
}

fn mode_of(file: &DiffFile) -> &'static str {
    file.mode.map(|mode| mode.as_str()).unwrap_or_default()
}

fn render_delta(out: &mut String, delta: &DiffDelta, color: bool) {
    let header = |out: &mut String, line: String| {
        let _ = writeln!(out, "{}", paint(&line, color, |s| s.bold()));
    };
    let (old, new) = (&delta.old_file, &delta.new_file);
    let path = delta.path().display();

    header(out, format!("diff --git a/{} b/{}", path, path));

    match (old.exists(), new.exists()) {
        (false, true) => header(out, format!("new file mode {}", mode_of(new))),
        (true, false) => header(out, format!("deleted file mode {}", mode_of(old))),
        _ if delta.is_mode_change() => {
            header(out, format!("old mode {}", mode_of(old)));
            header(out, format!("new mode {}", mode_of(new)));
        }
        _ => {}
    }

    if !delta.is_content_change() {
        return;
    }

    let mut index_line = format!("index {}..{}", old.id.to_short_oid(), new.id.to_short_oid());
    if old.exists() && new.exists() && !delta.is_mode_change() {
        let _ = write!(index_line, " {}", mode_of(new));
    }
    header(out, index_line);

    if delta.binary {
        let _ = writeln!(
            out,
            "Binary files {} and {} differ",
            side_path(old, "a/"),
            side_path(new, "b/")
        );
        return;
    }

    if delta.hunks.is_empty() {
        return;
    }

    header(out, format!("--- {}", side_path(old, "a/")));
    header(out, format!("+++ {}", side_path(new, "b/")));

    for hunk in &delta.hunks {
        let _ = writeln!(out, "{}", paint(&hunk.header(), color, |s| s.cyan()));

        for line in &hunk.lines {
            let text = format!("{}{}", line.origin.as_char(), line.content.trim_end_matches('\n'));
            let text = match line.origin {
                LineOrigin::Addition => paint(&text, color, |s| s.green()),
                LineOrigin::Deletion => paint(&text, color, |s| s.red()),
                LineOrigin::Context => text,
            };
            let _ = writeln!(out, "{}", text);

            if !line.has_newline() {
                out.push_str("\\ No newline at end of file\n");
            }
        }
    }
}

impl PartialEq for Diff {
    fn eq(&self, other: &Self) -> bool {
        self.deltas == other.deltas
    }
}

impl std::fmt::Debug for Diff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diff")
            .field("deltas", &self.deltas)
            .field("options", &self.options)
            .field("repository", &self.repository.git_dir())
            .finish()
    }
}

impl<'a> IntoIterator for &'a Diff {
    type Item = &'a DiffDelta;
    type IntoIter = std::slice::Iter<'a, DiffDelta>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
