use crate::areas::repository::Repository;
use std::io::Write;
use std::sync::Arc;

impl Repository {
    /// `show-entry`: every attribute of the entry at `path`
    pub fn show_entry(
        self: &Arc<Self>,
        writer: &mut dyn Write,
        revision: &str,
        path: &str,
    ) -> anyhow::Result<()> {
        let tree = self.revparse_tree(revision)?;
        let entry = tree.get_by_path(path)?;

        writeln!(writer, "{}", entry)?;
        writeln!(writer, "name: {}", entry.name())?;
        writeln!(writer, "kind: {}", entry.kind())?;
        writeln!(writer, "id: {}", entry.hex())?;
        if entry.filemode() == entry.filemode_raw() {
            writeln!(writer, "mode: {:06o}", entry.filemode())?;
        } else {
            writeln!(
                writer,
                "mode: {:06o} (stored as {:06o})",
                entry.filemode(),
                entry.filemode_raw()
            )?;
        }

        if entry.mode().is_tree() {
            writeln!(writer, "entries: {}", entry.resolve_subtree()?.len())?;
        }

        Ok(())
    }
}
