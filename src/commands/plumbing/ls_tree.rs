use crate::areas::repository::Repository;
use crate::artifacts::objects::tree::Tree;
use crate::artifacts::objects::tree_entry::TreeEntry;
use std::io::Write;
use std::sync::Arc;

impl Repository {
    /// `ls-tree`: one `<mode> <kind> <id>\t<path>` line per entry
    ///
    /// With a path, only that entry is listed; a trailing `/` lists the
    /// contents of the subtree instead.
    pub fn ls_tree(
        self: &Arc<Self>,
        writer: &mut dyn Write,
        revision: &str,
        path: Option<&str>,
        recursive: bool,
    ) -> anyhow::Result<()> {
        let tree = self.revparse_tree(revision)?;

        match path {
            None => Self::list_entries(writer, &tree, "", recursive),
            Some(path) if path.ends_with('/') => {
                let subtree = tree.get_by_path(path)?.resolve_subtree()?;
                Self::list_entries(writer, &subtree, path, recursive)
            }
            Some(path) => {
                let entry = tree.get_by_path(path)?;
                if recursive && entry.mode().is_tree() {
                    let subtree = entry.resolve_subtree()?;
                    return Self::list_entries(writer, &subtree, &format!("{}/", path), recursive);
                }
                Self::write_entry(writer, &entry, path)
            }
        }
    }

    fn list_entries(
        writer: &mut dyn Write,
        tree: &Tree,
        prefix: &str,
        recursive: bool,
    ) -> anyhow::Result<()> {
        for entry in tree {
            let entry = entry?;
            let path = format!("{}{}", prefix, entry.name());

            if recursive && entry.mode().is_tree() {
                let subtree = entry.resolve_subtree()?;
                Self::list_entries(writer, &subtree, &format!("{}/", path), recursive)?;
            } else {
                Self::write_entry(writer, &entry, &path)?;
            }
        }

        Ok(())
    }

    fn write_entry(writer: &mut dyn Write, entry: &TreeEntry, path: &str) -> anyhow::Result<()> {
        writeln!(
            writer,
            "{:06o} {} {}\t{}",
            entry.filemode(),
            entry.kind(),
            entry.hex(),
            path
        )?;

        Ok(())
    }
}
