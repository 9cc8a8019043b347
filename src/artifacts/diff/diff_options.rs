use bitflags::bitflags;
use std::borrow::Cow;

bitflags! {
    /// Diff behaviour switches, bit-compatible with libgit2's `git_diff_option_t`
    ///
    /// Bits without a named flag are kept as given.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DiffFlags: u32 {
        /// Swap the old and new side of every change
        const REVERSE = 1 << 0;
        /// Report working directory files missing from the tree
        const INCLUDE_UNTRACKED = 1 << 3;
        /// List every file of an untracked directory instead of the directory itself
        const RECURSE_UNTRACKED_DIRS = 1 << 4;
        /// Produce hunks even for content that looks binary
        const FORCE_TEXT = 1 << 20;
        const IGNORE_WHITESPACE = 1 << 22;
        const IGNORE_WHITESPACE_CHANGE = 1 << 23;
        const IGNORE_WHITESPACE_EOL = 1 << 24;
    }
}

pub const DEFAULT_CONTEXT_LINES: u32 = 3;
pub const DEFAULT_INTERHUNK_LINES: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOptions {
    pub flags: DiffFlags,
    /// Unchanged lines shown around each change
    pub context_lines: u32,
    /// Unchanged lines allowed between two changes before they split into separate hunks
    pub interhunk_lines: u32,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            flags: DiffFlags::empty(),
            context_lines: DEFAULT_CONTEXT_LINES,
            interhunk_lines: DEFAULT_INTERHUNK_LINES,
        }
    }
}

impl DiffOptions {
    /// Options from raw flag bits; unknown bits are passed through
    pub fn from_raw(flags: u32, context_lines: u32, interhunk_lines: u32) -> Self {
        DiffOptions {
            flags: DiffFlags::from_bits_retain(flags),
            context_lines,
            interhunk_lines,
        }
    }

    pub fn with_flags(mut self, flags: DiffFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_context_lines(mut self, context_lines: u32) -> Self {
        self.context_lines = context_lines;
        self
    }

    pub fn with_interhunk_lines(mut self, interhunk_lines: u32) -> Self {
        self.interhunk_lines = interhunk_lines;
        self
    }

    pub fn reverse(&self) -> bool {
        self.flags.contains(DiffFlags::REVERSE)
    }

    pub fn include_untracked(&self) -> bool {
        self.flags.contains(DiffFlags::INCLUDE_UNTRACKED)
    }

    pub fn recurse_untracked_dirs(&self) -> bool {
        self.flags.contains(DiffFlags::RECURSE_UNTRACKED_DIRS)
    }

    pub fn force_text(&self) -> bool {
        self.flags.contains(DiffFlags::FORCE_TEXT)
    }

    /// The form of `line` used when deciding whether two lines are equal
    pub fn normalize_line<'l>(&self, line: &'l str) -> Cow<'l, str> {
        if self.flags.contains(DiffFlags::IGNORE_WHITESPACE) {
            return Cow::Owned(line.chars().filter(|c| !c.is_whitespace()).collect());
        }

        if self.flags.contains(DiffFlags::IGNORE_WHITESPACE_CHANGE) {
            let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
            let leading = line.starts_with(char::is_whitespace) && !collapsed.is_empty();
            return Cow::Owned(match leading {
                true => format!(" {}", collapsed),
                false => collapsed,
            });
        }

        if self.flags.contains(DiffFlags::IGNORE_WHITESPACE_EOL) {
            return Cow::Borrowed(line.trim_end());
        }

        Cow::Borrowed(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn defaults_match_git() {
        let options = DiffOptions::default();

        assert_eq!(options.context_lines, 3);
        assert_eq!(options.interhunk_lines, 0);
        assert!(options.flags.is_empty());
    }

    #[rstest]
    fn flag_bits_match_libgit2() {
        let options = DiffOptions::from_raw((1 << 3) | (1 << 4) | (1 << 20), 3, 0);

        assert!(options.include_untracked());
        assert!(options.recurse_untracked_dirs());
        assert!(options.force_text());
        assert!(!options.reverse());
    }

    #[rstest]
    fn unknown_bits_survive() {
        let options = DiffOptions::from_raw((1 << 30) | 1, 1, 2);

        assert_eq!(options.flags.bits(), (1 << 30) | 1);
        assert!(options.reverse());
    }

    #[rstest]
    #[case(DiffFlags::empty(), "  a  b \n", "  a  b \n")]
    #[case(DiffFlags::IGNORE_WHITESPACE, "  a  b \n", "ab")]
    #[case(DiffFlags::IGNORE_WHITESPACE_CHANGE, "  a  b \n", " a b")]
    #[case(DiffFlags::IGNORE_WHITESPACE_EOL, "  a  b \n", "  a  b")]
    fn normalizes_lines(#[case] flags: DiffFlags, #[case] line: &str, #[case] expected: &str) {
        let options = DiffOptions::default().with_flags(flags);

        assert_eq!(options.normalize_line(line), expected);
    }
}
