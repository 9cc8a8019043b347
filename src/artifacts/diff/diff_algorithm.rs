//! Line diffing
//!
//! `similar`'s linear-space Myers finds a shortest edit script between two
//! sequences; the script is then cut into hunks surrounded by context lines
//! the way `git diff` does.

use derive_new::new;
use similar::{Algorithm, DiffOp, DiffTag};
use std::hash::Hash;

/// One step of an edit script, by position in the old (`a`) and new (`b`) input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Delete { old: usize },
    Insert { new: usize },
    Equal { old: usize, new: usize },
}

impl Edit {
    pub fn is_change(&self) -> bool {
        !matches!(self, Edit::Equal { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct MyersDiff<'d, T> {
    a: &'d [T],
    b: &'d [T],
}

impl<T: Eq + Hash + Ord> MyersDiff<'_, T> {
    /// Edit script in input order; deletions come before insertions within a change
    pub fn diff(&self) -> Vec<Edit> {
        let mut edits = Vec::with_capacity(self.a.len().max(self.b.len()));

        for op in similar::capture_diff_slices(Algorithm::Myers, self.a, self.b) {
            push_edits(&mut edits, &op);
        }

        edits
    }
}

fn push_edits(edits: &mut Vec<Edit>, op: &DiffOp) {
    let (tag, old, new) = op.as_tag_tuple();

    match tag {
        DiffTag::Equal => edits.extend(old.zip(new).map(|(old, new)| Edit::Equal { old, new })),
        DiffTag::Delete => edits.extend(old.map(|old| Edit::Delete { old })),
        DiffTag::Insert => edits.extend(new.map(|new| Edit::Insert { new })),
        DiffTag::Replace => {
            edits.extend(old.map(|old| Edit::Delete { old }));
            edits.extend(new.map(|new| Edit::Insert { new }));
        }
    }
}

/// A window of an edit script, with its unified-diff coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkRange {
    /// Edits `[start, end)` of the script
    pub start: usize,
    pub end: usize,
    pub old_start: usize,
    pub old_lines: usize,
    pub new_start: usize,
    pub new_lines: usize,
}

/// Group the changes of `edits` into hunks
///
/// Two changes share a hunk when at most `2 * context + interhunk` unchanged
/// lines separate them.
pub fn hunks(edits: &[Edit], context: usize, interhunk: usize) -> Vec<HunkRange> {
    let max_gap = 2 * context + interhunk;
    let changes = edits
        .iter()
        .enumerate()
        .filter(|(_, edit)| edit.is_change())
        .map(|(position, _)| position)
        .collect::<Vec<_>>();

    let mut groups: Vec<(usize, usize)> = Vec::new();
    for position in changes {
        match groups.last_mut() {
            Some((_, last)) if position - *last - 1 <= max_gap => *last = position,
            _ => groups.push((position, position)),
        }
    }

    // old/new line counts before each edit
    let mut before = Vec::with_capacity(edits.len() + 1);
    let (mut old_pos, mut new_pos) = (0, 0);
    for edit in edits {
        before.push((old_pos, new_pos));
        match edit {
            Edit::Delete { .. } => old_pos += 1,
            Edit::Insert { .. } => new_pos += 1,
            Edit::Equal { .. } => {
                old_pos += 1;
                new_pos += 1;
            }
        }
    }
    before.push((old_pos, new_pos));

    groups
        .into_iter()
        .map(|(first, last)| {
            let start = first.saturating_sub(context);
            let end = (last + 1 + context).min(edits.len());
            let (old_from, new_from) = before[start];
            let (old_to, new_to) = before[end];
            let (old_lines, new_lines) = (old_to - old_from, new_to - new_from);

            HunkRange {
                start,
                end,
                old_start: if old_lines == 0 { old_from } else { old_from + 1 },
                old_lines,
                new_start: if new_lines == 0 { new_from } else { new_from + 1 },
                new_lines,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn string_inputs() -> (Vec<char>, Vec<char>) {
        ("abcabba".chars().collect(), "cbabac".chars().collect())
    }

    fn render<T: Copy>(edits: &[Edit], a: &[T], b: &[T]) -> Vec<(char, T)> {
        edits
            .iter()
            .map(|edit| match *edit {
                Edit::Delete { old } => ('-', a[old]),
                Edit::Insert { new } => ('+', b[new]),
                Edit::Equal { old, .. } => (' ', a[old]),
            })
            .collect()
    }

    #[rstest]
    fn finds_the_classic_shortest_script(string_inputs: (Vec<char>, Vec<char>)) {
        let (a, b) = string_inputs;
        let edits = MyersDiff::new(&a, &b).diff();

        assert_eq!(edits.iter().filter(|e| e.is_change()).count(), 5);
        let rebuilt_a = render(&edits, &a, &b)
            .into_iter()
            .filter(|(op, _)| *op != '+')
            .map(|(_, c)| c)
            .collect::<String>();
        let rebuilt_b = render(&edits, &a, &b)
            .into_iter()
            .filter(|(op, _)| *op != '-')
            .map(|(_, c)| c)
            .collect::<String>();
        assert_eq!(rebuilt_a, "abcabba");
        assert_eq!(rebuilt_b, "cbabac");
    }

    #[rstest]
    fn diffs_lines() {
        let a = vec!["line1", "line2", "line3", "line4"];
        let b = vec!["line2", "line3_modified", "line4", "line5"];
        let edits = MyersDiff::new(&a, &b).diff();

        assert_eq!(
            render(&edits, &a, &b),
            vec![
                ('-', "line1"),
                (' ', "line2"),
                ('-', "line3"),
                ('+', "line3_modified"),
                (' ', "line4"),
                ('+', "line5"),
            ]
        );
    }

    #[rstest]
    #[case(vec![], vec![], 0)]
    #[case(vec![], vec!["x"], 1)]
    #[case(vec!["x"], vec![], 1)]
    fn handles_empty_inputs(#[case] a: Vec<&str>, #[case] b: Vec<&str>, #[case] len: usize) {
        assert_eq!(MyersDiff::new(&a, &b).diff().len(), len);
    }

    fn lines(count: usize) -> Vec<String> {
        (1..=count).map(|i| format!("line{i}")).collect()
    }

    #[rstest]
    #[case(3, 0, 2)]
    #[case(4, 0, 1)]
    #[case(3, 2, 1)]
    #[case(0, 0, 2)]
    fn context_and_interhunk_decide_merging(
        #[case] context: usize,
        #[case] interhunk: usize,
        #[case] expected: usize,
    ) {
        // changes on lines 2 and 10: seven unchanged lines between them
        let a = lines(12);
        let mut b = a.clone();
        b[1] = "changed".into();
        b[9] = "changed".into();
        let edits = MyersDiff::new(&a, &b).diff();

        assert_eq!(hunks(&edits, context, interhunk).len(), expected);
    }

    #[rstest]
    fn hunk_coordinates_follow_git() {
        let a = lines(10);
        let mut b = a.clone();
        b[4] = "changed".into();
        let edits = MyersDiff::new(&a, &b).diff();

        let ranges = hunks(&edits, 3, 0);
        assert_eq!(ranges.len(), 1);
        let hunk = &ranges[0];
        assert_eq!((hunk.old_start, hunk.old_lines), (2, 7));
        assert_eq!((hunk.new_start, hunk.new_lines), (2, 7));
    }

    #[rstest]
    fn empty_side_starts_at_zero() {
        let a: Vec<String> = Vec::new();
        let b = lines(2);
        let edits = MyersDiff::new(&a, &b).diff();

        let hunk = &hunks(&edits, 3, 0)[0];
        assert_eq!((hunk.old_start, hunk.old_lines), (0, 0));
        assert_eq!((hunk.new_start, hunk.new_lines), (1, 2));
    }

    #[rstest]
    fn rewriting_a_large_input_stays_linear() {
        let a = lines(5000);
        let b = (1..=5000).map(|i| format!("other{i}")).collect::<Vec<_>>();
        let edits = MyersDiff::new(&a, &b).diff();

        assert_eq!(edits.len(), 10000);
        assert!(edits.iter().all(Edit::is_change));
        assert!(edits[..5000].iter().all(|edit| matches!(edit, Edit::Delete { .. })));

        let ranges = hunks(&edits, 3, 0);
        assert_eq!(ranges.len(), 1);
        assert_eq!((ranges[0].old_start, ranges[0].old_lines), (1, 5000));
        assert_eq!((ranges[0].new_start, ranges[0].new_lines), (1, 5000));
    }

    #[rstest]
    fn single_edit_in_a_large_input_is_one_small_hunk() {
        let a = lines(5000);
        let mut b = a.clone();
        b[2500] = "changed".into();
        let edits = MyersDiff::new(&a, &b).diff();

        assert_eq!(edits.iter().filter(|edit| edit.is_change()).count(), 2);
        let ranges = hunks(&edits, 3, 0);
        assert_eq!(ranges.len(), 1);
        assert_eq!((ranges[0].old_start, ranges[0].old_lines), (2498, 7));
    }
}
