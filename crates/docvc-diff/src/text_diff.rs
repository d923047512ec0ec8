//! Line-level diff of string values.
//!
//! Long string fields (notes, narrative sections) are compared line by line
//! with the `similar` crate (Myers diff) so a comparison can show hunks with
//! context instead of two whole strings.

use serde::Serialize;
use similar::ChangeTag;

/// Context lines kept around each change.
const CONTEXT_LINES: usize = 3;

/// The result of diffing two strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TextDiff {
    pub hunks: Vec<DiffHunk>,
    /// Line count of the old string.
    pub old_lines: usize,
    /// Line count of the new string.
    pub new_lines: usize,
}

impl TextDiff {
    /// Returns `true` if the two strings are identical.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Total number of lines added across all hunks.
    pub fn additions(&self) -> usize {
        self.count(|l| matches!(l, DiffLine::Added(_)))
    }

    /// Total number of lines removed across all hunks.
    pub fn deletions(&self) -> usize {
        self.count(|l| matches!(l, DiffLine::Removed(_)))
    }

    fn count(&self, pred: impl Fn(&DiffLine) -> bool) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| pred(l))
            .count()
    }
}

/// A contiguous region of changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiffHunk {
    /// First old line covered (1-based).
    pub old_start: usize,
    pub old_count: usize,
    /// First new line covered (1-based).
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

/// A single line in a hunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "text", rename_all = "lowercase")]
pub enum DiffLine {
    Context(String),
    Added(String),
    Removed(String),
}

/// Compute a line-by-line diff between two strings.
pub fn diff_text(old: &str, new: &str) -> TextDiff {
    let old_lines = old.lines().count();
    let new_lines = new.lines().count();

    if old == new {
        return TextDiff {
            hunks: Vec::new(),
            old_lines,
            new_lines,
        };
    }

    let lines_diff = similar::TextDiff::from_lines(old, new);
    let mut hunks = Vec::new();

    for group in lines_diff.grouped_ops(CONTEXT_LINES) {
        let Some(first) = group.first() else {
            continue;
        };
        let mut hunk = DiffHunk {
            old_start: first.old_range().start + 1,
            old_count: 0,
            new_start: first.new_range().start + 1,
            new_count: 0,
            lines: Vec::new(),
        };

        for op in &group {
            for change in lines_diff.iter_changes(op) {
                let text = change.value().trim_end_matches('\n').to_string();
                match change.tag() {
                    ChangeTag::Equal => {
                        hunk.lines.push(DiffLine::Context(text));
                        hunk.old_count += 1;
                        hunk.new_count += 1;
                    }
                    ChangeTag::Delete => {
                        hunk.lines.push(DiffLine::Removed(text));
                        hunk.old_count += 1;
                    }
                    ChangeTag::Insert => {
                        hunk.lines.push(DiffLine::Added(text));
                        hunk.new_count += 1;
                    }
                }
            }
        }

        hunks.push(hunk);
    }

    TextDiff {
        hunks,
        old_lines,
        new_lines,
    }
}
