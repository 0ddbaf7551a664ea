//! Line diffs between two revisions of a post.

use serde::Serialize;
use similar::{ChangeTag, TextDiff};

use crate::content::parse_blocks;
use crate::db::PostRevision;

/// A single line in a diff with its change type.
#[derive(Debug, Clone, Serialize)]
pub struct DiffLine {
    pub content: String,
    pub change: ChangeType,
    /// Line number in the older revision (None for added lines).
    pub old_line: Option<usize>,
    /// Line number in the newer revision (None for removed lines).
    pub new_line: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Unchanged,
}

/// Comparison of two revisions.
#[derive(Debug, Clone, Serialize)]
pub struct RevisionDiff {
    pub from_revision: i64,
    pub to_revision: i64,
    /// Names of the scalar fields (title, excerpt, SEO meta) that differ.
    pub changed_fields: Vec<&'static str>,
    pub lines: Vec<DiffLine>,
    pub additions: usize,
    pub deletions: usize,
}

impl RevisionDiff {
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.changed_fields.is_empty() && self.additions == 0 && self.deletions == 0
    }
}

/// One line per block for block content, so a diff reads paragraph by
/// paragraph instead of as a single JSON line.
fn diffable_text(content: &str) -> String {
    match parse_blocks(content) {
        Some(blocks) => blocks
            .iter()
            .map(|block| match &block.text {
                Some(text) => text.clone(),
                None => format!("[{}]", block.kind),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        None => content.to_string(),
    }
}

/// Compare two content bodies line by line.
#[must_use]
pub fn diff_lines(old_text: &str, new_text: &str) -> (Vec<DiffLine>, usize, usize) {
    let diff = TextDiff::from_lines(old_text, new_text);

    let mut lines = Vec::new();
    let mut additions = 0;
    let mut deletions = 0;
    let mut old_line = 1usize;
    let mut new_line = 1usize;

    for change in diff.iter_all_changes() {
        let (kind, old_num, new_num) = match change.tag() {
            ChangeTag::Delete => {
                deletions += 1;
                old_line += 1;
                (ChangeType::Removed, Some(old_line - 1), None)
            }
            ChangeTag::Insert => {
                additions += 1;
                new_line += 1;
                (ChangeType::Added, None, Some(new_line - 1))
            }
            ChangeTag::Equal => {
                old_line += 1;
                new_line += 1;
                (ChangeType::Unchanged, Some(old_line - 1), Some(new_line - 1))
            }
        };

        lines.push(DiffLine {
            content: change.to_string_lossy().trim_end_matches('\n').to_string(),
            change: kind,
            old_line: old_num,
            new_line: new_num,
        });
    }

    (lines, additions, deletions)
}

/// Diff `older` against `newer`.
#[must_use]
pub fn diff_revisions(older: &PostRevision, newer: &PostRevision) -> RevisionDiff {
    let mut changed_fields = Vec::new();
    if older.title != newer.title {
        changed_fields.push("title");
    }
    if older.excerpt != newer.excerpt {
        changed_fields.push("excerpt");
    }
    if older.meta_title != newer.meta_title {
        changed_fields.push("meta_title");
    }
    if older.meta_desc != newer.meta_desc {
        changed_fields.push("meta_desc");
    }

    let (lines, additions, deletions) = diff_lines(
        &diffable_text(&older.content),
        &diffable_text(&newer.content),
    );

    RevisionDiff {
        from_revision: older.revision,
        to_revision: newer.revision,
        changed_fields,
        lines,
        additions,
        deletions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revision(n: i64, title: &str, content: &str) -> PostRevision {
        PostRevision {
            id: n,
            post_id: 1,
            revision: n,
            title: title.to_string(),
            excerpt: String::new(),
            content: content.to_string(),
            meta_title: None,
            meta_desc: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_identical_revisions() {
        let a = revision(1, "T", "Hello\nWorld");
        let diff = diff_revisions(&a, &a);
        assert!(diff.is_identical());
        assert_eq!(diff.lines.len(), 2);
    }

    #[test]
    fn test_added_line() {
        let (lines, additions, deletions) = diff_lines("Line 1\nLine 2\n", "Line 1\nLine 2\nLine 3\n");
        assert_eq!((additions, deletions), (1, 0));
        assert!(lines
            .iter()
            .any(|l| l.change == ChangeType::Added && l.content == "Line 3" && l.new_line == Some(3)));
    }

    #[test]
    fn test_block_content_diffs_per_block() {
        let old = revision(1, "Coast", r#"[{"type":"paragraph","text":"Fog"},{"type":"media"}]"#);
        let new = revision(2, "Coastal", r#"[{"type":"paragraph","text":"Fog"},{"type":"paragraph","text":"Sun"}]"#);
        let diff = diff_revisions(&old, &new);

        assert_eq!(diff.changed_fields, vec!["title"]);
        assert_eq!(diff.additions, 1);
        assert_eq!(diff.deletions, 1);
        assert!(diff.lines.iter().any(|l| l.change == ChangeType::Removed && l.content == "[media]"));
        assert_eq!(diff.lines[0].change, ChangeType::Unchanged);
    }
}
