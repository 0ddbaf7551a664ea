//! Thread reconstruction over the flat comment list.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::entry::CommentEntry;

/// Children per parent id, siblings in stored order. `None` is the root.
#[must_use]
pub fn group_by_parent(comments: &[CommentEntry]) -> HashMap<Option<&str>, Vec<&CommentEntry>> {
    let mut groups: HashMap<Option<&str>, Vec<&CommentEntry>> = HashMap::new();
    for comment in comments {
        groups
            .entry(comment.parent_id.as_deref())
            .or_default()
            .push(comment);
    }
    groups
}

/// A comment with its nested replies.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadNode {
    #[serde(flatten)]
    pub comment: CommentEntry,
    pub depth: usize,
    pub replies: Vec<ThreadNode>,
}

impl ThreadNode {
    /// Ids in display order: each comment followed by its replies.
    pub fn flatten_ids<'a>(nodes: &'a [ThreadNode], out: &mut Vec<&'a str>) {
        for node in nodes {
            out.push(&node.comment.id);
            Self::flatten_ids(&node.replies, out);
        }
    }
}

/// Deepest nesting level in a rendered thread. Replies below it are listed
/// flat at this level, after the comment they descend from.
pub const MAX_DEPTH: usize = 32;

/// Comments in display order with their rendered depth. Walks with an explicit
/// stack so reply chains of any length are safe.
fn display_order<'a>(
    groups: &HashMap<Option<&'a str>, Vec<&'a CommentEntry>>,
) -> Vec<(&'a CommentEntry, usize)> {
    let mut order = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut pending: Vec<(&CommentEntry, usize)> = groups
        .get(&None)
        .map(|roots| roots.iter().rev().map(|c| (*c, 0)).collect())
        .unwrap_or_default();

    while let Some((comment, depth)) = pending.pop() {
        // A repeated id would otherwise be walked again.
        if !visited.insert(comment.id.as_str()) {
            continue;
        }
        order.push((comment, depth.min(MAX_DEPTH)));
        if let Some(children) = groups.get(&Some(comment.id.as_str())) {
            pending.extend(children.iter().rev().map(|c| (*c, depth + 1)));
        }
    }
    order
}

/// Attach the top open level as replies of the last node one level up.
fn close_level(levels: &mut Vec<Vec<ThreadNode>>) {
    let Some(children) = levels.pop() else {
        return;
    };
    if let Some(parent) = levels.last_mut().and_then(|level| level.last_mut()) {
        parent.replies = children;
    }
}

/// Nested threads starting from top-level comments. Comments whose parent is
/// missing are orphans and are not rendered.
#[must_use]
pub fn render_thread(comments: &[CommentEntry]) -> Vec<ThreadNode> {
    let groups = group_by_parent(comments);

    // levels[d] holds the nodes at depth d under the last node of levels[d - 1].
    let mut levels: Vec<Vec<ThreadNode>> = vec![Vec::new()];
    for (comment, depth) in display_order(&groups) {
        while levels.len() > depth + 1 {
            close_level(&mut levels);
        }
        levels[depth].push(ThreadNode {
            comment: comment.clone(),
            depth,
            replies: Vec::new(),
        });
        levels.push(Vec::new());
    }
    while levels.len() > 1 {
        close_level(&mut levels);
    }
    levels.pop().unwrap_or_default()
}

/// `root_id` plus every transitive reply to it. Ids already collected are
/// never walked again, so self-parented and cyclic entries terminate.
#[must_use]
pub fn thread_closure(comments: &[CommentEntry], root_id: &str) -> HashSet<String> {
    let groups = group_by_parent(comments);
    let mut ids = HashSet::from([root_id.to_string()]);
    let mut pending = vec![root_id];

    while let Some(parent) = pending.pop() {
        for child in groups.get(&Some(parent)).into_iter().flatten() {
            if ids.insert(child.id.clone()) {
                pending.push(child.id.as_str());
            }
        }
    }

    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, parent: Option<&str>) -> CommentEntry {
        CommentEntry {
            id: id.to_string(),
            parent_id: parent.map(str::to_string),
            author_id: None,
            author: "Guest".to_string(),
            author_image: None,
            message: format!("message {id}"),
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            updated_at: None,
            likes: 0,
            liked_by: Vec::new(),
            liked_by_me: false,
        }
    }

    fn chain(len: usize) -> Vec<CommentEntry> {
        let mut comments = vec![entry("0", None)];
        for i in 1..len {
            comments.push(entry(&i.to_string(), Some(&(i - 1).to_string())));
        }
        comments
    }

    fn max_depth(nodes: &[ThreadNode]) -> usize {
        let mut deepest = 0;
        let mut pending: Vec<&ThreadNode> = nodes.iter().collect();
        while let Some(node) = pending.pop() {
            deepest = deepest.max(node.depth);
            pending.extend(node.replies.iter());
        }
        deepest
    }

    fn ids(nodes: &[ThreadNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.comment.id.as_str()).collect()
    }

    #[test]
    fn test_group_by_parent() {
        let comments = vec![entry("1", None), entry("2", Some("1")), entry("3", None)];
        let groups = group_by_parent(&comments);

        let root: Vec<_> = groups[&None].iter().map(|c| c.id.as_str()).collect();
        let under_one: Vec<_> = groups[&Some("1")].iter().map(|c| c.id.as_str()).collect();
        assert_eq!(root, vec!["1", "3"]);
        assert_eq!(under_one, vec!["2"]);
    }

    #[test]
    fn test_render_thread_nesting() {
        let comments = vec![
            entry("1", None),
            entry("2", Some("1")),
            entry("3", None),
            entry("4", Some("2")),
        ];
        let thread = render_thread(&comments);

        assert_eq!(ids(&thread), vec!["1", "3"]);
        assert_eq!(ids(&thread[0].replies), vec!["2"]);
        assert_eq!(thread[0].replies[0].replies[0].depth, 2);

        let mut order = Vec::new();
        ThreadNode::flatten_ids(&thread, &mut order);
        assert_eq!(order, vec!["1", "2", "4", "3"]);
    }

    #[test]
    fn test_render_skips_orphans_and_cycles() {
        let comments = vec![
            entry("a", None),
            entry("orphan", Some("missing")),
            entry("x", Some("y")),
            entry("y", Some("x")),
            entry("a", Some("a")),
        ];
        let thread = render_thread(&comments);
        assert_eq!(ids(&thread), vec!["a"]);
        assert!(thread[0].replies.is_empty());
    }

    #[test]
    fn test_thread_closure() {
        let comments = vec![
            entry("A", None),
            entry("B", Some("A")),
            entry("C", Some("B")),
            entry("D", None),
        ];
        let closure = thread_closure(&comments, "A");
        assert_eq!(closure.len(), 3);
        assert!(["A", "B", "C"].iter().all(|id| closure.contains(*id)));
    }

    #[test]
    fn test_thread_closure_terminates_on_cycles() {
        let comments = vec![entry("x", Some("y")), entry("y", Some("x")), entry("s", Some("s"))];
        assert_eq!(thread_closure(&comments, "x").len(), 2);
        assert_eq!(thread_closure(&comments, "s").len(), 1);
    }

    #[test]
    fn test_thread_closure_deep_chain() {
        let comments = chain(500);
        assert_eq!(thread_closure(&comments, "0").len(), 500);
        assert_eq!(thread_closure(&comments, "499").len(), 1);
    }

    #[test]
    fn test_render_caps_nesting_depth() {
        let comments = chain(MAX_DEPTH + 5);
        let thread = render_thread(&comments);
        assert_eq!(max_depth(&thread), MAX_DEPTH);

        let mut cap_parent = &thread[0];
        for _ in 1..MAX_DEPTH {
            cap_parent = &cap_parent.replies[0];
        }
        // Everything below the cap sits flat under the last nested comment.
        assert_eq!(cap_parent.depth, MAX_DEPTH - 1);
        assert_eq!(cap_parent.replies.len(), 5);
        assert!(cap_parent.replies.iter().all(|n| n.depth == MAX_DEPTH && n.replies.is_empty()));

        let mut order = Vec::new();
        ThreadNode::flatten_ids(&thread, &mut order);
        let expected: Vec<String> = (0..MAX_DEPTH + 5).map(|i| i.to_string()).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_render_keeps_sibling_order_below_cap() {
        let mut comments = chain(MAX_DEPTH + 1);
        let last = MAX_DEPTH.to_string();
        comments.push(entry("late", Some(&(MAX_DEPTH - 1).to_string())));
        comments.push(entry("deep", Some(&last)));

        let mut order = Vec::new();
        let thread = render_thread(&comments);
        ThreadNode::flatten_ids(&thread, &mut order);
        let tail: Vec<&str> = order[order.len() - 3..].to_vec();
        assert_eq!(tail, vec![last.as_str(), "deep", "late"]);
    }
}
