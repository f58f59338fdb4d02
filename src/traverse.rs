//! Depth-first traversal with in-place structural edits.
//!
//! [`traverse`] walks every mapping node pre-order and hands each key/value
//! pair to a callback. The callback answers with a [`Visit`], which may
//! record the node as a [`TraversalEntry`], rewrite its value, rename its
//! key, delete it, or end the walk.
//!
//! Keys of a mapping are snapshotted before its children are visited, so
//! removing or renaming the current key never disturbs the siblings still
//! to come.
//!
//! # Example
//!
//! ```
//! use koru_tree::traverse::{traverse, Visit};
//! use koru_tree::{Mapping, Node};
//!
//! let mut root = Mapping::new();
//! root.insert("tmp".to_string(), Node::from(1));
//! root.insert("keep".to_string(), Node::from(2));
//!
//! let entries = traverse(&mut root, |key, _, _| {
//!     if key == "tmp" { Visit::remove() } else { Visit::include() }
//! });
//!
//! assert_eq!(entries.len(), 1);
//! assert!(!root.contains_key("tmp"));
//! ```
use crate::types::{Mapping, Node, TraversalEntry};
use tracing::{debug, trace};

/// Structural edit requested for the visited node.
#[derive(Debug, Clone, PartialEq)]
pub enum VisitAction {
    /// Leave the node as it is.
    Keep,
    /// Delete the key from its parent. Nothing is recorded and the removed
    /// value is not descended into.
    Remove,
    /// Replace the value in place.
    Rewrite(Node),
    /// Move the value to another key, unless that key is taken.
    Rename(String),
}

/// A traversal callback's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    include: bool,
    action: VisitAction,
    stop: bool,
}

impl Visit {
    /// Do nothing, but keep descending.
    pub fn skip() -> Self {
        Self {
            include: false,
            action: VisitAction::Keep,
            stop: false,
        }
    }

    /// Record the node.
    pub fn include() -> Self {
        Self {
            include: true,
            ..Self::skip()
        }
    }

    /// Delete the node.
    pub fn remove() -> Self {
        Self {
            include: false,
            action: VisitAction::Remove,
            stop: false,
        }
    }

    /// Replace the node's value and record it.
    pub fn rewrite(value: impl Into<Node>) -> Self {
        Self {
            include: true,
            action: VisitAction::Rewrite(value.into()),
            stop: false,
        }
    }

    /// Rename the node's key and record it.
    pub fn rename(key: impl Into<String>) -> Self {
        Self {
            include: true,
            action: VisitAction::Rename(key.into()),
            stop: false,
        }
    }

    /// Record the node and end the walk.
    pub fn stop() -> Self {
        Self::include().and_stop()
    }

    /// End the walk after this node.
    pub fn and_stop(mut self) -> Self {
        self.stop = true;
        self
    }

    /// Whether the node is recorded as an entry.
    pub fn includes(&self) -> bool {
        self.include
    }

    /// The edit applied to the node.
    pub fn action(&self) -> &VisitAction {
        &self.action
    }

    /// Whether the walk ends after this node.
    pub fn stops(&self) -> bool {
        self.stop
    }
}

impl From<bool> for Visit {
    fn from(include: bool) -> Self {
        if include { Visit::include() } else { Visit::skip() }
    }
}

struct Walker {
    path: Vec<String>,
    entries: Vec<TraversalEntry>,
    stopped: bool,
}

impl Walker {
    fn walk<F>(&mut self, node: &mut Mapping, callback: &mut F)
    where
        F: FnMut(&str, &Node, &[String]) -> Visit,
    {
        let keys: Vec<String> = node.keys().cloned().collect();
        for key in keys {
            if self.stopped {
                return;
            }
            let Some(value) = node.get(&key) else {
                continue;
            };

            self.path.push(key.clone());
            let visit = callback(&key, value, &self.path);

            let mut current = key;
            match visit.action {
                VisitAction::Keep => {}
                VisitAction::Remove => {
                    node.shift_remove(&current);
                    self.path.pop();
                    if visit.stop {
                        trace!(key = %current, "traversal stopped after remove");
                        self.stopped = true;
                        return;
                    }
                    continue;
                }
                VisitAction::Rewrite(value) => {
                    node.insert(current.clone(), value);
                }
                VisitAction::Rename(to) => {
                    if to.is_empty() || node.contains_key(&to) {
                        debug!(from = %current, to = %to, "rename skipped");
                    } else if let Some(value) = node.shift_remove(&current) {
                        node.insert(to.clone(), value);
                        if let Some(last) = self.path.last_mut() {
                            last.clone_from(&to);
                        }
                        current = to;
                    }
                }
            }

            if visit.include {
                if let Some(value) = node.get(&current) {
                    self.entries.push(TraversalEntry {
                        key: current.clone(),
                        value: value.clone(),
                        path: self.path.join(" "),
                    });
                }
            }
            if visit.stop {
                trace!(path = %self.path.join(" "), "traversal stopped");
                self.stopped = true;
                return;
            }

            if let Some(Node::Mapping(child)) = node.get_mut(&current) {
                self.walk(child, callback);
            }
            self.path.pop();
        }
    }
}

/// Walk `root` depth-first, applying the callback's edits as it goes.
///
/// The callback receives the key, its current value and the path stack
/// from the root down to the key. Returns the recorded entries in visit
/// order.
pub fn traverse<F>(root: &mut Mapping, mut callback: F) -> Vec<TraversalEntry>
where
    F: FnMut(&str, &Node, &[String]) -> Visit,
{
    let mut walker = Walker {
        path: Vec::new(),
        entries: Vec::new(),
        stopped: false,
    };
    walker.walk(root, &mut callback);
    walker.entries
}

/// Read-only walk: records every node the predicate accepts.
pub fn collect<F>(root: &Mapping, mut predicate: F) -> Vec<TraversalEntry>
where
    F: FnMut(&str, &Node, &[String]) -> bool,
{
    fn walk<F>(node: &Mapping, path: &mut Vec<String>, out: &mut Vec<TraversalEntry>, f: &mut F)
    where
        F: FnMut(&str, &Node, &[String]) -> bool,
    {
        for (key, value) in node {
            path.push(key.clone());
            if f(key, value, path) {
                out.push(TraversalEntry {
                    key: key.clone(),
                    value: value.clone(),
                    path: path.join(" "),
                });
            }
            if let Node::Mapping(child) = value {
                walk(child, path, out, f);
            }
            path.pop();
        }
    }

    let mut entries = Vec::new();
    walk(root, &mut Vec::new(), &mut entries, &mut predicate);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> Mapping {
        match Node::from_json(&value) {
            Node::Mapping(map) => map,
            Node::Leaf(_) => panic!("expected a mapping"),
        }
    }

    #[test]
    fn test_include_all_preorder() {
        let mut root = tree(json!({"a": {"b": 1, "c": {"d": 2}}, "e": 3}));
        let entries = traverse(&mut root, |_, _, _| Visit::include());
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a", "a b", "a c", "a c d", "e"]);
    }

    #[test]
    fn test_skip_still_descends() {
        let mut root = tree(json!({"a": {"b": {"c": 1}}}));
        let entries = traverse(&mut root, |key, _, _| (key == "c").into());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "a b c");
    }

    #[test]
    fn test_leaves_are_not_descended() {
        let mut root = tree(json!({"list": [{"x": 1}], "n": 1}));
        let entries = traverse(&mut root, |_, _, _| Visit::include());
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_remove_keeps_sibling_iteration_intact() {
        let mut root = tree(json!({"a": 1, "b": {"x": 1}, "c": 3, "d": 4}));
        let mut seen = Vec::new();
        let entries = traverse(&mut root, |key, _, _| {
            seen.push(key.to_string());
            if key == "b" || key == "c" { Visit::remove() } else { Visit::include() }
        });
        assert_eq!(seen, vec!["a", "b", "c", "d"]);
        assert_eq!(entries.len(), 2);
        assert_eq!(root.keys().collect::<Vec<_>>(), vec!["a", "d"]);
    }

    #[test]
    fn test_rewrite_records_new_value_and_descends() {
        let mut root = tree(json!({"a": 1}));
        let entries = traverse(&mut root, |key, _, _| {
            if key == "a" {
                Visit::rewrite(Node::from_json(&json!({"inner": true})))
            } else {
                Visit::include()
            }
        });
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].value, Node::from_json(&json!({"inner": true})));
        assert_eq!(entries[1].path, "a inner");
    }

    #[test]
    fn test_rename_and_conflict() {
        let mut root = tree(json!({"old": {"x": 1}, "taken": 2, "other": 3}));
        let entries = traverse(&mut root, |key, _, _| match key {
            "old" => Visit::rename("new"),
            "other" => Visit::rename("taken"),
            _ => Visit::skip(),
        });

        assert!(root.contains_key("new"));
        assert!(!root.contains_key("old"));
        assert!(root.contains_key("other"));
        assert_eq!(root["taken"], Node::from(2));

        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["new", "other"]);
    }

    #[test]
    fn test_stop_on_second_entry() {
        let mut root = tree(json!({"a": {"b": 1, "c": 2}, "d": {"e": 3}}));
        let mut count = 0;
        let entries = traverse(&mut root, |_, _, _| {
            count += 1;
            if count == 2 { Visit::stop() } else { Visit::include() }
        });
        assert_eq!(entries.len(), 2);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_collect_is_read_only() {
        let root = tree(json!({"a": {"b": 1}, "b": 2}));
        let entries = collect(&root, |key, _, _| key == "b");
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a b", "b"]);
    }

    #[test]
    fn test_visit_accessors() {
        let visit = Visit::remove().and_stop();
        assert!(!visit.includes());
        assert_eq!(visit.action(), &VisitAction::Remove);
        assert!(visit.stops());

        let visit = Visit::from(true);
        assert!(visit.includes());
        assert_eq!(visit.action(), &VisitAction::Keep);
        assert!(!visit.stops());
    }
}
