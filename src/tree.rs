//! The path tree.
//!
//! [`PathTree`] owns a root [`Mapping`] and exposes the path-addressed
//! operations of the crate behind one handle: fill-absent `add`, overwriting
//! `set`, renames, removals, typed reads and the search/list queries. Writes
//! made through [`set`](PathTree::set) and [`set_all`](PathTree::set_all)
//! notify the tree's listeners.
//!
//! # Example
//!
//! ```
//! use koru_tree::{Node, PathTree};
//!
//! let mut tree = PathTree::with_value("config theme", "dark");
//! tree.add("config font size", 12);
//!
//! assert_eq!(tree.get_string("config theme"), "dark");
//! assert_eq!(tree.get_number("config font size", None), Some(12));
//! assert_eq!(tree.keys("config"), vec!["theme", "font"]);
//!
//! // add never overwrites, set does
//! tree.add("config theme", "light");
//! assert_eq!(tree.get_string("config theme"), "dark");
//! tree.set("config theme", "light");
//! assert_eq!(tree.get_string("config theme"), "light");
//! ```
use crate::coerce;
use crate::config::TreeConfig;
use crate::error::{TreeError, TreeResult};
use crate::path::{self, Command};
use crate::strings;
use crate::subscriptions::{ListenerHandle, ListenerRegistry};
use crate::traverse::{self, Visit};
use crate::types::{Mapping, Node, TraversalEntry};
use crate::words::Words;
use serde_json::Value as JsonValue;
use std::rc::Rc;
use tracing::debug;

/// A hierarchical, path-addressable key/value store.
///
/// Not thread-safe: listeners hold `Rc` callbacks and the tree is meant to
/// be driven from one thread. Cloning a tree copies its data and shares its
/// listener registry.
#[derive(Debug, Clone, Default)]
pub struct PathTree {
    root: Mapping,
    config: TreeConfig,
    listeners: Option<Rc<ListenerRegistry>>,
}

impl PathTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree seeded with one value.
    pub fn with_value(path: &str, value: impl Into<Node>) -> Self {
        let mut tree = Self::new();
        tree.add(path, value);
        tree
    }

    /// Create an empty tree with a custom configuration.
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Wrap an existing mapping.
    pub fn from_mapping(root: Mapping) -> Self {
        Self {
            root,
            ..Self::default()
        }
    }

    /// Build a tree from a JSON document whose root is an object.
    pub fn from_json(value: &JsonValue) -> TreeResult<Self> {
        match Node::from_json(value) {
            Node::Mapping(root) => Ok(Self::from_mapping(root)),
            other => Err(TreeError::NotAMapping {
                kind: other.kind().to_string(),
            }),
        }
    }

    /// Parse a JSON string into a tree.
    pub fn from_json_str(json: &str) -> TreeResult<Self> {
        let value: JsonValue = serde_json::from_str(json)?;
        Self::from_json(&value)
    }

    /// Render the tree as JSON.
    pub fn to_json(&self) -> TreeResult<JsonValue> {
        Node::Mapping(self.root.clone()).to_json()
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// The whole root mapping.
    pub fn root(&self) -> &Mapping {
        &self.root
    }

    pub fn into_root(self) -> Mapping {
        self.root
    }

    /// Whether the tree has no keys at all.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// An independent copy of the data (listeners are not copied).
    pub fn copy(&self) -> Mapping {
        path::copy(&self.root)
    }

    /// Tokenize `text` with the configured word delimiter.
    pub fn words(&self, text: &str) -> Words {
        Words::with_delimiter(text, self.config.word_delimiter)
    }

    /// Walk the tree, applying the callback's edits. See
    /// [`traverse`](crate::traverse::traverse).
    pub fn traverse<F>(&mut self, callback: F) -> Vec<TraversalEntry>
    where
        F: FnMut(&str, &Node, &[String]) -> Visit,
    {
        traverse::traverse(&mut self.root, callback)
    }

    /// Fill-absent write: creates intermediate mappings, never overwrites an
    /// existing leaf, merges mappings key by key. Returns whether anything
    /// was written.
    pub fn add(&mut self, path: &str, value: impl Into<Node>) -> bool {
        path::add(&mut self.root, path, value.into())
    }

    /// Merge a whole mapping into the root with fill-absent semantics.
    pub fn add_mapping(&mut self, source: &Mapping) -> &mut Self {
        path::append(&mut self.root, source);
        self
    }

    /// Merge a whole mapping into the root, overwriting on conflict. Does
    /// not notify listeners.
    pub fn extend_mapping(&mut self, source: &Mapping) -> &mut Self {
        path::extend(&mut self.root, source);
        self
    }

    /// Whether the node at `path` is a mapping without keys.
    pub fn is_empty_at(&self, path: &str) -> bool {
        self.get(path).is_some_and(path::empty)
    }

    /// Read the node at `path`.
    pub fn get(&self, path: &str) -> Option<&Node> {
        path::get(&self.root, path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut Node> {
        path::get_mut(&mut self.root, path)
    }

    /// Look up `path` and apply `command` to it. See
    /// [`path::get_with`](crate::path::get_with).
    pub fn get_with(&mut self, path: &str, command: &Command) -> Option<Node> {
        path::get_with(&mut self.root, path, command)
    }

    /// The value at `path` as an integer, falling back to `replacement`.
    /// `None` means neither could be coerced.
    pub fn get_number(&self, path: &str, replacement: Option<&Node>) -> Option<i64> {
        coerce::force_number(self.get(path), replacement, self.config.parse_int_base)
    }

    /// The value at `path` as a string, `""` if it is not a string or
    /// number.
    pub fn get_string(&self, path: &str) -> String {
        coerce::force_string(self.get(path), None)
    }

    /// The array at `path`, empty if there is none.
    pub fn get_array(&self, path: &str) -> Vec<Node> {
        coerce::force_array(self.get(path), None)
    }

    /// A copy of the mapping at `path`, empty if there is none.
    pub fn get_object(&self, path: &str) -> Mapping {
        coerce::force_object(self.get(path), None)
    }

    /// Keys of the mapping at `path`.
    pub fn keys(&self, path: &str) -> Vec<String> {
        path::keys(&self.root, path)
    }

    /// Values of the mapping at `path`.
    pub fn values(&self, path: &str) -> Vec<Node> {
        path::values(&self.root, path)
    }

    /// Overwrite (or create) the value at `path` and notify listeners.
    ///
    /// Listeners of the exact path are notified with the new value. When
    /// the value is a mapping, every path inside it is notified as well,
    /// each with the whole written mapping as data.
    pub fn set(&mut self, path: &str, value: impl Into<Node>) -> Option<Node> {
        let path = path::normalize(path);
        let stored = path::set(&mut self.root, &path, value.into())?.clone();
        self.notify_written(&path, &stored);
        Some(stored)
    }

    /// Notify `path` and, for a mapping value, every path inside it. Each
    /// notification carries the whole written value.
    fn notify_written(&self, path: &str, value: &Node) {
        self.trigger_listener(path, value.clone());
        if let Node::Mapping(written) = value {
            for entry in traverse::collect(written, |_, _, _| true) {
                self.trigger_listener(&format!("{path} {}", entry.path), value.clone());
            }
        }
    }

    /// Overwrite every node whose key is `key` and notify listeners of each
    /// rewritten path the way [`set`](Self::set) does. Returns how many nodes
    /// were rewritten.
    pub fn set_all(&mut self, key: &str, value: impl Into<Node>) -> usize {
        let key = strings::trim(key);
        if key.is_empty() {
            return 0;
        }
        let value = value.into();
        let mut rewritten: Vec<Vec<String>> = Vec::new();
        let entries = traverse::traverse(&mut self.root, |k, _, stack| {
            // Nodes inside a value written by this pass are left alone.
            if rewritten
                .iter()
                .any(|done| stack.len() > done.len() && stack.starts_with(done))
            {
                return Visit::skip();
            }
            if k == key {
                rewritten.push(stack.to_vec());
                Visit::rewrite(value.clone())
            } else {
                Visit::skip()
            }
        });

        for entry in &entries {
            self.notify_written(&entry.path, &value);
        }
        entries.len()
    }

    /// Rename the key at `path`. Skipped if `name` is already taken.
    /// Returns the value at the resulting key.
    pub fn set_key(&mut self, path: &str, name: &str) -> Option<Node> {
        path::get_with(&mut self.root, path, &Command::rename(name))
    }

    /// Rename every key equal to `key`. Returns how many were visited.
    pub fn set_all_keys(&mut self, key: &str, name: &str) -> usize {
        let key = strings::trim(key);
        if key.is_empty() {
            return 0;
        }
        traverse::traverse(&mut self.root, |k, _, _| {
            if k == key { Visit::rename(name) } else { Visit::skip() }
        })
        .len()
    }

    /// Delete the node at `path`, returning it.
    pub fn remove(&mut self, path: &str) -> Option<Node> {
        path::get_with(&mut self.root, path, &Command::remove())
    }

    /// Delete every node whose key is `key`. Returns how many were removed.
    pub fn remove_all(&mut self, key: &str) -> usize {
        let key = strings::trim(key);
        if key.is_empty() {
            return 0;
        }
        let mut removed = 0;
        traverse::traverse(&mut self.root, |k, _, _| {
            if k == key {
                removed += 1;
                Visit::remove()
            } else {
                Visit::skip()
            }
        });
        removed
    }

    /// Every node whose own key is `key`; every node when `key` is empty.
    pub fn search(&self, key: &str) -> Vec<TraversalEntry> {
        let key = strings::trim(key);
        if key.is_empty() {
            return traverse::collect(&self.root, |_, _, _| true);
        }
        traverse::collect(&self.root, |k, _, _| k == key)
    }

    /// Alias of [`search`](Self::search).
    pub fn find(&self, key: &str) -> Vec<TraversalEntry> {
        self.search(key)
    }

    /// Every node whose path starts, token by token, with `prefix`. An
    /// empty prefix matches nothing.
    pub fn list(&self, prefix: &str) -> Vec<TraversalEntry> {
        let prefix = Words::new(prefix);
        if prefix.is_empty() {
            return Vec::new();
        }
        traverse::collect(&self.root, |_, _, stack| {
            stack.starts_with(prefix.as_slice())
        })
    }

    /// Alias of [`list`](Self::list).
    pub fn ls(&self, prefix: &str) -> Vec<TraversalEntry> {
        self.list(prefix)
    }

    /// Paths of the nodes [`search`](Self::search) finds.
    pub fn paths(&self, key: &str) -> Vec<String> {
        self.search(key).into_iter().map(|entry| entry.path).collect()
    }

    /// The tree's listener registry, created on first use. Callbacks can
    /// hold on to it to subscribe further listeners while being notified.
    pub fn listeners(&mut self) -> Rc<ListenerRegistry> {
        Rc::clone(
            self.listeners
                .get_or_insert_with(|| Rc::new(ListenerRegistry::new())),
        )
    }

    /// Subscribe to `path`; a trailing `*` token subscribes to everything
    /// below it as well.
    pub fn add_listener(
        &mut self,
        path: &str,
        callback: impl Fn(&str, &Node) + 'static,
    ) -> ListenerHandle {
        self.listeners().add(path, callback)
    }

    /// Drop every listener registered at `path`.
    pub fn remove_listener(&mut self, path: &str) -> bool {
        match &self.listeners {
            Some(listeners) => listeners.remove(path),
            None => false,
        }
    }

    /// [`remove_listener`](Self::remove_listener) for several paths.
    /// Returns how many paths had listeners.
    pub fn remove_listeners<'a, I>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        paths
            .into_iter()
            .filter(|path| self.remove_listener(path))
            .count()
    }

    /// Notify the listeners of `path`. Returns how many callbacks ran.
    pub fn trigger_listener(&self, path: &str, data: impl Into<Node>) -> usize {
        match &self.listeners {
            Some(listeners) => listeners.trigger(path, data),
            None => {
                debug!(path = %path, "no listeners registered");
                0
            }
        }
    }
}
