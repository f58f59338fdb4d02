//! Path listeners for change notifications.
//!
//! The registry keeps its subscriptions in a [`PathTree`] of its own: the
//! node at a subscription path is a mapping from listener id to callback.
//! Subscribing to `"a b"` therefore stores `{a: {b: {"listener 7": <callback>}}}`.
//! Callback keys contain a space, so no path token can ever address them
//! and a subscription like `"a 7"` lives next to them without clashing.
//!
//! A subscription path ending in the token `*` is a wildcard: it fires for
//! its own prefix and for every path below it. Triggering a path runs two
//! phases, and every matching callback fires:
//!
//! 1. every wildcard whose prefix is a token-wise prefix of the path
//! 2. every callback registered at exactly the path
//!
//! Callbacks run after the registry has released its storage, so a callback
//! may subscribe, unsubscribe or trigger again.
//!
//! # Example
//!
//! ```
//! use koru_tree::subscriptions::ListenerRegistry;
//! use koru_tree::Node;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let registry = ListenerRegistry::new();
//! let hits = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&hits);
//! registry.add("users *", move |_, _| counter.set(counter.get() + 1));
//!
//! registry.trigger("users alice name", Node::from("Alice"));
//! registry.trigger("sessions s1", Node::from(true));
//! assert_eq!(hits.get(), 1);
//! ```
use crate::path;
use crate::traverse;
use crate::tree::PathTree;
use crate::types::{Callback, Mapping, Node};
use crate::words::Words;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Path token that turns a subscription into a wildcard.
pub const WILDCARD: &str = "*";

/// Process-wide listener id counter, shared by every registry.
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a listener. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

impl ListenerId {
    /// Allocate the next id.
    pub fn next() -> Self {
        ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Storage = Rc<RefCell<PathTree>>;

/// Key of a callback inside its subscription node.
fn slot_key(id: ListenerId) -> String {
    format!("listener {id}")
}

fn callbacks_in(map: &Mapping) -> impl Iterator<Item = Callback> + '_ {
    map.values().filter_map(Node::as_callback).cloned()
}

fn callback_at(storage: &Storage, path: &str, id: ListenerId) -> Option<Callback> {
    let storage = storage.borrow();
    let callback = storage
        .get(path)?
        .as_mapping()?
        .get(&slot_key(id))?
        .as_callback()
        .cloned();
    callback
}

/// Handle to a single registered listener.
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    id: ListenerId,
    path: String,
    storage: Weak<RefCell<PathTree>>,
}

impl ListenerHandle {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// The normalized subscription path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.storage
            .upgrade()
            .and_then(|storage| callback_at(&storage, &self.path, self.id))
            .is_some()
    }

    /// Invoke this listener alone with `data`. Returns whether it was still
    /// registered.
    pub fn trigger(&self, data: impl Into<Node>) -> bool {
        let callback = self
            .storage
            .upgrade()
            .and_then(|storage| callback_at(&storage, &self.path, self.id));
        match callback {
            Some(callback) => {
                callback.call(&self.path, &data.into());
                true
            }
            None => false,
        }
    }

    /// [`trigger`](Self::trigger) with an empty string as data.
    pub fn trigger_empty(&self) -> bool {
        self.trigger("")
    }

    /// Unregister this listener, leaving its siblings in place.
    pub fn remove(&self) -> bool {
        let Some(storage) = self.storage.upgrade() else {
            return false;
        };
        let mut storage = storage.borrow_mut();
        let removed = storage
            .get_mut(&self.path)
            .and_then(Node::as_mapping_mut)
            .and_then(|map| map.shift_remove(&slot_key(self.id)))
            .is_some();
        if removed {
            debug!(path = %self.path, id = %self.id, "listener removed");
        }
        removed
    }
}

/// Registry of path listeners.
pub struct ListenerRegistry {
    listeners: Storage,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(PathTree::new())),
        }
    }

    /// Subscribe `callback` to `path`.
    ///
    /// An empty path registers nothing; the returned handle is then inert.
    pub fn add(&self, path: &str, callback: impl Fn(&str, &Node) + 'static) -> ListenerHandle {
        let path = path::normalize(path);
        let id = ListenerId::next();

        let stored = {
            let mut storage = self.listeners.borrow_mut();
            storage.add(&path, Node::mapping());
            match storage.get_mut(&path).and_then(Node::as_mapping_mut) {
                Some(slot) => {
                    slot.insert(slot_key(id), Node::from(Callback::new(callback)));
                    true
                }
                None => false,
            }
        };
        if stored {
            debug!(path = %path, id = %id, "listener added");
        } else {
            debug!(path = %path, id = %id, "listener not stored");
        }

        ListenerHandle {
            id,
            path,
            storage: Rc::downgrade(&self.listeners),
        }
    }

    /// Notify every listener matching `path`. Returns how many callbacks
    /// ran.
    pub fn trigger(&self, path: &str, data: impl Into<Node>) -> usize {
        let data = data.into();
        let words = Words::new(path);
        let path = words.joined();

        let mut callbacks = Vec::new();
        {
            let storage = self.listeners.borrow();
            for entry in storage.search(WILDCARD) {
                let mut prefix = Words::new(&entry.path);
                prefix.pop();
                if !prefix.is_empty() && !words.starts_with(&prefix) {
                    continue;
                }
                if let Node::Mapping(map) = &entry.value {
                    callbacks.extend(callbacks_in(map));
                }
            }
            if let Some(Node::Mapping(map)) = storage.get(&path) {
                callbacks.extend(callbacks_in(map));
            }
        }

        trace!(path = %path, listeners = callbacks.len(), "triggering listeners");
        for callback in &callbacks {
            callback.call(&path, &data);
        }
        callbacks.len()
    }

    /// Drop the whole subscription node at `path`, including every listener
    /// registered there or below it.
    pub fn remove(&self, path: &str) -> bool {
        let path = path::normalize(path);
        let removed = self.listeners.borrow_mut().remove(&path).is_some();
        if removed {
            debug!(path = %path, "listeners removed");
        }
        removed
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        let storage = self.listeners.borrow();
        traverse::collect(storage.root(), |_, value, _| value.as_callback().is_some()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalized paths that currently hold at least one callback.
    pub fn paths(&self) -> Vec<String> {
        let storage = self.listeners.borrow();
        let mut paths: Vec<String> = traverse::collect(storage.root(), |_, value, _| {
            value
                .as_mapping()
                .is_some_and(|map| map.values().any(|v| v.as_callback().is_some()))
        })
        .into_iter()
        .map(|entry| entry.path)
        .collect();
        paths.dedup();
        paths
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("ListenerRegistry");
        match self.listeners.try_borrow() {
            Ok(storage) => debug.field("listeners", storage.root()),
            Err(_) => debug.field("listeners", &"<in use>"),
        };
        debug.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<(String, Node)>>>;

    fn recorder(log: &Log, tag: &'static str) -> impl Fn(&str, &Node) + 'static {
        let log = Rc::clone(log);
        move |path: &str, data: &Node| {
            log.borrow_mut()
                .push((format!("{tag}:{path}"), data.clone()))
        }
    }

    #[test]
    fn test_exact_subscription() {
        let registry = ListenerRegistry::new();
        let log: Log = Rc::default();
        registry.add("a b", recorder(&log, "exact"));

        assert_eq!(registry.trigger("a b", Node::from(1)), 1);
        assert_eq!(registry.trigger("a b c", Node::from(2)), 0);
        assert_eq!(registry.trigger("a", Node::from(3)), 0);

        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0], ("exact:a b".to_string(), Node::from(1)));
    }

    #[test]
    fn test_wildcard_subscription() {
        let registry = ListenerRegistry::new();
        let log: Log = Rc::default();
        registry.add("a b *", recorder(&log, "wild"));

        assert_eq!(registry.trigger("a b c", Node::from(1)), 1);
        assert_eq!(registry.trigger("a b", Node::from(2)), 1);
        assert_eq!(registry.trigger("a x", Node::from(3)), 0);
        assert_eq!(registry.trigger("a bc", Node::from(4)), 0);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_root_wildcard_matches_everything() {
        let registry = ListenerRegistry::new();
        let log: Log = Rc::default();
        registry.add("*", recorder(&log, "all"));
        assert_eq!(registry.trigger("anything at all", Node::from(1)), 1);
    }

    #[test]
    fn test_exact_and_wildcard_both_fire() {
        let registry = ListenerRegistry::new();
        let log: Log = Rc::default();
        registry.add("a *", recorder(&log, "wild"));
        registry.add("a b", recorder(&log, "exact"));

        assert_eq!(registry.trigger("a b", Node::from(1)), 2);
        let tags: Vec<_> = log.borrow().iter().map(|(t, _)| t.clone()).collect();
        assert!(tags.contains(&"wild:a b".to_string()));
        assert!(tags.contains(&"exact:a b".to_string()));
    }

    #[test]
    fn test_registration_order_within_node() {
        let registry = ListenerRegistry::new();
        let log: Log = Rc::default();
        registry.add("p", recorder(&log, "first"));
        registry.add("p", recorder(&log, "second"));
        registry.add("p", recorder(&log, "third"));

        registry.trigger("p", Node::from(0));
        let tags: Vec<_> = log.borrow().iter().map(|(t, _)| t.clone()).collect();
        assert_eq!(tags, vec!["first:p", "second:p", "third:p"]);
    }

    #[test]
    fn test_handle_trigger_and_remove() {
        let registry = ListenerRegistry::new();
        let log: Log = Rc::default();
        let keep = registry.add("x", recorder(&log, "keep"));
        let drop = registry.add("x", recorder(&log, "drop"));

        assert!(drop.trigger(Node::from("direct")));
        assert!(drop.remove());
        assert!(!drop.is_active());
        assert!(!drop.trigger_empty());
        assert!(!drop.remove());
        assert!(keep.is_active());

        assert_eq!(registry.trigger("x", Node::from(1)), 1);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_remove_path_drops_all_callbacks() {
        let registry = ListenerRegistry::new();
        let log: Log = Rc::default();
        registry.add("a", recorder(&log, "one"));
        registry.add("a", recorder(&log, "two"));
        assert_eq!(registry.len(), 2);

        assert!(registry.remove(" a "));
        assert!(registry.is_empty());
        assert_eq!(registry.trigger("a", Node::from(1)), 0);
    }

    #[test]
    fn test_ids_are_unique_after_remove() {
        let registry = ListenerRegistry::new();
        let first = registry.add("k", |_, _| {});
        first.remove();
        let second = registry.add("k", |_, _| {});
        assert!(second.id() > first.id());
    }

    #[test]
    fn test_empty_path_is_inert() {
        let registry = ListenerRegistry::new();
        let handle = registry.add("   ", |_, _| {});
        assert!(registry.is_empty());
        assert!(!handle.trigger_empty());
    }

    #[test]
    fn test_reentrant_add_from_callback() {
        let registry = Rc::new(ListenerRegistry::new());
        let inner = Rc::clone(&registry);
        let added = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&added);
        registry.add("grow", move |_, _| {
            let handle = inner.add("grown", |_, _| {});
            sink.borrow_mut().push(handle.id());
        });

        registry.trigger("grow", Node::from(1));
        registry.trigger("grow", Node::from(2));

        let ids = added.borrow();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_numeric_token_beside_listener() {
        let registry = ListenerRegistry::new();
        let log: Log = Rc::default();

        // Subscriptions on numeric tokens that upcoming ids will take.
        let upcoming = ListenerId::next().0;
        for n in upcoming..upcoming + 64 {
            registry.add(&format!("a {n}"), |_, _| {});
        }
        let parent = registry.add("a", recorder(&log, "parent"));
        assert!(parent.is_active());

        // And one on the token of an id that is already taken.
        let child = registry.add(&format!("a {}", parent.id()), recorder(&log, "child"));
        assert!(child.is_active());

        assert_eq!(registry.trigger("a", Node::from(1)), 1);
        assert_eq!(registry.trigger(child.path(), Node::from(2)), 1);
        let tags: Vec<_> = log.borrow().iter().map(|(t, _)| t.clone()).collect();
        assert_eq!(tags, vec!["parent:a".to_string(), format!("child:a {}", parent.id())]);
    }

    #[test]
    fn test_paths() {
        let registry = ListenerRegistry::new();
        registry.add("a b", |_, _| {});
        registry.add("a b", |_, _| {});
        registry.add("c *", |_, _| {});
        assert_eq!(registry.paths(), vec!["a b", "c *"]);
    }
}
