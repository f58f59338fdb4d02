//! # koru-tree: a path-addressable key/value tree
//!
//! koru-tree stores nested mappings and addresses every node with a
//! space-separated path such as `"users alice email"`. On top of the tree
//! it gives you:
//! - **Fill-absent writes** - `add` never clobbers, `set` always does
//! - **Traversal with edits** - remove, rewrite or rename nodes mid-walk
//! - **Queries** - find nodes by key (`search`) or by path prefix (`list`)
//! - **Listeners** - exact and wildcard (`"users *"`) change notifications
//!
//! ## Quick Start
//!
//! ```
//! use koru_tree::{Node, PathTree};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut tree = PathTree::new();
//! tree.add("users alice email", "alice@example.com");
//! tree.add("users bob email", "bob@example.com");
//!
//! let changes = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&changes);
//! tree.add_listener("users *", move |path: &str, _: &Node| {
//!     sink.borrow_mut().push(path.to_string());
//! });
//!
//! tree.set("users alice email", "alice@example.org");
//!
//! assert_eq!(tree.paths("email"), vec!["users alice email", "users bob email"]);
//! assert_eq!(*changes.borrow(), vec!["users alice email"]);
//! ```
//!
//! ## Architecture
//!
//! 1. **Token layer** (`strings`, `words`) - whitespace normalization and
//!    token sequences with token-wise prefix matching
//! 2. **Tree engine** (`traverse`, `path`) - depth-first walks that tolerate
//!    structural edits, and path-addressed reads/writes
//! 3. **Facade** (`tree`) - [`PathTree`], the handle most callers use
//! 4. **Listeners** (`subscriptions`) - a registry that stores its own
//!    subscriptions in a [`PathTree`] and matches them by prefix
//!
//! ## Threading
//!
//! Everything is single-threaded and synchronous. Callbacks are `Rc`-based,
//! so trees with listeners are neither `Send` nor `Sync`.

mod config;
mod error;
mod types;

pub mod coerce;
pub mod path;
pub mod strings;
pub mod subscriptions;
pub mod traverse;
pub mod tree;
pub mod words;

// Public API exports
pub use config::TreeConfig;
pub use error::{TreeError, TreeResult};
pub use path::Command;
pub use subscriptions::{ListenerHandle, ListenerId, ListenerRegistry};
pub use traverse::{Visit, VisitAction};
pub use tree::PathTree;
pub use types::{Callback, Leaf, ListenerFn, Mapping, Node, NodeKind, TraversalEntry};
pub use words::{Selector, Words};

// Re-export commonly used external types for convenience
pub use serde_json::{Value as JsonValue, json};

/// Prelude module for convenient imports.
///
/// ```
/// use koru_tree::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::TreeConfig;
    pub use crate::error::{TreeError, TreeResult};
    pub use crate::path::Command;
    pub use crate::subscriptions::{ListenerHandle, ListenerId, ListenerRegistry};
    pub use crate::traverse::{Visit, VisitAction};
    pub use crate::tree::PathTree;
    pub use crate::types::{Callback, Leaf, Mapping, Node, NodeKind, TraversalEntry};
    pub use crate::words::Words;
    pub use serde_json::{Value as JsonValue, json};
}
