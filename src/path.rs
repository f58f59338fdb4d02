//! Path-addressed reads and writes over a [`Mapping`].
//!
//! A path is a whitespace-separated list of keys, normalized before it is
//! tokenized, so `" a   b "` and `"a b"` address the same node. The empty
//! path has no tokens: reads through it find nothing and writes through it
//! do nothing. Only mappings are walked through; a leaf in the middle of a
//! path ends the walk.
use crate::strings;
use crate::types::{Leaf, Mapping, Node};
use tracing::debug;

/// Tokenize a path.
pub fn tokens(path: &str) -> Vec<String> {
    strings::split(path, ' ')
}

/// Normalize a path to its canonical single-spaced form.
pub fn normalize(path: &str) -> String {
    strings::one_space_and_trim(path)
}

fn is_absent(node: &Node) -> bool {
    matches!(node, Node::Leaf(Leaf::Null))
}

/// Descend through `parents`, creating empty mappings where nothing (or an
/// explicit null) is found. Returns `None` when a leaf is in the way.
fn descend_creating<'a>(root: &'a mut Mapping, parents: &[String]) -> Option<&'a mut Mapping> {
    let mut target = root;
    for token in parents {
        let slot = target.entry(token.clone()).or_insert_with(Node::mapping);
        if is_absent(slot) {
            *slot = Node::mapping();
        }
        match slot {
            Node::Mapping(map) => target = map,
            Node::Leaf(_) => {
                debug!(key = %token, "leaf blocks path");
                return None;
            }
        }
    }
    Some(target)
}

/// Fill-absent write.
///
/// Creates any missing intermediate mappings. A leaf value is stored only
/// if nothing is at the key yet; a mapping value is merged into the node
/// at the key with [`append`] semantics. Returns whether the write landed.
pub fn add(root: &mut Mapping, path: &str, value: Node) -> bool {
    let tokens = tokens(path);
    let Some((last, parents)) = tokens.split_last() else {
        debug!("add with empty path ignored");
        return false;
    };
    let Some(target) = descend_creating(root, parents) else {
        return false;
    };

    match value {
        Node::Mapping(source) => {
            let slot = target.entry(last.clone()).or_insert_with(Node::mapping);
            if is_absent(slot) {
                *slot = Node::mapping();
            }
            match slot {
                Node::Mapping(existing) => {
                    append(existing, &source);
                    true
                }
                Node::Leaf(_) => {
                    debug!(path = %path, "mapping not merged into existing leaf");
                    false
                }
            }
        }
        leaf => match target.get_mut(last) {
            Some(existing) if !is_absent(existing) => {
                debug!(path = %path, "add skipped, value already present");
                false
            }
            Some(existing) => {
                *existing = leaf;
                true
            }
            None => {
                target.insert(last.clone(), leaf);
                true
            }
        },
    }
}

/// Overwriting write. Creates missing intermediates and replaces whatever
/// is at the key. Returns the stored value, or `None` if the path is empty
/// or a leaf blocks it.
pub fn set<'a>(root: &'a mut Mapping, path: &str, value: Node) -> Option<&'a Node> {
    let tokens = tokens(path);
    let (last, parents) = tokens.split_last()?;
    let target = descend_creating(root, parents)?;
    target.insert(last.clone(), value);
    target.get(last)
}

/// Read the node at `path`. Never creates anything.
pub fn get<'a>(root: &'a Mapping, path: &str) -> Option<&'a Node> {
    let tokens = tokens(path);
    let (last, parents) = tokens.split_last()?;
    let mut node = root;
    for token in parents {
        node = node.get(token)?.as_mapping()?;
    }
    node.get(last)
}

/// Mutable counterpart of [`get`].
pub fn get_mut<'a>(root: &'a mut Mapping, path: &str) -> Option<&'a mut Node> {
    let tokens = tokens(path);
    let (last, parents) = tokens.split_last()?;
    let mut node = root;
    for token in parents {
        node = node.get_mut(token)?.as_mapping_mut()?;
    }
    node.get_mut(last)
}

/// Edit applied by [`get_with`] to an existing key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    /// Delete the key. Takes precedence over everything else.
    pub remove: bool,
    /// Rename the key, unless the new key is already taken.
    pub key: Option<String>,
    /// Overwrite the (possibly renamed) key's value.
    pub value: Option<Node>,
}

impl Command {
    pub fn remove() -> Self {
        Self {
            remove: true,
            ..Self::default()
        }
    }

    pub fn rename(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn set(value: impl Into<Node>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Also overwrite the value after a rename.
    pub fn and_set(mut self, value: impl Into<Node>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Look up `path` and apply `command` to the key if it exists.
///
/// Returns the removed value for [`Command::remove`], otherwise the value
/// at the (possibly renamed) key after the edit. Missing intermediates or
/// a missing key yield `None` and nothing is changed.
pub fn get_with(root: &mut Mapping, path: &str, command: &Command) -> Option<Node> {
    let tokens = tokens(path);
    let (last, parents) = tokens.split_last()?;
    let mut node = root;
    for token in parents {
        node = node.get_mut(token)?.as_mapping_mut()?;
    }
    if !node.contains_key(last) {
        return None;
    }
    if command.remove {
        return node.shift_remove(last);
    }

    let mut key = last.clone();
    if let Some(to) = &command.key {
        if to.is_empty() || node.contains_key(to) {
            debug!(from = %key, to = %to, "rename skipped");
        } else if let Some(value) = node.shift_remove(&key) {
            node.insert(to.clone(), value);
            key = to.clone();
        }
    }
    if let Some(value) = &command.value {
        node.insert(key.clone(), value.clone());
    }
    node.get(&key).cloned()
}

/// Deep merge that only fills keys missing from `target`.
pub fn append(target: &mut Mapping, source: &Mapping) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (None, _) => {
                target.insert(key.clone(), value.clone());
            }
            (Some(Node::Mapping(existing)), Node::Mapping(nested)) => append(existing, nested),
            (Some(_), _) => {}
        }
    }
}

/// Deep merge where `source` wins on every conflict.
pub fn extend(target: &mut Mapping, source: &Mapping) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (Some(Node::Mapping(existing)), Node::Mapping(nested)) => extend(existing, nested),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// An independent duplicate of `root`.
pub fn copy(root: &Mapping) -> Mapping {
    root.clone()
}

/// Keys of the mapping at `path`, empty if there is none.
pub fn keys(root: &Mapping, path: &str) -> Vec<String> {
    get(root, path)
        .and_then(Node::as_mapping)
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default()
}

/// Values of the mapping at `path`, empty if there is none.
pub fn values(root: &Mapping, path: &str) -> Vec<Node> {
    get(root, path)
        .and_then(Node::as_mapping)
        .map(|map| map.values().cloned().collect())
        .unwrap_or_default()
}

/// Whether `node` is a mapping without keys. Leaves are never empty.
pub fn empty(node: &Node) -> bool {
    node.as_mapping().is_some_and(Mapping::is_empty)
}
