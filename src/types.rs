//! Core data types of the path tree.
//!
//! A tree is a [`Mapping`] of string keys to [`Node`]s. A node is either a
//! nested mapping or a [`Leaf`]. Arrays, dates and patterns are leaves even
//! though they are container-like: only mappings are ever descended into or
//! addressed by path.
use crate::error::{TreeError, TreeResult};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Number, Value as JsonValue};
use std::fmt;
use std::rc::Rc;

/// A mapping node: unique keys in insertion order.
pub type Mapping = IndexMap<String, Node>;

/// Signature of a listener callback: the triggered path and its data.
pub type ListenerFn = dyn Fn(&str, &Node);

/// A callable leaf.
///
/// Callbacks live inside trees like any other value (the listener registry
/// stores its subscriptions this way). Two callbacks are equal only when
/// they share the same allocation.
#[derive(Clone)]
pub struct Callback(Rc<ListenerFn>);

impl Callback {
    /// Wrap a closure.
    pub fn new(f: impl Fn(&str, &Node) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self, path: &str, data: &Node) {
        (self.0)(path, data)
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", self.addr())
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

/// Any non-mapping value.
#[derive(Debug, Clone)]
pub enum Leaf {
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number.
    Number(f64),
    /// String.
    String(String),
    /// Array. Never descended into, even if it holds mappings.
    Array(Vec<Node>),
    /// Point in time.
    Date(DateTime<Utc>),
    /// Regular expression.
    Pattern(Regex),
    /// Callable.
    Function(Callback),
    /// Marker produced when a number coercion fails.
    Void,
}

impl PartialEq for Leaf {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Leaf::Null, Leaf::Null) | (Leaf::Void, Leaf::Void) => true,
            (Leaf::Bool(a), Leaf::Bool(b)) => a == b,
            (Leaf::Number(a), Leaf::Number(b)) => a == b,
            (Leaf::String(a), Leaf::String(b)) => a == b,
            (Leaf::Array(a), Leaf::Array(b)) => a == b,
            (Leaf::Date(a), Leaf::Date(b)) => a == b,
            (Leaf::Pattern(a), Leaf::Pattern(b)) => a.as_str() == b.as_str(),
            (Leaf::Function(a), Leaf::Function(b)) => a == b,
            _ => false,
        }
    }
}

/// A tree element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Terminal value.
    Leaf(Leaf),
    /// Nested mapping.
    Mapping(Mapping),
}

/// Kind names, mirroring what a dynamic `typeof` would report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
    Date,
    RegExp,
    Function,
    Void,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Object => "object",
            NodeKind::Array => "array",
            NodeKind::String => "string",
            NodeKind::Number => "number",
            NodeKind::Boolean => "boolean",
            NodeKind::Null => "null",
            NodeKind::Date => "date",
            NodeKind::RegExp => "regexp",
            NodeKind::Function => "function",
            NodeKind::Void => "void",
        };
        f.write_str(name)
    }
}

impl Node {
    /// An empty mapping node.
    pub fn mapping() -> Self {
        Node::Mapping(Mapping::new())
    }

    /// A callback leaf.
    pub fn function(f: impl Fn(&str, &Node) + 'static) -> Self {
        Node::Leaf(Leaf::Function(Callback::new(f)))
    }

    /// The kind of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Mapping(_) => NodeKind::Object,
            Node::Leaf(leaf) => match leaf {
                Leaf::Null => NodeKind::Null,
                Leaf::Bool(_) => NodeKind::Boolean,
                Leaf::Number(_) => NodeKind::Number,
                Leaf::String(_) => NodeKind::String,
                Leaf::Array(_) => NodeKind::Array,
                Leaf::Date(_) => NodeKind::Date,
                Leaf::Pattern(_) => NodeKind::RegExp,
                Leaf::Function(_) => NodeKind::Function,
                Leaf::Void => NodeKind::Void,
            },
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Node::Mapping(_))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Leaf(Leaf::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Leaf(Leaf::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Leaf(Leaf::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Node::Leaf(Leaf::Function(cb)) => Some(cb),
            _ => None,
        }
    }

    /// Whether this is the coercion-failure marker.
    pub fn is_void(&self) -> bool {
        matches!(self, Node::Leaf(Leaf::Void))
    }

    /// Build a node from JSON. Objects become mappings; everything else,
    /// arrays included, becomes a leaf.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Node::Leaf(Leaf::Null),
            JsonValue::Bool(b) => Node::Leaf(Leaf::Bool(*b)),
            JsonValue::Number(n) => Node::Leaf(Leaf::Number(n.as_f64().unwrap_or(f64::NAN))),
            JsonValue::String(s) => Node::Leaf(Leaf::String(s.clone())),
            JsonValue::Array(items) => {
                Node::Leaf(Leaf::Array(items.iter().map(Node::from_json).collect()))
            }
            JsonValue::Object(object) => Node::Mapping(
                object
                    .iter()
                    .map(|(k, v)| (k.clone(), Node::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render this node as JSON.
    ///
    /// Dates become RFC 3339 strings and patterns their source text.
    /// Callbacks, the void marker and non-finite numbers have no JSON form
    /// and produce [`TreeError::Unrepresentable`].
    pub fn to_json(&self) -> TreeResult<JsonValue> {
        let mut path = Vec::new();
        node_to_json(self, &mut path)
    }
}

fn node_to_json(node: &Node, path: &mut Vec<String>) -> TreeResult<JsonValue> {
    let unrepresentable = |path: &[String], kind: NodeKind| TreeError::Unrepresentable {
        path: path.join(" "),
        kind: kind.to_string(),
    };
    match node {
        Node::Mapping(map) => {
            let mut object = Map::with_capacity(map.len());
            for (key, child) in map {
                path.push(key.clone());
                let value = node_to_json(child, path)?;
                path.pop();
                object.insert(key.clone(), value);
            }
            Ok(JsonValue::Object(object))
        }
        Node::Leaf(leaf) => match leaf {
            Leaf::Null => Ok(JsonValue::Null),
            Leaf::Bool(b) => Ok(JsonValue::Bool(*b)),
            Leaf::Number(n) => number_to_json(*n).ok_or_else(|| unrepresentable(path.as_slice(), node.kind())),
            Leaf::String(s) => Ok(JsonValue::String(s.clone())),
            Leaf::Array(items) => items
                .iter()
                .map(|item| node_to_json(item, path))
                .collect::<TreeResult<Vec<_>>>()
                .map(JsonValue::Array),
            Leaf::Date(date) => Ok(JsonValue::String(date.to_rfc3339())),
            Leaf::Pattern(re) => Ok(JsonValue::String(re.as_str().to_string())),
            Leaf::Function(_) | Leaf::Void => Err(unrepresentable(path.as_slice(), node.kind())),
        },
    }
}

/// Largest integer an f64 holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn number_to_json(n: f64) -> Option<JsonValue> {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Some(JsonValue::Number(Number::from(n as i64)));
    }
    Number::from_f64(n).map(JsonValue::Number)
}

impl From<Leaf> for Node {
    fn from(leaf: Leaf) -> Self {
        Node::Leaf(leaf)
    }
}

impl From<Mapping> for Node {
    fn from(map: Mapping) -> Self {
        Node::Mapping(map)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Leaf(Leaf::String(s.to_string()))
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Leaf(Leaf::String(s))
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Leaf(Leaf::Bool(b))
    }
}

impl From<f64> for Node {
    fn from(n: f64) -> Self {
        Node::Leaf(Leaf::Number(n))
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Leaf(Leaf::Number(n as f64))
    }
}

impl From<i32> for Node {
    fn from(n: i32) -> Self {
        Node::Leaf(Leaf::Number(f64::from(n)))
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Leaf(Leaf::Array(items))
    }
}

impl From<DateTime<Utc>> for Node {
    fn from(date: DateTime<Utc>) -> Self {
        Node::Leaf(Leaf::Date(date))
    }
}

impl From<Regex> for Node {
    fn from(re: Regex) -> Self {
        Node::Leaf(Leaf::Pattern(re))
    }
}

impl From<Callback> for Node {
    fn from(cb: Callback) -> Self {
        Node::Leaf(Leaf::Function(cb))
    }
}

impl From<JsonValue> for Node {
    fn from(value: JsonValue) -> Self {
        Node::from_json(&value)
    }
}

/// A node matched during a walk.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalEntry {
    /// The node's own key.
    pub key: String,
    /// The node's value after any rewrite made in the same step.
    pub value: Node,
    /// Space-joined path from the root to this node, inclusive.
    pub path: String,
}
