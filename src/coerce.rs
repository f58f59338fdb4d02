//! Typed coercion of tree nodes.
//!
//! Each `force_*` function returns the node coerced to the requested kind
//! when possible, otherwise the replacement coerced the same way, otherwise
//! the canonical empty value for that kind. Number coercion has no empty
//! value: failure is `None`, the counterpart of the void marker leaf.
use crate::types::{Leaf, Mapping, Node};

/// Parse the leading integer of `text` in `radix`.
///
/// Leading whitespace and a sign are accepted, parsing stops at the first
/// character that is not a digit of `radix`, and radix 16 tolerates a `0x`
/// prefix. Returns `None` when no digit is found or the value overflows.
pub fn parse_int(text: &str, radix: u32) -> Option<i64> {
    if !(2..=36).contains(&radix) {
        return None;
    }
    let mut rest = text.trim_start();
    let negative = match rest.chars().next() {
        Some('-') => {
            rest = &rest[1..];
            true
        }
        Some('+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };
    if radix == 16 {
        if let Some(stripped) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
            rest = stripped;
        }
    }

    let mut value: i64 = 0;
    let mut digits = 0usize;
    for digit in rest.chars().map_while(|c| c.to_digit(radix)) {
        value = value
            .checked_mul(i64::from(radix))?
            .checked_add(i64::from(digit))?;
        digits += 1;
    }
    if digits == 0 {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Render a number the way a dynamic language prints it: integral values
/// without a fractional part.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let name = if n > 0.0 { "Infinity" } else { "-Infinity" };
        name.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i128)
    } else {
        n.to_string()
    }
}

fn string_of(node: &Node) -> Option<String> {
    match node {
        Node::Leaf(Leaf::String(s)) => Some(s.clone()),
        Node::Leaf(Leaf::Number(n)) if !n.is_nan() => Some(number_to_string(*n)),
        _ => None,
    }
}

fn number_of(node: &Node, radix: u32) -> Option<i64> {
    match node {
        Node::Leaf(Leaf::String(s)) => parse_int(s, radix),
        Node::Leaf(Leaf::Number(n)) if n.is_finite() => parse_int(&number_to_string(*n), radix),
        _ => None,
    }
}

/// Strings pass through, numbers are printed, anything else falls back.
pub fn force_string(value: Option<&Node>, replacement: Option<&Node>) -> String {
    value
        .and_then(string_of)
        .or_else(|| replacement.and_then(string_of))
        .unwrap_or_default()
}

/// Integer coercion; `None` is the void marker.
pub fn force_number(value: Option<&Node>, replacement: Option<&Node>, radix: u32) -> Option<i64> {
    value
        .and_then(|v| number_of(v, radix))
        .or_else(|| replacement.and_then(|r| number_of(r, radix)))
}

/// Array leaves pass through, anything else yields the replacement or `[]`.
pub fn force_array(value: Option<&Node>, replacement: Option<&Node>) -> Vec<Node> {
    let array_of = |node: &Node| match node {
        Node::Leaf(Leaf::Array(items)) => Some(items.clone()),
        _ => None,
    };
    value
        .and_then(array_of)
        .or_else(|| replacement.and_then(array_of))
        .unwrap_or_default()
}

/// Mappings pass through, anything else yields the replacement or `{}`.
pub fn force_object(value: Option<&Node>, replacement: Option<&Node>) -> Mapping {
    value
        .and_then(Node::as_mapping)
        .or_else(|| replacement.and_then(Node::as_mapping))
        .cloned()
        .unwrap_or_default()
}

/// Like [`force_number`] but produces a node, with [`Leaf::Void`] on
/// failure.
pub fn force_number_node(value: Option<&Node>, replacement: Option<&Node>, radix: u32) -> Node {
    match force_number(value, replacement, radix) {
        Some(n) => Node::from(n),
        None => Node::Leaf(Leaf::Void),
    }
}
