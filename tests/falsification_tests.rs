/// Falsification tests for koru-tree.
///
/// These tests try to break the tree rather than confirm it works:
///
/// - Structural edits from inside a traversal callback
/// - Early termination and entry bookkeeping
/// - Malformed paths and blocked writes
/// - Listener ids, re-entrant dispatch and removal
use koru_tree::prelude::*;
use koru_tree::traverse::{collect, traverse};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

fn mapping(value: JsonValue) -> Mapping {
    PathTree::from_json(&value).unwrap().into_root()
}

// ============================================================================
// SECTION 1: TRAVERSAL UNDER MUTATION
// ============================================================================

/// Falsification: deleting every visited key must still visit every sibling.
#[test]
fn falsify_remove_every_key_mid_walk() {
    let mut root = mapping(json!({"a": 1, "b": 2, "c": {"d": 3}, "e": 4}));
    let mut visited = Vec::new();
    let entries = traverse(&mut root, |key, _, _| {
        visited.push(key.to_string());
        Visit::remove()
    });

    assert!(entries.is_empty());
    assert!(root.is_empty());
    // "d" is never reached: removed values are not descended into
    assert_eq!(visited, vec!["a", "b", "c", "e"]);
}

/// Falsification: renaming to a key that is visited later must not make the
/// walk see the moved node twice.
#[test]
fn falsify_rename_to_later_sibling_name() {
    let mut root = mapping(json!({"a": 1, "b": 2}));
    let mut visits = 0;
    traverse(&mut root, |key, _, _| {
        visits += 1;
        if key == "a" { Visit::rename("z") } else { Visit::skip() }
    });

    assert_eq!(visits, 2);
    assert_eq!(
        PathTree::from_mapping(root).to_json().unwrap(),
        json!({"b": 2, "z": 1})
    );
}

/// Falsification: a renamed mapping is still descended into, under its new
/// name.
#[test]
fn falsify_rename_descends_with_new_path() {
    let mut root = mapping(json!({"old": {"child": 1}}));
    let entries = traverse(&mut root, |key, _, _| {
        if key == "old" { Visit::rename("new") } else { Visit::include() }
    });
    let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["new", "new child"]);
}

/// Falsification: a rewrite's entry must carry the new value, not the old.
#[test]
fn falsify_rewrite_entry_value() {
    let mut root = mapping(json!({"n": 1}));
    let entries = traverse(&mut root, |_, _, _| Visit::rewrite(2));
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].value, Node::from(2));
    assert_eq!(root["n"], Node::from(2));
}

// ============================================================================
// SECTION 2: EARLY TERMINATION
// ============================================================================

/// Falsification: stop on the second entry yields exactly two entries no
/// matter how large the tree is.
#[test]
fn falsify_stop_on_second_entry_large_tree() {
    let mut tree = PathTree::new();
    for i in 0..50 {
        for j in 0..10 {
            tree.add(&format!("k{i} v{j}"), i * j);
        }
    }

    let mut seen = 0;
    let entries = tree.traverse(|_, _, _| {
        seen += 1;
        if seen == 2 { Visit::stop() } else { Visit::include() }
    });
    assert_eq!(entries.len(), 2);
    assert_eq!(seen, 2);
}

/// Falsification: stop combined with remove still ends the walk.
#[test]
fn falsify_stop_after_remove() {
    let mut root = mapping(json!({"a": 1, "b": 2, "c": 3}));
    let mut visits = 0;
    let entries = traverse(&mut root, |key, _, _| {
        visits += 1;
        if key == "b" { Visit::remove().and_stop() } else { Visit::include() }
    });
    assert_eq!(visits, 2);
    assert_eq!(entries.len(), 1);
    assert!(!root.contains_key("b"));
    assert!(root.contains_key("c"));
}

// ============================================================================
// SECTION 3: MALFORMED INPUT
// ============================================================================

/// Falsification: whitespace-only paths never read or write anything.
#[test]
fn falsify_blank_paths() {
    let mut tree = PathTree::with_value("a", 1);
    for blank in ["", " ", "\t\n", "   \t"] {
        assert!(!tree.add(blank, 2));
        assert_eq!(tree.get(blank), None);
        assert_eq!(tree.set(blank, 3), None);
        assert_eq!(tree.remove(blank), None);
        assert!(tree.keys(blank).is_empty());
        assert!(tree.list(blank).is_empty());
    }
    assert_eq!(tree.to_json().unwrap(), json!({"a": 1}));
}

/// Falsification: reads never create intermediate nodes.
#[test]
fn falsify_read_creates_nothing() {
    let tree = PathTree::with_value("a b", 1);
    assert_eq!(tree.get("x y z"), None);
    assert_eq!(tree.get_string("x y z"), "");
    assert_eq!(tree.get_number("x y z", None), None);
    assert!(tree.get_object("x").is_empty());
    assert_eq!(tree.search("").len(), 2);
}

/// Falsification: a leaf in the middle of a path blocks set as well as add.
#[test]
fn falsify_leaf_blocks_deeper_writes() {
    let mut tree = PathTree::with_value("a", "leaf");
    assert!(!tree.add("a b", 1));
    assert_eq!(tree.set("a b", 1), None);
    assert_eq!(tree.get("a"), Some(&Node::from("leaf")));
}

/// Falsification: `list` is token-wise, never a character prefix.
#[test]
fn falsify_list_character_prefix() {
    let tree = PathTree::from_json(&json!({"user": 1, "users": {"a": 2}})).unwrap();
    let listed: Vec<_> = tree.list("user").into_iter().map(|e| e.path).collect();
    assert_eq!(listed, vec!["user"]);
}

// ============================================================================
// SECTION 4: LISTENERS
// ============================================================================

/// Falsification: listener ids never repeat, across registries and removals.
#[test]
fn falsify_listener_id_reuse() {
    let first = ListenerRegistry::new();
    let second = ListenerRegistry::new();
    let mut ids = HashSet::new();

    for round in 0..20 {
        let registry = if round % 2 == 0 { &first } else { &second };
        let handle = registry.add("p", |_, _| {});
        assert!(ids.insert(handle.id()), "id {} reused", handle.id());
        handle.remove();
    }
}

/// Falsification: removing one listener leaves its siblings untouched.
#[test]
fn falsify_handle_remove_isolated() {
    let registry = ListenerRegistry::new();
    let hits = Rc::new(RefCell::new(Vec::new()));
    let handles: Vec<_> = (0..3)
        .map(|i| {
            let hits = Rc::clone(&hits);
            registry.add("topic", move |_, _| hits.borrow_mut().push(i))
        })
        .collect();

    handles[1].remove();
    registry.trigger("topic", Node::from(1));
    assert_eq!(*hits.borrow(), vec![0, 2]);
}

/// Falsification: a callback that triggers again must not deadlock or panic
/// on the registry's storage.
#[test]
fn falsify_reentrant_trigger() {
    let registry = Rc::new(ListenerRegistry::new());
    let depth = Rc::new(RefCell::new(0));

    {
        let inner = Rc::clone(&registry);
        let depth = Rc::clone(&depth);
        registry.add("ping", move |_, _| {
            *depth.borrow_mut() += 1;
            if *depth.borrow() < 3 {
                inner.trigger("ping", Node::from(0));
            }
        });
    }

    registry.trigger("ping", Node::from(0));
    assert_eq!(*depth.borrow(), 3);
}

/// Falsification: the exact phase does not pick up callbacks of deeper
/// subscriptions stored below the triggered path.
#[test]
fn falsify_exact_phase_ignores_children() {
    let registry = ListenerRegistry::new();
    registry.add("a b", |_, _| {});
    registry.add("a b c", |_, _| {});
    assert_eq!(registry.trigger("a b", Node::from(1)), 1);
    assert_eq!(registry.trigger("a", Node::from(1)), 0);
}

/// Falsification: collect sees exactly what traverse sees when nothing is
/// edited.
#[test]
fn falsify_collect_matches_traverse() {
    let mut root = mapping(json!({"a": {"b": {"c": 1}}, "d": [1, 2], "e": {}}));
    let read_only = collect(&root, |_, _, _| true);
    let walked = traverse(&mut root, |_, _, _| Visit::include());
    assert_eq!(read_only, walked);
}
