use super::*;
use crate::doc::{Node, NodeKind};

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

fn node_at(name: &str, x: f64, y: f64) -> Node {
    let mut n = Node::new(id(name), NodeKind::Image, x, y);
    n.width = 100.0;
    n.height = 100.0;
    n
}

fn store() -> GraphStore {
    let mut s = GraphStore::new();
    s.replace_all(vec![node_at("a", 0.0, 0.0), node_at("b", 200.0, 0.0), node_at("c", 0.0, 200.0)], vec![]);
    s
}

// =============================================================
// press
// =============================================================

#[test]
fn press_replaces_with_single() {
    let mut sel = Selection::new();
    sel.press(&id("a"), false);
    sel.press(&id("b"), false);
    assert_eq!(sel.len(), 1);
    assert!(sel.contains(&id("b")));
}

#[test]
fn press_with_multi_adds() {
    let mut sel = Selection::new();
    sel.press(&id("a"), false);
    sel.press(&id("b"), true);
    assert!(sel.contains(&id("a")));
    assert!(sel.contains(&id("b")));
}

#[test]
fn press_on_selected_member_keeps_group() {
    let mut sel = Selection::new();
    sel.replace([id("a"), id("b")]);
    sel.press(&id("a"), false);
    assert_eq!(sel.len(), 2);
}

#[test]
fn press_multi_on_selected_is_idempotent() {
    let mut sel = Selection::new();
    sel.replace([id("a")]);
    sel.press(&id("a"), true);
    assert_eq!(sel.len(), 1);
}

// =============================================================
// marquee
// =============================================================

#[test]
fn marquee_selects_intersecting_nodes() {
    let sel = marquee_select(&store(), Rect::new(50.0, 50.0, 200.0, 20.0), None);
    assert_eq!(sel.len(), 2);
    assert!(sel.contains(&id("a")));
    assert!(sel.contains(&id("b")));
}

#[test]
fn marquee_empty_area_selects_nothing() {
    let sel = marquee_select(&store(), Rect::new(1000.0, 1000.0, 10.0, 10.0), None);
    assert!(sel.is_empty());
}

#[test]
fn marquee_with_base_unions() {
    let mut base = Selection::new();
    base.select_only(id("c"));
    let sel = marquee_select(&store(), Rect::new(195.0, 0.0, 10.0, 5.0), Some(&base));
    assert_eq!(sel.len(), 2);
    assert!(sel.contains(&id("b")));
    assert!(sel.contains(&id("c")));
    assert!(!sel.contains(&id("a")));
}
