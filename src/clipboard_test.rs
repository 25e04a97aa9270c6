#![allow(clippy::float_cmp)]

use std::collections::HashSet;

use serde_json::json;

use super::*;
use crate::connection::create_connection;
use crate::doc::NodeKind;

const EPSILON: f64 = 1e-9;

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

fn node_at(name: &str, x: f64, y: f64) -> Node {
    let mut n = Node::new(id(name), NodeKind::TextToImage, x, y);
    n.width = 100.0;
    n.height = 80.0;
    n
}

fn select(ids: &[&str]) -> Selection {
    let mut sel = Selection::new();
    sel.replace(ids.iter().map(|s| id(s)));
    sel
}

fn store() -> GraphStore {
    let mut s = GraphStore::new();
    s.replace_all(vec![node_at("n1", 0.0, 0.0), node_at("n2", 200.0, 50.0), node_at("n3", 400.0, 0.0)], vec![]);
    create_connection(&mut s, &id("n1"), &id("n2"));
    create_connection(&mut s, &id("n2"), &id("n3"));
    s
}

#[test]
fn copy_keeps_only_internal_connections() {
    let s = store();
    let mut clip = Clipboard::new();
    assert_eq!(clip.copy(&s, &select(&["n1", "n2"])), 2);
    assert_eq!(clip.connections().len(), 1);
    assert_eq!(clip.connections()[0].source_id, id("n1"));
}

#[test]
fn copy_deep_copies_payload() {
    let mut s = store();
    let mut payload = serde_json::Map::new();
    payload.insert("prompt".into(), json!("castle"));
    s.update_node(&id("n1"), &crate::doc::NodePatch { payload: Some(payload), ..Default::default() });
    let mut clip = Clipboard::new();
    clip.copy(&s, &select(&["n1"]));

    let mut changed = serde_json::Map::new();
    changed.insert("prompt".into(), json!("ruin"));
    s.update_node(&id("n1"), &crate::doc::NodePatch { payload: Some(changed), ..Default::default() });
    assert_eq!(clip.nodes()[0].props().prompt(), "castle");
}

#[test]
fn paste_ids_are_disjoint_and_connections_resolve() {
    let mut s = store();
    let original_nodes: HashSet<NodeId> = s.nodes().iter().map(|n| n.id.clone()).collect();
    let original_conns: HashSet<ConnectionId> = s.connections().iter().map(|c| c.id.clone()).collect();
    let mut clip = Clipboard::new();
    clip.copy(&s, &select(&["n1", "n2", "n3"]));
    let pasted = clip.paste(&mut s, None, 40.0);

    assert_eq!(pasted.nodes.len(), 3);
    assert_eq!(pasted.connections.len(), 2);
    assert!(pasted.nodes.iter().all(|n| !original_nodes.contains(n)));
    assert!(pasted.connections.iter().all(|c| !original_conns.contains(c)));

    let pasted_set: HashSet<&NodeId> = pasted.nodes.iter().collect();
    for cid in &pasted.connections {
        let c = s.connection(cid).unwrap();
        assert!(pasted_set.contains(&c.source_id));
        assert!(pasted_set.contains(&c.target_id));
    }
}

#[test]
fn paste_preserves_relative_offsets() {
    let mut s = store();
    let mut clip = Clipboard::new();
    clip.copy(&s, &select(&["n1", "n2"]));
    let pasted = clip.paste(&mut s, Some(Point::new(1000.0, 1000.0)), 40.0);
    let a = s.node(&pasted.nodes[0]).unwrap();
    let b = s.node(&pasted.nodes[1]).unwrap();
    assert!((b.x - a.x - 200.0).abs() < EPSILON);
    assert!((b.y - a.y - 50.0).abs() < EPSILON);
    // Copied bounds (0,0)-(300,130) are centred on the target.
    assert!((a.x - 850.0).abs() < EPSILON);
    assert!((a.y - 935.0).abs() < EPSILON);
}

#[test]
fn paste_single_node_scenario_drops_outgoing_connection() {
    let mut s = store();
    let mut clip = Clipboard::new();
    clip.copy(&s, &select(&["n1"]));
    let pasted = clip.paste(&mut s, None, 40.0);
    assert_eq!(pasted.nodes.len(), 1);
    assert!(pasted.connections.is_empty());

    let copy = s.node(&pasted.nodes[0]).unwrap();
    assert_ne!(copy.id, id("n1"));
    assert_eq!((copy.width, copy.height), (100.0, 80.0));
    assert_eq!((copy.x, copy.y), (40.0, 40.0));
    assert!(!s.connections().iter().any(|c| c.touches(&pasted.nodes[0])));
}

#[test]
fn repeated_pastes_cascade() {
    let mut s = store();
    let mut clip = Clipboard::new();
    clip.copy(&s, &select(&["n1"]));
    let first = clip.paste(&mut s, None, 40.0);
    let second = clip.paste(&mut s, None, 40.0);
    assert_eq!(s.node(&first.nodes[0]).unwrap().x, 40.0);
    assert_eq!(s.node(&second.nodes[0]).unwrap().x, 80.0);
}

#[test]
fn paste_onto_original_centre_still_offsets() {
    let mut s = store();
    let mut clip = Clipboard::new();
    clip.copy(&s, &select(&["n1"]));
    let pasted = clip.paste(&mut s, Some(Point::new(50.0, 40.0)), 40.0);
    let copy = s.node(&pasted.nodes[0]).unwrap();
    assert_eq!((copy.x, copy.y), (40.0, 40.0));
}

#[test]
fn paste_clears_loading_flag() {
    let mut s = store();
    s.update_node(&id("n1"), &crate::doc::NodePatch::loading(true));
    let mut clip = Clipboard::new();
    clip.copy(&s, &select(&["n1"]));
    let pasted = clip.paste(&mut s, None, 40.0);
    assert!(!s.node(&pasted.nodes[0]).unwrap().is_loading);
}

#[test]
fn empty_clipboard_pastes_nothing() {
    let mut s = store();
    let mut clip = Clipboard::new();
    assert!(clip.is_empty());
    assert_eq!(clip.paste(&mut s, None, 40.0), PasteResult::default());
    assert_eq!(s.len(), 3);
}
