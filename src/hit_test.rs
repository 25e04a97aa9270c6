#![allow(clippy::float_cmp)]

use super::*;
use crate::connection::create_connection;
use crate::doc::NodeKind;

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn node(name: &str, kind: NodeKind, x: f64, y: f64, w: f64, h: f64) -> Node {
    let mut n = Node::new(id(name), kind, x, y);
    n.width = w;
    n.height = h;
    n
}

fn single(kind: NodeKind) -> GraphStore {
    let mut s = GraphStore::new();
    s.insert_node(node("a", kind, 100.0, 100.0, 200.0, 100.0));
    s
}

fn hit(store: &GraphStore, camera: &Camera, screen: Point) -> HitTarget {
    hit_test(store, camera, &Selection::new(), None, screen)
}

// =============================================================
// Node parts
// =============================================================

#[test]
fn body_hit_inside_node() {
    let s = single(NodeKind::TextToImage);
    assert_eq!(hit(&s, &Camera::default(), pt(200.0, 150.0)), HitTarget::Body(id("a")));
}

#[test]
fn output_port_on_right_edge_midpoint() {
    let s = single(NodeKind::TextToImage);
    assert_eq!(hit(&s, &Camera::default(), pt(300.0, 150.0)), HitTarget::OutputPort(id("a")));
    assert_eq!(hit(&s, &Camera::default(), pt(308.0, 150.0)), HitTarget::OutputPort(id("a")));
}

#[test]
fn input_port_on_left_edge_midpoint() {
    let s = single(NodeKind::TextToVideo);
    assert_eq!(hit(&s, &Camera::default(), pt(100.0, 150.0)), HitTarget::InputPort(id("a")));
}

#[test]
fn media_node_has_no_input_port() {
    let s = single(NodeKind::Image);
    assert_eq!(hit(&s, &Camera::default(), pt(100.0, 150.0)), HitTarget::ResizeHandle(id("a"), ResizeAnchor::W));
}

#[test]
fn group_has_no_ports() {
    let s = single(NodeKind::Group);
    assert_eq!(hit(&s, &Camera::default(), pt(300.0, 150.0)), HitTarget::ResizeHandle(id("a"), ResizeAnchor::E));
}

#[test]
fn corners_and_edges_resolve_to_anchors() {
    let s = single(NodeKind::TextToImage);
    let cam = Camera::default();
    assert_eq!(hit(&s, &cam, pt(100.0, 100.0)), HitTarget::ResizeHandle(id("a"), ResizeAnchor::Nw));
    assert_eq!(hit(&s, &cam, pt(303.0, 203.0)), HitTarget::ResizeHandle(id("a"), ResizeAnchor::Se));
    assert_eq!(hit(&s, &cam, pt(298.0, 101.0)), HitTarget::ResizeHandle(id("a"), ResizeAnchor::Ne));
    assert_eq!(hit(&s, &cam, pt(102.0, 199.0)), HitTarget::ResizeHandle(id("a"), ResizeAnchor::Sw));
    assert_eq!(hit(&s, &cam, pt(200.0, 96.0)), HitTarget::ResizeHandle(id("a"), ResizeAnchor::N));
    assert_eq!(hit(&s, &cam, pt(200.0, 204.0)), HitTarget::ResizeHandle(id("a"), ResizeAnchor::S));
    assert_eq!(hit(&s, &cam, pt(300.0, 120.0)), HitTarget::ResizeHandle(id("a"), ResizeAnchor::E));
    assert_eq!(hit(&s, &cam, pt(100.0, 180.0)), HitTarget::ResizeHandle(id("a"), ResizeAnchor::W));
}

#[test]
fn handle_band_is_screen_sized() {
    let s = single(NodeKind::TextToImage);
    let zoomed = Camera { pan_x: 0.0, pan_y: 0.0, zoom: 2.0 };
    // 4 world units above the top edge is 8 screen px at zoom 2: outside the 6 px band.
    let screen = zoomed.world_to_screen(pt(200.0, 96.0));
    assert_eq!(hit(&s, &zoomed, screen), HitTarget::Background);
    let screen = zoomed.world_to_screen(pt(200.0, 98.0));
    assert_eq!(hit(&s, &zoomed, screen), HitTarget::ResizeHandle(id("a"), ResizeAnchor::N));
}

#[test]
fn background_when_nothing_hit() {
    let s = single(NodeKind::TextToImage);
    assert_eq!(hit(&s, &Camera::default(), pt(1000.0, 1000.0)), HitTarget::Background);
    assert_eq!(hit(&GraphStore::new(), &Camera::default(), pt(0.0, 0.0)), HitTarget::Background);
}

// =============================================================
// Stacking
// =============================================================

#[test]
fn later_node_wins_overlap() {
    let mut s = GraphStore::new();
    s.insert_node(node("under", NodeKind::Image, 0.0, 0.0, 200.0, 200.0));
    s.insert_node(node("over", NodeKind::Image, 50.0, 50.0, 200.0, 200.0));
    assert_eq!(hit(&s, &Camera::default(), pt(100.0, 100.0)), HitTarget::Body(id("over")));
}

#[test]
fn selected_node_rises_above_unselected() {
    let mut s = GraphStore::new();
    s.insert_node(node("under", NodeKind::Image, 0.0, 0.0, 200.0, 200.0));
    s.insert_node(node("over", NodeKind::Image, 50.0, 50.0, 200.0, 200.0));
    let mut sel = Selection::new();
    sel.select_only(id("under"));
    assert_eq!(hit_test(&s, &Camera::default(), &sel, None, pt(100.0, 100.0)), HitTarget::Body(id("under")));
}

#[test]
fn media_stack_node_is_topmost() {
    let mut s = GraphStore::new();
    s.insert_node(node("stack", NodeKind::Image, 0.0, 0.0, 200.0, 200.0));
    s.insert_node(node("over", NodeKind::Image, 50.0, 50.0, 200.0, 200.0));
    let mut sel = Selection::new();
    sel.select_only(id("over"));
    let target = hit_test(&s, &Camera::default(), &sel, Some(&id("stack")), pt(100.0, 100.0));
    assert_eq!(target, HitTarget::Body(id("stack")));
}

#[test]
fn group_body_sits_below_members() {
    let mut s = GraphStore::new();
    s.insert_node(node("member", NodeKind::Image, 100.0, 100.0, 100.0, 100.0));
    s.insert_node(node("g", NodeKind::Group, 0.0, 0.0, 400.0, 400.0));
    assert_eq!(hit(&s, &Camera::default(), pt(150.0, 150.0)), HitTarget::Body(id("member")));
    assert_eq!(hit(&s, &Camera::default(), pt(300.0, 300.0)), HitTarget::Body(id("g")));
}

// =============================================================
// Connections
// =============================================================

fn wired() -> (GraphStore, ConnectionId) {
    let mut s = GraphStore::new();
    s.insert_node(node("a", NodeKind::TextToImage, 0.0, 0.0, 100.0, 100.0));
    s.insert_node(node("b", NodeKind::TextToImage, 300.0, 0.0, 100.0, 100.0));
    let c = create_connection(&mut s, &id("a"), &id("b")).unwrap();
    (s, c.id)
}

#[test]
fn connection_hit_within_slop() {
    let (s, cid) = wired();
    assert_eq!(hit(&s, &Camera::default(), pt(200.0, 55.0)), HitTarget::Connection(cid));
}

#[test]
fn connection_missed_outside_slop() {
    let (s, _) = wired();
    assert_eq!(hit(&s, &Camera::default(), pt(200.0, 70.0)), HitTarget::Background);
}

#[test]
fn node_parts_beat_connections() {
    let (s, _) = wired();
    assert_eq!(hit(&s, &Camera::default(), pt(100.0, 50.0)), HitTarget::OutputPort(id("a")));
}

#[test]
fn input_port_at_finds_drop_target() {
    let (s, _) = wired();
    let cam = Camera::default();
    assert_eq!(input_port_at(&s, &cam, pt(303.0, 52.0)).map(|n| n.id.as_str()), Some("b"));
    assert!(input_port_at(&s, &cam, pt(350.0, 50.0)).is_none());
}

#[test]
fn hit_target_node_id() {
    assert_eq!(HitTarget::OutputPort(id("x")).node_id(), Some(&id("x")));
    assert_eq!(HitTarget::Background.node_id(), None);
    assert_eq!(HitTarget::Connection(ConnectionId::from("c")).node_id(), None);
}

// =============================================================
// ResizeAnchor
// =============================================================

#[test]
fn west_resize_keeps_east_edge_fixed() {
    let orig = Rect::new(100.0, 100.0, 200.0, 100.0);
    let r = ResizeAnchor::W.resize(orig, pt(30.0, 99.0));
    assert_eq!(r, Rect::new(130.0, 100.0, 170.0, 100.0));
    assert_eq!(r.right(), orig.right());
}

#[test]
fn north_resize_grows_upward() {
    let orig = Rect::new(100.0, 100.0, 200.0, 100.0);
    assert_eq!(ResizeAnchor::N.resize(orig, pt(0.0, -10.0)), Rect::new(100.0, 90.0, 200.0, 110.0));
}

#[test]
fn corner_resize_changes_both_axes() {
    let orig = Rect::new(0.0, 0.0, 100.0, 100.0);
    assert_eq!(ResizeAnchor::Se.resize(orig, pt(10.0, 20.0)), Rect::new(0.0, 0.0, 110.0, 120.0));
    assert_eq!(ResizeAnchor::Nw.resize(orig, pt(10.0, 20.0)), Rect::new(10.0, 20.0, 90.0, 80.0));
}

#[test]
fn resize_clamps_to_minimum_size() {
    let orig = Rect::new(100.0, 100.0, 200.0, 100.0);
    let r = ResizeAnchor::W.resize(orig, pt(500.0, 0.0));
    assert_eq!(r.width, MIN_NODE_SIZE);
    assert_eq!(r.right(), orig.right());
    let r = ResizeAnchor::S.resize(orig, pt(0.0, -500.0));
    assert_eq!(r.height, MIN_NODE_SIZE);
    assert_eq!(r.y, 100.0);
}

#[test]
fn undersized_node_does_not_snap_to_minimum() {
    let orig = Rect::new(100.0, 100.0, 20.0, 20.0);
    let r = ResizeAnchor::Ne.resize(orig, pt(0.5, -0.5));
    assert_eq!(r, Rect::new(100.0, 99.5, 20.5, 20.5));
    let r = ResizeAnchor::Sw.resize(orig, pt(5.0, -5.0));
    assert_eq!(r, orig);
}

#[test]
fn resize_cursors() {
    assert_eq!(ResizeAnchor::N.cursor(), "ns-resize");
    assert_eq!(ResizeAnchor::W.cursor(), "ew-resize");
    assert_eq!(ResizeAnchor::Ne.cursor(), "nesw-resize");
    assert_eq!(ResizeAnchor::Se.cursor(), "nwse-resize");
}
