//! Hit testing: which node part or connection lies under a screen point.
//!
//! Nodes are tested topmost first, in the same order they are drawn. Within
//! one node the priority is resize handle, output port, input port, body.
//! The handle bands on the east and west edges leave out the port circles,
//! so a press on a port never starts a resize. Connections sit below every
//! node and are only considered when no node part was hit.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::Camera;
use crate::connection::connection_path;
use crate::consts::{CONNECTION_HIT_PX, HANDLE_RADIUS_PX, MIN_NODE_SIZE, PORT_RADIUS_PX};
use crate::doc::{ConnectionId, GraphStore, Node, NodeId};
use crate::geom::{Point, Rect};
use crate::group::stacking_order;
use crate::selection::Selection;

/// Anchor position for resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    fn moves_west(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }

    fn moves_east(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    fn moves_north(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    fn moves_south(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    /// Bounds after dragging this handle by a world-space `delta`.
    ///
    /// The opposite edge stays fixed. Width and height never drop below
    /// [`MIN_NODE_SIZE`], or below the original size when that is already
    /// smaller; a west or north edge that would cross that limit stops at it.
    #[must_use]
    pub fn resize(self, orig: Rect, delta: Point) -> Rect {
        let min_width = MIN_NODE_SIZE.min(orig.width);
        let min_height = MIN_NODE_SIZE.min(orig.height);
        let mut out = orig;
        if self.moves_west() {
            out.width = (orig.width - delta.x).max(min_width);
            out.x = orig.right() - out.width;
        } else if self.moves_east() {
            out.width = (orig.width + delta.x).max(min_width);
        }
        if self.moves_north() {
            out.height = (orig.height - delta.y).max(min_height);
            out.y = orig.bottom() - out.height;
        } else if self.moves_south() {
            out.height = (orig.height + delta.y).max(min_height);
        }
        out
    }

    /// CSS cursor shown while hovering or dragging this handle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::N | Self::S => "ns-resize",
            Self::E | Self::W => "ew-resize",
            Self::Ne | Self::Sw => "nesw-resize",
            Self::Nw | Self::Se => "nwse-resize",
        }
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitTarget {
    Background,
    Body(NodeId),
    ResizeHandle(NodeId, ResizeAnchor),
    OutputPort(NodeId),
    InputPort(NodeId),
    Connection(ConnectionId),
}

impl HitTarget {
    /// The node this target belongs to, if any.
    #[must_use]
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Self::Body(id) | Self::ResizeHandle(id, _) | Self::OutputPort(id) | Self::InputPort(id) => Some(id),
            Self::Background | Self::Connection(_) => None,
        }
    }
}

/// Resolve the target under `screen`.
#[must_use]
pub fn hit_test(
    store: &GraphStore,
    camera: &Camera,
    selection: &Selection,
    media_stack: Option<&NodeId>,
    screen: Point,
) -> HitTarget {
    let world = camera.screen_to_world(screen);
    let handle = camera.screen_dist_to_world(HANDLE_RADIUS_PX);
    let port = camera.screen_dist_to_world(PORT_RADIUS_PX);

    for node in stacking_order(store, selection, media_stack).into_iter().rev() {
        if let Some(target) = hit_node(node, world, handle, port) {
            return target;
        }
    }

    let slop = camera.screen_dist_to_world(CONNECTION_HIT_PX);
    store
        .connections()
        .iter()
        .filter_map(|c| connection_path(store, c))
        .map(|path| (path.distance_to(world), path.id))
        .filter(|(d, _)| *d <= slop)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map_or(HitTarget::Background, |(_, id)| HitTarget::Connection(id))
}

/// The topmost node whose input port is within reach of `world`.
///
/// Used when a wire is released: the drop only has to land on the port.
#[must_use]
pub fn input_port_at<'a>(store: &'a GraphStore, camera: &Camera, world: Point) -> Option<&'a Node> {
    let port = camera.screen_dist_to_world(PORT_RADIUS_PX);
    store.nodes().iter().rev().find(|n| n.kind.accepts_input() && n.input_anchor().distance(world) <= port)
}

fn hit_node(node: &Node, world: Point, handle: f64, port: f64) -> Option<HitTarget> {
    let in_port = |anchor: Point| anchor.distance(world) <= port;
    let output = node.kind.has_output() && in_port(node.output_anchor());
    let input = node.kind.accepts_input() && in_port(node.input_anchor());

    if let Some(anchor) = resize_anchor(node.rect(), world, handle) {
        let blocked = match anchor {
            ResizeAnchor::E => output,
            ResizeAnchor::W => input,
            _ => false,
        };
        if !blocked {
            return Some(HitTarget::ResizeHandle(node.id.clone(), anchor));
        }
    }
    if output {
        return Some(HitTarget::OutputPort(node.id.clone()));
    }
    if input {
        return Some(HitTarget::InputPort(node.id.clone()));
    }
    node.rect().contains_point(world).then(|| HitTarget::Body(node.id.clone()))
}

/// Which handle band, if any, contains `world`. Corners win over edges.
fn resize_anchor(rect: Rect, world: Point, band: f64) -> Option<ResizeAnchor> {
    if !rect.expand(band).contains_point(world) {
        return None;
    }
    let near_w = (world.x - rect.x).abs() <= band;
    let near_e = (world.x - rect.right()).abs() <= band;
    let near_n = (world.y - rect.y).abs() <= band;
    let near_s = (world.y - rect.bottom()).abs() <= band;
    match (near_n, near_s, near_w, near_e) {
        (true, _, true, _) => Some(ResizeAnchor::Nw),
        (true, _, _, true) => Some(ResizeAnchor::Ne),
        (_, true, true, _) => Some(ResizeAnchor::Sw),
        (_, true, _, true) => Some(ResizeAnchor::Se),
        (true, _, _, _) => Some(ResizeAnchor::N),
        (_, true, _, _) => Some(ResizeAnchor::S),
        (_, _, true, _) => Some(ResizeAnchor::W),
        (_, _, _, true) => Some(ResizeAnchor::E),
        _ => None,
    }
}
