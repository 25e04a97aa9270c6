//! Scene assembly: everything a host needs to draw one frame.
//!
//! This module does no drawing itself. It reads the engine's graph, camera
//! and UI state and produces a [`Scene`] of plain values: nodes in stacking
//! order (culled to the viewport) with their screen rectangles, connection
//! paths, the provisional wire, the marquee, and the minimap. Hosts draw the
//! scene with whatever surface they have and never re-derive core state.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::camera::Camera;
use crate::doc::{ConnectionId, NodeId, NodeKind};
use crate::engine::Engine;
use crate::geom::{Point, Rect};
use crate::group::stacking_order;
use crate::input::QuickAddMenu;
use crate::minimap::MinimapLayout;
use crate::spatial::{cull_rect, visible_connections};

/// One node as drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    pub id: NodeId,
    pub kind: NodeKind,
    pub title: String,
    /// Bounds in screen pixels.
    pub screen: Rect,
    pub selected: bool,
    pub loading: bool,
    /// Group fill colour.
    pub color: Option<String>,
    pub media_urls: Vec<String>,
    pub media_stack_open: bool,
}

/// One connection curve as drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionView {
    pub id: ConnectionId,
    /// SVG path data in world coordinates; draw it under [`Scene::camera`].
    pub path: String,
    pub selected: bool,
}

/// Minimap contents for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimapView {
    pub layout: MinimapLayout,
    /// Every node (not only visible ones) in minimap pixels.
    pub nodes: Vec<(NodeId, Rect)>,
}

/// A complete frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub camera: Camera,
    /// Visible nodes, bottom first.
    pub nodes: Vec<NodeView>,
    pub connections: Vec<ConnectionView>,
    /// Provisional wire while connecting, in screen pixels.
    pub temp_line: Option<(Point, Point)>,
    /// Marquee rectangle in screen pixels.
    pub marquee: Option<Rect>,
    pub quick_add: Option<QuickAddMenu>,
    pub minimap: MinimapView,
    pub cursor: String,
}

/// Assemble the scene for the engine's current state.
#[must_use]
pub fn build_scene(engine: &Engine) -> Scene {
    let camera = engine.camera;
    let ui = &engine.ui;
    let area = cull_rect(&camera, engine.viewport_width, engine.viewport_height);

    let nodes = stacking_order(&engine.store, &ui.selection, ui.media_stack.as_ref())
        .into_iter()
        .filter(|n| n.rect().intersects(&area))
        .map(|n| {
            let props = n.props();
            NodeView {
                id: n.id.clone(),
                kind: n.kind,
                title: n.title.clone(),
                screen: camera.world_rect_to_screen(n.rect()),
                selected: ui.selection.contains(&n.id),
                loading: n.is_loading,
                color: props.color().map(str::to_owned),
                media_urls: props.media_urls().into_iter().map(str::to_owned).collect(),
                media_stack_open: ui.media_stack.as_ref() == Some(&n.id),
            }
        })
        .collect();

    let connections = visible_connections(&engine.store, &camera, engine.viewport_width, engine.viewport_height)
        .into_iter()
        .map(|p| ConnectionView {
            selected: ui.selected_connection.as_ref() == Some(&p.id),
            path: p.svg(),
            id: p.id,
        })
        .collect();

    let layout = engine.minimap_layout();
    Scene {
        camera,
        nodes,
        connections,
        temp_line: ui.temp_line.map(|(from, to)| (camera.world_to_screen(from), camera.world_to_screen(to))),
        marquee: ui.marquee,
        quick_add: ui.quick_add.clone(),
        minimap: MinimapView { nodes: layout.node_rects(&engine.store), layout },
        cursor: engine.cursor().to_owned(),
    }
}
