//! Spatial queries: viewport culling and rectangle membership.
//!
//! All tests are axis-aligned bounding-box intersections in world space.
//! Results never depend on node array order beyond the order they are
//! reported in.

#[cfg(test)]
#[path = "spatial_test.rs"]
mod spatial_test;

use std::collections::HashSet;

use crate::camera::Camera;
use crate::connection::{ConnectionPath, connection_path};
use crate::consts::CULL_MARGIN_PX;
use crate::doc::{GraphStore, Node, NodeId};
use crate::geom::Rect;

/// Ids of every node whose bounding box intersects `world_rect`.
#[must_use]
pub fn nodes_intersecting(store: &GraphStore, world_rect: Rect) -> HashSet<NodeId> {
    store
        .nodes()
        .iter()
        .filter(|n| n.rect().intersects(&world_rect))
        .map(|n| n.id.clone())
        .collect()
}

/// World rectangle used for culling: the visible area plus a screen-space margin.
#[must_use]
pub fn cull_rect(camera: &Camera, viewport_width: f64, viewport_height: f64) -> Rect {
    camera
        .visible_world_rect(viewport_width, viewport_height)
        .expand(camera.screen_dist_to_world(CULL_MARGIN_PX))
}

/// Nodes that intersect the (margin-expanded) viewport, in store order.
#[must_use]
pub fn visible_nodes<'a>(
    store: &'a GraphStore,
    camera: &Camera,
    viewport_width: f64,
    viewport_height: f64,
) -> Vec<&'a Node> {
    let area = cull_rect(camera, viewport_width, viewport_height);
    store.nodes().iter().filter(|n| n.rect().intersects(&area)).collect()
}

/// Curves whose bounds intersect the (margin-expanded) viewport.
///
/// A connection is kept even when both endpoints are off-screen, as long as
/// the curve crosses the visible area.
#[must_use]
pub fn visible_connections(
    store: &GraphStore,
    camera: &Camera,
    viewport_width: f64,
    viewport_height: f64,
) -> Vec<ConnectionPath> {
    let area = cull_rect(camera, viewport_width, viewport_height);
    store
        .connections()
        .iter()
        .filter_map(|c| connection_path(store, c))
        .filter(|p| p.bounds().intersects(&area))
        .collect()
}
