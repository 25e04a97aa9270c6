//! Minimap projection: fit-all overview with a clamped viewport indicator.
//!
//! The minimap maps world space into a fixed-size surface with a uniform
//! scale `s` and an offset, `minimap = world * s + offset`. The covered
//! world area is the union of every node and the current viewport, padded
//! by [`MINIMAP_WORLD_PADDING`].
//!
//! Scale starts at "fit all" and is then clamped so the viewport indicator's
//! longest side stays between [`MINIMAP_MIN_INDICATOR_RATIO`] and
//! [`MINIMAP_MAX_INDICATOR_RATIO`] of the minimap's longest side, and never
//! overflows either minimap axis. The offset centres the content, then each
//! axis is shifted independently so the indicator stays inside the minimap.

#[cfg(test)]
#[path = "minimap_test.rs"]
mod minimap_test;

use crate::camera::Camera;
use crate::consts::{MINIMAP_MAX_INDICATOR_RATIO, MINIMAP_MIN_INDICATOR_RATIO, MINIMAP_WORLD_PADDING};
use crate::doc::{GraphStore, NodeId};
use crate::geom::{Point, Rect};

/// Computed minimap projection for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapLayout {
    /// Minimap surface width in pixels.
    pub width: f64,
    /// Minimap surface height in pixels.
    pub height: f64,
    /// World units to minimap pixels.
    pub scale: f64,
    /// Minimap-space translation applied after scaling.
    pub offset: Point,
    /// Padded world area the projection was fitted to.
    pub world: Rect,
    /// Viewport indicator in minimap pixels.
    pub indicator: Rect,
}

impl MinimapLayout {
    /// Fit `store` and the visible viewport into a `width`×`height` minimap.
    #[must_use]
    pub fn compute(
        store: &GraphStore,
        camera: &Camera,
        viewport_width: f64,
        viewport_height: f64,
        width: f64,
        height: f64,
    ) -> Self {
        let view = camera.visible_world_rect(viewport_width, viewport_height);
        let world = store.bounds().map_or(view, |b| b.union(&view)).expand(MINIMAP_WORLD_PADDING);

        let fit = (width / world.width).min(height / world.height);
        let scale = if view.width > 0.0 && view.height > 0.0 {
            let longest = width.max(height);
            let vmax = view.longest_side();
            let lower = MINIMAP_MIN_INDICATOR_RATIO * longest / vmax;
            let upper = (MINIMAP_MAX_INDICATOR_RATIO * longest / vmax).min(width / view.width).min(height / view.height);
            fit.max(lower).min(upper)
        } else {
            fit
        };

        let mut offset = Point::new(
            (width - world.width * scale) * 0.5 - world.x * scale,
            (height - world.height * scale) * 0.5 - world.y * scale,
        );
        offset.x += edge_follow(view.x * scale + offset.x, view.width * scale, width);
        offset.y += edge_follow(view.y * scale + offset.y, view.height * scale, height);

        let indicator =
            Rect::new(view.x * scale + offset.x, view.y * scale + offset.y, view.width * scale, view.height * scale);
        Self { width, height, scale, offset, world, indicator }
    }

    #[must_use]
    pub fn world_to_minimap(&self, world: Point) -> Point {
        Point::new(world.x * self.scale + self.offset.x, world.y * self.scale + self.offset.y)
    }

    #[must_use]
    pub fn minimap_to_world(&self, point: Point) -> Point {
        Point::new((point.x - self.offset.x) / self.scale, (point.y - self.offset.y) / self.scale)
    }

    /// Node rectangles in minimap pixels, in store order.
    #[must_use]
    pub fn node_rects(&self, store: &GraphStore) -> Vec<(NodeId, Rect)> {
        store
            .nodes()
            .iter()
            .map(|n| {
                let origin = self.world_to_minimap(Point::new(n.x, n.y));
                (n.id.clone(), Rect::new(origin.x, origin.y, n.width * self.scale, n.height * self.scale))
            })
            .collect()
    }

    /// Camera that centres the main viewport on the world point under a
    /// minimap click.
    #[must_use]
    pub fn navigate_to(&self, camera: &Camera, point: Point, viewport_width: f64, viewport_height: f64) -> Camera {
        let mut next = *camera;
        next.center_on(self.minimap_to_world(point), Point::new(viewport_width * 0.5, viewport_height * 0.5));
        next
    }
}

/// Shift needed along one axis so `[start, start + len]` fits in `[0, limit]`.
fn edge_follow(start: f64, len: f64, limit: f64) -> f64 {
    if start < 0.0 {
        -start
    } else if start + len > limit {
        limit - (start + len)
    } else {
        0.0
    }
}

/// Indicator drag in progress.
///
/// Snapshots the camera and minimap scale at press time; every move
/// recomputes the pan from that snapshot so the re-fitting minimap can't
/// feed back into the gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapDrag {
    pub start: Point,
    pub start_camera: Camera,
    pub scale: f64,
}

impl MinimapDrag {
    #[must_use]
    pub fn begin(layout: &MinimapLayout, camera: &Camera, start: Point) -> Self {
        Self { start, start_camera: *camera, scale: layout.scale }
    }

    /// Main camera after moving the pointer to `current` (minimap pixels).
    ///
    /// Moving the indicator right by `d` pixels moves the viewport right by
    /// `d / scale` world units, i.e. pans the main view left by that much
    /// times the main zoom.
    #[must_use]
    pub fn camera_at(&self, current: Point) -> Camera {
        if self.scale <= 0.0 {
            return self.start_camera;
        }
        let delta = current.sub(self.start);
        let zoom = self.start_camera.zoom;
        Camera::panned_from(self.start_camera, Point::new(-delta.x / self.scale * zoom, -delta.y / self.scale * zoom))
    }
}
