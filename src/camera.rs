#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_ZOOM, MIN_ZOOM};
use crate::geom::{Point, Rect};

/// Viewport transform for pan/zoom on the infinite canvas.
///
/// `pan_x` / `pan_y` are the screen-space translation in pixels.
/// `zoom` is a scale factor (1.0 = no zoom), always within [`MIN_ZOOM`, `MAX_ZOOM`].
///
/// Serialized as `{ "x", "y", "k" }`, the shape used by workflow documents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    #[serde(rename = "x")]
    pub pan_x: f64,
    #[serde(rename = "y")]
    pub pan_y: f64,
    #[serde(rename = "k")]
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

/// Clamp a requested scale into the allowed zoom range.
#[must_use]
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return 1.0;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

impl Camera {
    /// Convert a screen-space point (pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a world-space point to screen coordinates (pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.zoom + self.pan_x,
            y: world.y * self.zoom + self.pan_y,
        }
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Convert a screen-space rectangle to world space.
    #[must_use]
    pub fn screen_rect_to_world(&self, rect: Rect) -> Rect {
        let origin = self.screen_to_world(Point::new(rect.x, rect.y));
        Rect::new(origin.x, origin.y, rect.width / self.zoom, rect.height / self.zoom)
    }

    /// Convert a world-space rectangle to screen space.
    #[must_use]
    pub fn world_rect_to_screen(&self, rect: Rect) -> Rect {
        let origin = self.world_to_screen(Point::new(rect.x, rect.y));
        Rect::new(origin.x, origin.y, rect.width * self.zoom, rect.height * self.zoom)
    }

    /// Zoom to `new_zoom` (clamped) while keeping the world point under
    /// `anchor` fixed on screen.
    pub fn zoom_at(&mut self, anchor: Point, new_zoom: f64) {
        let world = self.screen_to_world(anchor);
        let zoom = clamp_zoom(new_zoom);
        self.zoom = zoom;
        self.pan_x = anchor.x - world.x * zoom;
        self.pan_y = anchor.y - world.y * zoom;
    }

    /// The camera obtained by translating `start` by a total screen delta.
    ///
    /// Pan gestures always recompute from their start snapshot instead of
    /// accumulating per-event deltas.
    #[must_use]
    pub fn panned_from(start: Camera, delta: Point) -> Camera {
        Camera { pan_x: start.pan_x + delta.x, pan_y: start.pan_y + delta.y, zoom: start.zoom }
    }

    /// Pan so that `world` sits at the screen point `screen`.
    pub fn center_on(&mut self, world: Point, screen: Point) {
        self.pan_x = screen.x - world.x * self.zoom;
        self.pan_y = screen.y - world.y * self.zoom;
    }

    /// World-space rectangle currently covered by a viewport of the given size.
    #[must_use]
    pub fn visible_world_rect(&self, viewport_width: f64, viewport_height: f64) -> Rect {
        self.screen_rect_to_world(Rect::new(0.0, 0.0, viewport_width, viewport_height))
    }
}
