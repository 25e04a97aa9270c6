//! Connection manager: port validation, edge creation/removal, and curve geometry.
//!
//! A connection always runs from a node's output port (right-edge midpoint)
//! to another node's input port (left-edge midpoint). Invalid attempts are
//! routine pointer misses, so [`create_connection`] returns `None` and logs
//! at debug level rather than surfacing an error.

#[cfg(test)]
#[path = "connection_test.rs"]
mod connection_test;

use tracing::debug;

use crate::consts::{BEZIER_MAX_OFFSET, BEZIER_MIN_OFFSET, BEZIER_SAMPLES};
use crate::doc::{Connection, ConnectionId, GraphStore, Node, NodeId};
use crate::geom::{Point, Rect};

/// Why a connection attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConnectRejection {
    #[error("source and target are the same node")]
    SelfLoop,
    #[error("source node does not exist")]
    MissingSource,
    #[error("target node does not exist")]
    MissingTarget,
    #[error("source node has no output port")]
    SourceHasNoOutput,
    #[error("target node has no input port")]
    TargetHasNoInput,
}

/// Check every precondition for a `source -> target` connection.
///
/// Parallel connections between the same pair are allowed.
///
/// # Errors
///
/// Returns the first failed precondition.
pub fn validate_connection(store: &GraphStore, source: &NodeId, target: &NodeId) -> Result<(), ConnectRejection> {
    if source == target {
        return Err(ConnectRejection::SelfLoop);
    }
    let src = store.node(source).ok_or(ConnectRejection::MissingSource)?;
    let dst = store.node(target).ok_or(ConnectRejection::MissingTarget)?;
    if !src.kind.has_output() {
        return Err(ConnectRejection::SourceHasNoOutput);
    }
    if !dst.kind.accepts_input() {
        return Err(ConnectRejection::TargetHasNoInput);
    }
    Ok(())
}

/// Create a connection if valid; otherwise do nothing and return `None`.
pub fn create_connection(store: &mut GraphStore, source: &NodeId, target: &NodeId) -> Option<Connection> {
    if let Err(reason) = validate_connection(store, source, target) {
        debug!(%source, %target, %reason, "connection rejected");
        return None;
    }
    let connection = Connection { id: store.next_connection_id(), source_id: source.clone(), target_id: target.clone() };
    debug!(connection_id = %connection.id, %source, %target, "connection created");
    store.push_connection(connection.clone());
    Some(connection)
}

/// Unconditionally delete a connection.
pub fn remove_connection(store: &mut GraphStore, id: &ConnectionId) -> Option<Connection> {
    store.remove_connection(id)
}

/// Horizontal bezier control-point offset: half the horizontal span,
/// clamped to `[BEZIER_MIN_OFFSET, BEZIER_MAX_OFFSET]`.
#[must_use]
pub fn control_offset(source_x: f64, target_x: f64) -> f64 {
    ((target_x - source_x).abs() / 2.0).clamp(BEZIER_MIN_OFFSET, BEZIER_MAX_OFFSET)
}

/// World-space cubic bezier for one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionPath {
    pub id: ConnectionId,
    pub from: Point,
    pub ctrl1: Point,
    pub ctrl2: Point,
    pub to: Point,
}

impl ConnectionPath {
    /// Curve between two port anchors.
    #[must_use]
    pub fn between(id: ConnectionId, from: Point, to: Point) -> Self {
        let cp = control_offset(from.x, to.x);
        Self { id, from, ctrl1: Point::new(from.x + cp, from.y), ctrl2: Point::new(to.x - cp, to.y), to }
    }

    /// Point on the curve at parameter `t` in `[0, 1]`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        let a = u * u * u;
        let b = 3.0 * u * u * t;
        let c = 3.0 * u * t * t;
        let d = t * t * t;
        Point::new(
            a * self.from.x + b * self.ctrl1.x + c * self.ctrl2.x + d * self.to.x,
            a * self.from.y + b * self.ctrl1.y + c * self.ctrl2.y + d * self.to.y,
        )
    }

    /// Polyline approximation with `BEZIER_SAMPLES` segments.
    #[must_use]
    pub fn flatten(&self) -> Vec<Point> {
        #[allow(clippy::cast_precision_loss)]
        let steps = BEZIER_SAMPLES as f64;
        (0..=BEZIER_SAMPLES)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f64 / steps;
                self.point_at(t)
            })
            .collect()
    }

    /// Bounding box of the control polygon; always contains the curve.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        let xs = [self.from.x, self.ctrl1.x, self.ctrl2.x, self.to.x];
        let ys = [self.from.y, self.ctrl1.y, self.ctrl2.y, self.to.y];
        let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let max_x = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min_y = ys.iter().copied().fold(f64::INFINITY, f64::min);
        let max_y = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Approximate distance from `p` to the curve.
    #[must_use]
    pub fn distance_to(&self, p: Point) -> f64 {
        self.flatten()
            .windows(2)
            .map(|seg| point_to_segment_distance(p, seg[0], seg[1]))
            .fold(f64::INFINITY, f64::min)
    }

    /// SVG path data, `M sx sy C c1x c1y, c2x c2y, tx ty`.
    #[must_use]
    pub fn svg(&self) -> String {
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            self.from.x, self.from.y, self.ctrl1.x, self.ctrl1.y, self.ctrl2.x, self.ctrl2.y, self.to.x, self.to.y
        )
    }
}

fn point_to_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b.sub(a);
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq <= f64::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + ab.x * t, a.y + ab.y * t))
}

/// Curve for a stored connection, or `None` if an endpoint is missing.
#[must_use]
pub fn connection_path(store: &GraphStore, connection: &Connection) -> Option<ConnectionPath> {
    let source = store.node(&connection.source_id)?;
    let target = store.node(&connection.target_id)?;
    Some(ConnectionPath::between(connection.id.clone(), source.output_anchor(), target.input_anchor()))
}

/// Straight provisional line from a source's output port to the pointer.
#[must_use]
pub fn temp_line(store: &GraphStore, source: &NodeId, pointer_world: Point) -> Option<(Point, Point)> {
    store.node(source).map(|n| (n.output_anchor(), pointer_world))
}

/// Existing nodes that could accept a wire from `source`, nearest input
/// port to `near` first, at most `limit` of them.
#[must_use]
pub fn suggest_targets(store: &GraphStore, source: &NodeId, near: Point, limit: usize) -> Vec<NodeId> {
    let mut candidates: Vec<(&Node, f64)> = store
        .nodes()
        .iter()
        .filter(|n| validate_connection(store, source, &n.id).is_ok())
        .map(|n| (n, n.input_anchor().distance(near)))
        .collect();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
    candidates.into_iter().take(limit).map(|(n, _)| n.id.clone()).collect()
}
