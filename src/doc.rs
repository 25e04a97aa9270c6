//! Graph model: nodes, connections, sparse node patches, and the in-memory store.
//!
//! This module defines what is on the canvas (`Node`, `NodeKind`,
//! `Connection`), a sparse-update type for incremental edits (`NodePatch`),
//! a typed accessor for the open-ended per-kind payload (`Props`), and the
//! runtime store that owns all live nodes and connections (`GraphStore`).
//!
//! The store is the one place referential integrity is enforced: deleting a
//! node cascades to every connection touching it. Connection validation
//! (port direction, self-loops) lives in [`crate::connection`].

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::geom::{Point, Rect};
use crate::id::fresh_id;

/// Unique identifier for a node within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Unique identifier for a connection within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// The kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    /// Prompt-driven image generation.
    TextToImage,
    /// Prompt-driven video generation.
    TextToVideo,
    /// Free-form creative description that feeds downstream prompts.
    CreativeDesc,
    /// Imported still image. Output only.
    Image,
    /// Imported video clip. Output only.
    Video,
    /// Visual container. No ports; membership is geometric.
    Group,
}

impl NodeKind {
    /// Every kind, in palette order.
    pub const ALL: [NodeKind; 6] = [
        NodeKind::TextToImage,
        NodeKind::TextToVideo,
        NodeKind::CreativeDesc,
        NodeKind::Image,
        NodeKind::Video,
        NodeKind::Group,
    ];

    /// Kinds offered when a wire is dropped on empty canvas.
    pub const QUICK_ADD: [NodeKind; 3] = [NodeKind::TextToImage, NodeKind::TextToVideo, NodeKind::CreativeDesc];

    /// Whether nodes of this kind expose an input port.
    #[must_use]
    pub fn accepts_input(self) -> bool {
        matches!(self, Self::TextToImage | Self::TextToVideo | Self::CreativeDesc)
    }

    /// Whether nodes of this kind expose an output port.
    #[must_use]
    pub fn has_output(self) -> bool {
        !self.is_group()
    }

    #[must_use]
    pub fn is_group(self) -> bool {
        matches!(self, Self::Group)
    }

    /// Default `(width, height)` in world units for a freshly created node.
    #[must_use]
    pub fn default_size(self) -> (f64, f64) {
        match self {
            Self::TextToImage | Self::TextToVideo => (320.0, 380.0),
            Self::CreativeDesc => (300.0, 260.0),
            Self::Image => (280.0, 280.0),
            Self::Video => (320.0, 240.0),
            Self::Group => (400.0, 300.0),
        }
    }

    #[must_use]
    pub fn default_title(self) -> &'static str {
        match self {
            Self::TextToImage => "Text to Image",
            Self::TextToVideo => "Text to Video",
            Self::CreativeDesc => "Creative Description",
            Self::Image => "Image",
            Self::Video => "Video",
            Self::Group => "Group",
        }
    }
}

/// Payload keys that shadow typed node fields and are never stored in the bag.
pub const RESERVED_KEYS: [&str; 8] = ["id", "type", "x", "y", "width", "height", "title", "isLoading"];

fn is_false(b: &bool) -> bool {
    !*b
}

/// A node as stored in the graph and in workflow documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier for this node.
    pub id: NodeId,
    /// Node kind; decides ports, default size and title.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Left edge in world coordinates.
    pub x: f64,
    /// Top edge in world coordinates.
    pub y: f64,
    /// Width in world units, always positive.
    pub width: f64,
    /// Height in world units, always positive.
    pub height: f64,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Set while a generation request for this node is in flight.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_loading: bool,
    /// Opaque per-kind fields (prompt, media URLs, generation config).
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Node {
    /// A node of `kind` with default size and title, top-left at `(x, y)`.
    #[must_use]
    pub fn new(id: NodeId, kind: NodeKind, x: f64, y: f64) -> Self {
        let (width, height) = kind.default_size();
        Self {
            id,
            kind,
            x,
            y,
            width,
            height,
            title: kind.default_title().to_owned(),
            is_loading: false,
            payload: Map::new(),
        }
    }

    /// World-space bounding box.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// World position of the implicit output port (right-edge midpoint).
    #[must_use]
    pub fn output_anchor(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height * 0.5)
    }

    /// World position of the implicit input port (left-edge midpoint).
    #[must_use]
    pub fn input_anchor(&self) -> Point {
        Point::new(self.x, self.y + self.height * 0.5)
    }

    /// Typed view over the payload bag.
    #[must_use]
    pub fn props(&self) -> Props<'_> {
        Props::new(&self.payload)
    }

    /// Whether the geometry satisfies the positive, finite size invariant.
    #[must_use]
    pub fn has_valid_geometry(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// A directed edge from one node's output port to another node's input port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub source_id: NodeId,
    pub target_id: NodeId,
}

impl Connection {
    /// Whether either endpoint is `id`.
    #[must_use]
    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source_id == id || &self.target_id == id
    }
}

/// Sparse update for a node. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_loading: Option<bool>,
    /// Payload keys to merge or remove (null values delete keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Map<String, Value>>,
}

impl NodePatch {
    /// Patch that moves a node's top-left corner.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }

    /// Patch that replaces a node's full bounds.
    #[must_use]
    pub fn bounds(rect: Rect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            ..Default::default()
        }
    }

    /// Patch that only toggles the loading flag.
    #[must_use]
    pub fn loading(is_loading: bool) -> Self {
        Self { is_loading: Some(is_loading), ..Default::default() }
    }

    /// Split a flat field map (as produced by an external collaborator) into
    /// typed fields and payload. Typed keys with the wrong JSON type are ignored.
    #[must_use]
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        let mut patch = Self::default();
        let mut payload = Map::new();
        for (key, value) in fields {
            match key.as_str() {
                "x" => patch.x = value.as_f64(),
                "y" => patch.y = value.as_f64(),
                "width" => patch.width = value.as_f64(),
                "height" => patch.height = value.as_f64(),
                "title" => patch.title = value.as_str().map(str::to_owned),
                "isLoading" => patch.is_loading = value.as_bool(),
                "id" | "type" => {}
                _ => {
                    payload.insert(key, value);
                }
            }
        }
        if !payload.is_empty() {
            patch.payload = Some(payload);
        }
        patch
    }
}

/// Typed access to common payload fields.
pub struct Props<'a> {
    value: &'a Map<String, Value>,
}

impl<'a> Props<'a> {
    #[must_use]
    pub fn new(value: &'a Map<String, Value>) -> Self {
        Self { value }
    }

    /// Prompt text. Empty string when absent.
    #[must_use]
    pub fn prompt(&self) -> &str {
        self.value.get("prompt").and_then(Value::as_str).unwrap_or("")
    }

    /// Group fill colour as a CSS string, if set.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        self.value.get("color").and_then(Value::as_str)
    }

    /// Generated or imported media URLs, oldest first.
    #[must_use]
    pub fn media_urls(&self) -> Vec<&str> {
        self.value
            .get("mediaUrls")
            .and_then(Value::as_array)
            .map(|urls| urls.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// In-memory store of nodes and connections.
///
/// Node order is insertion order except that groups are kept at the front,
/// so array order doubles as the stacking tie-breaker.
#[derive(Debug, Default, Clone)]
pub struct GraphStore {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
}

impl GraphStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    #[must_use]
    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| &c.id == id)
    }

    /// Number of nodes currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the store contains no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// A node id not used by any live node.
    #[must_use]
    pub fn next_node_id(&self) -> NodeId {
        NodeId(fresh_id("n", |candidate| self.nodes.iter().any(|n| n.id.as_str() == candidate)))
    }

    /// A connection id not used by any live connection.
    #[must_use]
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(fresh_id("c", |candidate| self.connections.iter().any(|c| c.id.as_str() == candidate)))
    }

    /// Create a node of `kind` with a fresh id and default size and title.
    ///
    /// With a `position` the node's top-left lands there; without one the
    /// node is centred on `viewport_center` (world space).
    pub fn add_node(&mut self, kind: NodeKind, position: Option<Point>, viewport_center: Point) -> Node {
        let (width, height) = kind.default_size();
        let top_left = position.unwrap_or(Point::new(viewport_center.x - width * 0.5, viewport_center.y - height * 0.5));
        let node = Node::new(self.next_node_id(), kind, top_left.x, top_left.y);
        debug!(node_id = %node.id, ?kind, "node added");
        self.push_node(node.clone());
        node
    }

    /// Insert a fully formed node. Returns `false` when the id is taken or
    /// the geometry is invalid.
    pub fn insert_node(&mut self, node: Node) -> bool {
        if self.contains_node(&node.id) || !node.has_valid_geometry() {
            return false;
        }
        self.push_node(node);
        true
    }

    fn push_node(&mut self, node: Node) {
        if node.kind.is_group() {
            let first_non_group = self.nodes.iter().position(|n| !n.kind.is_group()).unwrap_or(self.nodes.len());
            self.nodes.insert(first_non_group, node);
        } else {
            self.nodes.push(node);
        }
    }

    /// Shallow-merge `patch` into an existing node. Returns `false` if the
    /// node doesn't exist.
    ///
    /// Non-positive or non-finite sizes and non-finite positions are ignored
    /// so the size invariant cannot be broken by a patch.
    pub fn update_node(&mut self, id: &NodeId, patch: &NodePatch) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| &n.id == id) else {
            return false;
        };
        if let Some(x) = patch.x.filter(|v| v.is_finite()) {
            node.x = x;
        }
        if let Some(y) = patch.y.filter(|v| v.is_finite()) {
            node.y = y;
        }
        if let Some(w) = patch.width.filter(|v| v.is_finite() && *v > 0.0) {
            node.width = w;
        }
        if let Some(h) = patch.height.filter(|v| v.is_finite() && *v > 0.0) {
            node.height = h;
        }
        if let Some(ref title) = patch.title {
            node.title.clone_from(title);
        }
        if let Some(loading) = patch.is_loading {
            node.is_loading = loading;
        }
        if let Some(ref incoming) = patch.payload {
            for (k, v) in incoming {
                if RESERVED_KEYS.contains(&k.as_str()) {
                    continue;
                }
                if v.is_null() {
                    node.payload.remove(k);
                } else {
                    node.payload.insert(k.clone(), v.clone());
                }
            }
        }
        true
    }

    /// Remove a node and every connection where either endpoint is `id`.
    ///
    /// Returns the removed node and the cascaded connections, or `None` if
    /// the node was absent (in which case nothing changes).
    pub fn delete_node(&mut self, id: &NodeId) -> Option<(Node, Vec<Connection>)> {
        let index = self.nodes.iter().position(|n| &n.id == id)?;
        let node = self.nodes.remove(index);
        let (removed, kept): (Vec<Connection>, Vec<Connection>) =
            std::mem::take(&mut self.connections).into_iter().partition(|c| c.touches(id));
        self.connections = kept;
        debug!(node_id = %id, cascaded = removed.len(), "node deleted");
        Some((node, removed))
    }

    /// Append a connection without validation. Callers go through
    /// [`crate::connection::create_connection`].
    pub(crate) fn push_connection(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    /// Unconditionally delete a connection by id.
    pub fn remove_connection(&mut self, id: &ConnectionId) -> Option<Connection> {
        let index = self.connections.iter().position(|c| &c.id == id)?;
        Some(self.connections.remove(index))
    }

    /// Replace the whole graph. Group nodes are moved to the front.
    pub fn replace_all(&mut self, nodes: Vec<Node>, connections: Vec<Connection>) {
        self.nodes.clear();
        for node in nodes {
            self.push_node(node);
        }
        self.connections = connections;
    }

    /// Remove every node and connection.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
    }

    /// Union of all node bounds, or `None` for an empty graph.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        Rect::union_all(self.nodes.iter().map(Node::rect))
    }
}
