//! Copy/paste of a selected subgraph with id remapping.
//!
//! Copying snapshots the selected nodes and only those connections whose
//! endpoints are both selected. Pasting mints fresh ids for every node and
//! connection and rewires the copied connections through an old-to-new id
//! map, so a paste can never reference the originals.

#[cfg(test)]
#[path = "clipboard_test.rs"]
mod clipboard_test;

use std::collections::HashMap;

use tracing::info;

use crate::doc::{Connection, ConnectionId, GraphStore, Node, NodeId};
use crate::geom::{Point, Rect};
use crate::selection::Selection;

/// Ids created by one paste.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteResult {
    pub nodes: Vec<NodeId>,
    pub connections: Vec<ConnectionId>,
}

/// Snapshot of a copied subgraph.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    pastes: u32,
}

impl Clipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Replace the clipboard with the selected nodes and their internal
    /// connections. Returns the number of nodes copied.
    pub fn copy(&mut self, store: &GraphStore, selection: &Selection) -> usize {
        self.nodes = store.nodes().iter().filter(|n| selection.contains(&n.id)).cloned().collect();
        for node in &mut self.nodes {
            node.is_loading = false;
        }
        self.connections = store
            .connections()
            .iter()
            .filter(|c| selection.contains(&c.source_id) && selection.contains(&c.target_id))
            .cloned()
            .collect();
        self.pastes = 0;
        self.nodes.len()
    }

    /// Insert a copy of the clipboard into `store`.
    ///
    /// With a `target` the copied bounds are centred on it; otherwise (or if
    /// that would land exactly on the originals) the copy is shifted by
    /// `offset` per paste so repeated pastes cascade.
    pub fn paste(&mut self, store: &mut GraphStore, target: Option<Point>, offset: f64) -> PasteResult {
        let Some(bounds) = Rect::union_all(self.nodes.iter().map(Node::rect)) else {
            return PasteResult::default();
        };
        self.pastes += 1;
        let cascade = offset * f64::from(self.pastes);
        let delta = match target {
            Some(p) => {
                let d = p.sub(bounds.center());
                if d.x.abs() < f64::EPSILON && d.y.abs() < f64::EPSILON { Point::new(cascade, cascade) } else { d }
            }
            None => Point::new(cascade, cascade),
        };

        let mut id_map: HashMap<NodeId, NodeId> = HashMap::new();
        let mut result = PasteResult::default();
        for original in &self.nodes {
            let mut node = original.clone();
            node.id = store.next_node_id();
            node.x += delta.x;
            node.y += delta.y;
            id_map.insert(original.id.clone(), node.id.clone());
            result.nodes.push(node.id.clone());
            store.insert_node(node);
        }
        for original in &self.connections {
            let (Some(source_id), Some(target_id)) = (id_map.get(&original.source_id), id_map.get(&original.target_id))
            else {
                continue;
            };
            let connection =
                Connection { id: store.next_connection_id(), source_id: source_id.clone(), target_id: target_id.clone() };
            result.connections.push(connection.id.clone());
            store.push_connection(connection);
        }
        info!(nodes = result.nodes.len(), connections = result.connections.len(), "pasted clipboard");
        result
    }
}
