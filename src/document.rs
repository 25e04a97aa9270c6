//! Persisted workflow documents: `{ nodes, connections, transform, version }`.
//!
//! Parsing is all-or-nothing for structural problems: a missing `nodes` or
//! `connections` array, malformed JSON, an unknown node kind, invalid
//! geometry, or a repeated node id rejects the whole document. Connections
//! that would not pass [`validate_connection`] against the parsed nodes are
//! dropped with a warning and the rest of the document still loads.
//!
//! Callers parse first and only then replace live state, so a failed load
//! never touches the current graph.

#[cfg(test)]
#[path = "document_test.rs"]
mod document_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::camera::{Camera, clamp_zoom};
use crate::connection::validate_connection;
use crate::consts::DOCUMENT_VERSION;
use crate::doc::{Connection, GraphStore, Node, NodeKind};
use crate::geom::Rect;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document is not a JSON object")]
    NotAnObject,
    #[error("document is missing `{0}`")]
    MissingField(&'static str),
    #[error("node {id} has invalid geometry")]
    InvalidGeometry { id: String },
    #[error("duplicate node id {0}")]
    DuplicateNode(String),
}

fn default_version() -> String {
    DOCUMENT_VERSION.to_owned()
}

/// A workflow as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub transform: Camera,
    #[serde(default = "default_version")]
    pub version: String,
}

/// Node counts and extent of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSummary {
    /// Count per kind, in palette order, including zero counts.
    pub kinds: Vec<(NodeKind, usize)>,
    pub connections: usize,
    pub bounds: Option<Rect>,
}

impl WorkflowDocument {
    /// Snapshot live state for export.
    #[must_use]
    pub fn from_state(store: &GraphStore, camera: &Camera) -> Self {
        Self {
            nodes: store.nodes().to_vec(),
            connections: store.connections().to_vec(),
            transform: *camera,
            version: default_version(),
        }
    }

    /// Parse and validate a document.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentError`] for any structural problem. Invalid
    /// connections are not errors; they are dropped.
    pub fn parse(json: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(json)?;
        let Some(object) = value.as_object() else {
            return Err(DocumentError::NotAnObject);
        };
        for field in ["nodes", "connections"] {
            if !object.contains_key(field) {
                warn!(field, "rejected workflow document");
                return Err(DocumentError::MissingField(field));
            }
        }
        let mut doc: Self = serde_json::from_value(value)?;

        let mut seen = HashSet::new();
        for node in &doc.nodes {
            if !node.has_valid_geometry() {
                warn!(node_id = %node.id, "rejected workflow document: invalid geometry");
                return Err(DocumentError::InvalidGeometry { id: node.id.to_string() });
            }
            if !seen.insert(node.id.clone()) {
                warn!(node_id = %node.id, "rejected workflow document: duplicate node id");
                return Err(DocumentError::DuplicateNode(node.id.to_string()));
            }
        }

        // Loading flags never survive a reload.
        for node in &mut doc.nodes {
            node.is_loading = false;
        }

        let mut store = GraphStore::new();
        store.replace_all(doc.nodes.clone(), Vec::new());
        let mut connection_ids = HashSet::new();
        doc.connections.retain(|c| {
            if let Err(reason) = validate_connection(&store, &c.source_id, &c.target_id) {
                warn!(connection_id = %c.id, %reason, "dropping invalid connection");
                return false;
            }
            if !connection_ids.insert(c.id.clone()) {
                warn!(connection_id = %c.id, "dropping duplicate connection id");
                return false;
            }
            true
        });
        doc.transform.zoom = clamp_zoom(doc.transform.zoom);
        info!(nodes = doc.nodes.len(), connections = doc.connections.len(), "workflow document parsed");
        Ok(doc)
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn summary(&self) -> DocumentSummary {
        let kinds = NodeKind::ALL
            .iter()
            .map(|kind| (*kind, self.nodes.iter().filter(|n| n.kind == *kind).count()))
            .collect();
        DocumentSummary {
            kinds,
            connections: self.connections.len(),
            bounds: Rect::union_all(self.nodes.iter().map(Node::rect)),
        }
    }
}
