//! Node selection set and marquee membership.
//!
//! The selection is a plain set of node ids owned by the engine for the
//! lifetime of the session. Clicking a node either replaces it or adds to
//! it depending on the multi-select modifier; a marquee recomputes it from
//! scratch on every pointer move.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use std::collections::HashSet;

use crate::doc::{GraphStore, NodeId};
use crate::geom::Rect;
use crate::spatial::nodes_intersecting;

/// Set of selected node ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    nodes: HashSet<NodeId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn ids(&self) -> &HashSet<NodeId> {
        &self.nodes
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Make `id` the only selected node.
    pub fn select_only(&mut self, id: NodeId) {
        self.nodes.clear();
        self.nodes.insert(id);
    }

    pub fn remove(&mut self, id: &NodeId) {
        self.nodes.remove(id);
    }

    /// Replace the whole selection.
    pub fn replace<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.nodes.clear();
        self.nodes.extend(ids);
    }

    /// Apply a press on node `id`.
    ///
    /// With the multi-select modifier the node is added. Without it, a node
    /// that is already selected keeps the current selection (so a
    /// multi-selection can be dragged as a unit); any other node replaces it.
    pub fn press(&mut self, id: &NodeId, multi: bool) {
        if multi {
            self.nodes.insert(id.clone());
        } else if !self.nodes.contains(id) {
            self.select_only(id.clone());
        }
    }
}

/// Selection produced by a marquee covering `world_rect`.
///
/// Every node whose bounding box intersects the rectangle is selected. With
/// `base` (multi-select held when the marquee started) the result is the
/// union with that snapshot.
#[must_use]
pub fn marquee_select(store: &GraphStore, world_rect: Rect, base: Option<&Selection>) -> Selection {
    let mut nodes = nodes_intersecting(store, world_rect);
    if let Some(base) = base {
        nodes.extend(base.nodes.iter().cloned());
    }
    Selection { nodes }
}
