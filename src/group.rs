//! Group nodes and stacking order.
//!
//! A group stores no child list. Membership is geometric and recomputed on
//! demand by [`members_of`]: a node belongs to a group while its bounds lie
//! inside the group's bounds. Ungrouping therefore only deletes the group
//! node itself.

#[cfg(test)]
#[path = "group_test.rs"]
mod group_test;

use serde_json::{Value, json};
use tracing::info;

use crate::consts::GROUP_COLORS;
use crate::doc::{GraphStore, Node, NodeId, NodeKind, NodePatch};
use crate::geom::Rect;
use crate::selection::Selection;

/// Action the group toolbar offers for the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAction {
    /// Two or more nodes are selected.
    Group,
    /// Exactly one group node is selected.
    Ungroup,
}

/// Every other node whose bounds lie entirely inside `group`'s bounds.
#[must_use]
pub fn members_of<'a>(group: &Node, nodes: &'a [Node]) -> Vec<&'a Node> {
    let area = group.rect();
    nodes.iter().filter(|n| n.id != group.id && area.contains_rect(&n.rect())).collect()
}

/// Union of the selected nodes' bounds grown by `padding`.
#[must_use]
pub fn group_bounds(store: &GraphStore, selection: &Selection, padding: f64) -> Option<Rect> {
    Rect::union_all(store.nodes().iter().filter(|n| selection.contains(&n.id)).map(Node::rect)).map(|r| r.expand(padding))
}

/// Which toolbar action applies, if any.
#[must_use]
pub fn toolbar_action(store: &GraphStore, selection: &Selection) -> Option<GroupAction> {
    let existing = selection.iter().filter(|id| store.contains_node(id)).count();
    if existing >= 2 {
        return Some(GroupAction::Group);
    }
    let single_group =
        existing == 1 && selection.iter().any(|id| store.node(id).is_some_and(|n| n.kind.is_group()));
    single_group.then_some(GroupAction::Ungroup)
}

/// Wrap the selection in a new group node.
///
/// Requires at least two existing selected nodes. The group is placed below
/// ordinary nodes and takes the first palette colour.
pub fn create_group(store: &mut GraphStore, selection: &Selection, padding: f64) -> Option<Node> {
    let existing = selection.iter().filter(|id| store.contains_node(id)).count();
    if existing < 2 {
        return None;
    }
    let bounds = group_bounds(store, selection, padding)?;
    let mut group = Node::new(store.next_node_id(), NodeKind::Group, bounds.x, bounds.y);
    group.width = bounds.width;
    group.height = bounds.height;
    group.payload.insert("color".to_owned(), json!(GROUP_COLORS[0]));
    info!(group_id = %group.id, members = existing, "group created");
    if store.insert_node(group.clone()) { Some(group) } else { None }
}

/// Delete a group node, leaving every former member untouched.
///
/// Returns `None` (and changes nothing) when `id` is not a group.
pub fn ungroup(store: &mut GraphStore, id: &NodeId) -> Option<Node> {
    if !store.node(id).is_some_and(|n| n.kind.is_group()) {
        return None;
    }
    let (group, _) = store.delete_node(id)?;
    info!(group_id = %id, "group dissolved");
    Some(group)
}

/// Set a group's colour. Returns `false` if `id` is not a group.
pub fn set_group_color(store: &mut GraphStore, id: &NodeId, color: &str) -> bool {
    if !store.node(id).is_some_and(|n| n.kind.is_group()) {
        return false;
    }
    let mut payload = serde_json::Map::new();
    payload.insert("color".to_owned(), Value::String(color.to_owned()));
    store.update_node(id, &NodePatch { payload: Some(payload), ..Default::default() })
}

/// Nodes in draw order, bottom first.
///
/// Groups rank lowest, then unselected nodes, then selected nodes, and the
/// node with an open media stack ranks highest. Ties keep store order.
#[must_use]
pub fn stacking_order<'a>(store: &'a GraphStore, selection: &Selection, media_stack: Option<&NodeId>) -> Vec<&'a Node> {
    let rank = |n: &Node| -> u8 {
        if n.kind.is_group() {
            0
        } else if media_stack == Some(&n.id) {
            3
        } else if selection.contains(&n.id) {
            2
        } else {
            1
        }
    };
    let mut order: Vec<&Node> = store.nodes().iter().collect();
    order.sort_by_key(|n| rank(n));
    order
}
