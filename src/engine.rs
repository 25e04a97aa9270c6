//! Interaction engine: owns the graph, camera, selection and gesture state.
//!
//! Every host event goes through one `&mut Engine` call that runs to
//! completion and returns the [`Action`]s the host should apply (persist a
//! node, change the cursor, redraw). Exactly one [`InputState`] is active at
//! a time and every gesture ends back in [`InputState::Idle`], whether the
//! release arrives normally, through [`Engine::on_pointer_cancel`], or via
//! Escape.
//!
//! Moves recompute from the snapshot taken at press time: pan from the
//! starting camera, drags from each node's starting position, resizes from
//! the starting bounds. Position and size changes are applied to the store
//! live but only reported as `NodeUpdated` once, on release.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::camera::{Camera, clamp_zoom};
use crate::clipboard::Clipboard;
use crate::config::EditorConfig;
use crate::connection::{create_connection, remove_connection, suggest_targets, temp_line};
use crate::consts::{MAX_CONNECT_SUGGESTIONS, ZOOM_STEP};
use crate::doc::{Connection, ConnectionId, GraphStore, Node, NodeId, NodeKind, NodePatch};
use crate::document::{DocumentError, WorkflowDocument};
use crate::generation::GenerationRequest;
use crate::geom::{Point, Rect};
use crate::group::{self, GroupAction, members_of};
use crate::hit::{HitTarget, hit_test, input_port_at};
use crate::input::{
    Button, ElementKind, InputState, Key, Modifiers, Pinch, QuickAddMenu, TouchPoint, UiState, WheelDelta,
};
use crate::minimap::{MinimapDrag, MinimapLayout};
use crate::selection::{Selection, marquee_select};

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    NodeCreated(Node),
    NodeUpdated { id: NodeId, fields: NodePatch },
    NodeDeleted { id: NodeId },
    ConnectionCreated(Connection),
    ConnectionRemoved { id: ConnectionId },
    SelectionChanged,
    QuickAddOpened { source_id: NodeId, screen: Point },
    ContextMenuRequested { node_id: Option<NodeId>, screen: Point },
    SetCursor(String),
    RenderNeeded,
}

/// The canvas interaction engine.
pub struct Engine {
    pub store: GraphStore,
    pub camera: Camera,
    pub ui: UiState,
    pub input: InputState,
    pub config: EditorConfig,
    pub viewport_width: f64,
    pub viewport_height: f64,
    clipboard: Clipboard,
    touches: Vec<TouchPoint>,
    last_pointer_screen: Option<Point>,
    cursor: String,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Engine {
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self {
            store: GraphStore::new(),
            camera: Camera::default(),
            ui: UiState::default(),
            input: InputState::default(),
            config,
            viewport_width: 0.0,
            viewport_height: 0.0,
            clipboard: Clipboard::new(),
            touches: Vec::new(),
            last_pointer_screen: None,
            cursor: "default".to_owned(),
        }
    }

    // --- Viewport ---

    /// Update viewport dimensions in CSS pixels.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    fn viewport_center_screen(&self) -> Point {
        Point::new(self.viewport_width * 0.5, self.viewport_height * 0.5)
    }

    /// World point at the centre of the viewport.
    #[must_use]
    pub fn viewport_center_world(&self) -> Point {
        self.camera.screen_to_world(self.viewport_center_screen())
    }

    /// Zoom to `zoom` (clamped), keeping the viewport centre fixed.
    pub fn set_zoom(&mut self, zoom: f64) -> Vec<Action> {
        let center = self.viewport_center_screen();
        self.camera.zoom_at(center, zoom);
        vec![Action::RenderNeeded]
    }

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.set_zoom(step_zoom(self.camera.zoom, ZOOM_STEP))
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.set_zoom(step_zoom(self.camera.zoom, -ZOOM_STEP))
    }

    pub fn reset_zoom(&mut self) -> Vec<Action> {
        self.set_zoom(1.0)
    }

    // --- Graph operations ---

    /// Create a node. Without a position it is centred on the viewport.
    pub fn add_node(&mut self, kind: NodeKind, position: Option<Point>) -> Node {
        let center = self.viewport_center_world();
        self.store.add_node(kind, position, center)
    }

    /// Merge a patch into a node. Absent ids are a no-op.
    pub fn update_node(&mut self, id: &NodeId, patch: NodePatch) -> Vec<Action> {
        if !self.store.update_node(id, &patch) {
            debug!(node_id = %id, "update for absent node ignored");
            return Vec::new();
        }
        vec![Action::NodeUpdated { id: id.clone(), fields: patch }, Action::RenderNeeded]
    }

    /// Delete a node and every connection touching it.
    pub fn delete_node(&mut self, id: &NodeId) -> Vec<Action> {
        let Some((_, cascaded)) = self.store.delete_node(id) else {
            return Vec::new();
        };
        let mut actions = Vec::new();
        for connection in cascaded {
            if self.ui.selected_connection.as_ref() == Some(&connection.id) {
                self.ui.selected_connection = None;
            }
            actions.push(Action::ConnectionRemoved { id: connection.id });
        }
        if self.ui.media_stack.as_ref() == Some(id) {
            self.ui.media_stack = None;
        }
        if self.ui.quick_add.as_ref().is_some_and(|m| &m.source_id == id) {
            self.ui.quick_add = None;
        }
        if self.ui.selection.contains(id) {
            self.ui.selection.remove(id);
            actions.push(Action::SelectionChanged);
        }
        actions.push(Action::NodeDeleted { id: id.clone() });
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Delete the selected connection, or else every selected node.
    pub fn delete_selection(&mut self) -> Vec<Action> {
        if let Some(id) = self.ui.selected_connection.take() {
            return self.disconnect(&id);
        }
        let mut ids: Vec<NodeId> = self.ui.selection.iter().cloned().collect();
        ids.sort();
        let mut actions = Vec::new();
        for id in &ids {
            actions.extend(self.delete_node(id));
        }
        actions
    }

    /// Connect `source`'s output to `target`'s input. Invalid pairs are
    /// silently ignored.
    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> Vec<Action> {
        match create_connection(&mut self.store, source, target) {
            Some(connection) => vec![Action::ConnectionCreated(connection), Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    pub fn disconnect(&mut self, id: &ConnectionId) -> Vec<Action> {
        if self.ui.selected_connection.as_ref() == Some(id) {
            self.ui.selected_connection = None;
        }
        match remove_connection(&mut self.store, id) {
            Some(_) => vec![Action::ConnectionRemoved { id: id.clone() }, Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    /// Reset to an empty canvas.
    pub fn new_workflow(&mut self) -> Vec<Action> {
        self.store.clear();
        self.camera = Camera::default();
        self.ui = UiState::default();
        self.input = InputState::Idle;
        self.touches.clear();
        info!("new workflow");
        vec![Action::SelectionChanged, Action::RenderNeeded]
    }

    // --- Selection ---

    pub fn select_all(&mut self) -> Vec<Action> {
        self.ui.selected_connection = None;
        self.ui.selection.replace(self.store.nodes().iter().map(|n| n.id.clone()));
        vec![Action::SelectionChanged, Action::RenderNeeded]
    }

    pub fn clear_selection(&mut self) -> Vec<Action> {
        let had = !self.ui.selection.is_empty() || self.ui.selected_connection.is_some();
        self.ui.selection.clear();
        self.ui.selected_connection = None;
        if had { vec![Action::SelectionChanged, Action::RenderNeeded] } else { Vec::new() }
    }

    // --- Grouping ---

    /// What the group toolbar offers for the current selection.
    #[must_use]
    pub fn toolbar_action(&self) -> Option<GroupAction> {
        group::toolbar_action(&self.store, &self.ui.selection)
    }

    /// Wrap the selection in a new group, which becomes the selection.
    pub fn group_selection(&mut self) -> Vec<Action> {
        let Some(node) = group::create_group(&mut self.store, &self.ui.selection, self.config.group_padding) else {
            return Vec::new();
        };
        self.ui.selection.select_only(node.id.clone());
        vec![Action::NodeCreated(node), Action::SelectionChanged, Action::RenderNeeded]
    }

    /// Dissolve the single selected group.
    pub fn ungroup_selection(&mut self) -> Vec<Action> {
        if self.toolbar_action() != Some(GroupAction::Ungroup) {
            return Vec::new();
        }
        let Some(id) = self.ui.selection.iter().next().cloned() else {
            return Vec::new();
        };
        if group::ungroup(&mut self.store, &id).is_none() {
            return Vec::new();
        }
        self.ui.selection.clear();
        vec![Action::NodeDeleted { id }, Action::SelectionChanged, Action::RenderNeeded]
    }

    pub fn set_group_color(&mut self, id: &NodeId, color: &str) -> Vec<Action> {
        if !group::set_group_color(&mut self.store, id, color) {
            return Vec::new();
        }
        let mut payload = Map::new();
        payload.insert("color".to_owned(), Value::String(color.to_owned()));
        vec![
            Action::NodeUpdated { id: id.clone(), fields: NodePatch { payload: Some(payload), ..Default::default() } },
            Action::RenderNeeded,
        ]
    }

    // --- Clipboard ---

    /// Copy the selected nodes. Returns how many were copied.
    pub fn copy(&mut self) -> usize {
        self.clipboard.copy(&self.store, &self.ui.selection)
    }

    pub fn cut(&mut self) -> Vec<Action> {
        if self.copy() == 0 {
            return Vec::new();
        }
        self.delete_selection()
    }

    /// Paste the clipboard near the pointer (or offset from the originals)
    /// and select the pasted nodes.
    pub fn paste(&mut self) -> Vec<Action> {
        let target = self.last_pointer_screen.map(|p| self.camera.screen_to_world(p));
        let result = self.clipboard.paste(&mut self.store, target, self.config.paste_offset);
        if result.nodes.is_empty() {
            return Vec::new();
        }
        let mut actions: Vec<Action> =
            result.nodes.iter().filter_map(|id| self.store.node(id)).cloned().map(Action::NodeCreated).collect();
        actions.extend(
            result.connections.iter().filter_map(|id| self.store.connection(id)).cloned().map(Action::ConnectionCreated),
        );
        self.ui.selected_connection = None;
        self.ui.selection.replace(result.nodes);
        actions.push(Action::SelectionChanged);
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Quick add ---

    /// Create a node of `kind` at the open quick-add menu, wired from its source.
    pub fn quick_add(&mut self, kind: NodeKind) -> Vec<Action> {
        let Some(menu) = self.ui.quick_add.take() else {
            return Vec::new();
        };
        let (_, height) = kind.default_size();
        let node = self.add_node(kind, Some(Point::new(menu.world.x, menu.world.y - height * 0.5)));
        let mut actions = vec![Action::NodeCreated(node.clone())];
        actions.extend(self.connect(&menu.source_id, &node.id));
        self.ui.selection.select_only(node.id);
        actions.push(Action::SelectionChanged);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Attach the open quick-add wire to an existing node instead.
    pub fn quick_connect(&mut self, target: &NodeId) -> Vec<Action> {
        let Some(menu) = self.ui.quick_add.take() else {
            return Vec::new();
        };
        let mut actions = self.connect(&menu.source_id, target);
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn dismiss_quick_add(&mut self) -> Vec<Action> {
        match self.ui.quick_add.take() {
            Some(_) => vec![Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    // --- Media stack ---

    /// Open the media stack overlay for `id`, or close it if already open.
    /// Returns whether an overlay is open afterwards.
    pub fn toggle_media_stack(&mut self, id: &NodeId) -> bool {
        if self.ui.media_stack.as_ref() == Some(id) {
            self.ui.media_stack = None;
        } else if self.store.contains_node(id) {
            self.ui.media_stack = Some(id.clone());
        }
        self.ui.media_stack.is_some()
    }

    // --- Generation ---

    /// Mark a generation node as loading and describe the request.
    ///
    /// Returns `None` for absent nodes, non-generating kinds and nodes that
    /// already have a request in flight. Otherwise the request comes with the
    /// `NodeUpdated` action that reports the loading flag.
    pub fn request_generation(&mut self, id: &NodeId) -> Option<(GenerationRequest, Vec<Action>)> {
        let node = self.store.node(id)?;
        if !crate::generation::generates(node.kind) || node.is_loading {
            return None;
        }
        let request = GenerationRequest::for_node(&self.store, node);
        let actions = self.update_node(id, NodePatch::loading(true));
        info!(node_id = %id, kind = ?request.kind, "generation requested");
        Some((request, actions))
    }

    /// Apply a generation result and clear the loading flag.
    ///
    /// Results for nodes deleted while in flight are dropped.
    pub fn complete_generation(&mut self, id: &NodeId, fields: Map<String, Value>) -> Vec<Action> {
        if !self.store.contains_node(id) {
            debug!(node_id = %id, "dropping generation result for deleted node");
            return Vec::new();
        }
        let mut patch = NodePatch::from_fields(fields);
        patch.is_loading = Some(false);
        self.update_node(id, patch)
    }

    /// Clear the loading flag after a failed or timed-out request.
    pub fn fail_generation(&mut self, id: &NodeId) -> Vec<Action> {
        if !self.store.contains_node(id) {
            debug!(node_id = %id, "dropping generation failure for deleted node");
            return Vec::new();
        }
        self.update_node(id, NodePatch::loading(false))
    }

    // --- Documents ---

    /// Replace the whole workflow with a parsed document.
    ///
    /// # Errors
    ///
    /// Returns the parse error; the current graph is left untouched.
    pub fn load_document(&mut self, json: &str) -> Result<Vec<Action>, DocumentError> {
        let doc = WorkflowDocument::parse(json)?;
        self.store.replace_all(doc.nodes, doc.connections);
        self.camera = doc.transform;
        self.ui = UiState::default();
        self.input = InputState::Idle;
        info!(nodes = self.store.len(), connections = self.store.connections().len(), "workflow loaded");
        Ok(vec![Action::SelectionChanged, Action::RenderNeeded])
    }

    #[must_use]
    pub fn export_document(&self) -> WorkflowDocument {
        WorkflowDocument::from_state(&self.store, &self.camera)
    }

    /// # Errors
    ///
    /// Returns [`DocumentError::Json`] if serialization fails.
    pub fn export_json(&self) -> Result<String, DocumentError> {
        let json = self.export_document().to_json()?;
        info!(nodes = self.store.len(), bytes = json.len(), "workflow exported");
        Ok(json)
    }

    // --- Minimap ---

    #[must_use]
    pub fn minimap_layout(&self) -> MinimapLayout {
        MinimapLayout::compute(
            &self.store,
            &self.camera,
            self.viewport_width,
            self.viewport_height,
            self.config.minimap_width,
            self.config.minimap_height,
        )
    }

    /// Press inside the minimap: drag the indicator, or jump to the point.
    pub fn on_minimap_down(&mut self, point: Point) -> Vec<Action> {
        if !self.input.is_idle() {
            self.force_idle();
        }
        let layout = self.minimap_layout();
        if layout.indicator.contains_point(point) {
            self.input = InputState::MinimapDragging(MinimapDrag::begin(&layout, &self.camera, point));
            return Vec::new();
        }
        self.camera = layout.navigate_to(&self.camera, point, self.viewport_width, self.viewport_height);
        vec![Action::RenderNeeded]
    }

    pub fn on_minimap_move(&mut self, point: Point) -> Vec<Action> {
        let InputState::MinimapDragging(drag) = &self.input else {
            return Vec::new();
        };
        self.camera = drag.camera_at(point);
        vec![Action::RenderNeeded]
    }

    pub fn on_minimap_up(&mut self) -> Vec<Action> {
        if matches!(self.input, InputState::MinimapDragging(_)) {
            self.input = InputState::Idle;
        }
        Vec::new()
    }

    // --- Pointer input ---

    pub fn on_pointer_down(
        &mut self,
        screen: Point,
        button: Button,
        modifiers: Modifiers,
        element: ElementKind,
    ) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.input.is_idle() {
            actions.extend(self.force_idle());
        }
        self.last_pointer_screen = Some(screen);
        if self.ui.quick_add.take().is_some() {
            actions.push(Action::RenderNeeded);
        }
        if element.blocks_drag() {
            return actions;
        }

        if button == Button::Secondary {
            actions.extend(self.context_menu(screen));
            return actions;
        }
        if button == Button::Middle || self.ui.space_held {
            self.input = InputState::Panning { start_screen: screen, start_camera: self.camera, pinch: None };
            self.set_cursor("grabbing", &mut actions);
            return actions;
        }

        let world = self.camera.screen_to_world(screen);
        let target = hit_test(&self.store, &self.camera, &self.ui.selection, self.ui.media_stack.as_ref(), screen);
        match target {
            HitTarget::ResizeHandle(id, anchor) => {
                let Some(orig) = self.store.node(&id).map(Node::rect) else {
                    return actions;
                };
                self.press_node(&id, false, &mut actions);
                self.set_cursor(anchor.cursor(), &mut actions);
                self.input = InputState::Resizing { id, anchor, start_world: world, orig };
            }
            HitTarget::OutputPort(id) => {
                self.ui.temp_line = temp_line(&self.store, &id, world);
                self.input = InputState::Connecting { source_id: id, pointer_world: world };
                self.set_cursor("crosshair", &mut actions);
                actions.push(Action::RenderNeeded);
            }
            HitTarget::Body(id) | HitTarget::InputPort(id) => {
                self.begin_drag(screen, id, modifiers, &mut actions);
            }
            HitTarget::Connection(id) => {
                self.ui.selection.clear();
                self.ui.selected_connection = Some(id);
                actions.push(Action::SelectionChanged);
                actions.push(Action::RenderNeeded);
            }
            HitTarget::Background => {
                let multi = modifiers.multi_select();
                let before = self.ui.selection.clone();
                let had_connection = self.ui.selected_connection.take().is_some();
                if !multi {
                    self.ui.selection.clear();
                }
                self.selection_diff(&before, had_connection, &mut actions);
                self.ui.marquee = Some(Rect::from_corners(screen, screen));
                self.input = InputState::MarqueeSelecting {
                    start_screen: screen,
                    base: multi.then(|| self.ui.selection.clone()),
                };
                actions.push(Action::RenderNeeded);
            }
        }
        actions
    }

    pub fn on_pointer_move(&mut self, screen: Point, _modifiers: Modifiers) -> Vec<Action> {
        self.last_pointer_screen = Some(screen);
        let mut actions = Vec::new();
        let world = self.camera.screen_to_world(screen);
        let mut state = std::mem::take(&mut self.input);
        match &mut state {
            InputState::Idle => {
                let target =
                    hit_test(&self.store, &self.camera, &self.ui.selection, self.ui.media_stack.as_ref(), screen);
                let cursor = match target {
                    HitTarget::ResizeHandle(_, anchor) => anchor.cursor(),
                    HitTarget::OutputPort(_) | HitTarget::InputPort(_) => "crosshair",
                    HitTarget::Body(_) => "move",
                    HitTarget::Connection(_) => "pointer",
                    HitTarget::Background => {
                        if self.ui.space_held {
                            "grab"
                        } else {
                            "default"
                        }
                    }
                };
                self.set_cursor(cursor, &mut actions);
            }
            InputState::Panning { start_screen, start_camera, pinch: None } => {
                self.camera = Camera::panned_from(*start_camera, screen.sub(*start_screen));
                actions.push(Action::RenderNeeded);
            }
            InputState::Panning { pinch: Some(_), .. } | InputState::MinimapDragging(_) => {}
            InputState::DraggingNodes { start_screen, origins, moved, .. } => {
                let delta = screen.sub(*start_screen);
                if *moved || delta.distance(Point::default()) >= self.config.drag_threshold_px {
                    *moved = true;
                    let dx = self.camera.screen_dist_to_world(delta.x);
                    let dy = self.camera.screen_dist_to_world(delta.y);
                    for (id, x, y) in origins.iter() {
                        self.store.update_node(id, &NodePatch::position(x + dx, y + dy));
                    }
                    actions.push(Action::RenderNeeded);
                }
            }
            InputState::MarqueeSelecting { start_screen, base } => {
                let rect = Rect::from_corners(*start_screen, screen);
                let before = self.ui.selection.clone();
                self.ui.selection =
                    marquee_select(&self.store, self.camera.screen_rect_to_world(rect), base.as_ref());
                self.ui.marquee = Some(rect);
                self.selection_diff(&before, false, &mut actions);
                actions.push(Action::RenderNeeded);
            }
            InputState::Connecting { source_id, pointer_world } => {
                *pointer_world = world;
                self.ui.temp_line = temp_line(&self.store, source_id, world);
                actions.push(Action::RenderNeeded);
            }
            InputState::Resizing { id, anchor, start_world, orig } => {
                let bounds = anchor.resize(*orig, world.sub(*start_world));
                self.store.update_node(id, &NodePatch::bounds(bounds));
                actions.push(Action::RenderNeeded);
            }
        }
        self.input = state;
        actions
    }

    /// Release handler. Hosts register it on the outermost surface so it
    /// fires wherever the release lands.
    pub fn on_pointer_up(&mut self, screen: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        self.last_pointer_screen = Some(screen);
        let state = std::mem::take(&mut self.input);
        let mut actions = Vec::new();
        if let InputState::Connecting { source_id, .. } = &state {
            self.finish_connection(source_id, screen, &mut actions);
        }
        actions.extend(self.commit(state));
        actions
    }

    /// Abandon any gesture (pointer cancel, lost capture, window blur).
    ///
    /// Live position and size changes are kept and reported; an unfinished
    /// wire is discarded without opening the quick-add menu.
    pub fn on_pointer_cancel(&mut self) -> Vec<Action> {
        self.force_idle()
    }

    /// Force the machine back to `Idle`, committing what is already applied.
    pub fn force_idle(&mut self) -> Vec<Action> {
        let state = std::mem::take(&mut self.input);
        self.commit(state)
    }

    // --- Touch input ---

    /// Touch contacts changed by a touch-start. `touches` is every active
    /// contact; `element` tags what the newest contact landed on.
    pub fn on_touch_start(&mut self, touches: &[TouchPoint], element: ElementKind) -> Vec<Action> {
        self.touches = touches.to_vec();
        match touches {
            [one] => self.on_pointer_down(one.screen, Button::Primary, Modifiers::default(), element),
            [a, b, ..] => {
                let mut actions = self.force_idle();
                let mid = a.screen.midpoint(b.screen);
                self.input = InputState::Panning {
                    start_screen: mid,
                    start_camera: self.camera,
                    pinch: Some(Pinch { start_distance: a.screen.distance(b.screen), start_mid: mid }),
                };
                actions.push(Action::RenderNeeded);
                actions
            }
            [] => Vec::new(),
        }
    }

    pub fn on_touch_move(&mut self, touches: &[TouchPoint]) -> Vec<Action> {
        self.touches = touches.to_vec();
        let pinch = match &self.input {
            InputState::Panning { start_camera, pinch: Some(pinch), .. } => Some((*start_camera, *pinch)),
            _ => None,
        };
        match (touches, pinch) {
            ([a, b, ..], Some((start_camera, pinch))) => {
                let mid = a.screen.midpoint(b.screen);
                self.camera = pinched(start_camera, pinch, mid, a.screen.distance(b.screen));
                vec![Action::RenderNeeded]
            }
            ([one], None) => self.on_pointer_move(one.screen, Modifiers::default()),
            _ => Vec::new(),
        }
    }

    /// Touch contacts changed by a touch-end. `remaining` is every contact still down.
    pub fn on_touch_end(&mut self, remaining: &[TouchPoint]) -> Vec<Action> {
        let last = self.touches.first().map(|t| t.screen);
        self.touches = remaining.to_vec();
        match (remaining, last) {
            ([], Some(screen)) if matches!(self.input, InputState::Panning { pinch: Some(_), .. }) => {
                self.last_pointer_screen = Some(screen);
                self.force_idle()
            }
            ([], Some(screen)) => self.on_pointer_up(screen, Button::Primary, Modifiers::default()),
            ([], None) => self.force_idle(),
            _ => {
                if matches!(self.input, InputState::Panning { pinch: Some(_), .. }) {
                    self.force_idle()
                } else {
                    Vec::new()
                }
            }
        }
    }

    // --- Wheel / keyboard ---

    /// Ctrl/Meta + wheel zooms at the cursor; a plain wheel pans.
    pub fn on_wheel(&mut self, screen: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if modifiers.command() {
            let factor = (-delta.dy * self.config.wheel_zoom_sensitivity).exp();
            self.camera.zoom_at(screen, self.camera.zoom * factor);
        } else {
            self.camera.pan_x -= delta.dx;
            self.camera.pan_y -= delta.dy;
        }
        vec![Action::RenderNeeded]
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if key.is_space() {
            self.ui.space_held = true;
            let mut actions = Vec::new();
            if self.input.is_idle() {
                self.set_cursor("grab", &mut actions);
            }
            return actions;
        }
        if key.is_escape() {
            return self.cancel();
        }
        if key.is_delete() {
            return self.delete_selection();
        }
        if !modifiers.command() {
            return Vec::new();
        }
        if key.is_letter('c') {
            self.copy();
            Vec::new()
        } else if key.is_letter('x') {
            self.cut()
        } else if key.is_letter('v') {
            self.paste()
        } else if key.is_letter('a') {
            self.select_all()
        } else if key.is_letter('g') && modifiers.shift {
            self.ungroup_selection()
        } else if key.is_letter('g') {
            self.group_selection()
        } else {
            Vec::new()
        }
    }

    pub fn on_key_up(&mut self, key: &Key, _modifiers: Modifiers) -> Vec<Action> {
        let mut actions = Vec::new();
        if key.is_space() {
            self.ui.space_held = false;
            if self.input.is_idle() {
                self.set_cursor("default", &mut actions);
            }
        }
        actions
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.ui.selection
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.store.node(id)
    }

    #[must_use]
    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// CSS cursor last reported through [`Action::SetCursor`].
    #[must_use]
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    // --- Internals ---

    fn set_cursor(&mut self, cursor: &str, actions: &mut Vec<Action>) {
        if self.cursor != cursor {
            cursor.clone_into(&mut self.cursor);
            actions.push(Action::SetCursor(cursor.to_owned()));
        }
    }

    /// Report a selection change relative to `before`. Dropping a selected
    /// connection counts as a change.
    fn selection_diff(&self, before: &Selection, had_connection: bool, actions: &mut Vec<Action>) {
        if had_connection || &self.ui.selection != before {
            actions.push(Action::SelectionChanged);
        }
    }

    fn press_node(&mut self, id: &NodeId, multi: bool, actions: &mut Vec<Action>) {
        let before = self.ui.selection.clone();
        let had_connection = self.ui.selected_connection.take().is_some();
        self.ui.selection.press(id, multi);
        self.selection_diff(&before, had_connection, actions);
    }

    fn begin_drag(&mut self, screen: Point, id: NodeId, modifiers: Modifiers, actions: &mut Vec<Action>) {
        let multi = modifiers.multi_select();
        let collapse_on_click = !multi && self.ui.selection.contains(&id) && self.ui.selection.len() > 1;
        self.press_node(&id, multi, actions);

        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut origins = Vec::new();
        for node in self.store.nodes() {
            if !self.ui.selection.contains(&node.id) {
                continue;
            }
            if seen.insert(node.id.clone()) {
                origins.push((node.id.clone(), node.x, node.y));
            }
            if node.kind.is_group() {
                for member in members_of(node, self.store.nodes()) {
                    if seen.insert(member.id.clone()) {
                        origins.push((member.id.clone(), member.x, member.y));
                    }
                }
            }
        }
        self.input =
            InputState::DraggingNodes { start_screen: screen, origins, moved: false, pressed: id, collapse_on_click };
        actions.push(Action::RenderNeeded);
    }

    fn context_menu(&mut self, screen: Point) -> Vec<Action> {
        let mut actions = Vec::new();
        let target = hit_test(&self.store, &self.camera, &self.ui.selection, self.ui.media_stack.as_ref(), screen);
        let node_id = target.node_id().cloned();
        if let Some(id) = &node_id {
            if !self.ui.selection.contains(id) {
                self.press_node(id, false, &mut actions);
            }
        }
        actions.push(Action::ContextMenuRequested { node_id, screen });
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Release of a wire: connect onto a node, or open quick-add over empty
    /// canvas. A group's interior counts as empty canvas.
    fn finish_connection(&mut self, source_id: &NodeId, screen: Point, actions: &mut Vec<Action>) {
        let world = self.camera.screen_to_world(screen);
        let target = match input_port_at(&self.store, &self.camera, world) {
            Some(node) => Some(node.id.clone()),
            None => hit_test(&self.store, &self.camera, &self.ui.selection, self.ui.media_stack.as_ref(), screen)
                .node_id()
                .filter(|id| self.store.node(id).is_some_and(|n| !n.kind.is_group()))
                .cloned(),
        };
        match target {
            Some(target) => actions.extend(self.connect(source_id, &target)),
            None => {
                let suggestions = suggest_targets(&self.store, source_id, world, MAX_CONNECT_SUGGESTIONS);
                self.ui.quick_add =
                    Some(QuickAddMenu { source_id: source_id.clone(), screen, world, suggestions });
                actions.push(Action::QuickAddOpened { source_id: source_id.clone(), screen });
            }
        }
    }

    /// End a gesture, reporting what it changed, and clear transient UI.
    fn commit(&mut self, state: InputState) -> Vec<Action> {
        let mut actions = Vec::new();
        match state {
            InputState::DraggingNodes { origins, moved: true, .. } => {
                for (id, _, _) in origins {
                    if let Some(node) = self.store.node(&id) {
                        let fields = NodePatch::position(node.x, node.y);
                        actions.push(Action::NodeUpdated { id, fields });
                    }
                }
            }
            InputState::DraggingNodes { pressed, collapse_on_click: true, .. } => {
                self.ui.selection.select_only(pressed);
                actions.push(Action::SelectionChanged);
            }
            InputState::Resizing { id, .. } => {
                if let Some(node) = self.store.node(&id) {
                    let fields = NodePatch::bounds(node.rect());
                    actions.push(Action::NodeUpdated { id, fields });
                }
            }
            _ => {}
        }
        self.ui.marquee = None;
        self.ui.temp_line = None;
        let cursor = if self.ui.space_held { "grab" } else { "default" };
        self.set_cursor(cursor, &mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Escape: undo the live gesture, close menus, clear selection.
    fn cancel(&mut self) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::DraggingNodes { origins, .. } => {
                for (id, x, y) in origins {
                    self.store.update_node(&id, &NodePatch::position(x, y));
                }
            }
            InputState::Resizing { id, orig, .. } => {
                self.store.update_node(&id, &NodePatch::bounds(orig));
            }
            InputState::Panning { start_camera, .. } => self.camera = start_camera,
            InputState::MinimapDragging(drag) => self.camera = drag.start_camera,
            InputState::MarqueeSelecting { .. } | InputState::Connecting { .. } | InputState::Idle => {}
        }
        self.ui.marquee = None;
        self.ui.temp_line = None;
        self.ui.quick_add = None;
        self.ui.media_stack = None;
        let mut actions = self.clear_selection();
        let cursor = if self.ui.space_held { "grab" } else { "default" };
        self.set_cursor(cursor, &mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }
}

/// Next zoom control step, rounded to the step grid.
fn step_zoom(zoom: f64, step: f64) -> f64 {
    clamp_zoom(((zoom + step) * 10.0).round() / 10.0)
}

/// Camera for a two-finger gesture: scale by the finger-distance ratio and
/// keep the world point under the starting midpoint under the current one.
fn pinched(start: Camera, pinch: Pinch, mid: Point, distance: f64) -> Camera {
    let zoom = if pinch.start_distance > 0.0 {
        clamp_zoom(start.zoom * distance / pinch.start_distance)
    } else {
        start.zoom
    };
    let world = start.screen_to_world(pinch.start_mid);
    Camera { pan_x: mid.x - world.x * zoom, pan_y: mid.y - world.y * zoom, zoom }
}
