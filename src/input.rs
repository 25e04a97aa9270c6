//! Input model: modifier keys, buttons, touch points, and the gesture state machine.
//!
//! `Modifiers`, `Button`, `Key`, `WheelDelta` and `TouchPoint` describe a raw
//! event. `ElementKind` is the capability tag a host attaches to the element
//! under the pointer, so interactive sub-controls never start a canvas
//! gesture. `InputState` is the active gesture being tracked between
//! pointer-down and pointer-up, carrying every snapshot needed to recompute
//! from the gesture start on each move. `UiState` is the persistent,
//! renderer-visible state that outlives a gesture.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Camera;
use crate::doc::{ConnectionId, NodeId};
use crate::geom::{Point, Rect};
use crate::hit::ResizeAnchor;
use crate::minimap::MinimapDrag;
use crate::selection::Selection;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Whether the press should add to the selection instead of replacing it.
    #[must_use]
    pub fn multi_select(self) -> bool {
        self.shift || self.ctrl || self.meta
    }

    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger touch).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button.
    Secondary,
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the host (e.g. `"Delete"`, `" "`, `"c"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is_space(&self) -> bool {
        self.0 == " " || self.0 == "Space" || self.0 == "Spacebar"
    }

    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.0 == "Delete" || self.0 == "Backspace"
    }

    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape" || self.0 == "Esc"
    }

    /// Case-insensitive match against a single-character shortcut letter.
    #[must_use]
    pub fn is_letter(&self, letter: char) -> bool {
        let mut chars = self.0.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => c.eq_ignore_ascii_case(&letter),
            _ => false,
        }
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// One active touch contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    /// Host-assigned identifier, stable for the lifetime of the contact.
    pub id: i64,
    /// Screen-space position.
    pub screen: Point,
}

/// Capability tag for the element a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementKind {
    /// Canvas background or passive node chrome.
    #[default]
    Surface,
    /// Text field or text area inside a node.
    TextInput,
    /// Button inside a node or overlay.
    Button,
    /// Dropdown / select inside a node.
    Dropdown,
}

impl ElementKind {
    /// Whether a press on this element must be left to the element itself.
    #[must_use]
    pub fn blocks_drag(self) -> bool {
        !matches!(self, Self::Surface)
    }
}

/// Two-finger gesture snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pinch {
    /// Finger distance at gesture start, in screen pixels.
    pub start_distance: f64,
    /// Midpoint between the fingers at gesture start.
    pub start_mid: Point,
}

/// Menu shown after a wire is dropped on empty canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickAddMenu {
    /// Node the dropped wire starts from.
    pub source_id: NodeId,
    /// Where the menu opens, in screen pixels.
    pub screen: Point,
    /// World position the new node will be placed at.
    pub world: Point,
    /// Existing nodes the wire could attach to instead, nearest first.
    pub suggestions: Vec<NodeId>,
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Selected nodes.
    pub selection: Selection,
    /// Selected connection, if any. Mutually exclusive with a node selection.
    pub selected_connection: Option<ConnectionId>,
    /// Open quick-add menu, if any.
    pub quick_add: Option<QuickAddMenu>,
    /// Node whose media stack overlay is open.
    pub media_stack: Option<NodeId>,
    /// Space bar is held: primary drags pan.
    pub space_held: bool,
    /// Marquee rectangle in screen space while selecting.
    pub marquee: Option<Rect>,
    /// Provisional wire endpoints in world space while connecting.
    pub temp_line: Option<(Point, Point)>,
}

/// Internal state for the input state machine.
///
/// Each active variant carries the gesture context needed to recompute from
/// the gesture start on every move and to emit final actions on release.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Panning the canvas (middle button, Space+primary, or two-finger touch).
    Panning {
        /// Screen position at gesture start.
        start_screen: Point,
        /// Camera at gesture start.
        start_camera: Camera,
        /// Set for two-finger gestures, which also zoom.
        pinch: Option<Pinch>,
    },
    /// Moving the selected nodes as a rigid group.
    DraggingNodes {
        /// Screen position at press.
        start_screen: Point,
        /// `(id, x, y)` of every moving node at press.
        origins: Vec<(NodeId, f64, f64)>,
        /// Whether the pointer travelled past the drag threshold.
        moved: bool,
        /// Node that was pressed.
        pressed: NodeId,
        /// A plain click on an already-selected member collapses the
        /// selection to it on release, if no drag happened.
        collapse_on_click: bool,
    },
    /// Drawing a selection rectangle.
    MarqueeSelecting {
        /// Screen position at press.
        start_screen: Point,
        /// Selection to union with, when multi-select was held at press.
        base: Option<Selection>,
    },
    /// Dragging a wire out of an output port.
    Connecting {
        /// Node whose output port started the wire.
        source_id: NodeId,
        /// Latest pointer position in world space.
        pointer_world: Point,
    },
    /// Resizing a node by one of its eight handles.
    Resizing {
        /// Node being resized.
        id: NodeId,
        /// Which corner/edge handle is being dragged.
        anchor: ResizeAnchor,
        /// World-space pointer position at press.
        start_world: Point,
        /// Node bounds at press.
        orig: Rect,
    },
    /// Dragging the minimap's viewport indicator.
    MinimapDragging(MinimapDrag),
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
