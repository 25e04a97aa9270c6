//! Shared numeric constants for the editor core.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed viewport scale.
pub const MIN_ZOOM: f64 = 0.4;

/// Largest allowed viewport scale.
pub const MAX_ZOOM: f64 = 2.0;

/// Increment used by the zoom-in / zoom-out controls.
pub const ZOOM_STEP: f64 = 0.1;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for resize handles on node edges and corners.
pub const HANDLE_RADIUS_PX: f64 = 6.0;

/// Screen-space radius in pixels of the implicit input/output port circles.
pub const PORT_RADIUS_PX: f64 = 10.0;

/// Screen-space distance in pixels within which a click selects a connection curve.
pub const CONNECTION_HIT_PX: f64 = 8.0;

/// Number of segments used to flatten a bezier for hit-testing and bounds.
pub const BEZIER_SAMPLES: usize = 24;

// ── Connections ─────────────────────────────────────────────────

/// Lower clamp for the bezier control-point offset, in world units.
pub const BEZIER_MIN_OFFSET: f64 = 24.0;

/// Upper clamp for the bezier control-point offset, in world units.
pub const BEZIER_MAX_OFFSET: f64 = 80.0;

/// How many existing nodes are offered when a wire is dropped on empty canvas.
pub const MAX_CONNECT_SUGGESTIONS: usize = 5;

// ── Nodes ───────────────────────────────────────────────────────

/// Minimum width/height a resize may shrink a node to, in world units.
pub const MIN_NODE_SIZE: f64 = 40.0;

/// Extra screen-space margin around the viewport when culling, so nodes
/// entering from the edge are ready before they become visible.
pub const CULL_MARGIN_PX: f64 = 200.0;

/// Palette offered by the group toolbar. The first entry is the default.
pub const GROUP_COLORS: [&str; 8] =
    ["#3f3f46", "#1e3a8a", "#14532d", "#7c2d12", "#581c87", "#831843", "#134e4a", "#713f12"];

// ── Minimap ─────────────────────────────────────────────────────

/// World-space padding added around content before fitting it into the minimap.
pub const MINIMAP_WORLD_PADDING: f64 = 100.0;

/// The viewport indicator's longest side never drops below this fraction
/// of the minimap's longest side.
pub const MINIMAP_MIN_INDICATOR_RATIO: f64 = 0.2;

/// The viewport indicator's longest side never exceeds this fraction of the
/// minimap's longest side.
pub const MINIMAP_MAX_INDICATOR_RATIO: f64 = 1.0;

// ── Documents ───────────────────────────────────────────────────

/// Version string written into exported workflow documents.
pub const DOCUMENT_VERSION: &str = "1.0";
