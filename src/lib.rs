//! Canvas interaction core for a node-based media-generation workflow editor.
//!
//! The crate owns everything between raw host input and the workflow graph:
//! the viewport transform, the graph store with its referential-integrity
//! rules, the gesture state machine, connection wiring, selection and
//! grouping, the clipboard, and the minimap. Hosts forward pointer, touch,
//! wheel and key events to an [`engine::Engine`] and apply the returned
//! [`engine::Action`]s; drawing reads a headless [`render::Scene`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine: event handlers returning actions |
//! | [`doc`] | Nodes, connections, patches and the in-memory graph store |
//! | [`camera`] | Pan/zoom viewport transform and coordinate conversions |
//! | [`geom`] | Points and axis-aligned rectangles |
//! | [`input`] | Input event types, UI state and the gesture state machine |
//! | [`hit`] | Hit-testing against node parts and connection curves |
//! | [`connection`] | Port rules, connection creation and bezier paths |
//! | [`selection`] | Selection set and marquee membership |
//! | [`group`] | Group creation, implicit membership and stacking order |
//! | [`spatial`] | Viewport culling |
//! | [`clipboard`] | Copy and paste with id remapping |
//! | [`minimap`] | Minimap projection, indicator drag and click-to-navigate |
//! | [`document`] | Workflow document load and export |
//! | [`generation`] | Async media-generation collaborator boundary |
//! | [`render`] | Headless scene assembly for hosts |
//! | [`config`] | Editor tunables from the environment |
//! | [`consts`] | Shared numeric constants (zoom limits, hit slop, etc.) |
//! | [`id`] | Random short ids |

pub mod camera;
pub mod clipboard;
pub mod config;
pub mod connection;
pub mod consts;
pub mod doc;
pub mod document;
pub mod engine;
pub mod generation;
pub mod geom;
pub mod group;
pub mod hit;
pub mod id;
pub mod input;
pub mod minimap;
pub mod render;
pub mod selection;
pub mod spatial;
