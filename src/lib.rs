//! Tile collection and stitching engine for a browser image-grid tool.
//!
//! The engine owns an ordered collection of image tiles, arranges them in a
//! grid, and can stitch them into a single composite canvas where each tile is
//! dragged, resized and restacked independently. It never touches the DOM:
//! the host wires keyboard, pointer, clipboard and file events to
//! [`engine::EngineCore`], decodes image bytes when asked, and carries out the
//! returned [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level [`engine::EngineCore`], host actions, export and snapshots |
//! | [`tile`] | Tile record and display-size policy |
//! | [`collection`] | Ordered tile container with a structural revision |
//! | [`grid`] | Row/column arrangement and grid growth |
//! | [`ingest`] | Clipboard/file bytes to decode requests and tile content |
//! | [`stitch`] | Composite construction, placement policies, unstitch |
//! | [`interact`] | Drag, resize and z-order on a composite |
//! | [`input`] | Key/modifier types, pointer capture, gesture state |
//! | [`hit`] | Hit-testing placed tiles and resize handles |
//! | [`selection`] | Two-axis keyboard selection |
//! | [`events`] | Injected event sink |
//! | [`config`] | Engine policy flags and env loading |
//! | [`geom`] | Points, sizes, rectangles |
//! | [`consts`] | Shared numeric constants (display box, minimum sizes, timings) |

pub mod collection;
pub mod config;
pub mod consts;
pub mod engine;
pub mod events;
pub mod geom;
pub mod grid;
pub mod hit;
pub mod ingest;
pub mod input;
pub mod interact;
pub mod selection;
pub mod stitch;
pub mod tile;
