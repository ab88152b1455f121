//! Shared numeric constants for the tile engine.

// ── Tile sizing ─────────────────────────────────────────────────

/// Width of the bounding box an image is fitted into, and of a blank tile.
pub const DISPLAY_BOX_WIDTH: f64 = 300.0;

/// Height of the bounding box an image is fitted into, and of a blank tile.
pub const DISPLAY_BOX_HEIGHT: f64 = 225.0;

/// Aspect ratio of the display box (4:3). Images wider than this are fitted by width.
pub const DISPLAY_BOX_ASPECT: f64 = DISPLAY_BOX_WIDTH / DISPLAY_BOX_HEIGHT;

/// Smallest width or height a tile can be resized to.
pub const MIN_TILE_SIZE: f64 = 20.0;

// ── Interaction ─────────────────────────────────────────────────

/// Side of the square resize handle at a tile's bottom-right corner, in pixels.
pub const HANDLE_SIZE_PX: f64 = 12.0;

/// Default long-press delay before a pressed tile is grabbed.
pub const DEFAULT_LONG_PRESS_MS: u64 = 100;

/// Default pointer travel that turns a press into a drag.
pub const DEFAULT_DRAG_THRESHOLD_PX: f64 = 3.0;

/// Slack allowed when checking containment after clamping.
pub const GEOMETRY_EPSILON: f64 = 1e-6;

// ── Stitching ───────────────────────────────────────────────────

/// Default fraction of the viewport a scaled composite may occupy.
pub const DEFAULT_FIT_FRACTION: f64 = 0.9;

/// Fewest tiles the engine will stitch.
pub const DEFAULT_MIN_STITCH_TILES: usize = 2;
