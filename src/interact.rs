//! Drag, resize and stacking order for tiles in a composite.
//!
//! One gesture at a time, tracked in [`InputState`]:
//!
//! - `Idle → Pressed → Dragging → Idle` for a tile body. The press becomes a
//!   drag as soon as the pointer travels past the threshold, or when the
//!   long-press delay runs out (a "grab").
//! - `Idle → Resizing → Idle` from the bottom-right handle.
//!
//! Positions and sizes are always clamped to the canvas; nothing here fails.
//! Releasing any gesture raises its tile to the front of the z-order.

#[cfg(test)]
#[path = "interact_test.rs"]
mod interact_test;

use crate::consts::MIN_TILE_SIZE;
use crate::geom::{Point, Size};
use crate::hit::{HitPart, hit_test};
use crate::input::{GestureKind, InputState, NoCapture, PointerCapture};
use crate::stitch::Composite;
use crate::tile::TileId;

/// Outcome of a pointer-up that ended a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Release {
    pub id: TileId,
    pub kind: GestureKind,
    /// Final left edge.
    pub x: f64,
    /// Final top edge.
    pub y: f64,
    /// Final size.
    pub size: Size,
}

/// Gesture engine for one composite.
pub struct CompositeInteraction {
    state: InputState,
    long_press_ms: u64,
    drag_threshold_px: f64,
    capture: Box<dyn PointerCapture>,
}

impl Default for CompositeInteraction {
    fn default() -> Self {
        Self::new(crate::consts::DEFAULT_LONG_PRESS_MS, crate::consts::DEFAULT_DRAG_THRESHOLD_PX)
    }
}

impl CompositeInteraction {
    #[must_use]
    pub fn new(long_press_ms: u64, drag_threshold_px: f64) -> Self {
        Self { state: InputState::Idle, long_press_ms, drag_threshold_px, capture: Box::new(NoCapture) }
    }

    /// Install the host's window-listener hook.
    pub fn set_capture(&mut self, capture: Box<dyn PointerCapture>) {
        self.capture = capture;
    }

    #[must_use]
    pub fn state(&self) -> &InputState {
        &self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.state.is_idle()
    }

    /// Begin a gesture if `pt` hits a tile. Returns the tile hit.
    ///
    /// Ignored while another gesture is active.
    pub fn pointer_down(&mut self, composite: &Composite, pt: Point, now_ms: u64) -> Option<TileId> {
        if self.is_active() {
            return None;
        }
        let hit = hit_test(pt, composite)?;
        let placed = composite.get(hit.tile_id)?;
        let capture = self.capture.acquire();
        self.state = match hit.part {
            HitPart::Body => InputState::Pressed {
                id: hit.tile_id,
                start: pt,
                pressed_at_ms: now_ms,
                orig_x: placed.x,
                orig_y: placed.y,
                capture,
            },
            HitPart::ResizeHandle => InputState::Resizing {
                id: hit.tile_id,
                start: pt,
                orig_width: placed.tile.display.width,
                orig_height: placed.tile.display.height,
                aspect: placed.tile.aspect(),
                capture,
            },
        };
        Some(hit.tile_id)
    }

    /// Advance the active gesture. Returns true if a tile moved or resized.
    pub fn pointer_move(&mut self, composite: &mut Composite, pt: Point, now_ms: u64) -> bool {
        self.promote(pt, now_ms);
        match &self.state {
            InputState::Idle | InputState::Pressed { .. } => false,
            InputState::Dragging { id, start, orig_x, orig_y, .. } => {
                drag_to(composite, *id, *orig_x + (pt.x - start.x), *orig_y + (pt.y - start.y))
            }
            InputState::Resizing { id, start, orig_width, aspect, .. } => {
                resize_to(composite, *id, *orig_width + (pt.x - start.x), *aspect)
            }
        }
    }

    /// Fire the long-press timer. Returns true if a press turned into a grab.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        let expired = matches!(
            &self.state,
            InputState::Pressed { pressed_at_ms, .. } if now_ms.saturating_sub(*pressed_at_ms) >= self.long_press_ms
        );
        if expired {
            self.begin_drag(true);
        }
        expired
    }

    /// End the active gesture and raise its tile. Releases pointer capture.
    pub fn pointer_up(&mut self, composite: &mut Composite, pt: Point, now_ms: u64) -> Option<Release> {
        if !self.state.is_idle() {
            self.pointer_move(composite, pt, now_ms);
        }
        let kind = match &self.state {
            InputState::Idle => return None,
            InputState::Pressed { .. } => GestureKind::Click,
            InputState::Dragging { .. } => GestureKind::Drag,
            InputState::Resizing { .. } => GestureKind::Resize,
        };
        let id = std::mem::take(&mut self.state).tile()?;
        composite.raise(id);
        let placed = composite.get(id)?;
        Some(Release { id, kind, x: placed.x, y: placed.y, size: placed.tile.display })
    }

    /// Abort the active gesture, restoring the tile's original rectangle.
    pub fn cancel(&mut self, composite: &mut Composite) -> bool {
        match std::mem::take(&mut self.state) {
            InputState::Idle => false,
            InputState::Pressed { .. } => true,
            InputState::Dragging { id, orig_x, orig_y, .. } => {
                if let Some(placed) = composite.get_mut(id) {
                    placed.x = orig_x;
                    placed.y = orig_y;
                }
                true
            }
            InputState::Resizing { id, orig_width, orig_height, .. } => {
                if let Some(placed) = composite.get_mut(id) {
                    placed.tile.display = Size::new(orig_width, orig_height);
                }
                true
            }
        }
    }

    /// Drop any gesture on `id` (the tile was removed) without touching the composite.
    pub fn forget(&mut self, id: TileId) {
        if self.state.tile() == Some(id) {
            self.state = InputState::Idle;
        }
    }

    /// Turn a press into a drag if it has travelled far enough or been held long enough.
    fn promote(&mut self, pt: Point, now_ms: u64) {
        let (start, pressed_at_ms) = match &self.state {
            InputState::Pressed { start, pressed_at_ms, .. } => (*start, *pressed_at_ms),
            _ => return,
        };
        if start.chebyshev(pt) > self.drag_threshold_px {
            self.begin_drag(false);
        } else if now_ms.saturating_sub(pressed_at_ms) >= self.long_press_ms {
            self.begin_drag(true);
        }
    }

    fn begin_drag(&mut self, grabbed: bool) {
        self.state = match std::mem::take(&mut self.state) {
            InputState::Pressed { id, start, orig_x, orig_y, capture, .. } => {
                InputState::Dragging { id, start, orig_x, orig_y, grabbed, capture }
            }
            other => other,
        };
    }
}

/// Move `id` to `(x, y)`, clamped so the whole tile stays inside the canvas.
pub fn drag_to(composite: &mut Composite, id: TileId, x: f64, y: f64) -> bool {
    let Some(placed) = composite.get(id) else {
        return false;
    };
    let (x, y) = composite.clamp_origin(x, y, placed.tile.display);
    let Some(placed) = composite.get_mut(id) else {
        return false;
    };
    let changed = placed.x != x || placed.y != y;
    placed.x = x;
    placed.y = y;
    changed
}

/// Resize `id` to a candidate width, keeping `aspect` and the top-left anchor.
pub fn resize_to(composite: &mut Composite, id: TileId, width: f64, aspect: f64) -> bool {
    let canvas = composite.canvas();
    let Some(placed) = composite.get_mut(id) else {
        return false;
    };
    let size = constrained_size(canvas, placed.x, placed.y, width, aspect);
    let changed = placed.tile.display != size;
    placed.tile.display = size;
    changed
}

/// Size for a tile anchored at `(x, y)` with a candidate `width`.
///
/// Height follows from `aspect`. Hitting the canvas edge shrinks both sides
/// together; the result is then floored so neither side is below
/// [`MIN_TILE_SIZE`].
#[must_use]
pub fn constrained_size(canvas: Size, x: f64, y: f64, width: f64, aspect: f64) -> Size {
    let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
    let mut w = width;
    let mut h = w / aspect;

    let max_w = (canvas.width - x).max(0.0);
    let max_h = (canvas.height - y).max(0.0);
    if w > max_w {
        w = max_w;
        h = w / aspect;
    }
    if h > max_h {
        h = max_h;
        w = h * aspect;
    }

    if w < MIN_TILE_SIZE || h < MIN_TILE_SIZE {
        if aspect <= 1.0 {
            w = MIN_TILE_SIZE;
            h = MIN_TILE_SIZE / aspect;
        } else {
            h = MIN_TILE_SIZE;
            w = MIN_TILE_SIZE * aspect;
        }
    }
    Size::new(w, h)
}
