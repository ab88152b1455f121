//! Input model: modifier keys, key names, pointer capture and the gesture state machine.
//!
//! `InputState` is the gesture tracked between pointer-down and pointer-up on
//! a composite. Each active variant carries everything needed to compute the
//! next position or size from the pointer delta, plus the [`CaptureGuard`]
//! that keeps window-level pointer listeners alive. Dropping the state (on
//! release, cancel, or engine teardown) releases the listeners.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::fmt;

use crate::geom::Point;
use crate::tile::TileId;

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
    /// Ctrl on Windows/Linux or Cmd on macOS.
    #[must_use]
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A keyboard key as reported by the browser (e.g. `"ArrowLeft"`, `"Enter"`, `" "`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Case-insensitive comparison for single-letter shortcuts.
    #[must_use]
    pub fn is_letter(&self, letter: char) -> bool {
        let mut chars = self.0.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if c.eq_ignore_ascii_case(&letter))
    }
}

// =============================================================
// Pointer capture
// =============================================================

/// Host hook that routes window-level pointer move/up events to the engine
/// while a gesture is active.
pub trait PointerCapture {
    /// Start listening. The returned guard stops listening when dropped.
    fn acquire(&mut self) -> CaptureGuard;
}

/// Scoped window-listener subscription. Runs its release hook exactly once, on drop.
pub struct CaptureGuard {
    release: Option<Box<dyn FnOnce()>>,
}

impl CaptureGuard {
    #[must_use]
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self { release: Some(Box::new(release)) }
    }

    /// A guard with nothing to release.
    #[must_use]
    pub fn noop() -> Self {
        Self { release: None }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for CaptureGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureGuard").field("armed", &self.release.is_some()).finish()
    }
}

/// Capture for hosts that deliver all pointer events to the engine anyway.
#[derive(Debug, Default)]
pub struct NoCapture;

impl PointerCapture for NoCapture {
    fn acquire(&mut self) -> CaptureGuard {
        CaptureGuard::noop()
    }
}

// =============================================================
// Gesture state
// =============================================================

/// Which kind of gesture finished on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    /// Pointer went down and up without starting a drag.
    Click,
    Drag,
    Resize,
}

/// Internal state for the composite gesture machine.
#[derive(Debug, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Pointer is down on a tile body; the long-press timer is running.
    Pressed {
        id: TileId,
        /// Client-space pointer position at pointer-down.
        start: Point,
        /// Timestamp of pointer-down.
        pressed_at_ms: u64,
        orig_x: f64,
        orig_y: f64,
        capture: CaptureGuard,
    },
    /// The tile follows the pointer.
    Dragging {
        id: TileId,
        start: Point,
        orig_x: f64,
        orig_y: f64,
        /// Set when the drag began via long-press expiry rather than movement.
        grabbed: bool,
        capture: CaptureGuard,
    },
    /// The tile is being resized from its bottom-right handle.
    Resizing {
        id: TileId,
        start: Point,
        orig_width: f64,
        orig_height: f64,
        /// Width / height to preserve.
        aspect: f64,
        capture: CaptureGuard,
    },
}

impl InputState {
    /// The tile the active gesture is operating on.
    #[must_use]
    pub fn tile(&self) -> Option<TileId> {
        match self {
            Self::Idle => None,
            Self::Pressed { id, .. } | Self::Dragging { id, .. } | Self::Resizing { id, .. } => Some(*id),
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
