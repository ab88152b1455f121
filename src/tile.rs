//! Tile model: one image slot, blank or populated.
//!
//! A `Tile` carries a stable identity, an optional content reference, the
//! natural size of the decoded image, and the size used for layout. The
//! display size is always derived from the intrinsic size through a
//! [`DisplayPolicy`], so the two share an aspect ratio whenever an image is
//! loaded.

#[cfg(test)]
#[path = "tile_test.rs"]
mod tile_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{DISPLAY_BOX_ASPECT, DISPLAY_BOX_HEIGHT, DISPLAY_BOX_WIDTH};
use crate::geom::Size;

/// Unique identifier for a tile. Survives reordering and stitching.
pub type TileId = Uuid;

/// Opaque reference to a tile's image content (object URL, data URL, placeholder key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(pub String);

impl SourceId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// How display dimensions are derived from intrinsic dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayPolicy {
    /// Fit inside the 300×225 box, preserving aspect ratio.
    #[default]
    AspectFit,
    /// Display at the image's natural size.
    Intrinsic,
}

impl DisplayPolicy {
    /// Compute the display size for an image of the given intrinsic size.
    ///
    /// Degenerate sizes fall back to the blank placeholder.
    #[must_use]
    pub fn display_size(self, intrinsic: Size) -> Size {
        let Some(aspect) = intrinsic.aspect() else {
            return blank_size();
        };
        match self {
            Self::Intrinsic => intrinsic,
            Self::AspectFit => {
                if aspect > DISPLAY_BOX_ASPECT {
                    Size::new(DISPLAY_BOX_WIDTH, DISPLAY_BOX_WIDTH / aspect)
                } else {
                    Size::new(DISPLAY_BOX_HEIGHT * aspect, DISPLAY_BOX_HEIGHT)
                }
            }
        }
    }
}

/// Placeholder size of a blank tile.
#[must_use]
pub fn blank_size() -> Size {
    Size::new(DISPLAY_BOX_WIDTH, DISPLAY_BOX_HEIGHT)
}

/// One image slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Stable identity.
    pub id: TileId,
    /// Content reference; `None` for a blank tile.
    pub source: Option<SourceId>,
    /// Natural pixel size of the loaded image; `None` for a blank tile.
    pub intrinsic: Option<Size>,
    /// Size used for layout and rendering.
    pub display: Size,
}

impl Tile {
    /// A fresh blank tile with a new identity.
    #[must_use]
    pub fn blank() -> Self {
        Self { id: Uuid::new_v4(), source: None, intrinsic: None, display: blank_size() }
    }

    /// A populated tile with a new identity.
    #[must_use]
    pub fn with_image(source: SourceId, intrinsic: Size, policy: DisplayPolicy) -> Self {
        let mut tile = Self::blank();
        tile.set_image(source, intrinsic, policy);
        tile
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.source.is_none()
    }

    /// Load image content into this tile, keeping its identity.
    pub fn set_image(&mut self, source: SourceId, intrinsic: Size, policy: DisplayPolicy) {
        self.display = policy.display_size(intrinsic);
        self.source = Some(source);
        self.intrinsic = Some(intrinsic);
    }

    /// Drop image content, keeping identity.
    pub fn clear(&mut self) {
        self.source = None;
        self.intrinsic = None;
        self.display = blank_size();
    }

    /// Aspect ratio resizes must preserve: the display aspect, which matches
    /// the intrinsic aspect whenever an image is loaded.
    #[must_use]
    pub fn aspect(&self) -> f64 {
        self.display
            .aspect()
            .or_else(|| self.intrinsic.and_then(|s| s.aspect()))
            .unwrap_or(DISPLAY_BOX_ASPECT)
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::blank()
    }
}
