#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::HANDLE_SIZE_PX;
use crate::geom::{Point, Rect};
use crate::stitch::{Composite, PlacedTile};
use crate::tile::TileId;

/// Which part of a tile was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    /// The bottom-right resize handle.
    ResizeHandle,
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub tile_id: TileId,
    pub part: HitPart,
}

/// Square handle area inside the tile's bottom-right corner.
#[must_use]
pub fn handle_rect(placed: &PlacedTile) -> Rect {
    let r = placed.rect();
    let side = HANDLE_SIZE_PX.min(r.width).min(r.height);
    Rect::new(r.right() - side, r.bottom() - side, side, side)
}

/// Front-most tile under `pt`, checking each tile's handle before its body.
#[must_use]
pub fn hit_test(pt: Point, composite: &Composite) -> Option<Hit> {
    composite.render_order().into_iter().rev().find_map(|placed| {
        if handle_rect(placed).contains(pt) {
            Some(Hit { tile_id: placed.id(), part: HitPart::ResizeHandle })
        } else if placed.rect().contains(pt) {
            Some(Hit { tile_id: placed.id(), part: HitPart::Body })
        } else {
            None
        }
    })
}
