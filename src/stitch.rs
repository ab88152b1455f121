//! Stitching: turning a tile collection into one composite canvas, and back.
//!
//! A [`Composite`] holds every tile at an absolute canvas position, a shared
//! canvas size, and a back-to-front `z_order`. It also keeps the exact
//! collection it was built from so that [`unstitch`] can hand it back
//! untouched. Edits made while stitched are only carried back when the caller
//! asks for them.
//!
//! Two placement policies exist:
//!
//! | Policy | Placement | Canvas |
//! |--------|-----------|--------|
//! | [`StitchPolicy::Row`] | grid cell top-left, unscaled | `columns × cell`, `rows × cell` |
//! | [`StitchPolicy::Linear`] | left to right, `y = 0`, optional uniform scale | sum of widths, max height |

#[cfg(test)]
#[path = "stitch_test.rs"]
mod stitch_test;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collection::TileCollection;
use crate::geom::{Rect, Size};
use crate::tile::{Tile, TileId};

/// Errors that keep a stitch from producing a usable canvas.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StitchError {
    /// There are no tiles to stitch.
    #[error("cannot stitch an empty collection")]
    Empty,
    /// The computed canvas has no area.
    #[error("stitched canvas has zero area ({width}x{height})")]
    ZeroArea { width: f64, height: f64 },
    /// The engine requires more tiles before stitching is offered.
    #[error("stitching needs at least {required} tiles, found {found}")]
    TooFewTiles { required: usize, found: usize },
}

/// Uniform down-scaling applied after a linear layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleToFit {
    /// Space available to the composite.
    pub viewport: Size,
    /// Fraction of the fitted size actually used, in `(0, 1]`.
    pub fit_fraction: f64,
}

impl ScaleToFit {
    /// Scale factor for a canvas of `canvas` size, or `None` when the viewport
    /// or canvas has no area.
    #[must_use]
    pub fn factor(&self, canvas: Size) -> Option<f64> {
        if self.viewport.is_empty() || canvas.is_empty() {
            return None;
        }
        let fit = (self.viewport.width / canvas.width)
            .min(self.viewport.height / canvas.height)
            .min(1.0);
        Some(fit * self.fit_fraction.clamp(f64::MIN_POSITIVE, 1.0))
    }
}

/// How tiles are placed onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StitchPolicy {
    /// Grid cells of the largest tile size, `columns` wide, unscaled.
    Row { columns: usize },
    /// A single left-to-right strip, optionally scaled to fit a viewport.
    Linear { fit: Option<ScaleToFit> },
}

/// A tile at an absolute canvas position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedTile {
    pub tile: Tile,
    /// Left edge, canvas-relative.
    pub x: f64,
    /// Top edge, canvas-relative.
    pub y: f64,
}

impl PlacedTile {
    #[must_use]
    pub fn id(&self) -> TileId {
        self.tile.id
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.tile.display.width, self.tile.display.height)
    }
}

/// The stitched view of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composite {
    canvas: Size,
    /// Uniform factor applied to display sizes at stitch time.
    scale: f64,
    tiles: Vec<PlacedTile>,
    z_order: Vec<TileId>,
    #[serde(skip)]
    original: Vec<Tile>,
}

impl Composite {
    #[must_use]
    pub fn canvas(&self) -> Size {
        self.canvas
    }

    /// Scale applied to every tile when stitching; 1 when unscaled.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Placed tiles in stitch-time sequence order.
    #[must_use]
    pub fn tiles(&self) -> &[PlacedTile] {
        &self.tiles
    }

    /// Tile ids from back to front.
    #[must_use]
    pub fn z_order(&self) -> &[TileId] {
        &self.z_order
    }

    /// The collection this composite was stitched from.
    #[must_use]
    pub fn original(&self) -> &[Tile] {
        &self.original
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: TileId) -> Option<&PlacedTile> {
        self.tiles.iter().find(|p| p.id() == id)
    }

    pub fn get_mut(&mut self, id: TileId) -> Option<&mut PlacedTile> {
        self.tiles.iter_mut().find(|p| p.id() == id)
    }

    #[must_use]
    pub fn at(&self, index: usize) -> Option<&PlacedTile> {
        self.tiles.get(index)
    }

    pub fn at_mut(&mut self, index: usize) -> Option<&mut PlacedTile> {
        self.tiles.get_mut(index)
    }

    /// Position of `id` in the z-order; higher renders in front.
    #[must_use]
    pub fn depth(&self, id: TileId) -> Option<usize> {
        self.z_order.iter().position(|z| *z == id)
    }

    /// Placed tiles from back to front.
    #[must_use]
    pub fn render_order(&self) -> Vec<&PlacedTile> {
        self.z_order.iter().filter_map(|id| self.get(*id)).collect()
    }

    /// Move `id` to the front of the stacking order.
    pub fn raise(&mut self, id: TileId) -> bool {
        let Some(pos) = self.depth(id) else {
            return false;
        };
        let id = self.z_order.remove(pos);
        self.z_order.push(id);
        true
    }

    /// Remove the placed tile at `index`, keeping `z_order` a permutation.
    pub fn remove_at(&mut self, index: usize) -> Option<PlacedTile> {
        if index >= self.tiles.len() {
            return None;
        }
        let placed = self.tiles.remove(index);
        self.z_order.retain(|z| *z != placed.id());
        Some(placed)
    }

    /// Clamp an origin so a `size` rectangle stays inside the canvas.
    ///
    /// A rectangle larger than the canvas is pinned to the origin.
    #[must_use]
    pub fn clamp_origin(&self, x: f64, y: f64, size: Size) -> (f64, f64) {
        let max_x = (self.canvas.width - size.width).max(0.0);
        let max_y = (self.canvas.height - size.height).max(0.0);
        (x.clamp(0.0, max_x), y.clamp(0.0, max_y))
    }

    /// Refit one tile after its content changed outside of a gesture.
    ///
    /// The tile's freshly set, unscaled display size is brought to the
    /// composite's scale and shrunk on both sides until it fits the canvas;
    /// the origin is then clamped. Tiles never grow past their scaled size.
    pub fn fit_tile(&mut self, index: usize) {
        let canvas = self.canvas;
        let scale = self.scale;
        let Some(placed) = self.tiles.get_mut(index) else {
            return;
        };
        let size = placed.tile.display.scaled(scale);
        let shrink = (canvas.width / size.width).min(canvas.height / size.height).min(1.0);
        if shrink.is_finite() && shrink > 0.0 {
            placed.tile.display = size.scaled(shrink);
        }
        let (x, y, display) = (placed.x, placed.y, placed.tile.display);
        let (x, y) = self.clamp_origin(x, y, display);
        if let Some(placed) = self.tiles.get_mut(index) {
            placed.x = x;
            placed.y = y;
        }
    }
}

/// Stitch `tiles` into a composite using `policy`.
///
/// # Errors
///
/// [`StitchError::Empty`] for an empty collection and
/// [`StitchError::ZeroArea`] when the resulting canvas has no area.
pub fn stitch(tiles: &TileCollection, policy: StitchPolicy) -> Result<Composite, StitchError> {
    if tiles.is_empty() {
        return Err(StitchError::Empty);
    }
    let (canvas, placed, scale) = match policy {
        StitchPolicy::Row { columns } => {
            let (canvas, placed) = place_rows(tiles.as_slice(), columns.max(1));
            (canvas, placed, 1.0)
        }
        StitchPolicy::Linear { fit } => place_linear(tiles.as_slice(), fit),
    };
    if canvas.is_empty() {
        return Err(StitchError::ZeroArea { width: canvas.width, height: canvas.height });
    }
    debug!(tiles = placed.len(), width = canvas.width, height = canvas.height, "stitched composite");
    Ok(Composite {
        canvas,
        scale,
        z_order: placed.iter().map(PlacedTile::id).collect(),
        tiles: placed,
        original: tiles.as_slice().to_vec(),
    })
}

/// Recover a tile sequence from a composite.
///
/// With `retain_edits` false this is exactly the collection captured at
/// stitch time. With it set, the composite's current tiles (including size
/// and content edits) are returned in sequence order; positions are dropped
/// because the grid does not persist them.
#[must_use]
pub fn unstitch(composite: &Composite, retain_edits: bool) -> Vec<Tile> {
    if retain_edits {
        composite.tiles.iter().map(|p| p.tile.clone()).collect()
    } else {
        composite.original.clone()
    }
}

fn place_rows(tiles: &[Tile], columns: usize) -> (Size, Vec<PlacedTile>) {
    let mut cell = Size::default();
    for tile in tiles {
        cell.width = cell.width.max(tile.display.width);
        cell.height = cell.height.max(tile.display.height);
    }
    let rows = tiles.len().div_ceil(columns);
    let placed = tiles
        .iter()
        .enumerate()
        .map(|(i, tile)| PlacedTile {
            tile: tile.clone(),
            x: (i % columns) as f64 * cell.width,
            y: (i / columns) as f64 * cell.height,
        })
        .collect();
    (Size::new(columns as f64 * cell.width, rows as f64 * cell.height), placed)
}

fn place_linear(tiles: &[Tile], fit: Option<ScaleToFit>) -> (Size, Vec<PlacedTile>, f64) {
    let (canvas, placed) = lay_strip(tiles.iter().cloned().collect());
    let Some(scale) = fit.and_then(|f| f.factor(canvas)) else {
        return (canvas, placed, 1.0);
    };
    // Scaling and repositioning go together: re-lay with the scaled widths.
    let scaled = placed
        .into_iter()
        .map(|p| {
            let mut tile = p.tile;
            tile.display = tile.display.scaled(scale);
            tile
        })
        .collect();
    let (canvas, placed) = lay_strip(scaled);
    (canvas, placed, scale)
}

fn lay_strip(tiles: Vec<Tile>) -> (Size, Vec<PlacedTile>) {
    let mut x = 0.0;
    let mut height: f64 = 0.0;
    let placed = tiles
        .into_iter()
        .map(|tile| {
            let p = PlacedTile { x, y: 0.0, tile };
            x += p.tile.display.width;
            height = height.max(p.tile.display.height);
            p
        })
        .collect();
    (Size::new(x, height), placed)
}
