//! Ordered tile container: the authoritative unstitched state.
//!
//! Order is significant: it is the grid's reading order and the initial
//! left-to-right order of a stitched composite. Every structural change
//! (insert, remove, move, wholesale replacement) bumps `revision`, which the
//! selection controller watches to know when its indices went stale.

#[cfg(test)]
#[path = "collection_test.rs"]
mod collection_test;

use serde::{Deserialize, Serialize};

use crate::tile::{Tile, TileId};

/// Ordered sequence of tiles with value semantics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TileCollection {
    tiles: Vec<Tile>,
    #[serde(skip)]
    revision: u64,
    #[serde(skip)]
    block_duplicate_blanks: bool,
}

impl TileCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection holding `tiles`.
    #[must_use]
    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        Self { tiles, ..Self::default() }
    }

    /// When enabled, `insert_blank` refuses to add a blank while another blank exists.
    pub fn set_block_duplicate_blanks(&mut self, enabled: bool) {
        self.block_duplicate_blanks = enabled;
    }

    /// Append a default blank tile and return its id.
    ///
    /// Returns `None` without changing anything when duplicate blanks are
    /// blocked and a blank tile is already present.
    pub fn insert_blank(&mut self) -> Option<TileId> {
        if self.block_duplicate_blanks && self.has_blank() {
            return None;
        }
        let tile = Tile::blank();
        let id = tile.id;
        self.tiles.push(tile);
        self.bump();
        Some(id)
    }

    /// Insert a tile at `index` (clamped to the end).
    pub fn insert_at(&mut self, index: usize, tile: Tile) {
        let index = index.min(self.tiles.len());
        self.tiles.insert(index, tile);
        self.bump();
    }

    /// Remove the tile at `index`, shifting later tiles down.
    pub fn remove_at(&mut self, index: usize) -> Option<Tile> {
        if index >= self.tiles.len() {
            return None;
        }
        let tile = self.tiles.remove(index);
        self.bump();
        Some(tile)
    }

    /// Relocate a tile with remove-then-insert splice semantics.
    ///
    /// `to` is interpreted against the collection after removal and clamped
    /// to its end. Returns false if `from` is out of range.
    pub fn move_to(&mut self, from: usize, to: usize) -> bool {
        if from >= self.tiles.len() {
            return false;
        }
        let tile = self.tiles.remove(from);
        let to = to.min(self.tiles.len());
        self.tiles.insert(to, tile);
        self.bump();
        true
    }

    /// Overwrite the tile at `index` in place. Not a structural change.
    pub fn replace_at(&mut self, index: usize, tile: Tile) -> bool {
        let Some(slot) = self.tiles.get_mut(index) else {
            return false;
        };
        *slot = tile;
        true
    }

    /// Replace every tile at once.
    pub fn replace_all(&mut self, tiles: Vec<Tile>) {
        self.tiles = tiles;
        self.bump();
    }

    /// Remove tiles from the end until at most `len` remain.
    pub fn truncate(&mut self, len: usize) {
        if len < self.tiles.len() {
            self.tiles.truncate(len);
            self.bump();
        }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Tile> {
        self.tiles.get_mut(index)
    }

    /// Index of the tile with `id`, wherever it currently sits.
    #[must_use]
    pub fn position(&self, id: TileId) -> Option<usize> {
        self.tiles.iter().position(|t| t.id == id)
    }

    pub fn find_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.iter_mut().find(|t| t.id == id)
    }

    #[must_use]
    pub fn has_blank(&self) -> bool {
        self.tiles.iter().any(Tile::is_blank)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tile> {
        self.tiles.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Tile] {
        &self.tiles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Structural revision; increases on every insert, remove, move or replace-all.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

/// Equality compares tiles only; revision and policy are bookkeeping.
impl PartialEq for TileCollection {
    fn eq(&self, other: &Self) -> bool {
        self.tiles == other.tiles
    }
}

impl<'a> IntoIterator for &'a TileCollection {
    type Item = &'a Tile;
    type IntoIter = std::slice::Iter<'a, Tile>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.iter()
    }
}
