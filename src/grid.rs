//! Row-major grid arrangement of a tile collection.
//!
//! The grid only decides which tile sits in which cell; it never writes
//! coordinates back into tiles. Growing by a column is the one operation with
//! real structure: the flat sequence is re-flowed so every row gains a blank
//! at its right-hand end while keeping its existing left-to-right order.

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use serde::{Deserialize, Serialize};

use crate::collection::TileCollection;
use crate::geom::Size;
use crate::tile::{Tile, blank_size};

/// One cell of the arranged grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub row: usize,
    pub column: usize,
    /// Index into the collection, or `None` for a padding cell past the end.
    pub index: Option<usize>,
}

/// Grid dimensions. Both are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    rows: usize,
    columns: usize,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self { rows: 1, columns: 1 }
    }
}

impl GridLayout {
    /// A grid of `rows × columns`, each clamped to at least 1.
    #[must_use]
    pub fn new(rows: usize, columns: usize) -> Self {
        Self { rows: rows.max(1), columns: columns.max(1) }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.rows * self.columns
    }

    /// Row-major placement of exactly `rows * columns` cells.
    #[must_use]
    pub fn place(&self, tiles: &TileCollection) -> Vec<GridCell> {
        let len = tiles.len();
        (0..self.capacity())
            .map(|i| GridCell {
                row: i / self.columns,
                column: i % self.columns,
                index: (i < len).then_some(i),
            })
            .collect()
    }

    /// Size of one cell: the largest display width and height among placed tiles.
    #[must_use]
    pub fn cell_size(&self, tiles: &TileCollection) -> Size {
        // Padding cells render as blanks, so they count too.
        let mut cell = if tiles.len() < self.capacity() { blank_size() } else { Size::default() };
        for tile in tiles.iter().take(self.capacity()) {
            cell.width = cell.width.max(tile.display.width);
            cell.height = cell.height.max(tile.display.height);
        }
        cell
    }

    /// Bounding size of the whole grid.
    #[must_use]
    pub fn bounds(&self, tiles: &TileCollection) -> Size {
        let cell = self.cell_size(tiles);
        Size::new(cell.width * self.columns as f64, cell.height * self.rows as f64)
    }

    /// Grow `columns` until the grid can hold `len` tiles.
    pub fn fit(&mut self, len: usize) {
        if len > self.capacity() {
            self.columns = len.div_ceil(self.rows);
        }
    }

    /// Add a column, inserting a blank at the end of every row.
    pub fn add_column(&mut self, tiles: &mut TileCollection) {
        self.pad(tiles);
        for row in (0..self.rows).rev() {
            tiles.insert_at((row + 1) * self.columns, Tile::blank());
        }
        self.columns += 1;
    }

    /// Add a row of blanks at the end.
    pub fn add_row(&mut self, tiles: &mut TileCollection) {
        self.pad(tiles);
        for _ in 0..self.columns {
            tiles.insert_at(tiles.len(), Tile::blank());
        }
        self.rows += 1;
    }

    /// Remove the last tile of every row. Refused when only one column is left.
    pub fn remove_column(&mut self, tiles: &mut TileCollection) -> bool {
        if self.columns <= 1 {
            return false;
        }
        self.pad(tiles);
        for row in (0..self.rows).rev() {
            tiles.remove_at(row * self.columns + self.columns - 1);
        }
        self.columns -= 1;
        true
    }

    /// Remove the last row. Refused when only one row is left.
    pub fn remove_row(&mut self, tiles: &mut TileCollection) -> bool {
        if self.rows <= 1 {
            return false;
        }
        self.pad(tiles);
        tiles.truncate((self.rows - 1) * self.columns);
        self.rows -= 1;
        true
    }

    /// Fill the collection with blanks up to the grid's capacity.
    ///
    /// Tiles beyond capacity are left alone; they are simply not placed.
    fn pad(&self, tiles: &mut TileCollection) {
        while tiles.len() < self.capacity() {
            tiles.insert_at(tiles.len(), Tile::blank());
        }
    }
}
