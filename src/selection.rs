//! Two-axis keyboard selection over the tile row.
//!
//! Left/Right move between tiles, Up/Down cycle the action offered on the
//! selected tile. The controller only tracks state; committing returns a
//! [`Commit`] for the engine to carry out.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use serde::{Deserialize, Serialize};

/// Per-tile action picked with Up/Down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileAction {
    Paste,
    Load,
    Blank,
    Delete,
}

impl TileAction {
    const CYCLE: [Self; 4] = [Self::Paste, Self::Load, Self::Blank, Self::Delete];

    fn index(self) -> usize {
        match self {
            Self::Paste => 0,
            Self::Load => 1,
            Self::Blank => 2,
            Self::Delete => 3,
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self::CYCLE[(self.index() + 1) % Self::CYCLE.len()]
    }

    #[must_use]
    pub fn prev(self) -> Self {
        Self::CYCLE[(self.index() + Self::CYCLE.len() - 1) % Self::CYCLE.len()]
    }
}

/// Current keyboard selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub tile: Option<usize>,
    /// Only meaningful while `tile` is set.
    pub action: Option<TileAction>,
}

/// What a commit (Enter / Space) resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Run `action` on tile `index`.
    Dispatch { index: usize, action: TileAction },
    /// Append a tile to the grid.
    Grow,
    Nothing,
}

#[derive(Debug, Default)]
pub struct SelectionController {
    state: SelectionState,
    seen_revision: u64,
}

impl SelectionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> SelectionState {
        self.state
    }

    #[must_use]
    pub fn tile(&self) -> Option<usize> {
        self.state.tile
    }

    #[must_use]
    pub fn action(&self) -> Option<TileAction> {
        self.state.tile.and(self.state.action)
    }

    /// Right arrow. Returns true if the state changed.
    pub fn next(&mut self, len: usize) -> bool {
        if len == 0 {
            return false;
        }
        let tile = self.state.tile.map_or(0, |i| (i + 1).min(len - 1));
        self.move_to(tile)
    }

    /// Left arrow.
    pub fn prev(&mut self, len: usize) -> bool {
        if len == 0 {
            return false;
        }
        let tile = self.state.tile.map_or(0, |i| i.saturating_sub(1).min(len - 1));
        self.move_to(tile)
    }

    /// Down arrow: next action, starting at `Paste`.
    pub fn action_down(&mut self) -> bool {
        if self.state.tile.is_none() {
            return false;
        }
        self.state.action = Some(self.state.action.map_or(TileAction::Paste, TileAction::next));
        true
    }

    /// Up arrow: previous action, starting at `Delete`.
    pub fn action_up(&mut self) -> bool {
        if self.state.tile.is_none() {
            return false;
        }
        self.state.action = Some(self.state.action.map_or(TileAction::Delete, TileAction::prev));
        true
    }

    /// Pointer selection of tile `index`.
    pub fn select(&mut self, index: usize, len: usize) -> bool {
        if index >= len {
            return false;
        }
        self.state = SelectionState { tile: Some(index), action: None };
        true
    }

    pub fn clear(&mut self) {
        self.state = SelectionState::default();
    }

    /// Reset the selection if the collection changed structurally since the
    /// last call. Returns true when a reset happened.
    pub fn observe(&mut self, revision: u64) -> bool {
        if revision == self.seen_revision {
            return false;
        }
        self.seen_revision = revision;
        let changed = self.state != SelectionState::default();
        self.clear();
        changed
    }

    /// Resolve Enter / Space. A dispatched action is cleared afterwards.
    pub fn commit(&mut self, len: usize, stitched: bool) -> Commit {
        let Some(index) = self.state.tile.filter(|i| *i < len) else {
            return Commit::Nothing;
        };
        if let Some(action) = self.state.action.take() {
            return Commit::Dispatch { index, action };
        }
        if !stitched && index + 1 == len {
            return Commit::Grow;
        }
        Commit::Nothing
    }

    fn move_to(&mut self, tile: usize) -> bool {
        let next = SelectionState { tile: Some(tile), action: None };
        let changed = next != self.state;
        self.state = next;
        changed
    }
}
