use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::collection::TileCollection;
use crate::config::{EngineConfig, StitchMode};
use crate::events::{EventSink, InputMethod, TracingSink};
use crate::geom::{Point, Rect, Size};
use crate::grid::GridLayout;
use crate::ingest::{
    ByteSource, ClipboardItem, DecodeError, DecodeRequest, DecodeTicket, DecodedImage, ImageBlob, ImageDecoder,
    ImageIngestor, IngestError, keep_blank,
};
use crate::input::{GestureKind, Key, Modifiers, PointerCapture};
use crate::interact::CompositeInteraction;
use crate::selection::{Commit, SelectionController, SelectionState, TileAction};
use crate::stitch::{Composite, PlacedTile, ScaleToFit, StitchError, StitchPolicy, stitch, unstitch};
use crate::tile::{SourceId, Tile, TileId};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RenderNeeded,
    /// The collection became empty; move focus to the add-tile control.
    FocusAddControl,
    /// Read the system clipboard and hand it to [`EngineCore::paste`].
    ReadClipboard { tile: usize },
    /// Open a file picker and hand the file to [`EngineCore::upload`].
    OpenFilePicker { tile: usize },
    /// Decode the bytes and report back through [`EngineCore::complete_decode`].
    DecodeRequested(DecodeRequest),
    StitchChanged { stitched: bool },
    Export(ExportRequest),
}

/// Where an exported composite should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportTarget {
    Download,
    Clipboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// One tile to draw during export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportLayer {
    pub id: TileId,
    /// `None` draws a blank tile.
    pub source: Option<SourceId>,
    pub rect: Rect,
}

/// Everything the host needs to rasterize the composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub target: ExportTarget,
    pub format: ExportFormat,
    pub filename: String,
    pub canvas: Size,
    /// Back to front.
    pub layers: Vec<ExportLayer>,
}

/// Serializable view of the engine for the host to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Snapshot {
    Grid {
        layout: GridLayout,
        cell: Size,
        tiles: Vec<Tile>,
        selection: SelectionState,
        can_stitch: bool,
    },
    Composite {
        canvas: Size,
        /// Back to front.
        layers: Vec<PlacedTile>,
        selection: SelectionState,
    },
}

/// Core engine state: the tile collection, its grid, the stitched
/// composite when there is one, and the controllers driving them.
///
/// Every handler returns the [`Action`]s the host should carry out.
pub struct EngineCore {
    pub config: EngineConfig,
    pub tiles: TileCollection,
    pub grid: GridLayout,
    pub ingestor: ImageIngestor,
    pub composite: Option<Composite>,
    pub interaction: CompositeInteraction,
    pub selection: SelectionController,
    pub viewport: Size,
    sink: Box<dyn EventSink>,
    /// Bumped on structural composite changes; the collection has its own revision.
    epoch: u64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineCore {
    /// Engine with default config, logging events through `tracing`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default(), Box::new(TracingSink))
    }

    /// Engine starting from a single blank tile.
    #[must_use]
    pub fn with_config(config: EngineConfig, sink: Box<dyn EventSink>) -> Self {
        let mut tiles = TileCollection::new();
        tiles.set_block_duplicate_blanks(config.block_duplicate_blanks);
        tiles.insert_blank();
        let mut engine = Self {
            ingestor: ImageIngestor::new(config.display_policy),
            interaction: CompositeInteraction::new(config.long_press_ms, config.drag_threshold_px),
            config,
            tiles,
            grid: GridLayout::default(),
            composite: None,
            selection: SelectionController::new(),
            viewport: Size::default(),
            sink,
            epoch: 0,
        };
        engine.sync_selection();
        engine
    }

    /// Install the host's pointer-capture hook used during drag and resize.
    pub fn set_pointer_capture(&mut self, capture: Box<dyn PointerCapture>) {
        self.interaction.set_capture(capture);
    }

    // --- Queries ---

    #[must_use]
    pub fn is_stitched(&self) -> bool {
        self.composite.is_some()
    }

    /// Number of tiles in the current view (grid or composite).
    #[must_use]
    pub fn len(&self) -> usize {
        self.composite.as_ref().map_or(self.tiles.len(), Composite::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tile `index` in the current view.
    #[must_use]
    pub fn tile(&self, index: usize) -> Option<&Tile> {
        match &self.composite {
            Some(c) => c.at(index).map(|p| &p.tile),
            None => self.tiles.get(index),
        }
    }

    /// Whether stitching is currently offered.
    #[must_use]
    pub fn can_stitch(&self) -> bool {
        !self.is_stitched() && self.tiles.len() >= self.config.min_stitch_tiles
    }

    /// Changes whenever the current view changed structurally.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.tiles.revision().wrapping_add(self.epoch)
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let selection = self.selection.state();
        match &self.composite {
            Some(c) => Snapshot::Composite {
                canvas: c.canvas(),
                layers: c.render_order().into_iter().cloned().collect(),
                selection,
            },
            None => Snapshot::Grid {
                layout: self.grid,
                cell: self.grid.cell_size(&self.tiles),
                tiles: self.tiles.as_slice().to_vec(),
                selection,
                can_stitch: self.can_stitch(),
            },
        }
    }

    // --- Host inputs ---

    pub fn set_viewport(&mut self, width: f64, height: f64) -> Vec<Action> {
        self.viewport = Size::new(width, height);
        vec![Action::RenderNeeded]
    }

    /// Pointer selection of tile `index`.
    pub fn select_tile(&mut self, index: usize) -> Vec<Action> {
        if self.selection.select(index, self.len()) { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    /// Clipboard contents for tile `index`, after an [`Action::ReadClipboard`].
    pub fn paste(&mut self, index: usize, items: Vec<ClipboardItem>) -> Vec<Action> {
        self.ingest(index, ByteSource::Clipboard(items), InputMethod::Clipboard)
    }

    /// A picked or dropped file for tile `index`.
    pub fn upload(&mut self, index: usize, blob: ImageBlob) -> Vec<Action> {
        self.ingest(index, ByteSource::File(blob), InputMethod::File)
    }

    /// The host's answer to an [`Action::DecodeRequested`].
    pub fn complete_decode(&mut self, ticket: DecodeTicket, result: Result<Size, DecodeError>) -> Vec<Action> {
        match self.ingestor.finish(ticket, result) {
            Ok(image) => self.apply_decoded(&image),
            Err(IngestError::UnknownTicket(t)) => {
                debug!(ticket = t, "ignoring completion for unknown ticket");
                Vec::new()
            }
            Err(IngestError::Stale(t)) => {
                debug!(ticket = t, "dropping completion aimed at a discarded composite");
                Vec::new()
            }
            Err(e) => {
                warn!(ticket = ticket.0, error = %e, "image decode failed");
                self.emit("image_failed", json!({ "ticket": ticket.0, "error": e.to_string() }), InputMethod::Host);
                Vec::new()
            }
        }
    }

    /// Decode `request` in-process and complete it.
    pub fn decode_with(&mut self, decoder: &dyn ImageDecoder, request: &DecodeRequest) -> Vec<Action> {
        let result = decoder.decode(&request.bytes);
        self.complete_decode(request.ticket, result)
    }

    /// Fill tile `index` with a generated placeholder image.
    pub fn add_placeholder(&mut self, index: usize, width: u32, height: u32) -> Vec<Action> {
        let target = match &mut self.composite {
            Some(c) => c.at_mut(index).map(|p| &mut p.tile),
            None => self.tiles.get_mut(index),
        };
        let Some(tile) = target else {
            return Vec::new();
        };
        self.ingestor.placeholder(tile, width, height);
        let id = tile.id;
        if let Some(c) = self.composite.as_mut() {
            c.fit_tile(index);
        }
        self.emit("placeholder_added", json!({ "tile": id, "width": width, "height": height }), InputMethod::Host);
        vec![Action::RenderNeeded]
    }

    /// Reset tile `index` to blank, keeping its place.
    pub fn keep_blank(&mut self, index: usize) -> Vec<Action> {
        self.blank_tile(index, InputMethod::Host)
    }

    /// Delete tile `index` from the current view.
    pub fn remove_tile(&mut self, index: usize) -> Vec<Action> {
        self.delete_tile(index, InputMethod::Host)
    }

    // --- Grid commands ---

    pub fn add_tile(&mut self) -> Vec<Action> {
        self.grow(InputMethod::Host)
    }

    pub fn add_column(&mut self) -> Vec<Action> {
        if self.is_stitched() {
            return Vec::new();
        }
        self.grid.add_column(&mut self.tiles);
        self.after_grid_change("column_added")
    }

    pub fn add_row(&mut self) -> Vec<Action> {
        if self.is_stitched() {
            return Vec::new();
        }
        self.grid.add_row(&mut self.tiles);
        self.after_grid_change("row_added")
    }

    pub fn remove_column(&mut self) -> Vec<Action> {
        if self.is_stitched() || !self.grid.remove_column(&mut self.tiles) {
            return Vec::new();
        }
        self.after_grid_change("column_removed")
    }

    pub fn remove_row(&mut self) -> Vec<Action> {
        if self.is_stitched() || !self.grid.remove_row(&mut self.tiles) {
            return Vec::new();
        }
        self.after_grid_change("row_removed")
    }

    // --- Stitching ---

    pub fn toggle_stitch(&mut self) -> Vec<Action> {
        self.toggle_stitch_from(InputMethod::Host)
    }

    /// Stitch the collection into a composite.
    ///
    /// # Errors
    ///
    /// [`StitchError::TooFewTiles`] below `min_stitch_tiles`, plus anything
    /// [`stitch`] itself reports.
    pub fn stitch(&mut self) -> Result<Vec<Action>, StitchError> {
        self.stitch_from(InputMethod::Host)
    }

    /// Return to the grid. Stitch-time edits are kept only when configured.
    pub fn unstitch(&mut self) -> Vec<Action> {
        self.unstitch_from(InputMethod::Host)
    }

    /// Ask the host to rasterize the composite. Only available while stitched.
    pub fn export(&mut self, target: ExportTarget, format: ExportFormat) -> Vec<Action> {
        let Some(c) = &self.composite else {
            debug!("export ignored while not stitched");
            return Vec::new();
        };
        let layers: Vec<ExportLayer> = c
            .render_order()
            .into_iter()
            .map(|p| ExportLayer { id: p.id(), source: p.tile.source.clone(), rect: p.rect() })
            .collect();
        let request = ExportRequest {
            target,
            format,
            filename: format!("stitched-image.{}", format.extension()),
            canvas: c.canvas(),
            layers,
        };
        self.emit(
            "export_requested",
            json!({ "target": target, "format": format, "layers": request.layers.len() }),
            InputMethod::Host,
        );
        vec![Action::Export(request)]
    }

    // --- Pointer input (composite only) ---

    pub fn on_pointer_down(&mut self, pt: Point, time_ms: u64) -> Vec<Action> {
        let Some(c) = &self.composite else {
            return Vec::new();
        };
        let Some(id) = self.interaction.pointer_down(c, pt, time_ms) else {
            return Vec::new();
        };
        let len = c.len();
        if let Some(index) = c.tiles().iter().position(|p| p.id() == id) {
            self.selection.select(index, len);
        }
        vec![Action::RenderNeeded]
    }

    pub fn on_pointer_move(&mut self, pt: Point, time_ms: u64) -> Vec<Action> {
        let Some(c) = self.composite.as_mut() else {
            return Vec::new();
        };
        if self.interaction.pointer_move(c, pt, time_ms) { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    pub fn on_pointer_up(&mut self, pt: Point, time_ms: u64) -> Vec<Action> {
        let Some(c) = self.composite.as_mut() else {
            return Vec::new();
        };
        let Some(release) = self.interaction.pointer_up(c, pt, time_ms) else {
            return Vec::new();
        };
        let event = match release.kind {
            GestureKind::Click => "tile_raised",
            GestureKind::Drag => "tile_moved",
            GestureKind::Resize => "tile_resized",
        };
        self.emit(
            event,
            json!({
                "tile": release.id,
                "x": release.x,
                "y": release.y,
                "width": release.size.width,
                "height": release.size.height,
            }),
            InputMethod::Pointer,
        );
        vec![Action::RenderNeeded]
    }

    /// Long-press timer.
    pub fn on_tick(&mut self, time_ms: u64) -> Vec<Action> {
        if self.interaction.tick(time_ms) { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    // --- Keyboard ---

    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        self.sync_selection();
        if modifiers.command() {
            return self.on_shortcut(&key, modifiers);
        }
        let len = self.len();
        let changed = match key.0.as_str() {
            "ArrowRight" => self.selection.next(len),
            "ArrowLeft" => self.selection.prev(len),
            "ArrowDown" => self.selection.action_down(),
            "ArrowUp" => self.selection.action_up(),
            "Enter" | " " => return self.commit(),
            "Delete" => {
                return match self.selection.tile() {
                    Some(index) => self.delete_tile(index, InputMethod::Keyboard),
                    None => Vec::new(),
                };
            }
            "Escape" => self.cancel_or_clear(),
            _ => false,
        };
        if changed { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    fn on_shortcut(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        let target = self.selection.tile().unwrap_or(0);
        if key.is_letter('v') {
            return self.request_content(target, TileAction::Paste, InputMethod::Shortcut);
        }
        if !modifiers.shift {
            return Vec::new();
        }
        if key.is_letter('u') {
            self.request_content(target, TileAction::Load, InputMethod::Shortcut)
        } else if key.is_letter('a') {
            self.grow(InputMethod::Shortcut)
        } else if key.is_letter('i') {
            self.toggle_stitch_from(InputMethod::Shortcut)
        } else {
            Vec::new()
        }
    }

    fn commit(&mut self) -> Vec<Action> {
        match self.selection.commit(self.len(), self.is_stitched()) {
            Commit::Dispatch { index, action: action @ (TileAction::Paste | TileAction::Load) } => {
                self.request_content(index, action, InputMethod::Keyboard)
            }
            Commit::Dispatch { index, action: TileAction::Blank } => self.blank_tile(index, InputMethod::Keyboard),
            Commit::Dispatch { index, action: TileAction::Delete } => self.delete_tile(index, InputMethod::Keyboard),
            Commit::Grow => self.grow(InputMethod::Keyboard),
            Commit::Nothing => Vec::new(),
        }
    }

    fn cancel_or_clear(&mut self) -> bool {
        if let Some(c) = self.composite.as_mut() {
            if self.interaction.cancel(c) {
                return true;
            }
        }
        let had_selection = self.selection.tile().is_some();
        self.selection.clear();
        had_selection
    }

    // --- Internals ---

    /// Ask the host for clipboard contents or a file for tile `index`.
    fn request_content(&mut self, index: usize, action: TileAction, input: InputMethod) -> Vec<Action> {
        if index >= self.len() {
            return Vec::new();
        }
        let (event, request) = match action {
            TileAction::Load => ("file_requested", Action::OpenFilePicker { tile: index }),
            _ => ("clipboard_requested", Action::ReadClipboard { tile: index }),
        };
        self.emit(event, json!({ "index": index }), input);
        vec![request]
    }

    fn ingest(&mut self, index: usize, source: ByteSource, input: InputMethod) -> Vec<Action> {
        let Some(id) = self.tile(index).map(|t| t.id) else {
            debug!(index, "ingest target out of range");
            return Vec::new();
        };
        match self.ingestor.begin(id, source) {
            Ok(request) => {
                self.emit("image_requested", json!({ "tile": id, "ticket": request.ticket.0 }), input);
                vec![Action::DecodeRequested(request)]
            }
            Err(e) if e.is_silent() => {
                debug!(index, reason = %e, "nothing to ingest");
                Vec::new()
            }
            Err(e) => {
                warn!(index, error = %e, "ingest failed");
                self.emit("image_failed", json!({ "tile": id, "error": e.to_string() }), input);
                Vec::new()
            }
        }
    }

    fn apply_decoded(&mut self, image: &DecodedImage) -> Vec<Action> {
        let applied = match self.composite.as_mut() {
            Some(c) => match c.tiles().iter().position(|p| p.id() == image.tile) {
                Some(index) => {
                    if let Some(placed) = c.at_mut(index) {
                        self.ingestor.apply(image, &mut placed.tile);
                    }
                    c.fit_tile(index);
                    true
                }
                None => false,
            },
            None => match self.tiles.find_mut(image.tile) {
                Some(tile) => {
                    self.ingestor.apply(image, tile);
                    true
                }
                None => false,
            },
        };
        if !applied {
            debug!(tile = %image.tile, "decode target no longer exists");
            return Vec::new();
        }
        self.emit(
            "image_loaded",
            json!({
                "tile": image.tile,
                "width": image.intrinsic.width,
                "height": image.intrinsic.height,
            }),
            InputMethod::Host,
        );
        vec![Action::RenderNeeded]
    }

    fn blank_tile(&mut self, index: usize, input: InputMethod) -> Vec<Action> {
        let id = match self.composite.as_mut() {
            Some(c) => {
                let Some(placed) = c.at_mut(index) else {
                    return Vec::new();
                };
                keep_blank(&mut placed.tile);
                let id = placed.id();
                c.fit_tile(index);
                id
            }
            None => {
                let Some(tile) = self.tiles.get_mut(index) else {
                    return Vec::new();
                };
                keep_blank(tile);
                tile.id
            }
        };
        self.emit("tile_blanked", json!({ "tile": id, "index": index }), input);
        vec![Action::RenderNeeded]
    }

    fn delete_tile(&mut self, index: usize, input: InputMethod) -> Vec<Action> {
        let removed = match self.composite.as_mut() {
            Some(c) => {
                let removed = c.remove_at(index).map(|p| p.id());
                if removed.is_some() {
                    self.epoch = self.epoch.wrapping_add(1);
                }
                removed
            }
            None => self.tiles.remove_at(index).map(|t| t.id),
        };
        let Some(id) = removed else {
            return Vec::new();
        };
        self.interaction.forget(id);
        self.sync_selection();
        self.emit("tile_removed", json!({ "tile": id, "index": index }), input);
        let mut actions = vec![Action::RenderNeeded];
        if self.is_empty() {
            actions.push(Action::FocusAddControl);
        }
        actions
    }

    /// Add a blank tile without moving any existing tile to another row.
    ///
    /// A free cell in the last row is filled first. A full single-row grid
    /// gets one more column at its end; a full multi-row grid gains a whole
    /// column, one blank at the end of every row.
    fn grow(&mut self, input: InputMethod) -> Vec<Action> {
        if self.is_stitched() {
            return Vec::new();
        }
        if self.config.block_duplicate_blanks && self.tiles.has_blank() {
            debug!("blank tile already present; not adding another");
            return Vec::new();
        }
        let before = self.tiles.len();
        if before >= self.grid.capacity() && self.grid.rows() > 1 {
            self.grid.add_column(&mut self.tiles);
        } else {
            self.tiles.insert_at(before, Tile::blank());
            self.grid.fit(self.tiles.len());
        }
        self.sync_selection();
        let added = self.tiles.len() - before;
        self.emit(
            "tile_added",
            json!({ "added": added, "len": self.tiles.len(), "columns": self.grid.columns() }),
            input,
        );
        vec![Action::RenderNeeded]
    }

    fn after_grid_change(&mut self, event: &str) -> Vec<Action> {
        self.sync_selection();
        let details = json!({
            "rows": self.grid.rows(),
            "columns": self.grid.columns(),
            "len": self.tiles.len(),
        });
        self.emit(event, details, InputMethod::Host);
        let mut actions = vec![Action::RenderNeeded];
        if self.tiles.is_empty() {
            actions.push(Action::FocusAddControl);
        }
        actions
    }

    fn toggle_stitch_from(&mut self, input: InputMethod) -> Vec<Action> {
        if self.is_stitched() {
            return self.unstitch_from(input);
        }
        match self.stitch_from(input) {
            Ok(actions) => actions,
            Err(e) => {
                debug!(error = %e, "stitch refused");
                self.emit("stitch_refused", json!({ "error": e.to_string() }), input);
                Vec::new()
            }
        }
    }

    fn stitch_from(&mut self, input: InputMethod) -> Result<Vec<Action>, StitchError> {
        if self.is_stitched() {
            return Ok(Vec::new());
        }
        if self.tiles.len() < self.config.min_stitch_tiles {
            return Err(StitchError::TooFewTiles { required: self.config.min_stitch_tiles, found: self.tiles.len() });
        }
        let composite = stitch(&self.tiles, self.stitch_policy())?;
        let canvas = composite.canvas();
        info!(tiles = composite.len(), width = canvas.width, height = canvas.height, "stitched");
        self.composite = Some(composite);
        self.epoch = self.epoch.wrapping_add(1);
        self.sync_selection();
        self.emit("stitched", json!({ "tiles": self.len(), "width": canvas.width, "height": canvas.height }), input);
        Ok(vec![Action::StitchChanged { stitched: true }, Action::RenderNeeded])
    }

    fn unstitch_from(&mut self, input: InputMethod) -> Vec<Action> {
        let Some(mut composite) = self.composite.take() else {
            return Vec::new();
        };
        self.interaction.cancel(&mut composite);
        let retain = self.config.retain_stitched_edits;
        if !retain {
            self.ingestor.invalidate_pending();
        }
        self.tiles.replace_all(unstitch(&composite, retain));
        self.grid.fit(self.tiles.len());
        self.epoch = self.epoch.wrapping_add(1);
        self.sync_selection();
        info!(tiles = self.tiles.len(), retain, "unstitched");
        self.emit("unstitched", json!({ "tiles": self.tiles.len(), "retained_edits": retain }), input);
        let mut actions = vec![Action::StitchChanged { stitched: false }, Action::RenderNeeded];
        if self.tiles.is_empty() {
            actions.push(Action::FocusAddControl);
        }
        actions
    }

    fn stitch_policy(&self) -> StitchPolicy {
        match self.config.stitch_mode {
            StitchMode::Row => StitchPolicy::Row { columns: self.grid.columns() },
            StitchMode::Linear => StitchPolicy::Linear {
                fit: self
                    .config
                    .scale_to_fit
                    .then_some(ScaleToFit { viewport: self.viewport, fit_fraction: self.config.fit_fraction }),
            },
        }
    }

    fn sync_selection(&mut self) {
        self.selection.observe(self.revision());
    }

    fn emit(&mut self, event: &str, details: serde_json::Value, input: InputMethod) {
        self.sink.record(event, &details, input);
    }
}
