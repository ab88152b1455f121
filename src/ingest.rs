//! Image ingestion: raw bytes from the clipboard or a file become tile content.
//!
//! Decoding belongs to the host. The ingestor only picks the usable bytes out
//! of a [`ByteSource`], issues a [`DecodeRequest`] with a fresh ticket, and
//! later turns the host's `(width, height)` answer into a [`DecodedImage`]
//! ready to be applied to whichever tile the request targeted.
//!
//! Requests are keyed by tile id rather than index, so a completion still
//! lands on the right tile after reordering, and is dropped if the tile is
//! gone. Requests for the same tile are never merged: each successful
//! completion overwrites the tile, so the last one to complete wins.
//!
//! Each ticket is also stamped with the ingestor's generation. When the view
//! a request was aimed at is thrown away, the owner calls
//! [`ImageIngestor::invalidate_pending`] and later completions are reported as
//! [`IngestError::Stale`] instead of being applied.

#[cfg(test)]
#[path = "ingest_test.rs"]
mod ingest_test;

use std::collections::HashMap;
use std::io::Cursor;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geom::Size;
use crate::tile::{DisplayPolicy, SourceId, Tile, TileId};

// =============================================================================
// ERRORS
// =============================================================================

/// Failure reported by an image decoder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

/// Errors produced while ingesting an image. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// The image bytes could not be decoded.
    #[error("image decode failed: {0}")]
    DecodeFailure(String),
    /// The clipboard held nothing at all.
    #[error("clipboard is empty")]
    EmptyClipboard,
    /// The clipboard held items, but none of them were images.
    #[error("clipboard has no image item")]
    NoImageItem,
    /// No byte source was supplied.
    #[error("no image source supplied")]
    NoSource,
    /// A completion arrived for a ticket that was never issued or already finished.
    #[error("unknown decode ticket {0}")]
    UnknownTicket(u64),
    /// A completion arrived for a request issued against a view that was since discarded.
    #[error("decode ticket {0} targets a discarded view")]
    Stale(u64),
}

impl IngestError {
    /// Errors that are expected during normal use and need no log line.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::EmptyClipboard | Self::NoImageItem | Self::NoSource)
    }
}

// =============================================================================
// BYTE SOURCES
// =============================================================================

/// One entry read from the system clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    /// MIME type reported by the clipboard (e.g. `image/png`).
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Where a single image blob came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobOrigin {
    /// Chosen in a file picker.
    FilePicker { name: String },
    /// Dropped onto the page.
    Drop { name: String },
    /// Taken from the clipboard.
    Clipboard,
}

/// A single image blob plus its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    pub origin: BlobOrigin,
}

/// Raw input handed to the ingestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteSource {
    Clipboard(Vec<ClipboardItem>),
    File(ImageBlob),
    None,
}

// =============================================================================
// DECODING
// =============================================================================

/// Synchronous decoder for hosts that decode in-process.
pub trait ImageDecoder {
    /// Return the pixel dimensions of the encoded image.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the bytes are not a readable image.
    fn decode(&self, bytes: &[u8]) -> Result<Size, DecodeError>;
}

/// Reads dimensions from the image header using the `image` crate.
///
/// Only the header is parsed; pixel data is never decoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeDecoder;

impl ImageDecoder for ProbeDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Size, DecodeError> {
        let reader = image::io::Reader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DecodeError(e.to_string()))?;
        let (w, h) = reader.into_dimensions().map_err(|e| DecodeError(e.to_string()))?;
        Ok(Size::new(f64::from(w), f64::from(h)))
    }
}

/// Handle correlating a decode request with its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DecodeTicket(pub u64);

/// Work handed to the host: decode `bytes` and report back with `ticket`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeRequest {
    pub ticket: DecodeTicket,
    /// Tile the result is destined for.
    pub tile: TileId,
    /// Content reference the tile will carry once decoded.
    pub source: SourceId,
    pub bytes: Vec<u8>,
}

/// A validated decode result, ready to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub tile: TileId,
    pub source: SourceId,
    pub intrinsic: Size,
}

#[derive(Debug, Clone)]
struct Pending {
    tile: TileId,
    source: SourceId,
    generation: u64,
}

// =============================================================================
// INGESTOR
// =============================================================================

/// Turns byte sources into decode requests and decode results into tile content.
#[derive(Debug, Default)]
pub struct ImageIngestor {
    policy: DisplayPolicy,
    next_ticket: u64,
    generation: u64,
    pending: HashMap<DecodeTicket, Pending>,
}

impl ImageIngestor {
    #[must_use]
    pub fn new(policy: DisplayPolicy) -> Self {
        Self { policy, next_ticket: 0, generation: 0, pending: HashMap::new() }
    }

    #[must_use]
    pub fn policy(&self) -> DisplayPolicy {
        self.policy
    }

    /// Number of decodes issued but not yet completed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Mark every request in flight as stale. Their completions will be refused.
    pub fn invalidate_pending(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Start ingesting `source` into the tile with id `tile`.
    ///
    /// # Errors
    ///
    /// [`IngestError::EmptyClipboard`], [`IngestError::NoImageItem`] or
    /// [`IngestError::NoSource`] when there is nothing to decode.
    pub fn begin(&mut self, tile: TileId, source: ByteSource) -> Result<DecodeRequest, IngestError> {
        let bytes = match source {
            ByteSource::None => return Err(IngestError::NoSource),
            ByteSource::File(blob) => blob.bytes,
            ByteSource::Clipboard(items) => {
                if items.is_empty() {
                    return Err(IngestError::EmptyClipboard);
                }
                items
                    .into_iter()
                    .find(|item| item.mime.contains("image"))
                    .map(|item| item.bytes)
                    .ok_or(IngestError::NoImageItem)?
            }
        };

        let ticket = DecodeTicket(self.next_ticket);
        self.next_ticket += 1;
        let source = SourceId(format!("blob:{}", Uuid::new_v4()));
        self.pending.insert(ticket, Pending { tile, source: source.clone(), generation: self.generation });
        Ok(DecodeRequest { ticket, tile, source, bytes })
    }

    /// Accept the host's answer for `ticket`.
    ///
    /// # Errors
    ///
    /// [`IngestError::UnknownTicket`] for a ticket not in flight,
    /// [`IngestError::Stale`] for one issued before the last
    /// [`ImageIngestor::invalidate_pending`], and [`IngestError::DecodeFailure`]
    /// when decoding failed or produced an image with no area.
    pub fn finish(&mut self, ticket: DecodeTicket, result: Result<Size, DecodeError>) -> Result<DecodedImage, IngestError> {
        let Some(pending) = self.pending.remove(&ticket) else {
            return Err(IngestError::UnknownTicket(ticket.0));
        };
        if pending.generation != self.generation {
            return Err(IngestError::Stale(ticket.0));
        }
        let intrinsic = result.map_err(|e| IngestError::DecodeFailure(e.0))?;
        if intrinsic.is_empty() {
            return Err(IngestError::DecodeFailure(format!(
                "image has no area ({}x{})",
                intrinsic.width, intrinsic.height
            )));
        }
        Ok(DecodedImage { tile: pending.tile, source: pending.source, intrinsic })
    }

    /// Decode `request` in-process with `decoder` and finish it.
    ///
    /// # Errors
    ///
    /// Same as [`ImageIngestor::finish`].
    pub fn decode_with(&mut self, decoder: &dyn ImageDecoder, request: &DecodeRequest) -> Result<DecodedImage, IngestError> {
        let result = decoder.decode(&request.bytes);
        self.finish(request.ticket, result)
    }

    /// Write a decoded image into `tile` using the configured display policy.
    pub fn apply(&self, image: &DecodedImage, tile: &mut Tile) {
        tile.set_image(image.source.clone(), image.intrinsic, self.policy);
    }

    /// Give `tile` a generated placeholder image of the given size, no decode needed.
    pub fn placeholder(&self, tile: &mut Tile, width: u32, height: u32) {
        let intrinsic = Size::new(f64::from(width.max(1)), f64::from(height.max(1)));
        let source = SourceId(format!("placeholder:{}x{}", width.max(1), height.max(1)));
        tile.set_image(source, intrinsic, self.policy);
    }
}

/// Reset a tile to blank. Callers holding a placed tile keep its position.
pub fn keep_blank(tile: &mut Tile) {
    tile.clear();
}
