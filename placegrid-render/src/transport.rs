//! Interfaces to the outside world: the live channel and the tile byte store.

use placegrid_core::ColorId;

use crate::tile::TileId;

/// A single pixel change, outbound or inbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelUpdate {
    pub tile_id: TileId,
    /// Row-major index within the tile.
    pub pixel_index: usize,
    pub color_id: ColorId,
    /// Server time in milliseconds; absent on locally originated updates.
    pub timestamp: Option<u64>,
}

/// The live channel. Calls are fire-and-forget; inbound pixel events are
/// delivered separately by whoever owns the connection.
pub trait Transport {
    fn subscribe(&mut self, tile_ids: &[TileId]);
    fn unsubscribe(&mut self, tile_ids: &[TileId]);
    fn send_pixel_update(&mut self, update: PixelUpdate);
}

/// Ask for one tile's packed bitstream. `generation` is echoed back so a
/// completion for an invalidated tile can be recognized and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub tile_id: TileId,
    pub generation: u64,
}

/// Completion of a [`FetchRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub tile_id: TileId,
    pub generation: u64,
    pub result: Result<Vec<u8>, String>,
}

/// Where tile bytes come from. Requests complete asynchronously; the
/// response is handed back to [`Tile::complete_fetch`](crate::Tile::complete_fetch)
/// on the event-loop thread.
pub trait TileDataSource {
    fn request(&mut self, request: FetchRequest);
}
