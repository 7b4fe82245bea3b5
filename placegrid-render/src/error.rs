use thiserror::Error;

use crate::tile::TileId;

/// Errors originating from tile management and rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("tile manifest contains no tiles")]
    EmptyManifest,

    #[error("tile {id} has an empty or inverted rectangle")]
    InvalidTileGeometry { id: TileId },

    #[error("tile id {0} appears more than once in the manifest")]
    DuplicateTileId(TileId),

    #[error("tiles {a} and {b} overlap")]
    OverlappingTiles { a: TileId, b: TileId },

    #[error("tiles start at ({x}, {y}) instead of the origin")]
    ManifestOffOrigin { x: i64, y: i64 },

    #[error("tiles cover {covered} of {expected} pixels in their bounding box")]
    CoverageGap { covered: u64, expected: u64 },

    #[error("color palette contains no colors")]
    EmptyPalette,

    #[error("color id {0} appears more than once in the palette")]
    DuplicateColorId(u32),

    #[error("unknown tile id {0}")]
    UnknownTile(TileId),

    #[error("fetching tile {tile_id} failed: {reason}")]
    Fetch { tile_id: TileId, reason: String },

    #[error("tile {tile_id} payload has {actual} bytes, expected at least {expected}")]
    DataLength {
        tile_id: TileId,
        expected: usize,
        actual: usize,
    },

    #[error("invalid pixel update for tile {tile_id}: {reason}")]
    InvalidPixelUpdate { tile_id: TileId, reason: String },

    #[error("invalid manifest: {0}")]
    ManifestFormat(#[from] serde_json::Error),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] placegrid_core::CoreError),
}
