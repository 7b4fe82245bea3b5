pub mod buffer;
pub mod color;
pub mod error;
pub mod renderer;
pub mod subscription;
pub mod tile;
pub mod tile_set;
pub mod transport;

pub use buffer::{RenderBuffer, RenderSurface};
pub use color::{ColorChoice, ColorPalette, ColorResolver, Rgb, FALLBACK_COLOR_ID};
pub use error::RenderError;
pub use renderer::{draw_tile, draw_tiles, paint_pixel, redraw, DrawReport};
pub use subscription::{ReconcileReport, SubscriptionManager};
pub use tile::{DecodeStatus, FetchOutcome, PatchOutcome, Tile, TileId};
pub use tile_set::{TileManifest, TileSet, TileSpec};
pub use transport::{FetchRequest, FetchResponse, PixelUpdate, TileDataSource, Transport};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
