use thiserror::Error;

use placegrid_core::PixelPos;

/// Errors surfaced by the canvas engine and its configuration.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("no pixel can be placed at ({}, {}): {reason}", .pixel.x, .pixel.y)]
    PlacePixel { pixel: PixelPos, reason: String },

    #[error("malformed wire message: {0}")]
    Protocol(#[source] serde_json::Error),

    #[error("config: {0}")]
    Config(#[source] serde_json::Error),

    #[error("no configuration directory available on this platform")]
    NoConfigDir,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Render(#[from] placegrid_render::RenderError),

    #[error(transparent)]
    Core(#[from] placegrid_core::CoreError),
}
