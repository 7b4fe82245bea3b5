pub mod codec;
pub mod error;
pub mod geometry;
pub mod transform;
pub mod viewport;

// Re-export primary types for convenience.
pub use codec::{BitsPerPixel, ColorId};
pub use error::CoreError;
pub use geometry::{FrameRect, PixelPos, PixelRect, Vec2};
pub use transform::CoordinateTransform;
pub use viewport::{
    ListenerId, ViewportConfig, ViewportController, ViewportSnapshot, ViewportState,
    ViewportUpdate,
};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
