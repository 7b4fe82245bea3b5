use thiserror::Error;

/// Errors originating from the coordinate and viewport engine.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid bits per pixel: {0} (must be 1..=32)")]
    InvalidBitsPerPixel(u8),

    #[error("invalid scale range: [{min}, {max}]")]
    InvalidScaleRange { min: f64, max: f64 },

    #[error("invalid viewport: {reason}")]
    InvalidViewport { reason: String },
}
