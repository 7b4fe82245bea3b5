pub mod animation;
pub mod canvas;
pub mod config;
pub mod error;
pub mod fetch_worker;
pub mod gesture;
pub mod protocol;

pub use animation::{AnimationScheduler, AnimationStatus};
pub use canvas::PlaceCanvas;
pub use config::{AnimationConfig, AppConfig, GestureConfig, SubscriptionConfig};
pub use error::AppError;
pub use fetch_worker::{spawn_fetch_worker, FetchWorker, WorkerDataSource};
pub use gesture::{GestureAction, GestureController, GestureState, InputEvent, NavKey, Touch};
pub use protocol::{JsonTransport, SetPixelData, WireEvent};

/// Convenience result type for the app crate.
pub type Result<T> = std::result::Result<T, AppError>;
