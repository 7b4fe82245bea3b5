use std::fs;
use std::path::{Path, PathBuf};

use placegrid_core::ViewportConfig;
use placegrid_render::Rgb;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Zoom factor per wheel notch and per `+`/`-` key press.
    #[serde(default = "default_wheel_zoom_factor")]
    pub wheel_zoom_factor: f64,
    /// Center the pixel under a click that did not move.
    #[serde(default = "default_true")]
    pub click_to_center: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "default_zoom_duration_ms")]
    pub zoom_duration_ms: f64,
    #[serde(default = "default_center_duration_ms")]
    pub center_duration_ms: f64,
}

/// Hysteresis margin: `max(leave_buffer_min, ceil(extent * leave_buffer_fraction))`
/// buffer pixels per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    #[serde(default = "default_leave_buffer_min")]
    pub leave_buffer_min: u32,
    #[serde(default = "default_leave_buffer_fraction")]
    pub leave_buffer_fraction: f64,
}

impl SubscriptionConfig {
    pub fn leave_margin(&self, frame_width: f64, frame_height: f64) -> [i64; 2] {
        let axis = |extent: f64| {
            ((extent * self.leave_buffer_fraction).ceil() as i64).max(self.leave_buffer_min as i64)
        };
        [axis(frame_width), axis(frame_height)]
    }
}

fn default_wheel_zoom_factor() -> f64 {
    1.2
}
fn default_true() -> bool {
    true
}
fn default_zoom_duration_ms() -> f64 {
    300.0
}
fn default_center_duration_ms() -> f64 {
    150.0
}
fn default_leave_buffer_min() -> u32 {
    300
}
fn default_leave_buffer_fraction() -> f64 {
    0.1
}
fn default_background() -> Rgb {
    Rgb::new(60, 60, 60)
}
fn default_place_pixel_scale() -> f64 {
    0.8
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            wheel_zoom_factor: default_wheel_zoom_factor(),
            click_to_center: true,
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            zoom_duration_ms: default_zoom_duration_ms(),
            center_duration_ms: default_center_duration_ms(),
        }
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            leave_buffer_min: default_leave_buffer_min(),
            leave_buffer_fraction: default_leave_buffer_fraction(),
        }
    }
}

// ---------------------------------------------------------------------------
// Application config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub subscription: SubscriptionConfig,
    /// Fill for buffer areas no tile covers.
    #[serde(default = "default_background")]
    pub background: Rgb,
    /// Scale zoomed to when starting to place a pixel.
    #[serde(default = "default_place_pixel_scale")]
    pub place_pixel_scale: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            gesture: GestureConfig::default(),
            animation: AnimationConfig::default(),
            subscription: SubscriptionConfig::default(),
            background: default_background(),
            place_pixel_scale: default_place_pixel_scale(),
        }
    }
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(AppError::Config)
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(AppError::Config)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load from the OS config directory, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            debug!("No config directory, using defaults");
            return Self::default();
        };
        if !path.exists() {
            debug!("No config file at {}", path.display());
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                error!("Failed to load config from {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Persist to the OS config directory.
    pub fn save(&self) {
        let Some(path) = config_path() else {
            error!("Cannot save config: {}", AppError::NoConfigDir);
            return;
        };
        match self.save_to(&path) {
            Ok(()) => debug!("Saved config to {}", path.display()),
            Err(e) => error!("Failed to save config: {e}"),
        }
    }
}

fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "placegrid").map(|d| d.config_dir().join("config.json"))
}
