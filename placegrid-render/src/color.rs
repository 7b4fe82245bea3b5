use std::collections::HashSet;
use std::fmt;

use placegrid_core::ColorId;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::RenderError;

/// Color substituted for ids the resolver does not know.
pub const FALLBACK_COLOR_ID: ColorId = 0;

/// An opaque 8-bit RGB color. Serializes as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

/// Formats as a canvas fill style, e.g. `rgb(60 60 60)`.
impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({} {} {})", self.r, self.g, self.b)
    }
}

/// Maps stored color ids to displayable colors.
pub trait ColorResolver {
    fn id_to_rgb(&self, id: ColorId) -> Option<Rgb>;

    /// Resolve `id`, falling back to [`FALLBACK_COLOR_ID`] (or black if that
    /// is unknown too). The flag reports whether the fallback was used.
    fn resolve_or_fallback(&self, id: ColorId) -> (Rgb, bool) {
        match self.id_to_rgb(id) {
            Some(rgb) => (rgb, false),
            None => (
                self.id_to_rgb(FALLBACK_COLOR_ID).unwrap_or(Rgb::BLACK),
                true,
            ),
        }
    }

    /// Canvas fill style for a color, e.g. `rgb(60 60 60)`.
    fn fill_style(&self, rgb: Rgb) -> String {
        rgb.to_string()
    }
}

/// One selectable color as served by the color endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorChoice {
    pub id: ColorId,
    pub rgb: Rgb,
    /// Position in the picker, independent of `id`.
    pub order: u32,
}

/// The session's color choices plus the currently selected one.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    /// Sorted by id for lookup.
    choices: Vec<ColorChoice>,
    current: usize,
}

impl ColorPalette {
    pub fn new(mut choices: Vec<ColorChoice>) -> crate::Result<Self> {
        if choices.is_empty() {
            return Err(RenderError::EmptyPalette);
        }
        let mut seen = HashSet::with_capacity(choices.len());
        for c in &choices {
            if !seen.insert(c.id) {
                return Err(RenderError::DuplicateColorId(c.id));
            }
        }
        choices.sort_by_key(|c| c.id);
        Ok(Self {
            choices,
            current: 0,
        })
    }

    /// Parse the JSON list served by the color endpoint.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Self::new(serde_json::from_str(json)?)
    }

    /// Choices sorted by id.
    pub fn choices(&self) -> &[ColorChoice] {
        &self.choices
    }

    /// Choices in picker layout order.
    pub fn by_order(&self) -> Vec<ColorChoice> {
        let mut out = self.choices.clone();
        out.sort_by_key(|c| (c.order, c.id));
        out
    }

    pub fn current(&self) -> ColorChoice {
        self.choices[self.current]
    }

    /// Make `id` the active choice. Unknown ids leave the selection as is.
    pub fn select(&mut self, id: ColorId) -> bool {
        match self.choices.binary_search_by_key(&id, |c| c.id) {
            Ok(idx) => {
                self.current = idx;
                true
            }
            Err(_) => {
                warn!("No color choice with id {id}; keeping {}", self.current().id);
                false
            }
        }
    }

    pub fn rgb_to_id(&self, rgb: Rgb) -> Option<ColorId> {
        self.choices.iter().find(|c| c.rgb == rgb).map(|c| c.id)
    }
}

impl ColorResolver for ColorPalette {
    fn id_to_rgb(&self, id: ColorId) -> Option<Rgb> {
        self.choices
            .binary_search_by_key(&id, |c| c.id)
            .ok()
            .map(|idx| self.choices[idx].rgb)
    }
}
