use std::collections::{BTreeMap, BTreeSet, HashSet};

use placegrid_core::{BitsPerPixel, PixelPos, PixelRect};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::color::ColorResolver;
use crate::error::RenderError;
use crate::tile::{FetchOutcome, PatchOutcome, Tile, TileId};
use crate::transport::{FetchResponse, PixelUpdate};

/// One manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSpec {
    pub id: TileId,
    pub top_left: PixelPos,
    /// Exclusive.
    pub bot_right: PixelPos,
}

impl TileSpec {
    pub fn rect(&self) -> PixelRect {
        PixelRect::new(self.top_left, self.bot_right)
    }
}

/// The tile layout, fetched once per session.
///
/// Wire form: `{"sections": [{"id", "topLeft", "botRight"}, ...], "bitsPerPixel": n}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileManifest {
    pub sections: Vec<TileSpec>,
    pub bits_per_pixel: BitsPerPixel,
}

impl TileManifest {
    /// A `rows × cols` grid of equal tiles starting at `origin`, ids assigned
    /// row-major.
    pub fn grid(
        origin: PixelPos,
        tile_width: u32,
        tile_height: u32,
        rows: u32,
        cols: u32,
        bits_per_pixel: BitsPerPixel,
    ) -> Self {
        let mut sections = Vec::with_capacity(rows as usize * cols as usize);
        for row in 0..rows {
            for col in 0..cols {
                let top_left = origin.offset(
                    col as i64 * tile_width as i64,
                    row as i64 * tile_height as i64,
                );
                sections.push(TileSpec {
                    id: row * cols + col,
                    top_left,
                    bot_right: top_left.offset(tile_width as i64, tile_height as i64),
                });
            }
        }
        Self {
            sections,
            bits_per_pixel,
        }
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Bounding box of every tile.
    pub fn bounds(&self) -> Option<PixelRect> {
        self.sections
            .iter()
            .map(TileSpec::rect)
            .reduce(|acc, r| acc.union(&r))
    }

    /// Check that the tiles are non-empty, uniquely numbered, pairwise
    /// disjoint and together fill the box from the origin to the furthest
    /// corner. Returns the box.
    pub fn validate(&self) -> crate::Result<PixelRect> {
        let Some(bounds) = self.bounds() else {
            return Err(RenderError::EmptyManifest);
        };

        let mut ids = HashSet::with_capacity(self.sections.len());
        for spec in &self.sections {
            if spec.rect().is_empty() {
                return Err(RenderError::InvalidTileGeometry { id: spec.id });
            }
            if !ids.insert(spec.id) {
                return Err(RenderError::DuplicateTileId(spec.id));
            }
        }
        if bounds.top_left != PixelPos::ORIGIN {
            return Err(RenderError::ManifestOffOrigin {
                x: bounds.top_left.x,
                y: bounds.top_left.y,
            });
        }

        // Sweep along x so only horizontally overlapping pairs are compared.
        let mut by_left: Vec<&TileSpec> = self.sections.iter().collect();
        by_left.sort_by_key(|s| s.top_left.x);
        for (i, a) in by_left.iter().enumerate() {
            for b in &by_left[i + 1..] {
                if b.top_left.x >= a.bot_right.x {
                    break;
                }
                if a.rect().intersects(&b.rect()) {
                    return Err(RenderError::OverlappingTiles { a: a.id, b: b.id });
                }
            }
        }

        // Disjoint tiles fill the box exactly when their areas add up to it.
        let covered: u64 = self.sections.iter().map(|s| s.rect().area()).sum();
        if covered != bounds.area() {
            return Err(RenderError::CoverageGap {
                covered,
                expected: bounds.area(),
            });
        }
        Ok(bounds)
    }
}

/// Every tile of the session, keyed by id.
#[derive(Debug, Clone)]
pub struct TileSet {
    tiles: BTreeMap<TileId, Tile>,
    bounds: PixelRect,
    bits_per_pixel: BitsPerPixel,
}

impl TileSet {
    pub fn from_manifest(manifest: &TileManifest) -> crate::Result<Self> {
        let bounds = manifest.validate()?;
        let tiles = manifest
            .sections
            .iter()
            .map(|s| (s.id, Tile::new(s.id, s.rect(), manifest.bits_per_pixel)))
            .collect();
        info!(
            "Loaded {} tiles covering {}x{} pixels at {} bits per pixel",
            manifest.sections.len(),
            bounds.width(),
            bounds.height(),
            manifest.bits_per_pixel.get()
        );
        Ok(Self {
            tiles,
            bounds,
            bits_per_pixel: manifest.bits_per_pixel,
        })
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Union of all tile rectangles.
    pub fn bounds(&self) -> PixelRect {
        self.bounds
    }

    pub fn bits_per_pixel(&self) -> BitsPerPixel {
        self.bits_per_pixel
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    pub fn get_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = TileId> + '_ {
        self.tiles.keys().copied()
    }

    /// Ids of the tiles touching `rect`.
    pub fn intersecting(&self, rect: &PixelRect) -> BTreeSet<TileId> {
        self.tiles
            .values()
            .filter(|t| t.rect().intersects(rect))
            .map(Tile::id)
            .collect()
    }

    pub fn tile_at(&self, p: PixelPos) -> Option<&Tile> {
        self.tiles.values().find(|t| t.rect().contains(p))
    }

    /// The tile holding a global pixel and the pixel's index within it.
    pub fn locate(&self, p: PixelPos) -> Option<(TileId, usize)> {
        let tile = self.tile_at(p)?;
        Some((tile.id(), tile.global_to_local(p)?))
    }

    /// Route a fetch completion to its tile.
    pub fn complete_fetch<R>(
        &mut self,
        response: FetchResponse,
        resolver: &R,
    ) -> crate::Result<FetchOutcome>
    where
        R: ColorResolver + Sync + ?Sized,
    {
        let tile = self
            .tiles
            .get_mut(&response.tile_id)
            .ok_or(RenderError::UnknownTile(response.tile_id))?;
        tile.complete_fetch(response, resolver)
    }

    /// Apply a pixel update from outside, checking it against the tile first.
    pub fn apply_patch<R>(&mut self, update: &PixelUpdate, resolver: &R) -> crate::Result<PatchOutcome>
    where
        R: ColorResolver + ?Sized,
    {
        let tile = self
            .tiles
            .get_mut(&update.tile_id)
            .ok_or(RenderError::UnknownTile(update.tile_id))?;
        if update.pixel_index >= tile.pixel_count() {
            return Err(RenderError::InvalidPixelUpdate {
                tile_id: update.tile_id,
                reason: format!(
                    "pixel index {} outside {} pixels",
                    update.pixel_index,
                    tile.pixel_count()
                ),
            });
        }
        if update.color_id > tile.bits_per_pixel().max_color_id() {
            return Err(RenderError::InvalidPixelUpdate {
                tile_id: update.tile_id,
                reason: format!(
                    "color id {} does not fit in {} bits",
                    update.color_id,
                    tile.bits_per_pixel().get()
                ),
            });
        }
        Ok(tile.set_pixel(update.pixel_index, update.color_id, resolver))
    }

    pub fn invalidate(&mut self, id: TileId) {
        if let Some(tile) = self.tiles.get_mut(&id) {
            tile.invalidate();
        }
    }
}
