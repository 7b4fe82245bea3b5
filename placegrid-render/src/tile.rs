use std::collections::VecDeque;

use placegrid_core::codec::{get_pixel_color_id, set_pixel_color_id};
use placegrid_core::{BitsPerPixel, ColorId, PixelPos, PixelRect};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::buffer::RenderBuffer;
use crate::color::{ColorResolver, Rgb};
use crate::error::RenderError;
use crate::transport::{FetchRequest, FetchResponse, TileDataSource};

/// Stable identifier of a tile, as listed in the manifest.
pub type TileId = u32;

/// Packed bitstream plus the image decoded from it. Always replaced as a
/// pair so the two never describe different states.
#[derive(Debug, Clone)]
struct TileContent {
    data: Vec<u8>,
    image: RenderBuffer,
}

/// Result of [`Tile::decode_if_absent`].
#[derive(Debug)]
pub enum DecodeStatus<'a> {
    /// The decoded image is available.
    Ready(&'a RenderBuffer),
    /// A fetch was just issued.
    Requested,
    /// A fetch for the current generation is already in flight.
    Pending,
}

/// Result of [`Tile::complete_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Decoded {
        /// Pixels whose color id had no palette entry.
        unresolved: usize,
        /// Live patches queued during the fetch and applied after decoding.
        patches_replayed: usize,
    },
    /// The tile was invalidated while the fetch was in flight.
    Discarded,
}

/// Result of [`Tile::set_pixel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Written to the bitstream and the decoded image, which now shows `Rgb`.
    Applied(Rgb),
    /// Held until the in-flight fetch completes.
    Queued,
    /// The tile has no content and nothing is being fetched.
    Dropped,
}

/// A fixed rectangle of the global grid and whatever is currently known
/// about its pixels.
///
/// Content exists only between a completed fetch and the next
/// [`invalidate`](Self::invalidate). Each invalidation bumps `generation`;
/// fetch completions carry the generation they were requested under and are
/// dropped if it no longer matches.
#[derive(Debug, Clone)]
pub struct Tile {
    id: TileId,
    rect: PixelRect,
    bits_per_pixel: BitsPerPixel,
    content: Option<TileContent>,
    generation: u64,
    /// Generation of the outstanding fetch, if any.
    in_flight: Option<u64>,
    pending_patches: VecDeque<(usize, ColorId)>,
}

impl Tile {
    /// `rect` must be non-empty; the manifest loader checks this.
    pub fn new(id: TileId, rect: PixelRect, bits_per_pixel: BitsPerPixel) -> Self {
        assert!(!rect.is_empty(), "tile {id} has an empty rectangle");
        Self {
            id,
            rect,
            bits_per_pixel,
            content: None,
            generation: 0,
            in_flight: None,
            pending_patches: VecDeque::new(),
        }
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    pub fn top_left(&self) -> PixelPos {
        self.rect.top_left
    }

    pub fn width(&self) -> u32 {
        self.rect.width() as u32
    }

    pub fn height(&self) -> u32 {
        self.rect.height() as u32
    }

    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn bits_per_pixel(&self) -> BitsPerPixel {
        self.bits_per_pixel
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_decoded(&self) -> bool {
        self.content.is_some()
    }

    /// Whether a fetch for the current generation is outstanding.
    pub fn is_fetching(&self) -> bool {
        self.in_flight == Some(self.generation)
    }

    pub fn image(&self) -> Option<&RenderBuffer> {
        self.content.as_ref().map(|c| &c.image)
    }

    pub fn data(&self) -> Option<&[u8]> {
        self.content.as_ref().map(|c| c.data.as_slice())
    }

    pub fn pending_patches(&self) -> usize {
        self.pending_patches.len()
    }

    // -- Coordinate helpers --

    /// Tile-local `(x, y)` of a row-major pixel index.
    pub fn local_xy(&self, index: usize) -> (u32, u32) {
        assert!(index < self.pixel_count(), "pixel index {index} outside tile {}", self.id);
        let w = self.width() as usize;
        ((index % w) as u32, (index / w) as u32)
    }

    pub fn local_index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width() && y < self.height(),
            "pixel ({x}, {y}) outside tile {}",
            self.id
        );
        y as usize * self.width() as usize + x as usize
    }

    pub fn local_to_global(&self, index: usize) -> PixelPos {
        let (x, y) = self.local_xy(index);
        self.rect.top_left.offset(x as i64, y as i64)
    }

    /// Local index of a global pixel, if the tile contains it.
    pub fn global_to_local(&self, p: PixelPos) -> Option<usize> {
        if !self.rect.contains(p) {
            return None;
        }
        let local = p - self.rect.top_left;
        Some(self.local_index(local.x as u32, local.y as u32))
    }

    pub fn color_id_at(&self, index: usize) -> Option<ColorId> {
        let (x, y) = self.local_xy(index);
        let content = self.content.as_ref()?;
        Some(get_pixel_color_id(
            &content.data,
            self.width(),
            self.bits_per_pixel,
            x,
            y,
        ))
    }

    // -- Lifecycle --

    /// Return the decoded image, or make sure exactly one fetch for the
    /// current generation is on its way.
    pub fn decode_if_absent<S>(&mut self, source: &mut S) -> DecodeStatus<'_>
    where
        S: TileDataSource + ?Sized,
    {
        if self.is_fetching() {
            return DecodeStatus::Pending;
        }
        match self.content {
            Some(ref content) => DecodeStatus::Ready(&content.image),
            None => {
                self.in_flight = Some(self.generation);
                source.request(FetchRequest {
                    tile_id: self.id,
                    generation: self.generation,
                });
                debug!("Requested tile {} (generation {})", self.id, self.generation);
                DecodeStatus::Requested
            }
        }
    }

    /// Accept the bytes for an earlier fetch.
    ///
    /// Stale completions are discarded. On failure the in-flight guard is
    /// released so the next redraw retries, and queued patches are dropped.
    pub fn complete_fetch<R>(
        &mut self,
        response: FetchResponse,
        resolver: &R,
    ) -> crate::Result<FetchOutcome>
    where
        R: ColorResolver + Sync + ?Sized,
    {
        if response.generation != self.generation || self.in_flight != Some(response.generation) {
            debug!(
                "Discarding fetch for tile {} (generation {}, current {})",
                self.id, response.generation, self.generation
            );
            return Ok(FetchOutcome::Discarded);
        }
        self.in_flight = None;

        let data = match response.result {
            Ok(data) => data,
            Err(reason) => {
                self.pending_patches.clear();
                return Err(RenderError::Fetch {
                    tile_id: self.id,
                    reason,
                });
            }
        };
        let expected = self.bits_per_pixel.packed_len(self.pixel_count());
        if data.len() < expected {
            self.pending_patches.clear();
            return Err(RenderError::DataLength {
                tile_id: self.id,
                expected,
                actual: data.len(),
            });
        }

        let (image, unresolved) = self.decode(&data, resolver);
        if unresolved > 0 {
            warn!(
                "Tile {}: {unresolved} pixels had unknown color ids, drawn with the fallback color",
                self.id
            );
        }
        self.content = Some(TileContent { data, image });

        let patches_replayed = self.pending_patches.len();
        while let Some((index, color_id)) = self.pending_patches.pop_front() {
            self.write_pixel(index, color_id, resolver);
        }
        debug!(
            "Decoded tile {} ({}x{}), replayed {patches_replayed} patches",
            self.id,
            self.width(),
            self.height()
        );
        Ok(FetchOutcome::Decoded {
            unresolved,
            patches_replayed,
        })
    }

    fn decode<R>(&self, data: &[u8], resolver: &R) -> (RenderBuffer, usize)
    where
        R: ColorResolver + Sync + ?Sized,
    {
        let (w, h) = (self.width(), self.height());
        let bpp = self.bits_per_pixel;
        let mut image = RenderBuffer::new(w, h);
        let unresolved = image
            .pixels
            .par_chunks_exact_mut(w as usize * 4)
            .enumerate()
            .map(|(y, row)| {
                let mut misses = 0;
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let id = get_pixel_color_id(data, w, bpp, x as u32, y as u32);
                    let (rgb, fallback) = resolver.resolve_or_fallback(id);
                    px.copy_from_slice(&rgb.to_rgba());
                    misses += fallback as usize;
                }
                misses
            })
            .sum::<usize>();
        (image, unresolved)
    }

    /// Apply a single-pixel change.
    ///
    /// With content present, the bitstream bits and the one decoded pixel are
    /// rewritten in place. While a fetch is in flight the change is queued and
    /// replayed in arrival order once the fetch completes.
    ///
    /// # Panics
    ///
    /// If `index` lies outside the tile or `color_id` does not fit the
    /// tile's bit depth.
    pub fn set_pixel<R>(&mut self, index: usize, color_id: ColorId, resolver: &R) -> PatchOutcome
    where
        R: ColorResolver + ?Sized,
    {
        assert!(index < self.pixel_count(), "pixel index {index} outside tile {}", self.id);
        if self.content.is_some() {
            PatchOutcome::Applied(self.write_pixel(index, color_id, resolver))
        } else if self.is_fetching() {
            self.pending_patches.push_back((index, color_id));
            PatchOutcome::Queued
        } else {
            PatchOutcome::Dropped
        }
    }

    fn write_pixel<R>(&mut self, index: usize, color_id: ColorId, resolver: &R) -> Rgb
    where
        R: ColorResolver + ?Sized,
    {
        let (x, y) = self.local_xy(index);
        let width = self.width();
        let (rgb, fallback) = resolver.resolve_or_fallback(color_id);
        if fallback {
            warn!("Tile {}: unknown color id {color_id} at index {index}", self.id);
        }
        if let Some(content) = self.content.as_mut() {
            set_pixel_color_id(&mut content.data, width, self.bits_per_pixel, x, y, color_id);
            content.image.set_pixel(x, y, rgb);
        }
        rgb
    }

    /// Forget content and any outstanding fetch. Geometry is kept.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.content = None;
        self.in_flight = None;
        self.pending_patches.clear();
    }
}
