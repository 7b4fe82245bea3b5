use placegrid_core::{CoordinateTransform, PixelPos};
use tracing::debug;

use crate::buffer::RenderSurface;
use crate::color::Rgb;
use crate::tile::{DecodeStatus, Tile, TileId};
use crate::tile_set::TileSet;
use crate::transport::TileDataSource;

/// What a drawing pass did with each tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawReport {
    /// Tiles with a decoded image, drawn now.
    pub blitted: usize,
    /// Tiles whose fetch was issued by this pass.
    pub requested: usize,
    /// Tiles still waiting on an earlier fetch.
    pub pending: usize,
}

/// Blit one tile if it has an image. Returns whether anything was drawn.
pub fn draw_tile<S>(tile: &Tile, transform: &CoordinateTransform, surface: &mut S) -> bool
where
    S: RenderSurface + ?Sized,
{
    let Some(image) = tile.image() else {
        return false;
    };
    let at = transform.global_to_buffer_pixel(tile.top_left());
    surface.blit(image, at.x, at.y);
    true
}

/// Draw the given tiles, starting fetches for any that are not decoded yet.
/// Those get drawn later via [`draw_tile`] once their bytes arrive.
pub fn draw_tiles<I, S, D>(
    tiles: &mut TileSet,
    ids: I,
    transform: &CoordinateTransform,
    surface: &mut S,
    source: &mut D,
) -> DrawReport
where
    I: IntoIterator<Item = TileId>,
    S: RenderSurface + ?Sized,
    D: TileDataSource + ?Sized,
{
    let mut report = DrawReport::default();
    for id in ids {
        let Some(tile) = tiles.get_mut(id) else {
            continue;
        };
        let at = transform.global_to_buffer_pixel(tile.top_left());
        match tile.decode_if_absent(source) {
            DecodeStatus::Ready(image) => {
                surface.blit(image, at.x, at.y);
                report.blitted += 1;
            }
            DecodeStatus::Requested => report.requested += 1,
            DecodeStatus::Pending => report.pending += 1,
        }
    }
    report
}

/// Paint a single global pixel without touching the rest of the surface.
pub fn paint_pixel<S>(surface: &mut S, transform: &CoordinateTransform, pixel: PixelPos, color: Rgb)
where
    S: RenderSurface + ?Sized,
{
    let at = transform.global_to_buffer_pixel(pixel);
    surface.fill_rect(at.x, at.y, 1, 1, color);
}

/// Full redraw: resize the surface, clear it to `background`, and draw every
/// tile in `ids`.
pub fn redraw<I, S, D>(
    tiles: &mut TileSet,
    ids: I,
    transform: &CoordinateTransform,
    buffer_size: [u32; 2],
    background: Rgb,
    surface: &mut S,
    source: &mut D,
) -> DrawReport
where
    I: IntoIterator<Item = TileId>,
    S: RenderSurface + ?Sized,
    D: TileDataSource + ?Sized,
{
    surface.set_size(buffer_size[0], buffer_size[1]);
    surface.fill_rect(0, 0, buffer_size[0], buffer_size[1], background);
    let report = draw_tiles(tiles, ids, transform, surface, source);
    debug!(
        "Redraw: {} drawn, {} requested, {} pending",
        report.blitted, report.requested, report.pending
    );
    report
}

#[cfg(test)]
mod tests {
    use placegrid_core::{BitsPerPixel, Vec2};

    use super::*;
    use crate::buffer::RenderBuffer;
    use crate::color::{ColorChoice, ColorPalette};
    use crate::tile_set::TileManifest;
    use crate::transport::{FetchRequest, FetchResponse};

    #[derive(Default)]
    struct RecordingSource {
        requests: Vec<FetchRequest>,
    }

    impl TileDataSource for RecordingSource {
        fn request(&mut self, request: FetchRequest) {
            self.requests.push(request);
        }
    }

    fn palette() -> ColorPalette {
        ColorPalette::new(vec![
            ColorChoice {
                id: 0,
                rgb: Rgb::WHITE,
                order: 0,
            },
            ColorChoice {
                id: 1,
                rgb: Rgb::BLACK,
                order: 1,
            },
        ])
        .unwrap()
    }

    fn transform(content_offset: PixelPos) -> CoordinateTransform {
        CoordinateTransform {
            buffer_origin: Vec2::ZERO,
            screen_px_per_buffer_px: 1.0,
            content_offset,
        }
    }

    #[test]
    fn first_pass_requests_second_pass_draws() {
        let mut tiles = TileSet::from_manifest(&TileManifest::grid(
            PixelPos::ORIGIN,
            2,
            2,
            1,
            2,
            BitsPerPixel::new(1).unwrap(),
        ))
        .unwrap();
        let mut source = RecordingSource::default();
        let mut surface = RenderBuffer::new(1, 1);
        let bg = Rgb::new(60, 60, 60);
        let t = transform(PixelPos::new(1, 0));

        let report = redraw(&mut tiles, [0, 1], &t, [6, 2], bg, &mut surface, &mut source);
        assert_eq!(
            report,
            DrawReport {
                blitted: 0,
                requested: 2,
                pending: 0
            }
        );
        assert_eq!(surface.size(), [6, 2]);
        assert_eq!(surface.pixel(0, 0), bg.to_rgba());

        // Tile 1 is all black (every bit set).
        let req = source.requests[1];
        tiles
            .complete_fetch(
                FetchResponse {
                    tile_id: req.tile_id,
                    generation: req.generation,
                    result: Ok(vec![0xF0]),
                },
                &palette(),
            )
            .unwrap();
        assert!(draw_tile(tiles.get(1).unwrap(), &t, &mut surface));
        assert!(!draw_tile(tiles.get(0).unwrap(), &t, &mut surface));
        // Global x 2..4 lands on buffer x 3..5.
        assert_eq!(surface.pixel(2, 0), bg.to_rgba());
        assert_eq!(surface.pixel(3, 1), [0, 0, 0, 255]);
        assert_eq!(surface.pixel(4, 0), [0, 0, 0, 255]);
        assert_eq!(surface.pixel(5, 0), bg.to_rgba());

        let report = draw_tiles(&mut tiles, [0, 1], &t, &mut surface, &mut source);
        assert_eq!(
            report,
            DrawReport {
                blitted: 1,
                requested: 0,
                pending: 1
            }
        );
    }

    #[test]
    fn paint_pixel_uses_content_offset() {
        let mut surface = RenderBuffer::new(4, 4);
        paint_pixel(&mut surface, &transform(PixelPos::new(2, 1)), PixelPos::new(-1, 1), Rgb::WHITE);
        assert_eq!(surface.pixel(1, 2), [255, 255, 255, 255]);
        assert_eq!(surface.pixels.chunks_exact(4).filter(|p| p[0] == 255).count(), 1);
    }
}
