use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use crate::color::Rgb;

/// Anything tile images can be drawn onto, addressed in buffer pixels.
///
/// Positions may be negative or run past the edge; implementations clip.
pub trait RenderSurface {
    fn set_size(&mut self, width: u32, height: u32);
    fn size(&self) -> [u32; 2];
    fn blit(&mut self, image: &RenderBuffer, x: i64, y: i64);
    fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgb);
}

/// An RGBA pixel buffer. Used both for decoded tile images and as the
/// in-memory rendering surface.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBuffer {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major order.
    pub pixels: Vec<u8>,
}

impl RenderBuffer {
    /// Create a new buffer filled with black (opaque).
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgb::BLACK)
    }

    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: color.to_rgba().repeat(width as usize * height as usize),
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb) {
        let i = self.index(x, y);
        self.pixels[i..i + 4].copy_from_slice(&color.to_rgba());
    }

    /// Intersect `[x, x+w) × [y, y+h)` with the buffer. Returns the clipped
    /// destination origin, the offset into the source, and the clipped size.
    fn clip(&self, x: i64, y: i64, w: u32, h: u32) -> Option<([usize; 2], [usize; 2], [usize; 2])> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w as i64).min(self.width as i64);
        let y1 = (y + h as i64).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((
            [x0 as usize, y0 as usize],
            [(x0 - x) as usize, (y0 - y) as usize],
            [(x1 - x0) as usize, (y1 - y0) as usize],
        ))
    }

    /// Write the buffer as an 8-bit RGBA PNG.
    pub fn save_png(&self, path: &Path) -> crate::Result<()> {
        let file = std::fs::File::create(path)?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.add_text_chunk("Software".to_string(), "placegrid".to_string())?;
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.pixels)?;
        debug!("Saved {}x{} snapshot to {}", self.width, self.height, path.display());
        Ok(())
    }
}

impl RenderSurface for RenderBuffer {
    fn set_size(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            *self = RenderBuffer::new(width, height);
        }
    }

    fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    fn blit(&mut self, image: &RenderBuffer, x: i64, y: i64) {
        let Some((dst, src, size)) = self.clip(x, y, image.width, image.height) else {
            return;
        };
        let stride = self.width as usize * 4;
        let src_stride = image.width as usize * 4;
        let row_bytes = size[0] * 4;
        for row in 0..size[1] {
            let s = (src[1] + row) * src_stride + src[0] * 4;
            let d = (dst[1] + row) * stride + dst[0] * 4;
            self.pixels[d..d + row_bytes].copy_from_slice(&image.pixels[s..s + row_bytes]);
        }
    }

    fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgb) {
        let Some((dst, _, size)) = self.clip(x, y, width, height) else {
            return;
        };
        let stride = self.width as usize * 4;
        let rgba = color.to_rgba();
        for row in 0..size[1] {
            let d = (dst[1] + row) * stride + dst[0] * 4;
            for px in self.pixels[d..d + size[0] * 4].chunks_exact_mut(4) {
                px.copy_from_slice(&rgba);
            }
        }
    }
}
