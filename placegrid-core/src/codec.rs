//! Dense N-bit color packing for tile bitstreams.
//!
//! Pixel `(x, y)` of a tile `width` pixels wide occupies the bits starting at
//! `(y * width + x) * bits_per_pixel`.  The field is read as an unsigned
//! big-endian integer, most-significant bit first within each byte, and may
//! straddle byte boundaries.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Identifier of a palette color as stored in the bitstream.
pub type ColorId = u32;

/// Session-wide color depth. Valid values are `1..=32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BitsPerPixel(u8);

impl BitsPerPixel {
    pub fn new(bits: u8) -> crate::Result<Self> {
        if bits == 0 || bits > 32 {
            return Err(CoreError::InvalidBitsPerPixel(bits));
        }
        Ok(Self(bits))
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Largest color id representable at this depth.
    #[inline]
    pub fn max_color_id(self) -> ColorId {
        (u64::MAX >> (64 - self.0 as u32)) as ColorId
    }

    /// Bytes needed to hold `pixel_count` packed pixels.
    #[inline]
    pub fn packed_len(self, pixel_count: usize) -> usize {
        (pixel_count * self.0 as usize).div_ceil(8)
    }
}

impl TryFrom<u8> for BitsPerPixel {
    type Error = CoreError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Self::new(bits)
    }
}

impl From<BitsPerPixel> for u8 {
    fn from(b: BitsPerPixel) -> Self {
        b.0
    }
}

#[inline]
fn low_mask(bits: usize) -> u32 {
    ((1u64 << bits) - 1) as u32
}

#[inline]
fn bit_offset(width: u32, bits_per_pixel: BitsPerPixel, x: u32, y: u32) -> usize {
    assert!(x < width, "pixel x={x} out of range for width {width}");
    (y as usize * width as usize + x as usize) * bits_per_pixel.get() as usize
}

/// Read the color id of pixel `(x, y)`.
///
/// # Panics
///
/// If `x >= width` or the pixel's bits lie beyond `data`.
pub fn get_pixel_color_id(
    data: &[u8],
    width: u32,
    bits_per_pixel: BitsPerPixel,
    x: u32,
    y: u32,
) -> ColorId {
    let mut bit = bit_offset(width, bits_per_pixel, x, y);
    let end = bit + bits_per_pixel.get() as usize;
    assert!(
        end <= data.len() * 8,
        "pixel ({x}, {y}) lies beyond the {}-byte bitstream",
        data.len()
    );

    let mut value: u32 = 0;
    while bit < end {
        let in_byte = bit % 8;
        let take = (8 - in_byte).min(end - bit);
        let shift = 8 - in_byte - take;
        let chunk = (data[bit / 8] as u32 >> shift) & low_mask(take);
        // `take` never exceeds 8, and the accumulated width never exceeds 32.
        value = ((value as u64) << take) as u32 | chunk;
        bit += take;
    }
    value
}

/// Write `color_id` into pixel `(x, y)`, leaving every other bit untouched.
///
/// # Panics
///
/// If `x >= width`, the pixel's bits lie beyond `data`, or `color_id` does
/// not fit in `bits_per_pixel` bits.
pub fn set_pixel_color_id(
    data: &mut [u8],
    width: u32,
    bits_per_pixel: BitsPerPixel,
    x: u32,
    y: u32,
    color_id: ColorId,
) {
    assert!(
        color_id <= bits_per_pixel.max_color_id(),
        "color id {color_id} does not fit in {} bits",
        bits_per_pixel.get()
    );
    let mut bit = bit_offset(width, bits_per_pixel, x, y);
    let end = bit + bits_per_pixel.get() as usize;
    assert!(
        end <= data.len() * 8,
        "pixel ({x}, {y}) lies beyond the {}-byte bitstream",
        data.len()
    );

    let mut remaining = bits_per_pixel.get() as usize;
    while bit < end {
        let in_byte = bit % 8;
        let take = (8 - in_byte).min(end - bit);
        let shift = 8 - in_byte - take;
        remaining -= take;
        let chunk = ((color_id as u64 >> remaining) as u32 & low_mask(take)) as u8;
        let mask = (low_mask(take) as u8) << shift;
        let byte = &mut data[bit / 8];
        *byte = (*byte & !mask) | (chunk << shift);
        bit += take;
    }
}
