use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A continuous 2D point or displacement.
///
/// Used for screen coordinates, buffer coordinates, and sub-pixel global
/// coordinates alike; which space a value lives in is tracked by the API that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Snap to the pixel containing this point. Always floors, so `-0.5`
    /// belongs to pixel `-1`.
    #[inline]
    pub fn floor(self) -> PixelPos {
        PixelPos::new(self.x.floor() as i64, self.y.floor() as i64)
    }

    #[inline]
    pub fn round(self) -> PixelPos {
        PixelPos::new(self.x.round() as i64, self.y.round() as i64)
    }

    /// Component-wise multiplication.
    #[inline]
    pub fn scale_by(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// -- Arithmetic operators --

impl Add for Vec2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vec2 {
    type Output = Self;

    #[inline]
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<PixelPos> for Vec2 {
    #[inline]
    fn from(p: PixelPos) -> Self {
        Self::new(p.x as f64, p.y as f64)
    }
}

/// An integer pixel coordinate (global or buffer space).
///
/// Serializes as a two-element array, matching the manifest's
/// `topLeft`/`botRight` encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[i64; 2]", into = "[i64; 2]")]
pub struct PixelPos {
    pub x: i64,
    pub y: i64,
}

impl PixelPos {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    #[inline]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Continuous coordinates of this pixel's midpoint.
    #[inline]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.x as f64 + 0.5, self.y as f64 + 0.5)
    }

    #[inline]
    pub fn offset(self, dx: i64, dy: i64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<[i64; 2]> for PixelPos {
    fn from([x, y]: [i64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<PixelPos> for [i64; 2] {
    fn from(p: PixelPos) -> Self {
        [p.x, p.y]
    }
}

impl Add for PixelPos {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for PixelPos {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned pixel rectangle, half-open: `bot_right` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelRect {
    pub top_left: PixelPos,
    pub bot_right: PixelPos,
}

impl PixelRect {
    pub const fn new(top_left: PixelPos, bot_right: PixelPos) -> Self {
        Self {
            top_left,
            bot_right,
        }
    }

    pub fn from_origin_size(top_left: PixelPos, width: u32, height: u32) -> Self {
        Self::new(top_left, top_left.offset(width as i64, height as i64))
    }

    #[inline]
    pub fn width(&self) -> i64 {
        self.bot_right.x - self.top_left.x
    }

    #[inline]
    pub fn height(&self) -> i64 {
        self.bot_right.y - self.top_left.y
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Number of pixels covered; zero for degenerate rectangles.
    pub fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.width() as u64 * self.height() as u64
        }
    }

    #[inline]
    pub fn contains(&self, p: PixelPos) -> bool {
        self.top_left.x <= p.x
            && p.x < self.bot_right.x
            && self.top_left.y <= p.y
            && p.y < self.bot_right.y
    }

    /// True when the two rectangles share at least one pixel.
    #[inline]
    pub fn intersects(&self, other: &PixelRect) -> bool {
        self.top_left.x < other.bot_right.x
            && other.top_left.x < self.bot_right.x
            && self.top_left.y < other.bot_right.y
            && other.top_left.y < self.bot_right.y
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &PixelRect) -> PixelRect {
        PixelRect::new(
            PixelPos::new(
                self.top_left.x.min(other.top_left.x),
                self.top_left.y.min(other.top_left.y),
            ),
            PixelPos::new(
                self.bot_right.x.max(other.bot_right.x),
                self.bot_right.y.max(other.bot_right.y),
            ),
        )
    }

    /// Grow by `mx` pixels left and right and `my` pixels up and down.
    pub fn expanded(&self, mx: i64, my: i64) -> PixelRect {
        PixelRect::new(self.top_left.offset(-mx, -my), self.bot_right.offset(mx, my))
    }

    /// Clamp a pixel into the rectangle. The rectangle must not be empty.
    pub fn clamp(&self, p: PixelPos) -> PixelPos {
        PixelPos::new(
            p.x.clamp(self.top_left.x, self.bot_right.x - 1),
            p.y.clamp(self.top_left.y, self.bot_right.y - 1),
        )
    }
}

/// The visible frame in screen coordinates (device pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl FrameRect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}
