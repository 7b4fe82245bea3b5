use crate::geometry::{PixelPos, Vec2};

/// Snapshot of the mapping between the three coordinate spaces.
///
/// * **screen**: device pixels, the space input events arrive in.
/// * **buffer**: pixels of the rendering surface, origin at its top-left.
///   One buffer pixel spans `screen_px_per_buffer_px` screen pixels.
/// * **global**: the shared pixel grid. `global = buffer - content_offset`.
///
/// All conversions are pure; a snapshot goes stale as soon as the viewport
/// it was taken from changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    /// Screen position of the rendering buffer's top-left corner.
    pub buffer_origin: Vec2,
    pub screen_px_per_buffer_px: f64,
    pub content_offset: PixelPos,
}

impl CoordinateTransform {
    #[inline]
    pub fn screen_to_buffer(&self, p: Vec2) -> Vec2 {
        (p - self.buffer_origin) / self.screen_px_per_buffer_px
    }

    #[inline]
    pub fn buffer_to_screen(&self, p: Vec2) -> Vec2 {
        p * self.screen_px_per_buffer_px + self.buffer_origin
    }

    #[inline]
    pub fn buffer_to_global(&self, p: Vec2) -> Vec2 {
        p - Vec2::from(self.content_offset)
    }

    #[inline]
    pub fn global_to_buffer(&self, p: Vec2) -> Vec2 {
        p + Vec2::from(self.content_offset)
    }

    #[inline]
    pub fn screen_to_global(&self, p: Vec2) -> Vec2 {
        self.buffer_to_global(self.screen_to_buffer(p))
    }

    #[inline]
    pub fn global_to_screen(&self, p: Vec2) -> Vec2 {
        self.buffer_to_screen(self.global_to_buffer(p))
    }

    /// The global pixel under a screen point.
    #[inline]
    pub fn screen_to_global_pixel(&self, p: Vec2) -> PixelPos {
        self.screen_to_global(p).floor()
    }

    /// The buffer pixel under a screen point.
    #[inline]
    pub fn screen_to_buffer_pixel(&self, p: Vec2) -> PixelPos {
        self.screen_to_buffer(p).floor()
    }

    /// Integer buffer position of a global pixel. Exact, since the content
    /// offset is whole pixels.
    #[inline]
    pub fn global_to_buffer_pixel(&self, p: PixelPos) -> PixelPos {
        p + self.content_offset
    }

    #[inline]
    pub fn buffer_to_global_pixel(&self, p: PixelPos) -> PixelPos {
        p - self.content_offset
    }

    /// Screen position of a global pixel's midpoint.
    #[inline]
    pub fn global_pixel_center_to_screen(&self, p: PixelPos) -> Vec2 {
        self.global_to_screen(p.center())
    }
}
