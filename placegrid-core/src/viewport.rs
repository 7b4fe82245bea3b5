use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::geometry::{FrameRect, PixelPos, PixelRect, Vec2};
use crate::transform::CoordinateTransform;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Zoom limits and rendering-buffer sizing.
///
/// Screen pixels per buffer pixel is `scale * max_zoom`, so with the defaults
/// the most zoomed-out view shows one global pixel per screen pixel and the
/// most zoomed-in view shows 50×50 screen pixels per global pixel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
    #[serde(default = "default_min_scale")]
    pub min_scale: f64,
    #[serde(default = "default_max_scale")]
    pub max_scale: f64,
    #[serde(default = "default_initial_scale")]
    pub initial_scale: f64,
    /// Rendering-buffer margin on each side, as a fraction of the frame size.
    #[serde(default = "default_buffer_fraction")]
    pub buffer_fraction: f64,
}

fn default_max_zoom() -> f64 {
    50.0
}
fn default_min_scale() -> f64 {
    1.0 / 50.0
}
fn default_max_scale() -> f64 {
    1.0
}
fn default_initial_scale() -> f64 {
    1.0 / 50.0
}
fn default_buffer_fraction() -> f64 {
    0.1
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            max_zoom: default_max_zoom(),
            min_scale: default_min_scale(),
            max_scale: default_max_scale(),
            initial_scale: default_initial_scale(),
            buffer_fraction: default_buffer_fraction(),
        }
    }
}

impl ViewportConfig {
    pub fn validate(&self) -> crate::Result<()> {
        let positive = |v: f64| v > 0.0 && v.is_finite();
        if !positive(self.min_scale) || !positive(self.max_scale) || self.min_scale > self.max_scale
        {
            return Err(CoreError::InvalidScaleRange {
                min: self.min_scale,
                max: self.max_scale,
            });
        }
        if !positive(self.max_zoom) {
            return Err(CoreError::InvalidViewport {
                reason: format!("max_zoom must be positive and finite, got {}", self.max_zoom),
            });
        }
        if !positive(self.initial_scale) {
            return Err(CoreError::InvalidViewport {
                reason: format!(
                    "initial_scale must be positive and finite, got {}",
                    self.initial_scale
                ),
            });
        }
        if !(self.buffer_fraction >= 0.0 && self.buffer_fraction.is_finite()) {
            return Err(CoreError::InvalidViewport {
                reason: format!("buffer_fraction must be >= 0, got {}", self.buffer_fraction),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn clamp_scale(&self, scale: f64) -> f64 {
        scale.clamp(self.min_scale, self.max_scale)
    }
}

fn validate_frame(frame: &FrameRect) -> crate::Result<()> {
    let ok = |v: f64| v > 0.0 && v.is_finite();
    if !ok(frame.width) || !ok(frame.height) || !frame.left.is_finite() || !frame.top.is_finite()
    {
        return Err(CoreError::InvalidViewport {
            reason: format!("frame must have a positive finite size, got {frame:?}"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// State and notifications
// ---------------------------------------------------------------------------

/// The mutable part of the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    /// Zoom factor, within `[min_scale, max_scale]`.
    pub scale: f64,
    /// Screen-space translation of the rendering buffer's center relative to
    /// the frame center.
    pub offset: Vec2,
    /// Whole-pixel shift of the buffer's content relative to the global grid.
    pub content_offset: PixelPos,
}

/// What observers see after every [`ViewportController::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSnapshot {
    pub state: ViewportState,
    /// The global pixel under the frame center.
    pub reticle: PixelPos,
    /// Screen pixels per global pixel.
    pub zoom_level: f64,
    pub recentered: bool,
}

/// Result of an [`ViewportController::update`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportUpdate {
    /// The content offset moved and the rendering buffer must be redrawn.
    pub recentered: bool,
    /// The center request was pulled back inside the content bounds.
    pub clamped: bool,
    pub reticle: PixelPos,
}

/// Handle returned by [`ViewportController::on_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&ViewportSnapshot)>;

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns the view state and is the only thing allowed to change it.
///
/// The rendering buffer is larger than the frame by a margin on every side
/// and is moved around with `offset`. Once `offset` would push the frame past
/// the buffer's edge, [`recenter_if_needed`](Self::recenter_if_needed) moves a
/// whole-pixel part of it into `content_offset` and asks for a redraw, so the
/// screen-space translation stays bounded no matter how far the user pans.
pub struct ViewportController {
    config: ViewportConfig,
    state: ViewportState,
    frame: FrameRect,
    buffer_margin: [u32; 2],
    buffer_size: [u32; 2],
    content_bounds: Option<PixelRect>,
    reticle: PixelPos,
    redraw_requested: bool,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: u64,
}

impl fmt::Debug for ViewportController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportController")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("frame", &self.frame)
            .field("buffer_size", &self.buffer_size)
            .field("content_bounds", &self.content_bounds)
            .field("reticle", &self.reticle)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl ViewportController {
    /// Create a controller with the buffer centered on the frame and no
    /// content offset, so global `(0, 0)` is the buffer's top-left pixel.
    pub fn new(config: ViewportConfig, frame: FrameRect) -> crate::Result<Self> {
        config.validate()?;
        validate_frame(&frame)?;
        let scale = config.clamp_scale(config.initial_scale);
        let mut vp = Self {
            config,
            state: ViewportState {
                scale,
                offset: Vec2::ZERO,
                content_offset: PixelPos::ORIGIN,
            },
            frame,
            buffer_margin: [0, 0],
            buffer_size: [0, 0],
            content_bounds: None,
            reticle: PixelPos::ORIGIN,
            redraw_requested: true,
            listeners: Vec::new(),
            next_listener_id: 0,
        };
        vp.resize_buffer();
        vp.reticle = vp.compute_reticle();
        Ok(vp)
    }

    fn resize_buffer(&mut self) {
        let margin = |extent: f64| (extent * self.config.buffer_fraction).ceil() as u32;
        self.buffer_margin = [margin(self.frame.width), margin(self.frame.height)];
        self.buffer_size = [
            self.frame.width.ceil() as u32 + 2 * self.buffer_margin[0],
            self.frame.height.ceil() as u32 + 2 * self.buffer_margin[1],
        ];
    }

    // -- Read access --

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn frame(&self) -> FrameRect {
        self.frame
    }

    /// Rendering-buffer dimensions in buffer pixels.
    pub fn buffer_size(&self) -> [u32; 2] {
        self.buffer_size
    }

    /// Rendering-buffer margin on each side in buffer pixels.
    pub fn buffer_margin(&self) -> [u32; 2] {
        self.buffer_margin
    }

    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    #[inline]
    pub fn screen_px_per_buffer_px(&self) -> f64 {
        self.state.scale * self.config.max_zoom
    }

    /// The value a zoom slider displays: screen pixels per global pixel.
    pub fn zoom_level(&self) -> f64 {
        self.screen_px_per_buffer_px()
    }

    pub fn frame_center(&self) -> Vec2 {
        self.frame.center()
    }

    /// Screen position of the rendering buffer's center.
    pub fn buffer_screen_center(&self) -> Vec2 {
        self.frame.center() + self.state.offset
    }

    pub fn transform(&self) -> CoordinateTransform {
        let spp = self.screen_px_per_buffer_px();
        let half = Vec2::new(
            self.buffer_size[0] as f64 / 2.0,
            self.buffer_size[1] as f64 / 2.0,
        );
        CoordinateTransform {
            buffer_origin: self.buffer_screen_center() - half * spp,
            screen_px_per_buffer_px: spp,
            content_offset: self.state.content_offset,
        }
    }

    /// The global pixels currently held by the rendering buffer.
    pub fn buffer_global_rect(&self) -> PixelRect {
        let co = self.state.content_offset;
        PixelRect::from_origin_size(
            PixelPos::new(-co.x, -co.y),
            self.buffer_size[0],
            self.buffer_size[1],
        )
    }

    /// Continuous global coordinates under the frame center.
    pub fn centered_global(&self) -> Vec2 {
        self.transform().screen_to_global(self.frame.center())
    }

    /// The cached global pixel under the frame center, as of the last update.
    pub fn reticle(&self) -> PixelPos {
        self.reticle
    }

    pub fn content_bounds(&self) -> Option<PixelRect> {
        self.content_bounds
    }

    /// Restrict the center to the union of all known tiles.
    pub fn set_content_bounds(&mut self, bounds: Option<PixelRect>) {
        self.content_bounds = bounds.filter(|b| !b.is_empty());
    }

    // -- Mutations --

    /// Zoom by `factor` keeping the content under `screen_point` fixed.
    ///
    /// The requested scale is clamped to the configured range and the factor
    /// actually applied is returned; at a limit this is `1.0` and nothing
    /// moves.
    pub fn zoom_at(&mut self, screen_point: Vec2, factor: f64) -> f64 {
        if !(factor > 0.0 && factor.is_finite()) {
            debug!("Ignoring zoom with factor {factor}");
            return 1.0;
        }
        let new_scale = self.config.clamp_scale(self.state.scale * factor);
        let applied = new_scale / self.state.scale;
        // Scaling happens about the buffer's center.
        let center = self.buffer_screen_center();
        self.state.offset += (center - screen_point) * (applied - 1.0);
        self.state.scale = new_scale;
        applied
    }

    /// Set the absolute zoom level (see [`zoom_level`](Self::zoom_level))
    /// about the frame center.
    pub fn set_zoom_level(&mut self, level: f64) -> f64 {
        let factor = level / self.zoom_level();
        self.zoom_at(self.frame.center(), factor)
    }

    /// Translate by a screen-space delta. Scale is untouched.
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        if screen_delta.is_finite() {
            self.state.offset += screen_delta;
        }
    }

    /// Move the view so `target` (screen space) lands on the frame center.
    pub fn center_screen_point(&mut self, target: Vec2) {
        self.pan_by(self.frame.center() - target);
    }

    /// Move the view so continuous global `coords` sit at the frame center.
    pub fn center_global(&mut self, coords: Vec2) {
        let screen = self.transform().global_to_screen(coords);
        self.center_screen_point(screen);
    }

    /// Center the midpoint of a global pixel.
    pub fn center_global_pixel(&mut self, pixel: PixelPos) {
        self.center_global(pixel.center());
    }

    /// Largest `|offset|` per axis before the buffer has to be recentered.
    ///
    /// The frame stays inside the buffer as long as
    /// `|offset| <= margin*spp + (spp - 1) * frame / 2`. The window never
    /// drops below `spp`, since recentering can only bring `|offset|` down
    /// to `spp / 2`.
    pub fn buffer_window(&self) -> Vec2 {
        let spp = self.screen_px_per_buffer_px();
        let axis = |margin: u32, extent: f64| {
            (margin as f64 * spp + (spp - 1.0) * extent / 2.0).max(spp)
        };
        Vec2::new(
            axis(self.buffer_margin[0], self.frame.width),
            axis(self.buffer_margin[1], self.frame.height),
        )
    }

    /// Move whole buffer pixels of `offset` into `content_offset` once the
    /// offset leaves the buffer window. Returns whether anything moved; if so
    /// a redraw is requested.
    pub fn recenter_if_needed(&mut self) -> bool {
        let window = self.buffer_window();
        let offset = self.state.offset;
        if offset.x.abs() < window.x && offset.y.abs() < window.y {
            return false;
        }
        let spp = self.screen_px_per_buffer_px();
        let shift = (offset / spp).round();
        self.state.content_offset = self.state.content_offset + shift;
        self.state.offset -= Vec2::from(shift) * spp;
        self.redraw_requested = true;
        debug!(
            "Recentered buffer by ({}, {}), content offset now ({}, {})",
            shift.x, shift.y, self.state.content_offset.x, self.state.content_offset.y
        );
        true
    }

    /// Pull the center back inside the content bounds if it left them.
    ///
    /// Only the violating axis moves, onto the midpoint of the nearest
    /// in-bounds pixel. Returns whether a correction was applied.
    pub fn clamp_to_content_bounds(&mut self) -> bool {
        let Some(bounds) = self.content_bounds else {
            return false;
        };
        let centered = self.centered_global();
        let pixel = centered.floor();
        if bounds.contains(pixel) {
            return false;
        }
        let nearest = bounds.clamp(pixel);
        let target = Vec2::new(
            if nearest.x == pixel.x {
                centered.x
            } else {
                nearest.x as f64 + 0.5
            },
            if nearest.y == pixel.y {
                centered.y
            } else {
                nearest.y as f64 + 0.5
            },
        );
        self.center_global(target);
        true
    }

    /// Re-establish every invariant after a batch of mutations: content
    /// bounds, buffer recentering, the cached reticle. Then notify observers.
    pub fn update(&mut self) -> ViewportUpdate {
        let clamped = self.clamp_to_content_bounds();
        let recentered = self.recenter_if_needed();
        self.reticle = self.compute_reticle();

        let snapshot = ViewportSnapshot {
            state: self.state,
            reticle: self.reticle,
            zoom_level: self.zoom_level(),
            recentered,
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&snapshot);
        }

        ViewportUpdate {
            recentered,
            clamped,
            reticle: self.reticle,
        }
    }

    fn compute_reticle(&self) -> PixelPos {
        self.transform().screen_to_global_pixel(self.frame.center())
    }

    /// Adopt a new frame. The global point at the frame center stays put and
    /// a full redraw is requested.
    pub fn resize(&mut self, frame: FrameRect) -> crate::Result<()> {
        validate_frame(&frame)?;
        let centered = self.centered_global();
        self.frame = frame;
        self.resize_buffer();
        self.state.offset = Vec2::ZERO;
        self.center_global(centered);
        self.redraw_requested = true;
        debug!(
            "Resized frame to {}x{}, buffer {}x{}",
            frame.width, frame.height, self.buffer_size[0], self.buffer_size[1]
        );
        Ok(())
    }

    // -- Redraw bookkeeping --

    pub fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    /// Consume a pending redraw request.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    // -- Observers --

    /// Register a callback run at the end of every [`update`](Self::update).
    pub fn on_update(&mut self, listener: impl FnMut(&ViewportSnapshot) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    const EPSILON: f64 = 1e-9;

    fn frame() -> FrameRect {
        FrameRect::new(0.0, 0.0, 800.0, 600.0)
    }

    fn controller() -> ViewportController {
        ViewportController::new(ViewportConfig::default(), frame()).unwrap()
    }

    /// Small deterministic generator so the sequence tests are reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next_f64(&mut self) -> f64 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    #[test]
    fn buffer_is_frame_plus_margins() {
        let vp = controller();
        assert_eq!(vp.buffer_margin(), [80, 60]);
        assert_eq!(vp.buffer_size(), [960, 720]);
        assert!((vp.zoom_level() - 1.0).abs() < EPSILON);
        assert_eq!(
            vp.buffer_global_rect(),
            PixelRect::new(PixelPos::new(0, 0), PixelPos::new(960, 720))
        );
        // Buffer centered on the frame: frame center shows global (480, 360).
        assert_eq!(vp.reticle(), PixelPos::new(480, 360));
    }

    #[test]
    fn invalid_configuration() {
        let mut cfg = ViewportConfig::default();
        cfg.min_scale = 2.0;
        assert!(ViewportController::new(cfg, frame()).is_err());

        let mut cfg = ViewportConfig::default();
        cfg.max_zoom = 0.0;
        assert!(ViewportController::new(cfg, frame()).is_err());

        assert!(ViewportController::new(
            ViewportConfig::default(),
            FrameRect::new(0.0, 0.0, 0.0, 600.0)
        )
        .is_err());
    }

    #[test]
    fn zoom_keeps_point_under_cursor_fixed() {
        let mut vp = controller();
        let cursor = Vec2::new(123.0, 456.0);
        let before = vp.transform().screen_to_global(cursor);
        let applied = vp.zoom_at(cursor, 3.0);
        assert!((applied - 3.0).abs() < EPSILON);
        let after = vp.transform().screen_to_global(cursor);
        assert!((before - after).length() < EPSILON);
    }

    #[test]
    fn reciprocal_zooms_are_idempotent() {
        for &factor in &[1.2, 2.0, 4.5, 1.0 / 3.0] {
            for &p in &[Vec2::new(0.0, 0.0), Vec2::new(400.0, 300.0), Vec2::new(777.0, 12.5)] {
                let mut vp = controller();
                vp.zoom_at(Vec2::new(400.0, 300.0), 10.0);
                vp.pan_by(Vec2::new(-33.3, 17.0));
                let before = vp.state();
                vp.zoom_at(p, factor);
                vp.zoom_at(p, 1.0 / factor);
                let after = vp.state();
                assert!((before.scale - after.scale).abs() < EPSILON);
                assert!((before.offset - after.offset).length() < 1e-6);
            }
        }
    }

    #[test]
    fn saturating_zoom_is_a_noop() {
        let mut vp = controller();
        let before = vp.state();
        // Already at min_scale.
        let applied = vp.zoom_at(Vec2::new(10.0, 10.0), 0.5);
        assert!((applied - 1.0).abs() < EPSILON);
        assert_eq!(vp.state(), before);

        let applied = vp.zoom_at(Vec2::new(10.0, 10.0), 1_000.0);
        assert!((applied - 50.0).abs() < EPSILON);
        assert!((vp.scale() - 1.0).abs() < EPSILON);
        assert!((vp.zoom_at(Vec2::new(10.0, 10.0), 2.0) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn invalid_zoom_factor_is_ignored() {
        let mut vp = controller();
        let before = vp.state();
        assert_eq!(vp.zoom_at(Vec2::ZERO, f64::NAN), 1.0);
        assert_eq!(vp.zoom_at(Vec2::ZERO, -2.0), 1.0);
        assert_eq!(vp.state(), before);
    }

    #[test]
    fn pan_only_moves_offset() {
        let mut vp = controller();
        vp.pan_by(Vec2::new(5.0, -3.0));
        assert_eq!(vp.state().offset, Vec2::new(5.0, -3.0));
        assert!((vp.scale() - 1.0 / 50.0).abs() < EPSILON);
    }

    #[test]
    fn recentering_preserves_content_under_screen_points() {
        let mut vp = controller();
        vp.pan_by(Vec2::new(-1_000.4, 2_000.7));
        let probe = Vec2::new(321.0, 123.0);
        let before = vp.transform().screen_to_global(probe);
        assert!(vp.recenter_if_needed());
        let after = vp.transform().screen_to_global(probe);
        assert!((before - after).length() < 1e-9);
        assert_eq!(vp.state().content_offset, PixelPos::new(-1_000, 2_001));
        assert!(vp.take_redraw_request());
    }

    #[test]
    fn offset_stays_inside_window_for_any_sequence() {
        let mut rng = Lcg(42);
        let mut vp = controller();
        for _ in 0..2_000 {
            let r = rng.next_f64();
            if r < 0.6 {
                let d = Vec2::new(rng.next_f64() - 0.5, rng.next_f64() - 0.5) * 4_000.0;
                vp.pan_by(d);
            } else {
                let p = Vec2::new(rng.next_f64() * 800.0, rng.next_f64() * 600.0);
                let f = 0.25 + rng.next_f64() * 4.0;
                vp.zoom_at(p, f);
            }
            let probe = Vec2::new(rng.next_f64() * 800.0, rng.next_f64() * 600.0);
            let before = vp.transform().screen_to_global(probe);
            vp.update();
            let after = vp.transform().screen_to_global(probe);
            let window = vp.buffer_window();
            let offset = vp.state().offset;
            assert!(offset.x.abs() < window.x && offset.y.abs() < window.y);
            assert!((before - after).length() < 1e-6);
        }
    }

    #[test]
    fn centering_a_pixel_moves_the_reticle() {
        let mut vp = controller();
        vp.center_global_pixel(PixelPos::new(-12_345, 678));
        let update = vp.update();
        assert_eq!(update.reticle, PixelPos::new(-12_345, 678));
        assert!(update.recentered);
        let centered = vp.centered_global();
        assert!((centered - Vec2::new(-12_344.5, 678.5)).length() < 1e-6);
    }

    #[test]
    fn content_bounds_clamp_the_center() {
        let mut vp = controller();
        vp.set_content_bounds(Some(PixelRect::new(
            PixelPos::new(0, 0),
            PixelPos::new(100, 100),
        )));
        vp.center_global(Vec2::new(250.25, 40.25));
        let update = vp.update();
        assert!(update.clamped);
        assert_eq!(update.reticle, PixelPos::new(99, 40));
        let centered = vp.centered_global();
        assert!((centered.x - 99.5).abs() < 1e-6);
        assert!((centered.y - 40.25).abs() < 1e-6);

        // In-bounds requests are untouched.
        vp.center_global(Vec2::new(10.75, 20.75));
        assert!(!vp.update().clamped);
    }

    #[test]
    fn listeners_are_notified_and_removable() {
        let mut vp = controller();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = vp.on_update(move |snap| sink.borrow_mut().push(snap.reticle));
        vp.center_global_pixel(PixelPos::new(5, 5));
        vp.update();
        assert_eq!(seen.borrow().as_slice(), &[PixelPos::new(5, 5)]);
        assert!(vp.remove_listener(id));
        assert!(!vp.remove_listener(id));
        vp.update();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn zoom_slider_sets_absolute_level() {
        let mut vp = controller();
        vp.center_global_pixel(PixelPos::new(40, 40));
        vp.update();
        vp.set_zoom_level(10.0);
        vp.update();
        assert!((vp.zoom_level() - 10.0).abs() < 1e-9);
        assert_eq!(vp.reticle(), PixelPos::new(40, 40));
    }

    #[test]
    fn resize_keeps_center() {
        let mut vp = controller();
        vp.center_global(Vec2::new(1_000.5, -200.5));
        vp.update();
        vp.take_redraw_request();
        vp.resize(FrameRect::new(0.0, 0.0, 1024.0, 768.0)).unwrap();
        vp.update();
        assert_eq!(vp.buffer_size(), [1024 + 2 * 103, 768 + 2 * 77]);
        assert!((vp.centered_global() - Vec2::new(1_000.5, -200.5)).length() < 1e-6);
        assert!(vp.take_redraw_request());
    }
}
