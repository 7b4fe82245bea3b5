use placegrid_core::{
    ColorId, FrameRect, ListenerId, PixelPos, ViewportController, ViewportSnapshot, ViewportUpdate,
};
use placegrid_render::{
    draw_tile, paint_pixel, redraw, ColorPalette, ColorResolver, DrawReport, FetchOutcome,
    FetchResponse, PatchOutcome, PixelUpdate, RenderSurface, SubscriptionManager, TileDataSource,
    TileManifest, TileSet, Transport,
};
use tracing::{debug, info, warn};

use crate::animation::{AnimationScheduler, AnimationStatus};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::gesture::{GestureAction, GestureController, InputEvent};
use crate::protocol::WireEvent;

/// The interactive canvas: viewport, tiles, subscriptions, input and
/// animation wired to a transport, a tile byte source and a surface.
///
/// Everything runs on the caller's thread. Fetch completions arrive through
/// [`pump_fetches`](Self::pump_fetches), socket messages through
/// [`handle_message`](Self::handle_message), frames through
/// [`tick`](Self::tick).
pub struct PlaceCanvas<T, D, S> {
    config: AppConfig,
    viewport: ViewportController,
    tiles: TileSet,
    palette: ColorPalette,
    subscriptions: SubscriptionManager,
    gestures: GestureController,
    animation: AnimationScheduler,
    transport: T,
    source: D,
    surface: S,
}

impl<T, D, S> PlaceCanvas<T, D, S>
where
    T: Transport,
    D: TileDataSource,
    S: RenderSurface,
{
    /// Build the canvas centered on the middle of the manifest and run the
    /// first redraw, which subscribes to and requests the visible tiles.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: AppConfig,
        frame: FrameRect,
        manifest: &TileManifest,
        palette: ColorPalette,
        transport: T,
        source: D,
        surface: S,
    ) -> crate::Result<Self> {
        let tiles = TileSet::from_manifest(manifest)?;
        let mut viewport = ViewportController::new(config.viewport.clone(), frame)?;
        let bounds = tiles.bounds();
        viewport.set_content_bounds(Some(bounds));
        viewport.center_global_pixel(PixelPos::new(
            bounds.top_left.x + bounds.width() / 2,
            bounds.top_left.y + bounds.height() / 2,
        ));
        let subscriptions =
            SubscriptionManager::new(config.subscription.leave_margin(frame.width, frame.height));
        let gestures = GestureController::new(config.gesture.clone());

        let mut canvas = Self {
            config,
            viewport,
            tiles,
            palette,
            subscriptions,
            gestures,
            animation: AnimationScheduler::new(),
            transport,
            source,
            surface,
        };
        canvas.update();
        info!(
            "Canvas ready: {} tiles, reticle at ({}, {})",
            canvas.tiles.len(),
            canvas.viewport.reticle().x,
            canvas.viewport.reticle().y
        );
        Ok(canvas)
    }

    // -- Read access --

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn tiles(&self) -> &TileSet {
        &self.tiles
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn source(&self) -> &D {
        &self.source
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn reticle(&self) -> PixelPos {
        self.viewport.reticle()
    }

    pub fn zoom_level(&self) -> f64 {
        self.viewport.zoom_level()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_active()
    }

    // -- Observers --

    /// Get told about every view change, e.g. to drive a zoom slider or a
    /// coordinate label.
    pub fn on_viewport_update(
        &mut self,
        listener: impl FnMut(&ViewportSnapshot) + 'static,
    ) -> ListenerId {
        self.viewport.on_update(listener)
    }

    pub fn remove_viewport_listener(&mut self, id: ListenerId) -> bool {
        self.viewport.remove_listener(id)
    }

    // -- View changes --

    /// Settle the viewport and redraw if it asked for one.
    pub fn update(&mut self) -> ViewportUpdate {
        let update = self.viewport.update();
        if self.viewport.take_redraw_request() {
            self.redraw();
        }
        update
    }

    /// Bring subscriptions in line with the buffer and repaint it from
    /// scratch. Tiles without data get fetched and drawn on arrival.
    pub fn redraw(&mut self) -> DrawReport {
        self.subscriptions.refresh(
            &mut self.tiles,
            &self.viewport.buffer_global_rect(),
            &mut self.transport,
        );
        let active: Vec<_> = self.subscriptions.active().iter().copied().collect();
        redraw(
            &mut self.tiles,
            active,
            &self.viewport.transform(),
            self.viewport.buffer_size(),
            self.config.background,
            &mut self.surface,
            &mut self.source,
        )
    }

    pub fn handle_input(&mut self, event: &InputEvent) {
        if event.starts_gesture() && self.animation.is_active() {
            debug!("Gesture started, cancelling animation");
            self.animation.cancel();
        }
        let actions = self.gestures.handle(event);
        if actions.is_empty() {
            return;
        }
        for action in actions {
            self.apply(action);
        }
        self.update();
    }

    fn apply(&mut self, action: GestureAction) {
        let center_ms = self.config.animation.center_duration_ms;
        let zoom_ms = self.config.animation.zoom_duration_ms;
        match action {
            GestureAction::Pan(delta) => self.viewport.pan_by(delta),
            GestureAction::Zoom { at, factor } => {
                self.viewport.zoom_at(at, factor);
            }
            GestureAction::CenterOn(screen) => {
                let pixel = self.viewport.transform().screen_to_global_pixel(screen);
                let pixel = self.tiles.bounds().clamp(pixel);
                self.animation.pan_to_pixel(pixel, center_ms);
            }
            GestureAction::MoveReticle { dx, dy } => self.move_reticle(dx, dy),
            GestureAction::ZoomAtCenter(factor) => {
                self.animation
                    .zoom(self.viewport.frame_center(), factor, zoom_ms);
            }
        }
    }

    /// Animate the reticle by whole pixels, staying inside the canvas.
    pub fn move_reticle(&mut self, dx: i64, dy: i64) {
        let target = self.tiles.bounds().clamp(self.viewport.reticle().offset(dx, dy));
        self.animation
            .pan_to_pixel(target, self.config.animation.center_duration_ms);
    }

    /// Advance any running animation to `now_ms`.
    pub fn tick(&mut self, now_ms: f64) -> AnimationStatus {
        let status = self.animation.tick(now_ms, &mut self.viewport);
        if status != AnimationStatus::Idle {
            self.update();
        }
        status
    }

    /// Jump to an absolute zoom level about the frame center.
    pub fn set_zoom_level(&mut self, level: f64) {
        self.animation.cancel();
        self.viewport.set_zoom_level(level);
        self.update();
    }

    /// Animate to the zoom used for placing pixels.
    pub fn begin_place_pixel(&mut self) {
        let factor = self.config.place_pixel_scale / self.viewport.scale();
        self.animation.zoom(
            self.viewport.frame_center(),
            factor,
            self.config.animation.zoom_duration_ms,
        );
    }

    pub fn resize(&mut self, frame: FrameRect) -> crate::Result<()> {
        self.viewport.resize(frame)?;
        self.subscriptions.set_leave_margin(
            self.config
                .subscription
                .leave_margin(frame.width, frame.height),
        );
        self.update();
        Ok(())
    }

    pub fn select_color(&mut self, id: ColorId) -> bool {
        self.palette.select(id)
    }

    // -- Data --

    /// Accept one fetch completion and draw the tile if it is still wanted.
    pub fn complete_fetch(&mut self, response: FetchResponse) -> crate::Result<FetchOutcome> {
        let id = response.tile_id;
        let outcome = self.tiles.complete_fetch(response, &self.palette)?;
        if let (FetchOutcome::Decoded { .. }, Some(tile)) = (outcome, self.tiles.get(id)) {
            if self.subscriptions.is_active(id) {
                draw_tile(tile, &self.viewport.transform(), &mut self.surface);
            }
        }
        Ok(outcome)
    }

    /// Feed completions from the fetch worker. Returns how many tiles were
    /// decoded; failures are logged and retried on the next redraw.
    pub fn pump_fetches<I>(&mut self, responses: I) -> usize
    where
        I: IntoIterator<Item = FetchResponse>,
    {
        let mut decoded = 0;
        for response in responses {
            match self.complete_fetch(response) {
                Ok(FetchOutcome::Decoded { .. }) => decoded += 1,
                Ok(FetchOutcome::Discarded) => {}
                Err(e) => warn!("{e}"),
            }
        }
        decoded
    }

    /// Apply a pixel change broadcast by the server.
    pub fn apply_remote_pixel(&mut self, update: PixelUpdate) -> crate::Result<PatchOutcome> {
        if !self.subscriptions.is_active(update.tile_id) {
            debug!("Ignoring pixel update for inactive tile {}", update.tile_id);
            return Ok(PatchOutcome::Dropped);
        }
        let outcome = self.tiles.apply_patch(&update, &self.palette)?;
        if let (PatchOutcome::Applied(rgb), Some(tile)) = (outcome, self.tiles.get(update.tile_id)) {
            let pixel = tile.local_to_global(update.pixel_index);
            paint_pixel(&mut self.surface, &self.viewport.transform(), pixel, rgb);
        }
        Ok(outcome)
    }

    /// Handle one inbound socket message.
    pub fn handle_message(&mut self, message: &str) -> crate::Result<()> {
        match WireEvent::decode(message)? {
            WireEvent::SetPixel(data) => {
                self.apply_remote_pixel(data.into())?;
            }
            other => warn!("Unexpected inbound event {other:?}"),
        }
        Ok(())
    }

    /// Color the reticle pixel locally and tell the server.
    pub fn place_pixel(&mut self, color_id: ColorId) -> crate::Result<PixelUpdate> {
        let pixel = self.viewport.reticle();
        let reject = |reason: &str| AppError::PlacePixel {
            pixel,
            reason: reason.to_string(),
        };

        if self.palette.id_to_rgb(color_id).is_none() {
            return Err(reject(&format!("unknown color id {color_id}")));
        }
        let (tile_id, index) = self
            .tiles
            .locate(pixel)
            .ok_or_else(|| reject("outside the canvas"))?;
        let decoded = self.tiles.get(tile_id).is_some_and(|t| t.is_decoded());
        if !self.subscriptions.is_active(tile_id) || !decoded {
            return Err(reject("tile is not loaded"));
        }

        let update = PixelUpdate {
            tile_id,
            pixel_index: index,
            color_id,
            timestamp: None,
        };
        if let PatchOutcome::Applied(rgb) = self.tiles.apply_patch(&update, &self.palette)? {
            paint_pixel(&mut self.surface, &self.viewport.transform(), pixel, rgb);
        }
        self.transport.send_pixel_update(update);
        debug!("Placed color {color_id} at ({}, {})", pixel.x, pixel.y);
        Ok(update)
    }
}
