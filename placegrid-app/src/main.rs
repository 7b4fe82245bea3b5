use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use tracing::{debug, info, warn};

use placegrid_app::{
    spawn_fetch_worker, AppConfig, FetchWorker, InputEvent, NavKey, PlaceCanvas, Touch,
    WorkerDataSource,
};
use placegrid_app::{JsonTransport, Result};
use placegrid_core::codec::set_pixel_color_id;
use placegrid_core::{BitsPerPixel, FrameRect, PixelPos, Vec2};
use placegrid_render::{
    ColorChoice, ColorPalette, RenderBuffer, Rgb, TileId, TileManifest, TileSpec,
};

// ---------------------------------------------------------------------------
// Demo canvas
// ---------------------------------------------------------------------------

const TILE_SIZE: u32 = 256;
const GRID: u32 = 8;
const FRAME: FrameRect = FrameRect::new(0.0, 0.0, 640.0, 480.0);
/// Simulated time per animation frame.
const FRAME_MS: f64 = 1000.0 / 60.0;

/// Sixteen colors, enough for 4 bits per pixel.
fn demo_palette() -> Result<ColorPalette> {
    const COLORS: [(u8, u8, u8); 16] = [
        (255, 255, 255),
        (228, 228, 228),
        (136, 136, 136),
        (34, 34, 34),
        (255, 167, 209),
        (229, 0, 0),
        (229, 149, 0),
        (160, 106, 66),
        (229, 217, 0),
        (148, 224, 68),
        (2, 190, 1),
        (0, 211, 221),
        (0, 131, 199),
        (0, 0, 234),
        (207, 110, 228),
        (130, 0, 128),
    ];
    let choices = COLORS
        .iter()
        .enumerate()
        .map(|(i, &(r, g, b))| ColorChoice {
            id: i as u32,
            rgb: Rgb::new(r, g, b),
            order: i as u32,
        })
        .collect();
    Ok(ColorPalette::new(choices)?)
}

/// Diagonal stripes, a different phase per tile.
fn synthetic_tile(id: TileId, spec: &TileSpec, bpp: BitsPerPixel) -> Vec<u8> {
    let rect = spec.rect();
    let (width, height) = (rect.width() as u32, rect.height() as u32);
    let mut data = vec![0u8; bpp.packed_len(width as usize * height as usize)];
    let colors = bpp.max_color_id() + 1;
    for y in 0..height {
        for x in 0..width {
            let color = ((x + y) / 16 + id) % colors;
            set_pixel_color_id(&mut data, width, bpp, x, y, color);
        }
    }
    data
}

type DemoCanvas = PlaceCanvas<JsonTransport, WorkerDataSource, RenderBuffer>;

/// Let every outstanding fetch land.
fn settle(canvas: &mut DemoCanvas, worker: &FetchWorker) {
    while let Some(response) = worker.recv_timeout(Duration::from_millis(200)) {
        canvas.pump_fetches(std::iter::once(response).chain(worker.drain()));
    }
}

fn run_animation(canvas: &mut DemoCanvas, now_ms: &mut f64) {
    while canvas.is_animating() {
        canvas.tick(*now_ms);
        *now_ms += FRAME_MS;
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting placegrid");

    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("placegrid.png"));

    let config = AppConfig::load();
    let bpp = BitsPerPixel::new(4)?;
    let manifest = TileManifest::grid(PixelPos::ORIGIN, TILE_SIZE, TILE_SIZE, GRID, GRID, bpp);
    manifest.validate()?;

    let specs = manifest.sections.clone();
    let (source, worker) = spawn_fetch_worker(move |id| {
        specs
            .iter()
            .find(|s| s.id == id)
            .map(|spec| synthetic_tile(id, spec, bpp))
            .ok_or_else(|| format!("no such tile {id}"))
    });

    let (outbox, socket) = mpsc::channel();
    let mut canvas = PlaceCanvas::new(
        config,
        FRAME,
        &manifest,
        demo_palette()?,
        JsonTransport::new(outbox),
        source,
        RenderBuffer::new(1, 1),
    )?;
    let _label = canvas.on_viewport_update(|snap| {
        debug!(
            "View: reticle ({}, {}), zoom {:.2}",
            snap.reticle.x, snap.reticle.y, snap.zoom_level
        );
    });
    settle(&mut canvas, &worker);

    let mut now_ms = 0.0;
    let center = FRAME.center();

    // Drag a third of the frame to the left.
    canvas.handle_input(&InputEvent::PointerDown(center));
    for step in 1..=10 {
        let x = center.x - step as f64 * FRAME.width / 30.0;
        canvas.handle_input(&InputEvent::PointerMove(Vec2::new(x, center.y)));
    }
    canvas.handle_input(&InputEvent::PointerUp(Vec2::new(
        center.x - FRAME.width / 3.0,
        center.y,
    )));
    settle(&mut canvas, &worker);

    // Wheel in a few notches, then pinch back out a little.
    for _ in 0..6 {
        canvas.handle_input(&InputEvent::Wheel {
            at: center + Vec2::new(40.0, -20.0),
            delta_y: -100.0,
        });
    }
    let touch = |id, x, y| Touch {
        id,
        pos: Vec2::new(x, y),
    };
    canvas.handle_input(&InputEvent::TouchStart(vec![
        touch(0, center.x - 100.0, center.y),
        touch(1, center.x + 100.0, center.y),
    ]));
    canvas.handle_input(&InputEvent::TouchMove(vec![
        touch(0, center.x - 80.0, center.y),
        touch(1, center.x + 80.0, center.y),
    ]));
    canvas.handle_input(&InputEvent::TouchEnd(Vec::new()));
    settle(&mut canvas, &worker);

    // Click to center, then nudge the reticle with the keyboard.
    let click = center + Vec2::new(-120.0, 60.0);
    canvas.handle_input(&InputEvent::PointerDown(click));
    canvas.handle_input(&InputEvent::PointerUp(click));
    run_animation(&mut canvas, &mut now_ms);
    for key in [NavKey::Right, NavKey::Right, NavKey::Down] {
        canvas.handle_input(&InputEvent::Key(key));
        run_animation(&mut canvas, &mut now_ms);
    }
    settle(&mut canvas, &worker);

    // Zoom in for placement and drop a pixel.
    canvas.begin_place_pixel();
    run_animation(&mut canvas, &mut now_ms);
    settle(&mut canvas, &worker);
    canvas.select_color(5);
    let color = canvas.palette().current().id;
    match canvas.place_pixel(color) {
        Ok(update) => info!(
            "Placed color {} in tile {} at index {}",
            update.color_id, update.tile_id, update.pixel_index
        ),
        Err(e) => warn!("{e}"),
    }

    // Echo what a server would broadcast back.
    let reticle = canvas.reticle();
    if let Some((tile_id, index)) = canvas.tiles().locate(reticle.offset(1, 0)) {
        let message = format!(
            r#"{{"type":"set_pixel","data":{{"secId":{tile_id},"pixIdx":{index},"colorId":13,"timestamp":0}}}}"#
        );
        if let Err(e) = canvas.handle_message(&message) {
            warn!("{e}");
        }
    }

    for message in socket.try_iter() {
        debug!("-> {message}");
    }

    // Persist the settings this session ran with.
    canvas.config().save();

    canvas.surface().save_png(&output)?;
    info!(
        "Saved {}x{} snapshot to {} (reticle ({}, {}), zoom {:.2})",
        canvas.surface().width,
        canvas.surface().height,
        output.display(),
        reticle.x,
        reticle.y,
        canvas.zoom_level()
    );
    Ok(())
}
