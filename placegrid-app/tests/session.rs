//! A canvas driven through the real fetch worker and JSON transport.

use std::sync::mpsc;
use std::time::Duration;

use placegrid_app::{
    spawn_fetch_worker, AppConfig, FetchWorker, InputEvent, JsonTransport, PlaceCanvas,
    WireEvent, WorkerDataSource,
};
use placegrid_core::{BitsPerPixel, FrameRect, PixelPos, Vec2};
use placegrid_render::{ColorChoice, ColorPalette, RenderBuffer, Rgb, TileManifest};

type Canvas = PlaceCanvas<JsonTransport, WorkerDataSource, RenderBuffer>;

fn palette() -> ColorPalette {
    let rgb = [Rgb::WHITE, Rgb::BLACK, Rgb::new(255, 0, 0), Rgb::new(0, 0, 255)];
    ColorPalette::new(
        rgb.iter()
            .enumerate()
            .map(|(i, &rgb)| ColorChoice {
                id: i as u32,
                rgb,
                order: i as u32,
            })
            .collect(),
    )
    .unwrap()
}

fn settle(canvas: &mut Canvas, worker: &FetchWorker) -> usize {
    let mut decoded = 0;
    while let Some(response) = worker.recv_timeout(Duration::from_millis(500)) {
        decoded += canvas.pump_fetches(std::iter::once(response).chain(worker.drain()));
    }
    decoded
}

#[test]
fn full_session() {
    let manifest =
        TileManifest::grid(PixelPos::ORIGIN, 100, 100, 4, 4, BitsPerPixel::new(2).unwrap());
    // Every pixel of tile n has color n % 4.
    let (source, worker) = spawn_fetch_worker(|id| Ok(vec![(id % 4) as u8 * 0b0101_0101; 2_500]));
    let (outbox, socket) = mpsc::channel();

    let mut canvas = PlaceCanvas::new(
        AppConfig::default(),
        FrameRect::new(0.0, 0.0, 100.0, 100.0),
        &manifest,
        palette(),
        JsonTransport::new(outbox),
        source,
        RenderBuffer::new(1, 1),
    )
    .unwrap();

    let first = WireEvent::decode(&socket.recv().unwrap()).unwrap();
    assert_eq!(first, WireEvent::Subscribe(vec![5, 6, 9, 10]));
    assert_eq!(settle(&mut canvas, &worker), 4);

    // Tile 10 (color 2) holds the reticle; tile 9 (color 1) is to its left.
    let transform = canvas.viewport().transform();
    let at = |p: PixelPos| {
        let b = transform.global_to_buffer_pixel(p);
        canvas.surface().pixel(b.x as u32, b.y as u32)
    };
    assert_eq!(at(PixelPos::new(200, 200)), Rgb::new(255, 0, 0).to_rgba());
    assert_eq!(at(PixelPos::new(199, 200)), Rgb::BLACK.to_rgba());

    let update = canvas.place_pixel(3).unwrap();
    assert_eq!(
        WireEvent::decode(&socket.recv().unwrap()).unwrap(),
        WireEvent::SetPixel(update.into())
    );
    assert_eq!(canvas.tiles().get(10).unwrap().color_id_at(0), Some(3));

    // A broadcast for a neighbouring pixel.
    canvas
        .handle_message(r#"{"type":"set_pixel","data":{"secId":10,"pixIdx":1,"colorId":0,"timestamp":42}}"#)
        .unwrap();
    let b = canvas
        .viewport()
        .transform()
        .global_to_buffer_pixel(PixelPos::new(201, 200));
    assert_eq!(canvas.surface().pixel(b.x as u32, b.y as u32), Rgb::WHITE.to_rgba());

    // Wheel zoom leaves the point under the cursor in place.
    let cursor = Vec2::new(30.0, 70.0);
    let before = canvas.viewport().transform().screen_to_global(cursor);
    canvas.handle_input(&InputEvent::Wheel {
        at: cursor,
        delta_y: -1.0,
    });
    let after = canvas.viewport().transform().screen_to_global(cursor);
    assert!((before - after).length() < 1e-6);
    assert!((canvas.zoom_level() - 1.2).abs() < 1e-9);
}
