use std::sync::mpsc;
use std::time::Duration;

use placegrid_render::{FetchRequest, FetchResponse, TileDataSource, TileId};
use tracing::{debug, info, warn};

/// Request side of the fetch worker. Handed to the canvas as its
/// [`TileDataSource`]; requests are queued and never block.
#[derive(Debug, Clone)]
pub struct WorkerDataSource {
    requests: mpsc::Sender<FetchRequest>,
}

impl TileDataSource for WorkerDataSource {
    fn request(&mut self, request: FetchRequest) {
        if self.requests.send(request).is_err() {
            warn!("Fetch worker gone, dropping request for tile {}", request.tile_id);
        }
    }
}

/// Completion side of the fetch worker, drained on the event-loop thread.
#[derive(Debug)]
pub struct FetchWorker {
    responses: mpsc::Receiver<FetchResponse>,
}

impl FetchWorker {
    /// Every completion that has arrived so far.
    pub fn drain(&self) -> Vec<FetchResponse> {
        self.responses.try_iter().collect()
    }

    /// Wait up to `timeout` for the next completion.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<FetchResponse> {
        self.responses.recv_timeout(timeout).ok()
    }
}

/// Spawn a dedicated thread that runs `load` for each requested tile.
///
/// `load` may block. The thread exits once every [`WorkerDataSource`] clone
/// has been dropped.
pub fn spawn_fetch_worker<F>(mut load: F) -> (WorkerDataSource, FetchWorker)
where
    F: FnMut(TileId) -> Result<Vec<u8>, String> + Send + 'static,
{
    let (req_tx, req_rx) = mpsc::channel::<FetchRequest>();
    let (resp_tx, resp_rx) = mpsc::channel::<FetchResponse>();

    std::thread::Builder::new()
        .name("fetch-worker".into())
        .spawn(move || {
            info!("Fetch worker started");
            while let Ok(request) = req_rx.recv() {
                let result = load(request.tile_id);
                match &result {
                    Ok(bytes) => debug!("Fetched tile {} ({} bytes)", request.tile_id, bytes.len()),
                    Err(e) => warn!("Fetching tile {} failed: {e}", request.tile_id),
                }
                let response = FetchResponse {
                    tile_id: request.tile_id,
                    generation: request.generation,
                    result,
                };
                if resp_tx.send(response).is_err() {
                    break;
                }
            }
            info!("Fetch worker exiting");
        })
        .expect("Failed to spawn fetch worker thread");

    (
        WorkerDataSource { requests: req_tx },
        FetchWorker { responses: resp_rx },
    )
}
