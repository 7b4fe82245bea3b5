//! JSON socket events: `{"type": "<name>", "data": <payload>}`.

use std::sync::mpsc::Sender;

use placegrid_core::ColorId;
use placegrid_render::{PixelUpdate, TileId, Transport};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPixelData {
    pub sec_id: TileId,
    pub pix_idx: usize,
    pub color_id: ColorId,
    /// Set by the server on broadcast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl From<PixelUpdate> for SetPixelData {
    fn from(u: PixelUpdate) -> Self {
        Self {
            sec_id: u.tile_id,
            pix_idx: u.pixel_index,
            color_id: u.color_id,
            timestamp: u.timestamp,
        }
    }
}

impl From<SetPixelData> for PixelUpdate {
    fn from(d: SetPixelData) -> Self {
        Self {
            tile_id: d.sec_id,
            pixel_index: d.pix_idx,
            color_id: d.color_id,
            timestamp: d.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum WireEvent {
    SetPixel(SetPixelData),
    Subscribe(Vec<TileId>),
    Unsubscribe(Vec<TileId>),
}

impl WireEvent {
    pub fn encode(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(AppError::Protocol)
    }

    /// Unknown event types and malformed payloads are errors.
    pub fn decode(message: &str) -> crate::Result<Self> {
        serde_json::from_str(message).map_err(AppError::Protocol)
    }
}

/// [`Transport`] that encodes every call as a [`WireEvent`] and hands the
/// text to whatever owns the socket.
#[derive(Debug, Clone)]
pub struct JsonTransport {
    outbox: Sender<String>,
}

impl JsonTransport {
    pub fn new(outbox: Sender<String>) -> Self {
        Self { outbox }
    }

    fn send(&mut self, event: WireEvent) {
        match event.encode() {
            Ok(text) => {
                if self.outbox.send(text).is_err() {
                    warn!("Socket closed, dropping {event:?}");
                }
            }
            Err(e) => warn!("Could not encode {event:?}: {e}"),
        }
    }
}

impl Transport for JsonTransport {
    fn subscribe(&mut self, tile_ids: &[TileId]) {
        self.send(WireEvent::Subscribe(tile_ids.to_vec()));
    }

    fn unsubscribe(&mut self, tile_ids: &[TileId]) {
        self.send(WireEvent::Unsubscribe(tile_ids.to_vec()));
    }

    fn send_pixel_update(&mut self, update: PixelUpdate) {
        self.send(WireEvent::SetPixel(update.into()));
    }
}
