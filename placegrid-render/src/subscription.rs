use std::collections::BTreeSet;

use placegrid_core::PixelRect;
use tracing::debug;

use crate::tile::TileId;
use crate::tile_set::TileSet;
use crate::transport::Transport;

/// What a [`SubscriptionManager::reconcile`] call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub subscribed: Vec<TileId>,
    pub unsubscribed: Vec<TileId>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.subscribed.is_empty() && self.unsubscribed.is_empty()
    }
}

/// Keeps the set of subscribed tiles in line with the view.
///
/// A tile is subscribed once it touches the view itself, and only dropped
/// once it is further than the leave margin away. Between the two margins a
/// tile keeps whatever state it has, so small pans back and forth across a
/// tile edge do not cause any traffic.
#[derive(Debug, Clone)]
pub struct SubscriptionManager {
    active: BTreeSet<TileId>,
    /// Hysteresis margin in buffer pixels, per axis.
    leave_margin: [i64; 2],
}

impl SubscriptionManager {
    pub fn new(leave_margin: [i64; 2]) -> Self {
        Self {
            active: BTreeSet::new(),
            leave_margin,
        }
    }

    pub fn leave_margin(&self) -> [i64; 2] {
        self.leave_margin
    }

    pub fn set_leave_margin(&mut self, leave_margin: [i64; 2]) {
        self.leave_margin = leave_margin;
    }

    pub fn active(&self) -> &BTreeSet<TileId> {
        &self.active
    }

    pub fn is_active(&self, id: TileId) -> bool {
        self.active.contains(&id)
    }

    /// Tiles touching `view` grown by `margin` on every side.
    pub fn required_tiles(tiles: &TileSet, view: &PixelRect, margin: [i64; 2]) -> BTreeSet<TileId> {
        tiles.intersecting(&view.expanded(margin[0], margin[1]))
    }

    /// Drop active tiles outside `to_keep`, then add `to_subscribe`.
    ///
    /// Dropped tiles are invalidated so a later subscription refetches them.
    /// Each direction costs at most one transport call.
    pub fn reconcile<T>(
        &mut self,
        to_subscribe: &BTreeSet<TileId>,
        to_keep: &BTreeSet<TileId>,
        tiles: &mut TileSet,
        transport: &mut T,
    ) -> ReconcileReport
    where
        T: Transport + ?Sized,
    {
        let unsubscribed: Vec<TileId> = self.active.difference(to_keep).copied().collect();
        if !unsubscribed.is_empty() {
            for id in &unsubscribed {
                self.active.remove(id);
                tiles.invalidate(*id);
            }
            transport.unsubscribe(&unsubscribed);
        }

        let subscribed: Vec<TileId> = to_subscribe.difference(&self.active).copied().collect();
        if !subscribed.is_empty() {
            self.active.extend(subscribed.iter().copied());
            transport.subscribe(&subscribed);
        }

        if !unsubscribed.is_empty() || !subscribed.is_empty() {
            debug!(
                "Subscriptions: +{:?} -{:?}, {} active",
                subscribed,
                unsubscribed,
                self.active.len()
            );
        }
        ReconcileReport {
            subscribed,
            unsubscribed,
        }
    }

    /// Recompute both sets for `view` and reconcile.
    pub fn refresh<T>(
        &mut self,
        tiles: &mut TileSet,
        view: &PixelRect,
        transport: &mut T,
    ) -> ReconcileReport
    where
        T: Transport + ?Sized,
    {
        let strict = Self::required_tiles(tiles, view, [0, 0]);
        let keep = Self::required_tiles(tiles, view, self.leave_margin);
        self.reconcile(&strict, &keep, tiles, transport)
    }

    /// Unsubscribe from everything.
    pub fn clear<T>(&mut self, tiles: &mut TileSet, transport: &mut T) -> ReconcileReport
    where
        T: Transport + ?Sized,
    {
        self.reconcile(&BTreeSet::new(), &BTreeSet::new(), tiles, transport)
    }
}

#[cfg(test)]
mod tests {
    use placegrid_core::{BitsPerPixel, PixelPos};

    use super::*;
    use crate::tile_set::TileManifest;
    use crate::transport::PixelUpdate;

    #[derive(Debug, Default)]
    struct RecordingTransport {
        calls: Vec<(&'static str, Vec<TileId>)>,
    }

    impl Transport for RecordingTransport {
        fn subscribe(&mut self, ids: &[TileId]) {
            self.calls.push(("subscribe", ids.to_vec()));
        }
        fn unsubscribe(&mut self, ids: &[TileId]) {
            self.calls.push(("unsubscribe", ids.to_vec()));
        }
        fn send_pixel_update(&mut self, _update: PixelUpdate) {}
    }

    /// A single row of ten 10×10 tiles.
    fn row() -> TileSet {
        TileSet::from_manifest(&TileManifest::grid(
            PixelPos::ORIGIN,
            10,
            10,
            1,
            10,
            BitsPerPixel::new(1).unwrap(),
        ))
        .unwrap()
    }

    fn view(x: i64) -> PixelRect {
        PixelRect::from_origin_size(PixelPos::new(x, 0), 25, 10)
    }

    #[test]
    fn subscribes_visible_tiles_in_one_batch() {
        let mut tiles = row();
        let mut transport = RecordingTransport::default();
        let mut subs = SubscriptionManager::new([5, 5]);

        let report = subs.refresh(&mut tiles, &view(0), &mut transport);
        assert_eq!(report.subscribed, vec![0, 1, 2]);
        assert!(report.unsubscribed.is_empty());
        assert_eq!(transport.calls, vec![("subscribe", vec![0, 1, 2])]);

        // Nothing changes, nothing is sent.
        assert!(subs.refresh(&mut tiles, &view(0), &mut transport).is_empty());
        assert_eq!(transport.calls.len(), 1);
    }

    #[test]
    fn small_pans_near_an_edge_do_not_thrash() {
        let mut tiles = row();
        let mut transport = RecordingTransport::default();
        let mut subs = SubscriptionManager::new([5, 5]);
        subs.refresh(&mut tiles, &view(5), &mut transport);
        assert_eq!(subs.active().iter().copied().collect::<Vec<_>>(), vec![0, 1, 2]);

        // Tile 0 drops out of the strict set but stays within the margin.
        for x in [11, 5, 14, 7] {
            subs.refresh(&mut tiles, &view(x), &mut transport);
        }
        assert!(subs.is_active(0));
        assert!(transport.calls.iter().all(|(kind, _)| *kind == "subscribe"));
        assert_eq!(
            transport.calls.iter().filter(|(_, ids)| ids.contains(&0)).count(),
            1
        );

        // Far enough away and it goes.
        let report = subs.refresh(&mut tiles, &view(16), &mut transport);
        assert_eq!(report.unsubscribed, vec![0]);
        assert_eq!(report.subscribed, vec![4]);
        assert!(transport.calls.contains(&("unsubscribe", vec![0])));
    }

    #[test]
    fn unsubscribing_invalidates_and_runs_first() {
        let mut tiles = row();
        let mut transport = RecordingTransport::default();
        let mut subs = SubscriptionManager::new([0, 0]);
        subs.refresh(&mut tiles, &view(0), &mut transport);
        let generation = tiles.get(0).unwrap().generation();

        subs.refresh(&mut tiles, &view(50), &mut transport);
        assert_eq!(
            transport.calls[1..],
            [
                ("unsubscribe", vec![0, 1, 2]),
                ("subscribe", vec![5, 6, 7]),
            ]
        );
        assert_eq!(tiles.get(0).unwrap().generation(), generation + 1);
        assert_eq!(tiles.get(5).unwrap().generation(), 0);
    }

    #[test]
    fn clear_drops_everything() {
        let mut tiles = row();
        let mut transport = RecordingTransport::default();
        let mut subs = SubscriptionManager::new([0, 0]);
        subs.refresh(&mut tiles, &view(0), &mut transport);
        let report = subs.clear(&mut tiles, &mut transport);
        assert_eq!(report.unsubscribed, vec![0, 1, 2]);
        assert!(subs.active().is_empty());
    }
}
