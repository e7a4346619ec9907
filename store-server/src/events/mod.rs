//! Catalog change events
//!
//! Write paths publish a [`CatalogChange`] strictly AFTER their database work
//! has committed — the index synchronizer can never observe data that might
//! still roll back. Delivery is an in-process broadcast channel; a lagged
//! consumer recovers via a full re-index sweep rather than replay.

use shared::models::CatalogChange;
use tokio::sync::broadcast;

/// Channel capacity — sized for burst imports without lagging the consumer.
const EVENT_CHANNEL_CAPACITY: usize = 4096;

#[derive(Clone)]
pub struct ChangeEventBus {
    tx: broadcast::Sender<CatalogChange>,
}

impl Default for ChangeEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeEventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish a change. Call only after the originating transaction has
    /// committed. No receivers is fine (e.g. synchronizer not started in
    /// tests) — the event is dropped and logged.
    pub fn publish(&self, change: CatalogChange) {
        let kind = change.kind;
        let book_id = change.book_id;
        if self.tx.send(change).is_err() {
            tracing::debug!(?kind, book_id, "Catalog change dropped: no active receivers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogChange> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::ChangeKind;

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let bus = ChangeEventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(CatalogChange::deleted(42));
        let change = rx.recv().await.unwrap();
        assert_eq!(change.kind, ChangeKind::Deleted);
        assert_eq!(change.book_id, 42);
    }

    #[test]
    fn publish_without_receivers_does_not_panic() {
        let bus = ChangeEventBus::new();
        bus.publish(CatalogChange::deleted(7));
    }
}
