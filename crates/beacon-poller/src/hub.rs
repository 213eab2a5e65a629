//! Snapshot broadcast hub: fan completed snapshots out to subscribers.

use tokio::sync::broadcast;
use tracing::trace;

use crate::types::Snapshot;

/// Default number of snapshots a slow subscriber may fall behind by.
pub const DEFAULT_HUB_CAPACITY: usize = 16;

/// Cloneable handle to the snapshot broadcast channel.
///
/// Publishing with no subscribers is not an error; subscribers that fall
/// more than `capacity` snapshots behind skip ahead.
#[derive(Clone)]
pub struct SnapshotHub {
    tx: broadcast::Sender<Snapshot>,
}

impl SnapshotHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Publish a snapshot; returns how many subscribers received it.
    pub fn publish(&self, snapshot: Snapshot) -> usize {
        let delivered = self.tx.send(snapshot).unwrap_or(0);
        trace!(subscribers = delivered, "snapshot broadcast");
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SnapshotHub {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_CAPACITY)
    }
}
