//! Result sink: where completed snapshots go.
//!
//! The poller hands every completed snapshot to [`deliver`], which records
//! each service's status and then broadcasts the whole snapshot once. Sink
//! failures are logged; they never fail the cycle.

use tracing::{debug, warn};

use beacon_state::{ServiceId, StateStore};

use crate::error::PollError;
use crate::hub::SnapshotHub;
use crate::probe::ProbeOutcome;
use crate::types::Snapshot;

/// Receiver of poll results.
pub trait ResultSink: Send + Sync + 'static {
    /// Persist one service's outcome for the cycle.
    fn record_status(&self, id: ServiceId, outcome: ProbeOutcome) -> Result<(), PollError>;

    /// Broadcast the full snapshot for the cycle.
    fn publish_snapshot(&self, snapshot: &Snapshot) -> Result<(), PollError>;
}

/// Hand a completed snapshot to a sink: one `record_status` per entry,
/// then a single `publish_snapshot`.
pub fn deliver<S: ResultSink + ?Sized>(sink: &S, snapshot: &Snapshot) {
    for (id, outcome) in snapshot.iter() {
        if let Err(e) = sink.record_status(id, outcome) {
            warn!(service_id = id, error = %e, "failed to record service status");
        }
    }
    if let Err(e) = sink.publish_snapshot(snapshot) {
        warn!(error = %e, "failed to publish snapshot");
    }
}

/// Production sink: status goes to the state store, snapshots to the hub.
#[derive(Clone)]
pub struct StoreSink {
    store: StateStore,
    hub: SnapshotHub,
}

impl StoreSink {
    pub fn new(store: StateStore, hub: SnapshotHub) -> Self {
        Self { store, hub }
    }
}

impl ResultSink for StoreSink {
    fn record_status(&self, id: ServiceId, outcome: ProbeOutcome) -> Result<(), PollError> {
        let found = self
            .store
            .update_status(id, outcome.into())
            .map_err(|e| PollError::Sink(e.to_string()))?;
        if !found {
            // Deleted while its probe was in flight.
            debug!(service_id = id, "service gone before status update");
        }
        Ok(())
    }

    fn publish_snapshot(&self, snapshot: &Snapshot) -> Result<(), PollError> {
        self.hub.publish(snapshot.clone());
        Ok(())
    }
}
