//! Service catalog: where each cycle reads the services to probe.

use beacon_state::StateStore;

use crate::error::PollError;
use crate::types::TrackedService;

/// Source of the services to probe, read once per scheduler tick.
pub trait ServiceCatalog: Send + Sync + 'static {
    fn list_tracked_services(&self) -> Result<Vec<TrackedService>, PollError>;
}

impl ServiceCatalog for StateStore {
    fn list_tracked_services(&self) -> Result<Vec<TrackedService>, PollError> {
        let services = self
            .list_services()
            .map_err(|e| PollError::Catalog(e.to_string()))?;
        Ok(services.iter().map(TrackedService::from).collect())
    }
}
