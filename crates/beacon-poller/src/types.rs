//! Values exchanged across a poll cycle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use beacon_state::{Service, ServiceId};

use crate::probe::ProbeOutcome;

/// The part of a service record a cycle needs: who, and where to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedService {
    pub id: ServiceId,
    pub url: String,
}

impl TrackedService {
    pub fn new(id: ServiceId, url: impl Into<String>) -> Self {
        Self { id, url: url.into() }
    }
}

impl From<&Service> for TrackedService {
    fn from(service: &Service) -> Self {
        Self::new(service.id, service.url.clone())
    }
}

/// Outcome of one completed cycle: one entry per submitted service.
///
/// Serializes as a plain JSON object, e.g. `{"1":"OK","2":"FAIL"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    outcomes: BTreeMap<ServiceId, ProbeOutcome>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, id: ServiceId) -> Option<ProbeOutcome> {
        self.outcomes.get(&id).copied()
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (ServiceId, ProbeOutcome)> + '_ {
        self.outcomes.iter().map(|(id, outcome)| (*id, *outcome))
    }

    /// Number of entries with the given outcome.
    pub fn count(&self, outcome: ProbeOutcome) -> usize {
        self.outcomes.values().filter(|o| **o == outcome).count()
    }
}

impl From<BTreeMap<ServiceId, ProbeOutcome>> for Snapshot {
    fn from(outcomes: BTreeMap<ServiceId, ProbeOutcome>) -> Self {
        Self { outcomes }
    }
}

impl FromIterator<(ServiceId, ProbeOutcome)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (ServiceId, ProbeOutcome)>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}
