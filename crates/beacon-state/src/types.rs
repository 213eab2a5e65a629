//! Domain types for the Beacon state store.

use serde::{Deserialize, Serialize};

/// Stable identifier of a tracked service.
pub type ServiceId = u64;

/// A service registered for health polling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    /// URL probed by the poller (e.g. `http://10.0.0.1:8080/health`).
    pub url: String,
    /// Outcome of the most recent completed poll cycle.
    pub status: ServiceStatus,
    /// Unix timestamp (seconds) when the service was registered.
    pub created_at: u64,
}

/// Last known reachability of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceStatus {
    /// Not probed yet.
    #[default]
    Unknown,
    Ok,
    Fail,
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ServiceStatus::Unknown => "UNKNOWN",
            ServiceStatus::Ok => "OK",
            ServiceStatus::Fail => "FAIL",
        };
        f.write_str(s)
    }
}
