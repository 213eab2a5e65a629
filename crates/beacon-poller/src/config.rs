//! Poller configuration.
//!
//! Deserialized from the `[poller]` table of `beacon.toml`. Durations are
//! written as strings like `"10s"`, `"5000ms"` or `"1m"`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::probe::ProbeConfig;

/// Default time between poll cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Default per-probe deadline.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Status codes counted as reachable unless configured otherwise.
pub const DEFAULT_ACCEPTED_STATUSES: [u16; 2] = [200, 202];

/// Port probed when a service URL doesn't name one.
pub const DEFAULT_PORT: u16 = 80;

/// Shortest poll interval the scheduler will tick at.
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound for any configured interval or timeout.
pub const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// What the scheduler does when a tick fires while the previous cycle
/// is still collecting results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Start the new cycle anyway. Each cycle aggregates independently.
    #[default]
    Allow,
    /// Skip the tick.
    Skip,
}

/// Timing and classification settings for the poll loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Time between cycle starts.
    #[serde(with = "duration_str")]
    pub interval: Duration,
    /// Deadline for a single probe.
    #[serde(with = "duration_str")]
    pub probe_timeout: Duration,
    /// HTTP status codes classified as OK.
    pub accepted_statuses: Vec<u16>,
    /// Port used when the service URL has none.
    pub default_port: u16,
    pub overlap: OverlapPolicy,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            accepted_statuses: DEFAULT_ACCEPTED_STATUSES.to_vec(),
            default_port: DEFAULT_PORT,
            overlap: OverlapPolicy::Allow,
        }
    }
}

impl PollerConfig {
    /// The subset of settings the probe executor needs.
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            timeout: self.probe_timeout,
            accepted_statuses: self.accepted_statuses.clone(),
            default_port: self.default_port,
        }
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
///
/// A bare number is read as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.trim().parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.trim().parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

/// Parse a duration usable as a timer period: non-zero and no longer
/// than [`MAX_DURATION`].
pub fn parse_period(s: &str) -> Result<Duration, String> {
    match parse_duration(s) {
        None => Err(format!("invalid duration {s:?}")),
        Some(d) if d.is_zero() => Err(format!("duration {s:?} must be greater than zero")),
        Some(d) if d > MAX_DURATION => Err(format!("duration {s:?} exceeds 24h")),
        Some(d) => Ok(d),
    }
}

/// serde adapter for human-readable duration strings.
mod duration_str {
    use std::time::Duration;

    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}ms", d.as_millis()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_period(&s).map_err(de::Error::custom)
    }
}
