//! beacon-poller: periodic reachability polling for tracked services.
//!
//! On every tick the scheduler reads the tracked services, probes all of
//! them concurrently with a bounded HTTP GET, and delivers one snapshot
//! (service id → OK/FAIL) once every probe has settled.
//!
//! # Architecture
//!
//! ```text
//! Scheduler (fixed interval, watch-based shutdown)
//!   ├── ServiceCatalog::list_tracked_services()      once per tick
//!   ├── PollOrchestrator::poll()                     one task per cycle
//!   │   ├── Prober::probe() per service              bounded by probe_timeout
//!   │   └── mpsc fan-in → single aggregator → Snapshot
//!   └── deliver(ResultSink, &Snapshot)
//!       ├── record_status() per service               → StateStore
//!       └── publish_snapshot() once                   → SnapshotHub subscribers
//! ```
//!
//! # Classification
//!
//! A probe is `OK` only when a response with an accepted status (default
//! 200 or 202) arrives before the deadline (default 5s). Malformed URLs,
//! connection errors, timeouts and any other status are `FAIL`. Nothing is
//! retried within a cycle.

pub mod catalog;
pub mod config;
pub mod error;
pub mod hub;
pub mod orchestrator;
pub mod probe;
pub mod scheduler;
pub mod sink;
pub mod types;

#[cfg(test)]
mod testing;

pub use catalog::ServiceCatalog;
pub use config::{OverlapPolicy, PollerConfig};
pub use error::PollError;
pub use hub::SnapshotHub;
pub use orchestrator::PollOrchestrator;
pub use probe::{http_probe, HttpProber, ProbeConfig, ProbeOutcome, ProbeTarget, Prober};
pub use scheduler::Scheduler;
pub use sink::{deliver, ResultSink, StoreSink};
pub use types::{Snapshot, TrackedService};
