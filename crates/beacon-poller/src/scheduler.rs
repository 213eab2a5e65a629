//! Poll scheduler: starts a cycle on every tick of a fixed interval.
//!
//! Each tick reads the current service list from the catalog, so services
//! added or removed between ticks are picked up on the next cycle. Cycles
//! run as their own tasks: a slow cycle never delays the next tick, and
//! with [`OverlapPolicy::Allow`] two cycles may be in flight at once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::catalog::ServiceCatalog;
use crate::config::{OverlapPolicy, PollerConfig, MAX_DURATION, MIN_INTERVAL};
use crate::error::PollError;
use crate::orchestrator::PollOrchestrator;
use crate::probe::{ProbeOutcome, Prober};
use crate::sink::{deliver, ResultSink};
use crate::types::{Snapshot, TrackedService};

/// Drives poll cycles from a catalog into a sink.
pub struct Scheduler<C, P, S> {
    catalog: Arc<C>,
    sink: Arc<S>,
    orchestrator: PollOrchestrator<P>,
    interval: Duration,
    overlap: OverlapPolicy,
}

impl<C, P, S> Scheduler<C, P, S>
where
    C: ServiceCatalog,
    P: Prober,
    S: ResultSink,
{
    /// The interval is clamped to `MIN_INTERVAL..=MAX_DURATION`.
    pub fn new(catalog: Arc<C>, prober: P, sink: Arc<S>, config: &PollerConfig) -> Self {
        let interval = config.interval.clamp(MIN_INTERVAL, MAX_DURATION);
        if interval != config.interval {
            warn!(configured = ?config.interval, using = ?interval, "poll interval out of range, clamped");
        }
        Self {
            catalog,
            sink,
            orchestrator: PollOrchestrator::new(prober, config.probe_timeout),
            interval,
            overlap: config.overlap,
        }
    }

    /// Run the tick loop until the shutdown signal changes.
    ///
    /// The first cycle starts one full interval after this is called.
    /// Cycles still in flight at shutdown are left to finish on their own.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval = ?self.interval,
            probe_timeout = ?self.orchestrator.probe_timeout(),
            overlap = ?self.overlap,
            "poll scheduler started"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cycle: u64 = 0;
        let mut in_flight: Option<JoinHandle<()>> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    cycle += 1;
                    let busy = in_flight.as_ref().is_some_and(|h| !h.is_finished());
                    if busy && self.overlap == OverlapPolicy::Skip {
                        warn!(cycle, "previous poll cycle still running, skipping tick");
                        continue;
                    }
                    if let Some(handle) = self.start_cycle(cycle) {
                        in_flight = Some(handle);
                    }
                }
                _ = shutdown.changed() => {
                    info!("poll scheduler shutting down");
                    break;
                }
            }
        }
    }

    /// Run one cycle inline: fetch, probe, deliver.
    pub async fn run_cycle(&self) -> Result<Snapshot, PollError> {
        let services = self.catalog.list_tracked_services()?;
        Ok(execute_cycle(self.orchestrator.clone(), Arc::clone(&self.sink), services, 0).await)
    }

    /// Fetch the service list and spawn the cycle. A failed fetch skips it.
    fn start_cycle(&self, cycle: u64) -> Option<JoinHandle<()>> {
        let services = match self.catalog.list_tracked_services() {
            Ok(services) => services,
            Err(e) => {
                warn!(cycle, error = %e, "could not list services, skipping poll cycle");
                return None;
            }
        };

        debug!(cycle, services = services.len(), "poll cycle starting");
        let orchestrator = self.orchestrator.clone();
        let sink = Arc::clone(&self.sink);
        Some(tokio::spawn(async move {
            execute_cycle(orchestrator, sink, services, cycle).await;
        }))
    }
}

async fn execute_cycle<P: Prober, S: ResultSink>(
    orchestrator: PollOrchestrator<P>,
    sink: Arc<S>,
    services: Vec<TrackedService>,
    cycle: u64,
) -> Snapshot {
    let started = Instant::now();
    let snapshot = orchestrator.poll(services).await;
    deliver(sink.as_ref(), &snapshot);

    info!(
        cycle,
        services = snapshot.len(),
        ok = snapshot.count(ProbeOutcome::Ok),
        fail = snapshot.count(ProbeOutcome::Fail),
        elapsed = ?started.elapsed(),
        "poll cycle complete"
    );
    snapshot
}
