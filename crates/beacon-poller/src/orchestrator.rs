//! Poll orchestrator: fan out one probe per service, fan in one snapshot.
//!
//! Each cycle gets its own `mpsc` channel. Every probe task sends exactly
//! one `(id, outcome)` message; the cycle's aggregator is the only owner of
//! the result map and the arrival count, so concurrent completions never
//! race and the snapshot is produced exactly once, when the last message
//! arrives. Overlapping cycles share nothing.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use beacon_state::ServiceId;

use crate::probe::{ProbeOutcome, Prober};
use crate::types::{Snapshot, TrackedService};

/// Runs poll cycles with a given prober.
pub struct PollOrchestrator<P> {
    prober: Arc<P>,
    probe_timeout: Duration,
}

impl<P> Clone for PollOrchestrator<P> {
    fn clone(&self) -> Self {
        Self {
            prober: Arc::clone(&self.prober),
            probe_timeout: self.probe_timeout,
        }
    }
}

impl<P: Prober> PollOrchestrator<P> {
    /// Create an orchestrator. `probe_timeout` bounds every probe it launches.
    pub fn new(prober: P, probe_timeout: Duration) -> Self {
        Self {
            prober: Arc::new(prober),
            probe_timeout,
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Probe every service concurrently and return once all have settled.
    ///
    /// The result holds exactly one entry per submitted id. An empty input
    /// completes immediately with an empty snapshot.
    pub async fn poll(&self, services: Vec<TrackedService>) -> Snapshot {
        if services.is_empty() {
            return Snapshot::default();
        }

        let expected = services.len();
        let submitted: Vec<ServiceId> = services.iter().map(|s| s.id).collect();
        let (tx, mut rx) = mpsc::channel::<(ServiceId, ProbeOutcome)>(expected);

        for service in services {
            let tx = tx.clone();
            let prober = Arc::clone(&self.prober);
            let deadline = self.probe_timeout;
            tokio::spawn(async move {
                // The probe future is dropped on timeout, so a late response
                // can never produce a second message.
                let outcome = match tokio::time::timeout(deadline, prober.probe(&service.url)).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        debug!(service_id = service.id, url = %service.url, "probe abandoned at deadline");
                        ProbeOutcome::Fail
                    }
                };
                let _ = tx.send((service.id, outcome)).await;
            });
        }
        // Only the probe tasks hold senders now; the channel closes when the
        // last of them finishes.
        drop(tx);

        let mut outcomes = BTreeMap::new();
        let mut received = 0;
        while received < expected {
            match rx.recv().await {
                Some((id, outcome)) => {
                    outcomes.insert(id, outcome);
                    received += 1;
                }
                None => {
                    warn!(
                        missing = expected - received,
                        "probe tasks exited without reporting; marking their services FAIL"
                    );
                    break;
                }
            }
        }

        for id in submitted {
            outcomes.entry(id).or_insert(ProbeOutcome::Fail);
        }

        Snapshot::from(outcomes)
    }

    /// Start a cycle in the background; the receiver resolves exactly once
    /// with the completed snapshot.
    pub fn spawn_cycle(&self, services: Vec<TrackedService>) -> oneshot::Receiver<Snapshot> {
        let (done_tx, done_rx) = oneshot::channel();
        let orchestrator = self.clone();
        tokio::spawn(async move {
            let snapshot = orchestrator.poll(services).await;
            let _ = done_tx.send(snapshot);
        });
        done_rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::future::Future;

    use crate::probe::{HttpProber, ProbeConfig};
    use crate::testing::spawn_endpoint_server;

    /// How a scripted endpoint behaves.
    #[derive(Clone, Copy)]
    enum Step {
        After(Duration, ProbeOutcome),
        Never,
        Panic,
    }

    #[derive(Default)]
    struct ScriptedProber {
        plan: HashMap<String, Step>,
    }

    impl ScriptedProber {
        fn with(mut self, url: &str, step: Step) -> Self {
            self.plan.insert(url.to_string(), step);
            self
        }
    }

    impl Prober for ScriptedProber {
        fn probe(&self, url: &str) -> impl Future<Output = ProbeOutcome> + Send {
            let step = self.plan.get(url).copied();
            async move {
                match step {
                    Some(Step::After(delay, outcome)) => {
                        tokio::time::sleep(delay).await;
                        outcome
                    }
                    Some(Step::Never) => std::future::pending().await,
                    Some(Step::Panic) => panic!("scripted probe panic"),
                    None => ProbeOutcome::Fail,
                }
            }
        }
    }

    fn services(urls: &[&str]) -> Vec<TrackedService> {
        urls.iter()
            .enumerate()
            .map(|(i, url)| TrackedService::new(i as ServiceId + 1, *url))
            .collect()
    }

    const TIMEOUT: Duration = Duration::from_millis(5000);

    #[tokio::test(start_paused = true)]
    async fn empty_input_completes_immediately() {
        let orchestrator = PollOrchestrator::new(ScriptedProber::default(), TIMEOUT);

        let started = tokio::time::Instant::now();
        let snapshot = orchestrator.poll(Vec::new()).await;

        assert!(snapshot.is_empty());
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_waits_for_slowest_probe() {
        let prober = ScriptedProber::default()
            .with("http://a.test/health", Step::After(Duration::from_millis(10), ProbeOutcome::Ok))
            .with("http://b.test/health", Step::Never);
        let orchestrator = PollOrchestrator::new(prober, TIMEOUT);

        let started = tokio::time::Instant::now();
        let snapshot = orchestrator
            .poll(services(&["http://a.test/health", "http://b.test/health"]))
            .await;
        let elapsed = started.elapsed();

        assert_eq!(snapshot.get(1), Some(ProbeOutcome::Ok));
        assert_eq!(snapshot.get(2), Some(ProbeOutcome::Fail));
        assert_eq!(snapshot.len(), 2);
        assert!(elapsed >= TIMEOUT, "emitted after {elapsed:?}");
        assert!(elapsed < TIMEOUT + Duration::from_millis(100), "emitted after {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn late_response_after_deadline_stays_fail() {
        let prober = ScriptedProber::default().with(
            "http://late.test",
            Step::After(Duration::from_secs(6), ProbeOutcome::Ok),
        );
        let orchestrator = PollOrchestrator::new(prober, TIMEOUT);

        let snapshot = orchestrator.poll(services(&["http://late.test"])).await;
        assert_eq!(snapshot.get(1), Some(ProbeOutcome::Fail));

        // Let the abandoned probe's original completion time pass.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(snapshot.get(1), Some(ProbeOutcome::Fail));
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cycle_is_bounded_by_slowest_probe_not_sum() {
        let urls: Vec<String> = (0..20).map(|i| format!("http://never-{i}.test")).collect();
        let prober = urls
            .iter()
            .fold(ScriptedProber::default(), |p, url| p.with(url, Step::Never));
        let orchestrator = PollOrchestrator::new(prober, TIMEOUT);
        let refs: Vec<&str> = urls.iter().map(String::as_str).collect();

        let started = tokio::time::Instant::now();
        let snapshot = orchestrator.poll(services(&refs)).await;

        assert_eq!(snapshot.len(), 20);
        assert_eq!(snapshot.count(ProbeOutcome::Fail), 20);
        assert!(started.elapsed() < TIMEOUT * 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn simultaneous_completions_produce_one_full_snapshot() {
        let urls: Vec<String> = (0..50).map(|i| format!("http://svc-{i}.test")).collect();
        let prober = urls.iter().enumerate().fold(ScriptedProber::default(), |p, (i, url)| {
            let outcome = if i % 3 == 0 { ProbeOutcome::Fail } else { ProbeOutcome::Ok };
            p.with(url, Step::After(Duration::from_millis(1), outcome))
        });
        let orchestrator = PollOrchestrator::new(prober, TIMEOUT);
        let refs: Vec<&str> = urls.iter().map(String::as_str).collect();

        let snapshot = orchestrator.spawn_cycle(services(&refs)).await.unwrap();

        assert_eq!(snapshot.len(), 50);
        for id in 1..=50u64 {
            let expected = if (id - 1) % 3 == 0 { ProbeOutcome::Fail } else { ProbeOutcome::Ok };
            assert_eq!(snapshot.get(id), Some(expected), "service {id}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_cycles_do_not_share_results() {
        let prober = ScriptedProber::default()
            .with("http://slow.test", Step::After(Duration::from_secs(3), ProbeOutcome::Ok))
            .with("http://fast.test", Step::After(Duration::from_millis(5), ProbeOutcome::Fail));
        let orchestrator = PollOrchestrator::new(prober, TIMEOUT);

        let first = orchestrator.spawn_cycle(vec![TrackedService::new(1, "http://slow.test")]);
        let second = orchestrator.spawn_cycle(vec![TrackedService::new(2, "http://fast.test")]);

        let second = second.await.unwrap();
        let first = first.await.unwrap();

        assert_eq!(first.iter().collect::<Vec<_>>(), vec![(1, ProbeOutcome::Ok)]);
        assert_eq!(second.iter().collect::<Vec<_>>(), vec![(2, ProbeOutcome::Fail)]);
    }

    #[tokio::test]
    async fn panicking_probe_is_recorded_as_fail() {
        let prober = ScriptedProber::default()
            .with("http://ok.test", Step::After(Duration::ZERO, ProbeOutcome::Ok))
            .with("http://boom.test", Step::Panic);
        let orchestrator = PollOrchestrator::new(prober, TIMEOUT);

        let snapshot = orchestrator
            .poll(services(&["http://ok.test", "http://boom.test"]))
            .await;

        assert_eq!(snapshot.get(1), Some(ProbeOutcome::Ok));
        assert_eq!(snapshot.get(2), Some(ProbeOutcome::Fail));
    }

    #[tokio::test]
    async fn malformed_url_fails_only_its_own_service() {
        let addr = spawn_endpoint_server().await;
        let orchestrator = PollOrchestrator::new(HttpProber::new(ProbeConfig::default()), TIMEOUT);

        let ok_url = format!("http://{addr}/ok");
        let accepted_url = format!("http://{addr}/accepted");
        let snapshot = orchestrator
            .poll(services(&[ok_url.as_str(), "http://exa mple.test/health", accepted_url.as_str()]))
            .await;

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.get(1), Some(ProbeOutcome::Ok));
        assert_eq!(snapshot.get(2), Some(ProbeOutcome::Fail));
        assert_eq!(snapshot.get(3), Some(ProbeOutcome::Ok));
    }

    #[tokio::test]
    async fn real_endpoints_are_classified() {
        let addr = spawn_endpoint_server().await;
        let config = ProbeConfig {
            timeout: Duration::from_millis(300),
            ..ProbeConfig::default()
        };
        let orchestrator = PollOrchestrator::new(HttpProber::new(config), Duration::from_millis(300));

        let urls: Vec<String> = ["/ok", "/error", "/slow", "/accepted"]
            .iter()
            .map(|p| format!("http://{addr}{p}"))
            .collect();
        let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
        let snapshot = orchestrator.poll(services(&refs)).await;

        assert_eq!(
            snapshot.iter().collect::<Vec<_>>(),
            vec![
                (1, ProbeOutcome::Ok),
                (2, ProbeOutcome::Fail),
                (3, ProbeOutcome::Fail),
                (4, ProbeOutcome::Ok),
            ]
        );
    }
}
