//! Probe executor: one bounded HTTP GET per service, classified as OK/FAIL.
//!
//! Every failure mode (bad URL, DNS, refused connection, handshake error,
//! timeout, unexpected status) folds into [`ProbeOutcome::Fail`]; the probe
//! never returns an error to its caller.

use std::future::Future;
use std::time::Duration;

use http::Uri;
use serde::{Deserialize, Serialize};
use tracing::debug;

use beacon_state::ServiceStatus;

use crate::config::{DEFAULT_ACCEPTED_STATUSES, DEFAULT_PORT, DEFAULT_PROBE_TIMEOUT};

/// Result of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeOutcome {
    /// A response with an accepted status arrived before the deadline.
    Ok,
    /// Anything else.
    Fail,
}

impl From<ProbeOutcome> for ServiceStatus {
    fn from(outcome: ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Ok => ServiceStatus::Ok,
            ProbeOutcome::Fail => ServiceStatus::Fail,
        }
    }
}

/// Settings for a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub timeout: Duration,
    pub accepted_statuses: Vec<u16>,
    pub default_port: u16,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
            accepted_statuses: DEFAULT_ACCEPTED_STATUSES.to_vec(),
            default_port: DEFAULT_PORT,
        }
    }
}

impl ProbeConfig {
    fn accepts(&self, status: http::StatusCode) -> bool {
        self.accepted_statuses.contains(&status.as_u16())
    }
}

/// Where a probe connects and what it requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
    /// Origin-form request target, e.g. `/health?deep=1`.
    pub path: String,
}

impl ProbeTarget {
    /// Parse a service URL. Returns `None` when there is no host to dial.
    ///
    /// The scheme is ignored: probes always speak plain HTTP/1.1, and a URL
    /// without an explicit port is dialed on `default_port`.
    pub fn parse(url: &str, default_port: u16) -> Option<Self> {
        let uri: Uri = url.trim().parse().ok()?;
        let host = uri.host().filter(|h| !h.is_empty())?.to_string();
        let port = uri.port_u16().unwrap_or(default_port);
        let path = match uri.path_and_query().map(|pq| pq.as_str()) {
            Some(pq) if !pq.is_empty() => pq.to_string(),
            _ => "/".to_string(),
        };
        Some(Self { host, port, path })
    }

    /// `host:port` for dialing (IPv6 hosts keep their brackets).
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `Host` header value; the port is omitted when it is 80.
    pub fn host_header(&self) -> String {
        if self.port == 80 {
            self.host.clone()
        } else {
            self.address()
        }
    }
}

/// Something that can classify a service URL.
///
/// The orchestrator is generic over this so cycles can be driven without
/// a network in tests.
pub trait Prober: Send + Sync + 'static {
    fn probe(&self, url: &str) -> impl Future<Output = ProbeOutcome> + Send;
}

/// The production prober: a real HTTP GET via [`http_probe`].
#[derive(Debug, Clone, Default)]
pub struct HttpProber {
    config: ProbeConfig,
}

impl HttpProber {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }
}

impl Prober for HttpProber {
    fn probe(&self, url: &str) -> impl Future<Output = ProbeOutcome> + Send {
        http_probe(url, &self.config)
    }
}

/// Perform an HTTP health probe against a service URL.
///
/// Returns `Ok` only if a response with an accepted status arrives within
/// `config.timeout`. Makes exactly one attempt.
pub async fn http_probe(url: &str, config: &ProbeConfig) -> ProbeOutcome {
    let Some(target) = ProbeTarget::parse(url, config.default_port) else {
        debug!(%url, "health probe target is not a valid URL");
        return ProbeOutcome::Fail;
    };

    match tokio::time::timeout(config.timeout, send_probe(url, &target, config)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            debug!(%url, timeout = ?config.timeout, "health probe timed out");
            ProbeOutcome::Fail
        }
    }
}

async fn send_probe(url: &str, target: &ProbeTarget, config: &ProbeConfig) -> ProbeOutcome {
    let stream = match tokio::net::TcpStream::connect(target.address()).await {
        Ok(s) => s,
        Err(e) => {
            debug!(error = %e, %url, "health probe connection failed");
            return ProbeOutcome::Fail;
        }
    };

    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = match hyper::client::conn::http1::handshake(io).await {
        Ok(pair) => pair,
        Err(e) => {
            debug!(error = %e, %url, "health probe handshake failed");
            return ProbeOutcome::Fail;
        }
    };

    // Drive the connection in the background.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let req = match http::Request::builder()
        .method(http::Method::GET)
        .uri(target.path.as_str())
        .header(http::header::HOST, target.host_header())
        .header(http::header::USER_AGENT, "beacon-poller/0.1")
        .header(http::header::CONNECTION, "close")
        .body(http_body_util::Empty::<bytes::Bytes>::new())
    {
        Ok(req) => req,
        Err(e) => {
            debug!(error = %e, %url, "health probe request could not be built");
            return ProbeOutcome::Fail;
        }
    };

    match sender.send_request(req).await {
        Ok(resp) if config.accepts(resp.status()) => ProbeOutcome::Ok,
        Ok(resp) => {
            debug!(status = %resp.status(), %url, "health probe status not accepted");
            ProbeOutcome::Fail
        }
        Err(e) => {
            debug!(error = %e, %url, "health probe request failed");
            ProbeOutcome::Fail
        }
    }
}
