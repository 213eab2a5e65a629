//! Error types for the poller's collaborator boundary.
//!
//! Probe failures are never errors: they are classified as
//! [`ProbeOutcome::Fail`](crate::ProbeOutcome::Fail). Only the catalog and
//! sink sides of a cycle can report one.

use thiserror::Error;

/// Errors surfaced by catalogs and sinks.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("failed to list tracked services: {0}")]
    Catalog(String),

    #[error("failed to deliver poll results: {0}")]
    Sink(String),
}
