//! beacon-state: embedded service store for Beacon.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! storage for the services Beacon tracks and their last probed status.
//!
//! # Architecture
//!
//! Service records are JSON-serialized into redb's `&[u8]` value columns,
//! keyed by their numeric id. A small metadata table holds the id counter,
//! so ids are never reused, even after deletes or restarts.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
