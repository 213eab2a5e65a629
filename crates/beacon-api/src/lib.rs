//! beacon-api: REST API for Beacon.
//!
//! Provides axum route handlers for managing tracked services and a
//! server-sent events stream that pushes every completed poll snapshot.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/services` | List all services |
//! | POST | `/api/v1/services` | Register a service |
//! | GET | `/api/v1/services/{id}` | Get a service |
//! | PUT | `/api/v1/services/{id}` | Rename / re-target a service |
//! | DELETE | `/api/v1/services/{id}` | Delete a service |
//! | GET | `/api/v1/updates` | SSE stream of poll snapshots |
//! | GET | `/healthz` | Daemon liveness |

pub mod handlers;
pub mod updates;

use axum::Router;
use axum::routing::get;
use beacon_poller::SnapshotHub;
use beacon_state::StateStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
    pub hub: SnapshotHub,
}

/// Build the complete API router.
pub fn build_router(store: StateStore, hub: SnapshotHub) -> Router {
    let api_state = ApiState { store, hub };

    let api_routes = Router::new()
        .route("/services", get(handlers::list_services).post(handlers::create_service))
        .route(
            "/services/{id}",
            get(handlers::get_service)
                .put(handlers::update_service)
                .delete(handlers::delete_service),
        )
        .route("/updates", get(updates::snapshot_updates))
        .with_state(api_state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(handlers::healthz))
}
