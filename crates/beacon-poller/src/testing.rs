//! Shared fixtures for the poller's unit tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

/// Serve a handful of canned health endpoints on an ephemeral local port.
pub(crate) async fn spawn_endpoint_server() -> SocketAddr {
    let app = Router::new()
        .route("/ok", get(|| async { StatusCode::OK }))
        .route("/accepted", get(|| async { StatusCode::ACCEPTED }))
        .route("/no-content", get(|| async { StatusCode::NO_CONTENT }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route("/error", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                StatusCode::OK
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Open a store whose service 1 holds an undecodable record, so every read
/// of it fails.
pub(crate) fn corrupt_store(dir: &std::path::Path) -> beacon_state::StateStore {
    let path = dir.join("corrupt.redb");
    {
        let db = redb::Database::create(&path).unwrap();
        let txn = db.begin_write().unwrap();
        {
            let mut table = txn.open_table(beacon_state::tables::SERVICES).unwrap();
            table.insert(1u64, &b"not json"[..]).unwrap();
        }
        txn.commit().unwrap();
    }
    beacon_state::StateStore::open(&path).unwrap()
}
