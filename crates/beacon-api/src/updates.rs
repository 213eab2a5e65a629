//! Live status updates over server-sent events.
//!
//! Each subscriber gets one `snapshot` event per completed poll cycle, with
//! the snapshot as JSON data (`{"1":"OK","2":"FAIL"}`).

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::ApiState;

/// GET /api/v1/updates
pub async fn snapshot_updates(
    State(state): State<ApiState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.hub.subscribe();
    debug!(subscribers = state.hub.subscriber_count(), "updates subscriber connected");

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(snapshot) => match Event::default().event("snapshot").json_data(&snapshot) {
                    Ok(event) => return Some((Ok::<_, Infallible>(event), rx)),
                    Err(e) => warn!(error = %e, "failed to encode snapshot event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "updates subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use beacon_poller::{ProbeOutcome, Snapshot, SnapshotHub};
    use beacon_state::StateStore;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::build_router;

    #[tokio::test]
    async fn streams_published_snapshots() {
        let hub = SnapshotHub::default();
        let router = build_router(StateStore::open_in_memory().unwrap(), hub.clone());

        let req = Request::builder()
            .uri("/api/v1/updates")
            .body(Body::empty())
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/event-stream");
        assert_eq!(hub.subscriber_count(), 1);

        let snapshot: Snapshot = [(1, ProbeOutcome::Ok), (2, ProbeOutcome::Fail)]
            .into_iter()
            .collect();
        hub.publish(snapshot);

        let mut body = resp.into_body();
        let frame = body.frame().await.unwrap().unwrap();
        let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
        assert!(text.contains("event: snapshot"), "{text}");
        assert!(text.contains(r#"data: {"1":"OK","2":"FAIL"}"#), "{text}");
    }
}
