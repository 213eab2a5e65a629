//! REST API handlers.
//!
//! Each handler reads/writes via `StateStore` and returns JSON responses.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use beacon_state::*;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn location(id: ServiceId) -> [(header::HeaderName, String); 1] {
    [(header::LOCATION, format!("/api/v1/services/{id}"))]
}

/// Body for create and update.
#[derive(Debug, serde::Deserialize, serde::Serialize)]
pub struct ServiceRequest {
    pub name: String,
    pub url: String,
}

impl ServiceRequest {
    fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty");
        }
        if self.url.trim().is_empty() {
            return Err("url must not be empty");
        }
        Ok(())
    }
}

// ── Services ───────────────────────────────────────────────────

/// GET /api/v1/services
pub async fn list_services(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_services() {
        Ok(services) => ApiResponse::ok(services).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// GET /api/v1/services/:id
pub async fn get_service(
    State(state): State<ApiState>,
    Path(id): Path<ServiceId>,
) -> impl IntoResponse {
    match state.store.get_service(id) {
        Ok(Some(service)) => ApiResponse::ok(service).into_response(),
        Ok(None) => error_response("service not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// POST /api/v1/services
pub async fn create_service(
    State(state): State<ApiState>,
    Json(req): Json<ServiceRequest>,
) -> impl IntoResponse {
    if let Err(msg) = req.validate() {
        return error_response(msg, StatusCode::BAD_REQUEST).into_response();
    }
    match state.store.create_service(req.name.trim(), req.url.trim()) {
        Ok(service) => {
            tracing::info!(id = service.id, url = %service.url, "service registered");
            (StatusCode::CREATED, location(service.id), ApiResponse::ok(service)).into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// PUT /api/v1/services/:id
pub async fn update_service(
    State(state): State<ApiState>,
    Path(id): Path<ServiceId>,
    Json(req): Json<ServiceRequest>,
) -> impl IntoResponse {
    if let Err(msg) = req.validate() {
        return error_response(msg, StatusCode::BAD_REQUEST).into_response();
    }
    let updated = state
        .store
        .update_service(id, req.name.trim(), req.url.trim())
        .and_then(|found| if found { state.store.get_service(id) } else { Ok(None) });
    match updated {
        Ok(Some(service)) => (location(id), ApiResponse::ok(service)).into_response(),
        Ok(None) => error_response("service not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// DELETE /api/v1/services/:id
pub async fn delete_service(
    State(state): State<ApiState>,
    Path(id): Path<ServiceId>,
) -> impl IntoResponse {
    match state.store.delete_service(id) {
        Ok(true) => {
            tracing::info!(id, "service deleted");
            ApiResponse::ok("deleted").into_response()
        }
        Ok(false) => error_response("service not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

// ── Daemon ─────────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    ApiResponse::ok("ok")
}
