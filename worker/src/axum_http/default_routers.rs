use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::debug;

/// Internal callers parse every reply as JSON, including misses.
pub async fn not_found() -> impl IntoResponse {
    debug!("worker router: no internal route matched");
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not_found" })))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok", "service": "worker" })))
}
