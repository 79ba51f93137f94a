use axum::{Json, http::StatusCode, response::IntoResponse};
use tracing::debug;

use super::error_responses::ErrorResponse;

pub async fn not_found() -> impl IntoResponse {
    debug!("backend router: no route matched");
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse { error: "not_found" }),
    )
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
