use axum::{http::StatusCode, response::Response};

use crate::{
    core::http::response_envelope::ApiResponse, routes::health::health_response::HealthResponse,
};

/// GET /health
///
/// Liveness only; Jira and GitLab are not contacted.
pub async fn health() -> Response {
    ApiResponse::success(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
    .into_response_with_status(StatusCode::OK)
}
