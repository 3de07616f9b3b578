//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub version: &'static str,
}

/// `GET /api/health`: liveness plus the configured backend name.
///
/// Does not probe the backend; a reachable server with an unreachable
/// model still reports `ok`.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: ctx.backend.name(),
        version: crate::config::APP_VERSION,
    })
}
