//! Health check endpoints for Kubernetes-style liveness and readiness checks.
//!
//! - `/livez` - Basic liveness check (immediate 200, no checks)
//! - `/healthz` - Storage backend and tunnel status

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;
use crate::tunnel::TunnelStatus;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: &'static str,
    pub tunnel: TunnelStatus,
}

/// GET /livez - Basic liveness check.
///
/// Returns 200 immediately. Used to check if the server is accepting connections.
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /healthz - Reports the compiled-in storage backend and the tunnel
/// state captured at startup.
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        storage: state.storage,
        tunnel: state.tunnel.clone(),
    })
}
