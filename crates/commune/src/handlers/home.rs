use axum::Json;
use serde::Serialize;

/// Body of `GET /home/`.
#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub message: &'static str,
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /home/ - Public landing endpoint.
pub async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Welcome to the Community Platform API!",
        status: "online",
        version: env!("CARGO_PKG_VERSION"),
    })
}
