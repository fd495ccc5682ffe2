use axum::{
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;

/// Liveness probe: the process is up and serving
pub async fn simple_health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Stateless health endpoints; the DB-backed readiness check lives on the
/// main API router where the pool is available
pub fn health_routes() -> Router {
    Router::new()
        .route("/", get(simple_health_check))
        .route("/live", get(simple_health_check))
}
