use crate::auth::AuthUser;
use crate::errors::ApiError;
use crate::handlers::common::no_content_response;
use crate::services::wifi::{CreateWifiInput, UpdateWifiInput};
use crate::AppState;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post, put},
    Router,
};

/// Creates the router for WiFi credential management.
/// Listing a business's networks lives under /businesses/:id/wifi.
pub fn wifi_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_network))
        .route("/:id", put(update_network))
        .route("/:id", delete(delete_network))
}

async fn create_network(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateWifiInput>,
) -> Result<impl IntoResponse, ApiError> {
    let network = state.services.wifi.create_network(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(network)))
}

async fn update_network(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateWifiInput>,
) -> Result<impl IntoResponse, ApiError> {
    let network = state
        .services
        .wifi
        .update_network(&user, id, payload)
        .await?;
    Ok(Json(network))
}

async fn delete_network(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.wifi.delete_network(&user, id).await?;
    Ok(no_content_response())
}
