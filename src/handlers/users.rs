use crate::auth::{AuthRouterExt, AuthUser, Role};
use crate::errors::ApiError;
use crate::AppState;
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

/// Admin-only user moderation endpoints.
/// Gated at the router in addition to the service-level checks.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/:id/role", put(set_role))
        .route("/:id/activate", post(activate_user))
        .route("/:id/deactivate", post(deactivate_user))
        .with_role(Role::Admin)
}

async fn list_users(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.services.users.list_users(&user).await?;
    Ok(Json(users))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetRoleRequest {
    pub role: Role,
}

async fn set_role(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<SetRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .users
        .set_user_role(&user, id, payload.role)
        .await?;
    Ok(Json(updated))
}

async fn activate_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .users
        .set_user_active(&user, id, true)
        .await?;
    Ok(Json(updated))
}

async fn deactivate_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .users
        .set_user_active(&user, id, false)
        .await?;
    Ok(Json(updated))
}
