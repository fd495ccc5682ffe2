use crate::auth::{AuthRouterExt, AuthUser, Role};
use crate::errors::ApiError;
use crate::handlers::common::{
    no_content_response, normalize_optional_string, normalize_string, validate_input,
};
use crate::services::directory::{CreateBusinessInput, SearchFilter, UpdateBusinessInput};
use crate::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Creates the router for business directory endpoints
pub fn business_routes() -> Router<AppState> {
    let moderation = Router::new()
        .route("/:id", delete(delete_business))
        .route("/:id/activate", post(activate_business))
        .route("/:id/deactivate", post(deactivate_business))
        .with_role(Role::Admin);

    Router::new()
        .route("/", get(list_businesses))
        .route("/", post(create_business))
        .route("/by-username/:username", get(get_business_by_username))
        .route("/:id", get(get_business))
        .route("/:id", put(update_business))
        .route("/:id/photos", get(list_photos))
        .route("/:id/photos", post(add_photo))
        .route("/:id/photos/:photo_id", delete(remove_photo))
        .route("/:id/wifi", get(list_wifi_networks))
        .merge(moderation)
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BusinessListQuery {
    /// Free-text filter across name, description, category, and location
    pub q: Option<String>,
    /// Exact-match category tag, combined with `q`
    pub category: Option<String>,
}

/// List or search the directory
#[utoipa::path(
    get,
    path = "/api/v1/businesses",
    params(BusinessListQuery),
    responses((status = 200, description = "Matching businesses")),
    tag = "Businesses"
)]
pub async fn list_businesses(
    State(state): State<AppState>,
    Query(query): Query<BusinessListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = SearchFilter {
        text: query.q,
        category: query.category,
    };
    let businesses = state.services.directory.search(filter).await?;
    Ok(Json(businesses))
}

async fn get_business(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let business = state.services.directory.get_business(id).await?;
    Ok(Json(business))
}

async fn get_business_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let business = state
        .services
        .directory
        .get_business_by_username(&username)
        .await?;
    Ok(Json(business))
}

/// Create a business profile for the calling account
#[utoipa::path(
    post,
    path = "/api/v1/businesses",
    request_body = CreateBusinessInput,
    responses(
        (status = 201, description = "Business created"),
        (status = 409, description = "Username taken or account already has a business", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Businesses"
)]
pub async fn create_business(
    user: AuthUser,
    State(state): State<AppState>,
    Json(mut payload): Json<CreateBusinessInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload.username = normalize_string(payload.username);
    payload.name = normalize_string(payload.name);
    payload.description = normalize_optional_string(payload.description);
    payload.category = normalize_optional_string(payload.category);
    payload.location = normalize_optional_string(payload.location);
    payload.phone = normalize_optional_string(payload.phone);
    payload.email = normalize_optional_string(payload.email);
    payload.website = normalize_optional_string(payload.website);
    payload.whatsapp = normalize_optional_string(payload.whatsapp);
    payload.instagram = normalize_optional_string(payload.instagram);
    payload.facebook = normalize_optional_string(payload.facebook);
    payload.logo_url = normalize_optional_string(payload.logo_url);
    payload.cover_url = normalize_optional_string(payload.cover_url);
    payload.primary_color = normalize_optional_string(payload.primary_color);
    payload.secondary_color = normalize_optional_string(payload.secondary_color);
    validate_input(&payload)?;

    let business = state
        .services
        .directory
        .create_business(&user, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(business)))
}

async fn update_business(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateBusinessInput>,
) -> Result<impl IntoResponse, ApiError> {
    let business = state
        .services
        .directory
        .update_business(&user, id, payload)
        .await?;
    Ok(Json(business))
}

async fn delete_business(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.services.directory.delete_business(&user, id).await?;
    Ok(Json(outcome))
}

async fn activate_business(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let business = state
        .services
        .directory
        .set_business_active(&user, id, true)
        .await?;
    Ok(Json(business))
}

async fn deactivate_business(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let business = state
        .services
        .directory
        .set_business_active(&user, id, false)
        .await?;
    Ok(Json(business))
}

// ---- photo gallery ----

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddPhotoRequest {
    /// Hosted URL returned by the upload collaborator
    pub url: String,
}

async fn list_photos(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let photos = state.services.directory.list_photos(id).await?;
    Ok(Json(photos))
}

async fn add_photo(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AddPhotoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let photo = state
        .services
        .directory
        .add_photo(&user, id, payload.url)
        .await?;
    Ok((StatusCode::CREATED, Json(photo)))
}

async fn remove_photo(
    user: AuthUser,
    State(state): State<AppState>,
    Path((id, photo_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .directory
        .remove_photo(&user, id, photo_id)
        .await?;
    Ok(no_content_response())
}

// ---- guest wifi ----

async fn list_wifi_networks(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let networks = state.services.wifi.list_networks(id).await?;
    Ok(Json(networks))
}
