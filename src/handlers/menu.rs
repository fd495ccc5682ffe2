use crate::auth::AuthUser;
use crate::errors::ApiError;
use crate::handlers::common::{no_content_response, normalize_optional_string};
use crate::services::menu::{
    CascadeOutcome, CreateCategoryInput, CreateItemInput, CreateSubcategoryInput,
    UpdateCategoryInput, UpdateItemInput, UpdateSubcategoryInput,
};
use crate::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

/// Creates the router for menu hierarchy endpoints.
/// Reads are public; every mutation authenticates and the service checks
/// ownership against the target business.
pub fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories", post(create_category))
        .route("/categories/:id", put(update_category))
        .route("/categories/:id", delete(delete_category))
        .route("/categories/:id/subcategories", get(list_subcategories))
        .route("/subcategories", post(create_subcategory))
        .route("/subcategories/:id", put(update_subcategory))
        .route("/subcategories/:id", delete(delete_subcategory))
        .route("/subcategories/:id/items", get(list_items))
        .route("/items", post(create_item))
        .route("/items/:id", put(update_item))
        .route("/items/:id", delete(delete_item))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoriesQuery {
    /// Business whose categories are listed
    pub business_id: i64,
}

/// List a business's menu categories
#[utoipa::path(
    get,
    path = "/api/v1/menu/categories",
    params(CategoriesQuery),
    responses(
        (status = 200, description = "Categories ordered by display order"),
    ),
    tag = "Menu"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<CategoriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state.services.menu.list_categories(query.business_id).await?;
    Ok(Json(categories))
}

/// Create a menu category
#[utoipa::path(
    post,
    path = "/api/v1/menu/categories",
    request_body = CreateCategoryInput,
    responses(
        (status = 201, description = "Category created"),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Menu"
)]
pub async fn create_category(
    user: AuthUser,
    State(state): State<AppState>,
    Json(mut payload): Json<CreateCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload.image_url = normalize_optional_string(payload.image_url);
    let category = state.services.menu.create_category(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Update a menu category
#[utoipa::path(
    put,
    path = "/api/v1/menu/categories/{id}",
    request_body = UpdateCategoryInput,
    responses(
        (status = 200, description = "Category updated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Menu"
)]
pub async fn update_category(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .services
        .menu
        .update_category(&user, id, payload)
        .await?;
    Ok(Json(category))
}

/// Delete a category and cascade over its subcategories and items
#[utoipa::path(
    delete,
    path = "/api/v1/menu/categories/{id}",
    responses(
        (status = 200, description = "Category deleted with descendants", body = CascadeOutcome),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Menu"
)]
pub async fn delete_category(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.services.menu.delete_category(&user, id).await?;
    Ok(Json(outcome))
}

/// List a category's subcategories
#[utoipa::path(
    get,
    path = "/api/v1/menu/categories/{id}/subcategories",
    responses((status = 200, description = "Subcategories ordered by display order")),
    tag = "Menu"
)]
pub async fn list_subcategories(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let subcategories = state.services.menu.list_subcategories(id).await?;
    Ok(Json(subcategories))
}

async fn create_subcategory(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateSubcategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let subcategory = state
        .services
        .menu
        .create_subcategory(&user, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(subcategory)))
}

async fn update_subcategory(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSubcategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let subcategory = state
        .services
        .menu
        .update_subcategory(&user, id, payload)
        .await?;
    Ok(Json(subcategory))
}

/// Delete a subcategory and cascade over its items
#[utoipa::path(
    delete,
    path = "/api/v1/menu/subcategories/{id}",
    responses(
        (status = 200, description = "Subcategory deleted with items", body = CascadeOutcome),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Menu"
)]
pub async fn delete_subcategory(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.services.menu.delete_subcategory(&user, id).await?;
    Ok(Json(outcome))
}

/// List a subcategory's items
#[utoipa::path(
    get,
    path = "/api/v1/menu/subcategories/{id}/items",
    responses((status = 200, description = "Items ordered by display order")),
    tag = "Menu"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.services.menu.list_items(id).await?;
    Ok(Json(items))
}

/// Create a menu item. The price is user-entered text and is validated
/// before any database write.
#[utoipa::path(
    post,
    path = "/api/v1/menu/items",
    request_body = CreateItemInput,
    responses(
        (status = 201, description = "Item created"),
        (status = 400, description = "Invalid payload (e.g. non-numeric price)", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Menu"
)]
pub async fn create_item(
    user: AuthUser,
    State(state): State<AppState>,
    Json(mut payload): Json<CreateItemInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload.description = normalize_optional_string(payload.description);
    payload.image_url = normalize_optional_string(payload.image_url);
    let item = state.services.menu.create_item(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_item(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateItemInput>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.services.menu.update_item(&user, id, payload).await?;
    Ok(Json(item))
}

async fn delete_item(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.menu.delete_item(&user, id).await?;
    Ok(no_content_response())
}
