/// Category endpoints
///
/// # Endpoints
///
/// - `GET /api/v1/categories` - List categories (`?limit=&offset=`)
/// - `POST /api/v1/categories` - Create a category
/// - `GET /api/v1/categories/:id` - Fetch one category
/// - `PUT /api/v1/categories/:id` - Replace a category
/// - `DELETE /api/v1/categories/:id` - Delete a category
///
/// All endpoints require a bearer token.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppPath, AppQuery, ValidatedJson},
    routes::ListParams,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tokoku_shared::models::category::{Category, CategoryInput};
use validator::Validate;

/// Create / replace category request
#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    /// Display name
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

impl From<CategoryRequest> for CategoryInput {
    fn from(req: CategoryRequest) -> Self {
        CategoryInput {
            name: req.name,
        }
    }
}

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Category {} not found", id))
}

/// List categories
pub async fn list_categories(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListParams>,
) -> ApiResult<Json<Vec<Category>>> {
    let categories = Category::list(&state.db, params.limit(), params.offset()).await?;
    Ok(Json(categories))
}

/// Create a category
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/categories
/// Authorization: Bearer eyJ...
///
/// { "name": "Beverages" }
/// ```
///
/// # Errors
///
/// - `409 conflict`: name already in use
/// - `422 validation_error`: empty or overlong name
pub async fn create_category(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = Category::create(&state.db, req.into()).await?;
    tracing::info!(category_id = category.id, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

/// Fetch one category
pub async fn get_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<Category>> {
    Category::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// Replace a category
pub async fn update_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<CategoryRequest>,
) -> ApiResult<Json<Category>> {
    let category = Category::update(&state.db, id, req.into())
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(category_id = id, "Category updated");

    Ok(Json(category))
}

/// Delete a category
///
/// # Errors
///
/// - `404 not_found`: no such category
/// - `409 conflict`: products still belong to it
pub async fn delete_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<StatusCode> {
    let deleted = Category::delete(&state.db, id)
        .await
        .map_err(|e| ApiError::from_delete(e, "Category"))?;

    if !deleted {
        return Err(not_found(id));
    }

    tracing::info!(category_id = id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
