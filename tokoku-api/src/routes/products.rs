/// Product endpoints
///
/// # Endpoints
///
/// - `GET /api/v1/products` - List products
/// - `POST /api/v1/products` - Create a product
/// - `GET /api/v1/products/:id` - Fetch one product
/// - `PUT /api/v1/products/:id` - Replace a product
/// - `DELETE /api/v1/products/:id` - Delete a product
///
/// `category_id` and `supplier_id` must name existing rows; a dangling
/// reference is a `422 validation_error` on the offending field.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppPath, AppQuery, ValidatedJson},
    routes::ListParams,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tokoku_shared::models::product::{Product, ProductInput};
use validator::Validate;

/// Create / replace product request
#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Optional; stored as an empty string when omitted
    #[serde(default)]
    pub description: String,

    #[validate(
        required(message = "Price is required"),
        range(min = 0.0, message = "Price must not be negative")
    )]
    pub price: Option<f64>,

    #[validate(
        required(message = "Category is required"),
        range(min = 1, message = "Invalid category id")
    )]
    pub category_id: Option<i64>,

    #[validate(
        required(message = "Supplier is required"),
        range(min = 1, message = "Invalid supplier id")
    )]
    pub supplier_id: Option<i64>,
}

impl ProductRequest {
    /// Converts a request that has passed validation
    fn into_input(self) -> ProductInput {
        ProductInput {
            name: self.name,
            description: self.description,
            price: self.price.unwrap_or_default(),
            category_id: self.category_id.unwrap_or_default(),
            supplier_id: self.supplier_id.unwrap_or_default(),
        }
    }
}

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Product {} not found", id))
}

pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListParams>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = Product::list(&state.db, params.limit(), params.offset()).await?;
    Ok(Json(products))
}

/// Create a product
///
/// # Errors
///
/// - `422 validation_error`: invalid fields or unknown category/supplier
pub async fn create_product(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = Product::create(&state.db, req.into_input()).await?;
    tracing::info!(
        product_id = product.id,
        category_id = product.category_id,
        supplier_id = product.supplier_id,
        "Product created"
    );

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<Product>> {
    Product::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

pub async fn update_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<ProductRequest>,
) -> ApiResult<Json<Product>> {
    let product = Product::update(&state.db, id, req.into_input())
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(product_id = id, "Product updated");

    Ok(Json(product))
}

/// Delete a product; refused with 409 while orders reference it
pub async fn delete_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<StatusCode> {
    let deleted = Product::delete(&state.db, id)
        .await
        .map_err(|e| ApiError::from_delete(e, "Product"))?;

    if !deleted {
        return Err(not_found(id));
    }

    tracing::info!(product_id = id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
