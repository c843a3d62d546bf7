/// Order endpoints (`/api/v1/orders`), all gated
///
/// `total` is accepted as submitted; no price is derived from the product.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppPath, AppQuery, ValidatedJson},
    routes::ListParams,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tokoku_shared::models::order::{Order, OrderInput};
use validator::Validate;

/// Create / replace order request
#[derive(Debug, Deserialize, Validate)]
pub struct OrderRequest {
    #[validate(
        required(message = "Product is required"),
        range(min = 1, message = "Invalid product id")
    )]
    pub product_id: Option<i64>,

    #[validate(
        required(message = "Quantity is required"),
        range(min = 1, message = "Quantity must be at least 1")
    )]
    pub quantity: Option<i32>,

    #[validate(
        required(message = "Total is required"),
        range(min = 0.0, message = "Total must not be negative")
    )]
    pub total: Option<f64>,
}

impl OrderRequest {
    fn into_input(self) -> OrderInput {
        OrderInput {
            product_id: self.product_id.unwrap_or_default(),
            quantity: self.quantity.unwrap_or_default(),
            total: self.total.unwrap_or_default(),
        }
    }
}

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Order {} not found", id))
}

pub async fn list_orders(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListParams>,
) -> ApiResult<Json<Vec<Order>>> {
    let orders = Order::list(&state.db, params.limit(), params.offset()).await?;
    Ok(Json(orders))
}

pub async fn create_order(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<OrderRequest>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = Order::create(&state.db, req.into_input()).await?;
    tracing::info!(order_id = order.id, product_id = order.product_id, "Order created");

    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<Order>> {
    Order::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

pub async fn update_order(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<OrderRequest>,
) -> ApiResult<Json<Order>> {
    let order = Order::update(&state.db, id, req.into_input())
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(order_id = id, "Order updated");

    Ok(Json(order))
}

pub async fn delete_order(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<StatusCode> {
    if !Order::delete(&state.db, id)
        .await
        .map_err(|e| ApiError::from_delete(e, "Order"))?
    {
        return Err(not_found(id));
    }

    tracing::info!(order_id = id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}
