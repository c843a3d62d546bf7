/// Supplier endpoints (`/api/v1/suppliers`), all gated

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppPath, AppQuery, ValidatedJson},
    routes::ListParams,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tokoku_shared::models::supplier::{Supplier, SupplierInput};
use validator::Validate;

/// Create / replace supplier request
#[derive(Debug, Deserialize, Validate)]
pub struct SupplierRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,
}

impl From<SupplierRequest> for SupplierInput {
    fn from(req: SupplierRequest) -> Self {
        SupplierInput {
            name: req.name,
            email: req.email,
        }
    }
}

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Supplier {} not found", id))
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListParams>,
) -> ApiResult<Json<Vec<Supplier>>> {
    Ok(Json(
        Supplier::list(&state.db, params.limit(), params.offset()).await?,
    ))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SupplierRequest>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    let supplier = Supplier::create(&state.db, req.into()).await?;
    tracing::info!(supplier_id = supplier.id, "Supplier created");

    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<Supplier>> {
    Supplier::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<SupplierRequest>,
) -> ApiResult<Json<Supplier>> {
    let supplier = Supplier::update(&state.db, id, req.into())
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(supplier_id = id, "Supplier updated");

    Ok(Json(supplier))
}

/// Refused with 409 while products still reference the supplier
pub async fn delete_supplier(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<StatusCode> {
    let deleted = Supplier::delete(&state.db, id)
        .await
        .map_err(|e| ApiError::from_delete(e, "Supplier"))?;

    if !deleted {
        return Err(not_found(id));
    }

    tracing::info!(supplier_id = id, "Supplier deleted");
    Ok(StatusCode::NO_CONTENT)
}
