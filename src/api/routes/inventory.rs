//! Inventory Routes
//!
//! - GET /api/v1/inventory - List stock movements
//! - POST /api/v1/inventory - Record a stock movement
//! - DELETE /api/v1/inventory/:id - Delete a movement

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CreateInventoryRequest, ListParams, ListResponse};
use crate::api::error::ApiResult;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::state::AppState;
use crate::storage::InventoryRecord;

/// GET /api/v1/inventory?product_id=&start=&end=
pub async fn list_inventory(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<ListResponse<InventoryRecord>>> {
    let records = state.store.list_inventory(params.filter()?).await?;
    Ok(Json(records.into()))
}

/// POST /api/v1/inventory
pub async fn create_inventory(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateInventoryRequest>,
) -> ApiResult<(StatusCode, Json<InventoryRecord>)> {
    let record = req.into_record()?;
    state.store.get_product(record.product_id).await?;

    let record = state.store.insert_inventory(record).await?;

    tracing::info!(
        record_id = record.id,
        product_id = record.product_id,
        movement = %record.movement,
        quantity = record.quantity,
        "Recorded stock movement"
    );

    Ok((StatusCode::CREATED, Json(record)))
}

/// DELETE /api/v1/inventory/:id
pub async fn delete_inventory(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<u32>,
) -> ApiResult<StatusCode> {
    state.store.delete_inventory(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
