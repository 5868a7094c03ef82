//! Sales Routes
//!
//! - GET /api/v1/sales - List sales
//! - POST /api/v1/sales - Record a sale
//! - DELETE /api/v1/sales/:id - Delete a sale

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CreateSaleRequest, ListParams, ListResponse};
use crate::api::error::ApiResult;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::state::AppState;
use crate::storage::SalesRecord;

/// GET /api/v1/sales?product_id=&start=&end=
pub async fn list_sales(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<ListResponse<SalesRecord>>> {
    let records = state.store.list_sales(params.filter()?).await?;
    Ok(Json(records.into()))
}

/// POST /api/v1/sales
///
/// The unit price defaults to the product's current price.
pub async fn create_sale(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateSaleRequest>,
) -> ApiResult<(StatusCode, Json<SalesRecord>)> {
    let product = state.store.get_product(req.product_id).await?;
    let record = state.store.insert_sale(req.into_record(&product)?).await?;

    tracing::info!(
        sale_id = record.id,
        product_id = record.product_id,
        quantity = record.quantity,
        promotion_quantity = record.promotion_quantity,
        "Recorded sale"
    );

    Ok((StatusCode::CREATED, Json(record)))
}

/// DELETE /api/v1/sales/:id
pub async fn delete_sale(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<u32>,
) -> ApiResult<StatusCode> {
    state.store.delete_sale(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
