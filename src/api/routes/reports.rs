//! Report Routes
//!
//! All reports take `start`, `end` (default: last 30 days) and `product_id`.
//!
//! - GET /api/v1/reports/sales
//! - GET /api/v1/reports/inventory
//! - GET /api/v1/reports/variance

use axum::{
    extract::State,
    Json,
};
use std::sync::Arc;

use crate::api::dto::ReportParams;
use crate::api::error::ApiResult;
use crate::api::extract::ApiQuery;
use crate::api::state::AppState;
use crate::reports::{InventorySummary, SalesReport, VarianceSummary};

pub async fn sales_report(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ReportParams>,
) -> ApiResult<Json<SalesReport>> {
    let report = state.reports.sales(params.range()?, params.product_id).await?;
    Ok(Json(report))
}

pub async fn inventory_report(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ReportParams>,
) -> ApiResult<Json<InventorySummary>> {
    let report = state
        .reports
        .inventory(params.range()?, params.product_id)
        .await?;
    Ok(Json(report))
}

pub async fn variance_report(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ReportParams>,
) -> ApiResult<Json<VarianceSummary>> {
    let report = state
        .reports
        .variance(params.range()?, params.product_id)
        .await?;
    Ok(Json(report))
}
