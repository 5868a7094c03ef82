//! Variance Routes
//!
//! - POST /api/v1/variance/calculate - Calculate without saving
//! - GET /api/v1/variance/prefill - Base quantities from recorded data
//! - GET /api/v1/variance - List reports
//! - POST /api/v1/variance - Submit (create or replace) a report
//! - GET /api/v1/variance/:id - Get a report
//! - DELETE /api/v1/variance/:id - Delete a report
//! - POST /api/v1/variance/:id/suggest-outbound - Request the suggested correction

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    ListParams, ListResponse, PrefillParams, PrefillResponse, SuggestOutboundRequest,
};
use crate::api::error::ApiResult;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::state::AppState;
use crate::storage::SpecialOutboundRecord;
use crate::variance::{AssessedReport, VarianceAssessment, VarianceInputs, VarianceSubmission};

/// POST /api/v1/variance/calculate
///
/// Stateless: any quantities are accepted, negatives included.
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    ApiJson(inputs): ApiJson<VarianceInputs>,
) -> Json<VarianceAssessment> {
    Json(state.variance.preview(&inputs))
}

/// GET /api/v1/variance/prefill?product_id=&date=
pub async fn prefill(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<PrefillParams>,
) -> ApiResult<Json<PrefillResponse>> {
    let inputs = state.variance.prefill(params.product_id, params.date).await?;
    Ok(Json(PrefillResponse {
        product_id: params.product_id,
        report_date: params.date,
        inputs,
    }))
}

/// GET /api/v1/variance?product_id=&start=&end=
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<ListResponse<AssessedReport>>> {
    let reports = state.variance.list(params.filter()?).await?;
    Ok(Json(reports.into()))
}

/// POST /api/v1/variance
pub async fn submit_report(
    State(state): State<Arc<AppState>>,
    ApiJson(submission): ApiJson<VarianceSubmission>,
) -> ApiResult<(StatusCode, Json<AssessedReport>)> {
    let report = state.variance.submit(submission).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /api/v1/variance/:id
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<u32>,
) -> ApiResult<Json<AssessedReport>> {
    Ok(Json(state.variance.get(id).await?))
}

/// DELETE /api/v1/variance/:id
pub async fn delete_report(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<u32>,
) -> ApiResult<StatusCode> {
    state.variance.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/variance/:id/suggest-outbound
pub async fn suggest_outbound(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<u32>,
    ApiJson(req): ApiJson<SuggestOutboundRequest>,
) -> ApiResult<(StatusCode, Json<SpecialOutboundRecord>)> {
    let record = state
        .workflow
        .suggest_from_variance(id, &req.requested_by)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}
