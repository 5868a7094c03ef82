//! Special Outbound Routes
//!
//! - GET /api/v1/special-outbound - List requests (optionally by status)
//! - POST /api/v1/special-outbound - Submit a request
//! - GET /api/v1/special-outbound/:id - Get a request
//! - POST /api/v1/special-outbound/:id/approve - Approve a pending request
//! - POST /api/v1/special-outbound/:id/reject - Reject a pending request
//! - GET /api/v1/special-outbound/:id/history - Approval log

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ApproveRequest, ListParams, ListResponse, RejectRequest};
use crate::api::error::ApiResult;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::state::AppState;
use crate::approval::OutboundRequest;
use crate::storage::{ApprovalLog, SpecialOutboundRecord};

/// GET /api/v1/special-outbound?status=&product_id=&start=&end=
pub async fn list_outbound(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<ListResponse<SpecialOutboundRecord>>> {
    let records = state.workflow.list(params.filter()?, params.status).await?;
    Ok(Json(records.into()))
}

/// POST /api/v1/special-outbound
pub async fn submit_outbound(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<OutboundRequest>,
) -> ApiResult<(StatusCode, Json<SpecialOutboundRecord>)> {
    let record = state.workflow.submit(req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/special-outbound/:id
pub async fn get_outbound(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<u32>,
) -> ApiResult<Json<SpecialOutboundRecord>> {
    Ok(Json(state.workflow.get(id).await?))
}

/// POST /api/v1/special-outbound/:id/approve
pub async fn approve_outbound(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<u32>,
    ApiJson(req): ApiJson<ApproveRequest>,
) -> ApiResult<Json<SpecialOutboundRecord>> {
    let record = state.workflow.approve(id, &req.approver, req.comment).await?;
    Ok(Json(record))
}

/// POST /api/v1/special-outbound/:id/reject
pub async fn reject_outbound(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<u32>,
    ApiJson(req): ApiJson<RejectRequest>,
) -> ApiResult<Json<SpecialOutboundRecord>> {
    let record = state.workflow.reject(id, &req.approver, &req.reason).await?;
    Ok(Json(record))
}

/// GET /api/v1/special-outbound/:id/history
pub async fn outbound_history(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<u32>,
) -> ApiResult<Json<ListResponse<ApprovalLog>>> {
    Ok(Json(state.workflow.history(id).await?.into()))
}
