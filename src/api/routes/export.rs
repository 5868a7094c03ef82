//! Export Routes
//!
//! Data export endpoint for backup and analysis.
//!
//! - GET /api/v1/export - Download a dataset as CSV or JSON
//! - GET /api/v1/export/logs - Past exports, newest first

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ExportParams, ListResponse};
use crate::api::error::ApiResult;
use crate::api::extract::ApiQuery;
use crate::api::state::AppState;
use crate::export::{Dataset, ExportFormat};
use crate::storage::ExportLog;

/// GET /api/v1/export?dataset=&format=&product_id=&start=&end=
pub async fn export_data(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ExportParams>,
) -> ApiResult<Response> {
    let dataset = Dataset::parse(&params.dataset)?;
    let format = ExportFormat::parse(&params.format)?;
    let filter = params.filter()?;

    let output = state.exports.export(dataset, format, filter).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, output.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", output.file_name),
            ),
        ],
        Body::from(output.body),
    )
        .into_response())
}

/// GET /api/v1/export/logs
pub async fn export_logs(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ListResponse<ExportLog>>> {
    Ok(Json(state.exports.logs().await?.into()))
}
