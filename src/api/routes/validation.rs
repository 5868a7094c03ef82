//! Validation Routes
//!
//! - POST /api/v1/validation/product-codes - Check pasted product codes

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::ValidateCodesRequest;
use crate::api::error::ApiResult;
use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::validation::{CodeValidator, ValidationReport};

/// POST /api/v1/validation/product-codes
pub async fn validate_codes(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ValidateCodesRequest>,
) -> ApiResult<Json<ValidationReport>> {
    let products = state.store.list_products().await?;
    let report = CodeValidator::new(&products).validate(&req.text);
    Ok(Json(report))
}
