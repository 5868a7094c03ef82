//! Product Routes
//!
//! - GET /api/v1/products - List the catalog (`?code=` looks up one code)
//! - POST /api/v1/products - Create a product
//! - GET /api/v1/products/:id - Get a product
//! - PUT /api/v1/products/:id - Update a product
//! - DELETE /api/v1/products/:id - Delete a product

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CreateProductRequest, ListResponse, ProductParams, UpdateProductRequest};
use crate::api::error::ApiResult;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::state::AppState;
use crate::storage::Product;

/// GET /api/v1/products
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ProductParams>,
) -> ApiResult<Json<ListResponse<Product>>> {
    let products = match params.code {
        Some(code) => state
            .store
            .find_product_by_code(code)
            .await?
            .into_iter()
            .collect(),
        None => state.store.list_products().await?,
    };
    Ok(Json(products.into()))
}

/// GET /api/v1/products/:id
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<u32>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.store.get_product(id).await?))
}

/// POST /api/v1/products
///
/// Codes are stored uppercase; a code already in the catalog is a conflict.
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state.store.insert_product(req.into_product()?).await?;

    tracing::info!(product_id = product.id, code = %product.code, "Created product");

    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/v1/products/:id
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<u32>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    let existing = state.store.get_product(id).await?;
    let product = state.store.update_product(req.apply(existing)?).await?;

    tracing::info!(product_id = id, "Updated product");

    Ok(Json(product))
}

/// DELETE /api/v1/products/:id
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<u32>,
) -> ApiResult<StatusCode> {
    state.store.delete_product(id).await?;

    tracing::info!(product_id = id, "Deleted product");

    Ok(StatusCode::NO_CONTENT)
}
