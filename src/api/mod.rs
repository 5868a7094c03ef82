//! Stocktake REST API
//!
//! HTTP API layer for Stocktake, built with Axum.
//!
//! # Endpoints
//!
//! ## Catalog and records
//! - `GET/POST /api/v1/products`, `GET/PUT/DELETE /api/v1/products/:id`
//! - `GET/POST /api/v1/inventory`, `DELETE /api/v1/inventory/:id`
//! - `GET/POST /api/v1/sales`, `DELETE /api/v1/sales/:id`
//!
//! ## Special outbound approvals
//! - `GET/POST /api/v1/special-outbound`, `GET /api/v1/special-outbound/:id`
//! - `POST /api/v1/special-outbound/:id/approve`
//! - `POST /api/v1/special-outbound/:id/reject`
//! - `GET /api/v1/special-outbound/:id/history`
//!
//! ## Variance
//! - `POST /api/v1/variance/calculate` - Calculate without saving
//! - `GET /api/v1/variance/prefill` - Inputs derived from recorded data
//! - `GET/POST /api/v1/variance`, `GET/DELETE /api/v1/variance/:id`
//! - `POST /api/v1/variance/:id/suggest-outbound`
//!
//! ## Validation, reports and export
//! - `POST /api/v1/validation/product-codes`
//! - `GET /api/v1/reports/sales`, `/reports/inventory`, `/reports/variance`
//! - `GET /api/v1/export`, `GET /api/v1/export/logs`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use stocktake::api::{serve, AppState};
//! use stocktake::config::Config;
//! use stocktake::storage::open_store;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let store = open_store(&config.storage)?;
//!     let state = AppState::new(store, config.api.clone(), config.variance.thresholds());
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ApiConfig;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Product routes
        .route(
            "/products",
            get(routes::products::list_products).post(routes::products::create_product),
        )
        .route(
            "/products/:id",
            get(routes::products::get_product)
                .put(routes::products::update_product)
                .delete(routes::products::delete_product),
        )
        // Inventory and sales routes
        .route(
            "/inventory",
            get(routes::inventory::list_inventory).post(routes::inventory::create_inventory),
        )
        .route(
            "/inventory/:id",
            axum::routing::delete(routes::inventory::delete_inventory),
        )
        .route(
            "/sales",
            get(routes::sales::list_sales).post(routes::sales::create_sale),
        )
        .route("/sales/:id", axum::routing::delete(routes::sales::delete_sale))
        // Special outbound routes
        .route(
            "/special-outbound",
            get(routes::special_outbound::list_outbound)
                .post(routes::special_outbound::submit_outbound),
        )
        .route(
            "/special-outbound/:id",
            get(routes::special_outbound::get_outbound),
        )
        .route(
            "/special-outbound/:id/approve",
            post(routes::special_outbound::approve_outbound),
        )
        .route(
            "/special-outbound/:id/reject",
            post(routes::special_outbound::reject_outbound),
        )
        .route(
            "/special-outbound/:id/history",
            get(routes::special_outbound::outbound_history),
        )
        // Variance routes
        .route("/variance/calculate", post(routes::variance::calculate))
        .route("/variance/prefill", get(routes::variance::prefill))
        .route(
            "/variance",
            get(routes::variance::list_reports).post(routes::variance::submit_report),
        )
        .route(
            "/variance/:id",
            get(routes::variance::get_report).delete(routes::variance::delete_report),
        )
        .route(
            "/variance/:id/suggest-outbound",
            post(routes::variance::suggest_outbound),
        )
        // Validation routes
        .route(
            "/validation/product-codes",
            post(routes::validation::validate_codes),
        )
        // Report routes
        .route("/reports/sales", get(routes::reports::sales_report))
        .route("/reports/inventory", get(routes::reports::inventory_report))
        .route("/reports/variance", get(routes::reports::variance_report))
        // Export routes
        .route("/export", get(routes::export::export_data))
        .route("/export/logs", get(routes::export::export_logs));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes);

    with_middleware(router, &state.config).with_state(Arc::new(state))
}

/// Request timeout, tracing and CORS
fn with_middleware(
    router: Router<Arc<AppState>>,
    config: &ApiConfig,
) -> Router<Arc<AppState>> {
    router
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
}

/// Permissive when no origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods(Any)
            .allow_headers(Any)
            .max_age(Duration::from_secs(3600))
    }
}

/// Start the API server
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Stocktake API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Stocktake API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::storage::{
        FallbackStore, InventoryStore, MemoryStore, RemoteConfig, RemoteStore,
    };
    use crate::variance::Thresholds;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn app_with(store: Arc<dyn InventoryStore>) -> Router {
        build_router(AppState::new(store, ApiConfig::default(), Thresholds::default()))
    }

    fn create_test_app() -> Router {
        app_with(Arc::new(MemoryStore::with_sample_data()))
    }

    fn empty_app() -> Router {
        app_with(Arc::new(MemoryStore::new()))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = create_test_app();
        let response = send(&app, "GET", "/health/live", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let app = create_test_app();
        let response = send(&app, "GET", "/health/ready", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let app = create_test_app();
        let response = send(&app, "GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["fallback_active"], false);
    }

    #[tokio::test]
    async fn test_health_reports_fallback() {
        let remote = RemoteStore::new(RemoteConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: String::new(),
            request_timeout_ms: 500,
        })
        .unwrap();
        let app = app_with(Arc::new(FallbackStore::new(Arc::new(remote))));

        let response = send(&app, "GET", "/api/v1/products", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let products = body_json(response).await;
        assert!(products["total"].as_u64().unwrap() > 0);

        let health = body_json(send(&app, "GET", "/health", None).await).await;
        assert_eq!(health["status"], "degraded");
        assert_eq!(health["fallback_active"], true);
    }

    #[tokio::test]
    async fn test_health_degraded_when_sqlite_cannot_open() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("blocked"), b"").unwrap();
        let config = crate::config::StorageConfig {
            database_path: dir.path().join("blocked/stocktake.db").display().to_string(),
            ..Default::default()
        };
        let app = app_with(crate::storage::open_store(&config).unwrap());

        let health = body_json(send(&app, "GET", "/health", None).await).await;
        assert_eq!(health["status"], "degraded");
        assert_eq!(health["fallback_active"], true);
    }

    #[tokio::test]
    async fn test_slow_requests_time_out() {
        let config = ApiConfig {
            request_timeout_secs: 1,
            ..ApiConfig::default()
        };
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            config.clone(),
            Thresholds::default(),
        );
        let router = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "done"
            }),
        );
        let app = with_middleware(router, &config).with_state(Arc::new(state));

        let response = send(&app, "GET", "/slow", None).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_product_crud() {
        let app = empty_app();

        let response = send(
            &app,
            "POST",
            "/api/v1/products",
            Some(json!({"code": "tea-01", "name": "Trà xanh", "unit": "hộp", "unit_price": 45000})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["code"], "TEA-01");
        let id = created["id"].as_u64().unwrap();

        let response = send(
            &app,
            "POST",
            "/api/v1/products",
            Some(json!({"code": "TEA-01", "name": "Again"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = send(
            &app,
            "PUT",
            &format!("/api/v1/products/{}", id),
            Some(json!({"unit_price": 50000})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["unit_price"], 50000.0);

        let response = send(&app, "DELETE", &format!("/api/v1/products/{}", id), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, "GET", &format!("/api/v1/products/{}", id), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let app = empty_app();
        let response = send(&app, "GET", "/api/v1/products/42", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json["error"]["user_message"].as_str().unwrap().contains("Không tìm thấy"));
        assert!(json["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_invalid_product_code() {
        let app = empty_app();
        let response = send(
            &app,
            "POST",
            "/api/v1/products",
            Some(json!({"code": "bad code", "name": "X"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let app = empty_app();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/products")
                    .header("Content-Type", "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert!(json["error"]["user_message"].as_str().unwrap().contains("không hợp lệ"));
    }

    #[tokio::test]
    async fn test_malformed_query_and_path_use_error_body() {
        let app = create_test_app();

        for uri in [
            "/api/v1/sales?start=yesterday",
            "/api/v1/special-outbound?status=maybe",
            "/api/v1/products/abc",
        ] {
            let response = send(&app, "GET", uri, None).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            let json = body_json(response).await;
            assert_eq!(json["error"]["code"], "VALIDATION_ERROR", "{}", uri);
            assert!(json["request_id"].is_string());
        }
    }

    #[tokio::test]
    async fn test_find_product_by_code() {
        let app = create_test_app();

        let found = body_json(send(&app, "GET", "/api/v1/products?code=sp001", None).await).await;
        assert_eq!(found["total"], 1);
        assert_eq!(found["items"][0]["code"], "SP001");

        let missing = body_json(send(&app, "GET", "/api/v1/products?code=NOPE", None).await).await;
        assert_eq!(missing["total"], 0);
    }

    #[tokio::test]
    async fn test_calculate_preview() {
        let app = empty_app();
        let response = send(
            &app,
            "POST",
            "/api/v1/variance/calculate",
            Some(json!({
                "beginning_inventory": 100,
                "inbound_quantity": 50,
                "sales_quantity": 30,
                "promotion_quantity": 10,
                "special_outbound_quantity": 5,
                "actual_inventory": 100
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["book_inventory"], 105.0);
        assert_eq!(json["variance"], -5.0);
        assert_eq!(json["severity"], "low");
        let pct = json["variance_percentage"].as_f64().unwrap();
        assert!((pct - (-4.7619)).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_variance_flow_with_suggestion_and_approval() {
        let app = empty_app();

        let product = body_json(
            send(
                &app,
                "POST",
                "/api/v1/products",
                Some(json!({"code": "SP1", "name": "Tea", "unit": "box"})),
            )
            .await,
        )
        .await;
        let product_id = product["id"].as_u64().unwrap();

        let response = send(
            &app,
            "POST",
            "/api/v1/variance",
            Some(json!({
                "product_id": product_id,
                "report_date": "2024-04-01",
                "beginning_inventory": 100,
                "actual_inventory": 80
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let report = body_json(response).await;
        assert_eq!(report["severity"], "high");
        assert_eq!(report["suggested_correction"]["quantity"], 20.0);
        let report_id = report["id"].as_u64().unwrap();

        let response = send(
            &app,
            "POST",
            &format!("/api/v1/variance/{}/suggest-outbound", report_id),
            Some(json!({"requested_by": "Lan"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let outbound = body_json(response).await;
        assert_eq!(outbound["status"], "pending");
        let outbound_id = outbound["id"].as_u64().unwrap();

        let response = send(
            &app,
            "POST",
            &format!("/api/v1/special-outbound/{}/approve", outbound_id),
            Some(json!({"approver": "Minh"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "approved");

        let response = send(
            &app,
            "POST",
            &format!("/api/v1/special-outbound/{}/reject", outbound_id),
            Some(json!({"approver": "Minh", "reason": "late"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let history = body_json(
            send(
                &app,
                "GET",
                &format!("/api/v1/special-outbound/{}/history", outbound_id),
                None,
            )
            .await,
        )
        .await;
        assert_eq!(history["total"], 2);

        let prefill = body_json(
            send(
                &app,
                "GET",
                &format!("/api/v1/variance/prefill?product_id={}&date=2024-04-01", product_id),
                None,
            )
            .await,
        )
        .await;
        assert_eq!(prefill["special_outbound_quantity"], 20.0);
    }

    #[tokio::test]
    async fn test_variance_rejects_negative_quantities() {
        let app = create_test_app();
        let response = send(
            &app,
            "POST",
            "/api/v1/variance",
            Some(json!({
                "product_id": 1,
                "report_date": "2024-04-01",
                "sales_quantity": -3
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_sales_and_reports() {
        let app = create_test_app();

        let response = send(
            &app,
            "POST",
            "/api/v1/sales",
            Some(json!({"product_id": 1, "sale_date": "2024-06-03", "quantity": 4, "unit_price": 10})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let report = body_json(
            send(
                &app,
                "GET",
                "/api/v1/reports/sales?start=2024-06-01&end=2024-06-30",
                None,
            )
            .await,
        )
        .await;
        assert_eq!(report["totals"]["revenue"], 40.0);
        assert_eq!(report["totals"]["transactions"], 1);

        let response = send(
            &app,
            "GET",
            "/api/v1/reports/inventory?start=2024-06-30&end=2024-06-01",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_validate_codes() {
        let app = create_test_app();
        let response = send(
            &app,
            "POST",
            "/api/v1/validation/product-codes",
            Some(json!({"text": "sp001\t3\nSP999\nSP001 1\n"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["summary"]["total"], 3);
        assert_eq!(json["summary"]["valid"], 1);
        assert_eq!(json["entries"][1]["status"], "unknown_code");
        assert_eq!(json["entries"][2]["status"], "duplicate");
    }

    #[tokio::test]
    async fn test_export_csv_and_logs() {
        let app = create_test_app();
        let response = send(&app, "GET", "/api/v1/export?dataset=variance&format=csv", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let disposition = response
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("stocktake_variance_"));

        let body = body_text(response).await;
        assert!(body.lines().next().unwrap().contains("book_inventory"));

        let logs = body_json(send(&app, "GET", "/api/v1/export/logs", None).await).await;
        assert_eq!(logs["total"], 1);

        let response = send(&app, "GET", "/api/v1/export?dataset=orders", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_inventory_filters() {
        let app = create_test_app();
        let response = send(&app, "GET", "/api/v1/inventory?product_id=1", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let items = json["items"].as_array().unwrap();
        assert!(items.iter().all(|r| r["product_id"] == 1));
    }
}
