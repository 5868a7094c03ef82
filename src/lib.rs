//! # Stocktake
//!
//! Inventory and sales tracking for a small shop: product catalog, stock
//! movements, sales, special outbound approvals and stock-count variance
//! reports, served over a JSON API.
//!
//! ## Features
//!
//! - **Pluggable storage**: SQLite file, hosted PostgREST database or in-memory
//! - **Graceful degradation**: Falls back to built-in sample data when the backend fails
//! - **Variance reports**: Book vs. actual stock with severity and suggested corrections
//! - **Approvals**: Special outbound requests with an audit log
//! - **Bulk entry**: Validation of product codes pasted from spreadsheets
//! - **Reports and export**: Sales, movement and variance summaries; CSV/JSON export
//!
//! ## Modules
//!
//! - [`storage`]: Records, the `InventoryStore` trait and its backends
//! - [`variance`]: Variance calculator and report service
//! - [`approval`]: Special outbound workflow
//! - [`validation`]: Pasted product code validation
//! - [`reports`]: Aggregated reports
//! - [`export`]: Dataset export
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stocktake::storage::{InventoryStore, MemoryStore, Product};
//! use stocktake::variance::{assess, Thresholds, VarianceInputs};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!     store.insert_product(Product::new("SP001", "Green tea", "box")).await?;
//!
//!     let assessment = assess(
//!         &VarianceInputs {
//!             beginning_inventory: 100.0,
//!             inbound_quantity: 50.0,
//!             sales_quantity: 30.0,
//!             promotion_quantity: 10.0,
//!             special_outbound_quantity: 5.0,
//!             actual_inventory: 100.0,
//!         },
//!         &Thresholds::default(),
//!     );
//!     println!("Variance: {} ({})", assessment.figures.variance, assessment.severity);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod approval;
pub mod config;
pub mod export;
pub mod reports;
pub mod storage;
pub mod validation;
pub mod variance;

// Re-export top-level types for convenience
pub use storage::{
    open_store, ApprovalStatus, DateRange, InventoryRecord, InventoryStore, Movement, Product,
    RecordFilter, SalesRecord, SpecialOutboundRecord, StorageError, StorageResult,
    VarianceReport,
};

pub use variance::{
    assess, calculate, Severity, Thresholds, VarianceAssessment, VarianceError, VarianceFigures,
    VarianceInputs, VarianceService,
};

pub use approval::{ApprovalWorkflow, OutboundRequest, WorkflowError};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError};
