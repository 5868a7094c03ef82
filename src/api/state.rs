//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::approval::ApprovalWorkflow;
use crate::config::ApiConfig;
use crate::export::ExportService;
use crate::reports::ReportService;
use crate::storage::InventoryStore;
use crate::variance::{Thresholds, VarianceService};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Data store (possibly a fallback wrapper)
    pub store: Arc<dyn InventoryStore>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    pub variance: Arc<VarianceService>,
    pub workflow: Arc<ApprovalWorkflow>,
    pub reports: Arc<ReportService>,
    pub exports: Arc<ExportService>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create the state and the services sharing one store
    pub fn new(store: Arc<dyn InventoryStore>, config: ApiConfig, thresholds: Thresholds) -> Self {
        Self {
            variance: Arc::new(VarianceService::new(Arc::clone(&store), thresholds)),
            workflow: Arc::new(ApprovalWorkflow::new(Arc::clone(&store), thresholds)),
            reports: Arc::new(ReportService::new(Arc::clone(&store), thresholds)),
            exports: Arc::new(ExportService::new(Arc::clone(&store), thresholds)),
            store,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
