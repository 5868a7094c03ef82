//! Fallback store
//!
//! Wraps the configured backend. The first backend failure (I/O, database
//! or unreachable remote) switches every later call to an in-memory store
//! seeded with sample data, for the rest of the process lifetime. Request
//! errors such as "not found" or "duplicate" pass through unchanged.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::storage::backend::InventoryStore;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::memory::MemoryStore;
use crate::storage::types::{
    ApprovalLog, ApprovalStatus, ExportLog, InventoryRecord, Product, RecordFilter, SalesRecord,
    SpecialOutboundRecord, VarianceReport,
};

/// Store that degrades to sample data on backend failure
pub struct FallbackStore {
    /// `None` when the backend could not even be opened
    primary: Option<Arc<dyn InventoryStore>>,
    backend: String,
    fallback: MemoryStore,
    degraded: AtomicBool,
}

impl FallbackStore {
    pub fn new(primary: Arc<dyn InventoryStore>) -> Self {
        Self {
            backend: primary.name().to_string(),
            primary: Some(primary),
            fallback: MemoryStore::with_sample_data(),
            degraded: AtomicBool::new(false),
        }
    }

    /// Store for a backend that failed to open; serves sample data from the start
    pub fn degraded(backend: &str, err: &StorageError) -> Self {
        let store = Self {
            primary: None,
            backend: backend.to_string(),
            fallback: MemoryStore::with_sample_data(),
            degraded: AtomicBool::new(false),
        };
        store.degrade("open", err);
        store
    }

    fn degrade(&self, operation: &str, err: &StorageError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            tracing::warn!(
                backend = %self.backend,
                operation,
                error = %err,
                "Backend failed, serving sample data from now on"
            );
        }
    }
}

/// Try the primary store unless degraded, then fall through to sample data.
/// Arguments are evaluated once per attempt, so they must be cheap to clone.
macro_rules! route {
    ($self:ident, $method:ident($($arg:expr),*)) => {{
        if let (false, Some(primary)) = ($self.is_degraded(), &$self.primary) {
            match primary.$method($($arg.clone()),*).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_backend_failure() => $self.degrade(stringify!($method), &err),
                Err(err) => return Err(err),
            }
        }
        $self.fallback.$method($($arg),*).await
    }};
}

#[async_trait]
impl InventoryStore for FallbackStore {
    fn name(&self) -> &str {
        if self.is_degraded() {
            self.fallback.name()
        } else {
            &self.backend
        }
    }

    fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    async fn ping(&self) -> StorageResult<()> {
        route!(self, ping())
    }

    async fn list_products(&self) -> StorageResult<Vec<Product>> {
        route!(self, list_products())
    }

    async fn get_product(&self, id: u32) -> StorageResult<Product> {
        route!(self, get_product(id))
    }

    async fn find_product_by_code(&self, code: String) -> StorageResult<Option<Product>> {
        route!(self, find_product_by_code(code))
    }

    async fn insert_product(&self, product: Product) -> StorageResult<Product> {
        route!(self, insert_product(product))
    }

    async fn update_product(&self, product: Product) -> StorageResult<Product> {
        route!(self, update_product(product))
    }

    async fn delete_product(&self, id: u32) -> StorageResult<()> {
        route!(self, delete_product(id))
    }

    async fn list_inventory(&self, filter: RecordFilter) -> StorageResult<Vec<InventoryRecord>> {
        route!(self, list_inventory(filter))
    }

    async fn insert_inventory(&self, record: InventoryRecord) -> StorageResult<InventoryRecord> {
        route!(self, insert_inventory(record))
    }

    async fn delete_inventory(&self, id: u32) -> StorageResult<()> {
        route!(self, delete_inventory(id))
    }

    async fn list_sales(&self, filter: RecordFilter) -> StorageResult<Vec<SalesRecord>> {
        route!(self, list_sales(filter))
    }

    async fn insert_sale(&self, record: SalesRecord) -> StorageResult<SalesRecord> {
        route!(self, insert_sale(record))
    }

    async fn delete_sale(&self, id: u32) -> StorageResult<()> {
        route!(self, delete_sale(id))
    }

    async fn list_special_outbound(
        &self,
        filter: RecordFilter,
        status: Option<ApprovalStatus>,
    ) -> StorageResult<Vec<SpecialOutboundRecord>> {
        route!(self, list_special_outbound(filter, status))
    }

    async fn get_special_outbound(&self, id: u32) -> StorageResult<SpecialOutboundRecord> {
        route!(self, get_special_outbound(id))
    }

    async fn insert_special_outbound(
        &self,
        record: SpecialOutboundRecord,
    ) -> StorageResult<SpecialOutboundRecord> {
        route!(self, insert_special_outbound(record))
    }

    async fn update_special_outbound(
        &self,
        record: SpecialOutboundRecord,
    ) -> StorageResult<SpecialOutboundRecord> {
        route!(self, update_special_outbound(record))
    }

    async fn list_variance_reports(
        &self,
        filter: RecordFilter,
    ) -> StorageResult<Vec<VarianceReport>> {
        route!(self, list_variance_reports(filter))
    }

    async fn get_variance_report(&self, id: u32) -> StorageResult<VarianceReport> {
        route!(self, get_variance_report(id))
    }

    async fn find_variance_report(
        &self,
        product_id: u32,
        report_date: NaiveDate,
    ) -> StorageResult<Option<VarianceReport>> {
        route!(self, find_variance_report(product_id, report_date))
    }

    async fn save_variance_report(&self, report: VarianceReport) -> StorageResult<VarianceReport> {
        route!(self, save_variance_report(report))
    }

    async fn delete_variance_report(&self, id: u32) -> StorageResult<()> {
        route!(self, delete_variance_report(id))
    }

    async fn insert_approval_log(&self, log: ApprovalLog) -> StorageResult<ApprovalLog> {
        route!(self, insert_approval_log(log))
    }

    async fn list_approval_logs(&self, outbound_id: u32) -> StorageResult<Vec<ApprovalLog>> {
        route!(self, list_approval_logs(outbound_id))
    }

    async fn insert_export_log(&self, log: ExportLog) -> StorageResult<ExportLog> {
        route!(self, insert_export_log(log))
    }

    async fn list_export_logs(&self) -> StorageResult<Vec<ExportLog>> {
        route!(self, list_export_logs())
    }
}
