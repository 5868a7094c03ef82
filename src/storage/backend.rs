//! Store abstraction
//!
//! Every backend (SQLite, remote PostgREST, in-memory) implements
//! [`InventoryStore`]. Inserts take a record with `id == 0` and return the
//! stored record with its assigned id.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::storage::error::StorageResult;
use crate::storage::types::{
    ApprovalLog, ApprovalStatus, ExportLog, InventoryRecord, Product, RecordFilter, SalesRecord,
    SpecialOutboundRecord, VarianceReport,
};

/// Data access for all Stocktake tables
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Short backend name for logs and health output
    fn name(&self) -> &str;

    /// Whether the store is serving fallback sample data
    fn is_degraded(&self) -> bool {
        false
    }

    /// Cheap round trip to verify the backend answers
    async fn ping(&self) -> StorageResult<()>;

    // Products
    async fn list_products(&self) -> StorageResult<Vec<Product>>;
    async fn get_product(&self, id: u32) -> StorageResult<Product>;
    async fn find_product_by_code(&self, code: String) -> StorageResult<Option<Product>>;
    async fn insert_product(&self, product: Product) -> StorageResult<Product>;
    async fn update_product(&self, product: Product) -> StorageResult<Product>;
    async fn delete_product(&self, id: u32) -> StorageResult<()>;

    // Inventory movements
    async fn list_inventory(&self, filter: RecordFilter) -> StorageResult<Vec<InventoryRecord>>;
    async fn insert_inventory(&self, record: InventoryRecord) -> StorageResult<InventoryRecord>;
    async fn delete_inventory(&self, id: u32) -> StorageResult<()>;

    // Sales
    async fn list_sales(&self, filter: RecordFilter) -> StorageResult<Vec<SalesRecord>>;
    async fn insert_sale(&self, record: SalesRecord) -> StorageResult<SalesRecord>;
    async fn delete_sale(&self, id: u32) -> StorageResult<()>;

    // Special outbound
    async fn list_special_outbound(
        &self,
        filter: RecordFilter,
        status: Option<ApprovalStatus>,
    ) -> StorageResult<Vec<SpecialOutboundRecord>>;
    async fn get_special_outbound(&self, id: u32) -> StorageResult<SpecialOutboundRecord>;
    async fn insert_special_outbound(
        &self,
        record: SpecialOutboundRecord,
    ) -> StorageResult<SpecialOutboundRecord>;
    async fn update_special_outbound(
        &self,
        record: SpecialOutboundRecord,
    ) -> StorageResult<SpecialOutboundRecord>;

    // Variance reports
    async fn list_variance_reports(&self, filter: RecordFilter)
        -> StorageResult<Vec<VarianceReport>>;
    async fn get_variance_report(&self, id: u32) -> StorageResult<VarianceReport>;
    async fn find_variance_report(
        &self,
        product_id: u32,
        report_date: NaiveDate,
    ) -> StorageResult<Option<VarianceReport>>;
    /// Insert when `id == 0`, otherwise replace the stored report in full
    async fn save_variance_report(&self, report: VarianceReport) -> StorageResult<VarianceReport>;
    async fn delete_variance_report(&self, id: u32) -> StorageResult<()>;

    // Audit logs
    async fn insert_approval_log(&self, log: ApprovalLog) -> StorageResult<ApprovalLog>;
    async fn list_approval_logs(&self, outbound_id: u32) -> StorageResult<Vec<ApprovalLog>>;
    async fn insert_export_log(&self, log: ExportLog) -> StorageResult<ExportLog>;
    async fn list_export_logs(&self) -> StorageResult<Vec<ExportLog>>;
}
