//! In-memory store
//!
//! Plain vectors behind a Tokio `RwLock`. Used for tests, for the
//! `memory` backend, and as the sample-data fallback when the configured
//! backend fails (see [`crate::storage::FallbackStore`]).

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use crate::storage::backend::InventoryStore;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::sample;
use crate::storage::types::{
    normalize_code, ApprovalLog, ApprovalStatus, ExportLog, InventoryRecord, Product,
    RecordFilter, SalesRecord, SpecialOutboundRecord, VarianceReport,
};

#[derive(Debug, Default)]
struct Tables {
    products: Vec<Product>,
    inventory: Vec<InventoryRecord>,
    sales: Vec<SalesRecord>,
    special_outbound: Vec<SpecialOutboundRecord>,
    variance_reports: Vec<VarianceReport>,
    approval_logs: Vec<ApprovalLog>,
    export_logs: Vec<ExportLog>,
    next_id: u32,
}

impl Tables {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn check_code(&self, code: &str, except_id: u32) -> StorageResult<()> {
        let code = normalize_code(code);
        if self
            .products
            .iter()
            .any(|p| p.id != except_id && normalize_code(&p.code) == code)
        {
            return Err(StorageError::duplicate("product code", code));
        }
        Ok(())
    }
}

/// Volatile store holding everything in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the bundled sample catalog and records
    pub fn with_sample_data() -> Self {
        let mut tables = Tables::default();

        for product in sample::products() {
            let id = tables.next_id();
            tables.products.push(Product { id, ..product });
        }
        for record in sample::inventory_records() {
            let id = tables.next_id();
            tables.inventory.push(InventoryRecord { id, ..record });
        }
        for record in sample::sales_records() {
            let id = tables.next_id();
            tables.sales.push(SalesRecord { id, ..record });
        }
        for record in sample::special_outbound_records() {
            let id = tables.next_id();
            tables.special_outbound.push(SpecialOutboundRecord { id, ..record });
        }
        for report in sample::variance_reports() {
            let id = tables.next_id();
            tables.variance_reports.push(VarianceReport { id, ..report });
        }

        Self {
            tables: RwLock::new(tables),
        }
    }
}

fn remove_by_id<T>(
    rows: &mut Vec<T>,
    id: u32,
    entity: &'static str,
    key: impl Fn(&T) -> u32,
) -> StorageResult<()> {
    let before = rows.len();
    rows.retain(|row| key(row) != id);
    if rows.len() == before {
        return Err(StorageError::not_found(entity, id));
    }
    Ok(())
}

#[async_trait]
impl InventoryStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn list_products(&self) -> StorageResult<Vec<Product>> {
        Ok(self.tables.read().await.products.clone())
    }

    async fn get_product(&self, id: u32) -> StorageResult<Product> {
        self.tables
            .read()
            .await
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("product", id))
    }

    async fn find_product_by_code(&self, code: String) -> StorageResult<Option<Product>> {
        let code = normalize_code(&code);
        Ok(self
            .tables
            .read()
            .await
            .products
            .iter()
            .find(|p| normalize_code(&p.code) == code)
            .cloned())
    }

    async fn insert_product(&self, mut product: Product) -> StorageResult<Product> {
        let mut tables = self.tables.write().await;
        tables.check_code(&product.code, 0)?;

        product.id = tables.next_id();
        product.code = normalize_code(&product.code);
        tables.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(&self, mut product: Product) -> StorageResult<Product> {
        let mut tables = self.tables.write().await;
        tables.check_code(&product.code, product.id)?;

        product.code = normalize_code(&product.code);
        let slot = tables
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| StorageError::not_found("product", product.id))?;
        *slot = product.clone();
        Ok(product)
    }

    async fn delete_product(&self, id: u32) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        remove_by_id(&mut tables.products, id, "product", |p| p.id)
    }

    async fn list_inventory(&self, filter: RecordFilter) -> StorageResult<Vec<InventoryRecord>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<InventoryRecord> = tables
            .inventory
            .iter()
            .filter(|r| filter.matches(r.product_id, r.record_date))
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.record_date, r.id));
        Ok(rows)
    }

    async fn insert_inventory(&self, mut record: InventoryRecord) -> StorageResult<InventoryRecord> {
        let mut tables = self.tables.write().await;
        record.id = tables.next_id();
        tables.inventory.push(record.clone());
        Ok(record)
    }

    async fn delete_inventory(&self, id: u32) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        remove_by_id(&mut tables.inventory, id, "inventory record", |r| r.id)
    }

    async fn list_sales(&self, filter: RecordFilter) -> StorageResult<Vec<SalesRecord>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<SalesRecord> = tables
            .sales
            .iter()
            .filter(|r| filter.matches(r.product_id, r.sale_date))
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.sale_date, r.id));
        Ok(rows)
    }

    async fn insert_sale(&self, mut record: SalesRecord) -> StorageResult<SalesRecord> {
        let mut tables = self.tables.write().await;
        record.id = tables.next_id();
        tables.sales.push(record.clone());
        Ok(record)
    }

    async fn delete_sale(&self, id: u32) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        remove_by_id(&mut tables.sales, id, "sales record", |r| r.id)
    }

    async fn list_special_outbound(
        &self,
        filter: RecordFilter,
        status: Option<ApprovalStatus>,
    ) -> StorageResult<Vec<SpecialOutboundRecord>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<SpecialOutboundRecord> = tables
            .special_outbound
            .iter()
            .filter(|r| filter.matches(r.product_id, r.outbound_date))
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.outbound_date, r.id));
        Ok(rows)
    }

    async fn get_special_outbound(&self, id: u32) -> StorageResult<SpecialOutboundRecord> {
        self.tables
            .read()
            .await
            .special_outbound
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("special outbound", id))
    }

    async fn insert_special_outbound(
        &self,
        mut record: SpecialOutboundRecord,
    ) -> StorageResult<SpecialOutboundRecord> {
        let mut tables = self.tables.write().await;
        record.id = tables.next_id();
        tables.special_outbound.push(record.clone());
        Ok(record)
    }

    async fn update_special_outbound(
        &self,
        record: SpecialOutboundRecord,
    ) -> StorageResult<SpecialOutboundRecord> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .special_outbound
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| StorageError::not_found("special outbound", record.id))?;
        *slot = record.clone();
        Ok(record)
    }

    async fn list_variance_reports(
        &self,
        filter: RecordFilter,
    ) -> StorageResult<Vec<VarianceReport>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<VarianceReport> = tables
            .variance_reports
            .iter()
            .filter(|r| filter.matches(r.product_id, r.report_date))
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.report_date, r.product_id));
        Ok(rows)
    }

    async fn get_variance_report(&self, id: u32) -> StorageResult<VarianceReport> {
        self.tables
            .read()
            .await
            .variance_reports
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("variance report", id))
    }

    async fn find_variance_report(
        &self,
        product_id: u32,
        report_date: NaiveDate,
    ) -> StorageResult<Option<VarianceReport>> {
        Ok(self
            .tables
            .read()
            .await
            .variance_reports
            .iter()
            .find(|r| r.product_id == product_id && r.report_date == report_date)
            .cloned())
    }

    async fn save_variance_report(
        &self,
        mut report: VarianceReport,
    ) -> StorageResult<VarianceReport> {
        let mut tables = self.tables.write().await;

        if tables.variance_reports.iter().any(|r| {
            r.id != report.id
                && r.product_id == report.product_id
                && r.report_date == report.report_date
        }) {
            return Err(StorageError::duplicate(
                "variance report",
                format!("product {} on {}", report.product_id, report.report_date),
            ));
        }

        if report.id == 0 {
            report.id = tables.next_id();
            tables.variance_reports.push(report.clone());
            return Ok(report);
        }

        let slot = tables
            .variance_reports
            .iter_mut()
            .find(|r| r.id == report.id)
            .ok_or_else(|| StorageError::not_found("variance report", report.id))?;
        report.updated_at = Utc::now();
        *slot = report.clone();
        Ok(report)
    }

    async fn delete_variance_report(&self, id: u32) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        remove_by_id(&mut tables.variance_reports, id, "variance report", |r| r.id)
    }

    async fn insert_approval_log(&self, mut log: ApprovalLog) -> StorageResult<ApprovalLog> {
        let mut tables = self.tables.write().await;
        log.id = tables.next_id();
        tables.approval_logs.push(log.clone());
        Ok(log)
    }

    async fn list_approval_logs(&self, outbound_id: u32) -> StorageResult<Vec<ApprovalLog>> {
        Ok(self
            .tables
            .read()
            .await
            .approval_logs
            .iter()
            .filter(|l| l.outbound_id == outbound_id)
            .cloned()
            .collect())
    }

    async fn insert_export_log(&self, mut log: ExportLog) -> StorageResult<ExportLog> {
        let mut tables = self.tables.write().await;
        log.id = tables.next_id();
        tables.export_logs.push(log.clone());
        Ok(log)
    }

    async fn list_export_logs(&self) -> StorageResult<Vec<ExportLog>> {
        let mut logs = self.tables.read().await.export_logs.clone();
        logs.reverse();
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::{DateRange, Movement};
    use crate::variance::VarianceInputs;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[tokio::test]
    async fn test_product_crud() {
        let store = MemoryStore::new();

        let product = store
            .insert_product(Product::new("ab-1", "Rice 5kg", "bag"))
            .await
            .unwrap();
        assert_eq!(product.id, 1);
        assert_eq!(product.code, "AB-1");

        let found = store.find_product_by_code("ab-1".into()).await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(1));

        let dup = store
            .insert_product(Product::new("AB-1", "Other", "bag"))
            .await;
        assert!(matches!(dup, Err(StorageError::Duplicate { .. })));

        let mut renamed = product.clone();
        renamed.name = "Rice 10kg".into();
        store.update_product(renamed).await.unwrap();
        assert_eq!(store.get_product(1).await.unwrap().name, "Rice 10kg");

        store.delete_product(1).await.unwrap();
        assert!(matches!(
            store.get_product(1).await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_inventory_filtering() {
        let store = MemoryStore::new();
        store
            .insert_inventory(InventoryRecord::new(1, date(2), Movement::Inbound, 10.0))
            .await
            .unwrap();
        store
            .insert_inventory(InventoryRecord::new(1, date(1), Movement::Outbound, 3.0))
            .await
            .unwrap();
        store
            .insert_inventory(InventoryRecord::new(2, date(2), Movement::Inbound, 7.0))
            .await
            .unwrap();

        let all = store.list_inventory(RecordFilter::new()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].record_date, date(1));

        let filtered = store
            .list_inventory(RecordFilter::new().product(1).range(DateRange::day(date(2))))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].quantity, 10.0);
    }

    #[tokio::test]
    async fn test_variance_report_unique_per_day() {
        let store = MemoryStore::new();
        let saved = store
            .save_variance_report(VarianceReport::new(1, date(3), VarianceInputs::default()))
            .await
            .unwrap();

        let clash = store
            .save_variance_report(VarianceReport::new(1, date(3), VarianceInputs::default()))
            .await;
        assert!(matches!(clash, Err(StorageError::Duplicate { .. })));

        let mut resubmitted = saved.clone();
        resubmitted.inputs.actual_inventory = 12.0;
        store.save_variance_report(resubmitted).await.unwrap();

        let found = store.find_variance_report(1, date(3)).await.unwrap().unwrap();
        assert_eq!(found.id, saved.id);
        assert_eq!(found.inputs.actual_inventory, 12.0);
    }

    #[tokio::test]
    async fn test_sample_data_is_consistent() {
        let store = MemoryStore::with_sample_data();
        let products = store.list_products().await.unwrap();
        assert!(!products.is_empty());

        let ids: Vec<u32> = products.iter().map(|p| p.id).collect();
        for record in store.list_sales(RecordFilter::new()).await.unwrap() {
            assert!(ids.contains(&record.product_id));
        }
        for report in store.list_variance_reports(RecordFilter::new()).await.unwrap() {
            assert!(ids.contains(&report.product_id));
        }
    }

    #[tokio::test]
    async fn test_special_outbound_status_filter() {
        let store = MemoryStore::new();
        let pending = store
            .insert_special_outbound(SpecialOutboundRecord::new(1, date(4), 2.0, "damaged", "an"))
            .await
            .unwrap();
        let mut approved = store
            .insert_special_outbound(SpecialOutboundRecord::new(1, date(4), 1.0, "sample", "an"))
            .await
            .unwrap();
        approved.status = ApprovalStatus::Approved;
        store.update_special_outbound(approved).await.unwrap();

        let rows = store
            .list_special_outbound(RecordFilter::new(), Some(ApprovalStatus::Pending))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, pending.id);
    }
}
