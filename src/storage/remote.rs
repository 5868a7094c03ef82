//! Remote store
//!
//! Client for a hosted Postgres exposed through a PostgREST-compatible
//! REST interface (the Supabase `/rest/v1` API). Each table maps to
//! `{base_url}/rest/v1/{table}`; filters use PostgREST operators
//! (`product_id=eq.3`, `sale_date=gte.2024-01-01`).

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::storage::backend::InventoryStore;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{
    normalize_code, ApprovalLog, ApprovalStatus, ExportLog, InventoryRecord, Product,
    RecordFilter, SalesRecord, SpecialOutboundRecord, VarianceReport,
};

/// Configuration for the remote store
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Project URL (e.g. "https://xyz.supabase.co")
    pub base_url: String,
    /// API key sent as `apikey` and bearer token
    pub api_key: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            request_timeout_ms: 5000,
        }
    }
}

type Query = Vec<(&'static str, String)>;

/// PostgREST-backed store
pub struct RemoteStore {
    client: Client,
    config: RemoteConfig,
}

impl RemoteStore {
    pub fn new(config: RemoteConfig) -> StorageResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| StorageError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            table
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn check(response: Response, entity: &'static str) -> StorageResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::CONFLICT => StorageError::duplicate(entity, body),
            s if s.is_server_error() => StorageError::Unavailable(format!("{}: {}", s, body)),
            s => StorageError::Rejected(format!("{}: {}", s, body)),
        })
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        entity: &'static str,
        mut query: Query,
    ) -> StorageResult<Vec<T>> {
        query.push(("select", "*".to_string()));
        let request = self.authorized(self.client.get(self.table_url(table)).query(&query));
        let response = Self::check(request.send().await?, entity).await?;
        Ok(response.json().await?)
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        entity: &'static str,
        id: u32,
    ) -> StorageResult<T> {
        self.select(table, entity, vec![("id", format!("eq.{}", id))])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::not_found(entity, id))
    }

    /// POST a row without its id and return the stored representation
    async fn insert<T: Serialize + DeserializeOwned>(
        &self,
        table: &str,
        entity: &'static str,
        row: &T,
    ) -> StorageResult<T> {
        let mut body = serde_json::to_value(row)?;
        if let Some(object) = body.as_object_mut() {
            object.remove("id");
        }

        let request = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&body);
        let response = Self::check(request.send().await?, entity).await?;
        let rows: Vec<T> = response.json().await?;

        rows.into_iter().next().ok_or_else(|| {
            StorageError::Serialization(format!("empty insert response from {}", table))
        })
    }

    async fn update<T: Serialize + DeserializeOwned>(
        &self,
        table: &str,
        entity: &'static str,
        id: u32,
        row: &T,
    ) -> StorageResult<T> {
        let mut body = serde_json::to_value(row)?;
        if let Some(object) = body.as_object_mut() {
            object.remove("id");
            object.remove("created_at");
        }

        let request = self
            .authorized(self.client.patch(self.table_url(table)))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&body);
        let response = Self::check(request.send().await?, entity).await?;
        let rows: Vec<T> = response.json().await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::not_found(entity, id))
    }

    async fn delete(&self, table: &str, entity: &'static str, id: u32) -> StorageResult<()> {
        let request = self
            .authorized(self.client.delete(self.table_url(table)))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation");
        let response = Self::check(request.send().await?, entity).await?;
        let rows: Vec<serde_json::Value> = response.json().await?;

        if rows.is_empty() {
            return Err(StorageError::not_found(entity, id));
        }
        Ok(())
    }
}

/// PostgREST filter parameters for a record filter
fn filter_query(filter: &RecordFilter, date_column: &'static str) -> Query {
    let mut query = Vec::new();

    if let Some(product_id) = filter.product_id {
        query.push(("product_id", format!("eq.{}", product_id)));
    }

    if let Some(range) = filter.range {
        query.push((date_column, format!("gte.{}", range.start.format("%Y-%m-%d"))));
        query.push((date_column, format!("lte.{}", range.end.format("%Y-%m-%d"))));
    }

    query.push(("order", format!("{}.asc,id.asc", date_column)));
    query
}

#[async_trait]
impl InventoryStore for RemoteStore {
    fn name(&self) -> &str {
        "remote"
    }

    async fn ping(&self) -> StorageResult<()> {
        let request = self
            .authorized(self.client.get(self.table_url("products")))
            .query(&[("select", "id"), ("limit", "1")]);
        Self::check(request.send().await?, "product").await?;
        Ok(())
    }

    async fn list_products(&self) -> StorageResult<Vec<Product>> {
        self.select("products", "product", vec![("order", "id.asc".to_string())])
            .await
    }

    async fn get_product(&self, id: u32) -> StorageResult<Product> {
        self.select_one("products", "product", id).await
    }

    async fn find_product_by_code(&self, code: String) -> StorageResult<Option<Product>> {
        let rows: Vec<Product> = self
            .select(
                "products",
                "product",
                vec![("code", format!("eq.{}", normalize_code(&code)))],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_product(&self, mut product: Product) -> StorageResult<Product> {
        product.code = normalize_code(&product.code);
        self.insert("products", "product code", &product).await
    }

    async fn update_product(&self, mut product: Product) -> StorageResult<Product> {
        product.code = normalize_code(&product.code);
        self.update("products", "product", product.id, &product)
            .await
    }

    async fn delete_product(&self, id: u32) -> StorageResult<()> {
        self.delete("products", "product", id).await
    }

    async fn list_inventory(&self, filter: RecordFilter) -> StorageResult<Vec<InventoryRecord>> {
        self.select(
            "inventory_records",
            "inventory record",
            filter_query(&filter, "record_date"),
        )
        .await
    }

    async fn insert_inventory(&self, record: InventoryRecord) -> StorageResult<InventoryRecord> {
        self.insert("inventory_records", "inventory record", &record)
            .await
    }

    async fn delete_inventory(&self, id: u32) -> StorageResult<()> {
        self.delete("inventory_records", "inventory record", id)
            .await
    }

    async fn list_sales(&self, filter: RecordFilter) -> StorageResult<Vec<SalesRecord>> {
        self.select(
            "sales_records",
            "sales record",
            filter_query(&filter, "sale_date"),
        )
        .await
    }

    async fn insert_sale(&self, record: SalesRecord) -> StorageResult<SalesRecord> {
        self.insert("sales_records", "sales record", &record).await
    }

    async fn delete_sale(&self, id: u32) -> StorageResult<()> {
        self.delete("sales_records", "sales record", id).await
    }

    async fn list_special_outbound(
        &self,
        filter: RecordFilter,
        status: Option<ApprovalStatus>,
    ) -> StorageResult<Vec<SpecialOutboundRecord>> {
        let mut query = filter_query(&filter, "outbound_date");
        if let Some(status) = status {
            query.push(("status", format!("eq.{}", status.as_str())));
        }
        self.select("special_outbound_records", "special outbound", query)
            .await
    }

    async fn get_special_outbound(&self, id: u32) -> StorageResult<SpecialOutboundRecord> {
        self.select_one("special_outbound_records", "special outbound", id)
            .await
    }

    async fn insert_special_outbound(
        &self,
        record: SpecialOutboundRecord,
    ) -> StorageResult<SpecialOutboundRecord> {
        self.insert("special_outbound_records", "special outbound", &record)
            .await
    }

    async fn update_special_outbound(
        &self,
        record: SpecialOutboundRecord,
    ) -> StorageResult<SpecialOutboundRecord> {
        self.update(
            "special_outbound_records",
            "special outbound",
            record.id,
            &record,
        )
        .await
    }

    async fn list_variance_reports(
        &self,
        filter: RecordFilter,
    ) -> StorageResult<Vec<VarianceReport>> {
        self.select(
            "inventory_variance_reports",
            "variance report",
            filter_query(&filter, "report_date"),
        )
        .await
    }

    async fn get_variance_report(&self, id: u32) -> StorageResult<VarianceReport> {
        self.select_one("inventory_variance_reports", "variance report", id)
            .await
    }

    async fn find_variance_report(
        &self,
        product_id: u32,
        report_date: NaiveDate,
    ) -> StorageResult<Option<VarianceReport>> {
        let rows: Vec<VarianceReport> = self
            .select(
                "inventory_variance_reports",
                "variance report",
                vec![
                    ("product_id", format!("eq.{}", product_id)),
                    ("report_date", format!("eq.{}", report_date.format("%Y-%m-%d"))),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn save_variance_report(
        &self,
        mut report: VarianceReport,
    ) -> StorageResult<VarianceReport> {
        if report.id == 0 {
            return self
                .insert("inventory_variance_reports", "variance report", &report)
                .await;
        }

        report.updated_at = chrono::Utc::now();
        self.update(
            "inventory_variance_reports",
            "variance report",
            report.id,
            &report,
        )
        .await
    }

    async fn delete_variance_report(&self, id: u32) -> StorageResult<()> {
        self.delete("inventory_variance_reports", "variance report", id)
            .await
    }

    async fn insert_approval_log(&self, log: ApprovalLog) -> StorageResult<ApprovalLog> {
        self.insert("approval_logs", "approval log", &log).await
    }

    async fn list_approval_logs(&self, outbound_id: u32) -> StorageResult<Vec<ApprovalLog>> {
        self.select(
            "approval_logs",
            "approval log",
            vec![
                ("outbound_id", format!("eq.{}", outbound_id)),
                ("order", "id.asc".to_string()),
            ],
        )
        .await
    }

    async fn insert_export_log(&self, log: ExportLog) -> StorageResult<ExportLog> {
        self.insert("export_logs", "export log", &log).await
    }

    async fn list_export_logs(&self) -> StorageResult<Vec<ExportLog>> {
        self.select(
            "export_logs",
            "export log",
            vec![("order", "id.desc".to_string())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::DateRange;

    #[test]
    fn test_table_url_trims_slash() {
        let store = RemoteStore::new(RemoteConfig {
            base_url: "https://example.supabase.co/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            store.table_url("products"),
            "https://example.supabase.co/rest/v1/products"
        );
    }

    #[test]
    fn test_filter_query() {
        let range = DateRange::try_new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap();
        let query = filter_query(&RecordFilter::new().product(4).range(range), "sale_date");

        assert_eq!(
            query,
            vec![
                ("product_id", "eq.4".to_string()),
                ("sale_date", "gte.2024-01-01".to_string()),
                ("sale_date", "lte.2024-01-31".to_string()),
                ("order", "sale_date.asc,id.asc".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_unavailable() {
        let store = RemoteStore::new(RemoteConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: "key".to_string(),
            request_timeout_ms: 500,
        })
        .unwrap();

        let err = store.list_products().await.unwrap_err();
        assert!(err.is_backend_failure(), "unexpected error: {err}");
    }
}
