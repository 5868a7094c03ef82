//! Data export
//!
//! Renders a dataset as CSV or pretty JSON and records an export log entry.
//! Variance rows carry their derived figures alongside the stored quantities.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::storage::{ExportLog, InventoryStore, RecordFilter, StorageError, VarianceReport};
use crate::variance::{assess, Severity, Thresholds};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("Unknown export format: {0}")]
    UnknownFormat(String),

    #[error("Failed to encode export: {0}")]
    Encode(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Encode(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Encode(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Products,
    Inventory,
    Sales,
    SpecialOutbound,
    Variance,
}

impl Dataset {
    pub fn parse(s: &str) -> Result<Self, ExportError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "products" => Ok(Dataset::Products),
            "inventory" => Ok(Dataset::Inventory),
            "sales" => Ok(Dataset::Sales),
            "special_outbound" | "special-outbound" => Ok(Dataset::SpecialOutbound),
            "variance" => Ok(Dataset::Variance),
            other => Err(ExportError::UnknownDataset(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Products => "products",
            Dataset::Inventory => "inventory",
            Dataset::Sales => "sales",
            Dataset::SpecialOutbound => "special_outbound",
            Dataset::Variance => "variance",
        }
    }

    /// CSV header, in the field order of the serialized rows
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Dataset::Products => &[
                "id", "code", "name", "unit", "category", "unit_price", "active", "created_at",
            ],
            Dataset::Inventory => &[
                "id",
                "product_id",
                "record_date",
                "movement",
                "quantity",
                "note",
                "created_at",
            ],
            Dataset::Sales => &[
                "id",
                "product_id",
                "sale_date",
                "quantity",
                "promotion_quantity",
                "unit_price",
                "customer",
                "created_at",
            ],
            Dataset::SpecialOutbound => &[
                "id",
                "product_id",
                "outbound_date",
                "quantity",
                "reason",
                "status",
                "requested_by",
                "decided_by",
                "decision_note",
                "decided_at",
                "created_at",
            ],
            Dataset::Variance => &[
                "id",
                "product_id",
                "report_date",
                "beginning_inventory",
                "inbound_quantity",
                "sales_quantity",
                "promotion_quantity",
                "special_outbound_quantity",
                "actual_inventory",
                "book_inventory",
                "variance",
                "variance_percentage",
                "severity",
                "note",
                "created_at",
                "updated_at",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Result<Self, ExportError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

/// A rendered export, ready to be sent as a download
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: String,
    pub row_count: usize,
}

/// Flat variance row, stored quantities plus derived figures
#[derive(Debug, Serialize)]
struct VarianceRow {
    id: u32,
    product_id: u32,
    report_date: NaiveDate,
    beginning_inventory: f64,
    inbound_quantity: f64,
    sales_quantity: f64,
    promotion_quantity: f64,
    special_outbound_quantity: f64,
    actual_inventory: f64,
    book_inventory: f64,
    variance: f64,
    variance_percentage: f64,
    severity: Severity,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VarianceRow {
    fn new(report: VarianceReport, thresholds: &Thresholds) -> Self {
        let assessment = assess(&report.inputs, thresholds);
        let inputs = report.inputs;
        Self {
            id: report.id,
            product_id: report.product_id,
            report_date: report.report_date,
            beginning_inventory: inputs.beginning_inventory,
            inbound_quantity: inputs.inbound_quantity,
            sales_quantity: inputs.sales_quantity,
            promotion_quantity: inputs.promotion_quantity,
            special_outbound_quantity: inputs.special_outbound_quantity,
            actual_inventory: inputs.actual_inventory,
            book_inventory: assessment.figures.book_inventory,
            variance: assessment.figures.variance,
            variance_percentage: assessment.figures.variance_percentage,
            severity: assessment.severity,
            note: report.note,
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }
}

pub struct ExportService {
    store: Arc<dyn InventoryStore>,
    thresholds: Thresholds,
}

impl ExportService {
    pub fn new(store: Arc<dyn InventoryStore>, thresholds: Thresholds) -> Self {
        Self { store, thresholds }
    }

    pub async fn export(
        &self,
        dataset: Dataset,
        format: ExportFormat,
        filter: RecordFilter,
    ) -> Result<ExportOutput, ExportError> {
        let columns = dataset.columns();
        let (body, row_count) = match dataset {
            Dataset::Products => {
                let products: Vec<_> = self
                    .store
                    .list_products()
                    .await?
                    .into_iter()
                    .filter(|p| filter.product_id.map_or(true, |id| p.id == id))
                    .collect();
                render(&products, columns, format)?
            }
            Dataset::Inventory => {
                render(&self.store.list_inventory(filter).await?, columns, format)?
            }
            Dataset::Sales => {
                render(&self.store.list_sales(filter).await?, columns, format)?
            }
            Dataset::SpecialOutbound => {
                let records = self.store.list_special_outbound(filter, None).await?;
                render(&records, columns, format)?
            }
            Dataset::Variance => {
                let rows: Vec<VarianceRow> = self
                    .store
                    .list_variance_reports(filter)
                    .await?
                    .into_iter()
                    .map(|r| VarianceRow::new(r, &self.thresholds))
                    .collect();
                render(&rows, columns, format)?
            }
        };

        let file_name = file_name(dataset, format, Utc::now());

        self.store
            .insert_export_log(ExportLog {
                id: 0,
                dataset: dataset.as_str().to_string(),
                format: format.extension().to_string(),
                row_count: u32::try_from(row_count).unwrap_or(u32::MAX),
                file_name: file_name.clone(),
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(
            dataset = dataset.as_str(),
            format = format.extension(),
            rows = row_count,
            file = %file_name,
            "Export generated"
        );

        Ok(ExportOutput {
            file_name,
            content_type: format.content_type(),
            body,
            row_count,
        })
    }

    pub async fn logs(&self) -> Result<Vec<ExportLog>, ExportError> {
        Ok(self.store.list_export_logs().await?)
    }
}

/// `stocktake_<dataset>_<YYYYmmdd_HHMMSS>.<ext>`
pub fn file_name(dataset: Dataset, format: ExportFormat, at: DateTime<Utc>) -> String {
    format!(
        "stocktake_{}_{}.{}",
        dataset.as_str(),
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

fn render<T: Serialize>(
    rows: &[T],
    columns: &[&str],
    format: ExportFormat,
) -> Result<(String, usize), ExportError> {
    let body = match format {
        ExportFormat::Json => serde_json::to_string_pretty(rows)?,
        ExportFormat::Csv => to_csv(rows, columns)?,
    };
    Ok((body, rows.len()))
}

fn to_csv<T: Serialize>(rows: &[T], columns: &[&str]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    // serialize() emits the header with the first row only
    if rows.is_empty() {
        writer.write_record(columns)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{
        InventoryRecord, MemoryStore, Movement, Product, SalesRecord, SpecialOutboundRecord,
    };
    use crate::variance::VarianceInputs;
    use chrono::TimeZone;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    async fn setup() -> (Arc<dyn InventoryStore>, ExportService, u32) {
        let store: Arc<dyn InventoryStore> = Arc::new(MemoryStore::new());
        let product = store
            .insert_product(Product::new("SP1", "Tea", "box"))
            .await
            .unwrap();
        let service = ExportService::new(Arc::clone(&store), Thresholds::default());
        (store, service, product.id)
    }

    #[test]
    fn test_parse_dataset_and_format() {
        assert_eq!(Dataset::parse("Special-Outbound").unwrap(), Dataset::SpecialOutbound);
        assert!(matches!(
            Dataset::parse("orders"),
            Err(ExportError::UnknownDataset(_))
        ));
        assert_eq!(ExportFormat::parse("CSV").unwrap(), ExportFormat::Csv);
        assert!(matches!(
            ExportFormat::parse("xlsx"),
            Err(ExportError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
        assert_eq!(
            file_name(Dataset::Sales, ExportFormat::Csv, at),
            "stocktake_sales_20240203_040506.csv"
        );
    }

    #[tokio::test]
    async fn test_variance_csv_has_derived_columns() {
        let (store, service, product_id) = setup().await;
        store
            .save_variance_report(VarianceReport::new(
                product_id,
                day(1),
                VarianceInputs {
                    beginning_inventory: 100.0,
                    inbound_quantity: 50.0,
                    sales_quantity: 30.0,
                    promotion_quantity: 10.0,
                    special_outbound_quantity: 5.0,
                    actual_inventory: 100.0,
                },
            ))
            .await
            .unwrap();

        let output = service
            .export(Dataset::Variance, ExportFormat::Csv, RecordFilter::new())
            .await
            .unwrap();

        let mut lines = output.body.lines();
        let header = lines.next().unwrap();
        assert!(header.contains("book_inventory"));
        assert!(header.contains("variance_percentage"));
        assert!(header.contains("severity"));
        let row = lines.next().unwrap();
        assert!(row.contains("105"));
        assert!(row.contains("low"));
        assert_eq!(output.row_count, 1);
        assert!(output.file_name.starts_with("stocktake_variance_"));
    }

    #[tokio::test]
    async fn test_json_export_and_log() {
        let (store, service, product_id) = setup().await;
        store
            .insert_sale(SalesRecord::new(product_id, day(2), 2.0, 3.5))
            .await
            .unwrap();

        let output = service
            .export(Dataset::Sales, ExportFormat::Json, RecordFilter::new())
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output.body).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert_eq!(output.content_type, "application/json");

        let logs = service.logs().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].dataset, "sales");
        assert_eq!(logs[0].row_count, 1);
        assert_eq!(logs[0].file_name, output.file_name);
    }

    #[tokio::test]
    async fn test_empty_csv() {
        let (_store, service, _) = setup().await;
        let output = service
            .export(Dataset::Inventory, ExportFormat::Csv, RecordFilter::new())
            .await
            .unwrap();
        assert_eq!(output.row_count, 0);
        assert_eq!(
            output.body.trim_end(),
            "id,product_id,record_date,movement,quantity,note,created_at"
        );
    }

    #[tokio::test]
    async fn test_empty_variance_csv_has_header() {
        let store: Arc<dyn InventoryStore> = Arc::new(MemoryStore::new());
        let service = ExportService::new(store, Thresholds::default());

        let output = service
            .export(Dataset::Variance, ExportFormat::Csv, RecordFilter::new())
            .await
            .unwrap();
        assert_eq!(output.body.lines().count(), 1);
        assert!(output.body.contains("book_inventory"));
    }

    #[tokio::test]
    async fn test_columns_match_serialized_header() {
        let (store, service, product_id) = setup().await;
        let outbound = SpecialOutboundRecord::new(product_id, day(3), 2.0, "Damaged", "an");
        store.insert_special_outbound(outbound).await.unwrap();
        store
            .insert_inventory(InventoryRecord::new(product_id, day(3), Movement::Inbound, 4.0))
            .await
            .unwrap();
        store
            .insert_sale(SalesRecord::new(product_id, day(3), 1.0, 2.0))
            .await
            .unwrap();
        let report = VarianceReport::new(product_id, day(3), VarianceInputs::default());
        store.save_variance_report(report).await.unwrap();

        for dataset in [
            Dataset::Products,
            Dataset::Inventory,
            Dataset::Sales,
            Dataset::SpecialOutbound,
            Dataset::Variance,
        ] {
            let output = service
                .export(dataset, ExportFormat::Csv, RecordFilter::new())
                .await
                .unwrap();
            let header = output.body.lines().next().unwrap();
            assert_eq!(header, dataset.columns().join(","), "{}", dataset.as_str());
        }
    }
}
