//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::storage::{
    normalize_code, ApprovalStatus, DateRange, InventoryRecord, Movement, Product, RecordFilter,
    SalesRecord,
};
use crate::validation::is_valid_code;
use crate::variance::VarianceInputs;

// ============================================
// COMMON DTOs
// ============================================

/// List response wrapper
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

/// Query parameters for the product catalog
#[derive(Debug, Default, Deserialize)]
pub struct ProductParams {
    /// Exact product code, case-insensitive
    #[serde(default)]
    pub code: Option<String>,
}

/// Query parameters shared by record list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub product_id: Option<u32>,
    /// Inclusive start date (YYYY-MM-DD)
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// Inclusive end date (YYYY-MM-DD)
    #[serde(default)]
    pub end: Option<NaiveDate>,
    /// Special outbound status filter
    #[serde(default)]
    pub status: Option<ApprovalStatus>,
}

/// Open bounds used when only one side of a range is given
fn earliest() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn latest() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

impl ListParams {
    /// Build a store filter; an open end of the range is unbounded
    pub fn filter(&self) -> ApiResult<RecordFilter> {
        let mut filter = RecordFilter::new();
        if let Some(id) = self.product_id {
            filter = filter.product(id);
        }
        if self.start.is_some() || self.end.is_some() {
            let start = self.start.unwrap_or_else(earliest);
            let end = self.end.unwrap_or_else(latest);
            filter = filter.range(parse_range(start, end)?);
        }
        Ok(filter)
    }
}

/// Query parameters for reports. Defaults to the last 30 days.
#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    #[serde(default)]
    pub product_id: Option<u32>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl ReportParams {
    pub fn range(&self) -> ApiResult<DateRange> {
        let end = self.end.unwrap_or_else(|| Utc::now().date_naive());
        let start = self.start.unwrap_or(end - Duration::days(29));
        parse_range(start, end)
    }
}

fn parse_range(start: NaiveDate, end: NaiveDate) -> ApiResult<DateRange> {
    DateRange::try_new(start, end).ok_or_else(|| {
        ApiError::Validation(format!("start ({}) must not be after end ({})", start, end))
    })
}

/// Non-negative finite quantity check
fn non_negative(value: f64, field: &str) -> ApiResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::Validation(format!(
            "{} must be a non-negative number (got {})",
            field, value
        )));
    }
    Ok(())
}

fn positive(value: f64, field: &str) -> ApiResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ApiError::Validation(format!(
            "{} must be greater than zero (got {})",
            field, value
        )));
    }
    Ok(())
}

// ============================================
// PRODUCT DTOs
// ============================================

/// Create product request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    /// Product code (unique, case-insensitive)
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl CreateProductRequest {
    pub fn into_product(self) -> ApiResult<Product> {
        validate_code(&self.code)?;
        validate_name(&self.name)?;
        non_negative(self.unit_price, "unit_price")?;

        Ok(Product::new(self.code, self.name.trim(), self.unit.trim())
            .category(self.category.trim())
            .unit_price(self.unit_price)
            .active(self.active))
    }
}

/// Update product request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl UpdateProductRequest {
    pub fn apply(self, mut product: Product) -> ApiResult<Product> {
        if let Some(code) = self.code {
            validate_code(&code)?;
            product.code = normalize_code(&code);
        }
        if let Some(name) = self.name {
            validate_name(&name)?;
            product.name = name.trim().to_string();
        }
        if let Some(unit) = self.unit {
            product.unit = unit.trim().to_string();
        }
        if let Some(category) = self.category {
            product.category = category.trim().to_string();
        }
        if let Some(price) = self.unit_price {
            non_negative(price, "unit_price")?;
            product.unit_price = price;
        }
        if let Some(active) = self.active {
            product.active = active;
        }
        Ok(product)
    }
}

fn validate_code(code: &str) -> ApiResult<()> {
    if !is_valid_code(code) {
        return Err(ApiError::Validation(format!(
            "Invalid product code {:?}: use 1-32 letters, digits, '-' or '_'",
            code
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> ApiResult<()> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".to_string()));
    }
    Ok(())
}

// ============================================
// INVENTORY & SALES DTOs
// ============================================

/// Record a stock movement
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInventoryRequest {
    pub product_id: u32,
    pub record_date: NaiveDate,
    /// "inbound" or "outbound"
    pub movement: Movement,
    pub quantity: f64,
    #[serde(default)]
    pub note: Option<String>,
}

impl CreateInventoryRequest {
    pub fn into_record(self) -> ApiResult<InventoryRecord> {
        positive(self.quantity, "quantity")?;
        let mut record =
            InventoryRecord::new(self.product_id, self.record_date, self.movement, self.quantity);
        record.note = self.note.filter(|n| !n.trim().is_empty());
        Ok(record)
    }
}

/// Record a sale
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSaleRequest {
    pub product_id: u32,
    pub sale_date: NaiveDate,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub promotion_quantity: f64,
    /// Defaults to the product's unit price
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub customer: Option<String>,
}

impl CreateSaleRequest {
    pub fn into_record(self, product: &Product) -> ApiResult<SalesRecord> {
        non_negative(self.quantity, "quantity")?;
        non_negative(self.promotion_quantity, "promotion_quantity")?;
        if self.quantity == 0.0 && self.promotion_quantity == 0.0 {
            return Err(ApiError::Validation(
                "quantity or promotion_quantity must be greater than zero".to_string(),
            ));
        }
        let unit_price = self.unit_price.unwrap_or(product.unit_price);
        non_negative(unit_price, "unit_price")?;

        let mut record = SalesRecord::new(product.id, self.sale_date, self.quantity, unit_price)
            .promotion(self.promotion_quantity);
        record.customer = self.customer.filter(|c| !c.trim().is_empty());
        Ok(record)
    }
}

// ============================================
// SPECIAL OUTBOUND DTOs
// ============================================

/// Approve a pending special outbound
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub approver: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Reject a pending special outbound
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub approver: String,
    #[serde(default)]
    pub reason: String,
}

// ============================================
// VARIANCE DTOs
// ============================================

/// Query for prefilled variance inputs
#[derive(Debug, Deserialize)]
pub struct PrefillParams {
    pub product_id: u32,
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct PrefillResponse {
    pub product_id: u32,
    pub report_date: NaiveDate,
    #[serde(flatten)]
    pub inputs: VarianceInputs,
}

/// Turn a report's suggested correction into a special outbound request
#[derive(Debug, Deserialize)]
pub struct SuggestOutboundRequest {
    pub requested_by: String,
}

// ============================================
// VALIDATION DTOs
// ============================================

/// Pasted text to validate
#[derive(Debug, Deserialize)]
pub struct ValidateCodesRequest {
    pub text: String,
}

// ============================================
// EXPORT DTOs
// ============================================

/// Export query parameters
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    /// products, inventory, sales, special_outbound or variance
    pub dataset: String,
    /// csv or json
    #[serde(default = "default_export_format")]
    pub format: String,
    #[serde(default)]
    pub product_id: Option<u32>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

fn default_export_format() -> String {
    "csv".to_string()
}

impl ExportParams {
    pub fn filter(&self) -> ApiResult<RecordFilter> {
        ListParams {
            product_id: self.product_id,
            start: self.start,
            end: self.end,
            status: None,
        }
        .filter()
    }
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: healthy, degraded, unhealthy
    pub status: String,
    /// Storage status: ok, error
    pub storage: String,
    /// Active backend name
    pub backend: String,
    /// Whether sample data is being served after a backend failure
    pub fallback_active: bool,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Server version
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_list_params_filter() {
        let params = ListParams {
            product_id: Some(2),
            start: Some(date("2024-01-10")),
            end: None,
            status: None,
        };
        let filter = params.filter().unwrap();
        assert_eq!(filter.product_id, Some(2));
        let range = filter.range.unwrap();
        assert_eq!(range.start, date("2024-01-10"));
        assert!(range.contains(date("2099-01-01")));

        assert!(ListParams::default().filter().unwrap().range.is_none());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let params = ListParams {
            start: Some(date("2024-02-01")),
            end: Some(date("2024-01-01")),
            ..Default::default()
        };
        assert!(matches!(params.filter(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_report_params_default_range() {
        let range = ReportParams {
            end: Some(date("2024-03-30")),
            ..Default::default()
        }
        .range()
        .unwrap();
        assert_eq!(range.start, date("2024-03-01"));
        assert_eq!(range.days(), 30);
    }

    #[test]
    fn test_create_product_validation() {
        let req: CreateProductRequest =
            serde_json::from_str(r#"{"code": " sp-01 ", "name": "Tea", "unit": "box"}"#).unwrap();
        let product = req.into_product().unwrap();
        assert_eq!(product.code, "SP-01");
        assert!(product.active);

        let bad: CreateProductRequest =
            serde_json::from_str(r#"{"code": "SP 01", "name": "Tea"}"#).unwrap();
        assert!(bad.into_product().is_err());

        let unnamed: CreateProductRequest =
            serde_json::from_str(r#"{"code": "SP01", "name": "  "}"#).unwrap();
        assert!(unnamed.into_product().is_err());
    }

    #[test]
    fn test_sale_requires_quantity_or_promotion() {
        let product = Product::new("SP1", "Tea", "box").unit_price(12.0);
        let req: CreateSaleRequest =
            serde_json::from_str(r#"{"product_id": 1, "sale_date": "2024-01-01"}"#).unwrap();
        assert!(req.into_record(&product).is_err());

        let promo: CreateSaleRequest = serde_json::from_str(
            r#"{"product_id": 1, "sale_date": "2024-01-01", "promotion_quantity": 2}"#,
        )
        .unwrap();
        let record = promo.into_record(&product).unwrap();
        assert_eq!(record.unit_price, 12.0);
        assert_eq!(record.revenue(), 0.0);
    }

    #[test]
    fn test_inventory_quantity_must_be_positive() {
        let req: CreateInventoryRequest = serde_json::from_str(
            r#"{"product_id": 1, "record_date": "2024-01-01", "movement": "inbound", "quantity": 0}"#,
        )
        .unwrap();
        assert!(req.into_record().is_err());
    }
}
