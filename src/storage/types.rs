//! Core data types for the Stocktake inventory store
//!
//! This module defines the records persisted by every store backend:
//! - `Product`: catalog entry
//! - `InventoryRecord`: inbound/outbound stock movement
//! - `SalesRecord`: sold and promotional quantities
//! - `SpecialOutboundRecord`: outbound that needs approval
//! - `VarianceReport`: book vs. actual stock for a product/date
//! - `ApprovalLog` and `ExportLog`: audit trails
//! - `DateRange` and `RecordFilter`: query helpers

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::variance::{calculate, VarianceFigures, VarianceInputs};

/// A catalog product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique identifier (assigned by the store)
    pub id: u32,
    /// Short product code used for bulk entry (e.g. "SP001")
    pub code: String,
    /// Display name
    pub name: String,
    /// Unit of measure (e.g. "box", "kg")
    pub unit: String,
    /// Free-form category
    #[serde(default)]
    pub category: String,
    /// Default selling price per unit
    #[serde(default)]
    pub unit_price: f64,
    /// Inactive products are hidden from bulk-entry validation
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Product {
    /// Create a new active product
    pub fn new(code: impl Into<String>, name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            id: 0, // Will be assigned by the store
            code: normalize_code(&code.into()),
            name: name.into(),
            unit: unit.into(),
            category: String::new(),
            unit_price: 0.0,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Builder: set category
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Builder: set unit price
    pub fn unit_price(mut self, price: f64) -> Self {
        self.unit_price = price;
        self
    }

    /// Builder: set active flag
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// Normalize a product code for comparison and storage
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
    /// Goods received into stock
    Inbound,
    /// Goods dispatched from stock
    Outbound,
}

impl Movement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Movement::Inbound => "inbound",
            Movement::Outbound => "outbound",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "inbound" | "in" => Some(Movement::Inbound),
            "outbound" | "out" => Some(Movement::Outbound),
            _ => None,
        }
    }
}

impl std::fmt::Display for Movement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded stock movement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryRecord {
    pub id: u32,
    pub product_id: u32,
    pub record_date: NaiveDate,
    pub movement: Movement,
    pub quantity: f64,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InventoryRecord {
    pub fn new(product_id: u32, record_date: NaiveDate, movement: Movement, quantity: f64) -> Self {
        Self {
            id: 0,
            product_id,
            record_date,
            movement,
            quantity,
            note: None,
            created_at: Utc::now(),
        }
    }

    /// Builder: attach a note
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// A recorded sale
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalesRecord {
    pub id: u32,
    pub product_id: u32,
    pub sale_date: NaiveDate,
    /// Units sold
    pub quantity: f64,
    /// Units given away under a promotion
    #[serde(default)]
    pub promotion_quantity: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub customer: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SalesRecord {
    pub fn new(product_id: u32, sale_date: NaiveDate, quantity: f64, unit_price: f64) -> Self {
        Self {
            id: 0,
            product_id,
            sale_date,
            quantity,
            promotion_quantity: 0.0,
            unit_price,
            customer: None,
            created_at: Utc::now(),
        }
    }

    /// Builder: set promotional quantity
    pub fn promotion(mut self, quantity: f64) -> Self {
        self.promotion_quantity = quantity;
        self
    }

    /// Builder: set customer
    pub fn customer(mut self, customer: impl Into<String>) -> Self {
        self.customer = Some(customer.into());
        self
    }

    /// Revenue of this sale (promotional units are free)
    pub fn revenue(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// Approval state of a special outbound
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(ApprovalStatus::Pending),
            "approved" => Some(ApprovalStatus::Approved),
            "rejected" => Some(ApprovalStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound outside the normal sales flow (damage, samples, write-offs)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecialOutboundRecord {
    pub id: u32,
    pub product_id: u32,
    pub outbound_date: NaiveDate,
    pub quantity: f64,
    pub reason: String,
    pub status: ApprovalStatus,
    pub requested_by: String,
    #[serde(default)]
    pub decided_by: Option<String>,
    #[serde(default)]
    pub decision_note: Option<String>,
    #[serde(default)]
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SpecialOutboundRecord {
    /// Create a pending request
    pub fn new(
        product_id: u32,
        outbound_date: NaiveDate,
        quantity: f64,
        reason: impl Into<String>,
        requested_by: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            product_id,
            outbound_date,
            quantity,
            reason: reason.into(),
            status: ApprovalStatus::Pending,
            requested_by: requested_by.into(),
            decided_by: None,
            decision_note: None,
            decided_at: None,
            created_at: Utc::now(),
        }
    }
}

/// Book vs. actual stock for one product on one date.
///
/// Only the base quantities are stored. Derived figures come from
/// [`VarianceReport::figures`] so they always match the inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VarianceReport {
    pub id: u32,
    pub product_id: u32,
    pub report_date: NaiveDate,
    #[serde(flatten)]
    pub inputs: VarianceInputs,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VarianceReport {
    pub fn new(product_id: u32, report_date: NaiveDate, inputs: VarianceInputs) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            product_id,
            report_date,
            inputs,
            note: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder: attach a note
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Derived book inventory, variance and percentage
    pub fn figures(&self) -> VarianceFigures {
        calculate(&self.inputs)
    }
}

/// Kind of approval event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalAction {
    Submitted,
    Approved,
    Rejected,
}

impl ApprovalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalAction::Submitted => "submitted",
            ApprovalAction::Approved => "approved",
            ApprovalAction::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(ApprovalAction::Submitted),
            "approved" => Some(ApprovalAction::Approved),
            "rejected" => Some(ApprovalAction::Rejected),
            _ => None,
        }
    }
}

/// Audit entry for the special outbound workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApprovalLog {
    pub id: u32,
    pub outbound_id: u32,
    pub action: ApprovalAction,
    pub actor: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ApprovalLog {
    pub fn new(
        outbound_id: u32,
        action: ApprovalAction,
        actor: impl Into<String>,
        comment: Option<String>,
    ) -> Self {
        Self {
            id: 0,
            outbound_id,
            action,
            actor: actor.into(),
            comment,
            created_at: Utc::now(),
        }
    }
}

/// Audit entry for a data export
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportLog {
    pub id: u32,
    pub dataset: String,
    pub format: String,
    pub row_count: u32,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, returning None if start is after end
    pub fn try_new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        if start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// A range covering a single day
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Check if a date falls within this range
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of days covered
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Filter for record listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub product_id: Option<u32>,
    pub range: Option<DateRange>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn product(mut self, product_id: u32) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Check if a record for `product_id` on `date` matches this filter
    pub fn matches(&self, product_id: u32, date: NaiveDate) -> bool {
        if let Some(id) = self.product_id {
            if id != product_id {
                return false;
            }
        }

        if let Some(range) = self.range {
            if !range.contains(date) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_product_code_is_normalized() {
        let product = Product::new("  sp001 ", "Green tea", "box");
        assert_eq!(product.code, "SP001");
        assert!(product.active);
    }

    #[test]
    fn test_sale_revenue_excludes_promotion() {
        let sale = SalesRecord::new(1, date(1), 4.0, 2.5).promotion(3.0);
        assert_eq!(sale.revenue(), 10.0);
    }

    #[test]
    fn test_date_range_contains() {
        let range = DateRange::try_new(date(1), date(10)).unwrap();

        assert!(range.contains(date(1)));
        assert!(range.contains(date(10)));
        assert!(!range.contains(date(11)));
        assert_eq!(range.days(), 10);
        assert!(DateRange::try_new(date(5), date(4)).is_none());
    }

    #[test]
    fn test_record_filter() {
        let filter = RecordFilter::new().product(2).range(DateRange::day(date(3)));

        assert!(filter.matches(2, date(3)));
        assert!(!filter.matches(1, date(3)));
        assert!(!filter.matches(2, date(4)));
        assert!(RecordFilter::new().matches(9, date(30)));
    }

    #[test]
    fn test_variance_report_serializes_flat_inputs() {
        let inputs = VarianceInputs {
            beginning_inventory: 100.0,
            inbound_quantity: 50.0,
            sales_quantity: 30.0,
            promotion_quantity: 10.0,
            special_outbound_quantity: 5.0,
            actual_inventory: 100.0,
        };
        let report = VarianceReport::new(1, date(2), inputs);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["beginning_inventory"], 100.0);
        assert_eq!(json["actual_inventory"], 100.0);
        assert_eq!(report.figures().book_inventory, 105.0);
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!(Movement::parse("IN"), Some(Movement::Inbound));
        assert_eq!(ApprovalStatus::parse("approved"), Some(ApprovalStatus::Approved));
        assert_eq!(ApprovalAction::parse("nope"), None);
    }
}
