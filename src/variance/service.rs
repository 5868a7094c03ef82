//! Variance report service
//!
//! Reports are keyed by `(product_id, report_date)`. A re-submission
//! replaces every base quantity of the existing report; derived figures
//! are never stored and are recomputed whenever a report is returned.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::storage::{
    ApprovalStatus, DateRange, InventoryStore, Movement, RecordFilter, VarianceReport,
};
use crate::variance::calculator::{assess, Severity, Thresholds, VarianceAssessment, VarianceInputs};
use crate::variance::{VarianceError, VarianceResult};

/// A report as submitted by a user
#[derive(Debug, Clone, Deserialize)]
pub struct VarianceSubmission {
    pub product_id: u32,
    pub report_date: NaiveDate,
    #[serde(flatten)]
    pub inputs: VarianceInputs,
    #[serde(default)]
    pub note: Option<String>,
}

/// Stored report together with its derived figures and severity
#[derive(Debug, Clone, Serialize)]
pub struct AssessedReport {
    #[serde(flatten)]
    pub report: VarianceReport,
    #[serde(flatten)]
    pub assessment: VarianceAssessment,
}

/// Submission, prefill and listing of variance reports
pub struct VarianceService {
    store: Arc<dyn InventoryStore>,
    thresholds: Thresholds,
}

impl VarianceService {
    pub fn new(store: Arc<dyn InventoryStore>, thresholds: Thresholds) -> Self {
        Self { store, thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Stateless calculation, nothing is stored
    pub fn preview(&self, inputs: &VarianceInputs) -> VarianceAssessment {
        assess(inputs, &self.thresholds)
    }

    /// Attach derived figures to a stored report
    pub fn assess_report(&self, report: VarianceReport) -> AssessedReport {
        let assessment = assess(&report.inputs, &self.thresholds);
        AssessedReport { report, assessment }
    }

    /// Create or fully replace the report for a product and date
    pub async fn submit(&self, submission: VarianceSubmission) -> VarianceResult<AssessedReport> {
        validate_inputs(&submission.inputs)?;

        // Fails with NotFound for unknown products
        self.store.get_product(submission.product_id).await?;

        let report = match self
            .store
            .find_variance_report(submission.product_id, submission.report_date)
            .await?
        {
            Some(mut existing) => {
                existing.inputs = submission.inputs;
                existing.note = submission.note;
                existing
            }
            None => {
                let mut report = VarianceReport::new(
                    submission.product_id,
                    submission.report_date,
                    submission.inputs,
                );
                report.note = submission.note;
                report
            }
        };

        let replaced = report.id != 0;
        let saved = self.store.save_variance_report(report).await?;
        let assessed = self.assess_report(saved);

        tracing::info!(
            report_id = assessed.report.id,
            product_id = assessed.report.product_id,
            report_date = %assessed.report.report_date,
            replaced,
            variance = assessed.assessment.figures.variance,
            severity = %assessed.assessment.severity,
            "Variance report saved"
        );

        if assessed.assessment.severity == Severity::High {
            tracing::warn!(
                report_id = assessed.report.id,
                variance_percentage = assessed.assessment.figures.variance_percentage,
                "High inventory variance"
            );
        }

        Ok(assessed)
    }

    /// Derive the base quantities for a product and date from recorded data.
    ///
    /// `actual_inventory` is left at zero for the user to count.
    pub async fn prefill(&self, product_id: u32, date: NaiveDate) -> VarianceResult<VarianceInputs> {
        self.store.get_product(product_id).await?;

        let day = RecordFilter::new().product(product_id).range(DateRange::day(date));

        let beginning_inventory = self
            .store
            .list_variance_reports(RecordFilter::new().product(product_id))
            .await?
            .into_iter()
            .filter(|r| r.report_date < date)
            .max_by_key(|r| r.report_date)
            .map(|r| r.inputs.actual_inventory)
            .unwrap_or(0.0);

        let inbound_quantity = self
            .store
            .list_inventory(day)
            .await?
            .iter()
            .filter(|r| r.movement == Movement::Inbound)
            .map(|r| r.quantity)
            .sum();

        let sales = self.store.list_sales(day).await?;
        let sales_quantity = sales.iter().map(|s| s.quantity).sum();
        let promotion_quantity = sales.iter().map(|s| s.promotion_quantity).sum();

        let special_outbound_quantity = self
            .store
            .list_special_outbound(day, Some(ApprovalStatus::Approved))
            .await?
            .iter()
            .map(|r| r.quantity)
            .sum();

        Ok(VarianceInputs {
            beginning_inventory,
            inbound_quantity,
            sales_quantity,
            promotion_quantity,
            special_outbound_quantity,
            actual_inventory: 0.0,
        })
    }

    pub async fn get(&self, id: u32) -> VarianceResult<AssessedReport> {
        let report = self.store.get_variance_report(id).await?;
        Ok(self.assess_report(report))
    }

    pub async fn list(&self, filter: RecordFilter) -> VarianceResult<Vec<AssessedReport>> {
        let reports = self.store.list_variance_reports(filter).await?;
        Ok(reports.into_iter().map(|r| self.assess_report(r)).collect())
    }

    pub async fn delete(&self, id: u32) -> VarianceResult<()> {
        self.store.delete_variance_report(id).await?;
        tracing::info!(report_id = id, "Variance report deleted");
        Ok(())
    }
}

/// All quantities must be finite and non-negative
fn validate_inputs(inputs: &VarianceInputs) -> VarianceResult<()> {
    for (name, value) in inputs.named() {
        if !value.is_finite() {
            return Err(VarianceError::Validation(format!("{} must be a number", name)));
        }
        if value < 0.0 {
            return Err(VarianceError::Validation(format!(
                "{} cannot be negative (got {})",
                name, value
            )));
        }
    }
    Ok(())
}
