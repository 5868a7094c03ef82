//! Variance calculator
//!
//! Derives book inventory, variance and variance percentage from the
//! recorded quantities of a product on one date, and classifies how far
//! the physical count is off.
//!
//! ```text
//! book       = beginning + inbound - sales - promotion - special_outbound
//! variance   = actual - book
//! percentage = variance / book * 100   (0 when book <= 0)
//! ```

use serde::{Deserialize, Serialize};

/// Default `|percentage|` at or above which a variance is high
pub const DEFAULT_HIGH_THRESHOLD: f64 = 10.0;

/// Default `|percentage|` at or above which a variance is medium
pub const DEFAULT_MEDIUM_THRESHOLD: f64 = 5.0;

/// Base quantities of a variance report
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VarianceInputs {
    #[serde(default)]
    pub beginning_inventory: f64,
    #[serde(default)]
    pub inbound_quantity: f64,
    #[serde(default)]
    pub sales_quantity: f64,
    #[serde(default)]
    pub promotion_quantity: f64,
    #[serde(default)]
    pub special_outbound_quantity: f64,
    /// Physically counted stock
    #[serde(default)]
    pub actual_inventory: f64,
}

impl VarianceInputs {
    /// Iterate over the named quantities (for validation and logging)
    pub fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("beginning_inventory", self.beginning_inventory),
            ("inbound_quantity", self.inbound_quantity),
            ("sales_quantity", self.sales_quantity),
            ("promotion_quantity", self.promotion_quantity),
            ("special_outbound_quantity", self.special_outbound_quantity),
            ("actual_inventory", self.actual_inventory),
        ]
    }
}

/// Figures derived from [`VarianceInputs`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarianceFigures {
    pub book_inventory: f64,
    pub variance: f64,
    pub variance_percentage: f64,
}

/// Compute the derived figures. Total over all inputs, negatives included.
pub fn calculate(inputs: &VarianceInputs) -> VarianceFigures {
    let book_inventory = inputs.beginning_inventory + inputs.inbound_quantity
        - inputs.sales_quantity
        - inputs.promotion_quantity
        - inputs.special_outbound_quantity;

    let variance = inputs.actual_inventory - book_inventory;

    let variance_percentage = if book_inventory > 0.0 {
        variance / book_inventory * 100.0
    } else {
        0.0
    };

    VarianceFigures {
        book_inventory,
        variance,
        variance_percentage,
    }
}

/// Classification thresholds on `|variance_percentage|`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high: DEFAULT_HIGH_THRESHOLD,
            medium: DEFAULT_MEDIUM_THRESHOLD,
        }
    }
}

/// How far the count is from the book figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

impl Severity {
    /// Classify a percentage against the given thresholds (inclusive)
    pub fn classify(percentage: f64, thresholds: &Thresholds) -> Self {
        let magnitude = percentage.abs();
        if magnitude >= thresholds.high {
            Severity::High
        } else if magnitude >= thresholds.medium {
            Severity::Medium
        } else if magnitude > 0.0 {
            Severity::Low
        } else {
            Severity::None
        }
    }

    pub fn all() -> &'static [Severity] {
        &[Severity::None, Severity::Low, Severity::Medium, Severity::High]
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::None => write!(f, "none"),
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// Special outbound suggested to bring the book figure in line with a shortage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedCorrection {
    pub quantity: f64,
    pub reason: String,
}

/// Figures plus classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceAssessment {
    #[serde(flatten)]
    pub figures: VarianceFigures,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_correction: Option<SuggestedCorrection>,
}

/// Calculate and classify in one step.
///
/// Only a high shortage (`variance < 0`) yields a correction; a surplus
/// cannot be fixed by recording more outbound.
pub fn assess(inputs: &VarianceInputs, thresholds: &Thresholds) -> VarianceAssessment {
    let figures = calculate(inputs);
    let severity = Severity::classify(figures.variance_percentage, thresholds);

    let suggested_correction = if severity == Severity::High && figures.variance < 0.0 {
        Some(SuggestedCorrection {
            quantity: figures.variance.abs(),
            reason: format!(
                "Stock count shortage of {} ({:.2}% of book inventory {})",
                figures.variance.abs(),
                figures.variance_percentage,
                figures.book_inventory
            ),
        })
    } else {
        None
    };

    VarianceAssessment {
        figures,
        severity,
        suggested_correction,
    }
}
