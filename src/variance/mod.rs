//! Inventory variance
//!
//! - **calculator**: Pure book/variance/percentage arithmetic and severity
//! - **service**: Report submission, prefill from recorded data, listing

pub mod calculator;
pub mod service;

pub use calculator::{
    assess, calculate, Severity, SuggestedCorrection, Thresholds, VarianceAssessment,
    VarianceFigures, VarianceInputs, DEFAULT_HIGH_THRESHOLD, DEFAULT_MEDIUM_THRESHOLD,
};
pub use service::{AssessedReport, VarianceService, VarianceSubmission};

use thiserror::Error;

/// Errors from variance operations
#[derive(Error, Debug)]
pub enum VarianceError {
    /// Submitted quantities are invalid
    #[error("Invalid variance report: {0}")]
    Validation(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for variance operations
pub type VarianceResult<T> = Result<T, VarianceError>;
