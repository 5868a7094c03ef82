//! Bulk product code validation
//!
//! Checks text pasted from a spreadsheet or chat message against the active
//! catalog. Each non-blank line holds a product code, optionally followed by
//! a quantity in its last column.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

use crate::storage::{normalize_code, Product};

/// Column separators: tab, comma, semicolon or any whitespace
static SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\t,;\s]+").expect("separator regex"));

static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,32}$").expect("code regex"));

const MAX_SUGGESTIONS: usize = 3;

/// Whether a (trimmed) code has an acceptable shape
pub fn is_valid_code(code: &str) -> bool {
    CODE_PATTERN.is_match(code.trim())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Valid,
    UnknownCode,
    Duplicate,
    InvalidQuantity,
}

/// Outcome for one pasted line
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedEntry {
    pub line_number: usize,
    pub code: String,
    pub quantity: Option<f64>,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ValidationSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub entries: Vec<ValidatedEntry>,
    pub summary: ValidationSummary,
}

/// Validator over a snapshot of the catalog
pub struct CodeValidator {
    catalog: BTreeSet<String>,
}

impl CodeValidator {
    /// Build from products; inactive products are not accepted
    pub fn new(products: &[Product]) -> Self {
        let catalog = products
            .iter()
            .filter(|p| p.active)
            .map(|p| normalize_code(&p.code))
            .collect();
        Self { catalog }
    }

    pub fn validate(&self, text: &str) -> ValidationReport {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let columns: Vec<&str> = SEPARATOR
                .split(line.trim())
                .filter(|c| !c.is_empty())
                .collect();
            let Some(first) = columns.first() else {
                continue;
            };

            let code = normalize_code(first);
            let raw_quantity = if columns.len() > 1 {
                columns.last().copied()
            } else {
                None
            };
            let quantity = raw_quantity.and_then(parse_quantity);

            let mut suggestions = Vec::new();
            let status = if !self.catalog.contains(&code) {
                suggestions = self.suggest(&code);
                EntryStatus::UnknownCode
            } else if seen.contains(&code) {
                EntryStatus::Duplicate
            } else if raw_quantity.is_some() && quantity.is_none() {
                EntryStatus::InvalidQuantity
            } else {
                // only accepted lines claim the code
                seen.insert(code.clone());
                EntryStatus::Valid
            };

            entries.push(ValidatedEntry {
                line_number: index + 1,
                code,
                quantity,
                status,
                suggestions,
            });
        }

        let valid = entries
            .iter()
            .filter(|e| e.status == EntryStatus::Valid)
            .count();
        let summary = ValidationSummary {
            total: entries.len(),
            valid,
            invalid: entries.len() - valid,
        };

        tracing::debug!(total = summary.total, invalid = summary.invalid, "Validated pasted codes");
        ValidationReport { entries, summary }
    }

    /// Catalog codes close to an unknown one: prefix matches first, then
    /// codes containing it, then codes sharing at least three leading characters
    fn suggest(&self, code: &str) -> Vec<String> {
        if code.is_empty() || !is_valid_code(code) {
            return Vec::new();
        }

        let mut ranked: Vec<(u8, &String)> = self
            .catalog
            .iter()
            .filter_map(|candidate| {
                let rank = if candidate.starts_with(code) || code.starts_with(candidate.as_str()) {
                    0
                } else if candidate.contains(code) {
                    1
                } else if common_prefix_len(candidate, code) >= 3 {
                    2
                } else {
                    return None;
                };
                Some((rank, candidate))
            })
            .collect();

        ranked.sort();
        ranked
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, c)| c.clone())
            .collect()
    }
}

/// Finite, non-negative quantity
fn parse_quantity(raw: &str) -> Option<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|q| q.is_finite() && *q >= 0.0)
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> CodeValidator {
        CodeValidator::new(&[
            Product::new("SP001", "Tea", "box"),
            Product::new("SP002", "Coffee", "bag"),
            Product::new("SP010", "Sugar", "kg"),
            Product::new("OLD01", "Retired", "box").active(false),
        ])
    }

    #[test]
    fn test_code_shape() {
        assert!(is_valid_code("SP-001_a"));
        assert!(is_valid_code(" sp001 "));
        assert!(!is_valid_code(""));
        assert!(!is_valid_code("SP 001"));
        assert!(!is_valid_code(&"A".repeat(33)));
    }

    #[test]
    fn test_separators_and_case() {
        let report = validator().validate("sp001\t5\nSP002,3\nsp010;  7.5\n");

        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.valid, 3);
        assert_eq!(report.entries[0].code, "SP001");
        assert_eq!(report.entries[0].quantity, Some(5.0));
        assert_eq!(report.entries[2].quantity, Some(7.5));
    }

    #[test]
    fn test_blank_lines_skipped_but_numbered() {
        let report = validator().validate("SP001\n\n   \nSP002\n");

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.entries[1].line_number, 4);
        assert_eq!(report.entries[0].quantity, None);
    }

    #[test]
    fn test_unknown_with_suggestions() {
        let report = validator().validate("SP00\nXYZ\n");

        let unknown = &report.entries[0];
        assert_eq!(unknown.status, EntryStatus::UnknownCode);
        assert_eq!(unknown.suggestions, vec!["SP001", "SP002", "SP010"]);

        assert_eq!(report.entries[1].status, EntryStatus::UnknownCode);
        assert!(report.entries[1].suggestions.is_empty());
        assert_eq!(report.summary.invalid, 2);
    }

    #[test]
    fn test_inactive_products_are_unknown() {
        let report = validator().validate("OLD01 1");
        assert_eq!(report.entries[0].status, EntryStatus::UnknownCode);
    }

    #[test]
    fn test_duplicates() {
        let report = validator().validate("SP001 1\nsp001 2\n");

        assert_eq!(report.entries[0].status, EntryStatus::Valid);
        assert_eq!(report.entries[1].status, EntryStatus::Duplicate);
        assert_eq!(report.summary.valid, 1);
    }

    #[test]
    fn test_invalid_quantity() {
        let report = validator().validate("SP001\tabc\nSP002\t-4\n");

        assert_eq!(report.entries[0].status, EntryStatus::InvalidQuantity);
        assert_eq!(report.entries[1].status, EntryStatus::InvalidQuantity);
        assert_eq!(report.summary.invalid, 2);
    }

    #[test]
    fn test_corrected_line_after_invalid_quantity_is_valid() {
        let report = validator().validate("SP001\tabc\nSP001\t3\nSP001\t4\n");

        assert_eq!(report.entries[0].status, EntryStatus::InvalidQuantity);
        assert_eq!(report.entries[1].status, EntryStatus::Valid);
        assert_eq!(report.entries[1].quantity, Some(3.0));
        assert_eq!(report.entries[2].status, EntryStatus::Duplicate);
        assert_eq!(report.summary.valid, 1);
    }

    #[test]
    fn test_name_column_ignored() {
        let report = validator().validate("SP001\tGreen tea\t12");
        assert_eq!(report.entries[0].status, EntryStatus::Valid);
        assert_eq!(report.entries[0].quantity, Some(12.0));
    }

    #[test]
    fn test_summary_serialization() {
        let report = validator().validate("SP001 1");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["valid"], 1);
        assert_eq!(json["entries"][0]["status"], "valid");
    }
}
