//! Verifiability report produced alongside every invoice record.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Confidence and consistency report for one invoice record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Per-field presence and confidence.
    pub field_verification: BTreeMap<String, FieldVerification>,

    /// Per-row arithmetic checks, in table order.
    pub line_items_verification: Vec<LineItemVerification>,

    /// Recomputed totals compared against extracted ones.
    pub total_calculations_verification: TotalCalculations,

    /// Overall outcome.
    pub summary: VerificationSummary,
}

/// Presence and confidence of one scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldVerification {
    /// Mean OCR confidence of the value's words (0.0 - 1.0).
    pub confidence: f32,
    /// Whether a real value was extracted.
    pub present: bool,
}

/// Arithmetic check for one line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemVerification {
    /// 1-based row index in the table.
    pub row: usize,
    /// Serial number as printed, or the sentinel.
    pub serial_number: String,
    /// `quantity * unit_price` against the printed line total.
    pub line_total_check: ValueCheck,
}

/// A recomputed value compared against the extracted one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCheck {
    /// Value recomputed from other fields.
    pub calculated_value: Decimal,
    /// Value as extracted from the document.
    pub extracted_value: Decimal,
    /// Whether both agree within tolerance.
    pub check_passed: bool,
}

/// A totals check that also carries the extracted value's OCR confidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalCheck {
    /// Value recomputed from line items and other totals.
    pub calculated_value: Decimal,
    /// Value as extracted from the document.
    pub extracted_value: Decimal,
    /// Whether both agree within tolerance.
    pub check_passed: bool,
    /// Mean OCR confidence of the extracted value.
    pub confidence: f32,
}

/// Checks over the invoice totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalCalculations {
    pub subtotal_check: TotalCheck,
    pub discount_check: TotalCheck,
    pub gst_check: TotalCheck,
    pub final_total_check: TotalCheck,
}

/// Overall verification outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationSummary {
    /// Human-readable quality problems, in discovery order.
    pub issues: Vec<String>,
    /// Invoice number, invoice date and final total are all present.
    pub all_fields_present: bool,
    /// Every line item passed its arithmetic check (true when there are none).
    pub all_line_items_valid: bool,
}

impl Default for VerificationSummary {
    fn default() -> Self {
        Self {
            issues: Vec::new(),
            all_fields_present: false,
            all_line_items_valid: true,
        }
    }
}

impl VerificationReport {
    /// Whether the report found nothing to complain about.
    pub fn is_clean(&self) -> bool {
        self.summary.issues.is_empty()
            && self.summary.all_fields_present
            && self.summary.all_line_items_valid
    }
}
