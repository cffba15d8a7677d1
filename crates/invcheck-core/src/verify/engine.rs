//! Field presence, confidence and arithmetic consistency checks.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::debug;

use super::ConfidenceIndex;
use crate::error::ExtractionError;
use crate::invoice::rules::amounts::{round_money, within_tolerance};
use crate::models::config::VerificationConfig;
use crate::models::invoice::{is_found, InvoiceRecord, LineItem};
use crate::models::report::{
    FieldVerification, LineItemVerification, TotalCalculations, TotalCheck, ValueCheck,
    VerificationReport, VerificationSummary,
};

/// Fields that must be present for a record to count as complete.
const REQUIRED_FIELDS: [&str; 3] = ["invoice_number", "invoice_date", "final_total"];

/// A scalar field's value as seen by the verifier.
enum FieldValue<'a> {
    Text(&'a str),
    Amount(Decimal),
}

impl FieldValue<'_> {
    fn is_present(&self) -> bool {
        match self {
            FieldValue::Text(text) => is_found(text),
            FieldValue::Amount(amount) => !amount.is_zero(),
        }
    }

    fn as_text(&self) -> String {
        match self {
            FieldValue::Text(text) => text.to_string(),
            FieldValue::Amount(amount) => amount.to_string(),
        }
    }
}

/// Stateless verifier of invoice records.
#[derive(Debug, Clone)]
pub struct VerificationEngine {
    tolerance: Decimal,
    fallback_confidence: f32,
}

impl VerificationEngine {
    pub fn new(config: &VerificationConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            fallback_confidence: config.fallback_confidence,
        }
    }

    /// Build the verification report for `record`.
    ///
    /// Pure: the same record and index always produce the same report.
    pub fn verify(&self, record: &InvoiceRecord, index: &ConfidenceIndex) -> VerificationReport {
        let mut issues = Vec::new();

        let field_verification = self.verify_fields(record, index);
        let missing: Vec<&str> = REQUIRED_FIELDS
            .into_iter()
            .filter(|name| !field_verification.get(*name).is_some_and(|f| f.present))
            .collect();
        for name in &missing {
            issues.push(ExtractionError::MissingField(name.to_string()).to_string());
        }
        let all_fields_present = missing.is_empty();

        let line_items_verification: Vec<LineItemVerification> = record
            .table_contents
            .iter()
            .enumerate()
            .map(|(i, item)| self.verify_line_item(i + 1, item, &mut issues))
            .collect();
        let all_line_items_valid = line_items_verification
            .iter()
            .all(|v| v.line_total_check.check_passed);
        if record.table_contents.is_empty() {
            issues.push("no line items were extracted".to_string());
        }

        let total_calculations_verification =
            self.verify_totals(record, &field_verification, &mut issues);

        debug!(
            "Verified record: {} fields, {} line items, {} issues",
            field_verification.len(),
            line_items_verification.len(),
            issues.len()
        );

        VerificationReport {
            field_verification,
            line_items_verification,
            total_calculations_verification,
            summary: VerificationSummary {
                issues,
                all_fields_present,
                all_line_items_valid,
            },
        }
    }

    fn verify_fields(
        &self,
        record: &InvoiceRecord,
        index: &ConfidenceIndex,
    ) -> BTreeMap<String, FieldVerification> {
        let general = &record.general_information;
        let totals = &record.totals;
        let fields = [
            ("invoice_number", FieldValue::Text(&general.invoice_number)),
            ("invoice_date", FieldValue::Text(&general.invoice_date)),
            ("supplier_gst_number", FieldValue::Text(&general.supplier_gst_number)),
            ("bill_to_gst_number", FieldValue::Text(&general.bill_to_gst_number)),
            ("po_number", FieldValue::Text(&general.po_number)),
            ("shipping_address", FieldValue::Text(&general.shipping_address)),
            ("subtotal", FieldValue::Amount(totals.subtotal)),
            ("discount", FieldValue::Amount(totals.discount)),
            ("gst", FieldValue::Amount(totals.gst)),
            ("final_total", FieldValue::Amount(totals.final_total)),
        ];

        let mut result: BTreeMap<String, FieldVerification> = fields
            .iter()
            .map(|(name, value)| {
                let present = value.is_present();
                let confidence = if present {
                    index
                        .value_confidence(&value.as_text())
                        .unwrap_or(self.fallback_confidence)
                } else {
                    0.0
                };
                (name.to_string(), FieldVerification { confidence, present })
            })
            .collect();

        if let Some(present) = general.seal_and_sign_present {
            let confidence = if present { self.fallback_confidence } else { 0.0 };
            result.insert(
                "seal_and_sign_present".to_string(),
                FieldVerification { confidence, present },
            );
        }
        result
    }

    fn verify_line_item(
        &self,
        row: usize,
        item: &LineItem,
        issues: &mut Vec<String>,
    ) -> LineItemVerification {
        let extracted = item.net_value();
        let line_total_check = match item.quantity.checked_mul(item.unit_price) {
            Some(product) => {
                let calculated = round_money(product);
                let check_passed = within_tolerance(calculated, extracted, self.tolerance);
                if !check_passed {
                    issues.push(format!(
                        "line item row {} (serial {}): calculated total {} does not match extracted total {}",
                        row, item.serial_number, calculated, extracted
                    ));
                }
                ValueCheck {
                    calculated_value: calculated,
                    extracted_value: extracted,
                    check_passed,
                }
            }
            None => {
                issues.push(format!(
                    "line item row {} (serial {}): quantity {} x unit price {} overflows",
                    row, item.serial_number, item.quantity, item.unit_price
                ));
                ValueCheck {
                    calculated_value: Decimal::ZERO,
                    extracted_value: extracted,
                    check_passed: false,
                }
            }
        };

        LineItemVerification {
            row,
            serial_number: item.serial_number.clone(),
            line_total_check,
        }
    }

    fn verify_totals(
        &self,
        record: &InvoiceRecord,
        fields: &BTreeMap<String, FieldVerification>,
        issues: &mut Vec<String>,
    ) -> TotalCalculations {
        let totals = &record.totals;
        let confidence = |name: &str| fields.get(name).map_or(0.0, |f| f.confidence);

        let subtotal = record
            .table_contents
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.net_value()));
        let subtotal_check = self.check(
            "subtotal",
            subtotal,
            totals.subtotal,
            confidence("subtotal"),
            issues,
        );

        let discount_check = TotalCheck {
            calculated_value: totals.discount,
            extracted_value: totals.discount,
            check_passed: true,
            confidence: confidence("discount"),
        };

        let gst = if totals.derived.has_tax_basis {
            totals.derived.gst
        } else {
            totals.gst
        };
        let gst_check = self.check("gst", Some(gst), totals.gst, confidence("gst"), issues);

        let final_total = subtotal
            .and_then(|s| s.checked_sub(totals.discount))
            .and_then(|v| v.checked_add(totals.gst));
        let final_total_check = self.check(
            "final_total",
            final_total,
            totals.final_total,
            confidence("final_total"),
            issues,
        );

        TotalCalculations {
            subtotal_check,
            discount_check,
            gst_check,
            final_total_check,
        }
    }

    fn check(
        &self,
        name: &str,
        calculated: Option<Decimal>,
        extracted: Decimal,
        confidence: f32,
        issues: &mut Vec<String>,
    ) -> TotalCheck {
        let Some(calculated) = calculated else {
            issues.push(format!("{} could not be recalculated: overflow", name));
            return TotalCheck {
                calculated_value: Decimal::ZERO,
                extracted_value: extracted,
                check_passed: false,
                confidence,
            };
        };

        let check_passed = within_tolerance(calculated, extracted, self.tolerance);
        if !check_passed {
            issues.push(format!(
                "{} mismatch: calculated {} but extracted {}",
                name, calculated, extracted
            ));
        }
        TotalCheck {
            calculated_value: calculated,
            extracted_value: extracted,
            check_passed,
            confidence,
        }
    }
}

impl Default for VerificationEngine {
    fn default() -> Self {
        Self::new(&VerificationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::token::Token;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(quantity: &str, unit_price: &str, total: &str) -> LineItem {
        LineItem {
            serial_number: "1".to_string(),
            quantity: dec(quantity),
            unit_price: dec(unit_price),
            total_amount: dec(total),
            ..LineItem::default()
        }
    }

    #[test]
    fn test_line_item_check() {
        let engine = VerificationEngine::default();
        let mut record = InvoiceRecord::default();
        record.table_contents = vec![item("2", "10.0", "20.0")];

        let report = engine.verify(&record, &ConfidenceIndex::default());
        let check = &report.line_items_verification[0].line_total_check;
        assert!(check.check_passed);
        assert_eq!(check.calculated_value, dec("20.0"));
        assert!(report.summary.all_line_items_valid);

        record.table_contents = vec![item("2", "10.0", "20.5")];
        let report = engine.verify(&record, &ConfidenceIndex::default());
        let check = &report.line_items_verification[0].line_total_check;
        assert!(!check.check_passed);
        assert_eq!(check.extracted_value, dec("20.5"));
        assert!(!report.summary.all_line_items_valid);
        assert!(report
            .summary
            .issues
            .iter()
            .any(|i| i.contains("row 1") && i.contains("20.0") && i.contains("20.5")));
    }

    #[test]
    fn test_field_presence_and_confidence() {
        let mut record = InvoiceRecord::default();
        record.general_information.invoice_number = "161126".to_string();
        record.general_information.po_number = "PO-7".to_string();
        record.totals.final_total = dec("950.00");

        let tokens = vec![Token::new("161126", 0.0, 0.0).with_confidence(0.75)];
        let report = VerificationEngine::default().verify(&record, &ConfidenceIndex::from_tokens(&tokens));

        let fields = &report.field_verification;
        assert_eq!(fields.len(), 10);
        assert_eq!(fields["invoice_number"].confidence, 0.75);
        assert!(fields["invoice_number"].present);
        assert_eq!(fields["po_number"].confidence, 0.9);
        assert!(!fields["invoice_date"].present);
        assert_eq!(fields["invoice_date"].confidence, 0.0);
        assert!(!report.summary.all_fields_present);
        assert!(report
            .summary
            .issues
            .contains(&"missing required field: invoice_date".to_string()));
    }

    #[test]
    fn test_seal_flag_is_verified_when_set() {
        let mut record = InvoiceRecord::default();
        record.set_seal_and_sign_present(false);
        let report = VerificationEngine::default().verify(&record, &ConfidenceIndex::default());

        let seal = report.field_verification["seal_and_sign_present"];
        assert!(!seal.present);
        assert_eq!(seal.confidence, 0.0);
    }

    #[test]
    fn test_empty_record_is_reported_not_rejected() {
        let report =
            VerificationEngine::default().verify(&InvoiceRecord::default(), &ConfidenceIndex::default());
        assert!(report.summary.all_line_items_valid);
        assert!(!report.summary.all_fields_present);
        assert!(report.line_items_verification.is_empty());
        assert!(report.summary.issues.iter().any(|i| i.contains("no line items")));
        assert!(report.total_calculations_verification.final_total_check.check_passed);
    }

    #[test]
    fn test_overflow_becomes_issue() {
        let mut record = InvoiceRecord::default();
        record.table_contents = vec![LineItem {
            quantity: Decimal::MAX,
            unit_price: Decimal::MAX,
            ..LineItem::default()
        }];
        let report = VerificationEngine::default().verify(&record, &ConfidenceIndex::default());
        assert!(!report.summary.all_line_items_valid);
        assert!(report.summary.issues.iter().any(|i| i.contains("overflows")));
    }

    #[test]
    fn test_gst_check_uses_derived_tax_basis() {
        let mut record = InvoiceRecord::default();
        record.table_contents = vec![LineItem {
            quantity: dec("2"),
            unit_price: dec("10"),
            net_worth: Some(dec("20")),
            vat: Some(dec("10")),
            total_amount: dec("22"),
            ..LineItem::default()
        }];
        record.totals.subtotal = dec("20");
        record.totals.gst = dec("3.00");
        record.totals.final_total = dec("23.00");
        record.totals.derived.gst = dec("2.00");
        record.totals.derived.has_tax_basis = true;

        let report = VerificationEngine::default().verify(&record, &ConfidenceIndex::default());
        let totals = &report.total_calculations_verification;
        assert!(report.line_items_verification[0].line_total_check.check_passed);
        assert!(totals.subtotal_check.check_passed);
        assert!(!totals.gst_check.check_passed);
        assert_eq!(totals.gst_check.calculated_value, dec("2.00"));
        assert!(totals.final_total_check.check_passed);
    }
}
