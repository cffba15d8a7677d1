//! Invoice-level scalar fields: number, date, tax ids, PO number, shipping address.

use chrono::NaiveDate;
use tracing::debug;

use super::patterns::*;
use super::{has_digit, FieldExtractor, PatternRule};
use crate::models::invoice::{GeneralInformation, NOT_FOUND};

/// Extracts [`GeneralInformation`] from region text.
#[derive(Debug, Clone)]
pub struct GeneralFieldExtractor {
    invoice_number: PatternRule,
    invoice_date: PatternRule,
    supplier_gst: PatternRule,
    bill_to_gst: PatternRule,
    tax_id: PatternRule,
    po_number: PatternRule,
    shipping_address: PatternRule,
}

impl GeneralFieldExtractor {
    pub fn new() -> Self {
        Self {
            invoice_number: PatternRule::new("invoice_number", vec![&*INVOICE_NUMBER])
                .with_accept(has_digit),
            invoice_date: PatternRule::new(
                "invoice_date",
                vec![&*INVOICE_DATE_LABELED, &*INVOICE_DATE_ANY],
            ),
            supplier_gst: PatternRule::new("supplier_gst_number", vec![&*SUPPLIER_GST])
                .with_accept(has_digit),
            bill_to_gst: PatternRule::new("bill_to_gst_number", vec![&*BILL_TO_GST])
                .with_accept(has_digit),
            tax_id: PatternRule::new("tax_id", vec![&*TAX_ID]),
            po_number: PatternRule::new("po_number", vec![&*PO_NUMBER]).with_accept(has_digit),
            shipping_address: PatternRule::new("shipping_address", vec![&*SHIPPING_ADDRESS])
                .with_clean(clean_address),
        }
    }

    /// Extract the scalar fields of one page.
    ///
    /// `header` is the header-region text; `header_and_customer` additionally holds the
    /// customer region. Anything not found is the sentinel.
    pub fn extract(&self, header: &str, header_and_customer: &str) -> GeneralInformation {
        let mut info = GeneralInformation::default();

        if let Some(m) = self.invoice_number.extract(header) {
            info.invoice_number = m.value;
        }
        if let Some(m) = self.invoice_date.extract(header) {
            info.invoice_date_iso = parse_date(&m.value);
            info.invoice_date = m.value;
        }

        let tax_ids: Vec<String> = {
            let mut ids: Vec<String> = Vec::new();
            for m in self.tax_id.extract_all(header_and_customer) {
                if !ids.contains(&m.value) {
                    ids.push(m.value);
                }
            }
            ids
        };

        info.supplier_gst_number = self
            .supplier_gst
            .extract(header_and_customer)
            .map(|m| m.value)
            .or_else(|| tax_ids.first().cloned())
            .unwrap_or_else(|| NOT_FOUND.to_string());

        let supplier = info.supplier_gst_number.clone();
        info.bill_to_gst_number = self
            .bill_to_gst
            .extract(header_and_customer)
            .map(|m| m.value)
            .or_else(|| tax_ids.iter().find(|id| **id != supplier).cloned())
            .unwrap_or_else(|| NOT_FOUND.to_string());

        if let Some(m) = self.po_number.extract(header_and_customer) {
            info.po_number = m.value;
        }
        if let Some(m) = self.shipping_address.extract(header_and_customer) {
            info.shipping_address = m.value;
        }

        debug!(
            "General fields: number={:?} date={:?} po={:?}",
            info.invoice_number, info.invoice_date, info.po_number
        );
        info
    }
}

impl Default for GeneralFieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove tax ids and bank codes, then tidy separators.
fn clean_address(raw: &str) -> String {
    let stripped = ADDRESS_NOISE.replace_all(raw, " ");
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == ',' || c == ';' || c == ':' || c == '-' || c.is_whitespace())
        .to_string()
}

/// Normalize a printed invoice date.
///
/// Numeric dates are read month-first when ambiguous ("04/05/2016" is April 5).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    const NUMERIC: &[&str] = &["%m/%d/%Y", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y", "%m-%d-%Y"];
    const SHORT_YEAR: &[&str] = &["%m/%d/%y", "%d/%m/%y", "%d.%m.%y", "%d-%m-%y"];
    const WORDS: &[&str] = &["%B %d %Y", "%d %B %Y"];

    let raw = raw.trim().trim_end_matches('.');
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    let year_len = raw
        .rsplit(|c: char| !c.is_ascii_digit())
        .next()
        .map_or(0, str::len);
    let numeric = match year_len {
        4 => NUMERIC,
        2 => SHORT_YEAR,
        _ => &[],
    };
    if let Some(date) = numeric
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    {
        return Some(date);
    }

    let words = raw
        .replace([',', '.'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    WORDS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&words, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_and_date_from_header() {
        let header = "INVOICE\nInvoice Number: 161126\nDate: Nov 26, 2016\nYesLogic Pty. Ltd.";
        let info = GeneralFieldExtractor::new().extract(header, header);

        assert_eq!(info.invoice_number, "161126");
        assert_eq!(info.invoice_date, "Nov 26, 2016");
        assert_eq!(info.invoice_date_iso, NaiveDate::from_ymd_opt(2016, 11, 26));
        assert_eq!(info.po_number, NOT_FOUND);
        assert_eq!(info.shipping_address, NOT_FOUND);
    }

    #[test]
    fn test_labeled_issue_date_preferred() {
        let header = "Due date: 01/31/2021\nInvoice date: 01/01/2021";
        let info = GeneralFieldExtractor::new().extract(header, header);
        assert_eq!(info.invoice_date, "01/01/2021");
    }

    #[test]
    fn test_tax_ids_fall_back_to_document_order() {
        let header = "Invoice no: 40378170\nDate of issue: 10/15/2012";
        let both = format!("{}\nSeller: Client:\nTax Id: 958-74-3511 Tax Id: 998-87-7723", header);
        let info = GeneralFieldExtractor::new().extract(header, &both);

        assert_eq!(info.invoice_number, "40378170");
        assert_eq!(info.invoice_date_iso, NaiveDate::from_ymd_opt(2012, 10, 15));
        assert_eq!(info.supplier_gst_number, "958-74-3511");
        assert_eq!(info.bill_to_gst_number, "998-87-7723");
    }

    #[test]
    fn test_labeled_gst_numbers() {
        let text = "Supplier GSTIN: 29ABCDE1234F1Z5\nBill To GSTIN: 27PQRSX9876K1Z2\nPO No: 4500012";
        let info = GeneralFieldExtractor::new().extract("", text);

        assert_eq!(info.supplier_gst_number, "29ABCDE1234F1Z5");
        assert_eq!(info.bill_to_gst_number, "27PQRSX9876K1Z2");
        assert_eq!(info.po_number, "4500012");
    }

    #[test]
    fn test_shipping_address_strips_identity_fragments() {
        let text = "Ship To: 12 Harbour Rd, Sydney Tax Id: 123-45-6789\nDescription";
        let info = GeneralFieldExtractor::new().extract("", text);
        assert_eq!(info.shipping_address, "12 Harbour Rd, Sydney");

        let text = "Shipping Address:\n9 Dock St, Perth";
        let info = GeneralFieldExtractor::new().extract("", text);
        assert_eq!(info.shipping_address, "9 Dock St, Perth");
    }

    #[test]
    fn test_invoice_number_requires_digit() {
        let info = GeneralFieldExtractor::new().extract("Invoice No: pending", "");
        assert_eq!(info.invoice_number, NOT_FOUND);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2016, 11, 26);
        assert_eq!(parse_date("2016-11-26"), expected);
        assert_eq!(parse_date("11/26/2016"), expected);
        assert_eq!(parse_date("26/11/2016"), expected);
        assert_eq!(parse_date("26.11.2016"), expected);
        assert_eq!(parse_date("26 November 2016"), expected);
        assert_eq!(parse_date("Nov 26, 2016"), expected);
        assert_eq!(parse_date("11/26/16"), expected);
        assert_eq!(parse_date("sometime"), None);
    }
}
