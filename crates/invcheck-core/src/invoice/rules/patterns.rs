//! Common regex patterns for invoice field extraction.
//!
//! Text handed to these patterns is one OCR row per line, so labels and values are
//! matched with `[ \t]` rather than `\s` to stay on a single row.

use lazy_static::lazy_static;
use regex::Regex;

/// Printed date forms: numeric d/m/y, ISO, "26 November 2016", "Nov 26, 2016".
const DATE_VALUE: &str = r"(?:(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4})|(\d{4}-\d{1,2}-\d{1,2})|(\d{1,2}[ \t]+[A-Za-z]{3,9}\.?,?[ \t]+\d{4})|([A-Za-z]{3,9}\.?[ \t]+\d{1,2},?[ \t]+\d{4}))";

/// A printed amount: digits with optional separators.
const MONEY: &str = r"(\d(?:[\d,.]*\d)?)";

/// A printed amount with exactly two decimals.
const MONEY_2DP: &str = r"(\d(?:[\d,.]*\d)?[.,]\d{2})\b";

/// Optional "18%" / "(10 %)" rate printed between a label and its amount.
const OPTIONAL_RATE: &str = r"(?:[^\d\n]*?\d+(?:[.,]\d+)?[ \t]*%\)?)?";

lazy_static! {
    // Invoice number
    pub static ref INVOICE_NUMBER: Regex = Regex::new(
        r"(?i)(?:\binv(?:oice)?\.?[ \t]*(?:number|num\b|no\b|#|id\b)\.?[ \t]*[:#\-]?[ \t]*([A-Za-z0-9][\w/\-]*))|(?:\bbill(?:ing)?[ \t]*(?:number|no\b|#|id\b)\.?[ \t]*[:#\-]?[ \t]*([A-Za-z0-9][\w/\-]*))"
    ).unwrap();

    // Invoice date: labeled issue date first, then any "Date:" label
    pub static ref INVOICE_DATE_LABELED: Regex = Regex::new(&format!(
        r"(?i)\b(?:invoice[ \t]*date|date[ \t]+of[ \t]+issue|issue[ \t]*date|dated)[ \t]*[:\-]?[ \t]*{}",
        DATE_VALUE
    )).unwrap();

    pub static ref INVOICE_DATE_ANY: Regex = Regex::new(&format!(
        r"(?i)\bdate[ \t]*[:\-]?[ \t]*{}",
        DATE_VALUE
    )).unwrap();

    // Tax identifiers
    pub static ref SUPPLIER_GST: Regex = Regex::new(
        r"(?i)\b(?:supplier|vendor|seller)(?:'s)?[ \t]*(?:gstin|gst)[ \t]*(?:no\b|number|#)?\.?[ \t]*[:\-]?[ \t]*([A-Z0-9]{6,20})"
    ).unwrap();

    pub static ref BILL_TO_GST: Regex = Regex::new(
        r"(?i)\b(?:bill(?:ed)?[ \t]*to|customer|client|buyer|recipient)(?:'s)?[ \t]*(?:gstin|gst)[ \t]*(?:no\b|number|#)?\.?[ \t]*[:\-]?[ \t]*([A-Z0-9]{6,20})"
    ).unwrap();

    /// Unlabeled tax ids in document order: GSTIN, ABN, "Tax Id".
    pub static ref TAX_ID: Regex = Regex::new(
        r"(?i)(?:\bgstin[ \t]*(?:no\b|number)?\.?[ \t]*[:\-]?[ \t]*(\d{2}[A-Z]{5}\d{4}[A-Z][A-Z0-9]Z[A-Z0-9]))|(?:\babn[ \t]*[:\-]?[ \t]*(\d{2}[ \t]?\d{3}[ \t]?\d{3}[ \t]?\d{3}))|(?:\btax[ \t]*id[ \t]*[:\-]?[ \t]*(\d[\d\-]{5,}\d))"
    ).unwrap();

    // Purchase order
    pub static ref PO_NUMBER: Regex = Regex::new(
        r"(?i)(?:\b(?:p\.?[ \t]?o\b\.?|purchase[ \t]*order)[ \t]*(?:number|no\b|#|id\b)?\.?[ \t]*[:#\-]?[ \t]*([A-Za-z0-9][\w/\-]*))|(?:\border[ \t]*(?:number|no\b|#|id\b)\.?[ \t]*[:#\-]?[ \t]*([A-Za-z0-9][\w/\-]*))"
    ).unwrap();

    // Shipping address: rest of the label row, or the next row when the label stands alone
    pub static ref SHIPPING_ADDRESS: Regex = Regex::new(
        r"(?i)\b(?:ship(?:ping)?[ \t]*to|shipping[ \t]*address|deliver(?:y)?[ \t]*(?:to|address))[ \t]*[:\-]?[ \t]*(?:([^\n]+)|\n([^\n]+))"
    ).unwrap();

    /// Vendor identity fragments that leak into address captures.
    pub static ref ADDRESS_NOISE: Regex = Regex::new(
        r"(?i)\b(?:tax[ \t]*id|gstin|gst|abn|iban|swift(?:[ \t]*code)?|bsb|ifsc|bic)\b[ \t]*(?:no\b|number)?\.?[ \t]*[:#\-]?[ \t]*[A-Z0-9][A-Z0-9\-]*"
    ).unwrap();

    // Company identity
    pub static ref COMPANY_NAME: Regex = Regex::new(
        r"(?m)^[ \t]*([^\n]*?\b(?i:pty\.?[ \t]*ltd|pvt\.?[ \t]*ltd|private[ \t]+limited|limited|ltd|inc|llc|l\.l\.c|plc|llp|corp|corporation|gmbh|s\.a|s\.r\.l|sp\.[ \t]*z[ \t]*o\.[ \t]*o)\b\.?)"
    ).unwrap();

    pub static ref PHONE_LABELED: Regex = Regex::new(
        r"(?i)\b(?:phone|telephone|tel|ph|mobile|mob|cell)\b\.?(?:[ \t]*(?:no\b|number))?\.?[ \t]*[:\-]?[ \t]*(\+?[\d(][\d()\-. \t]{5,}\d)"
    ).unwrap();

    pub static ref PHONE_INTERNATIONAL: Regex = Regex::new(
        r"(\+\d{1,3}[ \-.]?\(?\d{1,4}\)?(?:[ \-.]?\d{2,4}){2,4})"
    ).unwrap();

    pub static ref PHONE_LOCAL: Regex = Regex::new(
        r"(\(\d{3}\)[ \-.]?\d{3}[ \-.]\d{4})|\b(\d{3}[\-.]\d{3}[\-.]\d{4})\b"
    ).unwrap();

    pub static ref WEBSITE_WWW: Regex = Regex::new(
        r"(?i)\b((?:https?://)?www\.[a-z0-9\-]+(?:\.[a-z0-9\-]+)+(?:/[^\s]*)?)"
    ).unwrap();

    pub static ref WEBSITE_DOMAIN: Regex = Regex::new(
        r"(?im)(?:^|[\s(])((?:https?://)?[a-z0-9][a-z0-9\-]*(?:\.[a-z0-9\-]+)*\.(?:com|net|org|io|co|biz|info|in|au|uk|de|pl|us|ca)(?:\.[a-z]{2})?)\b"
    ).unwrap();

    pub static ref EMAIL: Regex = Regex::new(
        r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}"
    ).unwrap();

    /// Rows in the vendor block that belong to the invoice header rather than the address.
    pub static ref VENDOR_NOISE: Regex = Regex::new(
        r"(?i)\b(?:invoice|date|number|client|seller)\b"
    ).unwrap();

    // Customer identity
    pub static ref CUSTOMER_LABEL: Regex = Regex::new(
        r"(?i)\b(?:bill(?:ed)?[ \t]*to|ship[ \t]*to|sold[ \t]*to|attention(?:[ \t]*to)?|attn|client|customer|buyer)\b\.?[ \t]*[:\-]?[ \t]*([^\n]*)(?:\n([^\n]*))?"
    ).unwrap();

    /// Where a customer name ends: tax ids, address labels, digit runs.
    pub static ref NAME_BOUNDARY: Regex = Regex::new(
        r"(?i)\b(?:tax[ \t]*id|gstin|gst|address|iban|phone|tel)\b|\d"
    ).unwrap();

    pub static ref CUSTOMER_NOISE: Regex = Regex::new(
        r"(?i)\b(?:total|sub[ \t]*total|tax[ \t]*id|gstin|iban|swift|summary|payment|bank)\b"
    ).unwrap();

    pub static ref PARTY_LABEL: Regex = Regex::new(
        r"(?i)\b(?:seller|client|attention|attn|bill(?:ed)?[ \t]*to|ship[ \t]*to|sold[ \t]*to|customer|buyer)\b"
    ).unwrap();

    // Totals
    pub static ref SUBTOTAL: Regex = Regex::new(&format!(
        r"(?i)\bsub[ \t\-]*total\b[^\d\n]*?{}",
        MONEY
    )).unwrap();

    pub static ref DISCOUNT: Regex = Regex::new(&format!(
        r"(?i)\bdiscount\b{}[^\d\n]*?{}",
        OPTIONAL_RATE, MONEY
    )).unwrap();

    pub static ref TAX_AMOUNT: Regex = Regex::new(&format!(
        r"(?i)\b(?:gst|igst|cgst|sgst|tax|vat)\b{}[^\d\n]*?{}",
        OPTIONAL_RATE, MONEY_2DP
    )).unwrap();

    pub static ref FINAL_TOTAL: Regex = Regex::new(&format!(
        r"(?i)\b(?:grand[ \t]*total|total(?:[ \t]*amount)?(?:[ \t]*(?:due|payable))?|amount[ \t]*(?:due|payable)|balance[ \t]*due)\b[^\d\n]*?{}",
        MONEY
    )).unwrap();

    /// A rate followed by net, tax and gross figures: "10% 1,234.00 123.40 1,357.40".
    pub static ref SUMMARY_TOTALS: Regex = Regex::new(
        r"(\d+(?:[.,]\d+)?)[ \t]*%[ \t]+[$€£₹]?[ \t]*(\d(?:[\d,.]*\d)?[.,]\d{2})[ \t]+[$€£₹]?[ \t]*(\d(?:[\d,.]*\d)?[.,]\d{2})[ \t]+[$€£₹]?[ \t]*(\d(?:[\d,.]*\d)?[.,]\d{2})"
    ).unwrap();

    /// Rows that end a line-item table.
    pub static ref TABLE_END: Regex = Regex::new(
        r"(?i)\b(?:sub[ \t]*total|grand[ \t]*total|total|summary|amount[ \t]+due|balance[ \t]+due)\b"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_number_alternatives() {
        let caps = INVOICE_NUMBER.captures("Invoice Number: 161126").unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "161126");

        let caps = INVOICE_NUMBER.captures("Bill No. B-77").unwrap();
        assert!(caps.get(1).is_none());
        assert_eq!(caps.get(2).unwrap().as_str(), "B-77");

        assert!(INVOICE_NUMBER.captures("Invoice date: Nov 26, 2016").is_none());
    }

    #[test]
    fn test_summary_totals() {
        let caps = SUMMARY_TOTALS
            .captures("10% 1,234.00 123.40 1,357.40")
            .unwrap();
        assert_eq!(&caps[2], "1,234.00");
        assert_eq!(&caps[3], "123.40");
        assert_eq!(&caps[4], "1,357.40");
    }

    #[test]
    fn test_final_total_skips_label_noise() {
        let caps = FINAL_TOTAL.captures("TOTAL USD $950.00").unwrap();
        assert_eq!(&caps[1], "950.00");
        assert!(FINAL_TOTAL.captures("Subtotal 600.00").is_none());
    }

    #[test]
    fn test_tax_amount_ignores_tax_ids() {
        assert!(TAX_AMOUNT.captures("Tax Id: 985-73-8194").is_none());
        let caps = TAX_AMOUNT.captures("GST 18%: 180.00").unwrap();
        assert_eq!(&caps[1], "180.00");
    }

    #[test]
    fn test_company_name() {
        let caps = COMPANY_NAME.captures("INVOICE\nYesLogic Pty. Ltd.\n7 / 39 Bouverie St").unwrap();
        assert_eq!(&caps[1], "YesLogic Pty. Ltd.");
    }
}
