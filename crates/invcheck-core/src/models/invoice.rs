//! Invoice record reconstructed from OCR tokens.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Placeholder stored in textual fields that could not be extracted.
pub const NOT_FOUND: &str = "Not Found";

fn not_found() -> String {
    NOT_FOUND.to_string()
}

/// Whether a textual value carries real content (not blank, not the sentinel).
pub fn is_found(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != NOT_FOUND
}

/// A complete invoice representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Invoice-level scalar fields.
    pub general_information: GeneralInformation,

    /// Issuing company identity.
    pub vendor_information: VendorInformation,

    /// Billed party identity.
    pub customer_information: CustomerInformation,

    /// Parsed table rows, in page order.
    pub table_contents: Vec<LineItem>,

    /// Subtotal, discount, tax and final total.
    pub totals: Totals,

    /// Processing bookkeeping.
    pub additional_information: AdditionalInformation,
}

impl InvoiceRecord {
    /// Record the outcome of an external seal/signature detector.
    pub fn set_seal_and_sign_present(&mut self, present: bool) {
        self.general_information.seal_and_sign_present = Some(present);
    }
}

/// Invoice-level scalar fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralInformation {
    /// Invoice number/identifier.
    pub invoice_number: String,

    /// Invoice date as printed.
    pub invoice_date: String,

    /// Invoice date normalized to a calendar date, when the printed form is recognized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_date_iso: Option<NaiveDate>,

    /// Supplier GST / tax id.
    pub supplier_gst_number: String,

    /// Bill-to GST / tax id.
    pub bill_to_gst_number: String,

    /// Purchase order number.
    pub po_number: String,

    /// Shipping address.
    pub shipping_address: String,

    /// Seal/signature presence, supplied by an external detector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seal_and_sign_present: Option<bool>,
}

impl Default for GeneralInformation {
    fn default() -> Self {
        Self {
            invoice_number: not_found(),
            invoice_date: not_found(),
            invoice_date_iso: None,
            supplier_gst_number: not_found(),
            bill_to_gst_number: not_found(),
            po_number: not_found(),
            shipping_address: not_found(),
            seal_and_sign_present: None,
        }
    }
}

/// Issuing company identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorInformation {
    /// Legal company name.
    pub name: String,

    /// Residual address lines.
    pub address: String,

    /// Phone number.
    pub phone: String,

    /// Website.
    pub website: String,

    /// Email address.
    pub email: String,
}

impl Default for VendorInformation {
    fn default() -> Self {
        Self {
            name: not_found(),
            address: not_found(),
            phone: not_found(),
            website: not_found(),
            email: not_found(),
        }
    }
}

/// Billed party identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInformation {
    /// Customer name.
    pub name: String,

    /// Address lines.
    pub address: String,
}

impl Default for CustomerInformation {
    fn default() -> Self {
        Self {
            name: not_found(),
            address: not_found(),
        }
    }
}

/// A single parsed table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Sequential number printed on the invoice.
    pub serial_number: String,

    /// Product/service description.
    pub description: String,

    /// HSN/SAC classification code.
    pub hsn_sac: String,

    /// Quantity.
    pub quantity: Decimal,

    /// Unit price.
    pub unit_price: Decimal,

    /// Line total as printed.
    pub total_amount: Decimal,

    /// Net worth (before tax), when the table has such a column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_worth: Option<Decimal>,

    /// VAT rate in percent, when the table has such a column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat: Option<Decimal>,

    /// Unit of measure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_measure: Option<String>,
}

impl Default for LineItem {
    fn default() -> Self {
        Self {
            serial_number: not_found(),
            description: not_found(),
            hsn_sac: not_found(),
            quantity: Decimal::ZERO,
            unit_price: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            net_worth: None,
            vat: None,
            unit_measure: None,
        }
    }
}

impl LineItem {
    /// Pre-tax line value: net worth when present, otherwise the line total.
    pub fn net_value(&self) -> Decimal {
        self.net_worth.unwrap_or(self.total_amount)
    }
}

/// Invoice totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// Subtotal before tax and discount.
    pub subtotal: Decimal,

    /// Discount amount.
    pub discount: Decimal,

    /// Tax amount.
    pub gst: Decimal,

    /// Amount payable.
    pub final_total: Decimal,

    /// Values derived from line items before any printed figure replaced them.
    pub derived: DerivedTotals,
}

/// Totals computed purely from line items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedTotals {
    /// Sum of line net values.
    pub subtotal: Decimal,

    /// Sum of `vat% * net_worth` over items carrying both.
    pub gst: Decimal,

    /// Whether any line item carried both a VAT rate and a net worth.
    pub has_tax_basis: bool,
}

/// Processing bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalInformation {
    /// Number of line items.
    pub no_items: usize,

    /// Pages in the input document.
    pub page_count: usize,

    /// Pages that contributed to the record.
    pub pages_processed: usize,

    /// 1-based numbers of pages skipped for lack of valid tokens.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_pages: Vec<usize>,

    /// Warnings encountered during extraction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
