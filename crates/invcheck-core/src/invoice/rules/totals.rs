//! Subtotal, discount, tax and final total.
//!
//! Totals are first derived from line items, then replaced by figures printed in the
//! footer when present. The derived values are kept in [`DerivedTotals`] so the
//! verification report can show both when they disagree.

use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::amounts::{amount_or_none, round_money};
use super::patterns::{DISCOUNT, FINAL_TOTAL, SUBTOTAL, SUMMARY_TOTALS, TAX_AMOUNT};
use crate::models::invoice::{DerivedTotals, LineItem, Totals};

/// Figures printed in footer text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FooterTotals {
    pub subtotal: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub gst: Option<Decimal>,
    pub final_total: Option<Decimal>,
    /// Composite "rate, net, tax, gross" row.
    pub summary: Option<SummaryTotals>,
}

/// Net, tax and gross figures read from one summary row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryTotals {
    pub net: Decimal,
    pub tax: Decimal,
    pub gross: Decimal,
}

impl FooterTotals {
    /// Fill every figure still missing from `other`.
    pub fn merge(&mut self, other: FooterTotals) {
        set_if_absent(&mut self.subtotal, other.subtotal);
        set_if_absent(&mut self.discount, other.discount);
        set_if_absent(&mut self.gst, other.gst);
        set_if_absent(&mut self.final_total, other.final_total);
        set_if_absent(&mut self.summary, other.summary);
    }
}

fn set_if_absent<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// Derives and extracts invoice totals.
#[derive(Debug, Clone, Default)]
pub struct TotalsReconciler;

impl TotalsReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Read printed totals from footer text. Unparseable figures are skipped.
    pub fn scan_footer(&self, text: &str) -> FooterTotals {
        let mut footer = FooterTotals {
            subtotal: first_amount("subtotal", &SUBTOTAL, text),
            discount: first_amount("discount", &DISCOUNT, text),
            gst: first_amount("gst", &TAX_AMOUNT, text),
            ..FooterTotals::default()
        };

        // Last printed total wins; subtotal lines never count.
        for line in text.lines() {
            if line.to_lowercase().contains("sub") {
                continue;
            }
            for caps in FINAL_TOTAL.captures_iter(line) {
                if let Some(value) = amount_or_none("final_total", &caps[1]) {
                    footer.final_total = Some(value);
                }
            }
        }

        footer.summary = SUMMARY_TOTALS.captures_iter(text).last().and_then(|caps| {
            Some(SummaryTotals {
                net: amount_or_none("summary net", &caps[2])?,
                tax: amount_or_none("summary tax", &caps[3])?,
                gross: amount_or_none("summary gross", &caps[4])?,
            })
        });

        debug!("Footer totals: {:?}", footer);
        footer
    }

    /// Combine line items with printed footer figures.
    pub fn reconcile(&self, items: &[LineItem], footer: &FooterTotals) -> Totals {
        let derived = derive(items);

        let mut subtotal = footer.subtotal.unwrap_or(derived.subtotal);
        let mut gst = footer.gst.unwrap_or(derived.gst);
        let discount = footer.discount.unwrap_or(Decimal::ZERO);
        let mut final_total = footer.final_total;

        if let Some(summary) = footer.summary {
            subtotal = summary.net;
            gst = summary.tax;
            final_total = Some(summary.gross);
        }

        let final_total = match final_total {
            Some(value) => value,
            None if !items.is_empty() => subtotal
                .checked_add(gst)
                .and_then(|v| v.checked_sub(discount))
                .unwrap_or_else(|| {
                    warn!("Final total overflowed; defaulting to 0");
                    Decimal::ZERO
                }),
            None => Decimal::ZERO,
        };

        Totals {
            subtotal,
            discount,
            gst,
            final_total,
            derived,
        }
    }
}

fn first_amount(field: &str, pattern: &Regex, text: &str) -> Option<Decimal> {
    pattern
        .captures(text)
        .and_then(|caps| amount_or_none(field, &caps[1]))
}

/// Subtotal and tax computed from line items alone.
fn derive(items: &[LineItem]) -> DerivedTotals {
    let subtotal = items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.net_value()))
        .unwrap_or_else(|| {
            warn!("Line item subtotal overflowed; defaulting to 0");
            Decimal::ZERO
        });

    let mut has_tax_basis = false;
    let mut gst = Decimal::ZERO;
    for item in items {
        if let (Some(vat), Some(net)) = (item.vat, item.net_worth) {
            has_tax_basis = true;
            match (vat / Decimal::ONE_HUNDRED)
                .checked_mul(net)
                .and_then(|tax| gst.checked_add(tax))
            {
                Some(sum) => gst = sum,
                None => warn!("Tax on line {:?} overflowed; skipped", item.serial_number),
            }
        }
    }

    DerivedTotals {
        subtotal,
        gst: round_money(gst),
        has_tax_basis,
    }
}
