//! Per-page pipeline and the cross-page fold into one invoice record.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::rules::{FooterTotals, GeneralFieldExtractor, TotalsReconciler, VendorCustomerExtractor};
use super::table::{TableColumnMapper, TableHeaderLocator};
use crate::error::{ExtractionError, Result};
use crate::layout::{RegionLabel, RegionSegmenter, RowGrouper};
use crate::models::config::InvcheckConfig;
use crate::models::invoice::{
    is_found, CustomerInformation, GeneralInformation, InvoiceRecord, LineItem,
    VendorInformation,
};
use crate::models::report::VerificationReport;
use crate::models::token::{Document, Page};
use crate::verify::{ConfidenceIndex, VerificationEngine};

/// Keywords a row needs to pass as a table header outside the table region.
const FALLBACK_HEADER_MATCHES: usize = 2;

/// Result of processing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyResult {
    /// Reconstructed invoice.
    pub record: InvoiceRecord,
    /// Verification report for the record.
    pub report: VerificationReport,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// What a single page contributes to the record.
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    pub general: GeneralInformation,
    pub vendor: VendorInformation,
    pub customer: CustomerInformation,
    pub items: Vec<LineItem>,
    pub footer: FooterTotals,
    pub warnings: Vec<String>,
}

/// Runs the extraction pipeline over the pages of a document.
#[derive(Debug, Clone)]
pub struct InvoiceAssembler {
    config: InvcheckConfig,
    grouper: RowGrouper,
    segmenter: RegionSegmenter,
    general: GeneralFieldExtractor,
    parties: VendorCustomerExtractor,
    locator: TableHeaderLocator,
    mapper: TableColumnMapper,
    totals: TotalsReconciler,
    engine: VerificationEngine,
}

impl InvoiceAssembler {
    /// Create an assembler with default settings.
    pub fn new() -> Self {
        Self::with_config(InvcheckConfig::default())
    }

    pub fn with_config(config: InvcheckConfig) -> Self {
        Self {
            grouper: RowGrouper::new(config.layout.row_threshold),
            segmenter: RegionSegmenter::new(&config.layout, &config.keywords),
            general: GeneralFieldExtractor::new(),
            parties: VendorCustomerExtractor::new(),
            locator: TableHeaderLocator::default(),
            mapper: TableColumnMapper::new(),
            totals: TotalsReconciler::new(),
            engine: VerificationEngine::new(&config.verification),
            config,
        }
    }

    pub fn config(&self) -> &InvcheckConfig {
        &self.config
    }

    /// Extract one page. `None` when the page has no token with valid coordinates.
    pub fn extract_page(&self, page: &Page) -> Option<PageExtraction> {
        let rows = self.grouper.group(&page.tokens);
        if rows.is_empty() {
            return None;
        }

        let regions = self.segmenter.segment(&rows);
        let header = regions.text(&rows, RegionLabel::Header);
        let vendor = regions.text(&rows, RegionLabel::Vendor);
        let customer = regions.text(&rows, RegionLabel::Customer);
        let footer = regions.text(&rows, RegionLabel::Footer);
        let header_and_customer = format!("{}\n{}", header, customer);

        let mut warnings = Vec::new();
        let table = regions.range(RegionLabel::Table);
        let located = if table.is_empty() {
            // No table trigger fired; fall back to the rows after the header, or the
            // whole page when the header swallowed every row.
            let after_header = regions.range(RegionLabel::Header).end..rows.len();
            let search = if after_header.is_empty() {
                0..rows.len()
            } else {
                after_header
            };
            debug!("Table region empty; searching rows {:?}", search);
            self.locator
                .locate_with_min(&rows, search.clone(), FALLBACK_HEADER_MATCHES)
                .map(|header| (header, search))
        } else {
            self.locator
                .locate(&rows, table.clone())
                .map(|header| (header, table.clone()))
        };

        let items = match located {
            Some((table_header, search)) => self
                .mapper
                .map_rows(&table_header, &rows[table_header.row + 1..search.end]),
            None => {
                debug!("No table header among rows {:?}", table);
                warnings.push("no table header found".to_string());
                Vec::new()
            }
        };

        Some(PageExtraction {
            general: self.general.extract(&header, &header_and_customer),
            vendor: self.parties.extract_vendor(&vendor, &header),
            customer: self.parties.extract_customer(&customer),
            items,
            footer: self.totals.scan_footer(&footer),
            warnings,
        })
    }

    /// Fold all pages into one record.
    ///
    /// Scalar fields keep the first page's non-empty value; line items accumulate in
    /// page order. Fails only when the document has no pages or no usable tokens.
    pub fn assemble(&self, document: &Document) -> Result<(InvoiceRecord, Vec<String>)> {
        if document.pages.is_empty() {
            return Err(ExtractionError::NoPages.into());
        }

        let folded = document.pages.iter().enumerate().fold(
            Fold::default(),
            |mut acc, (i, page)| {
                let number = i + 1;
                match self.extract_page(page) {
                    Some(extraction) => acc.absorb(number, extraction),
                    None => {
                        warn!("Page {} has no tokens with valid coordinates; skipped", number);
                        acc.skipped_pages.push(number);
                        acc.warnings
                            .push(format!("page {}: no tokens with valid coordinates", number));
                    }
                }
                acc
            },
        );

        if folded.pages_processed == 0 {
            return Err(ExtractionError::NoTokens.into());
        }

        let mut record = folded.record;
        record.totals = self.totals.reconcile(&record.table_contents, &folded.footer);

        let info = &mut record.additional_information;
        info.no_items = record.table_contents.len();
        info.page_count = document.pages.len();
        info.pages_processed = folded.pages_processed;
        info.skipped_pages = folded.skipped_pages;
        info.warnings = folded.warnings.clone();

        Ok((record, folded.warnings))
    }

    /// Verify a record against the token confidences of its source document.
    pub fn verify(&self, record: &InvoiceRecord, document: &Document) -> VerificationReport {
        self.engine
            .verify(record, &ConfidenceIndex::from_document(document))
    }

    /// Assemble and verify a document.
    pub fn process(&self, document: &Document) -> Result<AssemblyResult> {
        let start = Instant::now();

        let (record, warnings) = self.assemble(document)?;
        let report = self.verify(&record, document);

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Processed {} page(s): invoice {:?}, {} line item(s), {} issue(s) in {}ms",
            document.pages.len(),
            record.general_information.invoice_number,
            record.table_contents.len(),
            report.summary.issues.len(),
            processing_time_ms
        );

        Ok(AssemblyResult {
            record,
            report,
            warnings,
            processing_time_ms,
        })
    }
}

impl Default for InvoiceAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulator for the page fold.
#[derive(Default)]
struct Fold {
    record: InvoiceRecord,
    footer: FooterTotals,
    pages_processed: usize,
    skipped_pages: Vec<usize>,
    warnings: Vec<String>,
}

impl Fold {
    fn absorb(&mut self, page: usize, extraction: PageExtraction) {
        let record = &mut self.record;
        record.general_information.set_if_absent(extraction.general);
        record.vendor_information.set_if_absent(extraction.vendor);
        record.customer_information.set_if_absent(extraction.customer);
        record.table_contents.extend(extraction.items);
        self.footer.merge(extraction.footer);
        self.warnings.extend(
            extraction
                .warnings
                .into_iter()
                .map(|w| format!("page {}: {}", page, w)),
        );
        self.pages_processed += 1;
    }
}

/// Keep existing values; take the other side's only where ours is missing.
trait SetIfAbsent {
    fn set_if_absent(&mut self, other: Self);
}

fn fill(slot: &mut String, value: String) {
    if !is_found(slot) && is_found(&value) {
        *slot = value;
    }
}

impl SetIfAbsent for GeneralInformation {
    fn set_if_absent(&mut self, other: Self) {
        fill(&mut self.invoice_number, other.invoice_number);
        if !is_found(&self.invoice_date) && is_found(&other.invoice_date) {
            self.invoice_date = other.invoice_date;
            self.invoice_date_iso = other.invoice_date_iso;
        }
        fill(&mut self.supplier_gst_number, other.supplier_gst_number);
        fill(&mut self.bill_to_gst_number, other.bill_to_gst_number);
        fill(&mut self.po_number, other.po_number);
        fill(&mut self.shipping_address, other.shipping_address);
        if self.seal_and_sign_present.is_none() {
            self.seal_and_sign_present = other.seal_and_sign_present;
        }
    }
}

impl SetIfAbsent for VendorInformation {
    fn set_if_absent(&mut self, other: Self) {
        fill(&mut self.name, other.name);
        fill(&mut self.address, other.address);
        fill(&mut self.phone, other.phone);
        fill(&mut self.website, other.website);
        fill(&mut self.email, other.email);
    }
}

impl SetIfAbsent for CustomerInformation {
    fn set_if_absent(&mut self, other: Self) {
        fill(&mut self.name, other.name);
        fill(&mut self.address, other.address);
    }
}
