//! Core library for invoice reconstruction from positioned OCR tokens.
//!
//! This crate provides:
//! - Row grouping and coarse region segmentation of OCR tokens
//! - Table header detection and column mapping into line items
//! - Rule-based field extraction (invoice number, dates, tax ids, parties, totals)
//! - A verification engine that scores confidence and arithmetic consistency
//!
//! The OCR call itself, rasterization and persistence are left to the caller.
//! Every stage is a pure function over in-memory tokens, so independent documents
//! can be processed in parallel without shared state.

pub mod error;
pub mod invoice;
pub mod layout;
pub mod models;
pub mod verify;

pub use error::{ExtractionError, InvcheckError, Result};
pub use invoice::{AssemblyResult, InvoiceAssembler};
pub use layout::{RegionLabel, RegionMap, RegionSegmenter, Row, RowGrouper};
pub use models::config::InvcheckConfig;
pub use models::invoice::{
    CustomerInformation, GeneralInformation, InvoiceRecord, LineItem, Totals, VendorInformation,
    NOT_FOUND,
};
pub use models::report::VerificationReport;
pub use models::token::{Document, Page, Token};
pub use verify::{ConfidenceIndex, VerificationEngine};
