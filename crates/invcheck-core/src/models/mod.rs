//! Data models: OCR input tokens, the reconstructed invoice record, the
//! verification report, and pipeline configuration.

pub mod config;
pub mod invoice;
pub mod report;
pub mod token;
