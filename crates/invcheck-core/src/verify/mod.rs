//! Verification of reconstructed invoice records.
//!
//! Scores each scalar field by the OCR confidence of its words and recomputes line
//! and invoice totals to check them against the extracted values. Problems are
//! collected as issue strings instead of aborting the report.

mod confidence;
mod engine;

pub use confidence::ConfidenceIndex;
pub use engine::VerificationEngine;
