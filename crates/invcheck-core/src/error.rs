//! Error types for the invcheck-core library.

use thiserror::Error;

/// Main error type for the invcheck library.
#[derive(Error, Debug)]
pub enum InvcheckError {
    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to invoice field extraction.
///
/// Only [`ExtractionError::NoPages`] and [`ExtractionError::NoTokens`] ever leave the
/// assembler; the remaining variants are produced by typed parsers and converted to
/// defaults at a single boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// The document contains no pages.
    #[error("document has no pages")]
    NoPages,

    /// No page carries a token with valid coordinates.
    #[error("document has no tokens with valid coordinates")]
    NoTokens,

    /// Required field is missing.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Failed to parse a value.
    #[error("failed to parse {field}: {value:?}")]
    Parse { field: String, value: String },
}

/// Result type for the invcheck library.
pub type Result<T> = std::result::Result<T, InvcheckError>;
