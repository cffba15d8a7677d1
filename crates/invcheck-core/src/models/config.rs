//! Configuration structures for the reconstruction pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main configuration for the invcheck pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvcheckConfig {
    /// Row grouping and region segmentation.
    pub layout: LayoutConfig,

    /// Keyword vocabularies driving region segmentation.
    pub keywords: KeywordConfig,

    /// Verification tolerances and fallbacks.
    pub verification: VerificationConfig,
}

/// Row grouping and region segmentation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Maximum vertical distance between a token and the previous token of its row.
    pub row_threshold: f64,

    /// Number of leading rows that form the header region.
    pub header_rows: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_threshold: 20.0,
            header_rows: 5,
        }
    }
}

/// Lowercase keywords that open each region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    /// Keywords that end the vendor region and open the customer region.
    pub customer_start: Vec<String>,

    /// Keywords that end the customer region and open the table region.
    pub table_start: Vec<String>,

    /// Keywords that end the table region and open the footer region.
    pub footer_start: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        fn owned(words: &[&str]) -> Vec<String> {
            words.iter().map(|w| w.to_string()).collect()
        }

        Self {
            customer_start: owned(&[
                "bill to",
                "ship to",
                "customer",
                "client",
                "seller",
                "attention to",
            ]),
            table_start: owned(&[
                "description",
                "items",
                "qty",
                "quantity",
                "amount",
                "s.no",
                "sl.no",
                "sr.no",
            ]),
            footer_start: owned(&["total", "subtotal", "gst", "vat [%]", "summary"]),
        }
    }
}

/// Verification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Maximum absolute difference for two amounts to agree.
    pub tolerance: Decimal,

    /// Confidence reported when none of a value's words has a measured OCR confidence.
    pub fallback_confidence: f32,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            tolerance: Decimal::new(1, 2),
            fallback_confidence: 0.9,
        }
    }
}

impl InvcheckConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.layout.row_threshold.is_finite() || self.layout.row_threshold <= 0.0 {
            return Err(crate::InvcheckError::Config(format!(
                "layout.row_threshold must be a positive number, got {}",
                self.layout.row_threshold
            )));
        }
        if self.verification.tolerance.is_sign_negative() {
            return Err(crate::InvcheckError::Config(format!(
                "verification.tolerance must not be negative, got {}",
                self.verification.tolerance
            )));
        }
        if !(0.0..=1.0).contains(&self.verification.fallback_confidence) {
            return Err(crate::InvcheckError::Config(format!(
                "verification.fallback_confidence must be within [0, 1], got {}",
                self.verification.fallback_confidence
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: InvcheckConfig =
            serde_json::from_str(r#"{"layout": {"row_threshold": 12.5}}"#).unwrap();
        assert_eq!(config.layout.row_threshold, 12.5);
        assert_eq!(config.layout.header_rows, 5);
        assert_eq!(config.verification.fallback_confidence, 0.9);
        assert!(config.keywords.footer_start.contains(&"summary".to_string()));
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = InvcheckConfig::default();
        assert!(config.validate().is_ok());

        config.layout.row_threshold = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tolerance_from_string() {
        let config: InvcheckConfig =
            serde_json::from_str(r#"{"verification": {"tolerance": "0.05"}}"#).unwrap();
        assert_eq!(config.verification.tolerance, Decimal::new(5, 2));
    }
}
