//! Rule-based field extractors over region text.

pub mod amounts;
pub mod general;
pub mod parties;
pub mod patterns;
pub mod totals;

pub use amounts::{amount_or_zero, parse_amount, parse_percent, percent_or_zero, round_money};
pub use general::GeneralFieldExtractor;
pub use parties::VendorCustomerExtractor;
pub use totals::{FooterTotals, TotalsReconciler};

use regex::Regex;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A value matched in region text.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte range of the whole match in the source text.
    pub position: (usize, usize),
}

/// One scalar field as an ordered list of alternative patterns.
///
/// Patterns are tried in order; within a match the first non-empty capture group is
/// the value. A candidate is cleaned and then kept only when `accept` allows it.
#[derive(Clone)]
pub struct PatternRule {
    /// Field name, for logs.
    pub field: &'static str,
    patterns: Vec<&'static Regex>,
    clean: fn(&str) -> String,
    accept: fn(&str) -> bool,
}

impl PatternRule {
    pub fn new(field: &'static str, patterns: Vec<&'static Regex>) -> Self {
        Self {
            field,
            patterns,
            clean: |s| s.trim().to_string(),
            accept: |s| !s.is_empty(),
        }
    }

    /// Post-process every candidate value.
    pub fn with_clean(mut self, clean: fn(&str) -> String) -> Self {
        self.clean = clean;
        self
    }

    /// Reject candidates that fail `accept`.
    pub fn with_accept(mut self, accept: fn(&str) -> bool) -> Self {
        self.accept = accept;
        self
    }

    fn candidates<'t>(&'t self, text: &'t str) -> impl Iterator<Item = ExtractionMatch<String>> + 't {
        self.patterns.iter().flat_map(move |pattern| {
            pattern.captures_iter(text).filter_map(move |caps| {
                let whole = caps.get(0)?;
                let raw = caps
                    .iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.as_str())
                    .find(|s| !s.trim().is_empty())?;
                let value = (self.clean)(raw);
                (self.accept)(&value).then(|| ExtractionMatch {
                    value,
                    position: (whole.start(), whole.end()),
                })
            })
        })
    }
}

impl FieldExtractor for PatternRule {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.candidates(text).next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.candidates(text).collect()
    }
}

impl std::fmt::Debug for PatternRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternRule")
            .field("field", &self.field)
            .field(
                "patterns",
                &self.patterns.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Whether a value contains at least one ASCII digit.
pub(crate) fn has_digit(value: &str) -> bool {
    value.bytes().any(|b| b.is_ascii_digit())
}
