//! Clustering tokens into visual rows by vertical proximity.

use tracing::{debug, warn};

use crate::models::token::Token;

/// A horizontally aligned cluster of tokens, ordered left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Tokens sorted by x.
    pub tokens: Vec<Token>,
}

impl Row {
    /// Token texts joined with single spaces.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Lowercased [`Row::text`].
    pub fn lower_text(&self) -> String {
        self.text().to_lowercase()
    }
}

/// Groups tokens into rows in a single pass over the y-sorted tokens.
#[derive(Debug, Clone, Copy)]
pub struct RowGrouper {
    threshold: f64,
}

impl RowGrouper {
    /// Default vertical threshold in page units.
    pub const DEFAULT_THRESHOLD: f64 = 20.0;

    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Cluster tokens into rows.
    ///
    /// Tokens with invalid coordinates are dropped. A token joins the current row when
    /// its y differs from the y of the row's last-added token by less than the threshold.
    /// Ties in y keep their input order.
    pub fn group(&self, tokens: &[Token]) -> Vec<Row> {
        let mut valid: Vec<&Token> = Vec::with_capacity(tokens.len());
        for token in tokens {
            if token.has_valid_coordinates() {
                valid.push(token);
            } else {
                warn!(
                    "Dropping token {:?} with invalid coordinates ({}, {}, {}x{})",
                    token.text, token.x, token.y, token.width, token.height
                );
            }
        }

        valid.sort_by(|a, b| a.y.total_cmp(&b.y));

        let mut rows: Vec<Row> = Vec::new();
        let mut current: Vec<Token> = Vec::new();
        let mut last_y = f64::NEG_INFINITY;

        for token in valid {
            if !current.is_empty() && (token.y - last_y).abs() >= self.threshold {
                rows.push(finish_row(std::mem::take(&mut current)));
            }
            last_y = token.y;
            current.push(token.clone());
        }

        if !current.is_empty() {
            rows.push(finish_row(current));
        }

        debug!("Grouped {} tokens into {} rows", tokens.len(), rows.len());
        rows
    }
}

impl Default for RowGrouper {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

fn finish_row(mut tokens: Vec<Token>) -> Row {
    tokens.sort_by(|a, b| a.x.total_cmp(&b.x));
    Row { tokens }
}
