//! OCR tokens and the page/document containers they arrive in.

use serde::{Deserialize, Serialize};

/// One OCR-recognized word with its axis-aligned box and confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Recognized text content.
    pub text: String,

    /// Left edge of the bounding box.
    pub x: f64,

    /// Top edge of the bounding box.
    pub y: f64,

    /// Box width.
    #[serde(default)]
    pub width: f64,

    /// Box height.
    #[serde(default)]
    pub height: f64,

    /// Recognition confidence score (0.0 - 1.0).
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

impl Token {
    /// Create a token with zero-sized box and full confidence.
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width: 0.0,
            height: 0.0,
            confidence: 1.0,
        }
    }

    /// Set the box size.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the recognition confidence.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Horizontal center of the bounding box.
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Whether all coordinates are finite and non-negative.
    pub fn has_valid_coordinates(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }

    /// Whether the confidence is a usable measurement in [0, 1].
    pub fn has_measured_confidence(&self) -> bool {
        self.confidence.is_finite() && (0.0..=1.0).contains(&self.confidence)
    }
}

/// A single page worth of tokens, in arbitrary order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Tokens recognized on the page.
    #[serde(default)]
    pub tokens: Vec<Token>,
}

impl Page {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Number of tokens with valid coordinates.
    pub fn valid_token_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.has_valid_coordinates()).count()
    }
}

/// An ordered sequence of pages making up one invoice document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Pages in reading order.
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// Iterate over every token of every page.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.pages.iter().flat_map(|p| p.tokens.iter())
    }
}
