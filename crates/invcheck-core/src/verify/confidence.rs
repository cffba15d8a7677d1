//! Per-word OCR confidence lookup.

use std::collections::HashMap;

use crate::models::token::{Document, Token};

/// Mean OCR confidence per normalized word.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceIndex {
    words: HashMap<String, (f32, usize)>,
}

impl ConfidenceIndex {
    /// Index every token with a measured confidence.
    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> Self {
        let mut words: HashMap<String, (f32, usize)> = HashMap::new();
        for token in tokens {
            if !token.has_measured_confidence() {
                continue;
            }
            for word in token.text.split_whitespace().filter_map(normalize_word) {
                let entry = words.entry(word).or_insert((0.0, 0));
                entry.0 += token.confidence;
                entry.1 += 1;
            }
        }
        Self { words }
    }

    pub fn from_document(document: &Document) -> Self {
        Self::from_tokens(document.tokens())
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Mean confidence of one word, if it was seen.
    pub fn word_confidence(&self, word: &str) -> Option<f32> {
        let key = normalize_word(word)?;
        self.words
            .get(&key)
            .map(|(sum, count)| sum / *count as f32)
    }

    /// Mean of the per-word confidences of a value's known words.
    ///
    /// `None` when no word of the value was seen with a measured confidence.
    pub fn value_confidence(&self, value: &str) -> Option<f32> {
        let known: Vec<f32> = value
            .split_whitespace()
            .filter_map(|w| self.word_confidence(w))
            .collect();
        if known.is_empty() {
            return None;
        }
        Some(known.iter().sum::<f32>() / known.len() as f32)
    }
}

/// Lowercase, keep alphanumerics and `. - / @`, drop surrounding dots.
fn normalize_word(word: &str) -> Option<String> {
    let kept: String = word
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '/' | '@'))
        .flat_map(char::to_lowercase)
        .collect();
    let trimmed = kept.trim_matches('.');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, confidence: f32) -> Token {
        Token::new(text, 0.0, 0.0).with_confidence(confidence)
    }

    #[test]
    fn test_value_confidence_averages_known_words() {
        let tokens = vec![
            token("Nov", 0.8),
            token("26,", 0.6),
            token("2016", 1.0),
            token("$950.00", 0.5),
            token("950.00", 0.7),
        ];
        let index = ConfidenceIndex::from_tokens(&tokens);

        assert_eq!(index.word_confidence("26"), Some(0.6));
        assert_eq!(index.word_confidence("USD$950.00"), None);
        let amount = index.word_confidence("950.00").unwrap();
        assert!((amount - 0.6).abs() < 1e-6);
        let date = index.value_confidence("Nov 26, 2016").unwrap();
        assert!((date - 0.8).abs() < 1e-6);
        assert_eq!(index.value_confidence("unknown words"), None);
    }

    #[test]
    fn test_unmeasured_confidence_ignored() {
        let tokens = vec![token("Total", f32::NAN), token("Total", 2.0)];
        let index = ConfidenceIndex::from_tokens(&tokens);
        assert!(index.is_empty());
        assert_eq!(index.value_confidence("Total"), None);
    }

    #[test]
    fn test_normalize_word() {
        assert_eq!(normalize_word("Ltd."), Some("ltd".to_string()));
        assert_eq!(normalize_word("(555)"), Some("555".to_string()));
        assert_eq!(normalize_word("a@b.com,"), Some("a@b.com".to_string()));
        assert_eq!(normalize_word("$"), None);
    }
}
