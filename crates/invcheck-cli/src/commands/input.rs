//! Token file readers: JSON documents and Tesseract word-level TSV.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use invcheck_core::{Document, Page, Token};

/// Tesseract `image_to_data` level of a single word.
const WORD_LEVEL: u32 = 5;

/// File extensions accepted as token input.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["json", "tsv"];

/// Lowercased extension of a path, empty when absent.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Read a document of OCR tokens, choosing the reader by file extension.
pub fn load_document(path: &Path) -> anyhow::Result<Document> {
    let extension = extension_of(path);
    let document = match extension.as_str() {
        "json" => read_json(File::open(path)?)?,
        "tsv" => read_tsv(File::open(path)?)?,
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    };

    info!(
        "Loaded {} page(s) with {} valid token(s) from {}",
        document.pages.len(),
        document.pages.iter().map(Page::valid_token_count).sum::<usize>(),
        path.display()
    );
    Ok(document)
}

/// `{"pages": [{"tokens": [...]}, ...]}`
pub fn read_json<R: Read>(reader: R) -> anyhow::Result<Document> {
    Ok(serde_json::from_reader(reader)?)
}

#[derive(Debug, Deserialize)]
struct TsvRow {
    level: u32,
    page_num: usize,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    conf: f64,
    #[serde(default)]
    text: Option<String>,
}

/// Tesseract `image_to_data` TSV.
///
/// Word rows with text become tokens, `conf` is rescaled from 0-100 and a negative
/// `conf` becomes 0. Pages are ordered by `page_num`; a page without words stays
/// in the document as an empty page.
pub fn read_tsv<R: Read>(reader: R) -> anyhow::Result<Document> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(reader);

    let mut pages: BTreeMap<usize, Vec<Token>> = BTreeMap::new();
    for row in rdr.deserialize() {
        let row: TsvRow = row?;
        let tokens = pages.entry(row.page_num).or_default();

        let text = row.text.as_deref().map(str::trim).unwrap_or("");
        if row.level != WORD_LEVEL || text.is_empty() {
            continue;
        }

        let confidence = if row.conf < 0.0 {
            0.0
        } else {
            (row.conf / 100.0).clamp(0.0, 1.0) as f32
        };
        tokens.push(
            Token::new(text, row.left, row.top)
                .with_size(row.width, row.height)
                .with_confidence(confidence),
        );
    }

    debug!("Read {} page(s) from TSV", pages.len());
    Ok(Document::new(pages.into_values().map(Page::new).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn tsv(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn test_tsv_keeps_word_rows() {
        let data = tsv(&[
            "1\t1\t0\t0\t0\t0\t0\t0\t600\t800\t-1",
            "4\t1\t1\t1\t1\t0\t50\t40\t200\t12\t-1",
            "5\t1\t1\t1\t1\t1\t50\t40\t55\t12\t96.5\tInvoice",
            "5\t1\t1\t1\t1\t2\t110\t40\t70\t12\t91\tNumber:",
            "5\t1\t1\t1\t1\t3\t190\t40\t10\t12\t95\t ",
        ]);
        let document = read_tsv(data.as_bytes()).unwrap();

        assert_eq!(document.pages.len(), 1);
        let tokens = &document.pages[0].tokens;
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "Invoice");
        assert_eq!(tokens[0].x, 50.0);
        assert_eq!(tokens[0].width, 55.0);
        assert!((tokens[0].confidence - 0.965).abs() < 1e-6);
    }

    #[test]
    fn test_tsv_negative_confidence_becomes_zero() {
        let data = tsv(&["5\t1\t1\t1\t1\t1\t50\t40\t55\t12\t-1\tTotal"]);
        let document = read_tsv(data.as_bytes()).unwrap();
        assert_eq!(document.pages[0].tokens[0].confidence, 0.0);
    }

    #[test]
    fn test_tsv_groups_pages_in_order() {
        let data = tsv(&[
            "1\t2\t0\t0\t0\t0\t0\t0\t600\t800\t-1",
            "5\t2\t1\t1\t1\t1\t50\t40\t55\t12\t90\tSecond",
            "1\t1\t0\t0\t0\t0\t0\t0\t600\t800\t-1",
            "1\t3\t0\t0\t0\t0\t0\t0\t600\t800\t-1",
            "5\t3\t1\t1\t1\t1\t50\t40\t55\t12\t90\tThird",
        ]);
        let document = read_tsv(data.as_bytes()).unwrap();

        assert_eq!(document.pages.len(), 3);
        assert!(document.pages[0].tokens.is_empty());
        assert_eq!(document.pages[1].tokens[0].text, "Second");
        assert_eq!(document.pages[2].tokens[0].text, "Third");
    }

    #[test]
    fn test_json_defaults_optional_token_fields() {
        let data = r#"{"pages": [{"tokens": [{"text": "Total", "x": 10, "y": 20}]}]}"#;
        let document = read_json(data.as_bytes()).unwrap();

        let token = &document.pages[0].tokens[0];
        assert_eq!(token.width, 0.0);
        assert_eq!(token.confidence, 1.0);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_document(Path::new("invoice.pdf")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));
    }
}
