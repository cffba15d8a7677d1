//! Partitioning rows into coarse page regions with keyword rules.
//!
//! Segmentation is a linear walk: the header is a fixed number of leading rows, and
//! every following row either stays in the current region or advances to a later one
//! when a rule matches. Rules are tried nearest region first and may skip regions,
//! but never move backwards, so regions come out contiguous and in the fixed order
//! header, vendor, customer, table, footer. A region whose trigger never appears is
//! empty, and a page where no trigger fires at all leaves everything after the header
//! to the footer. Boundaries are hints rather than guarantees.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rows::Row;
use crate::models::config::{KeywordConfig, LayoutConfig};

/// Coarse vertical zone of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionLabel {
    Header,
    Vendor,
    Customer,
    Table,
    Footer,
}

impl RegionLabel {
    /// All labels in page order.
    pub const ALL: [RegionLabel; 5] = [
        RegionLabel::Header,
        RegionLabel::Vendor,
        RegionLabel::Customer,
        RegionLabel::Table,
        RegionLabel::Footer,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionLabel::Header => "header",
            RegionLabel::Vendor => "vendor",
            RegionLabel::Customer => "customer",
            RegionLabel::Table => "table",
            RegionLabel::Footer => "footer",
        }
    }
}

impl fmt::Display for RegionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row-index ranges for each region, partitioning all rows exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMap {
    /// `bounds[i]..bounds[i + 1]` is the range of `RegionLabel::ALL[i]`.
    bounds: [usize; 6],
}

impl RegionMap {
    /// Build from one label per row. Labels must be non-decreasing.
    fn from_labels(labels: &[RegionLabel]) -> Self {
        debug_assert!(labels.windows(2).all(|w| w[0] <= w[1]));

        let mut bounds = [0usize; 6];
        for (i, label) in RegionLabel::ALL.iter().enumerate() {
            bounds[i + 1] = labels.iter().filter(|l| *l <= label).count();
        }
        Self { bounds }
    }

    /// Total number of rows covered.
    pub fn row_count(&self) -> usize {
        self.bounds[5]
    }

    /// Row indices assigned to a region.
    pub fn range(&self, label: RegionLabel) -> Range<usize> {
        let i = label.index();
        self.bounds[i]..self.bounds[i + 1]
    }

    /// Region of a row, or `None` when the index is out of range.
    pub fn label_of(&self, row: usize) -> Option<RegionLabel> {
        RegionLabel::ALL
            .into_iter()
            .find(|label| self.range(*label).contains(&row))
    }

    /// The rows of a region.
    pub fn rows<'a>(&self, rows: &'a [Row], label: RegionLabel) -> &'a [Row] {
        let range = self.range(label);
        let end = range.end.min(rows.len());
        &rows[range.start.min(end)..end]
    }

    /// The text of a region, one line per row.
    pub fn text(&self, rows: &[Row], label: RegionLabel) -> String {
        self.rows(rows, label)
            .iter()
            .map(Row::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A condition over a row's lowercase text.
#[derive(Debug, Clone)]
enum RowPredicate {
    /// Contains at least `min` distinct keywords.
    ContainsAtLeast { keywords: Vec<String>, min: usize },
}

impl RowPredicate {
    fn any(keywords: &[String]) -> Self {
        Self::at_least(keywords, 1)
    }

    fn at_least(keywords: &[String], min: usize) -> Self {
        RowPredicate::ContainsAtLeast {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            min,
        }
    }

    fn matches(&self, lower_text: &str) -> bool {
        match self {
            RowPredicate::ContainsAtLeast { keywords, min } => {
                keywords
                    .iter()
                    .filter(|k| !k.is_empty() && contains_word(lower_text, k))
                    .count()
                    >= *min
            }
        }
    }
}

/// Whether `word` occurs in `text` on word boundaries. A trailing plural `s` is allowed,
/// so "totals" matches "total" but "gstin" does not match "gst".
fn contains_word(text: &str, word: &str) -> bool {
    let is_word_char = |c: char| c.is_alphanumeric();
    text.match_indices(word).any(|(i, _)| {
        let before = text[..i].chars().next_back();
        let mut after = text[i + word.len()..].chars();
        let end_ok = match after.next() {
            None => true,
            Some('s') => !after.next().is_some_and(is_word_char),
            Some(c) => !is_word_char(c),
        };
        !before.is_some_and(is_word_char) && end_ok
    })
}

/// One segmentation rule: a row matching `predicate` moves the walk to `then`.
#[derive(Debug, Clone)]
struct SegmentRule {
    /// Region the rule is limited to; `None` applies from every region before `then`.
    only_in: Option<RegionLabel>,
    predicate: RowPredicate,
    then: RegionLabel,
}

impl SegmentRule {
    fn forward(predicate: RowPredicate, then: RegionLabel) -> Self {
        Self {
            only_in: None,
            predicate,
            then,
        }
    }

    fn applies_in(&self, current: RegionLabel) -> bool {
        match self.only_in {
            Some(region) => region == current,
            None => current < self.then,
        }
    }
}

/// Keyword-driven linear region classifier.
#[derive(Debug, Clone)]
pub struct RegionSegmenter {
    header_rows: usize,
    rules: Vec<SegmentRule>,
}

impl RegionSegmenter {
    /// Build the rule list from keyword vocabularies. The first applicable match wins.
    pub fn new(layout: &LayoutConfig, keywords: &KeywordConfig) -> Self {
        let rules = vec![
            // Column-header rows name several columns and may include footer words
            // such as "total" or "vat [%]"; they stay in the table.
            SegmentRule {
                only_in: Some(RegionLabel::Table),
                predicate: RowPredicate::at_least(&keywords.table_start, 2),
                then: RegionLabel::Table,
            },
            SegmentRule::forward(RowPredicate::any(&keywords.customer_start), RegionLabel::Customer),
            SegmentRule::forward(RowPredicate::any(&keywords.table_start), RegionLabel::Table),
            SegmentRule::forward(RowPredicate::any(&keywords.footer_start), RegionLabel::Footer),
        ];

        Self {
            header_rows: layout.header_rows,
            rules,
        }
    }

    /// Assign every row to exactly one region.
    pub fn segment(&self, rows: &[Row]) -> RegionMap {
        let header_end = self.header_rows.min(rows.len());
        let mut labels = vec![RegionLabel::Header; header_end];
        let mut current = RegionLabel::Vendor;

        for row in &rows[header_end..] {
            let text = row.lower_text();
            if let Some(rule) = self
                .rules
                .iter()
                .filter(|r| r.applies_in(current))
                .find(|r| r.predicate.matches(&text))
            {
                current = rule.then;
            }
            labels.push(current);
        }

        if current == RegionLabel::Vendor {
            labels[header_end..].fill(RegionLabel::Footer);
        }

        let map = RegionMap::from_labels(&labels);
        debug!(
            "Segmented {} rows: {}",
            rows.len(),
            RegionLabel::ALL
                .iter()
                .map(|l| format!("{}={:?}", l, map.range(*l)))
                .collect::<Vec<_>>()
                .join(" ")
        );
        map
    }
}

impl Default for RegionSegmenter {
    fn default() -> Self {
        Self::new(&LayoutConfig::default(), &KeywordConfig::default())
    }
}
