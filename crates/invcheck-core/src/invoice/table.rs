//! Line-item table reconstruction from rows.
//!
//! A header row anchors the columns: each header cell is mapped to a canonical field
//! and its x-center becomes a column center. Data tokens are assigned to the column
//! whose boundary bracket contains their own x-center.

use std::ops::Range;

use rust_decimal::Decimal;
use tracing::debug;

use super::rules::amounts::{amount_or_zero, percent_or_zero};
use super::rules::patterns::TABLE_END;
use crate::layout::Row;
use crate::models::invoice::{LineItem, NOT_FOUND};
use crate::models::token::Token;

/// Line-item field a table column maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    SerialNumber,
    Description,
    HsnSac,
    Quantity,
    UnitPrice,
    TotalAmount,
    NetWorth,
    Vat,
    UnitMeasure,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::SerialNumber => "serial_number",
            CanonicalField::Description => "description",
            CanonicalField::HsnSac => "hsn_sac",
            CanonicalField::Quantity => "quantity",
            CanonicalField::UnitPrice => "unit_price",
            CanonicalField::TotalAmount => "total_amount",
            CanonicalField::NetWorth => "net_worth",
            CanonicalField::Vat => "vat",
            CanonicalField::UnitMeasure => "unit_measure",
        }
    }
}

/// How a header keyword is compared with text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchMode {
    /// Substring of the whitespace-stripped lowercase text.
    Contains,
    /// Equal to a whole token, ignoring trailing `.` / `:`.
    Exact,
}

#[derive(Debug, Clone)]
struct HeaderKeyword {
    /// Stripped lowercase form used for matching.
    key: String,
    /// Label spans more than one printed word ("net price").
    compound: bool,
    mode: MatchMode,
    field: CanonicalField,
}

const DEFAULT_VOCABULARY: &[(&str, MatchMode, CanonicalField)] = &[
    ("s.no", MatchMode::Contains, CanonicalField::SerialNumber),
    ("sl.no", MatchMode::Contains, CanonicalField::SerialNumber),
    ("sr.no", MatchMode::Contains, CanonicalField::SerialNumber),
    ("no", MatchMode::Exact, CanonicalField::SerialNumber),
    ("#", MatchMode::Exact, CanonicalField::SerialNumber),
    ("description", MatchMode::Contains, CanonicalField::Description),
    ("hsn", MatchMode::Contains, CanonicalField::HsnSac),
    ("sac", MatchMode::Exact, CanonicalField::HsnSac),
    ("quantity", MatchMode::Contains, CanonicalField::Quantity),
    ("qty", MatchMode::Contains, CanonicalField::Quantity),
    ("net price", MatchMode::Contains, CanonicalField::UnitPrice),
    ("unit price", MatchMode::Contains, CanonicalField::UnitPrice),
    ("price", MatchMode::Contains, CanonicalField::UnitPrice),
    ("rate", MatchMode::Exact, CanonicalField::UnitPrice),
    ("net worth", MatchMode::Contains, CanonicalField::NetWorth),
    ("vat [%]", MatchMode::Contains, CanonicalField::Vat),
    ("vat %", MatchMode::Contains, CanonicalField::Vat),
    ("amount", MatchMode::Contains, CanonicalField::TotalAmount),
    ("total", MatchMode::Contains, CanonicalField::TotalAmount),
    ("gross", MatchMode::Contains, CanonicalField::TotalAmount),
    ("subtotal", MatchMode::Contains, CanonicalField::TotalAmount),
    ("item", MatchMode::Contains, CanonicalField::Description),
    ("um", MatchMode::Exact, CanonicalField::UnitMeasure),
    ("uom", MatchMode::Exact, CanonicalField::UnitMeasure),
    ("unit", MatchMode::Exact, CanonicalField::UnitMeasure),
];

/// Ordered header keyword table; the first matching keyword decides the field.
#[derive(Debug, Clone)]
pub struct HeaderVocabulary {
    keywords: Vec<HeaderKeyword>,
}

impl HeaderVocabulary {
    /// Number of vocabulary keywords found in a row.
    pub fn count_matches(&self, row: &Row) -> usize {
        let stripped = strip(&row.text());
        let tokens: Vec<String> = row.tokens.iter().map(|t| token_key(&t.text)).collect();

        self.keywords
            .iter()
            .filter(|k| match k.mode {
                MatchMode::Contains => stripped.contains(k.key.as_str()),
                MatchMode::Exact => tokens.iter().any(|t| *t == k.key),
            })
            .count()
    }

    /// Field named by one header cell's text.
    pub fn field_of(&self, text: &str) -> Option<CanonicalField> {
        let stripped = strip(text);
        let exact = token_key(text);
        self.keywords
            .iter()
            .find(|k| match k.mode {
                MatchMode::Contains => stripped.contains(k.key.as_str()),
                MatchMode::Exact => exact == k.key,
            })
            .map(|k| k.field)
    }

    /// Field of a multi-word label spelled by two adjacent tokens.
    fn compound_field(&self, first: &str, second: &str) -> Option<CanonicalField> {
        let joined = format!("{}{}", strip(first), strip(second));
        self.keywords
            .iter()
            .find(|k| k.compound && k.key == joined)
            .map(|k| k.field)
    }
}

impl Default for HeaderVocabulary {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_VOCABULARY
                .iter()
                .map(|(label, mode, field)| HeaderKeyword {
                    key: strip(label),
                    compound: label.contains(' '),
                    mode: *mode,
                    field: *field,
                })
                .collect(),
        }
    }
}

fn strip(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn token_key(text: &str) -> String {
    strip(text)
        .trim_end_matches(|c: char| c == '.' || c == ':')
        .to_string()
}

/// Column split points: midpoints between consecutive column centers, bracketed
/// by negative and positive infinity.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundaries {
    points: Vec<f64>,
}

impl Boundaries {
    /// Build from column centers. Non-finite and duplicate centers are dropped.
    pub fn from_centers(centers: &[f64]) -> Self {
        let mut centers: Vec<f64> = centers.iter().copied().filter(|c| c.is_finite()).collect();
        centers.sort_by(f64::total_cmp);
        centers.dedup();

        let mut points = Vec::with_capacity(centers.len() + 1);
        points.push(f64::NEG_INFINITY);
        points.extend(centers.windows(2).map(|w| w[0] + (w[1] - w[0]) / 2.0));
        points.push(f64::INFINITY);
        Self { points }
    }

    /// Strictly increasing split points, sentinels included.
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn column_count(&self) -> usize {
        self.points.len() - 1
    }

    /// Column whose bracket `[points[i], points[i + 1])` contains `x`.
    ///
    /// A value exactly on a boundary belongs to the column on its right.
    pub fn column_of(&self, x: f64) -> usize {
        self.points
            .partition_point(|b| *b <= x)
            .saturating_sub(1)
            .min(self.column_count() - 1)
    }
}

/// One header cell: one or two tokens naming a column.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub text: String,
    pub field: CanonicalField,
    pub center: f64,
    left: f64,
    right: f64,
}

impl HeaderCell {
    fn new(tokens: &[Token], field: CanonicalField) -> Self {
        let left = tokens.iter().map(|t| t.x).fold(f64::INFINITY, f64::min);
        let right = tokens
            .iter()
            .map(|t| t.x + t.width)
            .fold(f64::NEG_INFINITY, f64::max);
        let text = tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            text,
            field,
            center: (left + right) / 2.0,
            left,
            right,
        }
    }

    fn absorb(&mut self, other: HeaderCell) {
        self.text = format!("{} {}", self.text, other.text);
        self.left = self.left.min(other.left);
        self.right = self.right.max(other.right);
        self.center = (self.left + self.right) / 2.0;
    }
}

/// The located header row and its columns, ordered by x-center.
#[derive(Debug, Clone, PartialEq)]
pub struct TableHeader {
    /// Index of the header row in the page's rows.
    pub row: usize,
    /// One cell per column, left to right, with strictly increasing centers.
    pub cells: Vec<HeaderCell>,
    boundaries: Boundaries,
}

impl TableHeader {
    fn new(row: usize, mut cells: Vec<HeaderCell>) -> Self {
        cells.sort_by(|a, b| a.center.total_cmp(&b.center));
        cells.dedup_by(|b, a| a.center == b.center);
        let centers: Vec<f64> = cells.iter().map(|c| c.center).collect();
        Self {
            row,
            boundaries: Boundaries::from_centers(&centers),
            cells,
        }
    }

    pub fn boundaries(&self) -> &Boundaries {
        &self.boundaries
    }

    /// First column mapped to `field`.
    pub fn column(&self, field: CanonicalField) -> Option<usize> {
        self.cells.iter().position(|c| c.field == field)
    }

    pub fn has_field(&self, field: CanonicalField) -> bool {
        self.column(field).is_some()
    }
}

/// Finds the row that anchors the table columns.
#[derive(Debug, Clone, Default)]
pub struct TableHeaderLocator {
    vocabulary: HeaderVocabulary,
}

impl TableHeaderLocator {
    pub fn new(vocabulary: HeaderVocabulary) -> Self {
        Self { vocabulary }
    }

    /// Locate the header among `rows[range]`.
    ///
    /// The first row with at least one keyword wins, unless the row right after it
    /// matches more keywords (a caption such as "ITEMS" above the real header).
    pub fn locate(&self, rows: &[Row], range: Range<usize>) -> Option<TableHeader> {
        self.locate_with_min(rows, range, 1)
    }

    /// Like [`locate`](Self::locate), but a row needs `min_matches` keywords to qualify.
    /// Used when searching outside a segmented table region, where a lone "No" or
    /// "Total" is more likely a label than a column header.
    pub fn locate_with_min(
        &self,
        rows: &[Row],
        range: Range<usize>,
        min_matches: usize,
    ) -> Option<TableHeader> {
        let range = range.start.min(rows.len())..range.end.min(rows.len());
        let counts: Vec<(usize, usize)> = range
            .clone()
            .map(|i| (i, self.vocabulary.count_matches(&rows[i])))
            .collect();

        let first = counts.iter().position(|(_, n)| *n >= min_matches.max(1))?;
        let (mut index, count) = counts[first];
        if let Some((next, next_count)) = counts.get(first + 1) {
            if *next_count > count {
                index = *next;
            }
        }

        let cells = self.cells(&rows[index]);
        if cells.is_empty() {
            debug!("Header row {} has no usable cells", index);
            return None;
        }

        let header = TableHeader::new(index, cells);
        debug!(
            "Table header at row {}: {}",
            index,
            header
                .cells
                .iter()
                .map(|c| format!("{}={}", c.text, c.field.as_str()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Some(header)
    }

    fn cells(&self, row: &Row) -> Vec<HeaderCell> {
        let tokens = &row.tokens;
        let mut cells: Vec<HeaderCell> = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            let (cell, width) = match tokens
                .get(i + 1)
                .and_then(|next| self.vocabulary.compound_field(&tokens[i].text, &next.text))
            {
                Some(field) => (Some(HeaderCell::new(&tokens[i..i + 2], field)), 2),
                None => (
                    self.vocabulary
                        .field_of(&tokens[i].text)
                        .map(|field| HeaderCell::new(&tokens[i..i + 1], field)),
                    1,
                ),
            };
            i += width;

            let Some(cell) = cell else { continue };
            match cells.last_mut() {
                Some(last) if last.field == cell.field => last.absorb(cell),
                _ => cells.push(cell),
            }
        }
        cells
    }
}

/// Turns data rows under a header into line items.
#[derive(Debug, Clone, Default)]
pub struct TableColumnMapper;

impl TableColumnMapper {
    pub fn new() -> Self {
        Self
    }

    /// Parse `rows` (the rows following the header) until a totals row.
    pub fn map_rows(&self, header: &TableHeader, rows: &[Row]) -> Vec<LineItem> {
        let infer_quantity = header.has_field(CanonicalField::TotalAmount)
            && !header.has_field(CanonicalField::Quantity)
            && !header.has_field(CanonicalField::UnitPrice);

        let mut items = Vec::new();
        for row in rows {
            if TABLE_END.is_match(&row.text()) {
                debug!("Table ends at {:?}", row.text());
                break;
            }
            items.push(self.map_row(header, row, infer_quantity));
        }
        items
    }

    fn map_row(&self, header: &TableHeader, row: &Row, infer_quantity: bool) -> LineItem {
        let cells = split_cells(header.boundaries(), row);
        let cell = |field: CanonicalField| {
            header
                .column(field)
                .and_then(|c| cells.get(c))
                .map(String::as_str)
        };
        let text = |field| match cell(field) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => NOT_FOUND.to_string(),
        };
        let number = |field: CanonicalField| {
            cell(field).map_or(Decimal::ZERO, |t| amount_or_zero(field.as_str(), t))
        };
        let non_empty = |field| cell(field).filter(|t| !t.is_empty());

        let mut item = LineItem {
            serial_number: text(CanonicalField::SerialNumber),
            description: text(CanonicalField::Description),
            hsn_sac: text(CanonicalField::HsnSac),
            quantity: number(CanonicalField::Quantity),
            unit_price: number(CanonicalField::UnitPrice),
            total_amount: number(CanonicalField::TotalAmount),
            net_worth: non_empty(CanonicalField::NetWorth).map(|t| amount_or_zero("net_worth", t)),
            vat: non_empty(CanonicalField::Vat).map(|t| percent_or_zero("vat", t)),
            unit_measure: non_empty(CanonicalField::UnitMeasure).map(str::to_string),
        };

        // Single-amount tables: one unit at the line total.
        if infer_quantity {
            item.quantity = Decimal::ONE;
            item.unit_price = item.total_amount;
        }
        item
    }
}

/// Token texts per column, joined with spaces in row order.
fn split_cells(boundaries: &Boundaries, row: &Row) -> Vec<String> {
    let mut cells: Vec<Vec<&str>> = vec![Vec::new(); boundaries.column_count()];
    for token in &row.tokens {
        cells[boundaries.column_of(token.center_x())].push(token.text.as_str());
    }
    cells.into_iter().map(|words| words.join(" ")).collect()
}
