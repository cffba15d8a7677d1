//! Spatial layout analysis over OCR tokens.
//!
//! Tokens are clustered into visual rows, and rows are partitioned into coarse
//! page regions (header, vendor, customer, table, footer).

mod regions;
mod rows;

pub use regions::{RegionLabel, RegionMap, RegionSegmenter};
pub use rows::{Row, RowGrouper};
