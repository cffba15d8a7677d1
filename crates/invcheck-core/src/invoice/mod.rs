//! Invoice reconstruction: field rules, line-item tables and the page assembler.

mod assembler;
pub mod rules;
pub mod table;

pub use assembler::{AssemblyResult, InvoiceAssembler, PageExtraction};
pub use table::{
    Boundaries, CanonicalField, HeaderVocabulary, TableColumnMapper, TableHeader,
    TableHeaderLocator,
};
