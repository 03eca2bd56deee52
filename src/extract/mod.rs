//! Spreadsheet table-extraction engine
//!
//! GridSource → AnchorLocator → BlockReader → Normalizer → (Transposer).
//! `pipeline::Extractor` strings the stages together per sub-table
//! descriptor and owns the error boundary.

pub mod anchor;
pub mod block;
pub mod grid;
pub mod normalize;
pub mod pipeline;
pub mod transpose;

pub use grid::{SheetSelector, WorkbookSource};
pub use normalize::Normalizer;
pub use pipeline::Extractor;
pub use transpose::{to_chart_series, transpose};
