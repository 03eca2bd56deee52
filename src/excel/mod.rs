//! Excel export of extracted tables (dataset download)

mod exporter;

pub use exporter::{export_table, export_table_to_buffer, DEFAULT_SHEET_NAME};
