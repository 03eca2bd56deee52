//! McDagua dashboard - spreadsheet table extraction and normalization
//!
//! Reads loosely structured `.xlsx` workbooks, locates sub-tables inside
//! their sheets (fixed coordinates or a marker cell), reads them row- or
//! column-major, normalizes headers and values, optionally transposes, and
//! hands out column-named tables or chart series. Results are cached per
//! workbook until a TTL expires, a scheduled refresh runs, or the workbook
//! is replaced.
//!
//! # Features
//!
//! - Alias-tolerant sheet selection (accents and case folded)
//! - Fixed or text-search anchors, configurable per sub-table in YAML
//! - Row-major and column-major blocks with sentinel termination
//! - Header/value/date normalization, empty row and column pruning
//! - Invalidation-wins TTL cache
//! - Dataset filtering, KPIs and `.xlsx` download
//!
//! # Example
//!
//! ```no_run
//! use mcdagua_dash::config::DashboardConfig;
//! use mcdagua_dash::extract::Extractor;
//!
//! let config = DashboardConfig::default();
//! let extractor = Extractor::new()?;
//! let geral = config.workbook("geral").expect("built-in workbook");
//!
//! let extraction = extractor.run(geral);
//! println!("Sub-tables: {}", extraction.len());
//! # Ok::<(), mcdagua_dash::error::DashError>(())
//! ```

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod excel;
pub mod extract;
pub mod services;
pub mod types;
pub mod watch;

// Re-export commonly used types
pub use cache::CacheLayer;
pub use config::{DashboardConfig, TableDescriptor, WorkbookConfig};
pub use dashboard::{Dashboard, DatasetView};
pub use error::{DashError, DashResult};
pub use extract::Extractor;
pub use types::{Cell, ChartSeries, Extraction, Grid, Orientation, SubTable, Table};
