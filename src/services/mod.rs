//! Dataset services: record filtering and KPI summaries

pub mod filters;
pub mod kpis;

pub use filters::{apply_filters, filter_options, params_key, FilterParams};
pub use kpis::{calculate_kpis, Kpis};
