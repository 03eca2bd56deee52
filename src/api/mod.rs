//! Dashboard API Server module
//!
//! Thin HTTP surface over the extraction engine.
//! Run with `mcdagua-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server, ApiConfig, AppState};
