//! Dashboard service
//!
//! Owns the configuration, the extraction engine and the caches. One
//! instance is built at process start and shared (behind an `Arc`) by the
//! request handlers, the refresh timer and the file watcher; it is dropped
//! at process stop. Nothing else holds cached state.

use crate::cache::CacheLayer;
use crate::config::{DashboardConfig, WorkbookConfig};
use crate::error::{DashError, DashResult};
use crate::extract::{Extractor, WorkbookSource};
use crate::services::{
    apply_filters, calculate_kpis, filter_options, params_key, FilterParams, Kpis,
};
use crate::services::filters::DEFAULT_OPTION_LIMIT;
use crate::types::{Extraction, OutputKind, SubTable, Table};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::info;

/// Zip local-file-header signature every .xlsx starts with
const XLSX_MAGIC: &[u8] = b"PK\x03\x04";

/// Filtered dataset plus the filter choices and KPIs shown beside it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetView {
    pub table: Table,
    pub filter_options: BTreeMap<String, Vec<String>>,
    pub kpis: Kpis,
}

pub struct Dashboard {
    config: DashboardConfig,
    extractor: Extractor,
    extractions: CacheLayer<Extraction>,
    datasets: CacheLayer<DatasetView>,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> DashResult<Self> {
        Self::with_caches(config, CacheLayer::new(), CacheLayer::new())
    }

    pub fn with_caches(
        config: DashboardConfig,
        extractions: CacheLayer<Extraction>,
        datasets: CacheLayer<DatasetView>,
    ) -> DashResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            extractor: Extractor::new()?,
            extractions,
            datasets,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn ttl(&self) -> Duration {
        self.config.cache_ttl()
    }

    pub fn workbook(&self, kind: &str) -> DashResult<&WorkbookConfig> {
        self.config
            .workbook(kind)
            .ok_or_else(|| DashError::UnknownWorkbook(kind.to_string()))
    }

    fn key_prefix(workbook: &WorkbookConfig) -> String {
        format!("{}#", workbook.path.display())
    }

    /// Every sub-table of one workbook
    pub fn extraction(&self, kind: &str) -> DashResult<Extraction> {
        let workbook = self.workbook(kind)?;
        let key = format!("{}*", Self::key_prefix(workbook));
        Ok(self
            .extractions
            .get_or_compute(&key, self.ttl(), || self.extractor.run(workbook)))
    }

    /// Only the chart sub-tables of one workbook
    pub fn charts(&self, kind: &str) -> DashResult<Extraction> {
        let mut extraction = self.extraction(kind)?;
        let workbook = self.workbook(kind)?;
        extraction.tables.retain(|name, _| {
            workbook
                .descriptor(name)
                .is_some_and(|d| d.output == OutputKind::Chart)
        });
        Ok(extraction)
    }

    /// One named sub-table
    pub fn sub_table(&self, kind: &str, name: &str) -> DashResult<SubTable> {
        let workbook = self.workbook(kind)?;
        let descriptor = workbook
            .descriptor(name)
            .ok_or_else(|| DashError::UnknownTable {
                workbook: kind.to_string(),
                table: name.to_string(),
            })?;

        let key = format!("{}{}", Self::key_prefix(workbook), name);
        let extraction = self.extractions.get_or_compute(&key, self.ttl(), || {
            let mut single = Extraction::new();
            let table = self
                .extractor
                .run_table(workbook, name)
                .unwrap_or_else(|| SubTable::empty(descriptor.output));
            single.insert(name, table);
            single
        });
        Ok(extraction
            .get(name)
            .cloned()
            .unwrap_or_else(|| SubTable::empty(descriptor.output)))
    }

    /// The workbook's dataset, filtered by `params`
    pub fn dataset(&self, kind: &str, params: &FilterParams) -> DashResult<DatasetView> {
        let workbook = self.workbook(kind)?;
        let name = workbook.dataset.as_deref().ok_or_else(|| {
            DashError::Config(format!("workbook '{}' declares no dataset", kind))
        })?;

        let key = format!("{}{}?{}", Self::key_prefix(workbook), name, params_key(params));
        Ok(self.datasets.get_or_compute(&key, self.ttl(), || {
            // Read inside the producer so an invalidation racing this call keeps the view uncached
            let table = self
                .sub_table(kind, name)
                .ok()
                .and_then(|full| full.as_table().cloned())
                .unwrap_or_default();
            let filtered = apply_filters(&table, params);
            DatasetView {
                filter_options: filter_options(&table, DEFAULT_OPTION_LIMIT),
                kpis: calculate_kpis(&filtered),
                table: filtered,
            }
        }))
    }

    /// Drop every cached result derived from the workbook `kind`
    pub fn invalidate_workbook(&self, kind: &str) -> DashResult<usize> {
        let workbook = self.workbook(kind)?;
        let prefix = Self::key_prefix(workbook);
        let removed =
            self.extractions.invalidate_prefix(&prefix) + self.datasets.invalidate_prefix(&prefix);
        info!(workbook = kind, removed, "Workbook cache invalidated");
        Ok(removed)
    }

    /// Drop every cached result derived from the workbook stored at `path`
    pub fn invalidate_path(&self, path: &Path) -> usize {
        match self.config.workbook_for_path(path) {
            Some(workbook) => {
                let prefix = Self::key_prefix(workbook);
                self.extractions.invalidate_prefix(&prefix)
                    + self.datasets.invalidate_prefix(&prefix)
            }
            None => 0,
        }
    }

    /// Scheduled refresh: drop everything
    pub fn refresh(&self) -> usize {
        let removed = self.extractions.invalidate_all() + self.datasets.invalidate_all();
        info!(removed, "Scheduled refresh cleared cache");
        removed
    }

    /// Replace the workbook `kind` with `bytes`, then invalidate its cache
    ///
    /// The payload must open as an .xlsx. It is written to a uniquely named
    /// temp file beside the target, synced, and renamed over it, so readers
    /// and concurrent uploads see either the old or a complete new file.
    pub fn replace_workbook(&self, kind: &str, bytes: &[u8]) -> DashResult<PathBuf> {
        let workbook = self.workbook(kind)?;
        if !bytes.starts_with(XLSX_MAGIC) {
            return Err(DashError::InvalidUpload("not an .xlsx file".to_string()));
        }
        WorkbookSource::from_bytes(bytes.to_vec())
            .map_err(|e| DashError::InvalidUpload(e.to_string()))?;

        let target = workbook.path.clone();
        let dir = parent_dir(&target);
        fs::create_dir_all(dir)?;

        let mut staging = NamedTempFile::new_in(dir)?;
        staging.write_all(bytes)?;
        staging.flush()?;
        staging.as_file().sync_all()?;
        // A failed persist drops the temp file
        staging.persist(&target).map_err(|e| DashError::Io(e.error))?;

        info!(workbook = kind, path = %target.display(), size = bytes.len(), "Workbook replaced");
        self.invalidate_workbook(kind)?;
        Ok(target)
    }
}

/// Directory uploads for `target` are staged in
fn parent_dir(target: &Path) -> &Path {
    target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dashboard_in(dir: &Path) -> Dashboard {
        let mut config = DashboardConfig::default();
        for workbook in &mut config.workbooks {
            workbook.path = dir.join(format!("{}.xlsx", workbook.kind));
        }
        Dashboard::new(config).unwrap()
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir(Path::new("/data/geral.xlsx")), Path::new("/data"));
        assert_eq!(parent_dir(Path::new("geral.xlsx")), Path::new("."));
    }

    #[test]
    fn test_unknown_workbook() {
        let dir = tempfile::TempDir::new().unwrap();
        let dashboard = dashboard_in(dir.path());
        assert!(matches!(
            dashboard.extraction("nope"),
            Err(DashError::UnknownWorkbook(_))
        ));
        assert!(matches!(
            dashboard.sub_table("geral", "nope"),
            Err(DashError::UnknownTable { .. })
        ));
    }

    #[test]
    fn test_missing_files_degrade_to_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let dashboard = dashboard_in(dir.path());

        let charts = dashboard.charts("geral").unwrap();
        assert_eq!(charts.len(), 5);
        assert!(charts.tables.values().all(|t| t.as_chart().is_some() && t.is_empty()));

        let view = dashboard.dataset("visa", &FilterParams::new()).unwrap();
        assert!(view.table.is_empty());
        assert_eq!(view.kpis, Kpis::default());
    }

    #[test]
    fn test_rejects_non_xlsx_upload() {
        let dir = tempfile::TempDir::new().unwrap();
        let dashboard = dashboard_in(dir.path());
        let err = dashboard.replace_workbook("geral", b"hello").unwrap_err();
        assert!(matches!(err, DashError::InvalidUpload(_)));

        let err = dashboard
            .replace_workbook("geral", b"PK\x03\x04 truncated")
            .unwrap_err();
        assert!(matches!(err, DashError::InvalidUpload(_)));
        assert!(!dir.path().join("geral.xlsx").exists());
    }
}
