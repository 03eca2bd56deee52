//! Dashboard configuration
//!
//! Workbook locations, sheet aliases and the declarative sub-table
//! descriptors consumed by the extraction pipeline. Loaded from an optional
//! YAML file, then overridden from the environment.

use crate::error::{DashError, DashResult};
use crate::types::{Orientation, OutputKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_REFRESH_MINUTES: u64 = 5;
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;
pub const DEFAULT_SEARCH_ROWS: usize = 20;
pub const DEFAULT_SEARCH_COLUMNS: usize = 20;

/// Environment variable → workbook kind
const PATH_OVERRIDES: [(&str, &str); 3] = [
    ("PATH_GERAL", "geral"),
    ("PATH_VISA", "visa"),
    ("PATH_HACCP", "haccp"),
];

fn default_search_rows() -> usize {
    DEFAULT_SEARCH_ROWS
}

fn default_search_columns() -> usize {
    DEFAULT_SEARCH_COLUMNS
}

fn default_refresh_minutes() -> u64 {
    DEFAULT_REFRESH_MINUTES
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECONDS
}

/// How a sub-table's top-left cell is found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStrategy {
    /// Known (row, column), zero-based
    Fixed { row: usize, column: usize },
    /// Exact text match inside the top-left `rows` × `columns` region,
    /// shifted by `offset` (rows, columns)
    Marker {
        text: String,
        #[serde(default = "default_search_rows")]
        rows: usize,
        #[serde(default = "default_search_columns")]
        columns: usize,
        #[serde(default)]
        offset: (i64, i64),
    },
}

impl AnchorStrategy {
    pub fn fixed(row: usize, column: usize) -> Self {
        AnchorStrategy::Fixed { row, column }
    }

    pub fn marker(text: &str) -> Self {
        AnchorStrategy::Marker {
            text: text.to_string(),
            rows: DEFAULT_SEARCH_ROWS,
            columns: DEFAULT_SEARCH_COLUMNS,
            offset: (0, 0),
        }
    }
}

/// Declarative description of one sub-table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    #[serde(default)]
    pub orientation: Orientation,
    pub anchor: AnchorStrategy,
    /// Number of series to read; unbounded when absent
    #[serde(default)]
    pub series_count: Option<usize>,
    /// Name of the category column; defaults to the anchor cell's text
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub output: OutputKind,
    /// Normalized column whose values become the new header
    #[serde(default)]
    pub transpose: Option<String>,
}

impl TableDescriptor {
    pub fn new(name: &str, anchor: AnchorStrategy) -> Self {
        Self {
            name: name.to_string(),
            orientation: Orientation::RowMajor,
            anchor,
            series_count: None,
            label: None,
            output: OutputKind::Table,
            transpose: None,
        }
    }

    pub fn series(mut self, count: usize) -> Self {
        self.series_count = Some(count);
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn chart(mut self) -> Self {
        self.output = OutputKind::Chart;
        self
    }

    pub fn column_major(mut self) -> Self {
        self.orientation = Orientation::ColumnMajor;
        self
    }

    pub fn transpose(mut self, pivot: &str) -> Self {
        self.transpose = Some(pivot.to_string());
        self
    }
}

/// One worksheet: accepted names in preference order plus its sub-tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetConfig {
    pub aliases: Vec<String>,
    pub tables: Vec<TableDescriptor>,
}

/// One workbook file and the sheets extracted from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkbookConfig {
    pub kind: String,
    pub path: PathBuf,
    pub sheets: Vec<SheetConfig>,
    /// Sub-table served as the filterable dataset for this workbook
    #[serde(default)]
    pub dataset: Option<String>,
}

impl WorkbookConfig {
    pub fn descriptor(&self, name: &str) -> Option<&TableDescriptor> {
        self.sheets
            .iter()
            .flat_map(|s| s.tables.iter())
            .find(|t| t.name == name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.sheets
            .iter()
            .flat_map(|s| s.tables.iter())
            .map(|t| t.name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub workbooks: Vec<WorkbookConfig>,
    #[serde(default = "default_refresh_minutes")]
    pub refresh_interval_minutes: u64,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            workbooks: vec![geral_workbook(), visa_workbook(), haccp_workbook()],
            refresh_interval_minutes: DEFAULT_REFRESH_MINUTES,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
        }
    }
}

impl DashboardConfig {
    /// Parse a YAML configuration document
    pub fn from_yaml_str(content: &str) -> DashResult<Self> {
        let config: DashboardConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, built-in layout otherwise, then apply env overrides
    pub fn load(path: Option<&Path>) -> DashResult<Self> {
        let mut config = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                Self::from_yaml_str(&content)?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `PATH_*`, `REFRESH_INTERVAL` and `CACHE_DEFAULT_TIMEOUT` overrides
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (var, kind) in PATH_OVERRIDES {
            if let Some(path) = lookup(var).filter(|p| !p.trim().is_empty()) {
                if let Some(workbook) = self.workbooks.iter_mut().find(|w| w.kind == kind) {
                    workbook.path = PathBuf::from(path);
                }
            }
        }

        if let Some(raw) = lookup("REFRESH_INTERVAL") {
            self.refresh_interval_minutes = raw.trim().parse().unwrap_or_else(|_| {
                warn!(value = %raw, "REFRESH_INTERVAL is not a number, using default");
                DEFAULT_REFRESH_MINUTES
            });
        }

        if let Some(raw) = lookup("CACHE_DEFAULT_TIMEOUT") {
            self.cache_ttl_seconds = raw.trim().parse().unwrap_or_else(|_| {
                warn!(value = %raw, "CACHE_DEFAULT_TIMEOUT is not a number, using default");
                DEFAULT_CACHE_TTL_SECONDS
            });
        }
    }

    /// Reject configurations the pipeline cannot address unambiguously
    pub fn validate(&self) -> DashResult<()> {
        let mut kinds = HashSet::new();
        for workbook in &self.workbooks {
            if !kinds.insert(workbook.kind.as_str()) {
                return Err(DashError::Config(format!(
                    "duplicate workbook kind '{}'",
                    workbook.kind
                )));
            }

            let mut names = HashSet::new();
            for sheet in &workbook.sheets {
                if sheet.aliases.is_empty() {
                    return Err(DashError::Config(format!(
                        "workbook '{}' has a sheet without aliases",
                        workbook.kind
                    )));
                }
                for table in &sheet.tables {
                    if !names.insert(table.name.as_str()) {
                        return Err(DashError::Config(format!(
                            "duplicate sub-table '{}' in workbook '{}'",
                            table.name, workbook.kind
                        )));
                    }
                }
            }

            if let Some(dataset) = &workbook.dataset {
                if workbook.descriptor(dataset).is_none() {
                    return Err(DashError::Config(format!(
                        "dataset '{}' of workbook '{}' is not a declared sub-table",
                        dataset, workbook.kind
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn workbook(&self, kind: &str) -> Option<&WorkbookConfig> {
        self.workbooks.iter().find(|w| w.kind == kind)
    }

    /// Workbook whose configured path is `path`
    pub fn workbook_for_path(&self, path: &Path) -> Option<&WorkbookConfig> {
        self.workbooks.iter().find(|w| w.path == path)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes.max(1) * 60)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

//==============================================================================
// Built-in workbook layouts
//==============================================================================

fn geral_workbook() -> WorkbookConfig {
    WorkbookConfig {
        kind: "geral".to_string(),
        path: PathBuf::from("data/Planilhamcd.xlsx"),
        sheets: vec![
            SheetConfig {
                aliases: vec!["Geral".to_string(), "Planilha1".to_string()],
                tables: vec![TableDescriptor::new("dados", AnchorStrategy::fixed(0, 0))],
            },
            SheetConfig {
                aliases: vec![
                    "gráfico-pendência".to_string(),
                    "grafico-pendencia".to_string(),
                ],
                tables: vec![
                    TableDescriptor::new("restaurante_anual", AnchorStrategy::fixed(2, 7))
                        .series(3)
                        .label("Mês")
                        .chart(),
                    TableDescriptor::new("restaurante_regional", AnchorStrategy::fixed(20, 6))
                        .series(4)
                        .label("Mês")
                        .chart(),
                    TableDescriptor::new(
                        "backroom",
                        AnchorStrategy::Marker {
                            text: "Back room".to_string(),
                            rows: 60,
                            columns: DEFAULT_SEARCH_COLUMNS,
                            offset: (0, 0),
                        },
                    )
                    .series(4)
                    .label("Categoria")
                    .chart(),
                    TableDescriptor::new("gelo", AnchorStrategy::fixed(49, 6))
                        .series(4)
                        .label("Categoria")
                        .chart(),
                    TableDescriptor::new("pendencias_gelo", AnchorStrategy::fixed(64, 7))
                        .series(3)
                        .label("Regional")
                        .transpose("regional")
                        .chart(),
                ],
            },
        ],
        dataset: Some("dados".to_string()),
    }
}

fn visa_workbook() -> WorkbookConfig {
    WorkbookConfig {
        kind: "visa".to_string(),
        path: PathBuf::from("data/Coleta de Alimentos VISA - 2025.xlsx"),
        sheets: vec![SheetConfig {
            aliases: vec!["VISA".to_string(), "Coleta".to_string(), "Planilha1".to_string()],
            tables: vec![TableDescriptor::new("dados", AnchorStrategy::fixed(0, 0))],
        }],
        dataset: Some("dados".to_string()),
    }
}

fn haccp_workbook() -> WorkbookConfig {
    WorkbookConfig {
        kind: "haccp".to_string(),
        path: PathBuf::from("data/Planilha Controle - HACCP.xlsx"),
        sheets: vec![
            SheetConfig {
                aliases: vec!["HACCP".to_string(), "Controle".to_string()],
                tables: vec![TableDescriptor::new("dados", AnchorStrategy::fixed(0, 0))],
            },
            SheetConfig {
                aliases: vec!["GRÁFICO".to_string(), "GRAFICO".to_string()],
                tables: vec![
                    TableDescriptor::new("regional", AnchorStrategy::marker("Regional"))
                        .series(1)
                        .chart(),
                    TableDescriptor::new("consultor", AnchorStrategy::marker("Consultor"))
                        .series(1)
                        .chart(),
                    TableDescriptor::new(
                        "nao_conformidades",
                        AnchorStrategy::marker("Não Conformidades"),
                    )
                    .series(1)
                    .chart(),
                ],
            },
        ],
        dataset: Some("dados".to_string()),
    }
}
