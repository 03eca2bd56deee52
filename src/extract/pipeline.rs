//! Extraction pipeline - runs sub-table descriptors against workbooks
//!
//! This is the single error boundary of the engine: unreadable workbooks,
//! missing sheets, missing anchors and malformed blocks all degrade to the
//! empty value of the sub-table's output kind plus a log entry.

use crate::config::{SheetConfig, TableDescriptor, WorkbookConfig};
use crate::error::{DashError, DashResult};
use crate::extract::grid::{SheetSelector, WorkbookSource};
use crate::extract::normalize::Normalizer;
use crate::extract::transpose::{to_chart_series, transpose};
use crate::extract::{anchor, block};
use crate::types::{Extraction, Grid, OutputKind, SubTable};
use std::io::{Read, Seek};
use tracing::{debug, error, warn};

pub struct Extractor {
    normalizer: Normalizer,
}

impl Extractor {
    pub fn new() -> DashResult<Self> {
        Ok(Self {
            normalizer: Normalizer::new()?,
        })
    }

    /// Build one sub-table from an already loaded grid
    ///
    /// Fails with `AnchorNotFound` or `MalformedBlock`; callers outside the
    /// pipeline see those only through this method.
    pub fn extract_table(&self, grid: &Grid, descriptor: &TableDescriptor) -> DashResult<SubTable> {
        let anchor = anchor::locate(grid, &descriptor.anchor).ok_or_else(|| {
            DashError::AnchorNotFound {
                table: descriptor.name.clone(),
            }
        })?;

        let mut raw = block::read(grid, &anchor, descriptor.orientation, descriptor.series_count);
        if let (Some(label), Some(first)) = (&descriptor.label, raw.header.first_mut()) {
            *first = label.clone();
        }
        block::validate(&raw)?;

        let mut table = self.normalizer.table(&raw);
        if let Some(pivot) = &descriptor.transpose {
            table = transpose(&table, pivot)?;
        }
        debug!(
            table = %descriptor.name,
            row = anchor.row,
            column = anchor.column,
            records = table.len(),
            "Extracted sub-table"
        );

        Ok(match descriptor.output {
            OutputKind::Table => SubTable::Table(table),
            OutputKind::Chart => SubTable::Chart(to_chart_series(&table)),
        })
    }

    /// Extract every sub-table of `workbook`; never fails
    ///
    /// An unreadable file empties every sub-table of this workbook; a missing
    /// sheet empties only that sheet's sub-tables.
    pub fn run(&self, workbook: &WorkbookConfig) -> Extraction {
        let mut out = Extraction::new();
        let mut source = match WorkbookSource::open(&workbook.path) {
            Ok(source) => source,
            Err(e) => {
                report(&workbook.kind, "*", &e);
                for sheet in &workbook.sheets {
                    fill_empty(&mut out, sheet);
                }
                return out;
            }
        };

        for sheet in &workbook.sheets {
            self.run_sheet(&mut source, &workbook.kind, sheet, &mut out);
        }
        out
    }

    /// Extract a single named sub-table; `None` when the workbook does not declare it
    pub fn run_table(&self, workbook: &WorkbookConfig, name: &str) -> Option<SubTable> {
        let sheet = workbook
            .sheets
            .iter()
            .find(|s| s.tables.iter().any(|t| t.name == name))?;
        let descriptor = sheet.tables.iter().find(|t| t.name == name)?;

        let result = WorkbookSource::open(&workbook.path)
            .and_then(|mut source| source.grid(&SheetSelector::Aliases(sheet.aliases.clone())))
            .and_then(|grid| self.extract_table(&grid, descriptor));

        Some(result.unwrap_or_else(|e| {
            report(&workbook.kind, name, &e);
            SubTable::empty(descriptor.output)
        }))
    }

    /// Extract every sub-table of an in-memory workbook (same boundary rules as `run`)
    pub fn run_bytes(&self, workbook: &WorkbookConfig, bytes: Vec<u8>) -> Extraction {
        let mut out = Extraction::new();
        match WorkbookSource::from_bytes(bytes) {
            Ok(mut source) => {
                for sheet in &workbook.sheets {
                    self.run_sheet(&mut source, &workbook.kind, sheet, &mut out);
                }
            }
            Err(e) => {
                report(&workbook.kind, "*", &e);
                for sheet in &workbook.sheets {
                    fill_empty(&mut out, sheet);
                }
            }
        }
        out
    }

    fn run_sheet<RS: Read + Seek>(
        &self,
        source: &mut WorkbookSource<RS>,
        kind: &str,
        sheet: &SheetConfig,
        out: &mut Extraction,
    ) {
        let grid = match source.grid(&SheetSelector::Aliases(sheet.aliases.clone())) {
            Ok(grid) => grid,
            Err(e) => {
                report(kind, "*", &e);
                fill_empty(out, sheet);
                return;
            }
        };

        for descriptor in &sheet.tables {
            let table = self.extract_table(&grid, descriptor).unwrap_or_else(|e| {
                report(kind, &descriptor.name, &e);
                SubTable::empty(descriptor.output)
            });
            out.insert(descriptor.name.clone(), table);
        }
    }
}

fn fill_empty(out: &mut Extraction, sheet: &SheetConfig) {
    for descriptor in &sheet.tables {
        out.insert(descriptor.name.clone(), SubTable::empty(descriptor.output));
    }
}

fn report(kind: &str, table: &str, err: &DashError) {
    if err.is_soft() {
        warn!(workbook = kind, table, error = %err, "Sub-table degraded to empty");
    } else {
        error!(workbook = kind, table, error = %err, "Unexpected extraction failure");
    }
}
