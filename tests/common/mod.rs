//! Shared fixtures: real .xlsx files written with rust_xlsxwriter

#![allow(dead_code)]

use mcdagua_dash::config::DashboardConfig;
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy)]
pub enum Val {
    Text(&'static str),
    Num(f64),
    Bool(bool),
}

pub type SheetCells = Vec<(u32, u16, Val)>;

/// Write a workbook with one sheet per `(name, cells)` entry
pub fn write_workbook(path: &Path, sheets: &[(&str, SheetCells)]) {
    let mut workbook = Workbook::new();
    for (name, cells) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name).unwrap();
        for (row, col, value) in cells {
            match value {
                Val::Text(s) => sheet.write_string(*row, *col, *s).unwrap(),
                Val::Num(n) => sheet.write_number(*row, *col, *n).unwrap(),
                Val::Bool(b) => sheet.write_boolean(*row, *col, *b).unwrap(),
            };
        }
    }
    workbook.save(path).unwrap();
}

/// A row of cells starting at (`row`, `col`)
pub fn row(row: u32, col: u16, values: &[Val]) -> SheetCells {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (row, col + i as u16, *v))
        .collect()
}

/// The chart sheet of the general workbook: the annual restaurant block at
/// H3 (header) with four months below it
pub fn geral_chart_cells() -> SheetCells {
    let mut cells = row(
        2,
        8,
        &[Val::Text("2023"), Val::Text("2024"), Val::Text("2025")],
    );
    let months = [("Jan", 10.0), ("Feb", 20.0), ("Mar", 30.0), ("Apr", 40.0)];
    for (i, &(month, base)) in months.iter().enumerate() {
        cells.extend(row(
            3 + i as u32,
            7,
            &[Val::Text(month), Val::Num(base), Val::Num(base + 1.0), Val::Num(base + 2.0)],
        ));
    }
    cells
}

/// The dataset sheet shared by the three workbooks
pub fn dataset_cells() -> SheetCells {
    let mut cells = row(
        0,
        0,
        &[
            Val::Text("Loja"),
            Val::Text("Regional"),
            Val::Text("Checklist"),
            Val::Text("Data Coleta"),
        ],
    );
    let records = [
        ("L1", "SP", "OK", 45292.0),
        ("L2", "RJ", "micro", 45293.0),
        ("L3", "SP", "NA", 45294.0),
        ("L4", "MG", "ok", 45295.0),
    ];
    for (i, &(loja, regional, checklist, serial)) in records.iter().enumerate() {
        cells.extend(row(
            1 + i as u32,
            0,
            &[
                Val::Text(loja),
                Val::Text(regional),
                Val::Text(checklist),
                Val::Num(serial),
            ],
        ));
    }
    cells
}

/// Built-in layout with every workbook redirected into `dir`
pub fn config_in(dir: &Path) -> DashboardConfig {
    let mut config = DashboardConfig::default();
    for workbook in &mut config.workbooks {
        workbook.path = dir.join(format!("{}.xlsx", workbook.kind));
    }
    config
}

pub fn workbook_path(dir: &Path, kind: &str) -> PathBuf {
    dir.join(format!("{}.xlsx", kind))
}

/// General workbook with the dataset and chart sheets
pub fn write_geral(dir: &Path) -> PathBuf {
    let path = workbook_path(dir, "geral");
    write_workbook(
        &path,
        &[
            ("Geral", dataset_cells()),
            ("gráfico-pendência", geral_chart_cells()),
        ],
    );
    path
}

/// VISA workbook with just the dataset sheet
pub fn write_visa(dir: &Path) -> PathBuf {
    let path = workbook_path(dir, "visa");
    write_workbook(&path, &[("VISA", dataset_cells())]);
    path
}
