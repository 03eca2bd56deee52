use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::error::{DashError, DashResult};
use crate::excel::{export_table, DEFAULT_SHEET_NAME};
use crate::extract::grid::load;
use crate::extract::{Extractor, SheetSelector, WorkbookSource};
use crate::services::FilterParams;
use crate::types::{Extraction, Grid};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Widest cell rendered by `inspect`
const INSPECT_CELL_WIDTH: usize = 14;

/// Execute the extract command: print every sub-table as JSON on stdout
pub fn extract(config: Option<PathBuf>, workbook: Option<String>, pretty: bool) -> DashResult<()> {
    let config = DashboardConfig::load(config.as_deref())?;
    config.validate()?;
    let extractor = Extractor::new()?;

    eprintln!("{}", "📊 McDagua - Extracting tables".bold().green());

    let json = match workbook {
        Some(kind) => {
            let workbook = config
                .workbook(&kind)
                .ok_or_else(|| DashError::UnknownWorkbook(kind.clone()))?;
            eprintln!("   Workbook: {} ({})", kind.bold(), workbook.path.display());
            let extraction = extractor.run(workbook);
            report_counts(&extraction);
            to_json(&extraction, pretty)?
        }
        None => {
            let mut all: BTreeMap<String, Extraction> = BTreeMap::new();
            for workbook in &config.workbooks {
                eprintln!("   Workbook: {} ({})", workbook.kind.bold(), workbook.path.display());
                let extraction = extractor.run(workbook);
                report_counts(&extraction);
                all.insert(workbook.kind.clone(), extraction);
            }
            to_json(&all, pretty)?
        }
    };

    println!("{}", json);
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> DashResult<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn report_counts(extraction: &Extraction) {
    let empty = extraction.tables.values().filter(|t| t.is_empty()).count();
    let status = if empty == 0 {
        format!("{} sub-tables", extraction.len()).green()
    } else {
        format!("{} sub-tables, {} empty", extraction.len(), empty).yellow()
    };
    eprintln!("     {}", status);
}

/// Execute the inspect command: list sheets, or dump the top-left region of one
pub fn inspect(file: PathBuf, sheet: Option<String>, rows: usize, cols: usize) -> DashResult<()> {
    println!("{}", "🔍 McDagua - Inspect".bold().green());
    println!("   File: {}", file.display());

    let Some(sheet) = sheet else {
        let source = WorkbookSource::open(&file)?;
        println!("\n{}", "Sheets:".bold());
        for name in source.sheet_names() {
            println!("   {}", name);
        }
        return Ok(());
    };

    let grid = load(&file, &SheetSelector::Name(sheet.clone()))?;
    println!("   Sheet: {} ({} rows × {} columns)\n", sheet, grid.height(), grid.width());
    print!("{}", render_region(&grid, rows, cols));
    Ok(())
}

/// Render rows `0..rows` and columns `0..cols` with absolute coordinates
pub fn render_region(grid: &Grid, rows: usize, cols: usize) -> String {
    let rows = rows.min(grid.height());
    let cols = cols.min(grid.width());
    let mut out = String::new();

    out.push_str(&format!("{:>5} ", ""));
    for col in 0..cols {
        let head = format!("{} ({})", column_letter(col), col);
        out.push_str(&format!("{:<width$} ", head, width = INSPECT_CELL_WIDTH));
    }
    out.push('\n');

    for row in 0..rows {
        out.push_str(&format!("{:>5} ", row));
        for col in 0..cols {
            let label: String = grid
                .get(row, col)
                .label()
                .chars()
                .take(INSPECT_CELL_WIDTH)
                .collect();
            out.push_str(&format!("{:<width$} ", label, width = INSPECT_CELL_WIDTH));
        }
        out.push('\n');
    }
    out
}

/// Excel column letters for a 0-based index (0 → A, 26 → AA)
pub fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Execute the export command: write a workbook's (filtered) dataset to .xlsx
pub fn export(
    config: Option<PathBuf>,
    kind: String,
    output: PathBuf,
    filters: Vec<String>,
) -> DashResult<()> {
    println!("{}", "📤 McDagua - Export dataset".bold().green());
    println!("   Workbook: {}", kind);
    println!("   Output: {}", output.display());

    let params = parse_filters(&filters)?;
    let dashboard = Dashboard::new(DashboardConfig::load(config.as_deref())?)?;
    let view = dashboard.dataset(&kind, &params)?;

    write_dataset(&view.table, &output)?;

    println!(
        "{}",
        format!("✅ Exported {} records ({} columns)", view.table.len(), view.table.columns.len())
            .bold()
            .green()
    );
    Ok(())
}

fn write_dataset(table: &crate::types::Table, output: &Path) -> DashResult<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    export_table(table, DEFAULT_SHEET_NAME, output)
}

/// Parse repeated `key=value` arguments into filter params
pub fn parse_filters(filters: &[String]) -> DashResult<FilterParams> {
    let mut params = FilterParams::new();
    for filter in filters {
        let (key, value) = filter
            .split_once('=')
            .ok_or_else(|| DashError::Config(format!("filter '{}' is not key=value", filter)))?;
        params.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(7), "H");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn test_parse_filters() {
        let params = parse_filters(&["loja=L1".to_string(), "q = frango ".to_string()]).unwrap();
        assert_eq!(params.get("loja").map(String::as_str), Some("L1"));
        assert_eq!(params.get("q").map(String::as_str), Some("frango"));

        assert!(matches!(
            parse_filters(&["loja".to_string()]),
            Err(DashError::Config(_))
        ));
    }

    #[test]
    fn test_render_region_uses_absolute_coordinates() {
        let grid = Grid::from_rows(vec![
            vec![Cell::Empty, Cell::Empty],
            vec![Cell::Empty, Cell::Text("Mês".to_string())],
        ]);
        let out = render_region(&grid, 10, 10);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("B (1)"));
        assert!(lines[2].trim_start().starts_with('1'));
        assert!(lines[2].contains("Mês"));
    }
}
