//! Excel exporter implementation - Table → .xlsx

use crate::error::{DashError, DashResult};
use crate::types::{format_number, Table};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

/// Sheet name used when the caller does not provide one
pub const DEFAULT_SHEET_NAME: &str = "dados";

/// Build a workbook with one worksheet holding `table` (header row + records)
fn build_workbook(table: &Table, sheet_name: &str) -> DashResult<Workbook> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet_name)
        .map_err(|e| DashError::Export(format!("Failed to set worksheet name: {}", e)))?;
    write_table(worksheet, table)?;
    Ok(workbook)
}

fn write_table(worksheet: &mut Worksheet, table: &Table) -> DashResult<()> {
    let header_format = Format::new().set_bold();

    for (col_idx, name) in table.columns.iter().enumerate() {
        let col = column_index(col_idx)?;
        worksheet
            .write_string_with_format(0, col, name, &header_format)
            .map_err(|e| DashError::Export(format!("Failed to write header: {}", e)))?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let excel_row = u32::try_from(row_idx + 1)
            .map_err(|_| DashError::Export(format!("Row {} exceeds sheet limits", row_idx)))?;
        for (col_idx, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let col = column_index(col_idx)?;
            let result = match as_number(value) {
                Some(n) => worksheet.write_number(excel_row, col, n),
                None => worksheet.write_string(excel_row, col, value),
            };
            result.map_err(|e| {
                DashError::Export(format!("Failed to write cell ({}, {}): {}", excel_row, col, e))
            })?;
        }
    }

    worksheet.autofit();
    Ok(())
}

/// Numeric value of `value` when writing it as a number reads back as the same text
fn as_number(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && format_number(*n) == value)
}

fn column_index(idx: usize) -> DashResult<u16> {
    u16::try_from(idx)
        .map_err(|_| DashError::Export(format!("Column {} exceeds sheet limits", idx)))
}

/// Serialize `table` as .xlsx bytes (download payload)
pub fn export_table_to_buffer(table: &Table, sheet_name: &str) -> DashResult<Vec<u8>> {
    build_workbook(table, sheet_name)?
        .save_to_buffer()
        .map_err(|e| DashError::Export(format!("Failed to build Excel file: {}", e)))
}

/// Write `table` to an .xlsx file at `output_path`
pub fn export_table(table: &Table, sheet_name: &str, output_path: &Path) -> DashResult<()> {
    build_workbook(table, sheet_name)?
        .save(output_path)
        .map_err(|e| DashError::Export(format!("Failed to save Excel file: {}", e)))
}
