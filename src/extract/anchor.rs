//! Anchor locator - finds the top-left cell of a named sub-table

use crate::config::AnchorStrategy;
use crate::types::{Anchor, Grid};
use tracing::debug;

/// Resolve `strategy` against `grid`; `None` means the sub-table is absent
pub fn locate(grid: &Grid, strategy: &AnchorStrategy) -> Option<Anchor> {
    match strategy {
        AnchorStrategy::Fixed { row, column } => fixed(grid, *row, *column),
        AnchorStrategy::Marker {
            text,
            rows,
            columns,
            offset,
        } => {
            let found = search(grid, text, *rows, *columns)?;
            shift(grid, &found, *offset)
        }
    }
}

/// Anchor at a known position, absent when outside the populated extent
pub fn fixed(grid: &Grid, row: usize, column: usize) -> Option<Anchor> {
    if !grid.contains(row, column) {
        debug!(row, column, "Fixed anchor outside grid");
        return None;
    }
    Some(Anchor {
        row,
        column,
        label: grid.get(row, column).label(),
    })
}

/// First cell (row by row) in the top-left `rows` × `columns` region whose trimmed text equals `marker`
pub fn search(grid: &Grid, marker: &str, rows: usize, columns: usize) -> Option<Anchor> {
    let marker = marker.trim();
    if marker.is_empty() {
        return None;
    }
    let max_row = rows.min(grid.height());
    let max_col = columns.min(grid.width());

    for row in 0..max_row {
        for column in 0..max_col {
            let cell = grid.get(row, column);
            if cell.label() == marker {
                return Some(Anchor {
                    row,
                    column,
                    label: marker.to_string(),
                });
            }
        }
    }
    debug!(marker, rows, columns, "Marker not found");
    None
}

fn shift(grid: &Grid, anchor: &Anchor, (dr, dc): (i64, i64)) -> Option<Anchor> {
    if (dr, dc) == (0, 0) {
        return Some(anchor.clone());
    }
    let row = usize::try_from(anchor.row as i64 + dr).ok()?;
    let column = usize::try_from(anchor.column as i64 + dc).ok()?;
    fixed(grid, row, column)
}
