//! Block reader - reads a variable-length sub-table from its anchor
//!
//! The anchor cell heads the category (label) axis. Series headers follow it
//! along the header axis, and records follow along the category axis until
//! the first blank label cell or the grid edge.

use crate::error::{DashError, DashResult};
use crate::types::{Anchor, Block, Cell, Grid, Orientation};

/// Map (record, field) offsets from the anchor onto grid coordinates
fn position(
    anchor: &Anchor,
    orientation: Orientation,
    record: usize,
    field: usize,
) -> (usize, usize) {
    match orientation {
        Orientation::RowMajor => (anchor.row + record, anchor.column + field),
        Orientation::ColumnMajor => (anchor.row + field, anchor.column + record),
    }
}

/// Read the block anchored at `anchor`
///
/// The header is the anchor's label followed by up to `max_series` series
/// names (stopping early at the first blank). Each record is the label cell
/// followed by one cell per series. A header with no series yields an empty
/// block.
pub fn read(
    grid: &Grid,
    anchor: &Anchor,
    orientation: Orientation,
    max_series: Option<usize>,
) -> Block {
    let mut header = vec![anchor.label.clone()];
    let limit = max_series.unwrap_or(usize::MAX);

    let mut field = 1;
    while header.len() - 1 < limit {
        let (row, column) = position(anchor, orientation, 0, field);
        if !grid.contains(row, column) {
            break;
        }
        let cell = grid.get(row, column);
        if cell.is_blank() {
            break;
        }
        header.push(cell.label());
        field += 1;
    }

    if header.len() == 1 {
        return Block::default();
    }

    let width = header.len();
    let mut block = Block::new(header);
    let mut record = 1;
    loop {
        let (row, column) = position(anchor, orientation, record, 0);
        if !grid.contains(row, column) {
            break;
        }
        let label = grid.get(row, column);
        if label.is_blank() {
            break;
        }

        let cells: Vec<Cell> = (0..width)
            .map(|f| {
                let (r, c) = position(anchor, orientation, record, f);
                grid.get(r, c).clone()
            })
            .collect();
        block.push_row(cells);
        record += 1;
    }
    block
}

/// Check the block's shape invariant: every row is as wide as the header
pub fn validate(block: &Block) -> DashResult<()> {
    let width = block.header.len();
    match block.rows.iter().position(|row| row.len() != width) {
        Some(idx) => Err(DashError::MalformedBlock(format!(
            "row {} has {} cells, header has {}",
            idx,
            block.rows[idx].len(),
            width
        ))),
        None => Ok(()),
    }
}
