//! Grid source - one worksheet of an .xlsx workbook as an in-memory grid

use crate::error::{DashError, DashResult};
use crate::extract::normalize::fold_key;
use crate::types::{Cell, Grid};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which sheet to load: an exact name, or acceptable aliases in preference order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    Name(String),
    Aliases(Vec<String>),
}

impl SheetSelector {
    pub fn aliases(&self) -> Vec<String> {
        match self {
            SheetSelector::Name(name) => vec![name.clone()],
            SheetSelector::Aliases(aliases) => aliases.clone(),
        }
    }

    /// Pick the sheet to read from the workbook's sheet names
    ///
    /// Aliases are tried in order for an exact match first, then again
    /// ignoring case and accents.
    pub fn resolve(&self, sheet_names: &[String]) -> Option<String> {
        let aliases = self.aliases();
        for alias in &aliases {
            if let Some(name) = sheet_names.iter().find(|n| *n == alias) {
                return Some(name.clone());
            }
        }
        if let SheetSelector::Name(_) = self {
            return None;
        }
        for alias in &aliases {
            let wanted = fold_key(alias);
            if let Some(name) = sheet_names.iter().find(|n| fold_key(n) == wanted) {
                return Some(name.clone());
            }
        }
        None
    }
}

impl From<&str> for SheetSelector {
    fn from(name: &str) -> Self {
        SheetSelector::Name(name.to_string())
    }
}

impl From<Vec<String>> for SheetSelector {
    fn from(aliases: Vec<String>) -> Self {
        SheetSelector::Aliases(aliases)
    }
}

/// An opened workbook; every sheet read from it comes from the same file snapshot
pub struct WorkbookSource<RS> {
    path: PathBuf,
    workbook: Xlsx<RS>,
}

impl WorkbookSource<BufReader<File>> {
    /// Open the workbook at `path`; missing, locked, torn or non-xlsx files are unreadable
    pub fn open(path: &Path) -> DashResult<Self> {
        let workbook = open_workbook::<Xlsx<BufReader<File>>, _>(path).map_err(|e| {
            DashError::WorkbookUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }
}

impl WorkbookSource<Cursor<Vec<u8>>> {
    pub fn from_bytes(bytes: Vec<u8>) -> DashResult<Self> {
        let path = PathBuf::from("<memory>");
        let workbook = Xlsx::new(Cursor::new(bytes)).map_err(|e| DashError::WorkbookUnreadable {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { path, workbook })
    }
}

impl<RS: Read + Seek> WorkbookSource<RS> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// Read the sheet chosen by `selector` into a grid
    pub fn grid(&mut self, selector: &SheetSelector) -> DashResult<Grid> {
        let names = self.workbook.sheet_names();
        let name = selector
            .resolve(&names)
            .ok_or_else(|| DashError::SheetNotFound {
                path: self.path.clone(),
                aliases: selector.aliases(),
            })?;

        let range = self
            .workbook
            .worksheet_range(&name)
            .map_err(|e| DashError::WorkbookUnreadable {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        let grid = range_to_grid(&range);
        debug!(
            path = %self.path.display(),
            sheet = %name,
            height = grid.height(),
            width = grid.width(),
            "Loaded worksheet"
        );
        Ok(grid)
    }
}

/// Load one worksheet of the workbook at `path`
pub fn load(path: &Path, sheet: &SheetSelector) -> DashResult<Grid> {
    WorkbookSource::open(path)?.grid(sheet)
}

/// Load one worksheet from an in-memory workbook
pub fn load_from_bytes(bytes: &[u8], sheet: &SheetSelector) -> DashResult<Grid> {
    WorkbookSource::from_bytes(bytes.to_vec())?.grid(sheet)
}

/// Convert a calamine range into an absolutely addressed grid (A1 is (0, 0))
pub fn range_to_grid(range: &Range<Data>) -> Grid {
    let (Some(start), Some(end)) = (range.start(), range.end()) else {
        return Grid::empty();
    };
    let (row0, col0) = (start.0 as usize, start.1 as usize);
    let height = end.0 as usize + 1;
    let width = end.1 as usize + 1;

    let mut rows = vec![vec![Cell::Empty; width]; height];
    for (r, c, data) in range.used_cells() {
        if let Some(slot) = rows.get_mut(row0 + r).and_then(|row| row.get_mut(col0 + c)) {
            *slot = convert_cell(data);
        }
    }
    Grid::from_rows(rows)
}

/// Map a calamine value onto the three-way cell model
pub fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}
