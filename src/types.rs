use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

//==============================================================================
// Raw Grid Types
//==============================================================================

/// A single worksheet cell as stored in the workbook
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    Text(String),
    Number(f64),
    #[default]
    Empty,
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// Empty cells and whitespace-only text both count as blank (the block sentinel)
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(n) => n.is_nan(),
        }
    }

    /// Trimmed text of the cell, numbers rendered without a trailing `.0`
    pub fn label(&self) -> String {
        match self {
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => format_number(*n),
            Cell::Empty => String::new(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if !n.is_nan() => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Format a number for display, removing unnecessary decimal places
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return String::new();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    // Six decimals hides binary artifacts such as 0.30000000000000004
    let rounded = (n * 1e6).round() / 1e6;
    format!("{:.6}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Immutable rectangular worksheet grid, addressed by zero-based (row, column)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl Grid {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a grid from ragged rows; short rows are padded with `Cell::Empty`
    pub fn from_rows(mut rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, Cell::Empty);
        }
        Self { rows, width }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    /// Cell at (row, column); positions outside the populated extent read as Empty
    pub fn get(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn contains(&self, row: usize, column: usize) -> bool {
        row < self.height() && column < self.width
    }
}

/// Top-left cell of a named sub-table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub row: usize,
    pub column: usize,
    pub label: String,
}

/// Direction of a block's category axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Labels run down a column, values run rightward per row
    #[default]
    RowMajor,
    /// Labels run across a row, values run downward per column
    ColumnMajor,
}

/// Raw rectangular region read from an anchor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Block {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    /// Append a record, padding short rows with Empty and cutting long ones to the header width
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.header.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }
}

//==============================================================================
// Normalized Output Types
//==============================================================================

/// Normalized, JSON-ready table
///
/// Serializes as `{"columns": [...], "records": [{column: value}, ...]}` with
/// record keys in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table; every row is padded or cut to the column count
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of `column` in record `row`
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }

    /// All values of one column, top to bottom
    pub fn column_values(&self, column: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(column)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.get(idx).map_or("", String::as_str))
                .collect(),
        )
    }

    /// Keep only the rows for which `keep` returns true
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String], &[String]) -> bool,
    {
        let columns = &self.columns;
        self.rows.retain(|row| keep(columns, row));
    }
}

struct RecordRef<'a> {
    columns: &'a [String],
    values: &'a [String],
}

impl Serialize for RecordRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

struct RecordsRef<'a>(&'a Table);

impl Serialize for RecordsRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.rows.iter().map(|row| RecordRef {
            columns: &self.0.columns,
            values: row,
        }))
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Table", 2)?;
        state.serialize_field("columns", &self.columns)?;
        state.serialize_field("records", &RecordsRef(self))?;
        state.end()
    }
}

/// A chart data point: numeric when the cell parses, text otherwise
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesValue {
    Number(f64),
    Text(String),
}

/// Chart-ready projection: one label axis, one value list per named series
///
/// Serializes as `{"labels": [...], "values": {series: [...]}}` with series in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub series: Vec<(String, Vec<SeriesValue>)>,
}

impl ChartSeries {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.series.is_empty()
    }

    pub fn values(&self, name: &str) -> Option<&[SeriesValue]> {
        self.series
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }
}

struct SeriesMap<'a>(&'a [(String, Vec<SeriesValue>)]);

impl Serialize for SeriesMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, values) in self.0 {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

impl Serialize for ChartSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ChartSeries", 2)?;
        state.serialize_field("labels", &self.labels)?;
        state.serialize_field("values", &SeriesMap(&self.series))?;
        state.end()
    }
}

/// Which shape a sub-table is delivered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    #[default]
    Table,
    Chart,
}

/// One named extraction result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SubTable {
    Table(Table),
    Chart(ChartSeries),
}

impl SubTable {
    /// The empty value of the given output kind, never null
    pub fn empty(kind: OutputKind) -> Self {
        match kind {
            OutputKind::Table => SubTable::Table(Table::empty()),
            OutputKind::Chart => SubTable::Chart(ChartSeries::empty()),
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            SubTable::Table(t) => Some(t),
            SubTable::Chart(_) => None,
        }
    }

    pub fn as_chart(&self) -> Option<&ChartSeries> {
        match self {
            SubTable::Chart(c) => Some(c),
            SubTable::Table(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SubTable::Table(t) => t.is_empty(),
            SubTable::Chart(c) => c.is_empty(),
        }
    }
}

/// Result of one pipeline run: sub-table name → result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Extraction {
    pub tables: BTreeMap<String, SubTable>,
}

impl Extraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, table: SubTable) {
        self.tables.insert(name.into(), table);
    }

    pub fn get(&self, name: &str) -> Option<&SubTable> {
        self.tables.get(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
