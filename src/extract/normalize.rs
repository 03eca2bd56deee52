//! Normalizer - turns a raw block into a stable column/value contract
//!
//! Header pipeline (order matters): trim, lower-case, strip diacritics,
//! whitespace runs to `_`, `/` and `.` to `_`, drop `(` and `)`, collapse
//! repeated `_`, then suffix duplicates with `_2`, `_3`, ... in first-seen
//! order. Values become strings; date-like columns get a fixed `dd/mm/yyyy`
//! rendering.

use crate::error::{DashError, DashResult};
use crate::types::{format_number, Block, Cell, Table};
use chrono::{Duration, NaiveDate};
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Largest Excel serial that maps to a real date (31/12/9999)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Remove combining marks after canonical decomposition ("Mês" → "Mes")
pub fn strip_diacritics(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Case- and accent-insensitive comparison key
pub fn fold_key(s: &str) -> String {
    strip_diacritics(&s.trim().to_lowercase())
}

/// Columns whose values are rendered as dates
pub fn is_date_column(name: &str) -> bool {
    name.contains("data") || name.contains("date")
}

pub struct Normalizer {
    whitespace: Regex,
    underscores: Regex,
    date: Regex,
}

impl Normalizer {
    pub fn new() -> DashResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| DashError::Config(format!("Regex error: {}", e)))
        };
        Ok(Self {
            whitespace: compile(r"\s+")?,
            underscores: compile(r"_+")?,
            date: compile(r"^(\d{1,4})[-/.](\d{1,2})[-/.](\d{1,4})(?:[ T].*)?$")?,
        })
    }

    /// Normalize one header name; `position` (1-based) names headers that normalize to nothing
    pub fn header(&self, name: &str, position: usize) -> String {
        let lowered = name.trim().to_lowercase();
        let plain = strip_diacritics(&lowered);
        let spaced = self.whitespace.replace_all(&plain, "_");
        let punct: String = spaced
            .chars()
            .filter(|c| *c != '(' && *c != ')')
            .map(|c| if c == '/' || c == '.' { '_' } else { c })
            .collect();
        let collapsed = self.underscores.replace_all(&punct, "_");
        let trimmed = collapsed.trim_matches('_');
        if trimmed.is_empty() {
            format!("col_{}", position)
        } else {
            trimmed.to_string()
        }
    }

    /// Normalize a header sequence and make every name unique
    pub fn headers(&self, names: &[String]) -> Vec<String> {
        dedupe(
            names
                .iter()
                .enumerate()
                .map(|(idx, name)| self.header(name, idx + 1))
                .collect(),
        )
    }

    /// Stringify one cell; Empty and NaN become ""
    pub fn value(&self, cell: &Cell, date_like: bool) -> String {
        if date_like {
            return self.date_value(cell);
        }
        match cell {
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => format_number(*n),
            Cell::Empty => String::new(),
        }
    }

    /// Render a date cell as `dd/mm/yyyy`; anything unparseable becomes ""
    pub fn date_value(&self, cell: &Cell) -> String {
        let date = match cell {
            Cell::Number(n) => excel_serial_to_date(*n),
            Cell::Text(s) => self.parse_date_text(s.trim()),
            Cell::Empty => None,
        };
        date.map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default()
    }

    fn parse_date_text(&self, text: &str) -> Option<NaiveDate> {
        let caps = self.date.captures(text)?;
        let first = caps.get(1)?.as_str();
        let second: u32 = caps.get(2)?.as_str().parse().ok()?;
        let third = caps.get(3)?.as_str();

        if first.len() == 4 {
            let year: i32 = first.parse().ok()?;
            let day: u32 = third.parse().ok()?;
            NaiveDate::from_ymd_opt(year, second, day)
        } else {
            let day: u32 = first.parse().ok()?;
            let year: i32 = match third.len() {
                2 => 2000 + third.parse::<i32>().ok()?,
                4 => third.parse().ok()?,
                _ => return None,
            };
            NaiveDate::from_ymd_opt(year, second, day)
        }
    }

    /// Normalize a raw block into a table, dropping all-empty rows and columns
    pub fn table(&self, block: &Block) -> Table {
        if block.is_empty() {
            return Table::empty();
        }
        let columns = self.headers(&block.header);
        let date_columns: Vec<bool> = columns.iter().map(|c| is_date_column(c)).collect();

        let rows: Vec<Vec<String>> = block
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(idx, _)| {
                        let cell = row.get(idx).unwrap_or(&Cell::Empty);
                        self.value(cell, date_columns[idx])
                    })
                    .collect::<Vec<String>>()
            })
            .filter(|row| row.iter().any(|v| !v.is_empty()))
            .collect();

        let keep: Vec<usize> = (0..columns.len())
            .filter(|idx| rows.iter().any(|row| !row[*idx].is_empty()))
            .collect();

        let kept_columns = keep.iter().map(|idx| columns[*idx].clone()).collect();
        let kept_rows = rows
            .into_iter()
            .map(|row| keep.iter().map(|idx| row[*idx].clone()).collect())
            .collect();
        Table::new(kept_columns, kept_rows)
    }
}

/// Suffix repeated names with `_2`, `_3`, ... skipping names already taken
pub fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut used = HashSet::new();
    names
        .into_iter()
        .map(|base| {
            let unique = if used.contains(&base) {
                (2..)
                    .map(|n| format!("{}_{}", base, n))
                    .find(|candidate| !used.contains(candidate))
                    .unwrap_or_default()
            } else {
                base
            };
            used.insert(unique.clone());
            unique
        })
        .collect()
}

/// Convert an Excel 1900-system serial day number to a date
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    // 1899-12-30 absorbs Excel's fictitious 29/02/1900
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn normalizer() -> Normalizer {
        Normalizer::new().unwrap()
    }

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_header_pipeline() {
        let n = normalizer();
        assert_eq!(n.header("  Mês ", 1), "mes");
        assert_eq!(n.header("Data da Coleta", 1), "data_da_coleta");
        assert_eq!(n.header("Não Conformidade (NC)", 1), "nao_conformidade_nc");
        assert_eq!(n.header("Temp./Umid.", 1), "temp_umid");
        assert_eq!(n.header("Ação   Corretiva", 1), "acao_corretiva");
        assert_eq!(n.header("2023", 1), "2023");
    }

    #[test]
    fn test_blank_header_gets_positional_name() {
        let n = normalizer();
        assert_eq!(n.header("   ", 3), "col_3");
        assert_eq!(n.header("()", 2), "col_2");
    }

    #[test]
    fn test_duplicates_suffixed_in_first_seen_order() {
        let n = normalizer();
        let headers = n.headers(&strings(&["Regional", "regional", "REGIONAL", "Loja"]));
        assert_eq!(headers, strings(&["regional", "regional_2", "regional_3", "loja"]));
    }

    #[test]
    fn test_duplicate_suffix_avoids_existing_names() {
        let n = normalizer();
        let headers = n.headers(&strings(&["a_2", "a", "a"]));
        assert_eq!(headers, strings(&["a_2", "a", "a_3"]));
    }

    #[test]
    fn test_headers_unique_and_idempotent() {
        let n = normalizer();
        let raw = strings(&["Mês", "mes", " MÊS ", "Data", "data.", "(data)", "", ""]);
        let once = n.headers(&raw);
        let unique: HashSet<&String> = once.iter().collect();
        assert_eq!(unique.len(), once.len());
        assert_eq!(n.headers(&once), once);
    }

    #[test]
    fn test_value_coercion() {
        let n = normalizer();
        assert_eq!(n.value(&Cell::Empty, false), "");
        assert_eq!(n.value(&Cell::Number(f64::NAN), false), "");
        assert_eq!(n.value(&Cell::Number(12.0), false), "12");
        assert_eq!(n.value(&Cell::Number(0.1 + 0.2), false), "0.3");
        assert_eq!(n.value(&Cell::Text("  ok ".to_string()), false), "ok");
    }

    #[test]
    fn test_date_values() {
        let n = normalizer();
        assert_eq!(n.value(&Cell::Number(45292.0), true), "01/01/2024");
        assert_eq!(n.value(&Cell::Number(45292.75), true), "01/01/2024");
        assert_eq!(
            n.value(&Cell::Text("2024-03-05 00:00:00".to_string()), true),
            "05/03/2024"
        );
        assert_eq!(n.value(&Cell::Text("5/3/24".to_string()), true), "05/03/2024");
        assert_eq!(n.value(&Cell::Text("amanhã".to_string()), true), "");
        assert_eq!(n.value(&Cell::Text("31/02/2024".to_string()), true), "");
        assert_eq!(n.value(&Cell::Empty, true), "");
    }

    #[test]
    fn test_date_column_detection() {
        assert!(is_date_column("data_coleta"));
        assert!(is_date_column("update_date"));
        assert!(!is_date_column("regional"));
    }

    #[test]
    fn test_table_drops_empty_rows_and_columns() {
        let n = normalizer();
        let mut block = Block::new(strings(&["Loja", "Vazia", "Status"]));
        block.push_row(vec![
            Cell::Text("L1".to_string()),
            Cell::Empty,
            Cell::Text("OK".to_string()),
        ]);
        block.push_row(vec![Cell::Empty, Cell::Text(" ".to_string()), Cell::Empty]);
        block.push_row(vec![Cell::Text("L2".to_string()), Cell::Empty, Cell::Empty]);

        let table = n.table(&block);
        assert_eq!(table.columns, strings(&["loja", "status"]));
        assert_eq!(
            table.rows,
            vec![strings(&["L1", "OK"]), strings(&["L2", ""])]
        );
    }

    #[test]
    fn test_empty_block_is_empty_table() {
        assert_eq!(normalizer().table(&Block::default()), Table::empty());
    }

    #[test]
    fn test_fold_key() {
        assert_eq!(fold_key(" Gráfico-Pendência "), "grafico-pendencia");
    }
}
