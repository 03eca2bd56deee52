//! Checklist KPI summary

use crate::types::Table;
use serde::Serialize;

pub const CHECKLIST_COLUMN: &str = "checklist";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub total: usize,
    pub ok: usize,
    pub micro_na: usize,
}

/// Count records by checklist outcome (`ok`, `micro`, `na`, case-insensitive)
pub fn calculate_kpis(table: &Table) -> Kpis {
    let mut kpis = Kpis {
        total: table.len(),
        ..Kpis::default()
    };
    let Some(values) = table.column_values(CHECKLIST_COLUMN) else {
        return kpis;
    };

    for value in values {
        match value.trim().to_lowercase().as_str() {
            "ok" => kpis.ok += 1,
            "micro" | "na" => kpis.micro_na += 1,
            _ => {}
        }
    }
    kpis
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            columns.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_counts_checklist_outcomes() {
        let t = table(
            &["loja", "checklist"],
            &[&["L1", "OK"], &["L2", "micro"], &["L3", "NA"], &["L4", " ok "], &["L5", "pendente"]],
        );
        assert_eq!(
            calculate_kpis(&t),
            Kpis {
                total: 5,
                ok: 2,
                micro_na: 2
            }
        );
    }

    #[test]
    fn test_without_checklist_column() {
        let t = table(&["loja"], &[&["L1"], &["L2"]]);
        assert_eq!(
            calculate_kpis(&t),
            Kpis {
                total: 2,
                ok: 0,
                micro_na: 0
            }
        );
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(calculate_kpis(&Table::empty()), Kpis::default());
    }
}
