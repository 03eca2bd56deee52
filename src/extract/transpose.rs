//! Transposer and chart projection

use crate::error::{DashError, DashResult};
use crate::extract::normalize::dedupe;
use crate::types::{ChartSeries, SeriesValue, Table};

/// Pivot `table` around `pivot_column`
///
/// The pivot column's values become the new header (after the pivot name
/// itself), and every other column becomes one record whose first value is
/// the old column name. Column order becomes row order and row order becomes
/// column order, so transposing twice around the same name restores the
/// original cells.
pub fn transpose(table: &Table, pivot_column: &str) -> DashResult<Table> {
    if table.is_empty() {
        return Ok(Table::empty());
    }
    let pivot = table.column_index(pivot_column).ok_or_else(|| {
        DashError::MalformedBlock(format!(
            "pivot column '{}' not in {:?}",
            pivot_column, table.columns
        ))
    })?;

    let mut header = vec![table.columns[pivot].clone()];
    header.extend(
        table
            .rows
            .iter()
            .map(|row| row.get(pivot).cloned().unwrap_or_default()),
    );
    let columns = dedupe(header);

    let rows = table
        .columns
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != pivot)
        .map(|(idx, name)| {
            let mut record = vec![name.clone()];
            record.extend(
                table
                    .rows
                    .iter()
                    .map(|row| row.get(idx).cloned().unwrap_or_default()),
            );
            record
        })
        .collect();

    Ok(Table::new(columns, rows))
}

/// Chart view of a table: first column as labels, every other column as a series
///
/// Blank values chart as 0 and numeric strings as numbers; other text is kept.
pub fn to_chart_series(table: &Table) -> ChartSeries {
    let Some(label_column) = table.columns.first() else {
        return ChartSeries::empty();
    };
    let labels = table
        .column_values(label_column)
        .unwrap_or_default()
        .into_iter()
        .map(str::to_string)
        .collect();

    // Series names must be unique keys even for hand-built tables
    let names = dedupe(table.columns.iter().skip(1).cloned().collect());
    let series = names
        .into_iter()
        .enumerate()
        .map(|(offset, name)| {
            let idx = offset + 1;
            let values = table
                .rows
                .iter()
                .map(|row| chart_value(row.get(idx).map_or("", String::as_str)))
                .collect();
            (name, values)
        })
        .collect();

    ChartSeries { labels, series }
}

fn chart_value(raw: &str) -> SeriesValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return SeriesValue::Number(0.0);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => SeriesValue::Number(n),
        _ => SeriesValue::Text(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn annual() -> Table {
        Table::new(
            strings(&["mes", "2023", "2024"]),
            vec![
                strings(&["Jan", "1", "2"]),
                strings(&["Fev", "3", "4"]),
                strings(&["Mar", "5", ""]),
            ],
        )
    }

    #[test]
    fn test_transpose_moves_headers_to_rows() {
        let t = transpose(&annual(), "mes").unwrap();
        assert_eq!(t.columns, strings(&["mes", "Jan", "Fev", "Mar"]));
        assert_eq!(
            t.rows,
            vec![strings(&["2023", "1", "3", "5"]), strings(&["2024", "2", "4", ""])]
        );
    }

    #[test]
    fn test_transpose_twice_restores_table() {
        let original = annual();
        let back = transpose(&transpose(&original, "mes").unwrap(), "mes").unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_transpose_missing_pivot_is_malformed() {
        let err = transpose(&annual(), "regional").unwrap_err();
        assert!(matches!(err, DashError::MalformedBlock(_)));
    }

    #[test]
    fn test_transpose_empty_table() {
        assert_eq!(transpose(&Table::empty(), "mes").unwrap(), Table::empty());
    }

    #[test]
    fn test_transpose_dedupes_repeated_pivot_values() {
        let table = Table::new(
            strings(&["regional", "pia"]),
            vec![strings(&["Sul", "1"]), strings(&["Sul", "2"])],
        );
        let t = transpose(&table, "regional").unwrap();
        assert_eq!(t.columns, strings(&["regional", "Sul", "Sul_2"]));
    }

    #[test]
    fn test_chart_series_projection() {
        let chart = to_chart_series(&annual());
        assert_eq!(chart.labels, strings(&["Jan", "Fev", "Mar"]));
        assert_eq!(chart.series.len(), 2);
        assert_eq!(
            chart.values("2024").unwrap(),
            &[
                SeriesValue::Number(2.0),
                SeriesValue::Number(4.0),
                SeriesValue::Number(0.0)
            ]
        );
    }

    #[test]
    fn test_chart_keeps_text_values() {
        let table = Table::new(
            strings(&["regional", "status"]),
            vec![strings(&["Sul", "pendente"])],
        );
        let chart = to_chart_series(&table);
        assert_eq!(
            chart.values("status").unwrap(),
            &[SeriesValue::Text("pendente".to_string())]
        );
    }

    #[test]
    fn test_chart_series_names_are_unique() {
        let table = Table::new(
            strings(&["mes", "total", "total", "total_2"]),
            vec![strings(&["Jan", "1", "2", "3"])],
        );
        let chart = to_chart_series(&table);
        let names: Vec<&str> = chart.series.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["total", "total_2", "total_2_2"]);
        assert_eq!(chart.values("total_2").unwrap(), &[SeriesValue::Number(2.0)]);
    }

    #[test]
    fn test_chart_of_empty_table() {
        assert!(to_chart_series(&Table::empty()).is_empty());
    }
}
