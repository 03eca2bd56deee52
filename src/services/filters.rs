//! Record filtering over a normalized table

use crate::types::Table;
use std::collections::{BTreeMap, BTreeSet};

/// Query parameters, sorted so equal queries produce equal cache keys
pub type FilterParams = BTreeMap<String, String>;

/// Paging and search keys that never name a column
pub const RESERVED_KEYS: [&str; 6] = ["page", "limit", "per_page", "offset", "_", "q"];

/// Separator for several accepted values of one column
pub const MULTI_VALUE_SEPARATOR: char = '|';

pub const DEFAULT_OPTION_LIMIT: usize = 50;

/// Keep the records matching every filter in `params`
///
/// `q` matches case-insensitively anywhere in a record. Other keys that
/// name a column match that column case-insensitively, either exactly or,
/// when the value contains `|`, against any of the listed alternatives.
pub fn apply_filters(table: &Table, params: &FilterParams) -> Table {
    let mut out = table.clone();

    if let Some(q) = params.get("q").map(|q| q.trim().to_lowercase()) {
        if !q.is_empty() {
            out.retain_rows(|_, row| row.iter().any(|v| v.to_lowercase().contains(&q)));
        }
    }

    for (key, value) in params {
        if RESERVED_KEYS.contains(&key.as_str()) || value.trim().is_empty() {
            continue;
        }
        let Some(idx) = out.column_index(key) else {
            continue;
        };

        if value.contains(MULTI_VALUE_SEPARATOR) {
            let wanted: BTreeSet<String> = value
                .split(MULTI_VALUE_SEPARATOR)
                .map(|v| v.trim().to_lowercase())
                .collect();
            out.retain_rows(|_, row| {
                row.get(idx)
                    .is_some_and(|v| wanted.contains(&v.to_lowercase()))
            });
        } else {
            let wanted = value.to_lowercase();
            out.retain_rows(|_, row| row.get(idx).is_some_and(|v| v.to_lowercase() == wanted));
        }
    }
    out
}

/// Sorted distinct non-empty values per column, skipping columns with more than `limit`
pub fn filter_options(table: &Table, limit: usize) -> BTreeMap<String, Vec<String>> {
    table
        .columns
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            let distinct: BTreeSet<&str> = table
                .rows
                .iter()
                .filter_map(|row| row.get(idx))
                .map(String::as_str)
                .filter(|v| !v.is_empty())
                .collect();
            (distinct.len() <= limit)
                .then(|| (name.clone(), distinct.into_iter().map(str::to_string).collect()))
        })
        .collect()
}

/// Stable textual form of the query, used in cache keys
pub fn params_key(params: &FilterParams) -> String {
    params
        .iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}
