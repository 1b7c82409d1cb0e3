//! Key inferrer
//!
//! Chooses at most one sort key from a table by column-uniqueness
//! statistics, preferring non-numeric perfect keys (guards against an
//! ID-like integer column being overridden by an incidentally-unique float
//! column, and keeps keys printable in reports).

use crate::model::{ColumnKind, Table};

/// Infer a sort key from `table`, in priority order:
///
/// 1. The first non-numeric column that is perfectly unique
///    (`n_unique == n_rows`).
/// 2. Else the first column (numeric or not) that is perfectly unique.
/// 3. Else the first column whose uniqueness ratio `n_unique / n_rows`
///    clears `threshold`.
/// 4. Else no key.
///
/// Empty tables always yield no key.
pub fn infer_sort_keys(table: &Table, threshold: f64) -> Vec<String> {
    let height = table.height();
    if height == 0 {
        return Vec::new();
    }

    let df = table.inner();
    let mut uniqueness: Vec<(String, ColumnKind, usize)> = Vec::new();
    for series in df.get_columns() {
        let kind = ColumnKind::from_polars(series.dtype());
        let n_unique = series.n_unique().unwrap_or(0);
        uniqueness.push((series.name().to_string(), kind, n_unique));
    }

    let is_numeric = |kind: ColumnKind| matches!(kind, ColumnKind::Integer | ColumnKind::Floating);

    // 1. First non-numeric perfect key.
    if let Some((name, ..)) = uniqueness
        .iter()
        .find(|(_, kind, n_unique)| *n_unique == height && !is_numeric(*kind))
    {
        return vec![name.clone()];
    }

    // 2. First perfect key of any kind.
    if let Some((name, ..)) = uniqueness.iter().find(|(_, _, n_unique)| *n_unique == height) {
        return vec![name.clone()];
    }

    // 3. First column clearing the uniqueness threshold.
    if let Some((name, ..)) = uniqueness
        .iter()
        .find(|(_, _, n_unique)| (*n_unique as f64 / height as f64) >= threshold)
    {
        return vec![name.clone()];
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn empty_table_has_no_key() {
        let df = df!("id" => Vec::<i64>::new()).unwrap();
        assert!(infer_sort_keys(&Table::new(df), 0.99).is_empty());
    }

    #[test]
    fn prefers_non_numeric_perfect_key_over_numeric() {
        // `id` is a perfectly unique integer, but `sku` (non-numeric) is
        // also perfectly unique and should win.
        let df = df!(
            "sku" => ["A1", "A2", "A3"],
            "id" => [1i64, 2, 3]
        )
        .unwrap();
        assert_eq!(infer_sort_keys(&Table::new(df), 0.99), vec!["sku".to_string()]);
    }

    #[test]
    fn falls_back_to_numeric_perfect_key() {
        let df = df!(
            "id" => [1i64, 2, 3],
            "status" => ["ok", "ok", "ok"]
        )
        .unwrap();
        assert_eq!(infer_sort_keys(&Table::new(df), 0.99), vec!["id".to_string()]);
    }

    #[test]
    fn falls_back_to_threshold_ratio() {
        // 9/10 unique clears a 0.8 threshold but not a 0.99 one.
        let mut values: Vec<i64> = (0..9).collect();
        values.push(0);
        let df = df!("almost_unique" => values).unwrap();
        assert_eq!(
            infer_sort_keys(&Table::new(df.clone()), 0.8),
            vec!["almost_unique".to_string()]
        );
        assert!(infer_sort_keys(&Table::new(df), 0.99).is_empty());
    }

    #[test]
    fn no_key_when_nothing_qualifies() {
        let df = df!("status" => ["a", "a", "b", "b"]).unwrap();
        assert!(infer_sort_keys(&Table::new(df), 0.99).is_empty());
    }
}
