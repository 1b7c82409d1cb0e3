//! Fuzzy comparator
//!
//! Used when no sort key could be inferred for a pair: rather than refuse to
//! compare, link each "before" row to its best-scoring "after" row by
//! weighted column similarity, accept the link only above a threshold, and
//! report the rest as added/deleted. Linking is strictly one-to-one — once a
//! row on either side is claimed by a stronger match, it is never
//! re-offered to a weaker one, which is a tighter guarantee than a plain
//! "best match per before-row" pass can give.

use crate::model::{ColumnKind, ComparisonData, ModifiedCell, Table};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};

/// Blocking-column cardinality ratio window outside of which a string
/// column is not considered a good blocking key: too low and nearly every
/// row shares a block (no better than a cross join); too high and almost no
/// rows land in the same block (no better than an exact key, which would
/// have been inferred already).
const BLOCKING_RATIO_LOW: f64 = 0.1;
const BLOCKING_RATIO_HIGH: f64 = 0.95;
const BLOCKING_RATIO_FALLBACK: f64 = 0.99;

pub fn compare_fuzzy(
    before: &Table,
    after: &Table,
    threshold: f64,
    temporal_columns: &HashSet<String>,
) -> ComparisonData {
    let columns = before.column_names();
    let before_df = before.inner();
    let after_df = after.inner();

    if before_df.height() == 0 && after_df.height() == 0 {
        return ComparisonData::default();
    }

    let weights = column_weights(before_df, &columns);
    let blocking_column = find_blocking_column(before_df, &columns);

    let candidates = match &blocking_column {
        Some(col) => {
            log::debug!("fuzzy comparator blocking on column {col}");
            blocked_candidates(before_df, after_df, col)
        }
        None => {
            log::warn!(
                "fuzzy comparator found no usable blocking column; falling back to a full cross join of {} x {} rows",
                before_df.height(),
                after_df.height()
            );
            cross_candidates(before_df.height(), after_df.height())
        }
    };

    let mut scored: Vec<(usize, usize, f64)> = candidates
        .into_iter()
        .map(|(b, a)| {
            let score = score_pair(before_df, after_df, &columns, &weights, temporal_columns, b, a);
            (b, a, score)
        })
        .collect();
    scored.sort_by(|x, y| y.2.partial_cmp(&x.2).unwrap_or(std::cmp::Ordering::Equal));

    let mut claimed_before = vec![false; before_df.height()];
    let mut claimed_after = vec![false; after_df.height()];
    let mut strong_matches: Vec<(usize, usize, f64)> = Vec::new();

    for (b, a, score) in scored {
        if claimed_before[b] || claimed_after[a] {
            continue;
        }
        claimed_before[b] = true;
        claimed_after[a] = true;
        if score >= threshold {
            strong_matches.push((b, a, score));
        }
    }

    // Weak (below-threshold) matches and never-offered rows are both
    // unlinked: the before row counts as deleted, the after row as added.
    let deleted_rows: Vec<usize> = (0..before_df.height())
        .filter(|&b| !claimed_before[b] || !strong_matches.iter().any(|(mb, _, _)| *mb == b))
        .collect();
    let added_rows: Vec<usize> = (0..after_df.height())
        .filter(|&a| !claimed_after[a] || !strong_matches.iter().any(|(_, ma, _)| *ma == a))
        .collect();

    let modified = strong_matches
        .iter()
        .filter(|(_, _, score)| *score < 1.0)
        .flat_map(|(b, a, score)| {
            differing_cells(before_df, after_df, &columns, temporal_columns, *b, *a, *score)
        })
        .collect();

    ComparisonData {
        added: Table::new(take_rows(after_df, &added_rows)),
        deleted: Table::new(take_rows(before_df, &deleted_rows)),
        modified,
    }
}

fn column_weights(before: &DataFrame, columns: &[String]) -> HashMap<String, f64> {
    let height = before.height().max(1) as f64;
    columns
        .iter()
        .map(|name| {
            let n_unique = before
                .column(name)
                .and_then(|s| s.n_unique())
                .unwrap_or(0) as f64;
            (name.clone(), 1.0 + n_unique / height)
        })
        .collect()
}

fn find_blocking_column(before: &DataFrame, columns: &[String]) -> Option<String> {
    let height = before.height().max(1) as f64;
    let string_columns: Vec<(&String, f64)> = columns
        .iter()
        .filter_map(|name| {
            let series = before.column(name).ok()?;
            if ColumnKind::from_polars(series.dtype()) != ColumnKind::String {
                return None;
            }
            let ratio = series.n_unique().unwrap_or(0) as f64 / height;
            Some((name, ratio))
        })
        .collect();

    let in_window: Vec<&(&String, f64)> = string_columns
        .iter()
        .filter(|(_, ratio)| *ratio > BLOCKING_RATIO_LOW && *ratio < BLOCKING_RATIO_HIGH)
        .collect();

    let best = if !in_window.is_empty() {
        max_by_ratio(in_window.into_iter())
    } else {
        max_by_ratio(string_columns.iter().filter(|(_, ratio)| *ratio < BLOCKING_RATIO_FALLBACK))
    };

    best.map(|(name, _)| (*name).clone())
}

/// Picks the highest-ratio column, schema order breaking ties (the first
/// one seen at the max ratio wins, mirroring Rust's `max_by` stability).
fn max_by_ratio<'a, I>(iter: I) -> Option<&'a (&'a String, f64)>
where
    I: Iterator<Item = &'a (&'a String, f64)>,
{
    iter.fold(None, |best, current| match best {
        Some((_, best_ratio)) if best_ratio >= current.1 => best,
        _ => Some(current),
    })
}

fn blocked_candidates(before: &DataFrame, after: &DataFrame, column: &str) -> Vec<(usize, usize)> {
    let mut before_groups: HashMap<String, Vec<usize>> = HashMap::new();
    if let Ok(series) = before.column(column).and_then(|s| s.str().map(|c| c.clone())) {
        for (idx, value) in series.into_iter().enumerate() {
            before_groups
                .entry(value.unwrap_or("").to_string())
                .or_default()
                .push(idx);
        }
    }

    let mut after_groups: HashMap<String, Vec<usize>> = HashMap::new();
    if let Ok(series) = after.column(column).and_then(|s| s.str().map(|c| c.clone())) {
        for (idx, value) in series.into_iter().enumerate() {
            after_groups
                .entry(value.unwrap_or("").to_string())
                .or_default()
                .push(idx);
        }
    }

    let mut candidates = Vec::new();
    for (key, before_idxs) in &before_groups {
        if let Some(after_idxs) = after_groups.get(key) {
            for &b in before_idxs {
                for &a in after_idxs {
                    candidates.push((b, a));
                }
            }
        }
    }
    candidates
}

fn cross_candidates(before_height: usize, after_height: usize) -> Vec<(usize, usize)> {
    let mut candidates = Vec::with_capacity(before_height * after_height);
    for b in 0..before_height {
        for a in 0..after_height {
            candidates.push((b, a));
        }
    }
    candidates
}

fn score_pair(
    before: &DataFrame,
    after: &DataFrame,
    columns: &[String],
    weights: &HashMap<String, f64>,
    temporal_columns: &HashSet<String>,
    before_idx: usize,
    after_idx: usize,
) -> f64 {
    let mut total_weight = 0.0;
    let mut weighted_score = 0.0;

    for name in columns {
        let weight = *weights.get(name).unwrap_or(&1.0);
        let before_value = before.column(name).and_then(|s| s.get(before_idx)).ok();
        let after_value = after.column(name).and_then(|s| s.get(after_idx)).ok();
        let treat_as_string = !temporal_columns.contains(name);

        let cell_score = match (before_value, after_value) {
            (Some(AnyValue::Null), Some(AnyValue::Null)) => 1.0,
            (Some(AnyValue::Null), _) | (_, Some(AnyValue::Null)) | (None, _) | (_, None) => 0.0,
            (Some(b), Some(a)) => cell_similarity(&b, &a, treat_as_string),
        };

        total_weight += weight;
        weighted_score += weight * cell_score;
    }

    if total_weight == 0.0 {
        0.0
    } else {
        weighted_score / total_weight
    }
}

/// Similarity for a single pair of non-null cells. String-typed columns use
/// Jaro-Winkler unless `treat_as_string` is false, which is how a column
/// detected as datetime-like (see the `temporal` module) opts back into the
/// plain equality score used for every other non-string type.
fn cell_similarity(before: &AnyValue, after: &AnyValue, treat_as_string: bool) -> f64 {
    match (before, after) {
        (AnyValue::String(b), AnyValue::String(a)) if treat_as_string => strsim::jaro_winkler(b, a),
        _ => {
            if before.to_string() == after.to_string() {
                1.0
            } else {
                0.0
            }
        }
    }
}

/// Emit one long-form record per column where a matched pair's values
/// differ, using the same equality rule the scorer used (both null ->
/// equal; one null -> different; otherwise exact match for non-string
/// columns and `cell_similarity == 1.0` for string columns).
fn differing_cells(
    before: &DataFrame,
    after: &DataFrame,
    columns: &[String],
    temporal_columns: &HashSet<String>,
    before_idx: usize,
    after_idx: usize,
    score: f64,
) -> Vec<ModifiedCell> {
    let key = format!("Fuzzy Match (Score: {score:.3})");
    columns
        .iter()
        .filter_map(|name| {
            let before_value = before.column(name).ok()?.get(before_idx).ok()?;
            let after_value = after.column(name).ok()?.get(after_idx).ok()?;
            let treat_as_string = !temporal_columns.contains(name);

            let equal = match (&before_value, &after_value) {
                (AnyValue::Null, AnyValue::Null) => true,
                (AnyValue::Null, _) | (_, AnyValue::Null) => false,
                (b, a) => cell_similarity(b, a, treat_as_string) >= 1.0,
            };

            if equal {
                None
            } else {
                Some(ModifiedCell {
                    key: key.clone(),
                    column: name.clone(),
                    value_before: before_value.to_string(),
                    value_after: after_value.to_string(),
                })
            }
        })
        .collect()
}

fn take_rows(df: &DataFrame, indices: &[usize]) -> DataFrame {
    let idx_ca: IdxCa = indices.iter().map(|&i| i as IdxSize).collect();
    df.take(&idx_ca).unwrap_or_else(|_| df.clear())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tables_are_identical() {
        let before = Table::new(df!("name" => Vec::<String>::new()).unwrap());
        let after = Table::new(df!("name" => Vec::<String>::new()).unwrap());
        let result = compare_fuzzy(&before, &after, 0.8, &HashSet::new());
        assert!(result.identical());
    }

    #[test]
    fn exact_duplicate_rows_link_with_no_modifications() {
        let before = Table::new(df!("name" => ["Alice", "Bob"], "age" => [30i64, 40]).unwrap());
        let after = Table::new(df!("name" => ["Alice", "Bob"], "age" => [30i64, 40]).unwrap());
        let result = compare_fuzzy(&before, &after, 0.8, &HashSet::new());
        assert!(result.identical());
    }

    #[test]
    fn a_renamed_field_still_links_above_threshold() {
        let before = Table::new(df!("name" => ["Alice Johnson"], "age" => [30i64]).unwrap());
        let after = Table::new(df!("name" => ["Alice Johnsen"], "age" => [30i64]).unwrap());
        let result = compare_fuzzy(&before, &after, 0.8, &HashSet::new());
        assert_eq!(result.added.height(), 0);
        assert_eq!(result.deleted.height(), 0);
        assert_eq!(result.modified.len(), 1);
        assert!(result.modified[0].key.starts_with("Fuzzy Match"));
        assert_eq!(result.modified[0].column, "name");
        assert_eq!(result.modified[0].value_before, "Alice Johnson");
        assert_eq!(result.modified[0].value_after, "Alice Johnsen");
    }

    #[test]
    fn an_unrelated_row_is_added_and_deleted_rather_than_linked() {
        let before = Table::new(df!("name" => ["Alice Johnson"], "age" => [30i64]).unwrap());
        let after = Table::new(df!("name" => ["Zzyzx Corp"], "age" => [99i64]).unwrap());
        let result = compare_fuzzy(&before, &after, 0.8, &HashSet::new());
        assert_eq!(result.added.height(), 1);
        assert_eq!(result.deleted.height(), 1);
        assert!(result.modified.is_empty());
    }

    #[test]
    fn matching_is_disjoint_even_when_one_row_is_the_best_match_for_two() {
        // Both "before" rows are textually closest to the single "after" row,
        // but only one of them may claim it; the other must fall back to its
        // next-best (here: none, so it is deleted).
        let before = Table::new(df!("name" => ["Alice Johnson", "Alice Johnsan"]).unwrap());
        let after = Table::new(df!("name" => ["Alice Johnson"]).unwrap());
        let result = compare_fuzzy(&before, &after, 0.8, &HashSet::new());
        assert_eq!(result.added.height(), 0);
        assert_eq!(result.deleted.height(), 1);
        assert_eq!(result.modified.len(), 1);
    }

    #[test]
    fn evil_twin_near_duplicates_link_to_their_correct_counterpart() {
        // "3-Port USB Hub" and its typo-ed near-duplicate "3-Port USB Hubb"
        // must each link to their own counterpart, not cross-link, because
        // `product_name` carries far more weight than the low-cardinality
        // `status` column.
        let before = Table::new(
            df!(
                "customer_id" => ["CUST-ABC", "CUST-ABC", "CUST-XYZ"],
                "product_name" => ["3-Port USB Hub", "3-Port USB Hubb", "Wireless Mouse"],
                "status" => ["SHIPPED", "SHIPPED", "DELIVERED"]
            )
            .unwrap(),
        );
        let after = Table::new(
            df!(
                "customer_id" => ["CUST-XYZ", "CUST-ABC", "CUST-ABC"],
                "product_name" => ["Wireless Mouse", "3-Port USB Hubb", "3-Port USB Hub"],
                "status" => ["DELIVERED", "RETURNED", "SHIPPED"]
            )
            .unwrap(),
        );
        let result = compare_fuzzy(&before, &after, 0.8, &HashSet::new());
        assert_eq!(result.added.height(), 0);
        assert_eq!(result.deleted.height(), 0);
        assert_eq!(result.modified.len(), 1);
        assert_eq!(result.modified[0].column, "status");
        assert_eq!(result.modified[0].value_before, "SHIPPED");
        assert_eq!(result.modified[0].value_after, "RETURNED");
        assert!(result.modified[0].key.starts_with("Fuzzy Match (Score: "));
    }
}
