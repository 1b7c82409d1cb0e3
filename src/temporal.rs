//! Datetime-like string column detection
//!
//! `Config.datetime_parse_threshold` names a knob for this refinement step.
//! The original prototype (`inference.py::infer_datetime_columns_pl`) uses
//! it to sample a string column and check what fraction of the sample
//! parses as a datetime. This crate carries that forward: string columns
//! that clear the threshold are treated as datetime-like in the one place
//! column kind is behaviorally relevant — the fuzzy comparator's choice
//! between a Jaro-Winkler similarity and an exact-match score. It does not
//! change equality semantics anywhere else; a detected-as-temporal column
//! is still stored and joined as a string.

use crate::model::Table;
use polars::prelude::*;
use std::collections::HashSet;

const SAMPLE_SIZE: usize = 1000;

/// A handful of common formats for values that didn't round-trip through an
/// ISO-8601-flavored parse. Mirrors the original's `strict=False` Polars
/// datetime inference, which tries several layouts before giving up.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"];
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

/// Return the set of string-typed column names in `table` whose sampled
/// parse success rate clears `threshold`.
pub fn detect_temporal_string_columns(table: &Table, threshold: f64) -> HashSet<String> {
    let df = table.inner();
    let mut result = HashSet::new();

    for series in df.get_columns() {
        if series.dtype() != &DataType::String {
            continue;
        }
        let Ok(chunked) = series.str() else { continue };

        let mut sampled = 0usize;
        let mut parsed = 0usize;
        for value in chunked.into_iter().flatten().take(SAMPLE_SIZE) {
            sampled += 1;
            if looks_like_datetime(value) {
                parsed += 1;
            }
        }

        if sampled > 0 && (parsed as f64 / sampled as f64) >= threshold {
            result.insert(series.name().to_string());
        }
    }

    result
}

fn looks_like_datetime(value: &str) -> bool {
    if chrono::DateTime::parse_from_rfc3339(value).is_ok() {
        return true;
    }
    if NAIVE_DATETIME_FORMATS
        .iter()
        .any(|fmt| chrono::NaiveDateTime::parse_from_str(value, fmt).is_ok())
    {
        return true;
    }
    NAIVE_DATE_FORMATS
        .iter()
        .any(|fmt| chrono::NaiveDate::parse_from_str(value, fmt).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_a_clean_date_column() {
        let table = Table::new(
            df!("created_at" => ["2024-01-01", "2024-02-15", "2024-03-30"]).unwrap(),
        );
        let detected = detect_temporal_string_columns(&table, 0.9);
        assert!(detected.contains("created_at"));
    }

    #[test]
    fn leaves_non_date_string_columns_alone() {
        let table = Table::new(df!("name" => ["Apple", "Banana", "Cherry"]).unwrap());
        let detected = detect_temporal_string_columns(&table, 0.9);
        assert!(!detected.contains("name"));
    }

    #[test]
    fn a_mostly_but_not_entirely_parseable_column_respects_the_threshold() {
        let table = Table::new(
            df!("mixed" => ["2024-01-01", "2024-02-15", "not-a-date"]).unwrap(),
        );
        assert!(detect_temporal_string_columns(&table, 0.6).contains("mixed"));
        assert!(!detect_temporal_string_columns(&table, 0.9).contains("mixed"));
    }
}
