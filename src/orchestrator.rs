//! Pipeline orchestrator
//!
//! Wires every stage into the single state machine a pair of table files
//! goes through: load, diff schema, infer a key, take the checksum fast
//! path if possible, otherwise fall through to the precise or fuzzy
//! comparator, and derive the final status string. No stage past table load
//! is fallible — a read error is the only thing that can end the run early.

use crate::checksum::compute_checksum;
use crate::fuzzy_diff::compare_fuzzy;
use crate::key_inference::infer_sort_keys;
use crate::model::{ComparisonData, ComparisonResult, Config, Rules, SchemaDiff, Status, Table};
use crate::precise_diff::compare_precise;
use crate::schema_diff::diff_schemas;
use crate::summary::{summarize, Summary};
use crate::table_io::load_table;
use crate::temporal::detect_temporal_string_columns;
use polars::prelude::*;
use std::path::Path;

/// Everything produced by comparing one pair of files: the verdict, the
/// structural diff that fed into it, and (when the pipeline got far enough
/// to produce one) the row-level diff and its summary.
pub struct PairOutcome {
    pub result: ComparisonResult,
    pub schema_diff: SchemaDiff,
    pub data: Option<ComparisonData>,
    pub summary: Option<Summary>,
}

pub fn run_comparison(
    before_path: &Path,
    after_path: &Path,
    config: &Config,
    rules: &Rules,
    skip_checksum: bool,
) -> PairOutcome {
    let before = match load_table(before_path) {
        Ok(table) => table,
        Err(err) => {
            return PairOutcome {
                result: ComparisonResult::with_details(Status::ReadError, err.to_string()),
                schema_diff: SchemaDiff::default(),
                data: None,
                summary: None,
            }
        }
    };

    let after = match load_table(after_path) {
        Ok(table) => table,
        Err(err) => {
            return PairOutcome {
                result: ComparisonResult::with_details(Status::ReadError, err.to_string()),
                schema_diff: SchemaDiff::default(),
                data: None,
                summary: None,
            }
        }
    };

    let schema_diff = diff_schemas(&before, &after);

    let before = drop_columns(&before, &rules.ignore_columns);
    let after = drop_columns(&after, &rules.ignore_columns);

    let common_columns = common_columns(&before, &after);
    let before_common = project(&before, &common_columns);
    let after_common = project(&after, &common_columns);

    let sort_keys = infer_sort_keys(&before_common, config.key_uniqueness_threshold);
    let usable_keys: Vec<String> = sort_keys
        .into_iter()
        .filter(|k| after_common.column_names().contains(k))
        .collect();

    if !usable_keys.is_empty() {
        return run_precise_path(&before_common, &after_common, &usable_keys, rules, schema_diff, skip_checksum);
    }

    let temporal_columns = detect_temporal_string_columns(&before_common, config.datetime_parse_threshold);
    let data = compare_fuzzy(
        &before_common,
        &after_common,
        config.fuzzy_match_threshold,
        &temporal_columns,
    );
    let summary = summarize(&data);
    let status = if !schema_diff.identical() {
        // A schema difference is always a real difference, even when the
        // fuzzy linkage found nothing to report on the common columns.
        Status::DifferencesFound
    } else if data.identical() {
        Status::FuzzyIdentical
    } else {
        Status::FuzzyDifferencesFound
    };

    PairOutcome {
        result: ComparisonResult::new(status),
        schema_diff,
        data: Some(data),
        summary: Some(summary),
    }
}

fn run_precise_path(
    before: &Table,
    after: &Table,
    keys: &[String],
    rules: &Rules,
    schema_diff: SchemaDiff,
    skip_checksum: bool,
) -> PairOutcome {
    // The checksum fast path only ever runs when the schema is already
    // identical: a schema-drifted pair always falls through to the precise
    // diff, and "schemas differ" alone is enough to decide its final
    // status regardless of what the checksums would have said.
    let checksum_fast_path_enabled = !skip_checksum && schema_diff.identical() && !keys.is_empty();

    let checksum_ran = if checksum_fast_path_enabled {
        let checksum_before = compute_checksum(before, keys);
        let checksum_after = compute_checksum(after, keys);
        if let (Some(before_sum), Some(after_sum)) = (&checksum_before, &checksum_after) {
            if before_sum == after_sum {
                return PairOutcome {
                    result: ComparisonResult::new(Status::IdenticalChecksumMatch),
                    schema_diff,
                    data: None,
                    summary: None,
                };
            }
        }
        true
    } else {
        false
    };

    let data = match compare_precise(
        before,
        after,
        keys,
        rules.float_tolerance,
        &schema_diff.coerced_columns(),
    ) {
        Ok(data) => data,
        Err(err) => {
            return PairOutcome {
                result: ComparisonResult::with_details(Status::ReadError, err.to_string()),
                schema_diff,
                data: None,
                summary: None,
            }
        }
    };

    let summary = summarize(&data);
    let status = if !schema_diff.identical() {
        Status::DifferencesFound
    } else if data.identical() {
        if checksum_ran {
            // The row-level (tolerant) comparison found nothing, but the
            // checksums differed: some cell moved by less than the
            // tolerance, which the checksum (exact by construction) isn't
            // allowed to forgive.
            Status::IdenticalToleranceMatch
        } else {
            // The checksum stage never ran (skipped), so the precise diff
            // alone is the verdict.
            Status::Identical
        }
    } else {
        Status::DifferencesFound
    };

    PairOutcome {
        result: ComparisonResult::new(status),
        schema_diff,
        data: Some(data),
        summary: Some(summary),
    }
}

fn drop_columns(table: &Table, ignore: &std::collections::HashSet<String>) -> Table {
    if ignore.is_empty() {
        return table.clone();
    }
    let keep: Vec<String> = table
        .column_names()
        .into_iter()
        .filter(|c| !ignore.contains(c))
        .collect();
    project(table, &keep)
}

fn common_columns(before: &Table, after: &Table) -> Vec<String> {
    let after_columns: std::collections::HashSet<String> = after.column_names().into_iter().collect();
    before
        .column_names()
        .into_iter()
        .filter(|c| after_columns.contains(c))
        .collect()
}

fn project(table: &Table, columns: &[String]) -> Table {
    match table.inner().select(columns) {
        Ok(df) => Table::new(df),
        Err(_) => Table::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn identical_files_yield_checksum_match() {
        let before = write_csv("id,val\n1,a\n2,b\n");
        let after = write_csv("id,val\n1,a\n2,b\n");
        let outcome = run_comparison(before.path(), after.path(), &Config::default(), &Rules::default(), false);
        assert_eq!(outcome.result.status_str, "IDENTICAL (CHECKSUM_MATCH)");
    }

    #[test]
    fn reordered_rows_still_checksum_match() {
        let before = write_csv("id,val\n1,a\n2,b\n");
        let after = write_csv("id,val\n2,b\n1,a\n");
        let outcome = run_comparison(before.path(), after.path(), &Config::default(), &Rules::default(), false);
        assert_eq!(outcome.result.status_str, "IDENTICAL (CHECKSUM_MATCH)");
    }

    #[test]
    fn a_changed_value_is_reported_as_differences_found() {
        let before = write_csv("id,val\n1,a\n2,b\n");
        let after = write_csv("id,val\n1,a\n2,Z\n");
        let outcome = run_comparison(before.path(), after.path(), &Config::default(), &Rules::default(), false);
        assert_eq!(outcome.result.status_str, "DIFFERENCES_FOUND");
        assert_eq!(outcome.summary.unwrap().rows_modified, 1);
    }

    #[test]
    fn unreadable_file_yields_read_error() {
        let before = write_csv("id,val\n1,a\n");
        let outcome = run_comparison(
            before.path(),
            Path::new("/nonexistent/path/does_not_exist.csv"),
            &Config::default(),
            &Rules::default(),
            false,
        );
        assert_eq!(outcome.result.status_str, "READ_ERROR");
    }

    #[test]
    fn identical_files_with_checksum_skipped_yield_plain_identical() {
        let before = write_csv("id,val\n1,a\n2,b\n");
        let after = write_csv("id,val\n1,a\n2,b\n");
        let outcome = run_comparison(before.path(), after.path(), &Config::default(), &Rules::default(), true);
        assert_eq!(outcome.result.status_str, "IDENTICAL");
    }

    #[test]
    fn schema_drift_is_differences_found_even_when_rows_match() {
        let before = write_csv("id,val\n1,a\n2,b\n");
        let after = write_csv("id,val,extra\n1,a,x\n2,b,y\n");
        let outcome = run_comparison(before.path(), after.path(), &Config::default(), &Rules::default(), false);
        assert_eq!(outcome.result.status_str, "DIFFERENCES_FOUND");
    }
}
