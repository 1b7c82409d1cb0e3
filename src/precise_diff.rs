//! Precise (key-joined) comparator
//!
//! Outer-joins "before" and "after" on the inferred sort key(s) and buckets
//! every row into added, deleted, or (for rows present on both sides)
//! per-cell modifications. Floating-point columns tolerate an absolute
//! difference up to `tolerance`; everything else is compared by string form,
//! so that a type-drifted column (coerced to string upstream by the
//! orchestrator) still compares sensibly.

use crate::model::{ColumnKind, ComparisonData, ModifiedCell, Table};
use polars::prelude::*;
use std::collections::HashSet;

const PRESENT_BEFORE: &str = "__snapdiff_present_before";
const PRESENT_AFTER: &str = "__snapdiff_present_after";
const AFTER_SUFFIX: &str = "__snapdiff_after";

/// Compare `before` and `after`, which must already share the same column
/// set (the orchestrator projects both onto common columns before calling
/// this), joined on `keys`. `coerced_columns` names columns whose string
/// form should be compared rather than their native equality, matching a
/// schema type change the orchestrator decided to paper over.
pub fn compare_precise(
    before: &Table,
    after: &Table,
    keys: &[String],
    tolerance: f64,
    coerced_columns: &HashSet<&str>,
) -> PolarsResult<ComparisonData> {
    let value_columns: Vec<String> = before
        .column_names()
        .into_iter()
        .filter(|c| !keys.contains(c))
        .collect();

    let mut left = before.inner().clone();
    let mut right = after.inner().clone();

    for name in &coerced_columns_present(&value_columns, coerced_columns) {
        left = cast_to_string(left, name)?;
        right = cast_to_string(right, name)?;
    }

    let left = left
        .lazy()
        .with_column(lit(true).alias(PRESENT_BEFORE))
        .collect()?;

    let mut after_exprs: Vec<Expr> = keys.iter().map(|k| col(k.as_str())).collect();
    for name in &value_columns {
        after_exprs.push(col(name.as_str()).alias(format!("{name}{AFTER_SUFFIX}").as_str()));
    }
    let right = right
        .lazy()
        .select(after_exprs)
        .with_column(lit(true).alias(PRESENT_AFTER))
        .collect()?;

    let joined = left.outer_join(&right, keys, keys)?;

    let added_mask = joined.column(PRESENT_BEFORE)?.is_null();
    let deleted_mask = joined.column(PRESENT_AFTER)?.is_null();
    let common_mask = joined.column(PRESENT_BEFORE)?.is_not_null()
        & joined.column(PRESENT_AFTER)?.is_not_null();

    let added = extract_side(&joined, &added_mask, keys, &value_columns, Side::After)?;
    let deleted = extract_side(&joined, &deleted_mask, keys, &value_columns, Side::Before)?;

    let common = joined.filter(&common_mask)?;
    let modified = find_modified_cells(&common, keys, &value_columns, tolerance, coerced_columns)?;

    Ok(ComparisonData {
        added: Table::new(added),
        deleted: Table::new(deleted),
        modified,
    })
}

fn coerced_columns_present(
    value_columns: &[String],
    coerced_columns: &HashSet<&str>,
) -> Vec<String> {
    value_columns
        .iter()
        .filter(|c| coerced_columns.contains(c.as_str()))
        .cloned()
        .collect()
}

fn cast_to_string(df: DataFrame, column: &str) -> PolarsResult<DataFrame> {
    df.lazy()
        .with_column(col(column).cast(DataType::String))
        .collect()
}

enum Side {
    Before,
    After,
}

/// Pull the rows matching `mask` out of the joined frame, returning them
/// with the plain (non-suffixed, non-key-duplicated) column names of
/// whichever side actually has the data.
fn extract_side(
    joined: &DataFrame,
    mask: &ChunkedArray<BooleanType>,
    keys: &[String],
    value_columns: &[String],
    side: Side,
) -> PolarsResult<DataFrame> {
    let rows = joined.filter(mask)?;

    let mut exprs: Vec<Expr> = keys.iter().map(|k| col(k.as_str())).collect();
    for name in value_columns {
        let source_name = match side {
            Side::Before => name.clone(),
            Side::After => format!("{name}{AFTER_SUFFIX}"),
        };
        exprs.push(col(source_name.as_str()).alias(name.as_str()));
    }

    rows.lazy().select(exprs).collect()
}

fn find_modified_cells(
    common: &DataFrame,
    keys: &[String],
    value_columns: &[String],
    tolerance: f64,
    coerced_columns: &HashSet<&str>,
) -> PolarsResult<Vec<ModifiedCell>> {
    let mut modified = Vec::new();

    let floating_columns: HashSet<&str> = value_columns
        .iter()
        .filter(|name| {
            common
                .column(name)
                .map(|c| ColumnKind::from_polars(c.dtype()).is_floating())
                .unwrap_or(false)
        })
        .map(|name| name.as_str())
        .collect();

    for row_idx in 0..common.height() {
        let key_str = format_key(common, keys, row_idx)?;

        for name in value_columns {
            let before_value = common.column(name)?.get(row_idx)?;
            let after_col = format!("{name}{AFTER_SUFFIX}");
            let after_value = common.column(&after_col)?.get(row_idx)?;

            let differs = values_differ(
                &before_value,
                &after_value,
                tolerance,
                coerced_columns.contains(name.as_str()),
                floating_columns.contains(name.as_str()),
            );
            if differs {
                modified.push(ModifiedCell {
                    key: key_str.clone(),
                    column: name.clone(),
                    value_before: display_value(&before_value),
                    value_after: display_value(&after_value),
                });
            }
        }
    }

    Ok(modified)
}

fn format_key(df: &DataFrame, keys: &[String], row_idx: usize) -> PolarsResult<String> {
    let mut parts = Vec::with_capacity(keys.len());
    for key in keys {
        parts.push(display_value(&df.column(key)?.get(row_idx)?));
    }
    Ok(parts.join(", "))
}

fn display_value(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn values_differ(
    before: &AnyValue,
    after: &AnyValue,
    tolerance: f64,
    coerced: bool,
    is_floating_column: bool,
) -> bool {
    if coerced {
        return display_value(before) != display_value(after);
    }

    if is_floating_column {
        if let (Some(a), Some(b)) = (as_f64(before), as_f64(after)) {
            return (a - b).abs() > tolerance;
        }
    }

    display_value(before) != display_value(after)
}

fn as_f64(value: &AnyValue) -> Option<f64> {
    match value {
        AnyValue::Float32(v) => Some(*v as f64),
        AnyValue::Float64(v) => Some(*v),
        _ => None,
    }
}
