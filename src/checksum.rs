//! Content checksum
//!
//! A single digest over the full content of a table, invariant under row
//! order: sort into a canonical order, hash each row, then combine the
//! per-row hashes with a streaming digest. Two tables with the same rows in
//! different orders must produce the same checksum; any other difference
//! (added/removed/modified rows, or the sort itself being ambiguous because
//! no key was inferred) must not.

use crate::model::Table;
use polars::prelude::*;
use xxhash_rust::xxh3::{xxh3_64, Xxh3};

/// Compute a content checksum for `table`, ordered canonically by
/// `sort_keys` with ties broken by the remaining columns in schema order.
///
/// Returns `None` if `sort_keys` is empty, or if any named key column is not
/// present in `table` — a checksum computed without a real key would depend
/// on whatever order the rows happened to arrive in, which defeats the
/// point.
pub fn compute_checksum(table: &Table, sort_keys: &[String]) -> Option<String> {
    if sort_keys.is_empty() {
        return None;
    }

    let df = table.inner();
    let column_names = table.column_names();
    if !sort_keys.iter().all(|k| column_names.contains(k)) {
        return None;
    }

    let mut sort_by: Vec<String> = sort_keys.to_vec();
    for name in &column_names {
        if !sort_by.contains(name) {
            sort_by.push(name.clone());
        }
    }

    let descending = vec![false; sort_by.len()];
    let sorted = df.sort(&sort_by, descending, false).ok()?;

    let mut digest = Xxh3::new();
    for row_idx in 0..sorted.height() {
        let mut buffer: Vec<u8> = Vec::new();
        for series in sorted.get_columns() {
            let value = series.get(row_idx).ok()?;
            buffer.extend_from_slice(&any_value_to_bytes(&value));
        }
        let row_hash = xxh3_64(&buffer);
        digest.update(&row_hash.to_le_bytes());
    }

    Some(format!("{:x}", digest.digest()))
}

/// Serialize a single cell to bytes for hashing. Numeric and boolean types
/// hash their native little-endian representation; everything else
/// (strings, temporal values, anything else Polars can print) hashes its
/// string form, so that e.g. `1i64` and `"1"` in differently-typed columns
/// never collide on output alone without also matching type.
fn any_value_to_bytes(value: &AnyValue) -> Vec<u8> {
    match value {
        AnyValue::Null => vec![0u8],
        AnyValue::Int8(v) => v.to_le_bytes().to_vec(),
        AnyValue::Int16(v) => v.to_le_bytes().to_vec(),
        AnyValue::Int32(v) => v.to_le_bytes().to_vec(),
        AnyValue::Int64(v) => v.to_le_bytes().to_vec(),
        AnyValue::UInt8(v) => v.to_le_bytes().to_vec(),
        AnyValue::UInt16(v) => v.to_le_bytes().to_vec(),
        AnyValue::UInt32(v) => v.to_le_bytes().to_vec(),
        AnyValue::UInt64(v) => v.to_le_bytes().to_vec(),
        AnyValue::Float32(v) => v.to_le_bytes().to_vec(),
        AnyValue::Float64(v) => v.to_le_bytes().to_vec(),
        AnyValue::Boolean(v) => vec![if *v { 1u8 } else { 0u8 }],
        AnyValue::String(v) => v.as_bytes().to_vec(),
        _ => value.to_string().into_bytes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_order_does_not_change_the_checksum() {
        let a = Table::new(df!("id" => [1i64, 2, 3], "val" => ["a", "b", "c"]).unwrap());
        let b = Table::new(df!("id" => [3i64, 1, 2], "val" => ["c", "a", "b"]).unwrap());
        let keys = vec!["id".to_string()];
        assert_eq!(
            compute_checksum(&a, &keys),
            compute_checksum(&b, &keys)
        );
    }

    #[test]
    fn no_keys_yields_no_checksum() {
        let a = Table::new(df!("id" => [1i64, 2]).unwrap());
        assert!(compute_checksum(&a, &[]).is_none());
    }

    #[test]
    fn missing_key_column_yields_no_checksum() {
        let a = Table::new(df!("id" => [1i64, 2]).unwrap());
        let keys = vec!["nonexistent".to_string()];
        assert!(compute_checksum(&a, &keys).is_none());
    }

    #[test]
    fn a_changed_value_changes_the_checksum() {
        let a = Table::new(df!("id" => [1i64, 2], "val" => ["a", "b"]).unwrap());
        let b = Table::new(df!("id" => [1i64, 2], "val" => ["a", "X"]).unwrap());
        let keys = vec!["id".to_string()];
        assert_ne!(
            compute_checksum(&a, &keys),
            compute_checksum(&b, &keys)
        );
    }

    #[test]
    fn identical_tables_with_identical_order_match() {
        let a = Table::new(df!("id" => [1i64, 2], "val" => ["a", "b"]).unwrap());
        let b = Table::new(df!("id" => [1i64, 2], "val" => ["a", "b"]).unwrap());
        let keys = vec!["id".to_string()];
        assert_eq!(
            compute_checksum(&a, &keys),
            compute_checksum(&b, &keys)
        );
    }
}
