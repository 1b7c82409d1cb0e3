//! Schema differ
//!
//! Structural diff of two named/typed column lists. Name comparisons are
//! case-sensitive and exact; type comparisons happen on the string form of
//! the type (`Schema::from_polars`-style), since this is a compatibility
//! report rather than a type-theoretic decision — the orchestrator decides
//! separately whether to coerce via to-string casting on common columns.

use crate::model::{SchemaDiff, Table};
use std::collections::HashSet;

pub fn diff_schemas(before: &Table, after: &Table) -> SchemaDiff {
    let schema_before = before.inner().schema();
    let schema_after = after.inner().schema();

    let names_before: HashSet<&str> = schema_before.iter_names().map(|n| n.as_str()).collect();
    let names_after: HashSet<&str> = schema_after.iter_names().map(|n| n.as_str()).collect();

    let mut result = SchemaDiff::default();

    for name in names_after.difference(&names_before) {
        let dtype = schema_after.get(name).expect("name came from this schema");
        result.added.insert(name.to_string(), dtype.to_string());
    }

    for name in names_before.difference(&names_after) {
        let dtype = schema_before.get(name).expect("name came from this schema");
        result.removed.insert(name.to_string(), dtype.to_string());
    }

    for name in names_before.intersection(&names_after) {
        let dtype_before = schema_before.get(name).expect("name came from this schema");
        let dtype_after = schema_after.get(name).expect("name came from this schema");
        if dtype_before.to_string() != dtype_after.to_string() {
            result.type_changes.insert(
                name.to_string(),
                (dtype_before.to_string(), dtype_after.to_string()),
            );
        }
    }

    result
}
