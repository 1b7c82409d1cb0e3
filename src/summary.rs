//! Summary shaper
//!
//! Collapses a raw [`ComparisonData`] diff into the small set of counters a
//! report actually wants to lead with: how many rows on each side, and which
//! columns changed the most.

use crate::model::ComparisonData;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub rows_added: usize,
    pub rows_deleted: usize,
    pub rows_modified: usize,
    /// Column name -> number of differing cells, top 5, ties broken by
    /// column name ascending.
    pub top_modified_columns: Vec<(String, usize)>,
}

pub fn summarize(data: &ComparisonData) -> Summary {
    let mut distinct_keys = std::collections::HashSet::new();
    let mut column_counts: BTreeMap<String, usize> = BTreeMap::new();

    for cell in &data.modified {
        distinct_keys.insert(cell.key.clone());
        *column_counts.entry(cell.column.clone()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = column_counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(5);

    Summary {
        rows_added: data.added.height(),
        rows_deleted: data.deleted.height(),
        rows_modified: distinct_keys.len(),
        top_modified_columns: ranked,
    }
}
