//! Core data types for the comparison engine
//!
//! This module defines the shared types that flow through every stage of the
//! pipeline: the table abstraction, the schema diff, the data-level diff, and
//! the external per-pair verdict.

use polars::prelude::{DataFrame, DataType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A loaded, in-memory table.
///
/// Backed by a Polars `DataFrame`. The rest of the pipeline only ever calls
/// `Table`/`DataFrame` methods, so swapping the concrete file reader (CSV,
/// Parquet, or anything else that can materialize rows with named, typed
/// columns) never touches downstream stages.
#[derive(Debug, Clone)]
pub struct Table(pub DataFrame);

impl Table {
    pub fn new(df: DataFrame) -> Self {
        Table(df)
    }

    pub fn height(&self) -> usize {
        self.0.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.0
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn inner(&self) -> &DataFrame {
        &self.0
    }

    pub fn into_inner(self) -> DataFrame {
        self.0
    }
}

/// Column type, collapsed into the six kinds this crate treats distinctly.
///
/// Everything that isn't integer/floating/boolean/string/temporal is
/// compared as a stringified "other" (nested/struct/list columns included —
/// see the Non-goals in the schema differ's contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Integer,
    Floating,
    Boolean,
    String,
    Temporal,
    Other,
}

impl ColumnKind {
    pub fn from_polars(dtype: &DataType) -> Self {
        use DataType::*;
        match dtype {
            Int8 | Int16 | Int32 | Int64 | UInt8 | UInt16 | UInt32 | UInt64 => ColumnKind::Integer,
            Float32 | Float64 => ColumnKind::Floating,
            Boolean => ColumnKind::Boolean,
            String => ColumnKind::String,
            Date | Datetime(_, _) | Time | Duration(_) => ColumnKind::Temporal,
            _ => ColumnKind::Other,
        }
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, ColumnKind::Floating)
    }
}

/// Structural diff of two named/typed column lists.
///
/// Invariant: `identical() <=> added.is_empty() && removed.is_empty() &&
/// type_changes.is_empty()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDiff {
    /// Columns present only in "after" -> their type (as a string).
    pub added: BTreeMap<String, String>,
    /// Columns present only in "before" -> their type (as a string).
    pub removed: BTreeMap<String, String>,
    /// Columns present in both, with differing string-form types:
    /// name -> (before_type, after_type).
    pub type_changes: BTreeMap<String, (String, String)>,
}

impl SchemaDiff {
    pub fn identical(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.type_changes.is_empty()
    }

    /// Columns named in `type_changes` that affect comparison semantics
    /// (both sides cast to string rather than compared as their native type).
    pub fn coerced_columns(&self) -> HashSet<&str> {
        self.type_changes.keys().map(|s| s.as_str()).collect()
    }
}

/// A single long-form "one row per differing cell" record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedCell {
    pub key: String,
    pub column: String,
    pub value_before: String,
    pub value_after: String,
}

/// Result of a data-level diff (either the precise or the fuzzy comparator).
#[derive(Debug, Clone, Default)]
pub struct ComparisonData {
    /// Rows present only in "after", projected onto common columns.
    pub added: Table,
    /// Rows present only in "before", projected onto common columns.
    pub deleted: Table,
    /// One record per (key, column) differing cell.
    pub modified: Vec<ModifiedCell>,
}

impl Default for Table {
    fn default() -> Self {
        Table(DataFrame::empty())
    }
}

impl ComparisonData {
    pub fn identical(&self) -> bool {
        self.added.height() == 0 && self.deleted.height() == 0 && self.modified.is_empty()
    }
}

/// Final per-pair status, with a fixed set of canonical string values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    IdenticalChecksumMatch,
    IdenticalToleranceMatch,
    Identical,
    FuzzyIdentical,
    DifferencesFound,
    FuzzyDifferencesFound,
    ReadError,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::IdenticalChecksumMatch => "IDENTICAL (CHECKSUM_MATCH)",
            Status::IdenticalToleranceMatch => "IDENTICAL (TOLERANCE_MATCH)",
            Status::Identical => "IDENTICAL",
            Status::FuzzyIdentical => "FUZZY_IDENTICAL",
            Status::DifferencesFound => "DIFFERENCES_FOUND",
            Status::FuzzyDifferencesFound => "FUZZY_DIFFERENCES_FOUND",
            Status::ReadError => "READ_ERROR",
        }
    }

    pub fn is_identical_family(&self) -> bool {
        matches!(
            self,
            Status::IdenticalChecksumMatch
                | Status::IdenticalToleranceMatch
                | Status::Identical
                | Status::FuzzyIdentical
        )
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-pair verdict returned by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub status_str: String,
    pub report_path: Option<String>,
    pub details: Option<String>,
}

impl ComparisonResult {
    pub fn new(status: Status) -> Self {
        ComparisonResult {
            status_str: status.as_str().to_string(),
            report_path: None,
            details: None,
        }
    }

    pub fn with_details(status: Status, details: impl Into<String>) -> Self {
        ComparisonResult {
            status_str: status.as_str().to_string(),
            report_path: None,
            details: Some(details.into()),
        }
    }

    pub fn with_report_path(mut self, path: impl Into<String>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    pub fn is_identical(&self) -> bool {
        matches!(
            self.status_str.as_str(),
            "IDENTICAL (CHECKSUM_MATCH)" | "IDENTICAL (TOLERANCE_MATCH)" | "IDENTICAL" | "FUZZY_IDENTICAL"
        )
    }
}

/// Per-pair rules, supplied externally (e.g. from the CLI or a rules file).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rules {
    /// Absolute floating-point tolerance.
    pub float_tolerance: f64,
    /// Columns to drop from both sides before any comparison stage runs.
    pub ignore_columns: HashSet<String>,
}

/// Process-wide configuration, supplied externally (e.g. loaded from a TOML file).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum uniqueness ratio (n_unique / n_rows) for a column to be
    /// accepted as an inferred key when no column is perfectly unique.
    pub key_uniqueness_threshold: f64,
    /// Minimum fraction of sampled string values that must parse as a
    /// datetime for the column to be treated as `ColumnKind::Temporal`.
    pub datetime_parse_threshold: f64,
    /// Minimum weighted similarity score for a fuzzy match to be accepted.
    pub fuzzy_match_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            key_uniqueness_threshold: 0.99,
            datetime_parse_threshold: 0.9,
            fuzzy_match_threshold: 0.8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_diff_identical_iff_all_empty() {
        let diff = SchemaDiff::default();
        assert!(diff.identical());

        let mut diff = SchemaDiff::default();
        diff.added.insert("new_col".to_string(), "Int64".to_string());
        assert!(!diff.identical());
    }

    #[test]
    fn status_strings_match_their_canonical_form() {
        assert_eq!(
            Status::IdenticalChecksumMatch.as_str(),
            "IDENTICAL (CHECKSUM_MATCH)"
        );
        assert_eq!(
            Status::IdenticalToleranceMatch.as_str(),
            "IDENTICAL (TOLERANCE_MATCH)"
        );
        assert_eq!(Status::Identical.as_str(), "IDENTICAL");
        assert_eq!(Status::FuzzyIdentical.as_str(), "FUZZY_IDENTICAL");
        assert_eq!(Status::DifferencesFound.as_str(), "DIFFERENCES_FOUND");
        assert_eq!(
            Status::FuzzyDifferencesFound.as_str(),
            "FUZZY_DIFFERENCES_FOUND"
        );
        assert_eq!(Status::ReadError.as_str(), "READ_ERROR");
    }

    #[test]
    fn column_kind_maps_numeric_types() {
        assert_eq!(ColumnKind::from_polars(&DataType::Int64), ColumnKind::Integer);
        assert_eq!(ColumnKind::from_polars(&DataType::Float64), ColumnKind::Floating);
        assert_eq!(ColumnKind::from_polars(&DataType::Boolean), ColumnKind::Boolean);
        assert_eq!(ColumnKind::from_polars(&DataType::String), ColumnKind::String);
    }
}
