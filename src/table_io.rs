//! Concrete table loading
//!
//! A columnar file reader, assumed to expose row groups, a schema with
//! named typed fields, and bulk materialization into an in-memory table.
//! This module is the concrete stand-in: it reads CSV or Parquet files into
//! a [`Table`], using Polars' own readers, so the rest of the pipeline
//! never has to know the file format.

use crate::errors::{ComparisonError, Result};
use crate::model::Table;
use polars::prelude::*;
use std::path::Path;

/// Load a table from disk. Dispatches on file extension; `.parquet` and
/// `.csv`/`.tsv` are supported, matching the two concrete formats the
/// original prototype and its corpus cousins actually read.
pub fn load_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    let df = match ext.as_str() {
        "parquet" | "pq" => read_parquet(path)?,
        "csv" => read_csv(path, b',')?,
        "tsv" => read_csv(path, b'\t')?,
        other => return Err(ComparisonError::UnsupportedExtension(other.to_string())),
    };

    Ok(Table::new(df))
}

fn read_parquet(path: &Path) -> Result<DataFrame> {
    let file = std::fs::File::open(path).map_err(|source| ComparisonError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ParquetReader::new(file)
        .finish()
        .map_err(|source| ComparisonError::TableRead {
            path: path.to_path_buf(),
            source,
        })
}

fn read_csv(path: &Path, separator: u8) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_separator(separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|source| ComparisonError::TableRead {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_csv_table() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "id,name\n1,Apple\n2,Banana").unwrap();
        let table = load_table(file.path()).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.column_names(), vec!["id", "name"]);
    }

    #[test]
    fn rejects_unsupported_extensions() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let err = load_table(file.path()).unwrap_err();
        assert!(matches!(err, ComparisonError::UnsupportedExtension(_)));
    }
}
