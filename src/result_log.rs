//! Result log (ambient, not core)
//!
//! A persistent keyed store of last status per pair. This is an
//! append-only JSONL file — simpler than the original prototype's
//! SQLite-backed `ComparisonTracker` (`tracking.py`), but the same
//! contract: the driver appends one record per pair after every run, and
//! "last write wins" when a pair's relative path repeats across runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultLogEntry {
    pub relative_path: String,
    pub status: String,
    pub details: Option<String>,
}

/// Append one entry to the log file, creating it if necessary.
pub fn append(log_path: &Path, entry: &ResultLogEntry) -> anyhow::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(log_path)?;
    let line = serde_json::to_string(entry)?;
    writeln!(file, "{line}")?;
    Ok(())
}

/// Replay the log and return the last recorded status per relative path.
/// A pair already known `IDENTICAL*` can be skipped by a caller that wants
/// to avoid re-comparing unchanged pairs across incremental runs.
pub fn last_status_per_pair(log_path: &Path) -> anyhow::Result<HashMap<String, ResultLogEntry>> {
    if !log_path.exists() {
        return Ok(HashMap::new());
    }

    let file = std::fs::File::open(log_path)?;
    let mut last: HashMap<String, ResultLogEntry> = HashMap::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: ResultLogEntry = serde_json::from_str(&line)?;
        last.insert(entry.relative_path.clone(), entry);
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins_for_a_repeated_path() {
        let file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        append(
            file.path(),
            &ResultLogEntry {
                relative_path: "orders.csv".into(),
                status: "DIFFERENCES_FOUND".into(),
                details: None,
            },
        )
        .unwrap();
        append(
            file.path(),
            &ResultLogEntry {
                relative_path: "orders.csv".into(),
                status: "IDENTICAL (CHECKSUM_MATCH)".into(),
                details: None,
            },
        )
        .unwrap();

        let last = last_status_per_pair(file.path()).unwrap();
        assert_eq!(last["orders.csv"].status, "IDENTICAL (CHECKSUM_MATCH)");
    }

    #[test]
    fn a_missing_log_file_yields_an_empty_map() {
        let last = last_status_per_pair(Path::new("/nonexistent/results.jsonl")).unwrap();
        assert!(last.is_empty());
    }
}
