//! SnapDiff - a regression-testing engine for columnar before/after snapshots
//!
//! The core comparison engine lives
//! in [`model`], [`table_io`], [`schema_diff`], [`key_inference`],
//! [`checksum`], [`precise_diff`], [`fuzzy_diff`], [`temporal`],
//! [`orchestrator`] and [`summary`]. Everything else — [`config`],
//! [`pairing`], [`result_log`], [`report`] — is the ambient CLI-facing
//! layer that makes the engine runnable end to end.

pub mod checksum;
pub mod config;
pub mod errors;
pub mod fuzzy_diff;
pub mod key_inference;
pub mod model;
pub mod orchestrator;
pub mod pairing;
pub mod precise_diff;
pub mod report;
pub mod result_log;
pub mod schema_diff;
pub mod summary;
pub mod table_io;
pub mod temporal;

use crate::model::{Config, Rules};
use crate::orchestrator::{run_comparison, PairOutcome};
use crate::pairing::FilePair;
use crate::report::{write_report, MarkdownRenderer, ReportContext};
use crate::result_log::{append, ResultLogEntry};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Trait for reporting progress during a multi-pair run, the seam a CLI
/// hangs a progress bar off of without the engine depending on one.
pub trait ProgressReporter: Send + Sync {
    fn start(&self, total: u64, message: &str);
    fn inc(&self, delta: u64);
    fn finish(&self, message: &str);
}

/// A no-op progress reporter for library callers that don't want output.
pub struct NoopProgressReporter;
impl ProgressReporter for NoopProgressReporter {
    fn start(&self, _total: u64, _message: &str) {}
    fn inc(&self, _delta: u64) {}
    fn finish(&self, _message: &str) {}
}

/// The outcome of comparing one discovered pair, with enough context
/// (relative path, both concrete file paths) to log and report it.
pub struct PairRunResult {
    pub pair: FilePair,
    pub outcome: PairOutcome,
}

/// Compares every (before, after) pair under the two roots, in parallel:
/// the driver schedules independent workers concurrently and each worker
/// runs one orchestrator instance to completion on its own pair. Optionally
/// renders a Markdown report per pair under `report_dir` and appends every
/// verdict to `result_log_path`.
#[allow(clippy::too_many_arguments)]
pub fn run_directory_comparison(
    before_root: &Path,
    after_root: &Path,
    config: &Config,
    rules: &Rules,
    skip_checksum: bool,
    report_dir: Option<&Path>,
    result_log_path: Option<&Path>,
    progress: Option<&dyn ProgressReporter>,
) -> anyhow::Result<Vec<PairRunResult>> {
    let pairs = pairing::pair_directories(before_root, after_root);

    if let Some(p) = progress {
        p.start(pairs.len() as u64, "Comparing pairs...");
    }

    let results: Vec<PairRunResult> = pairs
        .into_par_iter()
        .map(|pair| {
            let mut outcome = run_comparison(&pair.before_path, &pair.after_path, config, rules, skip_checksum);

            if let Some(dir) = report_dir {
                let report_path = report_path_for(dir, &pair.relative_path);
                let ctx = ReportContext {
                    relative_path: &pair.relative_path,
                    before_path: &pair.before_path,
                    after_path: &pair.after_path,
                    outcome: &outcome,
                };
                if write_report(&report_path, &MarkdownRenderer, &ctx).is_ok() {
                    outcome.result.report_path = Some(report_path.display().to_string());
                }
            }

            if let Some(p) = progress {
                p.inc(1);
            }

            PairRunResult { pair, outcome }
        })
        .collect();

    if let Some(log_path) = result_log_path {
        for result in &results {
            let entry = ResultLogEntry {
                relative_path: result.pair.relative_path.display().to_string(),
                status: result.outcome.result.status_str.clone(),
                details: result.outcome.result.details.clone(),
            };
            append(log_path, &entry)?;
        }
    }

    if let Some(p) = progress {
        p.finish("Comparison complete");
    }

    Ok(results)
}

fn report_path_for(report_dir: &Path, relative_path: &Path) -> PathBuf {
    let mut path = report_dir.join(relative_path);
    path.set_extension("md");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn runs_a_directory_pair_end_to_end() {
        let before_dir = tempfile::tempdir().unwrap();
        let after_dir = tempfile::tempdir().unwrap();
        fs::write(before_dir.path().join("orders.csv"), "id,val\n1,a\n2,b\n").unwrap();
        fs::write(after_dir.path().join("orders.csv"), "id,val\n1,a\n2,Z\n").unwrap();

        let report_dir = tempfile::tempdir().unwrap();
        let log_file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();

        let results = run_directory_comparison(
            before_dir.path(),
            after_dir.path(),
            &Config::default(),
            &Rules::default(),
            false,
            Some(report_dir.path()),
            Some(log_file.path()),
            None,
        )
        .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].outcome.result.status_str, "DIFFERENCES_FOUND");
        assert!(results[0].outcome.result.report_path.is_some());

        let last = result_log::last_status_per_pair(log_file.path()).unwrap();
        assert_eq!(last["orders.csv"].status, "DIFFERENCES_FOUND");
    }
}
