//! Directory pairing driver (ambient, not core)
//!
//! Discovers (before_path, after_path) pairs by relative path under two
//! root directories — a fixed correspondence rather than a best-effort
//! file-similarity match, since a "pair" here is always a known before and
//! after snapshot of the same logical file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A single (before, after) file correspondence, keyed by the path each
/// file has relative to its root.
#[derive(Debug, Clone)]
pub struct FilePair {
    pub relative_path: PathBuf,
    pub before_path: PathBuf,
    pub after_path: PathBuf,
}

/// Walk both directory trees and yield a [`FilePair`] for every relative
/// path present under both roots. Files present under only one root are
/// skipped — the comparison engine only ever runs against an actual pair,
/// and reporting one-sided presence is left to the driver, not this module.
pub fn pair_directories(before_root: &Path, after_root: &Path) -> Vec<FilePair> {
    let before_files = index_relative_paths(before_root);
    let after_files = index_relative_paths(after_root);

    before_files
        .into_iter()
        .filter_map(|(relative_path, before_path)| {
            after_files.get(&relative_path).map(|after_path| FilePair {
                relative_path: relative_path.clone(),
                before_path,
                after_path: after_path.clone(),
            })
        })
        .collect()
}

fn index_relative_paths(root: &Path) -> BTreeMap<PathBuf, PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?.to_path_buf();
            Some((relative, entry.path().to_path_buf()))
        })
        .collect()
}
