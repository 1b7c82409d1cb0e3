//! Process-wide configuration loading (ambient, not core)
//!
//! `Config` (thresholds, process-wide) can always be built with
//! `Config::default()`; this module adds a thin TOML loader on top, the
//! same shape `tuiql` uses for its own settings file
//! (`toml` + `serde::Deserialize`, `#[serde(default)]` so a partial file is
//! valid): every field falls back to `Config::default()` when absent.

use crate::errors::{ComparisonError, Result};
use crate::model::Config;
use std::path::Path;

/// Load a [`Config`] from a TOML file. Missing fields fall back to
/// [`Config::default`]; a missing file is the caller's problem, not
/// silently tolerated, since an explicit `--config` flag implies the file
/// should exist.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ComparisonError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ComparisonError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}
