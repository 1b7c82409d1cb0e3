//! Error types for the comparison engine
//!
//! No exception escapes the orchestrator: every stage past table load is
//! infallible by construction. `ComparisonError` is the one typed failure
//! mode (table load/decode, config load) the orchestrator and CLI catch and
//! convert into a terminal result.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComparisonError {
    #[error("failed to read table at {path}: {source}")]
    TableRead {
        path: PathBuf,
        #[source]
        source: polars::prelude::PolarsError,
    },

    #[error("unsupported table file extension: {0}")]
    UnsupportedExtension(String),

    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ComparisonError>;
