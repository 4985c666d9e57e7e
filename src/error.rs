//! Typed error taxonomy for report generation.
//!
//! Per-record and per-file problems never surface here: malformed lines are
//! skipped and missing monthly files are logged as warnings. These errors
//! cover the cases where a run cannot (or should not) produce output, plus
//! the enrichment condition callers recover from locally.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// No processable primary input at all; the run aborts before writing.
    #[error("no usable input: {0}")]
    NoUsableInput(String),

    /// A month argument or setting that is neither `MM-YYYY` nor `YYYY-MM`.
    #[error("invalid month '{0}': expected MM-YYYY or YYYY-MM")]
    InvalidMonth(String),

    /// A setting required by the selected command is absent or blank.
    #[error("missing setting '{0}' in configuration")]
    MissingSetting(&'static str),

    /// The enrichment CSV lacks its join column, so no join is possible.
    #[error("enrichment unavailable: CSV has no '{0}' column")]
    EnrichmentUnavailable(&'static str),
}

/// Errors raised while loading the TOML configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read configuration {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
