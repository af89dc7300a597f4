//! Typed error hierarchy for the Oven.
//!
//! Two top-level enums cover the two places where the crate can fail for
//! real:
//! - `OvenError`: bake task and bake report failures
//! - `ConfigError`: loading and validating `.oven/oven.toml`
//!
//! Collaborator failures (engine, scaffold builder, applier) are never
//! surfaced through these types; the oven folds them into the bake's error
//! list and degrades the quality tier instead.

use thiserror::Error;

/// Errors from running bakes and persisting their reports.
#[derive(Debug, Error)]
pub enum OvenError {
    #[error("Bake task failed to complete: {0}")]
    BakeTaskFailed(#[source] tokio::task::JoinError),

    #[error("Failed to write bake report at {path}: {source}")]
    ReportWriteFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read bake report at {path}: {source}")]
    ReportReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Bake report {id} not found")]
    ReportNotFound { id: String },

    #[error("Invalid bake id '{id}': expected hex digits and '-'")]
    InvalidReportId { id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from loading or parsing oven configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    ReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse oven.toml: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unknown quality tier '{0}'. Valid values: raw, tested, crispy, golden-brown")]
    UnknownTier(String),
}
