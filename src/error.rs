//! Error handling for ingestion and start-up.
//!
//! Per-file parse failures, configuration problems, codec failures and
//! collaborator failures all surface through [`DataError`]. The caller decides
//! whether a given variant means "skip and continue" or "abort start-up".

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory traversal failed: {0}")]
    DirectoryTraversal(#[from] walkdir::Error),

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    #[error("Data directory not found at path: {path}")]
    DataDirectoryNotFound { path: PathBuf },

    #[error("Could not parse spreadsheet {path}: {reason}")]
    ParseFailure { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Found {} weather files, expected at most one: {}", .files.len(), display_paths(.files))]
    AmbiguousWeatherSource { files: Vec<PathBuf> },

    #[error("No weather file with extension '{extension}' found under {dir}")]
    MissingWeatherSource { dir: PathBuf, extension: String },

    #[error("Invalid weather file {path}: {reason}")]
    WeatherFormat { path: PathBuf, reason: String },

    #[error("Table shape mismatch: {reason}")]
    TableShape { reason: String },

    #[error("Canonical payload could not be decoded: {reason}")]
    Codec { reason: String },

    #[error("Collaborator stage '{stage}' failed: {reason}")]
    Collaborator { stage: String, reason: String },
}

impl DataError {
    pub fn parse_failure(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ParseFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn codec(reason: impl Into<String>) -> Self {
        Self::Codec {
            reason: reason.into(),
        }
    }

    /// Whether the error only affects the file it was raised for.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ParseFailure { .. })
    }
}

fn display_paths(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, DataError>;
