use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the RevOps dashboard crates.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A required column is absent from a dataset's header row.
    #[error("Dataset '{dataset}' is missing required field '{field}'")]
    MissingField { dataset: String, field: String },

    /// A numeric cell holds a value the engine refuses to aggregate
    /// (NaN, infinite, or otherwise out of domain).
    #[error("Dataset '{dataset}' row {row}: invalid value '{value}' for field '{field}'")]
    InvalidValue {
        dataset: String,
        row: usize,
        field: String,
        value: String,
    },

    /// A dataset file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A dataset file was not found anywhere under the data directory.
    #[error("Dataset '{dataset}' not found under {dir}")]
    DatasetNotFound { dataset: String, dir: PathBuf },

    /// A CSV row could not be decoded into its typed record.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DashboardError {
    /// Shorthand for [`DashboardError::MissingField`].
    pub fn missing_field(dataset: &str, field: &str) -> Self {
        Self::MissingField {
            dataset: dataset.to_string(),
            field: field.to_string(),
        }
    }
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;
