//! Ошибки конвейера

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("schema error in column '{column}': {reason}")]
    Schema { column: String, reason: String },

    #[error("domain error in column '{column}' at row {row}: {reason}")]
    Domain {
        column: String,
        row: usize,
        reason: String,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("baseline classifier failed: {0}")]
    Baseline(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub fn missing_column(column: &str) -> Self {
        Self::Schema {
            column: column.to_string(),
            reason: "column not found".to_string(),
        }
    }

    pub fn domain(column: &str, row: usize, reason: impl Into<String>) -> Self {
        Self::Domain {
            column: column.to_string(),
            row,
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
