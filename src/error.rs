//! Error types for ferrite-fit.

use thiserror::Error;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, FitError>;

/// Every failure a run can surface. All of them are fatal to the run.
#[derive(Error, Debug)]
pub enum FitError {
    /// Column resolution is impossible (the dataset has no columns).
    #[error("schema error: {0}")]
    Schema(String),

    /// A label was not part of the fixed class set it is encoded against.
    #[error("unknown label '{label}': not among the {known} known classes")]
    UnknownLabel { label: String, known: usize },

    #[error("insufficient data: need at least {needed} rows, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("unsupported model '{0}'")]
    UnsupportedModel(String),

    #[error("model '{0}' needs the classical estimator backend, which this build does not include (enable the `classical` feature)")]
    DependencyUnavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plot error: {0}")]
    Plot(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
