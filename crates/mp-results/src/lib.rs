//! mp-results: error-metrics recording and reference comparison.

pub mod recorder;
pub mod reference;
pub mod store;
pub mod types;

pub use recorder::{ErrorRecorder, RecorderSettings, average_error};
pub use reference::{DEFAULT_THRESHOLD_PERCENT, ReferenceCheck, load_table, load_weights};
pub use store::MetricsStore;
pub use types::*;

use mp_core::CoreError;
use mp_model::ModelError;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model part '{model_part}' has no elements")]
    EmptyModelPart { model_part: String },

    #[error("Group not found: {group}")]
    GroupNotFound { group: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },

    #[error("Column {column}: relative L2 error {error_percent}% exceeds {threshold_percent}%")]
    ThresholdExceeded {
        column: usize,
        error_percent: f64,
        threshold_percent: f64,
    },

    #[error("Invalid threshold: {threshold_percent}% (must be finite and positive)")]
    InvalidThreshold { threshold_percent: f64 },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
