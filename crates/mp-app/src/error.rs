//! Error types for the mp-app service layer.

use std::path::PathBuf;

/// Application error shared by the CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read project file: {path}")]
    ProjectFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<mp_config::ProjectError> for AppError {
    fn from(err: mp_config::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<mp_config::ConfigError> for AppError {
    fn from(err: mp_config::ConfigError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<mp_model::ModelError> for AppError {
    fn from(err: mp_model::ModelError) -> Self {
        AppError::Model(err.to_string())
    }
}

impl From<mp_solver::SolverError> for AppError {
    fn from(err: mp_solver::SolverError) -> Self {
        AppError::Solver(err.to_string())
    }
}

impl From<mp_results::ResultsError> for AppError {
    fn from(err: mp_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
