//! Error types for solver construction and the solution-step lifecycle.

use mp_config::ConfigError;
use mp_model::ModelError;
use thiserror::Error;

use crate::driver::DriverState;

#[derive(Error, Debug)]
pub enum SolverError {
    #[error(
        "The requested {field} \"{value}\" is not available; available options are: {}",
        .alternatives.join(", ")
    )]
    UnsupportedConfiguration {
        field: &'static str,
        value: String,
        alternatives: Vec<&'static str>,
    },

    #[error("Type error: expected {expected}, got {got}")]
    Type { expected: String, got: String },

    #[error("Not implemented: {what}")]
    NotImplemented { what: String },

    #[error("Domain size is not 2 or 3 (got {domain_size})")]
    DomainSize { domain_size: usize },

    #[error("Cannot {operation} while the solver is {state}")]
    Lifecycle {
        operation: &'static str,
        state: DriverState,
    },

    #[error("Solver is already initialized")]
    AlreadyInitialized,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Backend error: {what}")]
    Backend { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;
