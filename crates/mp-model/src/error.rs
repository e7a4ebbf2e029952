//! Error types for model and mesh operations.

use mp_core::{CoreError, Id};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model part not found: {name}")]
    NotFound { name: String },

    #[error("Invalid model part name '{name}': must be non-empty and contain no '.'")]
    InvalidName { name: String },

    #[error("Model part already exists: {name}")]
    DuplicateModelPart { name: String },

    #[error("Duplicate {what} id {id} in model part '{model_part}'")]
    DuplicateId {
        what: &'static str,
        id: Id,
        model_part: String,
    },

    #[error("Unknown {what} id {id} in model part '{model_part}'")]
    UnknownId {
        what: &'static str,
        id: Id,
        model_part: String,
    },

    #[error("Variable {variable} is not a solution-step variable of model part '{model_part}'")]
    MissingVariable {
        variable: &'static str,
        model_part: String,
    },

    #[error("History index {step} exceeds buffer size {buffer_size}")]
    BufferIndex { step: usize, buffer_size: usize },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("{count} inverted element(s) found, first ids: {ids:?}")]
    Orientation { count: usize, ids: Vec<Id> },

    #[error("Element type '{name}' expects {expected} nodes but element {id} has {got}")]
    GeometryMismatch {
        name: String,
        id: Id,
        expected: usize,
        got: usize,
    },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ModelResult<T> = Result<T, ModelError>;
