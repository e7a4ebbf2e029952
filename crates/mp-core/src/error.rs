use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("No reference: {what} has no non-zero expected row")]
    NoReference { what: &'static str },

    #[error("Shape mismatch: {what} (expected {expected}, got {got})")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Invalid id: {what} ({value})")]
    InvalidId { what: &'static str, value: u64 },
}
