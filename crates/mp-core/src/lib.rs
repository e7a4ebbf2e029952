//! mp-core: shared foundation for the multiphys orchestration layer.
//!
//! Contains:
//! - ids (compact ids for nodes, elements, conditions, properties)
//! - numeric (finite checks + reference error norms)
//! - error (shared error type)

pub mod error;
pub mod ids;
pub mod numeric;

pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
