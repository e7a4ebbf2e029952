//! mp-model: model registry, model parts and mesh import.
//!
//! Provides:
//! - `Model`, the registry of root model parts
//! - `ModelPart` with nodal solution-step history and dofs
//! - `.mdpa` reader
//! - element orientation check and element/condition replacement

pub mod error;
pub mod io;
pub mod model;
pub mod model_part;
pub mod orientation;
pub mod replace;
pub mod variables;

pub use error::{ModelError, ModelResult};
pub use io::{ImportSummary, mdpa_path, parse_mdpa, read_model_part};
pub use model::Model;
pub use model_part::{Condition, Element, ModelPart, Node, ProcessInfo, SubModelPart};
pub use orientation::{OrientationPolicy, OrientationReport, check_orientation};
pub use replace::replace_elements_and_conditions;
pub use variables::Variable;
