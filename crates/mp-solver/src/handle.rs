//! Uniform interface over every solver the dispatcher can build.

use std::path::Path;

use mp_model::{ImportSummary, Model};

use crate::driver::DriverState;
use crate::error::SolverResult;

/// A solver bound to one root model part of a [`Model`].
///
/// Calls must follow the lifecycle in [`crate::driver`]:
/// `add_variables`, `import_model_part`, `add_dofs`, `initialize`, then any
/// number of `solve_solution_step`, then `clear`.
pub trait SolverHandle: std::fmt::Debug {
    fn model_part_name(&self) -> &str;

    /// History depth this solver needs.
    fn minimum_buffer_size(&self) -> usize;

    fn state(&self) -> DriverState;

    fn add_variables(&mut self, model: &mut Model) -> SolverResult<()>;

    /// Read the mesh, relative paths resolved against `base_dir`.
    fn import_model_part(&mut self, model: &mut Model, base_dir: &Path)
    -> SolverResult<ImportSummary>;

    fn add_dofs(&mut self, model: &mut Model) -> SolverResult<()>;

    fn initialize(&mut self, model: &mut Model) -> SolverResult<()>;

    fn check(&self, model: &Model) -> SolverResult<()>;

    fn solve_solution_step(&mut self, model: &mut Model) -> SolverResult<()>;

    fn set_echo_level(&mut self, level: usize);

    fn clear(&mut self);
}
