//! mp-solver: solver selection and the solution-step lifecycle.
//!
//! Provides:
//! - the dispatch table from project parameters to a solver variant
//! - potential-flow and structural solvers behind [`SolverHandle`]
//! - the [`Backend`] seam to the native engine, with a dry-run backend
//! - the lifecycle state machine every solver runs through

pub mod backend;
pub mod dispatch;
pub mod driver;
pub mod dry_run;
pub mod error;
pub mod handle;
pub mod import;
pub mod potential_flow;
pub mod structural;

pub use backend::{
    Backend, ConvergenceSettings, LinearSolver, SchemeKind, Strategy, StrategyKind, StrategySpec,
};
pub use dispatch::{
    DispatchKey, Parallelism, SolverType, SolverVariant, TimeIntegrationMethod, create_solver,
    resolve,
};
pub use driver::{DriverState, SolutionStepDriver};
pub use dry_run::DryRunBackend;
pub use error::{SolverError, SolverResult};
pub use handle::SolverHandle;
pub use potential_flow::PotentialFlowSolver;
pub use structural::{StructuralSolver, StructuralVariant};

use mp_config::ConfigError;

/// Convert a schema-checked integer setting to `usize`.
pub(crate) fn non_negative(field: &str, value: i64) -> SolverResult<usize> {
    usize::try_from(value).map_err(|_| {
        SolverError::Config(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be >= 0".to_string(),
        })
    })
}
