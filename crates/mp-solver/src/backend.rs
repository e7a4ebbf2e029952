//! Seam to the native numerical engine.
//!
//! The orchestration layer never assembles or solves a system itself. It
//! describes what it needs (a linear solver, a strategy of a given kind) and
//! a [`Backend`] builds it. Backends are injected at solver construction.

use std::sync::Arc;

use mp_config::{EigensolverSettings, LinearSolverSettings};
use mp_model::{ModelPart, Variable};

use crate::dispatch::Parallelism;
use crate::error::SolverResult;

/// A linear solver built by the backend.
///
/// The solver that requested it keeps a handle, so a strategy that fails to
/// build or check can be rebuilt with the same linear solver.
pub trait LinearSolver: std::fmt::Debug {
    fn solver_type(&self) -> &str;
}

/// A solution strategy bound to one model part.
pub trait Strategy: std::fmt::Debug {
    /// Verify the model part carries everything the strategy needs.
    fn check(&self, model_part: &ModelPart) -> SolverResult<()>;

    /// Solve the current solution step in place.
    fn solve(&mut self, model_part: &mut ModelPart) -> SolverResult<()>;

    fn set_echo_level(&mut self, level: usize);

    /// Release backend resources. Must tolerate repeated calls.
    fn clear(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// One linear solve per step.
    Linear,
    /// Newton-Raphson iterations per step.
    NewtonRaphson,
    /// Generalized eigenvalue problem.
    Eigen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeKind {
    IncrementalUpdateStatic,
    Newmark,
    Bossak,
    EigenDynamic,
}

impl SchemeKind {
    /// Map a configured `scheme_type` of an implicit dynamic solver.
    pub fn dynamic_from_name(name: &str) -> Option<Self> {
        match name {
            "newmark" => Some(SchemeKind::Newmark),
            "bossak" => Some(SchemeKind::Bossak),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceSettings {
    pub relative_tolerance: f64,
    pub absolute_tolerance: f64,
    pub max_iteration: usize,
}

/// Everything a backend needs to know to build a strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategySpec {
    pub kind: StrategyKind,
    pub scheme: SchemeKind,
    pub parallelism: Parallelism,
    pub dofs: Vec<Variable>,
    pub compute_reactions: bool,
    pub reform_dofs_at_each_step: bool,
    pub calculate_solution_norm: bool,
    pub move_mesh_flag: bool,
    pub convergence: Option<ConvergenceSettings>,
    pub eigensolver: Option<EigensolverSettings>,
}

pub trait Backend: std::fmt::Debug {
    fn construct_linear_solver(
        &self,
        settings: &LinearSolverSettings,
    ) -> SolverResult<Arc<dyn LinearSolver>>;

    fn create_strategy(
        &self,
        spec: StrategySpec,
        linear_solver: Arc<dyn LinearSolver>,
        model_part: &ModelPart,
    ) -> SolverResult<Box<dyn Strategy>>;
}
