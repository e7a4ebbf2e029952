//! A backend that walks the full lifecycle without doing numerics.
//!
//! Strategies built here check the dofs they were asked to solve for and log
//! each solve. The CLI uses this backend to validate a project end to end.

use std::sync::Arc;

use mp_config::LinearSolverSettings;
use mp_model::ModelPart;

use crate::backend::{Backend, LinearSolver, Strategy, StrategySpec};
use crate::error::{SolverError, SolverResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunBackend;

#[derive(Debug)]
pub struct DryRunLinearSolver {
    solver_type: String,
}

impl LinearSolver for DryRunLinearSolver {
    fn solver_type(&self) -> &str {
        &self.solver_type
    }
}

#[derive(Debug)]
pub struct DryRunStrategy {
    spec: StrategySpec,
    linear_solver: Option<Arc<dyn LinearSolver>>,
    echo_level: usize,
    steps: usize,
}

impl DryRunStrategy {
    pub fn spec(&self) -> &StrategySpec {
        &self.spec
    }

    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl Backend for DryRunBackend {
    fn construct_linear_solver(
        &self,
        settings: &LinearSolverSettings,
    ) -> SolverResult<Arc<dyn LinearSolver>> {
        tracing::debug!(solver_type = %settings.solver_type, "dry-run linear solver");
        Ok(Arc::new(DryRunLinearSolver {
            solver_type: settings.solver_type.clone(),
        }))
    }

    fn create_strategy(
        &self,
        spec: StrategySpec,
        linear_solver: Arc<dyn LinearSolver>,
        model_part: &ModelPart,
    ) -> SolverResult<Box<dyn Strategy>> {
        tracing::debug!(
            kind = ?spec.kind,
            scheme = ?spec.scheme,
            linear_solver = linear_solver.solver_type(),
            model_part = model_part.name(),
            "dry-run strategy"
        );
        Ok(Box::new(DryRunStrategy {
            spec,
            linear_solver: Some(linear_solver),
            echo_level: 0,
            steps: 0,
        }))
    }
}

impl Strategy for DryRunStrategy {
    fn check(&self, model_part: &ModelPart) -> SolverResult<()> {
        for node in model_part.nodes() {
            if let Some(missing) = self.spec.dofs.iter().find(|&&dof| !node.has_dof(dof)) {
                return Err(SolverError::Backend {
                    what: format!(
                        "node {} of '{}' has no {} dof",
                        node.id,
                        model_part.name(),
                        missing
                    ),
                });
            }
        }
        Ok(())
    }

    fn solve(&mut self, model_part: &mut ModelPart) -> SolverResult<()> {
        if self.linear_solver.is_none() {
            return Err(SolverError::Backend {
                what: "strategy was cleared".to_string(),
            });
        }
        self.steps += 1;
        if self.echo_level > 0 {
            tracing::info!(
                model_part = model_part.name(),
                time = model_part.process_info.time,
                step = model_part.process_info.step,
                "dry-run solve"
            );
        }
        Ok(())
    }

    fn set_echo_level(&mut self, level: usize) {
        self.echo_level = level;
    }

    fn clear(&mut self) {
        self.linear_solver = None;
    }
}
