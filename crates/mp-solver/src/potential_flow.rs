//! Potential-flow (Laplacian) solver.

use std::path::Path;
use std::sync::Arc;

use mp_config::{Parameters, PotentialFlowSettings, Schema};
use mp_model::variables::{
    AUXILIARY_VELOCITY_POTENTIAL, DISTANCE, KUTTA, LOWER_SURFACE, POTENTIAL_JUMP, PRESSURE_LOWER,
    TEMPERATURE, TRAILING_EDGE, UPPER_SURFACE, VELOCITY_INFINITY, VELOCITY_LOWER,
    VELOCITY_POTENTIAL, WAKE,
};
use mp_model::{ImportSummary, Model, ModelPart, Variable};

use crate::backend::{Backend, LinearSolver, SchemeKind, StrategyKind, StrategySpec};
use crate::dispatch::Parallelism;
use crate::driver::{DriverState, SolutionStepDriver};
use crate::error::{SolverError, SolverResult};
use crate::handle::SolverHandle;
use crate::import::{finish_import, potential_flow_replacement, read_input};
use crate::non_negative;

const SOLUTION_STEP_VARIABLES: &[Variable] = &[
    VELOCITY_POTENTIAL,
    AUXILIARY_VELOCITY_POTENTIAL,
    VELOCITY_INFINITY,
    VELOCITY_LOWER,
    PRESSURE_LOWER,
    POTENTIAL_JUMP,
    WAKE,
    KUTTA,
    TRAILING_EDGE,
    UPPER_SURFACE,
    LOWER_SURFACE,
    DISTANCE,
    TEMPERATURE,
];

const DOFS: &[Variable] = &[VELOCITY_POTENTIAL, AUXILIARY_VELOCITY_POTENTIAL];

#[derive(Debug)]
pub struct PotentialFlowSolver {
    settings: PotentialFlowSettings,
    backend: Arc<dyn Backend>,
    linear_solver: Arc<dyn LinearSolver>,
    driver: SolutionStepDriver,
}

impl PotentialFlowSolver {
    pub const MINIMUM_BUFFER_SIZE: usize = 2;

    /// Merge `settings` with the defaults, bind to the configured model part
    /// (created if absent) and build the linear solver.
    ///
    /// `DOMAIN_SIZE` is only written when the model part is created here or
    /// has none yet.
    pub fn new(
        model: &mut Model,
        settings: &Parameters,
        backend: Arc<dyn Backend>,
    ) -> SolverResult<Self> {
        let settings = PotentialFlowSettings::from_parameters(settings)?;

        let domain_size = non_negative("domain_size", settings.domain_size)?;
        if !model.has_model_part(&settings.model_part_name) {
            model
                .create_model_part(&settings.model_part_name)?
                .process_info
                .domain_size = domain_size;
        } else if model.is_root_model_part(&settings.model_part_name) {
            let info = &mut model
                .get_model_part_mut(&settings.model_part_name)?
                .process_info;
            if info.domain_size == 0 {
                info.domain_size = domain_size;
            }
        } else {
            return Err(SolverError::Type {
                expected: "a root model part".to_string(),
                got: format!("sub-model part '{}'", settings.model_part_name),
            });
        }

        let linear_solver = backend.construct_linear_solver(&settings.linear_solver_settings)?;
        let echo_level = non_negative("echo_level", settings.echo_level)?;

        tracing::info!(
            model_part = %settings.model_part_name,
            "construction of potential flow solver finished"
        );
        Ok(Self {
            settings,
            backend,
            linear_solver,
            driver: SolutionStepDriver::new(echo_level),
        })
    }

    pub fn settings(&self) -> &PotentialFlowSettings {
        &self.settings
    }

    fn model_part<'m>(&self, model: &'m Model) -> SolverResult<&'m ModelPart> {
        Ok(model.get_model_part(&self.settings.model_part_name)?)
    }

    fn model_part_mut<'m>(&self, model: &'m mut Model) -> SolverResult<&'m mut ModelPart> {
        Ok(model.get_model_part_mut(&self.settings.model_part_name)?)
    }

    fn strategy_spec(&self) -> StrategySpec {
        StrategySpec {
            kind: StrategyKind::Linear,
            scheme: SchemeKind::IncrementalUpdateStatic,
            parallelism: Parallelism::OpenMP,
            dofs: DOFS.to_vec(),
            compute_reactions: self.settings.compute_reactions,
            reform_dofs_at_each_step: self.settings.reform_dofs_at_each_step,
            calculate_solution_norm: self.settings.calculate_solution_norm,
            move_mesh_flag: false,
            convergence: None,
            eigensolver: None,
        }
    }
}

impl SolverHandle for PotentialFlowSolver {
    fn model_part_name(&self) -> &str {
        &self.settings.model_part_name
    }

    fn minimum_buffer_size(&self) -> usize {
        Self::MINIMUM_BUFFER_SIZE
    }

    fn state(&self) -> DriverState {
        self.driver.state()
    }

    fn add_variables(&mut self, model: &mut Model) -> SolverResult<()> {
        self.driver.variables_added()?;
        let model_part = self.model_part_mut(model)?;
        for &variable in SOLUTION_STEP_VARIABLES {
            model_part.add_nodal_solution_step_variable(variable);
        }
        tracing::debug!(count = SOLUTION_STEP_VARIABLES.len(), "variables added");
        Ok(())
    }

    fn import_model_part(
        &mut self,
        model: &mut Model,
        base_dir: &Path,
    ) -> SolverResult<ImportSummary> {
        self.driver.begin_import()?;
        let import_settings = self.settings.model_import_settings.clone();
        let configured = self.settings.element_replace_settings.clone();

        let model_part = self.model_part_mut(model)?;
        let replacement =
            potential_flow_replacement(model_part.process_info.domain_size, &configured)?;
        let summary = read_input(model_part, &import_settings, base_dir)?;
        finish_import(model_part, Some(&replacement), Self::MINIMUM_BUFFER_SIZE)?;

        self.settings.element_replace_settings = replacement;
        self.driver.imported();
        tracing::info!(
            nodes = summary.nodes,
            elements = summary.elements,
            conditions = summary.conditions,
            "model reading finished"
        );
        Ok(summary)
    }

    fn add_dofs(&mut self, model: &mut Model) -> SolverResult<()> {
        self.driver.dofs_added()?;
        let model_part = self.model_part_mut(model)?;
        for &dof in DOFS {
            model_part.add_dof(dof)?;
        }
        Ok(())
    }

    fn initialize(&mut self, model: &mut Model) -> SolverResult<()> {
        let spec = self.strategy_spec();
        let backend = Arc::clone(&self.backend);
        let model_part = model.get_model_part(&self.settings.model_part_name)?;
        let linear_solver = Arc::clone(&self.linear_solver);
        self.driver.initialize(model_part, || {
            backend.create_strategy(spec, linear_solver, model_part)
        })?;
        tracing::info!(model_part = model_part.name(), "solver initialized");
        Ok(())
    }

    fn check(&self, model: &Model) -> SolverResult<()> {
        self.driver.check(self.model_part(model)?)
    }

    fn solve_solution_step(&mut self, model: &mut Model) -> SolverResult<()> {
        let model_part = model.get_model_part_mut(&self.settings.model_part_name)?;
        self.driver.solve_solution_step(model_part)
    }

    fn set_echo_level(&mut self, level: usize) {
        self.driver.set_echo_level(level);
    }

    fn clear(&mut self) {
        self.driver.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dry_run::DryRunBackend;
    use serde_json::json;

    fn params(value: serde_json::Value) -> Parameters {
        Parameters::from_value(value).unwrap()
    }

    fn backend() -> Arc<dyn Backend> {
        Arc::new(DryRunBackend)
    }

    #[test]
    fn construction_creates_model_part_with_domain_size() {
        let mut model = Model::new();
        let solver = PotentialFlowSolver::new(
            &mut model,
            &params(json!({"model_part_name": "Main", "domain_size": 3})),
            backend(),
        )
        .unwrap();
        assert_eq!(solver.settings().echo_level, 1);
        assert_eq!(
            model.get_model_part("Main").unwrap().process_info.domain_size,
            3
        );
    }

    #[test]
    fn existing_model_part_keeps_its_domain_size() {
        let mut model = Model::new();
        model.create_model_part("Main").unwrap().process_info.domain_size = 2;
        PotentialFlowSolver::new(
            &mut model,
            &params(json!({"model_part_name": "Main", "domain_size": 3})),
            backend(),
        )
        .unwrap();
        assert_eq!(
            model.get_model_part("Main").unwrap().process_info.domain_size,
            2
        );
    }

    #[test]
    fn existing_model_part_without_domain_size_takes_the_setting() {
        let mut model = Model::new();
        model.create_model_part("Main").unwrap();
        PotentialFlowSolver::new(
            &mut model,
            &params(json!({"model_part_name": "Main", "domain_size": 3})),
            backend(),
        )
        .unwrap();
        assert_eq!(
            model.get_model_part("Main").unwrap().process_info.domain_size,
            3
        );
    }

    #[test]
    fn bad_domain_size_fails_before_reading_the_mesh() {
        let mut model = Model::new();
        model.create_model_part("Main").unwrap().process_info.domain_size = 1;
        let mut solver = PotentialFlowSolver::new(
            &mut model,
            &params(json!({
                "model_part_name": "Main",
                "model_import_settings": {"input_type": "mdpa", "input_filename": "missing"}
            })),
            backend(),
        )
        .unwrap();
        solver.add_variables(&mut model).unwrap();

        let base_dir = std::env::temp_dir();
        for _ in 0..2 {
            let err = solver.import_model_part(&mut model, &base_dir).unwrap_err();
            assert!(matches!(err, SolverError::DomainSize { domain_size: 1 }));
        }
        assert_eq!(model.get_model_part("Main").unwrap().number_of_nodes(), 0);
    }

    #[test]
    fn unknown_setting_fails_construction() {
        let mut model = Model::new();
        let err = PotentialFlowSolver::new(
            &mut model,
            &params(json!({"model_part_name": "Main", "no_such_key": 1})),
            backend(),
        )
        .unwrap_err();
        assert!(matches!(err, SolverError::Config(_)));
    }

    #[test]
    fn dofs_require_variables_first() {
        let mut model = Model::new();
        let mut solver = PotentialFlowSolver::new(
            &mut model,
            &params(json!({"model_part_name": "Main"})),
            backend(),
        )
        .unwrap();
        let err = solver.add_dofs(&mut model).unwrap_err();
        assert!(matches!(err, SolverError::Lifecycle { .. }));
    }
}
