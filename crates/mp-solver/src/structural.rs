//! Structural mechanics solvers (static, implicit dynamic, eigenvalue).
//!
//! One type covers every structural variant the dispatcher can select; the
//! variant decides the strategy kind, time scheme, nodal variables and
//! history depth.

use core::fmt;
use std::path::Path;
use std::sync::Arc;

use mp_config::{Parameters, Schema, StructuralSolverSettings};
use mp_model::variables::{
    ACCELERATION_X, ACCELERATION_Y, ACCELERATION_Z, DISPLACEMENT_X, DISPLACEMENT_Y,
    DISPLACEMENT_Z, REACTION_X, REACTION_Y, REACTION_Z, ROTATION_X, ROTATION_Y, ROTATION_Z,
    VELOCITY_X, VELOCITY_Y, VELOCITY_Z,
};
use mp_model::{ImportSummary, Model, ModelPart, Variable};

use crate::backend::{
    Backend, ConvergenceSettings, LinearSolver, SchemeKind, StrategyKind, StrategySpec,
};
use crate::dispatch::Parallelism;
use crate::driver::{DriverState, SolutionStepDriver};
use crate::error::{SolverError, SolverResult};
use crate::handle::SolverHandle;
use crate::import::{finish_import, read_input};
use crate::non_negative;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralVariant {
    Static,
    ImplicitDynamic,
    Eigen,
    TrilinosStatic,
    TrilinosImplicitDynamic,
}

impl StructuralVariant {
    pub fn parallelism(self) -> Parallelism {
        match self {
            StructuralVariant::Static
            | StructuralVariant::ImplicitDynamic
            | StructuralVariant::Eigen => Parallelism::OpenMP,
            StructuralVariant::TrilinosStatic | StructuralVariant::TrilinosImplicitDynamic => {
                Parallelism::MPI
            }
        }
    }

    pub fn is_dynamic(self) -> bool {
        matches!(
            self,
            StructuralVariant::ImplicitDynamic | StructuralVariant::TrilinosImplicitDynamic
        )
    }

    pub fn minimum_buffer_size(self) -> usize {
        if self.is_dynamic() { 2 } else { 1 }
    }

    pub fn name(self) -> &'static str {
        match self {
            StructuralVariant::Static => "StructuralStatic",
            StructuralVariant::ImplicitDynamic => "StructuralImplicitDynamic",
            StructuralVariant::Eigen => "StructuralEigen",
            StructuralVariant::TrilinosStatic => "TrilinosStatic",
            StructuralVariant::TrilinosImplicitDynamic => "TrilinosImplicitDynamic",
        }
    }
}

impl fmt::Display for StructuralVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn select_strategy_kind(
    variant: StructuralVariant,
    analysis_type: &str,
) -> SolverResult<StrategyKind> {
    if variant == StructuralVariant::Eigen {
        return Ok(StrategyKind::Eigen);
    }
    match analysis_type {
        "linear" => Ok(StrategyKind::Linear),
        "non_linear" => Ok(StrategyKind::NewtonRaphson),
        other => Err(SolverError::UnsupportedConfiguration {
            field: "analysis_type",
            value: other.to_string(),
            alternatives: vec!["linear", "non_linear"],
        }),
    }
}

fn select_scheme(variant: StructuralVariant, scheme_type: &str) -> SolverResult<SchemeKind> {
    if variant == StructuralVariant::Eigen {
        return Ok(SchemeKind::EigenDynamic);
    }
    if !variant.is_dynamic() {
        return Ok(SchemeKind::IncrementalUpdateStatic);
    }
    SchemeKind::dynamic_from_name(scheme_type).ok_or_else(|| {
        SolverError::UnsupportedConfiguration {
            field: "scheme_type",
            value: scheme_type.to_string(),
            alternatives: vec!["newmark", "bossak"],
        }
    })
}

fn convergence_settings(
    settings: &StructuralSolverSettings,
) -> SolverResult<ConvergenceSettings> {
    let max_iteration = non_negative("max_iteration", settings.max_iteration)?;
    let (relative_tolerance, absolute_tolerance) = match settings.convergence_criterion.as_str() {
        "displacement_criterion" => (
            settings.displacement_relative_tolerance,
            settings.displacement_absolute_tolerance,
        ),
        "residual_criterion" => (
            settings.residual_relative_tolerance,
            settings.residual_absolute_tolerance,
        ),
        other => {
            return Err(SolverError::UnsupportedConfiguration {
                field: "convergence_criterion",
                value: other.to_string(),
                alternatives: vec!["displacement_criterion", "residual_criterion"],
            });
        }
    };
    Ok(ConvergenceSettings {
        relative_tolerance,
        absolute_tolerance,
        max_iteration,
    })
}

#[derive(Debug)]
pub struct StructuralSolver {
    variant: StructuralVariant,
    model_part_name: String,
    settings: StructuralSolverSettings,
    kind: StrategyKind,
    scheme: SchemeKind,
    convergence: Option<ConvergenceSettings>,
    backend: Arc<dyn Backend>,
    linear_solver: Arc<dyn LinearSolver>,
    driver: SolutionStepDriver,
}

impl StructuralSolver {
    /// Bind a structural solver to an existing root model part.
    ///
    /// The model part's `DOMAIN_SIZE` is set from the settings.
    pub fn new(
        model: &mut Model,
        model_part_name: &str,
        settings: &Parameters,
        variant: StructuralVariant,
        backend: Arc<dyn Backend>,
    ) -> SolverResult<Self> {
        let settings = StructuralSolverSettings::from_parameters(settings)?;
        if !model.is_root_model_part(model_part_name) {
            return Err(SolverError::Type {
                expected: "a root model part registered in the model".to_string(),
                got: format!("'{model_part_name}'"),
            });
        }

        let kind = select_strategy_kind(variant, &settings.analysis_type)?;
        let scheme = select_scheme(variant, &settings.scheme_type)?;
        let convergence = match kind {
            StrategyKind::NewtonRaphson => Some(convergence_settings(&settings)?),
            StrategyKind::Linear | StrategyKind::Eigen => None,
        };
        let domain_size = non_negative("domain_size", settings.domain_size)?;
        let echo_level = non_negative("echo_level", settings.echo_level)?;

        model.get_model_part_mut(model_part_name)?.process_info.domain_size = domain_size;
        let linear_solver = backend.construct_linear_solver(&settings.linear_solver_settings)?;

        tracing::info!(
            variant = %variant,
            model_part = model_part_name,
            "construction of structural solver finished"
        );
        Ok(Self {
            variant,
            model_part_name: model_part_name.to_string(),
            settings,
            kind,
            scheme,
            convergence,
            backend,
            linear_solver,
            driver: SolutionStepDriver::new(echo_level),
        })
    }

    pub fn variant(&self) -> StructuralVariant {
        self.variant
    }

    pub fn settings(&self) -> &StructuralSolverSettings {
        &self.settings
    }

    fn model_part_mut<'m>(&self, model: &'m mut Model) -> SolverResult<&'m mut ModelPart> {
        Ok(model.get_model_part_mut(&self.model_part_name)?)
    }

    fn solution_step_variables(&self) -> Vec<Variable> {
        let mut variables = vec![
            DISPLACEMENT_X,
            DISPLACEMENT_Y,
            DISPLACEMENT_Z,
            REACTION_X,
            REACTION_Y,
            REACTION_Z,
        ];
        if self.settings.rotation_dofs {
            variables.extend([ROTATION_X, ROTATION_Y, ROTATION_Z]);
        }
        if self.variant.is_dynamic() {
            variables.extend([
                VELOCITY_X,
                VELOCITY_Y,
                VELOCITY_Z,
                ACCELERATION_X,
                ACCELERATION_Y,
                ACCELERATION_Z,
            ]);
        }
        variables
    }

    fn dofs(&self, domain_size: usize) -> Vec<Variable> {
        let mut dofs = vec![DISPLACEMENT_X, DISPLACEMENT_Y];
        if domain_size == 3 {
            dofs.push(DISPLACEMENT_Z);
        }
        if self.settings.rotation_dofs {
            if domain_size == 3 {
                dofs.extend([ROTATION_X, ROTATION_Y]);
            }
            dofs.push(ROTATION_Z);
        }
        dofs
    }

    fn strategy_spec(&self, domain_size: usize) -> StrategySpec {
        StrategySpec {
            kind: self.kind,
            scheme: self.scheme,
            parallelism: self.variant.parallelism(),
            dofs: self.dofs(domain_size),
            compute_reactions: self.settings.compute_reactions,
            reform_dofs_at_each_step: self.settings.reform_dofs_at_each_step,
            calculate_solution_norm: false,
            move_mesh_flag: self.settings.move_mesh_flag,
            convergence: self.convergence,
            eigensolver: (self.kind == StrategyKind::Eigen)
                .then(|| self.settings.eigensolver_settings.clone()),
        }
    }
}

impl SolverHandle for StructuralSolver {
    fn model_part_name(&self) -> &str {
        &self.model_part_name
    }

    fn minimum_buffer_size(&self) -> usize {
        self.variant.minimum_buffer_size()
    }

    fn state(&self) -> DriverState {
        self.driver.state()
    }

    fn add_variables(&mut self, model: &mut Model) -> SolverResult<()> {
        self.driver.variables_added()?;
        let variables = self.solution_step_variables();
        let model_part = self.model_part_mut(model)?;
        for variable in variables {
            model_part.add_nodal_solution_step_variable(variable);
        }
        Ok(())
    }

    fn import_model_part(
        &mut self,
        model: &mut Model,
        base_dir: &Path,
    ) -> SolverResult<ImportSummary> {
        self.driver.begin_import()?;
        let minimum_buffer_size = self.minimum_buffer_size();
        let model_part = self.model_part_mut(model)?;
        let summary = read_input(model_part, &self.settings.model_import_settings, base_dir)?;
        finish_import(model_part, None, minimum_buffer_size)?;
        self.driver.imported();
        tracing::info!(
            nodes = summary.nodes,
            elements = summary.elements,
            variant = %self.variant,
            "model reading finished"
        );
        Ok(summary)
    }

    fn add_dofs(&mut self, model: &mut Model) -> SolverResult<()> {
        self.driver.dofs_added()?;
        let model_part = self.model_part_mut(model)?;
        for dof in self.dofs(model_part.process_info.domain_size) {
            model_part.add_dof(dof)?;
        }
        Ok(())
    }

    fn initialize(&mut self, model: &mut Model) -> SolverResult<()> {
        let model_part = model.get_model_part(&self.model_part_name)?;
        let spec = self.strategy_spec(model_part.process_info.domain_size);
        let backend = Arc::clone(&self.backend);
        let linear_solver = Arc::clone(&self.linear_solver);
        self.driver.initialize(model_part, || {
            backend.create_strategy(spec, linear_solver, model_part)
        })?;
        tracing::info!(variant = %self.variant, "solver initialized");
        Ok(())
    }

    fn check(&self, model: &Model) -> SolverResult<()> {
        self.driver.check(model.get_model_part(&self.model_part_name)?)
    }

    fn solve_solution_step(&mut self, model: &mut Model) -> SolverResult<()> {
        let model_part = model.get_model_part_mut(&self.model_part_name)?;
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

    fn solver(
        variant: StructuralVariant,
        settings: serde_json::Value,
    ) -> SolverResult<StructuralSolver> {
        let mut model = Model::new();
        model.create_model_part("Structure").unwrap();
        StructuralSolver::new(
            &mut model,
            "Structure",
            &Parameters::from_value(settings).unwrap(),
            variant,
            Arc::new(DryRunBackend),
        )
    }

    #[test]
    fn buffer_depth_follows_variant() {
        assert_eq!(StructuralVariant::Static.minimum_buffer_size(), 1);
        assert_eq!(StructuralVariant::Eigen.minimum_buffer_size(), 1);
        assert_eq!(StructuralVariant::ImplicitDynamic.minimum_buffer_size(), 2);
        assert_eq!(StructuralVariant::TrilinosImplicitDynamic.minimum_buffer_size(), 2);
    }

    #[test]
    fn unknown_scheme_names_alternatives() {
        let err = solver(
            StructuralVariant::ImplicitDynamic,
            json!({"solver_type": "Dynamic", "scheme_type": "euler"}),
        )
        .unwrap_err();
        match err {
            SolverError::UnsupportedConfiguration {
                field,
                alternatives,
                ..
            } => {
                assert_eq!(field, "scheme_type");
                assert_eq!(alternatives, vec!["newmark", "bossak"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn linear_static_has_no_convergence_settings() {
        let s = solver(
            StructuralVariant::Static,
            json!({"analysis_type": "linear", "domain_size": 3}),
        )
        .unwrap();
        let spec = s.strategy_spec(3);
        assert_eq!(spec.kind, StrategyKind::Linear);
        assert!(spec.convergence.is_none());
        assert_eq!(spec.dofs, vec![DISPLACEMENT_X, DISPLACEMENT_Y, DISPLACEMENT_Z]);
    }

    #[test]
    fn eigen_carries_eigensolver_settings() {
        let s = solver(
            StructuralVariant::Eigen,
            json!({"solver_type": "EigenValue", "eigensolver_settings": {"number_of_eigenvalues": 5}}),
        )
        .unwrap();
        let spec = s.strategy_spec(2);
        assert_eq!(spec.kind, StrategyKind::Eigen);
        assert_eq!(spec.scheme, SchemeKind::EigenDynamic);
        assert_eq!(spec.eigensolver.unwrap().number_of_eigenvalues, 5);
    }

    #[test]
    fn unregistered_model_part_is_rejected() {
        let mut model = Model::new();
        let err = StructuralSolver::new(
            &mut model,
            "Structure",
            &Parameters::new(),
            StructuralVariant::Static,
            Arc::new(DryRunBackend),
        )
        .unwrap_err();
        assert!(matches!(err, SolverError::Type { .. }));
    }
}
