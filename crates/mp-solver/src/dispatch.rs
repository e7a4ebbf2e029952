//! Solver selection from project parameters.
//!
//! `(parallel_type, solver_type, time_integration_method)` resolves through a
//! closed table to one solver variant. Every string is parsed into an enum
//! first, so an unknown value is reported with its legal alternatives before
//! the table is consulted.

use core::fmt;
use std::sync::Arc;

use mp_config::parameters::ValueKind;
use mp_config::{ConfigError, Parameters, ProblemData, Schema};
use mp_model::Model;

use crate::backend::Backend;
use crate::error::{SolverError, SolverResult};
use crate::handle::SolverHandle;
use crate::potential_flow::PotentialFlowSolver;
use crate::structural::{StructuralSolver, StructuralVariant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parallelism {
    OpenMP,
    MPI,
}

impl Parallelism {
    pub const NAMES: &'static [&'static str] = &["OpenMP", "MPI"];

    pub fn parse(value: &str) -> SolverResult<Self> {
        match value {
            "OpenMP" => Ok(Parallelism::OpenMP),
            "MPI" => Ok(Parallelism::MPI),
            other => Err(unsupported("parallel_type", other, Self::NAMES)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverType {
    Static,
    Dynamic,
    EigenValue,
    PotentialFlow,
}

impl SolverType {
    pub const NAMES: &'static [&'static str] =
        &["Static", "Dynamic", "EigenValue", "potential_flow_solver"];

    pub fn parse(value: &str) -> SolverResult<Self> {
        match value {
            "Static" => Ok(SolverType::Static),
            "Dynamic" => Ok(SolverType::Dynamic),
            "EigenValue" => Ok(SolverType::EigenValue),
            "potential_flow_solver" => Ok(SolverType::PotentialFlow),
            other => Err(unsupported("solver_type", other, Self::NAMES)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SolverType::Static => "Static",
            SolverType::Dynamic => "Dynamic",
            SolverType::EigenValue => "EigenValue",
            SolverType::PotentialFlow => "potential_flow_solver",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeIntegrationMethod {
    Implicit,
}

impl TimeIntegrationMethod {
    pub const NAMES: &'static [&'static str] = &["Implicit"];

    pub fn parse(value: &str) -> SolverResult<Self> {
        match value {
            "Implicit" => Ok(TimeIntegrationMethod::Implicit),
            other => Err(unsupported("time_integration_method", other, Self::NAMES)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverVariant {
    PotentialFlow,
    Structural(StructuralVariant),
}

impl fmt::Display for SolverVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverVariant::PotentialFlow => f.write_str("PotentialFlow"),
            SolverVariant::Structural(variant) => fmt::Display::fmt(variant, f),
        }
    }
}

fn unsupported(field: &'static str, value: &str, alternatives: &[&'static str]) -> SolverError {
    SolverError::UnsupportedConfiguration {
        field,
        value: value.to_string(),
        alternatives: alternatives.to_vec(),
    }
}

/// The parsed inputs of the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchKey {
    pub parallelism: Parallelism,
    pub solver_type: SolverType,
    /// Only read when `solver_type` is `Dynamic`.
    pub time_integration_method: Option<TimeIntegrationMethod>,
}

fn nested(project: &Parameters, key: &str) -> SolverResult<Parameters> {
    match project.as_value().get(key) {
        Some(value) if value.is_object() => Ok(project.sub(key)?),
        Some(value) => Err(SolverError::Type {
            expected: format!("{key} to be a parameter tree"),
            got: ValueKind::of(value).name().to_string(),
        }),
        None => Err(SolverError::Type {
            expected: format!("{key} to be a parameter tree"),
            got: "nothing".to_string(),
        }),
    }
}

impl DispatchKey {
    /// Read the dispatch inputs from a full project-parameters tree.
    pub fn from_parameters(project: &Parameters) -> SolverResult<Self> {
        let problem_data = nested(project, "problem_data")?;
        let solver_settings = nested(project, "solver_settings")?;
        Self::from_sections(&problem_data, &solver_settings)
    }

    fn from_sections(
        problem_data: &Parameters,
        solver_settings: &Parameters,
    ) -> SolverResult<Self> {
        let problem_data = ProblemData::from_parameters(problem_data)?;
        let parallelism = Parallelism::parse(&problem_data.parallel_type)?;
        let solver_type = SolverType::parse(solver_settings.get_string("solver_type")?)?;
        let time_integration_method = match solver_type {
            SolverType::Dynamic => {
                let method = solver_settings.get_string("time_integration_method").map_err(
                    |_| ConfigError::Missing {
                        key: "solver_settings.time_integration_method".to_string(),
                        reason: "required when solver_type is Dynamic".to_string(),
                    },
                )?;
                Some(TimeIntegrationMethod::parse(method)?)
            }
            SolverType::Static | SolverType::EigenValue | SolverType::PotentialFlow => None,
        };

        Ok(Self {
            parallelism,
            solver_type,
            time_integration_method,
        })
    }
}

pub fn resolve(key: &DispatchKey) -> SolverResult<SolverVariant> {
    use Parallelism::{MPI, OpenMP};
    use SolverType::{Dynamic, EigenValue, PotentialFlow, Static};
    use TimeIntegrationMethod::Implicit;

    let variant = match (key.parallelism, key.solver_type, key.time_integration_method) {
        (OpenMP, Static, _) => SolverVariant::Structural(StructuralVariant::Static),
        (OpenMP, Dynamic, Some(Implicit)) => {
            SolverVariant::Structural(StructuralVariant::ImplicitDynamic)
        }
        (OpenMP, EigenValue, _) => SolverVariant::Structural(StructuralVariant::Eigen),
        (OpenMP, PotentialFlow, _) => SolverVariant::PotentialFlow,
        (MPI, Static, _) => SolverVariant::Structural(StructuralVariant::TrilinosStatic),
        (MPI, Dynamic, Some(Implicit)) => {
            SolverVariant::Structural(StructuralVariant::TrilinosImplicitDynamic)
        }
        (MPI, solver_type @ (EigenValue | PotentialFlow), _) => {
            return Err(unsupported(
                "solver_type",
                solver_type.name(),
                &["Static", "Dynamic"],
            ));
        }
        (_, Dynamic, None) => {
            return Err(SolverError::Config(ConfigError::Missing {
                key: "solver_settings.time_integration_method".to_string(),
                reason: "required when solver_type is Dynamic".to_string(),
            }));
        }
    };
    Ok(variant)
}

/// Select and construct the solver for `project`, bound to the root model
/// part `model_part_name`.
///
/// The model part must already be registered in `model`; its name overrides
/// `solver_settings.model_part_name`. Both structural preconditions (nested
/// sections, root model part) are checked before any setting is parsed.
pub fn create_solver(
    model: &mut Model,
    model_part_name: &str,
    project: &Parameters,
    backend: Arc<dyn Backend>,
) -> SolverResult<Box<dyn SolverHandle>> {
    let problem_data = nested(project, "problem_data")?;
    let mut solver_settings = nested(project, "solver_settings")?;
    if !model.is_root_model_part(model_part_name) {
        let got = if model.has_model_part(model_part_name) {
            format!("sub-model part '{model_part_name}'")
        } else {
            format!("unregistered model part '{model_part_name}'")
        };
        return Err(SolverError::Type {
            expected: "a root model part registered in the model".to_string(),
            got,
        });
    }
    let variant = resolve(&DispatchKey::from_sections(&problem_data, &solver_settings)?)?;

    if let Ok(configured) = solver_settings.get_string("model_part_name")
        && configured != model_part_name
    {
        tracing::warn!(
            configured,
            model_part = model_part_name,
            "solver_settings.model_part_name overridden"
        );
    }
    solver_settings.set_value("model_part_name", model_part_name);

    tracing::info!(%variant, model_part = model_part_name, "solver selected");
    let solver: Box<dyn SolverHandle> = match variant {
        SolverVariant::PotentialFlow => {
            Box::new(PotentialFlowSolver::new(model, &solver_settings, backend)?)
        }
        SolverVariant::Structural(structural) => Box::new(StructuralSolver::new(
            model,
            model_part_name,
            &solver_settings,
            structural,
            backend,
        )?),
    };
    Ok(solver)
}
