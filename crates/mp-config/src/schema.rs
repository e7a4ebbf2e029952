//! Typed settings schemas with static defaults.
//!
//! Every schema carries its defaults as a literal document. A user
//! `Parameters` tree is merged against it (see [`Schema::merge`]) and then
//! deserialized into the typed struct, so downstream code never looks up a
//! key that might be missing.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::parameters::Parameters;
use crate::validate::{
    ConfigError, ConfigResult, require_finite, require_non_empty, require_non_negative_int,
    require_positive_finite,
};

pub trait Schema: DeserializeOwned {
    /// Name used in error messages.
    const NAME: &'static str;

    /// Nested sections that take missing defaults but accept keys the
    /// defaults do not list (backend-specific options).
    const OPEN_SECTIONS: &'static [&'static str] = &[];

    fn defaults() -> Parameters;

    /// Range and presence checks run after deserialization.
    fn check(&self) -> ConfigResult<()>;

    /// Merge `user` against the defaults without discarding user values.
    fn merge(user: &Parameters) -> ConfigResult<Parameters> {
        let defaults = Self::defaults();
        let mut merged = user.clone();
        merged.validate_and_assign_defaults(&defaults)?;

        for key in defaults.keys() {
            if !defaults.is_sub_parameter(key) {
                continue;
            }
            let section_defaults = defaults.sub(key)?;
            let mut section = merged.sub(key)?;
            if Self::OPEN_SECTIONS.contains(&key) {
                section.recursively_add_missing_parameters(&section_defaults);
            } else {
                section
                    .recursively_validate_and_assign_defaults(&section_defaults)
                    .map_err(|e| e.in_section(key))?;
            }
            merged.set_sub(key, section);
        }

        Ok(merged)
    }

    /// Merge, deserialize and check.
    fn from_parameters(user: &Parameters) -> ConfigResult<Self> {
        let merged = Self::merge(user)?;
        let typed: Self =
            serde_json::from_value(merged.into_value()).map_err(|e| ConfigError::Parse {
                message: format!("{}: {}", Self::NAME, e),
            })?;
        typed.check()?;
        Ok(typed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelImportSettings {
    pub input_type: String,
    pub input_filename: String,
    /// Fail on inverted elements instead of repairing them.
    pub throw_orientation_errors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementReplaceSettings {
    pub element_name: String,
    pub condition_name: String,
}

impl ElementReplaceSettings {
    pub fn new(element_name: &str, condition_name: &str) -> Self {
        Self {
            element_name: element_name.to_string(),
            condition_name: condition_name.to_string(),
        }
    }
}

/// Settings handed to the linear-solver factory.
///
/// Only `solver_type` is interpreted here; the remaining keys belong to the
/// backend that builds the solver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearSolverSettings {
    pub solver_type: String,
    #[serde(flatten)]
    pub options: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EigensolverSettings {
    pub solver_type: String,
    pub number_of_eigenvalues: i64,
    #[serde(flatten)]
    pub options: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProblemData {
    pub problem_name: String,
    pub parallel_type: String,
    pub echo_level: i64,
    pub start_time: f64,
    pub end_time: f64,
    pub time_step: f64,
}

impl Schema for ProblemData {
    const NAME: &'static str = "problem_data";

    fn defaults() -> Parameters {
        Parameters::literal(json!({
            "problem_name": "unnamed",
            "parallel_type": "OpenMP",
            "echo_level": 0,
            "start_time": 0.0,
            "end_time": 1.0,
            "time_step": 1.0
        }))
    }

    fn check(&self) -> ConfigResult<()> {
        require_non_negative_int("problem_data.echo_level", self.echo_level)?;
        require_finite("problem_data.start_time", self.start_time)?;
        require_finite("problem_data.end_time", self.end_time)?;
        require_positive_finite("problem_data.time_step", self.time_step)?;
        if self.end_time < self.start_time {
            return Err(ConfigError::InvalidValue {
                field: "problem_data.end_time".to_string(),
                value: self.end_time.to_string(),
                reason: format!("must not precede start_time ({})", self.start_time),
            });
        }
        Ok(())
    }
}

/// Settings of the potential-flow (Laplacian) solver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PotentialFlowSettings {
    pub solver_type: String,
    pub domain_size: i64,
    pub model_part_name: String,
    pub echo_level: i64,
    pub relative_tolerance: f64,
    pub absolute_tolerance: f64,
    pub maximum_iterations: i64,
    pub compute_reactions: bool,
    pub reform_dofs_at_each_step: bool,
    pub calculate_solution_norm: bool,
    pub volume_model_part_name: String,
    pub skin_parts: Vec<String>,
    pub no_skin_parts: Vec<String>,
    pub model_import_settings: ModelImportSettings,
    pub element_replace_settings: ElementReplaceSettings,
    pub linear_solver_settings: LinearSolverSettings,
}

impl Schema for PotentialFlowSettings {
    const NAME: &'static str = "potential_flow_solver";
    const OPEN_SECTIONS: &'static [&'static str] = &["linear_solver_settings"];

    fn defaults() -> Parameters {
        Parameters::literal(json!({
            "solver_type": "potential_flow_solver",
            "domain_size": 2,
            "model_part_name": "MainModelPart",
            "echo_level": 1,
            "relative_tolerance": 1e-5,
            "absolute_tolerance": 1e-9,
            "maximum_iterations": 1,
            "compute_reactions": false,
            "reform_dofs_at_each_step": false,
            "calculate_solution_norm": false,
            "volume_model_part_name": "volume_model_part",
            "skin_parts": [],
            "no_skin_parts": [],
            "model_import_settings": {
                "input_type": "mdpa",
                "input_filename": "unknown_name",
                "throw_orientation_errors": false
            },
            "element_replace_settings": {
                "element_name": "CompressiblePotentialFlowElement2D3N",
                "condition_name": "PotentialWallCondition2D2N"
            },
            "linear_solver_settings": {
                "solver_type": "AMGCL",
                "max_iteration": 400,
                "gmres_krylov_space_dimension": 100,
                "smoother_type": "ilu0",
                "coarsening_type": "ruge_stuben",
                "coarse_enough": 5000,
                "krylov_type": "lgmres",
                "tolerance": 1e-9,
                "verbosity": 3,
                "scaling": false
            }
        }))
    }

    fn check(&self) -> ConfigResult<()> {
        require_non_empty(
            "model_part_name",
            &self.model_part_name,
            "please specify a model_part name",
        )?;
        require_non_negative_int("domain_size", self.domain_size)?;
        require_non_negative_int("echo_level", self.echo_level)?;
        require_positive_finite("relative_tolerance", self.relative_tolerance)?;
        require_positive_finite("absolute_tolerance", self.absolute_tolerance)?;
        require_non_negative_int("maximum_iterations", self.maximum_iterations)?;
        require_non_empty(
            "linear_solver_settings.solver_type",
            &self.linear_solver_settings.solver_type,
            "a linear solver type is required",
        )?;
        Ok(())
    }
}

/// Settings shared by the structural solver variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructuralSolverSettings {
    pub solver_type: String,
    pub time_integration_method: String,
    pub scheme_type: String,
    pub analysis_type: String,
    pub domain_size: i64,
    pub model_part_name: String,
    pub echo_level: i64,
    pub rotation_dofs: bool,
    pub compute_reactions: bool,
    pub reform_dofs_at_each_step: bool,
    pub move_mesh_flag: bool,
    pub line_search: bool,
    pub convergence_criterion: String,
    pub displacement_relative_tolerance: f64,
    pub displacement_absolute_tolerance: f64,
    pub residual_relative_tolerance: f64,
    pub residual_absolute_tolerance: f64,
    pub max_iteration: i64,
    pub model_import_settings: ModelImportSettings,
    pub linear_solver_settings: LinearSolverSettings,
    pub eigensolver_settings: EigensolverSettings,
}

impl Schema for StructuralSolverSettings {
    const NAME: &'static str = "structural_solver";
    const OPEN_SECTIONS: &'static [&'static str] =
        &["linear_solver_settings", "eigensolver_settings"];

    fn defaults() -> Parameters {
        Parameters::literal(json!({
            "solver_type": "Static",
            "time_integration_method": "Implicit",
            "scheme_type": "newmark",
            "analysis_type": "non_linear",
            "domain_size": 2,
            "model_part_name": "Structure",
            "echo_level": 0,
            "rotation_dofs": false,
            "compute_reactions": true,
            "reform_dofs_at_each_step": false,
            "move_mesh_flag": true,
            "line_search": false,
            "convergence_criterion": "residual_criterion",
            "displacement_relative_tolerance": 1e-4,
            "displacement_absolute_tolerance": 1e-9,
            "residual_relative_tolerance": 1e-4,
            "residual_absolute_tolerance": 1e-9,
            "max_iteration": 10,
            "model_import_settings": {
                "input_type": "mdpa",
                "input_filename": "unknown_name",
                "throw_orientation_errors": false
            },
            "linear_solver_settings": {
                "solver_type": "sparse_lu"
            },
            "eigensolver_settings": {
                "solver_type": "eigen_eigensystem",
                "number_of_eigenvalues": 1,
                "max_iteration": 1000,
                "tolerance": 1e-6
            }
        }))
    }

    fn check(&self) -> ConfigResult<()> {
        require_non_empty(
            "model_part_name",
            &self.model_part_name,
            "please specify a model_part name",
        )?;
        require_non_negative_int("domain_size", self.domain_size)?;
        require_non_negative_int("echo_level", self.echo_level)?;
        require_positive_finite(
            "displacement_relative_tolerance",
            self.displacement_relative_tolerance,
        )?;
        require_positive_finite(
            "displacement_absolute_tolerance",
            self.displacement_absolute_tolerance,
        )?;
        require_positive_finite(
            "residual_relative_tolerance",
            self.residual_relative_tolerance,
        )?;
        require_positive_finite(
            "residual_absolute_tolerance",
            self.residual_absolute_tolerance,
        )?;
        if self.max_iteration < 1 {
            return Err(ConfigError::InvalidValue {
                field: "max_iteration".to_string(),
                value: self.max_iteration.to_string(),
                reason: "must be >= 1".to_string(),
            });
        }
        if self.eigensolver_settings.number_of_eigenvalues < 1 {
            return Err(ConfigError::InvalidValue {
                field: "eigensolver_settings.number_of_eigenvalues".to_string(),
                value: self.eigensolver_settings.number_of_eigenvalues.to_string(),
                reason: "must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Top level of a project-parameters document.
///
/// `solver_settings` stays untyped: which schema applies depends on the
/// solver the dispatcher selects.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectParameters {
    pub version: u32,
    pub problem_data: ProblemData,
    pub solver_settings: Parameters,
}

impl ProjectParameters {
    pub fn from_parameters(parameters: &Parameters) -> ConfigResult<Self> {
        let version = if parameters.has("version") {
            let v = parameters.get_int("version")?;
            u32::try_from(v).map_err(|_| ConfigError::InvalidValue {
                field: "version".to_string(),
                value: v.to_string(),
                reason: "must be a non-negative integer".to_string(),
            })?
        } else {
            crate::migrate::LATEST_VERSION
        };

        let problem_data = if parameters.has("problem_data") {
            parameters.sub("problem_data")?
        } else {
            Parameters::new()
        };
        let problem_data = ProblemData::from_parameters(&problem_data)?;
        let solver_settings = parameters.sub("solver_settings")?;

        Ok(Self {
            version,
            problem_data,
            solver_settings,
        })
    }
}
