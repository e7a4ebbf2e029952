//! Project loading, validation, and introspection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mp_config::{
    Parameters, PotentialFlowSettings, ProjectError, ProjectParameters, Schema,
    StructuralSolverSettings,
};
use mp_model::{Model, mdpa_path};
use mp_solver::{DispatchKey, DryRunBackend, SolverVariant, create_solver, resolve};

use crate::error::{AppError, AppResult};

/// A parsed and migrated project-parameters document.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    pub path: PathBuf,
    /// Directory relative input files are resolved against.
    pub base_dir: PathBuf,
    pub parameters: Parameters,
    pub project: ProjectParameters,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary {
    pub problem_name: String,
    pub variant: SolverVariant,
    pub model_part_name: String,
    pub input_type: String,
    pub input_filename: String,
    pub start_time: f64,
    pub end_time: f64,
    pub time_step: f64,
}

/// Load a project file (YAML or JSON by extension).
pub fn load_project(path: &Path) -> AppResult<LoadedProject> {
    let parameters = mp_config::load_parameters(path).map_err(|e| match e {
        ProjectError::Io(source) => AppError::ProjectFileRead {
            path: path.to_path_buf(),
            source,
        },
        other => other.into(),
    })?;
    let project = ProjectParameters::from_parameters(&parameters)?;

    let base_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tracing::debug!(path = %path.display(), version = project.version, "project loaded");
    Ok(LoadedProject {
        path: path.to_path_buf(),
        base_dir,
        parameters,
        project,
    })
}

pub fn select_variant(loaded: &LoadedProject) -> AppResult<SolverVariant> {
    Ok(resolve(&DispatchKey::from_parameters(&loaded.parameters)?)?)
}

/// The configured root model part name, or the selected solver's default.
pub fn model_part_name(loaded: &LoadedProject, variant: SolverVariant) -> AppResult<String> {
    let settings = &loaded.project.solver_settings;
    let defaults = match variant {
        SolverVariant::PotentialFlow => PotentialFlowSettings::defaults(),
        SolverVariant::Structural(_) => StructuralSolverSettings::defaults(),
    };
    let source = if settings.has("model_part_name") {
        settings
    } else {
        &defaults
    };
    Ok(source.get_string("model_part_name")?.to_string())
}

fn import_setting(solver_settings: &Parameters, key: &str, default: &str) -> String {
    solver_settings
        .sub("model_import_settings")
        .ok()
        .and_then(|s| s.get_string(key).ok().map(str::to_string))
        .unwrap_or_else(|| default.to_string())
}

/// Check that the project selects a solver, that its settings validate and
/// that the model input exists.
pub fn validate_project(loaded: &LoadedProject) -> AppResult<ProjectSummary> {
    let variant = select_variant(loaded)?;
    let model_part_name = model_part_name(loaded, variant)?;

    let mut model = Model::new();
    model.create_model_part(&model_part_name)?;
    create_solver(
        &mut model,
        &model_part_name,
        &loaded.parameters,
        Arc::new(DryRunBackend),
    )?;

    let solver_settings = &loaded.project.solver_settings;
    let input_type = import_setting(solver_settings, "input_type", "mdpa");
    let input_filename = import_setting(solver_settings, "input_filename", "unknown_name");
    if input_type == "mdpa" {
        let input = mdpa_path(&loaded.base_dir, &input_filename);
        if !input.exists() {
            return Err(AppError::Validation(format!(
                "model input file not found: {}",
                input.display()
            )));
        }
    }

    let problem_data = &loaded.project.problem_data;
    Ok(ProjectSummary {
        problem_name: problem_data.problem_name.clone(),
        variant,
        model_part_name,
        input_type,
        input_filename,
        start_time: problem_data.start_time,
        end_time: problem_data.end_time,
        time_step: problem_data.time_step,
    })
}

/// Echo level of a project: the solver's if set, else `problem_data`'s.
pub fn echo_level(parameters: &Parameters) -> i64 {
    ["solver_settings", "problem_data"]
        .into_iter()
        .filter_map(|section| parameters.sub(section).ok())
        .find_map(|section| section.get_int("echo_level").ok())
        .unwrap_or(0)
}

/// Default log filter directive for an echo level.
pub fn echo_level_directive(echo_level: i64) -> &'static str {
    match echo_level {
        i64::MIN..=0 => "warn",
        1 => "info",
        _ => "debug",
    }
}
