//! Analysis stage: drive one simulation from construction to clear.

use std::path::PathBuf;
use std::sync::Arc;

use mp_model::variables::{ERROR_X, ERROR_Y, ERROR_Z};
use mp_model::{Model, ModelPart};
use mp_results::{ErrorRecorder, MetricsStore};
use mp_solver::{Backend, SolverHandle, SolverVariant, create_solver};

use crate::error::{AppError, AppResult};
use crate::project_service::{self, LoadedProject};

/// `ProcessInfo` keys a backend may fill with projected errors.
pub const VELOCITY_ERROR_KEY: &str = "VELOCITY_ERROR_PROJECTED";
pub const PRESSURE_ERROR_KEY: &str = "PRESSURE_ERROR_PROJECTED";

/// Where error metrics of a run go.
#[derive(Debug, Clone)]
pub struct MetricsTarget {
    pub store_path: PathBuf,
    pub run_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub metrics: Option<MetricsTarget>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub variant: SolverVariant,
    pub model_part_name: String,
    pub steps: usize,
    pub final_time: f64,
    pub nodes: usize,
    pub elements: usize,
}

fn projected_errors(model_part: &ModelPart) -> (f64, f64) {
    let value = |key: &str| {
        model_part
            .process_info
            .values
            .get(key)
            .copied()
            .unwrap_or(0.0)
    };
    (value(VELOCITY_ERROR_KEY), value(PRESSURE_ERROR_KEY))
}

/// Whether another step fits before `end_time`, with a small tolerance so
/// accumulated rounding does not add a spurious step.
fn has_next_step(time: f64, end_time: f64, time_step: f64) -> bool {
    end_time - time > 1e-9 * time_step
}

fn solve_loop(
    solver: &mut dyn SolverHandle,
    model: &mut Model,
    loaded: &LoadedProject,
    recorder: &mut Option<ErrorRecorder>,
) -> AppResult<usize> {
    let problem_data = &loaded.project.problem_data;
    let model_part_name = solver.model_part_name().to_string();
    let mut time = problem_data.start_time;
    let mut steps = 0;

    model.get_model_part_mut(&model_part_name)?.process_info.time = time;
    while has_next_step(time, problem_data.end_time, problem_data.time_step) {
        time += problem_data.time_step;
        model.get_model_part_mut(&model_part_name)?.clone_time_step(time);
        solver.solve_solution_step(model)?;
        steps += 1;

        if let Some(recorder) = recorder.as_mut() {
            let model_part = model.get_model_part(&model_part_name)?;
            let (velocity_error, pressure_error) = projected_errors(model_part);
            recorder.write_data(model_part, velocity_error, pressure_error)?;
        }
        tracing::debug!(step = steps, time, "solution step finished");
    }
    Ok(steps)
}

/// Run the analysis described by `loaded` against `backend`.
///
/// The solver is cleared whether or not the time loop succeeds.
pub fn run_analysis(
    loaded: &LoadedProject,
    backend: Arc<dyn Backend>,
    options: &RunOptions,
) -> AppResult<RunSummary> {
    if let Some(target) = &options.metrics
        && target.run_id.trim().is_empty()
    {
        return Err(AppError::InvalidInput(
            "metrics run id must not be empty".to_string(),
        ));
    }
    let variant = project_service::select_variant(loaded)?;
    let model_part_name = project_service::model_part_name(loaded, variant)?;

    let mut model = Model::new();
    model.create_model_part(&model_part_name)?;
    let mut solver = create_solver(&mut model, &model_part_name, &loaded.parameters, backend)?;

    let mut recorder = options.metrics.as_ref().map(|target| {
        ErrorRecorder::new(
            MetricsStore::new(target.store_path.clone()),
            target.run_id.clone(),
        )
    });

    solver.add_variables(&mut model)?;
    if recorder.is_some() {
        let model_part = model.get_model_part_mut(&model_part_name)?;
        for variable in [ERROR_X, ERROR_Y, ERROR_Z] {
            model_part.add_nodal_solution_step_variable(variable);
        }
    }
    let imported = solver.import_model_part(&mut model, &loaded.base_dir)?;
    solver.add_dofs(&mut model)?;
    solver.initialize(&mut model)?;
    tracing::info!(
        %variant,
        nodes = imported.nodes,
        elements = imported.elements,
        "analysis initialized"
    );

    let outcome = solve_loop(solver.as_mut(), &mut model, loaded, &mut recorder);
    solver.clear();
    let steps = outcome?;

    let model_part = model.get_model_part(&model_part_name)?;
    let summary = RunSummary {
        variant,
        model_part_name,
        steps,
        final_time: model_part.process_info.time,
        nodes: model_part.number_of_nodes(),
        elements: model_part.number_of_elements(),
    };
    tracing::info!(
        steps = summary.steps,
        final_time = summary.final_time,
        "analysis finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_count_is_robust_to_rounding() {
        let mut time = 0.0;
        let mut steps = 0;
        while has_next_step(time, 1.0, 0.1) {
            time += 0.1;
            steps += 1;
        }
        assert_eq!(steps, 10);
    }

    #[test]
    fn zero_length_interval_takes_no_steps() {
        assert!(!has_next_step(2.0, 2.0, 0.5));
    }
}
