use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use mp_app::{
    AppResult, MetricsTarget, RunOptions, echo_level, echo_level_directive, load_metrics,
    project_service, query, run_service,
};
use mp_solver::DryRunBackend;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "multiphys")]
#[command(about = "multiphys - solver orchestration for finite-element analyses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a project-parameters file and its model input
    Validate {
        /// Path to the project parameters (JSON or YAML)
        project_path: PathBuf,
    },
    /// Run an analysis against the dry-run backend
    Run {
        /// Path to the project parameters (JSON or YAML)
        project_path: PathBuf,
        /// Metrics store to record per-step errors into
        #[arg(long, requires = "run_id")]
        metrics: Option<PathBuf>,
        /// Group name of this run inside the metrics store
        #[arg(long, requires = "metrics")]
        run_id: Option<String>,
    },
    /// Show the metrics recorded for one run
    ShowMetrics {
        /// Path to the metrics store
        store_path: PathBuf,
        /// Run group to display
        run_id: String,
    },
    /// Compare an obtained result table with a reference table
    CheckReference {
        /// Obtained table (JSON array of rows)
        obtained: PathBuf,
        /// Expected table (JSON array of rows)
        expected: PathBuf,
        /// Per-row weights (JSON array), defaults to ones
        #[arg(long)]
        weights: Option<PathBuf>,
        /// Relative error threshold in percent
        #[arg(long)]
        threshold: Option<f64>,
    },
}

impl Commands {
    fn project_path(&self) -> Option<&Path> {
        match self {
            Commands::Validate { project_path } | Commands::Run { project_path, .. } => {
                Some(project_path.as_path())
            }
            _ => None,
        }
    }
}

fn init_tracing(project_path: Option<&Path>) {
    let echo = project_path
        .and_then(|path| mp_config::load_parameters(path).ok())
        .map_or(0, |parameters| echo_level(&parameters));
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(echo_level_directive(echo)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::debug!(echo_level = echo, "logging initialized");
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.command.project_path());

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Run {
            project_path,
            metrics,
            run_id,
        } => {
            let metrics = metrics
                .zip(run_id)
                .map(|(store_path, run_id)| MetricsTarget { store_path, run_id });
            cmd_run(&project_path, metrics)
        }
        Commands::ShowMetrics { store_path, run_id } => cmd_show_metrics(&store_path, &run_id),
        Commands::CheckReference {
            obtained,
            expected,
            weights,
            threshold,
        } => cmd_check_reference(&obtained, &expected, weights.as_deref(), threshold),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    let summary = project_service::validate_project(&project)?;
    println!("✓ Project is valid");
    println!("  Problem:    {}", summary.problem_name);
    println!("  Solver:     {}", summary.variant);
    println!("  Model part: {}", summary.model_part_name);
    println!(
        "  Input:      {} ({})",
        summary.input_filename, summary.input_type
    );
    println!(
        "  Time:       {} -> {} (dt = {})",
        summary.start_time, summary.end_time, summary.time_step
    );
    Ok(())
}

fn cmd_run(project_path: &Path, metrics: Option<MetricsTarget>) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    println!("Running analysis: {}", project.project.problem_data.problem_name);

    let started = Instant::now();
    let options = RunOptions { metrics };
    let summary = run_service::run_analysis(&project, Arc::new(DryRunBackend), &options)?;

    println!("✓ Analysis completed ({})", summary.variant);
    println!("  Model part: {}", summary.model_part_name);
    println!("  Nodes:      {}", summary.nodes);
    println!("  Elements:   {}", summary.elements);
    println!("  Steps:      {}", summary.steps);
    println!("  Final time: {:.6}", summary.final_time);
    println!("  Wall time:  {:.3}s", started.elapsed().as_secs_f64());
    if let Some(target) = &options.metrics {
        println!(
            "  Metrics:    {} [{}]",
            target.store_path.display(),
            target.run_id
        );
    }
    Ok(())
}

fn cmd_show_metrics(store_path: &Path, run_id: &str) -> AppResult<()> {
    let group = load_metrics(store_path, run_id)?;

    println!("Run '{}' in {}", run_id, store_path.display());
    for (name, value) in &group.attrs {
        println!("  {} = {}", name, value);
    }
    for (name, values) in &group.datasets {
        let shown: Vec<String> = values.iter().map(|v| format!("{:.6e}", v)).collect();
        println!("  {} [{}]: {}", name, values.len(), shown.join(", "));
    }
    Ok(())
}

fn cmd_check_reference(
    obtained: &Path,
    expected: &Path,
    weights: Option<&Path>,
    threshold: Option<f64>,
) -> AppResult<()> {
    let report = query::check_reference(obtained, expected, weights, threshold)?;
    println!(
        "✓ All columns within {:.3e}% of the reference",
        report.threshold_percent
    );
    for (column, error) in report.column_errors_percent.iter().enumerate() {
        println!("  column {}: {:.3e}%", column, error);
    }
    Ok(())
}
