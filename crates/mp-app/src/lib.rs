//! Shared application service layer for multiphys.
//!
//! Centralizes project loading, validation, analysis runs and result
//! queries so the CLI stays a thin shell.

pub mod error;
pub mod project_service;
pub mod query;
pub mod run_service;

pub use error::{AppError, AppResult};
pub use project_service::{
    LoadedProject, ProjectSummary, echo_level, echo_level_directive, load_project,
    model_part_name, select_variant, validate_project,
};
pub use query::{ReferenceReport, check_reference, load_metrics};
pub use run_service::{MetricsTarget, RunOptions, RunSummary, run_analysis};
