//! Result queries: stored metrics and reference comparison.

use std::path::Path;

use mp_results::{MetricsGroup, MetricsStore, ReferenceCheck};

use crate::error::{AppError, AppResult};

/// Metrics group of one run.
pub fn load_metrics(store_path: &Path, run_id: &str) -> AppResult<MetricsGroup> {
    let store = MetricsStore::new(store_path.to_path_buf());
    Ok(store.group(run_id)?)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceReport {
    pub threshold_percent: f64,
    pub column_errors_percent: Vec<f64>,
}

/// Compare an obtained table with the expected one.
///
/// Weights default to one per row; the threshold to the reference default.
pub fn check_reference(
    obtained: &Path,
    expected: &Path,
    weights: Option<&Path>,
    threshold_percent: Option<f64>,
) -> AppResult<ReferenceReport> {
    let check = match threshold_percent {
        Some(threshold) => ReferenceCheck::new(threshold)
            .map_err(|e| AppError::InvalidInput(format!("--threshold: {e}")))?,
        None => ReferenceCheck::default(),
    };
    let column_errors_percent = check.check_files(obtained, expected, weights)?;
    Ok(ReferenceReport {
        threshold_percent: check.threshold_percent,
        column_errors_percent,
    })
}
