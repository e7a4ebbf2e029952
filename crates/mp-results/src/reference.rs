//! Comparison of obtained output against a stored reference.
//!
//! Tables are JSON arrays of rows; each column is one quantity of interest
//! and each row one sample (typically one node). Columns are compared with a
//! weighted relative L2 norm in percent.

use std::fs;
use std::path::Path;

use mp_core::{CoreError, weighted_relative_l2_percent};

use crate::{ResultsError, ResultsResult};

/// Default acceptance threshold, in percent.
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 1e-7;

pub fn load_table(path: &Path) -> ResultsResult<Vec<Vec<f64>>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn load_weights(path: &Path) -> ResultsResult<Vec<f64>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn column_count(table: &[Vec<f64>], what: &'static str) -> ResultsResult<usize> {
    let columns = table.first().map_or(0, Vec::len);
    if let Some(row) = table.iter().find(|row| row.len() != columns) {
        return Err(CoreError::ShapeMismatch {
            what,
            expected: columns,
            got: row.len(),
        }
        .into());
    }
    Ok(columns)
}

fn column(table: &[Vec<f64>], index: usize) -> Vec<f64> {
    table.iter().map(|row| row[index]).collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceCheck {
    pub threshold_percent: f64,
}

impl Default for ReferenceCheck {
    fn default() -> Self {
        Self {
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
        }
    }
}

impl ReferenceCheck {
    /// The threshold must be finite and positive.
    pub fn new(threshold_percent: f64) -> ResultsResult<Self> {
        if !threshold_percent.is_finite() || threshold_percent <= 0.0 {
            return Err(ResultsError::InvalidThreshold { threshold_percent });
        }
        Ok(Self { threshold_percent })
    }

    /// Relative L2 error of every column, in percent.
    ///
    /// Rows whose expected value is zero do not contribute to that column; a
    /// column with only zero expected rows fails with `NoReference`.
    pub fn column_errors(
        obtained: &[Vec<f64>],
        expected: &[Vec<f64>],
        weights: &[f64],
    ) -> ResultsResult<Vec<f64>> {
        let columns = column_count(expected, "expected columns")?;
        let obtained_columns = column_count(obtained, "obtained columns")?;
        if obtained_columns != columns {
            return Err(CoreError::ShapeMismatch {
                what: "obtained vs expected columns",
                expected: columns,
                got: obtained_columns,
            }
            .into());
        }

        (0..columns)
            .map(|i| {
                weighted_relative_l2_percent(&column(obtained, i), &column(expected, i), weights)
                    .map_err(ResultsError::from)
            })
            .collect()
    }

    /// Column errors, failing on the first column above the threshold.
    pub fn check(
        &self,
        obtained: &[Vec<f64>],
        expected: &[Vec<f64>],
        weights: &[f64],
    ) -> ResultsResult<Vec<f64>> {
        let errors = Self::column_errors(obtained, expected, weights)?;
        if let Some((column, &error_percent)) = errors
            .iter()
            .enumerate()
            .find(|&(_, &e)| e >= self.threshold_percent)
        {
            return Err(ResultsError::ThresholdExceeded {
                column,
                error_percent,
                threshold_percent: self.threshold_percent,
            });
        }
        Ok(errors)
    }

    /// Load both tables (and optional weights, else all ones) and check them.
    pub fn check_files(
        &self,
        obtained: &Path,
        expected: &Path,
        weights: Option<&Path>,
    ) -> ResultsResult<Vec<f64>> {
        let obtained = load_table(obtained)?;
        let expected = load_table(expected)?;
        let weights = match weights {
            Some(path) => load_weights(path)?,
            None => vec![1.0; expected.len()],
        };
        let errors = self.check(&obtained, &expected, &weights)?;
        tracing::info!(
            columns = errors.len(),
            threshold = self.threshold_percent,
            "reference check passed"
        );
        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_tables_pass() {
        let table = vec![vec![1.0, 2.0], vec![3.0, 0.0]];
        let errors = ReferenceCheck::default()
            .check(&table, &table, &[1.0, 2.0])
            .unwrap();
        assert_eq!(errors, vec![0.0, 0.0]);
    }

    #[test]
    fn one_percent_off_fails_default_threshold() {
        let expected = vec![vec![100.0], vec![200.0]];
        let obtained = vec![vec![101.0], vec![202.0]];
        let err = ReferenceCheck::default()
            .check(&obtained, &expected, &[1.0, 1.0])
            .unwrap_err();
        match err {
            ResultsError::ThresholdExceeded {
                column,
                error_percent,
                ..
            } => {
                assert_eq!(column, 0);
                assert!((error_percent - 1.0).abs() < 1e-9);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(ReferenceCheck::new(1.5)
            .unwrap()
            .check(&obtained, &expected, &[1.0, 1.0])
            .is_ok());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let expected = vec![vec![1.0, 2.0], vec![3.0]];
        let err = ReferenceCheck::column_errors(&expected, &expected, &[1.0, 1.0]).unwrap_err();
        assert!(matches!(err, ResultsError::Core(CoreError::ShapeMismatch { .. })));
    }

    #[test]
    fn all_zero_reference_column_fails() {
        let expected = vec![vec![1.0, 0.0], vec![2.0, 0.0]];
        let obtained = vec![vec![1.0, 5.0], vec![2.0, -7.0]];
        let err = ReferenceCheck::default()
            .check(&obtained, &expected, &[1.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, ResultsError::Core(CoreError::NoReference { .. })));
    }

    #[test]
    fn threshold_must_be_finite_and_positive() {
        for threshold in [f64::NAN, f64::INFINITY, 0.0, -1.0] {
            assert!(matches!(
                ReferenceCheck::new(threshold),
                Err(ResultsError::InvalidThreshold { .. })
            ));
        }
    }
}
