//! Per-run error-projection recorder.
//!
//! Each call to [`ErrorRecorder::write_data`] appends one record and then
//! rewrites the run's whole group in the store, so the file always holds the
//! complete sequences recorded so far.

use std::path::Path;

use mp_core::ensure_finite;
use mp_model::ModelPart;
use mp_model::variables::{ERROR_X, ERROR_Y, ERROR_Z};
use serde::{Deserialize, Serialize};

use crate::store::MetricsStore;
use crate::types::{
    AVERAGE_ERROR, ELEMENT_SIZE_ATTR, MetricsGroup, N_ELEMENTS_ATTR, P_ERROR, TIME, V_ERROR,
};
use crate::{ResultsError, ResultsResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecorderSettings {
    pub file_name: String,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            file_name: "sp_data.json".to_string(),
        }
    }
}

/// Summed nodal `|ERROR|` divided by the element count.
pub fn average_error(model_part: &ModelPart) -> ResultsResult<f64> {
    let n_elements = model_part.number_of_elements();
    if n_elements == 0 {
        return Err(ResultsError::EmptyModelPart {
            model_part: model_part.name().to_string(),
        });
    }
    let mut mod_error = 0.0;
    for node in model_part.nodes() {
        let x = node.solution_step_value(ERROR_X, 0)?;
        let y = node.solution_step_value(ERROR_Y, 0)?;
        let z = node.solution_step_value(ERROR_Z, 0)?;
        mod_error += (x * x + y * y + z * z).sqrt();
    }
    Ok(ensure_finite(mod_error / n_elements as f64, "average error")?)
}

#[derive(Debug, Clone)]
pub struct ErrorRecorder {
    store: MetricsStore,
    group_name: String,
    time: Vec<f64>,
    v_error: Vec<f64>,
    p_error: Vec<f64>,
    average_error: Vec<f64>,
}

impl ErrorRecorder {
    pub fn new(store: MetricsStore, group_name: impl Into<String>) -> Self {
        Self {
            store,
            group_name: group_name.into(),
            time: Vec::new(),
            v_error: Vec::new(),
            p_error: Vec::new(),
            average_error: Vec::new(),
        }
    }

    /// Recorder writing to `settings.file_name` inside `dir`.
    pub fn in_dir(dir: &Path, settings: &RecorderSettings, group_name: impl Into<String>) -> Self {
        Self::new(MetricsStore::in_dir(dir, &settings.file_name), group_name)
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Append one record for the model part's current time and flush.
    ///
    /// Nothing is appended if the flush fails.
    pub fn write_data(
        &mut self,
        model_part: &ModelPart,
        velocity_error: f64,
        pressure_error: f64,
    ) -> ResultsResult<()> {
        let n_elements = model_part.number_of_elements();
        if n_elements == 0 {
            return Err(ResultsError::EmptyModelPart {
                model_part: model_part.name().to_string(),
            });
        }
        let velocity_error = ensure_finite(velocity_error, "velocity error")?;
        let pressure_error = ensure_finite(pressure_error, "pressure error")?;
        let average_error = average_error(model_part)?;

        let mut max_element = f64::NEG_INFINITY;
        for element in model_part.elements() {
            max_element = max_element.max(model_part.element_length(element)?);
        }
        let time = model_part.process_info.time;

        let mut next = self.clone();
        next.time.push(time);
        next.v_error.push(velocity_error);
        next.p_error.push(pressure_error);
        next.average_error.push(average_error);

        let mut group = MetricsGroup::default();
        group
            .attrs
            .insert(ELEMENT_SIZE_ATTR.to_string(), max_element.to_string());
        group
            .attrs
            .insert(N_ELEMENTS_ATTR.to_string(), n_elements.to_string());
        for (name, data) in [
            (TIME, &next.time),
            (V_ERROR, &next.v_error),
            (P_ERROR, &next.p_error),
            (AVERAGE_ERROR, &next.average_error),
        ] {
            group.datasets.insert(name.to_string(), data.clone());
        }

        self.store.replace_group(&self.group_name, group)?;
        *self = next;
        tracing::debug!(
            group = %self.group_name,
            records = self.len(),
            average_error,
            "error data written"
        );
        Ok(())
    }
}
