//! Metrics store document types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const TIME: &str = "TIME";
pub const V_ERROR: &str = "V_ERROR";
pub const P_ERROR: &str = "P_ERROR";
pub const AVERAGE_ERROR: &str = "AVERAGE_ERROR";

pub const ELEMENT_SIZE_ATTR: &str = "element_size";
pub const N_ELEMENTS_ATTR: &str = "n_elements";

/// One run's metrics: string attributes plus named f64 sequences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsGroup {
    pub attrs: BTreeMap<String, String>,
    pub datasets: BTreeMap<String, Vec<f64>>,
}

impl MetricsGroup {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn dataset(&self, name: &str) -> Option<&[f64]> {
        self.datasets.get(name).map(Vec::as_slice)
    }
}

/// The whole store file, groups keyed by run id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    pub groups: BTreeMap<String, MetricsGroup>,
}
