//! mp-config: project parameters, settings schemas and validation.

pub mod migrate;
pub mod parameters;
pub mod schema;
pub mod validate;

use std::path::Path;

pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use parameters::Parameters;
pub use schema::*;
pub use validate::{ConfigError, ConfigResult};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load a project-parameters document, choosing the format from the extension.
///
/// `.yaml`/`.yml` are read as YAML, everything else as JSON.
pub fn load_parameters(path: &Path) -> ProjectResult<Parameters> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => load_yaml(path),
        _ => load_json(path),
    }
}

pub fn load_yaml(path: &Path) -> ProjectResult<Parameters> {
    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_yaml::from_str(&content)?;
    finish_load(Parameters::from_value(value)?)
}

pub fn load_json(path: &Path) -> ProjectResult<Parameters> {
    let content = std::fs::read_to_string(path)?;
    finish_load(Parameters::from_json_str(&content)?)
}

pub fn save_json(path: &Path, parameters: &Parameters) -> ProjectResult<()> {
    std::fs::write(path, parameters.to_pretty_string()?)?;
    Ok(())
}

pub fn save_yaml(path: &Path, parameters: &Parameters) -> ProjectResult<()> {
    let content = serde_yaml::to_string(parameters.as_value())?;
    std::fs::write(path, content)?;
    Ok(())
}

fn finish_load(parameters: Parameters) -> ProjectResult<Parameters> {
    let parameters = migrate_to_latest(parameters)?;
    ProjectParameters::from_parameters(&parameters)?;
    Ok(parameters)
}
