//! Schema migration framework.
//!
//! Version 1 documents kept `domain_size` and `model_part_name` under
//! `problem_data`; version 2 moved them into `solver_settings`.

use crate::ProjectError;
use crate::parameters::Parameters;
use crate::validate::ConfigError;

pub const LATEST_VERSION: u32 = 2;

const MOVED_TO_SOLVER_SETTINGS: [&str; 2] = ["domain_size", "model_part_name"];

pub fn migrate_to_latest(mut parameters: Parameters) -> Result<Parameters, ProjectError> {
    let mut version = document_version(&parameters)?;
    if version > u64::from(LATEST_VERSION) {
        return Err(ConfigError::UnsupportedVersion {
            version,
            latest: LATEST_VERSION,
        }
        .into());
    }

    while version < u64::from(LATEST_VERSION) {
        parameters = migrate_one_version(parameters, version)?;
        version += 1;
        parameters.set_value("version", version);
    }
    Ok(parameters)
}

fn document_version(parameters: &Parameters) -> Result<u64, ProjectError> {
    if !parameters.has("version") {
        return Ok(u64::from(LATEST_VERSION));
    }
    let version = parameters.get_int("version")?;
    u64::try_from(version).map_err(|_| ProjectError::Migration {
        what: format!("negative document version {}", version),
    })
}

fn migrate_one_version(parameters: Parameters, version: u64) -> Result<Parameters, ProjectError> {
    match version {
        0 => Ok(parameters),
        1 => migrate_v1_to_v2(parameters),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

fn migrate_v1_to_v2(mut parameters: Parameters) -> Result<Parameters, ProjectError> {
    if !parameters.has("problem_data") {
        return Ok(parameters);
    }

    let mut problem_data = parameters.sub("problem_data")?;
    let mut solver_settings = if parameters.has("solver_settings") {
        parameters.sub("solver_settings")?
    } else {
        Parameters::new()
    };

    for key in MOVED_TO_SOLVER_SETTINGS {
        if let Some(value) = problem_data.remove_value(key) {
            tracing::debug!(key, "moving problem_data setting into solver_settings");
            solver_settings.add_value(key, value);
        }
    }

    parameters.set_sub("problem_data", problem_data);
    parameters.set_sub("solver_settings", solver_settings);
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn v1_moves_domain_size_into_solver_settings() {
        let p = Parameters::from_value(json!({
            "version": 1,
            "problem_data": {"domain_size": 3, "model_part_name": "Fluid", "end_time": 2.0},
            "solver_settings": {"solver_type": "potential_flow_solver"}
        }))
        .unwrap();

        let migrated = migrate_to_latest(p).unwrap();
        assert_eq!(migrated.get_int("version").unwrap(), i64::from(LATEST_VERSION));
        let pd = migrated.sub("problem_data").unwrap();
        assert!(!pd.has("domain_size"));
        let ss = migrated.sub("solver_settings").unwrap();
        assert_eq!(ss.get_int("domain_size").unwrap(), 3);
        assert_eq!(ss.get_string("model_part_name").unwrap(), "Fluid");
    }

    #[test]
    fn v1_does_not_override_solver_values() {
        let p = Parameters::from_value(json!({
            "version": 1,
            "problem_data": {"domain_size": 3},
            "solver_settings": {"domain_size": 2}
        }))
        .unwrap();
        let migrated = migrate_to_latest(p).unwrap();
        let ss = migrated.sub("solver_settings").unwrap();
        assert_eq!(ss.get_int("domain_size").unwrap(), 2);
    }

    #[test]
    fn future_versions_are_rejected() {
        let p = Parameters::from_value(json!({"version": 99})).unwrap();
        assert!(matches!(
            migrate_to_latest(p),
            Err(ProjectError::Config(ConfigError::UnsupportedVersion { .. }))
        ));
    }

    #[test]
    fn unversioned_documents_are_latest() {
        let p = Parameters::from_value(json!({"solver_settings": {}})).unwrap();
        let migrated = migrate_to_latest(p.clone()).unwrap();
        assert_eq!(migrated, p);
    }
}
