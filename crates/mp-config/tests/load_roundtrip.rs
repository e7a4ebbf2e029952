use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use mp_config::{
    ConfigError, Parameters, PotentialFlowSettings, ProjectError, ProjectParameters, Schema,
    load_json, load_parameters, load_yaml, save_json,
};

fn unique_temp_path(prefix: &str, ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("{}_{}.{}", prefix, nanos, ext))
}

const PROJECT_JSON: &str = r#"{
    "problem_data": {
        "problem_name": "naca0012",
        "parallel_type": "OpenMP",
        "end_time": 1.0
    },
    "solver_settings": {
        "solver_type": "potential_flow_solver",
        "domain_size": 2,
        "model_part_name": "MainModelPart",
        "model_import_settings": {
            "input_type": "mdpa",
            "input_filename": "naca0012"
        }
    }
}"#;

#[test]
fn load_json_project() {
    let path = unique_temp_path("mp_config_project", "json");
    std::fs::write(&path, PROJECT_JSON).unwrap();

    let parameters = load_json(&path).unwrap();
    let project = ProjectParameters::from_parameters(&parameters).unwrap();
    assert_eq!(project.problem_data.problem_name, "naca0012");

    let solver = PotentialFlowSettings::from_parameters(&project.solver_settings).unwrap();
    assert_eq!(solver.model_import_settings.input_filename, "naca0012");
    assert_eq!(solver.echo_level, 1);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn yaml_and_json_load_the_same_tree() {
    let json_path = unique_temp_path("mp_config_same", "json");
    std::fs::write(&json_path, PROJECT_JSON).unwrap();
    let from_json = load_parameters(&json_path).unwrap();

    let yaml_path = unique_temp_path("mp_config_same", "yaml");
    let yaml = serde_yaml::to_string(from_json.as_value()).unwrap();
    std::fs::write(&yaml_path, yaml).unwrap();
    let from_yaml = load_yaml(&yaml_path).unwrap();

    assert_eq!(from_json, from_yaml);

    let _ = std::fs::remove_file(&json_path);
    let _ = std::fs::remove_file(&yaml_path);
}

#[test]
fn save_then_load_is_stable() {
    let path = unique_temp_path("mp_config_save", "json");
    let parameters = Parameters::from_json_str(PROJECT_JSON).unwrap();
    save_json(&path, &parameters).unwrap();
    let loaded = load_json(&path).unwrap();
    assert_eq!(loaded, parameters);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn load_rejects_invalid_problem_data() {
    let path = unique_temp_path("mp_config_invalid", "json");
    std::fs::write(
        &path,
        r#"{"problem_data": {"time_step": -1.0}, "solver_settings": {}}"#,
    )
    .unwrap();
    let err = load_json(&path).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::Config(ConfigError::InvalidValue { .. })
    ));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn load_migrates_version_one_documents() {
    let path = unique_temp_path("mp_config_v1", "json");
    std::fs::write(
        &path,
        r#"{
            "version": 1,
            "problem_data": {"domain_size": 3, "model_part_name": "Body"},
            "solver_settings": {"solver_type": "Static"}
        }"#,
    )
    .unwrap();
    let parameters = load_json(&path).unwrap();
    let solver_settings = parameters.sub("solver_settings").unwrap();
    assert_eq!(solver_settings.get_int("domain_size").unwrap(), 3);
    assert_eq!(solver_settings.get_string("model_part_name").unwrap(), "Body");
    let _ = std::fs::remove_file(&path);
}
