use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use mp_config::{LinearSolverSettings, Parameters};
use mp_model::variables::{AUXILIARY_VELOCITY_POTENTIAL, VELOCITY_POTENTIAL};
use mp_model::{Model, ModelPart};
use mp_solver::{
    Backend, DriverState, DryRunBackend, LinearSolver, SolverError, SolverHandle, SolverResult,
    Strategy, StrategyKind, StrategySpec, create_solver,
};
use serde_json::json;

const TETRA_MDPA: &str = r#"
Begin Properties 0
End Properties

Begin Nodes
    1 0.0 0.0 0.0
    2 1.0 0.0 0.0
    3 0.0 1.0 0.0
    4 0.0 0.0 1.0
End Nodes

// node order gives a negative volume
Begin Elements Element3D4N
    1 0 1 3 2 4
End Elements

Begin Conditions SurfaceCondition3D3N
    1 0 1 2 3
End Conditions
"#;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn project(solver_settings: serde_json::Value) -> Parameters {
    Parameters::from_value(json!({
        "problem_data": {"parallel_type": "OpenMP"},
        "solver_settings": solver_settings
    }))
    .unwrap()
}

fn model_with(name: &str) -> Model {
    let mut model = Model::new();
    model.create_model_part(name).unwrap();
    model
}

#[derive(Debug, Default)]
struct Calls {
    strategies_built: usize,
    solves: usize,
    clears: usize,
    failing_builds: usize,
    last_spec: Option<StrategySpec>,
}

#[derive(Debug, Default)]
struct RecordingBackend {
    calls: Rc<RefCell<Calls>>,
}

#[derive(Debug)]
struct RecordingLinearSolver;

impl LinearSolver for RecordingLinearSolver {
    fn solver_type(&self) -> &str {
        "recording"
    }
}

#[derive(Debug)]
struct RecordingStrategy {
    calls: Rc<RefCell<Calls>>,
}

impl Backend for RecordingBackend {
    fn construct_linear_solver(
        &self,
        _settings: &LinearSolverSettings,
    ) -> SolverResult<Arc<dyn LinearSolver>> {
        Ok(Arc::new(RecordingLinearSolver))
    }

    fn create_strategy(
        &self,
        spec: StrategySpec,
        _linear_solver: Arc<dyn LinearSolver>,
        _model_part: &ModelPart,
    ) -> SolverResult<Box<dyn Strategy>> {
        let mut calls = self.calls.borrow_mut();
        if calls.failing_builds > 0 {
            calls.failing_builds -= 1;
            return Err(SolverError::Backend {
                what: "strategy build failed".to_string(),
            });
        }
        calls.strategies_built += 1;
        calls.last_spec = Some(spec);
        Ok(Box::new(RecordingStrategy {
            calls: Rc::clone(&self.calls),
        }))
    }
}

impl Strategy for RecordingStrategy {
    fn check(&self, _model_part: &ModelPart) -> SolverResult<()> {
        Ok(())
    }

    fn solve(&mut self, _model_part: &mut ModelPart) -> SolverResult<()> {
        self.calls.borrow_mut().solves += 1;
        Ok(())
    }

    fn set_echo_level(&mut self, _level: usize) {}

    fn clear(&mut self) {
        self.calls.borrow_mut().clears += 1;
    }
}

#[allow(clippy::arc_with_non_send_sync)]
fn recording() -> (Arc<dyn Backend>, Rc<RefCell<Calls>>) {
    let backend = RecordingBackend::default();
    let calls = Rc::clone(&backend.calls);
    (Arc::new(backend), calls)
}

#[test]
fn potential_flow_3d_import_uses_3d_element_names() {
    let dir = unique_temp_dir("mp_solver_tetra");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("tetra.mdpa"), TETRA_MDPA).unwrap();

    let mut model = model_with("Main");
    let params = project(json!({
        "solver_type": "potential_flow_solver",
        "model_part_name": "Main",
        "model_import_settings": {"input_type": "mdpa", "input_filename": "tetra"}
    }));
    model
        .get_model_part_mut("Main")
        .unwrap()
        .process_info
        .domain_size = 3;

    let mut solver = create_solver(&mut model, "Main", &params, Arc::new(DryRunBackend)).unwrap();
    solver.add_variables(&mut model).unwrap();
    let summary = solver.import_model_part(&mut model, &dir).unwrap();
    solver.add_dofs(&mut model).unwrap();
    solver.initialize(&mut model).unwrap();

    assert_eq!(summary.nodes, 4);
    let mp = model.get_model_part("Main").unwrap();
    assert_eq!(mp.buffer_size(), 2);
    let element = mp.elements().next().unwrap();
    assert_eq!(element.name, "CompressiblePotentialFlowElement3D4N");
    // inverted tetrahedron was repaired
    assert_eq!(element.nodes.iter().map(|n| n.get()).collect::<Vec<_>>(), vec![1, 3, 4, 2]);
    assert!(mp
        .conditions()
        .all(|c| c.name == "PotentialWallCondition3D3N"));
    assert!(mp.nodes().all(|n| n.has_dof(VELOCITY_POTENTIAL)
        && n.has_dof(AUXILIARY_VELOCITY_POTENTIAL)));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn orientation_errors_can_be_raised() {
    let dir = unique_temp_dir("mp_solver_tetra_raise");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("tetra.mdpa"), TETRA_MDPA).unwrap();

    let mut model = model_with("Main");
    let params = project(json!({
        "solver_type": "potential_flow_solver",
        "domain_size": 3,
        "model_import_settings": {
            "input_type": "mdpa",
            "input_filename": "tetra.mdpa",
            "throw_orientation_errors": true
        }
    }));
    model
        .get_model_part_mut("Main")
        .unwrap()
        .process_info
        .domain_size = 3;

    let mut solver = create_solver(&mut model, "Main", &params, Arc::new(DryRunBackend)).unwrap();
    solver.add_variables(&mut model).unwrap();
    let err = solver.import_model_part(&mut model, &dir).unwrap_err();
    assert!(matches!(
        err,
        SolverError::Model(mp_model::ModelError::Orientation { count: 1, .. })
    ));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn explicit_dynamic_is_unsupported() {
    let mut model = model_with("Structure");
    let params = project(json!({
        "solver_type": "Dynamic",
        "time_integration_method": "Explicit"
    }));
    let err = create_solver(&mut model, "Structure", &params, Arc::new(DryRunBackend)).unwrap_err();
    match err {
        SolverError::UnsupportedConfiguration {
            field, alternatives, ..
        } => {
            assert_eq!(field, "time_integration_method");
            assert_eq!(alternatives, vec!["Implicit"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_root_model_part_is_a_type_error() {
    let mut model = model_with("Structure");
    let params = project(json!({"solver_type": "Static"}));
    let err = create_solver(&mut model, "Structure.Inner", &params, Arc::new(DryRunBackend))
        .unwrap_err();
    assert!(matches!(err, SolverError::Type { .. }));
}

#[test]
fn static_lifecycle_builds_strategy_once() {
    let (backend, calls) = recording();
    let mut model = model_with("Structure");
    let params = project(json!({"solver_type": "Static", "analysis_type": "linear"}));

    let mut solver = create_solver(&mut model, "Structure", &params, backend).unwrap();
    assert_eq!(solver.minimum_buffer_size(), 1);

    let err = solver.solve_solution_step(&mut model).unwrap_err();
    assert!(matches!(err, SolverError::Lifecycle { .. }));

    solver.add_variables(&mut model).unwrap();
    solver.add_dofs(&mut model).unwrap();
    solver.initialize(&mut model).unwrap();
    assert!(matches!(
        solver.initialize(&mut model),
        Err(SolverError::AlreadyInitialized)
    ));

    for _ in 0..3 {
        solver.solve_solution_step(&mut model).unwrap();
    }
    solver.clear();
    solver.clear();

    let calls = calls.borrow();
    assert_eq!(calls.strategies_built, 1);
    assert_eq!(calls.solves, 3);
    assert_eq!(calls.clears, 1);
    assert_eq!(calls.last_spec.as_ref().unwrap().kind, StrategyKind::Linear);
    assert_eq!(solver.state(), DriverState::Cleared);
}

#[test]
fn implicit_dynamic_needs_two_steps_of_history() {
    let mut model = model_with("Structure");
    let params = project(json!({
        "solver_type": "Dynamic",
        "time_integration_method": "Implicit",
        "scheme_type": "bossak"
    }));
    let solver = create_solver(&mut model, "Structure", &params, Arc::new(DryRunBackend)).unwrap();
    assert_eq!(solver.minimum_buffer_size(), 2);
}

#[test]
fn failed_initialize_can_be_retried() {
    let (backend, calls) = recording();
    calls.borrow_mut().failing_builds = 1;
    let mut model = model_with("Structure");
    let params = project(json!({"solver_type": "Static", "analysis_type": "linear"}));

    let mut solver = create_solver(&mut model, "Structure", &params, backend).unwrap();
    solver.add_variables(&mut model).unwrap();
    solver.add_dofs(&mut model).unwrap();

    let err = solver.initialize(&mut model).unwrap_err();
    assert!(matches!(err, SolverError::Backend { .. }));
    assert_eq!(solver.state(), DriverState::DofsAdded);

    solver.initialize(&mut model).unwrap();
    assert_eq!(solver.state(), DriverState::Initialized);
    solver.solve_solution_step(&mut model).unwrap();
    assert_eq!(calls.borrow().strategies_built, 1);
}
