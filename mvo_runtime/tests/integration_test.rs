//! Integration tests for mvo_runtime.
//!
//! File-based tests use temporary directories for isolation.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use mvo_engine::cancel::CancellationToken;
use mvo_engine::domain::{Constraints, RangeValue, WorkloadSpec};
use mvo_engine::engine::{MvoEngine, PlanRequest};
use mvo_engine::error::EngineError;
use mvo_engine::simulator::SimulationSettings;

use mvo_runtime::config::{ConfigError, ConfigOverrides, RuntimeConfig};
use mvo_runtime::drift::{compare_results, verify_determinism};
use mvo_runtime::worker::{PlanWorker, RunError};

fn request() -> PlanRequest {
    PlanRequest {
        spec: WorkloadSpec {
            total_work_units: Some(RangeValue::new(1000.0, 1500.0, 2000.0)),
            productivity_per_person_per_day: Some(RangeValue::new(10.0, 15.0, 20.0)),
            people_risk: Default::default(),
            costs: Default::default(),
            constraints: Constraints {
                target_completion_days: 90.0,
                max_budget: None,
                allowed_failure_risk_percent: 15.0,
            },
            existing_headcount: None,
            automation_level: Default::default(),
        },
        operation_size: Default::default(),
        context: None,
    }
}

fn worker() -> PlanWorker {
    PlanWorker::new(MvoEngine::new(
        SimulationSettings::default().with_seed(11).with_iterations(500),
    ))
}

/// Create a temp directory for a test.
fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("mvo_runtime_tests").join(name);
    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

// ─────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────

#[test]
fn toml_config_sets_simulation_and_policies() {
    let config = RuntimeConfig::from_toml(
        r#"
[simulation]
iterations = 300
seed = 7
parallel = false

[policies.operation_sizes.tiny]
productivity_scale = 1.0
min_headcount_base = 1
"#,
    )
    .unwrap();
    config.validate().unwrap();

    assert_eq!(config.simulation.iterations, 300);
    assert_eq!(config.simulation.seed, Some(7));
    assert!(!config.simulation.parallel);
    assert_eq!(config.policies.operation_sizes.len(), 1);
    // tables the file leaves out keep their defaults
    assert!(config.policies.planning_types.contains_key("restructuring"));
}

#[test]
fn load_reads_file_then_applies_overrides() {
    let dir = temp_dir("load_overrides");
    let path = dir.join("mvo.toml");
    fs::write(&path, "[simulation]\niterations = 300\nseed = 7\n").unwrap();

    let overrides = ConfigOverrides {
        seed: Some(99),
        ..Default::default()
    };
    let config = RuntimeConfig::load(Some(&path), Some(&overrides)).unwrap();
    assert_eq!(config.simulation.seed, Some(99));
}

#[test]
fn missing_config_file_is_io_error() {
    let dir = temp_dir("missing_file");
    let err = RuntimeConfig::load(Some(&dir.join("absent.toml")), None).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn invalid_policy_fails_validation() {
    let config = RuntimeConfig::from_toml(
        "[policies.planning_types.odd]\noverhead_factor = 0.5\n",
    )
    .unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Validation { .. })
    ));
    assert!(matches!(
        PlanWorker::from_config(&config),
        Err(RunError::Config(_))
    ));
}

// ─────────────────────────────────────────────────────────────
// Worker
// ─────────────────────────────────────────────────────────────

#[test]
fn spawned_run_matches_blocking_run() {
    let worker = worker();
    let handle = worker.spawn(request()).expect("spawn");
    let background = handle.wait().expect("background run");
    let blocking = worker.run_blocking(&request()).expect("blocking run");
    assert_eq!(background, blocking);
}

#[test]
fn pre_cancelled_worker_returns_cancelled() {
    let token = CancellationToken::new();
    token.cancel();
    let handle = worker().spawn_with_token(request(), token).expect("spawn");
    match handle.wait() {
        Err(RunError::Engine(EngineError::Cancelled { completed, .. })) => {
            assert_eq!(completed, 0)
        }
        other => panic!("Expected Cancelled, got: {:?}", other),
    }
}

#[test]
fn handle_reports_completion() {
    let handle = worker().spawn(request()).expect("spawn");
    while !handle.is_finished() {
        thread::sleep(Duration::from_millis(5));
    }
    // cancelling a finished run does not change its outcome
    handle.cancel();
    assert!(handle.wait().is_ok());
}

#[test]
fn batch_keeps_order_and_isolates_failures() {
    let mut bad = request();
    bad.spec.productivity_per_person_per_day = None;
    let mut bigger = request();
    bigger.spec.total_work_units = Some(RangeValue::new(4000.0, 4500.0, 5000.0));

    let results = worker().run_batch(&[request(), bad, bigger]);
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(RunError::Engine(EngineError::InvalidSpec { .. }))
    ));
    let small = results[0].as_ref().unwrap();
    let large = results[2].as_ref().unwrap();
    assert!(large.baseline.headcount > small.baseline.headcount);
}

// ─────────────────────────────────────────────────────────────
// Drift
// ─────────────────────────────────────────────────────────────

#[test]
fn unseeded_engine_replays_deterministically() {
    let engine = MvoEngine::new(SimulationSettings::default().with_iterations(300));
    let hash = verify_determinism(&engine, &request()).expect("determinism");
    assert_eq!(hash.len(), 64);
}

#[test]
fn tighter_deadline_needs_more_people() {
    let engine = worker();
    let relaxed = engine.run_blocking(&request()).unwrap();

    let mut tight_request = request();
    tight_request.spec.constraints.target_completion_days = 45.0;
    let tight = engine.run_blocking(&tight_request).unwrap();

    let delta = compare_results(&relaxed, &tight);
    assert!(delta.headcount_delta > 0, "delta was {:?}", delta);
    assert_eq!(delta.headcount_a, relaxed.recommended_headcount);
    assert_eq!(delta.headcount_b, tight.recommended_headcount);
    assert!(!delta.newly_rejected.is_empty());
    assert!(delta.newly_feasible.is_empty());
}

#[test]
fn comparing_a_result_with_itself_is_empty() {
    let result = worker().run_blocking(&request()).unwrap();
    let delta = compare_results(&result, &result);
    assert_eq!(delta.headcount_delta, 0);
    assert_eq!(delta.failure_risk_delta, 0.0);
    assert!(!delta.strategy_changed);
    assert!(delta.newly_rejected.is_empty());
}
