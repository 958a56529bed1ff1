/// mvo_plan: size one planning unit from a JSON request.
///
/// Usage: mvo_plan <request.json> [config.toml]
///
/// Prints the result as pretty JSON on stdout. Logs go to stderr
/// (`MVO_LOG` controls the levels). Exit code 2 means the request or
/// config was unusable, 1 means the run itself failed.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use tracing::{error, warn};

use mvo_engine::engine::PlanRequest;
use mvo_engine::error::EngineError;
use mvo_runtime::config::RuntimeConfig;
use mvo_runtime::logging::init_tracing;
use mvo_runtime::worker::{PlanWorker, RunError};

const USAGE: &str = "usage: mvo_plan <request.json> [config.toml]";

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (request_path, config_path) = match args.as_slice() {
        [request] => (request.as_str(), None),
        [request, config] => (request.as_str(), Some(config.as_str())),
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    match run(request_path, config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "mvo_plan failed");
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(request_path: &str, config_path: Option<&str>) -> Result<(), RunError> {
    let config = RuntimeConfig::load(config_path.map(Path::new), None)?;

    let raw = fs::read_to_string(request_path).map_err(|e| EngineError::InvalidSpec {
        field: "request".to_string(),
        reason: format!("cannot read {}: {}", request_path, e),
    })?;
    let request: PlanRequest = serde_json::from_str(&raw).map_err(|e| EngineError::InvalidSpec {
        field: "request".to_string(),
        reason: e.to_string(),
    })?;

    let worker = PlanWorker::from_config(&config)?;
    let result = worker.spawn(request)?.wait()?;

    if result.fallback {
        warn!(
            headcount = result.recommended_headcount,
            "no feasible headcount, showing fallback"
        );
        eprintln!(
            "warning: no tested headcount met the constraints; {} is a fallback",
            result.recommended_headcount
        );
    }

    let json = serde_json::to_string_pretty(&result).map_err(EngineError::from)?;
    println!("{}", json);
    Ok(())
}

fn exit_code(e: &RunError) -> u8 {
    match e {
        RunError::Config(_)
        | RunError::Engine(EngineError::InvalidSpec { .. })
        | RunError::Engine(EngineError::InvalidSettings { .. })
        | RunError::Engine(EngineError::UnknownPolicy { .. }) => 2,
        _ => 1,
    }
}
