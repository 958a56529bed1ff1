//! Drift detection: determinism verification and what-if comparison.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{error, info};

use mvo_engine::arithmetic::delta;
use mvo_engine::domain::{MvoResult, StaffingStrategy};
use mvo_engine::engine::{MvoEngine, PlanRequest};
use mvo_engine::hashing::result_hash;
use mvo_engine::policy::PolicySource;

use crate::worker::RunError;

/// Run `request`, replay it with the seed it recorded, and require
/// identical result hashes. Returns the hash.
pub fn verify_determinism<P: PolicySource>(
    engine: &MvoEngine<P>,
    request: &PlanRequest,
) -> Result<String, RunError> {
    let first = engine.run(request)?;
    let replay = engine.run_seeded(request, first.seed)?;

    let hash1 = result_hash(&first)?;
    let hash2 = result_hash(&replay)?;
    if hash1 != hash2 {
        error!(seed = first.seed, %hash1, %hash2, "determinism failure");
        return Err(RunError::NonDeterministic {
            first: hash1,
            second: hash2,
        });
    }
    info!(seed = first.seed, hash = %hash1, "seeded replay reproduced");
    Ok(hash1)
}

/// Differences between two results, `b` relative to `a`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioDelta {
    pub headcount_a: u32,
    pub headcount_b: u32,
    pub headcount_delta: i64,
    pub failure_risk_delta: f64,
    pub avg_cost_delta: f64,
    pub avg_duration_delta: f64,
    pub strategy_a: StaffingStrategy,
    pub strategy_b: StaffingStrategy,
    pub strategy_changed: bool,
    pub fallback_changed: bool,
    /// Headcounts feasible in `a` but rejected in `b`.
    pub newly_rejected: Vec<u32>,
    /// Headcounts rejected in `a` but feasible in `b`.
    pub newly_feasible: Vec<u32>,
}

/// Compare two scenarios of the same planning unit.
///
/// Rejection changes are only reported for headcounts both runs tested.
pub fn compare_results(a: &MvoResult, b: &MvoResult) -> ScenarioDelta {
    let rejected = |r: &MvoResult| -> BTreeSet<u32> {
        r.test_results.iter().filter(|t| t.rejected).map(|t| t.headcount).collect()
    };
    let tested = |r: &MvoResult| -> BTreeSet<u32> {
        r.test_results.iter().map(|t| t.headcount).collect()
    };

    let common: BTreeSet<u32> = tested(a).intersection(&tested(b)).copied().collect();
    let rejected_a = rejected(a);
    let rejected_b = rejected(b);

    let newly_rejected = common
        .iter()
        .filter(|h| !rejected_a.contains(h) && rejected_b.contains(h))
        .copied()
        .collect();
    let newly_feasible = common
        .iter()
        .filter(|h| rejected_a.contains(h) && !rejected_b.contains(h))
        .copied()
        .collect();

    let sa = &a.selected_result;
    let sb = &b.selected_result;

    ScenarioDelta {
        headcount_a: a.recommended_headcount,
        headcount_b: b.recommended_headcount,
        headcount_delta: b.recommended_headcount as i64 - a.recommended_headcount as i64,
        failure_risk_delta: delta(sa.failure_risk, sb.failure_risk),
        avg_cost_delta: delta(sa.cost.avg, sb.cost.avg),
        avg_duration_delta: delta(sa.duration.avg, sb.duration.avg),
        strategy_a: a.strategy,
        strategy_b: b.strategy,
        strategy_changed: a.strategy != b.strategy,
        fallback_changed: a.fallback != b.fallback,
        newly_rejected,
        newly_feasible,
    }
}
