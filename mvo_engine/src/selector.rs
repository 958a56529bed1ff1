//! MVO Engine — MVO Selector
//!
//! Small grid search around the baseline: simulate every headcount in the
//! window, reject the ones that break risk or budget, then pick with a
//! lexicographic tie-break. Never extrapolates beyond the window.

use std::cmp::Ordering as CmpOrdering;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::baseline::{estimate_baseline, rescale_baseline};
use crate::domain::{BaselineHeadcount, Constraints, HeadcountTestResult, OperationSize, WorkloadSpec};
use crate::error::{EngineError, EngineResult};
use crate::policy::OperationSizePolicy;
use crate::simulator::RunContext;

/// Output of the selector, before governance.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Baseline after any operation-size rescaling; the window is centred on it.
    pub baseline: BaselineHeadcount,
    /// Ascending by headcount, rejection flags already applied.
    pub test_results: Vec<HeadcountTestResult>,
    pub selected: HeadcountTestResult,
    /// No candidate survived rejection; `selected` is the largest tested.
    pub fallback: bool,
}

/// Headcounts to test around `baseline`, never below 1.
pub fn test_window(baseline: u32, size: OperationSize) -> RangeInclusive<u32> {
    let (below, above) = size.window_offsets();
    let low = baseline.saturating_sub(below).max(1);
    let high = baseline.saturating_add(above).max(low);
    low..=high
}

/// Why a candidate fails the constraints, if it does. Risk is checked first.
pub fn rejection_reason(result: &HeadcountTestResult, constraints: &Constraints) -> Option<String> {
    let allowed = constraints.allowed_failure_risk_percent;
    if result.failure_risk > allowed {
        return Some(format!(
            "failure risk {:.1}% exceeds the allowed {:.1}%",
            result.failure_risk, allowed
        ));
    }
    match constraints.max_budget {
        Some(budget) if result.cost.avg > budget => Some(format!(
            "average cost {:.0} exceeds the budget of {:.0}",
            result.cost.avg, budget
        )),
        _ => None,
    }
}

/// Return `result`, marked rejected when it fails the constraints.
pub fn apply_rejection(result: HeadcountTestResult, constraints: &Constraints) -> HeadcountTestResult {
    match rejection_reason(&result, constraints) {
        Some(reason) => result.with_rejection(reason),
        None => result,
    }
}

fn preference(a: &HeadcountTestResult, b: &HeadcountTestResult, allowed: f64) -> CmpOrdering {
    let gap_a = (a.failure_risk - allowed).abs();
    let gap_b = (b.failure_risk - allowed).abs();
    gap_a
        .total_cmp(&gap_b)
        .then_with(|| a.cost.avg.total_cmp(&b.cost.avg))
        .then_with(|| a.headcount.cmp(&b.headcount))
}

/// Pick among non-rejected candidates by, in order: closeness of failure
/// risk to `allowed`, lowest average cost, lowest headcount.
///
/// With no survivors, fall back to the largest tested headcount and
/// return `true` as the fallback flag. `None` only for an empty slice.
pub fn pick_candidate(
    results: &[HeadcountTestResult],
    allowed: f64,
) -> Option<(HeadcountTestResult, bool)> {
    let best = results
        .iter()
        .filter(|r| !r.rejected)
        .min_by(|a, b| preference(a, b, allowed));

    match best {
        Some(r) => Some((r.clone(), false)),
        None => results
            .iter()
            .max_by_key(|r| r.headcount)
            .map(|r| (r.clone(), true)),
    }
}

fn evaluate_window(
    spec: &WorkloadSpec,
    window: &[u32],
    run: &RunContext,
) -> EngineResult<Vec<HeadcountTestResult>> {
    let total = window.len();
    let completed = AtomicUsize::new(0);

    let evaluate = |headcount: &u32| -> EngineResult<HeadcountTestResult> {
        if run.cancel.is_cancelled() {
            return Err(EngineError::Cancelled {
                completed: completed.load(Ordering::SeqCst),
                total,
            });
        }
        let result = apply_rejection(run.simulate(spec, *headcount)?, &spec.constraints);
        completed.fetch_add(1, Ordering::SeqCst);
        debug!(
            headcount = result.headcount,
            failure_risk = result.failure_risk,
            avg_cost = result.cost.avg,
            avg_days = result.duration.avg,
            rejected = result.rejected,
            "candidate simulated"
        );
        Ok(result)
    };

    if run.parallel {
        window.par_iter().map(evaluate).collect()
    } else {
        window.iter().map(evaluate).collect()
    }
}

/// Baseline, window, simulate, reject, pick.
pub fn select_mvo(
    spec: &WorkloadSpec,
    size: OperationSize,
    size_policy: Option<&OperationSizePolicy>,
    run: &RunContext,
) -> EngineResult<Selection> {
    let raw = estimate_baseline(spec)?;
    let baseline = match size_policy {
        Some(policy) => rescale_baseline(raw, policy),
        None => raw,
    };

    let window: Vec<u32> = test_window(baseline.headcount, size).collect();
    info!(
        baseline = baseline.headcount,
        window_low = window.first().copied().unwrap_or(0),
        window_high = window.last().copied().unwrap_or(0),
        iterations = run.iterations,
        seed = run.seed,
        "evaluating candidate window"
    );

    let test_results = evaluate_window(spec, &window, run)?;
    let allowed = spec.constraints.allowed_failure_risk_percent;
    let (selected, fallback) =
        pick_candidate(&test_results, allowed).ok_or_else(|| EngineError::InvalidSettings {
            reason: "candidate window is empty".to_string(),
        })?;

    if fallback {
        warn!(
            headcount = selected.headcount,
            tested = test_results.len(),
            allowed_failure_risk = allowed,
            "no feasible candidate in window, falling back to largest headcount"
        );
    }

    Ok(Selection {
        baseline,
        test_results,
        selected,
        fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CostStats, DurationStats, RiskLevel};

    fn result(headcount: u32, failure_risk: f64, avg_cost: f64) -> HeadcountTestResult {
        HeadcountTestResult {
            headcount,
            iterations: 100,
            duration: DurationStats { avg: 10.0, min: 5.0, max: 20.0, p50: 10.0, p75: 12.0, p90: 15.0 },
            cost: CostStats { avg: avg_cost, min: avg_cost, max: avg_cost },
            deadline_met_probability: 100.0 - failure_risk,
            failure_risk,
            within_budget_probability: 100.0,
            risk_level: RiskLevel::classify(failure_risk, 15.0),
            rejected: false,
            rejection_reason: None,
            min_headcount_applied: false,
            applied_floor: None,
        }
    }

    fn constraints(budget: Option<f64>) -> Constraints {
        Constraints {
            target_completion_days: 90.0,
            max_budget: budget,
            allowed_failure_risk_percent: 15.0,
        }
    }

    #[test]
    fn medium_window_is_minus_two_plus_five() {
        assert_eq!(test_window(10, OperationSize::Medium), 8..=15);
        assert_eq!(test_window(2, OperationSize::Medium), 1..=7);
        assert_eq!(test_window(1, OperationSize::Medium), 1..=6);
    }

    #[test]
    fn small_and_large_windows() {
        assert_eq!(test_window(5, OperationSize::Small), 4..=8);
        assert_eq!(test_window(5, OperationSize::Large), 2..=12);
        assert_eq!(test_window(2, OperationSize::Large), 1..=9);
    }

    #[test]
    fn risk_rejection_wins_over_budget() {
        let c = constraints(Some(10.0));
        let r = apply_rejection(result(3, 40.0, 50.0), &c);
        assert!(r.rejected);
        assert!(r.rejection_reason.unwrap().contains("failure risk"));
    }

    #[test]
    fn budget_rejection() {
        let c = constraints(Some(10.0));
        let r = apply_rejection(result(3, 5.0, 50.0), &c);
        assert!(r.rejected);
        assert!(r.rejection_reason.unwrap().contains("budget"));
        assert!(!apply_rejection(result(3, 5.0, 5.0), &c).rejected);
    }

    #[test]
    fn pick_prefers_risk_closest_to_threshold() {
        let results = vec![result(4, 12.0, 400.0), result(5, 3.0, 300.0), result(6, 0.0, 200.0)];
        let (picked, fallback) = pick_candidate(&results, 15.0).unwrap();
        assert_eq!(picked.headcount, 4);
        assert!(!fallback);
    }

    #[test]
    fn pick_breaks_ties_on_cost_then_headcount() {
        let results = vec![result(6, 0.0, 700.0), result(5, 0.0, 600.0), result(7, 0.0, 600.0)];
        let (picked, _) = pick_candidate(&results, 15.0).unwrap();
        assert_eq!(picked.headcount, 5);
    }

    #[test]
    fn pick_falls_back_to_largest_headcount() {
        let c = constraints(None);
        let results: Vec<_> = vec![result(1, 90.0, 1.0), result(2, 60.0, 2.0), result(3, 30.0, 3.0)]
            .into_iter()
            .map(|r| apply_rejection(r, &c))
            .collect();
        let (picked, fallback) = pick_candidate(&results, 15.0).unwrap();
        assert!(fallback);
        assert_eq!(picked.headcount, 3);
        assert!(picked.rejected);
    }

    #[test]
    fn pick_on_empty_is_none() {
        assert!(pick_candidate(&[], 15.0).is_none());
    }
}
