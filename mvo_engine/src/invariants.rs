//! MVO Engine — Result Invariant Checks
//!
//! Consistency checks the engine runs on every result before returning
//! it. A failure here is an engine bug, never a caller error.

use std::collections::BTreeSet;

use crate::domain::{HeadcountTestResult, MvoResult};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every check. Returns the first failure.
pub fn validate_result(result: &MvoResult) -> Result<(), String> {
    check_window_order(result)?;
    check_rejection_reasons(result)?;
    check_fallback_flag(result)?;
    check_recommendation(result)?;
    check_probabilities(result)?;
    check_floor_flags(result)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

/// Test results strictly ascending by headcount, all at least 1.
fn check_window_order(result: &MvoResult) -> Result<(), String> {
    let headcounts: Vec<u32> = result.test_results.iter().map(|r| r.headcount).collect();
    if headcounts.first().map_or(false, |h| *h == 0) {
        return Err("[INVARIANT:window_order] headcount 0 was tested".to_string());
    }
    if headcounts.windows(2).any(|w| w[0] >= w[1]) {
        return Err(format!(
            "[INVARIANT:window_order] test results not strictly ascending: {:?}",
            headcounts
        ));
    }
    let unique: BTreeSet<u32> = headcounts.iter().copied().collect();
    if !unique.contains(&result.baseline.headcount) {
        return Err(format!(
            "[INVARIANT:window_order] baseline {} outside the tested window",
            result.baseline.headcount
        ));
    }
    Ok(())
}

/// Rejected results carry a reason; accepted ones do not.
fn check_rejection_reasons(result: &MvoResult) -> Result<(), String> {
    let all = result
        .test_results
        .iter()
        .chain(std::iter::once(&result.selected_result));
    for r in all {
        let has_reason = r.rejection_reason.as_deref().map_or(false, |s| !s.is_empty());
        if r.rejected != has_reason {
            return Err(format!(
                "[INVARIANT:rejection_reason] headcount {} rejected={} but reason={:?}",
                r.headcount, r.rejected, r.rejection_reason
            ));
        }
    }
    Ok(())
}

/// `fallback` exactly when every tested candidate was rejected.
fn check_fallback_flag(result: &MvoResult) -> Result<(), String> {
    let all_rejected = result.test_results.iter().all(|r| r.rejected);
    if result.fallback != all_rejected {
        return Err(format!(
            "[INVARIANT:fallback_flag] fallback={} but all_rejected={}",
            result.fallback, all_rejected
        ));
    }
    if result.fallback && result.warnings.is_empty() {
        return Err("[INVARIANT:fallback_flag] fallback without a warning".to_string());
    }
    Ok(())
}

/// The recommendation is the selected result, never below the selector's pick.
fn check_recommendation(result: &MvoResult) -> Result<(), String> {
    if result.recommended_headcount != result.selected_result.headcount {
        return Err(format!(
            "[INVARIANT:recommendation] recommended {} != selected {}",
            result.recommended_headcount, result.selected_result.headcount
        ));
    }
    if result.recommended_headcount < result.governance.selector_headcount {
        return Err(format!(
            "[INVARIANT:recommendation] governance lowered {} to {}",
            result.governance.selector_headcount, result.recommended_headcount
        ));
    }
    Ok(())
}

fn check_probabilities(result: &MvoResult) -> Result<(), String> {
    let in_range = |p: f64| (0.0..=100.0).contains(&p);
    let bad = |r: &HeadcountTestResult| {
        !in_range(r.failure_risk)
            || !in_range(r.deadline_met_probability)
            || !in_range(r.within_budget_probability)
            || (r.failure_risk + r.deadline_met_probability - 100.0).abs() > 1e-6
    };
    if let Some(r) = result.test_results.iter().find(|r| bad(r)) {
        return Err(format!(
            "[INVARIANT:probabilities] headcount {} has inconsistent probabilities",
            r.headcount
        ));
    }
    Ok(())
}

/// `min_headcount_applied` and `applied_floor` move together.
fn check_floor_flags(result: &MvoResult) -> Result<(), String> {
    let r = &result.selected_result;
    if r.min_headcount_applied != r.applied_floor.is_some() {
        return Err(format!(
            "[INVARIANT:floor_flags] min_headcount_applied={} but applied_floor={:?}",
            r.min_headcount_applied, r.applied_floor
        ));
    }
    let moved = result.governance.adjusted_headcount != result.governance.selector_headcount;
    if moved != r.min_headcount_applied {
        return Err(format!(
            "[INVARIANT:floor_flags] governance moved={} but min_headcount_applied={}",
            moved, r.min_headcount_applied
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Constraints, RangeValue, WorkloadSpec};
    use crate::engine::{MvoEngine, PlanRequest};
    use crate::simulator::SimulationSettings;

    fn make_result(work_units: f64) -> MvoResult {
        let request = PlanRequest {
            spec: WorkloadSpec {
                total_work_units: Some(RangeValue::new(work_units * 0.8, work_units, work_units * 1.2)),
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
        };
        MvoEngine::new(SimulationSettings::default().with_seed(3).with_iterations(200))
            .run(&request)
            .unwrap()
    }

    #[test]
    fn engine_results_pass() {
        validate_result(&make_result(1500.0)).unwrap();
    }

    #[test]
    fn missing_rejection_reason_is_caught() {
        let mut result = make_result(1500.0);
        result.test_results[0].rejected = true;
        result.test_results[0].rejection_reason = None;
        let err = validate_result(&result).unwrap_err();
        assert!(err.contains("rejection_reason"), "got: {}", err);
    }

    #[test]
    fn silent_fallback_is_caught() {
        let mut result = make_result(1500.0);
        result.fallback = true;
        let err = validate_result(&result).unwrap_err();
        assert!(err.contains("fallback_flag"), "got: {}", err);
    }

    #[test]
    fn unordered_window_is_caught() {
        let mut result = make_result(1500.0);
        result.test_results.swap(0, 1);
        let err = validate_result(&result).unwrap_err();
        assert!(err.contains("window_order"), "got: {}", err);
    }

    #[test]
    fn floor_flag_without_value_is_caught() {
        let mut result = make_result(1500.0);
        result.selected_result.min_headcount_applied = true;
        let err = validate_result(&result).unwrap_err();
        assert!(err.contains("floor_flags"), "got: {}", err);
    }
}
