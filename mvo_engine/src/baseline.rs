//! MVO Engine — Baseline Estimator
//!
//! Risk-free, perfect-world headcount from the most-likely workload and
//! productivity. No randomness: identical specs give identical baselines.

use crate::arithmetic::{ceil_headcount, safe_ratio, AVAILABILITY_FACTOR};
use crate::domain::{BaselineCalculation, BaselineHeadcount, WorkloadSpec};
use crate::error::EngineResult;
use crate::policy::OperationSizePolicy;

/// `ceil(work_units / (productivity * target_days * 0.85))`, at least 1.
///
/// Zero capacity (no productivity or no days) does not fail here: it
/// yields a baseline of 1 and the simulator reports every candidate as
/// infeasible.
pub fn estimate_baseline(spec: &WorkloadSpec) -> EngineResult<BaselineHeadcount> {
    let work_units = spec.work_units()?.most_likely;
    let productivity = spec.productivity()?.most_likely;
    let target_days = spec.constraints.target_completion_days;

    let available_days = target_days * AVAILABILITY_FACTOR;
    let raw = safe_ratio(work_units, productivity * available_days);
    let capacity_ok = raw.is_finite();
    let headcount = if capacity_ok {
        ceil_headcount(raw).max(1)
    } else {
        1
    };

    let rationale = if capacity_ok {
        format!(
            "{} work units at {} units per person-day over {:.1} available days \
             ({} target days x {} availability) need {:.2} people, rounded up to {}. \
             No risk buffer is included.",
            work_units, productivity, available_days, target_days, AVAILABILITY_FACTOR, raw, headcount
        )
    } else {
        format!(
            "No capacity: productivity {} over {:.1} available days cannot complete \
             {} work units. Baseline set to the minimum of 1.",
            productivity, available_days, work_units
        )
    };

    Ok(BaselineHeadcount {
        headcount,
        calculation: BaselineCalculation {
            work_units_most_likely: work_units,
            productivity_most_likely: productivity,
            target_completion_days: target_days,
            availability_factor: AVAILABILITY_FACTOR,
            available_working_days: available_days,
            raw_headcount: raw,
            unscaled_headcount: None,
            productivity_scale: None,
            min_headcount_base: None,
        },
        rationale,
    })
}

/// Apply an operation-size policy:
/// `max(ceil(baseline * productivity_scale), min_headcount_base)`.
pub fn rescale_baseline(
    baseline: BaselineHeadcount,
    policy: &OperationSizePolicy,
) -> BaselineHeadcount {
    let unscaled = baseline.headcount;
    let scaled = ceil_headcount(unscaled as f64 * policy.productivity_scale)
        .max(policy.min_headcount_base)
        .max(1);

    let rationale = if scaled == unscaled {
        baseline.rationale
    } else {
        format!(
            "{} Operation-size policy (scale {}, minimum {}) adjusts it from {} to {}.",
            baseline.rationale, policy.productivity_scale, policy.min_headcount_base, unscaled, scaled
        )
    };

    BaselineHeadcount {
        headcount: scaled,
        calculation: BaselineCalculation {
            unscaled_headcount: Some(unscaled),
            productivity_scale: Some(policy.productivity_scale),
            min_headcount_base: Some(policy.min_headcount_base),
            ..baseline.calculation
        },
        rationale,
    }
}
