//! MVO Engine — Governance Adjuster
//!
//! Organization policy applied on top of the selector's pick. Every rule
//! can only raise the headcount. Rules run in a fixed order:
//!   1. work-type minimum
//!   2. planning-type overhead factor
//!   3. reduction floor (restructurings)
//!   4. governed floor (operation-size base)

use tracing::debug;

use crate::arithmetic::ceil_headcount;
use crate::domain::{
    GovernanceAdjustment, GovernanceRule, GovernanceSummary, HeadcountTestResult, WorkloadSpec,
};
use crate::error::EngineResult;
use crate::policy::{MinHeadcountMode, OperationSizePolicy, PlanningTypePolicy, ResolvedContext};
use crate::selector::apply_rejection;
use crate::simulator::RunContext;

/// Policies that can raise the headcount for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct GovernancePolicies<'a> {
    pub planning_type: Option<&'a PlanningTypePolicy>,
    pub operation_size: Option<&'a OperationSizePolicy>,
    pub work_type_minimum: Option<u32>,
}

impl<'a> From<&'a ResolvedContext> for GovernancePolicies<'a> {
    fn from(ctx: &'a ResolvedContext) -> Self {
        Self {
            planning_type: ctx.planning_type.as_ref(),
            operation_size: ctx.operation_size.as_ref(),
            work_type_minimum: ctx.work_type_minimum,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GovernanceOutcome {
    pub adjusted_headcount: u32,
    pub result: HeadcountTestResult,
    pub summary: GovernanceSummary,
}

fn raise(
    adjustments: &mut Vec<GovernanceAdjustment>,
    current: u32,
    target: u32,
    rule: GovernanceRule,
) -> u32 {
    if target > current {
        debug!(?rule, from = current, to = target, "governance raised headcount");
        adjustments.push(GovernanceAdjustment {
            rule,
            from: current,
            to: target,
        });
        target
    } else {
        current
    }
}

/// Pure headcount arithmetic of the four rules.
pub fn governed_headcount(
    selected: u32,
    spec: &WorkloadSpec,
    policies: &GovernancePolicies<'_>,
) -> (u32, Vec<GovernanceAdjustment>) {
    let mut adjustments = Vec::new();
    let mut headcount = selected;

    if let Some(minimum) = policies.work_type_minimum {
        headcount = raise(&mut adjustments, headcount, minimum, GovernanceRule::WorkTypeMinimum);
    }

    let Some(planning) = policies.planning_type else {
        return (headcount, adjustments);
    };

    if let Some(factor) = planning.overhead_factor {
        let target = ceil_headcount(headcount as f64 * factor);
        headcount = raise(&mut adjustments, headcount, target, GovernanceRule::OverheadFactor);
    }

    match planning.min_headcount_mode {
        MinHeadcountMode::Reduction => match (spec.existing_headcount, planning.max_reduction_percent) {
            (Some(existing), Some(max_cut)) => {
                let floor = ceil_headcount(existing as f64 * (100.0 - max_cut) / 100.0);
                headcount = raise(&mut adjustments, headcount, floor, GovernanceRule::ReductionFloor);
            }
            _ => debug!("reduction mode without existing headcount or cap, no floor applied"),
        },
        MinHeadcountMode::Governed => {
            if let Some(size) = policies.operation_size {
                headcount = raise(
                    &mut adjustments,
                    headcount,
                    size.min_headcount_base,
                    GovernanceRule::GovernedFloor,
                );
            }
        }
        MinHeadcountMode::Standard => {}
    }

    (headcount, adjustments)
}

/// Apply policy to the selector's pick.
///
/// When the headcount moves, the already-tested result for the new value
/// is reused if the window contained it; otherwise that headcount is
/// simulated with the run's seed. Either way the result is flagged with
/// the floor that forced it.
pub fn apply_governance(
    selected: &HeadcountTestResult,
    spec: &WorkloadSpec,
    policies: &GovernancePolicies<'_>,
    tested: &[HeadcountTestResult],
    run: &RunContext,
) -> EngineResult<GovernanceOutcome> {
    let (adjusted, adjustments) = governed_headcount(selected.headcount, spec, policies);

    let result = if adjusted == selected.headcount {
        selected.clone()
    } else {
        let base = match tested.iter().find(|r| r.headcount == adjusted) {
            Some(existing) => existing.clone(),
            None => apply_rejection(run.simulate(spec, adjusted)?, &spec.constraints),
        };
        base.with_floor_applied(adjusted)
    };

    Ok(GovernanceOutcome {
        adjusted_headcount: adjusted,
        result,
        summary: GovernanceSummary {
            selector_headcount: selected.headcount,
            adjusted_headcount: adjusted,
            adjustments,
        },
    })
}
