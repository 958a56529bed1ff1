//! MVO Engine — Explanation & Strategy Classifier
//!
//! Turns the numeric outcome into a staffing strategy, a plain-text
//! explanation, and a list of qualitative levers.

use crate::domain::{
    AutomationLevel, BaselineHeadcount, HeadcountTestResult, StaffingStrategy, WorkloadSpec,
};

/// Expected turnover (percent) above which retention is worth a suggestion.
const TURNOVER_CONCERN_PERCENT: f64 = 10.0;
/// Expected absenteeism (percent) above which absence management is suggested.
const ABSENTEEISM_CONCERN_PERCENT: f64 = 5.0;
/// Expected learning-curve impact (percent) above which onboarding is suggested.
const LEARNING_CURVE_CONCERN_PERCENT: f64 = 20.0;
/// Share of the allowed risk at which the pick counts as "near the threshold".
const NEAR_THRESHOLD_SHARE: f64 = 0.8;
/// Within-budget probability (percent) below which the budget is flagged.
const BUDGET_CONFIDENCE_PERCENT: f64 = 80.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub strategy: StaffingStrategy,
    pub explanation: String,
    pub suggestions: Vec<String>,
}

/// Strategy from the gap between the pick and the baseline.
pub fn choose_strategy(delta: i64, automation: AutomationLevel) -> StaffingStrategy {
    match delta {
        d if d <= 1 => StaffingStrategy::HirePermanent,
        2..=3 => StaffingStrategy::HybridMix,
        _ if automation == AutomationLevel::Low => StaffingStrategy::InvestInAutomation,
        _ => StaffingStrategy::Outsource,
    }
}

pub fn classify(
    baseline: &BaselineHeadcount,
    selected: &HeadcountTestResult,
    tested: &[HeadcountTestResult],
    spec: &WorkloadSpec,
    fallback: bool,
) -> Classification {
    let delta = selected.headcount as i64 - baseline.headcount as i64;
    let strategy = choose_strategy(delta, spec.automation_level);

    Classification {
        strategy,
        explanation: explain(baseline, selected, tested, spec, strategy, fallback),
        suggestions: suggest(selected, spec, fallback),
    }
}

fn explain(
    baseline: &BaselineHeadcount,
    selected: &HeadcountTestResult,
    tested: &[HeadcountTestResult],
    spec: &WorkloadSpec,
    strategy: StaffingStrategy,
    fallback: bool,
) -> String {
    let allowed = spec.constraints.allowed_failure_risk_percent;
    let mut lines = vec![format!(
        "Baseline: {} people. {}",
        baseline.headcount, baseline.rationale
    )];

    let (low, high) = match (tested.first(), tested.last()) {
        (Some(first), Some(last)) => (first.headcount, last.headcount),
        _ => (selected.headcount, selected.headcount),
    };
    lines.push(format!(
        "Tested {} candidate headcounts ({} to {}) with {} simulated trials each.",
        tested.len(),
        low,
        high,
        selected.iterations
    ));

    let rejected: Vec<&HeadcountTestResult> = tested.iter().filter(|r| r.rejected).collect();
    if rejected.is_empty() {
        lines.push("No candidate was rejected.".to_string());
    } else {
        lines.push(format!("Rejected {} candidates:", rejected.len()));
        for r in rejected {
            lines.push(format!(
                "  - {} people: {}",
                r.headcount,
                r.rejection_reason.as_deref().unwrap_or("rejected")
            ));
        }
    }

    if fallback {
        lines.push(format!(
            "WARNING: no tested headcount keeps the failure risk within {:.1}% and the budget. \
             Showing the largest tested headcount as a fallback, not a confident recommendation.",
            allowed
        ));
        if selected.applied_floor.is_some() && !selected.rejected {
            lines.push(format!(
                "Organization policy moved the pick to {} people, and that headcount does meet \
                 the risk and budget constraints.",
                selected.headcount
            ));
        }
    }

    if let Some(floor) = selected.applied_floor {
        lines.push(format!(
            "Organization policy raised the headcount to a floor of {}.",
            floor
        ));
    }

    lines.push(format!(
        "Selected {} people: failure risk {:.1}% (allowed {:.1}%, risk level {:?}), \
         average cost {:.0}, average duration {:.1} days (P90 {:.1} days).",
        selected.headcount,
        selected.failure_risk,
        allowed,
        selected.risk_level,
        selected.cost.avg,
        selected.duration.avg,
        selected.duration.p90
    ));
    lines.push(format!("Strategy: {}.", strategy.description()));

    lines.join("\n")
}

fn suggest(selected: &HeadcountTestResult, spec: &WorkloadSpec, fallback: bool) -> Vec<String> {
    let allowed = spec.constraints.allowed_failure_risk_percent;
    let risk = &spec.people_risk;
    let mut suggestions = Vec::new();

    if fallback {
        suggestions.push(
            "Relax the deadline or the risk tolerance, or reduce scope: no tested headcount is feasible."
                .to_string(),
        );
    }
    if !selected.rejected && allowed > 0.0 && selected.failure_risk > allowed * NEAR_THRESHOLD_SHARE {
        suggestions.push(format!(
            "Consider one more person ({}) for a safety margin: failure risk {:.1}% is close to the {:.1}% limit.",
            selected.headcount.saturating_add(1),
            selected.failure_risk,
            allowed
        ));
    }
    if risk.turnover_percent.most_likely > TURNOVER_CONCERN_PERCENT {
        suggestions.push(format!(
            "Reduce turnover (expected {:.0}%): retention lowers both schedule risk and training cost.",
            risk.turnover_percent.most_likely
        ));
    }
    if risk.absenteeism_percent.most_likely > ABSENTEEISM_CONCERN_PERCENT {
        suggestions.push(format!(
            "Address absenteeism (expected {:.0}%) to recover effective capacity.",
            risk.absenteeism_percent.most_likely
        ));
    }
    if risk.learning_curve_impact_percent.most_likely > LEARNING_CURVE_CONCERN_PERCENT {
        suggestions.push(
            "Shorten onboarding: the learning curve costs new hires a large share of productivity."
                .to_string(),
        );
    }
    if spec.automation_level == AutomationLevel::Low {
        suggestions.push(
            "Raise automation of repetitive work before adding headcount.".to_string(),
        );
    }
    if spec.constraints.max_budget.is_some()
        && selected.within_budget_probability < BUDGET_CONFIDENCE_PERCENT
    {
        suggestions.push(format!(
            "Review the budget: only {:.0}% of simulated outcomes stay within it.",
            selected.within_budget_probability
        ));
    }

    suggestions
}
