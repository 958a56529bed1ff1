//! MVO Engine — Candidate Simulator
//!
//! Monte Carlo evaluation of one candidate headcount. Each trial samples
//! workload, productivity and people risk, degrades productivity, and
//! records the days and money needed to finish.
//!
//! Draw order inside a trial is fixed and does not depend on the
//! headcount, so two candidates simulated from the same seed see the
//! same sampled world (common random numbers).

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::arithmetic::{
    mean, percent, percentile, safe_ratio, DEFAULT_ITERATIONS, HOURS_PER_MONTH, NOISE_MAX,
    NOISE_MIN, WORKING_DAYS_PER_MONTH,
};
use crate::cancel::CancellationToken;
use crate::domain::{
    CostStats, DurationStats, HeadcountTestResult, RangeValue, RiskLevel, WorkloadSpec,
};
use crate::error::{EngineError, EngineResult};
use crate::sampler::{sample, sample_fraction, seeded_rng, uniform};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Caller-tunable knobs. The fixed model constants live in `arithmetic`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SimulationSettings {
    pub iterations: u32,
    /// Fixed seed for reproducible runs; drawn per run when absent.
    pub seed: Option<u64>,
    /// Evaluate the candidate window on the rayon pool.
    pub parallel: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            seed: None,
            parallel: true,
        }
    }
}

impl SimulationSettings {
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..self
        }
    }

    pub fn with_iterations(self, iterations: u32) -> Self {
        Self { iterations, ..self }
    }

    pub fn sequential(self) -> Self {
        Self {
            parallel: false,
            ..self
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.iterations == 0 {
            return Err(EngineError::InvalidSettings {
                reason: "iterations must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Everything a single run needs to simulate candidates.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub iterations: u32,
    pub seed: u64,
    pub parallel: bool,
    pub cancel: CancellationToken,
}

impl RunContext {
    /// Fix the run seed: the configured one, or a fresh draw.
    pub fn new(settings: &SimulationSettings, cancel: CancellationToken) -> Self {
        Self {
            iterations: settings.iterations,
            seed: settings.seed.unwrap_or_else(|| rand::thread_rng().gen()),
            parallel: settings.parallel,
            cancel,
        }
    }

    /// Simulate `headcount` from a fresh generator seeded with the run seed.
    pub fn simulate(
        &self,
        spec: &WorkloadSpec,
        headcount: u32,
    ) -> EngineResult<HeadcountTestResult> {
        let mut rng = seeded_rng(self.seed);
        simulate_candidate(spec, headcount, self.iterations, &mut rng)
    }
}

// ---------------------------------------------------------------------------
// Trials
// ---------------------------------------------------------------------------

struct TrialInputs<'a> {
    work_units: &'a RangeValue,
    productivity: &'a RangeValue,
    spec: &'a WorkloadSpec,
}

struct TrialOutcome {
    days: f64,
    cost: f64,
}

fn run_trial<R: Rng + ?Sized>(inputs: &TrialInputs<'_>, headcount: f64, rng: &mut R) -> TrialOutcome {
    let risk = &inputs.spec.people_risk;
    let costs = &inputs.spec.costs;

    let workload = sample(inputs.work_units, rng);
    let mut productivity = sample(inputs.productivity, rng);
    let absenteeism = sample_fraction(&risk.absenteeism_percent, rng);
    let turnover = sample_fraction(&risk.turnover_percent, rng);
    let learning_curve = sample_fraction(&risk.learning_curve_impact_percent, rng);

    productivity *= 1.0 - absenteeism;
    productivity *= 1.0 - learning_curve * turnover;
    productivity *= uniform(NOISE_MIN, NOISE_MAX, rng);

    let effective_headcount = headcount * (1.0 - absenteeism);
    // Two negative factors must not multiply into positive output.
    let days = if effective_headcount <= 0.0 || productivity <= 0.0 {
        f64::INFINITY
    } else {
        safe_ratio(workload, effective_headcount * productivity)
    };

    let salary = sample(&costs.monthly_salary, rng);
    let overtime_hours = sample(&costs.overtime_hours, rng);

    let cost = if days.is_finite() {
        let months = days / WORKING_DAYS_PER_MONTH;
        let base = headcount * salary * months;
        let overtime = headcount
            * overtime_hours
            * (salary / HOURS_PER_MONTH)
            * costs.overtime_multiplier
            * months;
        let training = headcount * costs.training_cost_per_hire * turnover;
        base + overtime + training
    } else {
        f64::INFINITY
    };

    TrialOutcome { days, cost }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run `iterations` independent trials for one candidate headcount.
///
/// Rejection is not decided here; the result only carries the risk level
/// and the probabilities the selector needs.
pub fn simulate_candidate<R: Rng + ?Sized>(
    spec: &WorkloadSpec,
    headcount: u32,
    iterations: u32,
    rng: &mut R,
) -> EngineResult<HeadcountTestResult> {
    if iterations == 0 {
        return Err(EngineError::InvalidSettings {
            reason: "iterations must be at least 1".to_string(),
        });
    }
    let inputs = TrialInputs {
        work_units: spec.work_units()?,
        productivity: spec.productivity()?,
        spec,
    };
    let constraints = &spec.constraints;
    let n = iterations as usize;

    let mut durations = Vec::with_capacity(n);
    let mut costs = Vec::with_capacity(n);
    let mut deadline_met = 0usize;
    let mut within_budget = 0usize;

    for _ in 0..n {
        let trial = run_trial(&inputs, headcount as f64, rng);
        if trial.days <= constraints.target_completion_days {
            deadline_met += 1;
        }
        if constraints.max_budget.map_or(true, |budget| trial.cost <= budget) {
            within_budget += 1;
        }
        durations.push(trial.days);
        costs.push(trial.cost);
    }

    durations.sort_by(f64::total_cmp);
    costs.sort_by(f64::total_cmp);

    let deadline_met_probability = percent(deadline_met, n);
    let failure_risk = 100.0 - deadline_met_probability;

    Ok(HeadcountTestResult {
        headcount,
        iterations,
        duration: DurationStats {
            avg: mean(&durations),
            min: durations[0],
            max: durations[n - 1],
            p50: percentile(&durations, 0.50),
            p75: percentile(&durations, 0.75),
            p90: percentile(&durations, 0.90),
        },
        cost: CostStats {
            avg: mean(&costs),
            min: costs[0],
            max: costs[n - 1],
        },
        deadline_met_probability,
        failure_risk,
        within_budget_probability: percent(within_budget, n),
        risk_level: RiskLevel::classify(failure_risk, constraints.allowed_failure_risk_percent),
        rejected: false,
        rejection_reason: None,
        min_headcount_applied: false,
        applied_floor: None,
    })
}
