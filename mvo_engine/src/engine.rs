//! MVO Engine — Engine
//!
//! Top-level orchestrator. Resolves policy, delegates to the selector,
//! governance and classifier, then validates the result invariants.
//!
//! Sequence: validate → baseline/window/simulate/pick → governance →
//! classify → compare → invariants.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::arithmetic::delta;
use crate::cancel::CancellationToken;
use crate::domain::{
    Comparison, EngineWarning, HeadcountTestResult, MvoResult, OperationSize, WorkloadSpec,
};
use crate::error::{EngineError, EngineResult};
use crate::governance::{apply_governance, GovernancePolicies};
use crate::invariants::validate_result;
use crate::policy::{resolve_context, OperatingContext, PolicySource, PolicyTables, ResolvedContext};
use crate::selector::{apply_rejection, select_mvo};
use crate::simulator::{RunContext, SimulationSettings};
use crate::strategy::classify;
use crate::ENGINE_VERSION;

/// One planning unit to size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanRequest {
    pub spec: WorkloadSpec,
    #[serde(default)]
    pub operation_size: OperationSize,
    #[serde(default)]
    pub context: Option<OperatingContext>,
}

/// Stateless across runs: concurrent `run` calls share nothing mutable.
#[derive(Debug, Clone)]
pub struct MvoEngine<P = PolicyTables> {
    settings: SimulationSettings,
    policies: P,
}

impl MvoEngine<PolicyTables> {
    /// Engine over the built-in policy tables.
    pub fn new(settings: SimulationSettings) -> Self {
        Self::with_policies(settings, PolicyTables::default())
    }
}

impl<P: PolicySource> MvoEngine<P> {
    pub fn with_policies(settings: SimulationSettings, policies: P) -> Self {
        Self { settings, policies }
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn policies(&self) -> &P {
        &self.policies
    }

    pub fn run(&self, request: &PlanRequest) -> EngineResult<MvoResult> {
        self.execute(request, &CancellationToken::new(), None)
    }

    /// Run with a fixed seed, whatever the configured one.
    pub fn run_seeded(&self, request: &PlanRequest, seed: u64) -> EngineResult<MvoResult> {
        self.execute(request, &CancellationToken::new(), Some(seed))
    }

    /// Run, giving up between candidates once `cancel` fires.
    pub fn run_with_cancel(
        &self,
        request: &PlanRequest,
        cancel: &CancellationToken,
    ) -> EngineResult<MvoResult> {
        self.execute(request, cancel, None)
    }

    fn execute(
        &self,
        request: &PlanRequest,
        cancel: &CancellationToken,
        seed_override: Option<u64>,
    ) -> EngineResult<MvoResult> {
        self.settings.validate()?;
        let spec = &request.spec;
        spec.validate()?;

        let resolved = match &request.context {
            Some(ctx) => resolve_context(&self.policies, ctx, request.operation_size)?,
            None => ResolvedContext::default(),
        };

        let settings = match seed_override {
            Some(seed) => self.settings.clone().with_seed(seed),
            None => self.settings.clone(),
        };
        let run = RunContext::new(&settings, cancel.clone());

        // -- Selection --
        let selection = select_mvo(
            spec,
            request.operation_size,
            resolved.operation_size.as_ref(),
            &run,
        )?;

        // -- Governance --
        let policies = GovernancePolicies::from(&resolved);
        let governed = apply_governance(
            &selection.selected,
            spec,
            &policies,
            &selection.test_results,
            &run,
        )?;

        // -- Explanation --
        let classification = classify(
            &selection.baseline,
            &governed.result,
            &selection.test_results,
            spec,
            selection.fallback,
        );

        let baseline_result = match selection
            .test_results
            .iter()
            .find(|r| r.headcount == selection.baseline.headcount)
        {
            Some(r) => r.clone(),
            None => apply_rejection(run.simulate(spec, selection.baseline.headcount)?, &spec.constraints),
        };
        let comparison = compare(&baseline_result, &governed.result);

        let warnings = if selection.fallback {
            vec![EngineWarning::NoFeasibleCandidate {
                tested: selection.test_results.len(),
                allowed_failure_risk_percent: spec.constraints.allowed_failure_risk_percent,
            }]
        } else {
            Vec::new()
        };

        info!(
            baseline = selection.baseline.headcount,
            recommended = governed.adjusted_headcount,
            failure_risk = governed.result.failure_risk,
            fallback = selection.fallback,
            strategy = ?classification.strategy,
            "mvo run complete"
        );

        let result = MvoResult {
            engine_version: ENGINE_VERSION,
            recommended_headcount: governed.adjusted_headcount,
            baseline: selection.baseline,
            test_results: selection.test_results,
            selected_result: governed.result,
            fallback: selection.fallback,
            warnings,
            governance: governed.summary,
            strategy: classification.strategy,
            explanation: classification.explanation,
            suggestions: classification.suggestions,
            comparison,
            seed: run.seed,
            iterations: run.iterations,
        };

        validate_result(&result).map_err(|detail| EngineError::InvariantViolation { detail })?;
        Ok(result)
    }
}

fn compare(baseline: &HeadcountTestResult, selected: &HeadcountTestResult) -> Comparison {
    Comparison {
        baseline_risk: baseline.failure_risk,
        mvo_risk: selected.failure_risk,
        cost_delta: delta(baseline.cost.avg, selected.cost.avg),
        time_delta: delta(baseline.duration.avg, selected.duration.avg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Constraints, RangeValue};

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
            operation_size: OperationSize::Medium,
            context: None,
        }
    }

    fn engine() -> MvoEngine {
        MvoEngine::new(SimulationSettings::default().with_seed(5).with_iterations(500))
    }

    #[test]
    fn run_records_seed_and_iterations() {
        let result = engine().run(&request()).unwrap();
        assert_eq!(result.seed, 5);
        assert_eq!(result.iterations, 500);
        assert_eq!(result.engine_version, ENGINE_VERSION);
    }

    #[test]
    fn unseeded_runs_record_their_seed() {
        let engine = MvoEngine::new(SimulationSettings::default().with_iterations(200));
        let first = engine.run(&request()).unwrap();
        let replay = engine.run_seeded(&request(), first.seed).unwrap();
        assert_eq!(first, replay);
    }

    #[test]
    fn pre_cancelled_run_stops() {
        let token = CancellationToken::new();
        token.cancel();
        match engine().run_with_cancel(&request(), &token) {
            Err(EngineError::Cancelled { completed, total }) => {
                assert_eq!(completed, 0);
                assert_eq!(total, 7);
            }
            other => panic!("Expected Cancelled, got: {:?}", other),
        }
    }

    #[test]
    fn zero_iterations_rejected_before_simulation() {
        let engine = MvoEngine::new(SimulationSettings::default().with_iterations(0));
        assert!(matches!(
            engine.run(&request()),
            Err(EngineError::InvalidSettings { .. })
        ));
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let parallel = engine().run(&request()).unwrap();
        let sequential = MvoEngine::new(
            SimulationSettings::default().with_seed(5).with_iterations(500).sequential(),
        )
        .run(&request())
        .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn request_round_trips_through_json() {
        let json = serde_json::to_string(&request()).unwrap();
        let decoded: PlanRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, request());
    }
}
