//! MVO Engine — Core Domain Types
//!
//! Inputs are supplied by the caller and read-only to the engine.
//! Outputs are value objects: once built, a `HeadcountTestResult` is only
//! ever replaced by a functionally-updated copy, never mutated in place.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

// ── Inputs ──────────────────────────────────────────────────────────

/// Three-point uncertainty descriptor: `minimum <= most_likely <= maximum`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeValue {
    pub minimum: f64,
    pub most_likely: f64,
    pub maximum: f64,
}

impl RangeValue {
    pub fn new(minimum: f64, most_likely: f64, maximum: f64) -> Self {
        Self {
            minimum,
            most_likely,
            maximum,
        }
    }

    /// A range with no width.
    pub fn fixed(value: f64) -> Self {
        Self::new(value, value, value)
    }

    /// Mean of the triangular distribution over this range.
    pub fn mean(&self) -> f64 {
        (self.minimum + self.most_likely + self.maximum) / 3.0
    }

    pub fn validate(&self, field: &str) -> EngineResult<()> {
        if !(self.minimum.is_finite() && self.most_likely.is_finite() && self.maximum.is_finite()) {
            return Err(EngineError::invalid_spec(field, "range bounds must be finite"));
        }
        if self.minimum > self.most_likely || self.most_likely > self.maximum {
            return Err(EngineError::invalid_spec(
                field,
                format!(
                    "range must satisfy minimum <= most_likely <= maximum, got {{{}, {}, {}}}",
                    self.minimum, self.most_likely, self.maximum
                ),
            ));
        }
        Ok(())
    }

    /// `validate`, plus every bound within `0..=100`.
    pub fn validate_percent(&self, field: &str) -> EngineResult<()> {
        self.validate(field)?;
        if self.minimum < 0.0 || self.maximum > 100.0 {
            return Err(EngineError::invalid_spec(
                field,
                format!(
                    "percentages must lie within 0..=100, got {{{}, {}, {}}}",
                    self.minimum, self.most_likely, self.maximum
                ),
            ));
        }
        Ok(())
    }
}

fn require_finite(field: &str, value: f64) -> EngineResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::invalid_spec(field, format!("must be finite, got {}", value)))
    }
}

/// Acceptance criteria used to reject candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Constraints {
    pub target_completion_days: f64,
    #[serde(default)]
    pub max_budget: Option<f64>,
    pub allowed_failure_risk_percent: f64,
}

/// People-related degradations, all expressed in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PeopleRiskFactors {
    pub absenteeism_percent: RangeValue,
    pub turnover_percent: RangeValue,
    pub learning_curve_impact_percent: RangeValue,
}

impl Default for PeopleRiskFactors {
    fn default() -> Self {
        Self {
            absenteeism_percent: RangeValue::fixed(0.0),
            turnover_percent: RangeValue::fixed(0.0),
            learning_curve_impact_percent: RangeValue::fixed(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CostVariables {
    pub monthly_salary: RangeValue,
    pub overtime_hours: RangeValue,
    pub overtime_multiplier: f64,
    pub training_cost_per_hire: f64,
}

impl Default for CostVariables {
    fn default() -> Self {
        Self {
            monthly_salary: RangeValue::fixed(0.0),
            overtime_hours: RangeValue::fixed(0.0),
            overtime_multiplier: 1.5,
            training_cost_per_hire: 0.0,
        }
    }
}

/// How much of the operating model is already automated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutomationLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// Operation size category; decides the width of the tested window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl OperationSize {
    /// `(below, above)` offsets around the baseline.
    pub fn window_offsets(self) -> (u32, u32) {
        match self {
            OperationSize::Small => (1, 3),
            OperationSize::Medium => (2, 5),
            OperationSize::Large => (3, 7),
        }
    }

    /// Key used for policy-table lookups.
    pub fn label(self) -> &'static str {
        match self {
            OperationSize::Small => "small",
            OperationSize::Medium => "medium",
            OperationSize::Large => "large",
        }
    }
}

/// Workload and cost model for one planning unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkloadSpec {
    #[serde(default)]
    pub total_work_units: Option<RangeValue>,
    #[serde(default)]
    pub productivity_per_person_per_day: Option<RangeValue>,
    #[serde(default)]
    pub people_risk: PeopleRiskFactors,
    #[serde(default)]
    pub costs: CostVariables,
    pub constraints: Constraints,
    /// Current staff, used by the reduction floor of restructurings.
    #[serde(default)]
    pub existing_headcount: Option<u32>,
    #[serde(default)]
    pub automation_level: AutomationLevel,
}

impl WorkloadSpec {
    pub fn work_units(&self) -> EngineResult<&RangeValue> {
        self.total_work_units
            .as_ref()
            .ok_or_else(|| EngineError::invalid_spec("total_work_units", "required range is missing"))
    }

    pub fn productivity(&self) -> EngineResult<&RangeValue> {
        self.productivity_per_person_per_day.as_ref().ok_or_else(|| {
            EngineError::invalid_spec("productivity_per_person_per_day", "required range is missing")
        })
    }

    /// Shape validation: required ranges present, every range ordered,
    /// percentages within `0..=100`, scalars finite.
    pub fn validate(&self) -> EngineResult<()> {
        self.work_units()?.validate("total_work_units")?;
        self.productivity()?
            .validate("productivity_per_person_per_day")?;

        let risk = &self.people_risk;
        risk.absenteeism_percent.validate_percent("people_risk.absenteeism_percent")?;
        risk.turnover_percent.validate_percent("people_risk.turnover_percent")?;
        risk.learning_curve_impact_percent
            .validate_percent("people_risk.learning_curve_impact_percent")?;
        self.costs.monthly_salary.validate("costs.monthly_salary")?;
        self.costs.overtime_hours.validate("costs.overtime_hours")?;
        require_finite("costs.overtime_multiplier", self.costs.overtime_multiplier)?;
        require_finite("costs.training_cost_per_hire", self.costs.training_cost_per_hire)?;

        require_finite(
            "constraints.target_completion_days",
            self.constraints.target_completion_days,
        )?;
        if let Some(budget) = self.constraints.max_budget {
            require_finite("constraints.max_budget", budget)?;
        }

        let allowed = self.constraints.allowed_failure_risk_percent;
        if !(0.0..=100.0).contains(&allowed) {
            return Err(EngineError::invalid_spec(
                "constraints.allowed_failure_risk_percent",
                format!("must be within 0..=100, got {}", allowed),
            ));
        }
        Ok(())
    }
}

// ── Outputs ─────────────────────────────────────────────────────────

/// How the baseline was derived, for traceability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineCalculation {
    pub work_units_most_likely: f64,
    pub productivity_most_likely: f64,
    pub target_completion_days: f64,
    pub availability_factor: f64,
    pub available_working_days: f64,
    /// Unrounded headcount before any ceiling or scaling.
    pub raw_headcount: f64,
    /// Headcount before operation-size rescaling, when rescaled.
    #[serde(default)]
    pub unscaled_headcount: Option<u32>,
    #[serde(default)]
    pub productivity_scale: Option<f64>,
    #[serde(default)]
    pub min_headcount_base: Option<u32>,
}

/// Deterministic, risk-free reference headcount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineHeadcount {
    pub headcount: u32,
    pub calculation: BaselineCalculation,
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn classify(failure_risk: f64, allowed_failure_risk: f64) -> Self {
        if failure_risk <= allowed_failure_risk {
            RiskLevel::Low
        } else if failure_risk <= allowed_failure_risk * 1.5 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

/// Completion-duration statistics in days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Simulation outcome for one candidate headcount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadcountTestResult {
    pub headcount: u32,
    pub iterations: u32,
    pub duration: DurationStats,
    pub cost: CostStats,
    pub deadline_met_probability: f64,
    pub failure_risk: f64,
    pub within_budget_probability: f64,
    pub risk_level: RiskLevel,
    pub rejected: bool,
    pub rejection_reason: Option<String>,
    pub min_headcount_applied: bool,
    /// Governance floor that forced this candidate, when one did.
    pub applied_floor: Option<u32>,
}

impl HeadcountTestResult {
    pub fn with_rejection(self, reason: impl Into<String>) -> Self {
        Self {
            rejected: true,
            rejection_reason: Some(reason.into()),
            ..self
        }
    }

    pub fn with_floor_applied(self, floor: u32) -> Self {
        Self {
            min_headcount_applied: true,
            applied_floor: Some(floor),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffingStrategy {
    HirePermanent,
    HybridMix,
    InvestInAutomation,
    Outsource,
}

impl StaffingStrategy {
    pub fn description(self) -> &'static str {
        match self {
            StaffingStrategy::HirePermanent => "hire permanent staff",
            StaffingStrategy::HybridMix => "hybrid mix of permanent and contingent staff",
            StaffingStrategy::InvestInAutomation => {
                "invest in automation instead of growing headcount"
            }
            StaffingStrategy::Outsource => "outsource the excess workload",
        }
    }
}

/// Baseline versus recommendation. Deltas are `mvo - baseline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub baseline_risk: f64,
    pub mvo_risk: f64,
    pub cost_delta: f64,
    pub time_delta: f64,
}

/// Non-fatal conditions a consumer must surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    /// No tested candidate met both risk and budget; the selection is a fallback.
    NoFeasibleCandidate {
        tested: usize,
        allowed_failure_risk_percent: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceRule {
    WorkTypeMinimum,
    OverheadFactor,
    ReductionFloor,
    GovernedFloor,
}

/// One headcount raise, in the order it was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceAdjustment {
    pub rule: GovernanceRule,
    pub from: u32,
    pub to: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceSummary {
    /// The selector's pick before any policy was applied.
    pub selector_headcount: u32,
    pub adjusted_headcount: u32,
    pub adjustments: Vec<GovernanceAdjustment>,
}

/// Final outcome of one engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MvoResult {
    pub engine_version: u32,
    pub recommended_headcount: u32,
    pub baseline: BaselineHeadcount,
    /// Ascending by headcount.
    pub test_results: Vec<HeadcountTestResult>,
    pub selected_result: HeadcountTestResult,
    /// True when no candidate passed rejection and the selection is a fallback.
    pub fallback: bool,
    pub warnings: Vec<EngineWarning>,
    pub governance: GovernanceSummary,
    pub strategy: StaffingStrategy,
    pub explanation: String,
    pub suggestions: Vec<String>,
    pub comparison: Comparison,
    pub seed: u64,
    pub iterations: u32,
}
