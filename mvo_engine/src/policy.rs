//! MVO Engine — Operating-Context Policy
//!
//! Planning-type and operation-size tables plus the work-type minimum
//! lookup. The engine only reads them; `PolicySource` is the seam where a
//! host plugs in its own tables or lookup service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::OperationSize;
use crate::error::{EngineError, EngineResult};

/// How a planning type constrains the minimum headcount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinHeadcountMode {
    #[default]
    Standard,
    /// Restructuring: cap how far staff can be cut.
    Reduction,
    /// Governed unit: operation-size base is an absolute floor.
    Governed,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanningTypePolicy {
    #[serde(default)]
    pub min_headcount_mode: MinHeadcountMode,
    /// Coordination/leadership multiplier, `>= 1.0`.
    #[serde(default)]
    pub overhead_factor: Option<f64>,
    /// Largest allowed cut of the existing headcount, in percent.
    #[serde(default)]
    pub max_reduction_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationSizePolicy {
    pub productivity_scale: f64,
    pub min_headcount_base: u32,
}

/// Keys the caller picked for this planning unit. All optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OperatingContext {
    pub planning_type: Option<String>,
    pub operation_size: Option<String>,
    pub work_category: Option<String>,
}

/// Read-only policy lookups.
pub trait PolicySource: Send + Sync {
    fn planning_type(&self, key: &str) -> Option<PlanningTypePolicy>;

    fn operation_size(&self, key: &str) -> Option<OperationSizePolicy>;

    /// Minimum headcount for a work category at an operation size.
    fn work_type_minimum(&self, work_category: &str, operation_size: &str) -> Option<u32>;
}

/// In-memory policy tables, keyed by label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PolicyTables {
    pub planning_types: BTreeMap<String, PlanningTypePolicy>,
    pub operation_sizes: BTreeMap<String, OperationSizePolicy>,
    /// work category -> operation size -> minimum headcount
    pub work_type_minimums: BTreeMap<String, BTreeMap<String, u32>>,
}

impl Default for PolicyTables {
    fn default() -> Self {
        let planning_types = BTreeMap::from([
            ("team".to_string(), PlanningTypePolicy::default()),
            (
                "department".to_string(),
                PlanningTypePolicy {
                    overhead_factor: Some(1.10),
                    ..Default::default()
                },
            ),
            (
                "division".to_string(),
                PlanningTypePolicy {
                    min_headcount_mode: MinHeadcountMode::Governed,
                    overhead_factor: Some(1.15),
                    max_reduction_percent: None,
                },
            ),
            (
                "restructuring".to_string(),
                PlanningTypePolicy {
                    min_headcount_mode: MinHeadcountMode::Reduction,
                    overhead_factor: None,
                    max_reduction_percent: Some(30.0),
                },
            ),
        ]);

        let operation_sizes = BTreeMap::from([
            (
                "small".to_string(),
                OperationSizePolicy {
                    productivity_scale: 1.0,
                    min_headcount_base: 1,
                },
            ),
            (
                "medium".to_string(),
                OperationSizePolicy {
                    productivity_scale: 1.0,
                    min_headcount_base: 2,
                },
            ),
            (
                "large".to_string(),
                OperationSizePolicy {
                    productivity_scale: 1.1,
                    min_headcount_base: 3,
                },
            ),
        ]);

        let minimums = |small: u32, medium: u32, large: u32| {
            BTreeMap::from([
                ("small".to_string(), small),
                ("medium".to_string(), medium),
                ("large".to_string(), large),
            ])
        };
        let work_type_minimums = BTreeMap::from([
            ("operations".to_string(), minimums(1, 2, 4)),
            ("customer_support".to_string(), minimums(2, 3, 6)),
            ("engineering".to_string(), minimums(2, 3, 5)),
            ("sales".to_string(), minimums(1, 2, 4)),
        ]);

        Self {
            planning_types,
            operation_sizes,
            work_type_minimums,
        }
    }
}

impl PolicyTables {
    /// Tables with no entries at all.
    pub fn empty() -> Self {
        Self {
            planning_types: BTreeMap::new(),
            operation_sizes: BTreeMap::new(),
            work_type_minimums: BTreeMap::new(),
        }
    }

    /// Reject scales and factors that would shrink or invert headcounts.
    pub fn validate(&self) -> EngineResult<()> {
        for (key, policy) in &self.planning_types {
            if let Some(factor) = policy.overhead_factor {
                if !factor.is_finite() || factor < 1.0 {
                    return Err(EngineError::InvalidSettings {
                        reason: format!(
                            "planning type {:?}: overhead_factor must be >= 1.0, got {}",
                            key, factor
                        ),
                    });
                }
            }
            if let Some(pct) = policy.max_reduction_percent {
                if !(0.0..=100.0).contains(&pct) {
                    return Err(EngineError::InvalidSettings {
                        reason: format!(
                            "planning type {:?}: max_reduction_percent must be within 0..=100, got {}",
                            key, pct
                        ),
                    });
                }
            }
        }
        for (key, policy) in &self.operation_sizes {
            if !policy.productivity_scale.is_finite() || policy.productivity_scale <= 0.0 {
                return Err(EngineError::InvalidSettings {
                    reason: format!(
                        "operation size {:?}: productivity_scale must be positive, got {}",
                        key, policy.productivity_scale
                    ),
                });
            }
        }
        Ok(())
    }
}

impl PolicySource for PolicyTables {
    fn planning_type(&self, key: &str) -> Option<PlanningTypePolicy> {
        self.planning_types.get(key).cloned()
    }

    fn operation_size(&self, key: &str) -> Option<OperationSizePolicy> {
        self.operation_sizes.get(key).cloned()
    }

    fn work_type_minimum(&self, work_category: &str, operation_size: &str) -> Option<u32> {
        self.work_type_minimums
            .get(work_category)
            .and_then(|by_size| by_size.get(operation_size))
            .copied()
    }
}

/// Policies resolved for one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedContext {
    pub planning_type: Option<PlanningTypePolicy>,
    pub operation_size: Option<OperationSizePolicy>,
    pub work_type_minimum: Option<u32>,
}

/// Look up every key of `context`.
///
/// Unknown planning-type or operation-size keys are errors. An unknown
/// work category only means there is no work-type floor.
pub fn resolve_context<S: PolicySource + ?Sized>(
    source: &S,
    context: &OperatingContext,
    size: OperationSize,
) -> EngineResult<ResolvedContext> {
    let planning_type = match &context.planning_type {
        Some(key) => Some(source.planning_type(key).ok_or_else(|| EngineError::UnknownPolicy {
            kind: "planning type".to_string(),
            key: key.clone(),
        })?),
        None => None,
    };

    let operation_size = match &context.operation_size {
        Some(key) => Some(source.operation_size(key).ok_or_else(|| EngineError::UnknownPolicy {
            kind: "operation size".to_string(),
            key: key.clone(),
        })?),
        None => None,
    };

    let size_key = context.operation_size.as_deref().unwrap_or(size.label());
    let work_type_minimum = context.work_category.as_deref().and_then(|category| {
        let floor = source.work_type_minimum(category, size_key);
        if floor.is_none() {
            debug!(work_category = category, operation_size = size_key, "no work-type minimum");
        }
        floor
    });

    Ok(ResolvedContext {
        planning_type,
        operation_size,
        work_type_minimum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tables_validate() {
        PolicyTables::default().validate().unwrap();
        PolicyTables::empty().validate().unwrap();
    }

    #[test]
    fn shrinking_overhead_is_rejected() {
        let mut tables = PolicyTables::empty();
        tables.planning_types.insert(
            "odd".to_string(),
            PlanningTypePolicy {
                overhead_factor: Some(0.5),
                ..Default::default()
            },
        );
        assert!(matches!(
            tables.validate(),
            Err(EngineError::InvalidSettings { .. })
        ));
    }

    #[test]
    fn resolve_uses_size_label_for_work_type_lookup() {
        let tables = PolicyTables::default();
        let ctx = OperatingContext {
            work_category: Some("customer_support".to_string()),
            ..Default::default()
        };
        let resolved = resolve_context(&tables, &ctx, OperationSize::Large).unwrap();
        assert_eq!(resolved.work_type_minimum, Some(6));
        assert!(resolved.planning_type.is_none());
        assert!(resolved.operation_size.is_none());
    }

    #[test]
    fn resolve_prefers_explicit_operation_size_key() {
        let tables = PolicyTables::default();
        let ctx = OperatingContext {
            planning_type: Some("division".to_string()),
            operation_size: Some("small".to_string()),
            work_category: Some("engineering".to_string()),
        };
        let resolved = resolve_context(&tables, &ctx, OperationSize::Large).unwrap();
        assert_eq!(resolved.work_type_minimum, Some(2));
        assert_eq!(
            resolved.planning_type.unwrap().min_headcount_mode,
            MinHeadcountMode::Governed
        );
        assert_eq!(resolved.operation_size.unwrap().min_headcount_base, 1);
    }

    #[test]
    fn unknown_planning_type_is_an_error() {
        let ctx = OperatingContext {
            planning_type: Some("galaxy".to_string()),
            ..Default::default()
        };
        match resolve_context(&PolicyTables::default(), &ctx, OperationSize::Medium) {
            Err(EngineError::UnknownPolicy { key, .. }) => assert_eq!(key, "galaxy"),
            other => panic!("Expected UnknownPolicy, got: {:?}", other),
        }
    }

    #[test]
    fn unknown_work_category_has_no_floor() {
        let ctx = OperatingContext {
            work_category: Some("astrology".to_string()),
            ..Default::default()
        };
        let resolved =
            resolve_context(&PolicyTables::default(), &ctx, OperationSize::Medium).unwrap();
        assert_eq!(resolved.work_type_minimum, None);
    }
}
