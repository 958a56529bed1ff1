//! MVO Engine — Error Taxonomy
//!
//! Structural and input errors abort a run before any simulation starts.
//! Statistical infeasibility is not an error: it is reported through
//! `EngineWarning` on the result.

/// All fatal engine failures.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid workload spec: {field}: {reason}")]
    InvalidSpec { field: String, reason: String },

    #[error("invalid simulation settings: {reason}")]
    InvalidSettings { reason: String },

    #[error("unknown {kind} policy {key:?}")]
    UnknownPolicy { kind: String, key: String },

    #[error("run cancelled after {completed} of {total} candidates")]
    Cancelled { completed: usize, total: usize },

    #[error("result encoding failed: {reason}")]
    Encoding { reason: String },

    #[error("result invariant violated: {detail}")]
    InvariantViolation { detail: String },
}

impl EngineError {
    pub(crate) fn invalid_spec(field: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidSpec {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Encoding {
            reason: err.to_string(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
