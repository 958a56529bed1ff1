#![forbid(unsafe_code)]

//! MVO Engine — minimum-viable-organization sizing kernel.
//!
//! Pure computation: workload parameters and operating-context policy in,
//! ranked headcount candidates and a selected recommendation out.
//! No I/O, no persistence, no rendering.

/// Engine v1. Bumping this changes every result hash.
pub const ENGINE_VERSION: u32 = 1;

pub mod arithmetic;
pub mod error;
pub mod domain;
pub mod policy;
pub mod cancel;
pub mod sampler;
pub mod baseline;
pub mod simulator;
pub mod selector;
pub mod governance;
pub mod strategy;
pub mod invariants;
pub mod hashing;
pub mod engine;

pub use domain::{
    BaselineHeadcount, HeadcountTestResult, MvoResult, OperationSize, RangeValue, WorkloadSpec,
};
pub use engine::{MvoEngine, PlanRequest};
pub use error::{EngineError, EngineResult};
