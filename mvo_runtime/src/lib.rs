#![forbid(unsafe_code)]

//! MVO Runtime
//!
//! Wraps the sizing kernel with configuration, logging, background
//! workers and determinism checks.
//!
//! No sizing logic lives here. Baselines, simulation, selection and
//! governance are all delegated to `mvo_engine`.

pub mod config;
pub mod logging;
pub mod worker;
pub mod drift;

pub use config::{ConfigError, ConfigOverrides, RuntimeConfig};
pub use worker::{PlanHandle, PlanWorker, RunError};
