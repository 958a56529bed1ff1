//! Runtime configuration with layered resolution.
//!
//! Resolution order (highest priority first):
//!   1. explicit overrides (`ConfigOverrides`, e.g. from the command line)
//!   2. environment (`MVO_ITERATIONS`, `MVO_SEED`, `MVO_PARALLEL`)
//!   3. TOML file
//!   4. compiled defaults
//!
//! A policy table present in the file replaces the built-in table of the
//! same name; tables the file omits keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use mvo_engine::policy::PolicyTables;
use mvo_engine::simulator::SimulationSettings;
use mvo_engine::MvoEngine;

pub const ENV_ITERATIONS: &str = "MVO_ITERATIONS";
pub const ENV_SEED: &str = "MVO_SEED";
pub const ENV_PARALLEL: &str = "MVO_PARALLEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Io { path: String, message: String },

    #[error("Config parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Config validation failed for {field}: {message}")]
    Validation { field: String, message: String },
}

/// Everything the runtime needs to build an engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RuntimeConfig {
    pub simulation: SimulationSettings,
    pub policies: PolicyTables,
}

/// Values that beat every other layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub iterations: Option<u32>,
    pub seed: Option<u64>,
    pub parallel: Option<bool>,
}

impl RuntimeConfig {
    /// Resolve all layers and validate the result.
    pub fn load(path: Option<&Path>, overrides: Option<&ConfigOverrides>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env_from(|key| std::env::var(key).ok())?;

        if let Some(overrides) = overrides {
            config.apply_overrides(overrides);
        }

        config.validate()?;
        debug!(
            iterations = config.simulation.iterations,
            seed = ?config.simulation.seed,
            parallel = config.simulation.parallel,
            "runtime config resolved"
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Parse a TOML string. Does not validate.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Apply `MVO_*` variables read through `lookup`.
    ///
    /// Unset variables are skipped; set but unparseable ones are errors.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_ITERATIONS) {
            self.simulation.iterations = parse_env(ENV_ITERATIONS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SEED) {
            self.simulation.seed = Some(parse_env(ENV_SEED, &raw)?);
        }
        if let Some(raw) = lookup(ENV_PARALLEL) {
            self.simulation.parallel = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::Validation {
                        field: ENV_PARALLEL.to_string(),
                        message: format!("expected a boolean, got {:?}", raw),
                    })
                }
            };
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(iterations) = overrides.iterations {
            self.simulation.iterations = iterations;
        }
        if overrides.seed.is_some() {
            self.simulation.seed = overrides.seed;
        }
        if let Some(parallel) = overrides.parallel {
            self.simulation.parallel = parallel;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate().map_err(|e| ConfigError::Validation {
            field: "simulation".to_string(),
            message: e.to_string(),
        })?;
        self.policies.validate().map_err(|e| ConfigError::Validation {
            field: "policies".to_string(),
            message: e.to_string(),
        })
    }

    pub fn settings(&self) -> SimulationSettings {
        self.simulation.clone()
    }

    pub fn engine(&self) -> MvoEngine {
        MvoEngine::with_policies(self.settings(), self.policies.clone())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Validation {
        field: key.to_string(),
        message: format!("{} ({:?})", e, raw),
    })
}
