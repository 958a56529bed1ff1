//! Background plan execution.
//!
//! A `PlanWorker` owns a shared engine and hands runs off to dedicated
//! threads (single plans) or the rayon pool (batches). No global mutable
//! state: every run gets its own cancellation token and result channel.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use mvo_engine::cancel::CancellationToken;
use mvo_engine::domain::MvoResult;
use mvo_engine::engine::{MvoEngine, PlanRequest};
use mvo_engine::error::EngineError;

use crate::config::{ConfigError, RuntimeConfig};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to spawn plan worker: {0}")]
    WorkerSpawn(String),

    #[error("plan worker exited without a result")]
    WorkerLost,

    #[error("seeded replay diverged: {first} != {second}")]
    NonDeterministic { first: String, second: String },
}

/// Runs plans off the caller's thread.
#[derive(Debug, Clone)]
pub struct PlanWorker {
    engine: Arc<MvoEngine>,
}

impl PlanWorker {
    pub fn new(engine: MvoEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Result<Self, RunError> {
        config.validate()?;
        Ok(Self::new(config.engine()))
    }

    pub fn engine(&self) -> &MvoEngine {
        &self.engine
    }

    /// Start `request` on its own thread.
    pub fn spawn(&self, request: PlanRequest) -> Result<PlanHandle, RunError> {
        self.spawn_with_token(request, CancellationToken::new())
    }

    /// Start `request` on its own thread, cancellable through `cancel`.
    pub fn spawn_with_token(
        &self,
        request: PlanRequest,
        cancel: CancellationToken,
    ) -> Result<PlanHandle, RunError> {
        let (tx, rx) = mpsc::channel();
        let engine = Arc::clone(&self.engine);
        let token = cancel.clone();

        let thread = thread::Builder::new()
            .name("mvo-plan".to_string())
            .spawn(move || {
                let outcome = engine.run_with_cancel(&request, &token);
                if let Err(e) = &outcome {
                    debug!(error = %e, "plan run failed");
                }
                // Receiver may have been dropped; nothing left to report to.
                let _ = tx.send(outcome);
            })
            .map_err(|e| RunError::WorkerSpawn(e.to_string()))?;

        Ok(PlanHandle {
            cancel,
            receiver: rx,
            thread: Some(thread),
        })
    }

    /// Run on the calling thread.
    pub fn run_blocking(&self, request: &PlanRequest) -> Result<MvoResult, RunError> {
        Ok(self.engine.run(request)?)
    }

    /// Run independent planning units on the rayon pool.
    ///
    /// Results come back in request order; one failure does not stop the
    /// others.
    pub fn run_batch(&self, requests: &[PlanRequest]) -> Vec<Result<MvoResult, RunError>> {
        info!(count = requests.len(), "starting plan batch");
        let results: Vec<Result<MvoResult, RunError>> = requests
            .par_iter()
            .map(|request| self.run_blocking(request))
            .collect();
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!(failed, total = requests.len(), "plan batch had failures");
        }
        results
    }
}

/// A plan running on a worker thread.
#[derive(Debug)]
pub struct PlanHandle {
    cancel: CancellationToken,
    receiver: Receiver<Result<MvoResult, EngineError>>,
    thread: Option<JoinHandle<()>>,
}

impl PlanHandle {
    /// Ask the run to stop before its next candidate.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Block until the run ends.
    pub fn wait(mut self) -> Result<MvoResult, RunError> {
        let outcome = self.receiver.recv().map_err(|_| RunError::WorkerLost)?;
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| RunError::WorkerLost)?;
        }
        Ok(outcome?)
    }
}
