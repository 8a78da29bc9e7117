//! Training orchestrator
//!
//! Drives federated rounds: broadcast the global model, let every worker
//! train locally in parallel, then fold the replicas back through the
//! secure aggregation protocol. The global model is only ever written
//! here, between phases; a failed round leaves the previous global model
//! installed.

use std::collections::HashMap;

use rayon::prelude::*;

use fedveil_model::{Checkpoint, Model, Normalization, Trainable};
use fedveil_sharing::CryptoProvider;

use crate::aggregation::{aggregate, AggregationContext};
use crate::broadcast::broadcast;
use crate::config::{TrainingConfig, WorkerFailurePolicy};
use crate::error::{Result, TrainingError};
use crate::worker::{Worker, WorkerReport};

/// Where a round currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Idle,
    Broadcasting,
    LocalTraining,
    Aggregating,
}

/// Outcome of one federated round.
#[derive(Debug, Clone)]
pub struct RoundReport {
    pub epoch: usize,
    pub workers: Vec<WorkerReport>,
    /// Workers dropped under `WorkerFailurePolicy::DropFailed`
    pub dropped: Vec<String>,
}

/// Owns the global model, the worker arena and the protocol context for
/// the lifetime of a training run.
pub struct Orchestrator<M> {
    global: Model,
    workers: Vec<Worker<M>>,
    ctx: AggregationContext,
    config: TrainingConfig,
    phase: RoundPhase,
}

impl<M: Trainable + Send> Orchestrator<M> {
    /// Assemble a run: the worker ids become the declared registry used
    /// by both broadcast and aggregation.
    pub fn new(
        global: Model,
        workers: Vec<Worker<M>>,
        provider: CryptoProvider,
        config: TrainingConfig,
    ) -> Result<Self> {
        let ids: Vec<String> = workers.iter().map(|w| w.id().to_string()).collect();
        let ctx = AggregationContext::new(ids, provider, config.hyper.precision)?;
        Ok(Self {
            global,
            workers,
            ctx,
            config,
            phase: RoundPhase::Idle,
        })
    }

    /// The current global model.
    pub fn global(&self) -> &Model {
        &self.global
    }

    /// The worker arena.
    pub fn workers(&self) -> &[Worker<M>] {
        &self.workers
    }

    /// The phase the orchestrator is in.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Run the configured number of epochs.
    pub fn train(&mut self) -> Result<Vec<RoundReport>> {
        let epochs = self.config.hyper.epochs;
        let mut reports = Vec::with_capacity(epochs);
        for epoch in 0..epochs {
            reports.push(self.run_round(epoch)?);
        }
        Ok(reports)
    }

    /// Run a single federated round.
    pub fn run_round(&mut self, epoch: usize) -> Result<RoundReport> {
        let result = self.round_inner(epoch);
        self.phase = RoundPhase::Idle;
        result
    }

    fn round_inner(&mut self, epoch: usize) -> Result<RoundReport> {
        self.phase = RoundPhase::Broadcasting;
        broadcast(&self.global, &mut self.workers)?;

        self.phase = RoundPhase::LocalTraining;
        let results: Vec<(String, Result<WorkerReport>)> = self
            .workers
            .par_iter_mut()
            .map(|w| (w.id().to_string(), w.run_local_epoch()))
            .collect();

        let mut reports = Vec::with_capacity(results.len());
        let mut failures: Vec<(String, TrainingError)> = Vec::new();
        let delta = self.config.hyper.target_delta;
        for (id, outcome) in results {
            match outcome {
                Ok(report) => {
                    tracing::info!(
                        "[{}] epoch {}: loss {:.4} (ε = {:.2}, δ = {}) for α = {}",
                        report.worker_id,
                        epoch,
                        report.epoch_loss,
                        report.epsilon,
                        delta,
                        report.best_order
                    );
                    reports.push(report);
                }
                Err(err) => {
                    tracing::warn!("[{}] epoch {}: local training failed: {}", id, epoch, err);
                    failures.push((id, err));
                }
            }
        }

        if !failures.is_empty() {
            match self.config.failure_policy {
                WorkerFailurePolicy::AbortRound => {
                    let (id, source) = failures.swap_remove(0);
                    return Err(TrainingError::WorkerFailed {
                        id,
                        source: Box::new(source),
                    });
                }
                WorkerFailurePolicy::DropFailed => {
                    tracing::warn!(
                        "epoch {}: aggregating without {} failed worker(s)",
                        epoch,
                        failures.len()
                    );
                }
            }
        }

        self.phase = RoundPhase::Aggregating;
        let surviving: Vec<&str> = reports.iter().map(|r| r.worker_id.as_str()).collect();
        let global = &self.global;
        let workers = &self.workers;
        let ctx = &mut self.ctx;
        let replicas: HashMap<String, &Model> = workers
            .iter()
            .filter(|w| surviving.contains(&w.id()))
            .map(|w| (w.id().to_string(), w.replica()))
            .collect();
        let fresh = aggregate(global, &replicas, ctx, None, self.config.secure)?;
        self.global = fresh;

        Ok(RoundReport {
            epoch,
            workers: reports,
            dropped: failures.into_iter().map(|(id, _)| id).collect(),
        })
    }

    /// Finish the run: bundle the global model with the hyperparameters
    /// that produced it.
    pub fn into_checkpoint(self, normalization: Option<Normalization>) -> Checkpoint {
        Checkpoint {
            params: self.global,
            hyperparameters: self.config.hyper,
            normalization,
        }
    }
}
