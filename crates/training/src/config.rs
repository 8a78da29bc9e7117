//! Run-level training configuration

use fedveil_model::HyperParameters;

/// What to do when a worker fails its local epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerFailurePolicy {
    /// Abort the whole round on the first failure (default; the prior
    /// global model stays installed).
    AbortRound,
    /// Drop the failed workers and aggregate the survivors.
    DropFailed,
}

/// Orchestrator configuration for one training run.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub hyper: HyperParameters,
    /// Secret-shared aggregation when true; plaintext summation is for
    /// trusted or simulated settings only.
    pub secure: bool,
    pub failure_policy: WorkerFailurePolicy,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            hyper: HyperParameters::default(),
            secure: true,
            failure_policy: WorkerFailurePolicy::AbortRound,
        }
    }
}
