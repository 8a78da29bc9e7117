//! Worker entities
//!
//! A worker owns its model replica, its local dataset and its own
//! privacy ledger. Replicas are mutated only by their owning worker's
//! local steps; everything a worker learns about the outside world
//! arrives through broadcast, and everything it reveals leaves through
//! the sharing protocol.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use fedveil_accountant::PrivacyState;
use fedveil_model::{Batch, HyperParameters, Model, Trainable};

use crate::dp::{dp_step, DpStepConfig};
use crate::error::Result;

/// One data-holding participant.
pub struct Worker<M> {
    id: String,
    model: M,
    dataset: Vec<Batch>,
    step_cfg: DpStepConfig,
    privacy: PrivacyState,
    rng: ChaCha20Rng,
}

/// Outcome of one worker's local epoch.
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub worker_id: String,
    /// Mean loss over the epoch's batches
    pub epoch_loss: f64,
    /// Total noisy steps taken since training started
    pub steps: u64,
    /// Cumulative privacy spend at the configured δ
    pub epsilon: f64,
    /// The Rényi order achieving that ε
    pub best_order: f64,
}

impl<M: Trainable> Worker<M> {
    /// Build a worker; the accountant configuration is validated here,
    /// before any training starts.
    pub fn new(
        id: impl Into<String>,
        model: M,
        dataset: Vec<Batch>,
        hyper: &HyperParameters,
        seed: u64,
    ) -> Result<Self> {
        let privacy = PrivacyState::new(
            hyper.orders.clone(),
            hyper.noise_multiplier,
            hyper.sample_rate,
            hyper.target_delta,
        )?;
        Ok(Self {
            id: id.into(),
            model,
            dataset,
            step_cfg: DpStepConfig::from(hyper),
            privacy,
            rng: ChaCha20Rng::seed_from_u64(seed),
        })
    }

    /// The worker's identity.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The owned model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Mutable access to the owned model (broadcast installs values here).
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// The replica's parameter map.
    pub fn replica(&self) -> &Model {
        self.model.params()
    }

    /// The worker's privacy ledger.
    pub fn privacy(&self) -> &PrivacyState {
        &self.privacy
    }

    /// Number of local batches.
    pub fn batch_count(&self) -> usize {
        self.dataset.len()
    }

    /// Run one local epoch: a DP step per batch, then report mean loss
    /// and the cumulative (ε, best order).
    pub fn run_local_epoch(&mut self) -> Result<WorkerReport> {
        let Self {
            id,
            model,
            dataset,
            step_cfg,
            privacy,
            rng,
        } = self;

        let mut losses = Vec::with_capacity(dataset.len());
        for batch in dataset.iter() {
            let loss = dp_step(model, batch, step_cfg, rng, privacy)?;
            losses.push(loss);
        }

        let epoch_loss = if losses.is_empty() {
            0.0
        } else {
            losses.iter().sum::<f64>() / losses.len() as f64
        };
        let (epsilon, best_order) = privacy.privacy_spent();

        Ok(WorkerReport {
            worker_id: id.clone(),
            epoch_loss,
            steps: privacy.steps(),
            epsilon,
            best_order,
        })
    }
}
