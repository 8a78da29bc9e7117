//! Per-worker privacy state

use crate::error::Result;
use crate::rdp::{privacy_spent_unchecked, validate};

/// Running privacy ledger owned by a single worker.
///
/// Parameters are validated once at construction; after that the state
/// only ever advances its private step counter, so the reported ε is
/// non-decreasing over the life of the worker.
#[derive(Debug, Clone)]
pub struct PrivacyState {
    orders: Vec<f64>,
    noise_multiplier: f64,
    sample_rate: f64,
    target_delta: f64,
    steps: u64,
}

impl PrivacyState {
    /// Validate the accountant configuration and start at zero steps.
    pub fn new(
        orders: Vec<f64>,
        noise_multiplier: f64,
        sample_rate: f64,
        target_delta: f64,
    ) -> Result<Self> {
        validate(target_delta, &orders, sample_rate, noise_multiplier)?;
        Ok(Self {
            orders,
            noise_multiplier,
            sample_rate,
            target_delta,
            steps: 0,
        })
    }

    /// Record one noisy optimisation step.
    pub fn record_step(&mut self) {
        self.steps += 1;
    }

    /// Steps recorded so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// The noise multiplier this ledger was configured with.
    pub fn noise_multiplier(&self) -> f64 {
        self.noise_multiplier
    }

    /// The target δ this ledger reports against.
    pub fn target_delta(&self) -> f64 {
        self.target_delta
    }

    /// Current (ε, best order) at the configured δ.
    pub fn privacy_spent(&self) -> (f64, f64) {
        privacy_spent_unchecked(
            self.target_delta,
            self.steps,
            &self.orders,
            self.sample_rate,
            self.noise_multiplier,
        )
    }
}
