//! Differentially-private local step
//!
//! Clips the minibatch-aggregated gradient of each parameter, applies a
//! manual SGD update, then perturbs the updated parameters with
//! calibrated Gaussian noise. Noise is injected into the parameters
//! after the update rather than into the gradients before it; this is
//! the protocol this system implements, and it matches the accountant's
//! sensitivity assumption only because one batch is one microbatch
//! (the accountant is configured accordingly).

use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Normal};

use fedveil_accountant::PrivacyState;
use fedveil_model::{Batch, GradientSet, HyperParameters, Trainable};

use crate::error::{Result, TrainingError};

/// Per-step optimisation parameters.
#[derive(Debug, Clone)]
pub struct DpStepConfig {
    pub learning_rate: f64,
    pub clip_norm: f64,
    pub noise_multiplier: f64,
}

impl From<&HyperParameters> for DpStepConfig {
    fn from(hyper: &HyperParameters) -> Self {
        Self {
            learning_rate: hyper.learning_rate,
            clip_norm: hyper.clip_norm,
            noise_multiplier: hyper.noise_multiplier,
        }
    }
}

/// Clipped gradients for exactly one step.
///
/// Owned by the step, never attached to the parameters, and explicitly
/// zeroed on release so no gradient state survives into the next step.
#[derive(Debug)]
pub struct GradientAccumulator {
    clipped: GradientSet,
}

impl GradientAccumulator {
    /// Take one backward pass worth of gradients and clip each
    /// parameter's buffer to an L2 norm of at most `clip_norm`.
    pub fn clip_from(mut grads: GradientSet, clip_norm: f64) -> Self {
        for (_, buf) in grads.iter_mut() {
            let norm = l2_norm(buf);
            if norm > clip_norm && norm > 0.0 {
                let scale = clip_norm / norm;
                buf.iter_mut().for_each(|g| *g *= scale);
            }
        }
        Self { clipped: grads }
    }

    /// Clipped buffers in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.clipped.iter()
    }

    /// Largest per-parameter L2 norm held (post-clipping this is at most
    /// the clip norm; used by invariant checks).
    pub fn max_norm(&self) -> f64 {
        self.clipped
            .iter()
            .map(|(_, g)| l2_norm(g))
            .fold(0.0, f64::max)
    }

    /// Zero the buffers and drop them.
    pub fn release(mut self) {
        self.clipped.clear();
    }
}

/// L2 norm of a flat buffer.
pub(crate) fn l2_norm(values: &[f64]) -> f64 {
    values.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// One differentially-private optimisation step over a whole batch.
///
/// Returns the scalar loss for logging. Fails fast with
/// `NumericInstability` on any non-finite loss or gradient, before any
/// parameter is written.
pub fn dp_step<M: Trainable>(
    model: &mut M,
    batch: &Batch,
    cfg: &DpStepConfig,
    rng: &mut ChaCha20Rng,
    privacy: &mut PrivacyState,
) -> Result<f64> {
    let (loss, grads) = model.loss_and_grad(batch)?;

    if !loss.is_finite() {
        return Err(TrainingError::NumericInstability(format!(
            "non-finite loss {loss}"
        )));
    }
    if !grads.is_finite() {
        return Err(TrainingError::NumericInstability(
            "non-finite gradient".to_string(),
        ));
    }

    let accumulator = GradientAccumulator::clip_from(grads, cfg.clip_norm);
    debug_assert!(accumulator.max_norm() <= cfg.clip_norm + 1e-9);

    let sigma = cfg.noise_multiplier * cfg.clip_norm;
    let noise = Normal::new(0.0, sigma).map_err(|_| {
        TrainingError::NumericInstability(format!("invalid noise standard deviation {sigma}"))
    })?;

    let params = model.params_mut();
    for (name, grad) in accumulator.iter() {
        let values = params.param_mut(name)?.data_mut();
        for (p, &g) in values.iter_mut().zip(grad) {
            *p -= cfg.learning_rate * g;
            *p += noise.sample(rng);
        }
    }

    accumulator.release();
    privacy.record_step();

    Ok(loss)
}
