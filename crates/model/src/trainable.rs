//! The seam between the training core and model architectures

use crate::error::Result;
use crate::gradient::GradientSet;
use crate::params::Model;
use crate::tensor::Tensor;

/// One minibatch of training data.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Inputs, shape [n, in_dim]
    pub inputs: Tensor,
    /// Targets, shape [n, out_dim]
    pub targets: Tensor,
}

/// Contract a model must satisfy to be trained by the core.
///
/// The core only needs an ordered parameter map and a way to obtain the
/// loss and gradients for one batch; architectures are external
/// collaborators.
pub trait Trainable {
    /// The ordered parameter map.
    fn params(&self) -> &Model;

    /// Mutable access for the optimiser step.
    fn params_mut(&mut self) -> &mut Model;

    /// Forward and backward pass over one whole batch, returning the
    /// scalar loss and the minibatch-aggregated gradients. Implementors
    /// may update their own tracking counters here.
    fn loss_and_grad(&mut self, batch: &Batch) -> Result<(f64, GradientSet)>;
}
