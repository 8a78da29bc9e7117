//! Reference linear model
//!
//! A least-squares linear regressor with analytic gradients. It is the
//! model used by the demo and the integration tests; it also carries a
//! `batches_seen` tracking counter to exercise the non-aggregable
//! parameter path end to end.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{ModelError, Result};
use crate::gradient::GradientSet;
use crate::params::Model;
use crate::tensor::Tensor;
use crate::trainable::{Batch, Trainable};

const WEIGHT: &str = "weight";
const BIAS: &str = "bias";
const BATCHES_SEEN: &str = "batches_seen";

/// y = W x + b with mean squared error loss.
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    model: Model,
    in_dim: usize,
    out_dim: usize,
}

impl LinearRegressor {
    /// Random Gaussian initialisation (std 0.1) from a fixed seed.
    pub fn new(in_dim: usize, out_dim: usize, seed: u64) -> Result<Self> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let init = Normal::new(0.0, 0.1).expect("finite std");

        let weight: Vec<f64> = (0..out_dim * in_dim).map(|_| init.sample(&mut rng)).collect();

        let mut model = Model::new();
        model.push(WEIGHT, Tensor::from_vec(weight, vec![out_dim, in_dim])?)?;
        model.push(BIAS, Tensor::zeros(vec![out_dim]))?;
        model.push_counter(BATCHES_SEEN, Tensor::scalar(0.0))?;

        Ok(Self {
            model,
            in_dim,
            out_dim,
        })
    }

    /// Input dimensionality.
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    /// Output dimensionality.
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    fn check_batch(&self, batch: &Batch) -> Result<usize> {
        let in_shape = batch.inputs.shape();
        if in_shape.len() != 2 || in_shape[1] != self.in_dim {
            return Err(ModelError::ShapeMismatch {
                name: "inputs".to_string(),
                expected: vec![in_shape.first().copied().unwrap_or(0), self.in_dim],
                got: in_shape.to_vec(),
            });
        }
        let out_shape = batch.targets.shape();
        if out_shape != [in_shape[0], self.out_dim] {
            return Err(ModelError::ShapeMismatch {
                name: "targets".to_string(),
                expected: vec![in_shape[0], self.out_dim],
                got: out_shape.to_vec(),
            });
        }
        Ok(in_shape[0])
    }
}

impl Trainable for LinearRegressor {
    fn params(&self) -> &Model {
        &self.model
    }

    fn params_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    fn loss_and_grad(&mut self, batch: &Batch) -> Result<(f64, GradientSet)> {
        let n = self.check_batch(batch)?;

        let weight = self.model.param(WEIGHT)?.data().to_vec();
        let bias = self.model.param(BIAS)?.data().to_vec();
        let xs = batch.inputs.data();
        let ts = batch.targets.data();

        let mut grads = GradientSet::zeros_like(&self.model);
        let mut loss = 0.0;
        {
            let mut gw = vec![0.0; self.out_dim * self.in_dim];
            let mut gb = vec![0.0; self.out_dim];

            for s in 0..n {
                let x = &xs[s * self.in_dim..(s + 1) * self.in_dim];
                let t = &ts[s * self.out_dim..(s + 1) * self.out_dim];

                for j in 0..self.out_dim {
                    let row = &weight[j * self.in_dim..(j + 1) * self.in_dim];
                    let pred: f64 =
                        row.iter().zip(x).map(|(w, xi)| w * xi).sum::<f64>() + bias[j];
                    let err = pred - t[j];

                    loss += err * err;
                    let g = 2.0 * err / n as f64;
                    for (i, &xi) in x.iter().enumerate() {
                        gw[j * self.in_dim + i] += g * xi;
                    }
                    gb[j] += g;
                }
            }

            grads
                .get_mut(WEIGHT)
                .expect("weight gradient buffer")
                .copy_from_slice(&gw);
            grads
                .get_mut(BIAS)
                .expect("bias gradient buffer")
                .copy_from_slice(&gb);
        }
        loss /= n as f64;

        // Tracking counter, excluded from aggregation
        self.model.param_mut(BATCHES_SEEN)?.data_mut()[0] += 1.0;

        Ok((loss, grads))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(inputs: Vec<f64>, targets: Vec<f64>, n: usize, d: usize, k: usize) -> Batch {
        Batch {
            inputs: Tensor::from_vec(inputs, vec![n, d]).unwrap(),
            targets: Tensor::from_vec(targets, vec![n, k]).unwrap(),
        }
    }

    #[test]
    fn test_zero_loss_at_optimum() {
        // With W = 0, b = 0 and zero targets, loss and gradients vanish
        let mut model = LinearRegressor::new(2, 1, 0).unwrap();
        model.params_mut().param_mut("weight").unwrap().data_mut().fill(0.0);

        let b = batch(vec![1.0, 2.0], vec![0.0], 1, 2, 1);
        let (loss, grads) = model.loss_and_grad(&b).unwrap();
        assert!(loss.abs() < 1e-12);
        assert!(grads.get("weight").unwrap().iter().all(|&g| g.abs() < 1e-12));
    }

    #[test]
    fn test_analytic_gradient() {
        // W = [[1, 0]], b = [0], x = [1, 2], t = [3] → pred 1, err -2
        // dL/dW = 2·err·x = [-4, -8], dL/db = -4, loss = 4
        let mut model = LinearRegressor::new(2, 1, 0).unwrap();
        {
            let w = model.params_mut().param_mut("weight").unwrap().data_mut();
            w.copy_from_slice(&[1.0, 0.0]);
        }

        let b = batch(vec![1.0, 2.0], vec![3.0], 1, 2, 1);
        let (loss, grads) = model.loss_and_grad(&b).unwrap();

        assert!((loss - 4.0).abs() < 1e-12);
        let gw = grads.get("weight").unwrap();
        assert!((gw[0] - (-4.0)).abs() < 1e-12);
        assert!((gw[1] - (-8.0)).abs() < 1e-12);
        assert!((grads.get("bias").unwrap()[0] - (-4.0)).abs() < 1e-12);
    }

    #[test]
    fn test_counter_advances_per_batch() {
        let mut model = LinearRegressor::new(2, 1, 1).unwrap();
        let b = batch(vec![1.0, 2.0], vec![0.5], 1, 2, 1);

        model.loss_and_grad(&b).unwrap();
        model.loss_and_grad(&b).unwrap();
        assert_eq!(model.params().param("batches_seen").unwrap().data()[0], 2.0);
    }

    #[test]
    fn test_bad_batch_shape_rejected() {
        let mut model = LinearRegressor::new(3, 1, 0).unwrap();
        let b = batch(vec![1.0, 2.0], vec![0.0], 1, 2, 1);
        assert!(matches!(
            model.loss_and_grad(&b),
            Err(ModelError::ShapeMismatch { .. })
        ));
    }
}
