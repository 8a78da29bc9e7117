//! Per-step gradient buffers
//!
//! One backward pass fills a `GradientSet`: one flat buffer per
//! trainable parameter, in the model's declared order. The set is owned
//! by the step that created it and never attached to the parameters.

use crate::params::Model;

/// Gradients of one backward pass, keyed by parameter name.
#[derive(Debug, Clone)]
pub struct GradientSet {
    grads: Vec<(String, Vec<f64>)>,
}

impl GradientSet {
    /// Zero buffers for every trainable (aggregable) parameter of `model`.
    pub fn zeros_like(model: &Model) -> Self {
        let grads = model
            .iter()
            .filter(|p| p.aggregate)
            .map(|p| (p.name.clone(), vec![0.0; p.tensor.len()]))
            .collect();
        Self { grads }
    }

    /// Buffer for one parameter.
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.grads
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, g)| g.as_slice())
    }

    /// Mutable buffer for one parameter.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Vec<f64>> {
        self.grads
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, g)| g)
    }

    /// Buffers in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.grads.iter().map(|(n, g)| (n.as_str(), g.as_slice()))
    }

    /// Mutable iteration in declared order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Vec<f64>)> {
        self.grads.iter_mut().map(|(n, g)| (n.as_str(), g))
    }

    /// Number of parameter buffers.
    pub fn len(&self) -> usize {
        self.grads.len()
    }

    /// Whether the set holds no buffers.
    pub fn is_empty(&self) -> bool {
        self.grads.is_empty()
    }

    /// True when every gradient value is finite.
    pub fn is_finite(&self) -> bool {
        self.grads
            .iter()
            .all(|(_, g)| g.iter().all(|x| x.is_finite()))
    }

    /// Zero every buffer in place.
    pub fn clear(&mut self) {
        for (_, g) in self.grads.iter_mut() {
            g.iter_mut().for_each(|x| *x = 0.0);
        }
    }
}
