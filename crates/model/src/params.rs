//! Ordered named-parameter maps
//!
//! Insertion order is the declared parameter order; every operation that
//! walks a model (broadcast, aggregation, checkpointing) iterates in
//! this order. Tracking counters are pushed with `aggregate = false` and
//! skipped by the aggregation protocol.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::tensor::Tensor;

/// One named parameter and its aggregation eligibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedParam {
    pub name: String,
    pub tensor: Tensor,
    /// False for tracking counters that must not be averaged across workers
    pub aggregate: bool,
}

/// An ordered mapping from parameter name to tensor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    params: Vec<NamedParam>,
}

impl Model {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Append an aggregable parameter.
    pub fn push(&mut self, name: impl Into<String>, tensor: Tensor) -> Result<()> {
        self.push_entry(name.into(), tensor, true)
    }

    /// Append a tracking counter, excluded from aggregation.
    pub fn push_counter(&mut self, name: impl Into<String>, tensor: Tensor) -> Result<()> {
        self.push_entry(name.into(), tensor, false)
    }

    fn push_entry(&mut self, name: String, tensor: Tensor, aggregate: bool) -> Result<()> {
        if self.get(&name).is_some() {
            return Err(ModelError::DuplicateParameter(name));
        }
        self.params.push(NamedParam {
            name,
            tensor,
            aggregate,
        });
        Ok(())
    }

    /// Look up a parameter tensor by name.
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.tensor)
    }

    /// Mutable lookup by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Tensor> {
        self.params
            .iter_mut()
            .find(|p| p.name == name)
            .map(|p| &mut p.tensor)
    }

    /// Lookup that fails with `UnknownParameter`.
    pub fn param(&self, name: &str) -> Result<&Tensor> {
        self.get(name)
            .ok_or_else(|| ModelError::UnknownParameter(name.to_string()))
    }

    /// Mutable lookup that fails with `UnknownParameter`.
    pub fn param_mut(&mut self, name: &str) -> Result<&mut Tensor> {
        self.get_mut(name)
            .ok_or_else(|| ModelError::UnknownParameter(name.to_string()))
    }

    /// Parameters in declared order.
    pub fn iter(&self) -> impl Iterator<Item = &NamedParam> {
        self.params.iter()
    }

    /// Mutable iteration in declared order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut NamedParam> {
        self.params.iter_mut()
    }

    /// Parameter names in declared order.
    pub fn names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name.clone()).collect()
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the model has no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// True when every parameter is finite.
    pub fn is_finite(&self) -> bool {
        self.params.iter().all(|p| p.tensor.is_finite())
    }

    /// Check that `other` declares the same keys in the same order with
    /// the same shapes. This is the precondition shared by broadcast and
    /// aggregation; both key-set and shape violations are fatal.
    pub fn check_compatible(&self, other: &Self) -> Result<()> {
        if self.names() != other.names() {
            return Err(ModelError::KeySetMismatch {
                expected: self.names(),
                got: other.names(),
            });
        }
        for (mine, theirs) in self.params.iter().zip(other.iter()) {
            if !mine.tensor.same_shape(&theirs.tensor) {
                return Err(ModelError::ShapeMismatch {
                    name: mine.name.clone(),
                    expected: mine.tensor.shape().to_vec(),
                    got: theirs.tensor.shape().to_vec(),
                });
            }
        }
        Ok(())
    }

    /// Overwrite every parameter value (counters included) with the
    /// values from `source`. Full copy, not a merge.
    pub fn copy_values_from(&mut self, source: &Self) -> Result<()> {
        source.check_compatible(self)?;
        for (mine, theirs) in self.params.iter_mut().zip(source.iter()) {
            mine.tensor
                .data_mut()
                .copy_from_slice(theirs.tensor.data());
        }
        Ok(())
    }
}
