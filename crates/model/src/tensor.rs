//! Dense numeric tensors
//!
//! Flat f64 storage with an explicit shape fixed at construction.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// A dense tensor: flat data plus its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    data: Vec<f64>,
    shape: Vec<usize>,
}

impl Tensor {
    /// Build from flat data; the element count must fill the shape.
    pub fn from_vec(data: Vec<f64>, shape: Vec<usize>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(ModelError::InvalidShape {
                elements: data.len(),
                shape,
            });
        }
        Ok(Self { data, shape })
    }

    /// All-zero tensor of the given shape.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            data: vec![0.0; len],
            shape,
        }
    }

    /// Single-element tensor (shape [1]).
    pub fn scalar(value: f64) -> Self {
        Self {
            data: vec![value],
            shape: vec![1],
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the tensor has no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The shape fixed at construction.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flat element view.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Flat mutable element view; the shape cannot change.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Whether two tensors have the same shape.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.shape == other.shape
    }

    /// True when every element is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }
}
