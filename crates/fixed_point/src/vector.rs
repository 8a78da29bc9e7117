//! Fixed-point vector operations
//!
//! Flat word vectors used as the encoding of one parameter tensor.
//! Shapes live one layer up; the sharing protocol only needs lengths.

use crate::error::{FixedPointError, Result};
use crate::fixed::{Fixed, DEFAULT_PRECISION};

/// A vector of fixed-point values with a common precision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedVector {
    /// Raw i32 words
    pub data: Vec<i32>,
    /// Fractional bits shared by all elements
    pub precision: u8,
}

impl FixedVector {
    /// Build from raw words
    pub fn from_raw(data: Vec<i32>, precision: u8) -> Self {
        Self { data, precision }
    }

    /// Encode a slice of real values
    pub fn from_f64_slice(values: &[f64], precision: u8) -> Result<Self> {
        let mut data = Vec::with_capacity(values.len());
        for &v in values {
            data.push(Fixed::from_f64(v, precision)?.raw);
        }
        Ok(Self { data, precision })
    }

    /// Encode a slice of real values at the default precision
    pub fn from_f64_slice_default(values: &[f64]) -> Result<Self> {
        Self::from_f64_slice(values, DEFAULT_PRECISION)
    }

    /// Decode back to real values
    pub fn to_f64_vec(&self) -> Vec<f64> {
        let scale_factor = (1u64 << self.precision) as f64;
        self.data.iter().map(|&x| x as f64 / scale_factor).collect()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the vector has no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at index
    pub fn get(&self, index: usize) -> Option<Fixed> {
        self.data.get(index).map(|&raw| Fixed {
            raw,
            precision: self.precision,
        })
    }

    /// Zero vector of the given length
    pub fn zeros(len: usize, precision: u8) -> Self {
        Self {
            data: vec![0; len],
            precision,
        }
    }

    /// Element-wise wrapping addition; exact mod 2^32
    pub fn wrapping_add(&self, other: &Self) -> Result<Self> {
        self.check_compatible(other)?;

        let data: Vec<i32> = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| a.wrapping_add(b))
            .collect();

        Ok(Self {
            data,
            precision: self.precision,
        })
    }

    /// Element-wise wrapping subtraction
    pub fn wrapping_sub(&self, other: &Self) -> Result<Self> {
        self.check_compatible(other)?;

        let data: Vec<i32> = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| a.wrapping_sub(b))
            .collect();

        Ok(Self {
            data,
            precision: self.precision,
        })
    }

    /// Negate all elements
    pub fn neg(&self) -> Self {
        Self {
            data: self.data.iter().map(|&x| x.wrapping_neg()).collect(),
            precision: self.precision,
        }
    }

    fn check_compatible(&self, other: &Self) -> Result<()> {
        if self.precision != other.precision {
            return Err(FixedPointError::PrecisionMismatch {
                expected: self.precision,
                got: other.precision,
            });
        }
        if self.len() != other.len() {
            return Err(FixedPointError::LengthMismatch {
                expected: self.len(),
                got: other.len(),
            });
        }
        Ok(())
    }
}
