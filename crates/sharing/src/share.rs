//! Basic secret share type
//!
//! Shares are zeroized on drop to protect against memory disclosure.

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use fedveil_fixed_point::FixedVector;

/// One additive share of a fixed-point vector, held by a single
/// participant. Individually uniform, so it reveals nothing about the
/// underlying value.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Share {
    /// Raw share words (zeroized on drop)
    pub data: Vec<i32>,
    /// Fractional bits of the encoding this share belongs to
    pub precision: u8,
}

impl Share {
    /// Build from raw words
    pub fn from_raw(data: Vec<i32>, precision: u8) -> Self {
        Self { data, precision }
    }

    /// All-zero share
    pub fn zeros(len: usize, precision: u8) -> Self {
        Self {
            data: vec![0; len],
            precision,
        }
    }

    /// Uniformly random share drawn from the given RNG
    pub fn random_with_rng<R: RngCore>(len: usize, precision: u8, rng: &mut R) -> Self {
        let data: Vec<i32> = (0..len).map(|_| rng.next_u32() as i32).collect();
        Self { data, precision }
    }

    /// Number of words
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the share has no words
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Local share-wise addition (wrapping); the sum of two parties'
    /// shares of X and Y is a share of X + Y
    pub fn wrapping_add(&self, other: &Self) -> Self {
        debug_assert_eq!(self.precision, other.precision);
        debug_assert_eq!(self.len(), other.len());
        let data: Vec<i32> = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| a.wrapping_add(b))
            .collect();
        Self {
            data,
            precision: self.precision,
        }
    }

    /// The balancing share X - (S_1 + ... + S_k) that completes a split
    pub(crate) fn balancing(plaintext: &FixedVector, others: &[Share]) -> Self {
        let mut data = plaintext.data.clone();
        for share in others {
            for (word, &s) in data.iter_mut().zip(&share.data) {
                *word = word.wrapping_sub(s);
            }
        }
        Self {
            data,
            precision: plaintext.precision,
        }
    }

    /// View as a fixed-point vector (used at reveal time)
    pub fn to_fixed_vector(&self) -> FixedVector {
        FixedVector::from_raw(self.data.clone(), self.precision)
    }
}
